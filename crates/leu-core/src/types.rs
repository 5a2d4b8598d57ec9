//! # Domain Types
//!
//! Core domain types used throughout the loyalty program.
//!
//! ## Type Overview
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    Customer     │   │   NewCustomer   │   │ CustomerUpdate  │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id (store)     │   │  name           │   │  partial fields │       │
//! │  │  name, email    │   │  email          │   │  visits + tier  │       │
//! │  │  visits         │   │  phone?         │   │  always paired  │       │
//! │  │  next_reward    │   └─────────────────┘   └─────────────────┘       │
//! │  │  push metadata  │                                                    │
//! │  └─────────────────┘                                                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Wire Names
//! `Customer` serializes with the field names the frontend and the pass
//! service already use (`nombre`, `visitas`, `ultimaVisita`, ...), so the same
//! struct travels in pass generation requests and lookup responses.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::reward::{next_reward, RewardTier};

// =============================================================================
// Push Metadata
// =============================================================================

/// Wallet push registration for a customer's pass.
///
/// Filled in by the pass service when a device registers the pass; this crate
/// only carries it around.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct PushMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub push_token: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device_library_identifier: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pass_type_identifier: Option<String>,

    /// When the pass was last asked to refresh.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[ts(as = "Option<String>")]
    pub last_pass_update: Option<DateTime<Utc>>,
}

// =============================================================================
// Customer
// =============================================================================

/// A salon patron enrolled in the loyalty program.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Customer {
    /// Opaque identifier assigned by the document store. Also the QR payload.
    pub id: String,

    #[serde(rename = "nombre")]
    pub name: String,

    pub email: String,

    #[serde(rename = "telefono", default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,

    /// Visits in the current reward cycle (0..25).
    #[serde(rename = "visitas", default)]
    pub visits: u32,

    #[serde(rename = "ultimaVisita")]
    #[ts(as = "String")]
    pub last_visit: DateTime<Utc>,

    #[serde(rename = "fechaRegistro")]
    #[ts(as = "String")]
    pub registered_at: DateTime<Utc>,

    /// Denormalized reward text; always `next_reward(visits).description`.
    #[serde(rename = "proximaRecompensa")]
    pub next_reward: String,

    /// Identifiers of rewards already redeemed.
    #[serde(rename = "recompensasCanjeadas", default)]
    pub redeemed_rewards: BTreeSet<String>,

    /// Pass serial number, when the pass service assigned one.
    #[serde(rename = "serialNumber", default, skip_serializing_if = "Option::is_none")]
    pub serial_number: Option<String>,

    #[serde(flatten)]
    pub push: PushMetadata,
}

impl Customer {
    /// Returns the tier derived from the current visit count.
    pub fn reward_tier(&self) -> RewardTier {
        next_reward(self.visits)
    }

    /// Checks that the stored reward text matches the visit count.
    pub fn is_tier_consistent(&self) -> bool {
        self.next_reward == self.reward_tier().description
    }
}

// =============================================================================
// New Customer
// =============================================================================

/// Fields collected by the registration form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct NewCustomer {
    #[serde(rename = "nombre")]
    pub name: String,

    pub email: String,

    #[serde(rename = "telefono", default)]
    pub phone: Option<String>,
}

impl NewCustomer {
    /// Creates a new customer form with no phone.
    pub fn new(name: impl Into<String>, email: impl Into<String>) -> Self {
        NewCustomer {
            name: name.into(),
            email: email.into(),
            phone: None,
        }
    }

    /// Sets the phone number.
    pub fn with_phone(mut self, phone: impl Into<String>) -> Self {
        self.phone = Some(phone.into());
        self
    }
}

// =============================================================================
// Customer Update
// =============================================================================

/// A partial update to a customer document.
///
/// Only fields that are `Some` are written. The visit count and reward text
/// can only be set together through [`CustomerUpdate::visits`], which keeps
/// `proximaRecompensa` in step with `visitas`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CustomerUpdate {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    visits: Option<u32>,
    next_reward: Option<String>,
    pub last_visit: Option<DateTime<Utc>>,
    pub redeemed_rewards: Option<BTreeSet<String>>,
    pub serial_number: Option<String>,
    pub push_token: Option<String>,
    pub device_library_identifier: Option<String>,
    pub pass_type_identifier: Option<String>,
    pub last_pass_update: Option<DateTime<Utc>>,
}

impl CustomerUpdate {
    /// Creates an empty update.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the visit count and the matching reward text.
    pub fn visits(mut self, visits: u32) -> Self {
        self.visits = Some(visits);
        self.next_reward = Some(next_reward(visits).description);
        self
    }

    /// Sets the last visit timestamp.
    pub fn last_visit(mut self, at: DateTime<Utc>) -> Self {
        self.last_visit = Some(at);
        self
    }

    /// Sets the last pass update timestamp.
    pub fn last_pass_update(mut self, at: DateTime<Utc>) -> Self {
        self.last_pass_update = Some(at);
        self
    }

    /// Replaces the redeemed reward set.
    pub fn redeemed_rewards(mut self, rewards: BTreeSet<String>) -> Self {
        self.redeemed_rewards = Some(rewards);
        self
    }

    /// Visit count set by this update, if any.
    pub fn visit_count(&self) -> Option<u32> {
        self.visits
    }

    /// Reward text set by this update, if any.
    pub fn reward_text(&self) -> Option<&str> {
        self.next_reward.as_deref()
    }

    /// Returns true when the update would not change anything.
    pub fn is_empty(&self) -> bool {
        *self == CustomerUpdate::default()
    }

    /// Applies the update to an in-memory customer.
    pub fn apply_to(&self, customer: &mut Customer) {
        if let Some(name) = &self.name {
            customer.name = name.clone();
        }
        if let Some(email) = &self.email {
            customer.email = email.clone();
        }
        if let Some(phone) = &self.phone {
            customer.phone = Some(phone.clone());
        }
        if let Some(visits) = self.visits {
            customer.visits = visits;
        }
        if let Some(reward) = &self.next_reward {
            customer.next_reward = reward.clone();
        }
        if let Some(at) = self.last_visit {
            customer.last_visit = at;
        }
        if let Some(rewards) = &self.redeemed_rewards {
            customer.redeemed_rewards = rewards.clone();
        }
        if let Some(serial) = &self.serial_number {
            customer.serial_number = Some(serial.clone());
        }
        if let Some(token) = &self.push_token {
            customer.push.push_token = Some(token.clone());
        }
        if let Some(device) = &self.device_library_identifier {
            customer.push.device_library_identifier = Some(device.clone());
        }
        if let Some(pass_type) = &self.pass_type_identifier {
            customer.push.pass_type_identifier = Some(pass_type.clone());
        }
        if let Some(at) = self.last_pass_update {
            customer.push.last_pass_update = Some(at);
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_customer() -> Customer {
        let now = Utc::now();
        Customer {
            id: "abc123".to_string(),
            name: "Ana".to_string(),
            email: "ana@example.com".to_string(),
            phone: None,
            visits: 3,
            last_visit: now,
            registered_at: now,
            next_reward: "Free Dessert".to_string(),
            redeemed_rewards: BTreeSet::new(),
            serial_number: None,
            push: PushMetadata::default(),
        }
    }

    #[test]
    fn test_visits_update_keeps_tier_in_step() {
        let update = CustomerUpdate::new().visits(12);
        assert_eq!(update.visit_count(), Some(12));
        assert_eq!(update.reward_text(), Some("Hand Gel Treatment"));
    }

    #[test]
    fn test_apply_update() {
        let mut customer = sample_customer();
        CustomerUpdate::new().visits(5).apply_to(&mut customer);

        assert_eq!(customer.visits, 5);
        assert_eq!(customer.next_reward, "Free Drink");
        assert!(customer.is_tier_consistent());
    }

    #[test]
    fn test_empty_update() {
        assert!(CustomerUpdate::new().is_empty());
        assert!(!CustomerUpdate::new().visits(0).is_empty());
    }

    #[test]
    fn test_customer_wire_names() {
        let json = serde_json::to_value(sample_customer()).unwrap();
        assert_eq!(json["nombre"], "Ana");
        assert_eq!(json["visitas"], 3);
        assert_eq!(json["proximaRecompensa"], "Free Dessert");
        assert!(json.get("telefono").is_none());
        assert!(json.get("pushToken").is_none());
    }

    #[test]
    fn test_customer_push_fields_flattened() {
        let mut customer = sample_customer();
        customer.push.push_token = Some("tok".to_string());

        let json = serde_json::to_value(&customer).unwrap();
        assert_eq!(json["pushToken"], "tok");

        let back: Customer = serde_json::from_value(json).unwrap();
        assert_eq!(back.push.push_token.as_deref(), Some("tok"));
    }
}
