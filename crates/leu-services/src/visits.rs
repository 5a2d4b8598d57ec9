//! # Visit Registration
//!
//! Records one physical visit: bump the counter, move the reward tier, wrap
//! the cycle at 25, then ask the pass service to refresh the wallet pass.
//!
//! ## Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  register_visit(id)                                                     │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  get_versioned(id) ──── None ───► NotFound (nothing written)            │
//! │       │ (customer, v)                                                   │
//! │       ▼                                                                 │
//! │  advance_visit(visits)          24 → 0 + cycle_completed                │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  update_if_version(id, v, ...) ── VersionConflict ──► pause, re-read    │
//! │       │                            (bounded, then Storage)              │
//! │       ▼                                                                 │
//! │  notify_pass_update(id) ──── Err ───► warn!, kept on the receipt        │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  VisitReceipt                                                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Calls are not idempotent: every call is one more visit.

use std::sync::Arc;
use std::time::Duration;

use backoff::backoff::Backoff;
use backoff::ExponentialBackoff;
use chrono::{DateTime, Utc};
use serde::{Serialize, Serializer};
use tracing::{debug, info, instrument, warn};

use leu_core::{advance_visit, Customer, CustomerUpdate, RewardTier, VisitTransition};
use leu_db::{CustomerRepository, DbError};

use crate::config::VisitSettings;
use crate::error::{LoyaltyError, LoyaltyResult};
use crate::pass::PassService;

/// What a registered visit produced.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VisitReceipt {
    pub customer_id: String,

    /// Stored visit count after this visit (0 when the cycle wrapped).
    pub visits: u32,

    /// Reward the customer is now working towards.
    pub reward: RewardTier,

    /// True when this visit completed the 25-visit cycle.
    pub cycle_completed: bool,

    /// Value written to `ultimaVisita`.
    pub visited_at: DateTime<Utc>,

    /// Set when the pass update notification failed. The visit still counts.
    ///
    /// Serialized as `passWarning`, the staff-facing text of the error.
    #[serde(
        rename = "passWarning",
        serialize_with = "serialize_warning",
        skip_serializing_if = "Option::is_none"
    )]
    pub notification_error: Option<LoyaltyError>,
}

fn serialize_warning<S: Serializer>(
    error: &Option<LoyaltyError>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    match error {
        Some(e) => serializer.serialize_str(e.user_message()),
        None => serializer.serialize_none(),
    }
}

impl VisitReceipt {
    /// True when the wallet pass was asked to refresh.
    pub fn pass_notified(&self) -> bool {
        self.notification_error.is_none()
    }
}

/// Registers visits against the customer repository.
#[derive(Clone)]
pub struct VisitService {
    customers: CustomerRepository,
    passes: Arc<dyn PassService>,
    settings: VisitSettings,
}

impl VisitService {
    pub fn new(
        customers: CustomerRepository,
        passes: Arc<dyn PassService>,
        settings: VisitSettings,
    ) -> Self {
        VisitService {
            customers,
            passes,
            settings,
        }
    }

    /// Repository visits are written through.
    pub fn customers(&self) -> &CustomerRepository {
        &self.customers
    }

    /// Registers one visit for `customer_id`.
    ///
    /// ## Errors
    /// - `NotFound` when the id is unknown; nothing is written
    /// - `Storage` when the store fails or the write keeps losing races
    ///
    /// A failed pass notification is not an error; it is returned in
    /// [`VisitReceipt::notification_error`].
    #[instrument(skip(self))]
    pub async fn register_visit(&self, customer_id: &str) -> LoyaltyResult<VisitReceipt> {
        let (customer, transition, visited_at) = self.write_visit(customer_id).await?;

        info!(
            customer_id,
            visits = transition.stored_visits,
            reward = %transition.tier.description,
            cycle_completed = transition.cycle_completed,
            "Visit registered"
        );

        let notification_error = match self.passes.notify_pass_update(customer_id).await {
            Ok(()) => None,
            Err(e) => {
                warn!(customer_id, error = %e, "Pass update notification failed; visit kept");
                Some(e)
            }
        };

        Ok(VisitReceipt {
            customer_id: customer.id,
            visits: transition.stored_visits,
            reward: transition.tier,
            cycle_completed: transition.cycle_completed,
            visited_at,
            notification_error,
        })
    }

    async fn write_visit(
        &self,
        customer_id: &str,
    ) -> LoyaltyResult<(Customer, VisitTransition, DateTime<Utc>)> {
        let mut backoff = self.retry_backoff();
        let mut conflicts = 0u32;

        loop {
            let current = self
                .customers
                .get_versioned(customer_id)
                .await?
                .ok_or_else(|| LoyaltyError::NotFound(customer_id.to_string()))?;

            let transition = advance_visit(current.value.visits);
            let now = Utc::now();
            let visited_at = now.max(current.value.last_visit);

            let update = CustomerUpdate::new()
                .visits(transition.stored_visits)
                .last_visit(visited_at)
                .last_pass_update(now);

            match self
                .customers
                .update_if_version(customer_id, current.version, &update)
                .await
            {
                Ok(written) => return Ok((written.value, transition, visited_at)),
                Err(DbError::VersionConflict { .. })
                    if conflicts < self.settings.max_conflict_retries =>
                {
                    conflicts += 1;
                    let pause = backoff
                        .next_backoff()
                        .unwrap_or(Duration::from_millis(self.settings.retry_max_ms));
                    debug!(customer_id, attempt = conflicts, ?pause, "Concurrent visit, re-reading");
                    tokio::time::sleep(pause).await;
                }
                Err(e @ DbError::VersionConflict { .. }) => {
                    warn!(customer_id, conflicts, "Gave up registering visit after repeated conflicts");
                    return Err(LoyaltyError::Storage(e.to_string()));
                }
                Err(e) => return Err(e.into()),
            }
        }
    }

    fn retry_backoff(&self) -> ExponentialBackoff {
        ExponentialBackoff {
            initial_interval: Duration::from_millis(self.settings.retry_initial_ms),
            max_interval: Duration::from_millis(self.settings.retry_max_ms),
            multiplier: 2.0,
            max_elapsed_time: None,
            ..Default::default()
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
