//! # Customer Repository
//!
//! Reads and writes customer documents in the `clientes` collection.
//!
//! ## Document Shape
//! ```text
//! ┌──────────────────────────┬──────────────────────────────────────────────┐
//! │ nombre                   │ string                                       │
//! │ email                    │ string, lower-cased at registration          │
//! │ telefono                 │ string, absent when not given                │
//! │ visitas                  │ integer, 0..25                               │
//! │ ultimaVisita             │ timestamp                                    │
//! │ fechaRegistro            │ timestamp                                    │
//! │ proximaRecompensa        │ string, next_reward(visitas).description     │
//! │ recompensasCanjeadas     │ array of strings                             │
//! │ serialNumber             │ string, set by the pass service              │
//! │ pushToken                │ string, set by the pass service              │
//! │ deviceLibraryIdentifier  │ string, set by the pass service              │
//! │ passTypeIdentifier       │ string                                       │
//! │ lastPassUpdate           │ timestamp                                    │
//! └──────────────────────────┴──────────────────────────────────────────────┘
//! ```
//!
//! Documents written by older clients may lack fields or carry timestamps in
//! other shapes. Reading is lenient about timestamps (missing or unreadable
//! becomes "now") and strict about `visitas` (anything but a non-negative
//! integer is an error).

use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, info, warn};

use leu_core::{next_reward, Customer, CustomerUpdate, NewCustomer, PushMetadata};

use crate::error::{DbError, DbResult};
use crate::store::{decode_timestamp, encode_timestamp, Document, DocumentStore, Fields, Versioned};

/// Stored field names.
pub mod fields {
    pub const NAME: &str = "nombre";
    pub const EMAIL: &str = "email";
    pub const PHONE: &str = "telefono";
    pub const VISITS: &str = "visitas";
    pub const LAST_VISIT: &str = "ultimaVisita";
    pub const REGISTERED_AT: &str = "fechaRegistro";
    pub const NEXT_REWARD: &str = "proximaRecompensa";
    pub const REDEEMED_REWARDS: &str = "recompensasCanjeadas";
    pub const SERIAL_NUMBER: &str = "serialNumber";
    pub const PUSH_TOKEN: &str = "pushToken";
    pub const DEVICE_LIBRARY_IDENTIFIER: &str = "deviceLibraryIdentifier";
    pub const PASS_TYPE_IDENTIFIER: &str = "passTypeIdentifier";
    pub const LAST_PASS_UPDATE: &str = "lastPassUpdate";
}

const ENTITY: &str = "Customer";

// =============================================================================
// Document Mapping
// =============================================================================

/// The plain string/array part of a customer body.
#[derive(Debug, Default, Deserialize)]
struct CustomerBody {
    #[serde(rename = "nombre", default)]
    name: Option<String>,

    #[serde(default)]
    email: Option<String>,

    #[serde(rename = "telefono", default)]
    phone: Option<String>,

    #[serde(rename = "recompensasCanjeadas", default)]
    redeemed_rewards: Option<BTreeSet<String>>,

    #[serde(rename = "serialNumber", default)]
    serial_number: Option<String>,

    #[serde(rename = "pushToken", default)]
    push_token: Option<String>,

    #[serde(rename = "deviceLibraryIdentifier", default)]
    device_library_identifier: Option<String>,

    #[serde(rename = "passTypeIdentifier", default)]
    pass_type_identifier: Option<String>,
}

fn read_visits(id: &str, body: &Fields) -> DbResult<u32> {
    let value = match body.get(fields::VISITS) {
        None | Some(Value::Null) => return Ok(0),
        Some(value) => value,
    };

    value
        .as_u64()
        .or_else(|| {
            value
                .as_f64()
                .filter(|f| *f >= 0.0 && f.fract() == 0.0)
                .map(|f| f as u64)
        })
        .and_then(|n| u32::try_from(n).ok())
        .ok_or_else(|| {
            DbError::Serialization(format!("customer {id}: visitas is not a visit count: {value}"))
        })
}

fn read_timestamp(id: &str, body: &Fields, key: &str) -> Option<DateTime<Utc>> {
    let value = body.get(key).filter(|v| !v.is_null())?;
    let decoded = decode_timestamp(value);
    if decoded.is_none() {
        warn!(customer_id = %id, field = key, value = %value, "Unreadable timestamp");
    }
    decoded
}

fn read_required_timestamp(id: &str, body: &Fields, key: &str) -> DateTime<Utc> {
    read_timestamp(id, body, key).unwrap_or_else(|| {
        debug!(customer_id = %id, field = key, "Timestamp missing, using now");
        Utc::now()
    })
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// Decodes a stored document into a customer.
pub fn customer_from_document(doc: &Document) -> DbResult<Customer> {
    let body: CustomerBody = serde_json::from_value(Value::Object(doc.fields.clone()))
        .map_err(|e| DbError::Serialization(format!("customer {}: {e}", doc.id)))?;

    let visits = read_visits(&doc.id, &doc.fields)?;
    let tier = next_reward(visits);

    match doc.fields.get(fields::NEXT_REWARD).and_then(Value::as_str) {
        Some(stored) if stored != tier.description => {
            debug!(
                customer_id = %doc.id,
                stored,
                derived = %tier.description,
                "Stored reward text out of step with visits"
            );
        }
        _ => {}
    }

    Ok(Customer {
        id: doc.id.clone(),
        name: body.name.unwrap_or_default(),
        email: body.email.unwrap_or_default(),
        phone: non_blank(body.phone),
        visits,
        last_visit: read_required_timestamp(&doc.id, &doc.fields, fields::LAST_VISIT),
        registered_at: read_required_timestamp(&doc.id, &doc.fields, fields::REGISTERED_AT),
        next_reward: tier.description,
        redeemed_rewards: body.redeemed_rewards.unwrap_or_default(),
        serial_number: non_blank(body.serial_number),
        push: PushMetadata {
            push_token: non_blank(body.push_token),
            device_library_identifier: non_blank(body.device_library_identifier),
            pass_type_identifier: non_blank(body.pass_type_identifier),
            last_pass_update: read_timestamp(&doc.id, &doc.fields, fields::LAST_PASS_UPDATE),
        },
    })
}

/// Builds the body of a freshly registered customer.
pub fn new_customer_fields(customer: &NewCustomer, now: DateTime<Utc>) -> Fields {
    let mut body = Fields::new();
    body.insert(fields::NAME.into(), json!(customer.name));
    body.insert(fields::EMAIL.into(), json!(customer.email));
    if let Some(phone) = &customer.phone {
        body.insert(fields::PHONE.into(), json!(phone));
    }
    body.insert(fields::VISITS.into(), json!(0));
    body.insert(fields::LAST_VISIT.into(), encode_timestamp(now));
    body.insert(fields::REGISTERED_AT.into(), encode_timestamp(now));
    body.insert(fields::NEXT_REWARD.into(), json!(next_reward(0).description));
    body.insert(fields::REDEEMED_REWARDS.into(), json!([]));
    body.insert(fields::LAST_PASS_UPDATE.into(), encode_timestamp(now));
    body
}

/// Builds the partial body for an update. Only set fields are included.
pub fn update_fields(update: &CustomerUpdate) -> Fields {
    let mut body = Fields::new();

    let mut put_str = |key: &str, value: &Option<String>| {
        if let Some(value) = value {
            body.insert(key.into(), json!(value));
        }
    };
    put_str(fields::NAME, &update.name);
    put_str(fields::EMAIL, &update.email);
    put_str(fields::PHONE, &update.phone);
    put_str(fields::SERIAL_NUMBER, &update.serial_number);
    put_str(fields::PUSH_TOKEN, &update.push_token);
    put_str(fields::DEVICE_LIBRARY_IDENTIFIER, &update.device_library_identifier);
    put_str(fields::PASS_TYPE_IDENTIFIER, &update.pass_type_identifier);

    if let Some(visits) = update.visit_count() {
        body.insert(fields::VISITS.into(), json!(visits));
    }
    if let Some(reward) = update.reward_text() {
        body.insert(fields::NEXT_REWARD.into(), json!(reward));
    }
    if let Some(at) = update.last_visit {
        body.insert(fields::LAST_VISIT.into(), encode_timestamp(at));
    }
    if let Some(rewards) = &update.redeemed_rewards {
        body.insert(fields::REDEEMED_REWARDS.into(), json!(rewards));
    }
    if let Some(at) = update.last_pass_update {
        body.insert(fields::LAST_PASS_UPDATE.into(), encode_timestamp(at));
    }

    body
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for customer documents.
#[derive(Debug, Clone)]
pub struct CustomerRepository {
    store: Arc<dyn DocumentStore>,
    collection: String,
}

impl CustomerRepository {
    /// Creates a repository over the default `clientes` collection.
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        CustomerRepository {
            store,
            collection: leu_core::CUSTOMERS_COLLECTION.to_string(),
        }
    }

    /// Uses a different collection name.
    pub fn with_collection(mut self, collection: impl Into<String>) -> Self {
        self.collection = collection.into();
        self
    }

    /// Name of the collection this repository reads.
    pub fn collection(&self) -> &str {
        &self.collection
    }

    /// Registers a customer with zero visits and the first reward tier.
    ///
    /// The form is stored as given; validation happens in the service layer.
    pub async fn create(&self, customer: &NewCustomer) -> DbResult<Customer> {
        let body = new_customer_fields(customer, Utc::now());
        let doc = self.store.insert(&self.collection, body).await?;

        info!(customer_id = %doc.id, "Customer registered");
        customer_from_document(&doc)
    }

    /// Fetches a customer. `Ok(None)` when the id is unknown.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Customer>> {
        Ok(self.get_versioned(id).await?.map(|v| v.value))
    }

    /// Fetches a customer along with the document version it was read at.
    pub async fn get_versioned(&self, id: &str) -> DbResult<Option<Versioned<Customer>>> {
        match self.store.get(&self.collection, id).await? {
            Some(doc) => Ok(Some(Versioned {
                value: customer_from_document(&doc)?,
                version: doc.version,
            })),
            None => Ok(None),
        }
    }

    /// Lists every customer in registration order.
    pub async fn list_all(&self) -> DbResult<Vec<Customer>> {
        let docs = self.store.list(&self.collection).await?;
        debug!(count = docs.len(), "Listed customers");

        docs.iter().map(customer_from_document).collect()
    }

    /// Merges an update into an existing customer.
    ///
    /// Fails with `DbError::NotFound` for an unknown id; never creates.
    pub async fn update(&self, id: &str, update: &CustomerUpdate) -> DbResult<Customer> {
        let doc = self
            .store
            .update(&self.collection, id, update_fields(update))
            .await
            .map_err(|e| with_entity(e, id))?;

        customer_from_document(&doc)
    }

    /// Merges an update only if the customer is still at `expected_version`.
    pub async fn update_if_version(
        &self,
        id: &str,
        expected_version: i64,
        update: &CustomerUpdate,
    ) -> DbResult<Versioned<Customer>> {
        let doc = self
            .store
            .update_if_version(&self.collection, id, expected_version, update_fields(update))
            .await
            .map_err(|e| with_entity(e, id))?;

        Ok(Versioned {
            value: customer_from_document(&doc)?,
            version: doc.version,
        })
    }

    /// Number of registered customers.
    pub async fn count(&self) -> DbResult<u64> {
        self.store.count(&self.collection).await
    }
}

fn with_entity(err: DbError, id: &str) -> DbError {
    if err.is_not_found() {
        DbError::not_found(ENTITY, id)
    } else {
        err
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
