//! # Pass Service Wire Format
//!
//! Request bodies sent to the pass service and the adapter that turns its
//! responses into a [`PassOutcome`].
//!
//! ## Endpoints
//! ```text
//! ┌────────────────────────────────┬──────────────────────────────────────────┐
//! │ POST /api/passes/generate      │ customer record                          │
//! │                                │   + passTypeIdentifier + lastPassUpdate  │
//! │                                │ → { passUrl } or                         │
//! │                                │   { success, passUrl?, error? }          │
//! ├────────────────────────────────┼──────────────────────────────────────────┤
//! │ POST /api/push/update-pass     │ { clienteId, timestamp (RFC 3339) }      │
//! │                                │ → 200 on success                         │
//! ├────────────────────────────────┼──────────────────────────────────────────┤
//! │ GET  /api/passes/{id}          │ → customer record, 404 if unknown        │
//! └────────────────────────────────┴──────────────────────────────────────────┘
//! ```
//!
//! Older deployments answer generation with a bare `{ passUrl }`, newer ones
//! wrap it in `{ success, passUrl, error }`. Both are accepted. Anything else,
//! including a success without a URL, is a rejection.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use leu_core::Customer;
use leu_db::repository::customer::customer_from_document;
use leu_db::{DbError, DbResult, Document};

// =============================================================================
// Outcome
// =============================================================================

/// Result of a pass generation request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PassOutcome {
    /// The pass was minted and can be downloaded from `url`.
    Issued { url: String },

    /// The service answered but produced no usable pass.
    Rejected { reason: String },
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum GenerateResponse {
    Envelope {
        success: bool,
        #[serde(rename = "passUrl", default)]
        pass_url: Option<String>,
        #[serde(default)]
        error: Option<String>,
    },
    Bare {
        #[serde(rename = "passUrl")]
        pass_url: String,
    },
}

impl From<GenerateResponse> for PassOutcome {
    fn from(response: GenerateResponse) -> Self {
        let (success, url, error) = match response {
            GenerateResponse::Envelope {
                success,
                pass_url,
                error,
            } => (success, pass_url, error),
            GenerateResponse::Bare { pass_url } => (true, Some(pass_url), None),
        };

        match url.filter(|u| !u.trim().is_empty()) {
            Some(url) if success => PassOutcome::Issued { url },
            _ => PassOutcome::Rejected {
                reason: error.unwrap_or_else(|| "No pass URL in response".to_string()),
            },
        }
    }
}

/// Interprets a generation response body. Unrecognized bodies are rejected.
pub fn interpret_generate_response(body: &str) -> PassOutcome {
    match serde_json::from_str::<GenerateResponse>(body) {
        Ok(response) => response.into(),
        Err(_) => PassOutcome::Rejected {
            reason: "Unrecognized pass service response".to_string(),
        },
    }
}

/// Pulls the `error` message out of a failed response body, if there is one.
pub fn error_message(body: &str) -> Option<String> {
    serde_json::from_str::<Value>(body)
        .ok()?
        .get("error")?
        .as_str()
        .map(str::to_string)
}

// =============================================================================
// Requests
// =============================================================================

/// Body of a generation request: the customer record plus pass fields.
pub fn generate_request(
    customer: &Customer,
    pass_type_identifier: &str,
    now: DateTime<Utc>,
) -> Result<Value, serde_json::Error> {
    let mut body = serde_json::to_value(customer)?;

    if let Value::Object(fields) = &mut body {
        fields.insert(
            "passTypeIdentifier".to_string(),
            Value::String(pass_type_identifier.to_string()),
        );
        fields.insert(
            "lastPassUpdate".to_string(),
            Value::String(now.to_rfc3339_opts(SecondsFormat::Millis, true)),
        );
    }

    Ok(body)
}

/// Body of a pass update notification.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PassUpdateRequest {
    pub cliente_id: String,
    pub timestamp: String,
}

impl PassUpdateRequest {
    pub fn new(customer_id: &str, now: DateTime<Utc>) -> Self {
        PassUpdateRequest {
            cliente_id: customer_id.to_string(),
            timestamp: now.to_rfc3339_opts(SecondsFormat::Millis, true),
        }
    }
}

// =============================================================================
// Responses
// =============================================================================

/// Decodes a customer lookup body with the same rules as a store read.
///
/// Timestamps may arrive in any stored shape and default to now when missing.
/// The reward text is re-derived from the visit count. The record's own `id`
/// wins over the one that was asked for.
pub fn customer_from_lookup(requested_id: &str, body: Value) -> DbResult<Customer> {
    let Value::Object(mut fields) = body else {
        return Err(DbError::Serialization(format!(
            "customer {requested_id}: lookup body is not an object"
        )));
    };

    let id = match fields.remove("id") {
        Some(Value::String(id)) if !id.trim().is_empty() => id,
        _ => requested_id.to_string(),
    };

    customer_from_document(&Document {
        id,
        version: 0,
        fields,
    })
}
