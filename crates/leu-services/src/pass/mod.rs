//! # Pass Service Client
//!
//! Talks to the external wallet pass service: minting a pass for a new
//! customer, asking it to push an update after a visit, and looking a
//! customer up by id.
//!
//! ## Seam
//! ```text
//! RegistrationService ──┐
//!                       ├──► Arc<dyn PassService> ──► HttpPassClient ──► pass service
//! VisitService ─────────┘                       └──► MockPassService (tests)
//! ```
//!
//! No call here retries. A failed generation is reported to the caller, and
//! a failed notification is reported on the visit receipt.

use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use reqwest::{Client, StatusCode};
use serde_json::Value;
use tracing::{debug, info, instrument, warn};

use leu_core::Customer;

use crate::config::PassSettings;
use crate::error::{LoyaltyError, LoyaltyResult};

pub mod protocol;

pub use protocol::PassOutcome;

// =============================================================================
// Trait
// =============================================================================

/// Operations the loyalty flows need from the pass service.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PassService: Send + Sync {
    /// Mints a pass for `customer` and returns its download URL.
    async fn issue_pass(&self, customer: &Customer) -> LoyaltyResult<String>;

    /// Asks the pass service to push a refreshed pass to the customer's device.
    async fn notify_pass_update(&self, customer_id: &str) -> LoyaltyResult<()>;

    /// Looks a customer up through the pass service. `Ok(None)` on 404.
    async fn fetch_customer(&self, customer_id: &str) -> LoyaltyResult<Option<Customer>>;
}

// =============================================================================
// HTTP Client
// =============================================================================

/// reqwest-backed pass service client.
#[derive(Debug, Clone)]
pub struct HttpPassClient {
    client: Client,
    base_url: String,
    pass_type_identifier: String,
}

impl HttpPassClient {
    /// Creates a client from the pass settings.
    pub fn new(settings: &PassSettings) -> LoyaltyResult<Self> {
        Self::with_base_url(
            settings.effective_base_url(),
            &settings.pass_type_identifier,
            settings.request_timeout(),
        )
    }

    /// Creates a client for an explicit base URL.
    pub fn with_base_url(
        base_url: &str,
        pass_type_identifier: &str,
        timeout: Duration,
    ) -> LoyaltyResult<Self> {
        let parsed = url::Url::parse(base_url)?;

        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| LoyaltyError::InvalidConfig(format!("HTTP client: {e}")))?;

        info!(base_url = %parsed, "Pass service client ready");

        Ok(HttpPassClient {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            pass_type_identifier: pass_type_identifier.to_string(),
        })
    }

    /// Base URL requests go to.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/api/{}", self.base_url, path)
    }
}

#[async_trait]
impl PassService for HttpPassClient {
    #[instrument(skip(self, customer), fields(customer_id = %customer.id))]
    async fn issue_pass(&self, customer: &Customer) -> LoyaltyResult<String> {
        let body = protocol::generate_request(customer, &self.pass_type_identifier, Utc::now())
            .map_err(|e| LoyaltyError::PassGeneration(e.to_string()))?;

        let response = self
            .client
            .post(self.endpoint("passes/generate"))
            .header("Accept", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| LoyaltyError::PassGeneration(e.to_string()))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| LoyaltyError::PassGeneration(e.to_string()))?;

        if !status.is_success() {
            let reason = protocol::error_message(&text)
                .unwrap_or_else(|| format!("pass service returned {status}"));
            warn!(%status, reason = %reason, "Pass generation rejected");
            return Err(LoyaltyError::PassGeneration(reason));
        }

        match protocol::interpret_generate_response(&text) {
            PassOutcome::Issued { url } => {
                info!(pass_url = %url, "Pass issued");
                Ok(url)
            }
            PassOutcome::Rejected { reason } => {
                warn!(reason = %reason, "Pass service returned no usable pass");
                Err(LoyaltyError::PassGeneration(reason))
            }
        }
    }

    #[instrument(skip(self))]
    async fn notify_pass_update(&self, customer_id: &str) -> LoyaltyResult<()> {
        let notification_error = |reason: String| LoyaltyError::Notification {
            customer_id: customer_id.to_string(),
            reason,
        };

        let response = self
            .client
            .post(self.endpoint("push/update-pass"))
            .header("Accept", "application/json")
            .json(&protocol::PassUpdateRequest::new(customer_id, Utc::now()))
            .send()
            .await
            .map_err(|e| notification_error(e.to_string()))?;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(notification_error(format!(
                "pass service returned {status}"
            )));
        }

        debug!("Pass update requested");
        Ok(())
    }

    #[instrument(skip(self))]
    async fn fetch_customer(&self, customer_id: &str) -> LoyaltyResult<Option<Customer>> {
        let lookup_error = |e: String| LoyaltyError::Storage(format!("customer lookup: {e}"));

        let response = self
            .client
            .get(self.endpoint(&format!("passes/{customer_id}")))
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(|e| lookup_error(e.to_string()))?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            debug!("Customer unknown to pass service");
            return Ok(None);
        }
        if !status.is_success() {
            return Err(lookup_error(format!("pass service returned {status}")));
        }

        let body = response
            .json::<Value>()
            .await
            .map_err(|e| lookup_error(e.to_string()))?;

        let customer = protocol::customer_from_lookup(customer_id, body)
            .map_err(|e| lookup_error(e.to_string()))?;

        Ok(Some(customer))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{DeploymentMode, PassSettings};

    #[test]
    fn test_client_uses_mode_url() {
        let settings = PassSettings {
            mode: DeploymentMode::Production,
            ..PassSettings::default()
        };
        let client = HttpPassClient::new(&settings).unwrap();

        assert_eq!(client.base_url(), "https://api.leubeautylab.com");
        assert_eq!(
            client.endpoint("push/update-pass"),
            "https://api.leubeautylab.com/api/push/update-pass"
        );
    }

    #[test]
    fn test_client_rejects_bad_url() {
        let err = HttpPassClient::with_base_url("::nope", "pass.x", Duration::from_secs(1))
            .unwrap_err();
        assert!(err.is_config_error());
    }
}
