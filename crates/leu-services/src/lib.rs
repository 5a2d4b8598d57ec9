//! # leu-services: Loyalty Flows for Leu Beauty
//!
//! Orchestrates the scanner, registration and admin flows on top of the
//! pure reward logic in `leu-core` and the customer repository in `leu-db`,
//! and talks to the external wallet pass service over HTTP.
//!
//! ## Architecture Overview
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          LoyaltyServices                                │
//! │                                                                         │
//! │  ┌────────────────┐  ┌────────────────┐  ┌────────────────────────┐    │
//! │  │ ScannerService │  │ Registration   │  │ DashboardService       │    │
//! │  │                │  │ Service        │  │                        │    │
//! │  │ QR code ──►    │  │ form ──►       │  │ stats + search         │    │
//! │  │ cooldown       │  │ validate       │  │ over all customers     │    │
//! │  └───────┬────────┘  └───────┬────────┘  └───────────┬────────────┘    │
//! │          ▼                   │                       │                  │
//! │  ┌────────────────┐          │                       │                  │
//! │  │ VisitService   │          │                       │                  │
//! │  │ versioned      │          │                       │                  │
//! │  │ read-modify-   │          │                       │                  │
//! │  │ write + retry  │          │                       │                  │
//! │  └───┬───────┬────┘          │                       │                  │
//! │      │       └───────────────┼──────────┐            │                  │
//! │      ▼                       ▼          ▼            ▼                  │
//! │  ┌────────────────────────────────┐  ┌──────────────────────────────┐  │
//! │  │ Arc<dyn PassService>           │  │ CustomerRepository (leu-db)  │  │
//! │  │ HttpPassClient (reqwest)       │  │ over Arc<dyn DocumentStore>  │  │
//! │  └────────────────────────────────┘  └──────────────────────────────┘  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//! - [`config`] - TOML + environment configuration
//! - [`error`] - `LoyaltyError` and user-facing messages
//! - [`pass`] - `PassService` trait and the HTTP client
//! - [`visits`] - Visit registration with conflict retries
//! - [`registration`] - New-customer flow
//! - [`scanner`] - QR scan handling with repeat suppression
//! - [`dashboard`] - Admin stats and customer search
//!
//! ## Usage
//!
//! ```rust,ignore
//! use leu_services::{LoyaltyConfig, LoyaltyServices};
//!
//! let config = LoyaltyConfig::load_or_default(None);
//! let services = LoyaltyServices::connect(&config).await?;
//!
//! let outcome = services.scanner.scan(&qr_payload).await?;
//! println!("{}", outcome.message);
//! ```

use std::sync::Arc;

use tracing::info;

use leu_db::Database;

pub mod config;
pub mod dashboard;
pub mod error;
pub mod pass;
pub mod registration;
pub mod scanner;
pub mod visits;

pub use config::{DeploymentMode, LoyaltyConfig, PassSettings, ScannerSettings, StoreSettings, VisitSettings};
pub use dashboard::{DashboardService, DashboardView};
pub use error::{LoyaltyError, LoyaltyResult};
pub use pass::{HttpPassClient, PassOutcome, PassService};
pub use registration::{Registration, RegistrationService};
pub use scanner::{ScanOutcome, ScannerService};
pub use visits::{VisitReceipt, VisitService};

/// All loyalty flows wired to one store and one pass client.
pub struct LoyaltyServices {
    pub database: Database,
    pub visits: VisitService,
    pub registration: RegistrationService,
    pub scanner: ScannerService,
    pub dashboard: DashboardService,
}

impl LoyaltyServices {
    /// Validates `config`, opens the store and builds every service.
    pub async fn connect(config: &LoyaltyConfig) -> LoyaltyResult<Self> {
        config.validate()?;

        let database = Database::new(config.store.db_config()).await?;
        let passes: Arc<dyn PassService> = Arc::new(HttpPassClient::new(&config.pass)?);

        let services = Self::with_parts(database, passes, config);
        info!(mode = %config.mode(), "Loyalty services ready");
        Ok(services)
    }

    /// Builds the services over an already open store and pass client.
    pub fn with_parts(database: Database, passes: Arc<dyn PassService>, config: &LoyaltyConfig) -> Self {
        let customers = database.customers();

        let visits = VisitService::new(customers.clone(), passes.clone(), config.visits.clone());
        let registration = RegistrationService::new(customers.clone(), passes);
        let scanner = ScannerService::new(visits.clone(), config.scanner.cooldown());
        let dashboard = DashboardService::new(customers);

        LoyaltyServices {
            database,
            visits,
            registration,
            scanner,
            dashboard,
        }
    }
}

#[cfg(test)]
mod tests {
    use leu_core::NewCustomer;
    use leu_db::DbConfig;

    use super::*;
    use crate::pass::MockPassService;

    #[tokio::test]
    async fn test_wired_flows_share_one_store() {
        let database = Database::new(DbConfig::in_memory()).await.unwrap();

        let mut passes = MockPassService::new();
        passes
            .expect_issue_pass()
            .returning(|c| Ok(format!("/passes/{}.pkpass", c.id)));
        passes.expect_notify_pass_update().returning(|_| Ok(()));

        let services = LoyaltyServices::with_parts(database, Arc::new(passes), &LoyaltyConfig::default());

        let registration = services
            .registration
            .register(&NewCustomer::new("Ana", "ana@mail.com"))
            .await
            .unwrap();
        let outcome = services.scanner.scan(&registration.customer.id).await.unwrap();
        assert_eq!(outcome.customer.visits, 1);

        let view = services.dashboard.load(&chrono::Utc::now()).await.unwrap();
        assert_eq!(view.stats.total_customers, 1);
        assert_eq!(view.customers[0].visits, 1);
    }

    #[tokio::test]
    async fn test_connect_rejects_invalid_config() {
        let mut config = LoyaltyConfig::default();
        config.store.collection = String::new();

        let err = LoyaltyServices::connect(&config).await.err().unwrap();
        assert!(err.is_config_error());
    }
}
