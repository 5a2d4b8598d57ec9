//! # Scanner Flow
//!
//! Turns a decoded QR payload into a registered visit and a refreshed
//! customer for the scanner view.
//!
//! ```text
//! code ─► validate_scan_code ─► cooldown check ─► register_visit ─► get_by_id
//!            │ Validation          │ DuplicateScan     │ NotFound/Storage
//! ```
//!
//! Cameras report the same QR code many times per second. A code seen again
//! within the cooldown window is rejected with `DuplicateScan` so one visit
//! is not counted twice. The window starts when the code is first accepted,
//! whether or not the visit then succeeds.

use std::collections::HashMap;
use std::time::Duration;

use serde::Serialize;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{debug, info, instrument};

use leu_core::validation::validate_scan_code;
use leu_core::Customer;

use crate::error::{LoyaltyError, LoyaltyResult};
use crate::visits::{VisitReceipt, VisitService};

/// Message shown for a plain successful visit.
pub const VISIT_REGISTERED_MESSAGE: &str = "¡Visita registrada exitosamente!";

/// Result of a scan, ready for the scanner view.
#[derive(Debug, Clone, Serialize)]
pub struct ScanOutcome {
    /// The customer as stored after the visit.
    pub customer: Customer,

    pub receipt: VisitReceipt,

    /// Staff-facing message.
    pub message: String,
}

/// Session-scoped scanner.
pub struct ScannerService {
    visits: VisitService,
    cooldown: Duration,
    recent: Mutex<HashMap<String, Instant>>,
}

impl ScannerService {
    pub fn new(visits: VisitService, cooldown: Duration) -> Self {
        ScannerService {
            visits,
            cooldown,
            recent: Mutex::new(HashMap::new()),
        }
    }

    /// Handles one decoded QR code.
    #[instrument(skip(self))]
    pub async fn scan(&self, code: &str) -> LoyaltyResult<ScanOutcome> {
        let customer_id = validate_scan_code(code)?;
        self.claim(customer_id).await?;

        let receipt = self.visits.register_visit(customer_id).await?;

        let customer = self
            .visits
            .customers()
            .get_by_id(customer_id)
            .await?
            .ok_or_else(|| LoyaltyError::NotFound(customer_id.to_string()))?;

        let message = scan_message(&customer, &receipt);
        info!(customer_id, visits = customer.visits, "Scan handled");

        Ok(ScanOutcome {
            customer,
            receipt,
            message,
        })
    }

    /// Records `code` as seen, or fails if it was seen inside the window.
    async fn claim(&self, code: &str) -> LoyaltyResult<()> {
        let now = Instant::now();
        let mut recent = self.recent.lock().await;

        recent.retain(|_, seen| now.duration_since(*seen) < self.cooldown);

        if recent.contains_key(code) {
            debug!(code, "Ignoring repeat scan inside cooldown");
            return Err(LoyaltyError::DuplicateScan {
                code: code.to_string(),
            });
        }

        recent.insert(code.to_string(), now);
        Ok(())
    }
}

/// Builds the staff-facing message for a completed scan.
///
/// Cycle completion wins over a pass update warning.
pub fn scan_message(customer: &Customer, receipt: &VisitReceipt) -> String {
    if receipt.cycle_completed {
        format!(
            "¡Felicitaciones! {} ha completado el ciclo de recompensas!",
            customer.name
        )
    } else if let Some(warning) = &receipt.notification_error {
        warning.user_message().to_string()
    } else {
        VISIT_REGISTERED_MESSAGE.to_string()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use leu_core::{CustomerUpdate, NewCustomer};
    use leu_db::{CustomerRepository, MemoryDocumentStore};

    use super::*;
    use crate::config::VisitSettings;
    use crate::pass::MockPassService;

    async fn setup(notifications: usize) -> (CustomerRepository, ScannerService) {
        let mut passes = MockPassService::new();
        passes
            .expect_notify_pass_update()
            .times(notifications)
            .returning(|_| Ok(()));

        let repo = CustomerRepository::new(Arc::new(MemoryDocumentStore::new()));
        let visits = VisitService::new(repo.clone(), Arc::new(passes), VisitSettings::default());
        let scanner = ScannerService::new(visits, Duration::from_millis(3000));
        (repo, scanner)
    }

    #[tokio::test(start_paused = true)]
    async fn test_scan_registers_visit() {
        let (repo, scanner) = setup(1).await;
        let created = repo
            .create(&NewCustomer::new("Ana", "ana@mail.com"))
            .await
            .unwrap();

        let outcome = scanner.scan(&format!("  {}\n", created.id)).await.unwrap();

        assert_eq!(outcome.customer.visits, 1);
        assert_eq!(outcome.receipt.visits, 1);
        assert_eq!(outcome.message, VISIT_REGISTERED_MESSAGE);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cycle_completion_message() {
        let (repo, scanner) = setup(1).await;
        let created = repo
            .create(&NewCustomer::new("Ana", "ana@mail.com"))
            .await
            .unwrap();
        repo.update(&created.id, &CustomerUpdate::new().visits(24))
            .await
            .unwrap();

        let outcome = scanner.scan(&created.id).await.unwrap();

        assert_eq!(outcome.customer.visits, 0);
        assert_eq!(
            outcome.message,
            "¡Felicitaciones! Ana ha completado el ciclo de recompensas!"
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_repeat_scan_inside_cooldown() {
        let (repo, scanner) = setup(2).await;
        let created = repo
            .create(&NewCustomer::new("Ana", "ana@mail.com"))
            .await
            .unwrap();

        scanner.scan(&created.id).await.unwrap();
        let err = scanner.scan(&created.id).await.unwrap_err();
        assert!(matches!(err, LoyaltyError::DuplicateScan { .. }));

        tokio::time::advance(Duration::from_millis(3001)).await;
        let outcome = scanner.scan(&created.id).await.unwrap();
        assert_eq!(outcome.customer.visits, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_pass_update_failure_is_reported_softly() {
        let mut passes = MockPassService::new();
        passes.expect_notify_pass_update().times(2).returning(|id| {
            Err(LoyaltyError::Notification {
                customer_id: id.to_string(),
                reason: "pass service returned 503".to_string(),
            })
        });
        let repo = CustomerRepository::new(Arc::new(MemoryDocumentStore::new()));
        let visits = VisitService::new(repo.clone(), Arc::new(passes), VisitSettings::default());
        let scanner = ScannerService::new(visits, Duration::from_millis(3000));

        let ana = repo
            .create(&NewCustomer::new("Ana", "ana@mail.com"))
            .await
            .unwrap();
        let outcome = scanner.scan(&ana.id).await.unwrap();

        assert_eq!(outcome.customer.visits, 1);
        assert!(!outcome.receipt.pass_notified());
        assert_eq!(
            outcome.message,
            "Visita registrada. La tarjeta se actualizará más tarde."
        );

        let bea = repo
            .create(&NewCustomer::new("Bea", "bea@mail.com"))
            .await
            .unwrap();
        repo.update(&bea.id, &CustomerUpdate::new().visits(24))
            .await
            .unwrap();
        let outcome = scanner.scan(&bea.id).await.unwrap();

        assert!(outcome.receipt.cycle_completed);
        assert_eq!(
            outcome.message,
            "¡Felicitaciones! Bea ha completado el ciclo de recompensas!"
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_unknown_and_empty_codes() {
        let (_, scanner) = setup(0).await;

        assert!(matches!(
            scanner.scan("   ").await.unwrap_err(),
            LoyaltyError::Validation(_)
        ));
        assert!(matches!(
            scanner.scan("ghost").await.unwrap_err(),
            LoyaltyError::NotFound(_)
        ));
    }
}
