//! # Customer Registration
//!
//! The new-customer form flow: validate, persist, mint a wallet pass.
//!
//! ```text
//! NewCustomer ─► validate_new_customer ─► customers.create ─► passes.issue_pass
//!                  │ Validation                │ Storage            │ PassGeneration
//!                  ▼                           ▼                    ▼
//!              nothing stored             nothing stored     customer kept,
//!                                                            reissue_pass(id)
//! ```

use std::sync::Arc;

use serde::Serialize;
use tracing::{info, instrument, warn};

use leu_core::validation::validate_new_customer;
use leu_core::{Customer, NewCustomer};
use leu_db::CustomerRepository;

use crate::error::{LoyaltyError, LoyaltyResult};
use crate::pass::PassService;

/// A registered customer and the URL of their pass.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Registration {
    pub customer: Customer,
    pub pass_url: String,
}

/// Registers new customers.
#[derive(Clone)]
pub struct RegistrationService {
    customers: CustomerRepository,
    passes: Arc<dyn PassService>,
}

impl RegistrationService {
    pub fn new(customers: CustomerRepository, passes: Arc<dyn PassService>) -> Self {
        RegistrationService { customers, passes }
    }

    /// Validates the form, stores the customer, and issues their pass.
    ///
    /// When pass issuance fails the customer stays stored and the
    /// `PassGeneration` error is returned; call [`Self::reissue_pass`] with
    /// the customer's id to try again without creating a duplicate.
    #[instrument(skip(self, form), fields(email = %form.email))]
    pub async fn register(&self, form: &NewCustomer) -> LoyaltyResult<Registration> {
        let clean = validate_new_customer(form)?;
        let customer = self.customers.create(&clean).await?;

        info!(customer_id = %customer.id, "Customer stored, issuing pass");

        match self.passes.issue_pass(&customer).await {
            Ok(pass_url) => Ok(Registration { customer, pass_url }),
            Err(e) => {
                warn!(customer_id = %customer.id, error = %e, "Pass issuance failed after registration");
                Err(e)
            }
        }
    }

    /// Issues a pass for an already registered customer.
    #[instrument(skip(self))]
    pub async fn reissue_pass(&self, customer_id: &str) -> LoyaltyResult<Registration> {
        let customer = self
            .customers
            .get_by_id(customer_id)
            .await?
            .ok_or_else(|| LoyaltyError::NotFound(customer_id.to_string()))?;

        let pass_url = self.passes.issue_pass(&customer).await?;
        Ok(Registration { customer, pass_url })
    }
}

#[cfg(test)]
mod tests {
    use leu_db::MemoryDocumentStore;

    use super::*;
    use crate::pass::MockPassService;

    fn setup(passes: MockPassService) -> (Arc<MemoryDocumentStore>, CustomerRepository, RegistrationService) {
        let store = Arc::new(MemoryDocumentStore::new());
        let repo = CustomerRepository::new(store.clone());
        let service = RegistrationService::new(repo.clone(), Arc::new(passes));
        (store, repo, service)
    }

    #[tokio::test]
    async fn test_register_cleans_form_and_issues_pass() {
        let mut passes = MockPassService::new();
        passes
            .expect_issue_pass()
            .withf(|c| c.email == "ana@mail.com" && c.visits == 0)
            .times(1)
            .returning(|c| Ok(format!("/passes/{}.pkpass", c.id)));
        let (_, repo, service) = setup(passes);

        let form = NewCustomer::new("  Ana López ", "Ana@Mail.com ").with_phone(" ");
        let registration = service.register(&form).await.unwrap();

        assert_eq!(registration.customer.name, "Ana López");
        assert_eq!(registration.customer.phone, None);
        assert_eq!(registration.customer.next_reward, "Free Dessert");
        assert_eq!(
            registration.pass_url,
            format!("/passes/{}.pkpass", registration.customer.id)
        );
        assert_eq!(repo.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_invalid_form_stores_nothing() {
        let mut passes = MockPassService::new();
        passes.expect_issue_pass().never();
        let (store, _, service) = setup(passes);

        let err = service
            .register(&NewCustomer::new("Ana", "not-an-email"))
            .await
            .unwrap_err();

        assert!(matches!(err, LoyaltyError::Validation(_)));
        assert_eq!(store.writes(), 0);
    }

    #[tokio::test]
    async fn test_pass_failure_keeps_customer_and_reissue_works() {
        let mut passes = MockPassService::new();
        let mut calls = 0;
        passes
            .expect_issue_pass()
            .times(2)
            .returning(move |_| {
                calls += 1;
                if calls == 1 {
                    Err(LoyaltyError::PassGeneration("cert expired".to_string()))
                } else {
                    Ok("/passes/ok.pkpass".to_string())
                }
            });
        let (_, repo, service) = setup(passes);

        let err = service
            .register(&NewCustomer::new("Ana", "ana@mail.com"))
            .await
            .unwrap_err();
        assert!(matches!(err, LoyaltyError::PassGeneration(_)));

        let stored = repo.list_all().await.unwrap();
        assert_eq!(stored.len(), 1);

        let registration = service.reissue_pass(&stored[0].id).await.unwrap();
        assert_eq!(registration.pass_url, "/passes/ok.pkpass");
        assert_eq!(repo.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_reissue_unknown_customer() {
        let mut passes = MockPassService::new();
        passes.expect_issue_pass().never();
        let (_, _, service) = setup(passes);

        let err = service.reissue_pass("ghost").await.unwrap_err();
        assert!(matches!(err, LoyaltyError::NotFound(_)));
    }
}
