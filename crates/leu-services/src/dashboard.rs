//! Admin dashboard loader.
//!
//! Reads the whole customer collection and folds it into the headline
//! counters plus the filtered table rows.

use chrono::{DateTime, TimeZone};
use serde::Serialize;
use tracing::{debug, instrument};

use leu_core::validation::validate_search_query;
use leu_core::{compute_stats, filter_customers, Customer, DashboardStats};
use leu_db::CustomerRepository;

use crate::error::LoyaltyResult;

/// Everything the admin dashboard shows.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardView {
    pub stats: DashboardStats,

    /// Customers matching the search query, in registration order.
    pub customers: Vec<Customer>,
}

#[derive(Debug, Clone)]
pub struct DashboardService {
    customers: CustomerRepository,
}

impl DashboardService {
    pub fn new(customers: CustomerRepository) -> Self {
        DashboardService { customers }
    }

    /// Loads stats for `now` and every customer.
    pub async fn load<Tz: TimeZone>(&self, now: &DateTime<Tz>) -> LoyaltyResult<DashboardView> {
        self.search(now, "").await
    }

    /// Loads stats for `now` and the customers matching `query`.
    ///
    /// Stats always cover the whole collection; only the rows are filtered.
    #[instrument(skip(self, now))]
    pub async fn search<Tz: TimeZone>(
        &self,
        now: &DateTime<Tz>,
        query: &str,
    ) -> LoyaltyResult<DashboardView> {
        let query = validate_search_query(query)?;
        let all = self.customers.list_all().await?;

        let stats = compute_stats(&all, now);
        let customers: Vec<Customer> = filter_customers(&all, &query)
            .into_iter()
            .cloned()
            .collect();

        debug!(
            total = stats.total_customers,
            shown = customers.len(),
            "Dashboard loaded"
        );

        Ok(DashboardView { stats, customers })
    }
}
