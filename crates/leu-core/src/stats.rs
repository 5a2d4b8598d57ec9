//! # Dashboard Aggregation
//!
//! In-memory numbers for the admin dashboard, computed from the full customer
//! list. There is no analytics store; the dashboard reads every customer and
//! folds them here.
//!
//! ## Counters
//! ```text
//! ┌──────────────────────┬──────────────────────────────────────────────────┐
//! │ total_customers      │ every document in the collection                 │
//! │ visits_today         │ last visit falls on today's calendar day         │
//! │ rewards_due          │ next visit earns a reward (4, 9, 14, 19, 24)     │
//! │ new_this_month       │ registered on/after the 1st of this month        │
//! └──────────────────────┴──────────────────────────────────────────────────┘
//! ```
//!
//! "Today" and "this month" are judged in the timezone of the `now` value the
//! caller passes in, so the salon's local calendar is used rather than UTC.

use chrono::{DateTime, Datelike, TimeZone};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::reward::is_reward_due;
use crate::types::Customer;

/// Headline numbers shown on the admin dashboard.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub total_customers: usize,
    pub visits_today: usize,
    pub rewards_due: usize,
    pub new_this_month: usize,
}

/// Computes dashboard counters for `customers` as seen at `now`.
pub fn compute_stats<Tz: TimeZone>(customers: &[Customer], now: &DateTime<Tz>) -> DashboardStats {
    let tz = now.timezone();
    let today = now.date_naive();
    let month_start = today.with_day(1).unwrap_or(today);

    let mut stats = DashboardStats {
        total_customers: customers.len(),
        ..DashboardStats::default()
    };

    for customer in customers {
        if customer.last_visit.with_timezone(&tz).date_naive() == today {
            stats.visits_today += 1;
        }

        if is_reward_due(customer.visits) {
            stats.rewards_due += 1;
        }

        if customer.registered_at.with_timezone(&tz).date_naive() >= month_start {
            stats.new_this_month += 1;
        }
    }

    stats
}

/// Filters customers by a case-insensitive substring of name or email.
///
/// An empty (or blank) query returns every customer.
pub fn filter_customers<'a>(customers: &'a [Customer], query: &str) -> Vec<&'a Customer> {
    let needle = query.trim().to_lowercase();

    if needle.is_empty() {
        return customers.iter().collect();
    }

    customers
        .iter()
        .filter(|c| {
            c.name.to_lowercase().contains(&needle) || c.email.to_lowercase().contains(&needle)
        })
        .collect()
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use chrono::{Duration, FixedOffset, Utc};

    use super::*;
    use crate::types::PushMetadata;

    fn customer(name: &str, email: &str, visits: u32, last_visit: DateTime<Utc>, registered_at: DateTime<Utc>) -> Customer {
        Customer {
            id: name.to_lowercase(),
            name: name.to_string(),
            email: email.to_string(),
            phone: None,
            visits,
            last_visit,
            registered_at,
            next_reward: crate::reward::next_reward(visits).description,
            redeemed_rewards: BTreeSet::new(),
            serial_number: None,
            push: PushMetadata::default(),
        }
    }

    #[test]
    fn test_compute_stats() {
        let now = Utc.with_ymd_and_hms(2024, 3, 15, 18, 0, 0).unwrap();
        let long_ago = Utc.with_ymd_and_hms(2023, 11, 2, 12, 0, 0).unwrap();

        let customers = vec![
            customer("Ana", "ana@mail.com", 4, now - Duration::hours(2), now - Duration::days(3)),
            customer("Bea", "bea@mail.com", 9, now - Duration::days(1), long_ago),
            customer("Cris", "cris@mail.com", 10, long_ago, long_ago),
        ];

        let stats = compute_stats(&customers, &now);
        assert_eq!(stats.total_customers, 3);
        assert_eq!(stats.visits_today, 1);
        assert_eq!(stats.rewards_due, 2);
        assert_eq!(stats.new_this_month, 1);
    }

    #[test]
    fn test_stats_use_callers_timezone() {
        // 2024-03-15 03:00 UTC is still March 14th in Mexico City (UTC-6).
        let visit = Utc.with_ymd_and_hms(2024, 3, 15, 3, 0, 0).unwrap();
        let cdmx = FixedOffset::west_opt(6 * 3600).unwrap();
        let now_local = cdmx.with_ymd_and_hms(2024, 3, 14, 22, 0, 0).unwrap();

        let customers = vec![customer("Ana", "ana@mail.com", 0, visit, visit)];
        assert_eq!(compute_stats(&customers, &now_local).visits_today, 1);

        let now_utc = Utc.with_ymd_and_hms(2024, 3, 14, 22, 0, 0).unwrap();
        assert_eq!(compute_stats(&customers, &now_utc).visits_today, 0);
    }

    #[test]
    fn test_new_this_month_counts_from_first_of_month() {
        let now = Utc.with_ymd_and_hms(2024, 3, 15, 18, 0, 0).unwrap();
        let first = Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap();
        let last_month = Utc.with_ymd_and_hms(2024, 2, 29, 23, 59, 0).unwrap();
        let next_month = Utc.with_ymd_and_hms(2024, 4, 2, 9, 0, 0).unwrap();

        let customers = vec![
            customer("Ana", "ana@mail.com", 0, now, first),
            customer("Bea", "bea@mail.com", 0, now, last_month),
            customer("Cris", "cris@mail.com", 0, now, next_month),
        ];

        assert_eq!(compute_stats(&customers, &now).new_this_month, 2);
    }

    #[test]
    fn test_empty_stats() {
        let stats = compute_stats(&[], &Utc::now());
        assert_eq!(stats, DashboardStats::default());
    }

    #[test]
    fn test_filter_customers() {
        let now = Utc::now();
        let customers = vec![
            customer("Ana López", "ana@mail.com", 0, now, now),
            customer("Beatriz", "bea@salon.mx", 0, now, now),
        ];

        assert_eq!(filter_customers(&customers, "").len(), 2);
        assert_eq!(filter_customers(&customers, "LÓPEZ")[0].name, "Ana López");
        assert_eq!(filter_customers(&customers, "salon")[0].name, "Beatriz");
        assert!(filter_customers(&customers, "zzz").is_empty());
    }
}
