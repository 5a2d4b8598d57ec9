//! # leu-core: Pure Loyalty Logic for Leu Beauty
//!
//! This crate is the **heart** of the loyalty program. It contains the reward
//! tier policy and every other business rule as pure functions with zero I/O
//! dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Leu Loyalty Architecture                          │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    Frontend (web views)                         │   │
//! │  │     Scanner ──► Admin Dashboard ──► New Customer Form           │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    leu-services                                 │   │
//! │  │    register_visit, register, scan, dashboard, pass client       │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ leu-core (THIS CRATE) ★                         │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │   types   │  │  reward   │  │   stats   │  │ validation│  │   │
//! │  │   │ Customer  │  │ next_     │  │ Dashboard │  │   rules   │  │   │
//! │  │   │ NewCust.  │  │  reward   │  │  Stats    │  │  checks   │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    leu-db (Document Store Layer)                │   │
//! │  │          "clientes" collection, customer repository             │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Customer, NewCustomer, CustomerUpdate)
//! - [`reward`] - Reward tier policy and the visit transition
//! - [`stats`] - Dashboard aggregation and search filter
//! - [`error`] - Domain error types
//! - [`validation`] - Registration form validation
//!
//! ## Example Usage
//!
//! ```rust
//! use leu_core::reward::{advance_visit, next_reward};
//!
//! assert_eq!(next_reward(7).description, "Free Drink");
//!
//! // The 25th visit wraps the cycle: the stored count goes back to zero.
//! let transition = advance_visit(24);
//! assert_eq!(transition.stored_visits, 0);
//! assert!(transition.cycle_completed);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod reward;
pub mod stats;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use error::ValidationError;
pub use reward::{advance_visit, is_reward_due, next_reward, Reward, RewardTier, VisitTransition};
pub use stats::{compute_stats, filter_customers, DashboardStats};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Name of the document store collection holding one document per customer.
pub const CUSTOMERS_COLLECTION: &str = "clientes";

/// Visit count at which the reward cycle completes and the counter wraps.
pub const CYCLE_LENGTH: u32 = 25;

/// Number of visits in each reward band.
pub const BAND_WIDTH: u32 = 5;

/// Pass type identifier sent to the pass service when none is configured.
pub const DEFAULT_PASS_TYPE_IDENTIFIER: &str = "pass.com.salondenails.loyalty";
