//! # Reward Tier Policy
//!
//! Maps a visit count to the next reward a customer is working towards.
//! This table is the only place reward text comes from; no caller ever sets
//! `proximaRecompensa` on its own.
//!
//! ## Reward Bands
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Reward Cycle (25 visits)                        │
//! │                                                                         │
//! │   visits   0 ─── 4 │ 5 ─── 9 │ 10 ── 14 │ 15 ── 19 │ 20 ── 24 │ 25     │
//! │            ────────┼─────────┼──────────┼──────────┼──────────┼─────   │
//! │            Dessert │  Drink  │ Hand Gel │ Foot Gel │ 10% Off  │ wrap   │
//! │                                                                  │      │
//! │                             stored visits reset to 0 ◄───────────┘      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The 25th visit is never stored: the increment that reaches it is written
//! back as 0 and the tier starts over at "Free Dessert".

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::{BAND_WIDTH, CYCLE_LENGTH};

// =============================================================================
// Reward
// =============================================================================

/// One of the five rewards in the loyalty cycle, in earning order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum Reward {
    FreeDessert,
    FreeDrink,
    HandGelTreatment,
    FootGelTreatment,
    NailsDiscount,
}

impl Reward {
    /// All rewards in band order.
    pub const ALL: [Reward; 5] = [
        Reward::FreeDessert,
        Reward::FreeDrink,
        Reward::HandGelTreatment,
        Reward::FootGelTreatment,
        Reward::NailsDiscount,
    ];

    /// Display text stored in `proximaRecompensa`.
    pub const fn description(&self) -> &'static str {
        match self {
            Reward::FreeDessert => "Free Dessert",
            Reward::FreeDrink => "Free Drink",
            Reward::HandGelTreatment => "Hand Gel Treatment",
            Reward::FootGelTreatment => "Foot Gel Treatment",
            Reward::NailsDiscount => "10% Off Nails",
        }
    }

    /// Exclusive visit-count upper bound of this reward's band.
    pub const fn band_end(&self) -> u32 {
        let index = match self {
            Reward::FreeDessert => 1,
            Reward::FreeDrink => 2,
            Reward::HandGelTreatment => 3,
            Reward::FootGelTreatment => 4,
            Reward::NailsDiscount => 5,
        };
        index * BAND_WIDTH
    }

    /// Looks a reward up by its stored description.
    pub fn from_description(text: &str) -> Option<Reward> {
        Reward::ALL
            .into_iter()
            .find(|reward| reward.description() == text)
    }

    fn for_visits(visits: u32) -> Reward {
        match visits {
            0..=4 => Reward::FreeDessert,
            5..=9 => Reward::FreeDrink,
            10..=14 => Reward::HandGelTreatment,
            15..=19 => Reward::FootGelTreatment,
            _ => Reward::NailsDiscount,
        }
    }
}

impl std::fmt::Display for Reward {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.description())
    }
}

// =============================================================================
// Reward Tier
// =============================================================================

/// The reward a visit count is working towards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct RewardTier {
    /// Which reward this is.
    pub reward: Reward,

    /// Flat reward name, e.g. "Free Drink".
    pub description: String,

    /// Visits left until the band boundary. Always `Some` for tiers produced
    /// by [`next_reward`]; `None` only when a tier is rebuilt from stored text
    /// without a visit count.
    pub visits_remaining: Option<u32>,
}

impl RewardTier {
    fn new(reward: Reward, visits_remaining: Option<u32>) -> Self {
        RewardTier {
            reward,
            description: reward.description().to_string(),
            visits_remaining,
        }
    }

    /// Renders the tier with its hint, e.g. "Free Drink (3 visits left)".
    ///
    /// Only for display; the stored tier is always the flat description.
    pub fn display_with_hint(&self) -> String {
        match self.visits_remaining {
            Some(1) => format!("{} (1 visit left)", self.description),
            Some(n) => format!("{} ({} visits left)", self.description, n),
            None => self.description.clone(),
        }
    }
}

/// Returns the reward tier for a visit count.
///
/// Total and deterministic: every count maps to a tier, and counts at or past
/// [`CYCLE_LENGTH`] behave exactly like 0.
///
/// ## Example
/// ```rust
/// use leu_core::reward::next_reward;
///
/// assert_eq!(next_reward(0).description, "Free Dessert");
/// assert_eq!(next_reward(12).description, "Hand Gel Treatment");
/// assert_eq!(next_reward(25), next_reward(0));
/// ```
pub fn next_reward(visit_count: u32) -> RewardTier {
    let visits = if visit_count >= CYCLE_LENGTH {
        0
    } else {
        visit_count
    };

    let reward = Reward::for_visits(visits);
    RewardTier::new(reward, Some(reward.band_end() - visits))
}

/// Returns true when the next visit earns a reward (4, 9, 14, 19, 24).
///
/// The admin dashboard counts these customers as "rewards available".
pub fn is_reward_due(visits: u32) -> bool {
    visits < CYCLE_LENGTH && next_reward(visits).visits_remaining == Some(1)
}

// =============================================================================
// Visit Transition
// =============================================================================

/// Result of adding one visit to a stored count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct VisitTransition {
    /// The count to write back (0 when the cycle wrapped).
    pub stored_visits: u32,

    /// The tier for the stored count.
    pub tier: RewardTier,

    /// True when this visit completed the reward cycle.
    pub cycle_completed: bool,
}

/// Applies one visit to `current_visits`.
///
/// ## Example
/// ```rust
/// use leu_core::reward::advance_visit;
///
/// let t = advance_visit(9);
/// assert_eq!(t.stored_visits, 10);
/// assert_eq!(t.tier.description, "Hand Gel Treatment");
/// assert!(!t.cycle_completed);
/// ```
pub fn advance_visit(current_visits: u32) -> VisitTransition {
    let new_count = current_visits.saturating_add(1);
    let cycle_completed = new_count >= CYCLE_LENGTH;
    let stored_visits = if cycle_completed { 0 } else { new_count };

    VisitTransition {
        stored_visits,
        tier: next_reward(stored_visits),
        cycle_completed,
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
