//! # Reputation Module.
//!
//! Tier lookups and the per-category reputation breakdown. Every lookup is a
//! total function over the tier scale: tiers below the scale map to the first
//! entry and tiers above it to the last.

use crate::identity::IdentityRecord;
use serde::Serialize;

/// Lowest tier of the scale.
pub const MIN_TIER: u8 = 1;
/// Palette indexed by tier.
pub const TIER_COLORS: [&str; 5] = ["#888", "#4CAF50", "#2196F3", "#9C27B0", "#FF9800"];
/// Labels indexed by tier.
pub const TIER_LABELS: [&str; 5] = ["Newcomer", "Active", "Contributor", "Expert", "Legend"];
/// Color of nodes that carry no reputation data.
pub const NEUTRAL_COLOR: &str = "#999";

/// Transaction history weight per reputation point.
const HISTORY_WEIGHT: f64 = 0.4;
/// Transaction history ceiling.
const HISTORY_CAP: f64 = 400.0;
/// Points per verified social account.
const SOCIAL_POINTS: u64 = 50;
/// Points per verified achievement.
const ACHIEVEMENT_POINTS: u64 = 30;
/// Points per trust connection.
const CONNECTION_POINTS: u64 = 5;
/// Community participation baseline.
const COMMUNITY_BASELINE: u64 = 100;

/// Palette/label index of a tier.
pub fn tier_index(tier: u8) -> usize {
	let index = usize::from(tier.max(MIN_TIER) - MIN_TIER);
	index.min(TIER_COLORS.len() - 1)
}

/// Color of a tier.
pub fn tier_color(tier: u8) -> &'static str {
	TIER_COLORS[tier_index(tier)]
}

/// Human readable name of a tier.
pub fn tier_label(tier: u8) -> &'static str {
	TIER_LABELS[tier_index(tier).min(TIER_LABELS.len() - 1)]
}

/// Reputation split by contributing category.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ReputationBreakdown {
	/// Share earned through on-chain activity.
	pub transaction_history: f64,
	/// Share earned through verified social accounts.
	pub social_verification: u64,
	/// Share earned through achievements.
	pub achievements: u64,
	/// Share earned through trust connections.
	pub network_trust: u64,
	/// Community participation share.
	pub community_participation: u64,
}

impl ReputationBreakdown {
	/// Breaks down a record, given the size of its trust network.
	pub fn new(record: &IdentityRecord, trust_connections: usize) -> Self {
		let count = |n: usize| u64::try_from(n).unwrap_or(u64::MAX);

		Self {
			transaction_history: (record.reputation_score as f64 * HISTORY_WEIGHT)
				.min(HISTORY_CAP),
			social_verification: count(record.verified_socials.len())
				.saturating_mul(SOCIAL_POINTS),
			achievements: count(record.verified_achievements.len())
				.saturating_mul(ACHIEVEMENT_POINTS),
			network_trust: count(trust_connections).saturating_mul(CONNECTION_POINTS),
			community_participation: COMMUNITY_BASELINE,
		}
	}

	/// Categories in display order.
	pub fn entries(&self) -> [(&'static str, f64); 5] {
		[
			("Transaction history", self.transaction_history),
			("Social verification", self.social_verification as f64),
			("Achievements", self.achievements as f64),
			("Network trust", self.network_trust as f64),
			("Community participation", self.community_participation as f64),
		]
	}
}
