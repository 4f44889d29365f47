//! # Identity Module.
//!
//! This module deals with the on-chain identity records and their retrieval
//! through the reputation module's view functions.

use crate::{
	address::{format_address, parse_address},
	chain::{u64_from_json, ChainClient, ModuleId, ViewRequest},
	error::GraphError,
	reputation::{tier_label, MIN_TIER},
};
use ethers::types::Address;
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;

/// View function returning an account's reputation summary.
pub const GET_IDENTITY_SUMMARY: &str = "get_identity_summary";
/// View function returning an account's first-degree trust connections.
pub const GET_TRUST_NETWORK: &str = "get_trust_network";

/// A verified social account.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SocialRecord {
	/// Platform name, e.g. `luffa`.
	pub platform: String,
	/// Account name on the platform.
	pub username: String,
	/// Verification time in milliseconds since the epoch.
	#[serde(deserialize_with = "u64_from_json")]
	pub verified_at: u64,
}

/// A verified achievement badge.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Achievement {
	/// Badge title.
	pub title: String,
	/// Badge description.
	#[serde(default)]
	pub description: String,
}

/// Reputation summary of one account.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct IdentityRecord {
	/// Account the record describes.
	pub address: Address,
	/// Reputation score.
	pub reputation_score: u64,
	/// Reputation tier, `1` being the lowest.
	pub reputation_tier: u8,
	/// Whether the identity went through verification.
	pub is_verified: bool,
	/// Verified social accounts, in chain order.
	pub verified_socials: Vec<SocialRecord>,
	/// Verified achievements, in chain order.
	pub verified_achievements: Vec<Achievement>,
}

/// Summary as returned by the view function.
#[derive(Deserialize)]
struct IdentitySummary {
	#[serde(default, deserialize_with = "u64_from_json")]
	reputation_score: u64,
	#[serde(default = "min_tier", deserialize_with = "u64_from_json")]
	reputation_tier: u64,
	#[serde(default)]
	is_verified: bool,
	#[serde(default)]
	verified_socials: Vec<SocialRecord>,
	#[serde(default)]
	verified_achievements: Vec<Achievement>,
}

fn min_tier() -> u64 {
	u64::from(MIN_TIER)
}

impl IdentityRecord {
	/// Record of an account without an identity on chain.
	pub fn unverified(address: Address) -> Self {
		Self {
			address,
			reputation_score: 0,
			reputation_tier: MIN_TIER,
			is_verified: false,
			verified_socials: Vec::new(),
			verified_achievements: Vec::new(),
		}
	}

	/// Decodes the values returned by `get_identity_summary`.
	pub fn from_view(address: Address, values: Vec<Value>) -> Result<Self, GraphError> {
		let summary = values.into_iter().next().ok_or_else(|| {
			GraphError::ParsingError("Empty identity summary".to_string())
		})?;
		let summary: IdentitySummary =
			serde_json::from_value(summary).map_err(|e| GraphError::ParsingError(e.to_string()))?;

		Ok(Self {
			address,
			reputation_score: summary.reputation_score,
			reputation_tier: u8::try_from(summary.reputation_tier).unwrap_or(u8::MAX),
			is_verified: summary.is_verified,
			verified_socials: summary.verified_socials,
			verified_achievements: summary.verified_achievements,
		})
	}

	/// Label of the record's tier.
	pub fn tier_label(&self) -> &'static str {
		tier_label(self.reputation_tier)
	}
}

/// Resolves addresses to identity records and trust networks.
#[derive(Clone)]
pub struct IdentityFetcher {
	chain: Arc<dyn ChainClient>,
	module: ModuleId,
}

impl IdentityFetcher {
	/// Creates a new IdentityFetcher.
	pub fn new(chain: Arc<dyn ChainClient>, module: ModuleId) -> Self {
		Self { chain, module }
	}

	/// Fetches the identity record of an address.
	///
	/// Accounts without a record, as well as any failing lookup, resolve to
	/// [`IdentityRecord::unverified`].
	pub async fn fetch(&self, address: &Address) -> IdentityRecord {
		match self.query_summary(address).await {
			Ok(record) => record,
			Err(e) => {
				debug!(
					"No identity record for {}: {}",
					format_address(address),
					e
				);
				IdentityRecord::unverified(*address)
			},
		}
	}

	/// Validates the input before fetching its identity record.
	pub async fn fetch_str(&self, input: &str) -> Result<IdentityRecord, GraphError> {
		let address = parse_address(input)?;
		Ok(self.fetch(&address).await)
	}

	/// Fetches the first-degree trust connections of an address, in chain order.
	///
	/// Malformed entries are skipped; a failing lookup yields no connections.
	pub async fn trust_network(&self, address: &Address) -> Vec<Address> {
		let request = ViewRequest::new(
			&self.module,
			GET_TRUST_NETWORK,
			vec![json!(format_address(address))],
		);

		let values = match self.chain.view(request).await {
			Ok(values) => values,
			Err(e) => {
				warn!(
					"Trust network lookup failed for {}: {}",
					format_address(address),
					e
				);
				return Vec::new();
			},
		};

		// Move returns the whole vector as a single value.
		let entries = match <[Value; 1]>::try_from(values) {
			Ok([Value::Array(entries)]) => entries,
			Ok([single]) => vec![single],
			Err(values) => values,
		};

		entries
			.iter()
			.filter_map(|entry| match entry.as_str().map(parse_address) {
				Some(Ok(neighbor)) => Some(neighbor),
				_ => {
					warn!("Skipping malformed trust connection {}", entry);
					None
				},
			})
			.collect()
	}

	async fn query_summary(&self, address: &Address) -> Result<IdentityRecord, GraphError> {
		let request = ViewRequest::new(
			&self.module,
			GET_IDENTITY_SUMMARY,
			vec![json!(format_address(address))],
		);
		let values = self.chain.view(request).await?;
		IdentityRecord::from_view(*address, values)
	}
}

#[cfg(test)]
mod tests {
	use crate::{
		address::parse_address,
		chain::{mock::MockChain, ModuleId},
		error::GraphError,
		identity::*,
	};
	use serde_json::json;
	use std::sync::Arc;

	const MODULE_ADDRESS: &str = "0x7c8d6e5f4a3b2c1d0e9f8a7b6c5d4e3f2a1b0c9d";

	fn addr(byte: u8) -> Address {
		Address::from([byte; 20])
	}

	fn fetcher(chain: MockChain) -> (Arc<MockChain>, IdentityFetcher) {
		let chain = Arc::new(chain);
		let module = ModuleId::new(MODULE_ADDRESS, "reputation").unwrap();
		(chain.clone(), IdentityFetcher::new(chain, module))
	}

	#[test]
	fn test_from_view() {
		let values = vec![json!({
			"reputation_score": "640",
			"reputation_tier": 3,
			"is_verified": true,
			"verified_socials": [
				{ "platform": "luffa", "username": "alice", "verified_at": "1700000000000" }
			],
			"verified_achievements": [
				{ "title": "Early user", "description": "Joined in the first month" }
			],
		})];

		let record = IdentityRecord::from_view(addr(1), values).unwrap();

		assert_eq!(record.address, addr(1));
		assert_eq!(record.reputation_score, 640);
		assert_eq!(record.reputation_tier, 3);
		assert!(record.is_verified);
		assert_eq!(record.verified_socials[0].username, "alice");
		assert_eq!(record.verified_socials[0].verified_at, 1_700_000_000_000);
		assert_eq!(record.verified_achievements[0].title, "Early user");
		assert_eq!(record.tier_label(), "Contributor");
	}

	#[test]
	fn test_from_view_defaults_missing_fields() {
		let record =
			IdentityRecord::from_view(addr(1), vec![json!({ "reputation_score": 10 })]).unwrap();

		assert_eq!(record.reputation_tier, 1);
		assert!(!record.is_verified);
		assert!(record.verified_socials.is_empty());
	}

	#[test]
	fn test_from_view_rejects_empty_result() {
		assert!(matches!(
			IdentityRecord::from_view(addr(1), Vec::new()),
			Err(GraphError::ParsingError(_))
		));
	}

	#[tokio::test]
	async fn test_fetch_known_record() {
		let (_, fetcher) = fetcher(MockChain::default().with_summary(addr(1), 100, 2));

		let record = fetcher.fetch(&addr(1)).await;

		assert_eq!(record.reputation_score, 100);
		assert_eq!(record.reputation_tier, 2);
	}

	#[tokio::test]
	async fn test_fetch_falls_back_to_unverified() {
		let (_, fetcher) = fetcher(MockChain::default());

		let record = fetcher.fetch(&addr(9)).await;

		assert_eq!(record, IdentityRecord::unverified(addr(9)));
	}

	#[tokio::test]
	async fn test_fetch_str_rejects_before_any_call() {
		let (chain, fetcher) = fetcher(MockChain::default().with_summary(addr(1), 100, 2));

		let res = fetcher.fetch_str("0x1234...5678").await;

		assert!(matches!(res, Err(GraphError::InvalidAddress(_))));
		assert_eq!(chain.calls(), 0);
	}

	#[tokio::test]
	async fn test_trust_network_skips_malformed_entries() {
		let mut chain = MockChain::default();
		chain.networks.insert(
			addr(1),
			vec![
				"0x2222222222222222222222222222222222222222".to_string(),
				"0x1".to_string(),
				"0x3333333333333333333333333333333333333333".to_string(),
			],
		);
		let (_, fetcher) = fetcher(chain);

		let network = fetcher.trust_network(&addr(1)).await;

		assert_eq!(network, vec![addr(0x22), addr(0x33)]);
	}

	#[tokio::test]
	async fn test_trust_network_failure_is_empty() {
		let (_, fetcher) = fetcher(MockChain::default());
		let seed = parse_address("0x1111111111111111111111111111111111111111").unwrap();

		assert!(fetcher.trust_network(&seed).await.is_empty());
	}
}
