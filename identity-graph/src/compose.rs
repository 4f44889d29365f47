//! # Compose Module.
//!
//! Builds the reputation module's entry function payloads and applies trust
//! connections to a snapshot ahead of on-chain confirmation.

use crate::{
	address::format_address,
	chain::{EntryFunctionPayload, ModuleId},
	error::GraphError,
	graph::{GraphLink, GraphSnapshot, ESTABLISHED_LINK_WEIGHT},
	identity::SocialRecord,
};
use ethers::types::Address;
use log::debug;
use serde_json::json;
use std::{fmt, str::FromStr};

/// Entry function establishing a trust connection.
pub const ESTABLISH_TRUST_CONNECTION: &str = "establish_trust_connection";
/// Entry function creating or updating an identity profile.
pub const UPSERT_IDENTITY_PROFILE: &str = "upsert_identity_profile";
/// Strength attached to connections made from the explorer.
pub const DEFAULT_CONNECTION_STRENGTH: u8 = 5;
/// Tags attached to connections made from the explorer.
pub const DEFAULT_CONNECTION_TAGS: [&str; 1] = ["browser_verified"];

/// Kind of trust connection.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ConnectionType {
	/// One-way follow.
	Follow,
	/// Endorsement of the target's reputation.
	Endorsement,
	/// Working relationship.
	Collaboration,
	/// Mutual friendship.
	Friendship,
}

impl ConnectionType {
	/// All supported connection types.
	pub const ALL: [ConnectionType; 4] = [
		ConnectionType::Follow,
		ConnectionType::Endorsement,
		ConnectionType::Collaboration,
		ConnectionType::Friendship,
	];

	/// On-chain name of the connection type.
	pub fn as_str(&self) -> &'static str {
		match self {
			ConnectionType::Follow => "follow",
			ConnectionType::Endorsement => "endorsement",
			ConnectionType::Collaboration => "collaboration",
			ConnectionType::Friendship => "friendship",
		}
	}
}

impl FromStr for ConnectionType {
	type Err = GraphError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		ConnectionType::ALL
			.into_iter()
			.find(|kind| kind.as_str() == s)
			.ok_or_else(|| GraphError::UnsupportedConnectionType(s.to_string()))
	}
}

impl fmt::Display for ConnectionType {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

/// Composer of reputation module payloads.
#[derive(Clone, Debug)]
pub struct TrustComposer {
	module: ModuleId,
}

impl TrustComposer {
	/// Creates a new TrustComposer.
	pub fn new(module: ModuleId) -> Self {
		Self { module }
	}

	/// Composes the payload connecting `source` to `target`.
	///
	/// Fails with `Unauthenticated` when there is no active source account and
	/// with `UnsupportedConnectionType` for unknown connection types.
	pub fn compose(
		&self, source: Option<&Address>, target: &Address, connection_type: &str,
	) -> Result<EntryFunctionPayload, GraphError> {
		let source = source.ok_or_else(|| {
			GraphError::Unauthenticated("No active account to connect from".to_string())
		})?;
		let kind: ConnectionType = connection_type.parse()?;

		debug!(
			"Composing {} connection {} -> {}",
			kind,
			format_address(source),
			format_address(target)
		);

		Ok(EntryFunctionPayload::new(
			self.module.function_id(ESTABLISH_TRUST_CONNECTION),
			vec![
				json!(format_address(target)),
				json!(kind.as_str()),
				json!(DEFAULT_CONNECTION_STRENGTH),
				json!(DEFAULT_CONNECTION_TAGS),
			],
		))
	}

	/// Appends the established connection to a snapshot. Existing nodes and
	/// links are left untouched.
	pub fn apply(mut snapshot: GraphSnapshot, source: &Address, target: &Address) -> GraphSnapshot {
		snapshot.push_link(GraphLink::new(*source, *target, ESTABLISHED_LINK_WEIGHT));
		snapshot
	}

	/// Composes the payload registering a verified identity, where `did` has
	/// the `<method>:<id>` form, e.g. `luffa:1234`.
	pub fn identity_profile(
		&self, did: &str, socials: &[SocialRecord],
	) -> Result<EntryFunctionPayload, GraphError> {
		match did.split_once(':') {
			Some((method, id)) if !method.is_empty() && !id.is_empty() => {},
			_ => return Err(GraphError::ValidationError(format!("Invalid DID \"{}\"", did))),
		}

		let socials: Vec<_> = socials
			.iter()
			.map(|social| {
				json!({
					"platform": social.platform,
					"username": social.username,
					"verified_at": social.verified_at,
				})
			})
			.collect();

		Ok(EntryFunctionPayload::new(
			self.module.function_id(UPSERT_IDENTITY_PROFILE),
			vec![json!(did), json!(socials)],
		))
	}
}

#[cfg(test)]
mod tests {
	use crate::{
		compose::*,
		graph::{GraphNode, DIRECT_LINK_WEIGHT},
		identity::IdentityRecord,
	};
	use serde_json::json;

	const MODULE_ADDRESS: &str = "0x7c8d6e5f4a3b2c1d0e9f8a7b6c5d4e3f2a1b0c9d";

	fn addr(byte: u8) -> Address {
		Address::from([byte; 20])
	}

	fn composer() -> TrustComposer {
		TrustComposer::new(ModuleId::new(MODULE_ADDRESS, "reputation").unwrap())
	}

	#[test]
	fn test_connection_type_parsing() {
		for kind in ConnectionType::ALL {
			assert_eq!(kind.as_str().parse::<ConnectionType>().unwrap(), kind);
		}
		assert!(matches!(
			"Follow".parse::<ConnectionType>(),
			Err(GraphError::UnsupportedConnectionType(_))
		));
	}

	#[test]
	fn test_compose_payload() {
		let payload = composer().compose(Some(&addr(1)), &addr(2), "endorsement").unwrap();

		assert_eq!(
			serde_json::to_value(&payload).unwrap(),
			json!({
				"type": "entry_function_payload",
				"function": format!("{}::reputation::establish_trust_connection", MODULE_ADDRESS),
				"typeArguments": [],
				"arguments": [
					"0x0202020202020202020202020202020202020202",
					"endorsement",
					5,
					["browser_verified"],
				],
			})
		);
	}

	#[test]
	fn test_compose_requires_source() {
		assert!(matches!(
			composer().compose(None, &addr(2), "follow"),
			Err(GraphError::Unauthenticated(_))
		));
	}

	#[test]
	fn test_compose_rejects_unknown_type() {
		match composer().compose(Some(&addr(1)), &addr(2), "carrier-pigeon") {
			Err(GraphError::UnsupportedConnectionType(kind)) => assert_eq!(kind, "carrier-pigeon"),
			other => panic!("unexpected result {:?}", other),
		}
	}

	#[test]
	fn test_apply_strictly_appends() {
		let mut snapshot = GraphSnapshot::new();
		snapshot.insert_node(GraphNode::center(addr(1), &IdentityRecord::unverified(addr(1))));
		snapshot.push_link(GraphLink::new(addr(1), addr(2), DIRECT_LINK_WEIGHT));
		let before = snapshot.clone();

		let after = TrustComposer::apply(snapshot, &addr(1), &addr(3));
		let after = TrustComposer::apply(after, &addr(1), &addr(4));

		assert_eq!(after.links().len(), before.links().len() + 2);
		assert_eq!(&after.links()[..before.links().len()], before.links());
		assert_eq!(after.links()[1], GraphLink::new(addr(1), addr(3), ESTABLISHED_LINK_WEIGHT));
		assert_eq!(after.links()[2], GraphLink::new(addr(1), addr(4), ESTABLISHED_LINK_WEIGHT));
		assert_eq!(after.nodes(), before.nodes());
	}

	#[test]
	fn test_identity_profile_payload() {
		let socials = vec![SocialRecord {
			platform: "luffa".to_string(),
			username: "alice".to_string(),
			verified_at: 1_700_000_000_000,
		}];

		let payload = composer().identity_profile("luffa:42", &socials).unwrap();

		assert_eq!(
			payload.function,
			format!("{}::reputation::upsert_identity_profile", MODULE_ADDRESS)
		);
		assert_eq!(
			payload.arguments,
			vec![
				json!("luffa:42"),
				json!([{ "platform": "luffa", "username": "alice", "verified_at": 1_700_000_000_000u64 }]),
			]
		);

		assert!(matches!(
			composer().identity_profile("luffa", &socials),
			Err(GraphError::ValidationError(_))
		));
	}
}
