//! # Graph Module.
//!
//! Node, link and snapshot types handed to the renderer. A snapshot keeps its
//! nodes unique by address: the first node inserted for an address stays.

use crate::{
	address::shorten_address,
	error::GraphError,
	identity::IdentityRecord,
	reputation::{tier_color, MIN_TIER, NEUTRAL_COLOR},
};
use ethers::types::Address;
use log::debug;
use serde::{ser::SerializeStruct, Serialize, Serializer};
use std::collections::HashSet;

/// Reputation points per unit of node size.
pub const SCORE_PER_SIZE_UNIT: f64 = 50.0;
/// Size bias of the center node.
pub const CENTER_SIZE_BIAS: f64 = 5.0;
/// Size bias of direct connections.
pub const DIRECT_SIZE_BIAS: f64 = 3.0;
/// Fixed size of secondary placeholders.
pub const SECONDARY_SIZE: f64 = 2.0;
/// Weight of seed to direct connection links.
pub const DIRECT_LINK_WEIGHT: u8 = 2;
/// Weight of direct to secondary connection links.
pub const SECONDARY_LINK_WEIGHT: u8 = 1;
/// Weight of links established by the user.
pub const ESTABLISHED_LINK_WEIGHT: u8 = 3;

/// Position of a node relative to the seed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeRole {
	/// The seed address.
	Center,
	/// A first-hop trust connection.
	Direct,
	/// A sampled second-hop connection.
	Secondary,
}

impl NodeRole {
	/// Renderer group of the role.
	pub fn group(&self) -> u8 {
		match self {
			NodeRole::Center => 1,
			NodeRole::Direct => 2,
			NodeRole::Secondary => 3,
		}
	}
}

/// Node color encoding.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NodeColor {
	/// Palette entry of a reputation tier.
	Tier(u8),
	/// No reputation data.
	Neutral,
}

impl NodeColor {
	/// Color of a reputation tier.
	pub fn from_tier(tier: u8) -> Self {
		NodeColor::Tier(tier)
	}

	/// Hex color string.
	pub fn hex(&self) -> &'static str {
		match self {
			NodeColor::Tier(tier) => tier_color(*tier),
			NodeColor::Neutral => NEUTRAL_COLOR,
		}
	}
}

impl Serialize for NodeColor {
	fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
		serializer.serialize_str(self.hex())
	}
}

/// Graph node.
#[derive(Clone, Debug, PartialEq)]
pub struct GraphNode {
	/// Account address, unique within a snapshot.
	pub id: Address,
	/// Shortened address label.
	pub name: String,
	/// Render size.
	pub size: f64,
	/// Render color.
	pub color: NodeColor,
	/// Role relative to the seed.
	pub role: NodeRole,
	/// Reputation score backing the node, zero for placeholders.
	pub reputation_score: u64,
	/// Reputation tier backing the node.
	pub reputation_tier: u8,
}

fn size_from_score(score: u64, bias: f64) -> f64 {
	score as f64 / SCORE_PER_SIZE_UNIT + bias
}

impl GraphNode {
	fn from_record(id: Address, record: &IdentityRecord, role: NodeRole, bias: f64) -> Self {
		Self {
			id,
			name: shorten_address(&id),
			size: size_from_score(record.reputation_score, bias),
			color: NodeColor::from_tier(record.reputation_tier),
			role,
			reputation_score: record.reputation_score,
			reputation_tier: record.reputation_tier,
		}
	}

	/// Node of the seed address.
	pub fn center(id: Address, record: &IdentityRecord) -> Self {
		Self::from_record(id, record, NodeRole::Center, CENTER_SIZE_BIAS)
	}

	/// Node of a first-hop connection.
	pub fn direct(id: Address, record: &IdentityRecord) -> Self {
		Self::from_record(id, record, NodeRole::Direct, DIRECT_SIZE_BIAS)
	}

	/// Placeholder node of a second-hop connection.
	pub fn secondary(id: Address) -> Self {
		Self {
			id,
			name: shorten_address(&id),
			size: SECONDARY_SIZE,
			color: NodeColor::Neutral,
			role: NodeRole::Secondary,
			reputation_score: 0,
			reputation_tier: MIN_TIER,
		}
	}
}

impl Serialize for GraphNode {
	fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
		let mut node = serializer.serialize_struct("GraphNode", 8)?;
		node.serialize_field("id", &self.id)?;
		node.serialize_field("name", &self.name)?;
		node.serialize_field("val", &self.size)?;
		node.serialize_field("color", &self.color)?;
		node.serialize_field("group", &self.role.group())?;
		node.serialize_field("type", &self.role)?;
		node.serialize_field("reputation_score", &self.reputation_score)?;
		node.serialize_field("reputation_tier", &self.reputation_tier)?;
		node.end()
	}
}

/// Graph link. Traversal direction is source to target.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct GraphLink {
	/// Link origin.
	pub source: Address,
	/// Link destination.
	pub target: Address,
	/// Link strength.
	#[serde(rename = "value")]
	pub weight: u8,
}

impl GraphLink {
	/// Creates a new link.
	pub fn new(source: Address, target: Address, weight: u8) -> Self {
		Self { source, target, weight }
	}
}

/// The unit consumed by the renderer.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct GraphSnapshot {
	nodes: Vec<GraphNode>,
	links: Vec<GraphLink>,
	#[serde(skip)]
	ids: HashSet<Address>,
}

impl GraphSnapshot {
	/// Creates an empty snapshot.
	pub fn new() -> Self {
		Self::default()
	}

	/// Inserts a node unless one with the same id is already present.
	/// Returns whether the node was inserted.
	pub fn insert_node(&mut self, node: GraphNode) -> bool {
		if !self.ids.insert(node.id) {
			debug!(
				"Keeping existing node for {}, dropping {:?} duplicate",
				node.name, node.role
			);
			return false;
		}

		self.nodes.push(node);
		true
	}

	/// Appends a link. Links are never deduplicated.
	pub fn push_link(&mut self, link: GraphLink) {
		self.links.push(link);
	}

	/// Nodes in insertion order.
	pub fn nodes(&self) -> &[GraphNode] {
		&self.nodes
	}

	/// Links in insertion order.
	pub fn links(&self) -> &[GraphLink] {
		&self.links
	}

	/// Looks up a node by id.
	pub fn node(&self, id: &Address) -> Option<&GraphNode> {
		if !self.ids.contains(id) {
			return None;
		}
		self.nodes.iter().find(|node| &node.id == id)
	}

	/// Whether a node with the given id exists.
	pub fn contains(&self, id: &Address) -> bool {
		self.ids.contains(id)
	}

	/// Number of nodes holding the given role.
	pub fn count_role(&self, role: NodeRole) -> usize {
		self.nodes.iter().filter(|node| node.role == role).count()
	}

	/// Number of links with the given weight.
	pub fn count_weight(&self, weight: u8) -> usize {
		self.links.iter().filter(|link| link.weight == weight).count()
	}

	/// Whether the snapshot has no nodes.
	pub fn is_empty(&self) -> bool {
		self.nodes.is_empty()
	}

	/// Renderer JSON, `{"nodes": [...], "links": [...]}`.
	pub fn to_json(&self) -> Result<String, GraphError> {
		serde_json::to_string(self).map_err(|e| GraphError::ParsingError(e.to_string()))
	}
}
