//! # Builder Module.
//!
//! Assembles the bounded two-level trust graph around a seed address:
//! the seed, its first-hop trust connections, and a sample of second-hop
//! connections for the first few of them.

use crate::{
	address::{format_address, random_address},
	graph::{GraphLink, GraphNode, GraphSnapshot, DIRECT_LINK_WEIGHT, SECONDARY_LINK_WEIGHT},
	identity::{IdentityFetcher, IdentityRecord},
};
use ethers::types::Address;
use futures::future::join_all;
use log::{debug, info};
use rand::{rngs::StdRng, SeedableRng};
use std::sync::{Arc, Mutex};

/// Maximum number of first-hop connections kept in a graph.
pub const MAX_DIRECT_CONNECTIONS: usize = 20;
/// Number of first-hop connections that get a second-hop sample.
pub const MAX_SECONDARY_SAMPLES: usize = 5;

/// Source of second-hop connections.
pub trait SecondaryDiscovery: Send + Sync {
	/// Returns one second-hop connection reachable through `neighbor`.
	fn discover(&self, neighbor: &Address) -> Address;
}

/// Stand-in second-hop source drawing pseudo-random addresses.
///
/// The chain exposes no second-hop query yet; a source backed by real data
/// implements [`SecondaryDiscovery`] and replaces this one.
pub struct SyntheticDiscovery {
	rng: Mutex<StdRng>,
}

impl SyntheticDiscovery {
	/// Creates a generator seeded from system entropy.
	pub fn new() -> Self {
		Self { rng: Mutex::new(StdRng::from_entropy()) }
	}

	/// Creates a reproducible generator.
	pub fn seeded(seed: u64) -> Self {
		Self { rng: Mutex::new(StdRng::seed_from_u64(seed)) }
	}
}

impl SecondaryDiscovery for SyntheticDiscovery {
	fn discover(&self, _neighbor: &Address) -> Address {
		let mut rng = self.rng.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
		random_address(&mut *rng)
	}
}

/// Trust graph builder.
#[derive(Clone)]
pub struct GraphBuilder {
	fetcher: IdentityFetcher,
	discovery: Arc<dyn SecondaryDiscovery>,
}

impl GraphBuilder {
	/// Creates a new GraphBuilder.
	pub fn new(fetcher: IdentityFetcher, discovery: Arc<dyn SecondaryDiscovery>) -> Self {
		Self { fetcher, discovery }
	}

	/// Builds the graph around `seed`.
	///
	/// Only the first [`MAX_DIRECT_CONNECTIONS`] neighbors are kept. Their
	/// records are fetched concurrently and merged in input order; failed
	/// lookups fall back to unverified records, so building never fails.
	pub async fn build(
		&self, seed: Address, seed_record: &IdentityRecord, neighbors: &[Address],
	) -> GraphSnapshot {
		let mut snapshot = GraphSnapshot::new();
		snapshot.insert_node(GraphNode::center(seed, seed_record));

		let retained = &neighbors[..neighbors.len().min(MAX_DIRECT_CONNECTIONS)];
		if retained.len() < neighbors.len() {
			debug!(
				"Dropping {} trust connections of {} over the fan-out cap",
				neighbors.len() - retained.len(),
				format_address(&seed)
			);
		}

		let records = join_all(retained.iter().map(|neighbor| self.fetcher.fetch(neighbor))).await;

		for (i, (neighbor, record)) in retained.iter().zip(records).enumerate() {
			snapshot.insert_node(GraphNode::direct(*neighbor, &record));
			snapshot.push_link(GraphLink::new(seed, *neighbor, DIRECT_LINK_WEIGHT));

			if i < MAX_SECONDARY_SAMPLES {
				let secondary = self.discovery.discover(neighbor);
				snapshot.insert_node(GraphNode::secondary(secondary));
				snapshot.push_link(GraphLink::new(*neighbor, secondary, SECONDARY_LINK_WEIGHT));
			}
		}

		info!(
			"Built graph for {}: {} nodes, {} links",
			format_address(&seed),
			snapshot.nodes().len(),
			snapshot.links().len()
		);

		snapshot
	}
}
