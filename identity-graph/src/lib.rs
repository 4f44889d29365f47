//! # Identity Graph
//!
//! A library for exploring on-chain reputation and trust networks.
//!
//! ## Main characteristics:
//!
//! **Bounded** - a graph holds the seed account, at most twenty first-hop
//! trust connections and a small sample of second-hop connections, so it
//! always stays renderable.
//!
//! **Forgiving** - accounts without an identity on chain, or lookups that
//! fail, show up as unverified nodes instead of breaking the graph.
//!
//! **Optimistic** - trust connections made from the explorer appear in the
//! graph right away, while the payload goes out for signing.
//!
//! ## Implementation
//!
//! Identity records and trust networks are read through the reputation
//! module's view functions. Transaction signing and submission of the composed
//! payloads are left to an external wallet.

// Rustc
#![warn(trivial_casts)]
#![deny(
	absolute_paths_not_starting_with_crate, deprecated, future_incompatible, missing_docs,
	nonstandard_style, unreachable_code, unreachable_patterns
)]
#![forbid(unsafe_code)]
// Clippy
#![allow(clippy::tabs_in_doc_comments, clippy::needless_range_loop, clippy::new_without_default)]
#![deny(
	// Complexity
 	clippy::unnecessary_cast,
	clippy::needless_question_mark,
	clippy::clone_on_copy,
	// Pedantic
 	clippy::cast_lossless,
 	clippy::cast_possible_wrap,
	// Perf
	clippy::redundant_clone,
	// Restriction
 	clippy::panic,
	// Style
 	clippy::let_and_return,
 	clippy::needless_borrow
)]

pub mod address;
pub mod builder;
pub mod chain;
pub mod compose;
pub mod error;
pub mod graph;
pub mod identity;
pub mod reputation;
pub mod session;
pub mod storage;
pub mod timeline;

use address::{format_address, parse_address};
use builder::{GraphBuilder, SecondaryDiscovery, SyntheticDiscovery};
use chain::{ChainClient, EntryFunctionPayload, HttpChainClient, ModuleId, SignedTransaction};
use compose::TrustComposer;
use error::GraphError;
use identity::{IdentityFetcher, IdentityRecord, SocialRecord};
use log::info;
use serde::{Deserialize, Serialize};
use session::{GraphSession, SeedLoad, SeedTicket};
use std::sync::Arc;
use timeline::{fetch_timeline, TimelineEntry};

/// Client configuration settings.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
	/// Account hosting the reputation module.
	pub module_address: String,
	/// Reputation module name.
	pub module_name: String,
	/// Network name.
	pub network: String,
	/// Chain node URL.
	pub node_url: String,
}

impl ClientConfig {
	/// Reputation module identifier.
	pub fn module_id(&self) -> Result<ModuleId, GraphError> {
		ModuleId::new(&self.module_address, &self.module_name)
	}
}

/// Explorer client.
pub struct Explorer {
	chain: Arc<dyn ChainClient>,
	config: ClientConfig,
	fetcher: IdentityFetcher,
	builder: GraphBuilder,
	composer: TrustComposer,
}

impl Explorer {
	/// Creates a new Explorer over the given chain client.
	pub fn new(config: ClientConfig, chain: Arc<dyn ChainClient>) -> Result<Self, GraphError> {
		let module = config.module_id()?;
		let fetcher = IdentityFetcher::new(chain.clone(), module.clone());
		let builder = GraphBuilder::new(fetcher.clone(), Arc::new(SyntheticDiscovery::new()));
		let composer = TrustComposer::new(module);

		Ok(Self { chain, config, fetcher, builder, composer })
	}

	/// Creates a new Explorer talking to the configured node.
	pub fn from_config(config: ClientConfig) -> Result<Self, GraphError> {
		let chain = HttpChainClient::new(&config.node_url)?;
		Self::new(config, Arc::new(chain))
	}

	/// Replaces the source of second-hop connections.
	pub fn with_discovery(mut self, discovery: Arc<dyn SecondaryDiscovery>) -> Self {
		self.builder = GraphBuilder::new(self.fetcher.clone(), discovery);
		self
	}

	/// Loads the identity, trust network and graph of a ticket's seed.
	pub async fn load(&self, ticket: SeedTicket) -> SeedLoad {
		let seed = *ticket.seed();
		let (identity, neighbors) =
			tokio::join!(self.fetcher.fetch(&seed), self.fetcher.trust_network(&seed));

		let snapshot = self.builder.build(seed, &identity, &neighbors).await;

		SeedLoad { ticket, identity, trust_connections: neighbors.len(), snapshot }
	}

	/// Searches an address and shows its graph in the session.
	///
	/// Returns whether the graph was published; it is not when another seed
	/// was chosen while this one was loading.
	pub async fn search(&self, session: &mut GraphSession, input: &str) -> Result<bool, GraphError> {
		let ticket = session.begin_seed(input)?;
		info!("Searching {}", format_address(ticket.seed()));

		let load = self.load(ticket).await;
		Ok(session.publish(load))
	}

	/// Fetches the identity record of an address.
	pub async fn identity(&self, input: &str) -> Result<IdentityRecord, GraphError> {
		self.fetcher.fetch_str(input).await
	}

	/// Connects the session's seed to `target`, see
	/// [`GraphSession::establish_connection`].
	pub fn establish_connection(
		&self, session: &mut GraphSession, target: &str, connection_type: &str,
	) -> Result<EntryFunctionPayload, GraphError> {
		let target = parse_address(target)?;
		let payload = session.establish_connection(&self.composer, &target, connection_type)?;

		info!(
			"Trust connection ({}) to {} composed",
			connection_type,
			format_address(&target)
		);

		Ok(payload)
	}

	/// Composes the identity profile registration payload.
	pub fn identity_profile(
		&self, did: &str, socials: &[SocialRecord],
	) -> Result<EntryFunctionPayload, GraphError> {
		self.composer.identity_profile(did, socials)
	}

	/// Submits a transaction signed by an external wallet.
	pub async fn submit(&self, transaction: &SignedTransaction) -> Result<String, GraphError> {
		let hash = self.chain.submit(transaction).await?;
		info!("Transaction submitted: {}", hash);
		Ok(hash)
	}

	/// Fetches the activity timeline of an address.
	pub async fn timeline(&self, input: &str) -> Result<Vec<TimelineEntry>, GraphError> {
		let address = parse_address(input)?;
		fetch_timeline(self.chain.as_ref(), &address).await
	}

	/// Gets config.
	pub fn get_config(&self) -> &ClientConfig {
		&self.config
	}
}
