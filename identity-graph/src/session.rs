//! # Session Module.
//!
//! Interactive state of one explorer view: the seed being shown, its graph
//! snapshot, the active panel and the selected node.
//!
//! Every seed change hands out a [`SeedTicket`] with a new generation. Loads
//! are published against their ticket, and a load whose generation is no
//! longer current is discarded, so a slow lookup for an old seed can never
//! replace the graph of a newer one.

use crate::{
	address::{format_address, parse_address},
	chain::EntryFunctionPayload,
	compose::TrustComposer,
	error::GraphError,
	graph::{GraphNode, GraphSnapshot},
	identity::IdentityRecord,
	reputation::ReputationBreakdown,
};
use ethers::types::Address;
use log::{debug, info};

/// Panel currently shown.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ActiveView {
	/// Force-directed graph.
	#[default]
	Graph,
	/// Identity details of the selection or seed.
	Details,
	/// Activity timeline of the seed.
	Timeline,
}

/// Lifecycle of the session's graph.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionState {
	/// No seed chosen yet.
	Empty,
	/// Lookups for the seed are in flight.
	Loading,
	/// A snapshot for the seed is available.
	Ready,
}

/// Actions offered on a node's context menu.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NodeAction {
	/// Re-center the graph on the node.
	ViewDetails,
	/// Follow the node's account.
	Follow,
	/// Endorse the node's account.
	Endorse,
}

/// Handle of one seed change.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SeedTicket {
	seed: Address,
	generation: u64,
}

impl SeedTicket {
	/// Seed address being loaded.
	pub fn seed(&self) -> &Address {
		&self.seed
	}

	/// Generation the ticket was issued for.
	pub fn generation(&self) -> u64 {
		self.generation
	}
}

/// Result of loading a seed.
#[derive(Clone, Debug)]
pub struct SeedLoad {
	/// Ticket the load was started with.
	pub ticket: SeedTicket,
	/// Identity record of the seed.
	pub identity: IdentityRecord,
	/// Size of the seed's full trust network, before the fan-out cap.
	pub trust_connections: usize,
	/// Assembled graph.
	pub snapshot: GraphSnapshot,
}

/// Explorer session.
#[derive(Clone, Debug)]
pub struct GraphSession {
	state: SessionState,
	generation: u64,
	seed: Option<Address>,
	identity: Option<IdentityRecord>,
	trust_connections: usize,
	snapshot: Option<GraphSnapshot>,
	selected: Option<Address>,
	view: ActiveView,
}

impl GraphSession {
	/// Creates an empty session.
	pub fn new() -> Self {
		Self {
			state: SessionState::Empty,
			generation: 0,
			seed: None,
			identity: None,
			trust_connections: 0,
			snapshot: None,
			selected: None,
			view: ActiveView::default(),
		}
	}

	/// Starts loading a new seed. Malformed input leaves the session untouched.
	///
	/// The previous seed's graph and identity are dropped, so nothing of the
	/// old seed is shown or modified while the new one loads.
	pub fn begin_seed(&mut self, input: &str) -> Result<SeedTicket, GraphError> {
		let seed = parse_address(input)?;

		self.generation += 1;
		self.seed = Some(seed);
		self.identity = None;
		self.trust_connections = 0;
		self.snapshot = None;
		self.selected = None;
		self.state = SessionState::Loading;

		debug!(
			"Seed {} (generation {})",
			format_address(&seed),
			self.generation
		);

		Ok(SeedTicket { seed, generation: self.generation })
	}

	/// Whether the ticket belongs to the latest seed change.
	pub fn is_current(&self, ticket: &SeedTicket) -> bool {
		ticket.generation == self.generation
	}

	/// Publishes a finished load. Returns `false` when the load is stale and was
	/// discarded.
	pub fn publish(&mut self, load: SeedLoad) -> bool {
		if !self.is_current(&load.ticket) {
			info!(
				"Discarding stale graph for {} (generation {}, current {})",
				format_address(load.ticket.seed()),
				load.ticket.generation,
				self.generation
			);
			return false;
		}

		self.identity = Some(load.identity);
		self.trust_connections = load.trust_connections;
		self.snapshot = Some(load.snapshot);
		self.state = SessionState::Ready;
		true
	}

	/// Handles a click on a node: selects it and shows its details.
	pub fn click_node(&mut self, id: &Address) -> Option<&GraphNode> {
		let node = self.snapshot.as_ref()?.node(id)?;
		self.selected = Some(node.id);
		self.view = ActiveView::Details;
		Some(node)
	}

	/// Handles a right click on a node, returning the actions it offers.
	pub fn right_click_node(&self, id: &Address) -> Vec<NodeAction> {
		let exists = self.snapshot.as_ref().map_or(false, |snapshot| snapshot.contains(id));
		if !exists {
			return Vec::new();
		}

		if self.seed.as_ref() == Some(id) {
			vec![NodeAction::ViewDetails]
		} else {
			vec![NodeAction::ViewDetails, NodeAction::Follow, NodeAction::Endorse]
		}
	}

	/// Takes the selected node as the next seed, clearing the selection.
	pub fn reseed_from_selection(&mut self) -> Option<Address> {
		self.selected.take()
	}

	/// Clears the selection.
	pub fn clear_selection(&mut self) {
		self.selected = None;
	}

	/// Composes a trust connection from the seed to `target` and, when the
	/// seed's graph is shown, appends the connection to it right away. While
	/// the seed is still loading only the payload is composed.
	///
	/// Errors leave the session unchanged.
	pub fn establish_connection(
		&mut self, composer: &TrustComposer, target: &Address, connection_type: &str,
	) -> Result<EntryFunctionPayload, GraphError> {
		let payload = composer.compose(self.seed.as_ref(), target, connection_type)?;

		if self.state != SessionState::Ready {
			debug!(
				"Seed still loading, not applying connection to {}",
				format_address(target)
			);
			return Ok(payload);
		}

		let shown = self
			.seed
			.filter(|seed| self.snapshot.as_ref().map_or(false, |snapshot| snapshot.contains(seed)));
		if let (Some(seed), Some(snapshot)) = (shown, self.snapshot.take()) {
			self.snapshot = Some(TrustComposer::apply(snapshot, &seed, target));
		}

		Ok(payload)
	}

	/// Switches the active panel.
	pub fn set_view(&mut self, view: ActiveView) {
		self.view = view;
	}

	/// Active panel.
	pub fn view(&self) -> ActiveView {
		self.view
	}

	/// Lifecycle state.
	pub fn state(&self) -> SessionState {
		self.state
	}

	/// Current seed generation.
	pub fn generation(&self) -> u64 {
		self.generation
	}

	/// Current seed address.
	pub fn seed(&self) -> Option<&Address> {
		self.seed.as_ref()
	}

	/// Identity record of the shown seed.
	pub fn identity(&self) -> Option<&IdentityRecord> {
		self.identity.as_ref()
	}

	/// Shown snapshot.
	pub fn snapshot(&self) -> Option<&GraphSnapshot> {
		self.snapshot.as_ref()
	}

	/// Selected node.
	pub fn selected_node(&self) -> Option<&GraphNode> {
		let selected = self.selected.as_ref()?;
		self.snapshot.as_ref()?.node(selected)
	}

	/// Reputation breakdown of the shown seed.
	pub fn breakdown(&self) -> Option<ReputationBreakdown> {
		self.identity
			.as_ref()
			.map(|identity| ReputationBreakdown::new(identity, self.trust_connections))
	}
}
