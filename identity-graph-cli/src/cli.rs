//! # CLI Module.
//!
//! This module contains all CLI related data handling and conversions.

use crate::fs::{
	get_file_path, save_config, FileType, GRAPH_FILENAME, LINKS_FILENAME, NODES_FILENAME,
	TIMELINE_FILENAME,
};
use clap::{Args, Parser, Subcommand};
use ethers::providers::Http;
use identity_graph::{
	address::parse_address,
	chain::ModuleId,
	error::GraphError,
	identity::SocialRecord,
	session::GraphSession,
	storage::{save_snapshot, CSVFileStorage, JSONFileStorage, LinkRecord, NodeRecord, Storage},
	ClientConfig, Explorer,
};
use log::{info, log, warn, Level};
use std::{
	str::FromStr,
	time::{SystemTime, UNIX_EPOCH},
};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
	#[command(subcommand)]
	pub mode: Mode,
}

/// CLI commands.
#[derive(Subcommand)]
pub enum Mode {
	/// Compose a trust connection and apply it to the graph. Requires 'ConnectData'.
	Connect(ConnectData),
	/// Search an address and save its trust graph. Requires 'SearchData'.
	Search(SearchData),
	/// Display the current configuration.
	Show,
	/// Retrieve and save the activity timeline of an address. Requires 'SearchData'.
	Timeline(SearchData),
	/// Update the configuration. Requires 'UpdateData'.
	Update(UpdateData),
	/// Compose an identity profile registration. Requires 'VerifyData'.
	Verify(VerifyData),
}

/// Search subcommand input.
#[derive(Args, Debug)]
pub struct SearchData {
	/// Account address (0x-prefixed, 40 hex digits).
	#[clap(long = "address")]
	address: Option<String>,
}

/// Connection subcommand input.
#[derive(Args, Debug)]
pub struct ConnectData {
	/// Active account the connection is made from.
	#[clap(long = "from")]
	from: Option<String>,
	/// Connected account.
	#[clap(long = "to")]
	to: Option<String>,
	/// Connection type (follow, endorsement, collaboration, friendship).
	#[clap(long = "type")]
	connection_type: Option<String>,
}

/// Identity verification subcommand input.
#[derive(Args, Debug)]
pub struct VerifyData {
	/// Decentralized identifier, e.g. `luffa:1234`.
	#[clap(long = "did")]
	did: Option<String>,
	/// Verified platform.
	#[clap(long = "platform")]
	platform: Option<String>,
	/// Account name on the verified platform.
	#[clap(long = "username")]
	username: Option<String>,
}

/// Configuration update subcommand input.
#[derive(Args, Debug)]
pub struct UpdateData {
	/// Account hosting the reputation module.
	#[clap(long = "module-address")]
	module_address: Option<String>,
	/// Reputation module name.
	#[clap(long = "module-name")]
	module_name: Option<String>,
	/// Network name.
	#[clap(long = "network")]
	network: Option<String>,
	/// Chain node URL.
	#[clap(long = "node")]
	node_url: Option<String>,
}

impl SearchData {
	/// Returns the searched address as given.
	pub fn address(&self) -> Result<&str, GraphError> {
		self.address
			.as_deref()
			.ok_or_else(|| GraphError::ValidationError("Missing address".to_string()))
	}
}

impl VerifyData {
	/// Builds the social record being registered.
	pub fn to_social_record(&self) -> Result<SocialRecord, GraphError> {
		let platform = self
			.platform
			.as_ref()
			.ok_or_else(|| GraphError::ValidationError("Missing platform".to_string()))?;
		let username = self
			.username
			.as_ref()
			.ok_or_else(|| GraphError::ValidationError("Missing username".to_string()))?;

		let verified_at = SystemTime::now()
			.duration_since(UNIX_EPOCH)
			.map_err(|e| GraphError::ValidationError(e.to_string()))?
			.as_millis();

		Ok(SocialRecord {
			platform: platform.clone(),
			username: username.clone(),
			verified_at: u64::try_from(verified_at)
				.map_err(|e| GraphError::ParsingError(e.to_string()))?,
		})
	}
}

/// Log level a failed command is reported at: rejected input is a warning,
/// anything else an error.
pub fn error_level(err: &GraphError) -> Level {
	if err.is_user_facing() {
		Level::Warn
	} else {
		Level::Error
	}
}

/// Logs a failed command.
pub fn report_error(err: &GraphError) {
	log!(error_level(err), "{}", err);
}

/// Saves the session's graph as renderer JSON and node/link CSV files.
fn save_graph(session: &GraphSession) -> Result<(), GraphError> {
	let snapshot = session
		.snapshot()
		.ok_or_else(|| GraphError::ValidationError("No graph to save.".to_string()))?;

	let graph_fp = get_file_path(GRAPH_FILENAME, FileType::Json)?;
	save_snapshot(graph_fp.clone(), snapshot)?;

	let nodes: Vec<NodeRecord> = snapshot.nodes().iter().map(NodeRecord::from).collect();
	let mut nodes_storage =
		CSVFileStorage::<NodeRecord>::new(get_file_path(NODES_FILENAME, FileType::Csv)?);
	nodes_storage.save(nodes)?;

	let links: Vec<LinkRecord> = snapshot.links().iter().map(LinkRecord::from).collect();
	let mut links_storage =
		CSVFileStorage::<LinkRecord>::new(get_file_path(LINKS_FILENAME, FileType::Csv)?);
	links_storage.save(links)?;

	info!("Graph saved at \"{}\".", graph_fp.display());

	Ok(())
}

/// Logs the identity panel of the session's seed.
fn show_identity(session: &GraphSession) {
	let Some(identity) = session.identity() else {
		return;
	};

	info!(
		"Reputation {} ({}), verified: {}",
		identity.reputation_score,
		identity.tier_label(),
		identity.is_verified
	);

	for social in &identity.verified_socials {
		info!("  {} account: {}", social.platform, social.username);
	}

	for achievement in &identity.verified_achievements {
		info!("  Achievement: {} - {}", achievement.title, achievement.description);
	}

	if let Some(breakdown) = session.breakdown() {
		for (category, score) in breakdown.entries() {
			info!("  {}: {}", category, score);
		}
	}
}

/// Handle `search` command.
pub async fn handle_search(config: ClientConfig, data: SearchData) -> Result<(), GraphError> {
	let address = data.address()?;
	let explorer = Explorer::from_config(config)?;
	let mut session = GraphSession::new();

	explorer.search(&mut session, address).await?;

	show_identity(&session);
	save_graph(&session)
}

/// Handle `connect` command.
pub async fn handle_connect(config: ClientConfig, data: ConnectData) -> Result<(), GraphError> {
	let target = data
		.to
		.as_deref()
		.ok_or_else(|| GraphError::ValidationError("Missing target address".to_string()))?;
	let connection_type = data
		.connection_type
		.as_deref()
		.ok_or_else(|| GraphError::ValidationError("Missing connection type".to_string()))?;

	let explorer = Explorer::from_config(config)?;
	let mut session = GraphSession::new();

	match data.from.as_deref() {
		Some(from) => {
			explorer.search(&mut session, from).await?;
		},
		None => warn!("No --from account given, there is no active account to connect from."),
	}

	let payload = explorer.establish_connection(&mut session, target, connection_type)?;
	let payload_json = serde_json::to_string_pretty(&payload)
		.map_err(|e| GraphError::ParsingError(e.to_string()))?;
	info!("Payload to sign:\n{}", payload_json);

	save_graph(&session)
}

/// Handle `verify` command.
pub fn handle_verify(config: ClientConfig, data: VerifyData) -> Result<(), GraphError> {
	let did = data
		.did
		.as_deref()
		.ok_or_else(|| GraphError::ValidationError("Missing DID".to_string()))?;
	let social = data.to_social_record()?;

	let explorer = Explorer::from_config(config)?;
	let payload = explorer.identity_profile(did, &[social])?;
	let payload_json = serde_json::to_string_pretty(&payload)
		.map_err(|e| GraphError::ParsingError(e.to_string()))?;
	info!("Payload to sign:\n{}", payload_json);

	Ok(())
}

/// Handle `timeline` command.
pub async fn handle_timeline(config: ClientConfig, data: SearchData) -> Result<(), GraphError> {
	let address = data.address()?;
	let explorer = Explorer::from_config(config)?;

	let timeline = explorer.timeline(address).await?;
	info!("{} transactions found.", timeline.len());

	let filepath = get_file_path(TIMELINE_FILENAME, FileType::Json)?;
	let mut storage = JSONFileStorage::new(filepath);
	storage.save(
		serde_json::to_value(&timeline).map_err(|e| GraphError::ParsingError(e.to_string()))?,
	)?;

	info!("Timeline saved at \"{}\".", storage.filepath().display());

	Ok(())
}

/// Applies a configuration update, validating every given field.
pub fn apply_update(config: &mut ClientConfig, data: UpdateData) -> Result<(), GraphError> {
	if let Some(module_address) = data.module_address {
		parse_address(&module_address)?;
		config.module_address = module_address;
	}

	if let Some(module_name) = data.module_name {
		ModuleId::new(&config.module_address, &module_name)?;
		config.module_name = module_name;
	}

	if let Some(network) = data.network {
		config.network = network;
	}

	if let Some(node_url) = data.node_url {
		Http::from_str(&node_url).map_err(|e| GraphError::ParsingError(e.to_string()))?;
		config.node_url = node_url;
	}

	Ok(())
}

/// Handles the CLI project configuration update.
pub fn handle_update(config: &mut ClientConfig, data: UpdateData) -> Result<(), GraphError> {
	apply_update(config, data)?;
	save_config(config.clone())
}

#[cfg(test)]
mod tests {
	use crate::cli::{apply_update, error_level, Cli, SearchData, UpdateData, VerifyData};
	use clap::CommandFactory;
	use identity_graph::{error::GraphError, ClientConfig};
	use log::Level;

	fn config() -> ClientConfig {
		ClientConfig {
			module_address: "0x7c8d6e5f4a3b2c1d0e9f8a7b6c5d4e3f2a1b0c9d".to_string(),
			module_name: "reputation".to_string(),
			network: "testnet".to_string(),
			node_url: "https://testnet.endless.link".to_string(),
		}
	}

	#[test]
	fn test_cli() {
		Cli::command().debug_assert()
	}

	#[test]
	fn test_error_level() {
		assert_eq!(
			error_level(&GraphError::InvalidAddress("0x12".to_string())),
			Level::Warn
		);
		assert_eq!(
			error_level(&GraphError::UnsupportedConnectionType("block".to_string())),
			Level::Warn
		);
		assert_eq!(
			error_level(&GraphError::ConnectionError("refused".to_string())),
			Level::Error
		);
	}

	#[test]
	fn test_search_data_requires_address() {
		let data = SearchData { address: None };
		assert!(matches!(data.address(), Err(GraphError::ValidationError(_))));
	}

	#[test]
	fn test_verify_data_to_social_record() {
		let data = VerifyData {
			did: Some("luffa:42".to_string()),
			platform: Some("luffa".to_string()),
			username: Some("alice".to_string()),
		};

		let social = data.to_social_record().unwrap();

		assert_eq!(social.platform, "luffa");
		assert_eq!(social.username, "alice");
		assert!(social.verified_at > 0);
	}

	#[test]
	fn test_apply_update() {
		let mut config = config();
		let data = UpdateData {
			module_address: Some("0x1111111111111111111111111111111111111111".to_string()),
			module_name: Some("identity".to_string()),
			network: Some("mainnet".to_string()),
			node_url: Some("http://localhost:8080".to_string()),
		};

		apply_update(&mut config, data).unwrap();

		assert_eq!(
			config.module_address,
			"0x1111111111111111111111111111111111111111"
		);
		assert_eq!(config.module_name, "identity");
		assert_eq!(config.network, "mainnet");
		assert_eq!(config.node_url, "http://localhost:8080");
	}

	#[test]
	fn test_apply_update_rejects_bad_address() {
		let mut config = config();
		let data = UpdateData {
			module_address: Some("0x7c8d".to_string()),
			module_name: None,
			network: None,
			node_url: None,
		};

		assert!(matches!(
			apply_update(&mut config, data),
			Err(GraphError::InvalidAddress(_))
		));
		assert_eq!(config, self::config());
	}
}
