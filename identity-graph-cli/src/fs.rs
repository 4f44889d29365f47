//! # Filesystem Actions Module.
//!
//! This module provides functionalities for filesystem actions.

use dotenv::{dotenv, var};
use identity_graph::{
	error::GraphError,
	storage::{JSONFileStorage, Storage},
	ClientConfig,
};
use log::info;
use std::{env::current_dir, path::PathBuf};

/// Library configuration file name.
pub const CONFIG_FILENAME: &str = "config";
/// Graph snapshot file name.
pub const GRAPH_FILENAME: &str = "graph";
/// Node export file name.
pub const NODES_FILENAME: &str = "nodes";
/// Link export file name.
pub const LINKS_FILENAME: &str = "links";
/// Timeline export file name.
pub const TIMELINE_FILENAME: &str = "timeline";

/// Enum representing the possible file extensions.
pub enum FileType {
	/// CSV file.
	Csv,
	/// JSON file.
	Json,
}

impl FileType {
	/// Converts the enum variant into its corresponding file extension.
	fn as_str(&self) -> &'static str {
		match self {
			FileType::Csv => "csv",
			FileType::Json => "json",
		}
	}
}

/// Retrieves the path to the `assets` directory.
pub fn get_assets_path() -> Result<PathBuf, GraphError> {
	current_dir().map_err(GraphError::IOError).map(|current_dir| {
		// Workaround for the tests running in the crate directory.
		#[cfg(test)]
		{
			current_dir.join("assets")
		}

		#[cfg(not(test))]
		{
			current_dir.join("identity-graph-cli/assets")
		}
	})
}

/// Helper function to get the path of a file in the `assets` directory.
pub fn get_file_path(file_name: &str, file_type: FileType) -> Result<PathBuf, GraphError> {
	let assets_path = get_assets_path()?;
	Ok(assets_path.join(format!("{}.{}", file_name, file_type.as_str())))
}

/// Loads the configuration file, applying a `NODE_URL` environment override.
pub fn load_config() -> Result<ClientConfig, GraphError> {
	let filepath = get_file_path(CONFIG_FILENAME, FileType::Json)?;
	let mut config = JSONFileStorage::<ClientConfig>::new(filepath).load()?;

	dotenv().ok();
	if let Ok(node_url) = var("NODE_URL") {
		info!("Using node url from NODE_URL: {}", node_url);
		config.node_url = node_url;
	}

	Ok(config)
}

/// Saves the configuration file.
pub fn save_config(config: ClientConfig) -> Result<(), GraphError> {
	let filepath = get_file_path(CONFIG_FILENAME, FileType::Json)?;
	JSONFileStorage::<ClientConfig>::new(filepath).save(config)
}

#[cfg(test)]
mod tests {
	use crate::fs::*;

	#[test]
	fn test_get_file_path() {
		let path = get_file_path(GRAPH_FILENAME, FileType::Json).unwrap();
		assert!(path.ends_with("assets/graph.json"));

		let path = get_file_path(NODES_FILENAME, FileType::Csv).unwrap();
		assert!(path.ends_with("assets/nodes.csv"));
	}

	#[test]
	fn test_bundled_config_is_valid() {
		let filepath = get_file_path(CONFIG_FILENAME, FileType::Json).unwrap();
		let config = JSONFileStorage::<ClientConfig>::new(filepath).load().unwrap();

		assert!(config.module_id().is_ok());
		assert_eq!(config.module_name, "reputation");
	}
}
