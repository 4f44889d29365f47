//! # Storage Module.
//!
//! This module contains generic storage traits and implementations.

use crate::{
	address::format_address,
	error::GraphError,
	graph::{GraphLink, GraphNode, GraphSnapshot},
};
use csv::{ReaderBuilder, WriterBuilder};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::{from_reader, to_string_pretty};
use std::fs::File;
use std::io::{BufReader, Write};
use std::marker::PhantomData;
use std::path::PathBuf;

/// The main trait to be implemented by different storage types.
pub trait Storage<T> {
	/// The error type.
	type Err;

	/// Loads data from storage.
	fn load(&self) -> Result<T, Self::Err>;
	/// Saves data to storage.
	fn save(&mut self, data: T) -> Result<(), Self::Err>;
}

/// The `CSVFileStorage` struct provides a mechanism for persisting
/// and retrieving structured data to and from CSV files.
///
/// # Examples
///
/// ```no_run
/// use serde::{Serialize, Deserialize};
/// use std::path::PathBuf;
/// use identity_graph::storage::{CSVFileStorage, Storage};
///
/// #[derive(Serialize, Deserialize, Clone, PartialEq, Debug)]
/// struct Record {
///    id: u64,
///    name: String,
/// }
///
/// let filepath = PathBuf::from("/path/to/your/file.csv");
/// let mut storage = CSVFileStorage::<Record>::new(filepath);
///
/// let data = vec![Record { id: 1, name: "Alice".into() }];
///
/// // Save the data to the CSV file.
/// storage.save(data.clone()).unwrap();
///
/// // Load the data from the CSV file.
/// let loaded_data = storage.load().unwrap();
/// assert_eq!(data, loaded_data);
/// ```
pub struct CSVFileStorage<T> {
	filepath: PathBuf,
	phantom: PhantomData<T>,
}

impl<T> CSVFileStorage<T> {
	/// Creates a new CSVFileStorage.
	pub fn new(filepath: PathBuf) -> Self {
		Self { filepath, phantom: PhantomData }
	}

	/// Returns the path to the file.
	pub fn filepath(&self) -> &PathBuf {
		&self.filepath
	}
}

impl<T: Serialize + DeserializeOwned + Clone> Storage<Vec<T>> for CSVFileStorage<T> {
	type Err = GraphError;

	fn load(&self) -> Result<Vec<T>, GraphError> {
		let file = File::open(&self.filepath).map_err(GraphError::IOError)?;
		let mut reader = ReaderBuilder::new().from_reader(BufReader::new(file));

		reader
			.deserialize()
			.map(|result| result.map_err(|e| GraphError::FileIOError(e.to_string())))
			.collect()
	}

	fn save(&mut self, data: Vec<T>) -> Result<(), GraphError> {
		let mut writer = WriterBuilder::new()
			.from_path(&self.filepath)
			.map_err(|e| GraphError::FileIOError(e.to_string()))?;

		for record in &data {
			writer.serialize(record).map_err(|e| GraphError::FileIOError(e.to_string()))?;
		}

		writer.flush().map_err(|e| GraphError::FileIOError(e.to_string()))?;

		Ok(())
	}
}

/// The `JSONFileStorage` struct provides a mechanism for persisting
/// and retrieving structured data to and from JSON files.
pub struct JSONFileStorage<T> {
	filepath: PathBuf,
	phantom: PhantomData<T>,
}

impl<T> JSONFileStorage<T> {
	/// Creates a new JSONFileStorage.
	pub fn new(filepath: PathBuf) -> Self {
		Self { filepath, phantom: PhantomData }
	}

	/// Returns the path to the file.
	pub fn filepath(&self) -> &PathBuf {
		&self.filepath
	}
}

impl<T: Serialize + DeserializeOwned + Clone> Storage<T> for JSONFileStorage<T> {
	type Err = GraphError;

	fn load(&self) -> Result<T, Self::Err> {
		let file = File::open(&self.filepath).map_err(GraphError::IOError)?;
		let reader = BufReader::new(file);
		from_reader(reader).map_err(|e| GraphError::ParsingError(e.to_string()))
	}

	fn save(&mut self, data: T) -> Result<(), Self::Err> {
		let json_str =
			to_string_pretty(&data).map_err(|e| GraphError::ParsingError(e.to_string()))?;

		let mut file = File::create(&self.filepath).map_err(GraphError::IOError)?;
		file.write_all(json_str.as_bytes()).map_err(GraphError::IOError)
	}
}

/// Writes a snapshot in the renderer's JSON format.
pub fn save_snapshot(filepath: PathBuf, snapshot: &GraphSnapshot) -> Result<(), GraphError> {
	let json_str = snapshot.to_json()?;
	let mut file = File::create(filepath).map_err(GraphError::IOError)?;
	file.write_all(json_str.as_bytes()).map_err(GraphError::IOError)
}

/// Node record.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NodeRecord {
	/// Node address.
	id: String,
	/// Short label.
	name: String,
	/// Node role.
	role: String,
	/// Render size.
	size: f64,
	/// Render color.
	color: String,
	/// Reputation score.
	reputation_score: u64,
	/// Reputation tier.
	reputation_tier: u8,
}

impl From<&GraphNode> for NodeRecord {
	fn from(node: &GraphNode) -> Self {
		let role = serde_json::to_value(node.role)
			.ok()
			.and_then(|value| value.as_str().map(str::to_string))
			.unwrap_or_default();

		Self {
			id: format_address(&node.id),
			name: node.name.clone(),
			role,
			size: node.size,
			color: node.color.hex().to_string(),
			reputation_score: node.reputation_score,
			reputation_tier: node.reputation_tier,
		}
	}
}

/// Link record.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkRecord {
	/// Link origin.
	source: String,
	/// Link destination.
	target: String,
	/// Link strength.
	weight: u8,
}

impl From<&GraphLink> for LinkRecord {
	fn from(link: &GraphLink) -> Self {
		Self {
			source: format_address(&link.source),
			target: format_address(&link.target),
			weight: link.weight,
		}
	}
}
