//! # Chain Module.
//!
//! This module defines the chain client interface consumed by the rest of the
//! crate, the wire types exchanged with a node, and a REST implementation.

use crate::{
	address::{format_address, parse_address},
	error::GraphError,
};
use async_trait::async_trait;
use ethers::types::Address;
use log::debug;
use reqwest::{Client as HttpClient, Response, Url};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{json, Map, Value};
use std::fmt;

/// Payload kind understood by the node for entry function calls.
pub const ENTRY_FUNCTION_PAYLOAD: &str = "entry_function_payload";

/// On-chain module identifier, `<address>::<name>`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ModuleId {
	/// Account the module is published under.
	pub address: Address,
	/// Module name.
	pub name: String,
}

impl ModuleId {
	/// Creates a module identifier from its textual parts.
	pub fn new(address: &str, name: &str) -> Result<Self, GraphError> {
		let address = parse_address(address)?;
		if name.is_empty() || !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
			return Err(GraphError::ConfigurationError(format!(
				"Invalid module name \"{}\"",
				name
			)));
		}

		Ok(Self { address, name: name.to_string() })
	}

	/// Fully qualified function identifier, `<address>::<module>::<function>`.
	pub fn function_id(&self, function_name: &str) -> String {
		format!("{}::{}", self, function_name)
	}
}

impl fmt::Display for ModuleId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}::{}", format_address(&self.address), self.name)
	}
}

/// Read-only view function invocation.
#[derive(Clone, Debug, PartialEq)]
pub struct ViewRequest {
	/// Module hosting the function.
	pub module: ModuleId,
	/// Function name inside the module.
	pub function_name: String,
	/// Generic type arguments.
	pub type_arguments: Vec<String>,
	/// Positional arguments, JSON encoded.
	pub arguments: Vec<Value>,
}

impl ViewRequest {
	/// Creates a view request without type arguments.
	pub fn new(module: &ModuleId, function_name: &str, arguments: Vec<Value>) -> Self {
		Self {
			module: module.clone(),
			function_name: function_name.to_string(),
			type_arguments: Vec::new(),
			arguments,
		}
	}

	/// Request body of the node's view endpoint.
	pub fn to_body(&self) -> Value {
		json!({
			"function": self.module.function_id(&self.function_name),
			"type_arguments": self.type_arguments,
			"arguments": self.arguments,
		})
	}
}

/// Entry function payload, ready to be signed by an external wallet.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EntryFunctionPayload {
	/// Payload kind, always `entry_function_payload`.
	#[serde(rename = "type")]
	pub kind: String,
	/// Fully qualified function identifier.
	pub function: String,
	/// Generic type arguments.
	#[serde(rename = "typeArguments")]
	pub type_arguments: Vec<String>,
	/// Positional arguments.
	pub arguments: Vec<Value>,
}

impl EntryFunctionPayload {
	/// Creates an entry function payload without type arguments.
	pub fn new(function: String, arguments: Vec<Value>) -> Self {
		Self {
			kind: ENTRY_FUNCTION_PAYLOAD.to_string(),
			function,
			type_arguments: Vec::new(),
			arguments,
		}
	}
}

/// A transaction signed outside of this crate.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SignedTransaction {
	/// Sending account.
	pub sender: Address,
	/// Call being submitted.
	pub payload: EntryFunctionPayload,
	/// Signature produced by the wallet.
	pub signature: Value,
	/// Envelope fields filled in by the wallet (sequence number, gas, expiry).
	#[serde(flatten)]
	pub envelope: Map<String, Value>,
}

/// Entry function summary attached to a historical transaction.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct TransactionCall {
	/// Fully qualified function identifier.
	#[serde(default)]
	pub function: Option<String>,
}

/// Historical account transaction as listed by the node.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct AccountTransaction {
	/// Transaction hash.
	pub hash: String,
	/// Timestamp in microseconds.
	#[serde(deserialize_with = "u64_from_json")]
	pub timestamp: u64,
	/// Sending account.
	#[serde(default)]
	pub sender: Option<String>,
	/// Receiving account, for transfers.
	#[serde(default)]
	pub receiver: Option<String>,
	/// Transferred amount, for transfers.
	#[serde(default, deserialize_with = "opt_u64_from_json")]
	pub amount: Option<u64>,
	/// Executed entry function.
	#[serde(default)]
	pub payload: Option<TransactionCall>,
}

/// Interface to a chain node.
#[async_trait]
pub trait ChainClient: Send + Sync {
	/// Invokes a read-only view function and returns its decoded values.
	async fn view(&self, request: ViewRequest) -> Result<Vec<Value>, GraphError>;

	/// Submits a signed transaction, returning its hash.
	async fn submit(&self, transaction: &SignedTransaction) -> Result<String, GraphError>;

	/// Lists the most recent transactions of an account.
	async fn account_transactions(
		&self, address: &Address, limit: u16,
	) -> Result<Vec<AccountTransaction>, GraphError>;
}

/// Chain client speaking to a node's REST API.
pub struct HttpChainClient {
	client: HttpClient,
	node_url: Url,
}

impl HttpChainClient {
	/// Creates a new `HttpChainClient`.
	pub fn new(node_url: &str) -> Result<Self, GraphError> {
		let node_url = Url::parse(node_url)
			.map_err(|e| GraphError::ConfigurationError(format!("Invalid node url: {}", e)))?;

		Ok(Self { client: HttpClient::new(), node_url })
	}

	/// Builds the url of an API path relative to the node url.
	fn endpoint(&self, path: &str) -> Result<Url, GraphError> {
		let base = self.node_url.as_str().trim_end_matches('/');
		Url::parse(&format!("{}/v1/{}", base, path))
			.map_err(|e| GraphError::ConfigurationError(e.to_string()))
	}

	/// Turns non-success responses into request errors.
	async fn check_status(res: Response) -> Result<Response, GraphError> {
		let status = res.status();
		if status.is_success() {
			return Ok(res);
		}

		let url = res.url().clone();
		let body = res.text().await.unwrap_or_default();
		Err(GraphError::RequestError(format!(
			"{} returned {}: {}",
			url, status, body
		)))
	}
}

#[async_trait]
impl ChainClient for HttpChainClient {
	async fn view(&self, request: ViewRequest) -> Result<Vec<Value>, GraphError> {
		let url = self.endpoint("view")?;
		debug!(
			"View call {}",
			request.module.function_id(&request.function_name)
		);

		let res = self
			.client
			.post(url)
			.json(&request.to_body())
			.send()
			.await
			.map_err(|e| GraphError::ConnectionError(e.to_string()))?;

		Self::check_status(res)
			.await?
			.json::<Vec<Value>>()
			.await
			.map_err(|e| GraphError::ParsingError(e.to_string()))
	}

	async fn submit(&self, transaction: &SignedTransaction) -> Result<String, GraphError> {
		let url = self.endpoint("transactions")?;

		let res = self
			.client
			.post(url)
			.json(transaction)
			.send()
			.await
			.map_err(|e| GraphError::ConnectionError(e.to_string()))?;

		let pending: Value = Self::check_status(res)
			.await?
			.json()
			.await
			.map_err(|e| GraphError::ParsingError(e.to_string()))?;

		pending
			.get("hash")
			.and_then(Value::as_str)
			.map(str::to_string)
			.ok_or_else(|| GraphError::TransactionError("Missing transaction hash".to_string()))
	}

	async fn account_transactions(
		&self, address: &Address, limit: u16,
	) -> Result<Vec<AccountTransaction>, GraphError> {
		let mut url = self.endpoint(&format!(
			"accounts/{}/transactions",
			format_address(address)
		))?;
		url.query_pairs_mut().append_pair("limit", &limit.to_string());

		let res = self
			.client
			.get(url)
			.send()
			.await
			.map_err(|e| GraphError::ConnectionError(e.to_string()))?;

		Self::check_status(res)
			.await?
			.json::<Vec<AccountTransaction>>()
			.await
			.map_err(|e| GraphError::ParsingError(e.to_string()))
	}
}

/// Nodes encode 64-bit integers as decimal strings; plain numbers are accepted too.
#[derive(Deserialize)]
#[serde(untagged)]
enum JsonU64 {
	Number(u64),
	Text(String),
}

impl JsonU64 {
	fn into_u64<E: serde::de::Error>(self) -> Result<u64, E> {
		match self {
			JsonU64::Number(n) => Ok(n),
			JsonU64::Text(s) => s.parse().map_err(E::custom),
		}
	}
}

/// Deserializes a `u64` given either as a JSON number or a decimal string.
pub(crate) fn u64_from_json<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u64, D::Error> {
	JsonU64::deserialize(deserializer)?.into_u64()
}

/// Optional variant of [`u64_from_json`].
pub(crate) fn opt_u64_from_json<'de, D: Deserializer<'de>>(
	deserializer: D,
) -> Result<Option<u64>, D::Error> {
	Option::<JsonU64>::deserialize(deserializer)?
		.map(|value| value.into_u64::<D::Error>())
		.transpose()
}

#[cfg(test)]
pub(crate) mod mock {
	//! In-memory chain client used by the unit tests.

	use crate::{
		address::parse_address,
		chain::{AccountTransaction, ChainClient, SignedTransaction, ViewRequest},
		error::GraphError,
		identity::{GET_IDENTITY_SUMMARY, GET_TRUST_NETWORK},
	};
	use async_trait::async_trait;
	use ethers::types::Address;
	use serde_json::{json, Value};
	use std::{
		collections::HashMap,
		sync::{
			atomic::{AtomicUsize, Ordering},
			Mutex,
		},
	};

	#[derive(Default)]
	pub struct MockChain {
		pub summaries: HashMap<Address, Value>,
		pub networks: HashMap<Address, Vec<String>>,
		pub transactions: HashMap<Address, Vec<AccountTransaction>>,
		pub submitted: Mutex<Vec<SignedTransaction>>,
		calls: AtomicUsize,
	}

	impl MockChain {
		pub fn with_summary(mut self, address: Address, score: u64, tier: u8) -> Self {
			self.summaries.insert(
				address,
				json!({
					"reputation_score": score.to_string(),
					"reputation_tier": tier,
					"is_verified": score > 0,
					"verified_socials": [],
					"verified_achievements": [],
				}),
			);
			self
		}

		pub fn with_network(mut self, address: Address, neighbors: &[Address]) -> Self {
			let entries = neighbors.iter().map(crate::address::format_address).collect();
			self.networks.insert(address, entries);
			self
		}

		pub fn calls(&self) -> usize {
			self.calls.load(Ordering::SeqCst)
		}
	}

	fn first_address(request: &ViewRequest) -> Result<Address, GraphError> {
		request
			.arguments
			.first()
			.and_then(Value::as_str)
			.ok_or_else(|| GraphError::RequestError("missing address argument".to_string()))
			.and_then(parse_address)
	}

	#[async_trait]
	impl ChainClient for MockChain {
		async fn view(&self, request: ViewRequest) -> Result<Vec<Value>, GraphError> {
			self.calls.fetch_add(1, Ordering::SeqCst);
			let address = first_address(&request)?;
			let not_found = || GraphError::RequestError("resource not found".to_string());

			match request.function_name.as_str() {
				GET_IDENTITY_SUMMARY => {
					self.summaries.get(&address).cloned().map(|v| vec![v]).ok_or_else(not_found)
				},
				GET_TRUST_NETWORK => self
					.networks
					.get(&address)
					.map(|entries| vec![json!(entries)])
					.ok_or_else(not_found),
				_ => Err(GraphError::RequestError("unknown function".to_string())),
			}
		}

		async fn submit(&self, transaction: &SignedTransaction) -> Result<String, GraphError> {
			self.calls.fetch_add(1, Ordering::SeqCst);
			let mut submitted = self.submitted.lock().unwrap();
			submitted.push(transaction.clone());
			Ok(format!("0x{:064x}", submitted.len()))
		}

		async fn account_transactions(
			&self, address: &Address, limit: u16,
		) -> Result<Vec<AccountTransaction>, GraphError> {
			self.calls.fetch_add(1, Ordering::SeqCst);
			let txs = self.transactions.get(address).cloned().unwrap_or_default();
			Ok(txs.into_iter().take(usize::from(limit)).collect())
		}
	}
}
