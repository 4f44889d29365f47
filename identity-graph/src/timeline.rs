//! # Timeline Module.
//!
//! Activity timeline of an account, built from its transaction history.

use crate::{
	address::parse_address,
	chain::{AccountTransaction, ChainClient},
	error::GraphError,
};
use ethers::types::Address;
use serde::Serialize;

/// Number of transactions fetched for a timeline.
pub const TIMELINE_LIMIT: u16 = 50;

/// One timeline entry.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct TimelineEntry {
	/// Transaction hash.
	pub hash: String,
	/// Timestamp in microseconds.
	pub timestamp: u64,
	/// The other party of the transaction, when known.
	pub counterparty: Option<Address>,
	/// Transferred amount, for transfers.
	pub amount: Option<u64>,
	/// Executed entry function.
	pub function: Option<String>,
}

impl TimelineEntry {
	/// Builds the entry of `tx` as seen from `owner`.
	pub fn from_transaction(owner: &Address, tx: &AccountTransaction) -> Self {
		let parse = |party: &Option<String>| party.as_deref().and_then(|p| parse_address(p).ok());
		let sender = parse(&tx.sender);
		let receiver = parse(&tx.receiver);

		let counterparty = if receiver.as_ref() == Some(owner) { sender } else { receiver };

		Self {
			hash: tx.hash.clone(),
			timestamp: tx.timestamp,
			counterparty,
			amount: tx.amount,
			function: tx.payload.as_ref().and_then(|call| call.function.clone()),
		}
	}
}

/// Fetches the latest [`TIMELINE_LIMIT`] transactions of `address`, newest first.
pub async fn fetch_timeline(
	chain: &dyn ChainClient, address: &Address,
) -> Result<Vec<TimelineEntry>, GraphError> {
	let txs = chain.account_transactions(address, TIMELINE_LIMIT).await?;

	let mut timeline: Vec<TimelineEntry> =
		txs.iter().map(|tx| TimelineEntry::from_transaction(address, tx)).collect();
	timeline.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));

	Ok(timeline)
}

#[cfg(test)]
mod tests {
	use crate::{
		address::format_address,
		chain::{mock::MockChain, TransactionCall},
		timeline::*,
	};

	fn addr(byte: u8) -> Address {
		Address::from([byte; 20])
	}

	fn transfer(timestamp: u64, sender: Address, receiver: Address) -> AccountTransaction {
		AccountTransaction {
			hash: format!("0x{:x}", timestamp),
			timestamp,
			sender: Some(format_address(&sender)),
			receiver: Some(format_address(&receiver)),
			amount: Some(10),
			payload: Some(TransactionCall { function: Some("0x1::coin::transfer".to_string()) }),
		}
	}

	#[test]
	fn test_counterparty_of_incoming_transfer_is_sender() {
		let entry = TimelineEntry::from_transaction(&addr(1), &transfer(1, addr(2), addr(1)));
		assert_eq!(entry.counterparty, Some(addr(2)));
	}

	#[test]
	fn test_counterparty_of_outgoing_transfer_is_receiver() {
		let entry = TimelineEntry::from_transaction(&addr(1), &transfer(1, addr(1), addr(3)));
		assert_eq!(entry.counterparty, Some(addr(3)));
		assert_eq!(entry.function.as_deref(), Some("0x1::coin::transfer"));
	}

	#[test]
	fn test_counterparty_missing_for_calls() {
		let mut tx = transfer(1, addr(1), addr(1));
		tx.receiver = None;
		tx.amount = None;

		let entry = TimelineEntry::from_transaction(&addr(1), &tx);

		assert_eq!(entry.counterparty, None);
		assert_eq!(entry.amount, None);
	}

	#[tokio::test]
	async fn test_fetch_timeline_newest_first() {
		let mut chain = MockChain::default();
		chain.transactions.insert(
			addr(1),
			vec![
				transfer(10, addr(1), addr(2)),
				transfer(30, addr(3), addr(1)),
				transfer(20, addr(1), addr(4)),
			],
		);

		let timeline = fetch_timeline(&chain, &addr(1)).await.unwrap();

		let stamps: Vec<u64> = timeline.iter().map(|entry| entry.timestamp).collect();
		assert_eq!(stamps, vec![30, 20, 10]);
		assert_eq!(timeline[0].counterparty, Some(addr(3)));
	}
}
