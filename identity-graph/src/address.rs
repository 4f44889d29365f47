//! # Address Module.
//!
//! This module provides validation and formatting of chain account addresses.

use crate::error::GraphError;
use ethers::{types::Address, utils::hex};
use rand::Rng;
use std::str::FromStr;

/// Account address prefix.
pub const ADDRESS_PREFIX: &str = "0x";
/// Full textual length of an account address, prefix included.
pub const ADDRESS_LEN: usize = 42;

/// Parses a `0x`-prefixed, 40 hex digit account address.
///
/// Hex digits are accepted in either case, so the same account spelled
/// differently resolves to the same `Address`.
pub fn parse_address(input: &str) -> Result<Address, GraphError> {
	let invalid = || GraphError::InvalidAddress(input.to_string());

	if input.len() != ADDRESS_LEN {
		return Err(invalid());
	}

	let digits = input.strip_prefix(ADDRESS_PREFIX).ok_or_else(invalid)?;
	if !digits.chars().all(|c| c.is_ascii_hexdigit()) {
		return Err(invalid());
	}

	Address::from_str(digits).map_err(|_| invalid())
}

/// Full lowercase representation of an address.
pub fn format_address(address: &Address) -> String {
	format!("{}{}", ADDRESS_PREFIX, hex::encode(address.as_bytes()))
}

/// Shortened address for labels, e.g. `0x1234...abcd`.
pub fn shorten_address(address: &Address) -> String {
	let full = format_address(address);
	format!("{}...{}", &full[..6], &full[ADDRESS_LEN - 4..])
}

/// Draws a uniformly random, well formed address.
pub fn random_address<R: Rng + ?Sized>(rng: &mut R) -> Address {
	Address::from(rng.gen::<[u8; 20]>())
}

#[cfg(test)]
mod tests {
	use crate::{address::*, error::GraphError};
	use rand::{rngs::StdRng, SeedableRng};

	#[test]
	fn test_parse_address() {
		let address = parse_address("0x1111111111111111111111111111111111111111").unwrap();
		assert_eq!(address, Address::from([0x11; 20]));
	}

	#[test]
	fn test_parse_address_is_case_insensitive() {
		let lower = parse_address("0xabcdef1234567890abcdef1234567890abcdef12").unwrap();
		let upper = parse_address("0xABCDEF1234567890ABCDEF1234567890ABCDEF12").unwrap();
		assert_eq!(lower, upper);
	}

	#[test]
	fn test_parse_address_rejects_malformed_input() {
		let malformed = [
			"",
			"0x",
			"1111111111111111111111111111111111111111",
			"0X1111111111111111111111111111111111111111",
			"0x111111111111111111111111111111111111111",
			"0x11111111111111111111111111111111111111111",
			"0x111111111111111111111111111111111111111g",
			"0x11111111111111111111111111111111111111 1",
			"0x1234...5678",
		];

		for input in malformed {
			match parse_address(input) {
				Err(GraphError::InvalidAddress(reported)) => assert_eq!(reported, input),
				other => panic!("expected InvalidAddress for {:?}, got {:?}", input, other),
			}
		}
	}

	#[test]
	fn test_format_and_shorten() {
		let address = parse_address("0xABCDEF1234567890abcdef1234567890ABCDEF12").unwrap();
		assert_eq!(
			format_address(&address),
			"0xabcdef1234567890abcdef1234567890abcdef12"
		);
		assert_eq!(shorten_address(&address), "0xabcd...ef12");
	}

	#[test]
	fn test_random_address_round_trips_through_validation() {
		let rng = &mut StdRng::seed_from_u64(7);
		let address = random_address(rng);
		assert_eq!(parse_address(&format_address(&address)).unwrap(), address);
	}
}
