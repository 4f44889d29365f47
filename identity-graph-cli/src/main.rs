//! # Identity Graph CLI
//!
//! This crate provides a CLI interface to use the `identity-graph` library.

#![warn(trivial_casts)]
#![deny(
	absolute_paths_not_starting_with_crate, deprecated, future_incompatible, missing_docs,
	nonstandard_style, unreachable_code, unreachable_patterns
)]
#![forbid(unsafe_code)]
#![deny(
	// Complexity
 	clippy::unnecessary_cast,
	clippy::needless_question_mark,
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

mod cli;
mod fs;

use clap::Parser;
use cli::*;
use dotenv::dotenv;
use env_logger::{init_from_env, Env};
use fs::load_config;
use identity_graph::{error::GraphError, ClientConfig};
use log::info;

#[tokio::main]
async fn main() -> Result<(), GraphError> {
	dotenv().ok();
	init_from_env(Env::default().filter_or("LOG_LEVEL", "info"));
	let mut config: ClientConfig = load_config()?;

	let result = match Cli::parse().mode {
		Mode::Connect(connect_data) => handle_connect(config, connect_data).await,
		Mode::Search(search_data) => handle_search(config, search_data).await,
		Mode::Show => {
			info!("Client config:\n{:#?}", config);
			Ok(())
		},
		Mode::Timeline(search_data) => handle_timeline(config, search_data).await,
		Mode::Update(update_data) => handle_update(&mut config, update_data),
		Mode::Verify(verify_data) => handle_verify(config, verify_data),
	};

	if let Err(e) = &result {
		report_error(e);
	}

	result
}
