//! Main entry point for the order board service.
//!
//! Loads the configuration, builds the board on the configured store backend
//! and serves the station API until interrupted.

use board_config::Config;
use board_core::{BoardBuilder, BoardFactories, OrderBoard};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;

mod apis;
mod server;

use board_store::implementations::file::create_store as create_file_store;
use board_store::implementations::memory::create_store as create_memory_store;

/// Command-line arguments for the board service.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
	/// Path to configuration file
	#[arg(short, long, default_value = "config.toml")]
	config: PathBuf,

	/// Log level (trace, debug, info, warn, error)
	#[arg(short, long, default_value = "info")]
	log_level: String,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
	let args = Args::parse();

	use tracing_subscriber::{fmt, EnvFilter};

	let env_filter =
		EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));

	fmt()
		.with_env_filter(env_filter)
		.with_thread_ids(true)
		.with_target(true)
		.init();

	tracing::info!("Started order board");

	let config_path = args.config.to_string_lossy();
	let config = Config::from_file(&config_path).await?;
	tracing::info!("Loaded configuration [{}]", config.board.id);

	let board = Arc::new(build_board(config.clone())?);
	board.start().await?;

	match config.api.clone().filter(|api| api.enabled) {
		Some(api_config) => {
			tokio::select! {
				result = server::start_server(api_config, Arc::clone(&board)) => {
					tracing::info!("API server finished");
					result?;
				}
				_ = tokio::signal::ctrl_c() => {
					tracing::info!("Received interrupt");
				}
			}
		},
		None => {
			tracing::info!("API disabled, running board only");
			tokio::signal::ctrl_c().await?;
		},
	}

	board.shutdown().await;
	tracing::info!("Stopped order board");
	Ok(())
}

/// Macro to create a factory HashMap with the appropriate type aliases
macro_rules! create_factory_map {
    ($interface:path, $error:path, $( $name:literal => $factory:expr ),* $(,)?) => {{
        let mut factories = std::collections::HashMap::new();
        $(
            factories.insert(
                $name.to_string(),
                $factory as fn(&toml::Value) -> Result<Box<dyn $interface>, $error>
            );
        )*
        factories
    }};
}

/// Builds the board with every store backend this binary ships.
fn build_board(config: Config) -> Result<OrderBoard, Box<dyn std::error::Error>> {
	let store_factories = create_factory_map!(
		board_store::StoreInterface,
		board_store::StoreError,
		"file" => create_file_store,
		"memory" => create_memory_store,
	);

	Ok(BoardBuilder::new(config).build(BoardFactories { store_factories })?)
}

#[cfg(test)]
mod tests {
	use super::*;
	use tempfile::tempdir;

	#[test]
	fn test_args_default_values() {
		let args = Args::parse_from(["board"]);
		assert_eq!(args.config, PathBuf::from("config.toml"));
		assert_eq!(args.log_level, "info");
	}

	#[test]
	fn test_args_custom_values() {
		let args = Args::parse_from(["board", "--config", "custom.toml", "-l", "debug"]);
		assert_eq!(args.config, PathBuf::from("custom.toml"));
		assert_eq!(args.log_level, "debug");
	}

	#[test]
	fn test_create_factory_map_macro() {
		let factories = create_factory_map!(
			board_store::StoreInterface,
			board_store::StoreError,
			"memory" => create_memory_store,
		);

		assert_eq!(factories.len(), 1);
		assert!(factories.contains_key("memory"));
	}

	#[tokio::test]
	async fn test_build_board_with_minimal_config() {
		let board = build_board(Config::for_testing()).expect("Failed to build board");
		assert_eq!(board.config().board.id, "test-board");
		assert_eq!(board.config().board.collection, "orders");
	}

	#[tokio::test]
	async fn test_build_board_from_file_config() {
		let temp_dir = tempdir().expect("Failed to create temp dir");
		let config_path = temp_dir.path().join("board.toml");
		let storage_path = temp_dir.path().join("data");

		let config_content = format!(
			r#"
[board]
id = "file-board"
utc_offset_minutes = -360

[store]
primary = "file"

[store.implementations.file]
storage_path = "{}"

[staff]
cooks = ["Luis"]
couriers = ["Carlos"]
"#,
			storage_path.display()
		);
		std::fs::write(&config_path, config_content).expect("Failed to write config");

		let config = Config::from_file(config_path.to_str().unwrap())
			.await
			.expect("Failed to load config");
		let board = build_board(config).expect("Failed to build board");
		board.start().await.unwrap();

		let key = board.submit_order("Ana", "2 tacos").await.unwrap();
		assert!(storage_path.join("orders.json").exists());
		assert!(!key.is_empty());
		board.shutdown().await;
	}
}
