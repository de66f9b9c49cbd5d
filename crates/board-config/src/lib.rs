//! Configuration for the order board.
//!
//! Configuration is read from a TOML file. `${VAR}` and `${VAR:-default}`
//! references are resolved from the environment before parsing, and a file
//! may pull further sections in with `include = ["store.toml"]`. Every
//! top-level section must appear in exactly one file.

mod loader;

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::str::FromStr;
use thiserror::Error;

/// Errors that can occur during configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
	#[error("IO error: {0}")]
	Io(#[from] std::io::Error),
	#[error("Configuration error: {0}")]
	Parse(String),
	#[error("Validation error: {0}")]
	Validation(String),
}

impl From<toml::de::Error> for ConfigError {
	fn from(err: toml::de::Error) -> Self {
		// Keep the message, not the echoed input
		ConfigError::Parse(err.message().to_string())
	}
}

/// Largest UTC offset accepted for the board's day boundary, in minutes.
const MAX_UTC_OFFSET_MINUTES: i32 = 14 * 60;

/// Main configuration structure for the board.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
	/// Identity of this board and the day it runs on.
	pub board: BoardConfig,
	/// Store backend selection.
	pub store: StoreConfig,
	/// Names offered by the cook and courier selectors.
	pub staff: StaffConfig,
	/// HTTP API server.
	pub api: Option<ApiConfig>,
}

/// Configuration specific to the board instance.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BoardConfig {
	/// Unique identifier for this board, used in logs.
	pub id: String,
	/// Name of the store collection holding the orders.
	#[serde(default = "default_collection")]
	pub collection: String,
	/// Offset from UTC, in minutes, of the wall clock that decides what "today" is.
	#[serde(default)]
	pub utc_offset_minutes: i32,
}

fn default_collection() -> String {
	"orders".to_string()
}

/// Configuration for the store backend.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StoreConfig {
	/// Which implementation to use.
	pub primary: String,
	/// Map of implementation names to their raw configuration tables.
	pub implementations: HashMap<String, toml::Value>,
}

/// Staff rosters.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StaffConfig {
	pub cooks: Vec<String>,
	pub couriers: Vec<String>,
}

/// Configuration for the HTTP API server.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ApiConfig {
	#[serde(default)]
	pub enabled: bool,
	#[serde(default = "default_api_host")]
	pub host: String,
	#[serde(default = "default_api_port")]
	pub port: u16,
}

fn default_api_host() -> String {
	"127.0.0.1".to_string()
}

fn default_api_port() -> u16 {
	3000
}

/// Resolves environment variables in a string.
///
/// Replaces `${VAR_NAME}` with the value of `VAR_NAME`, or with the text after
/// `:-` in `${VAR_NAME:-default}` when the variable is unset. Input is capped
/// at 1MB.
pub(crate) fn resolve_env_vars(input: &str) -> Result<String, ConfigError> {
	const MAX_INPUT_SIZE: usize = 1024 * 1024;
	if input.len() > MAX_INPUT_SIZE {
		return Err(ConfigError::Validation(format!(
			"Configuration file too large: {} bytes (max: {} bytes)",
			input.len(),
			MAX_INPUT_SIZE
		)));
	}

	let re = Regex::new(r"\$\{([A-Z_][A-Z0-9_]{0,127})(?::-([^}]{0,256}))?\}")
		.map_err(|e| ConfigError::Parse(format!("Regex error: {}", e)))?;

	let mut missing = None;
	let resolved = re.replace_all(input, |caps: &regex::Captures<'_>| {
		let name = &caps[1];
		match (std::env::var(name), caps.get(2)) {
			(Ok(value), _) => value,
			(Err(_), Some(default)) => default.as_str().to_string(),
			(Err(_), None) => {
				missing.get_or_insert_with(|| name.to_string());
				String::new()
			},
		}
	});

	match missing {
		Some(name) => Err(ConfigError::Validation(format!(
			"Environment variable '{}' not found",
			name
		))),
		None => Ok(resolved.into_owned()),
	}
}

impl Config {
	/// Loads configuration from a file, following its include directives.
	pub async fn from_file(path: &str) -> Result<Self, ConfigError> {
		let path_buf = Path::new(path);
		let base_dir = path_buf.parent().unwrap_or_else(|| Path::new("."));

		let mut loader = loader::ConfigLoader::new(base_dir);
		let file_name = path_buf
			.file_name()
			.ok_or_else(|| ConfigError::Validation(format!("Invalid path: {}", path)))?;
		loader.load_config(file_name).await
	}

	/// Configuration table of the selected store implementation.
	pub fn primary_store(&self) -> Option<&toml::Value> {
		self.store.implementations.get(&self.store.primary)
	}

	/// Checks the invariants serde cannot express.
	fn validate(&self) -> Result<(), ConfigError> {
		if self.board.id.trim().is_empty() {
			return Err(ConfigError::Validation("Board ID cannot be empty".into()));
		}
		if self.board.collection.trim().is_empty() {
			return Err(ConfigError::Validation(
				"Board collection cannot be empty".into(),
			));
		}
		if self.board.utc_offset_minutes.abs() > MAX_UTC_OFFSET_MINUTES {
			return Err(ConfigError::Validation(format!(
				"utc_offset_minutes must be within ±{}",
				MAX_UTC_OFFSET_MINUTES
			)));
		}

		if self.store.implementations.is_empty() {
			return Err(ConfigError::Validation(
				"At least one store implementation must be configured".into(),
			));
		}
		if self.store.primary.is_empty() {
			return Err(ConfigError::Validation(
				"Store primary implementation cannot be empty".into(),
			));
		}
		if self.primary_store().is_none() {
			return Err(ConfigError::Validation(format!(
				"Primary store '{}' not found in implementations",
				self.store.primary
			)));
		}

		validate_roster("cooks", &self.staff.cooks)?;
		validate_roster("couriers", &self.staff.couriers)?;

		if let Some(api) = &self.api {
			if api.enabled && api.host.trim().is_empty() {
				return Err(ConfigError::Validation("API host cannot be empty".into()));
			}
		}

		Ok(())
	}

	/// A small valid configuration backed by the memory store.
	#[cfg(any(test, feature = "testing"))]
	pub fn for_testing() -> Self {
		let mut implementations = HashMap::new();
		implementations.insert(
			"memory".to_string(),
			toml::Value::Table(toml::map::Map::new()),
		);

		Config {
			board: BoardConfig {
				id: "test-board".to_string(),
				collection: default_collection(),
				utc_offset_minutes: 0,
			},
			store: StoreConfig {
				primary: "memory".to_string(),
				implementations,
			},
			staff: StaffConfig {
				cooks: vec!["Luis".to_string(), "Maria".to_string()],
				couriers: vec!["Carlos".to_string(), "Daniel".to_string()],
			},
			api: None,
		}
	}
}

fn validate_roster(name: &str, roster: &[String]) -> Result<(), ConfigError> {
	if roster.is_empty() {
		return Err(ConfigError::Validation(format!(
			"staff.{} must list at least one name",
			name
		)));
	}
	if roster.iter().any(|member| member.trim().is_empty()) {
		return Err(ConfigError::Validation(format!(
			"staff.{} cannot contain blank names",
			name
		)));
	}
	Ok(())
}

/// Parses a TOML string, resolving environment variables and validating the result.
impl FromStr for Config {
	type Err = ConfigError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		let resolved = resolve_env_vars(s)?;
		let config: Config = toml::from_str(&resolved)?;
		config.validate()?;
		Ok(config)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	const BASE: &str = r#"
[board]
id = "front-counter"

[store]
primary = "memory"
[store.implementations.memory]

[staff]
cooks = ["Luis", "Maria"]
couriers = ["Carlos"]
"#;

	#[test]
	fn test_minimal_config_defaults() {
		let config: Config = BASE.parse().unwrap();
		assert_eq!(config.board.id, "front-counter");
		assert_eq!(config.board.collection, "orders");
		assert_eq!(config.board.utc_offset_minutes, 0);
		assert!(config.api.is_none());
		assert!(config.primary_store().is_some());
	}

	#[test]
	fn test_api_defaults() {
		let config: Config = format!("{}\n[api]\nenabled = true\n", BASE).parse().unwrap();
		let api = config.api.unwrap();
		assert!(api.enabled);
		assert_eq!(api.host, "127.0.0.1");
		assert_eq!(api.port, 3000);
	}

	#[test]
	fn test_env_var_resolution() {
		std::env::set_var("BOARD_TEST_HOST", "localhost");
		std::env::set_var("BOARD_TEST_PORT", "5432");

		let result = resolve_env_vars("host = \"${BOARD_TEST_HOST}:${BOARD_TEST_PORT}\"").unwrap();
		assert_eq!(result, "host = \"localhost:5432\"");

		std::env::remove_var("BOARD_TEST_HOST");
		std::env::remove_var("BOARD_TEST_PORT");
	}

	#[test]
	fn test_env_var_with_default() {
		let result = resolve_env_vars("value = \"${BOARD_MISSING_VAR:-fallback}\"").unwrap();
		assert_eq!(result, "value = \"fallback\"");
	}

	#[test]
	fn test_missing_env_var_error() {
		let result = resolve_env_vars("value = \"${BOARD_MISSING_VAR}\"");
		assert!(result.unwrap_err().to_string().contains("BOARD_MISSING_VAR"));
	}

	#[test]
	fn test_primary_store_must_exist() {
		let config = BASE.replace("primary = \"memory\"", "primary = \"file\"");
		let err = config.parse::<Config>().unwrap_err();
		assert!(err.to_string().contains("Primary store 'file'"));
	}

	#[test]
	fn test_rosters_validated() {
		let config = BASE.replace("couriers = [\"Carlos\"]", "couriers = []");
		assert!(config.parse::<Config>().is_err());

		let config = BASE.replace("cooks = [\"Luis\", \"Maria\"]", "cooks = [\"Luis\", \" \"]");
		let err = config.parse::<Config>().unwrap_err();
		assert!(err.to_string().contains("blank"));
	}

	#[test]
	fn test_offset_bounds() {
		let config = BASE.replace(
			"id = \"front-counter\"",
			"id = \"front-counter\"\nutc_offset_minutes = -360",
		);
		assert_eq!(
			config.parse::<Config>().unwrap().board.utc_offset_minutes,
			-360
		);

		let config = BASE.replace(
			"id = \"front-counter\"",
			"id = \"front-counter\"\nutc_offset_minutes = 900",
		);
		assert!(config.parse::<Config>().is_err());
	}

	#[test]
	fn test_testing_config_is_valid() {
		assert!(Config::for_testing().validate().is_ok());
	}
}
