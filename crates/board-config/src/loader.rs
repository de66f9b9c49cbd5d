//! Loading of configuration files with includes.
//!
//! A configuration file may list further files in a top-level `include`
//! entry. Included files may include others in turn. Each top-level section
//! must come from exactly one file; a file may be loaded at most once.

use crate::{resolve_env_vars, Config, ConfigError};
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

/// Loads a configuration file together with everything it includes.
pub struct ConfigLoader {
	/// Directory relative includes are resolved against.
	base_path: PathBuf,
	/// Canonical paths already loaded, for cycle detection.
	loaded_files: HashSet<PathBuf>,
	/// Which file each top-level section came from.
	section_sources: HashMap<String, PathBuf>,
}

impl ConfigLoader {
	pub fn new(base_path: impl AsRef<Path>) -> Self {
		Self {
			base_path: base_path.as_ref().to_path_buf(),
			loaded_files: HashSet::new(),
			section_sources: HashMap::new(),
		}
	}

	/// Loads, merges and validates the configuration rooted at `config_path`.
	pub async fn load_config(&mut self, config_path: impl AsRef<Path>) -> Result<Config, ConfigError> {
		let root = self.resolve_path(config_path)?;
		let mut combined = toml::map::Map::new();
		let mut pending = vec![root];

		while let Some(path) = pending.pop() {
			let mut table = self.load_table(&path).await?;

			if let Some(include) = table.remove("include") {
				// Reverse so includes load in the order they are listed.
				let mut includes = Self::include_paths(&include)?
					.into_iter()
					.map(|p| self.resolve_path(p))
					.collect::<Result<Vec<_>, _>>()?;
				includes.reverse();
				pending.extend(includes);
			}

			for (section, value) in table {
				if let Some(existing) = self.section_sources.get(&section) {
					return Err(ConfigError::Validation(format!(
						"Duplicate section '{}' found in {} and {}. \
						Each top-level section must be unique across all configuration files.",
						section,
						existing.display(),
						path.display()
					)));
				}
				self.section_sources.insert(section.clone(), path.clone());
				combined.insert(section, value);
			}
		}

		let text = toml::to_string(&toml::Value::Table(combined)).map_err(|e| {
			ConfigError::Parse(format!("Failed to serialize combined config: {}", e))
		})?;
		text.parse()
	}

	/// Reads one file, resolves its environment variables and parses it as a table.
	async fn load_table(&mut self, path: &Path) -> Result<toml::map::Map<String, toml::Value>, ConfigError> {
		let canonical = tokio::fs::canonicalize(path).await.map_err(|e| {
			ConfigError::Io(std::io::Error::new(
				std::io::ErrorKind::NotFound,
				format!("Cannot resolve path {}: {}", path.display(), e),
			))
		})?;

		if !self.loaded_files.insert(canonical.clone()) {
			return Err(ConfigError::Validation(format!(
				"Circular include detected: {} was already loaded",
				canonical.display()
			)));
		}

		let content = tokio::fs::read_to_string(path).await?;
		let resolved = resolve_env_vars(&content)?;
		Ok(toml::from_str(&resolved)?)
	}

	fn include_paths(include: &toml::Value) -> Result<Vec<PathBuf>, ConfigError> {
		match include {
			toml::Value::String(path) => Ok(vec![PathBuf::from(path)]),
			toml::Value::Array(items) => items
				.iter()
				.map(|item| {
					item.as_str().map(PathBuf::from).ok_or_else(|| {
						ConfigError::Validation("Include array must contain only strings".into())
					})
				})
				.collect(),
			_ => Err(ConfigError::Validation(
				"Include must be a string or array of strings".into(),
			)),
		}
	}

	fn resolve_path(&self, path: impl AsRef<Path>) -> Result<PathBuf, ConfigError> {
		let path = path.as_ref();
		let resolved = if path.is_absolute() {
			path.to_path_buf()
		} else {
			self.base_path.join(path)
		};

		if !resolved.exists() {
			return Err(ConfigError::Io(std::io::Error::new(
				std::io::ErrorKind::NotFound,
				format!("Configuration file not found: {}", resolved.display()),
			)));
		}

		Ok(resolved)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::fs;
	use tempfile::TempDir;

	const BOARD: &str = r#"
[board]
id = "front-counter"
"#;

	const STORE: &str = r#"
[store]
primary = "file"
[store.implementations.file]
storage_path = "./data"
"#;

	const STAFF: &str = r#"
[staff]
cooks = ["Luis"]
couriers = ["Carlos"]
"#;

	#[tokio::test]
	async fn test_single_file_config() {
		let temp_dir = TempDir::new().unwrap();
		let config_path = temp_dir.path().join("config.toml");
		fs::write(&config_path, format!("{}{}{}", BOARD, STORE, STAFF)).unwrap();

		let mut loader = ConfigLoader::new(temp_dir.path());
		let config = loader.load_config(&config_path).await.unwrap();

		assert_eq!(config.board.id, "front-counter");
		assert_eq!(config.store.primary, "file");
	}

	#[tokio::test]
	async fn test_nested_includes() {
		let temp_dir = TempDir::new().unwrap();
		fs::write(
			temp_dir.path().join("main.toml"),
			format!("include = [\"store.toml\"]\n{}", BOARD),
		)
		.unwrap();
		fs::write(
			temp_dir.path().join("store.toml"),
			format!("include = \"staff.toml\"\n{}", STORE),
		)
		.unwrap();
		fs::write(temp_dir.path().join("staff.toml"), STAFF).unwrap();

		let config = Config::from_file(temp_dir.path().join("main.toml").to_str().unwrap())
			.await
			.unwrap();

		assert_eq!(config.staff.couriers, vec!["Carlos".to_string()]);
		assert_eq!(config.store.primary, "file");
	}

	#[tokio::test]
	async fn test_duplicate_section_error() {
		let temp_dir = TempDir::new().unwrap();
		fs::write(
			temp_dir.path().join("main.toml"),
			format!("include = [\"dup.toml\"]\n{}{}{}", BOARD, STORE, STAFF),
		)
		.unwrap();
		fs::write(temp_dir.path().join("dup.toml"), BOARD).unwrap();

		let mut loader = ConfigLoader::new(temp_dir.path());
		let error = loader.load_config("main.toml").await.unwrap_err();
		assert!(error.to_string().contains("Duplicate section 'board'"));
	}

	#[tokio::test]
	async fn test_self_include_detection() {
		let temp_dir = TempDir::new().unwrap();
		fs::write(
			temp_dir.path().join("self.toml"),
			format!("include = [\"self.toml\"]\n{}", BOARD),
		)
		.unwrap();

		let mut loader = ConfigLoader::new(temp_dir.path());
		let error = loader.load_config("self.toml").await.unwrap_err();
		assert!(error.to_string().contains("already loaded"));
	}

	#[tokio::test]
	async fn test_missing_include() {
		let temp_dir = TempDir::new().unwrap();
		fs::write(
			temp_dir.path().join("main.toml"),
			format!("include = [\"nope.toml\"]\n{}", BOARD),
		)
		.unwrap();

		let mut loader = ConfigLoader::new(temp_dir.path());
		assert!(matches!(
			loader.load_config("main.toml").await,
			Err(ConfigError::Io(_))
		));
	}
}
