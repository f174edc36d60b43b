use crate::error::Result;
use crate::source::parser::parse_document_file;
use crate::tree::ConfigTree;
use std::path::{Path, PathBuf};

/// Supplies the framework default configuration layer.
pub trait DefaultConfigProvider: Send + Sync {
	/// Load the default layer. An absent default document yields an empty tree.
	fn load_defaults(&self) -> Result<ConfigTree>;

	/// Where the defaults come from, for display.
	fn describe(&self) -> String;
}

/// Discovers the default configuration below a framework root directory.
///
/// The root comes from `TYPO3_PATH_ROOT`, falling back to the current
/// directory. The first existing candidate under
/// `typo3/sysext/core/Configuration/` wins.
#[derive(Debug, Clone)]
pub struct FrameworkDefaults {
	root: PathBuf,
}

impl FrameworkDefaults {
	/// Environment variable naming the framework root directory.
	pub const ROOT_ENV_VAR: &'static str = "TYPO3_PATH_ROOT";

	const CONFIGURATION_DIR: &'static str = "typo3/sysext/core/Configuration";

	const CANDIDATES: [&'static str; 3] = [
		"DefaultConfiguration.yaml",
		"DefaultConfiguration.yml",
		"DefaultConfiguration.toml",
	];

	pub fn new(root: impl Into<PathBuf>) -> Self {
		Self { root: root.into() }
	}

	/// Build from `TYPO3_PATH_ROOT`, or the current directory when unset.
	pub fn from_env() -> Self {
		let root = std::env::var_os(Self::ROOT_ENV_VAR)
			.filter(|value| !value.is_empty())
			.map(PathBuf::from)
			.unwrap_or_else(|| PathBuf::from("."));
		Self::new(root)
	}

	/// Candidate default files in lookup order.
	pub fn candidates(&self) -> Vec<PathBuf> {
		let dir = self.root.join(Self::CONFIGURATION_DIR);
		Self::CANDIDATES.iter().map(|name| dir.join(name)).collect()
	}

	/// The first candidate that exists on disk.
	pub fn discover(&self) -> Option<PathBuf> {
		self.candidates().into_iter().find(|path| path.is_file())
	}
}

impl DefaultConfigProvider for FrameworkDefaults {
	fn load_defaults(&self) -> Result<ConfigTree> {
		match self.discover() {
			Some(path) => {
				tracing::debug!(path = %path.display(), "loading framework defaults");
				parse_document_file(&path)
			}
			None => {
				tracing::debug!(root = %self.root.display(), "no framework defaults found");
				Ok(ConfigTree::new())
			}
		}
	}

	fn describe(&self) -> String {
		self.discover()
			.unwrap_or_else(|| self.root.join(Self::CONFIGURATION_DIR))
			.display()
			.to_string()
	}
}

/// A fixed default layer held in memory.
#[derive(Debug, Clone, Default)]
pub struct StaticDefaults(pub ConfigTree);

impl DefaultConfigProvider for StaticDefaults {
	fn load_defaults(&self) -> Result<ConfigTree> {
		Ok(self.0.clone())
	}

	fn describe(&self) -> String {
		"<static defaults>".to_string()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::tree::{Value, get_path};
	use std::fs;

	fn write_defaults(root: &Path, name: &str, content: &str) {
		let dir = root.join("typo3/sysext/core/Configuration");
		fs::create_dir_all(&dir).unwrap();
		fs::write(dir.join(name), content).unwrap();
	}

	#[test]
	fn test_framework_defaults_discovers_yaml() {
		let temp_dir = tempfile::tempdir().unwrap();
		write_defaults(
			temp_dir.path(),
			"DefaultConfiguration.yaml",
			"LOG:\n  writer: bla\n",
		);

		let defaults = FrameworkDefaults::new(temp_dir.path());
		let tree = defaults.load_defaults().unwrap();
		assert_eq!(
			get_path(&tree, "LOG.writer").and_then(Value::as_str),
			Some("bla")
		);
		assert!(defaults.describe().ends_with("DefaultConfiguration.yaml"));
	}

	#[test]
	fn test_framework_defaults_prefers_yaml_over_toml() {
		let temp_dir = tempfile::tempdir().unwrap();
		write_defaults(temp_dir.path(), "DefaultConfiguration.toml", "from = 'toml'\n");
		write_defaults(temp_dir.path(), "DefaultConfiguration.yaml", "from: yaml\n");

		let tree = FrameworkDefaults::new(temp_dir.path())
			.load_defaults()
			.unwrap();
		assert_eq!(get_path(&tree, "from").and_then(Value::as_str), Some("yaml"));
	}

	#[test]
	fn test_framework_defaults_missing_is_empty() {
		let temp_dir = tempfile::tempdir().unwrap();
		let tree = FrameworkDefaults::new(temp_dir.path())
			.load_defaults()
			.unwrap();
		assert!(tree.is_empty());
	}

	#[test]
	fn test_static_defaults() {
		let tree: ConfigTree = serde_yaml::from_str("SYS: {}\n").unwrap();
		let defaults = StaticDefaults(tree.clone());
		assert_eq!(defaults.load_defaults().unwrap(), tree);
	}
}
