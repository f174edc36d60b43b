use crate::error::{LoaderError, Result};
use crate::tree::{ConfigTree, Value};
use serde::Deserialize;
use std::path::Path;

/// Reserved top-level key holding a document's import list.
pub const IMPORTS_KEY: &str = "imports";

/// Import path that names the framework default configuration.
pub const DEFAULT_IMPORT: &str = "@default";

/// A single entry of a document's `imports` list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportDirective {
	/// Path as written, relative to the importing document.
	pub path: String,

	/// Dotted key paths removed after this import is merged.
	pub exclude: Vec<String>,

	/// This entry imports the framework default explicitly, which replaces
	/// the implicit default layer.
	pub is_default: bool,
}

/// An `imports` entry is either a bare path or a table with excludes.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawImport {
	Path(String),
	Entry(ImportEntry),
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ImportEntry {
	#[serde(alias = "resource")]
	path: String,

	#[serde(default)]
	exclude: Vec<String>,
}

impl ImportDirective {
	pub fn new(path: impl Into<String>) -> Self {
		let path = path.into();
		let is_default = path == DEFAULT_IMPORT;
		Self {
			path,
			exclude: Vec::new(),
			is_default,
		}
	}

	pub fn with_exclude(mut self, exclude: Vec<String>) -> Self {
		self.exclude = exclude;
		self
	}
}

/// Remove the `imports` key from `tree` and parse its entries in order.
///
/// `source` only feeds error messages.
pub fn extract_imports(tree: &mut ConfigTree, source: &Path) -> Result<Vec<ImportDirective>> {
	let Some(raw) = tree.shift_remove(IMPORTS_KEY) else {
		return Ok(Vec::new());
	};

	let entries: Vec<RawImport> = match raw {
		Value::Null => Vec::new(),
		Value::String(path) => vec![RawImport::Path(path)],
		value @ Value::Sequence(_) => {
			serde_yaml::from_value(value).map_err(|e| LoaderError::InvalidImport {
				path: source.to_path_buf(),
				reason: e.to_string(),
			})?
		}
		_ => {
			return Err(LoaderError::InvalidImport {
				path: source.to_path_buf(),
				reason: format!("'{IMPORTS_KEY}' must be a list of paths or import entries"),
			});
		}
	};

	entries
		.into_iter()
		.map(|entry| {
			let directive = match entry {
				RawImport::Path(path) => ImportDirective::new(path),
				RawImport::Entry(entry) => ImportDirective::new(entry.path).with_exclude(entry.exclude),
			};
			if directive.path.trim().is_empty() {
				return Err(LoaderError::InvalidImport {
					path: source.to_path_buf(),
					reason: "import path must be a non-empty string".to_string(),
				});
			}
			Ok(directive)
		})
		.collect()
}
