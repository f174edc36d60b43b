use crate::error::{BoxError, LoaderError, Result};
use crate::processors::chain::Processor;
use crate::tree::{ConfigTree, Value, deep_merge, remove_path, set_path};
use serde::Deserialize;

/// Reserved top-level key holding processors declared inside a document.
pub const PROCESSORS_KEY: &str = "processors";

/// Deletes a list of dotted key paths.
#[derive(Debug, Clone)]
pub struct RemoveKeys {
	pub paths: Vec<String>,
}

impl Processor for RemoveKeys {
	fn name(&self) -> &str {
		"remove_keys"
	}

	fn process(&self, mut tree: ConfigTree) -> std::result::Result<ConfigTree, BoxError> {
		for path in &self.paths {
			remove_path(&mut tree, path);
		}
		Ok(tree)
	}
}

/// Deep-merges a fixed set of values over the tree.
#[derive(Debug, Clone)]
pub struct MergeValues {
	pub values: ConfigTree,
}

impl Processor for MergeValues {
	fn name(&self) -> &str {
		"merge"
	}

	fn process(&self, mut tree: ConfigTree) -> std::result::Result<ConfigTree, BoxError> {
		deep_merge(&mut tree, self.values.clone());
		Ok(tree)
	}
}

/// Moves the value at one dotted path to another. A missing source is a no-op.
#[derive(Debug, Clone)]
pub struct RenameKey {
	pub from: String,
	pub to: String,
}

impl Processor for RenameKey {
	fn name(&self) -> &str {
		"rename"
	}

	fn process(&self, mut tree: ConfigTree) -> std::result::Result<ConfigTree, BoxError> {
		if let Some(value) = remove_path(&mut tree, &self.from) {
			set_path(&mut tree, &self.to, value);
		}
		Ok(tree)
	}
}

/// One entry of a document's `processors` list.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum DeclaredProcessor {
	RemoveKeys { paths: Vec<String> },
	Merge { values: ConfigTree },
	Rename { from: String, to: String },
}

impl DeclaredProcessor {
	fn into_processor(self) -> Box<dyn Processor> {
		match self {
			DeclaredProcessor::RemoveKeys { paths } => Box::new(RemoveKeys { paths }),
			DeclaredProcessor::Merge { values } => Box::new(MergeValues { values }),
			DeclaredProcessor::Rename { from, to } => Box::new(RenameKey { from, to }),
		}
	}
}

/// Remove the `processors` key from `tree` and build the declared processors
/// in order.
pub fn extract_declared_processors(tree: &mut ConfigTree) -> Result<Vec<Box<dyn Processor>>> {
	let Some(raw) = tree.shift_remove(PROCESSORS_KEY) else {
		return Ok(Vec::new());
	};

	let declared: Vec<DeclaredProcessor> = match raw {
		Value::Null => Vec::new(),
		value @ Value::Sequence(_) => {
			serde_yaml::from_value(value).map_err(|e| LoaderError::InvalidProcessor {
				reason: e.to_string(),
			})?
		}
		_ => {
			return Err(LoaderError::InvalidProcessor {
				reason: format!("'{PROCESSORS_KEY}' must be a list of processor entries"),
			});
		}
	};

	Ok(declared
		.into_iter()
		.map(DeclaredProcessor::into_processor)
		.collect())
}
