use crate::error::Result;
use crate::imports::{ImportResolver, LoadedDocument, ResolvedImports};
use crate::placeholder::{Constants, EnvSource, PlaceholderResolver, ProcessEnv};
use crate::processors::{Processor, extract_declared_processors, run_chain};
use crate::serialize::{EXTENSION_CONFIGURATION_PATH, serialize_marked};
use crate::source::{DefaultConfigProvider, DocumentReader, FrameworkDefaults, FsReader};
use crate::tree::ConfigTree;
use std::path::PathBuf;

/// Loads one configuration file into a fully resolved tree.
///
/// Stages run in a fixed order:
/// 1. imports, merged over the framework default layer
/// 2. placeholder substitution
/// 3. legacy serialization of marked subtrees
/// 4. processors, document-declared first, then those added here
///
/// Every call to [`ConfigLoader::load`] starts from scratch. Nothing is cached
/// between calls.
pub struct ConfigLoader {
	path: PathBuf,
	strict: bool,
	reader: Box<dyn DocumentReader>,
	env: Box<dyn EnvSource>,
	constants: Constants,
	defaults: Option<Box<dyn DefaultConfigProvider>>,
	serialize_paths: Vec<String>,
	processors: Vec<Box<dyn Processor>>,
}

/// A loaded tree together with the documents that produced it.
#[derive(Debug, Clone)]
pub struct LoadReport {
	pub tree: ConfigTree,
	pub documents: Vec<LoadedDocument>,
}

impl ConfigLoader {
	/// Lenient loader for `path` reading from the filesystem and process
	/// environment.
	pub fn new(path: impl Into<PathBuf>) -> Self {
		Self {
			path: path.into(),
			strict: false,
			reader: Box::new(FsReader),
			env: Box::new(ProcessEnv),
			constants: Constants::builtin(),
			defaults: Some(Box::new(FrameworkDefaults::from_env())),
			serialize_paths: vec![EXTENSION_CONFIGURATION_PATH.to_string()],
			processors: Vec::new(),
		}
	}

	/// Fail on unresolved placeholders instead of substituting null.
	pub fn strict(mut self, strict: bool) -> Self {
		self.strict = strict;
		self
	}

	pub fn with_reader(mut self, reader: impl DocumentReader + 'static) -> Self {
		self.reader = Box::new(reader);
		self
	}

	pub fn with_env(mut self, env: impl EnvSource + 'static) -> Self {
		self.env = Box::new(env);
		self
	}

	/// Register a named constant for `%const(...)%` lookups.
	pub fn with_constant(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
		self.constants.insert(name, value);
		self
	}

	/// Replace the framework default layer.
	pub fn with_defaults(mut self, defaults: impl DefaultConfigProvider + 'static) -> Self {
		self.defaults = Some(Box::new(defaults));
		self
	}

	/// Skip the default layer entirely, including explicit `@default` imports.
	pub fn without_defaults(mut self) -> Self {
		self.defaults = None;
		self
	}

	/// Mark another dotted path whose children are emitted in the legacy
	/// string encoding.
	pub fn serialize_path(mut self, path: impl Into<String>) -> Self {
		let path = path.into();
		if !self.serialize_paths.contains(&path) {
			self.serialize_paths.push(path);
		}
		self
	}

	/// Append a processor. Processors run in the order they are added.
	pub fn with_processor(mut self, processor: impl Processor + 'static) -> Self {
		self.processors.push(Box::new(processor));
		self
	}

	/// Load, resolve and post-process the configuration.
	pub fn load(&self) -> Result<ConfigTree> {
		self.load_with_report().map(|report| report.tree)
	}

	/// Like [`ConfigLoader::load`], also listing every document that was
	/// merged, in load order.
	pub fn load_with_report(&self) -> Result<LoadReport> {
		let placeholders = PlaceholderResolver::new(self.env.as_ref(), &self.constants, self.strict);
		let imports = ImportResolver::new(
			self.reader.as_ref(),
			self.defaults.as_deref(),
			&placeholders,
		);

		let ResolvedImports { tree, documents } = imports.resolve_with_trace(&self.path, false)?;
		tracing::debug!(
			path = %self.path.display(),
			documents = documents.len(),
			"imports resolved"
		);

		let tree = placeholders.resolve(tree)?;
		let mut tree = serialize_marked(tree, &self.serialize_paths);

		let declared = extract_declared_processors(&mut tree)?;
		tracing::debug!(
			declared = declared.len(),
			registered = self.processors.len(),
			"running processors"
		);
		let tree = run_chain(tree, declared.iter().chain(self.processors.iter()))?;

		Ok(LoadReport { tree, documents })
	}
}

impl std::fmt::Debug for ConfigLoader {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("ConfigLoader")
			.field("path", &self.path)
			.field("strict", &self.strict)
			.field("defaults", &self.defaults.as_ref().map(|d| d.describe()))
			.field("serialize_paths", &self.serialize_paths)
			.field(
				"processors",
				&self.processors.iter().map(|p| p.name()).collect::<Vec<_>>(),
			)
			.finish_non_exhaustive()
	}
}
