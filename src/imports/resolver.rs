use crate::error::{LoaderError, Result};
use crate::imports::directive::{ImportDirective, extract_imports};
use crate::placeholder::PlaceholderResolver;
use crate::source::{DefaultConfigProvider, DocumentReader, normalize_path, parse_document_str};
use crate::tree::{ConfigTree, deep_merge, remove_path};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// How a document entered the merge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
	/// The entry document passed to the loader.
	Entry,
	/// A document named in an `imports` list.
	Import,
	/// The framework default layer.
	Default,
}

/// A document that contributed to the merged tree, in load order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadedDocument {
	pub path: PathBuf,
	pub kind: DocumentKind,
	/// Import nesting level; the entry document is 0.
	pub depth: usize,
}

/// Result of an import walk.
#[derive(Debug, Clone, Default)]
pub struct ResolvedImports {
	pub tree: ConfigTree,
	pub documents: Vec<LoadedDocument>,
}

/// Per-call state of one import walk.
#[derive(Default)]
struct ImportWalk {
	/// Canonical paths currently being resolved.
	visited: HashSet<PathBuf>,
	/// The same paths in import order, for cycle reports.
	stack: Vec<PathBuf>,
	documents: Vec<LoadedDocument>,
}

/// Loads a document and everything it imports into one merged tree.
///
/// Merge order for each document is: the default layer (entry document only,
/// unless suppressed), each import in declaration order, then the document's
/// own keys. An import's `exclude` paths are removed right after that import
/// is merged.
pub struct ImportResolver<'a> {
	reader: &'a dyn DocumentReader,
	defaults: Option<&'a dyn DefaultConfigProvider>,
	placeholders: &'a PlaceholderResolver<'a>,
}

impl<'a> ImportResolver<'a> {
	pub fn new(
		reader: &'a dyn DocumentReader,
		defaults: Option<&'a dyn DefaultConfigProvider>,
		placeholders: &'a PlaceholderResolver<'a>,
	) -> Self {
		Self {
			reader,
			defaults,
			placeholders,
		}
	}

	/// Resolve `entry` and its imports into a single tree.
	///
	/// A missing entry document is not an error; the result is then just the
	/// default layer.
	pub fn resolve(&self, entry: &Path, suppress_default_import: bool) -> Result<ConfigTree> {
		self.resolve_with_trace(entry, suppress_default_import)
			.map(|resolved| resolved.tree)
	}

	/// Like [`ImportResolver::resolve`], also reporting every loaded document.
	pub fn resolve_with_trace(
		&self,
		entry: &Path,
		suppress_default_import: bool,
	) -> Result<ResolvedImports> {
		let mut walk = ImportWalk::default();

		let tree = if self.reader.exists(entry) {
			self.resolve_document(entry, suppress_default_import, 0, &mut walk)?
		} else {
			tracing::debug!(path = %entry.display(), "entry config not found, using defaults only");
			if suppress_default_import {
				ConfigTree::new()
			} else {
				self.load_defaults(0, &mut walk)?
			}
		};

		Ok(ResolvedImports {
			tree,
			documents: walk.documents,
		})
	}

	fn resolve_document(
		&self,
		path: &Path,
		suppress_default_import: bool,
		depth: usize,
		walk: &mut ImportWalk,
	) -> Result<ConfigTree> {
		let canonical = self.reader.canonicalize(path);
		if !walk.visited.insert(canonical.clone()) {
			let mut cycle: Vec<String> = walk
				.stack
				.iter()
				.map(|p| p.display().to_string())
				.collect();
			cycle.push(canonical.display().to_string());
			return Err(LoaderError::CircularImport {
				cycle: cycle.join(" -> "),
			});
		}
		walk.stack.push(canonical.clone());

		let content =
			self.reader
				.read_to_string(path)
				.map_err(|source| LoaderError::ReadError {
					path: path.to_path_buf(),
					source,
				})?;
		let mut document = parse_document_str(&content, path)?;
		let directives = extract_imports(&mut document, path)?;

		tracing::debug!(
			path = %path.display(),
			depth,
			imports = directives.len(),
			"loaded config document"
		);
		walk.documents.push(LoadedDocument {
			path: path.to_path_buf(),
			kind: if depth == 0 {
				DocumentKind::Entry
			} else {
				DocumentKind::Import
			},
			depth,
		});

		let imports_default = directives.iter().any(|d| d.is_default);
		let mut merged = if suppress_default_import || imports_default {
			ConfigTree::new()
		} else {
			self.load_defaults(depth, walk)?
		};

		for directive in &directives {
			let contribution = self.resolve_import(directive, path, depth + 1, walk)?;
			deep_merge(&mut merged, contribution);
			for excluded in &directive.exclude {
				if remove_path(&mut merged, excluded).is_some() {
					tracing::debug!(import = %directive.path, key = %excluded, "excluded key");
				}
			}
		}

		deep_merge(&mut merged, document);

		walk.stack.pop();
		walk.visited.remove(&canonical);

		Ok(merged)
	}

	fn resolve_import(
		&self,
		directive: &ImportDirective,
		importer: &Path,
		depth: usize,
		walk: &mut ImportWalk,
	) -> Result<ConfigTree> {
		if directive.is_default {
			return self.load_defaults(depth, walk);
		}

		let path = self.import_path(&directive.path, importer)?;
		if !self.reader.exists(&path) {
			return Err(LoaderError::MissingImport {
				path,
				importer: importer.to_path_buf(),
			});
		}

		// Nested documents never re-add the default layer.
		self.resolve_document(&path, true, depth, walk)
	}

	fn load_defaults(&self, depth: usize, walk: &mut ImportWalk) -> Result<ConfigTree> {
		let Some(defaults) = self.defaults else {
			return Ok(ConfigTree::new());
		};
		walk.documents.push(LoadedDocument {
			path: PathBuf::from(defaults.describe()),
			kind: DocumentKind::Default,
			depth,
		});
		defaults.load_defaults()
	}

	/// Turn an import path as written into a path to read.
	///
	/// Placeholders are expanded, a leading `~/` points at the home
	/// directory, and relative paths resolve against the importing
	/// document's directory.
	fn import_path(&self, raw: &str, importer: &Path) -> Result<PathBuf> {
		let expanded = self.placeholders.expand(raw, "imports")?;

		let path = if let Some(rest) = expanded.strip_prefix("~/") {
			dirs::home_dir()
				.ok_or(LoaderError::HomeDirectoryNotFound)?
				.join(rest)
		} else {
			let path = PathBuf::from(&expanded);
			if path.is_absolute() {
				path
			} else {
				importer
					.parent()
					.map(|dir| dir.join(&path))
					.unwrap_or(path)
			}
		};

		Ok(normalize_path(&path))
	}
}
