//! Import resolution for confstack.
//!
//! This module handles:
//! - Parsing the reserved `imports` key of a document
//! - Recursive loading with cycle detection
//! - Layer merging with per-import excludes

pub mod directive;
pub mod resolver;

pub use directive::{DEFAULT_IMPORT, IMPORTS_KEY, ImportDirective, extract_imports};
pub use resolver::{DocumentKind, ImportResolver, LoadedDocument, ResolvedImports};
