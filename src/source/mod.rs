//! Document loading for confstack.
//!
//! This module handles:
//! - Reading raw documents through a pluggable reader
//! - YAML and TOML parsing into a [`crate::tree::ConfigTree`]
//! - Discovery of the framework default configuration

pub mod defaults;
pub mod parser;
pub mod reader;

pub use defaults::{DefaultConfigProvider, FrameworkDefaults, StaticDefaults};
pub use parser::{DocumentFormat, parse_document_file, parse_document_str};
pub use reader::{DocumentReader, FsReader, InMemoryReader, normalize_path};
