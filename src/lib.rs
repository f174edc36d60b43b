//! Confstack - layered configuration loading with imports and placeholders.
//!
//! This library provides the core functionality for confstack, including:
//! - YAML and TOML document parsing
//! - Recursive imports with excludes, merged over a framework default layer
//! - `%env(...)%`, `%const(...)%` and `%conf(...)%` placeholder substitution
//! - Legacy string encoding of extension settings
//! - An ordered chain of post-merge processors
//!
//! # Example
//!
//! ```no_run
//! use confstack::ConfigLoader;
//! use confstack::tree::get_path;
//!
//! let tree = ConfigLoader::new("config/system/settings.yaml")
//!     .strict(true)
//!     .load()
//!     .unwrap();
//!
//! if let Some(name) = get_path(&tree, "SYS.sitename") {
//!     println!("Site: {:?}", name);
//! }
//! ```

pub mod error;
pub mod imports;
pub mod loader;
pub mod placeholder;
pub mod processors;
pub mod serialize;
pub mod source;
pub mod tree;

pub use error::{LoaderError, Result};
pub use loader::{ConfigLoader, LoadReport};
pub use tree::{ConfigTree, Value};
