//! Post-merge processors for confstack.
//!
//! This module handles:
//! - The [`Processor`] extension trait and ordered chain execution
//! - Built-in processors (`remove_keys`, `merge`, `rename`)
//! - Processors declared in a document's `processors` list

pub mod builtin;
pub mod chain;

pub use builtin::{MergeValues, PROCESSORS_KEY, RemoveKeys, RenameKey, extract_declared_processors};
pub use chain::{FnProcessor, Processor, run_chain};
