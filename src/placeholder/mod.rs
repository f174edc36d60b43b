//! Placeholder substitution for confstack.
//!
//! String scalars may embed `%env(NAME)%`, `%const(NAME)%` and
//! `%conf(dotted.path)%` expressions. This module handles:
//! - Finding placeholder expressions in text
//! - Environment and constant lookup sources
//! - Resolving a whole tree in document order, strictly or leniently

pub mod expression;
pub mod resolver;
pub mod sources;

pub use expression::{Placeholder, PlaceholderKind, contains_placeholder, find_placeholders};
pub use resolver::PlaceholderResolver;
pub use sources::{Constants, EnvSource, LINE_SEPARATOR, ProcessEnv};
