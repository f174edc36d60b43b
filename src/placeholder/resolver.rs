use crate::error::{LoaderError, Result};
use crate::placeholder::expression::{
	Placeholder, PlaceholderKind, contains_placeholder, find_placeholders,
};
use crate::placeholder::sources::{Constants, EnvSource};
use crate::tree::{ConfigTree, PATH_SEPARATOR, Value, get_path, key_to_string};

/// One step on the way from the tree root to a leaf.
#[derive(Debug, Clone)]
enum Segment {
	Key(Value),
	Index(usize),
}

/// Substitutes placeholder expressions in string scalars.
pub struct PlaceholderResolver<'a> {
	env: &'a dyn EnvSource,
	constants: &'a Constants,
	strict: bool,
}

impl<'a> PlaceholderResolver<'a> {
	pub fn new(env: &'a dyn EnvSource, constants: &'a Constants, strict: bool) -> Self {
		Self {
			env,
			constants,
			strict,
		}
	}

	/// Resolve every placeholder in `tree`.
	///
	/// Leaves are visited depth-first in document order and written back as
	/// they resolve, so `%conf(...)%` lookups see earlier substitutions.
	pub fn resolve(&self, mut tree: ConfigTree) -> Result<ConfigTree> {
		let mut leaves = Vec::new();
		collect_string_leaves(&tree, &mut Vec::new(), &mut leaves);

		for path in leaves {
			let Some(Value::String(text)) = value_at(&tree, &path) else {
				continue;
			};
			let text = text.clone();
			let key = display_path(&path);
			let resolved = self.resolve_text(&tree, &text, &key, &mut Vec::new())?;
			if let Some(slot) = value_at_mut(&mut tree, &path) {
				*slot = resolved;
			}
		}

		Ok(tree)
	}

	/// Expand placeholders in a standalone string, such as an import path.
	///
	/// `%conf(...)%` expressions have nothing to refer to here and count as
	/// unresolved.
	pub fn expand(&self, text: &str, key: &str) -> Result<String> {
		let value = self.resolve_text(&ConfigTree::new(), text, key, &mut Vec::new())?;
		Ok(scalar_to_string(&value).unwrap_or_default())
	}

	/// Resolve the placeholders of one string.
	///
	/// A string that is exactly one placeholder takes the looked-up value as
	/// is. Otherwise each placeholder is replaced by the string form of its
	/// value.
	fn resolve_text(
		&self,
		tree: &ConfigTree,
		text: &str,
		key: &str,
		stack: &mut Vec<String>,
	) -> Result<Value> {
		if !contains_placeholder(text) {
			return Ok(Value::String(text.to_string()));
		}
		let placeholders = find_placeholders(text);

		if let [only] = placeholders.as_slice()
			&& only.span.start == 0
			&& only.span.end == text.len()
		{
			return match self.lookup(tree, only, key, stack)? {
				Some(value) => Ok(value),
				None => {
					self.unresolved(only, key)?;
					Ok(Value::Null)
				}
			};
		}

		let mut out = String::with_capacity(text.len());
		let mut last = 0;
		for placeholder in &placeholders {
			out.push_str(&text[last..placeholder.span.start]);
			match self.lookup(tree, placeholder, key, stack)? {
				Some(value) => {
					let rendered = scalar_to_string(&value).ok_or_else(|| {
						LoaderError::NonScalarInterpolation {
							placeholder: placeholder.expression(),
							key: key.to_string(),
						}
					})?;
					out.push_str(&rendered);
				}
				None => self.unresolved(placeholder, key)?,
			}
			last = placeholder.span.end;
		}
		out.push_str(&text[last..]);

		Ok(Value::String(out))
	}

	fn lookup(
		&self,
		tree: &ConfigTree,
		placeholder: &Placeholder,
		key: &str,
		stack: &mut Vec<String>,
	) -> Result<Option<Value>> {
		match placeholder.kind {
			PlaceholderKind::Env => Ok(self.env.var(&placeholder.identifier).map(Value::String)),
			PlaceholderKind::Const => Ok(self
				.constants
				.get(&placeholder.identifier)
				.map(|value| Value::String(value.to_string()))),
			PlaceholderKind::ConfigRef => self.lookup_config(tree, &placeholder.identifier, key, stack),
		}
	}

	/// Resolve a `%conf(...)%` reference.
	///
	/// A referenced value that still holds placeholders is resolved on demand.
	/// A reference back into a path already being resolved counts as unresolved.
	fn lookup_config(
		&self,
		tree: &ConfigTree,
		path: &str,
		key: &str,
		stack: &mut Vec<String>,
	) -> Result<Option<Value>> {
		if path == key || stack.iter().any(|entry| entry == path) {
			tracing::debug!(path, key, "self-referencing placeholder");
			return Ok(None);
		}
		let Some(value) = get_path(tree, path) else {
			return Ok(None);
		};

		stack.push(path.to_string());
		let resolved = self.resolve_value(tree, value, path, stack);
		stack.pop();
		resolved.map(Some)
	}

	fn resolve_value(
		&self,
		tree: &ConfigTree,
		value: &Value,
		key: &str,
		stack: &mut Vec<String>,
	) -> Result<Value> {
		match value {
			Value::String(text) => self.resolve_text(tree, text, key, stack),
			Value::Sequence(items) => items
				.iter()
				.map(|item| self.resolve_value(tree, item, key, stack))
				.collect::<Result<Vec<_>>>()
				.map(Value::Sequence),
			Value::Mapping(map) => {
				let mut out = ConfigTree::with_capacity(map.len());
				for (k, v) in map {
					let child_key = format!("{key}{PATH_SEPARATOR}{}", key_to_string(k));
					out.insert(k.clone(), self.resolve_value(tree, v, &child_key, stack)?);
				}
				Ok(Value::Mapping(out))
			}
			other => Ok(other.clone()),
		}
	}

	fn unresolved(&self, placeholder: &Placeholder, key: &str) -> Result<()> {
		if self.strict {
			return Err(LoaderError::UnresolvedPlaceholder {
				placeholder: placeholder.expression(),
				key: key.to_string(),
			});
		}
		tracing::warn!(
			placeholder = %placeholder.expression(),
			key,
			"unresolved placeholder replaced with null"
		);
		Ok(())
	}
}

/// String form of a scalar for interpolation. `None` for mappings and
/// sequences.
fn scalar_to_string(value: &Value) -> Option<String> {
	match value {
		Value::Null => Some(String::new()),
		Value::Bool(b) => Some(b.to_string()),
		Value::Number(n) => Some(n.to_string()),
		Value::String(s) => Some(s.clone()),
		Value::Tagged(tagged) => scalar_to_string(&tagged.value),
		Value::Sequence(_) | Value::Mapping(_) => None,
	}
}

fn collect_string_leaves(map: &ConfigTree, prefix: &mut Vec<Segment>, out: &mut Vec<Vec<Segment>>) {
	for (key, value) in map {
		prefix.push(Segment::Key(key.clone()));
		collect_value(value, prefix, out);
		prefix.pop();
	}
}

fn collect_value(value: &Value, prefix: &mut Vec<Segment>, out: &mut Vec<Vec<Segment>>) {
	match value {
		Value::String(_) => out.push(prefix.clone()),
		Value::Mapping(map) => collect_string_leaves(map, prefix, out),
		Value::Sequence(items) => {
			for (index, item) in items.iter().enumerate() {
				prefix.push(Segment::Index(index));
				collect_value(item, prefix, out);
				prefix.pop();
			}
		}
		_ => {}
	}
}

fn value_at<'t>(tree: &'t ConfigTree, path: &[Segment]) -> Option<&'t Value> {
	let (first, rest) = path.split_first()?;
	let Segment::Key(key) = first else {
		return None;
	};
	let mut current = tree.get(key)?;
	for segment in rest {
		current = match (segment, current) {
			(Segment::Key(key), Value::Mapping(map)) => map.get(key)?,
			(Segment::Index(index), Value::Sequence(items)) => items.get(*index)?,
			_ => return None,
		};
	}
	Some(current)
}

fn value_at_mut<'t>(tree: &'t mut ConfigTree, path: &[Segment]) -> Option<&'t mut Value> {
	let (first, rest) = path.split_first()?;
	let Segment::Key(key) = first else {
		return None;
	};
	let mut current = tree.get_mut(key)?;
	for segment in rest {
		current = match (segment, current) {
			(Segment::Key(key), Value::Mapping(map)) => map.get_mut(key)?,
			(Segment::Index(index), Value::Sequence(items)) => items.get_mut(*index)?,
			_ => return None,
		};
	}
	Some(current)
}

fn display_path(path: &[Segment]) -> String {
	let separator = PATH_SEPARATOR.to_string();
	path.iter()
		.map(|segment| match segment {
			Segment::Key(key) => key_to_string(key),
			Segment::Index(index) => index.to_string(),
		})
		.collect::<Vec<_>>()
		.join(separator.as_str())
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::collections::HashMap;

	fn tree(yaml: &str) -> ConfigTree {
		serde_yaml::from_str(yaml).unwrap()
	}

	fn at(tree: &ConfigTree, path: &str) -> Value {
		get_path(tree, path).cloned().unwrap_or(Value::Null)
	}

	fn env(pairs: &[(&str, &str)]) -> HashMap<String, String> {
		pairs
			.iter()
			.map(|(k, v)| (k.to_string(), v.to_string()))
			.collect()
	}

	fn resolve(yaml: &str, env_vars: &HashMap<String, String>, strict: bool) -> Result<ConfigTree> {
		let constants = Constants::builtin();
		PlaceholderResolver::new(env_vars, &constants, strict).resolve(tree(yaml))
	}

	#[test]
	fn test_env_const_and_conf_placeholders() {
		let yaml = r#"
some:
  path: success
env: '%env(FOO)%'
const: '%const(LINE_SEP)%'
conf: '%conf(some.path)%'
"#;
		let resolved = resolve(yaml, &env(&[("FOO", "bar")]), true).unwrap();
		assert_eq!(at(&resolved, "env"), Value::from("bar"));
		assert_eq!(at(&resolved, "const"), Value::from(crate::placeholder::LINE_SEPARATOR));
		assert_eq!(at(&resolved, "conf"), Value::from("success"));
	}

	#[test]
	fn test_strict_mode_fails_on_unresolved() {
		let err = resolve("env: '%env(NOT_SET_ANYWHERE)%'\n", &env(&[]), true).unwrap_err();
		assert_eq!(err.code(), 1519640359);
		match err {
			LoaderError::UnresolvedPlaceholder { placeholder, key } => {
				assert_eq!(placeholder, "%env(NOT_SET_ANYWHERE)%");
				assert_eq!(key, "env");
			}
			other => panic!("Expected UnresolvedPlaceholder error, got {other:?}"),
		}
	}

	#[test]
	fn test_lenient_mode_substitutes_null() {
		let resolved = resolve(
			"env: '%env(NOT_SET_ANYWHERE)%'\ntext: 'a-%const(NOPE)%-b'\n",
			&env(&[]),
			false,
		)
		.unwrap();
		assert!(at(&resolved, "env").is_null());
		assert_eq!(at(&resolved, "text"), Value::from("a--b"));
	}

	#[test]
	fn test_interpolation_in_text() {
		let yaml = "db:\n  host: localhost\n  port: 5432\ndsn: 'pgsql://%conf(db.host)%:%conf(db.port)%/%env(DB)%'\n";
		let resolved = resolve(yaml, &env(&[("DB", "app")]), true).unwrap();
		assert_eq!(at(&resolved, "dsn"), Value::from("pgsql://localhost:5432/app"));
	}

	#[test]
	fn test_whole_placeholder_keeps_native_type() {
		let yaml = "db:\n  port: 5432\n  opts: {a: 1}\nport: '%conf(db.port)%'\nopts: '%conf(db.opts)%'\n";
		let resolved = resolve(yaml, &env(&[]), true).unwrap();
		assert_eq!(at(&resolved, "port"), Value::from(5432));
		assert!(at(&resolved, "opts").is_mapping());
	}

	#[test]
	fn test_interpolating_mapping_fails() {
		let yaml = "db:\n  opts: {a: 1}\nbad: 'x%conf(db.opts)%'\n";
		let err = resolve(yaml, &env(&[]), false).unwrap_err();
		assert!(matches!(err, LoaderError::NonScalarInterpolation { .. }));
	}

	#[test]
	fn test_forward_reference_resolves_on_demand() {
		let yaml = "first: '%conf(second)%/x'\nsecond: '%env(ROOT)%'\n";
		let resolved = resolve(yaml, &env(&[("ROOT", "/srv")]), true).unwrap();
		assert_eq!(at(&resolved, "first"), Value::from("/srv/x"));
		assert_eq!(at(&resolved, "second"), Value::from("/srv"));
	}

	#[test]
	fn test_reference_cycle_is_unresolved() {
		let yaml = "a: '%conf(b)%'\nb: '%conf(a)%'\n";
		let err = resolve(yaml, &env(&[]), true).unwrap_err();
		assert!(matches!(err, LoaderError::UnresolvedPlaceholder { .. }));

		let resolved = resolve(yaml, &env(&[]), false).unwrap();
		assert!(at(&resolved, "a").is_null());
	}

	#[test]
	fn test_sequences_and_non_strings() {
		let yaml = "list: ['%env(A)%', plain, 3]\nflag: true\n";
		let resolved = resolve(yaml, &env(&[("A", "x")]), true).unwrap();
		assert_eq!(
			at(&resolved, "list"),
			Value::Sequence(vec![Value::from("x"), Value::from("plain"), Value::from(3)])
		);
		assert_eq!(at(&resolved, "flag"), Value::Bool(true));
	}

	#[test]
	fn test_expand_for_standalone_strings() {
		let vars = env(&[("ROOT", "/srv/app")]);
		let constants = Constants::builtin();
		let resolver = PlaceholderResolver::new(&vars, &constants, true);
		assert_eq!(
			resolver.expand("%env(ROOT)%/config/base.yaml", "imports").unwrap(),
			"/srv/app/config/base.yaml"
		);
		assert!(resolver.expand("%conf(a.b)%", "imports").is_err());
	}
}
