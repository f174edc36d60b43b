//! The in-memory configuration tree and dotted-path helpers.
//!
//! A [`ConfigTree`] is an insertion-ordered mapping backed by
//! `serde_yaml::Mapping`. Every loader stage reads and writes this type.

pub use serde_yaml::Value;

/// Ordered mapping from key to value, shared by every loader stage.
pub type ConfigTree = serde_yaml::Mapping;

/// Separator between segments of a dotted key path such as `SYS.lang.format`.
pub const PATH_SEPARATOR: char = '.';

/// Render a mapping key as the string used in dotted paths.
pub fn key_to_string(key: &Value) -> String {
	match key {
		Value::String(s) => s.clone(),
		Value::Number(n) => n.to_string(),
		Value::Bool(b) => b.to_string(),
		Value::Null => String::new(),
		other => serde_yaml::to_string(other)
			.map(|s| s.trim_end().to_string())
			.unwrap_or_default(),
	}
}

/// Find the key in `map` whose dotted-path form equals `segment`.
///
/// String keys are matched directly; numeric and boolean keys fall back to
/// their rendered form so `ports.8080` finds a YAML integer key.
fn find_key(map: &ConfigTree, segment: &str) -> Option<Value> {
	if map.contains_key(segment) {
		return Some(Value::String(segment.to_string()));
	}
	map.keys()
		.find(|key| !key.is_string() && key_to_string(key) == segment)
		.cloned()
}

fn child<'a>(value: &'a Value, segment: &str) -> Option<&'a Value> {
	match value {
		Value::Mapping(map) => find_key(map, segment).and_then(|key| map.get(&key)),
		Value::Sequence(seq) => segment.parse::<usize>().ok().and_then(|i| seq.get(i)),
		_ => None,
	}
}

fn child_mut<'a>(value: &'a mut Value, segment: &str) -> Option<&'a mut Value> {
	match value {
		Value::Mapping(map) => find_key(map, segment).and_then(move |key| map.get_mut(&key)),
		Value::Sequence(seq) => segment
			.parse::<usize>()
			.ok()
			.and_then(move |i| seq.get_mut(i)),
		_ => None,
	}
}

/// Look up a dotted path. Numeric segments index into sequences.
pub fn get_path<'a>(tree: &'a ConfigTree, path: &str) -> Option<&'a Value> {
	if path.is_empty() {
		return None;
	}
	let mut segments = path.split(PATH_SEPARATOR);
	let first = segments.next()?;
	let mut current = find_key(tree, first).and_then(|key| tree.get(&key))?;
	for segment in segments {
		current = child(current, segment)?;
	}
	Some(current)
}

/// Mutable variant of [`get_path`].
pub fn get_path_mut<'a>(tree: &'a mut ConfigTree, path: &str) -> Option<&'a mut Value> {
	if path.is_empty() {
		return None;
	}
	let mut segments = path.split(PATH_SEPARATOR);
	let first = segments.next()?;
	let key = find_key(tree, first)?;
	let mut current = tree.get_mut(&key)?;
	for segment in segments {
		current = child_mut(current, segment)?;
	}
	Some(current)
}

/// Remove the value at a dotted path, returning it if it existed.
///
/// Sibling order is preserved. Removing from a sequence shifts later items.
pub fn remove_path(tree: &mut ConfigTree, path: &str) -> Option<Value> {
	match path.rsplit_once(PATH_SEPARATOR) {
		None => {
			let key = find_key(tree, path)?;
			tree.shift_remove(&key)
		}
		Some((parent, last)) => match get_path_mut(tree, parent)? {
			Value::Mapping(map) => {
				let key = find_key(map, last)?;
				map.shift_remove(&key)
			}
			Value::Sequence(seq) => {
				let index = last.parse::<usize>().ok()?;
				(index < seq.len()).then(|| seq.remove(index))
			}
			_ => None,
		},
	}
}

/// Set the value at a dotted path, creating intermediate mappings.
///
/// Any non-mapping value standing where an intermediate mapping is needed is
/// replaced.
pub fn set_path(tree: &mut ConfigTree, path: &str, value: Value) {
	let mut segments: Vec<&str> = path.split(PATH_SEPARATOR).collect();
	let Some(last) = segments.pop() else {
		return;
	};

	let mut current = tree;
	for segment in segments {
		let key = find_key(current, segment).unwrap_or_else(|| Value::String(segment.to_string()));
		let entry = current
			.entry(key)
			.or_insert_with(|| Value::Mapping(ConfigTree::new()));
		if !entry.is_mapping() {
			*entry = Value::Mapping(ConfigTree::new());
		}
		let Value::Mapping(map) = entry else {
			return;
		};
		current = map;
	}

	let key = find_key(current, last).unwrap_or_else(|| Value::String(last.to_string()));
	current.insert(key, value);
}

/// Merge `overlay` into `base`.
///
/// Nested mappings merge recursively. Scalars and sequences from `overlay`
/// replace the value in `base`; existing keys keep their position.
pub fn deep_merge(base: &mut ConfigTree, overlay: ConfigTree) {
	for (key, value) in overlay {
		let value = match (base.get_mut(&key), value) {
			(Some(Value::Mapping(existing)), Value::Mapping(incoming)) => {
				deep_merge(existing, incoming);
				continue;
			}
			(_, value) => value,
		};
		base.insert(key, value);
	}
}

/// Drop every null value, recursively, including null sequence items.
///
/// Formats without a null literal, such as TOML, can then render the tree.
pub fn without_nulls(tree: ConfigTree) -> ConfigTree {
	tree.into_iter()
		.filter(|(_, value)| !value.is_null())
		.map(|(key, value)| (key, prune_value(value)))
		.collect()
}

fn prune_value(value: Value) -> Value {
	match value {
		Value::Mapping(map) => Value::Mapping(without_nulls(map)),
		Value::Sequence(items) => Value::Sequence(
			items
				.into_iter()
				.filter(|item| !item.is_null())
				.map(prune_value)
				.collect(),
		),
		other => other,
	}
}
