//! Legacy string encoding for extension settings.
//!
//! Consumers of the extension configuration expect each extension's settings
//! as one string in the classic `serialize()` wire format, for example
//! `{foo: bar}` becomes `a:1:{s:3:"foo";s:3:"bar";}`.
//!
//! Grammar:
//! - null `N;`, bool `b:0;` / `b:1;`, integer `i:<n>;`
//! - float `d:<repr>;` with `INF`, `-INF` and `NAN` for non-finite values
//! - string `s:<byte length>:"<bytes>";`
//! - array `a:<count>:{<key><value>...}`; keys that are canonical decimal
//!   integers are written as `i:<n>;`, sequences use keys `0..n`

use crate::tree::{ConfigTree, Value, get_path_mut, key_to_string};
use std::fmt::Write;

/// The subtree serialized by default: one entry per extension.
pub const EXTENSION_CONFIGURATION_PATH: &str = "EXT.extConf";

/// Replace every mapping or sequence directly below each marked path with its
/// legacy encoding. Scalars and missing paths are left alone.
pub fn serialize_marked(mut tree: ConfigTree, marked_paths: &[String]) -> ConfigTree {
	for marked in marked_paths {
		let Some(Value::Mapping(section)) = get_path_mut(&mut tree, marked) else {
			continue;
		};
		for (key, value) in section.iter_mut() {
			if value.is_mapping() || value.is_sequence() {
				tracing::debug!(path = %marked, key = %key_to_string(key), "serializing legacy settings");
				*value = Value::String(encode(value));
			}
		}
	}
	tree
}

/// Encode one value in the legacy format.
pub fn encode(value: &Value) -> String {
	let mut out = String::new();
	encode_into(&mut out, value);
	out
}

fn encode_into(out: &mut String, value: &Value) {
	match value {
		Value::Null => out.push_str("N;"),
		Value::Bool(b) => {
			let _ = write!(out, "b:{};", u8::from(*b));
		}
		Value::Number(n) => {
			if let Some(i) = n.as_i64() {
				let _ = write!(out, "i:{i};");
			} else if let Some(u) = n.as_u64() {
				// Too large for a signed integer; the legacy reader widens to float.
				let _ = write!(out, "d:{u};");
			} else if let Some(f) = n.as_f64() {
				let _ = write!(out, "d:{};", format_float(f));
			}
		}
		Value::String(s) => encode_string(out, s),
		Value::Sequence(items) => {
			let _ = write!(out, "a:{}:{{", items.len());
			for (index, item) in items.iter().enumerate() {
				let _ = write!(out, "i:{index};");
				encode_into(out, item);
			}
			out.push('}');
		}
		Value::Mapping(map) => {
			let _ = write!(out, "a:{}:{{", map.len());
			for (key, item) in map {
				encode_key(out, key);
				encode_into(out, item);
			}
			out.push('}');
		}
		Value::Tagged(tagged) => encode_into(out, &tagged.value),
	}
}

fn encode_string(out: &mut String, s: &str) {
	let _ = write!(out, "s:{}:\"{}\";", s.len(), s);
}

fn encode_key(out: &mut String, key: &Value) {
	let key = key_to_string(key);
	match integer_key(&key) {
		Some(i) => {
			let _ = write!(out, "i:{i};");
		}
		None => encode_string(out, &key),
	}
}

/// Keys like `"0"` or `"-12"` become integer keys; `"007"` or `"+1"` stay strings.
fn integer_key(key: &str) -> Option<i64> {
	let digits = key.strip_prefix('-').unwrap_or(key);
	let canonical = !digits.is_empty()
		&& digits.bytes().all(|b| b.is_ascii_digit())
		&& (digits == "0" || !digits.starts_with('0'))
		&& key != "-0";
	if canonical { key.parse().ok() } else { None }
}

fn format_float(f: f64) -> String {
	if f.is_nan() {
		"NAN".to_string()
	} else if f == f64::INFINITY {
		"INF".to_string()
	} else if f == f64::NEG_INFINITY {
		"-INF".to_string()
	} else {
		f.to_string()
	}
}
