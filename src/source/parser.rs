use crate::error::{LoaderError, Result};
use crate::tree::{ConfigTree, Value};
use std::path::Path;

/// On-disk formats a configuration document may use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
	Yaml,
	Toml,
}

impl DocumentFormat {
	/// Pick the format from the file extension. Anything that is not `.toml`
	/// is read as YAML.
	pub fn from_path(path: &Path) -> Self {
		match path
			.extension()
			.and_then(|ext| ext.to_str())
			.map(|ext| ext.to_ascii_lowercase())
			.as_deref()
		{
			Some("toml") => DocumentFormat::Toml,
			_ => DocumentFormat::Yaml,
		}
	}
}

/// Parse a document from a string, choosing the format from `path`.
pub fn parse_document_str(content: &str, path: &Path) -> Result<ConfigTree> {
	match DocumentFormat::from_path(path) {
		DocumentFormat::Yaml => parse_yaml(content, path),
		DocumentFormat::Toml => parse_toml(content, path),
	}
}

/// Read and parse a document straight from the filesystem.
pub fn parse_document_file(path: &Path) -> Result<ConfigTree> {
	let content = std::fs::read_to_string(path).map_err(|source| LoaderError::ReadError {
		path: path.to_path_buf(),
		source,
	})?;

	parse_document_str(&content, path)
}

fn parse_yaml(content: &str, path: &Path) -> Result<ConfigTree> {
	let value: Value =
		serde_yaml::from_str(content).map_err(|source| LoaderError::YamlParseError {
			path: path.to_path_buf(),
			source,
		})?;

	match value {
		// An empty file parses to null and contributes nothing.
		Value::Null => Ok(ConfigTree::new()),
		Value::Mapping(map) => Ok(map),
		_ => Err(LoaderError::InvalidDocument {
			path: path.to_path_buf(),
		}),
	}
}

fn parse_toml(content: &str, path: &Path) -> Result<ConfigTree> {
	let table: toml::Table =
		toml::from_str(content).map_err(|source| LoaderError::TomlParseError {
			path: path.to_path_buf(),
			source,
		})?;

	Ok(toml_table_to_tree(table))
}

fn toml_table_to_tree(table: toml::Table) -> ConfigTree {
	table
		.into_iter()
		.map(|(key, value)| (Value::String(key), toml_to_value(value)))
		.collect()
}

fn toml_to_value(value: toml::Value) -> Value {
	match value {
		toml::Value::String(s) => Value::String(s),
		toml::Value::Integer(i) => Value::from(i),
		toml::Value::Float(f) => Value::from(f),
		toml::Value::Boolean(b) => Value::Bool(b),
		toml::Value::Datetime(dt) => Value::String(dt.to_string()),
		toml::Value::Array(items) => Value::Sequence(items.into_iter().map(toml_to_value).collect()),
		toml::Value::Table(table) => Value::Mapping(toml_table_to_tree(table)),
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::tree::get_path;
	use std::path::PathBuf;

	#[test]
	fn test_format_from_extension() {
		assert_eq!(
			DocumentFormat::from_path(Path::new("a/config.yaml")),
			DocumentFormat::Yaml
		);
		assert_eq!(
			DocumentFormat::from_path(Path::new("a/config.TOML")),
			DocumentFormat::Toml
		);
		assert_eq!(
			DocumentFormat::from_path(Path::new("a/config")),
			DocumentFormat::Yaml
		);
	}

	#[test]
	fn test_parse_empty_yaml() {
		let tree = parse_document_str("", &PathBuf::from("empty.yaml")).unwrap();
		assert!(tree.is_empty());
	}

	#[test]
	fn test_parse_yaml_keeps_order() {
		let content = "zeta: 1\nalpha: 2\nmid: 3\n";
		let tree = parse_document_str(content, &PathBuf::from("order.yaml")).unwrap();
		let keys: Vec<&str> = tree.keys().filter_map(Value::as_str).collect();
		assert_eq!(keys, vec!["zeta", "alpha", "mid"]);
	}

	#[test]
	fn test_parse_yaml_non_mapping_root() {
		let result = parse_document_str("- a\n- b\n", &PathBuf::from("list.yaml"));
		match result.unwrap_err() {
			LoaderError::InvalidDocument { path } => assert_eq!(path, PathBuf::from("list.yaml")),
			other => panic!("Expected InvalidDocument error, got {other:?}"),
		}
	}

	#[test]
	fn test_parse_yaml_syntax_error() {
		let result = parse_document_str("foo: [unclosed", &PathBuf::from("bad.yaml"));
		assert!(matches!(
			result.unwrap_err(),
			LoaderError::YamlParseError { .. }
		));
	}

	#[test]
	fn test_parse_toml_document() {
		let content = r#"
imports = ["base.yaml"]

[SYS]
sitename = "demo"
port = 8080
ratio = 0.5
"#;
		let tree = parse_document_str(content, &PathBuf::from("config.toml")).unwrap();
		assert_eq!(
			get_path(&tree, "SYS.sitename").and_then(Value::as_str),
			Some("demo")
		);
		assert_eq!(get_path(&tree, "SYS.port").and_then(Value::as_i64), Some(8080));
		assert_eq!(get_path(&tree, "SYS.ratio").and_then(Value::as_f64), Some(0.5));
		assert!(get_path(&tree, "imports").unwrap().is_sequence());
	}

	#[test]
	fn test_parse_toml_keeps_order() {
		let content = "zeta = 1\nalpha = 2\nmid = 3\n\n[EXT.extConf.my_ext]\nzoo = \"z\"\napple = \"a\"\n";
		let tree = parse_document_str(content, &PathBuf::from("order.toml")).unwrap();
		let keys: Vec<&str> = tree.keys().filter_map(Value::as_str).collect();
		assert_eq!(keys, vec!["zeta", "alpha", "mid", "EXT"]);

		let Some(Value::Mapping(ext)) = get_path(&tree, "EXT.extConf.my_ext") else {
			panic!("Expected a table at EXT.extConf.my_ext");
		};
		let ext_keys: Vec<&str> = ext.keys().filter_map(Value::as_str).collect();
		assert_eq!(ext_keys, vec!["zoo", "apple"]);
	}

	#[test]
	fn test_parse_toml_syntax_error() {
		let result = parse_document_str("invalid toml [[[", &PathBuf::from("bad.toml"));
		assert!(matches!(
			result.unwrap_err(),
			LoaderError::TomlParseError { .. }
		));
	}

	#[test]
	fn test_parse_missing_file() {
		let result = parse_document_file(Path::new("/definitely/not/here.yaml"));
		assert!(matches!(result.unwrap_err(), LoaderError::ReadError { .. }));
	}
}
