use regex::Regex;
use std::ops::Range;
use std::sync::LazyLock;

/// Matches `%env(NAME)%`, `%const(NAME)%` and `%conf(dotted.path)%`.
static PLACEHOLDER_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
	Regex::new(r"%(env|const|conf)\(([^()%\s]+)\)%").expect("placeholder pattern is valid")
});

/// Where a placeholder takes its value from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaceholderKind {
	/// An environment variable.
	Env,
	/// A named constant from the constant table.
	Const,
	/// A dotted path into the configuration being resolved.
	ConfigRef,
}

impl PlaceholderKind {
	pub fn as_str(&self) -> &'static str {
		match self {
			PlaceholderKind::Env => "env",
			PlaceholderKind::Const => "const",
			PlaceholderKind::ConfigRef => "conf",
		}
	}

	fn from_tag(tag: &str) -> Option<Self> {
		match tag {
			"env" => Some(PlaceholderKind::Env),
			"const" => Some(PlaceholderKind::Const),
			"conf" => Some(PlaceholderKind::ConfigRef),
			_ => None,
		}
	}
}

/// One placeholder occurrence inside a string scalar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Placeholder {
	pub kind: PlaceholderKind,

	/// Variable name, constant name or dotted config path.
	pub identifier: String,

	/// Byte range of the whole expression, delimiters included.
	pub span: Range<usize>,
}

impl Placeholder {
	/// The expression as written, e.g. `%env(FOO)%`.
	pub fn expression(&self) -> String {
		format!("%{}({})%", self.kind.as_str(), self.identifier)
	}
}

/// Find every placeholder in `text`, left to right.
pub fn find_placeholders(text: &str) -> Vec<Placeholder> {
	PLACEHOLDER_PATTERN
		.captures_iter(text)
		.filter_map(|caps| {
			let whole = caps.get(0)?;
			let kind = PlaceholderKind::from_tag(caps.get(1)?.as_str())?;
			Some(Placeholder {
				kind,
				identifier: caps.get(2)?.as_str().to_string(),
				span: whole.range(),
			})
		})
		.collect()
}

/// Whether `text` contains at least one placeholder.
pub fn contains_placeholder(text: &str) -> bool {
	PLACEHOLDER_PATTERN.is_match(text)
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_find_single_placeholder() {
		let found = find_placeholders("%env(FOO)%");
		assert_eq!(found.len(), 1);
		assert_eq!(found[0].kind, PlaceholderKind::Env);
		assert_eq!(found[0].identifier, "FOO");
		assert_eq!(found[0].span, 0..10);
		assert_eq!(found[0].expression(), "%env(FOO)%");
	}

	#[test]
	fn test_find_multiple_placeholders_in_text() {
		let found = find_placeholders("host=%conf(db.host)%:%env(PORT)%%const(LINE_SEP)%");
		let kinds: Vec<_> = found.iter().map(|p| p.kind).collect();
		assert_eq!(
			kinds,
			vec![
				PlaceholderKind::ConfigRef,
				PlaceholderKind::Env,
				PlaceholderKind::Const
			]
		);
		assert_eq!(found[0].identifier, "db.host");
	}

	#[test]
	fn test_unknown_kind_and_malformed_are_ignored() {
		assert!(find_placeholders("%file(/etc/passwd)%").is_empty());
		assert!(find_placeholders("%env()%").is_empty());
		assert!(find_placeholders("%env(FOO%").is_empty());
		assert!(find_placeholders("100% (roughly)").is_empty());
		assert!(!contains_placeholder("plain text"));
		assert!(contains_placeholder("x %env(A)% y"));
	}
}
