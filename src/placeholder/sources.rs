use std::collections::HashMap;

/// Looks up environment variables for `%env(...)%` placeholders.
pub trait EnvSource: Send + Sync {
	fn var(&self, name: &str) -> Option<String>;
}

/// Reads the current process environment at lookup time.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnv;

impl EnvSource for ProcessEnv {
	fn var(&self, name: &str) -> Option<String> {
		std::env::var(name).ok()
	}
}

impl EnvSource for HashMap<String, String> {
	fn var(&self, name: &str) -> Option<String> {
		self.get(name).cloned()
	}
}

/// Platform line terminator.
pub const LINE_SEPARATOR: &str = if cfg!(windows) { "\r\n" } else { "\n" };

/// Platform separator between entries of a search path such as `PATH`.
pub const SEARCH_PATH_SEPARATOR: &str = if cfg!(windows) { ";" } else { ":" };

/// Named constants available to `%const(...)%` placeholders.
#[derive(Debug, Clone)]
pub struct Constants {
	values: HashMap<String, String>,
}

impl Constants {
	/// An empty table without the built-in constants.
	pub fn empty() -> Self {
		Self {
			values: HashMap::new(),
		}
	}

	/// The built-in constant table.
	///
	/// - `LINE_SEP`, `PHP_EOL`: platform line terminator
	/// - `DIR_SEP`, `DIRECTORY_SEPARATOR`: platform path separator
	/// - `PATH_SEP`, `PATH_SEPARATOR`: platform search-path separator
	pub fn builtin() -> Self {
		let dir_sep = std::path::MAIN_SEPARATOR.to_string();
		let mut constants = Self::empty();
		constants.insert("LINE_SEP", LINE_SEPARATOR);
		constants.insert("PHP_EOL", LINE_SEPARATOR);
		constants.insert("DIR_SEP", dir_sep.clone());
		constants.insert("DIRECTORY_SEPARATOR", dir_sep);
		constants.insert("PATH_SEP", SEARCH_PATH_SEPARATOR);
		constants.insert("PATH_SEPARATOR", SEARCH_PATH_SEPARATOR);
		constants
	}

	/// Add or replace a constant.
	pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
		self.values.insert(name.into(), value.into());
	}

	pub fn get(&self, name: &str) -> Option<&str> {
		self.values.get(name).map(String::as_str)
	}
}

impl Default for Constants {
	fn default() -> Self {
		Self::builtin()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_builtin_constants() {
		let constants = Constants::builtin();
		assert_eq!(constants.get("LINE_SEP"), Some(LINE_SEPARATOR));
		assert_eq!(constants.get("PHP_EOL"), Some(LINE_SEPARATOR));
		assert_eq!(
			constants.get("DIR_SEP"),
			Some(std::path::MAIN_SEPARATOR.to_string().as_str())
		);
		assert!(constants.get("NOT_A_CONSTANT").is_none());
	}

	#[test]
	fn test_custom_constant_overrides() {
		let mut constants = Constants::builtin();
		constants.insert("LINE_SEP", "<br>");
		constants.insert("APP_NAME", "confstack");
		assert_eq!(constants.get("LINE_SEP"), Some("<br>"));
		assert_eq!(constants.get("APP_NAME"), Some("confstack"));
		assert!(Constants::empty().get("LINE_SEP").is_none());
	}

	#[test]
	fn test_map_env_source() {
		let env: HashMap<String, String> = [("FOO".to_string(), "bar".to_string())].into();
		assert_eq!(env.var("FOO"), Some("bar".to_string()));
		assert_eq!(env.var("BAZ"), None);
	}

	#[test]
	fn test_process_env_source() {
		// SAFETY: the variable name is unique to this test
		unsafe {
			std::env::set_var("CONFSTACK_TEST_PROCESS_ENV", "value");
		}
		assert_eq!(
			ProcessEnv.var("CONFSTACK_TEST_PROCESS_ENV"),
			Some("value".to_string())
		);
		unsafe {
			std::env::remove_var("CONFSTACK_TEST_PROCESS_ENV");
		}
		assert_eq!(ProcessEnv.var("CONFSTACK_TEST_PROCESS_ENV"), None);
	}
}
