use std::path::PathBuf;

/// Boxed error returned by processors.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Library-level structured errors for confstack.
///
/// Every variant maps to a stable numeric code (see [`LoaderError::code`]) so
/// callers can match on the failure cause without parsing messages.
/// The CLI binary wraps these with `anyhow` for rich context chains.
#[derive(Debug, thiserror::Error)]
pub enum LoaderError {
	#[error("Imported config file does not exist: {path} (imported from {importer})")]
	MissingImport { path: PathBuf, importer: PathBuf },

	#[error("Could not resolve placeholder {placeholder} in \"{key}\"")]
	UnresolvedPlaceholder { placeholder: String, key: String },

	#[error("Circular import detected: {cycle}")]
	CircularImport { cycle: String },

	#[error("Failed to read config file: {path}")]
	ReadError {
		path: PathBuf,
		#[source]
		source: std::io::Error,
	},

	#[error("Failed to parse YAML config file: {path}")]
	YamlParseError {
		path: PathBuf,
		#[source]
		source: serde_yaml::Error,
	},

	#[error("Failed to parse TOML config file: {path}")]
	TomlParseError {
		path: PathBuf,
		#[source]
		source: toml::de::Error,
	},

	#[error("Config file must contain a mapping at its root: {path}")]
	InvalidDocument { path: PathBuf },

	#[error("Invalid import entry in {path}: {reason}")]
	InvalidImport { path: PathBuf, reason: String },

	#[error("Placeholder {placeholder} in \"{key}\" resolves to a mapping or sequence and cannot be embedded in text")]
	NonScalarInterpolation { placeholder: String, key: String },

	#[error("Invalid processor declaration: {reason}")]
	InvalidProcessor { reason: String },

	#[error("Processor \"{name}\" failed")]
	ProcessorFailed {
		name: String,
		#[source]
		source: BoxError,
	},

	#[error("Failed to resolve home directory")]
	HomeDirectoryNotFound,
}

impl LoaderError {
	/// Stable numeric code identifying the failure cause.
	pub fn code(&self) -> u32 {
		match self {
			LoaderError::UnresolvedPlaceholder { .. } => 1519640359,
			LoaderError::MissingImport { .. } => 1519640360,
			LoaderError::CircularImport { .. } => 1519640361,
			LoaderError::ReadError { .. } => 1519640362,
			LoaderError::YamlParseError { .. } | LoaderError::TomlParseError { .. } => 1519640363,
			LoaderError::InvalidDocument { .. } => 1519640364,
			LoaderError::InvalidImport { .. } => 1519640365,
			LoaderError::NonScalarInterpolation { .. } => 1519640366,
			LoaderError::InvalidProcessor { .. } => 1519640367,
			LoaderError::ProcessorFailed { .. } => 1519640368,
			LoaderError::HomeDirectoryNotFound => 1519640369,
		}
	}
}

/// Result type alias using LoaderError.
pub type Result<T> = std::result::Result<T, LoaderError>;
