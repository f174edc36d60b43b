use std::collections::HashMap;
use std::io;
use std::path::{Component, Path, PathBuf};

/// Provides raw document contents for a path.
///
/// The loader only ever reads through this trait, so tests and embedders can
/// serve documents from memory instead of the filesystem.
pub trait DocumentReader: Send + Sync {
	/// Whether a document exists at `path`.
	fn exists(&self, path: &Path) -> bool;

	/// Read the full document at `path`.
	fn read_to_string(&self, path: &Path) -> io::Result<String>;

	/// Identity used for import cycle detection.
	fn canonicalize(&self, path: &Path) -> PathBuf {
		normalize_path(path)
	}
}

/// Reads documents from the local filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsReader;

impl DocumentReader for FsReader {
	fn exists(&self, path: &Path) -> bool {
		path.is_file()
	}

	fn read_to_string(&self, path: &Path) -> io::Result<String> {
		std::fs::read_to_string(path)
	}

	fn canonicalize(&self, path: &Path) -> PathBuf {
		canonicalize_fs(path).unwrap_or_else(|_| normalize_path(path))
	}
}

/// Canonical filesystem path. On Windows `dunce` strips the `\\?\` prefix
/// so cycle reports show ordinary paths.
fn canonicalize_fs(path: &Path) -> io::Result<PathBuf> {
	#[cfg(windows)]
	{
		dunce::canonicalize(path)
	}
	#[cfg(not(windows))]
	{
		std::fs::canonicalize(path)
	}
}

/// Serves documents from an in-memory map keyed by normalized path.
#[derive(Debug, Clone, Default)]
pub struct InMemoryReader {
	files: HashMap<PathBuf, String>,
}

impl InMemoryReader {
	pub fn new() -> Self {
		Self::default()
	}

	/// Add a document, builder style.
	pub fn with_file(mut self, path: impl AsRef<Path>, content: impl Into<String>) -> Self {
		self.insert(path, content);
		self
	}

	pub fn insert(&mut self, path: impl AsRef<Path>, content: impl Into<String>) {
		self.files
			.insert(normalize_path(path.as_ref()), content.into());
	}
}

impl DocumentReader for InMemoryReader {
	fn exists(&self, path: &Path) -> bool {
		self.files.contains_key(&normalize_path(path))
	}

	fn read_to_string(&self, path: &Path) -> io::Result<String> {
		self.files
			.get(&normalize_path(path))
			.cloned()
			.ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, path.display().to_string()))
	}
}

/// Lexically normalize a path: drop `.` components and fold `..` into the
/// preceding component. Symlinks are not resolved.
pub fn normalize_path(path: &Path) -> PathBuf {
	let mut out = PathBuf::new();
	for component in path.components() {
		match component {
			Component::CurDir => {}
			Component::ParentDir => {
				if !out.pop() {
					out.push(component.as_os_str());
				}
			}
			other => out.push(other.as_os_str()),
		}
	}
	out
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_normalize_path() {
		assert_eq!(
			normalize_path(Path::new("/etc/app/./conf/../base.yaml")),
			PathBuf::from("/etc/app/base.yaml")
		);
		assert_eq!(
			normalize_path(Path::new("../shared/a.yaml")),
			PathBuf::from("../shared/a.yaml")
		);
	}

	#[test]
	fn test_in_memory_reader_normalizes_keys() {
		let reader = InMemoryReader::new().with_file("/cfg/a.yaml", "foo: bar");
		assert!(reader.exists(Path::new("/cfg/sub/../a.yaml")));
		assert_eq!(
			reader.read_to_string(Path::new("/cfg/./a.yaml")).unwrap(),
			"foo: bar"
		);
		assert!(!reader.exists(Path::new("/cfg/b.yaml")));
		assert_eq!(
			reader
				.read_to_string(Path::new("/cfg/b.yaml"))
				.unwrap_err()
				.kind(),
			io::ErrorKind::NotFound
		);
	}

	#[test]
	fn test_fs_reader() {
		let temp_dir = tempfile::tempdir().unwrap();
		let path = temp_dir.path().join("config.yaml");
		std::fs::write(&path, "foo: bar\n").unwrap();

		let reader = FsReader;
		assert!(reader.exists(&path));
		assert!(!reader.exists(temp_dir.path()));
		assert_eq!(reader.read_to_string(&path).unwrap(), "foo: bar\n");
		let canonical = reader.canonicalize(&temp_dir.path().join("./config.yaml"));
		assert_eq!(canonical, canonicalize_fs(&path).unwrap());
		assert!(canonical.is_absolute());
		assert!(!canonical.to_string_lossy().starts_with(r"\\?\"));
	}
}
