use crate::error::{BoxError, LoaderError, Result};
use crate::tree::ConfigTree;

/// A transformation applied to the fully resolved tree.
///
/// Processors run after imports, placeholders and legacy serialization, in
/// the order they were registered. Each receives the previous processor's
/// output and may add, remove or change any key.
pub trait Processor: Send + Sync {
	/// Name used in logs and error reports.
	fn name(&self) -> &str;

	/// Transform `tree`.
	fn process(&self, tree: ConfigTree) -> std::result::Result<ConfigTree, BoxError>;
}

impl<T: Processor + ?Sized> Processor for &T {
	fn name(&self) -> &str {
		(**self).name()
	}

	fn process(&self, tree: ConfigTree) -> std::result::Result<ConfigTree, BoxError> {
		(**self).process(tree)
	}
}

impl<T: Processor + ?Sized> Processor for Box<T> {
	fn name(&self) -> &str {
		(**self).name()
	}

	fn process(&self, tree: ConfigTree) -> std::result::Result<ConfigTree, BoxError> {
		(**self).process(tree)
	}
}

/// Adapts a closure into a [`Processor`].
pub struct FnProcessor<F> {
	name: String,
	func: F,
}

impl<F> FnProcessor<F>
where
	F: Fn(ConfigTree) -> std::result::Result<ConfigTree, BoxError> + Send + Sync,
{
	pub fn new(name: impl Into<String>, func: F) -> Self {
		Self {
			name: name.into(),
			func,
		}
	}
}

impl<F> Processor for FnProcessor<F>
where
	F: Fn(ConfigTree) -> std::result::Result<ConfigTree, BoxError> + Send + Sync,
{
	fn name(&self) -> &str {
		&self.name
	}

	fn process(&self, tree: ConfigTree) -> std::result::Result<ConfigTree, BoxError> {
		(self.func)(tree)
	}
}

/// Run `processors` over `tree` in order. The first failure aborts the chain.
pub fn run_chain<I>(mut tree: ConfigTree, processors: I) -> Result<ConfigTree>
where
	I: IntoIterator,
	I::Item: Processor,
{
	for processor in processors {
		tracing::trace!(processor = processor.name(), "running processor");
		tree = processor
			.process(tree)
			.map_err(|source| LoaderError::ProcessorFailed {
				name: processor.name().to_string(),
				source,
			})?;
	}
	Ok(tree)
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::tree::Value;

	fn set(
		key: &'static str,
		value: &'static str,
	) -> FnProcessor<impl Fn(ConfigTree) -> std::result::Result<ConfigTree, BoxError> + Send + Sync>
	{
		FnProcessor::new(format!("set-{key}"), move |mut tree: ConfigTree| {
			tree.insert(Value::from(key), Value::from(value));
			Ok(tree)
		})
	}

	#[test]
	fn test_processors_run_in_order() {
		let first = set("shared", "first");
		let second = set("shared", "second");
		let chain: Vec<&dyn Processor> = vec![&first, &second];

		let tree = run_chain(ConfigTree::new(), chain).unwrap();
		assert_eq!(tree.get("shared"), Some(&Value::from("second")));

		let reversed: Vec<&dyn Processor> = vec![&second, &first];
		let tree = run_chain(ConfigTree::new(), reversed).unwrap();
		assert_eq!(tree.get("shared"), Some(&Value::from("first")));
	}

	#[test]
	fn test_processor_sees_previous_output() {
		let add = set("newKey", "value");
		let check = FnProcessor::new("check", |tree: ConfigTree| {
			if tree.contains_key("newKey") {
				Ok(tree)
			} else {
				Err("newKey missing".into())
			}
		});
		let chain: Vec<&dyn Processor> = vec![&add, &check];
		assert!(run_chain(ConfigTree::new(), chain).is_ok());
	}

	#[test]
	fn test_processor_error_aborts_chain() {
		let fail = FnProcessor::new("fail", |_tree: ConfigTree| Err("nope".into()));
		let never = set("unreachable", "x");
		let chain: Vec<&dyn Processor> = vec![&fail, &never];

		match run_chain(ConfigTree::new(), chain).unwrap_err() {
			LoaderError::ProcessorFailed { name, source } => {
				assert_eq!(name, "fail");
				assert_eq!(source.to_string(), "nope");
			}
			other => panic!("Expected ProcessorFailed error, got {other:?}"),
		}
	}

	#[test]
	fn test_empty_chain_is_identity() {
		let tree: ConfigTree = serde_yaml::from_str("foo: bar\n").unwrap();
		let out = run_chain(tree.clone(), Vec::<&dyn Processor>::new()).unwrap();
		assert_eq!(out, tree);
	}
}
