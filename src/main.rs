use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::Level;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use confstack::imports::DocumentKind;
use confstack::tree::{Value, get_path, without_nulls};
use confstack::{ConfigLoader, ConfigTree, LoaderError};

#[derive(Parser)]
#[command(name = "confstack")]
#[command(
	author,
	version,
	about = "Load layered YAML/TOML configuration with imports and placeholders"
)]
#[command(arg_required_else_help = true)]
struct Cli {
	#[command(subcommand)]
	command: Commands,

	/// Log loader decisions to stderr
	#[arg(short, long, global = true, conflicts_with = "quiet")]
	verbose: bool,

	/// Only log errors
	#[arg(short, long, global = true)]
	quiet: bool,
}

#[derive(Subcommand)]
enum Commands {
	/// Print the fully resolved configuration
	Show {
		/// Entry configuration file
		path: PathBuf,

		#[command(flatten)]
		load: LoadArgs,

		/// Output format
		#[arg(long, value_enum, default_value_t = OutputFormat::Yaml)]
		format: OutputFormat,
	},
	/// Print a single value by dotted key path
	Get {
		/// Entry configuration file
		path: PathBuf,

		/// Dotted key path, e.g. SYS.sitename
		key: String,

		#[command(flatten)]
		load: LoadArgs,
	},
	/// Load the configuration and report whether it is valid
	Validate {
		/// Entry configuration file
		path: PathBuf,

		#[command(flatten)]
		load: LoadArgs,
	},
	/// List every document merged into the configuration, in load order
	Imports {
		/// Entry configuration file
		path: PathBuf,

		#[command(flatten)]
		load: LoadArgs,
	},
}

#[derive(clap::Args)]
struct LoadArgs {
	/// Fail on unresolved placeholders instead of substituting null
	#[arg(long, env = "CONFSTACK_STRICT")]
	strict: bool,

	/// Do not merge the framework default configuration
	#[arg(long)]
	no_defaults: bool,
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
	Yaml,
	Toml,
}

fn main() -> ExitCode {
	match run() {
		Ok(code) => code,
		Err(e) => {
			match e.downcast_ref::<LoaderError>() {
				Some(loader_error) => eprintln!("error [{}]: {e:#}", loader_error.code()),
				None => eprintln!("error: {e:#}"),
			}
			ExitCode::FAILURE
		}
	}
}

fn run() -> Result<ExitCode> {
	let cli = Cli::parse();
	init_tracing(cli.verbose, cli.quiet);

	match cli.command {
		Commands::Show { path, load, format } => handle_show(&path, &load, format),
		Commands::Get { path, key, load } => handle_get(&path, &key, &load),
		Commands::Validate { path, load } => handle_validate(&path, &load),
		Commands::Imports { path, load } => handle_imports(&path, &load),
	}
}

fn init_tracing(verbose: bool, quiet: bool) {
	// -v / -q override RUST_LOG; without either, RUST_LOG applies and
	// defaults to WARN.
	let filter = if verbose {
		EnvFilter::from_default_env().add_directive(Level::DEBUG.into())
	} else if quiet {
		EnvFilter::from_default_env().add_directive(Level::ERROR.into())
	} else {
		EnvFilter::builder()
			.with_default_directive(Level::WARN.into())
			.from_env_lossy()
	};
	let _ = tracing_subscriber::registry()
		.with(fmt::layer().with_writer(std::io::stderr))
		.with(filter)
		.try_init();
}

fn build_loader(path: &Path, args: &LoadArgs) -> ConfigLoader {
	let loader = ConfigLoader::new(path).strict(args.strict);
	if args.no_defaults {
		loader.without_defaults()
	} else {
		loader
	}
}

fn load(path: &Path, args: &LoadArgs) -> Result<ConfigTree> {
	let tree = build_loader(path, args)
		.load()
		.with_context(|| format!("Failed to load {}", path.display()))?;
	Ok(tree)
}

fn handle_show(path: &Path, args: &LoadArgs, format: OutputFormat) -> Result<ExitCode> {
	let tree = load(path, args)?;
	let rendered = match format {
		OutputFormat::Yaml => serde_yaml::to_string(&tree).context("Failed to render YAML")?,
		// TOML has no null; unresolved lenient placeholders are left out.
		OutputFormat::Toml => toml::to_string(&without_nulls(tree)).context("Failed to render TOML")?,
	};
	print!("{rendered}");
	Ok(ExitCode::SUCCESS)
}

fn handle_get(path: &Path, key: &str, args: &LoadArgs) -> Result<ExitCode> {
	let tree = load(path, args)?;
	let Some(value) = get_path(&tree, key) else {
		eprintln!("Key not found: {key}");
		return Ok(ExitCode::FAILURE);
	};

	match value {
		Value::String(s) => println!("{s}"),
		Value::Null => println!("null"),
		Value::Bool(b) => println!("{b}"),
		Value::Number(n) => println!("{n}"),
		other => print!("{}", serde_yaml::to_string(other).context("Failed to render YAML")?),
	}
	Ok(ExitCode::SUCCESS)
}

fn handle_validate(path: &Path, args: &LoadArgs) -> Result<ExitCode> {
	match build_loader(path, args).load_with_report() {
		Ok(report) => {
			println!(
				"Configuration is valid: {} ({} documents, {} top-level keys)",
				path.display(),
				report.documents.len(),
				report.tree.len()
			);
			Ok(ExitCode::SUCCESS)
		}
		Err(e) => {
			eprintln!("Configuration error [{}]: {}", e.code(), e);
			Ok(ExitCode::FAILURE)
		}
	}
}

fn handle_imports(path: &Path, args: &LoadArgs) -> Result<ExitCode> {
	let report = build_loader(path, args)
		.load_with_report()
		.with_context(|| format!("Failed to load {}", path.display()))?;

	if report.documents.is_empty() {
		println!("No configuration documents found.");
		return Ok(ExitCode::SUCCESS);
	}

	for document in &report.documents {
		let kind = match document.kind {
			DocumentKind::Entry => "entry",
			DocumentKind::Import => "import",
			DocumentKind::Default => "default",
		};
		println!(
			"{}{} ({kind})",
			"  ".repeat(document.depth),
			document.path.display()
		);
	}
	Ok(ExitCode::SUCCESS)
}
