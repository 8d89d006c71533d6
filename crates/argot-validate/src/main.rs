//! argot-validate - check a YAML document against an argot schema

use anyhow::{Context, Result};
use argot_validation::{load, LoadOptions, Ruleset, TagRegistry, DEFAULT_NAMESPACE};
use clap::{Parser, ValueEnum};
use std::fs;
use std::path::PathBuf;
use std::process;
use tracing::{debug, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod report;

#[derive(Parser, Debug)]
#[command(name = "argot-validate")]
#[command(version, about = "Validate a YAML document against an argot schema", long_about = None)]
struct Args {
    /// Schema file (tagged YAML)
    #[arg(short, long)]
    schema: PathBuf,

    /// Document to validate
    #[arg(short, long)]
    input: PathBuf,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,

    /// Namespace the schema's tags are declared in
    #[arg(long, default_value = DEFAULT_NAMESPACE)]
    namespace: String,

    /// JSON file with load options
    #[arg(long, value_name = "FILE")]
    options: Option<PathBuf>,

    /// Materialize the document even when it has annotations
    #[arg(long)]
    ignore_validation_errors: bool,

    /// Tag the document may instantiate (repeatable)
    #[arg(long = "permit-type", value_name = "TAG")]
    permit_types: Vec<String>,

    /// Allow anchors and aliases
    #[arg(long)]
    allow_aliases: bool,

    /// Only accept bare digit runs as integers
    #[arg(long)]
    strict_integers: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "argot=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args = Args::parse();
    if !run(&args)? {
        process::exit(1);
    }
    Ok(())
}

/// Validate and print; returns whether the document was free of errors.
fn run(args: &Args) -> Result<bool> {
    let schema = fs::read_to_string(&args.schema)
        .with_context(|| format!("Failed to read schema file: {}", args.schema.display()))?;
    let tags = TagRegistry::with_namespace(args.namespace.as_str());
    let ruleset = Ruleset::compile(&schema, &tags)
        .with_context(|| format!("Failed to compile schema: {}", args.schema.display()))?;
    debug!(rules = ruleset.len(), "schema ready");

    let source = fs::read_to_string(&args.input)
        .with_context(|| format!("Failed to read input file: {}", args.input.display()))?;
    let options = load_options(args)?;
    let label = args.input.display().to_string();
    let loaded = load(&ruleset, &source, &label, &options)
        .with_context(|| format!("Failed to load {}", label))?;

    match args.format {
        OutputFormat::Text => {
            for annotation in &loaded.annotations {
                match report::render(annotation, &source) {
                    Some(rendered) => eprint!("{}", rendered),
                    None => eprintln!("{}", annotation),
                }
            }
            if let Some(value) = &loaded.value {
                println!("{}", serde_json::to_string_pretty(value)?);
            }
        }
        OutputFormat::Json => {
            let output = serde_json::json!({
                "annotations": loaded.annotations,
                "value": loaded.value,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
    }

    info!(
        input = %label,
        annotations = loaded.annotations.len(),
        valid = loaded.is_valid(),
        "validation complete"
    );
    Ok(loaded.is_valid())
}

/// Options from `--options`, with command-line flags added on top.
fn load_options(args: &Args) -> Result<LoadOptions> {
    let mut options = match &args.options {
        Some(path) => {
            let text = fs::read_to_string(path)
                .with_context(|| format!("Failed to read options file: {}", path.display()))?;
            serde_json::from_str(&text)
                .with_context(|| format!("Failed to parse options file: {}", path.display()))?
        }
        None => LoadOptions::default(),
    };

    options.permitted_types.extend(args.permit_types.iter().cloned());
    options.allow_aliases |= args.allow_aliases;
    options.strict_integer_parsing |= args.strict_integers;
    options.ignore_validation_errors |= args.ignore_validation_errors;
    Ok(options)
}
