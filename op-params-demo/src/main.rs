use std::path::PathBuf;
use std::process::ExitCode;

mod logger;

use clap::Parser;
use op_params::{
    Builder, ParameterSource,
    args::{ArgMatching, CommandLineArgs},
    context::{DEFAULTS_FILE_ENV, DESCRIPTOR_FILE_ENV, ParamContextBuilder},
    store::{JsonSettings, StringTable},
};

const EMBEDDED_DESCRIPTORS: &str = include_str!("../resources/parameter_types.tsv");
const EMBEDDED_SETTINGS: &str = include_str!("../resources/settings.json");
const EMBEDDED_STRINGS: &str = include_str!("../resources/strings.tsv");

#[derive(Parser, Debug)]
#[command(name = "op-params-demo")]
#[command(about = "Resolve, override and validate operating parameters")]
struct Cli {
    /// Descriptor table (tab-separated, header row first)
    #[arg(long, value_name = "FILE")]
    descriptors: Option<PathBuf>,

    /// JSON object of default values
    #[arg(long, value_name = "FILE")]
    defaults: Option<PathBuf>,

    /// Tab-separated string table used for display names
    #[arg(long, value_name = "FILE")]
    strings: Option<PathBuf>,

    /// Display-name template; `{0}` is replaced by the internal name
    #[arg(long, default_value = "PARAM_DISPLAY_NAME_{0}")]
    display_name_template: String,

    /// Match override names case-sensitively
    #[arg(long)]
    case_sensitive: bool,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,

    /// Overrides, e.g. `OperatingParameter1=/var/log` or `/OperatingParameter1:/var/log`
    #[arg(value_name = "OVERRIDES", allow_hyphen_values = true)]
    overrides: Vec<String>,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    logger::init_logger(cli.verbose);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> op_params::Result<()> {
    let mut builder =
        ParamContextBuilder::default().with_display_name_template(cli.display_name_template);

    // Priority order:
    // 1. Command-line flag
    // 2. Environment variable, read by the context builder
    // 3. Embedded resource
    builder = match cli.descriptors {
        Some(path) => builder.with_descriptor_file(path),
        None if std::env::var_os(DESCRIPTOR_FILE_ENV).is_some() => builder,
        None => builder.with_embedded_descriptors(EMBEDDED_DESCRIPTORS),
    };
    builder = match cli.defaults {
        Some(path) => builder.with_defaults_file(path),
        None if std::env::var_os(DEFAULTS_FILE_ENV).is_some() => builder,
        None => builder.with_defaults(EMBEDDED_SETTINGS.parse::<JsonSettings>()?),
    };
    let strings = match cli.strings {
        Some(path) => StringTable::from_file(path)?,
        None => StringTable::parse(EMBEDDED_STRINGS)?,
    };
    let ctx = builder.with_strings(strings).build()?;

    println!("Default settings:");
    for (name, value) in ctx.default_settings()? {
        println!("    {} = {}", name, value);
    }
    println!();

    let shared = ctx.registry()?;
    let mut registry = shared.lock();

    let matching = if cli.case_sensitive {
        ArgMatching::CaseSensitive
    } else {
        ArgMatching::CaseInsensitive
    };
    let args = CommandLineArgs::parse(registry.names(), &cli.overrides, matching);
    let applied = registry.apply_overrides(&args, ParameterSource::FromOverrideStore)?;
    tracing::info!("Applied {} of {} overrides", applied, cli.overrides.len());

    println!("{} parameters:", registry.count());
    for (number, param) in registry.iter().enumerate() {
        println!("  # {}: {}", number + 1, param);
    }
    println!();

    println!("Validation:");
    let report = registry.validate_all()?;
    for outcome in &report.outcomes {
        println!(
            "    {} value of {} is {}",
            outcome.display_name,
            outcome.value,
            if outcome.valid { "valid" } else { "INVALID" }
        );
    }
    for name in &report.skipped {
        println!("    {} has no value", name);
    }

    if !report.all_valid() {
        tracing::warn!(
            "{} invalid, {} without a value",
            report.invalid().count(),
            report.skipped.len()
        );
    }
    Ok(())
}
