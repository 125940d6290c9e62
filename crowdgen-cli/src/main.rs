//! Crowdgen CLI: inspect the composition plan for a sale configuration.
//!
//! Commands:
//! - `plan`: print the full composition plan as JSON
//! - `args`: print the outer-constructor argument table
//! - `fragments`: print each batch fragment's declarations and call
//! - `parse-args`: parse deployment arguments against the argument table

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use crowdgen_core::compose::{compose, CompositionPlan};
use crowdgen_core::config::Configuration;
use crowdgen_core::render;
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "crowdgen",
    about = "Crowdgen CLI: token-sale contract composition engine"
)]
struct Cli {
    /// Default log filter (error, warn, info, debug, trace). RUST_LOG overrides it.
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the composition plan as JSON.
    Plan {
        /// Path to a JSON or TOML configuration file.
        #[arg(long)]
        input: PathBuf,

        /// Pretty-print the JSON output.
        #[arg(long, default_value_t = false)]
        pretty: bool,
    },
    /// Print the outer-constructor argument table.
    Args {
        /// Path to a JSON or TOML configuration file.
        #[arg(long)]
        input: PathBuf,
    },
    /// Print declaration and initialization code for every batch fragment.
    Fragments {
        /// Path to a JSON or TOML configuration file.
        #[arg(long)]
        input: PathBuf,
    },
    /// Parse deployment arguments by the plan's argument types.
    ParseArgs {
        /// Path to a JSON or TOML configuration file.
        #[arg(long)]
        input: PathBuf,

        /// Raw argument values, one per constructor argument.
        values: Vec<String>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(&cli.log_level);

    match cli.command {
        Commands::Plan { input, pretty } => run_plan(&input, pretty),
        Commands::Args { input } => run_args(&input),
        Commands::Fragments { input } => run_fragments(&input),
        Commands::ParseArgs { input, values } => run_parse_args(&input, &values),
    }
}

/// Log to stderr so stdout stays machine-readable.
fn init_tracing(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn load_plan(input: &Path) -> Result<CompositionPlan> {
    let config = Configuration::from_file(input)
        .with_context(|| format!("loading {}", input.display()))?;
    debug!(path = %input.display(), "configuration loaded");
    compose(&config).with_context(|| format!("composing {}", input.display()))
}

fn run_plan(input: &Path, pretty: bool) -> Result<()> {
    let plan = load_plan(input)?;
    let json = if pretty {
        serde_json::to_string_pretty(&plan)?
    } else {
        serde_json::to_string(&plan)?
    };
    println!("{json}");
    Ok(())
}

fn run_args(input: &Path) -> Result<()> {
    let plan = load_plan(input)?;

    println!("sale modules:  {}", render::inheritance_list(&plan.sale_modules));
    println!("token modules: {}", render::inheritance_list(&plan.token_modules));
    println!();
    println!("{:>5}  {:<8} {:<48} literal", "index", "type", "source");
    for arg in plan.constructor_args() {
        let literal = arg
            .param
            .literal
            .as_ref()
            .map(ToString::to_string)
            .unwrap_or_else(|| "-".to_string());
        println!(
            "{:>5}  {:<8} {:<48} {}",
            arg.index, arg.param.ty.as_str(), arg.param.source_path, literal
        );
    }
    println!();
    for call in render::super_constructor_calls(&plan.arguments) {
        println!("{call}");
    }
    Ok(())
}

fn run_fragments(input: &Path) -> Result<()> {
    let plan = load_plan(input)?;
    if plan.fragments.is_empty() {
        println!("no fragments");
        return Ok(());
    }

    for rendered in plan.rendered_fragments() {
        println!("// {:?}", rendered.kind);
        println!("{}", rendered.declare_code);
        println!("{}", rendered.init_code);
        println!();
    }
    Ok(())
}

fn run_parse_args(input: &Path, values: &[String]) -> Result<()> {
    let plan = load_plan(input)?;
    let parsed = plan
        .arguments
        .parse_deploy_args(values)
        .context("parsing deployment arguments")?;

    for (arg, literal) in plan.constructor_args().iter().zip(&parsed) {
        println!("{:>5}  {:<8} {}", arg.index, arg.param.ty.as_str(), literal);
    }
    Ok(())
}
