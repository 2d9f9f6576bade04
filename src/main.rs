use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use pathcypher::config::CompilerConfig;
use pathcypher::path_compiler::{QueryCompiler, RouteTable};
use pathcypher::utils::parameter_substitution::inline_parameters;
use serde_json::json;

/// pathcypher - compile request paths into Cypher statements
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Route table file (YAML, or JSON with a .json extension)
    #[arg(long)]
    routes: PathBuf,

    /// Compiler configuration file (YAML); environment variables are used otherwise
    #[arg(long)]
    config: Option<PathBuf>,

    /// Render property values inline instead of as $parameters
    #[arg(long)]
    literal: bool,

    /// Append ';' to each statement
    #[arg(long)]
    terminate: bool,

    /// Substitute parameter values into the printed statement
    #[arg(long)]
    inline: bool,

    /// List every route in the table
    #[arg(long)]
    list: bool,

    /// Request paths such as /model/ICDC/nodes
    paths: Vec<String>,
}

fn load_config(cli: &Cli) -> anyhow::Result<CompilerConfig> {
    let mut config = match &cli.config {
        Some(path) => CompilerConfig::from_yaml_file(path)
            .with_context(|| format!("reading config {}", path.display()))?,
        None => CompilerConfig::from_env().context("reading config from environment")?,
    };
    if cli.literal {
        config.use_params = false;
    }
    if cli.terminate {
        config.terminate = true;
    }
    Ok(config)
}

fn run(cli: Cli) -> anyhow::Result<bool> {
    let config = load_config(&cli)?;
    let table = RouteTable::from_file(&cli.routes)
        .with_context(|| format!("loading routes from {}", cli.routes.display()))?;

    if cli.list {
        for route in table.routes() {
            println!("{}", route);
        }
    }

    let compiler = QueryCompiler::new(table, config);
    let mut ok = true;
    for path in &cli.paths {
        match compiler.compile(path) {
            Ok(query) => {
                let text = if cli.inline {
                    inline_parameters(&query.statement().render(), query.params())?
                } else {
                    query.to_string()
                };
                println!("{}", text);
                println!("{}", serde_json::to_string(query.params())?);
            }
            Err(e) => {
                ok = false;
                let report = json!({
                    "path": path,
                    "kind": format!("{:?}", e.kind()),
                    "description": e.description(),
                    "offender": e.offender().to_string(),
                });
                eprintln!("{}", serde_json::to_string_pretty(&report)?);
            }
        }
    }
    log::info!("{:?}", compiler.cache_metrics());
    Ok(ok)
}

fn main() -> ExitCode {
    // Initialize logger - defaults to INFO level, can be overridden with RUST_LOG env var
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    if let Err(e) = dotenvy::dotenv() {
        log::debug!("no .env loaded: {}", e);
    }

    let cli = Cli::parse();
    match run(cli) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}
