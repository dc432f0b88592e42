mod cli;
mod processor;

use scenemend::{arr::CatalogGateway, config, rules::RuleTable};

use anyhow::Result;
use clap::Parser;
use cli::{Cli, Commands, SourceArgs};
use std::path::Path;

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Respect RUST_LOG env var if set, otherwise pick a level from -v
    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| {
        match cli.verbose {
            0 => "scenemend=info,scenemend_av=info",
            1 => "scenemend=debug,scenemend_av=debug",
            _ => "scenemend=trace,scenemend_av=trace,reqwest=debug",
        }
        .to_string()
    });

    tracing_subscriber::fmt()
        .with_env_filter(&env_filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Run { source, jobs, json } => {
            let config = load(cli.config.as_deref(), &source)?;
            config.ensure_runnable()?;
            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(processor::run(&config, jobs, json))
        }
        Commands::Plan { source, json } => {
            let config = load(cli.config.as_deref(), &source)?;
            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(processor::plan(&config, json))
        }
        Commands::Classify { cause } => {
            let config = config::load_config_or_default(cli.config.as_deref())?;
            classify(&config, &cause)
        }
        Commands::Validate { source, online } => {
            let config = load(cli.config.as_deref(), &source)?;
            validate_config(&config, cli.config.as_deref(), online)
        }
        Commands::CheckTools => check_tools(),
        Commands::Version => {
            println!("scenemend {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}

fn load(path: Option<&Path>, source: &SourceArgs) -> Result<config::Config> {
    let mut config = config::load_config_or_default(path)?;
    config.apply_overrides(&source.overrides());
    Ok(config)
}

fn classify(config: &config::Config, cause: &str) -> Result<()> {
    let table = RuleTable::from_config(config)?;

    match table.matching_rule(cause) {
        Some(rule) => {
            println!("Matched rule: {} ({})", rule.name, rule.pattern);
            println!("Actions: {}", rule.action);
        }
        None => {
            println!("No rules matched.");
            println!("Actions: {}", table.classify(cause));
        }
    }

    Ok(())
}

fn check_tools() -> Result<()> {
    println!("Checking external tools...\n");

    let tools = scenemend_av::check_tools();
    let mut all_ok = true;

    for tool in &tools {
        let status = if tool.available {
            "✓"
        } else {
            all_ok = false;
            "✗"
        };

        print!("{} {}", status, tool.name);

        if let Some(ref version) = tool.version {
            print!(" ({})", version.lines().next().unwrap_or(""));
        }

        if let Some(ref path) = tool.path {
            print!(" - {}", path.display());
        }

        println!();
    }

    println!();
    if all_ok {
        println!("All required tools are available!");
    } else {
        println!("Some tools are missing. Install them to enable all features.");
    }

    Ok(())
}

fn validate_config(config: &config::Config, path: Option<&Path>, online: bool) -> Result<()> {
    match path {
        Some(p) => println!("Validating config: {:?}", p),
        None => println!("Validating config from default locations"),
    }

    config.ensure_runnable()?;
    let table = RuleTable::from_config(config)?;

    println!("✓ Configuration is valid");
    println!("  Log source: {}", config.log_source()?);
    println!("  Arr integrations: {}", config.arrs.len());
    for arr in config.arrs.iter().filter(|a| a.enabled) {
        println!("    {} ({}) at {}", arr.name, arr.arr_type, arr.url);
    }
    println!(
        "  Rules: {}{}",
        table.len(),
        if config.rules.is_empty() {
            " (built-in)"
        } else {
            ""
        }
    );
    let malformed = table
        .rules()
        .iter()
        .filter(|r| r.pattern.is_malformed())
        .count();
    if malformed > 0 {
        println!("    Malformed (skipped): {}", malformed);
    }
    println!(
        "  Repair strategy: {:?}",
        config.remediation.repair_strategy
    );

    if online {
        let gateway = CatalogGateway::from_config(config);
        let rt = tokio::runtime::Runtime::new()?;
        let results = rt.block_on(gateway.check());

        let mut all_ok = true;
        for (name, result) in results {
            match result {
                Ok(()) => println!("✓ {} reachable", name),
                Err(e) => {
                    all_ok = false;
                    println!("✗ {}: {}", name, e);
                }
            }
        }
        if !all_ok {
            anyhow::bail!("One or more catalogs are unreachable");
        }
    }

    Ok(())
}
