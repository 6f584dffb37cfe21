//! causeway CLI — simulate handler resolution and dispatch from the terminal.
//!
//! Usage:
//! ```bash
//! # Run a full dispatch and print the invocation trace and result
//! causeway dispatch --scenario scenario.json
//!
//! # Show the ordered handlers resolved for one type and tier
//! causeway resolve --scenario scenario.json --type DbError --pass breadth
//!
//! # Output as JSON
//! causeway dispatch --scenario scenario.json --json
//! ```
//!
//! The scenario file declares the type graph, the handler table with
//! scripted outcomes, and the raised fault; see `scenario.rs`.

mod scenario;

use std::env;
use std::fs;
use std::process;

use anyhow::{bail, Context, Result};
use tracing_subscriber::EnvFilter;

use causeway_core::{Pass, Qualifier, QualifierSet};
use causeway_engine::DispatchResult;

use crate::scenario::Scenario;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = env::args().collect();

    if args.len() < 2 {
        print_usage();
        process::exit(1);
    }

    let outcome = match args[1].as_str() {
        "dispatch" => cmd_dispatch(&args[2..]),
        "resolve" => cmd_resolve(&args[2..]),
        "help" | "--help" | "-h" => {
            print_usage();
            Ok(())
        }
        "version" | "--version" | "-V" => {
            println!("causeway {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
        other => {
            eprintln!("Unknown command: {other}");
            print_usage();
            process::exit(1);
        }
    };

    if let Err(err) = outcome {
        eprintln!("Error: {err:#}");
        process::exit(1);
    }
}

fn print_usage() {
    println!("causeway {}", env!("CARGO_PKG_VERSION"));
    println!("Simulate typed exception-handler dispatch\n");
    println!("USAGE:");
    println!("    causeway <COMMAND>\n");
    println!("COMMANDS:");
    println!("    dispatch  Run a scenario and print the invocation trace and result");
    println!("    resolve   Print the ordered handlers for one type and tier");
    println!("    version   Print version");
    println!("    help      Print this help\n");
    println!("DISPATCH FLAGS:");
    println!("    --scenario <FILE>   Scenario JSON file  [required]");
    println!("    --json              Output as JSON\n");
    println!("RESOLVE FLAGS:");
    println!("    --scenario <FILE>   Scenario JSON file  [required]");
    println!("    --type <NAME>       Concrete fault type  [required]");
    println!("    --pass <TIER>       breadth | depth  (default: breadth)");
    println!("    --qualifiers <A,B>  Override the scenario's qualifiers");
    println!("    --json              Output as JSON");
}

fn load_scenario(path: &str) -> Result<Scenario> {
    let json = fs::read_to_string(path).with_context(|| format!("reading {path}"))?;
    Scenario::from_json(&json)
}

fn cmd_dispatch(args: &[String]) -> Result<()> {
    let mut scenario_path: Option<&str> = None;
    let mut as_json = false;

    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--scenario" => {
                i += 1;
                scenario_path = args.get(i).map(|s| s.as_str());
            }
            "--json" => as_json = true,
            flag => bail!("unknown flag: {flag}"),
        }
        i += 1;
    }

    let Some(path) = scenario_path else {
        bail!("--scenario is required");
    };

    let assembled = load_scenario(path)?.assemble()?;
    let result = assembled
        .engine
        .dispatch(&assembled.raised, &assembled.qualifiers)?;
    let invoked = assembled.trace.lock().unwrap().clone();

    if as_json {
        let out = serde_json::json!({ "invoked": invoked, "result": result });
        println!("{}", serde_json::to_string_pretty(&out)?);
    } else {
        if invoked.is_empty() {
            println!("invoked: (none)");
        } else {
            println!("invoked:");
            for (i, entry) in invoked.iter().enumerate() {
                println!("  {}. {entry}", i + 1);
            }
        }
        match result {
            DispatchResult::Suppressed { handled } => {
                println!("result: suppressed ({})", if handled { "handled" } else { "unhandled" });
            }
            DispatchResult::RethrowOriginal => println!("result: rethrow original"),
            DispatchResult::RaiseReplacement(fault) => {
                let name = assembled.arena.name(fault.type_key)?;
                println!("result: raise replacement {name}: {}", fault.message);
            }
        }
    }
    Ok(())
}

fn cmd_resolve(args: &[String]) -> Result<()> {
    let mut scenario_path: Option<&str> = None;
    let mut type_name: Option<&str> = None;
    let mut pass = Pass::Breadth;
    let mut qualifiers: Option<QualifierSet> = None;
    let mut as_json = false;

    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--scenario" => {
                i += 1;
                scenario_path = args.get(i).map(|s| s.as_str());
            }
            "--type" => {
                i += 1;
                type_name = args.get(i).map(|s| s.as_str());
            }
            "--pass" => {
                i += 1;
                pass = match args.get(i).map(|s| s.as_str()) {
                    Some("breadth") => Pass::Breadth,
                    Some("depth") => Pass::Depth,
                    other => bail!("--pass must be breadth or depth, got {other:?}"),
                };
            }
            "--qualifiers" => {
                i += 1;
                let raw = args.get(i).map(|s| s.as_str()).unwrap_or("");
                qualifiers = Some(
                    raw.split(',')
                        .filter(|t| !t.is_empty())
                        .map(Qualifier::from)
                        .collect(),
                );
            }
            "--json" => as_json = true,
            flag => bail!("unknown flag: {flag}"),
        }
        i += 1;
    }

    let Some(path) = scenario_path else {
        bail!("--scenario is required");
    };
    let Some(type_name) = type_name else {
        bail!("--type is required");
    };

    let scenario = load_scenario(path)?;
    let assembled = scenario.assemble()?;
    let concrete = assembled
        .arena
        .key(type_name)
        .with_context(|| format!("unknown type '{type_name}'"))?;
    let requested = qualifiers.unwrap_or_else(|| {
        scenario.qualifiers.iter().map(|t| Qualifier::new(t.clone())).collect()
    });

    let resolved = assembled
        .engine
        .registry()
        .resolve(concrete, pass, &requested)?;

    if as_json {
        let handles: Vec<&str> = resolved.iter().map(|d| d.handle.as_str()).collect();
        let out = serde_json::json!({ "type": type_name, "pass": pass, "handlers": handles });
        println!("{}", serde_json::to_string_pretty(&out)?);
    } else if resolved.is_empty() {
        println!("no handlers resolved for {type_name} ({pass})");
    } else {
        println!("handlers for {type_name} ({pass}):");
        for (i, descriptor) in resolved.iter().enumerate() {
            let declared = assembled.arena.name(descriptor.exception_type)?;
            println!(
                "  {}. {} on {declared} (precedence {}, {})",
                i + 1,
                descriptor.handle,
                descriptor.precedence,
                descriptor.path
            );
        }
    }
    Ok(())
}
