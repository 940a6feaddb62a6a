//! Command line companion to the linode_bindings library.
//!
//! ## Usage
//!
//! 1. Put `LINODE_API_KEY` in a `.env` file or `~/.linode.yml`
//! 2. Run a read-only smoke suite: `cargo run -- datacenter`
//! 3. Or explore interactively: `cargo run`, then `search linode`,
//!    `find datacenter abbr=dallas`, `search disk linode_id=8098`

#![allow(clippy::print_stdout)] // Allow println! in the binary

use clap::{Parser, ValueEnum};
use rustyline::{DefaultEditor, error::ReadlineError};
use tracing::info;

use linode_bindings::{
    AttrValue, Criteria, Datacenter, Disk, Distribution, Domain, Entity, Finder, IpAddress, Job, Kernel,
    Linode, LinodeApi, LinodeConfig, LinodeError, LinodeSettings, Nodebalancer, NodebalancerConfig,
    NodebalancerNode, Plan, Record, Resource, Stackscript,
};

/// Linode API smoke tests and interactive lookups.
#[derive(Parser, Debug)]
#[command(name = "linode-bindings", about = "Linode API smoke tests and interactive lookups")]
struct Cli {
    /// Resource suite to run against the live API. Omit for an interactive session.
    #[arg(value_enum)]
    suite: Option<Suite>,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Suite {
    Plan,
    Datacenter,
    Kernel,
    Distribution,
    Linode,
    Stackscript,
    Domain,
}

#[derive(Debug, Clone, Copy)]
enum Verb {
    Search,
    Find,
}

const HELP: &str = "\
commands:
  search <type> [key=value ...]   list every match
  find <type> key=value ...       show the single match
  help                            this text
  quit                            leave

types: plan datacenter kernel distribution linode ip job disk config
       domain record nodebalancer nodebalancer_config nodebalancer_node
       stackscript

keys ending in _begins or _ends match prefixes and suffixes; nested types
need their parent, e.g. `search disk linode_id=8098`";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let cli = Cli::parse();

    let settings = LinodeSettings::load()?;
    info!(api_url = %settings.api_url, "settings loaded");
    let api = LinodeApi::new(settings)?;

    match cli.suite {
        Some(suite) => run_suite(&api, suite).await?,
        None => repl(&api).await?,
    }
    Ok(())
}

// ============================================================================
// Smoke suites
// ============================================================================

async fn run_suite(api: &LinodeApi, suite: Suite) -> Result<(), LinodeError> {
    info!(?suite, "running suite");
    match suite {
        Suite::Plan => {
            for plan in api.search::<Plan>(Criteria::new()).await? {
                println!("{plan} max image {}MB", plan.max_image_size()?);
            }
        }
        Suite::Datacenter => {
            print_all(&api.search::<Datacenter>(Criteria::new()).await?);
            let dallas = Finder::<Datacenter>::new(api)
                .find_by_label_prefix("dallas", true)
                .await?;
            println!("first Dallas datacenter: {}", Entity::<Datacenter>::from_wire(&dallas)?);
        }
        Suite::Kernel => {
            print_all(&api.search::<Kernel>(Criteria::new().with("is_pvops", true)).await?);
        }
        Suite::Distribution => {
            print_all(
                &api.search::<Distribution>(Criteria::new().begins("label", "debian"))
                    .await?,
            );
        }
        Suite::Linode => {
            for linode in api.search::<Linode>(Criteria::new()).await? {
                println!("{linode} in {}", linode.datacenter(api).await?);
                print_all(&linode.disks(api).await?);
                print_all(&linode.configs(api).await?);
                print_all(&linode.ips(api).await?);
            }
        }
        Suite::Stackscript => {
            for script in api.search::<Stackscript>(Criteria::new()).await? {
                println!("{script}");
                print_all(&script.distributions(api).await?);
            }
        }
        Suite::Domain => {
            for domain in api.search::<Domain>(Criteria::new()).await? {
                let records = domain.search_records(api, Criteria::new()).await?;
                println!("{} ({} records)", domain.text("domain")?, records.len());
            }
        }
    }
    info!(?suite, "suite passed");
    Ok(())
}

fn print_all<T: std::fmt::Display>(items: &[T]) {
    for item in items {
        println!("  {item}");
    }
}

// ============================================================================
// Interactive session
// ============================================================================

async fn repl(api: &LinodeApi) -> Result<(), ReadlineError> {
    let mut editor = DefaultEditor::new()?;
    println!("{HELP}");

    loop {
        let line = match editor.readline("linode> ") {
            Ok(line) => line,
            Err(ReadlineError::Interrupted | ReadlineError::Eof) => break,
            Err(e) => return Err(e),
        };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        editor.add_history_entry(line)?;

        let mut words = line.split_whitespace();
        let verb = match words.next() {
            Some("search") => Verb::Search,
            Some("find") => Verb::Find,
            Some("quit" | "exit") => break,
            _ => {
                println!("{HELP}");
                continue;
            }
        };
        let Some(type_name) = words.next() else {
            println!("missing type; try `help`");
            continue;
        };
        let criteria = match parse_criteria(words) {
            Ok(criteria) => criteria,
            Err(bad) => {
                println!("expected key=value, got '{bad}'");
                continue;
            }
        };

        if let Err(e) = dispatch(api, verb, type_name, criteria).await {
            println!("error: {e}");
        }
    }
    Ok(())
}

fn parse_criteria<'a>(words: impl Iterator<Item = &'a str>) -> Result<Criteria, &'a str> {
    words
        .map(|word| {
            word.split_once('=')
                .map(|(key, value)| (key.to_string(), parse_value(value)))
                .ok_or(word)
        })
        .collect::<Result<Vec<_>, _>>()
        .map(|pairs| pairs.into_iter().collect())
}

fn parse_value(raw: &str) -> AttrValue {
    if let Ok(i) = raw.parse::<i64>() {
        return AttrValue::Int(i);
    }
    match raw {
        "true" => AttrValue::Bool(true),
        "false" => AttrValue::Bool(false),
        _ => AttrValue::from(raw.trim_matches(|c| c == '\'' || c == '"')),
    }
}

async fn dispatch(
    api: &LinodeApi,
    verb: Verb,
    type_name: &str,
    criteria: Criteria,
) -> Result<(), LinodeError> {
    match type_name.to_ascii_lowercase().as_str() {
        "plan" => lookup::<Plan>(api, verb, criteria).await,
        "datacenter" => lookup::<Datacenter>(api, verb, criteria).await,
        "kernel" => lookup::<Kernel>(api, verb, criteria).await,
        "distribution" => lookup::<Distribution>(api, verb, criteria).await,
        "linode" => lookup::<Linode>(api, verb, criteria).await,
        "ip" => lookup::<IpAddress>(api, verb, criteria).await,
        "job" => lookup::<Job>(api, verb, criteria).await,
        "disk" => lookup::<Disk>(api, verb, criteria).await,
        "config" => lookup::<LinodeConfig>(api, verb, criteria).await,
        "domain" => lookup::<Domain>(api, verb, criteria).await,
        "record" => lookup::<Record>(api, verb, criteria).await,
        "nodebalancer" => lookup::<Nodebalancer>(api, verb, criteria).await,
        "nodebalancer_config" => lookup::<NodebalancerConfig>(api, verb, criteria).await,
        "nodebalancer_node" => lookup::<NodebalancerNode>(api, verb, criteria).await,
        "stackscript" => lookup::<Stackscript>(api, verb, criteria).await,
        other => {
            println!("unknown type '{other}'; try `help`");
            Ok(())
        }
    }
}

async fn lookup<R: Resource>(api: &LinodeApi, verb: Verb, criteria: Criteria) -> Result<(), LinodeError> {
    match verb {
        Verb::Search => {
            let found = api.search::<R>(criteria).await?;
            print_all(&found);
            println!("{} {} found", found.len(), R::NAME);
        }
        Verb::Find => {
            let entity = api.find::<R>(criteria).await?;
            println!("{entity}");
            for (name, value) in entity.attributes() {
                println!("  {name}: {value}");
            }
        }
    }
    Ok(())
}
