use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use tokio::signal;
use tracing::{error, info, warn};

use rulectl::client::{RequestContext, RuleClient};
use rulectl::config::Config;
use rulectl::loader::load_rule_files;
use rulectl::observability::init_tracing;

#[derive(Debug, Parser)]
#[command(name = "rulectl")]
#[command(about = "Manage rule groups on a ruler API")]
struct Cli {
    #[command(flatten)]
    config: Config,

    /// Output format for fetched rules
    #[arg(long, value_enum, default_value = "yaml")]
    output: OutputFormat,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    Yaml,
    Json,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// List rule groups, optionally for a single namespace
    List {
        /// Namespace filter (sent as-is)
        namespace: Option<String>,
    },
    /// Print a single rule group
    Get { namespace: String, group: String },
    /// Delete a rule group
    Delete { namespace: String, group: String },
    /// Create or replace every rule group found in the given files
    Load {
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    init_tracing(&cli.config.log_level);

    let client = RuleClient::from_config(&cli.config)?;

    let (ctx, cancel) = RequestContext::cancellable();
    let ctx = ctx.with_timeout(cli.config.request_timeout());
    tokio::spawn(async move {
        if signal::ctrl_c().await.is_ok() {
            warn!("Received interrupt, cancelling requests");
            let _ = cancel.send(true);
        }
    });

    match cli.command {
        Command::List { namespace } => {
            let rules = client
                .list_rules(&ctx, namespace.as_deref().unwrap_or(""))
                .await?;
            print_output(&rules, cli.output)?;
        }
        Command::Get { namespace, group } => {
            let group = client.get_rule_group(&ctx, &namespace, &group).await?;
            print_output(&group, cli.output)?;
        }
        Command::Delete { namespace, group } => {
            client.delete_rule_group(&ctx, &namespace, &group).await?;
            info!(namespace = %namespace, group = %group, "Rule group deleted");
        }
        Command::Load { files } => {
            let namespaces = load_rule_files(files.as_slice())?;
            let mut failures = 0usize;

            for ns in &namespaces {
                for group in &ns.groups {
                    match client.create_rule_group(&ctx, &ns.namespace, group).await {
                        Ok(()) => {
                            info!(namespace = %ns.namespace, group = %group.name, "Rule group loaded")
                        }
                        Err(e) => {
                            failures += 1;
                            error!(
                                namespace = %ns.namespace,
                                group = %group.name,
                                error = %e,
                                "Failed to load rule group"
                            );
                        }
                    }
                }
            }

            if failures > 0 {
                anyhow::bail!("{} rule group(s) failed to load", failures);
            }
        }
    }

    Ok(())
}

fn print_output<T: Serialize>(value: &T, format: OutputFormat) -> anyhow::Result<()> {
    let rendered = match format {
        OutputFormat::Yaml => serde_yaml::to_string(value)?,
        OutputFormat::Json => serde_json::to_string_pretty(value)?,
    };
    println!("{}", rendered.trim_end());
    Ok(())
}
