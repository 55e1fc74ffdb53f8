use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use common::Configuration;
use common::cli::{CommonArgs, CommonCommands, utils};
use promql::ASTNode;
use promql::parser::QueryInfo;
use tempo_api::{TagSearch, TempoClient};
use traceql::CompletionConfig;

#[derive(Parser)]
#[command(name = "query-assist")]
#[command(about = "PromQL formatting and TraceQL completion for query editors")]
#[command(version)]
struct Cli {
    #[command(flatten)]
    common: CommonArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse a PromQL query and print it back in canonical form
    Format {
        query: String,

        /// Spread aggregations, calls and binary operands over several lines
        #[arg(long)]
        pretty: bool,

        /// Columns of indentation in front of every pretty-printed line
        #[arg(long)]
        indent: Option<usize>,
    },
    /// Print the syntax tree of a query
    Tree {
        query: String,

        /// Treat the query as TraceQL and print its concrete syntax tree
        #[arg(long)]
        traceql: bool,
    },
    /// Complete a TraceQL query at the cursor, using the configured Tempo
    Complete {
        query: String,

        /// Byte offset of the cursor, defaults to the end of the query
        #[arg(long)]
        cursor: Option<usize>,
    },
    #[command(flatten)]
    Common(CommonCommands),
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    utils::init_logging(&cli.common);
    let config = utils::load_config(cli.common.config.as_ref())?;

    match cli.command {
        Commands::Format {
            query,
            pretty,
            indent,
        } => {
            let pretty = pretty || config.format.pretty;
            let indent = indent.unwrap_or(config.format.indent);
            let formatted = promql::parser::format(&query, pretty, indent)
                .with_context(|| format!("Failed to format query `{query}`"))?;
            println!("{formatted}");
        }
        Commands::Tree { query, traceql } => {
            if traceql {
                let parse = traceql::syntax::parse(&query);
                print!("{}", parse.debug_tree());
                for error in parse.errors() {
                    log::warn!("{:?}: {}", error.range, error.message);
                }
            } else {
                let ast = promql::parser::parse(&query)
                    .with_context(|| format!("Failed to parse query `{query}`"))?;
                print_tree(&ast, 0);
                print!("{}", QueryInfo::of(&ast));
            }
        }
        Commands::Complete { query, cursor } => {
            let cursor = cursor.unwrap_or(query.len());
            let completion = completion_config(&config)?;
            match traceql::complete(&completion, &query, cursor)
                .await
                .context("Failed to retrieve completions")?
            {
                Some(result) => {
                    log::info!(
                        "{} options replacing from offset {}",
                        result.options.len(),
                        result.from
                    );
                    for option in &result.options {
                        println!("{}", option.display());
                    }
                }
                None => log::info!("Nothing to complete at offset {cursor}"),
            }
        }
        Commands::Common(command) => {
            let version = format!("{} {}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"));
            utils::handle_common_command(&command, &config, &version)?;
        }
    }

    Ok(())
}

fn completion_config(config: &Configuration) -> Result<CompletionConfig> {
    config.validate().context("Invalid configuration")?;
    let client: Option<Arc<dyn TagSearch>> = if config.tempo.enabled {
        let client = TempoClient::with_timeout(&config.tempo.url, config.tempo.timeout)
            .context("Failed to create Tempo client")?;
        log::debug!("Completing against Tempo at {}", client.base_url());
        Some(Arc::new(client))
    } else {
        log::info!("Tempo is disabled, tag names and values will not be completed");
        None
    };
    Ok(CompletionConfig::from_settings(&config.completion, client))
}

fn print_tree(node: &ASTNode, depth: usize) {
    println!("{:indent$}{}: {}", "", node.kind(), node, indent = depth * 2);
    for child in node.children() {
        print_tree(child, depth + 1);
    }
}
