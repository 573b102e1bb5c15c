//! EZBuy
//!
//! Ingests marketplace goods, searches them against client shopping lists,
//! and matches new posts to the clients watching each item.
//! Can run one operation at a time or as a scheduled cron job.

use clap::{Parser, Subcommand};
use core_config::tracing::{init_tracing, install_color_eyre};
use database::mongodb::{MongoSession, check_health_detailed};
use domain_goods::{MongoGoodsService, RemoveSelection};
use eyre::{Result, WrapErr};
use serde::Serialize;
use std::path::PathBuf;
use tracing::info;

mod config;
mod feed;
mod scheduler;

use config::Config;

#[derive(Parser)]
#[command(name = "ezbuy")]
#[command(about = "Match marketplace goods against client shopping lists")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Ingest goods from a JSON file (an array, or a page with a `data` array)
    Ingest {
        file: PathBuf,
    },

    /// Search goods against a client's shopping list
    Search {
        client_id: String,
    },

    /// List every stored good, newest first
    List,

    /// Remove every stored good
    Purge,

    /// Record goods mentioning each tracked item as new posts
    Refresh,

    /// Match posts against subscribers
    Match {
        /// Match a single item instead of all of them
        #[arg(short, long)]
        item: Option<String>,
    },

    /// Manage a client's shopping list
    Cart {
        #[command(subcommand)]
        command: CartCommands,
    },

    /// Run refresh + match as a scheduled service
    Schedule {
        /// Cron expression (default: MATCH_CRON, or every 10 minutes)
        #[arg(short, long)]
        cron: Option<String>,
    },

    /// Check MongoDB connectivity
    Health,
}

#[derive(Subcommand)]
enum CartCommands {
    /// Add an item keyword to a client's cart
    Add {
        client_id: String,
        item: String,
        /// Display name stored with the list
        #[arg(short, long, default_value = "")]
        name: String,
    },

    /// Show a client's cart
    Show {
        client_id: String,
    },

    /// Remove from a client's cart: a zero-based index, `all`, or `none`
    Remove {
        client_id: String,
        #[arg(allow_hyphen_values = true)]
        selection: RemoveSelection,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    install_color_eyre();

    let cli = Cli::parse();
    let config = Config::from_env()?;
    init_tracing(&config.environment);

    match (&cli.command, config.metrics_addr) {
        (Commands::Schedule { .. }, Some(addr)) => {
            observability::serve_metrics(addr).wrap_err("failed to start metrics exporter")?
        }
        _ => {
            observability::init_metrics();
        }
    }

    info!("Connecting to MongoDB...");
    let session = MongoSession::open_with_retry(&config.mongo, Some(config.retry.clone()))
        .await
        .wrap_err("MongoDB connection failed")?;

    let service = domain_goods::mongodb::service(session.database(), config.goods.clone());

    let outcome = run(cli.command, &config, &session, service).await;

    session.shutdown().await;
    outcome
}

async fn run(
    command: Commands,
    config: &Config,
    session: &MongoSession,
    service: MongoGoodsService,
) -> Result<()> {
    match command {
        Commands::Ingest { file } => {
            let goods = feed::load(&file).await?;
            info!(count = goods.len(), file = %file.display(), "Ingesting goods");
            print_json(&service.ingest(goods).await?)
        }

        Commands::Search { client_id } => print_json(&service.search_for_client(&client_id).await?),

        Commands::List => print_json(&service.list_all().await?),

        Commands::Purge => {
            let deleted = service.remove_all().await?;
            print_json(&serde_json::json!({ "deleted": deleted }))
        }

        Commands::Refresh => print_json(&service.refresh_item_info().await?),

        Commands::Match { item: Some(item) } => {
            print_json(&service.match_item_named(&item).await?)
        }

        Commands::Match { item: None } => print_json(&service.match_all().await?),

        Commands::Cart { command } => match command {
            CartCommands::Add {
                client_id,
                item,
                name,
            } => print_json(&service.add_to_cart(&client_id, &name, &item).await?),
            CartCommands::Show { client_id } => print_json(&service.show_cart(&client_id).await?),
            CartCommands::Remove {
                client_id,
                selection,
            } => print_json(&service.remove_from_cart(&client_id, selection).await?),
        },

        Commands::Schedule { cron } => {
            let cron = cron.unwrap_or_else(|| config.match_cron.clone());
            scheduler::run_scheduled(service, &cron).await
        }

        Commands::Health => {
            let status = check_health_detailed(session).await;
            print_json(&status)?;
            if !status.healthy {
                eyre::bail!(
                    "MongoDB is unhealthy: {}",
                    status.message.as_deref().unwrap_or("unknown error")
                );
            }
            Ok(())
        }
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_cart_remove_accepts_legacy_codes() {
        let cli = Cli::try_parse_from(["ezbuy", "cart", "remove", "c1", "-1"]).unwrap();
        match cli.command {
            Commands::Cart {
                command: CartCommands::Remove { selection, .. },
            } => assert_eq!(selection, RemoveSelection::All),
            _ => panic!("expected cart remove"),
        }
    }

    #[test]
    fn test_cart_remove_rejects_bad_selection() {
        assert!(Cli::try_parse_from(["ezbuy", "cart", "remove", "c1", "first"]).is_err());
    }

    #[test]
    fn test_match_item_flag() {
        let cli = Cli::try_parse_from(["ezbuy", "match", "--item", "球拍"]).unwrap();
        assert!(matches!(cli.command, Commands::Match { item: Some(ref i) } if i == "球拍"));
    }
}
