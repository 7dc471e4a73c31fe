use std::{path::PathBuf, process::ExitCode, sync::Arc};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use client_core::{Connectivity, Credentials, MedicineClient, RouteProbeConnectivity};
use futures::StreamExt;
use shared::domain::MedicineId;
use storage::Storage;
use tracing::info;
use tracing_subscriber::EnvFilter;

mod config;
mod render;

use config::{load_settings, normalize_database_url, Settings};

#[derive(Parser, Debug)]
#[command(name = "medicine_cli", about = "Fetch, cache and browse the medicine list")]
struct Cli {
    /// TOML settings file. Defaults to ./medicine.toml when present.
    #[arg(long)]
    config: Option<PathBuf>,
    #[arg(long)]
    database_url: Option<String>,
    #[arg(long)]
    endpoint_url: Option<String>,
    /// Treat the host as offline without probing.
    #[arg(long)]
    offline: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Sign in, fetch the remote list and cache it locally.
    SignIn {
        #[arg(long, default_value = "")]
        username: String,
        #[arg(long, default_value = "")]
        password: String,
    },
    /// Show every cached medicine.
    List,
    /// Show one cached medicine.
    Show { id: String },
    /// Report network reachability and local cache health.
    Check,
}

fn init_tracing(settings: &Settings) {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(settings.log_filter.clone()));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn apply_cli_overrides(settings: &mut Settings, cli: &Cli) {
    if let Some(v) = &cli.database_url {
        settings.database_url = normalize_database_url(v);
    }
    if let Some(v) = &cli.endpoint_url {
        settings.endpoint_url = v.clone();
    }
    if cli.offline {
        settings.assume_online = Some(false);
    }
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    let mut settings = load_settings(cli.config.as_deref())?;
    apply_cli_overrides(&mut settings, &cli);
    init_tracing(&settings);

    info!(
        database_url = %settings.database_url,
        endpoint_url = %settings.endpoint_url,
        "starting medicine client"
    );

    let storage = Storage::new(&settings.database_url)
        .await
        .with_context(|| format!("failed to open local store '{}'", settings.database_url))?;

    let client =
        MedicineClient::from_options(&settings.client_options()?, Arc::new(storage.clone()))?;

    match cli.command {
        Command::SignIn { username, password } => {
            sign_in(&client, Credentials::new(username, password)).await
        }
        Command::List => {
            let medicines = client.catalog.refresh().await?;
            println!("{}", render::medicine_list(&medicines));
            Ok(ExitCode::SUCCESS)
        }
        Command::Show { id } => {
            let id = MedicineId::new(id).context("medicine id is required")?;
            match client.catalog.medicine_details(&id).await? {
                Some(medicine) => {
                    println!("{}", render::medicine_detail(&medicine));
                    Ok(ExitCode::SUCCESS)
                }
                None => {
                    println!("Medicine {id} is not cached");
                    Ok(ExitCode::FAILURE)
                }
            }
        }
        Command::Check => {
            let online = match settings.assume_online {
                Some(online) => online,
                None => RouteProbeConnectivity::new().is_available(),
            };
            storage.health_check().await?;
            println!(
                "network: {}",
                if online { "available" } else { "unavailable" }
            );
            println!("storage: ok ({} cached)", storage.count_medicines().await?);
            Ok(ExitCode::SUCCESS)
        }
    }
}

async fn sign_in(client: &MedicineClient, credentials: Credentials) -> Result<ExitCode> {
    let mut updates = client.session.updates();
    let progress = tokio::spawn(async move {
        while let Some(state) = updates.next().await {
            if !state.is_request_complete {
                eprintln!("Signing in...");
            }
        }
    });

    let result = client.sign_in(&credentials).await;
    progress.abort();
    let outcome = result?;

    if let Some(message) = outcome.message() {
        println!("{message}");
        return Ok(ExitCode::FAILURE);
    }

    println!("{}", render::medicine_list(&client.catalog.medicines()));
    Ok(ExitCode::SUCCESS)
}
