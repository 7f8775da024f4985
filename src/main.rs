use std::{path::PathBuf, sync::Arc};

use anyhow::Context;
use clap::Parser;

use crate::{
    core::{
        cache::TtlCache, db::CheckinDb, hub::BroadcastHub, service::CheckinService,
        settings::Settings,
    },
    integrations::{
        airtable::AirtableGateway,
        startgg::{CachedTournamentLookup, StartGgClient},
    },
};

mod core;
mod error;
mod integrations;
mod util;
mod web;

#[derive(Parser, Debug)]
#[command(name = "checkin-coordinator")]
#[command(version)]
#[command(about = "Live check-in coordination for tournament events.", long_about = None)]
struct Args {
    /// Optional JSON settings file. Command line and environment values override it.
    #[arg(short, long)]
    settings: Option<PathBuf>,

    /// Port for the HTTP API.
    #[arg(short, long, env = "PORT")]
    port: Option<u16>,

    #[arg(long, env = "AIRTABLE_API_KEY", hide_env_values = true)]
    airtable_api_key: Option<String>,

    #[arg(long, env = "AIRTABLE_BASE_ID")]
    airtable_base_id: Option<String>,

    #[arg(long, env = "STARTGG_API_KEY", hide_env_values = true)]
    startgg_api_key: Option<String>,
}

impl Args {
    fn into_settings(self) -> anyhow::Result<Settings> {
        let mut settings = match &self.settings {
            Some(path) => Settings::load(path)?,
            None => Settings::default(),
        };

        if self.port.is_some() {
            settings.web_port = self.port;
        }
        if self.airtable_api_key.is_some() {
            settings.airtable_api_key = self.airtable_api_key;
        }
        if self.airtable_base_id.is_some() {
            settings.airtable_base_id = self.airtable_base_id;
        }
        if self.startgg_api_key.is_some() {
            settings.startgg_api_key = self.startgg_api_key;
        }

        Ok(settings)
    }
}

fn build_service(settings: &Settings) -> anyhow::Result<CheckinService> {
    let (base_id, api_key) = settings.airtable_credentials()?;
    let gateway = AirtableGateway::new(
        settings.airtable_url(),
        base_id,
        api_key,
        settings.request_timeout(),
        settings.request_retries(),
    )
    .context("Failed to build record store client")?;

    if settings.startgg_api_key.is_none() {
        log::warn!("No start.gg API key configured, tournament lookups will fail");
    }
    let startgg = StartGgClient::new(
        settings.startgg_url(),
        settings.startgg_api_key.clone(),
        settings.request_timeout(),
    )
    .context("Failed to build start.gg client")?;

    Ok(CheckinService::new(
        CheckinDb::new(Arc::new(gateway)),
        BroadcastHub::new(settings.subscriber_queue_capacity()),
        CachedTournamentLookup::new(Arc::new(startgg), TtlCache::new(settings.event_cache_ttl())),
        settings.keepalive(),
    ))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let settings = Args::parse().into_settings()?;
    let service = Arc::new(build_service(&settings)?);

    match service.db.active_settings().await {
        Ok(active) => log::info!(
            "Active event: {}",
            active.event_slug().unwrap_or("(no slug set)")
        ),
        Err(e) => log::warn!("Starting without usable event settings: {}", e),
    }

    web::run_http_server(service, settings.web_port()).await
}
