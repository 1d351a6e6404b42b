use anyhow::{Context, bail};
use clap::Parser;
use dotenvy::dotenv;
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use marquee_cli::{Command, Config};
use marquee_client::TmdbClient;
use marquee_core::{
    AppError, Credential, CycleSummary, EnvTokenSource, HarvestService, HarvestStatus,
    ScheduleSummary, StaticToken, TokenSource, TracingReporter, load_file_config,
};
use marquee_store::JsonFileStore;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set the tracing subscriber")?;

    let config = Config::parse();

    let file_config = load_file_config(config.config.clone()).map_err(friendly)?;
    let settings = config.resolve(file_config.as_ref());
    if settings.harvest.discovery.pages_per_run == 0 {
        bail!("pages_per_run must be at least 1");
    }

    let store = JsonFileStore::new(settings.data_dir.clone());
    let client = TmdbClient::new(&settings.api_url, &settings.http).map_err(friendly)?;
    info!(
        data_dir = %settings.data_dir.display(),
        api_url = %settings.api_url,
        "Using data directory {}",
        settings.data_dir.display()
    );

    match &config.command {
        Command::Run { .. } | Command::Cycle => match &config.api_token {
            Some(token) => {
                let tokens = StaticToken::new(Credential::new(token.clone()).map_err(friendly)?);
                let service =
                    HarvestService::with_config(store, client, tokens, settings.harvest.clone());
                harvest(&service, &config.command).await;
            }
            None => {
                let tokens = EnvTokenSource::default();
                if let Err(e) = tokens.credential() {
                    warn!("{}", e.user_message());
                    warn!("Cycles will fail until the token is set");
                }
                let service =
                    HarvestService::with_config(store, client, tokens, settings.harvest.clone());
                harvest(&service, &config.command).await;
            }
        },
        Command::Status => {
            let service = HarvestService::with_config(
                store,
                client,
                EnvTokenSource::default(),
                settings.harvest.clone(),
            );
            let status = service.status().await.map_err(friendly)?;
            print_status(&status);
        }
    }

    Ok(())
}

/// Runs `run` or `cycle` against the service.
///
/// The token is obtained at the start of every cycle, so a missing or
/// rejected credential fails that cycle only.
async fn harvest<T: TokenSource>(
    service: &HarvestService<JsonFileStore, TmdbClient, T>,
    command: &Command,
) {
    match command {
        Command::Cycle => match service.run_cycle_with_progress(1, 1, &TracingReporter).await {
            Ok(summary) => print_cycle_summary(&summary),
            Err(e) if e.is_page_limit() => info!("{}", e.user_message()),
            Err(e) => error!("Cycle failed: {}", e.user_message()),
        },
        _ => {
            let summary = service.run_schedule_with_progress(&TracingReporter).await;
            print_schedule_summary(&summary);
        }
    }
}

fn friendly(e: AppError) -> anyhow::Error {
    anyhow::anyhow!(e.user_message())
}

/// Print a summary of a scheduled run.
fn print_schedule_summary(summary: &ScheduleSummary) {
    info!("");
    info!("═══════════════════════════════════════════════════════");
    info!("HARVEST COMPLETE");
    info!("═══════════════════════════════════════════════════════");
    info!("  Cycles run:          {}", summary.total_cycles());
    info!("  Successful:          {}", summary.successful_count());
    info!("  Failed:              {}", summary.failed_count());
    info!("  Ids discovered:      {}", summary.total_discovered());
    info!("  Records appended:    {}", summary.total_appended());

    if summary.failed_count() > 0 {
        info!("───────────────────────────────────────────────────────");
        info!("Failed cycles:");
        for result in summary.results.iter().filter(|r| !r.is_success()) {
            if let Some(err) = &result.error {
                if result.page_limit {
                    warn!("  - cycle {}: {}", result.cycle, err);
                } else {
                    error!("  - cycle {}: {}", result.cycle, err);
                }
            }
        }
    }
    info!("═══════════════════════════════════════════════════════");
}

/// Print a summary for a single cycle.
fn print_cycle_summary(summary: &CycleSummary) {
    let elapsed = summary.finished_at - summary.started_at;

    info!("");
    info!("═══════════════════════════════════════════════════════");
    info!("Cycle complete in {}s", elapsed.num_seconds());
    info!("═══════════════════════════════════════════════════════");
    info!("  Pages requested:     {}", summary.discovery.pages_requested);
    info!("  Pages failed:        {}", summary.discovery.pages_failed);
    info!("  Ids discovered:      {}", summary.discovery.ids_discovered);
    info!("  Unique ids:          {}", summary.unique_ids);
    info!("───────────────────────────────────────────────────────");
    info!(
        "  Credits:             +{} fetched, {} failed, {} placeholders",
        summary.credits.fetched, summary.credits.failed, summary.credits.placeholders
    );
    info!(
        "  Movies:              +{} fetched, {} failed, {} placeholders",
        summary.movies.fetched, summary.movies.failed, summary.movies.placeholders
    );
    info!("═══════════════════════════════════════════════════════");
}

fn print_status(status: &HarvestStatus) {
    println!("\nHarvest Status\n");
    if !status.initialized {
        println!("  No checkpoint yet; the first cycle starts at page {}.", status.page);
    }
    println!(
        "  Next page:             {} of {} ({} per run)",
        status.page, status.max_pages, status.pages_per_run
    );
    println!("  Backlog ids:           {}", status.backlog_len);
    println!("  Unique ids:            {}", status.unique_ids);
    println!(
        "  Credits:               {}",
        format_progress(status.unique_ids - status.credits.pending, status.unique_ids)
    );
    println!(
        "  Movies:                {}",
        format_progress(status.unique_ids - status.movies.pending, status.unique_ids)
    );
    if status.is_exhausted() {
        println!("  Discovery has reached its page ceiling.");
    }
    println!();
}

/// Formats `done` out of `total` with a percentage.
fn format_progress(done: usize, total: usize) -> String {
    if total == 0 {
        return "0/0".to_string();
    }
    let percent = done as f64 * 100.0 / total as f64;
    format!("{}/{} ({:.0}%)", done, total, percent)
}
