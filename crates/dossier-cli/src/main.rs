use anyhow::{Context, Result};
use clap::Parser;
use dossier_browser::LiveSession;
use dossier_core::{AppConfig, Credentials, ResearchRequest};
use dossier_pipeline::Orchestrator;
use dossier_report::ReportRenderer;
use dossier_search::GroqSearchClient;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Turn a natural-language research request into a text report.
#[derive(Debug, Parser)]
#[command(name = "dossier", version, about)]
struct Args {
    /// Research request, e.g. "find software engineers in San Francisco"
    query: String,

    /// Upper bound on search links and profiles processed
    #[arg(long, default_value_t = 10)]
    max_results: usize,

    /// Overall run deadline in seconds (0 = unlimited)
    #[arg(long, default_value_t = 0)]
    timeout_secs: u64,

    /// Write the report to this file instead of stdout
    #[arg(long)]
    output: Option<PathBuf>,

    /// Also write the raw pipeline result as JSON
    #[arg(long)]
    raw_json: Option<PathBuf>,

    /// Show the browser window while scraping
    #[arg(long)]
    headed: bool,

    /// Emit debug diagnostics
    #[arg(short, long)]
    verbose: bool,
}

fn init_tracing(verbose: bool) -> Result<()> {
    let level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "warn,dossier={level},dossier_core={level},dossier_search={level},\
             dossier_browser={level},dossier_pipeline={level},dossier_report={level}"
        ))
    });
    tracing_subscriber::fmt().with_env_filter(filter).init();
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let args = Args::parse();
    init_tracing(args.verbose)?;

    let mut config = AppConfig::load_with_env().context("failed to load configuration")?;
    if args.headed {
        config.browser.headless = false;
    }

    let credentials = Credentials::from_env();
    tracing::debug!(?credentials, "credentials loaded");
    if !credentials.has_site_login() {
        tracing::warn!(
            "LINKEDIN_EMAIL/LINKEDIN_PASSWORD not set; profile extraction will run anonymously"
        );
    }

    let api_key = credentials
        .groq_api_key
        .clone()
        .context("GROQ_API_KEY is required (set it in the environment or a .env file)")?;
    let search = GroqSearchClient::new(api_key, config.search.clone())?;
    let session = Arc::new(LiveSession::new(config.clone(), credentials));

    let mut orchestrator = Orchestrator::new(search, session, &config);
    if args.timeout_secs > 0 {
        orchestrator = orchestrator.with_deadline(Duration::from_secs(args.timeout_secs));
    }

    let request = ResearchRequest::new(args.query.as_str())
        .with_max_results(args.max_results)
        .with_verbose(args.verbose);

    let result = orchestrator.run(&request).await?;

    if let Some(path) = &args.raw_json {
        let json = serde_json::to_string_pretty(&result)?;
        std::fs::write(path, json)
            .with_context(|| format!("failed to write {}", path.display()))?;
        info!("raw pipeline result written to {}", path.display());
    }

    let report = ReportRenderer::new(config.report.clone()).render(&args.query, &result);
    match &args.output {
        Some(path) => {
            std::fs::write(path, &report)
                .with_context(|| format!("failed to write {}", path.display()))?;
            info!("report written to {}", path.display());
        }
        None => println!("{report}"),
    }

    Ok(())
}
