use std::collections::BTreeMap;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use footprint_guard::api::{ApiConfig, HttpScanApi, DEFAULT_API_URL};
use footprint_guard::controller::{ScanController, ScanOutcome};
use footprint_guard::render;
use footprint_guard::server;
use footprint_guard::timeline::Timeline;
use footprint_guard::types::{ScanRequest, ScanResult, ScanSnapshot, Source, SourceStatus};

/// footprint-guard — digital footprint risk scan with a staged agent timeline and a tiny embedded web UI.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "footprint-guard",
    version,
    about = "Digital footprint risk scan with a staged agent timeline and a tiny embedded web UI.",
    long_about = None
)]
struct Cli {
    /// GitHub username to analyze.
    #[arg(long)]
    github: Option<String>,

    /// Email address to check for breaches.
    #[arg(long)]
    email: Option<String>,

    /// Social media handles (comma-separated).
    #[arg(long)]
    social: Option<String>,

    /// Full name for additional context. Accepted on its own, but the scan API may
    /// reject a request that carries nothing else.
    #[arg(long)]
    name: Option<String>,

    /// Base URL of the scan API.
    #[arg(long = "api-url", env = "FOOTPRINT_API_URL", default_value = DEFAULT_API_URL)]
    api_url: String,

    /// Scan API request timeout in seconds.
    #[arg(long = "timeout-secs", default_value_t = 120)]
    timeout_secs: u64,

    /// Timeline pace factor (1.0 = real time, 0 = instant).
    #[arg(long, default_value_t = 1.0)]
    pace: f64,

    /// Write the risk report as pretty JSON to this path (optional).
    #[arg(long)]
    output: Option<PathBuf>,

    /// Probe the scan API health endpoint before scanning.
    #[arg(long, default_value_t = false)]
    check: bool,

    /// Start the embedded HTTP UI server instead of running a terminal scan.
    #[arg(long = "serve-ui", default_value_t = false)]
    serve_ui: bool,

    /// Address for the embedded UI server.
    #[arg(long, default_value = "127.0.0.1:8080")]
    bind: String,
}

impl Cli {
    fn request(&self) -> ScanRequest {
        ScanRequest {
            github_username: self.github.clone(),
            email: self.email.clone(),
            social_handles: self.social.clone(),
            full_name: self.name.clone(),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    println!("footprint-guard configuration:");
    println!("  api_url      : {}", cli.api_url);
    println!("  timeout_secs : {}", cli.timeout_secs);
    println!("  pace         : {}", cli.pace);
    println!(
        "  output       : {}",
        cli.output
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "<none>".to_string())
    );
    println!("  serve_ui     : {}", cli.serve_ui);

    let api = HttpScanApi::new(&ApiConfig {
        base_url: cli.api_url.clone(),
        timeout: Duration::from_secs(cli.timeout_secs),
    })?;

    if cli.check {
        let status = api
            .health()
            .await
            .with_context(|| format!("scan API at {} is not reachable", cli.api_url))?;
        println!("Scan API status: {status}");
    }

    let timeline = Timeline::standard().with_pace(cli.pace);
    let controller = ScanController::with_timeline(Arc::new(api), timeline);

    if cli.serve_ui {
        let bind = cli.bind.clone();
        let ui_controller = controller.clone();
        tokio::spawn(async move {
            if let Err(e) = server::spawn_server(&bind, ui_controller).await {
                tracing::error!("HTTP UI server error: {e}");
            }
        });
        println!("UI server starting at http://{} (Ctrl+C to stop)", cli.bind);
        let _ = tokio::signal::ctrl_c().await;
        return Ok(());
    }

    let request = cli.request();
    let Some(task) = controller.submit(request).await else {
        bail!("nothing to scan: pass at least one of --github, --email, --social or --name");
    };

    println!(
        "\nScanning in progress (at least {:.1}s)...\n",
        timeline.total_duration().as_secs_f64()
    );
    let outcome = follow_scan(&controller, task).await?;

    let snapshot = controller.snapshot().await;
    match outcome {
        ScanOutcome::Completed => {
            let result = snapshot
                .result
                .as_ref()
                .context("scan completed without a report")?;
            println!("\n{}", render::report_view(result));
            if let Some(path) = cli.output.as_deref() {
                write_report_json(path, result)?;
                println!("Wrote JSON report to {}", path.display());
            }
            Ok(())
        }
        ScanOutcome::Failed(message) => bail!("scan failed: {message}"),
        ScanOutcome::Superseded => bail!("scan was reset before it finished"),
    }
}

/// Print log lines and badge changes as they appear until the scan task ends.
async fn follow_scan(
    controller: &ScanController,
    mut task: tokio::task::JoinHandle<ScanOutcome>,
) -> Result<ScanOutcome> {
    let mut printed = 0usize;
    let mut badges: BTreeMap<Source, SourceStatus> = BTreeMap::new();
    let mut stage = usize::MAX;
    let mut tick = tokio::time::interval(Duration::from_millis(100));

    loop {
        tokio::select! {
            joined = &mut task => {
                let outcome = joined.context("scan task panicked")?;
                print_progress(&controller.snapshot().await, &mut printed, &mut badges, &mut stage);
                return Ok(outcome);
            }
            _ = tick.tick() => {
                print_progress(&controller.snapshot().await, &mut printed, &mut badges, &mut stage);
            }
        }
    }
}

fn print_progress(
    snapshot: &ScanSnapshot,
    printed: &mut usize,
    badges: &mut BTreeMap<Source, SourceStatus>,
    stage: &mut usize,
) {
    if snapshot.current_stage != *stage {
        *stage = snapshot.current_stage;
        let track = render::stage_track(*stage);
        println!("{}", render::StageTrack(&track));
    }
    for entry in snapshot.logs.iter().skip(*printed) {
        println!("  {}", render::log_line(entry));
    }
    *printed = snapshot.logs.len();
    for source in Source::ALL {
        let status = snapshot.status_of(source);
        if badges.insert(source, status) != Some(status) && status != SourceStatus::Pending {
            println!("  {}", render::source_badge(source, status));
        }
    }
}

fn write_report_json(path: &Path, result: &ScanResult) -> Result<()> {
    let file = File::create(path)
        .with_context(|| format!("failed to create report file: {}", path.display()))?;
    serde_json::to_writer_pretty(file, result)?;
    Ok(())
}
