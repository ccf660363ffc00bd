use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, ValueEnum};
use log::{error, info, LevelFilter};
use simplelog::{ColorChoice, Config, TermLogger, TerminalMode};

use ned_gateway::{
    ensure_output_dir, resolve_and_download, resolve_session, select_downloads, BoundingBox,
    DatasetFormat, DownloadPool, DownloadSettings, FetchSettings, Fetcher, GatewayError,
    GatewaySettings, HttpRenderer, ReqwestFetcher, ResolveSettings, TaskOutcome,
};

/// Bulk-download pre-packaged elevation archives from the seamless gateway.
///
/// With no positional arguments, queries a preset Colorado bounding box into
/// `colorado_neds/`. Otherwise all five positionals must be given.
#[derive(Debug, Parser)]
#[command(name = "neddl", version)]
struct Cli {
    /// Minimum longitude of the query bounding box.
    #[arg(value_name = "XMIN", requires = "ymin", allow_negative_numbers = true)]
    xmin: Option<f64>,
    /// Minimum latitude.
    #[arg(value_name = "YMIN", requires = "xmax", allow_negative_numbers = true)]
    ymin: Option<f64>,
    /// Maximum longitude.
    #[arg(value_name = "XMAX", requires = "ymax", allow_negative_numbers = true)]
    xmax: Option<f64>,
    /// Maximum latitude.
    #[arg(value_name = "YMAX", requires = "out_dir", allow_negative_numbers = true)]
    ymax: Option<f64>,
    /// Directory the archives are written into.
    #[arg(value_name = "OUT_DIR")]
    out_dir: Option<PathBuf>,

    /// Which of the four gateway dataset variants to download.
    #[arg(long, value_enum, default_value_t = FormatArg::ArcgridThird)]
    format: FormatArg,
    /// Concurrent archive downloads.
    #[arg(long, default_value_t = 6)]
    concurrency: usize,
    /// Log at debug level.
    #[arg(long, short)]
    verbose: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum FormatArg {
    /// 1 arc-second, ArcGrid.
    ArcgridOne,
    /// 1/3 arc-second, ArcGrid.
    ArcgridThird,
    /// 1 arc-second, Float.
    FloatOne,
    /// 1/3 arc-second, Float.
    FloatThird,
}

impl From<FormatArg> for DatasetFormat {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::ArcgridOne => DatasetFormat::ArcGridOneArcSecond,
            FormatArg::ArcgridThird => DatasetFormat::ArcGridThirdArcSecond,
            FormatArg::FloatOne => DatasetFormat::FloatOneArcSecond,
            FormatArg::FloatThird => DatasetFormat::FloatThirdArcSecond,
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(GatewayError::NoResults) => {
            error!("{}", GatewayError::NoResults);
            ExitCode::from(2)
        }
        Err(err) => {
            error!("{err}");
            ExitCode::FAILURE
        }
    }
}

fn init_logging(verbose: bool) {
    let level = if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    // Ignore the error if a logger was already set.
    let _ = TermLogger::init(
        level,
        Config::default(),
        TerminalMode::Mixed,
        ColorChoice::Auto,
    );
}

async fn run(cli: Cli) -> Result<(), GatewayError> {
    let (bbox, out_dir) = match (cli.xmin, cli.ymin, cli.xmax, cli.ymax, cli.out_dir) {
        (Some(xmin), Some(ymin), Some(xmax), Some(ymax), Some(out_dir)) => (
            BoundingBox {
                xmin,
                ymin,
                xmax,
                ymax,
            },
            out_dir,
        ),
        // The `requires` chain guarantees all-or-nothing positionals, so
        // anything else is the zero-argument preset.
        _ => (
            BoundingBox {
                xmin: -109.2,
                ymin: 35.8,
                xmax: -101.9,
                ymax: 42.1,
            },
            PathBuf::from("colorado_neds"),
        ),
    };

    ensure_output_dir(&out_dir)?;

    let settings = GatewaySettings::default();
    let fetcher = Arc::new(ReqwestFetcher::new(FetchSettings::default())?);
    let session = resolve_session(fetcher.as_ref(), &settings, bbox).await?;
    info!(
        "{} candidate(s) listed, session token {:?}",
        session.candidates.len(),
        session.token
    );

    let wanted: DatasetFormat = cli.format.into();
    let pending = select_downloads(
        &session.candidates,
        wanted,
        &session.token,
        &settings.base_url,
        &out_dir,
    );
    if pending.is_empty() {
        info!("no candidate matched {:?}; nothing to do", wanted.row_label());
        return Ok(());
    }
    info!(
        "{} of {} candidate(s) match {:?}",
        pending.len(),
        session.candidates.len(),
        wanted.row_label()
    );

    let mut pool = DownloadPool::new(DownloadSettings {
        concurrency: cli.concurrency,
        ..DownloadSettings::default()
    })?;
    // The plain-HTTP surface emits exactly one completion per navigation, so
    // waiting for a second signal would hang forever.
    let mut renderer = HttpRenderer::new(fetcher.clone() as Arc<dyn Fetcher>);
    let resolved = resolve_and_download(
        &mut renderer,
        pending,
        &mut pool,
        ResolveSettings {
            max_idle_completions: Some(1),
        },
    )
    .await?;
    info!("{} handshake(s) produced a signed link", resolved.len());

    let reports = pool.finish().await;
    let downloaded = reports
        .iter()
        .filter(|r| r.outcome == TaskOutcome::Downloaded)
        .count();
    let skipped = reports
        .iter()
        .filter(|r| r.outcome == TaskOutcome::Skipped)
        .count();
    let failed = reports.len() - downloaded - skipped;
    info!("done: {downloaded} downloaded, {skipped} skipped, {failed} failed");
    Ok(())
}
