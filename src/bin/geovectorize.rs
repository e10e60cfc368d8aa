use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use geovectorize::config::VectorizeConfig;
use geovectorize::fetch::{HttpFetcher, SchemeFetcher};
use geovectorize::notify::{notify_best_effort, LogNotifier, Notifier, WebhookNotifier};
use geovectorize::sweep::{sweep, ParameterGrid};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    name = "geovectorize",
    version,
    about = "Vectorize pairs of WKT geometries into an .npz training archive"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Post a completion notice to this chat webhook instead of the log
    #[arg(long, global = true, env = "GEOVECTORIZE_WEBHOOK")]
    webhook: Option<String>,

    /// Seconds to wait for a dataset download
    #[arg(long, global = true, default_value_t = 600)]
    download_timeout: u64,
}

const WEBHOOK_TIMEOUT: Duration = Duration::from_secs(10);

impl Cli {
    fn fetcher(&self) -> Result<SchemeFetcher> {
        let http = HttpFetcher::new(Duration::from_secs(self.download_timeout))
            .context("building HTTP client")?;
        Ok(SchemeFetcher::new(http))
    }

    fn notifier(&self) -> Result<Box<dyn Notifier>> {
        let notifier: Box<dyn Notifier> = match &self.webhook {
            Some(url) => Box::new(
                WebhookNotifier::new(url.as_str(), WEBHOOK_TIMEOUT)
                    .context("building webhook client")?,
            ),
            None => Box::new(LogNotifier),
        };
        Ok(notifier)
    }
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Vectorize one dataset
    Vectorize(ConfigArgs),

    /// Vectorize once per point of a parameter grid
    Sweep {
        /// JSON object mapping configuration keys to lists of values
        #[arg(long)]
        grid: PathBuf,

        #[command(flatten)]
        config: ConfigArgs,
    },
}

#[derive(Args, Debug)]
struct ConfigArgs {
    /// JSON configuration file, command line options override its values
    #[arg(long, env = "GEOVECTORIZE_CONFIG")]
    config: Option<PathBuf>,

    /// Input CSV with one geometry pair per row
    #[arg(long)]
    input: Option<PathBuf>,

    /// Output .npz archive
    #[arg(long)]
    output: Option<PathBuf>,

    /// Where to fetch the input from when it is missing locally
    #[arg(long)]
    source_url: Option<String>,

    /// Drop rows whose joined WKT text is longer than this
    #[arg(long, conflicts_with = "no_truncate")]
    max_wkt_len: Option<usize>,

    /// Keep every row regardless of its WKT length
    #[arg(long, default_value_t = false)]
    no_truncate: bool,
}

impl ConfigArgs {
    fn load(&self) -> Result<VectorizeConfig> {
        let mut config = match &self.config {
            Some(path) => VectorizeConfig::from_path(path)
                .with_context(|| format!("loading configuration {}", path.display()))?,
            None => VectorizeConfig::default(),
        };
        if let Some(input) = &self.input {
            config.input = input.clone();
        }
        if let Some(output) = &self.output {
            config.output = output.clone();
        }
        if let Some(source_url) = &self.source_url {
            config.source_url = Some(source_url.clone());
        }
        if let Some(max_wkt_len) = self.max_wkt_len {
            config.max_wkt_len = Some(max_wkt_len);
        }
        if self.no_truncate {
            config.max_wkt_len = None;
        }
        config.validate().context("invalid configuration")?;
        Ok(config)
    }
}

/// `files/out.npz` becomes `files/out_3.npz` for grid point 3.
fn indexed_output(output: &Path, index: usize) -> PathBuf {
    let stem = output
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default();
    let name = match output.extension() {
        Some(ext) => format!("{stem}_{index}.{}", ext.to_string_lossy()),
        None => format!("{stem}_{index}"),
    };
    output.with_file_name(name)
}

fn vectorize(cli: &Cli, args: &ConfigArgs) -> Result<()> {
    let config = args.load()?;
    let summary = geovectorize::run(&config, &cli.fetcher()?)
        .with_context(|| format!("vectorizing {}", config.input.display()))?;
    println!("{summary}");
    notify_best_effort(cli.notifier()?.as_ref(), "geovectorize", &summary.to_string());
    Ok(())
}

fn run_sweep(cli: &Cli, grid: &Path, args: &ConfigArgs) -> Result<()> {
    let base = args.load()?;
    let grid = ParameterGrid::from_path(grid)
        .with_context(|| format!("loading parameter grid {}", grid.display()))?;
    let fetcher = cli.fetcher()?;
    let runs = sweep(&base, &grid, |index, mut config| {
        config.output = indexed_output(&config.output, index);
        geovectorize::run(&config, &fetcher)
    });

    let mut failed = 0;
    for (index, sweep_run) in runs.iter().enumerate() {
        match &sweep_run.result {
            Ok(summary) => println!("[{index}] {summary}"),
            Err(err) => {
                failed += 1;
                println!("[{index}] failed: {err}");
            }
        }
    }
    let message = format!("Sweep finished: {} runs, {failed} failed", runs.len());
    println!("{message}");
    notify_best_effort(cli.notifier()?.as_ref(), "geovectorize sweep", &message);
    if failed > 0 {
        anyhow::bail!("{failed} of {} sweep runs failed", runs.len());
    }
    Ok(())
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("geovectorize=info")),
        )
        .init();

    let cli = Cli::parse();
    match &cli.command {
        Command::Vectorize(args) => vectorize(&cli, args),
        Command::Sweep { grid, config } => run_sweep(&cli, grid, config),
    }
}
