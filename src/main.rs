//! srrdb-verify binary entry point
//!
//! Runs as a SABnzbd post-processing script (release taken from the
//! `SAB_*` environment) or standalone on a directory given as argument.

use clap::Parser;
use srrdb_verify::error::EXIT_INTERNAL;
use srrdb_verify::{Config, Error, JobContext, Pipeline, PipelineReport, Result, RunReport};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Verify a completed scene release against its SRR record
#[derive(Parser, Debug)]
#[command(name = "srrdb-verify", version, about)]
struct Cli {
    /// Release directory (ignored when SAB_COMPLETE_DIR is set)
    directory: Option<PathBuf>,

    /// TOML configuration file
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Keep the SRR record after a passing verification
    #[arg(long, conflicts_with = "remove_record")]
    keep_record: bool,

    /// Delete the SRR record after a passing verification
    #[arg(long)]
    remove_record: bool,

    /// Do not delete sample media
    #[arg(long)]
    keep_samples: bool,

    /// Keep SRS sample descriptors in the release directory
    #[arg(long)]
    keep_descriptors: bool,

    /// Do not write the host's original NZB into the release directory
    #[arg(long)]
    no_archive_nzb: bool,

    /// Move verified music albums under an artist directory
    #[arg(long)]
    relocate_albums: bool,

    /// srrDB base URL
    #[arg(long, value_name = "URL")]
    catalog_url: Option<String>,

    /// HTTP timeout in seconds
    #[arg(long, value_name = "SECS")]
    timeout: Option<u64>,

    /// Print a JSON report line on stdout
    #[arg(long)]
    json: bool,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    /// Load the configuration file (if any) and apply command-line overrides
    fn load_config(&self) -> Result<Config> {
        let mut config = match &self.config {
            Some(path) => Config::from_file(path)?,
            None => Config::default(),
        };

        if self.keep_record {
            config.cleanup.remove_valid_record = false;
        }
        if self.remove_record {
            config.cleanup.remove_valid_record = true;
        }
        if self.keep_samples {
            config.cleanup.remove_samples = false;
        }
        if self.keep_descriptors {
            config.cleanup.remove_sample_descriptors = false;
        }
        if self.no_archive_nzb {
            config.finalize.archive_job_descriptor = false;
        }
        if self.relocate_albums {
            config.finalize.relocate_albums = true;
        }
        if let Some(url) = &self.catalog_url {
            config.catalog.base_url = url.clone();
        }
        if let Some(secs) = self.timeout {
            config.catalog.timeout = Duration::from_secs(secs);
        }

        config.validate()?;
        Ok(config)
    }

    /// Host environment first, positional directory otherwise
    fn job(&self) -> Option<JobContext> {
        if let Some(job) = JobContext::from_env() {
            if self.directory.is_some() {
                warn!("SAB_COMPLETE_DIR is set, ignoring directory argument");
            }
            return Some(job);
        }
        self.directory.as_ref().map(JobContext::standalone)
    }
}

fn init_tracing(verbose: bool) {
    let default_filter = if verbose {
        "srrdb_verify=debug"
    } else {
        "srrdb_verify=info"
    };

    // stdout is reserved for the JSON report
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

async fn execute(cli: &Cli, job: &JobContext) -> Result<PipelineReport> {
    let config = cli.load_config()?;
    let pipeline = Pipeline::with_defaults(config)?;
    pipeline.run(job).await
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let Some(job) = cli.job() else {
        error!("no release directory: pass one as argument or set SAB_COMPLETE_DIR");
        std::process::exit(EXIT_INTERNAL);
    };

    let report = match execute(&cli, &job).await {
        Ok(report) => {
            let report = RunReport::from(&report);
            info!("{}", report.message);
            report
        }
        Err(e) => {
            error!("{e}");
            RunReport::from_error(&job.release.basename, &e)
        }
    };

    if cli.json {
        match serde_json::to_string(&report) {
            Ok(line) => println!("{line}"),
            Err(e) => error!("{}", Error::from(e)),
        }
    }

    std::process::exit(report.exit_code);
}
