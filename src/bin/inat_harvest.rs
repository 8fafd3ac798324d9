use std::process::ExitCode;

use chrono::Utc;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use inat_harvest::config::{ConfigLoader, ConfigOverrides, FilterConfig};
use inat_harvest::credentials::{Anonymous, CredentialProvider, EnvFileCredentials, StaticToken};
use inat_harvest::domain::{IconicTaxon, ImageQuality, QualityGrade};
use inat_harvest::error::HarvestError;
use inat_harvest::fetcher::{ResilientFetcher, RetryPolicy};
use inat_harvest::harvest::{Harvester, ProgressSink};
use inat_harvest::http::HttpTransport;
use inat_harvest::output::{
    ConsoleProgress, HarvestDocument, JsonOutput, OutputMode, print_summary,
};

#[derive(Parser)]
#[command(name = "inat-harvest")]
#[command(about = "Download iNaturalist observations and photos around a location")]
#[command(version, author)]
struct Cli {
    #[arg(long, help = "JSON config file (default: inat-harvest.json if present)")]
    config: Option<String>,

    #[arg(long, allow_negative_numbers = true, help = "Center latitude")]
    lat: Option<f64>,

    #[arg(long, allow_negative_numbers = true, help = "Center longitude")]
    lon: Option<f64>,

    #[arg(long, help = "Search radius in miles")]
    radius: Option<f64>,

    #[arg(long, help = "Observations per page (1-200)")]
    per_page: Option<u32>,

    #[arg(long, help = "Metadata JSON output path")]
    output: Option<String>,

    #[arg(long, help = "Directory for downloaded photos")]
    images_dir: Option<String>,

    #[arg(long, help = "Write metadata only")]
    skip_images: bool,

    #[arg(long, help = "Stop after this many observations (0 for no limit)")]
    max_observations: Option<usize>,

    #[arg(long, value_enum)]
    image_quality: Option<ImageQuality>,

    #[arg(long, value_enum)]
    quality_grade: Option<QualityGrade>,

    #[arg(long, value_enum)]
    iconic_taxon: Option<IconicTaxon>,

    #[arg(long, help = "Observed on or after (YYYY-MM-DD)")]
    observed_since: Option<String>,

    #[arg(long, help = "Observed on or before (YYYY-MM-DD)")]
    observed_before: Option<String>,

    #[arg(long)]
    captive_only: bool,

    #[arg(long)]
    wild_only: bool,

    #[arg(long)]
    introduced_only: bool,

    #[arg(long)]
    native_only: bool,

    #[arg(long)]
    threatened_only: bool,

    #[arg(long)]
    endemic_only: bool,

    #[arg(long, help = "OAuth bearer token (default: INATURALIST_ACCESS_TOKEN from .env)")]
    access_token: Option<String>,

    #[arg(long, conflicts_with = "access_token", help = "Ignore any configured token")]
    no_auth: bool,

    #[arg(long, help = "Print run metadata as JSON instead of the summary")]
    non_interactive: bool,
}

impl Cli {
    fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            latitude: self.lat,
            longitude: self.lon,
            radius_miles: self.radius,
            per_page: self.per_page,
            image_quality: self.image_quality,
            output: self.output.clone(),
            images_dir: self.images_dir.clone(),
            skip_images: self.skip_images,
            max_observations: self.max_observations,
            filters: FilterConfig {
                quality_grade: self.quality_grade,
                iconic_taxon: self.iconic_taxon,
                observed_since: self.observed_since.clone(),
                observed_before: self.observed_before.clone(),
                captive_only: self.captive_only,
                wild_only: self.wild_only,
                introduced_only: self.introduced_only,
                native_only: self.native_only,
                threatened_only: self.threatened_only,
                endemic_only: self.endemic_only,
            },
        }
    }

    fn credentials(&self) -> Box<dyn CredentialProvider> {
        if self.no_auth {
            Box::new(Anonymous)
        } else if let Some(token) = &self.access_token {
            Box::new(StaticToken::new(token.clone()))
        } else {
            Box::new(EnvFileCredentials::new())
        }
    }
}

fn main() -> ExitCode {
    if let Err(report) = run() {
        eprintln!("{report:?}");
        if let Some(err) = report.downcast_ref::<HarvestError>() {
            return ExitCode::from(map_exit_code(err));
        }
        return ExitCode::from(1);
    }
    ExitCode::SUCCESS
}

fn map_exit_code(error: &HarvestError) -> u8 {
    match error {
        HarvestError::InvalidCoordinate(_)
        | HarvestError::InvalidRadius(_)
        | HarvestError::InvalidPageSize(_)
        | HarvestError::InvalidDate(_)
        | HarvestError::ConflictingFilters(_)
        | HarvestError::MissingConfig(_)
        | HarvestError::ConfigRead(_)
        | HarvestError::ConfigParse(_) => 2,
        HarvestError::ApiHttp(_)
        | HarvestError::ApiStatus { .. }
        | HarvestError::ApiPayload(_) => 3,
        HarvestError::Filesystem(_) | HarvestError::Output(_) => 1,
    }
}

fn run() -> miette::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let output_mode = if cli.non_interactive {
        OutputMode::NonInteractive
    } else {
        OutputMode::Interactive
    };

    let credentials = cli.credentials();
    let resolved =
        ConfigLoader::resolve(cli.config.as_deref(), cli.overrides(), credentials.as_ref())?;

    let transport = HttpTransport::new(resolved.fetch.credential.as_deref())?;
    let harvester = Harvester::new(ResilientFetcher::new(transport, RetryPolicy::default()));

    let sink: &dyn ProgressSink = match output_mode {
        OutputMode::Interactive => &ConsoleProgress,
        OutputMode::NonInteractive => &JsonOutput,
    };
    let report = harvester.run(&resolved.fetch, &resolved.run, sink)?;

    let document = HarvestDocument::new(&report, &resolved.fetch, &resolved.run, Utc::now());
    document.write(&resolved.run.output)?;
    info!(
        "saved metadata for {} observations to {}",
        report.observations.len(),
        resolved.run.output
    );

    match output_mode {
        OutputMode::Interactive => print_summary(&document, &report, &resolved.run.output),
        OutputMode::NonInteractive => JsonOutput::print_document(&document)
            .map_err(|err| HarvestError::Output(err.to_string()))?,
    }
    Ok(())
}
