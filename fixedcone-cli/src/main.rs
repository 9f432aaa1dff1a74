//! fixedcone-cli: Command-line interface for fixed-cone calorimeter clustering.
//!
//! Reads hits from JSON, clusters them event by event and writes the
//! clusters together with their derived properties as JSON.
#![allow(
    clippy::uninlined_format_args,
    clippy::cast_precision_loss,
    clippy::too_many_lines
)]

use clap::{Args, Parser, Subcommand, ValueEnum};
use fixedcone_algorithms::{
    cluster_event_stream, cluster_events, total_statistics, ClusteredEvent, FixedConeClusterer,
};
use fixedcone_core::{
    ClusterProperties, ClusteringStatistics, ConePolicy, DistanceMetric, FixedConeConfig, HitData,
};
use log::{debug, info, warn, LevelFilter};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fs::File;
use std::io::{self, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::Instant;
use thiserror::Error;

/// Radius and minimum energy used when switching from a predicted policy
/// to a fixed one without both values given.
const FALLBACK_RADIUS: f64 = 0.1;
const FALLBACK_MIN_ENERGY: f64 = 0.5;

/// Result type for CLI operations.
type Result<T> = std::result::Result<T, CliError>;

/// CLI error types.
#[derive(Error, Debug)]
enum CliError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] fixedcone_core::ConfigError),

    #[error("Core error: {0}")]
    Core(#[from] fixedcone_core::Error),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

/// Distance metric selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Metric {
    /// Opening angle from the dot product of unit vectors
    #[value(name = "dot-product")]
    DotProduct,
    /// dphi^2 + d(cos theta)^2
    #[value(name = "dphi-dcos-theta")]
    DPhiDCosTheta,
    /// dphi^2 + dtheta^2
    #[value(name = "dphi-dtheta")]
    DPhiDTheta,
}

impl From<Metric> for DistanceMetric {
    fn from(metric: Metric) -> Self {
        match metric {
            Metric::DotProduct => DistanceMetric::DotProduct,
            Metric::DPhiDCosTheta => DistanceMetric::DPhiDCosTheta,
            Metric::DPhiDTheta => DistanceMetric::DPhiDTheta,
        }
    }
}

/// Fixed-cone clustering of calorimeter hits.
#[derive(Parser)]
#[command(name = "fixedcone")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable debug logging (RUST_LOG overrides)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Cluster hits and write the clusters as JSON
    Cluster {
        /// Input JSON: an array of hits, or an array of events with a "hits" array
        input: PathBuf,

        /// Output file path (stdout if omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,

        #[command(flatten)]
        settings: ClusterSettings,

        /// Cluster events in parallel
        #[arg(long)]
        parallel: bool,
    },

    /// Show a summary of an input file
    Info {
        /// Input JSON file
        input: PathBuf,
    },
}

/// Clustering parameters. Flags override values read from `--config`.
#[derive(Args, Debug, Default, Clone)]
struct ClusterSettings {
    /// JSON configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Distance metric used while growing cones
    #[arg(long, value_enum)]
    metric: Option<Metric>,

    /// Fixed cone radius in radians
    #[arg(short, long)]
    radius: Option<f64>,

    /// Minimum energy (GeV) for a hit to seed a cluster
    #[arg(long)]
    seed_energy: Option<f64>,

    /// Minimum cluster energy (GeV) with a fixed cone
    #[arg(long)]
    min_energy: Option<f64>,

    /// Predict cone radius and energy cut from the seed energy
    #[arg(long)]
    predict: bool,

    /// Cone-size coefficients of R = A*ln(E) + B (implies --predict)
    #[arg(long, num_args = 2, value_names = ["A", "B"], allow_negative_numbers = true)]
    cone_function: Option<Vec<f64>>,

    /// Energy-cut coefficients of cut = A*E + B*E^2 (implies --predict)
    #[arg(long, num_args = 2, value_names = ["A", "B"], allow_negative_numbers = true)]
    cut_function: Option<Vec<f64>>,
}

impl ClusterSettings {
    /// Builds the clusterer configuration: defaults, then the config file,
    /// then command-line flags.
    fn resolve(&self) -> Result<FixedConeConfig> {
        let mut config = match &self.config {
            Some(path) => read_json::<FixedConeConfig>(path)?,
            None => FixedConeConfig::default(),
        };

        if let Some(metric) = self.metric {
            config.metric = metric.into();
        }
        if let Some(seed_energy) = self.seed_energy {
            config.seed_energy = seed_energy;
        }

        let predicted =
            self.predict || self.cone_function.is_some() || self.cut_function.is_some();
        if predicted {
            let (mut cone, mut cut) = match config.policy {
                ConePolicy::Predicted { cone, cut } => (cone, cut),
                ConePolicy::Fixed { .. } => (
                    ConePolicy::DEFAULT_CONE_FUNCTION,
                    ConePolicy::DEFAULT_CUT_FUNCTION,
                ),
            };
            if let Some(values) = &self.cone_function {
                cone = coefficients("cone-function", values)?;
            }
            if let Some(values) = &self.cut_function {
                cut = coefficients("cut-function", values)?;
            }
            if self.radius.is_some() || self.min_energy.is_some() {
                warn!("--radius and --min-energy are ignored with a predicted cone");
            }
            config.policy = ConePolicy::Predicted { cone, cut };
        } else if self.radius.is_some() || self.min_energy.is_some() {
            let (radius, min_energy) = match config.policy {
                ConePolicy::Fixed { radius, min_energy } => (radius, min_energy),
                ConePolicy::Predicted { .. } => (FALLBACK_RADIUS, FALLBACK_MIN_ENERGY),
            };
            config.policy = ConePolicy::Fixed {
                radius: self.radius.unwrap_or(radius),
                min_energy: self.min_energy.unwrap_or(min_energy),
            };
        }

        Ok(config)
    }
}

fn coefficients(name: &str, values: &[f64]) -> Result<[f64; 2]> {
    match values {
        [a, b] => Ok([*a, *b]),
        _ => Err(CliError::InvalidArgument(format!(
            "--{name} takes exactly two values, got {}",
            values.len()
        ))),
    }
}

/// Input file layout.
#[derive(Deserialize)]
#[serde(untagged)]
enum InputFile {
    Events(Vec<InputEvent>),
    Hits(Vec<HitData>),
}

#[derive(Deserialize)]
struct InputEvent {
    hits: Vec<HitData>,
}

/// One output cluster with its final 3-momentum and derived properties.
#[derive(Serialize)]
struct ClusterRecord {
    momentum: [f64; 3],
    members: Vec<usize>,
    cell_ids: Vec<u64>,
    properties: ClusterProperties,
}

#[derive(Serialize)]
struct EventRecord {
    event: usize,
    statistics: ClusteringStatistics,
    clusters: Vec<ClusterRecord>,
}

#[derive(Serialize)]
struct Report {
    config: FixedConeConfig,
    statistics: ClusteringStatistics,
    events: Vec<EventRecord>,
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let reader = BufReader::new(File::open(path)?);
    Ok(serde_json::from_reader(reader)?)
}

/// Reads the input as a list of events. A bare hit array is one event.
fn read_events(path: &Path) -> Result<Vec<Vec<HitData>>> {
    let events = match read_json::<InputFile>(path)? {
        InputFile::Events(events) => events.into_iter().map(|event| event.hits).collect(),
        InputFile::Hits(hits) => vec![hits],
    };
    Ok(events)
}

fn write_json<T: Serialize>(path: Option<&Path>, value: &T) -> Result<()> {
    match path {
        Some(path) => {
            let mut writer = BufWriter::new(File::create(path)?);
            serde_json::to_writer_pretty(&mut writer, value)?;
            writer.flush()?;
        }
        None => {
            let stdout = io::stdout();
            let mut writer = stdout.lock();
            serde_json::to_writer_pretty(&mut writer, value)?;
            writeln!(writer)?;
        }
    }
    Ok(())
}

fn event_record(index: usize, hits: &[HitData], event: ClusteredEvent) -> Result<EventRecord> {
    let clusters = event
        .clusters
        .iter()
        .map(|cluster| {
            Ok(ClusterRecord {
                momentum: cluster.vector.momentum,
                members: cluster.members.clone(),
                cell_ids: cluster.hits(hits).map(|hit| hit.cell_id).collect(),
                properties: ClusterProperties::calculate(cluster, hits)?,
            })
        })
        .collect::<Result<Vec<_>>>()?;
    Ok(EventRecord {
        event: index,
        statistics: event.statistics,
        clusters,
    })
}

fn run_cluster(
    input: &Path,
    output: Option<&Path>,
    settings: &ClusterSettings,
    parallel: bool,
) -> Result<Report> {
    let config = settings.resolve()?;
    let clusterer = FixedConeClusterer::new(config)?;
    debug!("{clusterer}");

    let events = read_events(input)?;
    let hit_count: usize = events.iter().map(Vec::len).sum();
    info!("Read {} events ({} hits) from {}", events.len(), hit_count, input.display());

    let start = Instant::now();
    let results = if parallel {
        cluster_events::<HitData, _>(&clusterer, &events)
    } else {
        cluster_event_stream::<HitData, _>(&clusterer, &events)
    };
    let elapsed = start.elapsed();

    let statistics = total_statistics(&results);
    if statistics.aborted_on_radius {
        warn!("Predicted cone radius was not positive; affected events have no clusters");
    }
    info!(
        "Built {} clusters in {:.3}s ({} hits transferred, {} clusters emptied)",
        results.iter().map(|r| r.clusters.len()).sum::<usize>(),
        elapsed.as_secs_f64(),
        statistics.hits_transferred,
        statistics.clusters_emptied
    );

    let records = events
        .iter()
        .zip(results)
        .enumerate()
        .map(|(index, (hits, result))| event_record(index, hits, result))
        .collect::<Result<Vec<_>>>()?;

    let report = Report {
        config,
        statistics,
        events: records,
    };
    write_json(output, &report)?;
    Ok(report)
}

fn run_info(input: &Path) -> Result<()> {
    let events = read_events(input)?;
    let hits = events.iter().flatten();

    let hit_count = hits.clone().count();
    let total_energy: f64 = hits.clone().map(|hit| hit.energy).sum();
    let max_energy = hits.clone().map(|hit| hit.energy).fold(f64::NAN, f64::max);
    let layers: BTreeSet<u16> = hits.map(|hit| hit.layer).collect();

    println!("File: {}", input.display());
    println!("Events: {}", events.len());
    println!("Hits: {}", hit_count);
    if hit_count > 0 {
        println!("Total energy: {:.4} GeV", total_energy);
        println!("Highest hit energy: {:.4} GeV", max_energy);
        println!("Layers: {}", layers.len());
    }
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .init();

    match cli.command {
        Commands::Cluster {
            input,
            output,
            settings,
            parallel,
        } => {
            run_cluster(&input, output.as_deref(), &settings, parallel)?;
        }
        Commands::Info { input } => run_info(&input)?,
    }

    Ok(())
}
