use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use time::Date;
use time::macros::format_description;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};
use tours::{
    AppError, Database, FileOutcome, ImportCounts, ImportOutcome, Importer, MemoryStore,
    NearbyQuery, Settings, TourFilter, TourStore, TourSummary, TourType, TrackFile,
    export_geojson, file_parsers::FileType, find_nearby, nearby::default_radius_km,
};
use uuid::Uuid;

fn init_logging() {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn parse_date(s: &str) -> Result<Date, String> {
    Date::parse(s, format_description!("[year]-[month]-[day]")).map_err(|e| e.to_string())
}

#[derive(Parser)]
#[command(name = "tours", about = "Import GPS tracks and query the tour catalogue")]
struct Cli {
    /// Keep everything in memory instead of connecting to the database.
    #[arg(long, global = true)]
    dry_run: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    #[command(about = "Import .gpx, .kml and .kmz files or directories of them")]
    Import {
        #[arg(required = true)]
        paths: Vec<PathBuf>,
    },
    #[command(about = "List tours passing within a radius of a point")]
    Nearby {
        #[arg(long, allow_hyphen_values = true)]
        lat: f64,
        #[arg(long, allow_hyphen_values = true)]
        lon: f64,
        #[arg(long, default_value_t = default_radius_km())]
        radius_km: f64,
    },
    #[command(about = "List stored tours, newest first")]
    List {
        #[command(flatten)]
        filter: FilterArgs,
        #[arg(long, default_value_t = 100)]
        limit: i64,
        #[arg(long, default_value_t = 0)]
        offset: i64,
    },
    #[command(about = "Print totals over the stored tours matching the filters")]
    Summary {
        #[command(flatten)]
        filter: FilterArgs,
    },
    #[command(about = "Print one tour with its full geometry")]
    Show { id: Uuid },
    #[command(about = "Export tours as a GeoJSON FeatureCollection, newest first")]
    Geojson {
        #[arg(long = "type")]
        tour_type: Option<TourType>,
        #[arg(long, value_parser = parse_date)]
        from: Option<Date>,
        #[arg(long, value_parser = parse_date)]
        to: Option<Date>,
        #[arg(long, default_value_t = i64::MAX)]
        limit: i64,
    },
    #[command(about = "List the tour types present in the store")]
    Types,
}

#[derive(Args)]
struct FilterArgs {
    /// Bike, Hike, Inline or Undefined (any case)
    #[arg(long = "type")]
    tour_type: Option<TourType>,
    /// First day to include, YYYY-MM-DD
    #[arg(long, value_parser = parse_date)]
    from: Option<Date>,
    /// Last day to include, YYYY-MM-DD
    #[arg(long, value_parser = parse_date)]
    to: Option<Date>,
    /// Only tours recorded with electric assist
    #[arg(long)]
    ebike: bool,
    #[arg(long)]
    min_distance: Option<f64>,
    #[arg(long)]
    max_distance: Option<f64>,
    #[arg(long)]
    min_elevation: Option<f64>,
}

impl FilterArgs {
    fn into_filter(self, limit: i64, offset: i64) -> TourFilter {
        TourFilter {
            tour_type: self.tour_type,
            date_from: self.from,
            date_to: self.to,
            ebike_only: self.ebike.then_some(true),
            min_distance: self.min_distance,
            max_distance: self.max_distance,
            min_elevation: self.min_elevation,
            limit,
            offset,
        }
    }
}

/// Expands directories into their supported track files, sorted by name.
/// Directories are not descended into recursively.
fn collect_files(paths: &[PathBuf]) -> anyhow::Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for path in paths {
        if path.is_dir() {
            let mut entries: Vec<PathBuf> = std::fs::read_dir(path)
                .with_context(|| format!("reading directory {}", path.display()))?
                .filter_map(|entry| entry.ok().map(|e| e.path()))
                .filter(|p| p.is_file() && is_track_file(p))
                .collect();
            entries.sort();
            files.extend(entries);
        } else {
            files.push(path.clone());
        }
    }
    Ok(files)
}

fn is_track_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .and_then(FileType::from_extension)
        .is_some()
}

async fn run_import(importer: &Importer, paths: &[PathBuf]) -> anyhow::Result<Vec<FileOutcome>> {
    let files = collect_files(paths)?;
    tracing::info!("Importing {} files", files.len());

    let mut outcomes = Vec::with_capacity(files.len());
    for path in files {
        let filename = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());

        let outcome = match tokio::fs::read(&path).await {
            Ok(bytes) => importer.import_file(TrackFile::new(filename, bytes)).await,
            Err(e) => {
                tracing::error!("Failed to read {}: {e}", path.display());
                FileOutcome {
                    filename,
                    outcome: ImportOutcome::Error {
                        reason: format!("IO error: {e}"),
                    },
                    warnings: Vec::new(),
                }
            }
        };
        outcomes.push(outcome);
    }

    let counts = ImportCounts::from_outcomes(&outcomes);
    tracing::info!(
        "Import finished: {} imported, {} already existed, {} skipped, {} failed",
        counts.imported,
        counts.already_exists,
        counts.skipped,
        counts.errors
    );

    Ok(outcomes)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logging();
    let cli = Cli::parse();
    let settings = Settings::from_env()?;

    let store: Arc<dyn TourStore> = if cli.dry_run {
        tracing::info!("Dry run, using an in-memory store");
        Arc::new(MemoryStore::new())
    } else {
        tracing::info!("Connecting to database");
        Arc::new(Database::connect(&settings.database_url, settings.max_connections).await?)
    };

    match cli.command {
        Commands::Import { paths } => {
            let importer = Importer::new(store, settings.ingest);
            let outcomes = run_import(&importer, &paths).await?;
            println!("{}", serde_json::to_string_pretty(&outcomes)?);
        }
        Commands::Nearby {
            lat,
            lon,
            radius_km,
        } => {
            let query = NearbyQuery {
                lat,
                lon,
                radius_km,
            };
            let tours = find_nearby(store.as_ref(), &query).await?;
            println!("{}", serde_json::to_string_pretty(&tours)?);
        }
        Commands::List {
            filter,
            limit,
            offset,
        } => {
            let tours = store.query(&filter.into_filter(limit, offset)).await?;
            println!("{}", serde_json::to_string_pretty(&tours)?);
        }
        Commands::Summary { filter } => {
            let tours = store.query(&filter.into_filter(i64::MAX, 0)).await?;
            let summary = TourSummary::from_tours(&tours);
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }
        Commands::Show { id } => {
            let tour = store.get_by_id(id).await?.ok_or(AppError::NotFound(id))?;
            println!("{}", serde_json::to_string_pretty(&tour)?);
        }
        Commands::Geojson {
            tour_type,
            from,
            to,
            limit,
        } => {
            let filter = TourFilter {
                tour_type,
                date_from: from,
                date_to: to,
                limit,
                ..Default::default()
            };
            let collection = export_geojson(store.as_ref(), &filter).await?;
            println!("{}", serde_json::to_string(&collection)?);
        }
        Commands::Types => {
            let types = store.tour_types().await?;
            println!("{}", serde_json::to_string_pretty(&types)?);
        }
    }

    Ok(())
}
