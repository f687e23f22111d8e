pub mod classifier;
pub mod config;
pub mod database;
pub mod errors;
pub mod external_id;
pub mod file_parsers;
pub mod importer;
pub mod kml_parser;
pub mod map_export;
pub mod models;
pub mod nearby;
pub mod query_builder;
pub mod scoring;
pub mod store;
pub mod track_parser;

pub use crate::{
    config::{IngestConfig, Settings},
    database::Database,
    errors::AppError,
    importer::{FileOutcome, ImportCounts, ImportOutcome, Importer, TrackFile},
    map_export::{export_geojson, tour_feature},
    models::{Tour, TourFilter, TourSummary, TourType},
    nearby::{NearbyQuery, find_nearby},
    store::{MemoryStore, TourStore},
};
