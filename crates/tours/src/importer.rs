//! Per-file ingestion: parse, measure, classify, deduplicate, persist.
//!
//! Every file ends in exactly one [`ImportOutcome`]. Failures never escape a
//! single file, so a batch always yields one outcome per input.

use std::sync::Arc;

use bytes::Bytes;
use serde::Serialize;
use uuid::Uuid;

use crate::{
    classifier,
    config::IngestConfig,
    errors::AppError,
    external_id::{self, ExternalRef},
    file_parsers::{self, FileType, ParseWarning},
    models::{NewTour, Tour},
    scoring,
    store::TourStore,
    track_parser::ParsedTrack,
};

/// An uploaded file: its name (used for format dispatch) and raw contents.
#[derive(Debug, Clone)]
pub struct TrackFile {
    pub filename: String,
    pub bytes: Bytes,
}

impl TrackFile {
    pub fn new(filename: impl Into<String>, bytes: impl Into<Bytes>) -> Self {
        Self {
            filename: filename.into(),
            bytes: bytes.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ImportOutcome {
    Imported { tour_id: Uuid, name: String },
    AlreadyExists { external_id: String },
    Skipped { reason: String },
    Error { reason: String },
}

impl ImportOutcome {
    pub fn is_imported(&self) -> bool {
        matches!(self, ImportOutcome::Imported { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FileOutcome {
    pub filename: String,
    #[serde(flatten)]
    pub outcome: ImportOutcome,
    pub warnings: Vec<ParseWarning>,
}

/// Totals over a batch of outcomes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ImportCounts {
    pub imported: usize,
    pub already_exists: usize,
    pub skipped: usize,
    pub errors: usize,
}

impl ImportCounts {
    pub fn from_outcomes<'a>(outcomes: impl IntoIterator<Item = &'a FileOutcome>) -> Self {
        outcomes
            .into_iter()
            .fold(Self::default(), |mut acc, o| {
                match o.outcome {
                    ImportOutcome::Imported { .. } => acc.imported += 1,
                    ImportOutcome::AlreadyExists { .. } => acc.already_exists += 1,
                    ImportOutcome::Skipped { .. } => acc.skipped += 1,
                    ImportOutcome::Error { .. } => acc.errors += 1,
                }
                acc
            })
    }
}

#[derive(Clone)]
pub struct Importer {
    store: Arc<dyn TourStore>,
    config: IngestConfig,
}

impl Importer {
    pub fn new(store: Arc<dyn TourStore>, config: IngestConfig) -> Self {
        Self { store, config }
    }

    pub fn store(&self) -> &Arc<dyn TourStore> {
        &self.store
    }

    /// Import files one after another. One outcome per input, in input order.
    pub async fn import_batch(&self, files: impl IntoIterator<Item = TrackFile>) -> Vec<FileOutcome> {
        let mut outcomes = Vec::new();
        for file in files {
            outcomes.push(self.import_file(file).await);
        }
        outcomes
    }

    pub async fn import_file(&self, file: TrackFile) -> FileOutcome {
        tracing::info!("Processing {}", file.filename);

        let mut warnings = Vec::new();
        let outcome = match self.ingest(&file, &mut warnings).await {
            Ok(tour) => {
                tracing::info!(
                    "Imported {} as tour {} ({}, {} points, {:.2} km)",
                    file.filename,
                    tour.id,
                    tour.tour_type,
                    tour.geometry.len(),
                    tour.distance_km
                );
                ImportOutcome::Imported {
                    tour_id: tour.id,
                    name: tour.name,
                }
            }
            Err(AppError::Duplicate(external_id)) => {
                tracing::info!("Tour with external id {external_id} already exists, skipping");
                ImportOutcome::AlreadyExists { external_id }
            }
            Err(e @ AppError::EmptyTrack) => {
                tracing::warn!("{}: {e}, skipping", file.filename);
                ImportOutcome::Skipped {
                    reason: e.to_string(),
                }
            }
            Err(e) => {
                tracing::error!("Failed to import {}: {e}", file.filename);
                ImportOutcome::Error {
                    reason: e.to_string(),
                }
            }
        };

        FileOutcome {
            filename: file.filename,
            outcome,
            warnings,
        }
    }

    async fn ingest(&self, file: &TrackFile, warnings: &mut Vec<ParseWarning>) -> Result<Tour, AppError> {
        let file_type = FileType::from_filename(&file.filename)?;
        tracing::debug!("Detected {file_type:?} for {}", file.filename);

        let parsed = file_parsers::parse_track_file(file_type, file.bytes.clone())?;
        warnings.extend(parsed.warnings);

        let track = ParsedTrack::from_document(parsed.document, &file.filename);
        if track.points.is_empty() {
            tracing::warn!("Tour {} has no track points", track.name);
            return Err(AppError::EmptyTrack);
        }

        let metrics = scoring::score_track(&track.points, &self.config.metrics);
        let classification = classifier::classify(
            &track.name,
            metrics.speed_kmh,
            file_type,
            &self.config.classifier,
        );
        tracing::debug!(
            "{}: {:.2} km moving, {:.1} km/h, {:?}",
            track.name,
            metrics.distance_km,
            metrics.speed_kmh,
            classification
        );

        let external = external_id::extract_external_ref(track.link.as_deref());
        if let Some(ExternalRef { id, .. }) = &external
            && self.store.exists_by_external_id(id).await?
        {
            return Err(AppError::Duplicate(id.clone()));
        }

        let (external_id, external_href) = match external {
            Some(r) => (Some(r.id), Some(r.href)),
            None => (None, None),
        };

        let tour = Tour::new(NewTour {
            name: track.name,
            tour_type: classification.tour_type,
            date: track.started_at,
            metrics,
            electric_assist: classification.electric_assist,
            external_id,
            external_href,
            points: track.points,
        })
        .ok_or(AppError::EmptyTrack)?;

        self.store.insert(&tour).await?;
        Ok(tour)
    }
}
