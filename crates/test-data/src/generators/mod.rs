//! Synthetic track generators.

mod track;

pub use track::TrackGenerator;
