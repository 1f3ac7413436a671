//! Background and ingestion services

pub mod correlation;
pub mod ingest;
pub mod tracking_scan;

pub use correlation::analyze_similar_plates;
pub use ingest::IngestGateway;
pub use tracking_scan::{run_tracking_scan, FollowHit};
