//! HTTP API handlers

pub mod alerts;
pub mod analysis;
pub mod blacklist;
pub mod health;
pub mod ingest;
pub mod maintenance;
pub mod plates;
pub mod profiles;
pub mod settings;

pub use alerts::alert_routes;
pub use analysis::analysis_routes;
pub use blacklist::blacklist_routes;
pub use health::health_routes;
pub use ingest::ingest_routes;
pub use maintenance::maintenance_routes;
pub use plates::plate_routes;
pub use profiles::profile_routes;
pub use settings::settings_routes;
