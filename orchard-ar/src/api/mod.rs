//! HTTP API handlers for orchard-ar

pub mod analysis;
pub mod auth;
pub mod health;
pub mod observations;
pub mod reports;
pub mod summary;

pub use analysis::get_analysis;
pub use auth::{auth_middleware, login, logout};
pub use health::health_routes;
pub use observations::{create_observation, list_observations};
pub use reports::{
    download_aggregate_report, download_csv, download_record_report, download_records_report,
};
pub use summary::decode_summary;
