#![forbid(unsafe_code)]

pub mod app_services;
pub mod asset_service;
pub mod error;
pub mod metrics;
pub mod progress_service;
pub mod tracker;

pub use ora_core::Clock;

pub use app_services::AppServices;
pub use asset_service::AssetService;
pub use error::{AppServicesError, AssetServiceError};
pub use metrics::{CountingSink, DropReason, NoopSink, TelemetrySink};
pub use progress_service::{CompletionReceipt, ProgressService};
pub use tracker::{ActivityTracker, IngestDisposition, IngestReport, TrackerConfig};
