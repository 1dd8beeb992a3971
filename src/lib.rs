//! LEAFCLOUD nutrient service.
//!
//! Two pure engines sit at the core:
//! - [`reconstruction`]: fills the days between sparse lab measurements by
//!   linear interpolation, producing a training-ready NPK series per bucket
//! - [`status`]: maps one (N, P, K, pH, EC) reading to per-nutrient status,
//!   an overall status and a single prioritized recommendation
//!
//! Around them, [`routes`] serves the IoT device and mobile app over Axum,
//! backed by Postgres ([`schema`]) and an injected NPK [`oracle`].
//!
//! Modules talk to each other through the re-exports below (EMBP), so
//! `routes/*.rs` only depends on this crate root.

pub mod config;
pub mod errors;
pub mod models;
pub mod oracle;
pub mod reconstruction;
pub mod routes;
pub mod schema;
pub mod status;
pub mod validation;

pub use config::Config;
pub use errors::EngineError;
pub use models::{
    DailyReadingRow, DailyRecord, InstantaneousReading, IotReading, LabResultRow, LabSample, Npk,
    Nutrient, NutrientStatus, OverallStatus, PredictedReading, ReadingSource,
    ReconstructedReading, StatusResult,
};
pub use oracle::Oracle;
pub use status::StatusConfig;
