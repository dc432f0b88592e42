//! Radarr and Sonarr integration.

mod client;
mod error;
mod gateway;
mod retry;
mod types;

pub use client::{create_catalog, Catalog, RadarrClient, SonarrClient};
pub use error::ArrError;
pub use gateway::{CatalogFailure, CatalogGateway};
pub use retry::{retry_transient, RetryPolicy};
pub use types::{ItemRef, MovieRecord, MovieSummary};
