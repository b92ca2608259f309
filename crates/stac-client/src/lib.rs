//! STAC catalog access for the vegetation timelapse pipeline.
//!
//! Searches a STAC API (Microsoft Planetary Computer by default) for
//! Sentinel-2 L2A items, follows pagination, and signs every band asset
//! with a cached SAS token before returning [`ndvi_common::Scene`]s.

pub mod catalog;
pub mod client;
pub mod error;
pub mod models;
pub mod retry;
pub mod signing;

pub use catalog::SceneCatalog;
pub use client::{StacCatalogClient, StacClientOptions, DEFAULT_COLLECTION, PC_STAC_URL};
pub use error::{StacError, StacResult};
pub use retry::{send_with_retry, RetryPolicy};
pub use signing::{SasSigner, PC_SAS_URL};
