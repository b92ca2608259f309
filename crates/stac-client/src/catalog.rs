//! The scene catalog seam.

use async_trait::async_trait;

use ndvi_common::{BoundingBox, DateRange, Scene};

use crate::error::StacResult;

/// Something that can list signed scenes for an area and time window.
///
/// The production implementation is [`crate::StacCatalogClient`]; tests
/// substitute canned catalogs.
#[async_trait]
pub trait SceneCatalog: Send + Sync {
    /// Scenes intersecting `bbox` acquired within `range` with cloud cover
    /// strictly below `cloud_cover_max` percent.
    ///
    /// An empty vector means nothing matched. Order is unspecified.
    async fn search(
        &self,
        bbox: &BoundingBox,
        range: &DateRange,
        cloud_cover_max: f64,
    ) -> StacResult<Vec<Scene>>;

    /// Collection identifier queried by this catalog.
    fn collection(&self) -> &str;
}
