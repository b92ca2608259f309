//! Async STAC item search client.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use tracing::{debug, info, instrument, warn};

use ndvi_common::{Band, BoundingBox, DateRange, Scene, SignedHref};

use crate::catalog::SceneCatalog;
use crate::error::{StacError, StacResult};
use crate::models::{Item, ItemCollection, SearchBody};
use crate::retry::{send_with_retry, RetryPolicy};
use crate::signing::{SasSigner, PC_SAS_URL};

/// Default Planetary Computer STAC API root.
pub const PC_STAC_URL: &str = "https://planetarycomputer.microsoft.com/api/stac/v1";

/// Default collection queried for reflectance imagery.
pub const DEFAULT_COLLECTION: &str = "sentinel-2-l2a";

/// Configuration for [`StacCatalogClient`].
#[derive(Debug, Clone)]
pub struct StacClientOptions {
    /// STAC API root; `/search` is appended
    pub stac_url: String,
    /// SAS API root; `None` leaves asset hrefs unsigned
    pub sas_url: Option<String>,
    pub collection: String,
    /// Per-request timeout
    pub request_timeout: Duration,
    pub retry: RetryPolicy,
    /// Most items a search may match; more is an error
    pub max_items: usize,
    /// Items requested per page
    pub page_size: u32,
}

impl Default for StacClientOptions {
    fn default() -> Self {
        Self {
            stac_url: PC_STAC_URL.to_string(),
            sas_url: Some(PC_SAS_URL.to_string()),
            collection: DEFAULT_COLLECTION.to_string(),
            request_timeout: Duration::from_secs(30),
            retry: RetryPolicy::default(),
            max_items: 1000,
            page_size: 100,
        }
    }
}

impl StacClientOptions {
    /// Full `POST /search` URL.
    pub fn search_url(&self) -> String {
        let base = self.stac_url.trim_end_matches('/');
        if base.ends_with("/search") {
            base.to_string()
        } else {
            format!("{}/search", base)
        }
    }
}

/// Searches a STAC API and turns matching items into signed [`Scene`]s.
pub struct StacCatalogClient {
    client: Client,
    options: StacClientOptions,
    signer: Option<SasSigner>,
}

impl StacCatalogClient {
    pub fn new(options: StacClientOptions) -> StacResult<Self> {
        let client = Client::builder()
            .timeout(options.request_timeout)
            .connect_timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| StacError::Client(e.to_string()))?;

        let signer = options
            .sas_url
            .as_ref()
            .map(|url| SasSigner::new(client.clone(), url.clone(), options.retry.clone()));

        Ok(Self {
            client,
            options,
            signer,
        })
    }

    pub fn options(&self) -> &StacClientOptions {
        &self.options
    }

    /// Run a search, following `next` links until the last page.
    ///
    /// A search matching more than `max_items` items fails instead of
    /// returning a partial result.
    #[instrument(skip(self, body), fields(collection = %self.options.collection))]
    pub async fn search_items(&self, body: &SearchBody) -> StacResult<Vec<Item>> {
        let max = self.options.max_items;
        let mut items: Vec<Item> = Vec::new();

        let mut request_body = serde_json::to_value(body).map_err(|e| StacError::parse("search body", e))?;
        let mut page = self.post_search(&self.options.search_url(), &request_body).await?;
        let mut pages = 1;

        loop {
            let next = page.next_link().cloned();
            let page_len = page.features.len();
            items.extend(page.features);

            if items.len() > max {
                warn!(limit = max, pages = pages, "STAC search exceeded the item limit");
                return Err(StacError::TooManyItems { limit: max });
            }
            if page_len == 0 {
                break;
            }

            let Some(link) = next else { break };
            page = if link.is_post() {
                request_body = link.next_body(&request_body);
                self.post_search(&link.href, &request_body).await?
            } else {
                self.get_page(&link.href).await?
            };
            pages += 1;
        }

        debug!(items = items.len(), pages = pages, "STAC search complete");
        Ok(items)
    }

    /// Convert an item into a scene with a signed reference per known band.
    pub async fn item_to_scene(&self, item: &Item) -> StacResult<Scene> {
        let acquired = item
            .datetime()
            .ok_or_else(|| StacError::invalid_item(&item.id, "missing or unparsable datetime"))?;
        let collection = item
            .collection
            .clone()
            .unwrap_or_else(|| self.options.collection.clone());

        let mut scene = Scene::new(item.id.clone(), collection.clone(), acquired);
        scene.epsg = item.epsg();

        for band in Band::ALL {
            let Some(asset) = item.asset(band.asset_key()) else {
                continue;
            };
            let href = match &self.signer {
                Some(signer) => signer.sign(&collection, &asset.href).await?,
                None => SignedHref::unsigned(asset.href.clone()),
            };
            scene.bands.insert(band, href);
        }

        Ok(scene)
    }

    async fn post_search(&self, url: &str, body: &Value) -> StacResult<ItemCollection> {
        let resp = send_with_retry(&self.options.retry, "STAC search", || {
            self.client.post(url).json(body)
        })
        .await?;
        resp.json::<ItemCollection>()
            .await
            .map_err(|e| StacError::parse("STAC search", e))
    }

    async fn get_page(&self, url: &str) -> StacResult<ItemCollection> {
        let resp =
            send_with_retry(&self.options.retry, "STAC pagination", || self.client.get(url)).await?;
        resp.json::<ItemCollection>()
            .await
            .map_err(|e| StacError::parse("STAC pagination", e))
    }
}

#[async_trait]
impl SceneCatalog for StacCatalogClient {
    #[instrument(skip(self), fields(collection = %self.options.collection))]
    async fn search(
        &self,
        bbox: &BoundingBox,
        range: &DateRange,
        cloud_cover_max: f64,
    ) -> StacResult<Vec<Scene>> {
        let body = SearchBody::new(&self.options.collection, *bbox, range)
            .cloud_cover_below(cloud_cover_max)
            .limit(self.options.page_size);

        let items = self.search_items(&body).await?;

        let mut scenes = Vec::with_capacity(items.len());
        for item in &items {
            scenes.push(self.item_to_scene(item).await?);
        }

        info!(
            scenes = scenes.len(),
            datetime = %body.datetime,
            "Catalog search returned scenes"
        );
        Ok(scenes)
    }

    fn collection(&self) -> &str {
        &self.options.collection
    }
}
