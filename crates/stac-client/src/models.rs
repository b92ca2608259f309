//! Serde models for STAC item search and the SAS token endpoint.
//!
//! Only the subset read by the pipeline is modelled: item datetime,
//! projection code, assets and pagination links.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use ndvi_common::{BoundingBox, DateRange};

/// Body for `POST /search`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchBody {
    pub collections: Vec<String>,
    pub bbox: BoundingBox,
    pub datetime: String,
    /// STAC query extension filter, e.g. `{"eo:cloud_cover": {"lt": 10}}`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub query: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
}

impl SearchBody {
    pub fn new(collection: &str, bbox: BoundingBox, range: &DateRange) -> Self {
        Self {
            collections: vec![collection.to_string()],
            bbox,
            datetime: range.to_stac_interval(),
            query: None,
            limit: None,
        }
    }

    /// Keep only items whose cloud cover is strictly below `max` percent.
    pub fn cloud_cover_below(mut self, max: f64) -> Self {
        self.query = Some(json!({ "eo:cloud_cover": { "lt": max } }));
        self
    }

    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }
}

/// A page of search results (GeoJSON FeatureCollection).
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ItemCollection {
    #[serde(default)]
    pub features: Vec<Item>,

    #[serde(default)]
    pub links: Vec<Link>,
}

impl ItemCollection {
    pub fn next_link(&self) -> Option<&Link> {
        self.links.iter().find(|l| l.rel == "next")
    }
}

/// A single STAC item (GeoJSON Feature).
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Item {
    pub id: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub collection: Option<String>,

    #[serde(default)]
    pub properties: HashMap<String, Value>,

    #[serde(default)]
    pub assets: HashMap<String, Asset>,
}

impl Item {
    /// Acquisition time from `properties.datetime`, falling back to
    /// `start_datetime` for items that only carry an interval.
    pub fn datetime(&self) -> Option<DateTime<Utc>> {
        ["datetime", "start_datetime"].iter().find_map(|key| {
            self.properties
                .get(*key)
                .and_then(Value::as_str)
                .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
                .map(|dt| dt.with_timezone(&Utc))
        })
    }

    /// Native EPSG code from `proj:epsg`, or `proj:code` of the form `EPSG:n`.
    pub fn epsg(&self) -> Option<u32> {
        if let Some(code) = self.properties.get("proj:epsg").and_then(Value::as_u64) {
            return u32::try_from(code).ok();
        }
        self.properties
            .get("proj:code")
            .and_then(Value::as_str)
            .and_then(|s| s.strip_prefix("EPSG:"))
            .and_then(|n| n.parse().ok())
    }

    pub fn cloud_cover(&self) -> Option<f64> {
        self.properties.get("eo:cloud_cover").and_then(Value::as_f64)
    }

    pub fn asset(&self, key: &str) -> Option<&Asset> {
        self.assets.get(key)
    }
}

/// A file referenced by an item.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Asset {
    pub href: String,

    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub media_type: Option<String>,
}

/// A link object; `rel == "next"` drives pagination.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Link {
    pub rel: String,
    pub href: String,

    /// `GET` when absent
    #[serde(skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<Value>,

    /// Merge `body` into the previous request body instead of replacing it
    #[serde(skip_serializing_if = "Option::is_none")]
    pub merge: Option<bool>,
}

impl Link {
    pub fn is_post(&self) -> bool {
        self.method
            .as_deref()
            .map(|m| m.eq_ignore_ascii_case("POST"))
            .unwrap_or(false)
    }

    /// Body for the follow-up POST, given the body of the previous request.
    pub fn next_body(&self, previous: &Value) -> Value {
        match (&self.body, self.merge.unwrap_or(false)) {
            (Some(body), true) => {
                let mut merged = previous.clone();
                if let (Some(base), Some(extra)) = (merged.as_object_mut(), body.as_object()) {
                    for (k, v) in extra {
                        base.insert(k.clone(), v.clone());
                    }
                }
                merged
            }
            (Some(body), false) => body.clone(),
            (None, _) => previous.clone(),
        }
    }
}

/// Response of `GET {sas}/token/{collection}`.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TokenResponse {
    pub token: String,

    #[serde(rename = "msft:expiry")]
    pub expiry: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    const ITEM: &str = r#"{
        "type": "Feature",
        "id": "S2B_MSIL2A_20240501T153819_R011_T18TWL",
        "collection": "sentinel-2-l2a",
        "properties": {
            "datetime": "2024-05-01T15:38:19.024000Z",
            "eo:cloud_cover": 3.2,
            "proj:epsg": 32618
        },
        "assets": {
            "B04": {"href": "https://x.blob.core.windows.net/B04.tif", "type": "image/tiff; application=geotiff; profile=cloud-optimized"},
            "B08": {"href": "https://x.blob.core.windows.net/B08.tif"}
        },
        "links": []
    }"#;

    #[test]
    fn test_search_body_wire_format() {
        let range = DateRange::new(
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            NaiveDate::from_ymd_opt(2024, 6, 30).unwrap(),
        )
        .unwrap();
        let body = SearchBody::new("sentinel-2-l2a", BoundingBox::new(-74.0, 40.0, -73.0, 41.0), &range)
            .cloud_cover_below(10.0)
            .limit(100);
        let v = serde_json::to_value(&body).unwrap();
        assert_eq!(v["collections"], json!(["sentinel-2-l2a"]));
        assert_eq!(v["bbox"], json!([-74.0, 40.0, -73.0, 41.0]));
        assert_eq!(v["datetime"], "2024-01-01T00:00:00Z/2024-06-30T23:59:59Z");
        assert_eq!(v["query"]["eo:cloud_cover"]["lt"], 10.0);
        assert_eq!(v["limit"], 100);
    }

    #[test]
    fn test_item_accessors() {
        let item: Item = serde_json::from_str(ITEM).unwrap();
        assert_eq!(item.epsg(), Some(32618));
        assert_eq!(item.cloud_cover(), Some(3.2));
        let dt = item.datetime().unwrap();
        assert_eq!(dt.date_naive(), NaiveDate::from_ymd_opt(2024, 5, 1).unwrap());
        assert!(item.asset("B04").is_some());
        assert!(item.asset("B03").is_none());
    }

    #[test]
    fn test_proj_code_fallback() {
        let item: Item = serde_json::from_value(json!({
            "id": "a",
            "properties": {"datetime": "2024-05-01T00:00:00Z", "proj:code": "EPSG:32734"},
            "assets": {}
        }))
        .unwrap();
        assert_eq!(item.epsg(), Some(32734));
    }

    #[test]
    fn test_next_body_merge() {
        let previous = json!({"collections": ["c"], "limit": 10});
        let link: Link = serde_json::from_value(json!({
            "rel": "next", "href": "http://x/search", "method": "POST",
            "body": {"token": "next:abc"}, "merge": true
        }))
        .unwrap();
        let next = link.next_body(&previous);
        assert_eq!(next["token"], "next:abc");
        assert_eq!(next["limit"], 10);

        let replace: Link = serde_json::from_value(json!({
            "rel": "next", "href": "http://x/search", "method": "POST",
            "body": {"token": "next:abc"}
        }))
        .unwrap();
        assert!(replace.next_body(&previous).get("limit").is_none());
        assert!(replace.is_post());
    }

    #[test]
    fn test_token_response() {
        let tok: TokenResponse = serde_json::from_str(
            r#"{"msft:expiry": "2024-05-01T16:00:00Z", "token": "st=2024&se=2024&sig=abc"}"#,
        )
        .unwrap();
        assert_eq!(tok.token, "st=2024&se=2024&sig=abc");
    }
}
