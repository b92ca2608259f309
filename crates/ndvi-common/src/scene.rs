//! Catalog scenes and their signed band references.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::band::Band;

/// A time-limited, authorized URL for one band's pixel data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignedHref {
    pub url: String,
    /// `None` when the href needs no signature or never expires.
    pub expires_at: Option<DateTime<Utc>>,
}

impl SignedHref {
    pub fn new(url: impl Into<String>, expires_at: Option<DateTime<Utc>>) -> Self {
        Self {
            url: url.into(),
            expires_at,
        }
    }

    /// Unsigned reference that never expires.
    pub fn unsigned(url: impl Into<String>) -> Self {
        Self::new(url, None)
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        matches!(self.expires_at, Some(exp) if exp <= now)
    }
}

/// One satellite observation returned by the catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scene {
    pub id: String,
    pub collection: String,
    pub acquired: DateTime<Utc>,
    /// Native CRS of the band rasters, e.g. 32618 for UTM 18N.
    pub epsg: Option<u32>,
    pub bands: BTreeMap<Band, SignedHref>,
}

impl Scene {
    pub fn new(id: impl Into<String>, collection: impl Into<String>, acquired: DateTime<Utc>) -> Self {
        Self {
            id: id.into(),
            collection: collection.into(),
            acquired,
            epsg: None,
            bands: BTreeMap::new(),
        }
    }

    pub fn with_epsg(mut self, epsg: u32) -> Self {
        self.epsg = Some(epsg);
        self
    }

    pub fn with_band(mut self, band: Band, href: SignedHref) -> Self {
        self.bands.insert(band, href);
        self
    }

    pub fn band(&self, band: Band) -> Option<&SignedHref> {
        self.bands.get(&band)
    }

    /// Acquisition calendar day (UTC) as `YYYY-MM-DD`.
    pub fn date_string(&self) -> String {
        crate::time::iso_date(&self.acquired)
    }
}
