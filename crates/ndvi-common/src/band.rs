//! Spectral band identifiers.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The closed set of spectral bands the pipeline reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Band {
    Nir,
    Red,
    Green,
    Blue,
}

impl Band {
    /// Every band in cube order.
    pub const ALL: [Band; 4] = [Band::Nir, Band::Red, Band::Green, Band::Blue];

    /// Sentinel-2 L2A asset key for this band.
    pub fn asset_key(&self) -> &'static str {
        match self {
            Band::Nir => "B08",
            Band::Red => "B04",
            Band::Green => "B03",
            Band::Blue => "B02",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Band::Nir => "nir",
            Band::Red => "red",
            Band::Green => "green",
            Band::Blue => "blue",
        }
    }

    /// Look up a band by its Sentinel-2 asset key.
    pub fn from_asset_key(key: &str) -> Option<Band> {
        Band::ALL.into_iter().find(|b| b.asset_key() == key)
    }
}

impl fmt::Display for Band {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Band {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "nir" | "b08" => Ok(Band::Nir),
            "red" | "b04" => Ok(Band::Red),
            "green" | "b03" => Ok(Band::Green),
            "blue" | "b02" => Ok(Band::Blue),
            other => Err(format!("Unknown band: {}", other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_asset_keys() {
        assert_eq!(Band::Nir.asset_key(), "B08");
        assert_eq!(Band::Red.asset_key(), "B04");
        assert_eq!(Band::from_asset_key("B03"), Some(Band::Green));
        assert_eq!(Band::from_asset_key("B8A"), None);
    }

    #[test]
    fn test_parse() {
        assert_eq!("NIR".parse::<Band>().unwrap(), Band::Nir);
        assert_eq!("b02".parse::<Band>().unwrap(), Band::Blue);
        assert!("swir".parse::<Band>().is_err());
    }
}
