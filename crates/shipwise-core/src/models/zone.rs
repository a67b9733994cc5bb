//! Zone model
//!
//! Courier-defined geographic pricing buckets. Every courier in the
//! marketplace maps pincode pairs onto the same five buckets, so a zone is
//! a closed enumeration rather than a table row.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Pricing zone
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Zone {
    /// Within city
    #[serde(rename = "zoneA")]
    A,
    /// Within state
    #[serde(rename = "zoneB")]
    B,
    /// Metro to metro
    #[serde(rename = "zoneC")]
    C,
    /// Rest of India
    #[serde(rename = "zoneD")]
    D,
    /// North-east and special regions
    #[serde(rename = "zoneE")]
    E,
}

impl Zone {
    /// All zones in key order
    pub const ALL: [Zone; 5] = [Zone::A, Zone::B, Zone::C, Zone::D, Zone::E];

    /// Storage key (`zoneA`..`zoneE`)
    pub fn key(&self) -> &'static str {
        match self {
            Zone::A => "zoneA",
            Zone::B => "zoneB",
            Zone::C => "zoneC",
            Zone::D => "zoneD",
            Zone::E => "zoneE",
        }
    }
}

impl fmt::Display for Zone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for Zone {
    type Err = String;

    /// Parse from `zoneA`, `zone_a`, `A` or `a`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase().replace(['_', '-', ' '], "");
        let letter = normalized.strip_prefix("zone").unwrap_or(&normalized);

        match letter {
            "a" => Ok(Zone::A),
            "b" => Ok(Zone::B),
            "c" => Ok(Zone::C),
            "d" => Ok(Zone::D),
            "e" => Ok(Zone::E),
            _ => Err(format!("unknown zone: {}", s)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zone_parsing() {
        assert_eq!("zoneA".parse::<Zone>(), Ok(Zone::A));
        assert_eq!("zone_c".parse::<Zone>(), Ok(Zone::C));
        assert_eq!("E".parse::<Zone>(), Ok(Zone::E));
        assert!("zoneF".parse::<Zone>().is_err());
    }

    #[test]
    fn test_zone_serde_keys() {
        let json = serde_json::to_string(&Zone::D).unwrap();
        assert_eq!(json, "\"zoneD\"");

        let zone: Zone = serde_json::from_str("\"zoneB\"").unwrap();
        assert_eq!(zone, Zone::B);
    }

    #[test]
    fn test_zone_ordering() {
        assert!(Zone::A < Zone::E);
        assert_eq!(Zone::ALL.len(), 5);
    }
}
