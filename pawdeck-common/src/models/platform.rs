// File: pawdeck-common/src/models/platform.rs

use std::fmt;
use std::str::FromStr;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, Clone, Copy, Eq, PartialEq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Twitch,
    Discord,
    YouTube,
    Kick,
}

impl Platform {
    /// Bit used by the persisted platform mask (1=Twitch, 2=Discord,
    /// 4=YouTube, 8=Kick).
    pub fn bit(&self) -> u8 {
        match self {
            Platform::Twitch => 1,
            Platform::Discord => 2,
            Platform::YouTube => 4,
            Platform::Kick => 8,
        }
    }

    pub fn all() -> [Platform; 4] {
        [
            Platform::Twitch,
            Platform::Discord,
            Platform::YouTube,
            Platform::Kick,
        ]
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Platform::Twitch => write!(f, "twitch"),
            Platform::Discord => write!(f, "discord"),
            Platform::YouTube => write!(f, "youtube"),
            Platform::Kick => write!(f, "kick"),
        }
    }
}

impl FromStr for Platform {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "twitch" => Ok(Platform::Twitch),
            "discord" => Ok(Platform::Discord),
            "youtube" => Ok(Platform::YouTube),
            "kick" => Ok(Platform::Kick),
            _ => Err(format!("Unknown platform: {}", s)),
        }
    }
}

/// Set of platforms a command applies to. Persisted as the raw bitmask so
/// existing configuration documents keep loading unchanged.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, Eq, PartialEq)]
#[serde(transparent)]
pub struct PlatformSet(u8);

impl PlatformSet {
    pub fn empty() -> Self {
        PlatformSet(0)
    }

    pub fn all() -> Self {
        PlatformSet(0b1111)
    }

    pub fn single(platform: Platform) -> Self {
        PlatformSet(platform.bit())
    }

    pub fn from_bits(bits: u8) -> Self {
        PlatformSet(bits & 0b1111)
    }

    pub fn bits(&self) -> u8 {
        self.0
    }

    pub fn contains(&self, platform: Platform) -> bool {
        self.0 & platform.bit() != 0
    }

    pub fn insert(&mut self, platform: Platform) {
        self.0 |= platform.bit();
    }

    pub fn remove(&mut self, platform: Platform) {
        self.0 &= !platform.bit();
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }
}

impl Default for PlatformSet {
    fn default() -> Self {
        PlatformSet::all()
    }
}

impl FromIterator<Platform> for PlatformSet {
    fn from_iter<I: IntoIterator<Item = Platform>>(iter: I) -> Self {
        let mut set = PlatformSet::empty();
        for p in iter {
            set.insert(p);
        }
        set
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bitmask_membership_matches_wire_bits() {
        let set = PlatformSet::from_bits(1 | 4);
        assert!(set.contains(Platform::Twitch));
        assert!(!set.contains(Platform::Discord));
        assert!(set.contains(Platform::YouTube));
        assert!(!set.contains(Platform::Kick));
        assert_eq!(set.bits(), 5);
    }

    #[test]
    fn serde_round_trips_as_integer() {
        let set: PlatformSet = serde_json::from_str("3").unwrap();
        assert!(set.contains(Platform::Twitch));
        assert!(set.contains(Platform::Discord));
        assert_eq!(serde_json::to_string(&set).unwrap(), "3");
    }

    #[test]
    fn insert_and_remove() {
        let mut set = PlatformSet::empty();
        set.insert(Platform::Kick);
        assert!(set.contains(Platform::Kick));
        set.remove(Platform::Kick);
        assert!(set.is_empty());
    }
}
