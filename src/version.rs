//! Broker release versions.
//!
//! A [`KafkaVersion`] names a broker release (`0.10.2.0`, `2.3.0`, ...). Every
//! message type maps each of its wire versions to the oldest release that
//! understands it, which lets callers pick a wire version for a cluster and
//! fail fast before sending something the broker cannot parse.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::Error;

/// A broker release: `major.minor.patch.revision`.
///
/// Releases before 1.0 use all four components (`0.11.0.2`); later releases
/// use three (`2.8.1`) and always have `revision == 0`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct KafkaVersion {
    pub major: u16,
    pub minor: u16,
    pub patch: u16,
    pub revision: u16,
}

macro_rules! releases {
    ($($name:ident => ($major:expr, $minor:expr, $patch:expr, $revision:expr)),* $(,)?) => {
        impl KafkaVersion {
            $(
                pub const $name: KafkaVersion = KafkaVersion::new($major, $minor, $patch, $revision);
            )*

            /// Every release this build knows about, oldest first.
            pub const KNOWN: &'static [KafkaVersion] = &[$(KafkaVersion::$name),*];
        }
    };
}

releases! {
    V0_8_2_0 => (0, 8, 2, 0),
    V0_8_2_1 => (0, 8, 2, 1),
    V0_8_2_2 => (0, 8, 2, 2),
    V0_9_0_0 => (0, 9, 0, 0),
    V0_9_0_1 => (0, 9, 0, 1),
    V0_10_0_0 => (0, 10, 0, 0),
    V0_10_0_1 => (0, 10, 0, 1),
    V0_10_1_0 => (0, 10, 1, 0),
    V0_10_1_1 => (0, 10, 1, 1),
    V0_10_2_0 => (0, 10, 2, 0),
    V0_10_2_1 => (0, 10, 2, 1),
    V0_10_2_2 => (0, 10, 2, 2),
    V0_11_0_0 => (0, 11, 0, 0),
    V0_11_0_1 => (0, 11, 0, 1),
    V0_11_0_2 => (0, 11, 0, 2),
    V1_0_0_0 => (1, 0, 0, 0),
    V1_0_1_0 => (1, 0, 1, 0),
    V1_0_2_0 => (1, 0, 2, 0),
    V1_1_0_0 => (1, 1, 0, 0),
    V1_1_1_0 => (1, 1, 1, 0),
    V2_0_0_0 => (2, 0, 0, 0),
    V2_0_1_0 => (2, 0, 1, 0),
    V2_1_0_0 => (2, 1, 0, 0),
    V2_1_1_0 => (2, 1, 1, 0),
    V2_2_0_0 => (2, 2, 0, 0),
    V2_2_1_0 => (2, 2, 1, 0),
    V2_2_2_0 => (2, 2, 2, 0),
    V2_3_0_0 => (2, 3, 0, 0),
    V2_3_1_0 => (2, 3, 1, 0),
    V2_4_0_0 => (2, 4, 0, 0),
    V2_4_1_0 => (2, 4, 1, 0),
    V2_5_0_0 => (2, 5, 0, 0),
    V2_5_1_0 => (2, 5, 1, 0),
    V2_6_0_0 => (2, 6, 0, 0),
    V2_6_1_0 => (2, 6, 1, 0),
    V2_6_2_0 => (2, 6, 2, 0),
    V2_7_0_0 => (2, 7, 0, 0),
    V2_7_1_0 => (2, 7, 1, 0),
    V2_8_0_0 => (2, 8, 0, 0),
    V2_8_1_0 => (2, 8, 1, 0),
    V2_8_2_0 => (2, 8, 2, 0),
    V3_0_0_0 => (3, 0, 0, 0),
    V3_0_1_0 => (3, 0, 1, 0),
    V3_0_2_0 => (3, 0, 2, 0),
    V3_1_0_0 => (3, 1, 0, 0),
    V3_1_1_0 => (3, 1, 1, 0),
    V3_1_2_0 => (3, 1, 2, 0),
    V3_2_0_0 => (3, 2, 0, 0),
    V3_2_1_0 => (3, 2, 1, 0),
    V3_2_2_0 => (3, 2, 2, 0),
    V3_2_3_0 => (3, 2, 3, 0),
    V3_3_0_0 => (3, 3, 0, 0),
    V3_3_1_0 => (3, 3, 1, 0),
    V3_3_2_0 => (3, 3, 2, 0),
    V3_4_0_0 => (3, 4, 0, 0),
    V3_4_1_0 => (3, 4, 1, 0),
    V3_5_0_0 => (3, 5, 0, 0),
    V3_5_1_0 => (3, 5, 1, 0),
    V3_6_0_0 => (3, 6, 0, 0),
}

/// Oldest release the codec can talk to.
pub const MIN_KAFKA_VERSION: KafkaVersion = KafkaVersion::V0_8_2_0;

/// Newest release the codec knows about.
pub const MAX_KAFKA_VERSION: KafkaVersion = KafkaVersion::V3_6_0_0;

/// Release assumed when the caller does not configure one.
pub const DEFAULT_KAFKA_VERSION: KafkaVersion = KafkaVersion::V2_1_0_0;

impl KafkaVersion {
    #[inline]
    pub const fn new(major: u16, minor: u16, patch: u16, revision: u16) -> Self {
        KafkaVersion {
            major,
            minor,
            patch,
            revision,
        }
    }

    /// `true` when `self` is the same release as `other` or newer.
    #[inline]
    pub fn is_at_least(self, other: KafkaVersion) -> bool {
        self >= other
    }
}

impl Default for KafkaVersion {
    fn default() -> Self {
        DEFAULT_KAFKA_VERSION
    }
}

impl fmt::Display for KafkaVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.major == 0 {
            write!(
                f,
                "0.{}.{}.{}",
                self.minor, self.patch, self.revision
            )
        } else {
            write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
        }
    }
}

impl FromStr for KafkaVersion {
    type Err = Error;

    /// Parse `0.x.y.z` for pre-1.0 releases and `a.b.c` afterwards.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || Error::Config(format!("invalid Kafka version: {:?}", s));

        let parts = s
            .split('.')
            .map(|part| {
                if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
                    return Err(invalid());
                }
                part.parse::<u16>().map_err(|_| invalid())
            })
            .collect::<Result<Vec<u16>, Error>>()?;

        match parts.as_slice() {
            [0, minor, patch, revision] => Ok(KafkaVersion::new(0, *minor, *patch, *revision)),
            [major, minor, patch] if *major > 0 => Ok(KafkaVersion::new(*major, *minor, *patch, 0)),
            _ => Err(invalid()),
        }
    }
}

impl TryFrom<String> for KafkaVersion {
    type Error = Error;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<KafkaVersion> for String {
    fn from(version: KafkaVersion) -> Self {
        version.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        assert_eq!(KafkaVersion::V0_10_2_0.to_string(), "0.10.2.0");
        assert_eq!(KafkaVersion::V2_3_0_0.to_string(), "2.3.0");
    }

    #[test]
    fn test_parse() {
        assert_eq!(
            "0.11.0.2".parse::<KafkaVersion>().unwrap(),
            KafkaVersion::V0_11_0_2
        );
        assert_eq!(
            "2.8.1".parse::<KafkaVersion>().unwrap(),
            KafkaVersion::V2_8_1_0
        );
    }

    #[test]
    fn test_parse_rejects_malformed() {
        for bad in ["", "2", "2.1", "0.10.2", "2.1.0.0", "a.b.c", "1..0", "-1.0.0", "1.0.0 "] {
            assert!(
                matches!(bad.parse::<KafkaVersion>(), Err(Error::Config(_))),
                "{:?} should not parse",
                bad
            );
        }
    }

    #[test]
    fn test_known_releases_are_ordered_and_round_trip() {
        for pair in KafkaVersion::KNOWN.windows(2) {
            assert!(pair[0] < pair[1], "{} !< {}", pair[0], pair[1]);
        }
        for version in KafkaVersion::KNOWN {
            let parsed: KafkaVersion = version.to_string().parse().unwrap();
            assert_eq!(parsed, *version);
        }
        assert_eq!(KafkaVersion::KNOWN.first(), Some(&MIN_KAFKA_VERSION));
        assert_eq!(KafkaVersion::KNOWN.last(), Some(&MAX_KAFKA_VERSION));
    }

    #[test]
    fn test_is_at_least() {
        assert!(KafkaVersion::V2_4_0_0.is_at_least(KafkaVersion::V2_3_0_0));
        assert!(KafkaVersion::V2_4_0_0.is_at_least(KafkaVersion::V2_4_0_0));
        assert!(!KafkaVersion::V0_11_0_0.is_at_least(KafkaVersion::V1_0_0_0));
    }

    #[test]
    fn test_serde_as_string() {
        let json = serde_json::to_string(&KafkaVersion::V0_10_2_0).unwrap();
        assert_eq!(json, "\"0.10.2.0\"");
        let parsed: KafkaVersion = serde_json::from_str("\"3.6.0\"").unwrap();
        assert_eq!(parsed, KafkaVersion::V3_6_0_0);
        assert!(serde_json::from_str::<KafkaVersion>("\"3.6\"").is_err());
    }
}
