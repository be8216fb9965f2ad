//! Retrieval locators and the transcoded-artifact rewrite.
//!
//! A locator has the shape `scheme://authority/seg1/.../segN`. Picker locators
//! carry exactly five path segments, one of which is the [`PICKER_SEGMENT`]
//! marker. The transcoded artifact for an item lives at the same locator with
//! that marker swapped for [`PICKER_TRANSCODED_SEGMENT`].

use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Marker segment present in every picker locator.
pub const PICKER_SEGMENT: &str = "picker";

/// Marker segment that replaces [`PICKER_SEGMENT`] for transcoded artifacts.
pub const PICKER_TRANSCODED_SEGMENT: &str = "picker_transcoded";

/// Number of path segments in a well-formed picker locator.
pub const PICKER_LOCATOR_SEGMENTS: usize = 5;

const SCHEME_SEPARATOR: &str = "://";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LocatorError {
    #[error("Locator has no scheme: {0}")]
    MissingScheme(String),

    #[error("Locator has no authority: {0}")]
    MissingAuthority(String),

    #[error("Locator has an empty path segment: {0}")]
    EmptySegment(String),

    #[error("Locator {locator} has {actual} path segments, expected {expected}")]
    SegmentCount {
        locator: String,
        actual: usize,
        expected: usize,
    },

    #[error("Locator {locator} has {count} '{marker}' segments, expected exactly one")]
    MarkerCount {
        locator: String,
        marker: &'static str,
        count: usize,
    },
}

/// Parsed retrieval locator.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Locator {
    scheme: String,
    authority: String,
    segments: Vec<String>,
}

impl Locator {
    pub fn new(
        scheme: impl Into<String>,
        authority: impl Into<String>,
        segments: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        Self {
            scheme: scheme.into(),
            authority: authority.into(),
            segments: segments.into_iter().map(Into::into).collect(),
        }
    }

    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    pub fn authority(&self) -> &str {
        &self.authority
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// Locator of the transcoded artifact for this item.
    ///
    /// Fails unless the locator has exactly [`PICKER_LOCATOR_SEGMENTS`] segments
    /// and exactly one of them is [`PICKER_SEGMENT`].
    pub fn to_transcoded(&self) -> Result<Locator, LocatorError> {
        if self.segments.len() != PICKER_LOCATOR_SEGMENTS {
            return Err(LocatorError::SegmentCount {
                locator: self.to_string(),
                actual: self.segments.len(),
                expected: PICKER_LOCATOR_SEGMENTS,
            });
        }

        let markers = self
            .segments
            .iter()
            .filter(|segment| segment.as_str() == PICKER_SEGMENT)
            .count();
        if markers != 1 {
            return Err(LocatorError::MarkerCount {
                locator: self.to_string(),
                marker: PICKER_SEGMENT,
                count: markers,
            });
        }

        let segments = self
            .segments
            .iter()
            .map(|segment| {
                if segment == PICKER_SEGMENT {
                    PICKER_TRANSCODED_SEGMENT.to_string()
                } else {
                    segment.clone()
                }
            })
            .collect();

        Ok(Locator {
            scheme: self.scheme.clone(),
            authority: self.authority.clone(),
            segments,
        })
    }
}

impl FromStr for Locator {
    type Err = LocatorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (scheme, rest) = s
            .split_once(SCHEME_SEPARATOR)
            .filter(|(scheme, _)| !scheme.is_empty())
            .ok_or_else(|| LocatorError::MissingScheme(s.to_string()))?;

        let (authority, path) = match rest.split_once('/') {
            Some((authority, path)) => (authority, path),
            None => (rest, ""),
        };
        if authority.is_empty() {
            return Err(LocatorError::MissingAuthority(s.to_string()));
        }

        let mut segments = Vec::new();
        if !path.is_empty() {
            for segment in path.split('/') {
                if segment.is_empty() {
                    return Err(LocatorError::EmptySegment(s.to_string()));
                }
                segments.push(segment.to_string());
            }
        }

        Ok(Locator {
            scheme: scheme.to_string(),
            authority: authority.to_string(),
            segments,
        })
    }
}

impl Display for Locator {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}{}{}", self.scheme, SCHEME_SEPARATOR, self.authority)?;
        for segment in &self.segments {
            write!(f, "/{}", segment)?;
        }
        Ok(())
    }
}

impl TryFrom<String> for Locator {
    type Error = LocatorError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Locator> for String {
    fn from(locator: Locator) -> Self {
        locator.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PICKER_URI: &str =
        "content://media/picker/0/com.android.providers.media.photopicker/media/42";

    #[test]
    fn test_parse_and_display_roundtrip() {
        let locator: Locator = PICKER_URI.parse().unwrap();
        assert_eq!(locator.scheme(), "content");
        assert_eq!(locator.authority(), "media");
        assert_eq!(locator.segments().len(), 5);
        assert_eq!(locator.to_string(), PICKER_URI);
    }

    #[test]
    fn test_rewrite_replaces_only_the_marker() {
        let locator: Locator = PICKER_URI.parse().unwrap();
        let transcoded = locator.to_transcoded().unwrap();

        assert_eq!(
            transcoded.to_string(),
            "content://media/picker_transcoded/0/com.android.providers.media.photopicker/media/42"
        );
        assert_eq!(transcoded.scheme(), locator.scheme());
        assert_eq!(transcoded.authority(), locator.authority());
        for (before, after) in locator.segments().iter().zip(transcoded.segments()) {
            if before == PICKER_SEGMENT {
                assert_eq!(after, PICKER_TRANSCODED_SEGMENT);
            } else {
                assert_eq!(before, after);
            }
        }
    }

    #[test]
    fn test_rewrite_marker_in_any_position() {
        let locator: Locator = "content://media/0/a/picker/b/7".parse().unwrap();
        assert_eq!(
            locator.to_transcoded().unwrap().to_string(),
            "content://media/0/a/picker_transcoded/b/7"
        );
    }

    #[test]
    fn test_rewrite_rejects_wrong_segment_count() {
        let four: Locator = "content://media/picker/0/auth/42".parse().unwrap();
        assert!(matches!(
            four.to_transcoded(),
            Err(LocatorError::SegmentCount { actual: 4, .. })
        ));

        let six: Locator = "content://media/picker/0/auth/media/42/extra"
            .parse()
            .unwrap();
        assert!(matches!(
            six.to_transcoded(),
            Err(LocatorError::SegmentCount { actual: 6, .. })
        ));
    }

    #[test]
    fn test_rewrite_requires_exactly_one_marker() {
        let none: Locator = "content://media/a/0/auth/media/42".parse().unwrap();
        assert!(matches!(
            none.to_transcoded(),
            Err(LocatorError::MarkerCount { count: 0, .. })
        ));

        let two: Locator = "content://media/picker/0/picker/media/42".parse().unwrap();
        assert!(matches!(
            two.to_transcoded(),
            Err(LocatorError::MarkerCount { count: 2, .. })
        ));
    }

    #[test]
    fn test_parse_rejects_malformed() {
        assert!(matches!(
            "media/picker".parse::<Locator>(),
            Err(LocatorError::MissingScheme(_))
        ));
        assert!(matches!(
            "content:///picker".parse::<Locator>(),
            Err(LocatorError::MissingAuthority(_))
        ));
        assert!(matches!(
            "content://media/picker//42".parse::<Locator>(),
            Err(LocatorError::EmptySegment(_))
        ));
    }

    #[test]
    fn test_serializes_as_string() {
        let locator: Locator = PICKER_URI.parse().unwrap();
        let json = serde_json::to_string(&locator).unwrap();
        assert_eq!(json, format!("\"{}\"", PICKER_URI));

        let back: Locator = serde_json::from_str(&json).unwrap();
        assert_eq!(back, locator);
        assert!(serde_json::from_str::<Locator>("\"not a locator\"").is_err());
    }
}
