//! Non-fatal encode diagnostics.
//!
//! When a message holds a non-default value in a field that its active wire
//! version cannot carry, the field is left out of the encoding and the drop is
//! recorded here. Every record is also emitted as a `tracing` warning so that a
//! host application with a subscriber installed sees it in its logs.

use std::fmt;

use crate::protocol::ApiKey;

/// A field that was omitted from an encoding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DroppedField {
    pub api_key: ApiKey,
    pub version: i16,
    pub field: &'static str,
    pub reason: &'static str,
}

impl fmt::Display for DroppedField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} v{}: {} dropped ({})",
            self.api_key.as_str(),
            self.version,
            self.field,
            self.reason
        )
    }
}

/// Collects [`DroppedField`] records for one encode call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Diagnostics {
    dropped: Vec<DroppedField>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that `field` was not written at `version`.
    pub fn field_dropped(
        &mut self,
        api_key: ApiKey,
        version: i16,
        field: &'static str,
        reason: &'static str,
    ) {
        tracing::warn!(
            api_key = api_key.as_str(),
            version,
            field,
            reason,
            "non-default field dropped by the active protocol version"
        );
        self.dropped.push(DroppedField {
            api_key,
            version,
            field,
            reason,
        });
    }

    /// Record a drop only when `present` holds.
    #[inline]
    pub fn check(
        &mut self,
        present: bool,
        api_key: ApiKey,
        version: i16,
        field: &'static str,
        reason: &'static str,
    ) {
        if present {
            self.field_dropped(api_key, version, field, reason);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.dropped.is_empty()
    }

    pub fn len(&self) -> usize {
        self.dropped.len()
    }

    pub fn dropped(&self) -> &[DroppedField] {
        &self.dropped
    }

    /// Whether a drop of `field` was recorded.
    pub fn contains(&self, field: &str) -> bool {
        self.dropped.iter().any(|d| d.field == field)
    }

    pub fn into_vec(self) -> Vec<DroppedField> {
        self.dropped
    }
}

impl IntoIterator for Diagnostics {
    type Item = DroppedField;
    type IntoIter = std::vec::IntoIter<DroppedField>;

    fn into_iter(self) -> Self::IntoIter {
        self.dropped.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_dropped_records() {
        let mut diagnostics = Diagnostics::new();
        assert!(diagnostics.is_empty());

        diagnostics.field_dropped(ApiKey::OffsetCommit, 0, "generation_id", "requires v1+");
        assert_eq!(diagnostics.len(), 1);
        assert!(diagnostics.contains("generation_id"));
        assert!(!diagnostics.contains("member_id"));

        let dropped = &diagnostics.dropped()[0];
        assert_eq!(dropped.api_key, ApiKey::OffsetCommit);
        assert_eq!(dropped.version, 0);
    }

    #[test]
    fn test_check_only_records_present_values() {
        let mut diagnostics = Diagnostics::new();
        diagnostics.check(false, ApiKey::LeaveGroup, 3, "member_id", "replaced by members");
        assert!(diagnostics.is_empty());
        diagnostics.check(true, ApiKey::LeaveGroup, 3, "member_id", "replaced by members");
        assert_eq!(diagnostics.into_vec().len(), 1);
    }

    #[test]
    fn test_display() {
        let dropped = DroppedField {
            api_key: ApiKey::OffsetFetch,
            version: 1,
            field: "topics",
            reason: "null requires v2+",
        };
        let text = dropped.to_string();
        assert!(text.contains("OffsetFetch"));
        assert!(text.contains("v1"));
        assert!(text.contains("topics"));
    }
}
