// Per-content-type report and dismissal thresholds.
//
// Loaded once at startup and shared read-only. A content type whose entry is
// missing or non-positive has no usable thresholds: the decision engine then
// returns no action for it (moderation fails open).

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::types::ContentType;

/// Default number of active reports that hides content.
pub const DEFAULT_REPORTS_TO_HIDE: i64 = 5;

/// Default number of moderation dismissals that restores content.
pub const DEFAULT_DISMISSALS_TO_RESTORE: i64 = 3;

/// Validated thresholds for one content type. Both values are positive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Thresholds {
    pub reports_to_hide: i64,
    pub dismissals_to_restore: i64,
}

/// A raw configured entry. Either value may be absent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThresholdEntry {
    pub reports_to_hide: Option<i64>,
    pub dismissals_to_restore: Option<i64>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThresholdTable {
    entries: BTreeMap<ContentType, ThresholdEntry>,
}

impl ThresholdTable {
    /// A table with no entries: every lookup fails open.
    pub fn empty() -> Self {
        Self::default()
    }

    /// The same thresholds for every content type.
    pub fn uniform(reports_to_hide: i64, dismissals_to_restore: i64) -> Self {
        let mut table = Self::empty();
        for content_type in ContentType::ALL {
            table.set(content_type, Some(reports_to_hide), Some(dismissals_to_restore));
        }
        table
    }

    /// Builder form of [`ThresholdTable::set`] with both values present.
    pub fn with(mut self, content_type: ContentType, reports_to_hide: i64, dismissals_to_restore: i64) -> Self {
        self.set(content_type, Some(reports_to_hide), Some(dismissals_to_restore));
        self
    }

    pub fn set(
        &mut self,
        content_type: ContentType,
        reports_to_hide: Option<i64>,
        dismissals_to_restore: Option<i64>,
    ) {
        self.entries.insert(
            content_type,
            ThresholdEntry {
                reports_to_hide,
                dismissals_to_restore,
            },
        );
    }

    /// Thresholds for `content_type`, or `None` if either value is missing
    /// or not positive.
    pub fn get(&self, content_type: ContentType) -> Option<Thresholds> {
        let entry = self.entries.get(&content_type);
        let thresholds = entry.and_then(|e| match (e.reports_to_hide, e.dismissals_to_restore) {
            (Some(reports), Some(dismissals)) if reports > 0 && dismissals > 0 => Some(Thresholds {
                reports_to_hide: reports,
                dismissals_to_restore: dismissals,
            }),
            _ => None,
        });
        if thresholds.is_none() {
            debug!(content_type = %content_type, ?entry, "No usable thresholds, failing open");
        }
        thresholds
    }
}
