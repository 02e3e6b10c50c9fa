// Viewer-selectable filtering strictness.
//
// The list is ordered strictest first. Moderation filtering only applies to
// viewers whose preference is the first entry; every other value, including
// an unrecognised one or no preference at all, disables it.

use serde::{Deserialize, Serialize};
use tracing::debug;

pub const DEFAULT_SEVERITY_LEVELS: [&str; 2] = ["MYGRANDMALIKES", "MYGRANDMAHATES"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeverityLevels {
    levels: Vec<String>,
}

impl SeverityLevels {
    pub fn new<I, S>(levels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            levels: levels.into_iter().map(Into::into).collect(),
        }
    }

    /// The strictest level, if any are configured.
    pub fn strictest(&self) -> Option<&str> {
        self.levels.first().map(String::as_str)
    }

    pub fn levels(&self) -> &[String] {
        &self.levels
    }

    /// Position of a level name in the list.
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.levels.iter().position(|l| l == name)
    }

    /// Level name at a position.
    pub fn name_at(&self, index: usize) -> Option<&str> {
        self.levels
            .get(index)
            .map(String::as_str)
            .filter(|s| !s.is_empty())
    }

    /// Whether a viewer's preference turns moderation filtering on.
    pub fn is_strictest(&self, preference: Option<&str>) -> bool {
        let strict = match (preference, self.strictest()) {
            (Some(pref), Some(strictest)) => pref == strictest,
            _ => false,
        };
        if !strict {
            if let Some(pref) = preference {
                if self.index_of(pref).is_none() {
                    debug!(preference = pref, "Unrecognised severity level, filtering disabled");
                }
            }
        }
        strict
    }
}

impl Default for SeverityLevels {
    fn default() -> Self {
        Self::new(DEFAULT_SEVERITY_LEVELS)
    }
}
