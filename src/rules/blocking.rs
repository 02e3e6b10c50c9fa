// Block-list rules. Blocks are absolute: they do not depend on the viewing
// context or the viewer's severity preference.

use super::{param, Rule};
use crate::filtering::sql::SqlPredicate;
use crate::filtering::types::ContentType;
use crate::models::Subject;
use crate::redact::ReplacementPattern;

/// Hide content whose author the viewer has blocked.
#[derive(Debug, Clone)]
pub struct BlockedByViewerRule {
    viewer_id: String,
}

impl BlockedByViewerRule {
    pub fn new(viewer_id: &str) -> Self {
        Self {
            viewer_id: viewer_id.to_string(),
        }
    }
}

impl Rule for BlockedByViewerRule {
    fn name(&self) -> &'static str {
        "blocked_by_viewer"
    }

    fn to_sql(&self, showing: ContentType) -> Option<SqlPredicate> {
        if self.viewer_id.is_empty() {
            return None;
        }
        let name = param(self.name(), "viewer_id");
        let sql = format!(
            "NOT EXISTS (SELECT 1 FROM user_block_user blocked_by_viewer_blocks \
             WHERE blocked_by_viewer_blocks.blockerid = :{name} \
             AND blocked_by_viewer_blocks.blockedid = {})",
            showing.author_column()
        );
        Some(SqlPredicate::new(sql).bind(name, self.viewer_id.as_str()))
    }

    fn to_replacer(&self, _subject: &Subject<'_>) -> Option<ReplacementPattern> {
        None
    }
}

/// Hide content whose author has blocked the viewer.
#[derive(Debug, Clone)]
pub struct BlockedByTargetRule {
    viewer_id: String,
}

impl BlockedByTargetRule {
    pub fn new(viewer_id: &str) -> Self {
        Self {
            viewer_id: viewer_id.to_string(),
        }
    }
}

impl Rule for BlockedByTargetRule {
    fn name(&self) -> &'static str {
        "blocked_by_target"
    }

    fn to_sql(&self, showing: ContentType) -> Option<SqlPredicate> {
        if self.viewer_id.is_empty() {
            return None;
        }
        let name = param(self.name(), "viewer_id");
        let sql = format!(
            "NOT EXISTS (SELECT 1 FROM user_block_user blocked_by_target_blocks \
             WHERE blocked_by_target_blocks.blockerid = {} \
             AND blocked_by_target_blocks.blockedid = :{name})",
            showing.author_column()
        );
        Some(SqlPredicate::new(sql).bind(name, self.viewer_id.as_str()))
    }

    fn to_replacer(&self, _subject: &Subject<'_>) -> Option<ReplacementPattern> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_anonymous_viewer_has_no_blocks() {
        assert!(BlockedByViewerRule::new("").to_sql(ContentType::Post).is_none());
        assert!(BlockedByTargetRule::new("").to_sql(ContentType::Post).is_none());
    }

    #[test]
    fn test_block_direction() {
        let sql = BlockedByTargetRule::new("me").to_sql(ContentType::Comment).unwrap();
        assert!(sql.fragments[0].contains("blockerid = c.userid"));
        assert!(sql.fragments[0].contains("blockedid = :blocked_by_target_viewer_id"));
    }
}
