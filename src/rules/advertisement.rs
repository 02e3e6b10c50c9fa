// Posts currently booked as advertisements are served in the ad slot, so
// regular post listings leave them out. A lookup of one specific post still
// returns it.

use super::Rule;
use crate::filtering::sql::SqlPredicate;
use crate::filtering::types::ContentType;
use crate::models::Subject;
use crate::redact::ReplacementPattern;

#[derive(Debug, Clone, Default)]
pub struct ExcludeActiveAdvertisementsRule {
    requested_post_id: Option<String>,
}

impl ExcludeActiveAdvertisementsRule {
    pub fn new(requested_post_id: Option<&str>) -> Self {
        Self {
            requested_post_id: requested_post_id.map(str::to_string),
        }
    }
}

impl Rule for ExcludeActiveAdvertisementsRule {
    fn name(&self) -> &'static str {
        "exclude_active_ads"
    }

    fn to_sql(&self, showing: ContentType) -> Option<SqlPredicate> {
        if showing != ContentType::Post || self.requested_post_id.is_some() {
            return None;
        }
        Some(SqlPredicate::new(
            "NOT EXISTS (SELECT 1 FROM advertisements exclude_active_ads_ads \
             WHERE exclude_active_ads_ads.postid = p.postid \
             AND exclude_active_ads_ads.timestart <= datetime('now') \
             AND exclude_active_ads_ads.timeend > datetime('now'))",
        ))
    }

    fn to_replacer(&self, _subject: &Subject<'_>) -> Option<ReplacementPattern> {
        None
    }
}
