// Illegal content: rows moderation flagged as illegal.
//
// Hiding contexts filter them out, placeholder contexts redact them with the
// illegal template. Interactions with illegal content are always refused.

use std::sync::Arc;

use super::{param, Rule};
use crate::filtering::engine::{DecisionEngine, PolicyConfig};
use crate::filtering::sql::SqlPredicate;
use crate::filtering::strategy::Strategy;
use crate::filtering::types::{Action, ContentType, VisibilityStatus};
use crate::models::Subject;
use crate::redact::ReplacementPattern;

#[derive(Debug, Clone)]
pub struct IllegalContentRule {
    engine: DecisionEngine,
    /// Type of the content a write would target.
    target: ContentType,
}

impl IllegalContentRule {
    pub fn new(policy: Arc<PolicyConfig>, strategy: Strategy, target: ContentType) -> Self {
        Self {
            engine: DecisionEngine::new(policy, strategy, None),
            target,
        }
    }
}

impl Rule for IllegalContentRule {
    fn name(&self) -> &'static str {
        "illegal_content"
    }

    fn to_sql(&self, showing: ContentType) -> Option<SqlPredicate> {
        if self.engine.baseline(showing, showing) != Action::HideContent {
            return None;
        }
        Some(SqlPredicate::new(format!(
            "{}.visibility_status != '{}'",
            showing.row_alias(),
            VisibilityStatus::Illegal
        )))
    }

    fn to_replacer(&self, subject: &Subject<'_>) -> Option<ReplacementPattern> {
        let showing = subject.content_type();
        if self.engine.baseline(showing, showing).is_none() {
            return None;
        }
        (subject.visibility_status() == VisibilityStatus::Illegal).then_some(ReplacementPattern::Illegal)
    }

    fn forbid_interactions(&self, target_id: &str) -> Option<SqlPredicate> {
        let name = param(self.name(), "target_id");
        let table = self.target.table();
        let sql = format!(
            "EXISTS (SELECT 1 FROM {table} illegal_content_{table} \
             WHERE illegal_content_{table}.{} = :{name} \
             AND illegal_content_{table}.visibility_status != '{}')",
            self.target.id_field(),
            VisibilityStatus::Illegal
        );
        Some(SqlPredicate::new(sql).bind(name, target_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Comment;

    fn comment(status: VisibilityStatus) -> Comment {
        Comment {
            commentid: "c1".into(),
            postid: "p1".into(),
            userid: "u1".into(),
            content: "hello".into(),
            visibility_status: status,
            reports: 0,
            dismissals: 0,
        }
    }

    #[test]
    fn test_placeholder_context_fetches_and_redacts() {
        let rule = IllegalContentRule::new(Arc::new(PolicyConfig::default()), Strategy::SearchById, ContentType::Comment);
        assert!(rule.to_sql(ContentType::Comment).is_none());
        let flagged = comment(VisibilityStatus::Illegal);
        assert_eq!(
            rule.to_replacer(&Subject::Comment(&flagged)),
            Some(ReplacementPattern::Illegal)
        );
        let clean = comment(VisibilityStatus::Hidden);
        assert_eq!(rule.to_replacer(&Subject::Comment(&clean)), None);
    }

    #[test]
    fn test_hiding_context_filters() {
        let rule = IllegalContentRule::new(Arc::new(PolicyConfig::default()), Strategy::MetaSearch, ContentType::Post);
        let sql = rule.to_sql(ContentType::Post).unwrap();
        assert_eq!(sql.fragments, vec!["p.visibility_status != 'illegal'".to_string()]);
    }

    #[test]
    fn test_interaction_guard_targets_table() {
        let rule = IllegalContentRule::new(Arc::new(PolicyConfig::default()), Strategy::HideAll, ContentType::Comment);
        let guard = rule.forbid_interactions("c9").unwrap();
        assert!(guard.fragments[0].contains("FROM comments illegal_content_comments"));
        assert!(guard.fragments[0].contains("commentid = :illegal_content_target_id"));
    }
}
