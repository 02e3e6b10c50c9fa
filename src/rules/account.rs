// Account-level rules: lifecycle status and roles of the content's author.

use std::sync::Arc;

use tracing::debug;

use super::{param, with_self_clause, Rule};
use crate::filtering::engine::{DecisionEngine, PolicyConfig, SelfExemption};
use crate::filtering::sql::SqlPredicate;
use crate::filtering::strategy::Strategy;
use crate::filtering::types::{roles, AccountStatus, Action, ContentType};
use crate::models::Subject;
use crate::redact::ReplacementPattern;

/// Profiles of deleted accounts are shown as deleted.
///
/// Deleted accounts are not filtered out of queries: a lookup still returns
/// the row so the client can render "deleted account" in place.
#[derive(Debug, Clone, Default)]
pub struct ActiveUserRule;

impl ActiveUserRule {
    pub fn new() -> Self {
        Self
    }
}

impl Rule for ActiveUserRule {
    fn name(&self) -> &'static str {
        "active_user"
    }

    fn to_sql(&self, _showing: ContentType) -> Option<SqlPredicate> {
        None
    }

    fn to_replacer(&self, subject: &Subject<'_>) -> Option<ReplacementPattern> {
        let profile = subject.as_profile()?;
        (profile.status == AccountStatus::Deleted).then_some(ReplacementPattern::Deleted)
    }
}

/// The bound user must be a verified account with an ordinary role.
///
/// Used when a listing is scoped to one user: nothing is returned for
/// unverified, system or shop accounts.
#[derive(Debug, Clone)]
pub struct BasicUserRule {
    user_id: String,
}

impl BasicUserRule {
    pub fn new(user_id: &str) -> Self {
        Self {
            user_id: user_id.to_string(),
        }
    }
}

impl Rule for BasicUserRule {
    fn name(&self) -> &'static str {
        "basic_user"
    }

    fn to_sql(&self, _showing: ContentType) -> Option<SqlPredicate> {
        let name = param(self.name(), "user_id");
        let sql = format!(
            "EXISTS (SELECT 1 FROM users basic_user_users \
             WHERE basic_user_users.uid = :{name} \
             AND basic_user_users.roles_mask IN ({}) \
             AND basic_user_users.verified = 1)",
            roles::ordinary_sql_list()
        );
        Some(SqlPredicate::new(sql).bind(name, self.user_id.as_str()))
    }

    fn to_replacer(&self, _subject: &Subject<'_>) -> Option<ReplacementPattern> {
        None
    }
}

/// Content whose author's account is not active.
///
/// Hiding contexts drop the rows; placeholder contexts keep the profile and
/// show it as deleted.
#[derive(Debug, Clone)]
pub struct DeactivatedAccountRule {
    engine: DecisionEngine,
}

impl DeactivatedAccountRule {
    pub fn new(policy: Arc<PolicyConfig>, strategy: Strategy) -> Self {
        Self {
            engine: DecisionEngine::new(policy, strategy, None),
        }
    }
}

impl Rule for DeactivatedAccountRule {
    fn name(&self) -> &'static str {
        "deactivated_account"
    }

    fn to_sql(&self, showing: ContentType) -> Option<SqlPredicate> {
        if self.engine.baseline(ContentType::User, showing) != Action::HideContent {
            return None;
        }
        Some(SqlPredicate::new(format!(
            "EXISTS (SELECT 1 FROM users deactivated_account_users \
             WHERE deactivated_account_users.uid = {} \
             AND deactivated_account_users.status = {})",
            showing.author_column(),
            AccountStatus::Normal.code()
        )))
    }

    fn to_replacer(&self, subject: &Subject<'_>) -> Option<ReplacementPattern> {
        if self.engine.baseline(ContentType::User, subject.content_type()) != Action::ReplaceWithPlaceholder {
            return None;
        }
        let profile = subject.as_profile()?;
        if profile.status == AccountStatus::Normal {
            return None;
        }
        debug!(uid = %profile.uid, status = ?profile.status, "Inactive account shown as deleted");
        Some(ReplacementPattern::Deleted)
    }
}

/// Content authored by system accounts, or by anyone outside the ordinary
/// verified roles. Always hidden, in every context.
#[derive(Debug, Clone)]
pub struct SystemAccountRule {
    engine: DecisionEngine,
    viewer_id: String,
}

impl SystemAccountRule {
    pub fn new(policy: Arc<PolicyConfig>, viewer_id: &str) -> Self {
        Self {
            engine: DecisionEngine::new(policy, Strategy::HideAll, None),
            viewer_id: viewer_id.to_string(),
        }
    }

    pub fn with_self_exemption(mut self, self_exemption: SelfExemption) -> Self {
        self.engine = self.engine.with_self_exemption(self_exemption);
        self
    }
}

impl Rule for SystemAccountRule {
    fn name(&self) -> &'static str {
        "system_account"
    }

    fn to_sql(&self, showing: ContentType) -> Option<SqlPredicate> {
        if self.engine.baseline(ContentType::User, showing) != Action::HideContent {
            return None;
        }
        let condition = format!(
            "EXISTS (SELECT 1 FROM users system_account_users \
             WHERE system_account_users.uid = {} \
             AND system_account_users.roles_mask IN ({}) \
             AND system_account_users.verified = 1)",
            showing.author_column(),
            roles::ordinary_sql_list()
        );
        Some(with_self_clause(
            self.name(),
            condition,
            showing,
            self.engine.self_exemption(),
            &self.viewer_id,
        ))
    }

    fn to_replacer(&self, _subject: &Subject<'_>) -> Option<ReplacementPattern> {
        None
    }
}

/// Shop accounts and their posts stay out of ordinary listings, and
/// ordinary members cannot interact with them.
///
/// Comments written by shops are left alone.
#[derive(Debug, Clone)]
pub struct ShopAccountRule {
    engine: DecisionEngine,
    target: ContentType,
    viewer_id: String,
}

impl ShopAccountRule {
    pub fn new(policy: Arc<PolicyConfig>, target: ContentType, viewer_id: &str) -> Self {
        Self {
            engine: DecisionEngine::new(policy, Strategy::HideAll, None),
            target,
            viewer_id: viewer_id.to_string(),
        }
    }

    pub fn with_self_exemption(mut self, self_exemption: SelfExemption) -> Self {
        self.engine = self.engine.with_self_exemption(self_exemption);
        self
    }
}

impl Rule for ShopAccountRule {
    fn name(&self) -> &'static str {
        "shop_account"
    }

    fn to_sql(&self, showing: ContentType) -> Option<SqlPredicate> {
        if self.engine.baseline(self.target, showing) != Action::HideContent {
            return None;
        }
        if showing == ContentType::Comment {
            return None;
        }
        let condition = format!(
            "EXISTS (SELECT 1 FROM users shop_account_users \
             WHERE shop_account_users.uid = {} \
             AND shop_account_users.roles_mask != {})",
            showing.author_column(),
            roles::SHOP
        );
        Some(with_self_clause(
            self.name(),
            condition,
            showing,
            self.engine.self_exemption(),
            &self.viewer_id,
        ))
    }

    fn to_replacer(&self, _subject: &Subject<'_>) -> Option<ReplacementPattern> {
        None
    }

    fn forbid_interactions(&self, target_id: &str) -> Option<SqlPredicate> {
        let name = param(self.name(), "target_id");
        let sql = match self.target {
            ContentType::User => format!(
                "EXISTS (SELECT 1 FROM users shop_account_users \
                 WHERE shop_account_users.uid = :{name} \
                 AND shop_account_users.roles_mask != {})",
                roles::SHOP
            ),
            ContentType::Post => format!(
                "EXISTS (SELECT 1 FROM posts shop_account_posts \
                 JOIN users shop_account_users ON shop_account_users.uid = shop_account_posts.userid \
                 WHERE shop_account_posts.postid = :{name} \
                 AND shop_account_users.roles_mask != {})",
                roles::SHOP
            ),
            ContentType::Comment => return None,
        };
        Some(SqlPredicate::new(sql).bind(name, target_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filtering::sql::SqlValue;
    use crate::filtering::types::VisibilityStatus;
    use crate::models::Profile;

    fn profile(status: AccountStatus) -> Profile {
        Profile {
            uid: "u1".into(),
            username: "alice".into(),
            biography: None,
            img: None,
            status,
            roles_mask: roles::USER,
            verified: true,
            visibility_status: VisibilityStatus::Normal,
            reports: 0,
            dismissals: 0,
        }
    }

    #[test]
    fn test_deactivated_rule_follows_strategy() {
        let policy = Arc::new(PolicyConfig::default());
        let feed = DeactivatedAccountRule::new(policy.clone(), Strategy::Feed);
        assert!(feed.to_sql(ContentType::Post).is_some());
        assert!(feed.to_sql(ContentType::User).is_none());

        let banned = profile(AccountStatus::Banned);
        assert_eq!(
            feed.to_replacer(&Subject::Profile(&banned)),
            Some(ReplacementPattern::Deleted)
        );
        let active = profile(AccountStatus::Normal);
        assert_eq!(feed.to_replacer(&Subject::Profile(&active)), None);
    }

    #[test]
    fn test_shop_rule_skips_comments() {
        let rule = ShopAccountRule::new(Arc::new(PolicyConfig::default()), ContentType::Post, "me");
        assert!(rule.to_sql(ContentType::Post).is_some());
        assert!(rule.to_sql(ContentType::Comment).is_none());
        let guard = rule.forbid_interactions("p1").unwrap();
        assert_eq!(guard.params["shop_account_target_id"], SqlValue::from("p1"));
    }

    #[test]
    fn test_hide_all_rules_have_no_self_clause_by_default() {
        let rule = SystemAccountRule::new(Arc::new(PolicyConfig::default()), "me");
        let sql = rule.to_sql(ContentType::Post).unwrap();
        assert!(sql.params.is_empty());

        let exempt = rule.with_self_exemption(SelfExemption::Allowed);
        let sql = exempt.to_sql(ContentType::Post).unwrap();
        assert!(sql.params.contains_key("system_account_viewer_id"));
    }
}
