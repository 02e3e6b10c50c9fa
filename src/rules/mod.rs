// Rule catalog: composable policy units.
//
// Every rule projects one policy onto two surfaces that must agree:
// `to_sql` filters rows before they are fetched, `to_replacer` redacts a row
// after it was fetched. Rules are built fresh per request from the request
// arguments and the shared PolicyConfig, and are combined by
// `filtering::composer`.
//
// Parameter names are namespaced by the rule's name so two rules never bind
// the same placeholder. The composer rejects a collision with different
// values.

pub mod account;
pub mod advertisement;
pub mod blocking;
pub mod illegal;
pub mod report;

use std::sync::Arc;

use crate::filtering::engine::{PolicyConfig, SelfExemption};
use crate::filtering::sql::SqlPredicate;
use crate::filtering::strategy::Strategy;
use crate::filtering::types::ContentType;
use crate::models::Subject;
use crate::redact::ReplacementPattern;

pub use account::{ActiveUserRule, BasicUserRule, DeactivatedAccountRule, ShopAccountRule, SystemAccountRule};
pub use advertisement::ExcludeActiveAdvertisementsRule;
pub use blocking::{BlockedByTargetRule, BlockedByViewerRule};
pub use illegal::IllegalContentRule;
pub use report::{ReportThresholdRule, ThresholdMode};

/// A named, self-contained policy unit.
pub trait Rule: Send + Sync {
    /// Stable name, also the prefix of every parameter the rule binds.
    fn name(&self) -> &'static str;

    /// Predicate that keeps only rows this rule allows, for a listing of
    /// `showing`. `None` when the rule does not filter in this context.
    fn to_sql(&self, showing: ContentType) -> Option<SqlPredicate>;

    /// Redaction for one fetched entity, if any.
    fn to_replacer(&self, subject: &Subject<'_>) -> Option<ReplacementPattern>;

    /// Predicate that must hold for an actor to interact with
    /// `target_id` (like, comment, report).
    fn forbid_interactions(&self, _target_id: &str) -> Option<SqlPredicate> {
        None
    }
}

pub type RuleSet = Vec<Box<dyn Rule>>;

/// `<rule>_<field>`, the parameter naming scheme every rule follows.
pub(crate) fn param(rule: &str, field: &str) -> String {
    format!("{rule}_{field}")
}

/// Append `OR <author> = :<rule>_viewer_id` when the owner is exempt.
///
/// The exemption only makes sense for a known viewer. The returned predicate
/// binds the viewer id when the clause was added.
pub(crate) fn with_self_clause(
    rule: &str,
    condition: String,
    showing: ContentType,
    self_exemption: SelfExemption,
    viewer_id: &str,
) -> SqlPredicate {
    if self_exemption == SelfExemption::Allowed && !viewer_id.is_empty() {
        let name = param(rule, "viewer_id");
        SqlPredicate::new(format!(
            "{condition} OR {} = :{name}",
            showing.author_column()
        ))
        .bind(name, viewer_id)
    } else {
        SqlPredicate::new(condition)
    }
}

/// Arguments of a post listing request.
#[derive(Debug, Clone, Copy, Default)]
pub struct ListingRequest<'a> {
    pub viewer_id: &'a str,
    pub severity: Option<&'a str>,
    pub filter_user_id: Option<&'a str>,
    pub filter_post_id: Option<&'a str>,
    /// A title or tag filter was supplied.
    pub has_metadata_filter: bool,
}

/// The exclusions every listing carries, in a given viewing context.
pub fn listing_rules(
    policy: &Arc<PolicyConfig>,
    strategy: Strategy,
    viewer_id: &str,
    severity: Option<&str>,
) -> RuleSet {
    vec![
        Box::new(BlockedByViewerRule::new(viewer_id)),
        Box::new(BlockedByTargetRule::new(viewer_id)),
        Box::new(DeactivatedAccountRule::new(policy.clone(), strategy)),
        Box::new(SystemAccountRule::new(policy.clone(), viewer_id)),
        Box::new(ShopAccountRule::new(policy.clone(), ContentType::User, viewer_id)),
        Box::new(IllegalContentRule::new(policy.clone(), strategy, ContentType::Post)),
        Box::new(ReportThresholdRule::new(
            policy.clone(),
            strategy,
            severity,
            viewer_id,
            ThresholdMode::Dismissals,
        )),
    ]
}

/// Rules for a post listing. Also returns the viewing context picked from
/// the request.
pub fn post_listing_rules(policy: &Arc<PolicyConfig>, request: &ListingRequest<'_>) -> (Strategy, RuleSet) {
    let strategy = Strategy::for_post_listing(
        request.viewer_id,
        request.filter_user_id,
        request.filter_post_id,
        request.has_metadata_filter,
    );
    let mut rules = listing_rules(policy, strategy, request.viewer_id, request.severity);
    rules.push(Box::new(ExcludeActiveAdvertisementsRule::new(request.filter_post_id)));
    if let Some(user_id) = request.filter_user_id {
        rules.push(Box::new(BasicUserRule::new(user_id)));
    }
    (strategy, rules)
}

/// Rules for fetching one profile.
pub fn profile_rules(
    policy: &Arc<PolicyConfig>,
    viewer_id: &str,
    target_user_id: &str,
    severity: Option<&str>,
) -> (Strategy, RuleSet) {
    let strategy = Strategy::for_profile(viewer_id, target_user_id);
    let rules: RuleSet = vec![
        Box::new(ActiveUserRule::new()),
        Box::new(DeactivatedAccountRule::new(policy.clone(), strategy)),
        Box::new(IllegalContentRule::new(policy.clone(), strategy, ContentType::User)),
        Box::new(
            ReportThresholdRule::new(
                policy.clone(),
                strategy,
                severity,
                viewer_id,
                ThresholdMode::VisibilityStatus,
            )
            .with_owner(target_user_id),
        ),
    ];
    (strategy, rules)
}

/// Rules guarding a write against `target` content.
pub fn interaction_rules(policy: &Arc<PolicyConfig>, target: ContentType, actor_id: &str) -> RuleSet {
    vec![
        Box::new(ShopAccountRule::new(policy.clone(), target, actor_id)),
        Box::new(IllegalContentRule::new(policy.clone(), Strategy::HideAll, target)),
    ]
}
