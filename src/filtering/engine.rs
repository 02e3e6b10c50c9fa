// Decision engine: combines a strategy, the threshold table, the viewer's
// severity preference and (optionally) one item's live counters into a
// single action.
//
// Two call modes:
// - aggregate (no counters): used to build SQL before any row is fetched.
//   The strategy says what kind of action applies; the SQL text encodes the
//   threshold comparison against each row's stored counters.
// - with counters: used after fetching, on one concrete entity. Comes in two
//   evidence generations (dismissal counts, visibility status) which are kept
//   as separate variants and never merged.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::trace;

use super::severity::SeverityLevels;
use super::strategy::Strategy;
use super::thresholds::ThresholdTable;
use super::types::{Action, ContentType, VisibilityStatus};

/// Read-only moderation configuration shared by every request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyConfig {
    pub severity: SeverityLevels,
    pub thresholds: ThresholdTable,
}

impl PolicyConfig {
    pub fn new(severity: SeverityLevels, thresholds: ThresholdTable) -> Self {
        Self {
            severity,
            thresholds,
        }
    }
}

/// Whether an owner viewing their own content bypasses the decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SelfExemption {
    Allowed,
    Forbidden,
}

impl SelfExemption {
    /// The exemption a rule gets unless it says otherwise: forbidden for
    /// hide-all rules (shop and system accounts stay hidden even from
    /// themselves), allowed for every other context.
    pub fn default_for(strategy: Strategy) -> Self {
        match strategy {
            Strategy::HideAll => SelfExemption::Forbidden,
            _ => SelfExemption::Allowed,
        }
    }
}

/// What the engine knows about the item being decided on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Evidence {
    /// No per-item counters: the caller is building a query predicate.
    Aggregate,
    /// Report count and number of moderation dismissals.
    Dismissals { reports: i64, dismissals: i64 },
    /// Report count and the moderation-assigned visibility status.
    VisibilityStatus {
        reports: i64,
        status: VisibilityStatus,
    },
}

impl Evidence {
    /// Map optional counters onto the dismissal generation: both absent is
    /// aggregate mode, a single missing counter counts as zero.
    pub fn from_counters(reports: Option<i64>, dismissals: Option<i64>) -> Self {
        match (reports, dismissals) {
            (None, None) => Evidence::Aggregate,
            (reports, dismissals) => Evidence::Dismissals {
                reports: reports.unwrap_or(0),
                dismissals: dismissals.unwrap_or(0),
            },
        }
    }
}

/// One decision request.
#[derive(Debug, Clone, Copy)]
pub struct DecisionRequest<'a> {
    /// The type that governs the rule (e.g. the author's user row).
    pub target: ContentType,
    /// The type actually being returned (e.g. a post).
    pub showing: ContentType,
    pub evidence: Evidence,
    pub viewer_id: Option<&'a str>,
    pub owner_id: Option<&'a str>,
}

#[derive(Debug, Clone)]
pub struct DecisionEngine {
    policy: Arc<PolicyConfig>,
    strategy: Strategy,
    severity_preference: Option<String>,
    self_exemption: SelfExemption,
}

impl DecisionEngine {
    pub fn new(policy: Arc<PolicyConfig>, strategy: Strategy, severity_preference: Option<&str>) -> Self {
        Self {
            policy,
            strategy,
            severity_preference: severity_preference.map(str::to_string),
            self_exemption: SelfExemption::default_for(strategy),
        }
    }

    pub fn with_self_exemption(mut self, self_exemption: SelfExemption) -> Self {
        self.self_exemption = self_exemption;
        self
    }

    pub fn strategy(&self) -> Strategy {
        self.strategy
    }

    pub fn self_exemption(&self) -> SelfExemption {
        self.self_exemption
    }

    pub fn policy(&self) -> &PolicyConfig {
        &self.policy
    }

    /// Whether this viewer opted into moderation filtering.
    pub fn filtering_enabled(&self) -> bool {
        self.policy
            .severity
            .is_strictest(self.severity_preference.as_deref())
    }

    /// Whether the viewer is the owner and that exempts them.
    pub fn is_exempt(&self, viewer_id: Option<&str>, owner_id: Option<&str>) -> bool {
        if self.self_exemption == SelfExemption::Forbidden {
            return false;
        }
        match (viewer_id, owner_id) {
            (Some(viewer), Some(owner)) => !viewer.is_empty() && viewer == owner,
            _ => false,
        }
    }

    /// The strategy's action with no severity, owner or threshold checks.
    ///
    /// Structural rules (blocked, deactivated, system, shop, illegal) are not
    /// report-driven and only need to know what kind of action their context
    /// implies.
    pub fn baseline(&self, target: ContentType, showing: ContentType) -> Action {
        self.strategy.action(target, showing)
    }

    /// Full report-threshold decision.
    pub fn resolve(&self, request: &DecisionRequest<'_>) -> Action {
        if !self.filtering_enabled() {
            return Action::None;
        }

        if self.is_exempt(request.viewer_id, request.owner_id) {
            trace!(showing = %request.showing, "Owner views own content, exempt");
            return Action::None;
        }

        let Some(thresholds) = self.policy.thresholds.get(request.showing) else {
            return Action::None;
        };

        let fires = match request.evidence {
            Evidence::Aggregate => true,
            Evidence::Dismissals {
                reports,
                dismissals,
            } => {
                reports >= thresholds.reports_to_hide
                    && dismissals < thresholds.dismissals_to_restore
            }
            Evidence::VisibilityStatus { reports, status } => match status {
                VisibilityStatus::Hidden => true,
                VisibilityStatus::Normal => reports >= thresholds.reports_to_hide,
                VisibilityStatus::Illegal | VisibilityStatus::Unrecognized => false,
            },
        };

        if !fires {
            return Action::None;
        }

        let action = self.strategy.action(request.target, request.showing);
        trace!(
            strategy = %self.strategy,
            target = %request.target,
            showing = %request.showing,
            action = %action,
            "Threshold decision"
        );
        action
    }
}
