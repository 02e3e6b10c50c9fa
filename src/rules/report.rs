// Report threshold rule: content with too many active reports.
//
// The only rule driven by the decision engine's full algorithm, so the only
// one gated on the viewer's severity preference and on the thresholds. The
// SQL it emits and the post-fetch decision it makes compare the same
// counters with the same operators:
//
//   dismissals generation:  fires when reports >= hide AND dismissals < restore
//   status generation:      fires when status = hidden,
//                           or status = normal AND reports >= hide
//
// and the SQL keeps exactly the rows for which the decision does not fire.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::{param, with_self_clause, Rule};
use crate::filtering::engine::{DecisionEngine, DecisionRequest, Evidence, PolicyConfig, SelfExemption};
use crate::filtering::sql::SqlPredicate;
use crate::filtering::strategy::Strategy;
use crate::filtering::types::{Action, ContentType, VisibilityStatus};
use crate::models::Subject;
use crate::redact::ReplacementPattern;

/// Which evidence generation the rule reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ThresholdMode {
    /// Report count against the dismissal count.
    Dismissals,
    /// Report count against the moderation-assigned visibility status.
    VisibilityStatus,
}

#[derive(Debug, Clone)]
pub struct ReportThresholdRule {
    engine: DecisionEngine,
    mode: ThresholdMode,
    viewer_id: String,
    /// Owner of the requested content, when the request is about one owner.
    owner_id: Option<String>,
}

impl ReportThresholdRule {
    pub fn new(
        policy: Arc<PolicyConfig>,
        strategy: Strategy,
        severity: Option<&str>,
        viewer_id: &str,
        mode: ThresholdMode,
    ) -> Self {
        Self {
            engine: DecisionEngine::new(policy, strategy, severity),
            mode,
            viewer_id: viewer_id.to_string(),
            owner_id: None,
        }
    }

    pub fn with_owner(mut self, owner_id: &str) -> Self {
        self.owner_id = Some(owner_id.to_string());
        self
    }

    pub fn with_self_exemption(mut self, self_exemption: SelfExemption) -> Self {
        self.engine = self.engine.with_self_exemption(self_exemption);
        self
    }

    fn evidence(&self, subject: &Subject<'_>) -> Evidence {
        match self.mode {
            ThresholdMode::Dismissals => Evidence::Dismissals {
                reports: subject.reports(),
                dismissals: subject.dismissals(),
            },
            ThresholdMode::VisibilityStatus => Evidence::VisibilityStatus {
                reports: subject.reports(),
                status: subject.visibility_status(),
            },
        }
    }

    /// The engine's decision for one fetched entity.
    pub fn decide(&self, subject: &Subject<'_>) -> Action {
        let showing = subject.content_type();
        self.engine.resolve(&DecisionRequest {
            target: showing,
            showing,
            evidence: self.evidence(subject),
            viewer_id: Some(self.viewer_id.as_str()),
            owner_id: Some(subject.owner_id()),
        })
    }
}

impl Rule for ReportThresholdRule {
    fn name(&self) -> &'static str {
        "report_threshold"
    }

    fn to_sql(&self, showing: ContentType) -> Option<SqlPredicate> {
        let action = self.engine.resolve(&DecisionRequest {
            target: showing,
            showing,
            evidence: Evidence::Aggregate,
            viewer_id: Some(self.viewer_id.as_str()),
            owner_id: self.owner_id.as_deref(),
        });
        if action != Action::HideContent {
            return None;
        }
        let thresholds = self.engine.policy().thresholds.get(showing)?;

        let info = showing.info_alias();
        let row = showing.row_alias();
        let hide = param(self.name(), &format!("{showing}_reports_to_hide"));
        let restore = param(self.name(), &format!("{showing}_dismissals_to_restore"));
        let condition = match self.mode {
            ThresholdMode::Dismissals => format!(
                "(COALESCE({info}.reports, 0) < :{hide} \
                 OR COALESCE({info}.dismissals, 0) >= :{restore})"
            ),
            ThresholdMode::VisibilityStatus => format!(
                "NOT ((COALESCE({info}.reports, 0) >= :{hide} AND {row}.visibility_status = '{}') \
                 OR {row}.visibility_status = '{}')",
                VisibilityStatus::Normal,
                VisibilityStatus::Hidden
            ),
        };

        let mut predicate = with_self_clause(
            self.name(),
            condition,
            showing,
            self.engine.self_exemption(),
            &self.viewer_id,
        )
        .bind(hide, thresholds.reports_to_hide);
        if self.mode == ThresholdMode::Dismissals {
            predicate = predicate.bind(restore, thresholds.dismissals_to_restore);
        }
        Some(predicate)
    }

    fn to_replacer(&self, subject: &Subject<'_>) -> Option<ReplacementPattern> {
        match self.decide(subject) {
            Action::ReplaceWithPlaceholder => Some(ReplacementPattern::Hidden),
            Action::None | Action::HideContent => None,
        }
    }
}
