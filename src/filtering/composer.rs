// Rule composer: folds a rule set into one predicate and one redaction.
//
// Predicates are ANDed, each fragment parenthesized, so the result does not
// depend on rule order. Parameters are merged by name: the same name bound
// to the same value is kept once, a different value is a ParameterConflict.
// Redaction picks the most severe pattern any rule asks for, which is also
// independent of rule order.

use std::collections::BTreeMap;

use serde::Serialize;
use tracing::debug;

use super::sql::{SqlPredicate, SqlValue};
use super::types::ContentType;
use crate::error::PolicyError;
use crate::models::Subject;
use crate::redact::ReplacementPattern;
use crate::rules::Rule;

/// A complete WHERE-clause body plus its bound parameters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CombinedPredicate {
    /// `1 = 1` when no rule contributed.
    pub predicate: String,
    pub params: BTreeMap<String, SqlValue>,
}

impl CombinedPredicate {
    fn from_parts(fragments: Vec<String>, params: BTreeMap<String, SqlValue>) -> Self {
        let predicate = if fragments.is_empty() {
            "1 = 1".to_string()
        } else {
            fragments.join(" AND ")
        };
        Self { predicate, params }
    }

    /// AND a caller filter onto an already composed predicate.
    ///
    /// The filter's parameters go through the same conflict check as rule
    /// parameters, so a filter never rebinds a name a rule already bound.
    pub fn and(&mut self, source: &str, predicate: SqlPredicate) -> Result<(), PolicyError> {
        let mut fragments = Vec::new();
        let mut params = self.params.clone();
        merge(&mut fragments, &mut params, source, predicate)?;
        for fragment in fragments {
            self.predicate = format!("{} AND {fragment}", self.predicate);
        }
        self.params = params;
        Ok(())
    }
}

fn merge(
    fragments: &mut Vec<String>,
    params: &mut BTreeMap<String, SqlValue>,
    rule: &str,
    predicate: SqlPredicate,
) -> Result<(), PolicyError> {
    for fragment in predicate.fragments {
        fragments.push(format!("({})", fragment.trim()));
    }
    for (name, value) in predicate.params {
        match params.get(&name) {
            Some(existing) if *existing != value => {
                debug!(rule, param = %name, "Parameter bound twice with different values");
                return Err(PolicyError::ParameterConflict { name });
            }
            Some(_) => {}
            None => {
                params.insert(name, value);
            }
        }
    }
    Ok(())
}

/// AND every rule's predicate for a listing of `showing`.
pub fn combine(rules: &[Box<dyn Rule>], showing: ContentType) -> Result<CombinedPredicate, PolicyError> {
    let mut fragments = Vec::new();
    let mut params = BTreeMap::new();
    for rule in rules {
        if let Some(predicate) = rule.to_sql(showing) {
            merge(&mut fragments, &mut params, rule.name(), predicate)?;
        }
    }
    debug!(
        showing = %showing,
        rules = rules.len(),
        fragments = fragments.len(),
        "Composed listing predicate"
    );
    Ok(CombinedPredicate::from_parts(fragments, params))
}

/// AND every rule's interaction guard for `target_id`. `None` when no rule
/// restricts interactions, in which case the interaction is allowed.
pub fn interaction_guard(rules: &[Box<dyn Rule>], target_id: &str) -> Result<Option<CombinedPredicate>, PolicyError> {
    let mut fragments = Vec::new();
    let mut params = BTreeMap::new();
    for rule in rules {
        if let Some(predicate) = rule.forbid_interactions(target_id) {
            merge(&mut fragments, &mut params, rule.name(), predicate)?;
        }
    }
    if fragments.is_empty() {
        return Ok(None);
    }
    Ok(Some(CombinedPredicate::from_parts(fragments, params)))
}

/// The most severe redaction any rule asks for, `Normal` if none.
pub fn select_replacement(rules: &[Box<dyn Rule>], subject: &Subject<'_>) -> ReplacementPattern {
    let selected = rules
        .iter()
        .filter_map(|rule| rule.to_replacer(subject))
        .max_by_key(ReplacementPattern::precedence)
        .unwrap_or_default();
    if selected != ReplacementPattern::Normal {
        debug!(
            content_type = %subject.content_type(),
            id = subject.id(),
            pattern = %selected,
            "Redacting"
        );
    }
    selected
}
