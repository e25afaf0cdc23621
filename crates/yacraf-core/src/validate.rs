//! Validator: multiplicity rules of the YACRAF metamodel.
//!
//! Violations are collected as diagnostics, never raised as errors; the caller decides whether
//! an invalid model is rendered.

use crate::entities::{EntityId, EntityKind};
use crate::model::YacrafModel;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationOptions {
    /// Every attack tree root must have an abuse case.
    pub require_root_abuse_case: bool,
    /// The whole model must contain exactly one attacker.
    pub single_attacker: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "issue", rename_all = "snake_case")]
pub enum Issue {
    MissingAbuseCases,
    MissingAttackEvents,
    MissingActor,
    MissingAttacker,
    MissingLossEvents,
    RootWithoutAbuseCase,
    AttackerCount { found: usize },
}

impl fmt::Display for Issue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Issue::MissingAbuseCases => f.write_str("needs at least one abuse case"),
            Issue::MissingAttackEvents => f.write_str("needs at least one attack event"),
            Issue::MissingActor => f.write_str("needs an actor"),
            Issue::MissingAttacker => f.write_str("needs an attacker"),
            Issue::MissingLossEvents => f.write_str("needs at least one loss event"),
            Issue::RootWithoutAbuseCase => {
                f.write_str("attack tree root needs an associated abuse case")
            }
            Issue::AttackerCount { found } => {
                write!(f, "model must contain exactly one attacker, found {found}")
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub kind: EntityKind,
    /// Absent for model-wide rules.
    pub id: Option<EntityId>,
    #[serde(flatten)]
    pub issue: Issue,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.id {
            Some(id) => write!(f, "{} {}: {}", self.kind, id, self.issue),
            None => write!(f, "{}: {}", self.kind, self.issue),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ValidationReport {
    pub diagnostics: Vec<Diagnostic>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.diagnostics.is_empty()
    }

    pub fn for_entity(&self, kind: EntityKind, id: EntityId) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics
            .iter()
            .filter(move |d| d.kind == kind && d.id == Some(id))
    }

    fn push(&mut self, kind: EntityKind, id: Option<EntityId>, issue: Issue) {
        self.diagnostics.push(Diagnostic { kind, id, issue });
    }
}

impl fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_valid() {
            return f.write_str("model is valid");
        }
        writeln!(f, "model is invalid ({} issue(s)):", self.diagnostics.len())?;
        for d in &self.diagnostics {
            writeln!(f, "  - {d}")?;
        }
        Ok(())
    }
}

pub fn is_valid_loss_event(model: &YacrafModel, id: EntityId) -> bool {
    loss_event_issues(model, id).is_empty()
}

pub fn is_valid_abuse_case(model: &YacrafModel, id: EntityId) -> bool {
    abuse_case_issues(model, id).is_empty()
}

pub fn is_valid_attacker(model: &YacrafModel, id: EntityId) -> bool {
    attacker_issues(model, id).is_empty()
}

fn loss_event_issues(model: &YacrafModel, id: EntityId) -> Vec<Issue> {
    let mut issues = Vec::new();
    let links = model.loss_event_links(id);
    if links.is_none_or(|l| l.abuse_cases.is_empty()) {
        issues.push(Issue::MissingAbuseCases);
    }
    if links.is_none_or(|l| l.attack_events.is_empty()) {
        issues.push(Issue::MissingAttackEvents);
    }
    if links.is_none_or(|l| l.actor.is_none()) {
        issues.push(Issue::MissingActor);
    }
    issues
}

fn abuse_case_issues(model: &YacrafModel, id: EntityId) -> Vec<Issue> {
    let mut issues = Vec::new();
    let links = model.abuse_case_links(id);
    if links.is_none_or(|l| l.attacker.is_none()) {
        issues.push(Issue::MissingAttacker);
    }
    if links.is_none_or(|l| l.loss_events.is_empty()) {
        issues.push(Issue::MissingLossEvents);
    }
    if links.is_none_or(|l| l.attack_events.is_empty()) {
        issues.push(Issue::MissingAttackEvents);
    }
    issues
}

fn attacker_issues(model: &YacrafModel, id: EntityId) -> Vec<Issue> {
    match model.attacker_links(id) {
        Some(l) if !l.abuse_cases.is_empty() => Vec::new(),
        _ => vec![Issue::MissingAbuseCases],
    }
}

/// Checks every record; the overall result is the conjunction of all rules.
pub fn validate(model: &YacrafModel, options: &ValidationOptions) -> ValidationReport {
    let mut report = ValidationReport::default();
    let doc = model.document();

    // Attack events, defenses and actors carry no structural multiplicity rule of their own.
    if options.require_root_abuse_case {
        for root in model.tree_roots() {
            let has_abuse_case = model
                .attack_event_links(root.id)
                .is_some_and(|l| l.abuse_case.is_some());
            if !has_abuse_case {
                report.push(
                    EntityKind::AttackEvent,
                    Some(root.id),
                    Issue::RootWithoutAbuseCase,
                );
            }
        }
    }

    for &id in doc.loss_events.keys() {
        for issue in loss_event_issues(model, id) {
            report.push(EntityKind::LossEvent, Some(id), issue);
        }
    }
    for &id in doc.abuse_cases.keys() {
        for issue in abuse_case_issues(model, id) {
            report.push(EntityKind::AbuseCase, Some(id), issue);
        }
    }
    for &id in doc.attackers.keys() {
        for issue in attacker_issues(model, id) {
            report.push(EntityKind::Attacker, Some(id), issue);
        }
    }

    if options.single_attacker && doc.attackers.len() != 1 {
        report.push(
            EntityKind::Attacker,
            None,
            Issue::AttackerCount {
                found: doc.attackers.len(),
            },
        );
    }

    for d in &report.diagnostics {
        tracing::warn!(kind = %d.kind, id = ?d.id, "validation: {}", d.issue);
    }
    report
}
