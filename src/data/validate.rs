//! Load-time checks over a parsed database. Problems that would otherwise
//! only show up as diagnostic lines mid-battle are reported here up front.

use std::fmt;

use crate::combat::engine::{MAX_STRIKES_PER_PHASE, MAX_SYMPHONY_TIMES};
use crate::combat::sets::SetRequirement;
use crate::data::database::Database;
use crate::data::entity::{Bucket, EntityRecord, SetSpec};
use crate::effects::{Action, ActionDescriptor};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ValidationSeverity {
    Error,
    Warning,
    Info,
}

impl ValidationSeverity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Error => "error",
            Self::Warning => "warning",
            Self::Info => "info",
        }
    }
}

impl fmt::Display for ValidationSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationDiagnostic {
    pub severity: ValidationSeverity,
    pub context: String,
    pub message: String,
}

impl fmt::Display for ValidationDiagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.severity, self.context, self.message)
    }
}

#[derive(Debug, Clone, Default)]
pub struct ValidationReport {
    pub diagnostics: Vec<ValidationDiagnostic>,
}

impl ValidationReport {
    pub fn push(
        &mut self,
        severity: ValidationSeverity,
        context: impl Into<String>,
        message: impl Into<String>,
    ) {
        self.diagnostics.push(ValidationDiagnostic {
            severity,
            context: context.into(),
            message: message.into(),
        });
    }

    pub fn has_errors(&self) -> bool {
        self.diagnostics
            .iter()
            .any(|diag| diag.severity == ValidationSeverity::Error)
    }

    pub fn count(&self, severity: ValidationSeverity) -> usize {
        self.diagnostics
            .iter()
            .filter(|diag| diag.severity == severity)
            .count()
    }
}

fn check_action(report: &mut ValidationReport, context: &str, action: &Action) {
    match action {
        Action::AddCountdown { value, actions, .. } => {
            if value.turns == Some(0) {
                report.push(
                    ValidationSeverity::Warning,
                    context,
                    "countdown with 0 turns fires on the next upkeep",
                );
            }
            check_actions(report, context, actions);
        }
        Action::AddExtraStrikes { value } if *value >= MAX_STRIKES_PER_PHASE => report.push(
            ValidationSeverity::Warning,
            context,
            format!(
                "add_extra_strikes value {value} exceeds the cap of {MAX_STRIKES_PER_PHASE} strikes per phase"
            ),
        ),
        Action::TriggerSymphony { times } if *times > MAX_SYMPHONY_TIMES => report.push(
            ValidationSeverity::Warning,
            context,
            format!("trigger_symphony times {times} exceeds the cap of {MAX_SYMPHONY_TIMES}"),
        ),
        _ => {}
    }
}

fn check_actions(report: &mut ValidationReport, context: &str, actions: &[ActionDescriptor]) {
    for (index, descriptor) in actions.iter().enumerate() {
        let context = format!("{context}.actions[{index}]");
        match descriptor {
            ActionDescriptor::Unknown { type_name } => report.push(
                ValidationSeverity::Error,
                context,
                format!("unknown action type '{type_name}'"),
            ),
            ActionDescriptor::Malformed { type_name, reason } => report.push(
                ValidationSeverity::Error,
                context,
                format!("malformed '{type_name}': {reason}"),
            ),
            ActionDescriptor::Known(action) => check_action(report, &context, action),
            ActionDescriptor::Tiered(tiered) => {
                for field in tiered.ignored_tiers() {
                    report.push(
                        ValidationSeverity::Warning,
                        context.clone(),
                        format!("{field} has no effect on '{}'", tiered.base.kind()),
                    );
                }
                for action in [Some(&tiered.base), tiered.gold.as_ref(), tiered.diamond.as_ref()]
                    .into_iter()
                    .flatten()
                {
                    check_action(report, &context, action);
                }
            }
        }
    }
}

fn check_set(report: &mut ValidationReport, record: &EntityRecord, spec: &SetSpec, db: &Database) {
    let requirements = spec.requirements();
    if requirements.is_empty() {
        report.push(
            ValidationSeverity::Error,
            record.key.clone(),
            "set has no requirements and can never activate",
        );
    }
    for requirement in &requirements {
        match requirement {
            SetRequirement::TagCount { count: 0, .. } => report.push(
                ValidationSeverity::Error,
                record.key.clone(),
                "set minCount must be at least 1",
            ),
            SetRequirement::Slugs { all } => {
                for slug in all.iter().filter(|slug| db.lookup(slug).is_none()) {
                    report.push(
                        ValidationSeverity::Warning,
                        record.key.clone(),
                        format!("set requires unknown slug '{slug}'"),
                    );
                }
            }
            SetRequirement::TagCount { .. } => {}
        }
    }
}

fn check_record(report: &mut ValidationReport, record: &EntityRecord, db: &Database) {
    for (index, effect) in record.effects.iter().enumerate() {
        let context = format!("{}.effects[{index}]", record.key);
        if effect
            .condition
            .as_ref()
            .is_some_and(|condition| condition.contains_unknown())
        {
            report.push(
                ValidationSeverity::Warning,
                context.clone(),
                "condition contains an unknown type; the effect will never fire",
            );
        }
        if effect.actions.is_empty() {
            report.push(ValidationSeverity::Info, context.clone(), "effect has no actions");
        }
        check_actions(report, &context, &effect.actions);
    }

    match (&record.set, record.bucket) {
        (Some(_), bucket) if bucket != Bucket::Sets => report.push(
            ValidationSeverity::Warning,
            record.key.clone(),
            "set definition outside the sets bucket is ignored",
        ),
        (Some(spec), _) => check_set(report, record, spec, db),
        (None, Bucket::Sets) => report.push(
            ValidationSeverity::Warning,
            record.key.clone(),
            "sets record has no set definition",
        ),
        _ => {}
    }

    if record.bucket != Bucket::Sets && record.effects.is_empty() && record.stats.is_zero() {
        report.push(
            ValidationSeverity::Info,
            record.key.clone(),
            "entity has no effects and no stats",
        );
    }
}

/// Checks every record in key order.
pub fn validate_database(db: &Database) -> ValidationReport {
    let mut report = ValidationReport::default();
    for record in db.records() {
        check_record(&mut report, record, db);
    }
    tracing::debug!(
        errors = report.count(ValidationSeverity::Error),
        warnings = report.count(ValidationSeverity::Warning),
        "database validated"
    );
    report
}
