//! Status conditions written after each cycle.

use chrono::{DateTime, SecondsFormat, Utc};
use lavinmq_api::{Condition, ConditionStatus, LavinMQStatus};

use crate::error::Error;
use crate::types::CycleReport;

pub const AVAILABLE: &str = "Available";
pub const DEGRADED: &str = "Degraded";

pub const REASON_RECONCILED: &str = "Reconciled";
pub const REASON_FAILED: &str = "ReconcileFailed";

fn timestamp(now: DateTime<Utc>) -> String {
    now.to_rfc3339_opts(SecondsFormat::Secs, true)
}

fn condition(
    condition_type: &str,
    status: ConditionStatus,
    reason: &str,
    message: impl Into<String>,
    generation: Option<i64>,
) -> Condition {
    Condition {
        condition_type: condition_type.to_string(),
        status,
        reason: reason.to_string(),
        message: message.into(),
        last_transition_time: None,
        observed_generation: generation,
    }
}

/// Insert or replace the condition with the same type. The transition time
/// is stamped on insert and whenever the status flips; otherwise the
/// existing one is kept. Returns whether the list changed.
pub fn set_condition(conditions: &mut Vec<Condition>, mut new: Condition, now: DateTime<Utc>) -> bool {
    match conditions
        .iter_mut()
        .find(|c| c.condition_type == new.condition_type)
    {
        Some(existing) => {
            new.last_transition_time = if existing.status == new.status {
                existing.last_transition_time.clone()
            } else {
                Some(timestamp(now))
            };
            if *existing == new {
                false
            } else {
                *existing = new;
                true
            }
        }
        None => {
            new.last_transition_time = Some(timestamp(now));
            conditions.push(new);
            true
        }
    }
}

pub fn find<'a>(status: &'a LavinMQStatus, condition_type: &str) -> Option<&'a Condition> {
    status
        .conditions
        .iter()
        .find(|c| c.condition_type == condition_type)
}

/// Status after a successful cycle: available and not degraded.
pub fn succeeded(
    current: Option<&LavinMQStatus>,
    report: &CycleReport,
    now: DateTime<Utc>,
) -> LavinMQStatus {
    let mut status = current.cloned().unwrap_or_default();
    let message = if report.converged() {
        "all managed objects up to date".to_string()
    } else {
        format!("{} managed objects written", report.changed())
    };
    let generation = report.observed_generation;
    set_condition(
        &mut status.conditions,
        condition(AVAILABLE, ConditionStatus::True, REASON_RECONCILED, message, generation),
        now,
    );
    set_condition(
        &mut status.conditions,
        condition(DEGRADED, ConditionStatus::False, REASON_RECONCILED, "", generation),
        now,
    );
    status
}

/// Status after a failed cycle. `Available` is left as it was: the
/// workload from the previous cycle may still be serving.
pub fn failed(
    current: Option<&LavinMQStatus>,
    error: &Error,
    generation: Option<i64>,
    now: DateTime<Utc>,
) -> LavinMQStatus {
    let mut status = current.cloned().unwrap_or_default();
    set_condition(
        &mut status.conditions,
        condition(
            DEGRADED,
            ConditionStatus::True,
            REASON_FAILED,
            error.to_string(),
            generation,
        ),
        now,
    );
    status
}
