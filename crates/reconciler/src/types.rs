//! Core types for the reconciler.

use std::fmt;

use itertools::Itertools;
use serde::{Deserialize, Serialize};

/// What a reconciler did to one object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Outcome {
    Created,
    Updated,
    Unchanged,
}

impl Outcome {
    /// Whether a write was issued.
    pub fn is_write(self) -> bool {
        !matches!(self, Self::Unchanged)
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Created => "created",
            Self::Updated => "updated",
            Self::Unchanged => "unchanged",
        };
        f.write_str(label)
    }
}

/// Outcome of a single object, by name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectOutcome {
    pub name: String,
    pub outcome: Outcome,
}

/// Result of one per-type reconciler.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComponentReport {
    pub component: String,
    pub outcomes: Vec<ObjectOutcome>,
}

impl ComponentReport {
    pub fn new(component: impl Into<String>) -> Self {
        Self {
            component: component.into(),
            outcomes: Vec::new(),
        }
    }

    pub fn push(&mut self, name: impl Into<String>, outcome: Outcome) {
        self.outcomes.push(ObjectOutcome {
            name: name.into(),
            outcome,
        });
    }

    pub fn with(mut self, name: impl Into<String>, outcome: Outcome) -> Self {
        self.push(name, outcome);
        self
    }

    /// Number of objects written (created or updated).
    pub fn writes(&self) -> usize {
        self.outcomes.iter().filter(|o| o.outcome.is_write()).count()
    }
}

/// Result of a full reconcile cycle for one instance.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CycleReport {
    /// Components in the order they ran.
    pub components: Vec<ComponentReport>,
    /// The instance no longer exists; nothing was done.
    pub deleted: bool,
    /// `metadata.generation` of the instance that was reconciled.
    pub observed_generation: Option<i64>,
}

impl CycleReport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Report for an instance that was not found.
    pub fn deleted() -> Self {
        Self {
            deleted: true,
            ..Self::default()
        }
    }

    pub fn push(&mut self, report: ComponentReport) {
        self.components.push(report);
    }

    /// Total number of writes across all components.
    pub fn changed(&self) -> usize {
        self.components.iter().map(ComponentReport::writes).sum()
    }

    /// Whether the cycle found everything already converged.
    pub fn converged(&self) -> bool {
        self.changed() == 0
    }

    /// Component names in execution order.
    pub fn order(&self) -> Vec<&str> {
        self.components
            .iter()
            .map(|c| c.component.as_str())
            .collect()
    }

    pub fn component(&self, name: &str) -> Option<&ComponentReport> {
        self.components.iter().find(|c| c.component == name)
    }

    /// Compact `component: name=outcome` summary for logs.
    pub fn summary(&self) -> String {
        self.components
            .iter()
            .map(|c| {
                format!(
                    "{}: {}",
                    c.component,
                    c.outcomes
                        .iter()
                        .map(|o| format!("{}={}", o.name, o.outcome))
                        .join(", ")
                )
            })
            .join("; ")
    }
}
