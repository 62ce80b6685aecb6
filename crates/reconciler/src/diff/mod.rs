//! Diff engine.
//!
//! Each submodule takes the live object by value plus the desired object and
//! returns the live object with the owned fields brought in line, together
//! with whether anything moved. Fields the operator does not own (status,
//! resource version, defaults filled in by the platform) pass through
//! untouched, so the result is safe to send back as a full update.

pub mod config;
pub mod pvc;
pub mod service;
pub mod statefulset;

/// The merged live object and whether it differs from what was fetched.
#[derive(Debug, Clone, PartialEq)]
pub struct Diff<K> {
    pub object: K,
    pub changed: bool,
}

impl<K> Diff<K> {
    pub fn unchanged(object: K) -> Self {
        Self {
            object,
            changed: false,
        }
    }

    pub fn new(object: K, changed: bool) -> Self {
        Self { object, changed }
    }
}

/// Overwrite `slot` with `value` when they differ. Detection and mutation
/// happen in the same step; returns whether a write happened.
pub fn assign<T: PartialEq>(slot: &mut T, value: T) -> bool {
    if *slot == value {
        false
    } else {
        *slot = value;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_assign_reports_change() {
        let mut slot = Some(1);
        assert!(!assign(&mut slot, Some(1)));
        assert!(assign(&mut slot, Some(2)));
        assert_eq!(slot, Some(2));
        assert!(assign(&mut slot, None));
        assert_eq!(slot, None);
    }
}
