use std::collections::HashSet;

/// Span event attached to a fault unit.
pub const FAULT_EVENT: &str = "API failure detected";

pub const ERROR_ATTRIBUTE: &str = "error";
pub const STATUS_CODE_ATTRIBUTE: &str = "http.status_code";

pub const DEFAULT_FAULT_STATUS_CODE: u16 = 401;

/// Decides which units get failure-path telemetry attached.
///
/// No real fault happens: the unit runs to completion, it is only reported as failed.
pub trait FaultPredicate: Send + Sync {
    fn is_fault_unit(&self, unit_name: &str) -> bool;
}

impl<F> FaultPredicate for F
where
    F: Fn(&str) -> bool + Send + Sync,
{
    fn is_fault_unit(&self, unit_name: &str) -> bool {
        self(unit_name)
    }
}

/// Marks units by exact name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FaultUnits {
    names: HashSet<String>,
}

impl FaultUnits {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn contains(&self, unit_name: &str) -> bool {
        self.names.contains(unit_name)
    }
}

impl<S: Into<String>> FromIterator<S> for FaultUnits {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self {
            names: iter.into_iter().map(Into::into).collect(),
        }
    }
}

impl FaultPredicate for FaultUnits {
    fn is_fault_unit(&self, unit_name: &str) -> bool {
        self.contains(unit_name)
    }
}
