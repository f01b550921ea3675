//! EventFormatter trait - per-binding display strategy

use crate::{ContractError, Event};

/// Renders an event as the line a sink emits
///
/// Every sink binding owns its own formatter, so two bindings on the
/// same component can render the same event differently.
pub trait EventFormatter: Send + Sync {
    /// Render the event
    ///
    /// # Errors
    /// A formatting error skips this binding for the current tick only.
    fn format(&self, event: &Event) -> Result<String, ContractError>;

    /// Short description used in diagnostics
    fn describe(&self) -> String {
        "custom".to_string()
    }
}

impl<F> EventFormatter for F
where
    F: Fn(&Event) -> Result<String, ContractError> + Send + Sync,
{
    fn format(&self, event: &Event) -> Result<String, ContractError> {
        self(event)
    }
}

/// `"<label> - body=<body>, headers=<headers>"`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelFormatter {
    label: String,
}

impl LabelFormatter {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }
}

impl EventFormatter for LabelFormatter {
    fn format(&self, event: &Event) -> Result<String, ContractError> {
        Ok(format!(
            "{} - body={}, headers={}",
            self.label, event.body, event.headers
        ))
    }

    fn describe(&self) -> String {
        format!("label={}", self.label)
    }
}
