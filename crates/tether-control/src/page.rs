//! Thread-safe key → value store backing the control page.
//!
//! Handlers, the refresh routine and the busy projection all write here
//! from different threads. Values and disabled flags sit behind two
//! separate mutexes that are never held together.

use std::fmt;
use std::sync::{Mutex, PoisonError};

use indexmap::{IndexMap, IndexSet};
use tether_core::ControlGate;

use crate::error::ControlError;
use crate::events;

/// A published page value.
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    /// Free text.
    Text(String),
    /// Integer field.
    Int(i64),
    /// Floating-point field.
    Float(f64),
    /// Checkbox.
    Bool(bool),
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Text(s) => f.write_str(s),
            Value::Int(v) => write!(f, "{v}"),
            Value::Float(v) => write!(f, "{v}"),
            Value::Bool(v) => write!(f, "{v}"),
        }
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_owned())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<u64> for Value {
    fn from(v: u64) -> Self {
        Value::Int(i64::try_from(v).unwrap_or(i64::MAX))
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

/// The control page's published state.
#[derive(Debug, Default)]
pub struct Page {
    values: Mutex<IndexMap<String, Value>>,
    disabled: Mutex<IndexSet<String>>,
}

impl Page {
    /// An empty page.
    pub fn new() -> Self {
        Self::default()
    }

    /// Publish `value` under `id`, replacing any previous value.
    pub fn set(&self, id: &str, value: impl Into<Value>) {
        let value = value.into();
        let mut values = self.values.lock().unwrap_or_else(PoisonError::into_inner);
        match values.get_mut(id) {
            Some(slot) => *slot = value,
            None => {
                values.insert(id.to_owned(), value);
            }
        }
    }

    /// Current value of `id`.
    pub fn value(&self, id: &str) -> Option<Value> {
        self.values
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(id)
            .cloned()
    }

    /// Value of `id` rendered as text; empty when unset.
    pub fn string_value(&self, id: &str) -> String {
        self.value(id).map(|v| v.to_string()).unwrap_or_default()
    }

    /// Value of `id` as a float. Text is parsed after trimming.
    pub fn float_value(&self, id: &str) -> Result<f64, ControlError> {
        match self.value(id) {
            Some(Value::Float(v)) => Ok(v),
            Some(Value::Int(v)) => Ok(v as f64),
            Some(Value::Text(s)) => s.trim().parse().map_err(|_| bad_field(id, &s, "a number")),
            Some(Value::Bool(_)) => Err(bad_field(id, "bool", "a number")),
            None => Err(missing(id)),
        }
    }

    /// Value of `id` as an integer. Text is parsed after trimming.
    pub fn int_value(&self, id: &str) -> Result<i64, ControlError> {
        match self.value(id) {
            Some(Value::Int(v)) => Ok(v),
            Some(Value::Float(v)) if v.fract() == 0.0 && v.is_finite() => Ok(v as i64),
            Some(Value::Text(s)) => s.trim().parse().map_err(|_| bad_field(id, &s, "an integer")),
            Some(other) => Err(bad_field(id, &other.to_string(), "an integer")),
            None => Err(missing(id)),
        }
    }

    /// Enable or disable the control `id`.
    pub fn set_disabled(&self, id: &str, disabled: bool) {
        let mut set = self.disabled.lock().unwrap_or_else(PoisonError::into_inner);
        if disabled {
            set.insert(id.to_owned());
        } else {
            set.shift_remove(id);
        }
    }

    /// Whether the control `id` is disabled.
    pub fn is_disabled(&self, id: &str) -> bool {
        self.disabled
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(id)
    }

    /// Ids of every published value, in first-publication order.
    pub fn ids(&self) -> Vec<String> {
        self.values
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect()
    }
}

impl ControlGate for Page {
    fn set_controls_enabled(&self, enabled: bool) {
        self.set_disabled(events::CLI, !enabled);
    }
}

fn missing(id: &str) -> ControlError {
    ControlError::BadField {
        id: id.to_owned(),
        reason: "not set".to_owned(),
    }
}

fn bad_field(id: &str, got: &str, want: &str) -> ControlError {
    ControlError::BadField {
        id: id.to_owned(),
        reason: format!("'{got}' is not {want}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_overwrites_in_place() {
        let page = Page::new();
        page.set("a", 1i64);
        page.set("b", "x");
        page.set("a", 2i64);
        assert_eq!(page.ids(), vec!["a", "b"]);
        assert_eq!(page.value("a"), Some(Value::Int(2)));
    }

    #[test]
    fn typed_reads_parse_text() {
        let page = Page::new();
        page.set("nx", " 64 ");
        page.set("cx", "2.5");
        assert_eq!(page.int_value("nx").unwrap(), 64);
        assert_eq!(page.float_value("cx").unwrap(), 2.5);
        assert!(page.int_value("cx").is_err());
        assert!(matches!(
            page.float_value("missing"),
            Err(ControlError::BadField { .. })
        ));
    }

    #[test]
    fn gate_projection_toggles_cli() {
        let page = Page::new();
        page.set_controls_enabled(false);
        assert!(page.is_disabled(events::CLI));
        page.set_controls_enabled(true);
        assert!(!page.is_disabled(events::CLI));
    }

    #[test]
    fn string_value_of_unset_is_empty() {
        assert_eq!(Page::new().string_value("nope"), "");
    }
}
