//! Name-indexed quantities and parameters.
//!
//! Entries are collected by a [`RegistryBuilder`] during startup and
//! frozen into an immutable [`Registry`] before the bridge is armed.
//! Reads afterwards need no synchronization.

use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use tether_core::{Param, Quantity};

use crate::error::RegistryError;

/// Collects registry entries before arming.
pub struct RegistryBuilder<S> {
    quantities: IndexMap<String, Arc<dyn Quantity<S>>>,
    params: IndexMap<String, Arc<dyn Param<S>>>,
}

impl<S> Default for RegistryBuilder<S> {
    fn default() -> Self {
        Self {
            quantities: IndexMap::new(),
            params: IndexMap::new(),
        }
    }
}

impl<S> RegistryBuilder<S> {
    /// An empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a displayable quantity.
    pub fn quantity(
        &mut self,
        name: &str,
        quantity: impl Quantity<S> + 'static,
    ) -> Result<&mut Self, RegistryError> {
        check_name("quantity", name)?;
        if self.quantities.contains_key(name) {
            return Err(RegistryError::Duplicate {
                kind: "quantity",
                name: name.to_owned(),
            });
        }
        self.quantities.insert(name.to_owned(), Arc::new(quantity));
        Ok(self)
    }

    /// Register an adjustable parameter.
    pub fn param(
        &mut self,
        name: &str,
        param: impl Param<S> + 'static,
    ) -> Result<&mut Self, RegistryError> {
        check_name("parameter", name)?;
        if self.params.contains_key(name) {
            return Err(RegistryError::Duplicate {
                kind: "parameter",
                name: name.to_owned(),
            });
        }
        self.params.insert(name.to_owned(), Arc::new(param));
        Ok(self)
    }

    /// Freeze into a registry sorted case-insensitively by name.
    pub fn build(mut self) -> Registry<S> {
        self.quantities.sort_by(|a, _, b, _| by_name(a, b));
        self.params.sort_by(|a, _, b, _| by_name(a, b));
        tracing::debug!(
            quantities = self.quantities.len(),
            params = self.params.len(),
            "registry frozen"
        );
        Registry {
            quantities: self.quantities,
            params: self.params,
        }
    }
}

fn check_name(kind: &'static str, name: &str) -> Result<(), RegistryError> {
    if name.is_empty() || name.contains(char::is_whitespace) {
        return Err(RegistryError::InvalidName {
            kind,
            name: name.to_owned(),
        });
    }
    Ok(())
}

// Case-insensitive first; exact order breaks ties so "a" and "A" are
// still ordered deterministically.
fn by_name(a: &str, b: &str) -> Ordering {
    a.to_lowercase()
        .cmp(&b.to_lowercase())
        .then_with(|| a.cmp(b))
}

/// Immutable registry of quantities and parameters.
pub struct Registry<S> {
    quantities: IndexMap<String, Arc<dyn Quantity<S>>>,
    params: IndexMap<String, Arc<dyn Param<S>>>,
}

impl<S> Registry<S> {
    /// The quantity registered as `name`.
    pub fn quantity(&self, name: &str) -> Option<&dyn Quantity<S>> {
        self.quantities.get(name).map(|q| q.as_ref())
    }

    /// The parameter registered as `name`.
    pub fn param(&self, name: &str) -> Option<&dyn Param<S>> {
        self.params.get(name).map(|p| p.as_ref())
    }

    /// Quantity names in display order.
    pub fn quant_names(&self) -> Vec<&str> {
        self.quantities.keys().map(String::as_str).collect()
    }

    /// Parameter names in display order.
    pub fn param_names(&self) -> Vec<&str> {
        self.params.keys().map(String::as_str).collect()
    }

    /// Parameters in display order.
    pub fn params(&self) -> impl Iterator<Item = (&str, &dyn Param<S>)> {
        self.params.iter().map(|(n, p)| (n.as_str(), p.as_ref()))
    }
}

impl<S> fmt::Debug for Registry<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("quantities", &self.quant_names())
            .field("params", &self.param_names())
            .finish()
    }
}
