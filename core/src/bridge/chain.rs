//! Call-order state machine for fluent ("chain builder") objects.
//!
//! A class declares, for some of its methods, which other methods must have
//! been called first. A declared method is enabled once ANY of its
//! prerequisites appears in the call history, or immediately when it has no
//! prerequisites. Methods that were never declared are always enabled. The
//! enabled set only grows.
//!
//! ```ignore
//! let mut chain = ChainState::new();
//! chain.register_dynamic_function("find", "");
//! chain.register_dynamic_function("limit", "find, sort");
//! chain.register_dynamic_function("skip", "limit");
//! chain.update_functions("find");
//! assert!(chain.is_enabled("limit"));
//! assert!(!chain.is_enabled("skip"));
//! ```

use std::collections::BTreeMap;

use hashbrown::HashSet;

#[derive(Debug, Clone, Default)]
pub struct ChainState {
    /// name -> prerequisite names, for every declared method.
    prerequisites: BTreeMap<String, Vec<String>>,
    enabled: HashSet<String>,
    history: HashSet<String>,
}

impl ChainState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declares `name` with a comma-separated list of prerequisites. An empty
    /// list enables the method right away.
    pub fn register_dynamic_function(&mut self, name: &str, prerequisites: &str) {
        let prerequisites: Vec<String> = prerequisites
            .split(',')
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .map(str::to_string)
            .collect();
        let ready = prerequisites.is_empty()
            || prerequisites.iter().any(|p| self.history.contains(p.as_str()));
        if ready {
            self.enabled.insert(name.to_string());
        }
        self.prerequisites.insert(name.to_string(), prerequisites);
    }

    pub fn is_declared(&self, name: &str) -> bool {
        self.prerequisites.contains_key(name)
    }

    pub fn is_enabled(&self, name: &str) -> bool {
        !self.is_declared(name) || self.enabled.contains(name)
    }

    /// Records a successful call and enables every declared method that has
    /// `just_called` among its prerequisites.
    pub fn update_functions(&mut self, just_called: &str) {
        if !self.history.insert(just_called.to_string()) {
            return;
        }
        for (name, prerequisites) in &self.prerequisites {
            if self.enabled.contains(name.as_str()) {
                continue;
            }
            if prerequisites.iter().any(|p| p == just_called) {
                tracing::trace!(method = %name, after = just_called, "Chain method enabled");
                self.enabled.insert(name.clone());
            }
        }
    }

    /// Declared methods that are currently enabled, in name order.
    pub fn enabled(&self) -> impl Iterator<Item = &str> + '_ {
        self.prerequisites
            .keys()
            .filter(|name| self.enabled.contains(name.as_str()))
            .map(String::as_str)
    }

    pub fn was_called(&self, name: &str) -> bool {
        self.history.contains(name)
    }
}
