//! Linkage between variables and external standards.
//!
//! A variable follows at most one standard. The operator names it during the
//! interview; turning that name into a `standards` row id is the resolver's
//! job. Standards are not managed by this tool yet, so the default resolver
//! leaves every link empty.

use super::model::StandardId;
use std::sync::Mutex;

pub trait StandardsResolver: Send + Sync {
    /// Returns the id of the named standard, if one can be linked.
    fn resolve(&self, variable_name: &str, standard: &str) -> Option<StandardId>;
}

impl<T: StandardsResolver + ?Sized> StandardsResolver for &T {
    fn resolve(&self, variable_name: &str, standard: &str) -> Option<StandardId> {
        (**self).resolve(variable_name, standard)
    }
}

/// Resolver that links nothing and remembers what was asked for.
#[derive(Debug, Default)]
pub struct UnlinkedStandards {
    requested: Mutex<Vec<(String, String)>>,
}

impl UnlinkedStandards {
    pub fn new() -> Self {
        Self::default()
    }

    /// `(variable, standard)` pairs seen so far.
    pub fn requested(&self) -> Vec<(String, String)> {
        self.requested
            .lock()
            .map(|r| r.clone())
            .unwrap_or_default()
    }
}

impl StandardsResolver for UnlinkedStandards {
    fn resolve(&self, variable_name: &str, standard: &str) -> Option<StandardId> {
        tracing::info!(
            variable = variable_name,
            standard,
            "Standard noted but not linked; standards are not managed by this catalog yet"
        );
        if let Ok(mut requested) = self.requested.lock() {
            requested.push((variable_name.to_owned(), standard.to_owned()));
        }
        None
    }
}
