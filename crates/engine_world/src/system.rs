//! Systems and their per-tick dispatch.
//!
//! A [`System`] declares a [`Signature`] and receives the resolved rows once
//! per update. Systems in a [`SystemList`] run in registration order, each
//! against a query resolved just before it runs, so changes made by one
//! system are visible to the systems after it in the same tick.

use engine_component::Signature;
use tracing::{debug, trace, warn};

use crate::query::QueryResult;
use crate::world::World;

/// Per-tick logic over the entities matching a signature.
pub trait System {
    /// The components this system reads and writes, in slot order.
    fn signature(&self) -> Signature;

    /// Update every matched row. Only called when at least one row matched.
    fn update_components(&mut self, dt: f32, rows: &mut QueryResult<'_>);

    /// Name used for logging and removal.
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }
}

/// Ordered set of systems.
#[derive(Default)]
pub struct SystemList {
    systems: Vec<Box<dyn System>>,
}

impl SystemList {
    /// Create an empty list.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a system.
    ///
    /// Returns `false` and drops the system if its signature can never
    /// match (no required entry, or a repeated component type).
    pub fn add_system(&mut self, system: Box<dyn System>) -> bool {
        let signature = system.signature();
        if !signature.is_valid() {
            warn!(system = system.name(), "rejecting system with invalid signature");
            return false;
        }
        debug!(system = system.name(), slots = signature.len(), "added system");
        self.systems.push(system);
        true
    }

    /// Remove the first system called `name`.
    pub fn remove_system(&mut self, name: &str) -> Option<Box<dyn System>> {
        let position = self.systems.iter().position(|s| s.name() == name)?;
        Some(self.systems.remove(position))
    }

    /// Number of systems.
    #[must_use]
    pub fn len(&self) -> usize {
        self.systems.len()
    }

    /// Returns `true` if the list is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.systems.is_empty()
    }

    /// System names in run order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.systems.iter().map(|s| s.name())
    }
}

impl std::fmt::Debug for SystemList {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}

impl World {
    /// Run every system in `systems` once, in order.
    pub fn update_systems(&mut self, systems: &mut SystemList, dt: f32) {
        for system in &mut systems.systems {
            self.update_system(system.as_mut(), dt);
        }
    }

    /// Resolve one system's query and run it.
    ///
    /// Returns `true` if the system matched any rows and was invoked.
    pub fn update_system(&mut self, system: &mut dyn System, dt: f32) -> bool {
        let signature = system.signature();
        let mut rows = self.query(&signature);
        trace!(system = system.name(), rows = rows.len(), "system query");
        if rows.is_empty() {
            return false;
        }
        system.update_components(dt, &mut rows);
        true
    }

    /// Run `update` against an ad hoc signature.
    ///
    /// Returns the number of rows `update` saw; it is not called when
    /// nothing matches.
    pub fn update_with<F>(&mut self, dt: f32, signature: &Signature, mut update: F) -> usize
    where
        F: FnMut(f32, &mut QueryResult<'_>),
    {
        let mut rows = self.query(signature);
        let len = rows.len();
        if len > 0 {
            update(dt, &mut rows);
        }
        len
    }
}
