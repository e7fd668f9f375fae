//! System signatures.
//!
//! A [`Signature`] is the ordered list of component types a system asks for,
//! each tagged [`Requirement::Required`] or [`Requirement::Optional`]. The
//! world's query resolver turns it into one row per matching entity, with one
//! slot per signature entry in the same order.

use crate::component::ComponentId;

/// Whether an entity must own a component to match a signature.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Requirement {
    /// Entities without this component are skipped.
    Required,
    /// Entities without this component still match; the slot is empty.
    Optional,
}

/// The ordered component requirements of a system.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Signature {
    entries: Vec<(ComponentId, Requirement)>,
}

impl Signature {
    /// Create an empty signature.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a required component type.
    #[must_use]
    pub fn required(self, id: ComponentId) -> Self {
        self.with(id, Requirement::Required)
    }

    /// Append an optional component type.
    #[must_use]
    pub fn optional(self, id: ComponentId) -> Self {
        self.with(id, Requirement::Optional)
    }

    /// Append a component type with an explicit requirement.
    #[must_use]
    pub fn with(mut self, id: ComponentId, requirement: Requirement) -> Self {
        self.entries.push((id, requirement));
        self
    }

    /// Entries in declaration order.
    #[must_use]
    pub fn entries(&self) -> &[(ComponentId, Requirement)] {
        &self.entries
    }

    /// Number of declared slots.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if nothing is declared.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Slot index of a component type.
    #[must_use]
    pub fn position(&self, id: ComponentId) -> Option<usize> {
        self.entries.iter().position(|(entry, _)| *entry == id)
    }

    /// Number of required entries.
    #[must_use]
    pub fn required_count(&self) -> usize {
        self.entries
            .iter()
            .filter(|(_, requirement)| *requirement == Requirement::Required)
            .count()
    }

    /// Returns `true` if some component type is declared twice.
    #[must_use]
    pub fn has_duplicates(&self) -> bool {
        self.entries
            .iter()
            .enumerate()
            .any(|(i, (id, _))| self.entries[..i].iter().any(|(other, _)| other == id))
    }

    /// A signature can match anything only if it has at least one required
    /// type and declares each type once.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.required_count() > 0 && !self.has_duplicates()
    }
}
