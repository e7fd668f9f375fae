//! Query resolution: turning a [`Signature`] into per-entity component rows.
//!
//! The resolver starts from the required type with the fewest live records
//! and, for each of them, looks up the owning entity's other components in
//! its manifest. A [`QueryResult`] holds the world exclusively borrowed, so
//! its rows stay valid for as long as it lives.

use std::any::TypeId;
use std::marker::PhantomData;
use std::ptr::NonNull;

use engine_component::{Column, ComponentId, EntityHandle, Requirement, Signature};
use tracing::trace;

use crate::world::World;

/// Base pointer of one signature slot's column.
#[derive(Debug, Clone, Copy)]
struct SlotColumn {
    base: NonNull<u8>,
    stride: usize,
    type_id: TypeId,
}

impl SlotColumn {
    fn from_column(column: &mut Column) -> Self {
        let (base, stride, type_id) = column.raw_parts();
        Self {
            base,
            stride,
            type_id,
        }
    }

    /// Pointer to record `index` if the column stores `T`.
    fn record<T: 'static>(&self, index: usize) -> Option<NonNull<T>> {
        if TypeId::of::<T>() != self.type_id {
            return None;
        }
        // SAFETY: `index` was a live record when the query was resolved and
        // the world stays exclusively borrowed until the result is dropped.
        Some(unsafe { self.base.add(index * self.stride) }.cast::<T>())
    }
}

/// The rows matched by one signature.
///
/// Row `r` holds, for each signature slot in declaration order, the index of
/// the matching record, or nothing for a missing optional component.
#[derive(Debug)]
pub struct QueryResult<'w> {
    columns: Vec<Option<SlotColumn>>,
    entities: Vec<EntityHandle>,
    /// `entities.len() * columns.len()` slot indices, row-major.
    indices: Vec<Option<usize>>,
    _world: PhantomData<&'w mut World>,
}

impl<'w> QueryResult<'w> {
    fn empty(width: usize) -> Self {
        Self {
            columns: vec![None; width],
            entities: Vec::new(),
            indices: Vec::new(),
            _world: PhantomData,
        }
    }

    /// Number of matched entities.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    /// Returns `true` if nothing matched.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Number of slots per row.
    #[must_use]
    pub fn width(&self) -> usize {
        self.columns.len()
    }

    /// Matched entities in row order.
    #[must_use]
    pub fn entities(&self) -> &[EntityHandle] {
        &self.entities
    }

    /// Shared access to slot `slot` of row `row`.
    #[must_use]
    pub fn get<T: 'static>(&self, row: usize, slot: usize) -> Option<&T> {
        let ptr = self.record::<T>(row, slot)?;
        // SAFETY: Shared borrow of `self` excludes the `&mut` accessors.
        Some(unsafe { ptr.as_ref() })
    }

    /// Mutable access to slot `slot` of row `row`.
    #[must_use]
    pub fn get_mut<T: 'static>(&mut self, row: usize, slot: usize) -> Option<&mut T> {
        let mut ptr = self.record::<T>(row, slot)?;
        // SAFETY: Unique borrow of `self`; no other record reference is live.
        Some(unsafe { ptr.as_mut() })
    }

    /// Mutable access to two different slots of the same row.
    #[must_use]
    pub fn pair_mut<A: 'static, B: 'static>(
        &mut self,
        row: usize,
        slot_a: usize,
        slot_b: usize,
    ) -> Option<(&mut A, &mut B)> {
        if slot_a == slot_b {
            return None;
        }
        let mut a = self.record::<A>(row, slot_a)?;
        let mut b = self.record::<B>(row, slot_b)?;
        // SAFETY: Distinct slots of one row name records in distinct columns
        // (signatures with repeated ids never resolve to rows).
        Some(unsafe { (a.as_mut(), b.as_mut()) })
    }

    /// Iterate over rows, each granting mutable access to its own records.
    pub fn rows_mut(&mut self) -> impl Iterator<Item = QueryRow<'_>> {
        let width = self.columns.len();
        let columns = self.columns.as_slice();
        let indices = self.indices.as_slice();
        self.entities
            .iter()
            .enumerate()
            .map(move |(row, entity)| QueryRow {
                entity: *entity,
                columns,
                indices: &indices[row * width..(row + 1) * width],
                _rows: PhantomData,
            })
    }

    fn record<T: 'static>(&self, row: usize, slot: usize) -> Option<NonNull<T>> {
        if row >= self.entities.len() {
            return None;
        }
        let index = (*self.indices.get(row * self.columns.len() + slot)?)?;
        self.columns.get(slot)?.as_ref()?.record::<T>(index)
    }
}

/// One matched entity's records.
///
/// Rows never share records, so several rows may be held at once.
#[derive(Debug)]
pub struct QueryRow<'q> {
    entity: EntityHandle,
    columns: &'q [Option<SlotColumn>],
    indices: &'q [Option<usize>],
    _rows: PhantomData<&'q mut ()>,
}

impl QueryRow<'_> {
    /// The entity this row belongs to.
    #[must_use]
    pub fn entity(&self) -> EntityHandle {
        self.entity
    }

    /// Returns `true` if slot `slot` holds a record.
    #[must_use]
    pub fn has(&self, slot: usize) -> bool {
        matches!(self.indices.get(slot), Some(Some(_)))
    }

    /// Shared access to slot `slot`.
    #[must_use]
    pub fn get<T: 'static>(&self, slot: usize) -> Option<&T> {
        let ptr = self.record::<T>(slot)?;
        // SAFETY: See `QueryResult::get`.
        Some(unsafe { ptr.as_ref() })
    }

    /// Mutable access to slot `slot`.
    #[must_use]
    pub fn get_mut<T: 'static>(&mut self, slot: usize) -> Option<&mut T> {
        let mut ptr = self.record::<T>(slot)?;
        // SAFETY: See `QueryResult::get_mut`.
        Some(unsafe { ptr.as_mut() })
    }

    /// Mutable access to two different slots.
    #[must_use]
    pub fn pair_mut<A: 'static, B: 'static>(
        &mut self,
        slot_a: usize,
        slot_b: usize,
    ) -> Option<(&mut A, &mut B)> {
        if slot_a == slot_b {
            return None;
        }
        let mut a = self.record::<A>(slot_a)?;
        let mut b = self.record::<B>(slot_b)?;
        // SAFETY: See `QueryResult::pair_mut`.
        Some(unsafe { (a.as_mut(), b.as_mut()) })
    }

    fn record<T: 'static>(&self, slot: usize) -> Option<NonNull<T>> {
        let index = (*self.indices.get(slot)?)?;
        self.columns.get(slot)?.as_ref()?.record::<T>(index)
    }
}

impl World {
    /// The required type in `signature` with the fewest live records.
    ///
    /// `None` if the signature has no required entry.
    #[must_use]
    pub fn find_least_common_component(&self, signature: &Signature) -> Option<ComponentId> {
        signature
            .entries()
            .iter()
            .filter(|(_, requirement)| *requirement == Requirement::Required)
            .map(|(id, _)| *id)
            .min_by_key(|id| self.component_count(*id))
    }

    /// Resolve `signature` into the rows of every entity that owns all of
    /// its required types.
    ///
    /// Signatures without a required entry, with repeated ids, or naming an
    /// unregistered type resolve to an empty result.
    pub fn query(&mut self, signature: &Signature) -> QueryResult<'_> {
        let width = signature.len();
        if !signature.is_valid()
            || signature
                .entries()
                .iter()
                .any(|(id, _)| !self.registry.is_valid(*id))
        {
            return QueryResult::empty(width);
        }
        let Some(seed) = self.find_least_common_component(signature) else {
            return QueryResult::empty(width);
        };
        let Some(seed_column) = self.columns.get(&seed) else {
            return QueryResult::empty(width);
        };

        let mut entities = Vec::with_capacity(seed_column.len());
        let mut indices = Vec::with_capacity(seed_column.len() * width);

        if width == 1 {
            // Every record of the one required type is a row.
            for (index, owner) in seed_column.owners().iter().enumerate() {
                entities.push(owner.entity);
                indices.push(Some(index));
            }
        } else {
            let mut row = Vec::with_capacity(width);
            'records: for (seed_index, owner) in seed_column.owners().iter().enumerate() {
                let Some(node) = self.entities.get(owner.entity) else {
                    continue;
                };
                row.clear();
                for (id, requirement) in signature.entries() {
                    let index = if *id == seed {
                        Some(seed_index)
                    } else {
                        node.component(*id).map(|entry| entry.index)
                    };
                    if index.is_none() && *requirement == Requirement::Required {
                        continue 'records;
                    }
                    row.push(index);
                }
                entities.push(owner.entity);
                indices.extend_from_slice(&row);
            }
        }

        let columns = signature
            .entries()
            .iter()
            .map(|(id, _)| self.columns.get_mut(id).map(SlotColumn::from_column))
            .collect();

        trace!(seed = %seed, rows = entities.len(), width, "resolved query");
        QueryResult {
            columns,
            entities,
            indices,
            _world: PhantomData,
        }
    }
}
