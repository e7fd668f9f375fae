//! Dense, type-erased storage for one component type.
//!
//! A [`Column`] keeps every live record of one [`ComponentId`] back to back
//! with no gaps. Records are written by the type's create function and
//! removed with a swap-delete: the last record is moved into the freed slot
//! and the column shrinks by one. The caller is told about the move through a
//! [`Relocation`] so the moved record's owner can be patched.
//!
//! Each record is paired with a [`RecordOwner`] in a parallel vector, so the
//! owning entity of any slot can be found after a relocation.

use std::any::TypeId;
use std::ptr::NonNull;

use crate::component::{AnyComponent, ComponentId, ComponentMeta};
use crate::handle::{ComponentHandle, EntityHandle};

/// Largest alignment a component type may require.
pub const MAX_COMPONENT_ALIGN: usize = 64;

/// Backing unit of column memory. Aligning every block to
/// [`MAX_COMPONENT_ALIGN`] keeps every record aligned, since the stride is a
/// multiple of the record's own alignment.
#[derive(Clone, Copy)]
#[repr(C, align(64))]
struct Block([u8; MAX_COMPONENT_ALIGN]);

const EMPTY_BLOCK: Block = Block([0; MAX_COMPONENT_ALIGN]);

/// Who a record belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordOwner {
    /// The entity that owns the record.
    pub entity: EntityHandle,
    /// The record's own handle.
    pub component: ComponentHandle,
}

/// A record moved by [`Column::swap_remove`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Relocation {
    /// The record's index before the move (the old tail).
    pub from: usize,
    /// The record's index after the move.
    pub to: usize,
    /// Owner of the moved record.
    pub owner: RecordOwner,
}

/// Dense storage for every record of one component type.
pub struct Column {
    id: ComponentId,
    name: &'static str,
    type_id: TypeId,
    stride: usize,
    destroy_fn: Option<unsafe fn(*mut u8)>,
    serialize_fn: unsafe fn(*const u8) -> Result<Vec<u8>, rmp_serde::encode::Error>,
    /// Raw record bytes. Only the first `owners.len() * stride` bytes are live.
    blocks: Vec<Block>,
    /// `owners[i]` owns record `i`.
    owners: Vec<RecordOwner>,
}

impl Column {
    /// Create an empty column for a registered type.
    #[must_use]
    pub fn new(meta: &ComponentMeta) -> Self {
        Self {
            id: meta.id,
            name: meta.name,
            type_id: meta.type_id,
            stride: meta.stride(),
            destroy_fn: meta.destroy_fn,
            serialize_fn: meta.serialize_fn,
            blocks: Vec::new(),
            owners: Vec::new(),
        }
    }

    /// The component type stored here.
    #[must_use]
    pub fn id(&self) -> ComponentId {
        self.id
    }

    /// The persistent name of the stored type.
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Bytes between consecutive records.
    #[must_use]
    pub fn stride(&self) -> usize {
        self.stride
    }

    /// Number of live records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.owners.len()
    }

    /// Returns `true` if the column holds no records.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.owners.is_empty()
    }

    /// Owner of the record at `index`.
    #[must_use]
    pub fn owner(&self, index: usize) -> Option<&RecordOwner> {
        self.owners.get(index)
    }

    /// All owners in record order.
    #[must_use]
    pub fn owners(&self) -> &[RecordOwner] {
        &self.owners
    }

    /// Copy-construct `prototype` into the tail of the column.
    ///
    /// Returns the new record's index, or `None` if the prototype is not of
    /// this column's type.
    pub fn push(
        &mut self,
        meta: &ComponentMeta,
        owner: RecordOwner,
        prototype: &dyn AnyComponent,
    ) -> Option<usize> {
        if meta.id != self.id || prototype.as_any().type_id() != self.type_id {
            return None;
        }
        let index = self.owners.len();
        self.reserve_records(index + 1);
        let dst = self.record_ptr(index);
        // SAFETY: `reserve_records` made room for record `index`, the slot is
        // aligned for the type and not yet live.
        let written = unsafe { (meta.create_fn)(dst.as_ptr(), prototype.as_any()) };
        if !written {
            return None;
        }
        self.owners.push(owner);
        Some(index)
    }

    /// Destroy the record at `index` and keep the column packed.
    ///
    /// If `index` was not the tail, the tail record is moved into it and the
    /// move is returned so the caller can patch the moved record's owner.
    /// Out-of-range indices are ignored.
    pub fn swap_remove(&mut self, index: usize) -> Option<Relocation> {
        let len = self.owners.len();
        if index >= len {
            return None;
        }
        let last = len - 1;
        let dst = self.record_ptr(index);
        if let Some(destroy) = self.destroy_fn {
            // SAFETY: Record `index` is live and is never read again before
            // being overwritten or cut off below.
            unsafe { destroy(dst.as_ptr()) };
        }

        if index != last {
            let src = self.record_ptr(last);
            // SAFETY: Both slots lie inside the live range and are distinct.
            // The tail is treated as moved-out once `owners` shrinks.
            unsafe { std::ptr::copy_nonoverlapping(src.as_ptr(), dst.as_ptr(), self.stride) };
        }
        self.owners.swap_remove(index);

        (index != last).then(|| Relocation {
            from: last,
            to: index,
            owner: self.owners[index],
        })
    }

    /// Typed view of the record at `index`. `None` if out of range or `T`
    /// is not the stored type.
    #[must_use]
    pub fn get<T: 'static>(&self, index: usize) -> Option<&T> {
        if TypeId::of::<T>() != self.type_id || index >= self.len() {
            return None;
        }
        // SAFETY: Type checked above; record `index` is live.
        Some(unsafe { &*self.record_ptr_const(index).cast::<T>() })
    }

    /// Typed mutable view of the record at `index`.
    #[must_use]
    pub fn get_mut<T: 'static>(&mut self, index: usize) -> Option<&mut T> {
        if TypeId::of::<T>() != self.type_id || index >= self.len() {
            return None;
        }
        // SAFETY: Type checked above; record `index` is live and uniquely
        // borrowed through `&mut self`.
        Some(unsafe { &mut *self.record_ptr(index).as_ptr().cast::<T>() })
    }

    /// Encode the record at `index` as its persistent payload.
    pub fn serialize_record(
        &self,
        index: usize,
    ) -> Option<Result<Vec<u8>, rmp_serde::encode::Error>> {
        if index >= self.len() {
            return None;
        }
        // SAFETY: Record `index` is live and of this column's type.
        Some(unsafe { (self.serialize_fn)(self.record_ptr_const(index)) })
    }

    /// Pointer to the first record and the stored type, for building query
    /// rows. The pointer stays valid until the column is next mutated.
    #[must_use]
    pub fn raw_parts(&mut self) -> (NonNull<u8>, usize, TypeId) {
        if self.blocks.is_empty() {
            self.blocks.push(EMPTY_BLOCK);
        }
        (self.record_ptr(0), self.stride, self.type_id)
    }

    fn reserve_records(&mut self, count: usize) {
        let bytes = (count * self.stride).max(1);
        let blocks = bytes.div_ceil(MAX_COMPONENT_ALIGN);
        if blocks > self.blocks.len() {
            self.blocks.resize(blocks, EMPTY_BLOCK);
        }
    }

    fn record_ptr(&mut self, index: usize) -> NonNull<u8> {
        let base = self.blocks.as_mut_ptr().cast::<u8>();
        // SAFETY: Callers only pass indices inside the reserved range, so the
        // offset stays within (or one past) the allocation.
        unsafe { NonNull::new_unchecked(base.add(index * self.stride)) }
    }

    fn record_ptr_const(&self, index: usize) -> *const u8 {
        let base = self.blocks.as_ptr().cast::<u8>();
        // SAFETY: See `record_ptr`.
        unsafe { base.add(index * self.stride) }
    }
}

impl Drop for Column {
    fn drop(&mut self) {
        let Some(destroy) = self.destroy_fn else {
            return;
        };
        for index in 0..self.owners.len() {
            let ptr = self.record_ptr(index);
            // SAFETY: Every record below `len` is live and dropped once.
            unsafe { destroy(ptr.as_ptr()) };
        }
    }
}

impl std::fmt::Debug for Column {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Column")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("stride", &self.stride)
            .field("len", &self.len())
            .finish()
    }
}
