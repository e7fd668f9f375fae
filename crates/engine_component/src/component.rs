//! Core [`Component`] trait and the type-erased vtable built from it.
//!
//! Every piece of data stored in the ECS implements [`Component`]. The world
//! never sees concrete types: it stores raw records and drives them through
//! the function pointers of a [`ComponentMeta`], built once per type when the
//! type is registered.
//!
//! ## Process-local identity
//!
//! A [`ComponentId`] is a small dense integer handed out by the registry in
//! registration order. It is only stable within one running process. Anything
//! that is persisted refers to the component by its [`Component::type_name`].

use std::alloc::Layout;
use std::any::{Any, TypeId};
use std::fmt;

use serde::Serialize;
use serde::de::DeserializeOwned;

/// Process-local identifier of a registered component type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ComponentId(pub u32);

impl ComponentId {
    /// The id as a dense index into the registry.
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for ComponentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ComponentId({})", self.0)
    }
}

/// The core component trait.
///
/// Components are plain values: the world copies a caller-supplied prototype
/// into its storage, so they must be `Clone`, and tooling instantiates them
/// without a live entity, so they must be `Default`. The payload written by
/// the scene codec is the MessagePack encoding of the value.
///
/// # Examples
///
/// ```rust
/// use serde::{Serialize, Deserialize};
/// use engine_component::Component;
///
/// #[derive(Debug, Clone, Default, Serialize, Deserialize)]
/// struct Health {
///     current: f32,
///     max: f32,
/// }
///
/// impl Component for Health {
///     fn type_name() -> &'static str { "Health" }
/// }
/// ```
pub trait Component:
    Clone + Default + Send + Sync + 'static + Serialize + DeserializeOwned
{
    /// The persistent name of this component type.
    fn type_name() -> &'static str;
}

/// Object-safe view of any component value, used for prototypes.
pub trait AnyComponent: Any + Send + Sync {
    /// [`Component::type_name`] of the concrete type.
    fn component_name(&self) -> &'static str;

    /// Upcast for downcasting to the concrete type.
    fn as_any(&self) -> &dyn Any;

    /// Mutable upcast for downcasting to the concrete type.
    fn as_any_mut(&mut self) -> &mut dyn Any;

    /// Clone into a new boxed prototype.
    fn clone_boxed(&self) -> Box<dyn AnyComponent>;
}

impl<T: Component> AnyComponent for T {
    fn component_name(&self) -> &'static str {
        T::type_name()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn clone_boxed(&self) -> Box<dyn AnyComponent> {
        Box::new(self.clone())
    }
}

impl dyn AnyComponent {
    /// Downcast to a concrete component type.
    #[must_use]
    pub fn downcast_ref<T: Component>(&self) -> Option<&T> {
        self.as_any().downcast_ref::<T>()
    }

    /// Mutably downcast to a concrete component type.
    #[must_use]
    pub fn downcast_mut<T: Component>(&mut self) -> Option<&mut T> {
        self.as_any_mut().downcast_mut::<T>()
    }
}

impl fmt::Debug for dyn AnyComponent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AnyComponent({})", self.component_name())
    }
}

/// Type-erased operations for one registered component type.
#[derive(Clone, Copy)]
pub struct ComponentMeta {
    /// The registry-assigned id.
    pub id: ComponentId,
    /// The persistent type name (e.g. `"Transform"`).
    pub name: &'static str,
    /// The Rust type behind this id.
    pub type_id: TypeId,
    /// Size and alignment of one record.
    pub layout: Layout,
    /// Clone a prototype into uninitialised memory. Returns `false` without
    /// writing if the prototype is of another type.
    pub create_fn: unsafe fn(*mut u8, &dyn Any) -> bool,
    /// Run the destructor of a record in place without freeing its memory.
    pub destroy_fn: Option<unsafe fn(*mut u8)>,
    /// Build a default prototype.
    pub new_fn: fn() -> Box<dyn AnyComponent>,
    /// Encode a live record as its MessagePack payload.
    pub serialize_fn: unsafe fn(*const u8) -> Result<Vec<u8>, rmp_serde::encode::Error>,
    /// Decode a payload into a boxed prototype.
    pub deserialize_fn: fn(&[u8]) -> Result<Box<dyn AnyComponent>, rmp_serde::decode::Error>,
}

impl ComponentMeta {
    /// Build the vtable for `T` under the given id.
    #[must_use]
    pub fn of<T: Component>(id: ComponentId) -> Self {
        Self {
            id,
            name: T::type_name(),
            type_id: TypeId::of::<T>(),
            layout: Layout::new::<T>(),
            create_fn: create_in_place::<T>,
            destroy_fn: if std::mem::needs_drop::<T>() {
                Some(destroy_in_place::<T>)
            } else {
                None
            },
            new_fn: new_prototype::<T>,
            serialize_fn: serialize_record::<T>,
            deserialize_fn: deserialize_prototype::<T>,
        }
    }

    /// Distance in bytes between consecutive records in a dense column.
    #[must_use]
    pub fn stride(&self) -> usize {
        self.layout.pad_to_align().size()
    }
}

impl fmt::Debug for ComponentMeta {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentMeta")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("layout", &self.layout)
            .field("needs_drop", &self.destroy_fn.is_some())
            .finish()
    }
}

/// # Safety
///
/// `dst` must be valid for writes of `T` and correctly aligned.
unsafe fn create_in_place<T: Component>(dst: *mut u8, prototype: &dyn Any) -> bool {
    let Some(value) = prototype.downcast_ref::<T>() else {
        return false;
    };
    // SAFETY: Caller guarantees `dst` is a writable, aligned slot for `T`.
    unsafe { std::ptr::write(dst.cast::<T>(), value.clone()) };
    true
}

/// # Safety
///
/// `ptr` must point at a live `T` that is not used again afterwards.
unsafe fn destroy_in_place<T: Component>(ptr: *mut u8) {
    // SAFETY: Caller guarantees `ptr` holds a live `T`.
    unsafe { std::ptr::drop_in_place(ptr.cast::<T>()) };
}

fn new_prototype<T: Component>() -> Box<dyn AnyComponent> {
    Box::new(T::default())
}

/// # Safety
///
/// `src` must point at a live, aligned `T`.
unsafe fn serialize_record<T: Component>(
    src: *const u8,
) -> Result<Vec<u8>, rmp_serde::encode::Error> {
    // SAFETY: Caller guarantees `src` holds a live `T`.
    let value = unsafe { &*src.cast::<T>() };
    rmp_serde::to_vec_named(value)
}

fn deserialize_prototype<T: Component>(
    bytes: &[u8],
) -> Result<Box<dyn AnyComponent>, rmp_serde::decode::Error> {
    let value: T = rmp_serde::from_slice(bytes)?;
    Ok(Box::new(value))
}
