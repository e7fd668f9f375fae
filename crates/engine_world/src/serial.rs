//! Binary encoding of entity subtrees.
//!
//! Every integer is little-endian. One entity block is:
//!
//! ```text
//! u32  name_len
//! [u8] name
//! u64  component_bytes      total size of the component blocks below
//! u32  child_count
//! component blocks          component_bytes bytes
//! child entity blocks       child_count blocks
//! ```
//!
//! and one component block is a `u32` type name length, the type name, a
//! `u64` payload length and the MessagePack payload. A scene is a plain
//! concatenation of top-level entity blocks.
//!
//! Decoding first parses a whole block into a flat, parent-indexed
//! [`DecodedEntity`] list with every read bounds-checked, and only then
//! creates entities, so malformed input leaves the world untouched. Both
//! directions walk the tree with an explicit stack, so nesting depth is
//! bounded only by the input size.

use std::sync::Arc;

use engine_component::{AnyComponent, ComponentRegistry, EntityHandle};
use tracing::{debug, warn};

use crate::entity::EntityNode;
use crate::error::SerialError;
use crate::world::World;

/// A parsed entity block, not yet part of any world.
#[derive(Debug)]
struct DecodedEntity {
    name: String,
    components: Vec<Box<dyn AnyComponent>>,
    /// Index of the parent in the decoded list, `None` for the block root.
    parent: Option<usize>,
}

fn put_len_u32(out: &mut Vec<u8>, len: usize) -> Result<(), SerialError> {
    let len = u32::try_from(len).map_err(|_| SerialError::LengthOverflow(len as u64))?;
    out.extend_from_slice(&len.to_le_bytes());
    Ok(())
}

fn put_name(out: &mut Vec<u8>, name: &str) -> Result<(), SerialError> {
    put_len_u32(out, name.len())?;
    out.extend_from_slice(name.as_bytes());
    Ok(())
}

/// Bounds-checked cursor over an input buffer.
struct Reader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    fn take(&mut self, needed: usize) -> Result<&'a [u8], SerialError> {
        let remaining = self.remaining();
        if needed > remaining {
            return Err(SerialError::Truncated { needed, remaining });
        }
        let bytes = &self.data[self.pos..self.pos + needed];
        self.pos += needed;
        Ok(bytes)
    }

    fn u32(&mut self) -> Result<u32, SerialError> {
        let mut bytes = [0; 4];
        bytes.copy_from_slice(self.take(4)?);
        Ok(u32::from_le_bytes(bytes))
    }

    fn u64(&mut self) -> Result<u64, SerialError> {
        let mut bytes = [0; 8];
        bytes.copy_from_slice(self.take(8)?);
        Ok(u64::from_le_bytes(bytes))
    }

    fn len_u64(&mut self) -> Result<usize, SerialError> {
        let len = self.u64()?;
        usize::try_from(len).map_err(|_| SerialError::LengthOverflow(len))
    }

    fn name(&mut self) -> Result<&'a str, SerialError> {
        let len = self.u32()? as usize;
        Ok(std::str::from_utf8(self.take(len)?)?)
    }
}

/// Parse one entity block header and its components. Returns the entity and
/// its child count.
fn decode_block(
    reader: &mut Reader<'_>,
    registry: &ComponentRegistry,
    parent: Option<usize>,
) -> Result<(DecodedEntity, usize), SerialError> {
    let name = reader.name()?.to_string();
    let component_bytes = reader.len_u64()?;
    let child_count = reader.u32()? as usize;

    let mut blocks = Reader {
        data: reader.take(component_bytes)?,
        pos: 0,
    };
    let mut components = Vec::new();
    while blocks.remaining() > 0 {
        let type_name = blocks.name()?;
        let payload_len = blocks.len_u64()?;
        let payload = blocks.take(payload_len)?;

        let Some(meta) = registry
            .name_to_component_id(type_name)
            .and_then(|id| registry.meta(id))
        else {
            debug!(component = type_name, "skipping unknown component type");
            continue;
        };
        match (meta.deserialize_fn)(payload) {
            Ok(component) => components.push(component),
            Err(error) => warn!(
                component = type_name,
                entity = %name,
                %error,
                "skipping undecodable component payload"
            ),
        }
    }

    let entity = DecodedEntity {
        name,
        components,
        parent,
    };
    Ok((entity, child_count))
}

/// Parse one entity block and all of its descendants, parents first.
fn decode_entity(
    reader: &mut Reader<'_>,
    registry: &ComponentRegistry,
) -> Result<Vec<DecodedEntity>, SerialError> {
    let (root, child_count) = decode_block(reader, registry, None)?;
    let mut decoded = vec![root];
    // (index into `decoded`, children still to read)
    let mut open = vec![(0, child_count)];
    while let Some((parent, pending)) = open.last_mut() {
        if *pending == 0 {
            open.pop();
            continue;
        }
        *pending -= 1;
        let parent = Some(*parent);
        let (entity, child_count) = decode_block(reader, registry, parent)?;
        open.push((decoded.len(), child_count));
        decoded.push(entity);
    }
    Ok(decoded)
}

impl World {
    /// Encode one entity and its subtree.
    ///
    /// A missing entity encodes to an empty buffer.
    ///
    /// # Errors
    ///
    /// Returns [`SerialError::Encode`] if a component payload fails to
    /// encode and [`SerialError::LengthOverflow`] if a name or count does
    /// not fit its field.
    pub fn serialize_entity(&self, handle: EntityHandle) -> Result<Vec<u8>, SerialError> {
        let mut out = Vec::new();
        self.encode_entity(handle, &mut out)?;
        Ok(out)
    }

    /// Encode several entities back to back. Missing entities are skipped.
    ///
    /// # Errors
    ///
    /// See [`World::serialize_entity`].
    pub fn serialize_entities(&self, handles: &[EntityHandle]) -> Result<Vec<u8>, SerialError> {
        let mut out = Vec::new();
        for handle in handles {
            self.encode_entity(*handle, &mut out)?;
        }
        Ok(out)
    }

    /// Encode every top-level entity, i.e. the whole scene.
    ///
    /// # Errors
    ///
    /// See [`World::serialize_entity`].
    pub fn serialize_scene(&self) -> Result<Vec<u8>, SerialError> {
        self.serialize_entities(self.entities.roots())
    }

    fn encode_entity(&self, handle: EntityHandle, out: &mut Vec<u8>) -> Result<(), SerialError> {
        for entity in self.entities.subtree(handle) {
            let Some(node) = self.entities.get(entity) else {
                continue;
            };
            self.encode_block(node, out)?;
        }
        Ok(())
    }

    /// Write one entity's header and component blocks, without its children.
    fn encode_block(&self, node: &EntityNode, out: &mut Vec<u8>) -> Result<(), SerialError> {
        put_name(out, &node.name)?;
        let count_at = out.len();
        out.extend_from_slice(&0u64.to_le_bytes());
        put_len_u32(out, node.children.len())?;

        let blocks_start = out.len();
        for entry in &node.components {
            let Some(column) = self.columns.get(&entry.component_id) else {
                continue;
            };
            let Some(payload) = column.serialize_record(entry.index) else {
                continue;
            };
            let payload = payload?;
            put_name(out, column.name())?;
            out.extend_from_slice(&(payload.len() as u64).to_le_bytes());
            out.extend_from_slice(&payload);
        }
        let component_bytes = (out.len() - blocks_start) as u64;
        out[count_at..count_at + 8].copy_from_slice(&component_bytes.to_le_bytes());
        Ok(())
    }

    /// Decode the entity block at `*cursor` and insert it under `parent`.
    ///
    /// The decoded root takes `desired` as its handle when given; its
    /// descendants get fresh handles. Component types this registry does not
    /// know are skipped. On success `*cursor` is moved past the block; on
    /// error it is left alone and nothing is inserted.
    ///
    /// # Errors
    ///
    /// Returns [`SerialError::Truncated`], [`SerialError::InvalidName`] or
    /// [`SerialError::LengthOverflow`] for malformed input and
    /// [`SerialError::EntityRejected`] if `desired` is already live or
    /// `parent` does not exist.
    pub fn deserialize_entity(
        &mut self,
        data: &[u8],
        cursor: &mut usize,
        desired: Option<EntityHandle>,
        parent: Option<EntityHandle>,
    ) -> Result<EntityHandle, SerialError> {
        let mut reader = Reader {
            data,
            pos: (*cursor).min(data.len()),
        };
        let decoded = decode_entity(&mut reader, &self.registry)?;
        let handle = self.instantiate(&decoded, desired, parent)?;
        *cursor = reader.pos;
        Ok(handle)
    }

    /// Decode every entity block in `data` as a new top-level entity.
    ///
    /// # Errors
    ///
    /// See [`World::deserialize_entity`]. Entities created by this call
    /// before the failing block are removed again.
    pub fn deserialize_entities(&mut self, data: &[u8]) -> Result<Vec<EntityHandle>, SerialError> {
        let mut cursor = 0;
        let mut created = Vec::new();
        while cursor < data.len() {
            match self.deserialize_entity(data, &mut cursor, None, None) {
                Ok(handle) => created.push(handle),
                Err(error) => {
                    for handle in created {
                        self.remove_entity(handle);
                    }
                    return Err(error);
                }
            }
        }
        debug!(entities = created.len(), bytes = data.len(), "deserialized entities");
        Ok(created)
    }

    /// Build a world from a serialized scene.
    ///
    /// # Errors
    ///
    /// See [`World::deserialize_entities`].
    pub fn from_bytes(registry: Arc<ComponentRegistry>, data: &[u8]) -> Result<Self, SerialError> {
        let mut world = Self::new(registry);
        world.deserialize_entities(data)?;
        Ok(world)
    }

    /// Create the decoded entities, parents before children. On failure
    /// everything created so far is removed again.
    fn instantiate(
        &mut self,
        decoded: &[DecodedEntity],
        desired: Option<EntityHandle>,
        parent: Option<EntityHandle>,
    ) -> Result<EntityHandle, SerialError> {
        let mut created: Vec<EntityHandle> = Vec::with_capacity(decoded.len());
        for (index, entity) in decoded.iter().enumerate() {
            let prototypes: Vec<&dyn AnyComponent> =
                entity.components.iter().map(|component| &**component).collect();
            let (handle, parent) = match entity.parent {
                Some(parent) => (None, Some(created[parent])),
                None if index == 0 => (desired, parent),
                None => (None, parent),
            };
            let Some(handle) = self.make_entity(&prototypes, &entity.name, handle, parent) else {
                if let Some(root) = created.first() {
                    self.remove_entity(*root);
                }
                return Err(SerialError::EntityRejected(entity.name.clone()));
            };
            created.push(handle);
        }
        created
            .first()
            .copied()
            .ok_or_else(|| SerialError::EntityRejected(String::new()))
    }
}

#[cfg(test)]
mod tests {
    use engine_component::Component;
    use serde::{Deserialize, Serialize};

    use super::*;

    #[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
    struct Tag {
        label: String,
    }

    impl Component for Tag {
        fn type_name() -> &'static str {
            "Tag"
        }
    }

    #[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
    struct Mass(f32);

    impl Component for Mass {
        fn type_name() -> &'static str {
            "Mass"
        }
    }

    fn registry(with_mass: bool) -> Arc<ComponentRegistry> {
        let mut registry = ComponentRegistry::new();
        registry.register::<Tag>();
        if with_mass {
            registry.register::<Mass>();
        }
        Arc::new(registry)
    }

    fn tag(label: &str) -> Tag {
        Tag {
            label: label.to_string(),
        }
    }

    #[test]
    fn test_block_layout() {
        let mut world = World::new(registry(false));
        let e = world.make_entity(&[&tag("x")], "ab", None, None).unwrap();
        let bytes = world.serialize_entity(e).unwrap();
        let payload = rmp_serde::to_vec_named(&tag("x")).unwrap();

        let mut expected = Vec::new();
        expected.extend_from_slice(&2u32.to_le_bytes());
        expected.extend_from_slice(b"ab");
        let component_bytes = 4 + 3 + 8 + payload.len();
        expected.extend_from_slice(&(component_bytes as u64).to_le_bytes());
        expected.extend_from_slice(&0u32.to_le_bytes());
        expected.extend_from_slice(&3u32.to_le_bytes());
        expected.extend_from_slice(b"Tag");
        expected.extend_from_slice(&(payload.len() as u64).to_le_bytes());
        expected.extend_from_slice(&payload);
        assert_eq!(bytes, expected);
    }

    #[test]
    fn test_subtree_roundtrip() {
        let mut world = World::new(registry(true));
        let root = world.make_entity(&[&tag("root"), &Mass(2.0)], "root", None, None).unwrap();
        let a = world.make_entity(&[&tag("a")], "a", None, Some(root)).unwrap();
        world.make_entity(&[], "a1", None, Some(a)).unwrap();
        world.make_entity(&[&Mass(1.0)], "b", None, Some(root)).unwrap();

        let bytes = world.serialize_entity(root).unwrap();
        let mut restored = World::new(registry(true));
        let mut cursor = 0;
        let copy = restored
            .deserialize_entity(&bytes, &mut cursor, Some(root), None)
            .unwrap();
        assert_eq!(copy, root);
        assert_eq!(cursor, bytes.len());
        assert_eq!(restored.entity_count(), 4);
        assert_eq!(restored.get_component::<Tag>(root), Some(&tag("root")));
        assert_eq!(restored.get_component::<Mass>(root), Some(&Mass(2.0)));

        let names: Vec<_> = restored
            .all_entity_handles()
            .into_iter()
            .map(|h| restored.get_entity(h).unwrap().name().to_string())
            .collect();
        assert_eq!(names, vec!["root", "a", "a1", "b"]);

        // Re-encoding yields the same bytes.
        assert_eq!(restored.serialize_entity(root).unwrap(), bytes);
    }

    #[test]
    fn test_unknown_types_are_skipped() {
        let mut world = World::new(registry(true));
        let e = world.make_entity(&[&Mass(3.0), &tag("kept")], "e", None, None).unwrap();
        world.make_entity(&[], "child", None, Some(e)).unwrap();
        let bytes = world.serialize_entity(e).unwrap();

        let mut restored = World::new(registry(false));
        let handles = restored.deserialize_entities(&bytes).unwrap();
        assert_eq!(handles.len(), 1);
        let node = restored.get_entity(handles[0]).unwrap();
        assert_eq!(node.components().len(), 1);
        assert_eq!(node.children().len(), 1);
        assert_eq!(restored.get_component::<Tag>(handles[0]), Some(&tag("kept")));
    }

    #[test]
    fn test_truncated_input_inserts_nothing() {
        let mut world = World::new(registry(false));
        let root = world.make_entity(&[&tag("r")], "root", None, None).unwrap();
        world.make_entity(&[&tag("c")], "child", None, Some(root)).unwrap();
        let bytes = world.serialize_entity(root).unwrap();

        for len in 0..bytes.len() {
            let mut target = World::new(registry(false));
            let mut cursor = 0;
            let result = target.deserialize_entity(&bytes[..len], &mut cursor, None, None);
            assert!(result.is_err(), "prefix of {len} bytes decoded");
            assert_eq!(cursor, 0);
            assert_eq!(target.entity_count(), 0);
        }
    }

    #[test]
    fn test_invalid_name_is_an_error() {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&2u32.to_le_bytes());
        bytes.extend_from_slice(&[0xff, 0xfe]);
        bytes.extend_from_slice(&0u64.to_le_bytes());
        bytes.extend_from_slice(&0u32.to_le_bytes());
        let mut world = World::new(registry(false));
        assert!(matches!(
            world.deserialize_entities(&bytes),
            Err(SerialError::InvalidName(_))
        ));
    }

    #[test]
    fn test_bad_payload_is_skipped() {
        let mut bytes = Vec::new();
        put_name(&mut bytes, "e").unwrap();
        let mut block = Vec::new();
        put_name(&mut block, "Tag").unwrap();
        block.extend_from_slice(&1u64.to_le_bytes());
        block.push(0xc1);
        bytes.extend_from_slice(&(block.len() as u64).to_le_bytes());
        bytes.extend_from_slice(&0u32.to_le_bytes());
        bytes.extend_from_slice(&block);

        let mut world = World::new(registry(false));
        let handles = world.deserialize_entities(&bytes).unwrap();
        assert!(world.get_entity(handles[0]).unwrap().components().is_empty());
    }

    #[test]
    fn test_live_desired_handle_is_rejected() {
        let mut world = World::new(registry(false));
        let e = world.make_entity(&[], "e", None, None).unwrap();
        let bytes = world.serialize_entity(e).unwrap();
        let mut cursor = 0;
        assert!(matches!(
            world.deserialize_entity(&bytes, &mut cursor, Some(e), None),
            Err(SerialError::EntityRejected(_))
        ));
        assert_eq!(world.entity_count(), 1);
    }

    #[test]
    fn test_missing_entity_encodes_empty() {
        let world = World::new(registry(false));
        assert!(world.serialize_entity(EntityHandle::generate()).unwrap().is_empty());
    }

    #[test]
    fn test_deep_chain_roundtrip() {
        let mut world = World::new(registry(false));
        let root = world.make_entity(&[&tag("0")], "n", None, None).unwrap();
        let mut parent = root;
        for depth in 1..5_000 {
            parent = world
                .make_entity(&[&tag(&depth.to_string())], "n", None, Some(parent))
                .unwrap();
        }
        let bytes = world.serialize_entity(root).unwrap();

        let restored = World::from_bytes(registry(false), &bytes).unwrap();
        assert_eq!(restored.entity_count(), 5_000);
        let chain = restored.all_entity_handles();
        assert_eq!(restored.get_component::<Tag>(chain[4_999]), Some(&tag("4999")));
        assert_eq!(restored.get_entity(chain[4_999]).unwrap().parent(), Some(chain[4_998]));
        assert_eq!(restored.serialize_entity(chain[0]).unwrap(), bytes);
    }

    #[test]
    fn test_truncated_deep_chain_inserts_nothing() {
        let mut bytes = Vec::new();
        for _ in 0..1_000 {
            put_name(&mut bytes, "n").unwrap();
            bytes.extend_from_slice(&0u64.to_le_bytes());
            bytes.extend_from_slice(&1u32.to_le_bytes());
        }
        let mut world = World::new(registry(false));
        assert!(matches!(
            world.deserialize_entities(&bytes),
            Err(SerialError::Truncated { .. })
        ));
        assert_eq!(world.entity_count(), 0);
    }

    #[test]
    fn test_scene_roundtrip_through_from_bytes() {
        let mut world = World::new(registry(false));
        world.make_entity(&[&tag("one")], "one", None, None).unwrap();
        world.make_entity(&[&tag("two")], "two", None, None).unwrap();
        let bytes = world.serialize_scene().unwrap();

        let restored = World::from_bytes(registry(false), &bytes).unwrap();
        assert_eq!(restored.entity_count(), 2);
        let names: Vec<_> = restored
            .entity_handles(None)
            .into_iter()
            .map(|h| restored.get_entity(h).unwrap().name().to_string())
            .collect();
        assert_eq!(names, vec!["one", "two"]);
    }
}
