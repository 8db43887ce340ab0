//! # Component Manager
//!
//! One dense table per kind plus an `SgId -> Slot` map. The slot is the
//! stable handle: `(table, index)`. Indices change when a destroy moves the
//! last record into the hole, and the map entry for the moved record is
//! patched in the same call.
//!
//! Transforms and meshes share a table so hierarchy code never cares which
//! of the two it is walking.

use std::collections::HashMap;
use std::sync::Arc;

use cadence_shared::{IdAllocator, SgId};
use glam::Mat4;

use crate::component::{ComponentKind, ComponentRef, Material, Shader, Texture};
use crate::error::{SceneError, SceneResult};
use crate::geometry::Geometry;
use crate::table::{DenseTable, TableRecord};
use crate::transform::{MeshBinding, Staleness, Transform};

/// Where a component lives.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Slot {
    /// Kind, which also selects the table.
    pub kind: ComponentKind,
    /// Index within that table.
    pub index: usize,
}

/// Owner of every component on the graphics thread.
///
/// # Example
///
/// ```rust,ignore
/// let mut scene = ComponentManager::new();
/// let root = scene.create(ComponentKind::Transform, "root");
/// let arm = scene.create(ComponentKind::Transform, "arm");
/// scene.add_child(root, arm)?;
/// scene.set_position(arm, Vec3::X)?;
/// scene.rebuild_matrices(root)?;
/// ```
#[derive(Debug)]
pub struct ComponentManager {
    ids: Arc<IdAllocator>,
    slots: HashMap<SgId, Slot>,
    pub(crate) transforms: DenseTable<Transform>,
    pub(crate) geometries: DenseTable<Geometry>,
    pub(crate) materials: DenseTable<Material>,
    pub(crate) shaders: DenseTable<Shader>,
    pub(crate) textures: DenseTable<Texture>,
    pub(crate) scratch_ids: Vec<SgId>,
    pub(crate) scratch_nodes: Vec<(SgId, Mat4)>,
}

impl Default for ComponentManager {
    fn default() -> Self {
        Self::new()
    }
}

impl ComponentManager {
    /// Creates an empty manager with its own ID source.
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(Arc::new(IdAllocator::new()), 0, 0)
    }

    /// Creates a manager sharing `ids` with the producer side.
    ///
    /// # Arguments
    ///
    /// * `ids` - ID source also used by the control thread
    /// * `transforms` - Transform/mesh table pre-allocation
    /// * `geometries` - Geometry table pre-allocation
    #[must_use]
    pub fn with_capacity(ids: Arc<IdAllocator>, transforms: usize, geometries: usize) -> Self {
        Self {
            ids,
            slots: HashMap::with_capacity(transforms + geometries),
            transforms: DenseTable::with_capacity(transforms),
            geometries: DenseTable::with_capacity(geometries),
            materials: DenseTable::default(),
            shaders: DenseTable::default(),
            textures: DenseTable::default(),
            scratch_ids: Vec::new(),
            scratch_nodes: Vec::new(),
        }
    }

    /// The shared ID source.
    #[must_use]
    pub fn id_allocator(&self) -> &Arc<IdAllocator> {
        &self.ids
    }

    // =========================================================================
    // Create / lookup
    // =========================================================================

    /// Creates a component with a fresh ID and returns it.
    ///
    /// Textures start at 0x0; see [`ComponentManager::resize_texture`].
    pub fn create(&mut self, kind: ComponentKind, name: &str) -> SgId {
        let id = self.ids.allocate();
        self.insert_fresh(kind, id, name);
        id
    }

    /// Creates a component under an ID chosen by the producer.
    ///
    /// The shared allocator is moved past `id`, so a later
    /// [`ComponentManager::create`] cannot hand it out again.
    ///
    /// # Errors
    ///
    /// [`SceneError::NullId`] for NULL, [`SceneError::DuplicateId`] if the
    /// ID is live.
    pub fn insert(&mut self, kind: ComponentKind, id: SgId, name: &str) -> SceneResult<()> {
        if id.is_null() {
            return Err(SceneError::NullId);
        }
        if self.slots.contains_key(&id) {
            return Err(SceneError::DuplicateId(id));
        }
        self.ids.reserve(id);
        self.insert_fresh(kind, id, name);
        Ok(())
    }

    fn insert_fresh(&mut self, kind: ComponentKind, id: SgId, name: &str) {
        let index = match kind {
            ComponentKind::Transform => self.transforms.push(Transform::new(id, name)),
            ComponentKind::Mesh => {
                let mut node = Transform::new(id, name);
                node.mesh = Some(MeshBinding::default());
                self.transforms.push(node)
            }
            ComponentKind::Geometry => self.geometries.push(Geometry::new(id, name)),
            ComponentKind::Material => self.materials.push(Material::new(id, name)),
            ComponentKind::Shader => self.shaders.push(Shader::new(id, name)),
            ComponentKind::Texture => self.textures.push(Texture::new(id, name, 0, 0)),
        };
        self.slots.insert(id, Slot { kind, index });
        tracing::debug!(%id, %kind, name, "component created");
    }

    /// Where `id` lives, if it is live.
    #[inline]
    #[must_use]
    pub fn slot(&self, id: SgId) -> Option<Slot> {
        self.slots.get(&id).copied()
    }

    /// True if `id` names a live component.
    #[inline]
    #[must_use]
    pub fn contains(&self, id: SgId) -> bool {
        self.slots.contains_key(&id)
    }

    /// Kind of `id`, if live.
    #[must_use]
    pub fn kind_of(&self, id: SgId) -> Option<ComponentKind> {
        self.slot(id).map(|slot| slot.kind)
    }

    /// Total live components.
    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// True if nothing is live.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Live components of one kind.
    #[must_use]
    pub fn count(&self, kind: ComponentKind) -> usize {
        match kind {
            ComponentKind::Transform | ComponentKind::Mesh => self
                .transforms
                .iter()
                .filter(|node| node.is_mesh() == (kind == ComponentKind::Mesh))
                .count(),
            ComponentKind::Geometry => self.geometries.len(),
            ComponentKind::Material => self.materials.len(),
            ComponentKind::Shader => self.shaders.len(),
            ComponentKind::Texture => self.textures.len(),
        }
    }

    /// Looks up any component.
    ///
    /// # Errors
    ///
    /// [`SceneError::NotFound`] if `id` is not live.
    pub fn get(&self, id: SgId) -> SceneResult<ComponentRef<'_>> {
        let slot = self.slot(id).ok_or(SceneError::NotFound(id))?;
        let missing = SceneError::NotFound(id);
        Ok(match slot.kind {
            ComponentKind::Transform => {
                ComponentRef::Transform(self.transforms.get(slot.index).ok_or(missing)?)
            }
            ComponentKind::Mesh => ComponentRef::Mesh(self.transforms.get(slot.index).ok_or(missing)?),
            ComponentKind::Geometry => {
                ComponentRef::Geometry(self.geometries.get(slot.index).ok_or(missing)?)
            }
            ComponentKind::Material => {
                ComponentRef::Material(self.materials.get(slot.index).ok_or(missing)?)
            }
            ComponentKind::Shader => ComponentRef::Shader(self.shaders.get(slot.index).ok_or(missing)?),
            ComponentKind::Texture => {
                ComponentRef::Texture(self.textures.get(slot.index).ok_or(missing)?)
            }
        })
    }

    /// Resolves `id` to an index, checking its kind.
    pub(crate) fn index_of(
        &self,
        id: SgId,
        expected: &'static str,
        accepts: fn(ComponentKind) -> bool,
    ) -> SceneResult<usize> {
        let slot = self.slot(id).ok_or(SceneError::NotFound(id))?;
        if accepts(slot.kind) {
            Ok(slot.index)
        } else {
            Err(SceneError::WrongKind {
                id,
                expected,
                found: slot.kind,
            })
        }
    }

    /// Index of a transform or mesh.
    #[inline]
    pub(crate) fn node_index(&self, id: SgId) -> SceneResult<usize> {
        self.index_of(id, "transform", ComponentKind::is_node)
    }

    /// A transform or mesh node.
    ///
    /// # Errors
    ///
    /// [`SceneError::NotFound`] or [`SceneError::WrongKind`].
    pub fn transform(&self, id: SgId) -> SceneResult<&Transform> {
        let index = self.node_index(id)?;
        self.transforms.get(index).ok_or(SceneError::NotFound(id))
    }

    /// Mutable node. Prefer the setters, which maintain staleness.
    ///
    /// # Errors
    ///
    /// [`SceneError::NotFound`] or [`SceneError::WrongKind`].
    pub fn transform_mut(&mut self, id: SgId) -> SceneResult<&mut Transform> {
        let index = self.node_index(id)?;
        self.transforms.get_mut(index).ok_or(SceneError::NotFound(id))
    }

    /// A mesh node.
    ///
    /// # Errors
    ///
    /// [`SceneError::NotFound`] or [`SceneError::WrongKind`].
    pub fn mesh(&self, id: SgId) -> SceneResult<&Transform> {
        let index = self.index_of(id, "mesh", |kind| kind == ComponentKind::Mesh)?;
        self.transforms.get(index).ok_or(SceneError::NotFound(id))
    }

    /// A geometry.
    ///
    /// # Errors
    ///
    /// [`SceneError::NotFound`] or [`SceneError::WrongKind`].
    pub fn geometry(&self, id: SgId) -> SceneResult<&Geometry> {
        let index = self.index_of(id, "geometry", |kind| kind == ComponentKind::Geometry)?;
        self.geometries.get(index).ok_or(SceneError::NotFound(id))
    }

    /// Mutable geometry.
    ///
    /// # Errors
    ///
    /// [`SceneError::NotFound`] or [`SceneError::WrongKind`].
    pub fn geometry_mut(&mut self, id: SgId) -> SceneResult<&mut Geometry> {
        let index = self.index_of(id, "geometry", |kind| kind == ComponentKind::Geometry)?;
        self.geometries.get_mut(index).ok_or(SceneError::NotFound(id))
    }

    /// A material.
    ///
    /// # Errors
    ///
    /// [`SceneError::NotFound`] or [`SceneError::WrongKind`].
    pub fn material(&self, id: SgId) -> SceneResult<&Material> {
        let index = self.index_of(id, "material", |kind| kind == ComponentKind::Material)?;
        self.materials.get(index).ok_or(SceneError::NotFound(id))
    }

    /// Mutable material.
    ///
    /// # Errors
    ///
    /// [`SceneError::NotFound`] or [`SceneError::WrongKind`].
    pub fn material_mut(&mut self, id: SgId) -> SceneResult<&mut Material> {
        let index = self.index_of(id, "material", |kind| kind == ComponentKind::Material)?;
        self.materials.get_mut(index).ok_or(SceneError::NotFound(id))
    }

    /// A shader.
    ///
    /// # Errors
    ///
    /// [`SceneError::NotFound`] or [`SceneError::WrongKind`].
    pub fn shader(&self, id: SgId) -> SceneResult<&Shader> {
        let index = self.index_of(id, "shader", |kind| kind == ComponentKind::Shader)?;
        self.shaders.get(index).ok_or(SceneError::NotFound(id))
    }

    /// Mutable shader.
    ///
    /// # Errors
    ///
    /// [`SceneError::NotFound`] or [`SceneError::WrongKind`].
    pub fn shader_mut(&mut self, id: SgId) -> SceneResult<&mut Shader> {
        let index = self.index_of(id, "shader", |kind| kind == ComponentKind::Shader)?;
        self.shaders.get_mut(index).ok_or(SceneError::NotFound(id))
    }

    /// A texture.
    ///
    /// # Errors
    ///
    /// [`SceneError::NotFound`] or [`SceneError::WrongKind`].
    pub fn texture(&self, id: SgId) -> SceneResult<&Texture> {
        let index = self.index_of(id, "texture", |kind| kind == ComponentKind::Texture)?;
        self.textures.get(index).ok_or(SceneError::NotFound(id))
    }

    /// Mutable texture.
    ///
    /// # Errors
    ///
    /// [`SceneError::NotFound`] or [`SceneError::WrongKind`].
    pub fn texture_mut(&mut self, id: SgId) -> SceneResult<&mut Texture> {
        let index = self.index_of(id, "texture", |kind| kind == ComponentKind::Texture)?;
        self.textures.get_mut(index).ok_or(SceneError::NotFound(id))
    }

    /// All transform and mesh nodes in storage order.
    #[must_use]
    pub fn transforms(&self) -> &[Transform] {
        self.transforms.as_slice()
    }

    /// All geometries in storage order.
    #[must_use]
    pub fn geometries(&self) -> &[Geometry] {
        self.geometries.as_slice()
    }

    /// Geometries, mutably, for draining uploads. Structure stays fixed.
    pub fn geometries_mut(&mut self) -> std::slice::IterMut<'_, Geometry> {
        self.geometries.iter_mut()
    }

    /// All materials in storage order.
    #[must_use]
    pub fn materials(&self) -> &[Material] {
        self.materials.as_slice()
    }

    /// All textures in storage order.
    #[must_use]
    pub fn textures(&self) -> &[Texture] {
        self.textures.as_slice()
    }

    // =========================================================================
    // Mutation
    // =========================================================================

    /// Renames any component.
    ///
    /// # Errors
    ///
    /// [`SceneError::NotFound`] if `id` is not live.
    pub fn set_name(&mut self, id: SgId, name: &str) -> SceneResult<()> {
        let slot = self.slot(id).ok_or(SceneError::NotFound(id))?;
        let record: Option<&mut dyn TableRecord> = match slot.kind {
            ComponentKind::Transform | ComponentKind::Mesh => self
                .transforms
                .get_mut(slot.index)
                .map(|r| r as &mut dyn TableRecord),
            ComponentKind::Geometry => self
                .geometries
                .get_mut(slot.index)
                .map(|r| r as &mut dyn TableRecord),
            ComponentKind::Material => self
                .materials
                .get_mut(slot.index)
                .map(|r| r as &mut dyn TableRecord),
            ComponentKind::Shader => self
                .shaders
                .get_mut(slot.index)
                .map(|r| r as &mut dyn TableRecord),
            ComponentKind::Texture => self
                .textures
                .get_mut(slot.index)
                .map(|r| r as &mut dyn TableRecord),
        };
        record.ok_or(SceneError::NotFound(id))?.set_name(name);
        Ok(())
    }

    /// Sets a texture's size, discarding its pixels.
    ///
    /// # Errors
    ///
    /// [`SceneError::NotFound`] or [`SceneError::WrongKind`].
    pub fn resize_texture(&mut self, id: SgId, width: u32, height: u32) -> SceneResult<()> {
        let texture = self.texture_mut(id)?;
        texture.width = width;
        texture.height = height;
        texture.pixels.clear();
        texture.pixels.resize(Texture::byte_len(width, height), 0);
        texture.upload_pending = true;
        Ok(())
    }

    /// Replaces a texture's pixels.
    ///
    /// # Errors
    ///
    /// [`SceneError::TextureSizeMismatch`] if `pixels` is not exactly
    /// `width * height * 4` bytes.
    pub fn write_texture(&mut self, id: SgId, pixels: &[u8]) -> SceneResult<()> {
        let texture = self.texture_mut(id)?;
        let expected = Texture::byte_len(texture.width, texture.height);
        if pixels.len() != expected {
            return Err(SceneError::TextureSizeMismatch {
                texture: id,
                expected,
                actual: pixels.len(),
            });
        }
        texture.pixels.copy_from_slice(pixels);
        texture.upload_pending = true;
        Ok(())
    }

    /// Points a material at a shader (NULL clears it).
    ///
    /// # Errors
    ///
    /// Fails if either ID is not live or has the wrong kind.
    pub fn set_material_shader(&mut self, material: SgId, shader: SgId) -> SceneResult<()> {
        if !shader.is_null() {
            self.shader(shader)?;
        }
        self.material_mut(material)?.shader = shader;
        Ok(())
    }

    /// Writes one vec4 uniform.
    ///
    /// # Errors
    ///
    /// [`SceneError::InvalidUniformSlot`] if `slot` is out of range.
    pub fn set_material_uniform(
        &mut self,
        material: SgId,
        slot: u32,
        value: glam::Vec4,
    ) -> SceneResult<()> {
        let target = self.material_mut(material)?;
        let entry = target
            .uniforms
            .get_mut(slot as usize)
            .ok_or(SceneError::InvalidUniformSlot { material, slot })?;
        *entry = value;
        target.uniforms_dirty = true;
        Ok(())
    }

    /// Destroys a component.
    ///
    /// Deletion is shallow:
    /// - a node's children move to the node's former parent (or become
    ///   roots) and are marked for world recomputation
    /// - a mesh is unbound from its geometry
    /// - meshes referencing a destroyed geometry or material lose that
    ///   reference; materials referencing a destroyed shader lose it
    /// - geometries drawn with a destroyed material are rebatched
    ///
    /// Returns the kind that was destroyed.
    ///
    /// # Errors
    ///
    /// [`SceneError::NotFound`] if `id` is not live.
    pub fn destroy(&mut self, id: SgId) -> SceneResult<ComponentKind> {
        let slot = self.slot(id).ok_or(SceneError::NotFound(id))?;
        match slot.kind {
            ComponentKind::Transform | ComponentKind::Mesh => self.orphan_node(id)?,
            ComponentKind::Geometry => {
                let bound = self
                    .geometry(id)
                    .map(|geometry| geometry.bindings().to_vec())
                    .unwrap_or_default();
                for mesh in bound {
                    if let Ok(node) = self.transform_mut(mesh) {
                        if let Some(binding) = node.mesh.as_mut() {
                            binding.geometry = SgId::NULL;
                        }
                    }
                }
            }
            ComponentKind::Material => {
                let mut affected = Vec::new();
                for node in self.transforms.iter_mut() {
                    if let Some(binding) = node.mesh.as_mut() {
                        if binding.material == id {
                            binding.material = SgId::NULL;
                            affected.push(binding.geometry);
                        }
                    }
                }
                // Those meshes now batch under NULL.
                for geometry in affected {
                    if let Ok(target) = self.geometry_mut(geometry) {
                        target.instances_stale = true;
                    }
                }
            }
            ComponentKind::Shader => {
                for material in self.materials.iter_mut() {
                    if material.shader == id {
                        material.shader = SgId::NULL;
                    }
                }
            }
            ComponentKind::Texture => {}
        }
        self.remove_slot(id, slot);
        tracing::debug!(%id, kind = %slot.kind, "component destroyed");
        Ok(slot.kind)
    }

    /// Detaches a node from its parent, hands its children to that parent
    /// and drops its geometry binding.
    fn orphan_node(&mut self, id: SgId) -> SceneResult<()> {
        let (parent, children, binding) = {
            let node = self.transform_mut(id)?;
            (
                node.parent,
                std::mem::take(&mut node.children),
                node.mesh.take(),
            )
        };

        self.detach_from_parent(id);

        for child in children {
            if let Ok(node) = self.transform_mut(child) {
                node.parent = parent;
            }
            if let Ok(new_parent) = self.transform_mut(parent) {
                new_parent.children.push(child);
            }
            if let Err(err) = self.set_stale(child, Staleness::World) {
                tracing::warn!(%id, %child, %err, "child vanished while orphaning");
            }
        }

        if let Some(binding) = binding {
            if !binding.geometry.is_null() {
                self.unbind_mesh(binding.geometry, id);
            }
        }
        Ok(())
    }

    /// Swap-removes the record and patches the moved record's slot.
    fn remove_slot(&mut self, id: SgId, slot: Slot) {
        let moved = match slot.kind {
            ComponentKind::Transform | ComponentKind::Mesh => {
                self.transforms.swap_remove(slot.index).1
            }
            ComponentKind::Geometry => self.geometries.swap_remove(slot.index).1,
            ComponentKind::Material => self.materials.swap_remove(slot.index).1,
            ComponentKind::Shader => self.shaders.swap_remove(slot.index).1,
            ComponentKind::Texture => self.textures.swap_remove(slot.index).1,
        };
        self.slots.remove(&id);
        if let Some(moved) = moved {
            if let Some(moved_slot) = self.slots.get_mut(&moved) {
                moved_slot.index = slot.index;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    #[test]
    fn test_create_assigns_increasing_ids() {
        let mut scene = ComponentManager::new();
        let a = scene.create(ComponentKind::Transform, "a");
        let b = scene.create(ComponentKind::Geometry, "b");
        assert_eq!(a, SgId(1));
        assert_eq!(b, SgId(2));
        assert_eq!(scene.kind_of(b), Some(ComponentKind::Geometry));
        assert_eq!(scene.len(), 2);
    }

    #[test]
    fn test_insert_rejects_null_and_duplicates() {
        let mut scene = ComponentManager::new();
        assert_eq!(
            scene.insert(ComponentKind::Transform, SgId::NULL, "x"),
            Err(SceneError::NullId)
        );
        scene.insert(ComponentKind::Transform, SgId(40), "x").unwrap();
        assert_eq!(
            scene.insert(ComponentKind::Material, SgId(40), "y"),
            Err(SceneError::DuplicateId(SgId(40)))
        );
    }

    #[test]
    fn test_create_never_reuses_inserted_id() {
        let mut scene = ComponentManager::new();
        scene.insert(ComponentKind::Transform, SgId(2), "from-producer").unwrap();

        let a = scene.create(ComponentKind::Transform, "a");
        let b = scene.create(ComponentKind::Transform, "b");
        assert_ne!(a, SgId(2));
        assert_ne!(b, SgId(2));
        assert_eq!(scene.len(), 3);
        assert_eq!(scene.transforms().len(), 3);

        // Every stored record stays reachable through the map.
        scene.destroy(b).unwrap();
        for node in scene.transforms() {
            assert!(scene.contains(node.id), "{} unreachable", node.id);
        }
        assert_eq!(scene.get(SgId(2)).unwrap().name(), "from-producer");
    }

    #[test]
    fn test_wrong_kind_reported() {
        let mut scene = ComponentManager::new();
        let material = scene.create(ComponentKind::Material, "m");
        let err = scene.transform(material).unwrap_err();
        assert_eq!(
            err,
            SceneError::WrongKind {
                id: material,
                expected: "transform",
                found: ComponentKind::Material,
            }
        );
    }

    #[test]
    fn test_destroy_patches_moved_slot() {
        let mut scene = ComponentManager::new();
        let ids: Vec<SgId> = (0..5)
            .map(|i| scene.create(ComponentKind::Transform, &format!("n{i}")))
            .collect();
        for (i, &id) in ids.iter().enumerate() {
            scene.set_position(id, Vec3::splat(i as f32)).unwrap();
        }

        scene.destroy(ids[1]).unwrap();

        assert!(scene.get(ids[1]).is_err());
        assert_eq!(scene.slot(ids[4]).map(|slot| slot.index), Some(1));
        for (i, &id) in ids.iter().enumerate().filter(|(i, _)| *i != 1) {
            let node = scene.transform(id).unwrap();
            assert_eq!(node.position(), Vec3::splat(i as f32));
            assert_eq!(scene.get(id).unwrap().name(), format!("n{i}"));
        }
    }

    #[test]
    fn test_set_name_any_kind() {
        let mut scene = ComponentManager::new();
        let texture = scene.create(ComponentKind::Texture, "old");
        scene.set_name(texture, "new").unwrap();
        assert_eq!(scene.get(texture).unwrap().name(), "new");
        assert!(scene.set_name(SgId(99), "x").is_err());
    }

    #[test]
    fn test_texture_write_checks_size() {
        let mut scene = ComponentManager::new();
        let texture = scene.create(ComponentKind::Texture, "t");
        scene.resize_texture(texture, 2, 2).unwrap();

        assert!(matches!(
            scene.write_texture(texture, &[0; 8]),
            Err(SceneError::TextureSizeMismatch { expected: 16, actual: 8, .. })
        ));
        scene.write_texture(texture, &[7; 16]).unwrap();
        assert_eq!(scene.texture(texture).unwrap().pixels, vec![7; 16]);
    }

    #[test]
    fn test_destroy_shader_clears_material_reference() {
        let mut scene = ComponentManager::new();
        let shader = scene.create(ComponentKind::Shader, "s");
        let material = scene.create(ComponentKind::Material, "m");
        scene.set_material_shader(material, shader).unwrap();

        scene.destroy(shader).unwrap();
        assert_eq!(scene.material(material).unwrap().shader, SgId::NULL);
    }

    #[test]
    fn test_destroy_material_rebatches_under_null() {
        let mut scene = ComponentManager::new();
        let geo = scene.create(ComponentKind::Geometry, "g");
        let material = scene.create(ComponentKind::Material, "m");
        let mesh = SgId(90);
        scene.update_mesh(mesh, geo, material).unwrap();
        scene.rebuild_all_matrices();
        scene.rebuild_stale_geometries();

        scene.destroy(material).unwrap();
        assert_eq!(scene.rebuild_stale_geometries(), 1);
        let geometry = scene.geometry(geo).unwrap();
        assert!(geometry.batch(material).is_none());
        assert_eq!(geometry.batch(SgId::NULL).unwrap().meshes(), &[mesh]);
    }

    #[test]
    fn test_uniform_slot_bounds() {
        let mut scene = ComponentManager::new();
        let material = scene.create(ComponentKind::Material, "m");
        scene
            .set_material_uniform(material, 3, glam::Vec4::ONE)
            .unwrap();
        assert_eq!(scene.material(material).unwrap().uniforms[3], glam::Vec4::ONE);
        assert!(scene.set_material_uniform(material, 16, glam::Vec4::ONE).is_err());
    }
}
