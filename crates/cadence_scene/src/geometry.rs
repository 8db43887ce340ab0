//! # Geometry
//!
//! Vertex attributes and indices live in arenas as raw little-endian
//! floats and u32s, ready to copy into GPU buffers.
//!
//! Every mesh drawing a geometry is listed in its binding set. Bound meshes
//! are grouped by material into [`InstanceBatch`]es, one draw call each.
//! A batch holds one world matrix per mesh and is rebuilt only when some
//! bound mesh moved or changed material:
//!
//! ```text
//! rebuild_matrices            rebuild_stale_geometries
//!   mesh world changed  ──►     instances_stale ──► material #3: [M0][M2]
//!                                                   material #7: [M1]     ──► upload_pending
//! ```

use cadence_core::Arena;
use cadence_shared::{SgId, MAX_VERTEX_ATTRIBUTES};
use glam::Mat4;

use crate::component::{truncate_name, ComponentKind};
use crate::error::{SceneError, SceneResult};
use crate::manager::ComponentManager;
use crate::transform::MeshBinding;

/// Bytes per instance (one column-major 4x4 float matrix).
pub const INSTANCE_STRIDE: usize = std::mem::size_of::<Mat4>();

/// One vertex attribute stream.
#[derive(Clone, Debug, Default)]
pub struct VertexAttribute {
    num_components: u32,
    data: Arena,
}

impl VertexAttribute {
    /// Floats per vertex (0 if unset).
    #[inline]
    #[must_use]
    pub const fn num_components(&self) -> u32 {
        self.num_components
    }

    /// Raw float bytes.
    #[inline]
    #[must_use]
    pub fn bytes(&self) -> &[u8] {
        self.data.as_bytes()
    }

    /// Number of floats stored.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len() / std::mem::size_of::<f32>()
    }

    /// True if the stream is unset.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Copies the floats out.
    #[must_use]
    pub fn to_vec(&self) -> Vec<f32> {
        bytemuck::pod_collect_to_vec(self.data.as_bytes())
    }

    /// Vertices described by this stream.
    #[must_use]
    pub fn vertex_count(&self) -> usize {
        match self.num_components {
            0 => 0,
            n => self.len() / n as usize,
        }
    }
}

/// Every mesh drawing one geometry with one material.
#[derive(Clone, Debug, Default)]
pub struct InstanceBatch {
    material: SgId,
    meshes: Vec<SgId>,
    instances: Arena,
}

impl InstanceBatch {
    /// Material shared by the batch (NULL for meshes without one).
    #[inline]
    #[must_use]
    pub const fn material(&self) -> SgId {
        self.material
    }

    /// Meshes in instance order.
    #[inline]
    #[must_use]
    pub fn meshes(&self) -> &[SgId] {
        &self.meshes
    }

    /// Instances in the batch.
    #[inline]
    #[must_use]
    pub fn instance_count(&self) -> usize {
        self.instances.len() / INSTANCE_STRIDE
    }

    /// World matrices as raw bytes, ready for a GPU buffer.
    #[inline]
    #[must_use]
    pub fn instance_bytes(&self) -> &[u8] {
        self.instances.as_bytes()
    }

    /// World matrices, copied out.
    #[must_use]
    pub fn instance_matrices(&self) -> Vec<Mat4> {
        bytemuck::pod_collect_to_vec(self.instances.as_bytes())
    }
}

/// Vertex data plus the per-material instance batches.
#[derive(Clone, Debug)]
pub struct Geometry {
    pub(crate) id: SgId,
    pub(crate) name: String,
    attributes: [VertexAttribute; MAX_VERTEX_ATTRIBUTES],
    indices: Arena,
    vertex_count_override: i32,
    index_count_override: i32,
    vertices_dirty: bool,
    bindings: Vec<SgId>,
    batches: Vec<InstanceBatch>,
    pub(crate) instances_stale: bool,
    upload_pending: bool,
}

impl Geometry {
    /// Creates an empty geometry.
    #[must_use]
    pub fn new(id: SgId, name: &str) -> Self {
        Self {
            id,
            name: truncate_name(name),
            attributes: std::array::from_fn(|_| VertexAttribute::default()),
            indices: Arena::new(),
            vertex_count_override: -1,
            index_count_override: -1,
            vertices_dirty: false,
            bindings: Vec::new(),
            batches: Vec::new(),
            instances_stale: false,
            upload_pending: false,
        }
    }

    /// Attribute stream at `location`.
    #[must_use]
    pub fn attribute(&self, location: usize) -> Option<&VertexAttribute> {
        self.attributes.get(location)
    }

    /// Raw index bytes.
    #[must_use]
    pub fn index_bytes(&self) -> &[u8] {
        self.indices.as_bytes()
    }

    /// Copies the indices out.
    #[must_use]
    pub fn indices(&self) -> Vec<u32> {
        bytemuck::pod_collect_to_vec(self.indices.as_bytes())
    }

    /// Vertices to draw: the override if set, else derived from attribute 0.
    #[must_use]
    pub fn vertex_count(&self) -> usize {
        usize::try_from(self.vertex_count_override)
            .unwrap_or_else(|_| self.attributes[0].vertex_count())
    }

    /// Indices to draw: the override if set, else all indices.
    #[must_use]
    pub fn index_count(&self) -> usize {
        usize::try_from(self.index_count_override)
            .unwrap_or_else(|_| self.indices.len() / std::mem::size_of::<u32>())
    }

    /// Meshes currently drawing this geometry.
    #[must_use]
    pub fn bindings(&self) -> &[SgId] {
        &self.bindings
    }

    /// Batches from the last rebuild, ordered by material ID.
    #[must_use]
    pub fn batches(&self) -> &[InstanceBatch] {
        &self.batches
    }

    /// The batch drawn with `material`, if any mesh uses it.
    #[must_use]
    pub fn batch(&self, material: SgId) -> Option<&InstanceBatch> {
        self.batches.iter().find(|batch| batch.material == material)
    }

    /// Instances across all batches.
    #[must_use]
    pub fn instance_count(&self) -> usize {
        self.batches.iter().map(InstanceBatch::instance_count).sum()
    }

    /// Every batch's matrices, in batch order.
    #[must_use]
    pub fn instance_matrices(&self) -> Vec<Mat4> {
        self.batches
            .iter()
            .flat_map(InstanceBatch::instance_matrices)
            .collect()
    }

    /// True if a bound mesh moved since the last instance rebuild.
    #[must_use]
    pub const fn instances_stale(&self) -> bool {
        self.instances_stale
    }

    /// Hands the rebuilt batches to the renderer, once.
    pub fn take_instance_upload(&mut self) -> Option<&[InstanceBatch]> {
        if !self.upload_pending {
            return None;
        }
        self.upload_pending = false;
        Some(&self.batches)
    }

    /// Returns true once after vertex or index data changed.
    pub fn take_vertex_changes(&mut self) -> bool {
        std::mem::take(&mut self.vertices_dirty)
    }
}

impl ComponentManager {
    /// Replaces one vertex attribute stream.
    ///
    /// # Errors
    ///
    /// [`SceneError::InvalidVertexAttribute`] if `location` is out of range,
    /// `num_components` is zero, or `data` is not a whole number of vertices.
    pub fn set_vertex_attribute(
        &mut self,
        geometry: SgId,
        location: u32,
        num_components: u32,
        data: &[f32],
    ) -> SceneResult<()> {
        let target = self.geometry_mut(geometry)?;
        let invalid = SceneError::InvalidVertexAttribute {
            geometry,
            location,
            num_components,
            len: data.len(),
        };
        if num_components == 0 || data.len() % num_components as usize != 0 {
            return Err(invalid);
        }
        let attribute = target
            .attributes
            .get_mut(location as usize)
            .ok_or(invalid)?;

        attribute.num_components = num_components;
        attribute.data.clear();
        attribute.data.push_slice(data);
        target.vertices_dirty = true;
        Ok(())
    }

    /// Replaces the index array.
    ///
    /// # Errors
    ///
    /// [`SceneError::NotFound`] or [`SceneError::WrongKind`].
    pub fn set_indices(&mut self, geometry: SgId, indices: &[u32]) -> SceneResult<()> {
        let target = self.geometry_mut(geometry)?;
        target.indices.clear();
        target.indices.push_slice(indices);
        target.vertices_dirty = true;
        Ok(())
    }

    /// Overrides the vertex draw count. Negative restores the derived count.
    ///
    /// # Errors
    ///
    /// [`SceneError::NotFound`] or [`SceneError::WrongKind`].
    pub fn set_vertex_count(&mut self, geometry: SgId, count: i32) -> SceneResult<()> {
        self.geometry_mut(geometry)?.vertex_count_override = count;
        Ok(())
    }

    /// Overrides the index draw count. Negative restores the derived count.
    ///
    /// # Errors
    ///
    /// [`SceneError::NotFound`] or [`SceneError::WrongKind`].
    pub fn set_indices_count(&mut self, geometry: SgId, count: i32) -> SceneResult<()> {
        self.geometry_mut(geometry)?.index_count_override = count;
        Ok(())
    }

    /// Points a mesh at a geometry and material (either may be NULL).
    ///
    /// Creates the mesh if `mesh` is not live yet. Moving to a different
    /// geometry updates both binding sets and marks both geometries stale.
    /// A material change alone marks the geometry stale so the mesh moves
    /// to the right batch.
    ///
    /// # Errors
    ///
    /// Fails if `geometry` or `material` is not live or has the wrong kind,
    /// or if `mesh` names a non-mesh component.
    pub fn update_mesh(&mut self, mesh: SgId, geometry: SgId, material: SgId) -> SceneResult<()> {
        if !geometry.is_null() {
            self.geometry(geometry)?;
        }
        if !material.is_null() {
            self.material(material)?;
        }
        if !self.contains(mesh) {
            self.insert(ComponentKind::Mesh, mesh, "mesh")?;
        }
        let index = self.index_of(mesh, "mesh", |kind| kind == ComponentKind::Mesh)?;
        let Some(node) = self.transforms.get_mut(index) else {
            return Err(SceneError::NotFound(mesh));
        };

        let old = node.mesh.replace(MeshBinding { geometry, material }).unwrap_or_default();
        if old.geometry != geometry {
            if !old.geometry.is_null() {
                self.unbind_mesh(old.geometry, mesh);
            }
            if !geometry.is_null() {
                let target = self.geometry_mut(geometry)?;
                target.bindings.push(mesh);
                target.instances_stale = true;
            }
        } else if old.material != material && !geometry.is_null() {
            self.geometry_mut(geometry)?.instances_stale = true;
        }
        Ok(())
    }

    /// Drops `mesh` from `geometry`'s binding set.
    pub(crate) fn unbind_mesh(&mut self, geometry: SgId, mesh: SgId) {
        let Ok(target) = self.geometry_mut(geometry) else {
            return;
        };
        if let Some(position) = target.bindings.iter().position(|&m| m == mesh) {
            target.bindings.swap_remove(position);
            target.instances_stale = true;
        }
    }

    /// Groups bound meshes by material and collects their world matrices
    /// into one batch per material, then flags the geometry for upload.
    ///
    /// Returns the instance count across all batches.
    ///
    /// # Errors
    ///
    /// [`SceneError::NotFound`] or [`SceneError::WrongKind`].
    pub fn rebuild_geometry_bindings(&mut self, geometry: SgId) -> SceneResult<usize> {
        let index = self.index_of(geometry, "geometry", |kind| kind == ComponentKind::Geometry)?;

        let mut batches: Vec<InstanceBatch> = Vec::new();
        let mut count = 0;
        if let Some(target) = self.geometries.get(index) {
            for &mesh in &target.bindings {
                let node = match self.transform(mesh) {
                    Ok(node) => node,
                    Err(err) => {
                        tracing::warn!(%geometry, %mesh, %err, "stale binding");
                        continue;
                    }
                };
                let material = node.mesh.map(|binding| binding.material).unwrap_or_default();
                let position = batches
                    .iter()
                    .position(|batch| batch.material == material)
                    .unwrap_or_else(|| {
                        batches.push(InstanceBatch {
                            material,
                            ..InstanceBatch::default()
                        });
                        batches.len() - 1
                    });
                let batch = &mut batches[position];
                batch.meshes.push(mesh);
                batch.instances.push_pod(&node.world);
                count += 1;
            }
        }
        batches.sort_unstable_by_key(|batch| batch.material.raw());

        if let Some(target) = self.geometries.get_mut(index) {
            target.batches = batches;
            target.instances_stale = false;
            target.upload_pending = true;
        }
        Ok(count)
    }

    /// Rebuilds every geometry whose instance buffer is stale.
    ///
    /// Returns how many were rebuilt.
    pub fn rebuild_stale_geometries(&mut self) -> usize {
        let stale: Vec<SgId> = self
            .geometries
            .iter()
            .filter(|geometry| geometry.instances_stale)
            .map(|geometry| geometry.id)
            .collect();

        for &geometry in &stale {
            if let Err(err) = self.rebuild_geometry_bindings(geometry) {
                tracing::warn!(%geometry, %err, "instance rebuild failed");
            }
        }
        stale.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    #[test]
    fn test_vertex_attribute_validation() {
        let mut scene = ComponentManager::new();
        let geo = scene.create(ComponentKind::Geometry, "g");

        assert!(scene.set_vertex_attribute(geo, 0, 3, &[0.0; 9]).is_ok());
        assert!(matches!(
            scene.set_vertex_attribute(geo, 0, 3, &[0.0; 8]),
            Err(SceneError::InvalidVertexAttribute { len: 8, .. })
        ));
        assert!(scene.set_vertex_attribute(geo, 0, 0, &[]).is_err());
        assert!(scene.set_vertex_attribute(geo, 8, 2, &[0.0; 2]).is_err());
    }

    #[test]
    fn test_counts_derived_and_overridden() {
        let mut scene = ComponentManager::new();
        let geo = scene.create(ComponentKind::Geometry, "g");
        scene.set_vertex_attribute(geo, 0, 3, &[1.0; 12]).unwrap();
        scene.set_indices(geo, &[0, 1, 2, 2, 3, 0]).unwrap();

        let geometry = scene.geometry(geo).unwrap();
        assert_eq!(geometry.vertex_count(), 4);
        assert_eq!(geometry.index_count(), 6);
        assert_eq!(geometry.indices(), vec![0, 1, 2, 2, 3, 0]);

        scene.set_vertex_count(geo, 3).unwrap();
        scene.set_indices_count(geo, 3).unwrap();
        let geometry = scene.geometry(geo).unwrap();
        assert_eq!(geometry.vertex_count(), 3);
        assert_eq!(geometry.index_count(), 3);

        scene.set_vertex_count(geo, -1).unwrap();
        assert_eq!(scene.geometry(geo).unwrap().vertex_count(), 4);
    }

    #[test]
    fn test_update_mesh_creates_and_moves_binding() {
        let mut scene = ComponentManager::new();
        let first = scene.create(ComponentKind::Geometry, "a");
        let second = scene.create(ComponentKind::Geometry, "b");
        let material = scene.create(ComponentKind::Material, "m");
        let mesh = SgId(100);

        scene.update_mesh(mesh, first, material).unwrap();
        assert_eq!(scene.kind_of(mesh), Some(ComponentKind::Mesh));
        assert_eq!(scene.geometry(first).unwrap().bindings(), &[mesh]);

        scene.update_mesh(mesh, second, material).unwrap();
        assert!(scene.geometry(first).unwrap().bindings().is_empty());
        assert!(scene.geometry(first).unwrap().instances_stale());
        assert_eq!(scene.geometry(second).unwrap().bindings(), &[mesh]);
    }

    #[test]
    fn test_update_mesh_rejects_plain_transform() {
        let mut scene = ComponentManager::new();
        let node = scene.create(ComponentKind::Transform, "t");
        assert!(matches!(
            scene.update_mesh(node, SgId::NULL, SgId::NULL),
            Err(SceneError::WrongKind { .. })
        ));
    }

    #[test]
    fn test_instance_buffer_follows_bound_meshes() {
        let mut scene = ComponentManager::new();
        let geo = scene.create(ComponentKind::Geometry, "g");
        let left = SgId(50);
        let right = SgId(51);
        scene.update_mesh(left, geo, SgId::NULL).unwrap();
        scene.update_mesh(right, geo, SgId::NULL).unwrap();
        scene.set_position(left, Vec3::new(-1.0, 0.0, 0.0)).unwrap();
        scene.set_position(right, Vec3::new(1.0, 0.0, 0.0)).unwrap();

        scene.rebuild_all_matrices();
        assert_eq!(scene.rebuild_stale_geometries(), 1);

        let geometry = scene.geometry_mut(geo).unwrap();
        assert_eq!(geometry.instance_count(), 2);
        let translations: Vec<Vec3> = geometry
            .instance_matrices()
            .iter()
            .map(|m| m.w_axis.truncate())
            .collect();
        assert!(translations.contains(&Vec3::new(-1.0, 0.0, 0.0)));
        assert!(translations.contains(&Vec3::new(1.0, 0.0, 0.0)));

        let upload = geometry.take_instance_upload().unwrap();
        assert_eq!(upload.len(), 1);
        assert_eq!(upload[0].material(), SgId::NULL);
        assert_eq!(upload[0].instance_bytes().len(), 2 * INSTANCE_STRIDE);
        assert!(geometry.take_instance_upload().is_none());
    }

    #[test]
    fn test_one_batch_per_material() {
        let mut scene = ComponentManager::new();
        let geo = scene.create(ComponentKind::Geometry, "g");
        let red = scene.create(ComponentKind::Material, "red");
        let blue = scene.create(ComponentKind::Material, "blue");
        let (a, b, c) = (SgId(60), SgId(61), SgId(62));
        scene.update_mesh(a, geo, red).unwrap();
        scene.update_mesh(b, geo, blue).unwrap();
        scene.update_mesh(c, geo, red).unwrap();
        scene.set_position(b, Vec3::Y).unwrap();

        scene.rebuild_all_matrices();
        assert_eq!(scene.rebuild_geometry_bindings(geo).unwrap(), 3);

        let geometry = scene.geometry(geo).unwrap();
        assert_eq!(geometry.batches().len(), 2);
        let reds = geometry.batch(red).unwrap();
        assert_eq!(reds.instance_count(), 2);
        assert!(reds.meshes().contains(&a) && reds.meshes().contains(&c));
        let blues = geometry.batch(blue).unwrap();
        assert_eq!(blues.meshes(), &[b]);
        assert_eq!(blues.instance_matrices()[0].w_axis.truncate(), Vec3::Y);
    }

    #[test]
    fn test_material_change_moves_mesh_between_batches() {
        let mut scene = ComponentManager::new();
        let geo = scene.create(ComponentKind::Geometry, "g");
        let red = scene.create(ComponentKind::Material, "red");
        let blue = scene.create(ComponentKind::Material, "blue");
        let mesh = SgId(70);
        scene.update_mesh(mesh, geo, red).unwrap();
        scene.rebuild_all_matrices();
        scene.rebuild_stale_geometries();

        scene.update_mesh(mesh, geo, blue).unwrap();
        assert!(scene.geometry(geo).unwrap().instances_stale());
        assert_eq!(scene.rebuild_stale_geometries(), 1);

        let geometry = scene.geometry(geo).unwrap();
        assert!(geometry.batch(red).is_none());
        assert_eq!(geometry.batch(blue).unwrap().meshes(), &[mesh]);
    }

    #[test]
    fn test_clean_frame_rebuilds_nothing() {
        let mut scene = ComponentManager::new();
        let geo = scene.create(ComponentKind::Geometry, "g");
        scene.update_mesh(SgId(9), geo, SgId::NULL).unwrap();
        scene.rebuild_all_matrices();
        scene.rebuild_stale_geometries();

        scene.rebuild_all_matrices();
        assert_eq!(scene.rebuild_stale_geometries(), 0);
    }
}
