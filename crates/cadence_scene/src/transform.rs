//! # Transform Hierarchy
//!
//! Nodes hold local TRS, a cached local matrix and a cached world matrix.
//! Mutation only flags; [`ComponentManager::rebuild_matrices`] does the math.
//!
//! ## Staleness
//!
//! ```text
//! NONE         nothing below (or at) this node changed      -> prune
//! DESCENDENTS  something below changed, this node did not   -> recurse
//! WORLD        parent changed, local is still valid         -> world = parent * local
//! LOCAL        own TRS changed                               -> recompute local, then world
//! ```
//!
//! Flags are ordered and only ever raised by mutation. A TRS change marks
//! the node LOCAL and walks up marking ancestors DESCENDENTS, stopping at
//! the first ancestor that is already flagged (everything above it is
//! flagged too). Only a rebuild lowers a flag, and always to NONE.
//!
//! ## Rebuild
//!
//! ```text
//!           root (DESC)
//!          /          \
//!     a (NONE)      b (DESC)
//!     /    \            \
//!   ...    ...        c (LOCAL) ── whole subtree recomputed
//!   never visited
//! ```

use cadence_shared::SgId;
use glam::{Mat4, Quat, Vec3};

use crate::component::truncate_name;
use crate::error::{SceneError, SceneResult};
use crate::manager::ComponentManager;

/// How much of a node needs recomputing. Ordered by severity.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Staleness {
    /// Up to date, and so is everything below.
    #[default]
    None,
    /// Up to date, but something below is not.
    Descendents,
    /// World matrix must be recomputed.
    World,
    /// Local and world matrices must be recomputed.
    Local,
}

/// What a mesh node draws.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MeshBinding {
    /// Geometry to draw (NULL if unset).
    pub geometry: SgId,
    /// Material to draw with (NULL if unset).
    pub material: SgId,
}

/// A scene-graph node. Meshes are transforms with a [`MeshBinding`].
#[derive(Clone, Debug, PartialEq)]
pub struct Transform {
    pub(crate) id: SgId,
    pub(crate) name: String,
    pub(crate) position: Vec3,
    pub(crate) rotation: Quat,
    pub(crate) scale: Vec3,
    pub(crate) local: Mat4,
    pub(crate) world: Mat4,
    pub(crate) parent: SgId,
    pub(crate) children: Vec<SgId>,
    pub(crate) stale: Staleness,
    pub(crate) mesh: Option<MeshBinding>,
}

impl Transform {
    /// Creates an identity node with no parent.
    #[must_use]
    pub fn new(id: SgId, name: &str) -> Self {
        Self {
            id,
            name: truncate_name(name),
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            scale: Vec3::ONE,
            local: Mat4::IDENTITY,
            world: Mat4::IDENTITY,
            parent: SgId::NULL,
            children: Vec::new(),
            stale: Staleness::None,
            mesh: None,
        }
    }

    /// Local translation.
    #[inline]
    #[must_use]
    pub const fn position(&self) -> Vec3 {
        self.position
    }

    /// Local rotation.
    #[inline]
    #[must_use]
    pub const fn rotation(&self) -> Quat {
        self.rotation
    }

    /// Local scale.
    #[inline]
    #[must_use]
    pub const fn scale(&self) -> Vec3 {
        self.scale
    }

    /// Cached local matrix. Valid after a rebuild.
    #[inline]
    #[must_use]
    pub const fn local_matrix(&self) -> Mat4 {
        self.local
    }

    /// Cached world matrix. Valid after a rebuild.
    #[inline]
    #[must_use]
    pub const fn world_matrix(&self) -> Mat4 {
        self.world
    }

    /// Parent, or `None` for a root.
    #[inline]
    #[must_use]
    pub const fn parent(&self) -> Option<SgId> {
        self.parent.non_null()
    }

    /// Children in attach order (swap-remove reorders on detach).
    #[inline]
    #[must_use]
    pub fn children(&self) -> &[SgId] {
        &self.children
    }

    /// Current staleness flag.
    #[inline]
    #[must_use]
    pub const fn stale(&self) -> Staleness {
        self.stale
    }

    /// Mesh binding, if this node is a mesh.
    #[inline]
    #[must_use]
    pub const fn mesh(&self) -> Option<MeshBinding> {
        self.mesh
    }

    /// True if this node draws something.
    #[inline]
    #[must_use]
    pub const fn is_mesh(&self) -> bool {
        self.mesh.is_some()
    }

    /// translate * rotate * scale.
    #[must_use]
    pub fn compute_local(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, self.rotation, self.position)
    }
}

/// Counters from one rebuild pass.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RebuildStats {
    /// Nodes whose flag was inspected.
    pub visited: usize,
    /// NONE nodes whose subtrees were skipped.
    pub pruned: usize,
    /// Local matrices recomputed.
    pub local_recomputed: usize,
    /// World matrices recomputed.
    pub world_recomputed: usize,
    /// Geometries whose instance buffers were marked stale.
    pub geometries_marked: usize,
}

impl std::ops::AddAssign for RebuildStats {
    fn add_assign(&mut self, rhs: Self) {
        self.visited += rhs.visited;
        self.pruned += rhs.pruned;
        self.local_recomputed += rhs.local_recomputed;
        self.world_recomputed += rhs.world_recomputed;
        self.geometries_marked += rhs.geometries_marked;
    }
}

impl ComponentManager {
    // =========================================================================
    // Staleness
    // =========================================================================

    /// Raises `id`'s flag to `flag` and marks its ancestors DESCENDENTS.
    ///
    /// A lower flag never replaces a higher one. The upward walk stops at
    /// the first ancestor that is already flagged.
    ///
    /// # Errors
    ///
    /// [`SceneError::NotFound`] or [`SceneError::WrongKind`].
    pub fn set_stale(&mut self, id: SgId, flag: Staleness) -> SceneResult<()> {
        let node = self.transform_mut(id)?;
        if flag > node.stale {
            node.stale = flag;
        }

        let mut parent = node.parent;
        let mut steps = 0;
        while let Some(ancestor) = parent.non_null() {
            let Ok(node) = self.transform_mut(ancestor) else {
                break;
            };
            if node.stale > Staleness::None {
                break;
            }
            node.stale = Staleness::Descendents;
            parent = node.parent;

            steps += 1;
            if steps > self.transforms.len() {
                tracing::error!(%id, "parent chain longer than node count");
                break;
            }
        }
        Ok(())
    }

    /// Sets local translation.
    ///
    /// # Errors
    ///
    /// [`SceneError::NotFound`] or [`SceneError::WrongKind`].
    pub fn set_position(&mut self, id: SgId, position: Vec3) -> SceneResult<()> {
        self.transform_mut(id)?.position = position;
        self.set_stale(id, Staleness::Local)
    }

    /// Sets local rotation.
    ///
    /// # Errors
    ///
    /// [`SceneError::NotFound`] or [`SceneError::WrongKind`].
    pub fn set_rotation(&mut self, id: SgId, rotation: Quat) -> SceneResult<()> {
        self.transform_mut(id)?.rotation = rotation;
        self.set_stale(id, Staleness::Local)
    }

    /// Sets local scale.
    ///
    /// # Errors
    ///
    /// [`SceneError::NotFound`] or [`SceneError::WrongKind`].
    pub fn set_scale(&mut self, id: SgId, scale: Vec3) -> SceneResult<()> {
        self.transform_mut(id)?.scale = scale;
        self.set_stale(id, Staleness::Local)
    }

    // =========================================================================
    // Hierarchy
    // =========================================================================

    /// True if `ancestor` is a strict ancestor of `node`.
    #[must_use]
    pub fn is_ancestor(&self, ancestor: SgId, node: SgId) -> bool {
        let mut current = self.transform(node).map(|t| t.parent).unwrap_or_default();
        let mut steps = 0;
        while let Some(id) = current.non_null() {
            if id == ancestor {
                return true;
            }
            current = self.transform(id).map(|t| t.parent).unwrap_or_default();
            steps += 1;
            if steps > self.transforms.len() {
                return false;
            }
        }
        false
    }

    /// Attaches `child` under `parent`, detaching it from any old parent.
    ///
    /// No-op if `parent` already owns `child`. The child is marked WORLD.
    ///
    /// # Errors
    ///
    /// [`SceneError::CycleDetected`] if `child` is `parent` or one of its
    /// ancestors. The tree is left untouched.
    pub fn add_child(&mut self, parent: SgId, child: SgId) -> SceneResult<()> {
        self.node_index(parent)?;
        let current = self.transform(child)?.parent;

        if child == parent || self.is_ancestor(child, parent) {
            return Err(SceneError::CycleDetected { parent, child });
        }
        if current == parent {
            return Ok(());
        }

        self.detach_from_parent(child);
        self.transform_mut(child)?.parent = parent;
        self.transform_mut(parent)?.children.push(child);
        self.set_stale(child, Staleness::World)
    }

    /// Detaches `child` from `parent`, making it a root. Marked WORLD, since
    /// its world matrix is now its local matrix.
    ///
    /// # Errors
    ///
    /// [`SceneError::NotAChild`] if `parent` does not own `child`.
    pub fn remove_child(&mut self, parent: SgId, child: SgId) -> SceneResult<()> {
        self.node_index(parent)?;
        if self.transform(child)?.parent != parent {
            return Err(SceneError::NotAChild { parent, child });
        }
        self.detach_from_parent(child);
        self.set_stale(child, Staleness::World)
    }

    /// Detaches every child of `parent`.
    ///
    /// Returns the number of children detached.
    ///
    /// # Errors
    ///
    /// [`SceneError::NotFound`] or [`SceneError::WrongKind`] for `parent`.
    pub fn remove_all_children(&mut self, parent: SgId) -> SceneResult<usize> {
        let children = std::mem::take(&mut self.transform_mut(parent)?.children);
        let count = children.len();
        for child in children {
            if let Ok(node) = self.transform_mut(child) {
                node.parent = SgId::NULL;
            }
            self.set_stale(child, Staleness::World)?;
        }
        Ok(count)
    }

    /// Moves `child` under `parent`, or to the root when `parent` is `None`.
    ///
    /// # Errors
    ///
    /// Same as [`ComponentManager::add_child`].
    pub fn reparent(&mut self, child: SgId, parent: Option<SgId>) -> SceneResult<()> {
        match parent {
            Some(parent) => self.add_child(parent, child),
            None => {
                let Some(current) = self.transform(child)?.parent() else {
                    return Ok(());
                };
                self.remove_child(current, child)
            }
        }
    }

    /// Unlinks `child` from its parent's child list and clears its parent.
    /// Does not touch staleness.
    pub(crate) fn detach_from_parent(&mut self, child: SgId) {
        let Ok(node) = self.transform_mut(child) else {
            return;
        };
        let parent = std::mem::take(&mut node.parent);
        if let Ok(parent) = self.transform_mut(parent) {
            if let Some(position) = parent.children.iter().position(|&c| c == child) {
                parent.children.swap_remove(position);
            }
        }
    }

    // =========================================================================
    // Rebuild
    // =========================================================================

    /// Recomputes stale matrices in the subtree rooted at `root`.
    ///
    /// NONE subtrees are skipped after one flag check. Every node reached
    /// ends at NONE. Meshes whose world matrix changed mark their geometry's
    /// instance buffer stale.
    ///
    /// If `root` has a parent, that parent's cached world matrix is used as
    /// the base, so rebuild from the top of the stale chain.
    ///
    /// # Errors
    ///
    /// [`SceneError::NotFound`] or [`SceneError::WrongKind`] for `root`.
    pub fn rebuild_matrices(&mut self, root: SgId) -> SceneResult<RebuildStats> {
        self.node_index(root)?;

        let mut stats = RebuildStats::default();
        let mut stack = std::mem::take(&mut self.scratch_ids);
        let mut touched_geometries = Vec::new();
        stack.clear();
        stack.push(root);

        while let Some(id) = stack.pop() {
            let Ok(index) = self.node_index(id) else {
                tracing::warn!(%id, "dangling child during rebuild");
                continue;
            };
            let Some(node) = self.transforms.get_mut(index) else {
                continue;
            };
            match node.stale {
                Staleness::None => {
                    stats.visited += 1;
                    stats.pruned += 1;
                }
                Staleness::Descendents => {
                    stats.visited += 1;
                    node.stale = Staleness::None;
                    stack.extend(node.children.iter().copied());
                }
                Staleness::World | Staleness::Local => {
                    let base = self.parent_world(id);
                    self.rebuild_subtree(id, base, &mut stats, &mut touched_geometries);
                }
            }
        }
        self.scratch_ids = stack;

        for geometry in touched_geometries {
            if let Ok(geometry) = self.geometry_mut(geometry) {
                if !geometry.instances_stale {
                    geometry.instances_stale = true;
                    stats.geometries_marked += 1;
                }
            }
        }
        Ok(stats)
    }

    /// Rebuilds every root whose subtree has anything stale.
    pub fn rebuild_all_matrices(&mut self) -> RebuildStats {
        let roots: Vec<SgId> = self
            .transforms
            .iter()
            .filter(|node| node.parent.is_null() && node.stale != Staleness::None)
            .map(|node| node.id)
            .collect();

        let mut stats = RebuildStats::default();
        for root in roots {
            match self.rebuild_matrices(root) {
                Ok(pass) => stats += pass,
                Err(err) => tracing::warn!(%root, %err, "root vanished before rebuild"),
            }
        }
        stats
    }

    /// Roots of the forest, in storage order.
    #[must_use]
    pub fn roots(&self) -> Vec<SgId> {
        self.transforms
            .iter()
            .filter(|node| node.parent.is_null())
            .map(|node| node.id)
            .collect()
    }

    fn parent_world(&self, id: SgId) -> Mat4 {
        self.transform(id)
            .ok()
            .and_then(Transform::parent)
            .and_then(|parent| self.transform(parent).ok())
            .map_or(Mat4::IDENTITY, |parent| parent.world)
    }

    /// Recomputes every node under (and including) `top` regardless of flag.
    fn rebuild_subtree(
        &mut self,
        top: SgId,
        base: Mat4,
        stats: &mut RebuildStats,
        touched_geometries: &mut Vec<SgId>,
    ) {
        let mut work = std::mem::take(&mut self.scratch_nodes);
        work.clear();
        work.push((top, base));

        while let Some((id, parent_world)) = work.pop() {
            let Ok(index) = self.node_index(id) else {
                tracing::warn!(%id, "dangling child during rebuild");
                continue;
            };
            let Some(node) = self.transforms.get_mut(index) else {
                continue;
            };

            stats.visited += 1;
            if node.stale == Staleness::Local {
                node.local = node.compute_local();
                stats.local_recomputed += 1;
            }
            node.world = parent_world * node.local;
            node.stale = Staleness::None;
            stats.world_recomputed += 1;

            if let Some(binding) = node.mesh {
                if !binding.geometry.is_null() {
                    touched_geometries.push(binding.geometry);
                }
            }

            let world = node.world;
            work.extend(node.children.iter().map(|&child| (child, world)));
        }
        self.scratch_nodes = work;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::ComponentKind;

    fn chain(scene: &mut ComponentManager, len: usize) -> Vec<SgId> {
        let ids: Vec<SgId> = (0..len)
            .map(|i| scene.create(ComponentKind::Transform, &format!("n{i}")))
            .collect();
        for pair in ids.windows(2) {
            scene.add_child(pair[0], pair[1]).unwrap();
        }
        scene.rebuild_all_matrices();
        ids
    }

    #[test]
    fn test_local_matrix_is_translate_rotate_scale() {
        let mut node = Transform::new(SgId(1), "n");
        node.position = Vec3::new(1.0, 2.0, 3.0);
        node.rotation = Quat::from_rotation_z(std::f32::consts::FRAC_PI_2);
        node.scale = Vec3::splat(2.0);

        let expected = Mat4::from_translation(node.position)
            * Mat4::from_quat(node.rotation)
            * Mat4::from_scale(node.scale);
        assert!(node.compute_local().abs_diff_eq(expected, 1e-6));
    }

    #[test]
    fn test_set_stale_never_lowers() {
        let mut scene = ComponentManager::new();
        let id = scene.create(ComponentKind::Transform, "n");
        scene.set_stale(id, Staleness::Local).unwrap();
        scene.set_stale(id, Staleness::World).unwrap();
        assert_eq!(scene.transform(id).unwrap().stale(), Staleness::Local);
    }

    #[test]
    fn test_upward_walk_stops_at_flagged_ancestor() {
        let mut scene = ComponentManager::new();
        let ids = chain(&mut scene, 4);

        scene.set_stale(ids[1], Staleness::World).unwrap();
        scene.set_position(ids[3], Vec3::X).unwrap();

        assert_eq!(scene.transform(ids[3]).unwrap().stale(), Staleness::Local);
        assert_eq!(scene.transform(ids[2]).unwrap().stale(), Staleness::Descendents);
        // Already flagged; its subtree rebuild covers ids[3].
        assert_eq!(scene.transform(ids[1]).unwrap().stale(), Staleness::World);
    }

    #[test]
    fn test_add_child_marks_child_world() {
        let mut scene = ComponentManager::new();
        let parent = scene.create(ComponentKind::Transform, "p");
        let child = scene.create(ComponentKind::Transform, "c");
        scene.add_child(parent, child).unwrap();

        assert_eq!(scene.transform(child).unwrap().stale(), Staleness::World);
        assert_eq!(scene.transform(parent).unwrap().stale(), Staleness::Descendents);
        assert_eq!(scene.transform(parent).unwrap().children(), &[child]);
        assert_eq!(scene.transform(child).unwrap().parent(), Some(parent));
    }

    #[test]
    fn test_add_child_moves_from_old_parent() {
        let mut scene = ComponentManager::new();
        let a = scene.create(ComponentKind::Transform, "a");
        let b = scene.create(ComponentKind::Transform, "b");
        let child = scene.create(ComponentKind::Transform, "c");
        scene.add_child(a, child).unwrap();
        scene.add_child(b, child).unwrap();

        assert!(scene.transform(a).unwrap().children().is_empty());
        assert_eq!(scene.transform(b).unwrap().children(), &[child]);
    }

    #[test]
    fn test_add_child_twice_is_noop() {
        let mut scene = ComponentManager::new();
        let parent = scene.create(ComponentKind::Transform, "p");
        let child = scene.create(ComponentKind::Transform, "c");
        scene.add_child(parent, child).unwrap();
        scene.add_child(parent, child).unwrap();
        assert_eq!(scene.transform(parent).unwrap().children().len(), 1);
    }

    #[test]
    fn test_self_parent_rejected() {
        let mut scene = ComponentManager::new();
        let node = scene.create(ComponentKind::Transform, "n");
        assert_eq!(
            scene.add_child(node, node),
            Err(SceneError::CycleDetected {
                parent: node,
                child: node
            })
        );
    }

    #[test]
    fn test_remove_child_requires_ownership() {
        let mut scene = ComponentManager::new();
        let ids = chain(&mut scene, 3);
        assert_eq!(
            scene.remove_child(ids[0], ids[2]),
            Err(SceneError::NotAChild {
                parent: ids[0],
                child: ids[2]
            })
        );
        scene.remove_child(ids[1], ids[2]).unwrap();
        assert_eq!(scene.transform(ids[2]).unwrap().parent(), None);
        assert_eq!(scene.transform(ids[2]).unwrap().stale(), Staleness::World);
    }

    #[test]
    fn test_remove_all_children() {
        let mut scene = ComponentManager::new();
        let parent = scene.create(ComponentKind::Transform, "p");
        let kids: Vec<SgId> = (0..3)
            .map(|_| scene.create(ComponentKind::Transform, "k"))
            .collect();
        for &kid in &kids {
            scene.add_child(parent, kid).unwrap();
        }

        assert_eq!(scene.remove_all_children(parent).unwrap(), 3);
        assert!(scene.transform(parent).unwrap().children().is_empty());
        assert!(kids
            .iter()
            .all(|&kid| scene.transform(kid).unwrap().parent().is_none()));
    }

    #[test]
    fn test_reparent_to_root() {
        let mut scene = ComponentManager::new();
        let ids = chain(&mut scene, 2);
        scene.reparent(ids[1], None).unwrap();
        assert_eq!(scene.roots().len(), 2);
        // Already a root: nothing to do.
        scene.reparent(ids[1], None).unwrap();
    }

    #[test]
    fn test_world_recomputed_after_parent_moves() {
        let mut scene = ComponentManager::new();
        let ids = chain(&mut scene, 2);
        scene.set_position(ids[1], Vec3::new(0.0, 1.0, 0.0)).unwrap();
        scene.rebuild_all_matrices();

        scene.set_position(ids[0], Vec3::new(5.0, 0.0, 0.0)).unwrap();
        let stats = scene.rebuild_matrices(ids[0]).unwrap();

        assert_eq!(stats.local_recomputed, 1);
        assert_eq!(stats.world_recomputed, 2);
        let world = scene.transform(ids[1]).unwrap().world_matrix();
        assert!(world
            .transform_point3(Vec3::ZERO)
            .abs_diff_eq(Vec3::new(5.0, 1.0, 0.0), 1e-6));
    }

    #[test]
    fn test_rebuild_clean_tree_touches_only_root() {
        let mut scene = ComponentManager::new();
        let ids = chain(&mut scene, 10);
        let stats = scene.rebuild_matrices(ids[0]).unwrap();
        assert_eq!(stats.visited, 1);
        assert_eq!(stats.pruned, 1);
        assert_eq!(stats.world_recomputed, 0);
    }
}
