//! Integration tests for the component table and transform hierarchy.

use cadence_scene::{ComponentKind, ComponentManager, SceneError, SgId, Staleness};
use glam::{Mat4, Quat, Vec3};

fn flag(scene: &ComponentManager, id: SgId) -> Staleness {
    scene.transform(id).unwrap().stale()
}

/// root -> a -> b -> c, all clean.
fn clean_chain(scene: &mut ComponentManager) -> [SgId; 4] {
    let root = scene.create(ComponentKind::Transform, "root");
    let a = scene.create(ComponentKind::Transform, "a");
    let b = scene.create(ComponentKind::Transform, "b");
    let c = scene.create(ComponentKind::Transform, "c");
    scene.add_child(root, a).unwrap();
    scene.add_child(a, b).unwrap();
    scene.add_child(b, c).unwrap();
    scene.set_position(a, Vec3::new(1.0, 0.0, 0.0)).unwrap();
    scene.set_position(c, Vec3::new(0.0, 0.0, 2.0)).unwrap();
    scene.rebuild_matrices(root).unwrap();
    [root, a, b, c]
}

#[test]
fn test_swap_remove_preserves_survivors() {
    let mut scene = ComponentManager::new();
    let ids: Vec<SgId> = (0..10)
        .map(|i| {
            let id = scene.create(ComponentKind::Transform, &format!("node-{i}"));
            scene.set_scale(id, Vec3::splat(i as f32 + 1.0)).unwrap();
            id
        })
        .collect();

    let victim = ids[5];
    scene.destroy(victim).unwrap();

    assert!(matches!(scene.get(victim), Err(SceneError::NotFound(id)) if id == victim));
    assert_eq!(scene.count(ComponentKind::Transform), 9);
    for (i, &id) in ids.iter().enumerate() {
        if id == victim {
            continue;
        }
        let node = scene.get(id).unwrap();
        assert_eq!(node.name(), format!("node-{i}"));
        assert_eq!(
            node.as_transform().unwrap().scale(),
            Vec3::splat(i as f32 + 1.0)
        );
    }
}

#[test]
fn test_move_marks_self_local_and_ancestors_descendents() {
    let mut scene = ComponentManager::new();
    let [root, a, b, c] = clean_chain(&mut scene);
    let a_world = scene.transform(a).unwrap().world_matrix();
    let c_local = scene.transform(c).unwrap().local_matrix();

    let rotation = Quat::from_rotation_y(0.5);
    scene.set_position(b, Vec3::new(0.0, 3.0, 0.0)).unwrap();
    scene.set_rotation(b, rotation).unwrap();

    assert_eq!(flag(&scene, b), Staleness::Local);
    assert_eq!(flag(&scene, a), Staleness::Descendents);
    assert_eq!(flag(&scene, root), Staleness::Descendents);
    assert_eq!(flag(&scene, c), Staleness::None);

    scene.rebuild_matrices(root).unwrap();
    for id in [root, a, b, c] {
        assert_eq!(flag(&scene, id), Staleness::None);
    }

    let b_local = Mat4::from_rotation_translation(rotation, Vec3::new(0.0, 3.0, 0.0));
    let expected = a_world * b_local * c_local;
    assert!(scene
        .transform(c)
        .unwrap()
        .world_matrix()
        .abs_diff_eq(expected, 1e-5));
}

#[test]
fn test_clean_subtree_pruned_stale_branch_recursed() {
    let mut scene = ComponentManager::new();
    let root = scene.create(ComponentKind::Transform, "root");
    let quiet = scene.create(ComponentKind::Transform, "quiet");
    let busy = scene.create(ComponentKind::Transform, "busy");
    let leaf = scene.create(ComponentKind::Transform, "leaf");
    scene.add_child(root, quiet).unwrap();
    scene.add_child(root, busy).unwrap();
    scene.add_child(busy, leaf).unwrap();

    // A wide clean subtree under `quiet`.
    let mut quiet_kids = Vec::new();
    for i in 0..50 {
        let kid = scene.create(ComponentKind::Transform, &format!("q{i}"));
        scene.add_child(quiet, kid).unwrap();
        quiet_kids.push(kid);
    }
    scene.rebuild_matrices(root).unwrap();

    scene.set_position(leaf, Vec3::X).unwrap();
    assert_eq!(flag(&scene, quiet), Staleness::None);
    assert_eq!(flag(&scene, busy), Staleness::Descendents);

    let stats = scene.rebuild_matrices(root).unwrap();

    // root, quiet (pruned), busy, leaf. None of the 50 quiet kids.
    assert_eq!(stats.visited, 4);
    assert_eq!(stats.pruned, 1);
    assert_eq!(stats.local_recomputed, 1);
    assert_eq!(stats.world_recomputed, 1);
    assert!(scene
        .transform(leaf)
        .unwrap()
        .world_matrix()
        .transform_point3(Vec3::ZERO)
        .abs_diff_eq(Vec3::X, 1e-6));
}

#[test]
fn test_reparent_under_own_descendant_rejected() {
    let mut scene = ComponentManager::new();
    let [root, a, b, c] = clean_chain(&mut scene);
    let before: Vec<_> = [root, a, b, c]
        .iter()
        .map(|&id| {
            let node = scene.transform(id).unwrap();
            (node.parent(), node.children().to_vec(), node.stale())
        })
        .collect();

    let result = scene.reparent(a, Some(c));
    assert_eq!(result, Err(SceneError::CycleDetected { parent: c, child: a }));

    let after: Vec<_> = [root, a, b, c]
        .iter()
        .map(|&id| {
            let node = scene.transform(id).unwrap();
            (node.parent(), node.children().to_vec(), node.stale())
        })
        .collect();
    assert_eq!(before, after);
}

#[test]
fn test_destroy_reparents_children_to_grandparent() {
    let mut scene = ComponentManager::new();
    let [root, a, b, c] = clean_chain(&mut scene);
    let c_world_before = scene.transform(c).unwrap().world_matrix();

    scene.destroy(b).unwrap();

    assert!(!scene.contains(b));
    assert_eq!(scene.transform(c).unwrap().parent(), Some(a));
    assert_eq!(scene.transform(a).unwrap().children(), &[c]);
    assert_eq!(flag(&scene, c), Staleness::World);

    scene.rebuild_matrices(root).unwrap();
    // b was identity, so c's world is unchanged.
    assert!(scene
        .transform(c)
        .unwrap()
        .world_matrix()
        .abs_diff_eq(c_world_before, 1e-6));
}

#[test]
fn test_destroy_root_promotes_children_to_roots() {
    let mut scene = ComponentManager::new();
    let [root, a, _, _] = clean_chain(&mut scene);
    scene.destroy(root).unwrap();
    assert_eq!(scene.transform(a).unwrap().parent(), None);
    assert!(scene.roots().contains(&a));
}

#[test]
fn test_destroy_mesh_and_geometry_unlink() {
    let mut scene = ComponentManager::new();
    let geometry = scene.create(ComponentKind::Geometry, "g");
    let material = scene.create(ComponentKind::Material, "m");
    let keep = SgId(1000);
    let drop = SgId(1001);
    scene.update_mesh(keep, geometry, material).unwrap();
    scene.update_mesh(drop, geometry, material).unwrap();

    scene.destroy(drop).unwrap();
    assert_eq!(scene.geometry(geometry).unwrap().bindings(), &[keep]);

    scene.destroy(material).unwrap();
    assert_eq!(scene.mesh(keep).unwrap().mesh().unwrap().material, SgId::NULL);

    scene.destroy(geometry).unwrap();
    assert_eq!(scene.mesh(keep).unwrap().mesh().unwrap().geometry, SgId::NULL);
}

#[test]
fn test_moving_parent_refreshes_child_mesh_instances() {
    let mut scene = ComponentManager::new();
    let geometry = scene.create(ComponentKind::Geometry, "g");
    let pivot = scene.create(ComponentKind::Transform, "pivot");
    let mesh = SgId(500);
    scene.update_mesh(mesh, geometry, SgId::NULL).unwrap();
    scene.add_child(pivot, mesh).unwrap();
    scene.rebuild_all_matrices();
    scene.rebuild_stale_geometries();

    scene.set_position(pivot, Vec3::new(0.0, 7.0, 0.0)).unwrap();
    let stats = scene.rebuild_all_matrices();
    assert_eq!(stats.geometries_marked, 1);
    assert_eq!(scene.rebuild_stale_geometries(), 1);

    let instances = scene.geometry(geometry).unwrap().instance_matrices();
    assert_eq!(instances.len(), 1);
    assert_eq!(instances[0].w_axis.truncate(), Vec3::new(0.0, 7.0, 0.0));
}
