//! # Two-Thread Demo
//!
//! A control thread animates a small solar system while a graphics thread
//! runs frames and reports what it applied.
//!
//! ```bash
//! RUST_LOG=cadence=info cargo run --bin two_thread_demo
//! RUST_LOG=debug cargo run --bin two_thread_demo -- cadence.toml
//! ```

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use cadence::{Session, SessionConfig};
use cadence::shared::ReadbackEvent;
use glam::{Quat, Vec3};
use tracing_subscriber::EnvFilter;

const FRAMES: u64 = 120;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = match std::env::args().nth(1) {
        Some(path) => match SessionConfig::from_file(&path) {
            Ok(config) => config,
            Err(err) => {
                tracing::error!(%err, "falling back to default config");
                SessionConfig::default()
            }
        },
        None => SessionConfig::default(),
    };

    let (mut control, mut graphics) = Session::new(&config).split();
    let running = Arc::new(AtomicBool::new(true));

    let graphics_thread = {
        let running = Arc::clone(&running);
        thread::spawn(move || {
            let mut applied = 0;
            while running.load(Ordering::Acquire) {
                let report = graphics.frame();
                applied += report.apply.applied;

                for geometry in graphics.scene_mut().geometries_mut() {
                    let Some(batches) = geometry.take_instance_upload() else {
                        continue;
                    };
                    for batch in batches {
                        tracing::trace!(
                            material = %batch.material(),
                            bytes = batch.instance_bytes().len(),
                            "instance upload"
                        );
                    }
                }
                thread::sleep(Duration::from_millis(4));
            }
            // One more frame so nothing pushed before shutdown is lost.
            applied += graphics.frame().apply.applied;
            applied
        })
    };

    // Scene setup.
    let shader = control.create_shader("void main() {}", "void main() {}");
    let material = control.create_material(shader, "planet");
    let sphere = control.create_geometry("sphere");
    control.set_vertex_attribute(sphere, 0, 3, &[0.0, 1.0, 0.0, -1.0, -1.0, 0.0, 1.0, -1.0, 0.0]);
    control.set_indices(sphere, &[0, 1, 2]);

    let sun = control.create_mesh(sphere, material, "sun");
    let earth = control.create_mesh(sphere, material, "earth");
    let moon = control.create_mesh(sphere, material, "moon");
    control.add_child(sun, earth);
    control.add_child(earth, moon);
    control.set_position(earth, Vec3::new(10.0, 0.0, 0.0));
    control.set_position(moon, Vec3::new(2.0, 0.0, 0.0));
    control.set_scale(moon, Vec3::splat(0.25));

    let texture = control.create_texture(2, 2, "checker");
    control.texture_write(texture, &[255; 16]);
    control.copy_texture_to_cpu(texture);

    // Animation, paced by the graphics thread.
    let mut seen = control.frame();
    let mut angle = 0.0_f32;
    while seen < FRAMES {
        angle += 0.05;
        control.set_rotation(sun, Quat::from_rotation_y(angle));
        control.set_rotation(earth, Quat::from_rotation_y(angle * 4.0));

        for event in control.poll_readback() {
            match event {
                ReadbackEvent::TextureData {
                    texture,
                    width,
                    height,
                    pixels,
                } => tracing::info!(%texture, width, height, bytes = pixels.len(), "texture readback"),
            }
        }
        seen = control.wait_next_frame(seen);
    }

    control.destroy(moon);
    running.store(false, Ordering::Release);

    match graphics_thread.join() {
        Ok(applied) => tracing::info!(frames = FRAMES, applied, "demo finished"),
        Err(_) => tracing::error!("graphics thread panicked"),
    }
}
