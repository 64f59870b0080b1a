//! Bakes a small box scene and writes the result into `bake.png` (plus, with
//! `--lightmap`, the lightmap of the floor into `lightmap.png`).

use std::env;
use std::error::Error;
use std::f32::consts::FRAC_PI_2;
use std::sync::Arc;

use glam::{vec3, Affine3A, Quat, Vec3};
use lightbuilder::{
    Actor, BakeEvent, BakeSession, BakeSettings, Camera, CollectKind, Light,
    Lod, Material, Mesh, MeshRender, Scene,
};

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();

    let lightmap = env::args().any(|arg| arg == "--lightmap");

    let settings = BakeSettings::default()
        .with_bounce_engines(CollectKind::PathTracing, CollectKind::BackTracing)
        .with_path_tracing(4, 2)
        .with_ambient(Vec3::splat(0.05))
        .with_max_threads(4);

    let mut session = BakeSession::new(scene(), settings);

    session.scheduler_mut().set_listener(|event| match event {
        BakeEvent::Progress { percent, .. } => {
            log::info!("{:.1}%", percent);
        }

        BakeEvent::AllDone { cancelled, elapsed } => {
            log::info!("Done; cancelled = {}, tt = {:?}", cancelled, elapsed);
        }

        _ => (),
    });

    let camera =
        Camera::looking_at(vec3(0.0, 1.0, 3.5), vec3(0.0, 1.0, 0.0), Vec3::Y)
            .with_fov(50.0_f32.to_radians())
            .with_aspect(320.0 / 240.0);

    let framebuffer = session.bake(camera, 320, 240)?;

    session.wait()?;
    framebuffer.to_rgba8().save("bake.png")?;

    if lightmap {
        let framebuffer = session.bake_lightmap(256, 256)?;

        session.wait()?;
        framebuffer.to_rgba8().save("lightmap.png")?;
    }

    Ok(())
}

fn scene() -> Scene {
    let quad = Arc::new(Mesh::default().with_lod(Lod::quad()));

    let wall = |name: &str, transform: Affine3A, diffuse: Vec3| {
        Actor::new(name).with_transform(transform).with_component(
            MeshRender::new(quad.clone())
                .with_material(Material::default().with_diffuse(diffuse)),
        )
    };

    let scale = Vec3::splat(2.0);

    Scene::new()
        .with_actor(wall(
            "floor",
            Affine3A::from_scale_rotation_translation(
                scale,
                Quat::from_rotation_x(-FRAC_PI_2),
                Vec3::ZERO,
            ),
            Vec3::splat(0.8),
        ))
        .with_actor(wall(
            "back",
            Affine3A::from_scale_rotation_translation(
                scale,
                Quat::IDENTITY,
                vec3(0.0, 1.0, -1.0),
            ),
            Vec3::splat(0.8),
        ))
        .with_actor(wall(
            "left",
            Affine3A::from_scale_rotation_translation(
                scale,
                Quat::from_rotation_y(FRAC_PI_2),
                vec3(-1.0, 1.0, 0.0),
            ),
            vec3(0.8, 0.1, 0.1),
        ))
        .with_actor(wall(
            "right",
            Affine3A::from_scale_rotation_translation(
                scale,
                Quat::from_rotation_y(-FRAC_PI_2),
                vec3(1.0, 1.0, 0.0),
            ),
            vec3(0.1, 0.8, 0.1),
        ))
        .with_actor(
            Actor::new("lamp").with_component(Light::point(
                vec3(0.0, 1.8, 0.0),
                Vec3::ONE,
                2.0,
            )),
        )
        .with_actor(
            Actor::new("mirror")
                .with_transform(Affine3A::from_scale_rotation_translation(
                    Vec3::splat(0.6),
                    Quat::from_rotation_y(0.4),
                    vec3(0.3, 0.4, -0.3),
                ))
                .with_component(MeshRender::new(quad.clone()).with_material(
                    Material::default()
                        .with_diffuse(Vec3::splat(0.1))
                        .with_reflection(0.9),
                )),
        )
}
