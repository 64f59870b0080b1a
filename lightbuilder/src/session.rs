use std::sync::Arc;

use crate::utils::metrics;
use crate::{
    BakeSettings, Bvh, BvhBuilder, Camera, Framebuffer, Geometry,
    GeometryCollector, Result, Scene, Scheduler, Space,
};

/// Geometry and its acceleration structure, ready to be traced against.
#[derive(Debug)]
pub struct CompiledScene {
    geometry: Geometry,
    bvh: Bvh,
}

impl CompiledScene {
    pub fn compile(scene: &Scene) -> Result<Self> {
        let geometry = GeometryCollector::collect(scene)?;

        let (bvh, tt) = metrics::measure(|| {
            BvhBuilder::build(
                geometry.triangles().to_vec(),
                &geometry,
                Space::World,
            )
        });

        log::info!(
            "BVH built; triangles = {}, nodes = {}, tt = {}",
            bvh.triangles().len(),
            bvh.nodes().len(),
            metrics::display(tt),
        );

        Ok(Self { geometry, bvh })
    }

    pub fn geometry(&self) -> &Geometry {
        &self.geometry
    }

    pub fn bvh(&self) -> &Bvh {
        &self.bvh
    }
}

/// Owns the scene being baked together with the scheduler baking it.
///
/// Geometry gets recompiled lazily, on the first bake after the scene has
/// been modified.
#[derive(Debug)]
pub struct BakeSession {
    scene: Scene,
    compiled: Option<Arc<CompiledScene>>,
    scheduler: Scheduler,
}

impl BakeSession {
    pub fn new(scene: Scene, settings: BakeSettings) -> Self {
        Self {
            scene,
            compiled: None,
            scheduler: Scheduler::new(settings),
        }
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    /// Returns the scene for modification, marking the geometry as dirty.
    pub fn scene_mut(&mut self) -> &mut Scene {
        self.compiled = None;
        &mut self.scene
    }

    pub fn is_dirty(&self) -> bool {
        self.compiled.is_none()
    }

    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    pub fn scheduler_mut(&mut self) -> &mut Scheduler {
        &mut self.scheduler
    }

    /// Starts baking the scene as seen from `camera`.
    pub fn bake(
        &mut self,
        camera: Camera,
        width: u32,
        height: u32,
    ) -> Result<Arc<Framebuffer>> {
        self.prepare()?;
        self.scheduler.set_camera(camera);

        let framebuffer = self.scheduler.create(width, height, false, false)?;

        self.scheduler.start()?;

        Ok(framebuffer)
    }

    /// Starts baking a `width` x `height` lightmap of the scene.
    pub fn bake_lightmap(
        &mut self,
        width: u32,
        height: u32,
    ) -> Result<Arc<Framebuffer>> {
        self.prepare()?;

        let framebuffer = self.scheduler.create(width, height, false, true)?;

        self.scheduler.start()?;

        Ok(framebuffer)
    }

    /// Blocks until the current bake completes (or gets cancelled).
    pub fn wait(&mut self) -> Result<()> {
        self.scheduler.wait()
    }

    fn prepare(&mut self) -> Result<()> {
        if self.compiled.is_none() {
            let compiled = CompiledScene::compile(&self.scene)?;

            self.compiled = Some(Arc::new(compiled));
        }

        if let Some(compiled) = &self.compiled {
            self.scheduler.set_scene(compiled.clone());
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use glam::{vec3, Vec3};

    use super::*;
    use crate::{Actor, Light, Lod, Mesh, MeshRender};

    fn scene() -> Scene {
        let mesh = Arc::new(Mesh::default().with_lod(Lod::quad()));

        Scene::new()
            .with_actor(
                Actor::new("quad").with_component(MeshRender::new(mesh)),
            )
            .with_actor(
                Actor::new("sky")
                    .with_component(Light::ambient(Vec3::splat(0.5))),
            )
    }

    #[test]
    fn bake() {
        let settings = BakeSettings::default()
            .with_ambient(Vec3::ZERO)
            .with_cell_size(2, 2);

        let mut session = BakeSession::new(scene(), settings);

        let camera =
            Camera::looking_at(vec3(0.0, 0.0, 2.0), Vec3::ZERO, Vec3::Y)
                .with_fov(20.0_f32.to_radians());

        let fb = session.bake(camera, 4, 4).unwrap();

        session.wait().unwrap();

        assert!(!session.is_dirty());
        assert_eq!(0.5, fb.pixel(1, 2).x);
        assert_eq!(1.0, fb.pixel(1, 2).w);
    }

    #[test]
    fn dirty_tracking() {
        let mut session = BakeSession::new(scene(), BakeSettings::default());

        session.bake_lightmap(2, 2).unwrap();
        session.wait().unwrap();

        assert!(!session.is_dirty());

        session.scene_mut().add_actor(Actor::new("empty"));

        assert!(session.is_dirty());
        assert_eq!(3, session.scene().actors().len());
    }
}
