use std::sync::mpsc::Sender;
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use glam::{vec2, Vec2, Vec3, Vec4};
use lightbuilder_models::{Noise, Ray, TRACER_EPSILON};

use crate::scheduler::BakeContext;
use crate::utils::metrics;
use crate::{DeviceId, Integrator, Result, Task, TaskId};

/// Message sent from a worker to the scheduler.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum WorkerMessage {
    /// A sample pass has been written into the framebuffer.
    Updated { task: TaskId },

    /// Worker has exited, either because its task is done or because it got
    /// dropped.
    Finished { device: DeviceId, task: TaskId },
}

/// Renders a single task on its own thread.
pub(crate) struct Worker {
    context: Arc<BakeContext>,
    task: TaskId,
    device: DeviceId,
    tx: Sender<WorkerMessage>,
}

impl Worker {
    pub fn new(
        context: Arc<BakeContext>,
        task: TaskId,
        device: DeviceId,
        tx: Sender<WorkerMessage>,
    ) -> Self {
        Self {
            context,
            task,
            device,
            tx,
        }
    }

    pub fn spawn(self) -> Result<JoinHandle<()>> {
        let handle = thread::Builder::new()
            .name(format!("lightbuilder-{}", self.device))
            .spawn(move || self.run())?;

        Ok(handle)
    }

    fn run(self) {
        let task = self.task();
        let (_, tt) = metrics::measure(|| self.process(task));

        if task.finish() {
            log::debug!(
                "Task done; task = {}, tile = {}, tt = {}",
                task.id().get(),
                task.tile(),
                metrics::display(tt),
            );
        } else {
            log::debug!(
                "Task dropped; task = {}, processed = {}",
                task.id().get(),
                task.processed(),
            );
        }

        // Scheduler might be already gone, in which case nobody's interested
        _ = self.tx.send(WorkerMessage::Finished {
            device: self.device,
            task: self.task,
        });
    }

    fn task(&self) -> &Task {
        &self.context.tasks[self.task.get()]
    }

    fn process(&self, task: &Task) {
        let ctx = &*self.context;
        let settings = &ctx.settings;
        let tile = task.tile();
        let spp = settings.spp();

        let mut integrator = Integrator::new(
            ctx.scene.geometry(),
            ctx.scene.bvh(),
            ctx.photons.as_ref(),
            settings,
        );

        let mut noise =
            Noise::for_stream(settings.seed(), task.id().get() as u64);
        let mut accum = vec![Vec4::ZERO; tile.area() as usize];

        for pass in 1..=spp {
            for y in 0..tile.height {
                if task.is_dropped() {
                    return;
                }

                for x in 0..tile.width {
                    let offset = if spp == 1 {
                        Vec2::splat(0.5)
                    } else {
                        vec2(noise.sample(), noise.sample())
                    };

                    accum[(x + y * tile.width) as usize] += self.sample(
                        &mut integrator,
                        &mut noise,
                        tile.x + x,
                        tile.y + y,
                        offset,
                    );
                }
            }

            if task.is_dropped() {
                return;
            }

            task.set_processed(pass);

            let norm = 1.0 / pass as f32;

            for y in 0..tile.height {
                for x in 0..tile.width {
                    ctx.framebuffer.write(
                        tile.x + x,
                        tile.y + y,
                        accum[(x + y * tile.width) as usize] * norm,
                        task.id(),
                    );
                }
            }

            _ = self.tx.send(WorkerMessage::Updated { task: task.id() });
        }
    }

    /// Returns radiance of a single pixel sample.
    fn sample(
        &self,
        integrator: &mut Integrator,
        noise: &mut Noise,
        x: u32,
        y: u32,
        offset: Vec2,
    ) -> Vec4 {
        let ctx = &*self.context;

        let uv = vec2(
            (x as f32 + offset.x) / ctx.width as f32,
            (y as f32 + offset.y) / ctx.height as f32,
        );

        if let Some(uv_bvh) = &ctx.uv_bvh {
            let geometry = ctx.scene.geometry();

            return match uv_bvh.locate(geometry, uv) {
                Some((triangle, weights)) => {
                    let surface = geometry.surface(&triangle, weights);

                    integrator.radiance_at(surface, noise).extend(1.0)
                }

                // Texels outside of any triangle stay transparent
                None => Vec4::ZERO,
            };
        }

        let camera = &ctx.camera;
        let ray = camera.cast_ray(uv.x, uv.y);

        if !ctx.settings.camera().dof {
            return integrator.radiance(ray, noise).extend(1.0);
        }

        let settings = ctx.settings.camera();
        let aperture = 1.0 / settings.f_number;

        let focal = if settings.target {
            camera.focal_distance()
        } else {
            settings.focal_length
        };

        // Focal point lies on the plane perpendicular to camera's forward
        let cos = ray.direction().dot(camera.forward()).max(TRACER_EPSILON);
        let aim = ray.at(focal / cos);
        let samples = ctx.settings.camera_spp();
        let mut radiance = Vec3::ZERO;

        for _ in 0..samples {
            let jitter = noise.sample_disk() * (aperture * 0.5);

            let origin = ray.origin()
                + camera.right() * jitter.x
                + camera.up() * jitter.y;

            let jittered = Ray::new(origin, aim - origin);

            radiance += integrator.radiance(jittered, noise);
        }

        (radiance / samples as f32).extend(1.0)
    }
}
