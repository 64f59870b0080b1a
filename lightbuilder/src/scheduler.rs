use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use derivative::Derivative;
use fxhash::FxHashMap;

use crate::utils::metrics;
use crate::worker::{Worker, WorkerMessage};
use crate::{
    make_tiles, BakeSettings, Bvh, BvhBuilder, Camera, CompiledScene,
    DeviceId, Error, Framebuffer, PhotonMapBuilder, PhotonTree, Result, Space,
    Task, TaskId, TaskState, Tile,
};

/// Execution backend the workers run on.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Backend {
    /// Worker threads on the host's CPU.
    Cpu,
}

impl Backend {
    /// Probes for compute devices; there's no hardware path, so this always
    /// settles on the CPU.
    pub fn detect() -> Self {
        log::debug!("No compute devices available; using the CPU backend");

        Self::Cpu
    }
}

/// Notification sent to the scheduler's listener.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum BakeEvent {
    /// Average of all tasks' completion, in percents.
    Progress { percent: f32, elapsed: Duration },

    /// Given region of the framebuffer has been refreshed.
    TileUpdated(Tile),

    /// No task is left to process and all workers have exited.
    AllDone { cancelled: bool, elapsed: Duration },

    /// Bake has been cancelled; workers are winding down.
    AllStopped,
}

/// Everything a worker needs to render its task; shared read-only between
/// the workers of a single bake.
pub(crate) struct BakeContext {
    pub scene: Arc<CompiledScene>,
    pub uv_bvh: Option<Bvh>,
    pub photons: Option<PhotonTree>,
    pub settings: BakeSettings,
    pub camera: Camera,
    pub framebuffer: Arc<Framebuffer>,
    pub tasks: Vec<Task>,
    pub width: u32,
    pub height: u32,
}

/// Splits an image into tasks and keeps a fixed number of workers busy with
/// them until none is left.
///
/// The scheduler never blocks on its own: worker notifications queue up
/// until [`Scheduler::poll()`] or [`Scheduler::wait()`] gets called, which
/// is also when the listener gets invoked.
#[derive(Derivative)]
#[derivative(Debug)]
pub struct Scheduler {
    settings: BakeSettings,
    backend: Backend,
    devices: Vec<DeviceId>,
    scene: Option<Arc<CompiledScene>>,
    camera: Camera,

    #[derivative(Debug = "ignore")]
    context: Option<Arc<BakeContext>>,

    workers: FxHashMap<DeviceId, JoinHandle<()>>,
    tx: Sender<WorkerMessage>,
    rx: Receiver<WorkerMessage>,
    started_at: Option<Instant>,
    finished_in: Option<Duration>,
    progress: f32,
    running: bool,
    cancelled: bool,

    #[derivative(Debug = "ignore")]
    listener: Option<Box<dyn FnMut(&BakeEvent) + Send>>,
}

impl Scheduler {
    pub fn new(settings: BakeSettings) -> Self {
        let (tx, rx) = mpsc::channel();

        Self {
            settings,
            backend: Backend::detect(),
            devices: Vec::new(),
            scene: None,
            camera: Camera::default(),
            context: None,
            workers: Default::default(),
            tx,
            rx,
            started_at: None,
            finished_in: None,
            progress: 0.0,
            running: false,
            cancelled: false,
            listener: None,
        }
    }

    pub fn settings(&self) -> &BakeSettings {
        &self.settings
    }

    /// Replaces the settings; takes effect on the next [`Self::create()`].
    pub fn set_settings(&mut self, settings: BakeSettings) {
        self.settings = settings;
    }

    pub fn backend(&self) -> Backend {
        self.backend
    }

    /// Returns names of the compute devices available for baking.
    pub fn hardware_devices(&self) -> Vec<String> {
        match self.backend {
            Backend::Cpu => Vec::new(),
        }
    }

    /// Selects a compute device by its name; returns `false` when there's
    /// no such device, in which case workers keep running on the CPU.
    pub fn add_device(&mut self, name: &str) -> bool {
        let known = self.hardware_devices();

        match known.iter().position(|device| device == name) {
            Some(idx) => {
                self.devices.push(DeviceId::new(idx));
                true
            }

            None => {
                log::warn!("Unknown compute device `{}`; ignoring it", name);
                false
            }
        }
    }

    pub fn set_scene(&mut self, scene: Arc<CompiledScene>) {
        self.scene = Some(scene);
    }

    pub fn set_camera(&mut self, camera: Camera) {
        self.camera = camera;
    }

    pub fn set_listener(
        &mut self,
        listener: impl FnMut(&BakeEvent) + Send + 'static,
    ) {
        self.listener = Some(Box::new(listener));
    }

    /// Prepares a `width` x `height` bake, returning the framebuffer it's
    /// going to be rendered into.
    ///
    /// When `bake_to_uv` is set, the image is the lightmap of the scene
    /// instead of the camera's view.
    pub fn create(
        &mut self,
        width: u32,
        height: u32,
        reverse: bool,
        bake_to_uv: bool,
    ) -> Result<Arc<Framebuffer>> {
        if width == 0 || height == 0 {
            return Err(Error::EmptyImage { width, height });
        }

        self.settings.validate()?;

        let scene = self.scene.clone().ok_or(Error::NoScene)?;

        self.shutdown();

        let uv_bvh = bake_to_uv.then(|| {
            let geometry = scene.geometry();

            BvhBuilder::build(
                geometry.triangles().to_vec(),
                geometry,
                Space::Uv,
            )
        });

        let photons = self.settings.needs_photons().then(|| {
            PhotonMapBuilder::build(
                scene.geometry(),
                scene.bvh(),
                self.settings.photons(),
            )
        });

        let tiles = self.settings.tiles();

        let tasks: Vec<_> = make_tiles(
            width,
            height,
            tiles.cell_width,
            tiles.cell_height,
            reverse,
        )
        .into_iter()
        .enumerate()
        .map(|(id, tile)| Task::new(TaskId::new(id), tile))
        .collect();

        log::info!(
            "{} tasks added; image = {}x{}, spp = {}",
            tasks.len(),
            width,
            height,
            self.settings.spp(),
        );

        let framebuffer = Arc::new(Framebuffer::new(width, height));

        self.context = Some(Arc::new(BakeContext {
            scene,
            uv_bvh,
            photons,
            settings: self.settings.clone(),
            camera: self.camera,
            framebuffer: framebuffer.clone(),
            tasks,
            width,
            height,
        }));

        self.started_at = None;
        self.finished_in = None;
        self.progress = 0.0;

        Ok(framebuffer)
    }

    pub fn start(&mut self) -> Result<()> {
        self.restart()
    }

    /// Starts the bake from scratch, discarding whatever has been rendered
    /// so far.
    pub fn restart(&mut self) -> Result<()> {
        let context = self.context.clone().ok_or(Error::NotCreated)?;

        self.shutdown();

        for task in &context.tasks {
            task.reset();
        }

        context.framebuffer.clear();

        self.started_at = Some(Instant::now());
        self.finished_in = None;
        self.progress = 0.0;
        self.running = true;
        self.cancelled = false;

        for slot in 0..self.slots() {
            self.on_done(DeviceId::new(slot))?;
        }

        Ok(())
    }

    /// Asks all workers to stop; the bake finishes (with `cancelled` set)
    /// once the last of them exits.
    pub fn stop(&mut self) {
        let Some(context) = &self.context else {
            return;
        };

        for task in &context.tasks {
            task.drop_task();
        }

        if self.running {
            self.cancelled = true;
            self.emit(BakeEvent::AllStopped);
        }
    }

    /// Processes notifications sent by the workers so far, without blocking.
    pub fn poll(&mut self) -> Result<()> {
        while let Ok(msg) = self.rx.try_recv() {
            self.handle(msg)?;
        }

        Ok(())
    }

    /// Processes notifications until the bake is done.
    pub fn wait(&mut self) -> Result<()> {
        while self.running {
            match self.rx.recv() {
                Ok(msg) => self.handle(msg)?,
                Err(_) => break,
            }
        }

        Ok(())
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Returns the average completion of all tasks, in percents.
    pub fn progress(&self) -> f32 {
        self.progress
    }

    pub fn elapsed(&self) -> Duration {
        match (self.finished_in, self.started_at) {
            (Some(finished_in), _) => finished_in,
            (None, Some(started_at)) => started_at.elapsed(),
            (None, None) => Duration::ZERO,
        }
    }

    pub fn tasks(&self) -> &[Task] {
        self.context
            .as_ref()
            .map(|context| context.tasks.as_slice())
            .unwrap_or_default()
    }

    pub fn framebuffer(&self) -> Option<&Arc<Framebuffer>> {
        self.context.as_ref().map(|context| &context.framebuffer)
    }

    fn slots(&self) -> usize {
        if self.devices.is_empty() {
            self.settings.max_threads()
        } else {
            self.devices.len()
        }
    }

    fn handle(&mut self, msg: WorkerMessage) -> Result<()> {
        match msg {
            WorkerMessage::Updated { task } => {
                if let Some(tile) = self.tile(task) {
                    self.emit(BakeEvent::TileUpdated(tile));
                }

                self.refresh_progress();
            }

            WorkerMessage::Finished { device, task } => {
                if let Some(handle) = self.workers.remove(&device) {
                    if handle.join().is_err() {
                        log::error!(
                            "Worker for task {} has panicked",
                            task.get()
                        );
                    }
                } else {
                    log::warn!("Got notification from unknown {}", device);
                }

                self.on_done(device)?;
            }
        }

        Ok(())
    }

    /// Hands the next waiting task over to given device, or finishes the
    /// bake if there's nothing left to do.
    fn on_done(&mut self, device: DeviceId) -> Result<()> {
        let Some(context) = self.context.clone() else {
            return Ok(());
        };

        let task = context
            .tasks
            .iter()
            .find(|task| task.state() == TaskState::Wait && task.claim(device));

        if let Some(task) = task {
            let worker = Worker::new(
                context.clone(),
                task.id(),
                device,
                self.tx.clone(),
            );

            match worker.spawn() {
                Ok(handle) => {
                    self.workers.insert(device, handle);
                }

                Err(err) => {
                    task.reset();

                    if self.workers.is_empty() {
                        self.running = false;
                    }

                    return Err(err);
                }
            }

            return Ok(());
        }

        if self.running && self.workers.is_empty() {
            self.running = false;
            self.finished_in = Some(self.elapsed());

            log::info!(
                "All done; cancelled = {}, tt = {}",
                self.cancelled,
                metrics::display(self.elapsed()),
            );

            self.emit(BakeEvent::AllDone {
                cancelled: self.cancelled,
                elapsed: self.elapsed(),
            });
        }

        Ok(())
    }

    fn refresh_progress(&mut self) {
        let Some(context) = &self.context else {
            return;
        };

        if context.tasks.is_empty() || !self.running {
            return;
        }

        let spp = context.settings.spp().max(1) as f32;

        let sum: f32 = context
            .tasks
            .iter()
            .map(|task| (task.processed() as f32 / spp).min(1.0))
            .sum();

        let percent = sum / context.tasks.len() as f32 * 100.0;

        self.progress = self.progress.max(percent);

        self.emit(BakeEvent::Progress {
            percent: self.progress,
            elapsed: self.elapsed(),
        });
    }

    fn tile(&self, task: TaskId) -> Option<Tile> {
        self.context
            .as_ref()?
            .tasks
            .get(task.get())
            .map(|task| task.tile())
    }

    fn emit(&mut self, event: BakeEvent) {
        if let Some(listener) = &mut self.listener {
            listener(&event);
        }
    }

    /// Drops all tasks and waits for the workers to exit, discarding their
    /// notifications.
    fn shutdown(&mut self) {
        if let Some(context) = &self.context {
            for task in &context.tasks {
                if task.state() != TaskState::Done {
                    task.drop_task();
                }
            }
        }

        for (_, handle) in self.workers.drain() {
            _ = handle.join();
        }

        while self.rx.try_recv().is_ok() {
            //
        }

        self.running = false;
    }
}

impl Drop for Scheduler {
    fn drop(&mut self) {
        self.shutdown();
    }
}
