use std::fmt;
use std::sync::atomic::{AtomicU32, AtomicU8, AtomicUsize, Ordering};

/// Rectangular region of the image, processed as a whole by one worker.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Tile {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl Tile {
    pub fn area(&self) -> u32 {
        self.width * self.height
    }

    pub fn contains(&self, x: u32, y: u32) -> bool {
        x >= self.x
            && y >= self.y
            && x < self.x + self.width
            && y < self.y + self.height
    }

    pub fn overlaps(&self, other: &Tile) -> bool {
        self.x < other.x + other.width
            && other.x < self.x + self.width
            && self.y < other.y + other.height
            && other.y < self.y + self.height
    }
}

impl fmt::Display for Tile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}x{}+{}+{}",
            self.width, self.height, self.x, self.y
        )
    }
}

/// Splits a `width` x `height` image into cells of at most
/// `cell_width` x `cell_height` pixels, in raster order (or the reverse).
///
/// Cells in the last row and column get clamped to the image bounds.
pub fn make_tiles(
    width: u32,
    height: u32,
    cell_width: u32,
    cell_height: u32,
    reverse: bool,
) -> Vec<Tile> {
    if width == 0 || height == 0 || cell_width == 0 || cell_height == 0 {
        return Vec::new();
    }

    let mut tiles = Vec::new();

    for y in (0..height).step_by(cell_height as usize) {
        for x in (0..width).step_by(cell_width as usize) {
            tiles.push(Tile {
                x,
                y,
                width: cell_width.min(width - x),
                height: cell_height.min(height - y),
            });
        }
    }

    if reverse {
        tiles.reverse();
    }

    tiles
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TaskId(usize);

impl TaskId {
    pub fn new(id: usize) -> Self {
        Self(id)
    }

    pub fn get(self) -> usize {
        self.0
    }
}

/// Worker slot (a thread, or a hardware device) a task runs on.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DeviceId(usize);

impl DeviceId {
    pub fn new(id: usize) -> Self {
        Self(id)
    }

    pub fn get(self) -> usize {
        self.0
    }
}

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "device-{}", self.0)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum TaskState {
    Wait = 1,
    Progress = 2,
    Done = 3,
    Drop = 4,
}

impl TaskState {
    fn from_u8(value: u8) -> Self {
        match value {
            1 => Self::Wait,
            2 => Self::Progress,
            3 => Self::Done,
            _ => Self::Drop,
        }
    }
}

/// Unit of work: a tile plus its progress.
///
/// While a task is in progress, its worker is the only writer of
/// `processed`; the scheduler may only flip `state` to [`TaskState::Drop`],
/// which the worker polls and never writes back.
#[derive(Debug)]
pub struct Task {
    id: TaskId,
    tile: Tile,
    state: AtomicU8,
    device: AtomicUsize,
    processed: AtomicU32,
}

impl Task {
    pub fn new(id: TaskId, tile: Tile) -> Self {
        Self {
            id,
            tile,
            state: AtomicU8::new(TaskState::Wait as u8),
            device: AtomicUsize::new(usize::MAX),
            processed: AtomicU32::new(0),
        }
    }

    pub fn id(&self) -> TaskId {
        self.id
    }

    pub fn tile(&self) -> Tile {
        self.tile
    }

    pub fn state(&self) -> TaskState {
        TaskState::from_u8(self.state.load(Ordering::Acquire))
    }

    pub fn is_dropped(&self) -> bool {
        self.state() == TaskState::Drop
    }

    pub fn device(&self) -> Option<DeviceId> {
        match self.device.load(Ordering::Acquire) {
            usize::MAX => None,
            id => Some(DeviceId::new(id)),
        }
    }

    /// Number of sample passes completed so far.
    pub fn processed(&self) -> u32 {
        self.processed.load(Ordering::Acquire)
    }

    pub(crate) fn set_processed(&self, processed: u32) {
        self.processed.store(processed, Ordering::Release);
    }

    /// Moves a waiting task into progress on given device; returns `false`
    /// if the task isn't waiting anymore.
    pub(crate) fn claim(&self, device: DeviceId) -> bool {
        let claimed = self
            .state
            .compare_exchange(
                TaskState::Wait as u8,
                TaskState::Progress as u8,
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .is_ok();

        if claimed {
            self.device.store(device.get(), Ordering::Release);
        }

        claimed
    }

    /// Marks an in-progress task as done, unless it got dropped meanwhile.
    pub(crate) fn finish(&self) -> bool {
        self.state
            .compare_exchange(
                TaskState::Progress as u8,
                TaskState::Done as u8,
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .is_ok()
    }

    pub(crate) fn drop_task(&self) {
        self.state.store(TaskState::Drop as u8, Ordering::Release);
    }

    pub(crate) fn reset(&self) {
        self.state.store(TaskState::Wait as u8, Ordering::Release);
        self.device.store(usize::MAX, Ordering::Release);
        self.processed.store(0, Ordering::Release);
    }
}
