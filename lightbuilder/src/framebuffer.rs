use std::sync::atomic::{AtomicU32, Ordering};

use glam::Vec4;
use image::{ImageBuffer, Rgba, Rgba32FImage, RgbaImage};

use crate::TaskId;

/// Shared output image of a bake, holding linear RGBA radiance.
///
/// Workers write into disjoint tiles concurrently, so each channel is kept
/// as an atomic bit pattern; relaxed ordering is enough because no two
/// workers ever write the same pixel.
#[derive(Debug)]
pub struct Framebuffer {
    width: u32,
    height: u32,
    pixels: Box<[AtomicPixel]>,

    #[cfg(test)]
    tracker: WriteTracker,
}

impl Framebuffer {
    pub fn new(width: u32, height: u32) -> Self {
        let len = (width as usize) * (height as usize);

        Self {
            width,
            height,
            pixels: (0..len).map(|_| AtomicPixel::default()).collect(),

            #[cfg(test)]
            tracker: WriteTracker::new(len),
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn pixel(&self, x: u32, y: u32) -> Vec4 {
        self.index(x, y)
            .map(|idx| self.pixels[idx].load())
            .unwrap_or(Vec4::ZERO)
    }

    /// Returns copy of all pixels, row by row.
    pub fn snapshot(&self) -> Vec<Vec4> {
        self.pixels.iter().map(AtomicPixel::load).collect()
    }

    pub fn clear(&self) {
        for pixel in self.pixels.iter() {
            pixel.store(Vec4::ZERO);
        }

        #[cfg(test)]
        self.tracker.clear();
    }

    pub(crate) fn write(&self, x: u32, y: u32, value: Vec4, task: TaskId) {
        let Some(idx) = self.index(x, y) else {
            log::warn!("Task {:?} tried to write outside of the image", task);
            return;
        };

        #[cfg(test)]
        self.tracker.record(idx, task);

        #[cfg(not(test))]
        let _ = task;

        self.pixels[idx].store(value);
    }

    /// Returns pixels as a flat list of RGBA floats.
    pub fn to_raw(&self) -> Vec<f32> {
        bytemuck::cast_slice(&self.snapshot()).to_vec()
    }

    pub fn to_rgba32f(&self) -> Rgba32FImage {
        let pixels = self.snapshot();

        ImageBuffer::from_fn(self.width, self.height, |x, y| {
            let pixel = pixels[(x + y * self.width) as usize];

            Rgba(pixel.to_array())
        })
    }

    /// Converts pixels into 8-bit colors, clamping radiance to `<0, 1>`.
    pub fn to_rgba8(&self) -> RgbaImage {
        let pixels = self.snapshot();

        ImageBuffer::from_fn(self.width, self.height, |x, y| {
            let pixel = pixels[(x + y * self.width) as usize];
            let pixel = (pixel.clamp(Vec4::ZERO, Vec4::ONE) * 255.0).round();

            Rgba(pixel.to_array().map(|channel| channel as u8))
        })
    }

    fn index(&self, x: u32, y: u32) -> Option<usize> {
        if x < self.width && y < self.height {
            Some((x as usize) + (y as usize) * (self.width as usize))
        } else {
            None
        }
    }

    /// Returns task which has last written given pixel.
    #[cfg(test)]
    pub(crate) fn owner(&self, x: u32, y: u32) -> Option<TaskId> {
        self.index(x, y).and_then(|idx| self.tracker.owner(idx))
    }

    /// Returns number of writes into pixels already owned by another task.
    #[cfg(test)]
    pub(crate) fn conflicts(&self) -> usize {
        self.tracker.conflicts.load(Ordering::Relaxed)
    }
}

#[derive(Debug, Default)]
struct AtomicPixel([AtomicU32; 4]);

impl AtomicPixel {
    fn load(&self) -> Vec4 {
        Vec4::from_array(
            self.0
                .each_ref()
                .map(|ch| f32::from_bits(ch.load(Ordering::Relaxed))),
        )
    }

    fn store(&self, value: Vec4) {
        for (ch, value) in self.0.iter().zip(value.to_array()) {
            ch.store(value.to_bits(), Ordering::Relaxed);
        }
    }
}

/// Access log used to check that workers stay within their tiles.
#[cfg(test)]
#[derive(Debug)]
struct WriteTracker {
    owners: Box<[std::sync::atomic::AtomicUsize]>,
    conflicts: std::sync::atomic::AtomicUsize,
}

#[cfg(test)]
impl WriteTracker {
    fn new(len: usize) -> Self {
        Self {
            owners: (0..len).map(|_| Default::default()).collect(),
            conflicts: Default::default(),
        }
    }

    fn record(&self, idx: usize, task: TaskId) {
        let owner = task.get() + 1;
        let prev = self.owners[idx].swap(owner, Ordering::Relaxed);

        if prev != 0 && prev != owner {
            self.conflicts.fetch_add(1, Ordering::Relaxed);
        }
    }

    fn owner(&self, idx: usize) -> Option<TaskId> {
        match self.owners[idx].load(Ordering::Relaxed) {
            0 => None,
            owner => Some(TaskId::new(owner - 1)),
        }
    }

    fn clear(&self) {
        for owner in self.owners.iter() {
            owner.store(0, Ordering::Relaxed);
        }

        self.conflicts.store(0, Ordering::Relaxed);
    }
}

#[cfg(test)]
mod tests {
    use glam::vec4;

    use super::*;

    #[test]
    fn write_and_read() {
        let fb = Framebuffer::new(3, 2);

        fb.write(2, 1, vec4(0.5, 0.25, 1.0, 1.0), TaskId::new(0));

        assert_eq!(vec4(0.5, 0.25, 1.0, 1.0), fb.pixel(2, 1));
        assert_eq!(Vec4::ZERO, fb.pixel(0, 0));
        assert_eq!(Vec4::ZERO, fb.pixel(7, 7));
        assert_eq!(Some(TaskId::new(0)), fb.owner(2, 1));

        let raw = fb.to_raw();

        assert_eq!(24, raw.len());
        assert_eq!(0.25, raw[(2 + 3) * 4 + 1]);
    }

    #[test]
    fn conflicts() {
        let fb = Framebuffer::new(2, 2);

        fb.write(0, 0, Vec4::ONE, TaskId::new(0));
        fb.write(0, 0, Vec4::ONE, TaskId::new(0));

        assert_eq!(0, fb.conflicts());

        fb.write(0, 0, Vec4::ONE, TaskId::new(1));

        assert_eq!(1, fb.conflicts());

        fb.clear();

        assert_eq!(0, fb.conflicts());
        assert_eq!(None, fb.owner(0, 0));
        assert_eq!(Vec4::ZERO, fb.pixel(0, 0));
    }

    #[test]
    fn conversions() {
        let fb = Framebuffer::new(2, 1);

        fb.write(0, 0, vec4(2.0, 0.5, -1.0, 1.0), TaskId::new(0));

        let ldr = fb.to_rgba8();
        let hdr = fb.to_rgba32f();

        assert_eq!(Rgba([255, 128, 0, 255]), *ldr.get_pixel(0, 0));
        assert_eq!(Rgba([2.0, 0.5, -1.0, 1.0]), *hdr.get_pixel(0, 0));
        assert_eq!(Rgba([0, 0, 0, 0]), *ldr.get_pixel(1, 0));
    }
}
