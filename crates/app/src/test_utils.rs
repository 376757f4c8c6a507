//! Test helpers

use std::{
    sync::{Arc, Mutex},
    time::{Duration, Instant},
};

use blastoff_core::{Color, DriverError, DriverFactory, StripConfig, StripDriver};

use crate::lock;

#[derive(Debug, Default)]
struct MemoryState {
    frames: Vec<Vec<Color>>,
    written_at: Vec<Instant>,
    created: usize,
    setups: usize,
    releases: usize,
    /// Driver calls made after the driver had been released.
    misuses: usize,

    fail_init: bool,
    fail_setup: bool,
    fail_render_after: Option<usize>,
    fail_blank: bool,
}

/// Shared view of everything that happened to the drivers of a [`MemoryStrip`].
#[derive(Debug, Clone, Default)]
pub struct MemoryProbe(Arc<Mutex<MemoryState>>);

impl MemoryProbe {
    /// Total number of rendered frames.
    pub fn writes(&self) -> usize {
        lock(&self.0).frames.len()
    }

    /// Copy of every rendered frame in order.
    pub fn frames(&self) -> Vec<Vec<Color>> {
        lock(&self.0).frames.clone()
    }

    /// The moment each frame was written, in order.
    pub fn write_times(&self) -> Vec<Instant> {
        lock(&self.0).written_at.clone()
    }

    pub fn last_frame(&self) -> Option<Vec<Color>> {
        lock(&self.0).frames.last().cloned()
    }

    /// Number of drivers created by the factory.
    pub fn created(&self) -> usize {
        lock(&self.0).created
    }

    pub fn setups(&self) -> usize {
        lock(&self.0).setups
    }

    pub fn releases(&self) -> usize {
        lock(&self.0).releases
    }

    /// Number of created drivers which are not released yet.
    pub fn active(&self) -> usize {
        let state = lock(&self.0);
        state.created - state.releases
    }

    /// Number of driver calls made after release, including double releases.
    pub fn misuses(&self) -> usize {
        lock(&self.0).misuses
    }

    /// Makes the factory fail to create new drivers.
    pub fn fail_init(&self, value: bool) {
        lock(&self.0).fail_init = value;
    }

    /// Makes the driver setup fail.
    pub fn fail_setup(&self, value: bool) {
        lock(&self.0).fail_setup = value;
    }

    /// Makes every render fail once the given total number of frames is written.
    pub fn fail_render_after(&self, writes: Option<usize>) {
        lock(&self.0).fail_render_after = writes;
    }

    /// Makes rendering of a completely blank frame fail.
    pub fn fail_blank(&self, value: bool) {
        lock(&self.0).fail_blank = value;
    }

    /// Waits until at least `count` frames are written.
    pub fn wait_for_writes(&self, count: usize, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        while Instant::now() < deadline {
            if self.writes() >= count {
                return true;
            }
            std::thread::sleep(Duration::from_millis(1));
        }
        self.writes() >= count
    }
}

/// In-memory strip driver factory.
#[derive(Debug, Clone, Default)]
pub struct MemoryStrip {
    probe: MemoryProbe,
}

impl MemoryStrip {
    pub fn probe(&self) -> MemoryProbe {
        self.probe.clone()
    }
}

impl DriverFactory for MemoryStrip {
    type Driver = MemoryDriver;

    fn create(&self, config: &StripConfig) -> Result<Self::Driver, DriverError> {
        let mut state = lock(&self.probe.0);
        if state.fail_init {
            return Err(DriverError::init("injected failure"));
        }
        state.created += 1;

        Ok(MemoryDriver {
            probe: self.probe.clone(),
            led_count: config.len(),
            released: false,
        })
    }
}

/// Strip driver recording the rendered frames into the shared probe.
#[derive(Debug)]
pub struct MemoryDriver {
    probe: MemoryProbe,
    led_count: usize,
    released: bool,
}

impl StripDriver for MemoryDriver {
    fn setup(&mut self) -> Result<(), DriverError> {
        let mut state = lock(&self.probe.0);
        if self.released {
            state.misuses += 1;
        }
        if state.fail_setup {
            return Err(DriverError::setup("injected failure"));
        }
        state.setups += 1;
        Ok(())
    }

    fn render(&mut self, frame: &[Color]) -> Result<(), DriverError> {
        let mut state = lock(&self.probe.0);
        if self.released {
            state.misuses += 1;
        }
        assert_eq!(frame.len(), self.led_count, "Unexpected frame length");

        let is_blank = frame.iter().all(|color| color.is_black());
        if state.fail_blank && is_blank {
            return Err(DriverError::render("injected blank failure"));
        }
        if matches!(state.fail_render_after, Some(limit) if state.frames.len() >= limit) {
            return Err(DriverError::render("injected failure"));
        }

        state.frames.push(frame.to_vec());
        state.written_at.push(Instant::now());
        Ok(())
    }

    fn release(&mut self) {
        let mut state = lock(&self.probe.0);
        if self.released {
            state.misuses += 1;
            return;
        }
        self.released = true;
        state.releases += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_strip_records_frames() {
        let backend = MemoryStrip::default();
        let probe = backend.probe();

        let mut driver = backend.create(&StripConfig::new(60, 2)).unwrap();
        driver.setup().unwrap();
        driver.render(&[Color::RED, Color::BLACK]).unwrap();
        driver.release();
        driver.release();

        assert_eq!(probe.created(), 1);
        assert_eq!(probe.setups(), 1);
        assert_eq!(probe.frames(), vec![vec![Color::RED, Color::BLACK]]);
        assert_eq!(probe.write_times().len(), 1);
        assert_eq!(probe.releases(), 1);
        assert_eq!(probe.active(), 0);
        assert_eq!(probe.misuses(), 1);
    }
}
