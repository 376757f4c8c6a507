use blastoff_core::{Color, DriverError, StripConfig, StripDriver};

/// Simulated strip which prints frames to the log instead of driving hardware.
#[derive(Debug)]
pub struct LoggingDriver {
    config: StripConfig,
    frames: u64,
}

impl LoggingDriver {
    pub fn new(config: &StripConfig) -> Self {
        log::info!(
            "Using simulated LED strip, brightness: {}, led_count: {}",
            config.brightness,
            config.led_count
        );
        Self {
            config: *config,
            frames: 0,
        }
    }

    /// Returns the number of rendered frames.
    pub fn frames(&self) -> u64 {
        self.frames
    }
}

impl StripDriver for LoggingDriver {
    fn setup(&mut self) -> Result<(), DriverError> {
        log::debug!("Simulated strip is ready");
        Ok(())
    }

    fn render(&mut self, frame: &[Color]) -> Result<(), DriverError> {
        if frame.len() != self.config.len() {
            return Err(DriverError::render(format_args!(
                "frame has {} LEDs instead of {}",
                frame.len(),
                self.config.led_count
            )));
        }

        self.frames += 1;
        if log::log_enabled!(log::Level::Trace) {
            let lit = frame.iter().filter(|color| !color.is_black()).count();
            let head = frame.iter().rposition(|color| !color.is_black());
            log::trace!(
                "frame #{}: {lit}/{} lit, head: {head:?}",
                self.frames,
                frame.len()
            );
        }
        Ok(())
    }

    fn release(&mut self) {
        log::debug!("Simulated strip released after {} frames", self.frames);
    }
}
