//! Flame animation rendering task.

use std::{
    sync::{Arc, Mutex},
    thread::JoinHandle,
    time::Duration,
};

use blastoff_core::{Color, DriverError, DriverFactory, StripConfig, StripDriver, PALETTE};

use crate::{lock, CancellationToken, RenderFailureHandler};

/// Driver handle together with the frame buffer it renders.
///
/// Every driver call happens with this structure locked, so the render loop and the
/// teardown sequence never interleave their writes.
struct Strip<D> {
    /// `None` once the driver has been released.
    driver: Option<D>,
    frame: Vec<Color>,
}

impl<D: StripDriver> Strip<D> {
    /// Paints a single LED and flushes the whole frame.
    fn paint(&mut self, index: usize, color: Color) -> Result<(), DriverError> {
        let Some(driver) = self.driver.as_mut() else {
            return Ok(());
        };

        self.frame[index] = color;
        driver.render(&self.frame)
    }

    /// Blanks every LED and releases the driver.
    ///
    /// The driver is kept if the blank frame could not be rendered.
    fn blank_and_release(&mut self) -> Result<bool, DriverError> {
        let Some(driver) = self.driver.as_mut() else {
            return Ok(false);
        };

        self.frame.fill(Color::BLACK);
        driver.render(&self.frame)?;
        driver.release();
        self.driver = None;
        Ok(true)
    }
}

/// Engine responsible for running the blast-off animation.
pub struct AnimationEngine<D: StripDriver> {
    config: StripConfig,
    cancelled: CancellationToken,
    strip: Arc<Mutex<Strip<D>>>,
    render_task: Option<JoinHandle<()>>,
}

impl<D: StripDriver> AnimationEngine<D> {
    /// Allocates a strip driver with the configured brightness and LED count.
    pub fn create<F>(factory: &F, config: StripConfig) -> Result<Self, DriverError>
    where
        F: DriverFactory<Driver = D>,
    {
        if config.is_empty() {
            return Err(DriverError::init("the strip must have at least one LED"));
        }

        let driver = factory.create(&config)?;
        log::debug!(
            "Animation initialized, brightness: {}, led_count: {}",
            config.brightness,
            config.led_count
        );

        Ok(Self {
            config,
            cancelled: CancellationToken::new(),
            strip: Arc::new(Mutex::new(Strip {
                driver: Some(driver),
                frame: vec![Color::BLACK; config.len()],
            })),
            render_task: None,
        })
    }

    /// Performs one-time driver setup.
    pub fn setup(&self) -> Result<(), DriverError> {
        let mut strip = lock(&self.strip);
        strip
            .driver
            .as_mut()
            .ok_or(DriverError::Setup)?
            .setup()
    }

    /// Starts the render loop on a dedicated thread and returns immediately.
    ///
    /// A driver failure inside the loop ends it and is passed to the `on_failure` handler.
    pub fn run(&mut self, on_failure: RenderFailureHandler) -> Result<(), DriverError> {
        if self.render_task.is_some() {
            log::warn!("Render loop has been already started");
            return Ok(());
        }

        let strip = self.strip.clone();
        let cancelled = self.cancelled.clone();
        let interval = self.config.step_interval();
        let led_count = self.config.len();

        let handle = std::thread::Builder::new()
            .name("flame-render".to_owned())
            .spawn(move || {
                if let Err(err) = render_loop(&strip, &cancelled, led_count, interval) {
                    log::error!("Animation step failed: {err}");
                    on_failure(err);
                }
                log::trace!("Render loop finished");
            })
            .map_err(DriverError::setup)?;
        self.render_task = Some(handle);
        Ok(())
    }

    /// Cancels the render loop, blanks the strip and releases the driver.
    ///
    /// Returns once the strip is blank, without waiting for the render thread to exit.
    /// Calling it again after a successful stop does not touch the driver.
    pub fn stop(&mut self) -> Result<(), DriverError> {
        // Signal the render loop before waiting for the strip lock.
        self.cancelled.cancel();

        log::trace!("Closing animation engine");
        if lock(&self.strip).blank_and_release()? {
            log::debug!("Animation engine destroyed");
        }
        // The render loop observes the token on its own.
        self.render_task.take();
        Ok(())
    }

    pub fn config(&self) -> StripConfig {
        self.config
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.is_cancelled()
    }

    /// Returns true if the render loop has been started.
    pub fn is_running(&self) -> bool {
        self.render_task.is_some()
    }
}

impl<D: StripDriver> Drop for AnimationEngine<D> {
    fn drop(&mut self) {
        self.cancelled.cancel();

        let mut strip = lock(&self.strip);
        if let Some(mut driver) = strip.driver.take() {
            log::debug!("Releasing LED strip driver of a discarded engine");
            driver.release();
        }
    }
}

/// Cycles over the palette lighting up one LED per step until cancelled.
fn render_loop<D: StripDriver>(
    strip: &Mutex<Strip<D>>,
    cancelled: &CancellationToken,
    led_count: usize,
    interval: Duration,
) -> Result<(), DriverError> {
    for color in PALETTE.iter().copied().cycle() {
        log::trace!("Doing animation step, color: {color}");

        for index in 0..led_count {
            if cancelled.is_cancelled() {
                return Ok(());
            }

            {
                let mut strip = lock(strip);
                // Stop may have won the race for the lock.
                if cancelled.is_cancelled() {
                    return Ok(());
                }
                strip.paint(index, color)?;
            }

            std::thread::sleep(interval);
        }
    }

    Ok(())
}
