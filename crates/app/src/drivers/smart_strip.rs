//! Adapter for the [`smart_leds`] ecosystem drivers.

use std::{fmt::Debug, iter::repeat};

use blastoff_core::{Color, DriverError, DriverFactory, StripConfig, StripDriver};
use smart_leds::{brightness, SmartLedsWrite, RGB8};

/// Strip driver on top of any [`SmartLedsWrite`] implementation.
///
/// The global brightness is applied in software before every write.
pub struct SmartLedsDriver<W> {
    writer: Option<W>,
    brightness: u8,
    led_count: usize,
}

impl<W> SmartLedsDriver<W>
where
    W: SmartLedsWrite<Color = RGB8> + Send + 'static,
    W::Error: Debug,
{
    pub fn new(writer: W, config: &StripConfig) -> Self {
        Self {
            writer: Some(writer),
            brightness: config.brightness,
            led_count: config.len(),
        }
    }

    fn writer(&mut self) -> Result<&mut W, DriverError> {
        self.writer
            .as_mut()
            .ok_or_else(|| DriverError::render("the driver has been released"))
    }
}

impl<W> StripDriver for SmartLedsDriver<W>
where
    W: SmartLedsWrite<Color = RGB8> + Send + 'static,
    W::Error: Debug,
{
    fn setup(&mut self) -> Result<(), DriverError> {
        let led_count = self.led_count;
        // Start from a blank strip, whatever was shown before.
        self.writer()
            .map_err(|_| DriverError::Setup)?
            .write(repeat(RGB8::default()).take(led_count))
            .map_err(|err| DriverError::setup(format_args!("{err:?}")))
    }

    fn render(&mut self, frame: &[Color]) -> Result<(), DriverError> {
        let level = self.brightness;
        let pixels = frame.iter().copied().map(RGB8::from);
        self.writer()?
            .write(brightness(pixels, level))
            .map_err(|err| DriverError::render(format_args!("{err:?}")))
    }

    fn release(&mut self) {
        self.writer = None;
    }
}

/// Creates [`SmartLedsDriver`]s from a writer constructor.
pub struct SmartLedsFactory<C> {
    connect: C,
}

impl<C, W> SmartLedsFactory<C>
where
    C: Fn() -> Result<W, DriverError> + Send + Sync + 'static,
{
    /// Creates a factory that opens a new strip writer for every engine.
    pub fn new(connect: C) -> Self {
        Self { connect }
    }
}

impl<C, W> DriverFactory for SmartLedsFactory<C>
where
    C: Fn() -> Result<W, DriverError> + Send + Sync + 'static,
    W: SmartLedsWrite<Color = RGB8> + Send + 'static,
    W::Error: Debug,
{
    type Driver = SmartLedsDriver<W>;

    fn create(&self, config: &StripConfig) -> Result<Self::Driver, DriverError> {
        let writer = (self.connect)()?;
        Ok(SmartLedsDriver::new(writer, config))
    }
}

#[cfg(test)]
mod tests {
    use std::{convert::Infallible, sync::mpsc};

    use super::*;

    /// Sends written lines to the channel.
    struct ChannelWriter(mpsc::Sender<Vec<RGB8>>);

    impl SmartLedsWrite for ChannelWriter {
        type Error = Infallible;
        type Color = RGB8;

        fn write<T, I>(&mut self, iterator: T) -> Result<(), Self::Error>
        where
            T: IntoIterator<Item = I>,
            I: Into<Self::Color>,
        {
            self.0.send(iterator.into_iter().map(Into::into).collect()).ok();
            Ok(())
        }
    }

    #[test]
    fn test_smart_leds_driver_applies_brightness() {
        let (tx, rx) = mpsc::channel();
        let config = StripConfig::new(128, 2);
        let mut driver = SmartLedsDriver::new(ChannelWriter(tx), &config);

        driver.setup().unwrap();
        assert_eq!(rx.recv().unwrap(), vec![RGB8::default(); 2]);

        driver.render(&[Color::RED, Color::BLACK]).unwrap();
        let line = rx.recv().unwrap();
        assert!(line[0].r > 0 && line[0].r < 255);
        assert_eq!(line[1], RGB8::default());

        driver.release();
        assert_eq!(driver.render(&[Color::RED]).unwrap_err(), DriverError::Render);
    }
}
