//! LED strip driver backends.

pub use self::{
    logging::LoggingDriver,
    smart_strip::{SmartLedsDriver, SmartLedsFactory},
};

mod logging;
mod smart_strip;
