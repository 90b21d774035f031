//! Driver for reading particle number concentrations from a Sensirion SEN5x.
//!
//! The SEN5x answers the command `0x0413` with its mass concentrations
//! followed by the PM0.5 to PM10 number concentrations and the typical
//! particle size. This command is absent from the datasheet and documented
//! only in an application note, so the frame layout should be treated as
//! experimental.
//!
//! ```no_run
//! # use embedded_hal::{delay::DelayNs, i2c::I2c};
//! use core::time::Duration;
//! use sen5x_number::{Config, Field, PollingDriver, Sensor, SensorSlots};
//!
//! struct Gauge(f32);
//!
//! impl Sensor for Gauge {
//!     fn publish(&mut self, value: f32) {
//!         self.0 = value;
//!     }
//! }
//!
//! # fn run<I: I2c, D: DelayNs>(i2c: I, delay: D, now: impl Fn() -> Duration) -> Result<(), sen5x_number::Error> {
//! let slots = SensorSlots::new()
//!     .with(Field::Pm2_5Number, Gauge(0.0))?
//!     .with(Field::TypicalParticleSize, Gauge(0.0))?;
//! let mut driver = PollingDriver::from_i2c(i2c, delay, Config::default(), slots)?;
//! driver.setup();
//! loop {
//!     driver.poll(now());
//! }
//! # }
//! ```

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]

pub mod codec;
pub mod command;
mod config;
mod crc;
mod driver;
mod error;
mod sensor;
pub mod transport;
mod types;

pub use codec::{decode, RawFrame};
pub use command::{Command, DEFAULT_ADDRESS};
pub use config::Config;
pub use driver::{Cycle, PollingDriver, State, Stats, Status};
pub use error::{BusError, BusErrorKind, BusPhase, ChecksumError, ConfigurationError, Error};
pub use sensor::{Sensor, SensorSlots};
pub use transport::{BusTransport, I2cTransport};
pub use types::{ConcentrationReading, Field, FieldSet, Measurement, SENTINEL};
