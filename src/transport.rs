use embedded_hal::{
    delay::DelayNs,
    i2c::{Error as _, I2c},
};
use sensirion_i2c::i2c;

use crate::{
    command::{Command, EXECUTION_TIME_MS},
    error::{BusError, BusPhase},
};

/// Addressed command/response exchange with the sensor.
///
/// Implementations do not retry; a failed exchange is reported once and the
/// caller decides what to do next.
pub trait BusTransport {
    fn write(&mut self, address: u8, command: Command) -> Result<(), BusError>;

    fn read(&mut self, address: u8, buf: &mut [u8]) -> Result<(), BusError>;

    /// Sends `command` and fills `buf` with the response.
    fn request(&mut self, address: u8, command: Command, buf: &mut [u8]) -> Result<(), BusError> {
        self.write(address, command)?;
        self.read(address, buf)
    }
}

impl<T: BusTransport + ?Sized> BusTransport for &mut T {
    fn write(&mut self, address: u8, command: Command) -> Result<(), BusError> {
        (**self).write(address, command)
    }

    fn read(&mut self, address: u8, buf: &mut [u8]) -> Result<(), BusError> {
        (**self).read(address, buf)
    }

    fn request(&mut self, address: u8, command: Command, buf: &mut [u8]) -> Result<(), BusError> {
        (**self).request(address, command, buf)
    }
}

/// [`BusTransport`] over an embedded-hal I2C bus.
///
/// Owning the bus handle serializes access: one exchange is in flight at a
/// time. Bus timeouts are whatever the HAL implementation enforces.
pub struct I2cTransport<I2C, D> {
    i2c: I2C,
    delay: D,
    command_delay_ms: u32,
}

impl<I2C, D> I2cTransport<I2C, D>
where
    I2C: I2c,
    D: DelayNs,
{
    pub fn new(i2c: I2C, delay: D) -> Self {
        Self {
            i2c,
            delay,
            command_delay_ms: EXECUTION_TIME_MS,
        }
    }

    /// Overrides the wait between the command write and the response read.
    pub fn with_command_delay_ms(mut self, ms: u32) -> Self {
        self.command_delay_ms = ms;
        self
    }

    pub fn release(self) -> (I2C, D) {
        (self.i2c, self.delay)
    }
}

impl<I2C, D> BusTransport for I2cTransport<I2C, D>
where
    I2C: I2c,
    D: DelayNs,
{
    fn write(&mut self, address: u8, command: Command) -> Result<(), BusError> {
        i2c::write_command_u16(&mut self.i2c, address, command.opcode())
            .map_err(|e| BusError::new(BusPhase::Write, e.kind()))
    }

    fn read(&mut self, address: u8, buf: &mut [u8]) -> Result<(), BusError> {
        self.i2c
            .read(address, buf)
            .map_err(|e| BusError::new(BusPhase::Read, e.kind()))
    }

    fn request(&mut self, address: u8, command: Command, buf: &mut [u8]) -> Result<(), BusError> {
        self.write(address, command)?;
        self.delay.delay_ms(self.command_delay_ms);
        self.read(address, buf)
    }
}
