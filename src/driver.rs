//! Periodic read-decode-publish cycle.

use core::time::Duration;

use embedded_hal::{delay::DelayNs, i2c::I2c};
use log::{debug, info, trace, warn};

use crate::{
    codec::{self, RawFrame},
    command::{Command, RESPONSE_LEN},
    config::Config,
    error::{BusError, ConfigurationError, Error},
    sensor::{Sensor, SensorSlots},
    transport::{BusTransport, I2cTransport},
    types::{ConcentrationReading, Field, FieldSet},
};

/// Phase of the polling cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    Idle,
    Requesting,
    Decoding,
    Publishing,
}

/// Health flag, raised by a failed cycle and cleared by the next good one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Ok,
    Warning,
}

/// Counters over the driver's lifetime.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Stats {
    pub cycles: u32,
    pub published: u32,
    pub bus_errors: u32,
    pub checksum_errors: u32,
    pub dropped_ticks: u32,
    pub idle_cycles: u32,
}

/// What a single cycle ended with.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Cycle {
    /// Values were handed to `published` slots.
    Published { published: usize },
    /// No slot is bound; the bus was not touched.
    NothingConfigured,
    BusFailed(BusError),
    Rejected(Error),
    /// A previous cycle was still in flight.
    Dropped,
}

/// Reads the sensor on a fixed schedule and feeds the bound slots.
pub struct PollingDriver<T, S> {
    transport: T,
    config: Config,
    slots: SensorSlots<S>,
    fields: FieldSet,
    state: State,
    status: Status,
    stats: Stats,
    next_tick: Option<Duration>,
}

impl<I2C, D, S> PollingDriver<I2cTransport<I2C, D>, S>
where
    I2C: I2c,
    D: DelayNs,
    S: Sensor,
{
    /// Builds a driver on top of an embedded-hal bus, honoring the
    /// configured command delay.
    pub fn from_i2c(
        i2c: I2C,
        delay: D,
        config: Config,
        slots: SensorSlots<S>,
    ) -> Result<Self, ConfigurationError> {
        let transport =
            I2cTransport::new(i2c, delay).with_command_delay_ms(config.command_delay_ms());
        Self::new(transport, config, slots)
    }
}

impl<T, S> PollingDriver<T, S>
where
    T: BusTransport,
    S: Sensor,
{
    /// Creates the driver. An empty slot table is accepted: the driver then
    /// idles without generating bus traffic.
    ///
    /// When `config.fields` is set, the bound slots have to match it exactly.
    pub fn new(
        transport: T,
        config: Config,
        slots: SensorSlots<S>,
    ) -> Result<Self, ConfigurationError> {
        config.validate()?;
        let fields = slots.fields();
        if let Some(configured) = config.fields {
            if configured != fields {
                return Err(ConfigurationError::FieldsMismatch {
                    configured,
                    bound: fields,
                });
            }
        }
        Ok(Self {
            transport,
            config,
            slots,
            fields,
            state: State::Idle,
            status: Status::Ok,
            stats: Stats::default(),
            next_tick: None,
        })
    }

    pub fn setup(&mut self) {
        info!("setting up SEN5x number concentration reader");
        self.dump_config();
        if self.fields.is_empty() {
            warn!("{}", ConfigurationError::NoFieldsConfigured);
        }
    }

    pub fn dump_config(&self) {
        info!("SEN5x number concentration:");
        info!("  address: {:#04x}", self.config.address);
        info!("  update interval: {:?}", self.config.update_interval);
        for field in Field::ALL {
            let bound = if self.slots.is_bound(field) {
                "bound"
            } else {
                "not bound"
            };
            info!("  {}: {}", field.name(), bound);
        }
    }

    pub fn state(&self) -> State {
        self.state
    }

    pub fn status(&self) -> Status {
        self.status
    }

    pub fn stats(&self) -> Stats {
        self.stats
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn fields(&self) -> FieldSet {
        self.fields
    }

    pub fn slots(&self) -> &SensorSlots<S> {
        &self.slots
    }

    /// Time of the next scheduled tick, once the schedule has started.
    pub fn next_tick(&self) -> Option<Duration> {
        self.next_tick
    }

    /// Advances the schedule to `now`, a monotonic timestamp, and runs a
    /// cycle if a tick is due.
    ///
    /// The first call always ticks. Ticks that elapsed without a call, for
    /// example while the previous cycle held the bus, are dropped rather
    /// than replayed.
    pub fn poll(&mut self, now: Duration) -> Option<Cycle> {
        let interval = self.config.update_interval;
        let due = *self.next_tick.get_or_insert(now);
        if now < due {
            return None;
        }

        let step = interval.as_nanos();
        let missed = (now - due).as_nanos() / step;
        if missed > 0 {
            let dropped = u32::try_from(missed).unwrap_or(u32::MAX);
            self.stats.dropped_ticks = self.stats.dropped_ticks.saturating_add(dropped);
            warn!("poll overran its interval, dropping {missed} ticks");
        }
        self.next_tick = Some(due.saturating_add(from_nanos(step * (missed + 1))));

        Some(self.update())
    }

    /// Runs one cycle now.
    pub fn update(&mut self) -> Cycle {
        if self.state != State::Idle {
            self.stats.dropped_ticks = self.stats.dropped_ticks.saturating_add(1);
            warn!("previous read still in flight ({:?}), dropping tick", self.state);
            return Cycle::Dropped;
        }
        self.stats.cycles = self.stats.cycles.saturating_add(1);

        if self.fields.is_empty() {
            self.stats.idle_cycles = self.stats.idle_cycles.saturating_add(1);
            debug!("no fields configured, skipping read");
            return Cycle::NothingConfigured;
        }

        let cycle = match self.read_and_publish() {
            Ok(published) => {
                self.stats.published = self.stats.published.saturating_add(1);
                self.status = Status::Ok;
                Cycle::Published { published }
            }
            Err(Error::Bus(err)) => {
                self.stats.bus_errors = self.stats.bus_errors.saturating_add(1);
                self.status = Status::Warning;
                warn!("failed to read number concentration data: {err}");
                Cycle::BusFailed(err)
            }
            Err(err) => {
                if let Error::Checksum(_) = err {
                    self.stats.checksum_errors = self.stats.checksum_errors.saturating_add(1);
                }
                self.status = Status::Warning;
                warn!("discarding number concentration frame: {err}");
                Cycle::Rejected(err)
            }
        };
        self.state = State::Idle;
        cycle
    }

    fn read_and_publish(&mut self) -> Result<usize, Error> {
        self.state = State::Requesting;
        let len = self.fields.frame_len();
        let mut buf = [0u8; RESPONSE_LEN];
        debug!("requesting {len} bytes from {:#04x}", self.config.address);
        self.transport.request(
            self.config.address,
            Command::ReadMassAndNumber,
            &mut buf[..len],
        )?;

        self.state = State::Decoding;
        let frame = RawFrame::from_bytes(&buf[..len])?;
        trace!("received {frame:?}");
        let reading = codec::decode(&frame, self.fields)?;

        self.state = State::Publishing;
        Ok(self.publish(&reading))
    }

    fn publish(&mut self, reading: &ConcentrationReading) -> usize {
        let mut published = 0;
        for (field, measurement) in reading.iter() {
            let Some(sensor) = self.slots.get_mut(field) else {
                continue;
            };
            match measurement.value() {
                Some(value) => {
                    let value = value * field.publish_factor();
                    debug!("{} = {value}", field.name());
                    sensor.publish(value);
                    published += 1;
                }
                None => debug!("{} unavailable", field.name()),
            }
        }
        published
    }

    pub fn release(self) -> (T, SensorSlots<S>) {
        (self.transport, self.slots)
    }
}

fn from_nanos(nanos: u128) -> Duration {
    const NANOS_PER_SEC: u128 = 1_000_000_000;
    let secs = u64::try_from(nanos / NANOS_PER_SEC).unwrap_or(u64::MAX);
    Duration::new(secs, (nanos % NANOS_PER_SEC) as u32)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        command::WORD_LEN,
        error::{BusErrorKind, BusPhase},
    };

    /// Transport serving canned responses.
    struct Scripted {
        frames: Vec<Result<RawFrame, BusError>>,
        requests: Vec<usize>,
    }

    impl BusTransport for Scripted {
        fn write(&mut self, _address: u8, _command: Command) -> Result<(), BusError> {
            Ok(())
        }

        fn read(&mut self, _address: u8, buf: &mut [u8]) -> Result<(), BusError> {
            self.requests.push(buf.len());
            let frame = self.frames.remove(0)?;
            buf.copy_from_slice(&frame.as_bytes()[..buf.len()]);
            Ok(())
        }
    }

    #[derive(Default)]
    struct Recorder(Vec<f32>);

    impl Sensor for Recorder {
        fn publish(&mut self, value: f32) {
            self.0.push(value);
        }
    }

    fn frame() -> RawFrame {
        RawFrame::from_words(&[0, 0, 0, 0, 100, 200, 300, 400, 500, 1000]).unwrap()
    }

    fn driver(
        frames: Vec<Result<RawFrame, BusError>>,
        fields: &[Field],
    ) -> PollingDriver<Scripted, Recorder> {
        let mut slots = SensorSlots::new();
        for field in fields {
            slots.bind(*field, Recorder::default()).unwrap();
        }
        let transport = Scripted {
            frames,
            requests: Vec::new(),
        };
        PollingDriver::new(transport, Config::default(), slots).unwrap()
    }

    #[test]
    fn reads_only_as_far_as_needed() {
        let mut driver = driver(vec![Ok(frame())], &[Field::Pm1_0Number]);
        assert_eq!(driver.update(), Cycle::Published { published: 1 });

        let (transport, slots) = driver.release();
        assert_eq!(transport.requests, vec![6 * WORD_LEN]);
        assert_eq!(slots.get(Field::Pm1_0Number).unwrap().0, vec![20_000_000.0]);
    }

    #[test]
    fn bus_error_raises_warning_until_next_success() {
        let err = BusError::new(BusPhase::Read, BusErrorKind::Nack);
        let mut driver = driver(vec![Err(err), Ok(frame())], &[Field::TypicalParticleSize]);

        assert_eq!(driver.update(), Cycle::BusFailed(err));
        assert_eq!(driver.state(), State::Idle);
        assert_eq!(driver.status(), Status::Warning);

        assert_eq!(driver.update(), Cycle::Published { published: 1 });
        assert_eq!(driver.status(), Status::Ok);
        assert_eq!(driver.stats().bus_errors, 1);
        assert_eq!(driver.stats().published, 1);
    }

    #[test]
    fn busy_driver_drops_tick() {
        let mut driver = driver(vec![Ok(frame())], &[Field::Pm0_5Number]);
        driver.state = State::Requesting;
        assert_eq!(driver.update(), Cycle::Dropped);
        assert_eq!(driver.stats().dropped_ticks, 1);
        assert_eq!(driver.stats().cycles, 0);
    }

    #[test]
    fn schedule_is_anchored_at_first_tick() {
        let mut driver = driver(
            vec![Ok(frame()), Ok(frame()), Ok(frame())],
            &[Field::Pm0_5Number],
        );
        let secs = Duration::from_secs;

        assert!(driver.poll(secs(5)).is_some());
        assert_eq!(driver.next_tick(), Some(secs(65)));
        assert!(driver.poll(secs(30)).is_none());
        assert!(driver.poll(secs(64)).is_none());
        assert!(driver.poll(secs(65)).is_some());
        // two intervals late: one tick is dropped, the schedule keeps its phase
        assert!(driver.poll(secs(190)).is_some());
        assert_eq!(driver.next_tick(), Some(secs(245)));
        assert_eq!(driver.stats().dropped_ticks, 1);
        assert_eq!(driver.stats().cycles, 3);
    }

    #[test]
    fn long_stall_skips_ahead_in_one_step() {
        let mut slots = SensorSlots::new();
        slots.bind(Field::Pm0_5Number, Recorder::default()).unwrap();
        let transport = Scripted {
            frames: vec![Ok(frame()), Ok(frame())],
            requests: Vec::new(),
        };
        let config = Config::default().with_update_interval(Duration::from_micros(1));
        let mut driver = PollingDriver::new(transport, config, slots).unwrap();

        assert!(driver.poll(Duration::ZERO).is_some());
        assert!(driver.poll(Duration::from_secs(200)).is_some());

        assert_eq!(driver.stats().dropped_ticks, 200_000_000);
        assert_eq!(driver.stats().cycles, 2);
        assert_eq!(
            driver.next_tick(),
            Some(Duration::from_secs(200) + Duration::from_micros(1))
        );
    }

    #[test]
    fn stall_count_saturates() {
        let mut driver = driver(vec![Ok(frame()), Ok(frame())], &[Field::Pm0_5Number]);
        driver.config.update_interval = Duration::from_nanos(1);

        assert!(driver.poll(Duration::ZERO).is_some());
        assert!(driver.poll(Duration::from_secs(10)).is_some());
        assert_eq!(driver.stats().dropped_ticks, u32::MAX);
        assert_eq!(
            driver.next_tick(),
            Some(Duration::from_secs(10) + Duration::from_nanos(1))
        );
    }

    #[test]
    fn configured_fields_must_match_bound_slots() {
        let mut slots = SensorSlots::new();
        slots.bind(Field::Pm2_5Number, Recorder::default()).unwrap();
        let transport = Scripted {
            frames: Vec::new(),
            requests: Vec::new(),
        };
        let configured = FieldSet::empty()
            .with(Field::Pm2_5Number)
            .with(Field::TypicalParticleSize);
        let config = Config::default().with_fields(configured);

        match PollingDriver::new(transport, config, slots) {
            Err(err) => assert_eq!(
                err,
                ConfigurationError::FieldsMismatch {
                    configured,
                    bound: FieldSet::empty().with(Field::Pm2_5Number),
                }
            ),
            Ok(_) => panic!("mismatched bindings were accepted"),
        }
    }

    #[test]
    fn configured_fields_matching_slots_are_accepted() {
        let mut slots = SensorSlots::new();
        slots.bind(Field::Pm2_5Number, Recorder::default()).unwrap();
        let transport = Scripted {
            frames: vec![Ok(frame())],
            requests: Vec::new(),
        };
        let config = Config::default().with_fields(FieldSet::empty().with(Field::Pm2_5Number));

        let mut driver = PollingDriver::new(transport, config, slots).unwrap();
        assert_eq!(driver.update(), Cycle::Published { published: 1 });
    }
}
