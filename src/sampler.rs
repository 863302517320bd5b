use log::trace;

use crate::bus::TouchBus;
use crate::config::MIN_PRESSURE;
use crate::config::TOUCH_CLOCK_HZ;
use crate::protocol::AXIS_MAX;
use crate::protocol::Command;
use crate::protocol::READ_X;
use crate::protocol::READ_Y;
use crate::protocol::READ_Z1;
use crate::protocol::READ_Z2;
use crate::protocol::decode_axis;
use crate::protocol::decode_pressure;

/// Raw 10 bit sensor coordinates plus the pressure estimate.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RawSample {
	pub x: u16,
	pub y: u16,
	pub pressure: u16,
}

/// Outcome of one read cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reading {
	/// Pressure at or below the floor.
	NoTouch { pressure: u16 },
	/// The two conversions of an axis disagreed.
	Disagreement { pressure: u16 },
	/// Both axes agreed but one of them decoded to zero.
	EdgeRejected { pressure: u16 },
	Sample(RawSample),
}

impl Reading {
	/// Pressure to store after this cycle, 0 for no touch.
	#[inline]
	pub const fn pressure(&self) -> u16 {
		match self {
			Self::NoTouch { .. } => 0,
			Self::Disagreement { pressure } | Self::EdgeRejected { pressure } => *pressure,
			Self::Sample(a) => a.pressure,
		}
	}

	#[inline]
	pub const fn sample(&self) -> Option<RawSample> {
		match self {
			Self::Sample(a) => Some(*a),
			_ => None,
		}
	}
}

/// Runs one full read cycle on `bus`.
///
/// The bus clock is lowered and chip-select asserted for the cycle. Both are
/// put back on every path, a transport error inside the cycle is returned
/// after that.
pub fn acquire<B: TouchBus>(bus: &mut B) -> anyhow::Result<Reading> {
	let prior = bus.clock_speed()?;
	bus.set_clock_speed(TOUCH_CLOCK_HZ)?;

	let reading = match bus.select() {
		Ok(()) => {
			let reading = read_cycle(bus);
			let released = bus.release();
			reading.and_then(|a| released.map(|_| a))
		}
		Err(e) => Err(e),
	};
	let restored = bus.set_clock_speed(prior);

	let reading = reading?;
	restored?;

	Ok(reading)
}

fn read_cycle<B: TouchBus>(bus: &mut B) -> anyhow::Result<Reading> {
	bus.write_byte(READ_Z1.byte())?;
	let z1 = bus.read_byte()?;
	bus.write_byte(READ_Z2.byte())?;
	let z2 = bus.read_byte()?;
	let pressure = decode_pressure(z1, z2);

	if pressure <= MIN_PRESSURE {
		trace!("#[sample] no touch, pressure: {}", pressure);
		return Ok(Reading::NoTouch { pressure });
	}

	let x = match read_axis(bus, READ_X)? {
		Some(a) => AXIS_MAX - a,
		None => {
			trace!("#[sample] x disagreement, pressure: {}", pressure);
			return Ok(Reading::Disagreement { pressure });
		}
	};
	let y = match read_axis(bus, READ_Y)? {
		Some(a) => a,
		None => {
			trace!("#[sample] y disagreement, pressure: {}", pressure);
			return Ok(Reading::Disagreement { pressure });
		}
	};

	if x == 0 || y == 0 {
		trace!("#[sample] edge reading, x: {}, y: {}", x, y);
		return Ok(Reading::EdgeRejected { pressure });
	}

	trace!("#[sample] x: {}, y: {}, pressure: {}", x, y, pressure);
	Ok(Reading::Sample(RawSample { x, y, pressure }))
}

/// Two conversions of one axis, `None` unless their high bytes agree.
fn read_axis<B: TouchBus>(bus: &mut B, cmd: Command) -> anyhow::Result<Option<u16>> {
	bus.write_byte(cmd.byte())?;
	let a1 = bus.read_byte()?;
	let _b1 = bus.read_byte()?;
	bus.write_byte(cmd.byte())?;
	let a2 = bus.read_byte()?;
	let b2 = bus.read_byte()?;

	if a1 != a2 {
		return Ok(None);
	}

	Ok(Some(decode_axis(a2, b2)))
}

#[cfg(test)]
use crate::bus::mock::Call;
#[cfg(test)]
use crate::bus::mock::MockBus;

#[cfg(test)]
const CLOCK: u32 = 16_000_000;

#[cfg(test)]
#[test]
fn pressure_below_floor_skips_axes() {
	let mut bus = MockBus::new(CLOCK, &[0x00, 0xff]);
	let reading = acquire(&mut bus).unwrap();

	assert_eq!(reading, Reading::NoTouch { pressure: 0 });
	assert_eq!(reading.pressure(), 0);
	assert_eq!(bus.writes(), vec![0xB8, 0xC8]);
	assert_eq!(
		bus.calls,
		vec![
			Call::Clock(TOUCH_CLOCK_HZ),
			Call::Select,
			Call::Write(0xB8),
			Call::Read(0x00),
			Call::Write(0xC8),
			Call::Read(0xff),
			Call::Release,
			Call::Clock(CLOCK),
		]
	);
}

#[cfg(test)]
#[test]
fn pressure_at_floor_is_no_touch() {
	// 5 + 0
	let mut bus = MockBus::new(CLOCK, &[0x05, 0xff]);
	assert_eq!(acquire(&mut bus).unwrap(), Reading::NoTouch { pressure: 5 });
}

#[cfg(test)]
#[test]
fn agreeing_reads_decode() {
	// p = 0x20 + (255 - 0xdf) = 32 + 32
	let mut bus = MockBus::new(
		CLOCK,
		&[
			0x20, 0xdf, // z1, z2
			0x40, 0x00, 0x40, 0x80, // x: 1023 - 258
			0x20, 0x11, 0x20, 0xc0, // y: 131
		],
	);
	let reading = acquire(&mut bus).unwrap();

	assert_eq!(
		reading,
		Reading::Sample(RawSample {
			x: 765,
			y: 131,
			pressure: 64,
		})
	);
	assert_eq!(bus.writes(), vec![0xB8, 0xC8, 0x90, 0x90, 0xD0, 0xD0]);
	assert_eq!(bus.clock, CLOCK);
	assert_eq!(bus.calls.last(), Some(&Call::Clock(CLOCK)));
}

#[cfg(test)]
#[test]
fn x_disagreement_skips_y() {
	let mut bus = MockBus::new(CLOCK, &[0x20, 0xdf, 0x40, 0x00, 0x41, 0x00]);
	let reading = acquire(&mut bus).unwrap();

	assert_eq!(reading, Reading::Disagreement { pressure: 64 });
	assert_eq!(reading.pressure(), 64);
	assert!(reading.sample().is_none());
	assert_eq!(bus.writes(), vec![0xB8, 0xC8, 0x90, 0x90]);
	assert!(bus.responses.is_empty());
}

#[cfg(test)]
#[test]
fn y_disagreement() {
	let mut bus = MockBus::new(
		CLOCK,
		&[0x20, 0xdf, 0x40, 0x00, 0x40, 0x00, 0x20, 0x00, 0x21, 0x00],
	);
	assert_eq!(acquire(&mut bus).unwrap(), Reading::Disagreement { pressure: 64 });
}

#[cfg(test)]
#[test]
fn zero_axis_is_rejected() {
	// x decodes to 1023 - 1023 = 0.
	let mut bus = MockBus::new(
		CLOCK,
		&[0x20, 0xdf, 0xff, 0xc0, 0xff, 0xc0, 0x20, 0x00, 0x20, 0x00],
	);
	assert_eq!(acquire(&mut bus).unwrap(), Reading::EdgeRejected { pressure: 64 });

	// y decodes to 0.
	let mut bus = MockBus::new(
		CLOCK,
		&[0x20, 0xdf, 0x40, 0x00, 0x40, 0x00, 0x00, 0x00, 0x00, 0x3f],
	);
	assert_eq!(acquire(&mut bus).unwrap(), Reading::EdgeRejected { pressure: 64 });
}

#[cfg(test)]
#[test]
fn transport_failure_still_restores_bus() {
	let mut bus = MockBus::new(CLOCK, &[0x20, 0xdf, 0x40]);
	bus.fail_read_at = Some(2);

	assert!(acquire(&mut bus).is_err());
	assert_eq!(bus.clock, CLOCK);
	let tail = &bus.calls[bus.calls.len() - 2..];
	assert_eq!(tail, &[Call::Release, Call::Clock(CLOCK)]);
}

#[cfg(test)]
#[test]
fn select_failure_restores_clock_without_release() {
	let mut bus = MockBus::new(CLOCK, &[0x20, 0xdf]);
	bus.fail_select = true;

	assert!(acquire(&mut bus).is_err());
	assert_eq!(bus.clock, CLOCK);
	assert_eq!(bus.calls, vec![Call::Clock(TOUCH_CLOCK_HZ), Call::Clock(CLOCK)]);
	assert_eq!(bus.responses.len(), 2);
}
