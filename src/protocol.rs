//! Control byte layout of the ADS7846:
//!
//! ```text
//!  bit:   7      6  5  4     3       2         1  0
//!        START | A2 A1 A0 | MODE | SER/DFR | PD1 PD0
//! ```
//!
//! `MODE` selects 12 or 8 bit conversions, `SER/DFR` single-ended or
//! differential reference, `PD` the power-down behaviour between conversions.

/// Start bit, must be set on every control byte.
pub const CMD_START: u8 = 0x80;

/// Input channel (`A2..A0`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Channel {
	XPos = 0x10,
	Z1Pos = 0x30,
	Z2Pos = 0x40,
	YPos = 0x50,
}

/// Conversion resolution (`MODE`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Resolution {
	Bits12 = 0x00,
	Bits8 = 0x08,
}

/// Reference selection (`SER/DFR`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Reference {
	Differential = 0x00,
	SingleEnded = 0x04,
}

/// Power-down mode (`PD1 PD0`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum PowerMode {
	PowerDown = 0x00,
	AlwaysOn = 0x03,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Command {
	pub channel: Channel,
	pub resolution: Resolution,
	pub reference: Reference,
	pub power: PowerMode,
}

impl Command {
	#[inline]
	pub const fn new(channel: Channel, resolution: Resolution) -> Self {
		Self {
			channel,
			resolution,
			reference: Reference::Differential,
			power: PowerMode::PowerDown,
		}
	}

	#[inline]
	pub const fn byte(&self) -> u8 {
		CMD_START
			| self.channel as u8
			| self.resolution as u8
			| self.reference as u8
			| self.power as u8
	}
}

pub const READ_Z1: Command = Command::new(Channel::Z1Pos, Resolution::Bits8);
pub const READ_Z2: Command = Command::new(Channel::Z2Pos, Resolution::Bits8);
pub const READ_X: Command = Command::new(Channel::XPos, Resolution::Bits12);
pub const READ_Y: Command = Command::new(Channel::YPos, Resolution::Bits12);

/// Largest value of a decoded axis.
pub const AXIS_MAX: u16 = 1023;

/// Folds the two response bytes of a 12 bit conversion into 10 bits.
#[inline]
pub const fn decode_axis(high: u8, low: u8) -> u16 {
	((high as u16) << 2) | ((low as u16) >> 6)
}

/// Pressure proxy from the two 8 bit Z responses, the Z2 channel reads inverted.
#[inline]
pub const fn decode_pressure(z1: u8, z2: u8) -> u16 {
	((z1 & 0x7f) as u16) + (((255 - z2) & 0x7f) as u16)
}

#[cfg(test)]
#[test]
fn command_bytes() {
	assert_eq!(READ_Z1.byte(), 0xB8);
	assert_eq!(READ_Z2.byte(), 0xC8);
	assert_eq!(READ_X.byte(), 0x90);
	assert_eq!(READ_Y.byte(), 0xD0);

	let cmd = Command {
		reference: Reference::SingleEnded,
		power: PowerMode::AlwaysOn,
		..READ_X
	};
	assert_eq!(cmd.byte(), 0x97);
}

#[cfg(test)]
#[test]
fn axis_and_pressure_decoding() {
	assert_eq!(decode_axis(0, 0), 0);
	assert_eq!(decode_axis(0xff, 0xff), AXIS_MAX);
	assert_eq!(decode_axis(0x40, 0x80), 258);
	assert_eq!(decode_axis(0x40, 0x3f), 256); // low six bits are dropped

	assert_eq!(decode_pressure(0, 255), 0);
	assert_eq!(decode_pressure(0xff, 0), 254);
	assert_eq!(decode_pressure(0x83, 0xf0), 3 + 15);
}
