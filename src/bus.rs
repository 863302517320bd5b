use anyhow::Context;
use log::info;
use log::trace;
use rppal::gpio::Gpio;
use rppal::gpio::OutputPin;
use rppal::spi::Bus;
use rppal::spi::Mode;
use rppal::spi::SlaveSelect;
use rppal::spi::Spi;

use crate::config::BUS_CLOCK_HZ;

/// Byte-level access to the touch controller.
///
/// One poll cycle is a single transaction, the implementation must not let
/// other traffic interleave between `select` and `release`.
pub trait TouchBus {
	fn clock_speed(&self) -> anyhow::Result<u32>;
	fn set_clock_speed(&mut self, hz: u32) -> anyhow::Result<()>;

	/// Chip-select low.
	fn select(&mut self) -> anyhow::Result<()>;
	/// Chip-select high.
	fn release(&mut self) -> anyhow::Result<()>;

	fn write_byte(&mut self, tx: u8) -> anyhow::Result<()>;
	fn read_byte(&mut self) -> anyhow::Result<u8>;
}

/// SPI0 with a GPIO driven chip-select.
///
/// Both handles are closed on drop.
pub struct RppalBus {
	spi: Spi,
	cs: OutputPin,
}

impl RppalBus {
	pub fn open(gpio: &Gpio, cs_pin: u8) -> anyhow::Result<Self> {
		info!("#[pin, {:?}] init, output", cs_pin);
		let cs = gpio
			.get(cs_pin)
			.with_context(|| format!("#[pin, {}] open chip-select", cs_pin))?
			.into_output_high();

		info!("#[spi] init bus, spi0, ss1, {:?}hz", BUS_CLOCK_HZ);
		let spi = Spi::new(Bus::Spi0, SlaveSelect::Ss1, BUS_CLOCK_HZ, Mode::Mode0)
			.context("#[spi] init bus")?;

		Ok(Self { spi, cs })
	}
}

impl TouchBus for RppalBus {
	#[inline]
	fn clock_speed(&self) -> anyhow::Result<u32> {
		Ok(self.spi.clock_speed()?)
	}

	fn set_clock_speed(&mut self, hz: u32) -> anyhow::Result<()> {
		trace!("#[spi] clock {:?}hz", hz);
		self.spi
			.set_clock_speed(hz)
			.with_context(|| format!("#[spi] set clock {}hz", hz))
	}

	#[inline]
	fn select(&mut self) -> anyhow::Result<()> {
		self.cs.set_low();
		Ok(())
	}

	#[inline]
	fn release(&mut self) -> anyhow::Result<()> {
		self.cs.set_high();
		Ok(())
	}

	fn write_byte(&mut self, tx: u8) -> anyhow::Result<()> {
		self.spi.write(&[tx]).context("#[spi] write")?;
		Ok(())
	}

	fn read_byte(&mut self) -> anyhow::Result<u8> {
		let mut rx = [0u8; 1];
		self.spi.transfer(&mut rx, &[0x00]).context("#[spi] read")?;
		Ok(rx[0])
	}
}

#[cfg(test)]
pub(crate) mod mock {
	use std::collections::VecDeque;

	use anyhow::bail;

	use super::TouchBus;

	#[derive(Debug, Clone, Copy, PartialEq, Eq)]
	pub enum Call {
		Clock(u32),
		Select,
		Release,
		Write(u8),
		Read(u8),
	}

	/// Scripted bus, replies with `responses` in order and records every call.
	pub struct MockBus {
		pub clock: u32,
		pub responses: VecDeque<u8>,
		pub calls: Vec<Call>,
		/// Fail the n-th `read_byte`.
		pub fail_read_at: Option<usize>,
		pub fail_select: bool,
		reads: usize,
	}

	impl MockBus {
		pub fn new(clock: u32, responses: &[u8]) -> Self {
			Self {
				clock,
				responses: responses.iter().copied().collect(),
				calls: Vec::new(),
				fail_read_at: None,
				fail_select: false,
				reads: 0,
			}
		}

		pub fn script(&mut self, responses: &[u8]) {
			self.responses.extend(responses.iter().copied());
		}

		pub fn writes(&self) -> Vec<u8> {
			self.calls
				.iter()
				.filter_map(|a| match a {
					Call::Write(b) => Some(*b),
					_ => None,
				})
				.collect()
		}
	}

	impl TouchBus for MockBus {
		fn clock_speed(&self) -> anyhow::Result<u32> {
			Ok(self.clock)
		}

		fn set_clock_speed(&mut self, hz: u32) -> anyhow::Result<()> {
			self.clock = hz;
			self.calls.push(Call::Clock(hz));
			Ok(())
		}

		fn select(&mut self) -> anyhow::Result<()> {
			if self.fail_select {
				bail!("mock chip-select failure");
			}
			self.calls.push(Call::Select);
			Ok(())
		}

		fn release(&mut self) -> anyhow::Result<()> {
			self.calls.push(Call::Release);
			Ok(())
		}

		fn write_byte(&mut self, tx: u8) -> anyhow::Result<()> {
			self.calls.push(Call::Write(tx));
			Ok(())
		}

		fn read_byte(&mut self) -> anyhow::Result<u8> {
			let n = self.reads;
			self.reads += 1;
			if self.fail_read_at == Some(n) {
				bail!("mock transfer failure");
			}
			match self.responses.pop_front() {
				Some(a) => {
					self.calls.push(Call::Read(a));
					Ok(a)
				}
				None => bail!("mock bus ran out of responses"),
			}
		}
	}
}
