use log::debug;

use crate::bus::TouchBus;
use crate::calibration::CalibrationMatrix;
use crate::calibration::Calibrator;
use crate::calibration::DisplayGeometry;
use crate::orientation::Orientation;
use crate::orientation::map_to_screen;
use crate::sampler::RawSample;
use crate::sampler::acquire;

/// Screen space touch position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TouchPoint {
	pub x: u16,
	pub y: u16,
	pub pressure: u16,
}

/// ADS7846 driver.
///
/// Owns the bus for its whole life. Coordinate queries work on the last
/// committed sample, only [`Ads7846::poll_sample`] talks to the chip.
pub struct Ads7846<B: TouchBus> {
	bus: B,
	geometry: DisplayGeometry,
	orientation: Orientation,
	matrix: Option<CalibrationMatrix>,
	calibrator: Calibrator,

	raw: RawSample,
}

impl<B: TouchBus> Ads7846<B> {
	/// Starts uncalibrated at 0°, with zeroed coordinates and pressure.
	pub fn new(bus: B, geometry: DisplayGeometry) -> Self {
		Self {
			bus,
			geometry,
			orientation: Orientation::Deg0,
			matrix: None,
			calibrator: Calibrator::new(),

			raw: RawSample::default(),
		}
	}

	#[inline]
	pub fn with_calibration(mut self, matrix: CalibrationMatrix) -> Self {
		self.set_calibration(matrix);
		self
	}

	pub fn set_calibration(&mut self, matrix: CalibrationMatrix) {
		debug!("#[ads7846] calibration {:?}", matrix);
		self.matrix = Some(matrix);
		self.calibrator.invalidate();
	}

	#[inline]
	pub const fn calibration(&self) -> Option<&CalibrationMatrix> {
		self.matrix.as_ref()
	}

	/// See [`Orientation::from_value`] for the accepted values.
	pub fn set_orientation(&mut self, value: impl Into<Orientation>) {
		self.orientation = value.into();
		debug!("#[ads7846] orientation {:?}", self.orientation);
	}

	#[inline]
	pub const fn orientation(&self) -> Orientation {
		self.orientation
	}

	#[inline]
	pub const fn geometry(&self) -> DisplayGeometry {
		self.geometry
	}

	/// Runs one read cycle and updates the state.
	///
	/// Pressure follows every cycle, coordinates only change on an accepted
	/// sample, which is returned.
	pub fn poll_sample(&mut self) -> anyhow::Result<Option<RawSample>> {
		let reading = acquire(&mut self.bus)?;

		self.raw.pressure = reading.pressure();
		let sample = reading.sample();
		if let Some(a) = sample {
			self.raw = a;
		}

		Ok(sample)
	}

	fn screen(&mut self) -> Option<(u16, u16)> {
		let matrix = self.matrix.as_ref()?;
		let (px, py) = self
			.calibrator
			.to_pixel(self.raw.x, self.raw.y, matrix, self.geometry);

		Some(map_to_screen(px, py, self.orientation, self.geometry))
	}

	/// Screen X of the last sample, `None` while uncalibrated.
	#[inline]
	pub fn current_x(&mut self) -> Option<u16> {
		self.screen().map(|(x, _)| x)
	}

	/// Screen Y of the last sample, `None` while uncalibrated.
	#[inline]
	pub fn current_y(&mut self) -> Option<u16> {
		self.screen().map(|(_, y)| y)
	}

	pub fn current_point(&mut self) -> Option<TouchPoint> {
		let (x, y) = self.screen()?;
		Some(TouchPoint {
			x,
			y,
			pressure: self.raw.pressure,
		})
	}

	#[inline]
	pub const fn raw_x(&self) -> u16 {
		self.raw.x
	}

	#[inline]
	pub const fn raw_y(&self) -> u16 {
		self.raw.y
	}

	/// 0 means no contact.
	#[inline]
	pub const fn pressure(&self) -> u16 {
		self.raw.pressure
	}

	#[inline]
	pub const fn is_touched(&self) -> bool {
		self.raw.pressure != 0
	}

	/// Gives the bus back.
	#[inline]
	pub fn release(self) -> B {
		self.bus
	}
}

#[cfg(test)]
use crate::bus::mock::MockBus;

#[cfg(test)]
const CLOCK: u32 = 16_000_000;
#[cfg(test)]
const GEOMETRY: DisplayGeometry = DisplayGeometry::new(320, 240);

// p = 64, x = 1023 - 258 = 765, y = 131
#[cfg(test)]
const TOUCH: [u8; 10] = [0x20, 0xdf, 0x40, 0x00, 0x40, 0x80, 0x20, 0x11, 0x20, 0xc0];

#[cfg(test)]
fn touched() -> Ads7846<MockBus> {
	let mut ads = Ads7846::new(MockBus::new(CLOCK, &TOUCH), GEOMETRY);
	assert!(ads.poll_sample().unwrap().is_some());
	ads
}

#[cfg(test)]
#[test]
fn starts_zeroed_and_uncalibrated() {
	let mut ads = Ads7846::new(MockBus::new(CLOCK, &[]), GEOMETRY);

	assert_eq!(ads.orientation(), Orientation::Deg0);
	assert_eq!((ads.raw_x(), ads.raw_y(), ads.pressure()), (0, 0, 0));
	assert!(!ads.is_touched());
	assert!(ads.calibration().is_none());
	assert_eq!(ads.current_x(), None);
	assert_eq!(ads.current_y(), None);
	assert_eq!(ads.current_point(), None);
}

#[cfg(test)]
#[test]
fn sample_updates_state() {
	let mut ads = touched();

	assert_eq!((ads.raw_x(), ads.raw_y(), ads.pressure()), (765, 131, 64));
	assert!(ads.is_touched());
	// Still uncalibrated.
	assert_eq!(ads.current_x(), None);

	ads.set_calibration(CalibrationMatrix::IDENTITY);
	assert_eq!(ads.current_x(), Some(319));
	assert_eq!(ads.current_y(), Some(131));
	assert_eq!(
		ads.current_point(),
		Some(TouchPoint {
			x: 319,
			y: 131,
			pressure: 64,
		})
	);
}

#[cfg(test)]
#[test]
fn pressure_gate_keeps_coordinates() {
	let mut ads = touched();
	ads.bus.script(&[0x00, 0xff]);

	assert_eq!(ads.poll_sample().unwrap(), None);
	assert_eq!(ads.pressure(), 0);
	assert!(!ads.is_touched());
	assert_eq!((ads.raw_x(), ads.raw_y()), (765, 131));
}

#[cfg(test)]
#[test]
fn disagreement_keeps_coordinates_updates_pressure() {
	let mut ads = touched();
	// p = 0x30 + 0x10 = 64, then X high bytes differ.
	ads.bus.script(&[0x30, 0xef, 0x10, 0x00, 0x11, 0x00]);

	assert_eq!(ads.poll_sample().unwrap(), None);
	assert_eq!(ads.pressure(), 64);
	assert_eq!((ads.raw_x(), ads.raw_y()), (765, 131));

	ads.bus.script(&[0x7f, 0x80, 0x10, 0x00, 0x11, 0x00]);
	assert_eq!(ads.poll_sample().unwrap(), None);
	assert_eq!(ads.pressure(), 127 + 127);
	assert_eq!(ads.raw_x(), 765);
}

#[cfg(test)]
#[test]
fn zero_axis_keeps_coordinates_updates_pressure() {
	let mut ads = touched();
	// p = 10, x = 0
	ads.bus
		.script(&[0x0a, 0xff, 0xff, 0xc0, 0xff, 0xc0, 0x20, 0x00, 0x20, 0x00]);

	assert_eq!(ads.poll_sample().unwrap(), None);
	assert_eq!(ads.pressure(), 10);
	assert_eq!((ads.raw_x(), ads.raw_y()), (765, 131));
}

#[cfg(test)]
#[test]
fn transport_failure_propagates() {
	let mut ads = Ads7846::new(MockBus::new(CLOCK, &[0x20]), GEOMETRY);

	assert!(ads.poll_sample().is_err());
	assert_eq!(ads.pressure(), 0);
	assert_eq!(ads.release().clock, CLOCK);
}

#[cfg(test)]
#[test]
fn repeated_queries_are_stable() {
	let m = CalibrationMatrix::new(320, 0, -3200, 0, 240, 0, 1024).unwrap();
	let mut ads = touched().with_calibration(m);
	ads.set_orientation(90);

	let first = (ads.current_x(), ads.current_y());
	for _ in 0..4 {
		assert_eq!((ads.current_x(), ads.current_y()), first);
	}
	// px = (320*765 - 3200)/1024 = 235, py = 240*131/1024 = 30
	assert_eq!(first, (Some(30), Some(320 - 235)));
}

#[cfg(test)]
#[test]
fn orientation_applies_on_every_query() {
	let m = CalibrationMatrix::new(1, 0, -755, 0, 1, -111, 1).unwrap();
	let mut ads = touched().with_calibration(m);
	// pixel (10, 20)

	for (value, expected) in [
		(0, (10, 20)),
		(9, (20, 310)),
		(180, (310, 220)),
		(14, (220, 10)),
		(123, (10, 20)),
	] {
		ads.set_orientation(value);
		assert_eq!(
			(ads.current_x(), ads.current_y()),
			(Some(expected.0), Some(expected.1)),
			"orientation {}",
			value
		);
	}
}

#[cfg(test)]
#[test]
fn new_matrix_forces_recompute() {
	let mut ads = touched().with_calibration(CalibrationMatrix::IDENTITY);
	assert_eq!(ads.current_y(), Some(131));

	ads.set_calibration(CalibrationMatrix::new(1, 0, 0, 0, 1, 0, 2).unwrap());
	assert_eq!(ads.current_x(), Some(319));
	assert_eq!(ads.current_y(), Some(65));
}
