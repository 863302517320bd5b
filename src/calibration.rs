use std::num::NonZeroI32;

use log::trace;

/// Display size in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DisplayGeometry {
	pub width: u16,
	pub height: u16,
}

impl DisplayGeometry {
	#[inline]
	pub const fn new(width: u16, height: u16) -> Self {
		Self { width, height }
	}
}

/// Affine map from raw sensor space to pixel space:
///
/// ```text
/// px = (a*x + b*y + c) / div
/// py = (d*x + e*y + f) / div
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CalibrationMatrix {
	pub a: i32,
	pub b: i32,
	pub c: i32,
	pub d: i32,
	pub e: i32,
	pub f: i32,
	div: NonZeroI32,
}

impl CalibrationMatrix {
	/// `None` when `div == 0`.
	#[allow(clippy::too_many_arguments)]
	pub const fn new(a: i32, b: i32, c: i32, d: i32, e: i32, f: i32, div: i32) -> Option<Self> {
		match NonZeroI32::new(div) {
			Some(div) => Some(Self {
				a,
				b,
				c,
				d,
				e,
				f,
				div,
			}),
			None => None,
		}
	}

	pub const IDENTITY: Self = Self {
		a: 1,
		b: 0,
		c: 0,
		d: 0,
		e: 1,
		f: 0,
		div: NonZeroI32::new(1).unwrap(),
	};

	#[inline]
	pub const fn div(&self) -> i32 {
		self.div.get()
	}

	#[inline]
	fn apply(&self, k1: i32, k2: i32, k3: i32, x: u16, y: u16) -> i64 {
		(k1 as i64 * x as i64 + k2 as i64 * y as i64 + k3 as i64) / self.div.get() as i64
	}
}

#[inline]
fn clamp_axis(value: i64, dim: u16) -> u16 {
	value.clamp(0, dim.saturating_sub(1) as i64) as u16
}

/// Pixel cache of the calibration engine.
///
/// An axis is only recomputed when its raw value differs from the one it was
/// last computed with.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Calibrator {
	last_x: Option<u16>,
	last_y: Option<u16>,
	px: u16,
	py: u16,
}

impl Calibrator {
	#[inline]
	pub const fn new() -> Self {
		Self {
			last_x: None,
			last_y: None,
			px: 0,
			py: 0,
		}
	}

	/// Forgets the cached raw values, the next call recomputes both axes.
	#[inline]
	pub fn invalidate(&mut self) {
		self.last_x = None;
		self.last_y = None;
	}

	#[inline]
	pub const fn pixel(&self) -> (u16, u16) {
		(self.px, self.py)
	}

	pub fn to_pixel(
		&mut self,
		x: u16,
		y: u16,
		m: &CalibrationMatrix,
		geometry: DisplayGeometry,
	) -> (u16, u16) {
		if self.last_x != Some(x) {
			self.last_x = Some(x);
			self.px = clamp_axis(m.apply(m.a, m.b, m.c, x, y), geometry.width);
			trace!("#[calibrate] x: {} => {}", x, self.px);
		}
		if self.last_y != Some(y) {
			self.last_y = Some(y);
			self.py = clamp_axis(m.apply(m.d, m.e, m.f, x, y), geometry.height);
			trace!("#[calibrate] y: {} => {}", y, self.py);
		}

		(self.px, self.py)
	}
}

#[cfg(test)]
#[test]
fn zero_divisor_is_rejected() {
	assert!(CalibrationMatrix::new(1, 0, 0, 0, 1, 0, 0).is_none());
	assert_eq!(CalibrationMatrix::new(1, 0, 0, 0, 1, 0, -2).map(|m| m.div()), Some(-2));
}

#[cfg(test)]
#[test]
fn identity_matrix_is_identity() {
	let geometry = DisplayGeometry::new(320, 240);
	let m = CalibrationMatrix::new(1, 0, 0, 0, 1, 0, 1).unwrap();
	assert_eq!(m, CalibrationMatrix::IDENTITY);

	let mut cal = Calibrator::new();
	for (x, y) in [(0, 0), (1, 1), (10, 20), (319, 239), (200, 100)] {
		assert_eq!(cal.to_pixel(x, y, &m, geometry), (x, y));
	}
	// Beyond the display the identity clamps.
	assert_eq!(cal.to_pixel(1023, 1023, &m, geometry), (319, 239));
}

#[cfg(test)]
#[test]
fn clamping_is_hard() {
	let geometry = DisplayGeometry::new(320, 240);
	let mut cal = Calibrator::new();

	// Negative before clamping.
	let m = CalibrationMatrix::new(1, 0, -500, 0, 1, -500, 1).unwrap();
	assert_eq!(cal.to_pixel(100, 100, &m, geometry), (0, 0));

	// Exactly the dimension and above.
	let m = CalibrationMatrix::new(1, 0, 0, 0, 1, 0, 1).unwrap();
	assert_eq!(cal.to_pixel(320, 240, &m, geometry), (319, 239));
	assert_eq!(cal.to_pixel(1000, 900, &m, geometry), (319, 239));
}

#[cfg(test)]
#[test]
fn division_truncates_toward_zero() {
	let geometry = DisplayGeometry::new(320, 240);
	let m = CalibrationMatrix::new(1, 0, 0, 0, 1, 0, 3).unwrap();
	let mut cal = Calibrator::new();

	assert_eq!(cal.to_pixel(11, 8, &m, geometry), (3, 2));

	// -1/3 truncates to 0, not -1.
	let m = CalibrationMatrix::new(1, 0, -12, 0, 1, 0, 3).unwrap();
	let mut cal = Calibrator::new();
	assert_eq!(cal.to_pixel(11, 8, &m, geometry), (0, 2));
}

#[cfg(test)]
#[test]
fn scaled_matrix() {
	// 1024 raw -> 320x240 with an offset.
	let geometry = DisplayGeometry::new(320, 240);
	let m = CalibrationMatrix::new(320, 0, -3200, 0, 240, 0, 1024).unwrap();
	let mut cal = Calibrator::new();

	assert_eq!(cal.to_pixel(512, 512, &m, geometry), (156, 120));
}

#[cfg(test)]
#[test]
fn unchanged_axis_is_not_recomputed() {
	let geometry = DisplayGeometry::new(320, 240);
	// x depends on y through `b`.
	let m = CalibrationMatrix::new(1, 1, 0, 0, 1, 0, 1).unwrap();
	let mut cal = Calibrator::new();

	assert_eq!(cal.to_pixel(10, 20, &m, geometry), (30, 20));
	// Only y moved: x keeps its previous pixel even though `b*y` changed.
	assert_eq!(cal.to_pixel(10, 50, &m, geometry), (30, 50));
	// x moved: recomputed with the current y.
	assert_eq!(cal.to_pixel(11, 50, &m, geometry), (61, 50));

	cal.invalidate();
	assert_eq!(cal.to_pixel(10, 50, &m, geometry), (60, 50));
}
