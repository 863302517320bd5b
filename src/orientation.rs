use crate::calibration::DisplayGeometry;

/// Display rotation, clockwise.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[repr(u16)]
pub enum Orientation {
	#[default]
	Deg0 = 0,
	Deg90 = 90,
	Deg180 = 180,
	Deg270 = 270,
}

impl Orientation {
	/// Accepts degrees, tens of degrees and `270 & 0xff`. Anything else is `Deg0`.
	pub const fn from_value(value: i32) -> Self {
		match value {
			9 | 90 => Self::Deg90,
			18 | 180 => Self::Deg180,
			27 | 14 | 270 => Self::Deg270,
			_ => Self::Deg0,
		}
	}

	#[inline]
	pub const fn degrees(self) -> u16 {
		self as u16
	}
}

impl From<i32> for Orientation {
	#[inline]
	fn from(value: i32) -> Self {
		Self::from_value(value)
	}
}

/// Rotates a calibrated pixel into screen space.
///
/// `geometry` is the unrotated calibrated space, `px < width` and `py < height`
/// hold for every value produced by the calibrator.
pub const fn map_to_screen(
	px: u16,
	py: u16,
	orientation: Orientation,
	geometry: DisplayGeometry,
) -> (u16, u16) {
	let w = geometry.width;
	let h = geometry.height;

	match orientation {
		Orientation::Deg0 => (px, py),
		Orientation::Deg90 => (py, w.saturating_sub(px)),
		Orientation::Deg180 => (w.saturating_sub(px), h.saturating_sub(py)),
		Orientation::Deg270 => (h.saturating_sub(py), px),
	}
}

#[cfg(test)]
#[test]
fn orientation_normalization() {
	for (value, expected) in [
		(0, Orientation::Deg0),
		(9, Orientation::Deg90),
		(90, Orientation::Deg90),
		(18, Orientation::Deg180),
		(180, Orientation::Deg180),
		(27, Orientation::Deg270),
		(14, Orientation::Deg270),
		(270, Orientation::Deg270),
		(45, Orientation::Deg0),
		(-90, Orientation::Deg0),
		(360, Orientation::Deg0),
	] {
		assert_eq!(Orientation::from(value), expected, "value {}", value);
	}
	assert_eq!(Orientation::Deg270.degrees(), 270);
}

#[cfg(test)]
#[test]
fn rotation_table() {
	let geometry = DisplayGeometry::new(320, 240);

	assert_eq!(map_to_screen(10, 20, Orientation::Deg0, geometry), (10, 20));
	assert_eq!(map_to_screen(10, 20, Orientation::Deg90, geometry), (20, 310));
	assert_eq!(map_to_screen(10, 20, Orientation::Deg180, geometry), (310, 220));
	assert_eq!(map_to_screen(10, 20, Orientation::Deg270, geometry), (220, 10));

	// Feeding 90 back into itself follows the same table.
	let (x, y) = map_to_screen(10, 20, Orientation::Deg90, geometry);
	assert_eq!(map_to_screen(x, y, Orientation::Deg90, geometry), (310, 300));
}

#[cfg(test)]
#[test]
fn rotation_180_twice_is_identity() {
	let geometry = DisplayGeometry::new(320, 240);
	for (px, py) in [(0, 0), (10, 20), (319, 239), (160, 120)] {
		let (x, y) = map_to_screen(px, py, Orientation::Deg180, geometry);
		assert_eq!(map_to_screen(x, y, Orientation::Deg180, geometry), (px, py));
	}
}

#[cfg(test)]
#[test]
fn quarter_turns_round_trip() {
	let geometry = DisplayGeometry::new(320, 240);
	let mut point = (10, 20);

	for expected in [(20, 310), (310, 300), (300, 10), (10, 20)] {
		point = map_to_screen(point.0, point.1, Orientation::Deg90, geometry);
		assert_eq!(point, expected);
	}
}
