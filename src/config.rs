use std::ffi::OsString;

use anyhow::Context;
use anyhow::anyhow;
use anyhow::bail;

use crate::calibration::CalibrationMatrix;
use crate::calibration::DisplayGeometry;
use crate::orientation::Orientation;

// GPIO26 pin number for the chip-select line.
pub const DEFAULT_CS_PIN: u8 = 26;
// GPIO22 pin number for the pen interrupt signal.
pub const DEFAULT_PENIRQ_PIN: u8 = 22;

pub const DISPLAY_WIDTH: u16 = 320; // Display width in pixels.
pub const DISPLAY_HEIGHT: u16 = 240; // Display height in pixels.

// Clock used by the other peers on the bus (display etc).
pub const BUS_CLOCK_HZ: u32 = 16_000_000;
// The controller needs a slower clock, 250MHz core / 200.
pub const TOUCH_CLOCK_HZ: u32 = 1_250_000;

// Readings with a pressure estimate at or below this value are noise.
pub const MIN_PRESSURE: u16 = 5;

pub const ENV_CS_PIN: &str = "ADS_CS_PIN";
pub const ENV_PENIRQ_PIN: &str = "ADS_PENIRQ_PIN";
pub const ENV_WIDTH: &str = "ADS_WIDTH";
pub const ENV_HEIGHT: &str = "ADS_HEIGHT";
pub const ENV_ORIENTATION: &str = "ADS_ORIENTATION";
pub const ENV_MATRIX: &str = "ADS_MATRIX"; // "a,b,c,d,e,f,div"

/// Host configuration, everything the driver needs at construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
	pub cs_pin: u8,
	pub penirq_pin: u8,
	pub geometry: DisplayGeometry,
	pub orientation: Orientation,
	pub matrix: Option<CalibrationMatrix>,
}

impl Default for Settings {
	fn default() -> Self {
		Self {
			cs_pin: DEFAULT_CS_PIN,
			penirq_pin: DEFAULT_PENIRQ_PIN,
			geometry: DisplayGeometry::new(DISPLAY_WIDTH, DISPLAY_HEIGHT),
			orientation: Orientation::Deg0,
			matrix: None,
		}
	}
}

impl Settings {
	#[inline]
	pub fn from_env() -> anyhow::Result<Self> {
		Self::from_vars(|key| std::env::var_os(key))
	}

	/// Builds the settings from a variable lookup, unset keys keep their defaults.
	pub fn from_vars(mut var: impl FnMut(&str) -> Option<OsString>) -> anyhow::Result<Self> {
		let mut settings = Self::default();
		let mut read = |key: &str| -> anyhow::Result<Option<String>> {
			match var(key) {
				Some(a) => a
					.into_string()
					.map(|a| Some(a.trim().to_owned()))
					.map_err(|a| anyhow!("{}={:?} is not valid unicode", key, a)),
				None => Ok(None),
			}
		};

		if let Some(a) = read(ENV_CS_PIN)? {
			settings.cs_pin = a.parse().with_context(|| format!("{}={:?}", ENV_CS_PIN, a))?;
		}
		if let Some(a) = read(ENV_PENIRQ_PIN)? {
			settings.penirq_pin = a
				.parse()
				.with_context(|| format!("{}={:?}", ENV_PENIRQ_PIN, a))?;
		}
		if let Some(a) = read(ENV_WIDTH)? {
			settings.geometry.width = parse_dimension(ENV_WIDTH, &a)?;
		}
		if let Some(a) = read(ENV_HEIGHT)? {
			settings.geometry.height = parse_dimension(ENV_HEIGHT, &a)?;
		}
		if let Some(a) = read(ENV_ORIENTATION)? {
			let value: i32 = a
				.parse()
				.with_context(|| format!("{}={:?}", ENV_ORIENTATION, a))?;
			settings.orientation = Orientation::from_value(value);
		}
		if let Some(a) = read(ENV_MATRIX)? {
			settings.matrix =
				Some(parse_matrix(&a).with_context(|| format!("{}={:?}", ENV_MATRIX, a))?);
		}

		Ok(settings)
	}
}

fn parse_dimension(key: &str, value: &str) -> anyhow::Result<u16> {
	let dim: u16 = value
		.parse()
		.with_context(|| format!("{}={:?}", key, value))?;
	if dim == 0 {
		bail!("{} must be greater than zero", key);
	}

	Ok(dim)
}

/// Parses `a,b,c,d,e,f,div`.
pub fn parse_matrix(value: &str) -> anyhow::Result<CalibrationMatrix> {
	let mut coeffs = [0i32; 7];
	let mut count = 0;
	for part in value.split(',') {
		let slot = coeffs
			.get_mut(count)
			.ok_or_else(|| anyhow!("expected 7 coefficients, got more"))?;
		*slot = part
			.trim()
			.parse()
			.with_context(|| format!("coefficient #{}: {:?}", count, part))?;
		count += 1;
	}
	if count != coeffs.len() {
		bail!("expected 7 coefficients, got {}", count);
	}

	let [a, b, c, d, e, f, div] = coeffs;
	CalibrationMatrix::new(a, b, c, d, e, f, div).ok_or_else(|| anyhow!("divisor must be nonzero"))
}

#[cfg(test)]
fn vars<'a>(list: &'a [(&'a str, &'a str)]) -> impl FnMut(&str) -> Option<OsString> + 'a {
	move |key| {
		list.iter()
			.find(|(k, _)| *k == key)
			.map(|(_, v)| OsString::from(*v))
	}
}

#[cfg(test)]
#[test]
fn settings_defaults_without_env() {
	let settings = Settings::from_vars(vars(&[])).unwrap();

	assert_eq!(settings, Settings::default());
	assert_eq!(settings.cs_pin, 26);
	assert_eq!(settings.penirq_pin, 22);
	assert_eq!(settings.geometry, DisplayGeometry::new(320, 240));
	assert!(settings.matrix.is_none());
}

#[cfg(test)]
#[test]
fn settings_from_env_overrides() {
	let settings = Settings::from_vars(vars(&[
		(ENV_CS_PIN, "8"),
		(ENV_PENIRQ_PIN, " 25 "),
		(ENV_WIDTH, "480"),
		(ENV_HEIGHT, "320"),
		(ENV_ORIENTATION, "14"),
		(ENV_MATRIX, "1, 0, 0, 0, 1, 0, 1"),
	]))
	.unwrap();

	assert_eq!(settings.cs_pin, 8);
	assert_eq!(settings.penirq_pin, 25);
	assert_eq!(settings.geometry, DisplayGeometry::new(480, 320));
	assert_eq!(settings.orientation, Orientation::Deg270);
	assert_eq!(settings.matrix, CalibrationMatrix::new(1, 0, 0, 0, 1, 0, 1));
}

#[cfg(test)]
#[test]
fn settings_reject_malformed_values() {
	assert!(Settings::from_vars(vars(&[(ENV_CS_PIN, "gpio26")])).is_err());
	assert!(Settings::from_vars(vars(&[(ENV_WIDTH, "0")])).is_err());
	assert!(Settings::from_vars(vars(&[(ENV_ORIENTATION, "ninety")])).is_err());
}

#[cfg(test)]
#[test]
fn matrix_parsing() {
	let m = parse_matrix("-3,4,100,2,-1,50,7").unwrap();
	assert_eq!(m, CalibrationMatrix::new(-3, 4, 100, 2, -1, 50, 7).unwrap());

	assert!(parse_matrix("1,0,0,0,1,0,0").is_err()); // div == 0
	assert!(parse_matrix("1,0,0,0,1,0").is_err());
	assert!(parse_matrix("1,0,0,0,1,0,1,9").is_err());
	assert!(parse_matrix("1,0,x,0,1,0,1").is_err());
}
