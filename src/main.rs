use ads7846_rs::Ads7846;
use ads7846_rs::RppalBus;
use ads7846_rs::config::Settings;
use anyhow::Context;
use enclose::enc;
use log::error;
use log::info;
use log::trace;
use log::warn;
use rppal::gpio::Gpio;
use rppal::gpio::Trigger;
use std::sync::Arc;
use std::sync::Barrier;
use std::sync::mpsc::channel;
use std::thread::sleep;
use std::thread::spawn;
use std::time::Duration;

// Pen line watch timeout, also the resampling period while the pen is held.
const PEN_POLL_TIMEOUT: Duration = Duration::from_millis(20);

fn main() -> anyhow::Result<()> {
	env_logger::try_init()?;
	info!("ads7846_rs: ");

	let settings = Settings::from_env().context("load settings")?;
	info!("settings: {:?}", settings);

	let gpio = Gpio::new().context("open gpio")?;
	let bus = RppalBus::open(&gpio, settings.cs_pin)?;

	info!("#[pin, {:?}] init, input, pull-up", settings.penirq_pin);
	let mut pen_pin = gpio
		.get(settings.penirq_pin)
		.with_context(|| format!("#[pin, {}] open pen interrupt", settings.penirq_pin))?
		.into_input_pullup();
	pen_pin.set_interrupt(Trigger::FallingEdge, None)?;

	let mut ads = Ads7846::new(bus, settings.geometry);
	ads.set_orientation(settings.orientation);
	match settings.matrix {
		Some(matrix) => ads.set_calibration(matrix),
		None => warn!("no calibration matrix, only raw coordinates are reported."),
	}

	// Wakes the sampling loop on pen-down and keeps it going while the pen is held.
	let (tx, rx) = channel::<()>();
	let wait_init_thread = Arc::new(Barrier::new(1 + 1));
	spawn(enc!((wait_init_thread) move || {
		{
			wait_init_thread.wait();
			drop(wait_init_thread);
		}

		loop {
			let int = pen_pin.poll_interrupt(true, Some(PEN_POLL_TIMEOUT));
			let is_wake = match int {
				Ok(Some(_)) => true,
				Ok(None) => pen_pin.is_low(),
				Err(ref e) => {
					error!("#[pin] pen interrupt, err: {:?}", e);
					sleep(PEN_POLL_TIMEOUT);
					false
				}
			};
			if is_wake && tx.send(()).is_err() {
				break; // END CTHREAD
			}
		}
	}));
	{
		wait_init_thread.wait();
		drop(wait_init_thread);
	}

	info!("#[ads7846] loop:");
	let mut was_touched = false;
	while rx.recv().is_ok() {
		let sample = ads.poll_sample()?;
		trace!("#[ads7846] sample: {:?}, pressure: {}", sample, ads.pressure());

		if !ads.is_touched() {
			if was_touched {
				info!("#[touch] up");
			}
			was_touched = false;
			continue;
		}
		was_touched = true;

		if sample.is_none() {
			continue;
		}
		match ads.current_point() {
			Some(point) => info!(
				"#[touch] x: {}, y: {}, pressure: {}",
				point.x, point.y, point.pressure
			),
			None => info!(
				"#[touch] raw x: {}, raw y: {}, pressure: {}",
				ads.raw_x(),
				ads.raw_y(),
				ads.pressure()
			),
		}
	}

	Ok(())
}
