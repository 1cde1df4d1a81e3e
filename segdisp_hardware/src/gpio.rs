//! Digit-enable and segment lines on Raspberry Pi GPIO.
use rppal::gpio::{Gpio, OutputPin};
use segdisp_traits::{DigitLines, HwResult, SegmentBus};

use crate::error::{HwError, Result};

fn open_output(gpio: &Gpio, pin: u8, role: &str) -> Result<OutputPin> {
    gpio.get(pin)
        .map(rppal::gpio::Pin::into_output)
        .map_err(|e| HwError::Gpio(format!("open {role} pin {pin}: {e}")))
}

/// Digit-enable lines, index 0 = rightmost digit.
pub struct GpioDigitLines {
    pins: Vec<OutputPin>,
    active_low: bool,
}

impl GpioDigitLines {
    pub fn new(gpio: &Gpio, pins: &[u8], active_low: bool) -> Result<Self> {
        let pins = pins
            .iter()
            .map(|&n| open_output(gpio, n, "digit"))
            .collect::<Result<Vec<_>>>()?;
        let mut lines = Self { pins, active_low };
        lines.release_all();
        Ok(lines)
    }

    fn drive(&mut self, index: usize, on: bool) {
        let high = on != self.active_low;
        if let Some(pin) = self.pins.get_mut(index) {
            if high {
                pin.set_high();
            } else {
                pin.set_low();
            }
        }
    }

    fn release_all(&mut self) {
        for i in 0..self.pins.len() {
            self.drive(i, false);
        }
    }
}

impl DigitLines for GpioDigitLines {
    fn enable_position(&mut self, position: usize) -> HwResult<()> {
        if position >= self.pins.len() {
            return Err(Box::new(HwError::InvalidPosition(position)));
        }
        // Only one line may be active; clear the rest first.
        self.release_all();
        self.drive(position, true);
        Ok(())
    }

    fn disable_all(&mut self) -> HwResult<()> {
        self.release_all();
        Ok(())
    }
}

/// Eight segment lines in a, b, c, d, e, f, g, dp order (bit 0 = a).
pub struct GpioSegmentBus {
    pins: Vec<OutputPin>,
}

impl GpioSegmentBus {
    pub fn new(gpio: &Gpio, pins: &[u8; 8]) -> Result<Self> {
        let pins = pins
            .iter()
            .map(|&n| open_output(gpio, n, "segment"))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { pins })
    }
}

impl SegmentBus for GpioSegmentBus {
    fn write_pattern(&mut self, pattern: u8) -> HwResult<()> {
        for (bit, pin) in self.pins.iter_mut().enumerate() {
            if pattern & (1 << bit) != 0 {
                pin.set_high();
            } else {
                pin.set_low();
            }
        }
        Ok(())
    }
}

/// Open the GPIO controller and both line groups.
pub fn open_panel(
    digit_pins: &[u8],
    segment_pins: &[u8; 8],
    digit_active_low: bool,
) -> Result<(GpioDigitLines, GpioSegmentBus)> {
    let gpio = Gpio::new().map_err(|e| HwError::Gpio(e.to_string()))?;
    let lines = GpioDigitLines::new(&gpio, digit_pins, digit_active_low)?;
    let bus = GpioSegmentBus::new(&gpio, segment_pins)?;
    Ok((lines, bus))
}
