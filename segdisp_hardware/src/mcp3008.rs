//! MCP3008 10-bit SPI converter.
//!
//! The chip converts during the SPI transfer itself, so `start_conversion`
//! performs the whole exchange and `is_conversion_done` reports completion
//! immediately afterwards.
use rppal::spi::{Bus, Mode, SlaveSelect, Spi};
use segdisp_traits::{Converter, HwResult};
use tracing::trace;

use crate::error::{HwError, Result};

/// Highest single-ended channel on the MCP3008.
pub const MAX_CHANNEL: u8 = 7;

pub struct Mcp3008 {
    spi: Spi,
    result: u16,
    done: bool,
}

impl Mcp3008 {
    pub fn new(bus: u8, chip_select: u8, clock_hz: u32) -> Result<Self> {
        let bus = match bus {
            0 => Bus::Spi0,
            1 => Bus::Spi1,
            2 => Bus::Spi2,
            other => return Err(HwError::Spi(format!("unsupported SPI bus {other}"))),
        };
        let ss = match chip_select {
            0 => SlaveSelect::Ss0,
            1 => SlaveSelect::Ss1,
            2 => SlaveSelect::Ss2,
            other => return Err(HwError::Spi(format!("unsupported chip select {other}"))),
        };
        let spi = Spi::new(bus, ss, clock_hz, Mode::Mode0).map_err(|e| HwError::Spi(e.to_string()))?;
        Ok(Self {
            spi,
            result: 0,
            done: false,
        })
    }
}

impl Converter for Mcp3008 {
    fn start_conversion(&mut self, channel: u8) -> HwResult<()> {
        if channel > MAX_CHANNEL {
            return Err(Box::new(HwError::InvalidChannel(channel)));
        }
        self.done = false;
        // Start bit, single-ended mode + channel, then clock out 10 result bits.
        let tx = [0x01, 0x80 | (channel << 4), 0x00];
        let mut rx = [0u8; 3];
        self.spi
            .transfer(&mut rx, &tx)
            .map_err(|e| HwError::Spi(e.to_string()))?;
        self.result = (u16::from(rx[1] & 0x03) << 8) | u16::from(rx[2]);
        self.done = true;
        trace!(channel, raw = self.result, "mcp3008 conversion");
        Ok(())
    }

    fn is_conversion_done(&mut self) -> HwResult<bool> {
        Ok(self.done)
    }

    fn read_result(&mut self) -> HwResult<u16> {
        Ok(self.result)
    }
}
