use rppal::spi::{Bus, Mode, SlaveSelect, Spi};
use tracing::trace;

use crate::error::{HwError, Result};

/// Full-scale code of the 10-bit converter.
const FULL_SCALE: f32 = 1023.0;

pub struct Mcp3004 {
    spi: Spi,
}

fn bus_for(n: u8) -> Result<Bus> {
    Ok(match n {
        0 => Bus::Spi0,
        1 => Bus::Spi1,
        2 => Bus::Spi2,
        other => return Err(HwError::Spi(format!("unsupported SPI bus {other}"))),
    })
}

fn slave_for(n: u8) -> Result<SlaveSelect> {
    Ok(match n {
        0 => SlaveSelect::Ss0,
        1 => SlaveSelect::Ss1,
        2 => SlaveSelect::Ss2,
        other => return Err(HwError::Spi(format!("unsupported chip select {other}"))),
    })
}

impl Mcp3004 {
    pub fn new(bus: u8, chip_select: u8, clock_hz: u32) -> Result<Self> {
        let spi = Spi::new(bus_for(bus)?, slave_for(chip_select)?, clock_hz, Mode::Mode0)
            .map_err(|e| HwError::Spi(e.to_string()))?;
        Ok(Self { spi })
    }

    /// Single-ended conversion on `channel`, scaled to `[0, 1]`.
    pub fn read_channel(&mut self, channel: u8) -> Result<f32> {
        if channel > 3 {
            return Err(HwError::Channel(channel));
        }
        // Start bit, then single-ended mode + channel in the high nibble.
        let tx = [0x01, (0x08 | channel) << 4, 0x00];
        let mut rx = [0u8; 3];
        let n = self
            .spi
            .transfer(&mut rx, &tx)
            .map_err(|e| HwError::Spi(e.to_string()))?;
        if n < 3 {
            return Err(HwError::ShortTransfer(n));
        }
        let code = (u16::from(rx[1] & 0x03) << 8) | u16::from(rx[2]);
        trace!(channel, code, "mcp3004 conversion");
        Ok(f32::from(code) / FULL_SCALE)
    }
}
