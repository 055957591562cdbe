//! Output lines
//!
//! A line is one GPIO pad, named by port and pad number. The heartbeat only
//! ever asks a [`LineDriver`] to set a line high or low.

/// Opaque identifier for one output line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct LineId(u16);

impl LineId {
    /// Line `pad` on port `port` (0 = GPIOA, 1 = GPIOB, ...)
    pub const fn new(port: u8, pad: u8) -> Self {
        LineId(((port as u16) << 8) | pad as u16)
    }

    #[inline]
    pub const fn port(self) -> u8 {
        (self.0 >> 8) as u8
    }

    #[inline]
    pub const fn pad(self) -> u8 {
        self.0 as u8
    }

    /// Packed `port << 8 | pad`
    #[inline]
    pub const fn raw(self) -> u16 {
        self.0
    }
}

/// Drives output lines
///
/// Setting a line cannot fail: the line was configured as an output before
/// the heartbeat started, and the heartbeat is its only writer.
pub trait LineDriver {
    fn set(&mut self, line: LineId, level: bool);
}

/// Driver for images with no physical heartbeat line
#[derive(Debug, Default, Clone, Copy)]
pub struct NoLines;

impl LineDriver for NoLines {
    fn set(&mut self, _line: LineId, _level: bool) {}
}

#[cfg(feature = "pac")]
pub use pac_lines::PacLines;

#[cfg(feature = "pac")]
mod pac_lines {
    use super::{LineDriver, LineId};
    use stm32_metapac as pac;

    /// STM32F4 GPIO lines on ports A to C, driven through BSRR
    #[derive(Debug, Default, Clone, Copy)]
    pub struct PacLines;

    fn port(line: LineId) -> Option<pac::gpio::Gpio> {
        match line.port() {
            0 => Some(pac::GPIOA),
            1 => Some(pac::GPIOB),
            2 => Some(pac::GPIOC),
            _ => None,
        }
    }

    impl PacLines {
        /// Clock the port and make `line` a push-pull output.
        ///
        /// Lines on ports this driver does not know are left alone.
        pub fn configure_output(&mut self, line: LineId) {
            let Some(gpio) = port(line) else {
                crate::warn!("line {=u16}: unsupported port", line.raw());
                return;
            };
            pac::RCC.ahb1enr().modify(|w| match line.port() {
                0 => w.set_gpioaen(true),
                1 => w.set_gpioben(true),
                _ => w.set_gpiocen(true),
            });
            let pad = line.pad() as usize;
            gpio.moder().modify(|w| w.set_moder(pad, pac::gpio::vals::Moder::OUTPUT));
            gpio.otyper().modify(|w| w.set_ot(pad, pac::gpio::vals::Ot::PUSHPULL));
        }
    }

    impl LineDriver for PacLines {
        fn set(&mut self, line: LineId, level: bool) {
            if let Some(gpio) = port(line) {
                let pad = line.pad() as usize;
                if level {
                    gpio.bsrr().write(|w| w.set_bs(pad, true));
                } else {
                    gpio.bsrr().write(|w| w.set_br(pad, true));
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_id_packing() {
        let line = LineId::new(2, 13);
        assert_eq!(line.port(), 2);
        assert_eq!(line.pad(), 13);
        assert_eq!(line.raw(), 0x020D);
        assert_ne!(line, LineId::new(13, 2));
    }
}
