//! Power state reported by the display.

use serde::{Deserialize, Serialize};

/// Power mode of a monitor, exactly as decoded from a device reply.
///
/// The controller never infers power state from anything other than the
/// decoded response value.  `Standby` and `Suspend` are distinct low-power
/// modes on these panels; both count as "not on".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u16)]
pub enum PowerMode {
    On = 0x0001,
    Standby = 0x0002,
    Suspend = 0x0003,
    Off = 0x0004,
}

impl PowerMode {
    /// Whether the panel is fully on.
    pub fn is_on(&self) -> bool {
        matches!(self, PowerMode::On)
    }
}

impl TryFrom<u16> for PowerMode {
    type Error = ();

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        match value {
            0x0001 => Ok(PowerMode::On),
            0x0002 => Ok(PowerMode::Standby),
            0x0003 => Ok(PowerMode::Suspend),
            0x0004 => Ok(PowerMode::Off),
            _ => Err(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_on_counts_as_on() {
        assert!(PowerMode::On.is_on());
        assert!(!PowerMode::Standby.is_on());
        assert!(!PowerMode::Suspend.is_on());
        assert!(!PowerMode::Off.is_on());
    }

    #[test]
    fn test_try_from_known_values() {
        assert_eq!(PowerMode::try_from(0x0001), Ok(PowerMode::On));
        assert_eq!(PowerMode::try_from(0x0004), Ok(PowerMode::Off));
    }

    #[test]
    fn test_try_from_unknown_value_fails() {
        assert_eq!(PowerMode::try_from(0x0009), Err(()));
    }
}
