//! Configuration enum types.

use crate::error::Error;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Matching/timing algorithm family.
///
/// Older touch controllers (the iOS 7 generation) hold a contact alive for
/// longer after the pen tip leaves the glass and report pulses less reliably,
/// so the legacy family trusts identifier continuity and pen hit-testing only.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default, JsonSchema)]
#[serde(rename_all = "kebab-case")]
pub enum AlgorithmVariant {
    /// Current controllers (default)
    #[default]
    Current,
    /// Compatibility behaviour for older platform versions
    Legacy,
}

/// Number of pen modes the stylus can signal.
///
/// The same value has to be selected on the pen and in the software.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PenModeSwitch {
    /// Single-mode pens; every pen line reports mode 1
    One,
    /// Two modes, the fastest to decode (default)
    #[default]
    Two,
    /// Three modes; slower to settle
    Three,
}

impl PenModeSwitch {
    /// Number of distinct modes.
    pub fn count(self) -> usize {
        match self {
            PenModeSwitch::One => 1,
            PenModeSwitch::Two => 2,
            PenModeSwitch::Three => 3,
        }
    }
}

impl TryFrom<u8> for PenModeSwitch {
    type Error = Error;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(PenModeSwitch::One),
            2 => Ok(PenModeSwitch::Two),
            3 => Ok(PenModeSwitch::Three),
            other => Err(Error::InvalidPenModeSwitch(other)),
        }
    }
}

impl From<PenModeSwitch> for u8 {
    fn from(value: PenModeSwitch) -> Self {
        value.count() as u8
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pen_mode_switch_accepts_one_to_three() {
        assert_eq!(PenModeSwitch::try_from(1).unwrap(), PenModeSwitch::One);
        assert_eq!(PenModeSwitch::try_from(3).unwrap().count(), 3);
        assert!(matches!(
            PenModeSwitch::try_from(4),
            Err(Error::InvalidPenModeSwitch(4))
        ));
        assert!(PenModeSwitch::try_from(0).is_err());
    }

    #[test]
    fn algorithm_variant_uses_kebab_case() {
        #[derive(Deserialize)]
        struct Wrapper {
            algorithm: AlgorithmVariant,
        }
        let parsed: Wrapper = toml::from_str("algorithm = \"legacy\"").unwrap();
        assert_eq!(parsed.algorithm, AlgorithmVariant::Legacy);
    }
}
