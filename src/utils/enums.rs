use std::{fmt::Display, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::{Float, TTRecoError};

/// Data-taking periods with a distinct b-tagging working point.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Era {
    /// 2016 ultra-legacy data before the APV/VFP fix.
    #[default]
    UL2016PreVFP,
    /// 2016 ultra-legacy data after the APV/VFP fix.
    UL2016PostVFP,
    /// 2017 ultra-legacy data.
    UL2017,
    /// 2018 ultra-legacy data.
    UL2018,
}

impl Era {
    /// All known eras, in chronological order.
    pub const ALL: [Era; 4] = [
        Era::UL2016PreVFP,
        Era::UL2016PostVFP,
        Era::UL2017,
        Era::UL2018,
    ];

    /// The medium working-point threshold on the b-tag discriminant for this era.
    pub fn btag_threshold(&self) -> Float {
        match self {
            Era::UL2016PreVFP => 0.2598,
            Era::UL2016PostVFP => 0.2489,
            Era::UL2017 => 0.3040,
            Era::UL2018 => 0.2783,
        }
    }
}

impl Display for Era {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Era::UL2016PreVFP => write!(f, "UL2016preVFP"),
            Era::UL2016PostVFP => write!(f, "UL2016postVFP"),
            Era::UL2017 => write!(f, "UL2017"),
            Era::UL2018 => write!(f, "UL2018"),
        }
    }
}

impl FromStr for Era {
    type Err = TTRecoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "ul2016prevfp" | "2016prevfp" | "2016apv" | "ul2016apv" => Ok(Self::UL2016PreVFP),
            "ul2016postvfp" | "2016postvfp" => Ok(Self::UL2016PostVFP),
            "ul2017" | "2017" => Ok(Self::UL2017),
            "ul2018" | "2018" => Ok(Self::UL2018),
            _ => Err(TTRecoError::ParseError {
                name: s.to_string(),
                object: "Era".to_string(),
            }),
        }
    }
}

/// A simple enum describing a binary sign, used for the lepton electric charge.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Sign {
    /// A positive indicator.
    Positive,
    /// A negative indicator.
    Negative,
}

impl Sign {
    /// The sign of an integer charge. Zero is not a valid lepton charge and yields `None`.
    pub fn from_charge(charge: i32) -> Option<Self> {
        match charge.signum() {
            1 => Some(Self::Positive),
            -1 => Some(Self::Negative),
            _ => None,
        }
    }
}

impl Display for Sign {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Sign::Positive => write!(f, "+"),
            Sign::Negative => write!(f, "-"),
        }
    }
}

impl FromStr for Sign {
    type Err = TTRecoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_ref() {
            "+" | "plus" | "pos" | "positive" | "+1" | "1" => Ok(Self::Positive),
            "-" | "minus" | "neg" | "negative" | "-1" => Ok(Self::Negative),
            _ => Err(TTRecoError::ParseError {
                name: s.to_string(),
                object: "Sign".to_string(),
            }),
        }
    }
}

/// The terminal outcome of reconstructing one event.
///
/// Every event ends in exactly one of these states. The integer codes are part of the output
/// record consumed downstream and must not change.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FitStatus {
    /// The constrained kinematic fit converged.
    Success,
    /// Fewer than two b-jet or two light-jet candidates passed the selection.
    JetSelectionFailed,
    /// The candidate pool was valid but no assignment produced a finite pre-fit $`\chi^2`$.
    NoValidPermutation,
    /// The kinematic fit did not converge; the best pre-fit assignment is reported instead.
    FitFailedFallback,
}

impl FitStatus {
    /// The integer code written to the output record.
    pub fn code(&self) -> i32 {
        match self {
            FitStatus::Success => 0,
            FitStatus::JetSelectionFailed => 1,
            FitStatus::NoValidPermutation => 2,
            FitStatus::FitFailedFallback => 3,
        }
    }
    /// Whether the status carries reconstructed top-quark kinematics.
    pub fn has_kinematics(&self) -> bool {
        matches!(self, FitStatus::Success | FitStatus::FitFailedFallback)
    }
}

impl TryFrom<i32> for FitStatus {
    type Error = TTRecoError;

    fn try_from(code: i32) -> Result<Self, Self::Error> {
        match code {
            0 => Ok(FitStatus::Success),
            1 => Ok(FitStatus::JetSelectionFailed),
            2 => Ok(FitStatus::NoValidPermutation),
            3 => Ok(FitStatus::FitFailedFallback),
            _ => Err(TTRecoError::ParseError {
                name: code.to_string(),
                object: "FitStatus".to_string(),
            }),
        }
    }
}

impl Display for FitStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FitStatus::Success => write!(f, "success"),
            FitStatus::JetSelectionFailed => write!(f, "jet selection failed"),
            FitStatus::NoValidPermutation => write!(f, "no valid permutation"),
            FitStatus::FitFailedFallback => write!(f, "fit failed (pre-fit fallback)"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn enum_displays() {
        assert_eq!(format!("{}", Era::UL2016PreVFP), "UL2016preVFP");
        assert_eq!(format!("{}", Era::UL2018), "UL2018");
        assert_eq!(format!("{}", Sign::Positive), "+");
        assert_eq!(format!("{}", Sign::Negative), "-");
        assert_eq!(format!("{}", FitStatus::Success), "success");
    }

    #[test]
    fn era_round_trips_through_display() {
        for era in Era::ALL {
            assert_eq!(era.to_string().parse::<Era>().unwrap(), era);
        }
        assert_eq!("2017".parse::<Era>().unwrap(), Era::UL2017);
        assert!("UL2022".parse::<Era>().is_err());
    }

    #[test]
    fn era_thresholds() {
        assert_eq!(Era::UL2016PreVFP.btag_threshold(), 0.2598);
        assert_eq!(Era::UL2016PostVFP.btag_threshold(), 0.2489);
        assert_eq!(Era::UL2017.btag_threshold(), 0.3040);
        assert_eq!(Era::UL2018.btag_threshold(), 0.2783);
    }

    #[test]
    fn charges() {
        assert_eq!(Sign::from_charge(1), Some(Sign::Positive));
        assert_eq!(Sign::from_charge(-1), Some(Sign::Negative));
        assert_eq!(Sign::from_charge(0), None);
        assert_eq!("-1".parse::<Sign>().unwrap(), Sign::Negative);
    }

    #[test]
    fn status_codes() {
        for status in [
            FitStatus::Success,
            FitStatus::JetSelectionFailed,
            FitStatus::NoValidPermutation,
            FitStatus::FitFailedFallback,
        ] {
            assert_eq!(FitStatus::try_from(status.code()).unwrap(), status);
        }
        assert!(FitStatus::try_from(4).is_err());
        assert!(FitStatus::Success.has_kinematics());
        assert!(FitStatus::FitFailedFallback.has_kinematics());
        assert!(!FitStatus::JetSelectionFailed.has_kinematics());
        assert!(!FitStatus::NoValidPermutation.has_kinematics());
    }
}
