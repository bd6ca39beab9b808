use serde::{Deserialize, Serialize};

use crate::{utils::enums::Era, Float, TTRecoError, TTRecoResult};

/// Settings for a [`Reconstructor`](crate::Reconstructor).
///
/// The configuration is built once, validated by
/// [`Reconstructor::new`](crate::Reconstructor::new), and then only read. The defaults are the
/// 2016 (pre-VFP) b-tag working point with the nominal $`W`$ and top masses and the
/// resolutions used by the kinematic fit.
///
/// ```
/// use ttbar_reco::{Era, ReconstructionConfig};
///
/// let config = ReconstructionConfig::for_era(Era::UL2018).with_max_steps(500);
/// assert_eq!(config.btag_threshold, 0.2783);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReconstructionConfig {
    /// Jets with a b-tag discriminant strictly above this value are b-jet candidates.
    pub btag_threshold: Float,
    /// Nominal $`W`$-boson mass (GeV).
    pub w_mass: Float,
    /// Nominal top-quark mass (GeV).
    pub top_mass: Float,
    /// Resolution of the reconstructed $`W`$ mass (GeV).
    pub w_sigma: Float,
    /// Resolution of the reconstructed top mass (GeV).
    pub top_sigma: Float,
    /// Relative resolution of each lepton momentum component.
    pub lepton_resolution: Float,
    /// Relative resolution of each neutrino momentum component.
    pub neutrino_resolution: Float,
    /// Relative resolution of each jet momentum component.
    pub jet_resolution: Float,
    /// Lower bound on any single component resolution (GeV).
    pub min_resolution: Float,
    /// Jets must have a transverse momentum strictly above this value (GeV).
    pub jet_min_pt: Float,
    /// Jets must have $`|\eta|`$ strictly below this value.
    pub jet_max_abs_eta: Float,
    /// Maximum number of minimizer steps in the kinematic fit.
    pub max_steps: usize,
}

impl Default for ReconstructionConfig {
    fn default() -> Self {
        Self {
            btag_threshold: Era::default().btag_threshold(),
            w_mass: 80.4,
            top_mass: 172.5,
            w_sigma: 10.0,
            top_sigma: 13.0,
            lepton_resolution: 0.05,
            neutrino_resolution: 0.10,
            jet_resolution: 0.15,
            min_resolution: 0.01,
            jet_min_pt: 25.0,
            jet_max_abs_eta: 2.4,
            max_steps: 1000,
        }
    }
}

impl ReconstructionConfig {
    /// The default configuration with the b-tag working point of the given [`Era`].
    pub fn for_era(era: Era) -> Self {
        Self::default().with_btag_threshold(era.btag_threshold())
    }
    /// Like [`ReconstructionConfig::for_era`], but parses the era from its name (for instance
    /// `"UL2017"`).
    pub fn from_era_name(name: &str) -> TTRecoResult<Self> {
        Ok(Self::for_era(name.parse()?))
    }
    /// Set the b-tag discriminant threshold.
    pub fn with_btag_threshold(self, btag_threshold: Float) -> Self {
        Self {
            btag_threshold,
            ..self
        }
    }
    /// Set the nominal $`W`$ mass and its resolution.
    pub fn with_w_mass(self, w_mass: Float, w_sigma: Float) -> Self {
        Self {
            w_mass,
            w_sigma,
            ..self
        }
    }
    /// Set the nominal top mass and its resolution.
    pub fn with_top_mass(self, top_mass: Float, top_sigma: Float) -> Self {
        Self {
            top_mass,
            top_sigma,
            ..self
        }
    }
    /// Set the relative momentum resolutions of the lepton, the neutrino and the jets.
    pub fn with_resolutions(self, lepton: Float, neutrino: Float, jet: Float) -> Self {
        Self {
            lepton_resolution: lepton,
            neutrino_resolution: neutrino,
            jet_resolution: jet,
            ..self
        }
    }
    /// Set the kinematic acceptance for jets.
    pub fn with_jet_acceptance(self, min_pt: Float, max_abs_eta: Float) -> Self {
        Self {
            jet_min_pt: min_pt,
            jet_max_abs_eta: max_abs_eta,
            ..self
        }
    }
    /// Set the maximum number of minimizer steps for the kinematic fit (default: 1000).
    pub fn with_max_steps(self, max_steps: usize) -> Self {
        Self { max_steps, ..self }
    }

    /// Check that every setting leads to a well-defined reconstruction.
    pub fn validate(&self) -> TTRecoResult<()> {
        let positive = [
            ("w_mass", self.w_mass),
            ("top_mass", self.top_mass),
            ("w_sigma", self.w_sigma),
            ("top_sigma", self.top_sigma),
            ("lepton_resolution", self.lepton_resolution),
            ("neutrino_resolution", self.neutrino_resolution),
            ("jet_resolution", self.jet_resolution),
            ("min_resolution", self.min_resolution),
            ("jet_max_abs_eta", self.jet_max_abs_eta),
        ];
        for (field, value) in positive {
            if !(value.is_finite() && value > 0.0) {
                return Err(invalid(field, format!("expected a positive number, got {value}")));
            }
        }
        if !self.jet_min_pt.is_finite() || self.jet_min_pt < 0.0 {
            return Err(invalid(
                "jet_min_pt",
                format!("expected a non-negative number, got {}", self.jet_min_pt),
            ));
        }
        if !(0.0..=1.0).contains(&self.btag_threshold) {
            return Err(invalid(
                "btag_threshold",
                format!("expected a value in [0, 1], got {}", self.btag_threshold),
            ));
        }
        if self.max_steps == 0 {
            return Err(invalid("max_steps", "at least one step is required".to_string()));
        }
        Ok(())
    }
}

fn invalid(field: &str, reason: String) -> TTRecoError {
    TTRecoError::InvalidConfig {
        field: field.to_string(),
        reason,
    }
}
