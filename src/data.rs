use std::fmt::Display;

use serde::{Deserialize, Serialize};

use crate::{
    utils::{
        enums::Sign,
        vectors::{Vec3, Vec4},
    },
    Float,
};

/// A reconstructed jet as handed over by the event selection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Jet {
    /// Transverse momentum (GeV).
    pub pt: Float,
    /// Pseudorapidity.
    pub eta: Float,
    /// Azimuthal angle.
    pub phi: Float,
    /// Jet mass (GeV). Jets without a mass are treated as massless.
    pub mass: Option<Float>,
    /// The b-tag discriminant score.
    pub btag: Float,
    /// Generator-level parton flavour, available in simulation only.
    pub parton_flavour: Option<i32>,
}

impl Jet {
    /// Create a massless [`Jet`] with the given kinematics and b-tag score.
    pub fn new(pt: Float, eta: Float, phi: Float, btag: Float) -> Self {
        Self {
            pt,
            eta,
            phi,
            mass: None,
            btag,
            parton_flavour: None,
        }
    }
    /// Attach a measured jet mass.
    pub fn with_mass(self, mass: Float) -> Self {
        Self {
            mass: Some(mass),
            ..self
        }
    }
    /// Attach the generator-level parton flavour.
    pub fn with_parton_flavour(self, parton_flavour: i32) -> Self {
        Self {
            parton_flavour: Some(parton_flavour),
            ..self
        }
    }
    /// The four-momentum of the [`Jet`].
    pub fn p4(&self) -> Vec4 {
        Vec4::from_pt_eta_phi_m(self.pt, self.eta, self.phi, self.mass.unwrap_or(0.0))
    }
    /// Whether the jet passes the kinematic acceptance. Non-finite kinematics never pass.
    pub fn is_eligible(&self, min_pt: Float, max_abs_eta: Float) -> bool {
        self.pt.is_finite()
            && self.eta.is_finite()
            && self.phi.is_finite()
            && self.mass.map_or(true, Float::is_finite)
            && self.pt > min_pt
            && self.eta.abs() < max_abs_eta
    }
}

/// The charged lepton from the leptonic $`W`$ decay.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lepton {
    /// Transverse momentum (GeV).
    pub pt: Float,
    /// Pseudorapidity.
    pub eta: Float,
    /// Azimuthal angle.
    pub phi: Float,
    /// Lepton mass (GeV).
    pub mass: Float,
    /// Electric charge.
    pub charge: Sign,
}

impl Lepton {
    /// Create a new [`Lepton`].
    pub fn new(pt: Float, eta: Float, phi: Float, mass: Float, charge: Sign) -> Self {
        Self {
            pt,
            eta,
            phi,
            mass,
            charge,
        }
    }
    /// The four-momentum of the [`Lepton`].
    pub fn p4(&self) -> Vec4 {
        Vec4::from_pt_eta_phi_m(self.pt, self.eta, self.phi, self.mass)
    }
}

/// Missing transverse momentum, stored in Cartesian components.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Met {
    /// $`x`$-component (GeV).
    pub px: Float,
    /// $`y`$-component (GeV).
    pub py: Float,
}

impl Met {
    /// Create a [`Met`] from its Cartesian components.
    pub fn from_components(px: Float, py: Float) -> Self {
        Self { px, py }
    }
    /// Create a [`Met`] from its magnitude and azimuth.
    pub fn from_polar(pt: Float, phi: Float) -> Self {
        Self {
            px: pt * Float::cos(phi),
            py: pt * Float::sin(phi),
        }
    }
    /// The magnitude of the missing transverse momentum.
    pub fn pt(&self) -> Float {
        Float::hypot(self.px, self.py)
    }
    /// The azimuth of the missing transverse momentum.
    pub fn phi(&self) -> Float {
        Float::atan2(self.py, self.px)
    }
    /// The four-momentum of a massless neutrino carrying this transverse momentum and the given
    /// longitudinal momentum.
    pub fn neutrino(&self, pz: Float) -> Vec4 {
        Vec3::new(self.px, self.py, pz).with_mass(0.0)
    }
}

/// One collision event: the input to [`Reconstructor::reconstruct`](crate::Reconstructor::reconstruct).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    /// All jets of the event, in any order.
    pub jets: Vec<Jet>,
    /// The charged lepton.
    pub lepton: Lepton,
    /// The missing transverse momentum.
    pub met: Met,
}

impl Display for Event {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Event:")?;
        writeln!(f, "  jets:")?;
        for jet in &self.jets {
            writeln!(f, "    {} (btag = {})", jet.p4().to_p4_string(), jet.btag)?;
        }
        writeln!(f, "  lepton:")?;
        writeln!(
            f,
            "    {} (charge {})",
            self.lepton.p4().to_p4_string(),
            self.lepton.charge
        )?;
        writeln!(f, "  met:")?;
        writeln!(f, "    ({}, {})", self.met.px, self.met.py)?;
        Ok(())
    }
}

impl Event {
    /// Create a new [`Event`].
    pub fn new(jets: Vec<Jet>, lepton: Lepton, met: Met) -> Self {
        Self { jets, lepton, met }
    }
    /// Create an [`Event`] from a lepton collection by keeping the leading-$`p_T`$ lepton.
    /// Returns `None` if there are no leptons.
    pub fn from_leptons(jets: Vec<Jet>, leptons: Vec<Lepton>, met: Met) -> Option<Self> {
        let lepton = leptons
            .into_iter()
            .filter(|lepton| lepton.pt.is_finite())
            .max_by(|a, b| a.pt.total_cmp(&b.pt))?;
        Some(Self::new(jets, lepton, met))
    }
}

/// An event that can be used to test the reconstruction: two well-separated b-tagged jets, two
/// light jets, a muon and moderate missing transverse momentum.
pub fn test_event() -> Event {
    Event::new(
        vec![
            Jet::new(60.0, 0.1, 2.5, 0.9),
            Jet::new(50.0, -0.2, -0.8, 0.85),
            Jet::new(40.0, 0.3, -2.2, 0.1),
            Jet::new(35.0, -0.1, 1.3, 0.05),
        ],
        Lepton::new(45.0, 0.2, 0.0, 0.105, Sign::Negative),
        Met::from_components(30.0, 10.0),
    )
}
