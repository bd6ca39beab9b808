use serde::{Deserialize, Serialize};

use crate::{
    reconstruction::{ReconstructionResult, TopKinematics},
    utils::{enums::Sign, vectors::Vec4},
    Float,
};

/// Angular and rapidity observables of a reconstructed $`t\bar{t}`$ pair.
///
/// The leptonic side is the top quark for a positively charged lepton and the antitop
/// otherwise. Angles are measured with respect to the beam ($`z`$) axis.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TTbarObservables {
    /// Invariant mass of the pair.
    pub ttbar_mass: Float,
    /// Longitudinal momentum of the pair in the lab frame.
    pub ttbar_pz: Float,
    /// $`\cos\theta`$ of the top quark in the lab frame, signed by the direction of the pair.
    pub lab_cos_theta: Float,
    /// $`\cos\theta`$ of the top quark in the pair rest frame, signed by the direction of the
    /// pair.
    pub cos_theta: Float,
    /// $`\cos\theta`$ of the antitop quark in the pair rest frame.
    pub anti_cos_theta: Float,
    /// Rapidity of the top quark in the pair rest frame.
    pub top_rapidity: Float,
    /// Rapidity of the antitop quark in the pair rest frame.
    pub antitop_rapidity: Float,
}

impl TTbarObservables {
    /// Compute the observables from a [`ReconstructionResult`] and the charge of its lepton.
    ///
    /// Returns `None` if the result carries no kinematics or if either top quark is unphysical
    /// (non-positive $`p_T`$ or mass, or $`|\eta| \geq 10`$).
    pub fn from_result(result: &ReconstructionResult, lepton_charge: Sign) -> Option<Self> {
        let (top_lep, top_had) = (result.top_lep?, result.top_had?);
        if !(is_physical(&top_lep) && is_physical(&top_had)) {
            return None;
        }
        let (top, antitop) = match lepton_charge {
            Sign::Positive => (top_lep, top_had),
            Sign::Negative => (top_had, top_lep),
        };
        Some(Self::from_tops(&top, &antitop))
    }

    /// Compute the observables from the top and antitop four-momenta.
    pub fn from_tops(top: &Vec4, antitop: &Vec4) -> Self {
        let ttbar = top + antitop;
        let rest = -ttbar.beta();
        let top_rest = top.boost(&rest);
        let antitop_rest = antitop.boost(&rest);
        let direction = if ttbar.pz() < 0.0 { -1.0 } else { 1.0 };
        Self {
            ttbar_mass: ttbar.m(),
            ttbar_pz: ttbar.pz(),
            lab_cos_theta: direction * top.costheta(),
            cos_theta: direction * top_rest.costheta(),
            anti_cos_theta: antitop_rest.costheta(),
            top_rapidity: top_rest.rapidity(),
            antitop_rapidity: antitop_rest.rapidity(),
        }
    }
}

fn is_physical(p4: &Vec4) -> bool {
    let kinematics = TopKinematics::from(*p4);
    kinematics.pt > 0.0 && kinematics.mass > 0.0 && kinematics.eta.abs() < 10.0
}
