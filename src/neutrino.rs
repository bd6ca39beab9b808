use serde::{Deserialize, Serialize};

use crate::{data::Met, utils::vectors::Vec4, Float};

/// Solutions for the longitudinal momentum of the neutrino.
///
/// Requiring $`m(\ell + \nu) = m_W`$ with $`\vec{p}_{T,\nu} = \vec{E}_T^{\text{miss}}`$ gives a
/// quadratic in $`p_{z,\nu}`$. When it has no real roots (typically because the missing
/// transverse momentum is mismeasured), only the real part of the complex pair is kept. That
/// degraded solution does not satisfy the mass constraint.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum NeutrinoSolutions {
    /// Two real roots (possibly equal).
    Real {
        /// The root taken with $`+\sqrt{\Delta}`$.
        plus: Float,
        /// The root taken with $`-\sqrt{\Delta}`$.
        minus: Float,
    },
    /// The discriminant was negative; this is the shared real part $`-B/2A`$ of both complex
    /// roots.
    RealPartOnly(Float),
}

impl NeutrinoSolutions {
    /// The candidate values of $`p_{z,\nu}`$ to try, in a fixed order.
    pub fn values(&self) -> Vec<Float> {
        match *self {
            NeutrinoSolutions::Real { plus, minus } => vec![plus, minus],
            NeutrinoSolutions::RealPartOnly(pz) => vec![pz],
        }
    }
    /// Whether the solutions come from the negative-discriminant fallback.
    pub fn is_degraded(&self) -> bool {
        matches!(self, NeutrinoSolutions::RealPartOnly(_))
    }
}

/// Solve the $`W`$-mass constraint for the neutrino longitudinal momentum.
///
/// With $`a = m_W^2 + 2(p_{x,\ell} p_{x,\nu} + p_{y,\ell} p_{y,\nu})`$ the constraint reads
/// ```math
/// A p_z^2 + B p_z + C = 0,\quad A = 4(E_\ell^2 - p_{z,\ell}^2),\quad B = -4 a p_{z,\ell},\quad C = 4 E_\ell^2 p_{T,\nu}^2 - a^2.
/// ```
/// A lepton with no transverse momentum and no mass makes $`A = 0`$; the returned values are
/// then non-finite and the caller must discard them.
pub fn solve_neutrino_pz(lepton: &Vec4, met: &Met, w_mass: Float) -> NeutrinoSolutions {
    let a = w_mass.powi(2) + 2.0 * (lepton.px() * met.px + lepton.py() * met.py);
    let qa = 4.0 * (lepton.e().powi(2) - lepton.pz().powi(2));
    let qb = -4.0 * a * lepton.pz();
    let qc = 4.0 * lepton.e().powi(2) * met.pt().powi(2) - a.powi(2);
    let discriminant = qb.powi(2) - 4.0 * qa * qc;
    if discriminant < 0.0 {
        log::debug!("negative discriminant ({discriminant}) in neutrino pz, keeping real part");
        return NeutrinoSolutions::RealPartOnly(-qb / (2.0 * qa));
    }
    let sqrt_discriminant = Float::sqrt(discriminant);
    NeutrinoSolutions::Real {
        plus: (-qb + sqrt_discriminant) / (2.0 * qa),
        minus: (-qb - sqrt_discriminant) / (2.0 * qa),
    }
}
