use std::convert::Infallible;

use ganesh::{algorithms::LBFGSB, Algorithm, Function, Minimizer};
use nalgebra::DVector;

use crate::{
    config::ReconstructionConfig,
    permutations::Assignment,
    utils::vectors::{Vec3, Vec4},
    Float,
};

const N_LEAVES: usize = 6;
const N_PARAMETERS: usize = 3 * N_LEAVES;

const LEPTON: usize = 0;
const NEUTRINO: usize = 1;
const B_LEP: usize = 2;
const B_HAD: usize = 3;
const LIGHT_1: usize = 4;
const LIGHT_2: usize = 5;

/// A soft mass constraint on the sum of some leaves.
#[derive(Debug, Clone, Copy)]
struct MassConstraint {
    members: &'static [usize],
    target: Float,
    sigma: Float,
}

/// The $`\chi^2`$ of the kinematic fit as a function of the 18 momentum components of the six
/// leaves (lepton, neutrino, leptonic b, hadronic b, two light jets).
///
/// ```math
/// \chi^2(\vec{p}) = \sum_{i=1}^{18} \left(\frac{p_i - p_i^{\text{meas}}}{\sigma_i}\right)^2
///     + \sum_{c \in \{W_\ell, W_h, t_\ell, t_h\}} \left(\frac{m_c(\vec{p}) - m_c^0}{\sigma_c}\right)^2
/// ```
///
/// Each $`\sigma_i`$ is a fixed fraction of the measured component, floored at
/// [`ReconstructionConfig::min_resolution`]. Leaf masses are held at their measured values
/// during the fit (the neutrino is massless).
#[derive(Debug, Clone)]
pub struct KinematicFit {
    measured: [Float; N_PARAMETERS],
    sigmas: [Float; N_PARAMETERS],
    masses: [Float; N_LEAVES],
    constraints: [MassConstraint; 4],
}

/// The outcome of a converged kinematic fit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FitSolution {
    /// The fitted leaves, in the same roles as the input [`Assignment`].
    pub assignment: Assignment,
    /// The $`\chi^2`$ at the minimum.
    pub chi2: Float,
}

impl KinematicFit {
    /// Set up the fit around the measured leaves of an [`Assignment`].
    pub fn new(assignment: &Assignment, config: &ReconstructionConfig) -> Self {
        let leaves = assignment.leaves();
        let fractions = [
            config.lepton_resolution,
            config.neutrino_resolution,
            config.jet_resolution,
            config.jet_resolution,
            config.jet_resolution,
            config.jet_resolution,
        ];
        let mut measured = [0.0; N_PARAMETERS];
        let mut sigmas = [0.0; N_PARAMETERS];
        let mut masses = [0.0; N_LEAVES];
        for (k, (leaf, fraction)) in leaves.iter().zip(fractions).enumerate() {
            for (j, component) in [leaf.x, leaf.y, leaf.z].into_iter().enumerate() {
                measured[3 * k + j] = component;
                sigmas[3 * k + j] = Float::max(fraction * component.abs(), config.min_resolution);
            }
            masses[k] = if k == NEUTRINO { 0.0 } else { leaf.m() };
        }
        let w = |members: &'static [usize]| MassConstraint {
            members,
            target: config.w_mass,
            sigma: config.w_sigma,
        };
        let top = |members: &'static [usize]| MassConstraint {
            members,
            target: config.top_mass,
            sigma: config.top_sigma,
        };
        Self {
            measured,
            sigmas,
            masses,
            constraints: [
                w(&[LEPTON, NEUTRINO]),
                w(&[LIGHT_1, LIGHT_2]),
                top(&[LEPTON, NEUTRINO, B_LEP]),
                top(&[B_HAD, LIGHT_1, LIGHT_2]),
            ],
        }
    }

    /// The measured momentum components, which also serve as the starting point.
    pub fn measured(&self) -> &[Float] {
        &self.measured
    }

    fn leaves(&self, x: &[Float]) -> [Vec4; N_LEAVES] {
        std::array::from_fn(|k| {
            Vec3::new(x[3 * k], x[3 * k + 1], x[3 * k + 2]).with_mass(self.masses[k])
        })
    }

    /// Rebuild an [`Assignment`] from a parameter vector.
    pub fn assignment(&self, x: &[Float]) -> Assignment {
        let leaves = self.leaves(x);
        Assignment {
            lepton: leaves[LEPTON],
            neutrino: leaves[NEUTRINO],
            b_lep: leaves[B_LEP],
            b_had: leaves[B_HAD],
            light: [leaves[LIGHT_1], leaves[LIGHT_2]],
        }
    }

    /// Evaluate the $`\chi^2`$ at `x`.
    pub fn chi2(&self, x: &[Float]) -> Float {
        let measurement: Float = x
            .iter()
            .zip(self.measured.iter().zip(&self.sigmas))
            .map(|(p, (m, s))| ((p - m) / s).powi(2))
            .sum();
        let leaves = self.leaves(x);
        let mass: Float = self
            .constraints
            .iter()
            .map(|c| {
                let total: Vec4 = c.members.iter().map(|&k| leaves[k]).sum();
                ((total.m() - c.target) / c.sigma).powi(2)
            })
            .sum();
        measurement + mass
    }

    /// Minimize the $`\chi^2`$ with L-BFGS-B, starting from the measured values.
    ///
    /// Returns `None` unless the minimizer reports convergence with a finite minimum at a finite
    /// position.
    pub fn fit(&self, max_steps: usize) -> Option<FitSolution> {
        let algorithm: Box<dyn Algorithm<(), Infallible>> = Box::new(LBFGSB::default());
        let mut m = Minimizer::new(algorithm, N_PARAMETERS).with_max_steps(max_steps);
        m.minimize(self, &self.measured, &mut ())
            .unwrap_or_else(|never| match never {});
        let status = m.status;
        if !(status.converged && status.fx.is_finite() && status.x.iter().all(|v| v.is_finite())) {
            log::debug!(
                "kinematic fit failed (converged = {}, chi2 = {})",
                status.converged,
                status.fx
            );
            return None;
        }
        Some(FitSolution {
            assignment: self.assignment(status.x.as_slice()),
            chi2: status.fx,
        })
    }
}

impl Function<(), Infallible> for KinematicFit {
    fn evaluate(&self, x: &[Float], _user_data: &mut ()) -> Result<Float, Infallible> {
        Ok(self.chi2(x))
    }

    fn gradient(&self, x: &[Float], _user_data: &mut ()) -> Result<DVector<Float>, Infallible> {
        let mut g = DVector::from_fn(N_PARAMETERS, |i, _| {
            2.0 * (x[i] - self.measured[i]) / self.sigmas[i].powi(2)
        });
        let leaves = self.leaves(x);
        for c in &self.constraints {
            let total: Vec4 = c.members.iter().map(|&k| leaves[k]).sum();
            let mass = total.m();
            if mass <= 0.0 {
                continue;
            }
            let weight = 2.0 * (mass - c.target) / c.sigma.powi(2);
            let total_p = [total.x, total.y, total.z];
            for &k in c.members {
                let leaf = leaves[k];
                for (j, p) in [leaf.x, leaf.y, leaf.z].into_iter().enumerate() {
                    // dE_k/dp_kj; a leaf with zero energy contributes no energy derivative
                    let de = if leaf.t > 0.0 { p / leaf.t } else { 0.0 };
                    g[3 * k + j] += weight * (total.t * de - total_p[j]) / mass;
                }
            }
        }
        Ok(g)
    }
}

/// Run the kinematic fit for an [`Assignment`] with the given settings.
pub fn fit(assignment: &Assignment, config: &ReconstructionConfig) -> Option<FitSolution> {
    KinematicFit::new(assignment, config).fit(config.max_steps)
}
