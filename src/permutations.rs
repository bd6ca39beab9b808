use crate::{
    config::ReconstructionConfig,
    data::{Event, Jet},
    neutrino::solve_neutrino_pz,
    utils::{enums::FitStatus, vectors::Vec4},
    Float,
};

/// The jets considered for the two $`b`$-quark and the two light-quark roles.
///
/// Both pairs are ordered by descending transverse momentum.
#[derive(Debug, Clone, PartialEq)]
pub struct CandidatePool {
    /// The two leading b-tagged jets.
    pub b_jets: [Vec4; 2],
    /// The two leading jets not selected as b-jets.
    pub light_jets: [Vec4; 2],
}

impl CandidatePool {
    /// Build the pool from the eligible jets of an event.
    ///
    /// Jets failing the kinematic acceptance are ignored. Going down in transverse momentum, the
    /// first two jets with a b-tag score above the threshold become b-jet candidates and every
    /// other jet (including further b-tagged jets) is a light-jet candidate. Returns `None` when
    /// either role cannot be filled twice.
    pub fn select(jets: &[Jet], config: &ReconstructionConfig) -> Option<Self> {
        let mut eligible: Vec<&Jet> = jets
            .iter()
            .filter(|jet| jet.is_eligible(config.jet_min_pt, config.jet_max_abs_eta))
            .collect();
        eligible.sort_by(|a, b| b.pt.total_cmp(&a.pt));
        let mut b_jets = Vec::with_capacity(2);
        let mut light_jets = Vec::with_capacity(2);
        for jet in eligible {
            if jet.btag > config.btag_threshold && b_jets.len() < 2 {
                b_jets.push(jet.p4());
            } else if light_jets.len() < 2 {
                light_jets.push(jet.p4());
            }
        }
        match (b_jets.as_slice(), light_jets.as_slice()) {
            ([b1, b2], [q1, q2]) => Some(Self {
                b_jets: [*b1, *b2],
                light_jets: [*q1, *q2],
            }),
            _ => None,
        }
    }
}

/// A full interpretation of the event: which jet comes from which top quark, and which neutrino
/// solution is used.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Assignment {
    /// The charged lepton.
    pub lepton: Vec4,
    /// The neutrino built from the missing transverse momentum and one $`p_z`$ solution.
    pub neutrino: Vec4,
    /// The b-jet assigned to the leptonically decaying top quark.
    pub b_lep: Vec4,
    /// The b-jet assigned to the hadronically decaying top quark.
    pub b_had: Vec4,
    /// The two light jets from the hadronic $`W`$ decay.
    pub light: [Vec4; 2],
}

impl Assignment {
    /// The leptonically decaying $`W`$.
    pub fn w_lep(&self) -> Vec4 {
        self.lepton + self.neutrino
    }
    /// The hadronically decaying $`W`$.
    pub fn w_had(&self) -> Vec4 {
        self.light[0] + self.light[1]
    }
    /// The top quark on the leptonic side.
    pub fn top_lep(&self) -> Vec4 {
        self.w_lep() + self.b_lep
    }
    /// The top quark on the hadronic side.
    pub fn top_had(&self) -> Vec4 {
        self.w_had() + self.b_had
    }
    /// The six measured leaves in fit order: lepton, neutrino, leptonic b, hadronic b, light 1,
    /// light 2.
    pub fn leaves(&self) -> [Vec4; 6] {
        [
            self.lepton,
            self.neutrino,
            self.b_lep,
            self.b_had,
            self.light[0],
            self.light[1],
        ]
    }
    /// The fast pre-fit $`\chi^2`$ used to rank assignments:
    /// ```math
    /// \chi^2 = \left(\frac{m_{qq} - m_W}{\sigma_W}\right)^2 + \left(\frac{m_{\ell\nu} - m_W}{\sigma_W}\right)^2 + \left(\frac{m_{\ell\nu b} - m_{qqb}}{\sigma_t}\right)^2
    /// ```
    pub fn prefit_chi2(&self, config: &ReconstructionConfig) -> Float {
        let chi2_w_had = ((self.w_had().m() - config.w_mass) / config.w_sigma).powi(2);
        let chi2_w_lep = ((self.w_lep().m() - config.w_mass) / config.w_sigma).powi(2);
        let chi2_top = ((self.top_lep().m() - self.top_had().m()) / config.top_sigma).powi(2);
        chi2_w_had + chi2_w_lep + chi2_top
    }
}

/// An [`Assignment`] together with its pre-fit $`\chi^2`$.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoredAssignment {
    /// The jet and neutrino interpretation.
    pub assignment: Assignment,
    /// Its pre-fit $`\chi^2`$.
    pub chi2: Float,
}

/// Every combination of b-jet pairing and neutrino solution for the given pool, in evaluation
/// order.
///
/// The light jets are used in a single order: exchanging them changes neither the pre-fit
/// $`\chi^2`$ nor the kinematic fit, which treats both light jets identically.
pub fn enumerate(
    event: &Event,
    pool: &CandidatePool,
    config: &ReconstructionConfig,
) -> Vec<ScoredAssignment> {
    let lepton = event.lepton.p4();
    let solutions = solve_neutrino_pz(&lepton, &event.met, config.w_mass);
    let [b1, b2] = pool.b_jets;
    let mut scored = Vec::with_capacity(4);
    for (b_lep, b_had) in [(b1, b2), (b2, b1)] {
        for pz in solutions.values() {
            let assignment = Assignment {
                lepton,
                neutrino: event.met.neutrino(pz),
                b_lep,
                b_had,
                light: pool.light_jets,
            };
            scored.push(ScoredAssignment {
                assignment,
                chi2: assignment.prefit_chi2(config),
            });
        }
    }
    scored
}

/// Find the assignment with the smallest pre-fit $`\chi^2`$.
///
/// Fails with [`FitStatus::JetSelectionFailed`] if the candidate pool cannot be filled and with
/// [`FitStatus::NoValidPermutation`] if no combination yields a finite $`\chi^2`$ with finite
/// four-momenta. Ties keep the first combination in [`enumerate`] order.
pub fn search(event: &Event, config: &ReconstructionConfig) -> Result<ScoredAssignment, FitStatus> {
    let pool = CandidatePool::select(&event.jets, config).ok_or(FitStatus::JetSelectionFailed)?;
    enumerate(event, &pool, config)
        .into_iter()
        .filter(|scored| {
            scored.chi2.is_finite() && scored.assignment.leaves().iter().all(Vec4::is_finite)
        })
        .fold(None, |best: Option<ScoredAssignment>, scored| match best {
            Some(best) if best.chi2 <= scored.chi2 => Some(best),
            _ => Some(scored),
        })
        .ok_or(FitStatus::NoValidPermutation)
}
