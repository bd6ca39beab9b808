use serde::{Deserialize, Serialize};

#[cfg(feature = "rayon")]
use rayon::prelude::*;

use crate::{
    config::ReconstructionConfig,
    data::Event,
    fit::{fit, FitSolution},
    permutations::{search, ScoredAssignment},
    utils::{enums::FitStatus, vectors::Vec4},
    Float, TTRecoResult,
};

/// Value written to the output record wherever a quantity does not exist.
pub const SENTINEL: Float = -1.0;

/// The reconstructed state of one event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReconstructionResult {
    /// How the reconstruction ended.
    pub status: FitStatus,
    /// The smallest pre-fit $`\chi^2`$ of the assignment search (`-1` if there was none).
    pub chi2_prefit: Float,
    /// The final $`\chi^2`$: the fit minimum on success, the pre-fit value on fallback.
    pub chi2: Float,
    /// $`P_{\text{gof}} = e^{-\chi^2/2}`$.
    pub goodness_of_fit: Float,
    /// The top quark on the leptonic side.
    pub top_lep: Option<Vec4>,
    /// The top quark on the hadronic side.
    pub top_had: Option<Vec4>,
}

impl ReconstructionResult {
    fn without_kinematics(status: FitStatus) -> Self {
        Self {
            status,
            chi2_prefit: SENTINEL,
            chi2: SENTINEL,
            goodness_of_fit: SENTINEL,
            top_lep: None,
            top_had: None,
        }
    }

    fn from_search(best: &ScoredAssignment, fitted: Option<FitSolution>) -> Self {
        let (status, assignment, chi2) = match fitted {
            Some(solution) => (FitStatus::Success, solution.assignment, solution.chi2),
            None => {
                log::debug!(
                    "kinematic fit did not converge, using the pre-fit assignment (chi2 = {})",
                    best.chi2
                );
                (FitStatus::FitFailedFallback, best.assignment, best.chi2)
            }
        };
        Self {
            status,
            chi2_prefit: best.chi2,
            chi2,
            goodness_of_fit: Float::exp(-chi2 / 2.0),
            top_lep: Some(assignment.top_lep()),
            top_had: Some(assignment.top_had()),
        }
    }

    /// Flatten into the fixed-shape output record.
    pub fn record(&self) -> ResultRecord {
        ResultRecord {
            top_lep: self.top_lep.map(TopKinematics::from).unwrap_or_default(),
            top_had: self.top_had.map(TopKinematics::from).unwrap_or_default(),
            chi2_prefit: self.chi2_prefit,
            chi2: self.chi2,
            goodness_of_fit: self.goodness_of_fit,
            status: self.status.code(),
        }
    }
}

/// Collider kinematics of one top quark as stored in a [`ResultRecord`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TopKinematics {
    /// Transverse momentum (GeV).
    pub pt: Float,
    /// Pseudorapidity.
    pub eta: Float,
    /// Azimuthal angle.
    pub phi: Float,
    /// Invariant mass (GeV).
    pub mass: Float,
}

impl Default for TopKinematics {
    fn default() -> Self {
        Self {
            pt: SENTINEL,
            eta: SENTINEL,
            phi: SENTINEL,
            mass: SENTINEL,
        }
    }
}

impl From<Vec4> for TopKinematics {
    fn from(p4: Vec4) -> Self {
        Self {
            pt: p4.pt(),
            eta: p4.eta(),
            phi: p4.phi(),
            mass: p4.m(),
        }
    }
}

/// The per-event output record handed to downstream consumers. Missing values are `-1`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ResultRecord {
    /// The leptonic-side top quark.
    pub top_lep: TopKinematics,
    /// The hadronic-side top quark.
    pub top_had: TopKinematics,
    /// The pre-fit $`\chi^2`$.
    pub chi2_prefit: Float,
    /// The final $`\chi^2`$.
    pub chi2: Float,
    /// The goodness-of-fit probability.
    pub goodness_of_fit: Float,
    /// The [`FitStatus`] code (0 to 3).
    pub status: i32,
}

/// Reconstructs top-quark pairs event by event with a fixed [`ReconstructionConfig`].
#[derive(Debug, Clone)]
pub struct Reconstructor {
    config: ReconstructionConfig,
}

impl Reconstructor {
    /// Create a [`Reconstructor`], rejecting configurations that would make the reconstruction
    /// ill-defined.
    pub fn new(config: ReconstructionConfig) -> TTRecoResult<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    /// The configuration in use.
    pub fn config(&self) -> &ReconstructionConfig {
        &self.config
    }

    /// Reconstruct a single [`Event`]. This never fails: problems are reported through
    /// [`ReconstructionResult::status`].
    pub fn reconstruct(&self, event: &Event) -> ReconstructionResult {
        let result = match search(event, &self.config) {
            Ok(best) => {
                ReconstructionResult::from_search(&best, fit(&best.assignment, &self.config))
            }
            Err(status) => ReconstructionResult::without_kinematics(status),
        };
        log::trace!("event reconstructed with status {}", result.status.code());
        result
    }

    /// Reconstruct many events. The results are in the same order as the events.
    #[cfg(feature = "rayon")]
    pub fn reconstruct_batch(&self, events: &[Event]) -> Vec<ReconstructionResult> {
        let results: Vec<ReconstructionResult> = events
            .par_iter()
            .map(|event| self.reconstruct(event))
            .collect();
        log_summary(&results);
        results
    }

    /// Reconstruct many events. The results are in the same order as the events.
    #[cfg(not(feature = "rayon"))]
    pub fn reconstruct_batch(&self, events: &[Event]) -> Vec<ReconstructionResult> {
        let results: Vec<ReconstructionResult> =
            events.iter().map(|event| self.reconstruct(event)).collect();
        log_summary(&results);
        results
    }
}

fn log_summary(results: &[ReconstructionResult]) {
    let mut counts = [0usize; 4];
    for result in results {
        counts[result.status.code() as usize] += 1;
    }
    log::info!(
        "reconstructed {} events: {} converged, {} failed jet selection, {} without a valid permutation, {} fell back to the pre-fit",
        results.len(),
        counts[0],
        counts[1],
        counts[2],
        counts[3]
    );
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;
    use crate::{
        data::{test_event, tests::on_shell_event, Jet, Lepton, Met},
        utils::enums::Sign,
        TTRecoError,
    };

    fn reconstructor() -> Reconstructor {
        Reconstructor::new(ReconstructionConfig::default()).unwrap()
    }

    fn assert_on_shell(result: &ReconstructionResult) {
        for top in [result.top_lep, result.top_had] {
            assert!(top.unwrap().m2() >= -1e-6);
        }
    }

    #[test]
    fn invalid_config_is_rejected() {
        let err = Reconstructor::new(ReconstructionConfig::default().with_max_steps(0)).unwrap_err();
        assert!(matches!(err, TTRecoError::InvalidConfig { .. }));
    }

    #[test]
    fn test_event_succeeds() {
        let result = reconstructor().reconstruct(&test_event());
        assert_eq!(result.status, FitStatus::Success);
        assert!(result.chi2 >= 0.0);
        assert!(result.chi2_prefit >= 0.0);
        assert!(result.goodness_of_fit > 0.0 && result.goodness_of_fit <= 1.0);
        assert_relative_eq!(result.goodness_of_fit, Float::exp(-result.chi2 / 2.0));
        assert_on_shell(&result);
    }

    #[test]
    fn near_on_shell_event_recovers_top_masses() {
        let result = reconstructor().reconstruct(&on_shell_event([1.04, 0.96, 0.97, 1.03]));
        assert_eq!(result.status, FitStatus::Success);
        assert_relative_eq!(result.top_lep.unwrap().m(), 172.5, epsilon = 5.0);
        assert_relative_eq!(result.top_had.unwrap().m(), 172.5, epsilon = 5.0);
        assert_on_shell(&result);
    }

    #[test]
    fn single_jet_fails_selection() {
        let mut event = test_event();
        event.jets.truncate(1);
        let result = reconstructor().reconstruct(&event);
        assert_eq!(result.status, FitStatus::JetSelectionFailed);
        let record = result.record();
        assert_eq!(record.status, 1);
        for value in [
            record.top_lep.pt,
            record.top_lep.eta,
            record.top_lep.phi,
            record.top_lep.mass,
            record.top_had.pt,
            record.top_had.eta,
            record.top_had.phi,
            record.top_had.mass,
            record.chi2_prefit,
            record.chi2,
            record.goodness_of_fit,
        ] {
            assert_eq!(value, SENTINEL);
        }
    }

    #[test]
    fn degenerate_lepton_has_no_valid_permutation() {
        let mut event = test_event();
        event.lepton = Lepton::new(0.0, 0.0, 0.0, 0.0, Sign::Negative);
        let result = reconstructor().reconstruct(&event);
        assert_eq!(result.status, FitStatus::NoValidPermutation);
        assert_eq!(result.record().status, 2);
        assert_eq!(result.chi2_prefit, SENTINEL);
        assert!(result.top_lep.is_none() && result.top_had.is_none());
    }

    #[test]
    fn non_finite_met_has_no_valid_permutation() {
        let mut event = test_event();
        event.met = Met::from_components(Float::NAN, 10.0);
        let result = reconstructor().reconstruct(&event);
        assert_eq!(result.status, FitStatus::NoValidPermutation);
        let record = result.record();
        assert_eq!(record.top_lep, TopKinematics::default());
        assert_eq!(record.top_had, TopKinematics::default());
        assert_eq!(record.chi2, SENTINEL);
    }

    #[test]
    fn step_limited_fit_falls_back_to_prefit() {
        let reconstructor =
            Reconstructor::new(ReconstructionConfig::default().with_max_steps(1)).unwrap();
        let result = reconstructor.reconstruct(&test_event());
        assert_eq!(result.status, FitStatus::FitFailedFallback);
        assert_eq!(result.record().status, 3);
        assert_eq!(result.chi2, result.chi2_prefit);
        assert_relative_eq!(result.goodness_of_fit, Float::exp(-result.chi2_prefit / 2.0));
        let best = search(&test_event(), reconstructor.config()).unwrap();
        assert_eq!(result.top_lep, Some(best.assignment.top_lep()));
        assert_eq!(result.top_had, Some(best.assignment.top_had()));
        assert_on_shell(&result);
    }

    #[test]
    fn failed_fit_falls_back_to_prefit() {
        let best = search(&test_event(), &ReconstructionConfig::default()).unwrap();
        let result = ReconstructionResult::from_search(&best, None);
        assert_eq!(result.status, FitStatus::FitFailedFallback);
        assert_eq!(result.record().status, 3);
        assert_eq!(result.chi2, result.chi2_prefit);
        assert_eq!(result.chi2, best.chi2);
        assert_relative_eq!(result.goodness_of_fit, Float::exp(-best.chi2 / 2.0));
        assert_eq!(result.top_lep, Some(best.assignment.top_lep()));
        assert_eq!(result.top_had, Some(best.assignment.top_had()));
        assert_on_shell(&result);
    }

    #[test]
    fn record_carries_top_kinematics() {
        let result = reconstructor().reconstruct(&test_event());
        let record = result.record();
        let top_lep = result.top_lep.unwrap();
        assert_eq!(record.status, 0);
        assert_relative_eq!(record.top_lep.pt, top_lep.pt());
        assert_relative_eq!(record.top_lep.eta, top_lep.eta());
        assert_relative_eq!(record.top_lep.phi, top_lep.phi());
        assert_relative_eq!(record.top_lep.mass, top_lep.m());
        assert_relative_eq!(record.chi2, result.chi2);
    }

    #[test]
    fn reconstruction_is_idempotent() {
        let reconstructor = reconstructor();
        let event = test_event();
        assert_eq!(reconstructor.reconstruct(&event), reconstructor.reconstruct(&event));
    }

    #[test]
    fn well_populated_events_always_have_kinematics() {
        let reconstructor = reconstructor();
        let mut rng = fastrand::Rng::with_seed(11);
        for _ in 0..20 {
            let scales = [
                0.85 + 0.3 * rng.f64() as Float,
                0.85 + 0.3 * rng.f64() as Float,
                0.85 + 0.3 * rng.f64() as Float,
                0.85 + 0.3 * rng.f64() as Float,
            ];
            let result = reconstructor.reconstruct(&on_shell_event(scales));
            assert!(result.status.has_kinematics());
            assert!(result.chi2.is_finite());
            assert_on_shell(&result);
        }
    }

    #[test]
    fn batch_preserves_order() {
        let reconstructor = reconstructor();
        let mut single_jet = test_event();
        single_jet.jets = vec![Jet::new(60.0, 0.1, 0.4, 0.9)];
        let events = vec![test_event(), single_jet, on_shell_event([1.0; 4])];
        let results = reconstructor.reconstruct_batch(&events);
        assert_eq!(results.len(), 3);
        assert_eq!(results[1].status, FitStatus::JetSelectionFailed);
        for (event, result) in events.iter().zip(&results) {
            assert_eq!(&reconstructor.reconstruct(event), result);
        }
    }
}
