//! # ttbar-reco
//!
//! Event-by-event kinematic reconstruction of semileptonic top-quark pair decays,
//! $`t\bar{t} \to (b \ell \nu)(b q \bar{q}')`$.
//!
//! Each [`Event`] carries one charged lepton, a list of jets and the missing transverse
//! momentum. A [`Reconstructor`] turns it into exactly one [`ReconstructionResult`] in three
//! steps:
//!
//! 1. [`neutrino::solve_neutrino_pz`] recovers the unmeasured longitudinal momentum of the
//!    neutrino from the $`W`$-mass constraint.
//! 2. [`permutations::search`] assigns jets to the two $`b`$-quarks and the two light quarks of
//!    the hadronic $`W`$ decay, choosing the combination with the smallest pre-fit
//!    $`\chi^2`$.
//! 3. [`fit::KinematicFit`] refines the six momenta of the best assignment against soft
//!    $`W`$- and top-mass constraints with an L-BFGS-B minimization.
//!
//! Events are never dropped: every failure mode is reported through [`FitStatus`].
//!
//! ```
//! use ttbar_reco::{Event, Jet, Lepton, Met, ReconstructionConfig, Reconstructor, Sign};
//!
//! let reconstructor = Reconstructor::new(ReconstructionConfig::default()).unwrap();
//! let event = Event::new(
//!     vec![Jet::new(60.0, 0.1, 0.4, 0.9)],
//!     Lepton::new(45.0, 0.2, 0.0, 0.105, Sign::Negative),
//!     Met::from_components(30.0, 10.0),
//! );
//! let result = reconstructor.reconstruct(&event);
//! assert_eq!(result.status.code(), 1);
//! ```
#![warn(clippy::perf, clippy::style, missing_docs)]
#![allow(clippy::excessive_precision)]

use thiserror::Error;

/// Immutable reconstruction settings shared by every event.
pub mod config;
/// Typed per-event input: jets, the charged lepton and the missing transverse momentum.
pub mod data;
/// The soft-constrained kinematic fit of the six decay products.
pub mod fit;
/// The $`W`$-mass constrained solution for the neutrino longitudinal momentum.
pub mod neutrino;
/// Angular and rapidity observables of the reconstructed top-quark pair.
pub mod observables;
/// Candidate selection and the jet-role assignment search.
pub mod permutations;
/// The per-event reconstruction driver and its output record.
pub mod reconstruction;
/// Utility enums and four-momentum algebra.
pub mod utils;

pub use crate::config::ReconstructionConfig;
pub use crate::data::{Event, Jet, Lepton, Met};
pub use crate::observables::TTbarObservables;
pub use crate::reconstruction::{
    ReconstructionResult, Reconstructor, ResultRecord, TopKinematics,
};
pub use crate::utils::enums::{Era, FitStatus, Sign};
pub use crate::utils::vectors::{Vec3, Vec4};

/// The floating-point type used throughout the crate (`f64` unless the `f32` feature is on).
pub use ganesh::Float;

/// The `Result` type used by all fallible `ttbar-reco` methods.
pub type TTRecoResult<T> = Result<T, TTRecoError>;

/// The error type used by all `ttbar-reco` internal methods.
///
/// Errors only arise while configuring a [`Reconstructor`]; reconstructing an event never fails
/// and reports problems through [`FitStatus`] instead.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TTRecoError {
    /// An error which occurs when the user tries to parse an invalid string of text, typically
    /// into an enum variant.
    #[error("Failed to parse string: \"{name}\" does not correspond to a valid \"{object}\"!")]
    ParseError {
        /// The string which was parsed
        name: String,
        /// The name of the object it failed to parse into
        object: String,
    },
    /// A configuration value which would make the reconstruction ill-defined.
    #[error("Invalid configuration for \"{field}\": {reason}")]
    InvalidConfig {
        /// The offending configuration field
        field: String,
        /// Why the value was rejected
        reason: String,
    },
    /// A custom fallback error for errors too complex or too infrequent to warrant their own error
    /// category.
    #[error("{0}")]
    Custom(String),
}
