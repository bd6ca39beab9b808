/// Useful enumerations for data-taking periods, charges and reconstruction outcomes.
pub mod enums;
/// Plain three- and four-vectors with the relativistic operations needed for reconstruction.
pub mod vectors;
