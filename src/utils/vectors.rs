use std::{fmt::Display, iter::Sum};

use auto_ops::{impl_op_ex, impl_op_ex_commutative};
use serde::{Deserialize, Serialize};

use crate::Float;

/// Pseudorapidity reported for a vector along the beam axis (zero transverse momentum).
const BEAM_AXIS_ETA: Float = 1e10;

/// A three-vector of real components, used for three-momenta and boost velocities.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vec3 {
    /// The $`x`$-component.
    pub x: Float,
    /// The $`y`$-component.
    pub y: Float,
    /// The $`z`$-component.
    pub z: Float,
}

impl Display for Vec3 {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}, {}, {}]", self.x, self.y, self.z)
    }
}

impl Vec3 {
    /// Create a new [`Vec3`] from its Cartesian components.
    pub const fn new(x: Float, y: Float, z: Float) -> Self {
        Self { x, y, z }
    }
    /// Treat the [`Vec3`] as a three-momentum and attach the energy of a particle of the given
    /// mass.
    pub fn with_mass(&self, mass: Float) -> Vec4 {
        let e = Float::sqrt(mass.powi(2) + self.mag2());
        Vec4::new(self.x, self.y, self.z, e)
    }
    /// Treat the [`Vec3`] as a three-momentum and attach the given energy.
    pub fn with_energy(&self, energy: Float) -> Vec4 {
        Vec4::new(self.x, self.y, self.z, energy)
    }
    /// The dot product of two [`Vec3`]s.
    pub fn dot(&self, other: &Self) -> Float {
        self.x * other.x + self.y * other.y + self.z * other.z
    }
    /// The cross product of two [`Vec3`]s.
    pub fn cross(&self, other: &Self) -> Self {
        Self::new(
            self.y * other.z - self.z * other.y,
            self.z * other.x - self.x * other.z,
            self.x * other.y - self.y * other.x,
        )
    }
    /// The squared magnitude of the [`Vec3`].
    pub fn mag2(&self) -> Float {
        self.dot(self)
    }
    /// The magnitude of the [`Vec3`].
    pub fn mag(&self) -> Float {
        Float::sqrt(self.mag2())
    }
    /// The magnitude of the component transverse to the $`z`$-axis.
    pub fn perp(&self) -> Float {
        Float::hypot(self.x, self.y)
    }
    /// The cosine of the polar angle $`\theta`$. A zero vector yields `1`.
    pub fn costheta(&self) -> Float {
        let mag = self.mag();
        if mag == 0.0 {
            1.0
        } else {
            self.z / mag
        }
    }
    /// The polar angle $`\theta`$.
    pub fn theta(&self) -> Float {
        Float::acos(self.costheta())
    }
    /// The azimuthal angle $`\phi`$ in $`(-\pi, \pi]`$.
    pub fn phi(&self) -> Float {
        Float::atan2(self.y, self.x)
    }
    /// The unit vector pointing in the direction of this [`Vec3`].
    pub fn unit(&self) -> Self {
        self / self.mag()
    }
}

impl_op_ex!(+ |a: &Vec3, b: &Vec3| -> Vec3 { Vec3::new(a.x + b.x, a.y + b.y, a.z + b.z) });
impl_op_ex!(-|a: &Vec3, b: &Vec3| -> Vec3 { Vec3::new(a.x - b.x, a.y - b.y, a.z - b.z) });
impl_op_ex!(-|a: &Vec3| -> Vec3 { Vec3::new(-a.x, -a.y, -a.z) });
impl_op_ex_commutative!(*|a: &Vec3, b: &Float| -> Vec3 { Vec3::new(a.x * b, a.y * b, a.z * b) });
impl_op_ex!(/ |a: &Vec3, b: &Float| -> Vec3 { Vec3::new(a.x / b, a.y / b, a.z / b) });

/// A four-momentum $`(p_x, p_y, p_z, E)`$ with metric signature $`(-, -, -, +)`$.
///
/// Values are immutable once built; arithmetic always produces a new [`Vec4`].
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vec4 {
    /// The $`p_x`$-component.
    pub x: Float,
    /// The $`p_y`$-component.
    pub y: Float,
    /// The $`p_z`$-component.
    pub z: Float,
    /// The energy component.
    pub t: Float,
}

impl Display for Vec4 {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}, {}, {}; {}]", self.x, self.y, self.z, self.t)
    }
}

impl Vec4 {
    /// Create a new [`Vec4`] from its Cartesian components $`(p_x, p_y, p_z, E)`$.
    pub const fn new(px: Float, py: Float, pz: Float, e: Float) -> Self {
        Self {
            x: px,
            y: py,
            z: pz,
            t: e,
        }
    }
    /// Create a new [`Vec4`] from collider coordinates: transverse momentum, pseudorapidity,
    /// azimuth and mass.
    pub fn from_pt_eta_phi_m(pt: Float, eta: Float, phi: Float, mass: Float) -> Self {
        Vec3::new(pt * Float::cos(phi), pt * Float::sin(phi), pt * Float::sinh(eta))
            .with_mass(mass)
    }
    /// The $`p_x`$-component.
    pub fn px(&self) -> Float {
        self.x
    }
    /// The $`p_y`$-component.
    pub fn py(&self) -> Float {
        self.y
    }
    /// The $`p_z`$-component (longitudinal momentum).
    pub fn pz(&self) -> Float {
        self.z
    }
    /// The energy.
    pub fn e(&self) -> Float {
        self.t
    }
    /// The three-momentum.
    pub fn vec3(&self) -> Vec3 {
        Vec3::new(self.x, self.y, self.z)
    }
    /// The transverse momentum.
    pub fn pt(&self) -> Float {
        self.vec3().perp()
    }
    /// The pseudorapidity. Vectors along the beam axis report `±1e10` (or `0` at rest).
    pub fn eta(&self) -> Float {
        let pt = self.pt();
        if pt > 0.0 {
            Float::asinh(self.z / pt)
        } else if self.z == 0.0 {
            0.0
        } else {
            BEAM_AXIS_ETA.copysign(self.z)
        }
    }
    /// The azimuthal angle $`\phi`$.
    pub fn phi(&self) -> Float {
        self.vec3().phi()
    }
    /// The cosine of the polar angle of the three-momentum.
    pub fn costheta(&self) -> Float {
        self.vec3().costheta()
    }
    /// The rapidity $`\frac{1}{2}\ln\frac{E + p_z}{E - p_z}`$, or `0` where it is undefined.
    pub fn rapidity(&self) -> Float {
        let plus = self.t + self.z;
        let minus = self.t - self.z;
        if minus > 1e-10 && plus > 0.0 {
            0.5 * Float::ln(plus / minus)
        } else {
            0.0
        }
    }
    /// The squared invariant mass $`E^2 - |\vec{p}|^2`$, which may be slightly negative.
    pub fn m2(&self) -> Float {
        self.t.powi(2) - self.vec3().mag2()
    }
    /// The invariant mass. Negative $`m^2`$ from measurement jitter is clamped to zero; a NaN
    /// component yields NaN.
    pub fn m(&self) -> Float {
        let m2 = self.m2();
        if m2 < 0.0 {
            0.0
        } else {
            Float::sqrt(m2)
        }
    }
    /// Whether every component is finite.
    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite() && self.t.is_finite()
    }
    /// The velocity $`\vec{\beta} = \vec{p}/E`$.
    pub fn beta(&self) -> Vec3 {
        self.vec3() / self.t
    }
    /// The Lorentz factor $`\gamma = E/m`$.
    pub fn gamma(&self) -> Float {
        self.t / self.m()
    }
    /// Boost the [`Vec4`] by the velocity `beta`. Boosting by `-p.beta()` moves into the rest
    /// frame of `p`.
    pub fn boost(&self, beta: &Vec3) -> Self {
        let b2 = beta.mag2();
        if b2 == 0.0 {
            return *self;
        }
        let gamma = 1.0 / Float::sqrt(1.0 - b2);
        let p3 = self.vec3();
        let bp = beta.dot(&p3);
        let p3 = p3 + beta * ((gamma - 1.0) * bp / b2 + gamma * self.t);
        p3.with_energy(gamma * (self.t + bp))
    }
    /// A compact string representation used when printing events.
    pub fn to_p4_string(&self) -> String {
        format!(
            "[e = {:.5}; p = ({:.5}, {:.5}, {:.5}); m = {:.5}]",
            self.t,
            self.x,
            self.y,
            self.z,
            self.m()
        )
    }
}

impl_op_ex!(+ |a: &Vec4, b: &Vec4| -> Vec4 { Vec4::new(a.x + b.x, a.y + b.y, a.z + b.z, a.t + b.t) });
impl_op_ex!(-|a: &Vec4, b: &Vec4| -> Vec4 { Vec4::new(a.x - b.x, a.y - b.y, a.z - b.z, a.t - b.t) });
impl_op_ex!(-|a: &Vec4| -> Vec4 { Vec4::new(-a.x, -a.y, -a.z, -a.t) });

impl Sum for Vec4 {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Vec4::default(), |acc, p4| acc + p4)
    }
}

impl<'a> Sum<&'a Vec4> for Vec4 {
    fn sum<I: Iterator<Item = &'a Vec4>>(iter: I) -> Self {
        iter.fold(Vec4::default(), |acc, p4| acc + p4)
    }
}

#[cfg(test)]
mod tests {
    use approx::{assert_abs_diff_eq, assert_relative_eq};

    use super::*;

    #[test]
    fn test_vec_sums() {
        let a = Vec3::new(1.0, 2.0, 3.0);
        let b = Vec3::new(4.0, 5.0, 6.0);
        assert_eq!(a + b, Vec3::new(5.0, 7.0, 9.0));
        let p = Vec4::new(1.0, 2.0, 3.0, 10.0);
        let q = Vec4::new(-1.0, 0.5, 2.0, 4.0);
        let total: Vec4 = [p, q].iter().sum();
        assert_eq!(total, Vec4::new(0.0, 2.5, 5.0, 14.0));
        assert_eq!(p + q, total);
    }

    #[test]
    fn test_three_to_four_momentum_conversion() {
        let p3 = Vec3::new(1.0, 2.0, 3.0);
        let target = Vec4::new(1.0, 2.0, 3.0, 10.0);
        let from_mass = p3.with_mass(target.m());
        let from_energy = p3.with_energy(target.e());
        assert_relative_eq!(from_mass.e(), target.e());
        assert_eq!(from_energy, target);
    }

    #[test]
    fn test_four_momentum_basics() {
        let p = Vec4::new(3.0, 4.0, 5.0, 10.0);
        assert_eq!(p.px(), 3.0);
        assert_eq!(p.py(), 4.0);
        assert_eq!(p.pz(), 5.0);
        assert_eq!(p.e(), 10.0);
        assert_eq!(p.vec3(), Vec3::new(3.0, 4.0, 5.0));
        assert_relative_eq!(p.pt(), 5.0);
        assert_relative_eq!(p.m2(), 50.0);
        assert_relative_eq!(p.m(), 50.0_f64.sqrt() as Float);
        assert_relative_eq!(p.gamma(), 2.0_f64.sqrt() as Float);
        let beta = p.beta();
        assert_relative_eq!(beta.x, 0.3);
        assert_relative_eq!(beta.y, 0.4);
        assert_relative_eq!(beta.z, 0.5);
    }

    #[test]
    fn test_three_momentum_basics() {
        let p = Vec3::new(3.0, 4.0, 5.0);
        let q = Vec3::new(1.2, -3.4, 7.6);
        assert_relative_eq!(p.mag(), 50.0_f64.sqrt() as Float);
        assert_relative_eq!(p.costheta(), 5.0 / 50.0_f64.sqrt() as Float);
        assert_relative_eq!(p.phi(), Float::atan2(4.0, 3.0));
        let u = p.unit();
        assert_relative_eq!(u.mag(), 1.0);
        let cross = p.cross(&q);
        assert_relative_eq!(cross.x, 47.4, epsilon = 1e-9);
        assert_relative_eq!(cross.y, -16.8, epsilon = 1e-9);
        assert_relative_eq!(cross.z, -15.0, epsilon = 1e-9);
    }

    #[test]
    fn test_collider_coordinates() {
        let p = Vec4::from_pt_eta_phi_m(45.0, 0.2, 1.1, 0.105);
        assert_relative_eq!(p.pt(), 45.0, epsilon = 1e-9);
        assert_relative_eq!(p.eta(), 0.2, epsilon = 1e-9);
        assert_relative_eq!(p.phi(), 1.1, epsilon = 1e-9);
        assert_relative_eq!(p.m(), 0.105, epsilon = 1e-6);
    }

    #[test]
    fn test_beam_axis_pseudorapidity() {
        assert_eq!(Vec4::new(0.0, 0.0, 3.0, 5.0).eta(), 1e10);
        assert_eq!(Vec4::new(0.0, 0.0, -3.0, 5.0).eta(), -1e10);
        assert_eq!(Vec4::new(0.0, 0.0, 0.0, 5.0).eta(), 0.0);
    }

    #[test]
    fn test_mass_clamped_for_spacelike_jitter() {
        let p = Vec4::new(3.0, 4.0, 0.0, 5.0 - 1e-9);
        assert!(p.m2() < 0.0);
        assert_eq!(p.m(), 0.0);
    }

    #[test]
    fn test_mass_propagates_nan() {
        let p = Vec4::new(Float::NAN, 1.0, 2.0, Float::NAN);
        assert!(p.m().is_nan());
        assert!(!p.is_finite());
        assert!(Vec4::new(1.0, 2.0, 3.0, 10.0).is_finite());
        let nu = Vec3::new(30.0, 10.0, Float::NAN).with_mass(0.0);
        assert!((Vec4::new(10.0, 0.0, 5.0, 20.0) + nu).m().is_nan());
    }

    #[test]
    fn test_rapidity() {
        let p = Vec4::new(1.0, 0.0, 3.0, 5.0);
        assert_relative_eq!(p.rapidity(), 0.5 * Float::ln(8.0 / 2.0));
        assert_eq!(Vec4::new(0.0, 0.0, 5.0, 5.0).rapidity(), 0.0);
    }

    #[test]
    fn test_boost_com() {
        let p = Vec4::new(3.0, 4.0, 5.0, 10.0);
        let rest = p.boost(&-p.beta());
        assert_abs_diff_eq!(rest.px(), 0.0, epsilon = 1e-12);
        assert_abs_diff_eq!(rest.py(), 0.0, epsilon = 1e-12);
        assert_abs_diff_eq!(rest.pz(), 0.0, epsilon = 1e-12);
        assert_relative_eq!(rest.e(), p.m(), epsilon = 1e-12);
    }

    #[test]
    fn test_boost() {
        let pa = Vec4::new(3.0, 4.0, 5.0, 10.0);
        let pb = Vec4::new(3.4, 2.3, 1.2, 9.0);
        let boosted = pa.boost(&-pb.beta());
        assert_relative_eq!(boosted.e(), 8.157632144622882, epsilon = 1e-9);
        assert_relative_eq!(boosted.px(), -0.6489200627053444, epsilon = 1e-9);
        assert_relative_eq!(boosted.py(), 1.5316128987581492, epsilon = 1e-9);
        assert_relative_eq!(boosted.pz(), 3.712145860221643, epsilon = 1e-9);
        assert_relative_eq!(boosted.m(), pa.m(), epsilon = 1e-9);
    }

    #[test]
    fn test_zero_boost_is_identity() {
        let p = Vec4::new(3.0, 4.0, 5.0, 10.0);
        assert_eq!(p.boost(&Vec3::default()), p);
    }
}
