//! Transition tensors
//!
//! Sparse single-tile scattering maps. Each element orientation is one
//! tensor: an input basis label maps to a short, ordered list of output
//! labels with complex coefficients. Tensors are assembled as an outer
//! product of a direction-only table and a 2×2 polarization operator.

use ndarray::{arr2, Array1, Array2};
use num_complex::Complex64;
use rand::Rng;
use rand_distr::StandardNormal;
use std::f64::consts::FRAC_1_SQRT_2;

use crate::basis::{BasisLabel, Direction, Polarization};

/// Coefficients whose squared magnitude is below this are dropped while
/// building tensors (e.g. `cos(π/2)` leftovers).
const COEFF_FLOOR: f64 = 1e-24;

/// 2×2 polarization operator, indexed `[out, in]` with H = 0, V = 1.
pub type PolarizationOp = Array2<Complex64>;

/// Polarization operators used by the element catalog.
pub mod polarization {
    use super::*;

    fn real(m: [[f64; 2]; 2]) -> PolarizationOp {
        arr2(&m).mapv(|x| Complex64::new(x, 0.0))
    }

    /// Pass-through.
    pub fn identity() -> PolarizationOp {
        real([[1.0, 0.0], [0.0, 1.0]])
    }

    /// Reflection phase: the horizontal component changes sign.
    pub fn sign_flip() -> PolarizationOp {
        real([[-1.0, 0.0], [0.0, 1.0]])
    }

    /// Rotate the polarization plane by `angle` radians.
    pub fn rotation(angle: f64) -> PolarizationOp {
        let (s, c) = angle.sin_cos();
        real([[c, -s], [s, c]])
    }

    /// Projector onto the linear axis at `angle` from horizontal.
    pub fn projector(angle: f64) -> PolarizationOp {
        let (s, c) = angle.sin_cos();
        real([[c * c, c * s], [c * s, s * s]])
    }

    /// Keep only one polarization.
    pub fn select(pol: Polarization) -> PolarizationOp {
        match pol {
            Polarization::H => real([[1.0, 0.0], [0.0, 0.0]]),
            Polarization::V => real([[0.0, 0.0], [0.0, 1.0]]),
        }
    }

    /// Quarter wave plate with its fast axis at `angle` from horizontal:
    /// `R(θ) · diag(1, i) · R(-θ)`.
    pub fn quarter_wave(angle: f64) -> PolarizationOp {
        let mut retarder = identity();
        retarder[[1, 1]] = Complex64::i();
        rotation(angle).dot(&retarder).dot(&rotation(-angle))
    }
}

/// Direction-only scattering table: for each incoming direction, the
/// outgoing directions and their coefficients.
#[derive(Clone, Debug, Default)]
pub struct DirectionTable {
    entries: [Vec<(Direction, Complex64)>; 4],
}

impl DirectionTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a `from → to` path with coefficient `coeff`.
    pub fn with(mut self, from: Direction, to: Direction, coeff: Complex64) -> Self {
        self.entries[from.index()].push((to, coeff));
        self
    }

    /// Every direction goes straight through.
    pub fn straight() -> Self {
        Direction::ALL
            .iter()
            .fold(Self::new(), |t, &d| t.with(d, d, Complex64::new(1.0, 0.0)))
    }

    /// Only the given directions go straight through; the rest are blocked.
    pub fn straight_along(directions: &[Direction]) -> Self {
        directions
            .iter()
            .fold(Self::new(), |t, &d| t.with(d, d, Complex64::new(1.0, 0.0)))
    }

    pub fn get(&self, from: Direction) -> &[(Direction, Complex64)] {
        &self.entries[from.index()]
    }
}

/// One output of a tensor column.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Transition {
    pub to: BasisLabel,
    pub amplitude: Complex64,
}

/// Sparse 8×8 complex scattering matrix for one element orientation.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TransitionTensor {
    outputs: [Vec<Transition>; BasisLabel::COUNT],
}

impl TransitionTensor {
    /// Blocks everything.
    pub fn zero() -> Self {
        Self::default()
    }

    /// Leaves every label untouched.
    pub fn identity() -> Self {
        Self::scalar(Complex64::new(1.0, 0.0))
    }

    /// Identity times a complex factor.
    pub fn scalar(factor: Complex64) -> Self {
        let mut tensor = Self::zero();
        for label in BasisLabel::all() {
            tensor.push(label, label, factor);
        }
        tensor
    }

    /// Outer product of a direction table and a polarization operator.
    pub fn product(directions: &DirectionTable, pol: &PolarizationOp) -> Self {
        assert_eq!(pol.shape(), &[2, 2]);

        let mut tensor = Self::zero();
        for from_dir in Direction::ALL {
            for &(to_dir, coeff) in directions.get(from_dir) {
                for p_in in Polarization::ALL {
                    for p_out in Polarization::ALL {
                        let c = coeff * pol[[p_out.index(), p_in.index()]];
                        tensor.push(
                            BasisLabel::new(from_dir, p_in),
                            BasisLabel::new(to_dir, p_out),
                            c,
                        );
                    }
                }
            }
        }
        tensor
    }

    /// Element-wise sum of two tensors.
    pub fn sum(mut self, other: &TransitionTensor) -> Self {
        for from in BasisLabel::all() {
            for t in other.outputs(from) {
                self.push(from, t.to, t.amplitude);
            }
        }
        self
    }

    /// Turn the whole tensor counter-clockwise by `quarter_turns` × 90°,
    /// permuting directions on both the input and output side.
    pub fn rotated(&self, quarter_turns: usize) -> Self {
        let mut tensor = Self::zero();
        for from in BasisLabel::all() {
            for t in self.outputs(from) {
                tensor.push(
                    from.rotated(quarter_turns),
                    t.to.rotated(quarter_turns),
                    t.amplitude,
                );
            }
        }
        tensor
    }

    fn push(&mut self, from: BasisLabel, to: BasisLabel, amplitude: Complex64) {
        let column = &mut self.outputs[from.index()];
        match column.iter().position(|t| t.to == to) {
            Some(pos) => {
                column[pos].amplitude += amplitude;
                if column[pos].amplitude.norm_sqr() < COEFF_FLOOR {
                    column.remove(pos);
                }
            }
            None => {
                if amplitude.norm_sqr() < COEFF_FLOOR {
                    return;
                }
                column.push(Transition { to, amplitude });
                column.sort_by_key(|t| t.to.index());
            }
        }
    }

    /// Outputs for one incoming label, ordered by output label.
    #[inline]
    pub fn outputs(&self, from: BasisLabel) -> &[Transition] {
        &self.outputs[from.index()]
    }

    /// Probability kept by the element for a photon arriving in `from`.
    pub fn retained(&self, from: BasisLabel) -> f64 {
        self.outputs(from)
            .iter()
            .map(|t| t.amplitude.norm_sqr())
            .sum()
    }

    /// Dense matrix, indexed `[out, in]`.
    pub fn to_matrix(&self) -> Array2<Complex64> {
        let mut m = Array2::zeros((BasisLabel::COUNT, BasisLabel::COUNT));
        for from in BasisLabel::all() {
            for t in self.outputs(from) {
                m[[t.to.index(), from.index()]] = t.amplitude;
            }
        }
        m
    }

    /// Apply the dense matrix to a full 8-component state.
    pub fn apply_dense(&self, input: &Array1<Complex64>) -> Array1<Complex64> {
        self.to_matrix().dot(input)
    }

    /// Check `U†·U = I` within `tolerance`.
    pub fn is_unitary(&self, tolerance: f64) -> bool {
        let u = self.to_matrix();
        let u_h = u.t().mapv(|x| x.conj());
        let product = u_h.dot(&u);

        (0..BasisLabel::COUNT).all(|i| {
            (0..BasisLabel::COUNT).all(|j| {
                let expected = if i == j { 1.0 } else { 0.0 };
                (product[[i, j]] - Complex64::new(expected, 0.0)).norm() < tolerance
            })
        })
    }

    pub fn is_identity(&self, tolerance: f64) -> bool {
        BasisLabel::all().all(|from| match self.outputs(from) {
            [t] => t.to == from && (t.amplitude - Complex64::new(1.0, 0.0)).norm() < tolerance,
            _ => false,
        })
    }

    /// Probability remaining after applying the tensor to a random unit
    /// vector supported on `subspace`.
    pub fn retained_fraction<R: Rng>(&self, subspace: &[BasisLabel], rng: &mut R) -> f64 {
        let mut input: Array1<Complex64> = Array1::zeros(BasisLabel::COUNT);
        for label in subspace {
            input[label.index()] = Complex64::new(rng.sample(StandardNormal), rng.sample(StandardNormal));
        }

        let norm: f64 = input.iter().map(|x| x.norm_sqr()).sum();
        if norm == 0.0 {
            return 0.0;
        }

        let output = self.apply_dense(&input);
        output.iter().map(|x| x.norm_sqr()).sum::<f64>() / norm
    }
}

/// Amplitude `1/√2`, the 50/50 splitting coefficient.
#[inline]
pub fn half_amplitude() -> Complex64 {
    Complex64::new(FRAC_1_SQRT_2, 0.0)
}
