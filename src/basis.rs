//! Basis labels and amplitude helpers
//!
//! A photon state on a single tile lives in an 8-dimensional space spanned by
//! four momentum directions times two linear polarizations.

use num_complex::Complex64;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Probability amplitude. `norm_sqr()` is the probability.
pub type Amplitude = Complex64;

/// Default numerical noise floor for probabilities.
pub const EPSILON: f64 = 1e-5;

/// Compare two amplitudes within a tolerance on both components.
#[inline]
pub fn approx_eq(a: Amplitude, b: Amplitude, tolerance: f64) -> bool {
    (a.re - b.re).abs() <= tolerance && (a.im - b.im).abs() <= tolerance
}

/// Momentum direction, listed in counter-clockwise order starting east.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Direction {
    East,
    North,
    West,
    South,
}

impl Direction {
    pub const ALL: [Direction; 4] = [
        Direction::East,
        Direction::North,
        Direction::West,
        Direction::South,
    ];

    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    #[inline]
    pub fn from_index(idx: usize) -> Self {
        Self::ALL[idx % 4]
    }

    /// Turn counter-clockwise by `quarter_turns` × 90°.
    #[inline]
    pub fn rotated(self, quarter_turns: usize) -> Self {
        Self::from_index(self.index() + quarter_turns)
    }

    pub fn reversed(self) -> Self {
        self.rotated(2)
    }

    /// Unit cell displacement (di, dj). Rows grow downwards, so north is -j.
    #[inline]
    pub fn velocity(self) -> (i32, i32) {
        match self {
            Direction::East => (1, 0),
            Direction::North => (0, -1),
            Direction::West => (-1, 0),
            Direction::South => (0, 1),
        }
    }

    /// True for the west-east axis.
    pub fn is_horizontal(self) -> bool {
        matches!(self, Direction::East | Direction::West)
    }

    fn arrow(self) -> char {
        match self {
            Direction::East => '>',
            Direction::North => '^',
            Direction::West => '<',
            Direction::South => 'v',
        }
    }
}

/// Linear polarization: horizontal (`-`) or vertical (`|`).
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Polarization {
    H,
    V,
}

impl Polarization {
    pub const ALL: [Polarization; 2] = [Polarization::H, Polarization::V];

    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    #[inline]
    pub fn from_index(idx: usize) -> Self {
        Self::ALL[idx % 2]
    }
}

/// One of the 8 single-tile basis states.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct BasisLabel {
    pub direction: Direction,
    pub polarization: Polarization,
}

impl BasisLabel {
    pub const COUNT: usize = 8;

    pub const fn new(direction: Direction, polarization: Polarization) -> Self {
        Self {
            direction,
            polarization,
        }
    }

    /// Dense index in 0..8, direction-major.
    #[inline]
    pub fn index(self) -> usize {
        2 * self.direction.index() + self.polarization.index()
    }

    #[inline]
    pub fn from_index(idx: usize) -> Self {
        assert!(idx < Self::COUNT, "basis index {} out of range", idx);
        Self::new(Direction::from_index(idx / 2), Polarization::from_index(idx % 2))
    }

    pub fn all() -> impl Iterator<Item = BasisLabel> {
        (0..Self::COUNT).map(Self::from_index)
    }

    /// Labels whose direction lies on the west-east axis.
    pub fn horizontal() -> Vec<BasisLabel> {
        Self::all().filter(|l| l.direction.is_horizontal()).collect()
    }

    /// Labels whose direction lies on the north-south axis.
    pub fn vertical() -> Vec<BasisLabel> {
        Self::all().filter(|l| !l.direction.is_horizontal()).collect()
    }

    /// Same polarization, direction turned by `quarter_turns`.
    #[inline]
    pub fn rotated(self, quarter_turns: usize) -> Self {
        Self::new(self.direction.rotated(quarter_turns), self.polarization)
    }
}

impl fmt::Display for BasisLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let pol = match self.polarization {
            Polarization::H => '-',
            Polarization::V => '|',
        };
        write!(f, "{}{}", self.direction.arrow(), pol)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_label_index_roundtrip() {
        for idx in 0..BasisLabel::COUNT {
            assert_eq!(BasisLabel::from_index(idx).index(), idx);
        }
        assert_eq!(BasisLabel::all().count(), 8);
    }

    #[test]
    fn test_quarter_turns_cycle() {
        let label = BasisLabel::new(Direction::East, Polarization::V);
        assert_eq!(label.rotated(1).direction, Direction::North);
        assert_eq!(label.rotated(4), label);
        assert_eq!(label.rotated(3).polarization, Polarization::V);
    }

    #[test]
    fn test_velocity_opposites_cancel() {
        for d in Direction::ALL {
            let (a, b) = d.velocity();
            let (c, e) = d.reversed().velocity();
            assert_eq!((a + c, b + e), (0, 0));
        }
    }

    #[test]
    fn test_display_arrows() {
        let label = BasisLabel::new(Direction::South, Polarization::H);
        assert_eq!(label.to_string(), "v-");
    }
}
