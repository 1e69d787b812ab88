//! Optical Element Catalog
//!
//! Closed set of tile kinds. Every kind knows how many orientations it has
//! and builds the transition tensor for each of them; sources additionally
//! generate the initial photon state.

use num_complex::Complex64;
use serde::{Deserialize, Serialize};
use std::f64::consts::FRAC_PI_4;

use crate::basis::{BasisLabel, Direction, Polarization};
use crate::tensor::{half_amplitude, polarization, DirectionTable, PolarizationOp, TransitionTensor};

/// Physical character of an element.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ElementClass {
    /// Preserves probability on every label.
    Unitary,
    /// Loses part of the probability on at least some labels.
    Absorptive,
    /// Emits the photon.
    Source,
    /// Absorbs everything; the absorbed probability is the detection result.
    Detector,
}

/// One seed of the initial state produced by a source.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Emission {
    pub label: BasisLabel,
    pub amplitude: Complex64,
}

/// Element kinds that can occupy a tile.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Element {
    Vacuum,
    Source,
    CornerCube,
    ThinMirror,
    ThinSplitter,
    PolarizingSplitter,
    PolarizerNS,
    PolarizerWE,
    QuarterWavePlateNS,
    QuarterWavePlateWE,
    SugarSolution,
    FaradayRotator,
    Glass,
    VacuumJar,
    Absorber,
    Rock,
    Detector,
    Mine,
}

impl Element {
    pub const ALL: [Element; 18] = [
        Element::Vacuum,
        Element::Source,
        Element::CornerCube,
        Element::ThinMirror,
        Element::ThinSplitter,
        Element::PolarizingSplitter,
        Element::PolarizerNS,
        Element::PolarizerWE,
        Element::QuarterWavePlateNS,
        Element::QuarterWavePlateWE,
        Element::SugarSolution,
        Element::FaradayRotator,
        Element::Glass,
        Element::VacuumJar,
        Element::Absorber,
        Element::Rock,
        Element::Detector,
        Element::Mine,
    ];

    /// Name used by level recipes.
    pub fn name(self) -> &'static str {
        match self {
            Element::Vacuum => "Vacuum",
            Element::Source => "Source",
            Element::CornerCube => "CornerCube",
            Element::ThinMirror => "ThinMirror",
            Element::ThinSplitter => "ThinSplitter",
            Element::PolarizingSplitter => "PolarizingSplitter",
            Element::PolarizerNS => "PolarizerNS",
            Element::PolarizerWE => "PolarizerWE",
            Element::QuarterWavePlateNS => "QuarterWavePlateNS",
            Element::QuarterWavePlateWE => "QuarterWavePlateWE",
            Element::SugarSolution => "SugarSolution",
            Element::FaradayRotator => "FaradayRotator",
            Element::Glass => "Glass",
            Element::VacuumJar => "VacuumJar",
            Element::Absorber => "Absorber",
            Element::Rock => "Rock",
            Element::Detector => "Detector",
            Element::Mine => "Mine",
        }
    }

    pub fn from_name(name: &str) -> Option<Element> {
        Self::ALL.iter().copied().find(|e| e.name() == name)
    }

    pub fn class(self) -> ElementClass {
        match self {
            Element::Source => ElementClass::Source,
            Element::Detector | Element::Mine => ElementClass::Detector,
            Element::PolarizerNS
            | Element::PolarizerWE
            | Element::FaradayRotator
            | Element::Absorber
            | Element::Rock => ElementClass::Absorptive,
            _ => ElementClass::Unitary,
        }
    }

    /// Number of distinct orientations.
    pub fn max_rotation(self) -> usize {
        match self {
            Element::Source
            | Element::ThinMirror
            | Element::ThinSplitter
            | Element::PolarizerNS
            | Element::PolarizerWE
            | Element::QuarterWavePlateNS
            | Element::QuarterWavePlateWE
            | Element::FaradayRotator => 4,
            Element::PolarizingSplitter => 2,
            _ => 1,
        }
    }

    /// Angle in degrees between consecutive orientations.
    pub fn rotation_angle(self) -> f64 {
        match self {
            Element::ThinMirror
            | Element::ThinSplitter
            | Element::PolarizerNS
            | Element::PolarizerWE
            | Element::QuarterWavePlateNS
            | Element::QuarterWavePlateWE => 45.0,
            Element::Source | Element::PolarizingSplitter | Element::FaradayRotator => 90.0,
            _ => 0.0,
        }
    }

    pub fn has_emission(self) -> bool {
        self.class() == ElementClass::Source
    }

    pub fn is_absorptive(self) -> bool {
        matches!(
            self.class(),
            ElementClass::Absorptive | ElementClass::Detector
        )
    }

    /// Initial state generated by a source in the given orientation.
    ///
    /// Returns `None` for elements that do not emit.
    pub fn emission(self, rotation: usize) -> Option<Vec<Emission>> {
        self.check_rotation(rotation);
        match self {
            Element::Source => Some(vec![Emission {
                label: BasisLabel::new(Direction::East.rotated(rotation), Polarization::H),
                amplitude: Complex64::new(1.0, 0.0),
            }]),
            _ => None,
        }
    }

    /// Transition tensor for the given orientation.
    ///
    /// # Panics
    ///
    /// If `rotation >= self.max_rotation()`.
    pub fn tensor(self, rotation: usize) -> TransitionTensor {
        self.check_rotation(rotation);
        let one = Complex64::new(1.0, 0.0);
        let axis_angle = rotation as f64 * FRAC_PI_4;

        match self {
            // A photon coming back into its source cell passes through.
            Element::Vacuum | Element::Source => TransitionTensor::identity(),
            Element::CornerCube => {
                let table = Direction::ALL
                    .iter()
                    .fold(DirectionTable::new(), |t, &d| t.with(d, d.reversed(), one));
                TransitionTensor::product(&table, &polarization::identity())
            }
            Element::ThinMirror => thin_element(rotation, one, Complex64::new(0.0, 0.0)),
            Element::ThinSplitter => thin_element(
                rotation,
                Complex64::new(0.0, std::f64::consts::FRAC_1_SQRT_2),
                half_amplitude(),
            ),
            Element::PolarizingSplitter => {
                let reflected = TransitionTensor::product(
                    &diagonal_reflections(one),
                    &polarization::select(Polarization::H),
                );
                let transmitted = TransitionTensor::product(
                    &DirectionTable::straight(),
                    &polarization::select(Polarization::V),
                );
                reflected.sum(&transmitted).rotated(rotation)
            }
            Element::PolarizerNS => across_axis(
                &[Direction::North, Direction::South],
                polarization::projector(axis_angle),
            ),
            Element::PolarizerWE => across_axis(
                &[Direction::East, Direction::West],
                polarization::projector(axis_angle),
            ),
            Element::QuarterWavePlateNS => across_axis(
                &[Direction::North, Direction::South],
                polarization::quarter_wave(axis_angle),
            ),
            Element::QuarterWavePlateWE => across_axis(
                &[Direction::East, Direction::West],
                polarization::quarter_wave(axis_angle),
            ),
            Element::SugarSolution => TransitionTensor::product(
                &DirectionTable::straight(),
                &polarization::rotation(FRAC_PI_4),
            ),
            Element::FaradayRotator => TransitionTensor::product(
                &DirectionTable::straight_along(&[Direction::East, Direction::West]),
                &polarization::rotation(FRAC_PI_4),
            )
            .rotated(rotation),
            Element::Glass => TransitionTensor::scalar(Complex64::i()),
            Element::VacuumJar => TransitionTensor::scalar(-Complex64::i()),
            Element::Absorber => TransitionTensor::scalar(half_amplitude()),
            Element::Rock | Element::Detector | Element::Mine => TransitionTensor::zero(),
        }
    }

    fn check_rotation(self, rotation: usize) {
        assert!(
            rotation < self.max_rotation(),
            "rotation {} out of range for {} (max {})",
            rotation,
            self.name(),
            self.max_rotation()
        );
    }
}

/// `/`-shaped reflections: E↔N and W↔S.
fn diagonal_reflections(coeff: Complex64) -> DirectionTable {
    use Direction::*;
    DirectionTable::new()
        .with(East, North, coeff)
        .with(North, East, coeff)
        .with(West, South, coeff)
        .with(South, West, coeff)
}

/// Thin two-sided mirror or splitter in one of four 45° orientations
/// (`-`, `/`, `|`, `\`). Reflected paths pick up the reflection phase;
/// beams hitting the element edge-on pass untouched.
fn thin_element(rotation: usize, reflect: Complex64, transmit: Complex64) -> TransitionTensor {
    use Direction::*;
    let one = Complex64::new(1.0, 0.0);

    let (reflected, transmitted) = if rotation % 2 == 1 {
        let straight = [East, North, West, South]
            .iter()
            .fold(DirectionTable::new(), |t, &d| t.with(d, d, transmit));
        (diagonal_reflections(reflect), straight)
    } else {
        let reflected = DirectionTable::new()
            .with(North, South, reflect)
            .with(South, North, reflect);
        let straight = DirectionTable::new()
            .with(North, North, transmit)
            .with(South, South, transmit)
            .with(East, East, one)
            .with(West, West, one);
        (reflected, straight)
    };

    TransitionTensor::product(&reflected, &polarization::sign_flip())
        .sum(&TransitionTensor::product(&transmitted, &polarization::identity()))
        .rotated(rotation / 2)
}

/// Plate crossed by beams along `axis`, acting on their polarization with
/// `op`; beams along the other axis graze it unchanged.
fn across_axis(axis: &[Direction], op: PolarizationOp) -> TransitionTensor {
    let grazing: Vec<Direction> = Direction::ALL
        .iter()
        .copied()
        .filter(|d| !axis.contains(d))
        .collect();

    TransitionTensor::product(&DirectionTable::straight_along(axis), &op).sum(
        &TransitionTensor::product(
            &DirectionTable::straight_along(&grazing),
            &polarization::identity(),
        ),
    )
}
