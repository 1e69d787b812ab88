//! Quantum Walk Simulation
//!
//! Step-by-step evolution of a single photon over a [`TileGrid`]. Each step
//! displaces every amplitude by one cell along its direction, records the
//! probability the destination element absorbs, and scatters the amplitude
//! through the destination's transition tensor. Amplitudes landing in the
//! same (cell, label) bin interfere.

use ndarray::Array2;
use num_complex::Complex64;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use tracing::{debug, info, trace};

use crate::basis::{BasisLabel, EPSILON};
use crate::error::{Error, Result};
use crate::grid::TileGrid;
use crate::tensor::TransitionTensor;

/// Run parameters.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Safety bound on steps taken by [`Simulation::propagate_to_end`].
    pub max_iterations: usize,
    /// Probability noise floor; smaller bins are dropped.
    pub epsilon: f64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            max_iterations: 1000,
            epsilon: EPSILON,
        }
    }
}

/// Why a run stopped.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Termination {
    /// All remaining probability fell below the noise floor.
    Exhausted,
    /// `max_iterations` steps were taken with amplitude still on the board.
    IterationCap,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SimulationState {
    Uninitialized,
    Ready,
    Running,
    Terminated(Termination),
}

/// Amplitude of the photon being at cell `(i, j)` in basis state `label`.
///
/// Coordinates are signed: a displaced entry may sit just outside the board.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AmplitudeEntry {
    pub i: i32,
    pub j: i32,
    pub label: BasisLabel,
    pub amplitude: Complex64,
}

impl AmplitudeEntry {
    pub fn new(i: i32, j: i32, label: BasisLabel, amplitude: Complex64) -> Self {
        Self {
            i,
            j,
            label,
            amplitude,
        }
    }

    #[inline]
    pub fn key(&self) -> (i32, i32, BasisLabel) {
        (self.i, self.j, self.label)
    }

    #[inline]
    pub fn probability(&self) -> f64 {
        self.amplitude.norm_sqr()
    }
}

impl fmt::Display for AmplitudeEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "({},{}) {} {:+.3}{:+.3}i",
            self.i, self.j, self.label, self.amplitude.re, self.amplitude.im
        )
    }
}

/// Full state at one step, sorted by `(i, j, label)` with unique keys.
pub type Snapshot = Vec<AmplitudeEntry>;

/// Where absorbed probability went.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum AbsorptionSite {
    Cell(usize, usize),
    /// Left the board through the open boundary.
    Leak,
}

/// Probability absorbed from one displaced entry during one step.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Absorption {
    pub site: AbsorptionSite,
    pub label: BasisLabel,
    pub probability: f64,
}

/// Cumulative absorbed probability per cell, plus the leak bucket.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MeasurementRecord {
    absorbed: BTreeMap<(usize, usize), f64>,
    leaked: f64,
}

impl MeasurementRecord {
    pub fn record(&mut self, absorption: &Absorption) {
        match absorption.site {
            AbsorptionSite::Cell(i, j) => {
                *self.absorbed.entry((i, j)).or_insert(0.0) += absorption.probability;
            }
            AbsorptionSite::Leak => self.leaked += absorption.probability,
        }
    }

    pub fn absorbed_at(&self, i: usize, j: usize) -> f64 {
        self.absorbed.get(&(i, j)).copied().unwrap_or(0.0)
    }

    /// Probability that left the board.
    pub fn leaked(&self) -> f64 {
        self.leaked
    }

    /// Everything absorbed on the board or leaked.
    pub fn total(&self) -> f64 {
        self.absorbed.values().sum::<f64>() + self.leaked
    }

    /// Cells with a non-zero record, in cell order.
    pub fn cells(&self) -> impl Iterator<Item = ((usize, usize), f64)> + '_ {
        self.absorbed.iter().map(|(&cell, &p)| (cell, p))
    }
}

/// Quantum walk over a borrowed board.
///
/// The board stays immutably borrowed for the lifetime of the simulation,
/// so it cannot change during a run.
pub struct Simulation<'a> {
    grid: &'a TileGrid,
    config: SimulationConfig,
    tensors: Array2<TransitionTensor>,
    state: SimulationState,
    history: Vec<Snapshot>,
    measurement: MeasurementRecord,
    measurement_history: Vec<Vec<Absorption>>,
}

impl<'a> Simulation<'a> {
    /// Create a simulation and resolve every cell's transition tensor.
    pub fn new(grid: &'a TileGrid, config: SimulationConfig) -> Self {
        let tensors = Array2::from_shape_fn((grid.width(), grid.height()), |(i, j)| {
            let tile = grid.get(i, j).copied().unwrap_or_default();
            tile.element.tensor(tile.rotation)
        });

        Self {
            grid,
            config,
            tensors,
            state: SimulationState::Uninitialized,
            history: Vec::new(),
            measurement: MeasurementRecord::default(),
            measurement_history: Vec::new(),
        }
    }

    pub fn grid(&self) -> &TileGrid {
        self.grid
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    pub fn state(&self) -> SimulationState {
        self.state
    }

    pub fn termination(&self) -> Option<Termination> {
        match self.state {
            SimulationState::Terminated(t) => Some(t),
            _ => None,
        }
    }

    /// All snapshots so far; index 0 is the emission.
    pub fn history(&self) -> &[Snapshot] {
        &self.history
    }

    pub fn latest(&self) -> Option<&Snapshot> {
        self.history.last()
    }

    pub fn measurement(&self) -> &MeasurementRecord {
        &self.measurement
    }

    /// Absorption events of each step; entry `k` belongs to history step `k + 1`.
    pub fn measurement_history(&self) -> &[Vec<Absorption>] {
        &self.measurement_history
    }

    /// Reset the run to the emission of the single source on the board.
    pub fn initialize(&mut self) -> Result<&Snapshot> {
        self.history.clear();
        self.measurement = MeasurementRecord::default();
        self.measurement_history.clear();
        self.state = SimulationState::Uninitialized;

        let grid = self.grid;
        let sources: Vec<_> = grid
            .cells()
            .filter(|(_, tile)| tile.element.has_emission())
            .collect();

        let ((i, j), tile) = match sources.as_slice() {
            [] => return Err(Error::NoSource),
            [single] => *single,
            _ => {
                return Err(Error::MultipleSources {
                    count: sources.len(),
                })
            }
        };

        let seeds = tile.element.emission(tile.rotation).unwrap_or_default();
        let probability: f64 = seeds.iter().map(|s| s.amplitude.norm_sqr()).sum();
        if (probability - 1.0).abs() > self.config.epsilon {
            return Err(Error::EmissionNotNormalized { probability });
        }

        let mut bins = BTreeMap::new();
        for seed in &seeds {
            *bins
                .entry((i as i32, j as i32, seed.label))
                .or_insert_with(|| Complex64::new(0.0, 0.0)) += seed.amplitude;
        }
        let emission = Self::collect_bins(bins, 0.0);

        info!(source = ?(i, j), seeds = emission.len(), "simulation initialized");
        self.history.push(emission);
        self.state = SimulationState::Ready;

        Ok(&self.history[0])
    }

    /// Advance one step and return the new snapshot.
    pub fn propagate(&mut self) -> Result<&Snapshot> {
        if !matches!(self.state, SimulationState::Ready | SimulationState::Running) {
            return Err(self.invalid_state("propagate"));
        }

        let displaced = match self.history.last() {
            Some(last) => Self::displace(last),
            None => return Err(self.invalid_state("propagate")),
        };

        let absorptions = self.absorb(&displaced);
        for absorption in &absorptions {
            self.measurement.record(absorption);
        }

        let snapshot = self.interact(&displaced);

        let step = self.history.len();
        debug!(
            step,
            entries = snapshot.len(),
            probability = Self::total_probability(&snapshot),
            absorbed = absorptions.iter().map(|a| a.probability).sum::<f64>(),
            "step propagated"
        );
        trace!(step, state = %describe(&snapshot), "snapshot");

        self.measurement_history.push(absorptions);
        self.history.push(snapshot);
        self.state = SimulationState::Running;

        Ok(&self.history[step])
    }

    /// Propagate until the board is empty or the iteration cap is hit.
    pub fn propagate_to_end(&mut self) -> Result<Termination> {
        let mut termination = Termination::IterationCap;

        for _ in 0..self.config.max_iterations {
            if self.propagate()?.is_empty() {
                termination = Termination::Exhausted;
                break;
            }
        }

        self.state = SimulationState::Terminated(termination);
        info!(
            steps = self.history.len().saturating_sub(1),
            ?termination,
            absorbed = self.measurement.total(),
            "simulation terminated"
        );

        Ok(termination)
    }

    /// Move every entry one cell along its direction.
    pub fn displace(snapshot: &[AmplitudeEntry]) -> Snapshot {
        snapshot
            .iter()
            .map(|entry| {
                let (di, dj) = entry.label.direction.velocity();
                AmplitudeEntry {
                    i: entry.i + di,
                    j: entry.j + dj,
                    ..*entry
                }
            })
            .collect()
    }

    /// Probability each displaced entry loses at its destination.
    ///
    /// Off-board entries lose everything into the leak bucket. Events below
    /// the noise floor are dropped.
    pub fn absorb(&self, displaced: &[AmplitudeEntry]) -> Vec<Absorption> {
        displaced
            .iter()
            .map(|entry| {
                let (site, lost) = match self.tensor_at(entry.i, entry.j) {
                    Some(tensor) => (
                        AbsorptionSite::Cell(entry.i as usize, entry.j as usize),
                        1.0 - tensor.retained(entry.label),
                    ),
                    None => (AbsorptionSite::Leak, 1.0),
                };
                Absorption {
                    site,
                    label: entry.label,
                    probability: lost * entry.probability(),
                }
            })
            .filter(|a| a.probability > self.config.epsilon)
            .collect()
    }

    /// Scatter displaced entries through their destination tensors and sum
    /// amplitudes sharing a (cell, label) bin.
    pub fn interact(&self, displaced: &[AmplitudeEntry]) -> Snapshot {
        let mut bins: BTreeMap<(i32, i32, BasisLabel), Complex64> = BTreeMap::new();

        for entry in displaced {
            let tensor = match self.tensor_at(entry.i, entry.j) {
                Some(t) => t,
                None => continue,
            };
            for transition in tensor.outputs(entry.label) {
                *bins
                    .entry((entry.i, entry.j, transition.to))
                    .or_insert_with(|| Complex64::new(0.0, 0.0)) +=
                    entry.amplitude * transition.amplitude;
            }
        }

        Self::collect_bins(bins, self.config.epsilon)
    }

    /// Total probability still on the board in a snapshot.
    pub fn total_probability(snapshot: &[AmplitudeEntry]) -> f64 {
        snapshot.iter().map(|e| e.probability()).sum()
    }

    fn tensor_at(&self, i: i32, j: i32) -> Option<&TransitionTensor> {
        if self.grid.contains(i, j) {
            self.tensors.get((i as usize, j as usize))
        } else {
            None
        }
    }

    fn collect_bins(bins: BTreeMap<(i32, i32, BasisLabel), Complex64>, epsilon: f64) -> Snapshot {
        bins.into_iter()
            .filter(|(_, amplitude)| amplitude.norm_sqr() >= epsilon)
            .map(|((i, j, label), amplitude)| AmplitudeEntry::new(i, j, label, amplitude))
            .collect()
    }

    fn invalid_state(&self, operation: &'static str) -> Error {
        Error::InvalidState {
            operation,
            state: self.state,
        }
    }
}

/// One-line rendering of a snapshot for logs.
pub fn describe(snapshot: &[AmplitudeEntry]) -> String {
    snapshot
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::basis::{approx_eq, Direction, Polarization};
    use crate::element::Element;
    use crate::grid::Tile;
    use std::f64::consts::FRAC_1_SQRT_2;

    fn source(rotation: usize) -> Tile {
        Tile::new(Element::Source, rotation)
    }

    fn label(d: Direction, p: Polarization) -> BasisLabel {
        BasisLabel::new(d, p)
    }

    /// Source, two splitters and two mirrors forming a balanced
    /// Mach-Zehnder interferometer; everything ends in the detector.
    fn mach_zehnder() -> TileGrid {
        TileGrid::new(5, 3)
            .with(0, 2, source(0))
            .with(1, 2, Tile::new(Element::ThinSplitter, 1))
            .with(3, 2, Tile::new(Element::ThinMirror, 1))
            .with(1, 0, Tile::new(Element::ThinMirror, 1))
            .with(3, 0, Tile::new(Element::ThinSplitter, 1))
            .with(4, 0, Tile::new(Element::Detector, 0))
    }

    /// Four mirrors around the source; nothing ever escapes.
    fn mirror_loop() -> TileGrid {
        TileGrid::new(3, 3)
            .with(1, 0, source(0))
            .with(2, 0, Tile::new(Element::ThinMirror, 3))
            .with(2, 2, Tile::new(Element::ThinMirror, 1))
            .with(0, 2, Tile::new(Element::ThinMirror, 3))
            .with(0, 0, Tile::new(Element::ThinMirror, 1))
    }

    #[test]
    fn test_initialize_single_source() {
        let grid = TileGrid::new(3, 3).with(1, 1, source(1));
        let mut sim = Simulation::new(&grid, SimulationConfig::default());

        let emission = sim.initialize().unwrap().clone();
        assert_eq!(sim.history().len(), 1);
        assert_eq!(sim.state(), SimulationState::Ready);
        assert!((Simulation::total_probability(&emission) - 1.0).abs() < 1e-12);
        assert_eq!(emission[0].label, label(Direction::North, Polarization::H));
        assert_eq!((emission[0].i, emission[0].j), (1, 1));
    }

    #[test]
    fn test_initialize_without_source_fails() {
        let grid = TileGrid::new(3, 3);
        let mut sim = Simulation::new(&grid, SimulationConfig::default());

        assert!(matches!(sim.initialize(), Err(Error::NoSource)));
        assert!(sim.history().is_empty());
        assert_eq!(sim.state(), SimulationState::Uninitialized);
    }

    #[test]
    fn test_initialize_with_two_sources_fails() {
        let grid = TileGrid::new(3, 3).with(0, 0, source(0)).with(2, 2, source(2));
        let mut sim = Simulation::new(&grid, SimulationConfig::default());

        assert!(matches!(
            sim.initialize(),
            Err(Error::MultipleSources { count: 2 })
        ));
        assert!(sim.history().is_empty());
    }

    #[test]
    fn test_propagate_requires_initialize() {
        let grid = TileGrid::new(2, 2).with(0, 0, source(0));
        let mut sim = Simulation::new(&grid, SimulationConfig::default());

        assert!(matches!(
            sim.propagate(),
            Err(Error::InvalidState {
                state: SimulationState::Uninitialized,
                ..
            })
        ));
    }

    #[test]
    fn test_vacuum_interaction_is_identity() {
        let grid = TileGrid::new(4, 4);
        let sim = Simulation::new(&grid, SimulationConfig::default());

        let displaced = vec![
            AmplitudeEntry::new(0, 1, label(Direction::East, Polarization::H), Complex64::new(0.6, 0.0)),
            AmplitudeEntry::new(2, 3, label(Direction::North, Polarization::V), Complex64::new(0.0, -0.8)),
        ];
        assert_eq!(sim.interact(&displaced), displaced);
    }

    #[test]
    fn test_opposite_phases_cancel_at_splitter() {
        let grid = TileGrid::new(3, 3).with(1, 1, Tile::new(Element::ThinSplitter, 1));
        let sim = Simulation::new(&grid, SimulationConfig::default());

        let displaced = vec![
            AmplitudeEntry::new(1, 1, label(Direction::East, Polarization::H), Complex64::new(FRAC_1_SQRT_2, 0.0)),
            AmplitudeEntry::new(1, 1, label(Direction::North, Polarization::H), Complex64::new(0.0, -FRAC_1_SQRT_2)),
        ];
        let out = sim.interact(&displaced);

        assert_eq!(out.len(), 1);
        assert_eq!(out[0].label, label(Direction::North, Polarization::H));
        assert!(approx_eq(out[0].amplitude, Complex64::new(0.0, -1.0), 1e-12));
    }

    #[test]
    fn test_leaving_the_board_leaks_everything() {
        let grid = TileGrid::new(1, 1).with(0, 0, source(2));
        let mut sim = Simulation::new(&grid, SimulationConfig::default());
        sim.initialize().unwrap();

        let next = sim.propagate().unwrap().clone();
        assert!(next.is_empty());
        assert!((sim.measurement().leaked() - 1.0).abs() < 1e-12);
        assert_eq!(sim.measurement_history()[0][0].site, AbsorptionSite::Leak);
    }

    #[test]
    fn test_absorbers_drain_probability() {
        let mut grid = TileGrid::new(5, 1).with(0, 0, source(0));
        for i in 1..5 {
            grid.set(i, 0, Tile::new(Element::Absorber, 0));
        }
        let mut sim = Simulation::new(&grid, SimulationConfig::default());
        sim.initialize().unwrap();

        assert_eq!(sim.propagate_to_end().unwrap(), Termination::Exhausted);
        assert_eq!(sim.history().len(), 6);
        assert!(sim.latest().unwrap().is_empty());

        for (step, snapshot) in sim.history().iter().enumerate().take(5) {
            let expected = 0.5_f64.powi(step as i32);
            assert!((Simulation::total_probability(snapshot) - expected).abs() < 1e-12);
        }
        assert!((sim.measurement().absorbed_at(1, 0) - 0.5).abs() < 1e-12);
        assert!((sim.measurement().leaked() - 1.0 / 16.0).abs() < 1e-12);
        assert!((sim.measurement().total() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_absorber_next_to_source_terminates_quickly() {
        let grid = TileGrid::new(2, 1)
            .with(0, 0, source(0))
            .with(1, 0, Tile::new(Element::Absorber, 0));
        let mut sim = Simulation::new(&grid, SimulationConfig::default());
        sim.initialize().unwrap();

        assert_eq!(sim.propagate_to_end().unwrap(), Termination::Exhausted);
        assert_eq!(sim.history().len(), 3);
        assert_eq!(sim.termination(), Some(Termination::Exhausted));
    }

    #[test]
    fn test_mach_zehnder_delivers_to_detector() {
        let grid = mach_zehnder();
        let mut sim = Simulation::new(&grid, SimulationConfig::default());
        sim.initialize().unwrap();

        assert_eq!(sim.propagate_to_end().unwrap(), Termination::Exhausted);
        assert_eq!(sim.history().len(), 7);
        assert!((sim.measurement().absorbed_at(4, 0) - 1.0).abs() < 1e-9);
        assert!(sim.measurement().leaked() < 1e-9);

        // The dark output port cancels out entirely.
        let before_detector = &sim.history()[5];
        assert_eq!(before_detector.len(), 1);
        assert_eq!(before_detector[0].label.direction, Direction::East);
    }

    #[test]
    fn test_probability_is_accounted_every_step() {
        let grid = mach_zehnder();
        let mut sim = Simulation::new(&grid, SimulationConfig::default());
        sim.initialize().unwrap();

        for _ in 0..6 {
            let on_board = Simulation::total_probability(sim.propagate().unwrap());
            assert!((on_board + sim.measurement().total() - 1.0).abs() < 1e-9);
        }
        assert_eq!(sim.measurement_history().len(), 6);
    }

    #[test]
    fn test_mirror_loop_hits_iteration_cap() {
        let grid = mirror_loop();
        let config = SimulationConfig {
            max_iterations: 50,
            ..SimulationConfig::default()
        };
        let mut sim = Simulation::new(&grid, config);
        sim.initialize().unwrap();

        assert_eq!(sim.propagate_to_end().unwrap(), Termination::IterationCap);
        assert_eq!(sim.state(), SimulationState::Terminated(Termination::IterationCap));
        assert_eq!(sim.history().len(), 51);
        assert!((Simulation::total_probability(sim.latest().unwrap()) - 1.0).abs() < 1e-9);

        // The loop is eight cells long.
        assert_eq!(sim.history()[8], sim.history()[0]);
    }

    #[test]
    fn test_rerun_reproduces_history() {
        let grid = TileGrid::new(6, 6)
            .with(0, 3, source(0))
            .with(2, 3, Tile::new(Element::ThinSplitter, 1))
            .with(2, 1, Tile::new(Element::PolarizingSplitter, 0))
            .with(4, 3, Tile::new(Element::QuarterWavePlateWE, 1))
            .with(5, 3, Tile::new(Element::ThinSplitter, 3))
            .with(3, 1, Tile::new(Element::SugarSolution, 0))
            .with(5, 5, Tile::new(Element::Absorber, 0));

        let mut sim = Simulation::new(&grid, SimulationConfig::default());
        sim.initialize().unwrap();
        sim.propagate_to_end().unwrap();
        let first = sim.history().to_vec();

        sim.initialize().unwrap();
        sim.propagate_to_end().unwrap();
        let second = sim.history();

        assert_eq!(first.len(), second.len());
        for (a, b) in first.iter().zip(second) {
            assert_eq!(a.len(), b.len());
            for (x, y) in a.iter().zip(b) {
                assert_eq!(x.key(), y.key());
                assert!(approx_eq(x.amplitude, y.amplitude, 1e-12));
            }
        }
    }

    #[test]
    fn test_propagate_after_termination_fails() {
        let grid = TileGrid::new(1, 1).with(0, 0, source(0));
        let mut sim = Simulation::new(&grid, SimulationConfig::default());
        sim.initialize().unwrap();
        sim.propagate_to_end().unwrap();

        assert!(matches!(sim.propagate(), Err(Error::InvalidState { .. })));

        sim.initialize().unwrap();
        assert_eq!(sim.state(), SimulationState::Ready);
        assert_eq!(sim.history().len(), 1);
        assert_eq!(sim.measurement().total(), 0.0);
    }

    #[test]
    fn test_snapshot_display() {
        let e = AmplitudeEntry::new(2, -1, label(Direction::West, Polarization::V), Complex64::new(0.5, -0.25));
        assert_eq!(e.to_string(), "(2,-1) <| +0.500-0.250i");
    }
}
