//! Photon Quantum Walk Engine
//!
//! Discrete-time simulation of a single photon's complex amplitudes spreading,
//! interfering and being absorbed on a grid of optical elements.

pub mod basis;
pub mod tensor;
pub mod element;
pub mod grid;
pub mod simulation;
pub mod level;
pub mod detection;
pub mod error;

pub use basis::{Amplitude, BasisLabel, Direction, Polarization};
pub use tensor::{DirectionTable, Transition, TransitionTensor};
pub use element::{Element, ElementClass, Emission};
pub use grid::{Tile, TileGrid};
pub use simulation::{
    AmplitudeEntry, MeasurementRecord, Simulation, SimulationConfig, SimulationState, Snapshot,
    Termination,
};
pub use level::{LevelRecipe, TileRecipe};
pub use detection::DetectionReport;
pub use error::{Error, Result};
