//! Detection Report
//!
//! Success predicate of a level, evaluated on the measurement record of a
//! finished run.

use crate::basis::EPSILON;
use crate::element::Element;
use crate::grid::TileGrid;
use crate::simulation::MeasurementRecord;

/// What reached the detectors and mines.
#[derive(Clone, Debug, PartialEq)]
pub struct DetectionReport {
    /// Probability absorbed by each detector cell, in cell order.
    pub detectors: Vec<((usize, usize), f64)>,
    pub total_at_detectors: f64,
    pub mine_probability: f64,
    pub detectors_fed: usize,
    pub is_won: bool,
    pub message: String,
}

impl DetectionReport {
    pub fn evaluate(
        grid: &TileGrid,
        record: &MeasurementRecord,
        required_probability: f64,
        detectors_to_feed: usize,
    ) -> Self {
        let detectors: Vec<_> = grid
            .positions_of(Element::Detector)
            .into_iter()
            .map(|(i, j)| ((i, j), record.absorbed_at(i, j)))
            .collect();

        let total_at_detectors: f64 = detectors.iter().map(|(_, p)| p).sum();
        let detectors_fed = detectors.iter().filter(|(_, p)| *p > EPSILON).count();
        let mine_probability: f64 = grid
            .positions_of(Element::Mine)
            .into_iter()
            .map(|(i, j)| record.absorbed_at(i, j))
            .sum();

        let enough = total_at_detectors + EPSILON >= required_probability;
        let mine_hit = mine_probability > EPSILON;
        let is_won = enough && detectors_fed >= detectors_to_feed && !mine_hit;

        let message = if mine_hit {
            format!("Nothing else matters when a mine goes off ({:.0}% chance).", 100.0 * mine_probability)
        } else if !enough {
            format!(
                "Only {:.0}% detection, {:.0}% needed.",
                100.0 * total_at_detectors,
                100.0 * required_probability
            )
        } else if detectors_fed < detectors_to_feed {
            format!("{} of {} detectors fed.", detectors_fed, detectors_to_feed)
        } else {
            format!("Detected with {:.0}% chance.", 100.0 * total_at_detectors)
        };

        Self {
            detectors,
            total_at_detectors,
            mine_probability,
            detectors_fed,
            is_won,
            message,
        }
    }
}
