//! Level Recipes
//!
//! Persisted form of a board: one record per placed tile plus the board
//! dimensions and goal. Resolving a recipe yields the [`TileGrid`] the engine
//! runs on.

use serde::{Deserialize, Serialize};

use crate::element::Element;
use crate::error::{Error, Result};
use crate::grid::{Tile, TileGrid};

/// One placed tile.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TileRecipe {
    pub name: String,
    #[serde(default)]
    pub rotation: usize,
    #[serde(default)]
    pub frozen: bool,
    pub i: usize,
    pub j: usize,
}

/// A stored level.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LevelRecipe {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub group: String,
    pub width: usize,
    pub height: usize,
    #[serde(default, alias = "tileRecipes")]
    pub tiles: Vec<TileRecipe>,
    #[serde(default = "default_required_probability")]
    pub required_detection_probability: f64,
    #[serde(default = "default_detectors_to_feed")]
    pub detectors_to_feed: usize,
}

fn default_required_probability() -> f64 {
    1.0
}

fn default_detectors_to_feed() -> usize {
    1
}

impl LevelRecipe {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Record form of a board; vacuum cells are omitted.
    pub fn from_grid(name: &str, grid: &TileGrid) -> Self {
        let tiles = grid
            .placed()
            .map(|((i, j), tile)| TileRecipe {
                name: tile.element.name().to_string(),
                rotation: tile.rotation,
                frozen: tile.frozen,
                i,
                j,
            })
            .collect();

        Self {
            name: name.to_string(),
            group: String::new(),
            width: grid.width(),
            height: grid.height(),
            tiles,
            required_detection_probability: default_required_probability(),
            detectors_to_feed: grid.positions_of(Element::Detector).len(),
        }
    }

    /// Build the board. Unknown elements, cells off the board and invalid
    /// rotations are rejected.
    pub fn to_grid(&self) -> Result<TileGrid> {
        let mut grid = TileGrid::new(self.width, self.height);

        for recipe in &self.tiles {
            let element = Element::from_name(&recipe.name)
                .ok_or_else(|| Error::UnknownElement(recipe.name.clone()))?;

            if recipe.i >= self.width || recipe.j >= self.height {
                return Err(Error::TileOutOfBounds {
                    i: recipe.i,
                    j: recipe.j,
                    width: self.width,
                    height: self.height,
                });
            }

            if recipe.rotation >= element.max_rotation() {
                return Err(Error::InvalidRotation {
                    element: recipe.name.clone(),
                    rotation: recipe.rotation,
                    max: element.max_rotation(),
                });
            }

            let mut tile = Tile::new(element, recipe.rotation);
            tile.frozen = recipe.frozen;
            grid.set(recipe.i, recipe.j, tile);
        }

        Ok(grid)
    }
}
