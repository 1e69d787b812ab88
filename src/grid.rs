//! Tile grid
//!
//! Plain storage of the board. Cells are addressed `(i, j)` with `i` the
//! column (x) and `j` the row (y, growing downwards). Everything outside the
//! grid is an open, fully absorbing boundary.

use ndarray::Array2;

use crate::element::Element;

/// Element placed on a cell, with its orientation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Tile {
    pub element: Element,
    pub rotation: usize,
    /// Editor hint: the player may not move or rotate this tile.
    pub frozen: bool,
}

impl Tile {
    /// # Panics
    ///
    /// If `rotation` is out of range for `element`.
    pub fn new(element: Element, rotation: usize) -> Self {
        assert!(
            rotation < element.max_rotation(),
            "rotation {} out of range for {}",
            rotation,
            element.name()
        );
        Self {
            element,
            rotation,
            frozen: false,
        }
    }

    pub fn frozen(mut self) -> Self {
        self.frozen = true;
        self
    }

    pub fn vacuum() -> Self {
        Self::new(Element::Vacuum, 0)
    }
}

impl Default for Tile {
    fn default() -> Self {
        Self::vacuum()
    }
}

/// Width × height board of tiles.
#[derive(Clone, Debug, PartialEq)]
pub struct TileGrid {
    tiles: Array2<Tile>,
}

impl TileGrid {
    /// Create a board filled with vacuum.
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            tiles: Array2::from_elem((width, height), Tile::vacuum()),
        }
    }

    pub fn width(&self) -> usize {
        self.tiles.shape()[0]
    }

    pub fn height(&self) -> usize {
        self.tiles.shape()[1]
    }

    /// Whether a signed cell coordinate lies on the board.
    #[inline]
    pub fn contains(&self, i: i32, j: i32) -> bool {
        i >= 0 && j >= 0 && (i as usize) < self.width() && (j as usize) < self.height()
    }

    /// Tile at `(i, j)`, or `None` outside the board.
    pub fn get(&self, i: usize, j: usize) -> Option<&Tile> {
        self.tiles.get((i, j))
    }

    /// # Panics
    ///
    /// If `(i, j)` lies outside the board.
    pub fn set(&mut self, i: usize, j: usize, tile: Tile) {
        assert!(
            i < self.width() && j < self.height(),
            "cell ({}, {}) outside {}x{} board",
            i,
            j,
            self.width(),
            self.height()
        );
        self.tiles[[i, j]] = tile;
    }

    /// Builder-style [`set`](Self::set).
    pub fn with(mut self, i: usize, j: usize, tile: Tile) -> Self {
        self.set(i, j, tile);
        self
    }

    /// All cells with their tiles, column-major.
    pub fn cells(&self) -> impl Iterator<Item = ((usize, usize), &Tile)> {
        self.tiles.indexed_iter()
    }

    /// Cells holding anything other than vacuum.
    pub fn placed(&self) -> impl Iterator<Item = ((usize, usize), &Tile)> {
        self.cells().filter(|(_, t)| t.element != Element::Vacuum)
    }

    /// Cells holding the given element.
    pub fn positions_of(&self, element: Element) -> Vec<(usize, usize)> {
        self.cells()
            .filter(|(_, t)| t.element == element)
            .map(|(pos, _)| pos)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_grid_is_vacuum() {
        let grid = TileGrid::new(4, 3);
        assert_eq!(grid.width(), 4);
        assert_eq!(grid.height(), 3);
        assert_eq!(grid.placed().count(), 0);
        assert_eq!(grid.get(3, 2), Some(&Tile::vacuum()));
    }

    #[test]
    fn test_out_of_bounds_reads() {
        let grid = TileGrid::new(2, 2);
        assert!(grid.get(2, 0).is_none());
        assert!(!grid.contains(-1, 0));
        assert!(!grid.contains(0, 2));
        assert!(grid.contains(1, 1));
    }

    #[test]
    fn test_set_and_find() {
        let grid = TileGrid::new(3, 3)
            .with(1, 2, Tile::new(Element::Detector, 0))
            .with(0, 0, Tile::new(Element::Source, 1).frozen());

        assert_eq!(grid.positions_of(Element::Detector), vec![(1, 2)]);
        assert!(grid.get(0, 0).unwrap().frozen);
        assert_eq!(grid.placed().count(), 2);
    }

    #[test]
    #[should_panic]
    fn test_set_outside_panics() {
        let mut grid = TileGrid::new(2, 2);
        grid.set(5, 0, Tile::vacuum());
    }
}
