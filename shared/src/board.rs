//! Grid bounds and per-tile occupancy
//!
//! The board is simulation state only: nothing here is sent over the wire,
//! clients rebuild it from the player positions in each snapshot.

use crate::state::Position;

/// Largest accepted width or height; keeps the tile count well inside `i32`.
pub const MAX_DIMENSION: i32 = 1024;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Tile {
    /// Players standing on this tile
    pub occupants: u32,
}

#[derive(Debug, Clone)]
pub struct Board {
    width: i32,
    height: i32,
    tiles: Vec<Tile>,
    max_occupancy: u32,
}

impl Board {
    /// Creates an empty board. Dimensions are clamped to `1..=MAX_DIMENSION`.
    pub fn new(width: i32, height: i32) -> Self {
        let width = width.clamp(1, MAX_DIMENSION);
        let height = height.clamp(1, MAX_DIMENSION);
        Self {
            width,
            height,
            tiles: vec![Tile::default(); (width * height) as usize],
            max_occupancy: 1,
        }
    }

    pub fn width(&self) -> i32 {
        self.width
    }

    pub fn height(&self) -> i32 {
        self.height
    }

    pub fn contains(&self, position: Position) -> bool {
        (0..self.width).contains(&position.x) && (0..self.height).contains(&position.y)
    }

    /// Nearest position inside the board.
    pub fn clamp(&self, position: Position) -> Position {
        Position {
            x: position.x.clamp(0, self.width - 1),
            y: position.y.clamp(0, self.height - 1),
        }
    }

    fn index(&self, position: Position) -> Option<usize> {
        self.contains(position)
            .then(|| (position.x + position.y * self.width) as usize)
    }

    pub fn tile(&self, position: Position) -> Option<&Tile> {
        self.index(position).map(|index| &self.tiles[index])
    }

    pub fn reset(&mut self) {
        for tile in &mut self.tiles {
            tile.occupants = 0;
        }
    }

    /// Recomputes occupancy from scratch for the given player positions.
    pub fn recount<I>(&mut self, positions: I)
    where
        I: IntoIterator<Item = Position>,
    {
        self.reset();
        let mut players = 0;
        for position in positions {
            players += 1;
            if let Some(index) = self.index(position) {
                self.tiles[index].occupants += 1;
            }
        }
        self.max_occupancy = players.max(1);
    }

    /// Shading in `[0, 1]`: a tile holding every player is fully lit.
    pub fn intensity(&self, position: Position) -> f32 {
        self.tile(position)
            .map(|tile| tile.occupants as f32 / self.max_occupancy as f32)
            .unwrap_or(0.0)
    }
}
