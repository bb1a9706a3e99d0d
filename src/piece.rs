//! Brick shapes and mask transforms
//!
//! A piece is a rectangular occupancy mask plus a board anchor (the row and
//! column of the mask's top-left corner). Rotating or splitting a piece always
//! produces new pieces; the source is never modified by those operations.

use rand::Rng;
use ratatui::style::Color;
use std::fmt;

/// The 7 brick shapes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PieceKind {
    I, // Cyan - long bar
    J, // Magenta - hook on the left
    L, // Yellow - hook on the right
    O, // Green - square
    Z, // Red - Z-shape
    S, // Blue - mirrored Z
    T, // Orange - T-shape
}

impl PieceKind {
    /// All kinds, in index order
    pub fn all() -> [PieceKind; 7] {
        [
            PieceKind::I,
            PieceKind::J,
            PieceKind::L,
            PieceKind::O,
            PieceKind::Z,
            PieceKind::S,
            PieceKind::T,
        ]
    }

    /// Look up a kind by its index (0..=6)
    pub fn from_index(index: u8) -> Result<PieceKind, PieceError> {
        Self::all()
            .get(index as usize)
            .copied()
            .ok_or(PieceError::InvalidKind(index))
    }

    /// Pick a kind uniformly at random
    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> PieceKind {
        Self::all()[rng.gen_range(0..7)]
    }

    /// Get the color for this kind
    pub fn color(&self) -> Color {
        match self {
            PieceKind::I => Color::Rgb(0, 255, 255),
            PieceKind::J => Color::Rgb(255, 0, 255),
            PieceKind::L => Color::Rgb(255, 255, 0),
            PieceKind::O => Color::Rgb(0, 255, 0),
            PieceKind::Z => Color::Rgb(255, 0, 0),
            PieceKind::S => Color::Rgb(0, 0, 255),
            PieceKind::T => Color::Rgb(255, 113, 0),
        }
    }

    /// Canonical mask as (width, height, row-major cells)
    fn shape(&self) -> (usize, usize, &'static [u8]) {
        match self {
            // 1 1 1 1
            PieceKind::I => (4, 1, &[1, 1, 1, 1]),
            // 1 0 0
            // 1 1 1
            PieceKind::J => (3, 2, &[1, 0, 0, 1, 1, 1]),
            // 0 0 1
            // 1 1 1
            PieceKind::L => (3, 2, &[0, 0, 1, 1, 1, 1]),
            // 1 1
            // 1 1
            PieceKind::O => (2, 2, &[1, 1, 1, 1]),
            // 1 1 0
            // 0 1 1
            PieceKind::Z => (3, 2, &[1, 1, 0, 0, 1, 1]),
            // 0 1 1
            // 1 1 0
            PieceKind::S => (3, 2, &[0, 1, 1, 1, 1, 0]),
            // 0 1 0
            // 1 1 1
            PieceKind::T => (3, 2, &[0, 1, 0, 1, 1, 1]),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            PieceKind::I => "I",
            PieceKind::J => "J",
            PieceKind::L => "L",
            PieceKind::O => "O",
            PieceKind::Z => "Z",
            PieceKind::S => "S",
            PieceKind::T => "T",
        }
    }
}

/// Direction for rotation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RotationDirection {
    Clockwise,
    CounterClockwise,
}

/// Structural failures when building pieces
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PieceError {
    /// Kind index outside 0..=6
    InvalidKind(u8),
    /// Requested sub-mask does not fit inside the source mask
    RegionOutOfBounds,
}

impl fmt::Display for PieceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PieceError::InvalidKind(index) => write!(f, "invalid piece kind index {}", index),
            PieceError::RegionOutOfBounds => write!(f, "region lies outside the piece mask"),
        }
    }
}

impl std::error::Error for PieceError {}

/// A brick: occupancy mask, kind, color and board anchor
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Piece {
    kind: PieceKind,
    width: usize,
    height: usize,
    /// Row-major, `width * height` entries
    mask: Vec<bool>,
    color: Color,
    /// Board row of the mask's top row (row 0 is the top of the board)
    pub row: i32,
    /// Board column of the mask's left column
    pub col: i32,
}

impl Piece {
    /// Build the canonical piece for a kind, anchored at (0, 0)
    pub fn new(kind: PieceKind) -> Self {
        let (width, height, cells) = kind.shape();
        Self {
            kind,
            width,
            height,
            mask: cells.iter().map(|&c| c == 1).collect(),
            color: kind.color(),
            row: 0,
            col: 0,
        }
    }

    /// Build a piece from an explicit mask. `mask.len()` must be `width * height`.
    pub fn from_mask(
        kind: PieceKind,
        width: usize,
        height: usize,
        mask: Vec<bool>,
        color: Color,
    ) -> Result<Self, PieceError> {
        if mask.len() != width * height {
            return Err(PieceError::RegionOutOfBounds);
        }
        Ok(Self {
            kind,
            width,
            height,
            mask,
            color,
            row: 0,
            col: 0,
        })
    }

    /// Same piece moved to another anchor
    pub fn at(mut self, row: i32, col: i32) -> Self {
        self.row = row;
        self.col = col;
        self
    }

    pub fn kind(&self) -> PieceKind {
        self.kind
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn color(&self) -> Color {
        self.color
    }

    /// Whether the mask cell at local (row, col) is set
    pub fn is_filled(&self, row: usize, col: usize) -> bool {
        row < self.height && col < self.width && self.mask[row * self.width + col]
    }

    /// Local (row, col) of every filled mask cell, top to bottom
    pub fn filled_cells(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        let width = self.width;
        self.mask
            .iter()
            .enumerate()
            .filter(|(_, filled)| **filled)
            .map(move |(i, _)| (i / width, i % width))
    }

    /// Board (row, col) of every filled cell if the piece were anchored at (row, col)
    pub fn cells_at(&self, row: i32, col: i32) -> impl Iterator<Item = (i32, i32)> + '_ {
        self.filled_cells()
            .map(move |(r, c)| (row + r as i32, col + c as i32))
    }

    /// Board (row, col) of every filled cell at the piece's own anchor
    pub fn board_cells(&self) -> impl Iterator<Item = (i32, i32)> + '_ {
        self.cells_at(self.row, self.col)
    }

    pub fn filled_count(&self) -> usize {
        self.mask.iter().filter(|&&filled| filled).count()
    }

    /// True iff no mask cell is set
    pub fn is_empty(&self) -> bool {
        !self.mask.iter().any(|&filled| filled)
    }

    /// Whether any cell in the given local row is set
    pub fn row_has_cells(&self, row: usize) -> bool {
        row < self.height && self.mask[row * self.width..(row + 1) * self.width].contains(&true)
    }

    /// Whether any cell strictly above the given local row is set
    pub fn has_cells_above(&self, row: usize) -> bool {
        (0..row.min(self.height)).any(|r| self.row_has_cells(r))
    }

    /// Whether any cell strictly below the given local row is set
    pub fn has_cells_below(&self, row: usize) -> bool {
        (row + 1..self.height).any(|r| self.row_has_cells(r))
    }

    /// Lowest local row holding a filled cell
    pub fn bottom_row(&self) -> Option<usize> {
        (0..self.height).rev().find(|&r| self.row_has_cells(r))
    }

    /// Unset every cell in a local row, returning how many were set
    pub fn clear_row(&mut self, row: usize) -> usize {
        if row >= self.height {
            return 0;
        }
        let cells = &mut self.mask[row * self.width..(row + 1) * self.width];
        let cleared = cells.iter().filter(|&&filled| filled).count();
        cells.fill(false);
        cleared
    }

    /// Rotate 90 degrees. Width and height swap; the anchor is carried over
    /// unchanged and must be recomputed by the caller.
    pub fn rotate(&self, direction: RotationDirection) -> Piece {
        let new_width = self.height;
        let new_height = self.width;
        let mut mask = vec![false; new_width * new_height];

        for i in 0..self.height {
            for j in 0..self.width {
                let (row, col) = match direction {
                    RotationDirection::Clockwise => (j, new_width - 1 - i),
                    RotationDirection::CounterClockwise => (new_height - 1 - j, i),
                };
                mask[row * new_width + col] = self.mask[i * self.width + j];
            }
        }

        Piece {
            kind: self.kind,
            width: new_width,
            height: new_height,
            mask,
            color: self.color,
            row: self.row,
            col: self.col,
        }
    }

    /// Extract a rectangular sub-mask as an independent piece anchored at (0, 0)
    pub fn copy_region(
        &self,
        start_row: usize,
        start_col: usize,
        height: usize,
        width: usize,
    ) -> Result<Piece, PieceError> {
        if start_row + height > self.height || start_col + width > self.width {
            return Err(PieceError::RegionOutOfBounds);
        }

        let mut mask = Vec::with_capacity(width * height);
        for r in start_row..start_row + height {
            let offset = r * self.width + start_col;
            mask.extend_from_slice(&self.mask[offset..offset + width]);
        }

        Ok(Piece {
            kind: self.kind,
            width,
            height,
            mask,
            color: self.color,
            row: 0,
            col: 0,
        })
    }

    /// Same piece with another display color
    pub fn recolored(mut self, color: Color) -> Piece {
        self.color = color;
        self
    }
}

/// Blend an RGB color toward white. Named colors are returned unchanged.
pub fn lighten(color: Color, amount: f32) -> Color {
    match color {
        Color::Rgb(r, g, b) => {
            let up = |c: u8| (c as f32 + (255.0 - c as f32) * amount).round() as u8;
            Color::Rgb(up(r), up(g), up(b))
        }
        other => other,
    }
}

/// Scale an RGB color toward black. Named colors are returned unchanged.
pub fn darken(color: Color, amount: f32) -> Color {
    match color {
        Color::Rgb(r, g, b) => {
            let down = |c: u8| (c as f32 * (1.0 - amount)).round() as u8;
            Color::Rgb(down(r), down(g), down(b))
        }
        other => other,
    }
}
