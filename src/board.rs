//! Game board: cell grid, locked pieces, placement and row clearing
//!
//! Locked pieces live in an [`Arena`]; every locked cell holds a non-owning
//! [`Handle`] into it. The arena is the source of truth for settled geometry:
//! a locked piece's mask, translated by its anchor, matches exactly the set of
//! cells that reference it.

use crate::arena::{Arena, Handle};
use crate::kicks::{centered_anchor, WALL_KICKS};
use crate::piece::{darken, lighten, Piece, PieceError, RotationDirection};
use ratatui::style::Color;
use std::fmt;
use tracing::{debug, warn};

/// Standard board dimensions
pub const BOARD_WIDTH: usize = 10;
pub const BOARD_HEIGHT: usize = 20;

/// How strongly split halves are tinted away from the source color
const SPLIT_TINT: f32 = 0.35;

/// What is stamped into a cell
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Occupant {
    /// Part of the falling piece, recomputed every frame
    Active { color: Color },
    /// Part of a locked piece in the arena
    Locked(Handle),
}

/// One board location
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Cell {
    occupant: Option<Occupant>,
    locked: bool,
    shadow: bool,
    marked: bool,
    crossed: bool,
}

impl Cell {
    pub fn occupant(&self) -> Option<Occupant> {
        self.occupant
    }

    pub fn is_empty(&self) -> bool {
        self.occupant.is_none()
    }

    pub fn is_locked(&self) -> bool {
        self.locked
    }

    /// Landing preview of the falling piece
    pub fn is_shadow(&self) -> bool {
        self.shadow
    }

    /// Part of a full row waiting to be cleared
    pub fn is_marked(&self) -> bool {
        self.marked
    }

    /// Covered by the piece that could not spawn
    pub fn is_crossed(&self) -> bool {
        self.crossed
    }

    fn locked_handle(&self) -> Option<Handle> {
        match self.occupant {
            Some(Occupant::Locked(handle)) if self.locked => Some(handle),
            _ => None,
        }
    }

    fn release(&mut self) {
        self.occupant = None;
        self.locked = false;
    }
}

/// Render-facing snapshot of a cell
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellView {
    pub color: Option<Color>,
    pub locked: bool,
    pub shadow: bool,
    pub marked: bool,
    pub crossed: bool,
}

/// How a piece is committed by [`Board::add_piece`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    /// Stamp the falling piece at its anchor and compute its shadow
    Float,
    /// Lock the piece at its anchor
    Lock,
    /// Move the piece to its lowest valid row, then lock it
    HardDrop,
}

/// Where a piece ended up
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Landing {
    pub row: i32,
    pub col: i32,
    /// Arena handle when the piece was locked
    pub handle: Option<Handle>,
}

/// The piece does not fit at the requested position
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlacementRejected;

impl fmt::Display for PlacementRejected {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("piece does not fit at its position")
    }
}

impl std::error::Error for PlacementRejected {}

/// No wall kick produced a valid rotated position
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RotationRejected;

impl fmt::Display for RotationRejected {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("no wall kick fits the rotated piece")
    }
}

impl std::error::Error for RotationRejected {}

/// Structural failure while rewriting locked pieces
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoardError {
    Split(PieceError),
}

impl fmt::Display for BoardError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BoardError::Split(err) => write!(f, "failed to split piece: {}", err),
        }
    }
}

impl std::error::Error for BoardError {}

impl From<PieceError> for BoardError {
    fn from(err: PieceError) -> Self {
        BoardError::Split(err)
    }
}

/// The game board
#[derive(Debug, Clone)]
pub struct Board {
    width: usize,
    height: usize,
    /// Row-major; row 0 is the top row
    cells: Vec<Cell>,
    pieces: Arena<Piece>,
}

impl Default for Board {
    fn default() -> Self {
        Self::new()
    }
}

impl Board {
    /// Create a new empty 10x20 board
    pub fn new() -> Self {
        Self::with_size(BOARD_WIDTH, BOARD_HEIGHT)
    }

    pub fn with_size(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            cells: vec![Cell::default(); width * height],
            pieces: Arena::with_capacity(16),
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    fn index(&self, row: i32, col: i32) -> Option<usize> {
        if row < 0 || col < 0 || row as usize >= self.height || col as usize >= self.width {
            return None;
        }
        Some(row as usize * self.width + col as usize)
    }

    /// Get the cell at (row, col), or None if out of bounds
    pub fn get(&self, row: i32, col: i32) -> Option<&Cell> {
        self.index(row, col).map(|i| &self.cells[i])
    }

    fn get_mut(&mut self, row: i32, col: i32) -> Option<&mut Cell> {
        self.index(row, col).map(move |i| &mut self.cells[i])
    }

    /// Resolve a cell for rendering
    pub fn view(&self, row: i32, col: i32) -> Option<CellView> {
        let cell = self.get(row, col)?;
        let color = match cell.occupant {
            Some(Occupant::Active { color }) => Some(color),
            Some(Occupant::Locked(handle)) => self.pieces.get(handle).map(Piece::color),
            None => None,
        };
        Some(CellView {
            color,
            locked: cell.locked,
            shadow: cell.shadow,
            marked: cell.marked,
            crossed: cell.crossed,
        })
    }

    /// Every cell as (row, col, view), top row first
    pub fn cells(&self) -> impl Iterator<Item = (usize, usize, CellView)> + '_ {
        (0..self.height).flat_map(move |row| {
            (0..self.width).filter_map(move |col| {
                self.view(row as i32, col as i32).map(|view| (row, col, view))
            })
        })
    }

    /// Locked pieces in the order they were registered
    pub fn locked_pieces(&self) -> impl Iterator<Item = (Handle, &Piece)> {
        self.pieces.iter()
    }

    pub fn locked_piece(&self, handle: Handle) -> Option<&Piece> {
        self.pieces.get(handle)
    }

    pub fn locked_cell_count(&self) -> usize {
        self.cells.iter().filter(|cell| cell.locked).count()
    }

    /// Locked cells in one row
    pub fn row_locked_count(&self, row: usize) -> usize {
        if row >= self.height {
            return 0;
        }
        self.cells[row * self.width..(row + 1) * self.width]
            .iter()
            .filter(|cell| cell.locked)
            .count()
    }

    /// No locked pieces at all
    pub fn is_empty(&self) -> bool {
        self.pieces.is_empty()
    }

    fn is_open(&self, row: i32, col: i32) -> bool {
        self.get(row, col).is_some_and(|cell| !cell.locked)
    }

    /// True iff every filled cell of the piece, anchored at (row, col), lands
    /// on an in-bounds cell that is not locked
    pub fn validate_at(&self, piece: &Piece, row: i32, col: i32) -> bool {
        piece.cells_at(row, col).all(|(r, c)| self.is_open(r, c))
    }

    /// Lowest row the piece can reach by falling straight down from `row`
    pub fn resting_row(&self, piece: &Piece, row: i32, col: i32) -> i32 {
        let mut resting = row;
        while self.validate_at(piece, resting + 1, col) {
            resting += 1;
        }
        resting
    }

    /// Commit a piece to the board.
    ///
    /// Rejection is routine: it means the piece does not fit where it is. For
    /// a freshly spawned piece that is the top-out signal.
    pub fn add_piece(
        &mut self,
        piece: &Piece,
        placement: Placement,
    ) -> Result<Landing, PlacementRejected> {
        if !self.validate_at(piece, piece.row, piece.col) {
            return Err(PlacementRejected);
        }

        match placement {
            Placement::Float => {
                let color = piece.color();
                for (row, col) in piece.board_cells() {
                    if let Some(cell) = self.get_mut(row, col) {
                        cell.occupant = Some(Occupant::Active { color });
                    }
                }
                self.mark_shadow(piece);
                Ok(Landing {
                    row: piece.row,
                    col: piece.col,
                    handle: None,
                })
            }
            Placement::Lock => {
                let handle = self.lock_copy(piece.clone());
                Ok(Landing {
                    row: piece.row,
                    col: piece.col,
                    handle: Some(handle),
                })
            }
            Placement::HardDrop => {
                let row = self.resting_row(piece, piece.row, piece.col);
                let handle = self.lock_copy(piece.clone().at(row, piece.col));
                Ok(Landing {
                    row,
                    col: piece.col,
                    handle: Some(handle),
                })
            }
        }
    }

    /// Register a piece in the arena and stamp its cells
    fn lock_copy(&mut self, piece: Piece) -> Handle {
        debug!(
            kind = piece.kind().name(),
            row = piece.row,
            col = piece.col,
            "locking piece"
        );
        let handle = self.pieces.insert(piece);
        self.stamp(handle);
        handle
    }

    /// Point every cell under a locked piece at its handle
    fn stamp(&mut self, handle: Handle) {
        let Some(piece) = self.pieces.get(handle) else {
            return;
        };
        let positions: Vec<_> = piece.board_cells().collect();
        for (row, col) in positions {
            if let Some(cell) = self.get_mut(row, col) {
                cell.occupant = Some(Occupant::Locked(handle));
                cell.locked = true;
            }
        }
    }

    /// Detach a locked piece from the cells it covers, leaving it in the arena
    fn unstamp(&mut self, handle: Handle) {
        let Some(piece) = self.pieces.get(handle) else {
            return;
        };
        let positions: Vec<_> = piece.board_cells().collect();
        for (row, col) in positions {
            if let Some(cell) = self.get_mut(row, col) {
                if cell.occupant == Some(Occupant::Locked(handle)) {
                    cell.release();
                }
            }
        }
    }

    /// Remove a piece from the arena after nulling every cell that references it
    fn release(&mut self, handle: Handle) -> Option<Piece> {
        for cell in &mut self.cells {
            if cell.occupant == Some(Occupant::Locked(handle)) {
                cell.release();
            }
        }
        self.pieces.remove(handle)
    }

    /// Flag the piece footprint at its landing row, except where the live
    /// piece itself already covers the cell
    fn mark_shadow(&mut self, piece: &Piece) {
        let landing = self.resting_row(piece, piece.row, piece.col);
        let positions: Vec<_> = piece.cells_at(landing, piece.col).collect();
        for (row, col) in positions {
            if let Some(cell) = self.get_mut(row, col) {
                if !matches!(cell.occupant, Some(Occupant::Active { .. })) {
                    cell.shadow = true;
                }
            }
        }
    }

    /// Try to rotate a piece, resolving collisions with the wall kick table.
    /// On success the returned piece carries its new anchor.
    pub fn try_rotate(
        &self,
        piece: &Piece,
        direction: RotationDirection,
    ) -> Result<Piece, RotationRejected> {
        let rotated = piece.rotate(direction);
        let (row, col) = centered_anchor(
            (piece.row, piece.col),
            (piece.height(), piece.width()),
            (rotated.height(), rotated.width()),
        );

        for (kick, (dr, dc)) in WALL_KICKS.iter().enumerate() {
            if self.validate_at(&rotated, row + dr, col + dc) {
                debug!(kick, row = row + dr, col = col + dc, "rotation accepted");
                return Ok(rotated.at(row + dr, col + dc));
            }
        }

        Err(RotationRejected)
    }

    /// Remove the falling piece stamp and every shadow
    pub fn clear_unlocked_cells(&mut self) {
        for cell in &mut self.cells {
            if !cell.locked {
                cell.occupant = None;
            }
            cell.shadow = false;
        }
    }

    /// Reset every cell and forget all locked pieces
    pub fn clear(&mut self) {
        self.cells.fill(Cell::default());
        let dropped = self.pieces.drain().count();
        if dropped > 0 {
            debug!(pieces = dropped, "board cleared");
        }
    }

    fn row_is_full(&self, row: usize) -> bool {
        self.cells[row * self.width..(row + 1) * self.width]
            .iter()
            .all(|cell| cell.locked)
    }

    /// Distinct locked pieces in a row, left to right
    fn row_handles(&self, row: usize) -> Vec<Handle> {
        let mut handles = Vec::new();
        for cell in &self.cells[row * self.width..(row + 1) * self.width] {
            if let Some(handle) = cell.locked_handle() {
                if !handles.contains(&handle) {
                    handles.push(handle);
                }
            }
        }
        handles
    }

    /// Flag every cell of each full row and return how many rows are full
    pub fn check_and_mark_full_rows(&mut self) -> usize {
        let mut full = 0;
        for row in 0..self.height {
            if self.row_is_full(row) {
                full += 1;
                for cell in &mut self.cells[row * self.width..(row + 1) * self.width] {
                    cell.marked = true;
                }
            }
        }
        full
    }

    /// Remove every full row from the pieces that cover it, splitting pieces
    /// that keep cells on both sides of a cleared row. All-or-nothing: on
    /// failure the board is restored to its state before the call.
    pub fn clear_full_rows(&mut self) -> Result<usize, BoardError> {
        let snapshot = (self.cells.clone(), self.pieces.clone());
        match self.clear_full_rows_in_place() {
            Ok(cleared) => {
                debug_assert_eq!(self.check_consistency(), Ok(()));
                Ok(cleared)
            }
            Err(err) => {
                warn!(error = %err, "row clear failed, restoring board");
                self.restore(snapshot);
                Err(err)
            }
        }
    }

    /// Put back cells and pieces saved before a row clear. Marks are dropped
    /// too, since the rows they flagged were never cleared.
    fn restore(&mut self, (cells, pieces): (Vec<Cell>, Arena<Piece>)) {
        self.cells = cells;
        self.pieces = pieces;
        for cell in &mut self.cells {
            cell.marked = false;
        }
    }

    fn clear_full_rows_in_place(&mut self) -> Result<usize, BoardError> {
        let full: Vec<usize> = (0..self.height).filter(|&row| self.row_is_full(row)).collect();

        for &row in &full {
            for handle in self.row_handles(row) {
                self.cut_row_from_piece(handle, row)?;
            }
            for cell in &mut self.cells[row * self.width..(row + 1) * self.width] {
                *cell = Cell::default();
            }
        }

        let pruned = self.pieces.retain(|piece| !piece.is_empty());
        if !pruned.is_empty() {
            for cell in &mut self.cells {
                if cell.locked_handle().is_some_and(|h| pruned.contains(&h)) {
                    cell.release();
                }
            }
        }

        if !full.is_empty() {
            debug!(rows = full.len(), pieces = self.pieces.len(), "cleared full rows");
        }
        Ok(full.len())
    }

    /// Clear one board row out of a locked piece's mask
    fn cut_row_from_piece(&mut self, handle: Handle, row: usize) -> Result<(), BoardError> {
        let Some(piece) = self.pieces.get_mut(handle) else {
            return Ok(());
        };
        let local = (row as i32 - piece.row) as usize;
        piece.clear_row(local);

        if !(piece.has_cells_above(local) && piece.has_cells_below(local)) {
            return Ok(());
        }

        let source = piece.clone();
        let upper = source
            .copy_region(0, 0, local, source.width())?
            .at(source.row, source.col);
        let lower = source
            .copy_region(local + 1, 0, source.height() - local - 1, source.width())?
            .at(source.row + local as i32 + 1, source.col);
        let upper = upper.recolored(lighten(source.color(), SPLIT_TINT));
        let lower = lower.recolored(darken(source.color(), SPLIT_TINT));

        debug!(
            kind = source.kind().name(),
            row,
            upper_cells = upper.filled_count(),
            lower_cells = lower.filled_count(),
            "splitting piece"
        );

        self.release(handle);
        let upper = self.pieces.insert(upper);
        self.stamp(upper);
        let lower = self.pieces.insert(lower);
        self.stamp(lower);
        Ok(())
    }

    /// Let the remaining stack fall after rows were cleared.
    ///
    /// First every band of pieces between empty rows is shifted down past the
    /// empty rows beneath it, then pieces fall one by one (lowest first) until
    /// no piece can move.
    pub fn drop_all_pieces(&mut self) {
        let mut shifts: Vec<(Handle, i32)> = Vec::new();
        let mut pending: Vec<Handle> = Vec::new();
        let mut empty_rows = 0;

        for row in (0..self.height).rev() {
            let handles = self.row_handles(row);
            if handles.is_empty() {
                shifts.extend(pending.drain(..).map(|handle| (handle, empty_rows)));
                empty_rows += 1;
                continue;
            }
            for handle in handles {
                let seen = pending.contains(&handle) || shifts.iter().any(|(h, _)| *h == handle);
                if !seen {
                    pending.push(handle);
                }
            }
        }
        shifts.extend(pending.drain(..).map(|handle| (handle, empty_rows)));

        let shifts: Vec<_> = shifts.into_iter().filter(|(_, by)| *by > 0).collect();
        for (handle, _) in &shifts {
            self.unstamp(*handle);
        }
        for (handle, by) in &shifts {
            if let Some(piece) = self.pieces.get_mut(*handle) {
                piece.row += by;
            }
        }
        for (handle, _) in &shifts {
            self.stamp(*handle);
        }

        let mut passes = 0;
        loop {
            passes += 1;
            let mut moved = false;
            for handle in self.handles_bottom_up() {
                self.unstamp(handle);
                if let Some(piece) = self.pieces.get(handle) {
                    let resting = self.resting_row(piece, piece.row, piece.col);
                    if resting != piece.row {
                        moved = true;
                        if let Some(piece) = self.pieces.get_mut(handle) {
                            piece.row = resting;
                        }
                    }
                }
                self.stamp(handle);
            }
            if !moved {
                break;
            }
        }

        debug!(
            coarse_shifts = shifts.len(),
            passes,
            pieces = self.pieces.len(),
            "settled pieces"
        );
        debug_assert!(self.is_settled());
        debug_assert_eq!(self.check_consistency(), Ok(()));
    }

    /// Locked piece handles ordered by their lowest board row, bottom first
    fn handles_bottom_up(&self) -> Vec<Handle> {
        let mut order: Vec<(i32, Handle)> = self
            .pieces
            .iter()
            .map(|(handle, piece)| {
                let bottom = piece.bottom_row().map_or(piece.row, |r| piece.row + r as i32);
                (bottom, handle)
            })
            .collect();
        order.sort_by(|a, b| b.0.cmp(&a.0).then(a.1.cmp(&b.1)));
        order.into_iter().map(|(_, handle)| handle).collect()
    }

    /// Whether a locked piece would fit at (row, col), ignoring its own cells
    fn fits_without_self(&self, handle: Handle, piece: &Piece, row: i32, col: i32) -> bool {
        piece.cells_at(row, col).all(|(r, c)| {
            self.get(r, c).is_some_and(|cell| {
                !cell.locked || cell.occupant == Some(Occupant::Locked(handle))
            })
        })
    }

    /// No locked piece can move one row down
    pub fn is_settled(&self) -> bool {
        self.pieces
            .iter()
            .all(|(handle, piece)| !self.fits_without_self(handle, piece, piece.row + 1, piece.col))
    }

    /// Cross out the cells covered by a piece that could not be placed
    pub fn mark_x_cells(&mut self, piece: &Piece) {
        let positions: Vec<_> = piece.board_cells().collect();
        for (row, col) in positions {
            if let Some(cell) = self.get_mut(row, col) {
                cell.crossed = true;
            }
        }
    }

    /// Verify that cells and the locked-piece arena agree
    pub fn check_consistency(&self) -> Result<(), String> {
        for (handle, piece) in self.pieces.iter() {
            if piece.is_empty() {
                return Err(format!("empty piece {} kept in arena", handle.id()));
            }
            for (row, col) in piece.board_cells() {
                match self.get(row, col) {
                    Some(cell) if cell.locked_handle() == Some(handle) => {}
                    Some(_) => {
                        return Err(format!(
                            "cell ({}, {}) does not reference piece {}",
                            row,
                            col,
                            handle.id()
                        ))
                    }
                    None => {
                        return Err(format!(
                            "piece {} covers out-of-bounds cell ({}, {})",
                            handle.id(),
                            row,
                            col
                        ))
                    }
                }
            }
        }

        for row in 0..self.height {
            for col in 0..self.width {
                let cell = &self.cells[row * self.width + col];
                if !cell.locked {
                    continue;
                }
                let Some(handle) = cell.locked_handle() else {
                    return Err(format!("locked cell ({}, {}) has no piece", row, col));
                };
                let Some(piece) = self.pieces.get(handle) else {
                    return Err(format!(
                        "cell ({}, {}) references released piece {}",
                        row,
                        col,
                        handle.id()
                    ));
                };
                let local_row = row as i32 - piece.row;
                let local_col = col as i32 - piece.col;
                if local_row < 0
                    || local_col < 0
                    || !piece.is_filled(local_row as usize, local_col as usize)
                {
                    return Err(format!(
                        "cell ({}, {}) is outside the mask of piece {}",
                        row,
                        col,
                        handle.id()
                    ));
                }
            }
        }

        Ok(())
    }
}
