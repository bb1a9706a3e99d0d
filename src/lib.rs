//! Falling Bricks - a falling-block puzzle engine
//!
//! Locked bricks keep their shape: clearing a row through the middle of a
//! brick splits it in two, and the remaining stack falls under gravity after
//! every clear, which can complete further rows for combo points.
//!
//! The crate is UI-agnostic apart from using `ratatui` colors. A host drives
//! a [`Game`] with its own millisecond clock and reads the [`Board`] to draw.

pub mod arena;
pub mod board;
pub mod game;
pub mod kicks;
pub mod mode;
pub mod piece;
pub mod queue;
pub mod score;

pub use board::{Board, BoardError, Cell, CellView, Landing, Placement, PlacementRejected, RotationRejected};
pub use game::{Banner, Game, GameEvent, GameOverReason, Intent, Phase};
pub use mode::GameMode;
pub use piece::{Piece, PieceError, PieceKind, RotationDirection};
pub use queue::{PieceGenerator, PieceQueue, PREVIEW_LEN};
pub use score::Score;
