//! Upcoming-piece queue and random piece generation
//!
//! The queue is a plain FIFO; keeping it at the preview length is the
//! caller's job (one fresh piece enqueued per piece dequeued).

use crate::piece::{Piece, PieceKind};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::collections::VecDeque;

/// Number of upcoming pieces kept in the queue
pub const PREVIEW_LEN: usize = 6;

/// FIFO of upcoming pieces
#[derive(Debug, Clone, Default)]
pub struct PieceQueue {
    pieces: VecDeque<Piece>,
}

impl PieceQueue {
    pub fn new() -> Self {
        Self {
            pieces: VecDeque::with_capacity(PREVIEW_LEN + 1),
        }
    }

    /// Append a piece at the tail
    pub fn enqueue(&mut self, piece: Piece) {
        self.pieces.push_back(piece);
    }

    /// Remove the head, handing ownership to the caller
    pub fn dequeue(&mut self) -> Option<Piece> {
        self.pieces.pop_front()
    }

    /// Upcoming pieces, head first
    pub fn iter(&self) -> impl Iterator<Item = &Piece> {
        self.pieces.iter()
    }

    pub fn len(&self) -> usize {
        self.pieces.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pieces.is_empty()
    }

    /// Hand every queued piece to `destroy`, head first
    pub fn clear_with<F: FnMut(Piece)>(&mut self, destroy: F) {
        self.pieces.drain(..).for_each(destroy);
    }
}

/// Uniform random piece source
#[derive(Debug, Clone)]
pub struct PieceGenerator {
    rng: ChaCha8Rng,
}

impl Default for PieceGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl PieceGenerator {
    /// Generator seeded from OS entropy
    pub fn new() -> Self {
        Self {
            rng: ChaCha8Rng::from_entropy(),
        }
    }

    /// Deterministic generator for reproducible sequences
    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    /// Canonical piece of a uniformly chosen kind
    pub fn next_piece(&mut self) -> Piece {
        Piece::new(PieceKind::random(&mut self.rng))
    }

    /// Top the queue up to the preview length
    pub fn fill(&mut self, queue: &mut PieceQueue) {
        while queue.len() < PREVIEW_LEN {
            queue.enqueue(self.next_piece());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_fifo_order() {
        let mut queue = PieceQueue::new();
        queue.enqueue(Piece::new(PieceKind::I));
        queue.enqueue(Piece::new(PieceKind::T));
        assert_eq!(queue.iter().next().map(Piece::kind), Some(PieceKind::I));
        assert_eq!(queue.dequeue().map(|p| p.kind()), Some(PieceKind::I));
        assert_eq!(queue.dequeue().map(|p| p.kind()), Some(PieceKind::T));
        assert!(queue.dequeue().is_none());
    }

    #[test]
    fn test_clear_with_visits_every_piece() {
        let mut queue = PieceQueue::new();
        for kind in PieceKind::all() {
            queue.enqueue(Piece::new(kind));
        }
        let mut destroyed = Vec::new();
        queue.clear_with(|piece| destroyed.push(piece.kind()));
        assert_eq!(destroyed, PieceKind::all().to_vec());
        assert!(queue.is_empty());
    }

    #[test]
    fn test_fill_reaches_preview_length() {
        let mut generator = PieceGenerator::with_seed(1);
        let mut queue = PieceQueue::new();
        generator.fill(&mut queue);
        assert_eq!(queue.len(), PREVIEW_LEN);
        queue.dequeue();
        generator.fill(&mut queue);
        assert_eq!(queue.len(), PREVIEW_LEN);
    }

    #[test]
    fn test_seeded_generators_agree() {
        let mut a = PieceGenerator::with_seed(42);
        let mut b = PieceGenerator::with_seed(42);
        for _ in 0..50 {
            assert_eq!(a.next_piece().kind(), b.next_piece().kind());
        }
    }

    #[test]
    fn test_generator_covers_all_kinds() {
        let mut generator = PieceGenerator::with_seed(7);
        let kinds: HashSet<_> = (0..500).map(|_| generator.next_piece().kind()).collect();
        assert_eq!(kinds.len(), 7);
    }
}
