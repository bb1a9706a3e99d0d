//! End-to-end board and round scenarios through the public API

use falling_bricks::board::BOARD_WIDTH;
use falling_bricks::{
    Board, Game, GameMode, Intent, Phase, Piece, PieceKind, Placement, RotationDirection,
};

fn lock(board: &mut Board, piece: Piece) {
    board.add_piece(&piece, Placement::Lock).unwrap();
}

fn filled(piece: &Piece) -> Vec<(usize, usize)> {
    piece.filled_cells().collect()
}

#[test]
fn test_hard_drop_lands_on_floor() {
    let mut board = Board::new();
    let bar = Piece::new(PieceKind::I).at(0, 3);
    let landing = board.add_piece(&bar, Placement::HardDrop).unwrap();

    assert_eq!(landing.row, 19);
    for col in 0..BOARD_WIDTH as i32 {
        let locked = board.get(19, col).unwrap().is_locked();
        assert_eq!(locked, (3..=6).contains(&col), "col {}", col);
    }
}

#[test]
fn test_bottom_row_clear_then_settle() {
    let mut board = Board::new();
    board
        .add_piece(&Piece::new(PieceKind::I).at(0, 0), Placement::HardDrop)
        .unwrap();
    board
        .add_piece(&Piece::new(PieceKind::I).at(0, 4), Placement::HardDrop)
        .unwrap();
    board
        .add_piece(&Piece::new(PieceKind::O).at(0, 8), Placement::HardDrop)
        .unwrap();
    assert_eq!(board.locked_cell_count(), 12);

    assert_eq!(board.check_and_mark_full_rows(), 1);
    assert_eq!(board.clear_full_rows(), Ok(1));
    assert_eq!(board.row_locked_count(19), 0);
    assert_eq!(board.locked_cell_count(), 12 - BOARD_WIDTH);

    board.drop_all_pieces();
    assert!(board.is_settled());
    assert!(board.get(19, 8).unwrap().is_locked());
    assert!(board.get(19, 9).unwrap().is_locked());
    assert!(board.get(18, 8).unwrap().is_empty());
    assert_eq!(board.check_consistency(), Ok(()));
}

#[test]
fn test_four_rotations_restore_every_kind() {
    for kind in PieceKind::all() {
        let piece = Piece::new(kind);
        let mut spun = piece.clone();
        for _ in 0..4 {
            spun = spun.rotate(RotationDirection::Clockwise);
        }
        assert_eq!(filled(&spun), filled(&piece), "{}", kind.name());
        assert_eq!((spun.width(), spun.height()), (piece.width(), piece.height()));

        let back = piece
            .rotate(RotationDirection::Clockwise)
            .rotate(RotationDirection::CounterClockwise);
        assert_eq!(filled(&back), filled(&piece), "{}", kind.name());
    }
}

#[test]
fn test_wall_kick_moves_blocked_rotation() {
    let mut board = Board::new();
    lock(&mut board, Piece::new(PieceKind::O).at(9, 2));
    let t = Piece::new(PieceKind::T)
        .rotate(RotationDirection::Clockwise)
        .at(10, 0);

    let rotated = board.try_rotate(&t, RotationDirection::Clockwise).unwrap();
    assert_eq!((rotated.row, rotated.col), (11, 0));
}

#[test]
fn test_split_keeps_every_uncleared_cell() {
    let mut board = Board::new();
    // Two vertical bars crossing rows 16..=19, rows 17 and 18 completed
    let bar = Piece::new(PieceKind::I).rotate(RotationDirection::Clockwise);
    lock(&mut board, bar.clone().at(16, 0));
    lock(&mut board, bar.at(16, 9));
    for row in [17, 18] {
        lock(&mut board, Piece::new(PieceKind::I).at(row, 1));
        lock(&mut board, Piece::new(PieceKind::I).at(row, 5));
    }
    let before = board.locked_cell_count();

    assert_eq!(board.clear_full_rows(), Ok(2));
    assert_eq!(board.locked_cell_count(), before - 2 * BOARD_WIDTH);
    // Each bar leaves a one-cell top and a one-cell bottom
    let remaining: usize = board.locked_pieces().map(|(_, p)| p.filled_count()).sum();
    assert_eq!(remaining, 4);
    assert_eq!(board.locked_pieces().count(), 4);

    board.drop_all_pieces();
    assert!(board.is_settled());
    for col in [0, 9] {
        assert!(board.get(19, col).unwrap().is_locked());
        assert!(board.get(18, col).unwrap().is_locked());
    }
    assert_eq!(board.check_consistency(), Ok(()));
}

#[test]
fn test_seeded_round_keeps_board_consistent() {
    let mut game = Game::with_seed(42);
    game.start(GameMode::Endless, 0);

    let moves = [Intent::MoveLeft, Intent::MoveRight, Intent::RotateCw, Intent::RotateCcw];
    let mut now = 0;
    for frame in 0..20_000u64 {
        now += 16;
        if game.phase() == Phase::Playing {
            match frame % 40 {
                0 => game.handle(moves[(frame / 40 % 4) as usize], now),
                20 => game.handle(moves[((frame / 40 + 1) % 4) as usize], now),
                39 => game.handle(Intent::HardDrop, now),
                _ => {}
            }
        }
        game.update(now);
        game.drain_events();

        assert_eq!(game.board().check_consistency(), Ok(()), "frame {}", frame);
        if game.phase() == Phase::Playing {
            assert!(game.board().is_settled(), "frame {}", frame);
        }
        if game.phase() == Phase::GameOver {
            break;
        }
    }
    assert_eq!(game.phase(), Phase::GameOver);
}
