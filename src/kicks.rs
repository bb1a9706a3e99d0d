//! Wall kick data
//!
//! When a rotated piece does not fit at its center-preserving position, these
//! offsets are tried in order and the first one that fits wins. The table is
//! shared by every piece kind and both rotation directions.

/// Offsets as (row, col); row grows downward, col grows rightward
pub const WALL_KICKS: [(i32, i32); 10] = [
    (0, 0),  // Default position
    (0, -1), // Left
    (0, 1),  // Right
    (1, 0),  // Down
    (-1, 0), // Up
    (1, -1), // Down-left
    (1, 1),  // Down-right
    (-1, 1), // Up-right
    (0, 2),  // Right 2, for the long bar
    (2, 0),  // Down 2, for the long bar
];

/// Anchor that keeps the rotated piece centered on the original one
pub fn centered_anchor(
    (row, col): (i32, i32),
    (old_height, old_width): (usize, usize),
    (new_height, new_width): (usize, usize),
) -> (i32, i32) {
    let center_row = row + (old_height / 2) as i32;
    let center_col = col + (old_width / 2) as i32;
    (
        center_row - (new_height / 2) as i32,
        center_col - (new_width / 2) as i32,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_kick_is_identity() {
        assert_eq!(WALL_KICKS[0], (0, 0));
    }

    #[test]
    fn test_kicks_are_unique() {
        for (i, a) in WALL_KICKS.iter().enumerate() {
            for b in &WALL_KICKS[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }

    #[test]
    fn test_centered_anchor_for_long_bar() {
        // Horizontal bar at (5, 3) becomes a vertical bar through column 5
        assert_eq!(centered_anchor((5, 3), (1, 4), (4, 1)), (3, 5));
        // and back again
        assert_eq!(centered_anchor((3, 5), (4, 1), (1, 4)), (5, 3));
    }
}
