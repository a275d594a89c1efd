use crate::types::{Direction, Vec2};
use crate::world::Grid;

pub(super) fn manhattan(ax: i32, ay: i32, bx: i32, by: i32) -> i32 {
    (ax - bx).abs() + (ay - by).abs()
}

pub(super) fn offset(x: i32, y: i32, dir: Direction) -> (i32, i32) {
    let (dx, dy) = dir.delta();
    (x + dx, y + dy)
}

/// One cell from `from` in `dir`, with the column wrapped onto the grid.
pub(super) fn neighbor(grid: &Grid, from: Vec2, dir: Direction) -> Vec2 {
    let (x, y) = offset(from.x, from.y, dir);
    Vec2 {
        x: grid.wrap_column(x),
        y,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::GRID_WIDTH;

    #[test]
    fn neighbor_wraps_horizontally_only() {
        let grid = Grid::initial();
        assert_eq!(
            neighbor(&grid, Vec2 { x: 0, y: 9 }, Direction::Left),
            Vec2 { x: GRID_WIDTH - 1, y: 9 }
        );
        assert_eq!(
            neighbor(&grid, Vec2 { x: GRID_WIDTH - 1, y: 9 }, Direction::Right),
            Vec2 { x: 0, y: 9 }
        );
        assert_eq!(
            neighbor(&grid, Vec2 { x: 3, y: 0 }, Direction::Up),
            Vec2 { x: 3, y: -1 }
        );
        assert_eq!(
            neighbor(&grid, Vec2 { x: 3, y: 4 }, Direction::None),
            Vec2 { x: 3, y: 4 }
        );
    }

    #[test]
    fn manhattan_is_symmetric() {
        assert_eq!(manhattan(1, 2, 4, 6), 7);
        assert_eq!(manhattan(4, 6, 1, 2), 7);
        assert_eq!(manhattan(3, 3, 3, 3), 0);
    }
}
