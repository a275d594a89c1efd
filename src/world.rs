use crate::constants::TICK_RATE;
use crate::types::{CellKind, GhostColor, Vec2, WorldInit};

pub const GRID_WIDTH: i32 = 19;
pub const GRID_HEIGHT: i32 = 21;

/// `#` wall, `.` item, `o` power item, space empty. Rows 7, 9 and 11 are open at
/// both edges; row 9 is the tunnel lane the agent can wrap through.
const MAZE_LAYOUT: [&str; GRID_HEIGHT as usize] = [
    "###################",
    "#........#........#",
    "#o###.#######.###o#",
    "#.................#",
    "#.###.#.###.#.###.#",
    "#.....#..#..#.....#",
    "#####.## # ##.#####",
    "    #.#     #.#    ",
    "#####.# # # #.#####",
    "     .  # #  .     ",
    "#####.# ### #.#####",
    "    #.#     #.#    ",
    "#####.## # ##.#####",
    "#........#........#",
    "#.###.#######.###.#",
    "#o..#.........#..o#",
    "###.#.#.###.#.#.###",
    "#.....#..#..#.....#",
    "#.######.#.######.#",
    "#.................#",
    "###################",
];

pub const AGENT_START: Vec2 = Vec2 { x: 9, y: 15 };

pub const GHOST_HOMES: [(GhostColor, Vec2); 4] = [
    (GhostColor::Red, Vec2 { x: 9, y: 9 }),
    (GhostColor::Pink, Vec2 { x: 7, y: 9 }),
    (GhostColor::Blue, Vec2 { x: 11, y: 9 }),
    (GhostColor::Orange, Vec2 { x: 9, y: 8 }),
];

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Grid {
    width: i32,
    height: i32,
    cells: Vec<CellKind>,
}

impl Grid {
    pub fn initial() -> Self {
        let mut cells = Vec::with_capacity((GRID_WIDTH * GRID_HEIGHT) as usize);
        for row in MAZE_LAYOUT {
            for tile in row.bytes() {
                // Unknown tiles cannot occur in the compiled-in layout; treat them as walls.
                cells.push(CellKind::from_tile(tile).unwrap_or(CellKind::Wall));
            }
        }
        Self {
            width: GRID_WIDTH,
            height: GRID_HEIGHT,
            cells,
        }
    }

    pub fn width(&self) -> i32 {
        self.width
    }

    pub fn height(&self) -> i32 {
        self.height
    }

    /// Normalizes a column into `0..width`. Rows never wrap.
    pub fn wrap_column(&self, x: i32) -> i32 {
        x.rem_euclid(self.width)
    }

    pub fn is_traversable(&self, x: i32, y: i32) -> bool {
        self.index(x, y)
            .map(|idx| self.cells[idx] != CellKind::Wall)
            .unwrap_or(false)
    }

    /// Out-of-range rows read as walls.
    pub fn cell_kind(&self, x: i32, y: i32) -> CellKind {
        self.index(x, y)
            .map(|idx| self.cells[idx])
            .unwrap_or(CellKind::Wall)
    }

    /// Turns a collectible back into floor and returns what was there.
    pub fn clear_cell(&mut self, x: i32, y: i32) -> CellKind {
        let Some(idx) = self.index(x, y) else {
            return CellKind::Wall;
        };
        let previous = self.cells[idx];
        if previous.is_collectible() {
            self.cells[idx] = CellKind::Empty;
        }
        previous
    }

    pub fn remaining_collectibles(&self) -> usize {
        self.cells.iter().filter(|cell| cell.is_collectible()).count()
    }

    pub fn reset(&mut self) {
        *self = Self::initial();
    }

    pub fn tiles(&self) -> Vec<String> {
        self.cells
            .chunks(self.width as usize)
            .map(|row| row.iter().map(|cell| cell.tile()).collect())
            .collect()
    }

    #[cfg(test)]
    pub(crate) fn set_cell(&mut self, x: i32, y: i32, kind: CellKind) {
        if let Some(idx) = self.index(x, y) {
            self.cells[idx] = kind;
        }
    }

    fn index(&self, x: i32, y: i32) -> Option<usize> {
        if y < 0 || y >= self.height {
            return None;
        }
        let x = self.wrap_column(x);
        Some((y * self.width + x) as usize)
    }
}

pub fn to_world_init(grid: &Grid) -> WorldInit {
    WorldInit {
        width: grid.width(),
        height: grid.height(),
        tiles: grid.tiles(),
        tick_rate: TICK_RATE,
    }
}
