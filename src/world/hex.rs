use serde::{Deserialize, Serialize};

/// Neighbor offsets for even rows (r % 2 == 0) in odd-r offset layout.
const EVEN_ROW_NEIGHBORS: [(i32, i32); 6] = [
    (1, 0),   // East
    (0, -1),  // Northeast
    (-1, -1), // Northwest
    (-1, 0),  // West
    (-1, 1),  // Southwest
    (0, 1),   // Southeast
];

/// Neighbor offsets for odd rows (r % 2 == 1) in odd-r offset layout.
const ODD_ROW_NEIGHBORS: [(i32, i32); 6] = [
    (1, 0),  // East
    (1, -1), // Northeast
    (0, -1), // Northwest
    (-1, 0), // West
    (0, 1),  // Southwest
    (1, 1),  // Southeast
];

/// Cube directions used to walk a ring, starting from the southwest corner.
const CUBE_DIRECTIONS: [(i32, i32, i32); 6] = [
    (1, -1, 0),
    (1, 0, -1),
    (0, 1, -1),
    (-1, 1, 0),
    (-1, 0, 1),
    (0, -1, 1),
];

/// A cell of the odd-r offset hex grid. The key type of every spatial map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Hex {
    pub q: i32,
    pub r: i32,
}

impl Hex {
    pub const fn new(q: i32, r: i32) -> Self {
        Hex { q, r }
    }

    /// Cube coordinates `(x, y, z)` with `x + y + z == 0`.
    pub fn to_cube(self) -> (i32, i32, i32) {
        let x = self.q - self.r.div_euclid(2);
        let z = self.r;
        (x, -x - z, z)
    }

    pub fn from_cube(x: i32, _y: i32, z: i32) -> Self {
        Hex {
            q: x + z.div_euclid(2),
            r: z,
        }
    }

    /// The six adjacent cells. Offsets depend on the parity of `r`.
    pub fn neighbors(self) -> [Hex; 6] {
        let offsets = if self.r.rem_euclid(2) == 0 {
            &EVEN_ROW_NEIGHBORS
        } else {
            &ODD_ROW_NEIGHBORS
        };
        offsets.map(|(dq, dr)| Hex::new(self.q + dq, self.r + dr))
    }

    pub fn distance(self, other: Hex) -> u32 {
        let (ax, ay, az) = self.to_cube();
        let (bx, by, bz) = other.to_cube();
        (ax - bx)
            .unsigned_abs()
            .max((ay - by).unsigned_abs())
            .max((az - bz).unsigned_abs())
    }

    /// All cells at exactly `radius` steps. Radius 0 yields just `self`.
    pub fn ring(self, radius: u32) -> Vec<Hex> {
        if radius == 0 {
            return vec![self];
        }
        let r = radius as i32;
        let (cx, cy, cz) = self.to_cube();
        let (sx, sy, sz) = CUBE_DIRECTIONS[4];
        let (mut x, mut y, mut z) = (cx + sx * r, cy + sy * r, cz + sz * r);

        let mut cells = Vec::with_capacity(6 * radius as usize);
        for &(dx, dy, dz) in &CUBE_DIRECTIONS {
            for _ in 0..radius {
                cells.push(Hex::from_cube(x, y, z));
                x += dx;
                y += dy;
                z += dz;
            }
        }
        cells
    }

    pub fn is_adjacent(self, other: Hex) -> bool {
        self.distance(other) == 1
    }
}

impl std::fmt::Display for Hex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.q, self.r)
    }
}
