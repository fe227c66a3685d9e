//! Piece catalog: the seven 4x4 shape templates and the clockwise rotation.

/// Side length of every piece's bounding box.
pub const PIECE_SIZE: usize = 4;

/// Row-major 4x4 occupancy matrix; 1 = occupied.
pub type Matrix = [[u8; PIECE_SIZE]; PIECE_SIZE];

/// Shape tags, in catalog order (index 0..7).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShapeKind {
    T,
    M,
    N,
    I,
    O,
    L,
    Z,
}

impl ShapeKind {
    pub const ALL: [Self; 7] = [Self::T, Self::M, Self::N, Self::I, Self::O, Self::L, Self::Z];

    /// Catalog index 0..7; also the palette slot used for colouring.
    pub fn index(self) -> usize {
        self as usize
    }

    /// The immutable template matrix for this shape.
    pub fn template(self) -> &'static Matrix {
        match self {
            Self::T => &[[0, 0, 0, 0], [0, 1, 0, 0], [1, 1, 1, 0], [0, 0, 0, 0]],
            Self::M => &[[0, 1, 0, 0], [0, 1, 1, 0], [0, 0, 1, 0], [0, 0, 0, 0]],
            Self::N => &[[0, 0, 1, 0], [0, 1, 1, 0], [0, 1, 0, 0], [0, 0, 0, 0]],
            Self::I => &[[0, 1, 0, 0], [0, 1, 0, 0], [0, 1, 0, 0], [0, 1, 0, 0]],
            Self::O => &[[0, 0, 0, 0], [0, 1, 1, 0], [0, 1, 1, 0], [0, 0, 0, 0]],
            Self::L => &[[0, 0, 0, 0], [0, 1, 1, 0], [0, 0, 1, 0], [0, 0, 1, 0]],
            Self::Z => &[[0, 0, 0, 0], [0, 1, 1, 0], [0, 1, 0, 0], [0, 1, 0, 0]],
        }
    }
}

/// A catalog entry: shape tag plus its template.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PieceShape {
    pub kind: ShapeKind,
    pub matrix: Matrix,
}

impl PieceShape {
    pub fn new(kind: ShapeKind) -> Self {
        Self {
            kind,
            matrix: *kind.template(),
        }
    }
}

/// All seven templates in catalog order.
pub fn all_shapes() -> [PieceShape; 7] {
    ShapeKind::ALL.map(PieceShape::new)
}

/// 90° clockwise: transpose, then reverse each row.
pub fn rotate_clockwise(matrix: &Matrix) -> Matrix {
    let mut out = [[0; PIECE_SIZE]; PIECE_SIZE];
    for (r, row) in out.iter_mut().enumerate() {
        for (c, cell) in row.iter_mut().enumerate() {
            *cell = matrix[c][r];
        }
        row.reverse();
    }
    out
}

/// The falling piece: its own (possibly rotated) copy of the template and its
/// top-left anchor in grid coordinates (x = column, y = row).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActivePiece {
    pub kind: ShapeKind,
    pub matrix: Matrix,
    pub x: i32,
    pub y: i32,
}

impl ActivePiece {
    pub fn new(shape: PieceShape, x: i32, y: i32) -> Self {
        Self {
            kind: shape.kind,
            matrix: shape.matrix,
            x,
            y,
        }
    }

    /// Rotates the live matrix in place; the catalog is untouched.
    pub fn rotate_cw(&mut self) {
        self.matrix = rotate_clockwise(&self.matrix);
    }

    /// Occupied cells as (row, col) offsets inside the bounding box.
    pub fn cells(&self) -> impl Iterator<Item = (i32, i32)> + '_ {
        self.matrix.iter().enumerate().flat_map(|(row, line)| {
            line.iter()
                .enumerate()
                .filter(|(_, v)| **v != 0)
                .map(move |(col, _)| (row as i32, col as i32))
        })
    }

    /// Occupied cells in absolute grid coordinates for the current anchor.
    pub fn footprint(&self) -> impl Iterator<Item = (i32, i32)> + '_ {
        self.cells().map(|(row, col)| (self.y + row, self.x + col))
    }
}
