/// A 2D raster grid stored row-major.
///
/// Unlike a planetary map this grid does not wrap: every coordinate outside
/// `[0, rows) × [0, cols)` is simply absent.
#[derive(Clone, Debug, PartialEq)]
pub struct Tilemap<T> {
    pub rows: usize,
    pub cols: usize,
    data: Vec<T>,
}

impl<T: Clone> Tilemap<T> {
    pub fn new_with(rows: usize, cols: usize, value: T) -> Self {
        Self {
            rows,
            cols,
            data: vec![value; rows * cols],
        }
    }
}

impl<T> Tilemap<T> {
    /// Wrap existing row-major data. Returns `None` if the length does not
    /// match `rows * cols`.
    pub fn from_vec(rows: usize, cols: usize, data: Vec<T>) -> Option<Self> {
        if data.len() != rows * cols {
            return None;
        }
        Some(Self { rows, cols, data })
    }

    /// Stack equally long rows into a grid of `rows.len() × cols`.
    pub(crate) fn from_rows(cols: usize, rows: Vec<Vec<T>>) -> Self {
        let n_rows = rows.len();
        let mut data = Vec::with_capacity(n_rows * cols);
        for row in rows {
            assert_eq!(row.len(), cols, "ragged row in {}-column grid", cols);
            data.extend(row);
        }
        Self { rows: n_rows, cols, data }
    }

    /// Index into the data array. Panics outside the grid, so a bad column
    /// can never alias into the next row.
    fn index(&self, row: usize, col: usize) -> usize {
        assert!(
            self.contains(row, col),
            "cell ({}, {}) outside {}x{} grid",
            row, col, self.rows, self.cols
        );
        row * self.cols + col
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn contains(&self, row: usize, col: usize) -> bool {
        row < self.rows && col < self.cols
    }

    pub fn get(&self, row: usize, col: usize) -> &T {
        &self.data[self.index(row, col)]
    }

    pub fn set(&mut self, row: usize, col: usize, value: T) {
        let idx = self.index(row, col);
        self.data[idx] = value;
    }

    /// Checked lookup that never panics.
    pub fn try_get(&self, row: usize, col: usize) -> Option<&T> {
        if self.contains(row, col) {
            Some(&self.data[row * self.cols + col])
        } else {
            None
        }
    }

    /// Resolve `(row + drow, col + dcol)` to an in-bounds coordinate.
    /// Negative or out-of-extent results are `None`.
    pub fn offset_coord(&self, row: usize, col: usize, drow: i32, dcol: i32) -> Option<(usize, usize)> {
        let r = row as i64 + drow as i64;
        let c = col as i64 + dcol as i64;
        if r < 0 || c < 0 || r >= self.rows as i64 || c >= self.cols as i64 {
            return None;
        }
        Some((r as usize, c as usize))
    }

    pub fn as_slice(&self) -> &[T] {
        &self.data
    }

    /// Iterate over all cells with their coordinates.
    pub fn iter(&self) -> impl Iterator<Item = (usize, usize, &T)> {
        let cols = self.cols;
        self.data.iter().enumerate().map(move |(idx, val)| {
            (idx / cols, idx % cols, val)
        })
    }

    /// Build a new map of the same shape by applying `f` to every cell.
    pub fn map<U>(&self, f: impl FnMut(&T) -> U) -> Tilemap<U> {
        Tilemap {
            rows: self.rows,
            cols: self.cols,
            data: self.data.iter().map(f).collect(),
        }
    }
}
