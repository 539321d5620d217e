use crate::layout::margins::PlotArea;

/// Grid of equally sized cells filled row by row (e.g. one mass spectrum
/// per pT bin).
#[derive(Debug, Clone)]
pub struct GridLayout {
    pub cells: Vec<PlotArea>,
    pub width: f64,
    pub height: f64,
}

impl GridLayout {
    /// `n` cells of `cell_width` x `cell_height`, `columns` per row.
    pub fn new(n: usize, columns: usize, cell_width: f64, cell_height: f64) -> Self {
        let columns = columns.clamp(1, n.max(1));
        let rows = n.div_ceil(columns);
        let cells = (0..n)
            .map(|i| {
                let (row, col) = (i / columns, i % columns);
                PlotArea::manual(
                    col as f64 * cell_width,
                    row as f64 * cell_height,
                    cell_width,
                    cell_height,
                )
            })
            .collect();
        Self {
            cells,
            width: columns as f64 * cell_width,
            height: rows.max(1) as f64 * cell_height,
        }
    }
}
