//! Sensor footprint geometry: which grid cells a sensor covers this tick.

use skywatch_core::types::{Coordinate, GridCell, GridFrame};

/// Cells whose centers fall within `radius` of `center`, row-major order.
pub fn fov_cells(frame: &GridFrame, center: Coordinate, radius: f64) -> Vec<GridCell> {
    let mut cells = Vec::new();

    // Clip the sweep to the bounding box of the footprint.
    let min_row = ((center.y - radius) / frame.cell_size_m).floor().max(0.0) as usize;
    let min_col = ((center.x - radius) / frame.cell_size_m).floor().max(0.0) as usize;
    let max_row = (((center.y + radius) / frame.cell_size_m).ceil() as usize).min(frame.rows);
    let max_col = (((center.x + radius) / frame.cell_size_m).ceil() as usize).min(frame.cols);

    for row in min_row..max_row {
        for col in min_col..max_col {
            let cell = GridCell::new(row, col);
            if frame.center_of(cell).distance_to(&center) <= radius {
                cells.push(cell);
            }
        }
    }
    cells
}
