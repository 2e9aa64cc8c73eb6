//! Grid auto-layout.

use crate::domain::Point;
use serde::{Deserialize, Serialize};

/// Row-major grid with `ceil(sqrt(n))` columns.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GridLayout {
    /// Distance of the first row and column from the canvas origin
    #[serde(default = "default_padding")]
    pub padding: f64,
    /// Distance between neighbouring cells
    #[serde(default = "default_spacing")]
    pub spacing: f64,
}

fn default_padding() -> f64 {
    200.0
}

fn default_spacing() -> f64 {
    250.0
}

impl Default for GridLayout {
    fn default() -> Self {
        Self {
            padding: default_padding(),
            spacing: default_spacing(),
        }
    }
}

impl GridLayout {
    /// Positions for `count` nodes, in array order.
    #[must_use]
    pub fn positions(&self, count: usize) -> Vec<Point> {
        let columns = columns_for(count);
        (0..count)
            .map(|i| {
                let col = (i % columns) as f64;
                let row = (i / columns) as f64;
                Point::new(
                    self.padding + col * self.spacing,
                    self.padding + row * self.spacing,
                )
            })
            .collect()
    }
}

/// Smallest `c` with `c * c >= count`, and at least 1.
fn columns_for(count: usize) -> usize {
    let mut columns = 1;
    while columns * columns < count {
        columns += 1;
    }
    columns
}
