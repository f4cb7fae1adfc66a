//! layout — решает, какие nibble рисовать явно, а какие схлопнуть в маркер.
//!
//! Two modes:
//! - linear (one table row): keys and short values;
//! - grid (`columns` cells per row): long values.
//!
//! Plans are plain data; `dot.rs` turns them into table cells. Positions are
//! counted on the payload only, the terminator of a [`NibbleSeq`] is never
//! part of a plan.

use crate::consts::{
    GRID_EDGE_KEEP, GRID_MIN_COLUMNS_FOR_COMPRESSION, GRID_MIN_ROWS_FOR_COMPRESSION,
    LINEAR_TAIL_KEEP,
};
use crate::nibble::NibbleSeq;

// -------------------- linear --------------------

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LinearCell {
    /// Coloured cell with its hex label.
    Filled(u8),
    /// Coloured cell, no label.
    Empty(u8),
    /// Thin dash standing for the collapsed middle.
    Elision,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LinearPlan {
    pub cells: Vec<LinearCell>,
}

impl LinearPlan {
    /// Cells that show a nibble (everything except the elision marker).
    pub fn explicit_count(&self) -> usize {
        self.cells
            .iter()
            .filter(|c| !matches!(c, LinearCell::Elision))
            .count()
    }

    pub fn elision_count(&self) -> usize {
        self.cells.len() - self.explicit_count()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

/// Plan one row of cells.
///
/// - positions `< skip` are not drawn at all (already shown elsewhere);
/// - positions `< highlighted` are `Filled`, the rest `Empty`;
/// - `compression == 0`: every remaining position is drawn;
/// - `compression > 0`: head `[0, L-compression-2)` and tail `[L-2, L)` are
///   drawn, a single `Elision` sits at `L-3`. With `L < 3` there is no middle
///   to collapse and everything is drawn.
pub fn plan_linear(seq: &NibbleSeq, skip: usize, highlighted: usize, compression: usize) -> LinearPlan {
    let data = seq.as_slice();
    let len = data.len();
    let collapsible = compression > 0 && len > LINEAR_TAIL_KEEP;
    let mut cells = Vec::with_capacity(len.saturating_sub(skip).min(len));

    for (i, &n) in data.iter().enumerate() {
        if i < skip {
            continue;
        }
        let in_head = i + compression + LINEAR_TAIL_KEEP < len;
        let in_tail = i + LINEAR_TAIL_KEEP >= len;
        if !collapsible || in_head || in_tail {
            cells.push(if i < highlighted {
                LinearCell::Filled(n)
            } else {
                LinearCell::Empty(n)
            });
        } else if i + LINEAR_TAIL_KEEP + 1 == len {
            cells.push(LinearCell::Elision);
        }
    }
    LinearPlan { cells }
}

/// Compression that leaves exactly `max_cells` explicit cells (never fewer
/// than the tail) for a sequence of `len` nibbles; 0 when it already fits.
pub fn compression_for_budget(len: usize, max_cells: usize) -> usize {
    len.saturating_sub(max_cells.max(LINEAR_TAIL_KEEP))
}

// -------------------- grid --------------------

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GridCell {
    Nibble { value: u8, labeled: bool },
    /// Stands for the collapsed middle columns of a band of `rowspan` rows.
    VerticalElision { rowspan: usize },
    /// Empty filler after the last nibble of a short row.
    Pad { colspan: usize },
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GridRow {
    Cells(Vec<GridCell>),
    /// Full-width empty row standing for the collapsed middle rows.
    Spacer { colspan: usize },
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GridPlan {
    pub columns: usize,
    /// Rows the full sequence occupies (`ceil(len / columns)`).
    pub total_rows: usize,
    pub rows: Vec<GridRow>,
}

impl GridPlan {
    pub fn nibble_cells(&self) -> usize {
        self.rows
            .iter()
            .map(|r| match r {
                GridRow::Cells(cells) => cells
                    .iter()
                    .filter(|c| matches!(c, GridCell::Nibble { .. }))
                    .count(),
                GridRow::Spacer { .. } => 0,
            })
            .sum()
    }

    pub fn spacer_rows(&self) -> usize {
        self.rows
            .iter()
            .filter(|r| matches!(r, GridRow::Spacer { .. }))
            .count()
    }
}

/// Plan a block of `columns` cells per row.
///
/// Rows compress when `compressed && rows >= 6`: rows 0,1 and the last two
/// are kept and one spacer row replaces the rest. Columns compress when
/// `compressed && columns >= 6`: columns 0,1 and the last two are kept and one
/// vertical elision per two-row band replaces the rest. `columns == 0` is
/// treated as 1.
pub fn plan_grid(seq: &NibbleSeq, columns: usize, compressed: bool, highlighted: bool) -> GridPlan {
    let columns = columns.max(1);
    let data = seq.as_slice();
    let total_rows = data.len().div_ceil(columns);

    let row_cmp = compressed && total_rows >= GRID_MIN_ROWS_FOR_COMPRESSION;
    let col_cmp = compressed && columns >= GRID_MIN_COLUMNS_FOR_COMPRESSION;

    let row_visible = |r: usize| !row_cmp || r < GRID_EDGE_KEEP || r + GRID_EDGE_KEEP >= total_rows;
    let col_visible = |c: usize| !col_cmp || c < GRID_EDGE_KEEP || c + GRID_EDGE_KEEP >= columns;
    // Band = up to two adjacent rendered rows sharing one vertical elision.
    let band_of = |r: usize| -> (usize, usize) {
        let start = if row_cmp && r + GRID_EDGE_KEEP >= total_rows {
            total_rows - GRID_EDGE_KEEP
        } else {
            r - r % 2
        };
        (start, (total_rows - start).min(2))
    };
    let visible_width = if col_cmp {
        2 * GRID_EDGE_KEEP + 1
    } else {
        columns
    };

    let mut rows = Vec::new();
    for r in 0..total_rows {
        if row_visible(r) {
            let start = r * columns;
            let row_data = &data[start..(start + columns).min(data.len())];
            let (band_start, band_len) = band_of(r);
            let mut cells = Vec::new();
            for (c, &value) in row_data.iter().enumerate() {
                if col_visible(c) {
                    cells.push(GridCell::Nibble {
                        value,
                        labeled: highlighted,
                    });
                }
                if col_cmp && c == GRID_EDGE_KEEP && r == band_start {
                    cells.push(GridCell::VerticalElision { rowspan: band_len });
                }
            }
            // короткая строка, не дошедшая до колонки элизии
            if col_cmp && r == band_start && row_data.len() <= GRID_EDGE_KEEP {
                cells.push(GridCell::VerticalElision { rowspan: band_len });
            }
            if row_data.len() < columns {
                let missing = (row_data.len()..columns).filter(|&c| col_visible(c)).count();
                if missing > 0 {
                    cells.push(GridCell::Pad { colspan: missing });
                }
            }
            rows.push(GridRow::Cells(cells));
        }
        if row_cmp && r == GRID_EDGE_KEEP {
            rows.push(GridRow::Spacer {
                colspan: visible_width,
            });
        }
    }

    GridPlan {
        columns,
        total_rows,
        rows,
    }
}
