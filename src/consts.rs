//! Общие константы: nibble-палитра, параметры раскладки, имена файлов.

// -------- Nibbles --------
/// Out-of-band "end of path" marker of the radix-path key encoding.
/// Never a real nibble (those are 0..=15).
pub const NIBBLE_TERMINATOR: u8 = 16;

/// Cell background per nibble value.
pub const NIBBLE_BG: [&str; 16] = [
    "#FFFFFF", // 0 white
    "#FBF305", // 1 yellow
    "#FF6403", // 2 orange
    "#DD0907", // 3 red
    "#F20884", // 4 magenta
    "#4700A5", // 5 purple
    "#0000D3", // 6 blue
    "#02ABEA", // 7 cyan
    "#1FB714", // 8 green
    "#006412", // 9 dark green
    "#562C05", // a brown
    "#90713A", // b tan
    "#C0C0C0", // c light grey
    "#808080", // d medium grey
    "#404040", // e dark grey
    "#000000", // f black
];

/// Label (font) colour per nibble value, chosen for contrast with NIBBLE_BG.
pub const NIBBLE_FG: [&str; 16] = [
    "#000000", "#000000", "#000000", "#000000", "#000000", "#FFFFFF", "#FFFFFF", "#000000",
    "#000000", "#FFFFFF", "#FFFFFF", "#000000", "#000000", "#000000", "#FFFFFF", "#FFFFFF",
];

pub const NIBBLE_LABELS: [char; 16] = [
    '0', '1', '2', '3', '4', '5', '6', '7', '8', '9', 'a', 'b', 'c', 'd', 'e', 'f',
];

// -------- Layout --------
/// Grids with fewer rows than this are never row-compressed.
pub const GRID_MIN_ROWS_FOR_COMPRESSION: usize = 6;
/// Grids narrower than this are never column-compressed.
pub const GRID_MIN_COLUMNS_FOR_COMPRESSION: usize = 6;
/// Rows/columns kept explicitly at each end of a compressed grid.
pub const GRID_EDGE_KEEP: usize = 2;
/// Positions kept after the elision in a compressed linear row.
pub const LINEAR_TAIL_KEEP: usize = 2;

// -------- Defaults (see config.rs) --------
pub const DEFAULT_FILE_PREFIX: &str = "changes";
pub const DEFAULT_GRID_THRESHOLD: usize = 64;
pub const DEFAULT_GRID_COLUMNS: usize = 64;
pub const DEFAULT_DOT_BIN: &str = "dot";
pub const DEFAULT_RENDER_FORMAT: &str = "png:gd";

// -------- Output --------
pub const DOT_EXT: &str = "dot";
/// Bucket name and cluster label of the catch-all category.
pub const UNCLASSIFIED_BUCKET: &str = "hashes";
