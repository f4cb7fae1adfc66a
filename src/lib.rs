// Базовые модули
pub mod consts;
pub mod config;
pub mod error;
pub mod metrics;
pub mod util;

// Конвейер: снапшоты → diff → классификация → nibble → раскладка → DOT
pub mod snapshot;
pub mod diff;
pub mod taxonomy;
pub mod nibble;
pub mod layout;
pub mod dot;
pub mod viz;

pub mod cli;

// Удобные реэкспорты
pub use config::VizConfig;
pub use diff::{diff, diff_stream, ChangedEntry};
pub use error::VizError;
pub use nibble::{from_nibbles, keybytes_to_hex, to_nibbles, NibbleSeq};
pub use snapshot::{MemSnapshot, Snapshot};
pub use taxonomy::{Category, CategoryId, Classification, Taxonomy};
pub use viz::{compare_series, DiffReport, DotCommand, NoRender, Renderer, Visualizer};
