mod intern;
pub use intern::*;

mod error;
pub use error::*;

mod structure;
pub use structure::*;

mod parse;
pub use parse::*;

mod write;

mod composition;
pub use composition::*;

mod visualize;
pub use visualize::*;

use tracing::Level;

/// Install a global `tracing` subscriber printing events at `level` and
/// above. Unknown levels fall back to `info`. Installing twice is harmless.
pub fn init_logging(level: &str) {
    let level = level.parse::<Level>().unwrap_or(Level::INFO);
    let _ = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .try_init();
}
