//! Reading GlycoCT condensed text into glycans.

mod lines;
pub use lines::*;

mod document;
pub(crate) use document::*;

mod repeat;
pub use repeat::*;

mod deferred;
pub use deferred::*;

mod finish;

mod reader;
pub use reader::*;
