//! Named pointer chains and their resolution.

mod chain;
mod resolver;
mod table;

pub use chain::{PointerChain, PointerId};
pub use resolver::PointerResolver;
pub use table::PointerTable;
