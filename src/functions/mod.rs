pub mod primitives;
pub mod registry;

pub use primitives::{PrimitiveSpec, TerminalKind, TerminalSpec};
pub use registry::PrimitiveCatalog;
