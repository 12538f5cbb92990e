//! UI tree snapshots: model, streaming parser and query layer.

pub mod model;
pub mod parser;
pub mod query;

pub use model::{Element, OsKind, Tree, Visibility, Window, WindowKind};
pub use parser::{parse_tree, parse_tree_bytes};
pub use query::{enumerate, filter, find, Elements};
