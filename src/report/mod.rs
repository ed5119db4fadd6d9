//! Table output.

pub mod writer;

pub use writer::{atlas_table_path, write_table};
