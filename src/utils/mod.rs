//! Utility modules.

pub mod text;

pub use text::str_to_bool;
