pub mod bit_utils;
pub mod codec;
pub mod ec;
pub mod error;
pub mod grid;
pub mod metadata;

pub use bit_utils::*;
pub use error::*;
pub use grid::*;
pub use metadata::*;
