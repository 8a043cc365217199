//! # matrism
//!
//! A Rust library for encoding two-dimensional matrix barcodes with Reed-Solomon error
//! correction over configurable Galois fields.
//!
//! ## Features
//!
//! - **Aztec Code**: Compact and full-range symbols with bit stuffing, GS1 and reader initialisation
//! - **Grid Matrix**: Chinese-oriented symbols with GB2312 double-byte compaction
//! - **MaxiCode**: Fixed-size hexagonal symbols with structured carrier messages (modes 2 to 6)
//! - **Micro QR**: Versions M1 to M4 with optimal segmentation and automatic masking
//!
//! Every builder produces a [`Symbol`]: a boolean module [`Grid`] and a [`SymbolInfo`] describing
//! the selected size, error correction level and codeword counts.
//!
//! ## Quick Start
//!
//! ### Simple Aztec Code Generation
//!
//! ```rust
//! use matrism::AztecBuilder;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! // Simplest usage - size and layers are chosen automatically
//! let symbol = AztecBuilder::new(b"Hello, World!").build()?;
//! assert_eq!(symbol.info().size, "Compact 2");
//!
//! let img = symbol.render(4);  // 4 pixels per module, quiet zone included
//! assert_eq!(img.width() as usize, (symbol.width() + 2) * 4);
//! # Ok(())
//! # }
//! ```
//!
//! ### Full Configuration
//!
//! ```rust
//! use matrism::microqr::{ECLevel, MaskPattern, Version};
//! use matrism::MicroQRBuilder;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let symbol = MicroQRBuilder::new(b"01234567")
//!     .version(Version::new(2)?)     // M2 - if not provided, finds smallest version to fit data
//!     .ec_level(ECLevel::M)          // if not provided, defaults to ECLevel::L
//!     .mask(MaskPattern::new(1)?)    // if not provided, finds best mask by the Micro QR score
//!     .build()?;
//! assert_eq!(symbol.width(), 13);
//! # Ok(())
//! # }
//! ```
//!
//! ### Chinese Text in Grid Matrix
//!
//! ```rust
//! use matrism::gridmatrix::ECLevel;
//! use matrism::GridMatrixBuilder;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let symbol = GridMatrixBuilder::from_text("中文")?.ec_level(ECLevel::new(4)?).build()?;
//! println!("{}", symbol.info().trace);
//! # Ok(())
//! # }
//! ```
//!
//! ### MaxiCode with a Structured Carrier Message
//!
//! ```rust
//! use matrism::maxicode::Primary;
//! use matrism::MaxiCodeBuilder;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let symbol = MaxiCodeBuilder::new(b"[)>\x1e01\x1d96")
//!     .primary(Primary::new("152382802", 840, 1))  // numeric postcode selects mode 2
//!     .build()?;
//! assert_eq!(symbol.info().size, "Mode 2");
//! # Ok(())
//! # }
//! ```
//!
//! ## Errors
//!
//! All failures are reported as [`SymbolError`]. [`SymbolError::kind`] groups them into invalid
//! input, exceeded capacity, conflicting options and internal defects. No partial symbol is ever
//! returned.

pub mod aztec;
pub mod common;
pub mod gridmatrix;
pub mod maxicode;
pub mod microqr;

pub use aztec::AztecBuilder;
pub use common::error::{ErrorKind, SymbolError, SymbolResult};
pub use common::grid::Grid;
pub use common::metadata::{EncodeInfo, Symbol, SymbolInfo, Symbology};
pub use gridmatrix::GridMatrixBuilder;
pub use maxicode::MaxiCodeBuilder;
pub use microqr::MicroQRBuilder;
