use std::fmt::{Display, Formatter};

use image::GrayImage;

use super::grid::Grid;

// Symbology
//------------------------------------------------------------------------------

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Symbology {
    Aztec,
    GridMatrix,
    MaxiCode,
    MicroQR,
}

impl Display for Symbology {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Aztec => "Aztec Code",
            Self::GridMatrix => "Grid Matrix",
            Self::MaxiCode => "MaxiCode",
            Self::MicroQR => "Micro QR Code",
        };
        f.write_str(name)
    }
}

// Encode trace
//------------------------------------------------------------------------------

/// Human readable trace of the decisions taken while encoding. Diagnostic
/// only.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct EncodeInfo {
    lines: Vec<String>,
}

impl EncodeInfo {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, line: impl Into<String>) {
        self.lines.push(line.into());
    }

    pub fn push_codewords(&mut self, label: &str, words: &[u16]) {
        let joined = words.iter().map(|w| w.to_string()).collect::<Vec<_>>().join(" ");
        self.lines.push(format!("{label}: {joined}"));
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }
}

impl Display for EncodeInfo {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        for line in self.lines.iter() {
            writeln!(f, "{line}")?;
        }
        Ok(())
    }
}

// Symbol
//------------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SymbolInfo {
    pub symbology: Symbology,
    /// Selected size, version or mode, e.g. `"Compact 2"`, `"M3"`, `"Mode 4"`
    pub size: String,
    /// Selected error correction level, e.g. `"23%"`, `"L"`, `"3"`
    pub ec_level: String,
    pub data_codewords: usize,
    pub ec_codewords: usize,
    pub codeword_bits: usize,
    pub trace: EncodeInfo,
}

impl SymbolInfo {
    pub fn total_codewords(&self) -> usize {
        self.data_codewords + self.ec_codewords
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Symbol {
    grid: Grid,
    info: SymbolInfo,
}

impl Symbol {
    pub fn new(grid: Grid, info: SymbolInfo) -> Self {
        Self { grid, info }
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn info(&self) -> &SymbolInfo {
        &self.info
    }

    pub fn width(&self) -> usize {
        self.grid.width()
    }

    pub fn height(&self) -> usize {
        self.grid.height()
    }

    pub fn to_debug_str(&self) -> String {
        self.grid.to_debug_str()
    }

    pub fn render(&self, module_sz: u32) -> GrayImage {
        let quiet_zone = match self.info.symbology {
            Symbology::Aztec | Symbology::MaxiCode => 1,
            Symbology::GridMatrix => 6,
            Symbology::MicroQR => 2,
        };
        self.grid.render(module_sz, quiet_zone)
    }
}

impl Display for SymbolInfo {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} {}, EC {}, {} data + {} ec codewords of {} bits",
            self.symbology,
            self.size,
            self.ec_level,
            self.data_codewords,
            self.ec_codewords,
            self.codeword_bits
        )
    }
}
