mod codec;
mod layout;
mod placement;

pub use layout::{ECLevel, Version};

use log::debug;

use crate::common::{
    codec::{bytes, gb2312},
    error::SymbolResult,
    metadata::{EncodeInfo, Symbol, SymbolInfo, Symbology},
};
use layout::{add_ecc, layer_id_bits, max_data_codewords, pad_codewords, select_version};
use placement::placement_map;

// Grid Matrix builder
//------------------------------------------------------------------------------

pub struct GridMatrixBuilder {
    codes: Vec<i32>,
    version: Option<Version>,
    ec_level: Option<ECLevel>,
}

impl GridMatrixBuilder {
    /// Raw bytes, encoded as they are
    pub fn new(data: &[u8]) -> Self {
        Self::from_codes(bytes(data))
    }

    /// Text converted to GB2312 so Chinese characters use Chinese mode
    pub fn from_text(text: &str) -> SymbolResult<Self> {
        Ok(Self::from_codes(gb2312(text)?))
    }

    /// Single byte codes and `(lead << 8) | trail` GB2312 codes
    pub fn from_codes(codes: Vec<i32>) -> Self {
        Self { codes, version: None, ec_level: None }
    }

    pub fn version(&mut self, version: Version) -> &mut Self {
        self.version = Some(version);
        self
    }

    pub fn unset_version(&mut self) -> &mut Self {
        self.version = None;
        self
    }

    pub fn ec_level(&mut self, ec_level: ECLevel) -> &mut Self {
        self.ec_level = Some(ec_level);
        self
    }

    pub fn unset_ec_level(&mut self) -> &mut Self {
        self.ec_level = None;
        self
    }

    pub fn metadata(&self) -> String {
        let ecl = self.ec_level.map_or("Auto".to_owned(), |l| l.to_string());
        match self.version {
            Some(v) => format!("{{ {v}, Ec level: {ecl} }}"),
            None => format!("{{ Version: None, Ec level: {ecl} }}"),
        }
    }

    pub fn build(&self) -> SymbolResult<Symbol> {
        debug!("Generating Grid Matrix {}", self.metadata());

        let max_bits = max_data_codewords(self.ec_level, self.version) * 7;
        let bits = codec::encode(&self.codes, max_bits)?;
        let (version, ec_level) = select_version(bits.len(), self.ec_level, self.version)?;
        debug!("Selected {version} at {ec_level} for {} bits", bits.len());

        let mut trace = EncodeInfo::new();
        trace.push(format!("{version}, Ec level {ec_level}"));

        let data_len = version.data_codewords(ec_level);
        let mut data = bits.words(7);
        pad_codewords(&mut data, data_len);
        trace.push_codewords("Data codewords", &data);

        let (payload, ecc) = add_ecc(&data, version, ec_level)?;
        trace.push_codewords("EC codewords", &ecc);
        let descriptor = layer_id_bits(version, ec_level);

        let map = placement_map(version);
        map.check_coverage(payload.len(), descriptor.len())?;
        let grid = map.place(&payload, &descriptor)?;

        let info = SymbolInfo {
            symbology: Symbology::GridMatrix,
            size: version.to_string(),
            ec_level: ec_level.to_string(),
            data_codewords: data.len(),
            ec_codewords: ecc.len(),
            codeword_bits: 7,
            trace,
        };
        Ok(Symbol::new(grid, info))
    }
}
