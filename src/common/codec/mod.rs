pub mod charset;
pub mod gs1;

pub use charset::{bytes, gb2312, latin1, shift_jis, FNC1};
pub use gs1::parse_gs1;
