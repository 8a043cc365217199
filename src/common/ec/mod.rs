mod encoder;
mod galois;

pub use encoder::ReedSolomon;
pub use galois::GaloisField;

use std::ops::Deref;

// Block utilities
//------------------------------------------------------------------------------

pub fn blockify<'a, T>(data: &'a [T], sizes: &[usize]) -> Vec<&'a [T]> {
    debug_assert!(
        sizes.iter().sum::<usize>() == data.len(),
        "Data len doesn't match total size of blocks: Data len {}, Total block size {}",
        data.len(),
        sizes.iter().sum::<usize>()
    );

    let mut res = Vec::with_capacity(sizes.len());
    let mut start = 0;
    for &s in sizes {
        res.push(&data[start..start + s]);
        start += s;
    }
    res
}

pub fn interleave<T: Copy, V: Deref<Target = [T]>>(blocks: &[V]) -> Vec<T> {
    let max_block_size = blocks.iter().map(|b| b.len()).max().unwrap_or(0);
    let total_size = blocks.iter().map(|b| b.len()).sum::<usize>();
    let mut res = Vec::with_capacity(total_size);
    for i in 0..max_block_size {
        for b in blocks {
            if i < b.len() {
                res.push(b[i]);
            }
        }
    }
    res
}
