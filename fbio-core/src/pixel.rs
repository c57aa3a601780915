//! Pixel packing helpers for working buffers
//!
//! Working buffers are `u32` slices so their alignment is fixed; pixels are
//! packed into the buffer's native-endian byte view. Multi-byte pixel values
//! are stored least significant byte first.

use crate::colorspace::Colorspace;

fn set_byte(buffer: &mut [u32], byte_index: usize, value: u8) {
    if let Some(word) = buffer.get_mut(byte_index / 4) {
        let mut bytes = word.to_ne_bytes();
        bytes[byte_index % 4] = value;
        *word = u32::from_ne_bytes(bytes);
    }
}

fn get_byte(buffer: &[u32], byte_index: usize) -> u8 {
    buffer
        .get(byte_index / 4)
        .map(|word| word.to_ne_bytes()[byte_index % 4])
        .unwrap_or(0)
}

/// Store pixel `index` of a chunk
///
/// Out-of-range indices are ignored.
pub fn write_pixel(buffer: &mut [u32], index: usize, colorspace: &Colorspace, value: u32) {
    let depth = usize::from(colorspace.depth);
    if colorspace.is_byte_aligned() {
        let bpp = depth / 8;
        let value = value.to_le_bytes();
        for (i, &b) in value.iter().take(bpp).enumerate() {
            set_byte(buffer, index * bpp + i, b);
        }
        return;
    }

    let bit = index * depth;
    let byte_index = bit / 8;
    let shift = if colorspace.reverse_pixels_in_byte {
        bit % 8
    } else {
        8 - depth - bit % 8
    };
    let mask = ((1u16 << depth) - 1) as u8;
    let current = get_byte(buffer, byte_index);
    let packed = (current & !(mask << shift)) | (((value as u8) & mask) << shift);
    set_byte(buffer, byte_index, packed);
}

/// Read back pixel `index` of a chunk
pub fn read_pixel(buffer: &[u32], index: usize, colorspace: &Colorspace) -> u32 {
    let depth = usize::from(colorspace.depth);
    if colorspace.is_byte_aligned() {
        let bpp = depth / 8;
        let mut value = [0u8; 4];
        for (i, b) in value.iter_mut().take(bpp).enumerate() {
            *b = get_byte(buffer, index * bpp + i);
        }
        return u32::from_le_bytes(value);
    }

    let bit = index * depth;
    let shift = if colorspace.reverse_pixels_in_byte {
        bit % 8
    } else {
        8 - depth - bit % 8
    };
    let mask = ((1u16 << depth) - 1) as u8;
    u32::from((get_byte(buffer, bit / 8) >> shift) & mask)
}

/// Mark pixel `index` as written
pub fn set_mask(mask: &mut [u32], index: usize) {
    if let Some(word) = mask.get_mut(index / 32) {
        *word |= 1 << (index % 32);
    }
}

/// Check whether pixel `index` was written
pub fn is_masked(mask: &[u32], index: usize) -> bool {
    mask.get(index / 32)
        .map(|word| word & (1 << (index % 32)) != 0)
        .unwrap_or(false)
}
