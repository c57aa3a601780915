//! Chunk planning for bounded working buffers
//!
//! A dirty area is redrawn through a fixed-size working buffer. When the
//! area has more pixels than the buffer holds, it is split into bands of
//! whole rows (and, for very wide areas, spans of columns) that each fit.

use crate::area::Area;
use crate::colorspace::Colorspace;

/// Working buffer size in 32-bit words
pub const WORKING_BUFFER_WORDS: usize = 128;

/// Mask size in words
///
/// At 1 bpp the buffer holds 32 pixels per word and the mask needs one bit
/// per pixel, so one mask word per buffer word plus a spare.
pub const MASK_WORDS: usize = WORKING_BUFFER_WORDS + 1;

/// How an area is split into chunks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ChunkPlan {
    area: Area,
    rows_per_chunk: u16,
    cols_per_chunk: u16,
    pixels_per_chunk: u32,
    words_per_chunk: usize,
    mask_words: usize,
}

impl ChunkPlan {
    /// Plan chunks for `area` through a buffer of `buffer_words` words
    pub fn new(area: &Area, colorspace: &Colorspace, buffer_words: usize) -> Self {
        let width = area.width();
        let height = area.height();
        let pixels_per_word = colorspace.pixels_per_word();
        let capacity = (buffer_words as u32).saturating_mul(pixels_per_word).max(1);

        let (rows, cols) = if area.is_empty() {
            (0, 0)
        } else if area.size() <= capacity {
            (height, width)
        } else if u32::from(width) <= capacity {
            let mut rows = (capacity / u32::from(width)).max(1) as u16;
            // A column-packed byte spans several rows; keep bytes whole
            if colorspace.packs_by_column() {
                let per_byte = colorspace.pixels_per_byte() as u16;
                if rows >= per_byte {
                    rows -= rows % per_byte;
                }
            }
            (rows, width)
        } else {
            // A single row is wider than the buffer
            let mut cols = capacity.min(u32::from(u16::MAX)) as u16;
            if colorspace.depth < 8 && colorspace.pixels_in_byte_share_row {
                let per_byte = colorspace.pixels_per_byte() as u16;
                if cols >= per_byte {
                    cols -= cols % per_byte;
                }
            }
            (1, cols)
        };

        let pixels_per_chunk = u32::from(rows) * u32::from(cols);
        let words_per_chunk = pixels_per_chunk.div_ceil(pixels_per_word) as usize;
        let mask_words = (pixels_per_chunk / 32) as usize + 1;

        Self {
            area: *area,
            rows_per_chunk: rows,
            cols_per_chunk: cols,
            pixels_per_chunk,
            words_per_chunk,
            mask_words,
        }
    }

    /// Area being split
    pub fn area(&self) -> &Area {
        &self.area
    }

    /// Rows in every chunk but possibly the last band
    pub fn rows_per_chunk(&self) -> u16 {
        self.rows_per_chunk
    }

    /// Columns in every chunk but possibly the last span
    pub fn cols_per_chunk(&self) -> u16 {
        self.cols_per_chunk
    }

    /// Largest pixel count of any chunk
    pub fn pixels_per_chunk(&self) -> u32 {
        self.pixels_per_chunk
    }

    /// Working buffer words a chunk needs
    pub fn words_per_chunk(&self) -> usize {
        self.words_per_chunk
    }

    /// Mask words a chunk needs
    pub fn mask_words(&self) -> usize {
        self.mask_words
    }

    /// Number of chunks
    pub fn chunk_count(&self) -> usize {
        if self.area.is_empty() {
            return 0;
        }
        let bands = self.area.height().div_ceil(self.rows_per_chunk);
        let spans = self.area.width().div_ceil(self.cols_per_chunk);
        usize::from(bands) * usize::from(spans)
    }

    /// Iterate chunks band by band, left to right
    pub fn chunks(&self) -> Chunks {
        Chunks {
            area: self.area,
            rows: self.rows_per_chunk,
            cols: self.cols_per_chunk,
            x: self.area.x1,
            y: self.area.y1,
        }
    }
}

/// Iterator over the chunks of a [`ChunkPlan`]
#[derive(Debug, Clone)]
pub struct Chunks {
    area: Area,
    rows: u16,
    cols: u16,
    x: i16,
    y: i16,
}

impl Iterator for Chunks {
    type Item = Area;

    fn next(&mut self) -> Option<Area> {
        if self.area.is_empty() || self.y >= self.area.y2 {
            return None;
        }

        let x2 = (i32::from(self.x) + i32::from(self.cols)).min(i32::from(self.area.x2)) as i16;
        let y2 = (i32::from(self.y) + i32::from(self.rows)).min(i32::from(self.area.y2)) as i16;
        let chunk = Area::new(self.x, self.y, x2, y2);

        if x2 >= self.area.x2 {
            self.x = self.area.x1;
            self.y = y2;
        } else {
            self.x = x2;
        }

        Some(chunk)
    }
}

/// Working buffer and mask for one refresh
///
/// Lives for a single refresh call; both arrays are re-zeroed per chunk.
pub struct RefreshSession {
    buffer: [u32; WORKING_BUFFER_WORDS],
    mask: [u32; MASK_WORDS],
}

impl Default for RefreshSession {
    fn default() -> Self {
        Self::new()
    }
}

impl RefreshSession {
    /// Create a zeroed session
    pub const fn new() -> Self {
        Self {
            buffer: [0; WORKING_BUFFER_WORDS],
            mask: [0; MASK_WORDS],
        }
    }

    /// Zero and hand out the mask and buffer slices a chunk of `plan` needs
    pub fn prepare(&mut self, plan: &ChunkPlan) -> (&mut [u32], &mut [u32]) {
        let words = plan.words_per_chunk().min(WORKING_BUFFER_WORDS);
        let mask_words = plan.mask_words().min(MASK_WORDS);

        let mask = &mut self.mask[..mask_words];
        let buffer = &mut self.buffer[..words];
        mask.fill(0);
        buffer.fill(0);
        (mask, buffer)
    }

    /// The working buffer
    pub fn buffer(&self) -> &[u32] {
        &self.buffer
    }
}

/// Copy a filled chunk into byte-addressed framebuffer memory
///
/// `src` holds the chunk's rows back to back. Each row lands at
/// `y * stride + x1 * bytes_per_pixel`. Rows falling outside `dst` are
/// skipped. Returns the number of bytes written.
pub fn copy_chunk(
    chunk: &Area,
    bytes_per_pixel: usize,
    src: &[u32],
    dst: &mut [u8],
    stride: usize,
) -> usize {
    if chunk.is_empty() || chunk.x1 < 0 || chunk.y1 < 0 {
        return 0;
    }

    let row_bytes = usize::from(chunk.width()) * bytes_per_pixel;
    let x_offset = chunk.x1 as usize * bytes_per_pixel;
    let mut src_bytes = src.iter().flat_map(|w| w.to_ne_bytes());
    let mut written = 0;

    for y in chunk.y1..chunk.y2 {
        let start = y as usize * stride + x_offset;
        let row_src = src_bytes.by_ref().take(row_bytes);
        match dst.get_mut(start..start + row_bytes) {
            Some(row) => {
                for (d, s) in row.iter_mut().zip(row_src) {
                    *d = s;
                    written += 1;
                }
            }
            None => row_src.for_each(drop),
        }
    }

    written
}
