//! Raster helpers shared by icon, pattern and picture decoders

use super::palette::{Rgba, UNDEFINED_COLOR};
use crate::cursor::ByteReader;
use crate::error::ForkError;

#[cfg(feature = "logging")]
use tracing::warn;

/// Largest pixel area a decoder will allocate
pub const MAX_PIXELS: usize = 1 << 26;

/// A QuickDraw rectangle (top, left, bottom, right)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Rect {
    pub top: i16,
    pub left: i16,
    pub bottom: i16,
    pub right: i16,
}

impl Rect {
    /// Read four big-endian `i16` values
    pub fn read(r: &mut ByteReader<'_>) -> Result<Self, ForkError> {
        Ok(Self {
            top: r.i16()?,
            left: r.i16()?,
            bottom: r.i16()?,
            right: r.i16()?,
        })
    }

    pub fn width(&self) -> i32 {
        i32::from(self.right) - i32::from(self.left)
    }

    pub fn height(&self) -> i32 {
        i32::from(self.bottom) - i32::from(self.top)
    }

    /// Width and height, failing when either is negative or the area
    /// exceeds [`MAX_PIXELS`]
    pub fn dimensions(&self) -> Result<(usize, usize), ForkError> {
        match (usize::try_from(self.width()), usize::try_from(self.height())) {
            (Ok(w), Ok(h)) if w * h <= MAX_PIXELS => Ok((w, h)),
            (Ok(w), Ok(h)) => Err(ForkError::MalformedPicture(format!(
                "rectangle {self:?} covers {} pixels, more than {MAX_PIXELS}",
                w * h
            ))),
            _ => Err(ForkError::MalformedPicture(format!(
                "rectangle {self:?} has negative dimensions"
            ))),
        }
    }

    /// Overlap of two rectangles (empty, not negative, when disjoint)
    pub fn intersect(&self, other: &Rect) -> Rect {
        let top = self.top.max(other.top);
        let left = self.left.max(other.left);
        Rect {
            top,
            left,
            bottom: self.bottom.min(other.bottom).max(top),
            right: self.right.min(other.right).max(left),
        }
    }

    /// Same size, moved by `(dy, dx)`
    pub fn offset(&self, dy: i16, dx: i16) -> Rect {
        Rect {
            top: self.top.wrapping_add(dy),
            left: self.left.wrapping_add(dx),
            bottom: self.bottom.wrapping_add(dy),
            right: self.right.wrapping_add(dx),
        }
    }
}

/// RGBA pixels covering a rectangle
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Raster {
    pub rect: Rect,
    pub pixels: Vec<u8>,
}

impl Raster {
    /// A raster filled with one color
    pub fn filled(rect: Rect, color: Rgba) -> Result<Self, ForkError> {
        let (w, h) = rect.dimensions()?;
        Ok(Self {
            rect,
            pixels: color.repeat(w * h),
        })
    }

    /// Wrap RGBA pixels, checking that their count matches `rect`
    pub fn new(rect: Rect, pixels: Vec<u8>) -> Result<Self, ForkError> {
        let (w, h) = rect.dimensions()?;
        if pixels.len() != w * h * 4 {
            return Err(ForkError::MalformedPicture(format!(
                "{} bytes of pixels for a {w}x{h} rectangle",
                pixels.len()
            )));
        }
        Ok(Self { rect, pixels })
    }

    fn stride(&self) -> usize {
        self.rect.width().max(0) as usize * 4
    }

    /// Byte offset of the pixel at absolute coordinates `(y, x)`
    fn offset_of(&self, y: i16, x: i16) -> usize {
        let dy = (i32::from(y) - i32::from(self.rect.top)) as usize;
        let dx = (i32::from(x) - i32::from(self.rect.left)) as usize;
        dy * self.stride() + dx * 4
    }

    /// The part of this raster inside `to`
    pub fn crop(&self, to: &Rect) -> Raster {
        let area = self.rect.intersect(to);
        let row_len = area.width() as usize * 4;
        let mut pixels = Vec::with_capacity(row_len * area.height() as usize);
        for y in area.top..area.bottom {
            let start = self.offset_of(y, area.left);
            pixels.extend_from_slice(&self.pixels[start..start + row_len]);
        }
        Raster { rect: area, pixels }
    }

    /// Copy this raster onto `dst` where the two overlap
    pub fn blit(&self, dst: &mut Raster) {
        let area = self.rect.intersect(&dst.rect);
        let row_len = area.width() as usize * 4;
        for y in area.top..area.bottom {
            let src = self.offset_of(y, area.left);
            let to = dst.offset_of(y, area.left);
            dst.pixels[to..to + row_len].copy_from_slice(&self.pixels[src..src + row_len]);
        }
    }

    /// Replace alpha with the mask's opacity where the two overlap
    pub fn apply_mask(&mut self, mask: &Mask) {
        let area = self.rect.intersect(&mask.rect);
        let mask_stride = mask.rect.width().max(0) as usize;
        for y in area.top..area.bottom {
            for x in area.left..area.right {
                let m = (i32::from(y) - i32::from(mask.rect.top)) as usize * mask_stride
                    + (i32::from(x) - i32::from(mask.rect.left)) as usize;
                let at = self.offset_of(y, x) + 3;
                self.pixels[at] = mask.opacity[m];
            }
        }
    }
}

/// One opacity byte (0 or 0xFF) per pixel of a rectangle
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mask {
    pub rect: Rect,
    pub opacity: Vec<u8>,
}

/// Split packed rows of `bpp`-bit pixels into one index per pixel
///
/// Rows are `row_bytes` long; pixels beyond `width` in each row are padding
/// and are dropped.
pub fn expand_indices(
    data: &[u8],
    bpp: u16,
    width: usize,
    height: usize,
    row_bytes: usize,
) -> Result<Vec<u8>, ForkError> {
    if !matches!(bpp, 1 | 2 | 4 | 8) {
        return Err(ForkError::MalformedResource(format!(
            "unsupported pixel depth {bpp}"
        )));
    }
    let bpp = usize::from(bpp);
    if width * bpp > row_bytes * 8 {
        return Err(ForkError::MalformedResource(format!(
            "{width} pixels at {bpp} bits do not fit {row_bytes}-byte rows"
        )));
    }
    if data.len() < row_bytes * height {
        return Err(ForkError::ShortRead {
            expected: row_bytes * height,
            actual: data.len(),
        });
    }

    let mask = ((1u16 << bpp) - 1) as u8;
    let mut out = Vec::with_capacity(width * height);
    for row in data.chunks_exact(row_bytes.max(1)).take(height) {
        for x in 0..width {
            let bit = x * bpp;
            let shift = 8 - bpp - bit % 8;
            out.push((row[bit / 8] >> shift) & mask);
        }
    }
    Ok(out)
}

/// Look up each index in a palette
pub fn indices_to_rgba(indices: &[u8], palette: &[Rgba]) -> Vec<u8> {
    indices
        .iter()
        .flat_map(|&i| palette.get(usize::from(i)).copied().unwrap_or(UNDEFINED_COLOR))
        .collect()
}

/// Read a color table: seed (4), flags (2), count-1 (2), then
/// `{value, r, g, b}` entries of four `u16` each
///
/// Entries whose value is zero or out of range, and every entry of a device
/// table (flags bit 15), are placed at their sequential position.
pub fn read_color_table(r: &mut ByteReader<'_>) -> Result<[Rgba; 256], ForkError> {
    let _seed = r.u32()?;
    let flags = r.u16()?;
    let count = usize::from(r.u16()?) + 1;
    if count > 256 {
        return Err(ForkError::MalformedResource(format!(
            "color table with {count} entries"
        )));
    }

    let mut table = [UNDEFINED_COLOR; 256];
    for i in 0..count {
        let value = usize::from(r.u16()?);
        let slot = if flags & 0x8000 != 0 || value == 0 || value >= 256 {
            i
        } else {
            value
        };
        #[cfg(feature = "logging")]
        if value >= 256 {
            warn!("Color table entry {i} has out-of-range index {value}");
        }
        let [red, green, blue] = [r.u16()?, r.u16()?, r.u16()?].map(|c| (c >> 8) as u8);
        table[slot] = [red, green, blue, 0xFF];
    }
    Ok(table)
}
