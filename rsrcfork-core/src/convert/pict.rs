//! Picture (`PICT`), color icon (`cicn`) and pixel pattern (`ppat`) decoders
//!
//! Pictures are interpreted as a raster canvas: only the copy-bits family of
//! opcodes draws anything, every state-setting opcode is skipped, and any
//! vector, text or QuickTime opcode rejects the whole picture.

use super::packbits::unpack_rows;
use super::palette::Rgba;
use super::raster::{expand_indices, indices_to_rgba, read_color_table, Mask, Raster, Rect};
use super::{ConvertContext, ConvertedArtifact};
use crate::cursor::ByteReader;
use crate::error::ForkError;
use crate::types::Resource;

#[cfg(feature = "logging")]
use tracing::{debug, warn};

const WHITE: Rgba = [0xFF, 0xFF, 0xFF, 0xFF];
const MONO: [Rgba; 2] = [WHITE, [0x00, 0x00, 0x00, 0xFF]];

const OP_BITS_RECT: u16 = 0x90;
const OP_BITS_RGN: u16 = 0x91;
const OP_PACK_BITS_RGN: u16 = 0x99;
const OP_DIRECT_BITS_RECT: u16 = 0x9A;
const OP_DIRECT_BITS_RGN: u16 = 0x9B;

/// What the interpreter does with an opcode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Action {
    /// Fixed-size operand
    Skip(usize),
    /// Region operand whose first word is its own total size
    SkipRegion,
    /// Operand preceded by a 16-bit length
    SkipWordLen,
    /// Operand preceded by a 32-bit length
    SkipLongLen,
    /// Kind word, then a 16-bit length and that many bytes
    LongComment,
    CopyBits,
    End,
    Unsupported,
}

fn classify(op: u16) -> Action {
    match op {
        0x0000 | 0x0017..=0x0019 | 0x001C | 0x001E => Action::Skip(0),
        0x0001 => Action::SkipRegion,
        0x0004 | 0x0011 => Action::Skip(1),
        0x0003 | 0x0005 | 0x0008 | 0x000D | 0x0015 | 0x0016 | 0x00A0 => Action::Skip(2),
        0x0006 | 0x0007 | 0x000B | 0x000C | 0x000E | 0x000F => Action::Skip(4),
        0x0002 | 0x0009 | 0x000A | 0x0010 => Action::Skip(8),
        0x001A | 0x001B | 0x001D | 0x001F => Action::Skip(6),
        0x0024..=0x0027 | 0x002C..=0x002F => Action::SkipWordLen,
        0x0035..=0x0037 | 0x0045..=0x0047 | 0x0055..=0x0057 => Action::Skip(8),
        0x003D..=0x003F | 0x004D..=0x004F | 0x005D..=0x005F => Action::Skip(0),
        0x0065..=0x0067 => Action::Skip(12),
        0x006D..=0x006F => Action::Skip(4),
        0x0075..=0x0077 | 0x0085..=0x0087 => Action::SkipRegion,
        0x007D..=0x007F | 0x008D..=0x008F => Action::Skip(0),
        OP_BITS_RECT | OP_BITS_RGN | 0x0098 | OP_PACK_BITS_RGN | OP_DIRECT_BITS_RECT
        | OP_DIRECT_BITS_RGN => Action::CopyBits,
        0x0092..=0x0097 | 0x009C..=0x009F | 0x00A2..=0x00AF => Action::SkipWordLen,
        0x00A1 => Action::LongComment,
        0x00B0..=0x00CF => Action::Skip(0),
        0x00D0..=0x00FE => Action::SkipLongLen,
        0x00FF => Action::End,
        0x02FF => Action::Skip(2),
        0x0100..=0x7FFF => Action::Skip(usize::from(op >> 8) * 2),
        0x8000..=0x80FF => Action::Skip(0),
        // QuickTime payloads
        0x8200 | 0x8201 => Action::Unsupported,
        0x8100..=0xFFFF => Action::SkipLongLen,
        // pixel patterns, lines, text, shapes, polygons and regions
        _ => Action::Unsupported,
    }
}

/// Pixel map header fields that matter for decoding
#[derive(Debug, Clone, Copy)]
struct PixMap {
    row_bytes: usize,
    bounds: Rect,
    pack_type: u16,
    pixel_size: u16,
    cmp_count: u16,
    pm_table: u32,
}

#[derive(Debug, Clone, Copy)]
enum Frame {
    Bitmap { row_bytes: usize, bounds: Rect },
    Pixmap(PixMap),
}

impl Frame {
    fn bounds(&self) -> Rect {
        match self {
            Frame::Bitmap { bounds, .. } => *bounds,
            Frame::Pixmap(pm) => pm.bounds,
        }
    }
}

/// Read a bitmap or (when bit 15 of the row-bytes word is set) a pixel map
fn read_frame(r: &mut ByteReader<'_>) -> Result<Frame, ForkError> {
    let flagged = r.u16()?;
    let row_bytes = usize::from(flagged & 0x7FFF);
    let bounds = Rect::read(r)?;
    if flagged & 0x8000 == 0 {
        return Ok(Frame::Bitmap { row_bytes, bounds });
    }
    let _pm_version = r.u16()?;
    let pack_type = r.u16()?;
    let _pack_size = r.u32()?;
    let _h_res = r.u32()?;
    let _v_res = r.u32()?;
    let _pixel_type = r.u16()?;
    let pixel_size = r.u16()?;
    let cmp_count = r.u16()?;
    let _cmp_size = r.u16()?;
    let _plane_bytes = r.u32()?;
    let pm_table = r.u32()?;
    r.skip(4)?;
    Ok(Frame::Pixmap(PixMap {
        row_bytes,
        bounds,
        pack_type,
        pixel_size,
        cmp_count,
        pm_table,
    }))
}

/// Decode a picture into a canvas the size of its frame
pub fn decode_pict(res: &Resource, _ctx: &ConvertContext<'_>) -> Result<ConvertedArtifact, ForkError> {
    let canvas = render_picture(&res.data)?;
    let (w, h) = canvas.rect.dimensions()?;
    Ok(ConvertedArtifact::Png {
        width: w as u32,
        height: h as u32,
        pixels: canvas.pixels,
    })
}

/// Run the opcode stream of a picture and return the resulting canvas
pub fn render_picture(data: &[u8]) -> Result<Raster, ForkError> {
    let mut r = ByteReader::new(data);
    let _v1_size = r.u16()?;
    let frame = Rect::read(&mut r)?;
    let (w, h) = frame.dimensions()?;
    if w == 0 || h == 0 {
        return Err(ForkError::MalformedPicture(format!("empty picture frame {frame:?}")));
    }
    let mut canvas = Raster::filled(frame, WHITE)?;

    let version = match (r.u8()?, r.u8()?) {
        (0x11, 0x01) => 1,
        (0x00, 0x11) => match (r.u8()?, r.u8()?) {
            (0x02, 0xFF) => 2,
            (v, _) => {
                return Err(ForkError::MalformedPicture(format!(
                    "unsupported picture version {v}"
                )))
            }
        },
        _ => return Err(ForkError::MalformedPicture("missing version opcode".to_string())),
    };

    #[cfg(feature = "logging")]
    debug!("Picture v{} with frame {}x{}", version, w, h);

    loop {
        if version == 2 && r.position() % 2 == 1 {
            r.skip(1)?;
        }
        let offset = r.position();
        let op = if version == 1 {
            u16::from(r.u8()?)
        } else {
            r.u16()?
        };

        match classify(op) {
            Action::Skip(n) => r.skip(n)?,
            Action::SkipRegion => {
                let size = usize::from(r.u16()?);
                r.skip(size.saturating_sub(2))?;
            }
            Action::SkipWordLen => {
                let len = usize::from(r.u16()?);
                r.skip(len)?;
            }
            Action::SkipLongLen => {
                let len = r.u32()? as usize;
                r.skip(len)?;
            }
            Action::LongComment => {
                let _kind = r.u16()?;
                let len = usize::from(r.u16()?);
                r.skip(len)?;
            }
            Action::CopyBits => copy_bits(&mut r, op)?.blit(&mut canvas),
            Action::End => break,
            Action::Unsupported => {
                return Err(ForkError::UnsupportedPictureOpcode { opcode: op, offset })
            }
        }
    }

    Ok(canvas)
}

/// Decode one copy-bits record into a raster positioned at its destination
fn copy_bits(r: &mut ByteReader<'_>, op: u16) -> Result<Raster, ForkError> {
    let direct = matches!(op, OP_DIRECT_BITS_RECT | OP_DIRECT_BITS_RGN);
    let packed = op != OP_BITS_RECT && op != OP_BITS_RGN;
    let has_region = matches!(op, OP_BITS_RGN | OP_PACK_BITS_RGN | OP_DIRECT_BITS_RGN);

    if direct {
        r.skip(4)?;
    }
    let frame = read_frame(r)?;
    let palette = match frame {
        Frame::Pixmap(_) if !direct => Some(read_color_table(r)?),
        _ => None,
    };
    let src = Rect::read(r)?;
    let dst = Rect::read(r)?;
    let mode = r.i16()? & !64;

    #[cfg(feature = "logging")]
    {
        if mode != 0 {
            warn!("Ignoring transfer mode {} in picture", mode);
        }
        if src.width() != dst.width() || src.height() != dst.height() {
            warn!("Scaled copy {:?} -> {:?} drawn unscaled", src, dst);
        }
    }
    #[cfg(not(feature = "logging"))]
    let _ = mode;

    let mask = if has_region { read_mask_region(r)? } else { None };

    let pixels = match frame {
        Frame::Bitmap { row_bytes, bounds } => {
            let (w, h) = bounds.dimensions()?;
            let rows = read_rows(r, row_bytes, h, 1, packed)?;
            indices_to_rgba(&expand_indices(&rows, 1, w, h, row_bytes)?, &MONO)
        }
        Frame::Pixmap(pm) => decode_pixmap(r, &pm, palette.as_ref(), packed)?,
    };

    let mut raster = Raster::new(frame.bounds(), pixels)?;
    if let Some(mask) = mask {
        raster.apply_mask(&mask);
    }
    let cropped = raster.crop(&src);
    let dy = dst.top.wrapping_sub(src.top);
    let dx = dst.left.wrapping_sub(src.left);
    Ok(Raster {
        rect: cropped.rect.offset(dy, dx),
        pixels: cropped.pixels,
    })
}

fn read_rows(
    r: &mut ByteReader<'_>,
    row_bytes: usize,
    rows: usize,
    item_size: usize,
    packed: bool,
) -> Result<Vec<u8>, ForkError> {
    if packed {
        unpack_rows(r, row_bytes, rows, item_size)
    } else {
        Ok(r.bytes(row_bytes * rows)?.to_vec())
    }
}

fn decode_pixmap(
    r: &mut ByteReader<'_>,
    pm: &PixMap,
    palette: Option<&[Rgba; 256]>,
    packed: bool,
) -> Result<Vec<u8>, ForkError> {
    let (w, h) = pm.bounds.dimensions()?;
    let unpacked = !packed || pm.pack_type == 1 || pm.row_bytes < 8;

    match (pm.pixel_size, pm.pack_type) {
        (1 | 2 | 4 | 8, _) => {
            let palette = palette.ok_or_else(|| {
                ForkError::MalformedPicture("indexed pixel map without a color table".to_string())
            })?;
            let rows = read_rows(r, pm.row_bytes, h, 1, !unpacked)?;
            let indices = expand_indices(&rows, pm.pixel_size, w, h, pm.row_bytes)?;
            Ok(indices_to_rgba(&indices, palette))
        }
        (_, 2) => Err(ForkError::MalformedPicture(
            "pack type 2 pixel maps are not supported".to_string(),
        )),
        (16, 0 | 1 | 3) => {
            let rows = read_rows(r, pm.row_bytes, h, 2, !unpacked)?;
            let row_items = pm.row_bytes / 2;
            if w > row_items || rows.len() < row_items * 2 * h {
                return Err(ForkError::MalformedPicture(format!(
                    "16-bit rows of {} bytes cannot hold {w} pixels",
                    pm.row_bytes
                )));
            }
            let mut out = Vec::with_capacity(w * h * 4);
            for row in rows.chunks_exact(pm.row_bytes.max(2)).take(h) {
                for px in row.chunks_exact(2).take(w) {
                    let v = u16::from_be_bytes([px[0], px[1]]);
                    let scale = |c: u16| ((c & 0x1F) * 255 / 31) as u8;
                    out.extend_from_slice(&[scale(v >> 10), scale(v >> 5), scale(v), 0xFF]);
                }
            }
            Ok(out)
        }
        (32, 0 | 4) if !unpacked => {
            let planes = usize::from(pm.cmp_count);
            if !matches!(planes, 3 | 4) {
                return Err(ForkError::MalformedPicture(format!(
                    "{planes} color components in a 32-bit pixel map"
                )));
            }
            let rows = unpack_rows(r, pm.row_bytes, h, 1)?;
            if rows.len() != planes * w * h {
                return Err(ForkError::MalformedPicture(format!(
                    "planar data holds {} bytes, expected {}",
                    rows.len(),
                    planes * w * h
                )));
            }
            let mut out = Vec::with_capacity(w * h * 4);
            for row in rows.chunks_exact(planes * w.max(1)).take(h) {
                for x in 0..w {
                    let plane = |i: usize| row[i * w + x];
                    if planes == 4 {
                        out.extend_from_slice(&[plane(1), plane(2), plane(3), plane(0)]);
                    } else {
                        out.extend_from_slice(&[plane(0), plane(1), plane(2), 0xFF]);
                    }
                }
            }
            Ok(out)
        }
        (32, _) => {
            // chunky xRGB
            let rows = r.bytes(pm.row_bytes * h)?;
            if w * 4 > pm.row_bytes {
                return Err(ForkError::MalformedPicture(format!(
                    "32-bit rows of {} bytes cannot hold {w} pixels",
                    pm.row_bytes
                )));
            }
            let mut out = Vec::with_capacity(w * h * 4);
            for row in rows.chunks_exact(pm.row_bytes.max(1)).take(h) {
                for px in row.chunks_exact(4).take(w) {
                    out.extend_from_slice(&[px[1], px[2], px[3], 0xFF]);
                }
            }
            Ok(out)
        }
        (size, pack) => Err(ForkError::MalformedPicture(format!(
            "unsupported pixel map: {size} bits per pixel, pack type {pack}"
        ))),
    }
}

/// Read a region and rasterize it to an opacity mask
///
/// Rectangular regions (no scanline data) yield `None`. Otherwise the data is
/// a list of rows, each a y coordinate followed by x coordinates at which
/// inclusion toggles, terminated by `0x7FFF`; each row's toggles apply from
/// that y downwards.
fn read_mask_region(r: &mut ByteReader<'_>) -> Result<Option<Mask>, ForkError> {
    let size = usize::from(r.u16()?);
    let rect = Rect::read(r)?;
    let body = r.bytes(size.saturating_sub(10))?;
    if body.is_empty() {
        return Ok(None);
    }

    let (w, h) = rect.dimensions()?;
    let mut opacity = Vec::with_capacity(w * h);
    let mut scanline = vec![0u8; w];
    let mut last_row = i32::from(rect.top);
    let mut b = ByteReader::new(body);

    let out_of_bounds =
        |what: String| ForkError::MalformedPicture(format!("mask region {what} outside {rect:?}"));

    loop {
        let row = b.i16()?;
        if row == 0x7FFF {
            break;
        }
        let row = i32::from(row);
        if row < last_row || row > i32::from(rect.bottom) {
            return Err(out_of_bounds(format!("row {row}")));
        }
        for _ in last_row..row {
            opacity.extend_from_slice(&scanline);
        }
        last_row = row;

        loop {
            let left = b.i16()?;
            if left == 0x7FFF {
                break;
            }
            let right = b.i16()?;
            let from = i32::from(left) - i32::from(rect.left);
            let to = i32::from(right) - i32::from(rect.left);
            if from < 0 || to < from || to as usize > w {
                return Err(out_of_bounds(format!("span {left}..{right}")));
            }
            for px in &mut scanline[from as usize..to as usize] {
                *px ^= 0xFF;
            }
        }
    }
    while opacity.len() < w * h {
        opacity.extend_from_slice(&scanline);
    }
    opacity.truncate(w * h);

    Ok(Some(Mask { rect, opacity }))
}

/// Decode `cicn`: pixel map, mask bitmap, black-and-white bitmap, then the
/// mask and bitmap bits, a color table and finally the pixel data
pub fn decode_cicn(res: &Resource, _ctx: &ConvertContext<'_>) -> Result<ConvertedArtifact, ForkError> {
    let mut r = ByteReader::new(&res.data);
    r.skip(4)?;
    let Frame::Pixmap(icon) = read_frame(&mut r)? else {
        return Err(ForkError::MalformedResource("cicn does not start with a pixel map".to_string()));
    };
    r.skip(4)?;
    let mask = read_frame(&mut r)?;
    r.skip(4)?;
    let bw = read_frame(&mut r)?;
    r.skip(4)?;

    let (
        Frame::Bitmap {
            row_bytes: mask_row_bytes,
            bounds: mask_bounds,
        },
        Frame::Bitmap {
            row_bytes: bw_row_bytes,
            bounds: bw_bounds,
        },
    ) = (mask, bw)
    else {
        return Err(ForkError::MalformedResource(
            "cicn mask and icon must be bitmaps".to_string(),
        ));
    };

    let (mw, mh) = mask_bounds.dimensions()?;
    let mask_bits = r.bytes(mask_row_bytes * mh)?;
    let (_, bh) = bw_bounds.dimensions()?;
    r.skip(bw_row_bytes * bh)?;

    let palette = read_color_table(&mut r)?;
    let (w, h) = icon.bounds.dimensions()?;
    let data = r.bytes(icon.row_bytes * h)?;
    let indices = expand_indices(data, icon.pixel_size, w, h, icon.row_bytes)?;
    let mut raster = Raster::new(icon.bounds, indices_to_rgba(&indices, &palette))?;

    if mask_row_bytes > 0 {
        for pixel in raster.pixels.chunks_exact_mut(4) {
            pixel[3] = 0;
        }
        let opacity = expand_indices(mask_bits, 1, mw, mh, mask_row_bytes)?
            .into_iter()
            .map(|bit| if bit != 0 { 0xFF } else { 0x00 })
            .collect();
        raster.apply_mask(&Mask {
            rect: mask_bounds,
            opacity,
        });
    }

    Ok(ConvertedArtifact::Png {
        width: w as u32,
        height: h as u32,
        pixels: raster.pixels,
    })
}

/// Decode `ppat` of type 1 (indexed color); other pattern types are rejected
pub fn decode_ppat(res: &Resource, _ctx: &ConvertContext<'_>) -> Result<ConvertedArtifact, ForkError> {
    let mut r = ByteReader::new(&res.data);
    let pat_type = r.u16()?;
    let pat_map = r.u32()? as usize;
    let pat_data = r.u32()? as usize;
    if pat_type != 1 {
        return Err(ForkError::MalformedResource(format!(
            "only indexed-color pixel patterns are supported, found type {pat_type}"
        )));
    }

    r.seek(pat_map)?;
    r.skip(4)?;
    let Frame::Pixmap(pm) = read_frame(&mut r)? else {
        return Err(ForkError::MalformedResource("ppat map is not a pixel map".to_string()));
    };

    let table_offset = pm.pm_table as usize;
    let image_len = table_offset.checked_sub(pat_data).ok_or_else(|| {
        ForkError::MalformedResource(format!(
            "color table at {table_offset} precedes pixel data at {pat_data}"
        ))
    })?;
    r.seek(pat_data)?;
    let image = r.bytes(image_len)?;
    r.seek(table_offset)?;
    let palette = read_color_table(&mut r)?;

    let (w, h) = pm.bounds.dimensions()?;
    let indices = expand_indices(image, pm.pixel_size, w, h, pm.row_bytes)?;
    Ok(ConvertedArtifact::Png {
        width: w as u32,
        height: h as u32,
        pixels: indices_to_rgba(&indices, &palette),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::text::TextOptions;
    use crate::types::{ResType, ResourceFork};

    /// Version 1 picture: 8x2 frame, one BitsRect of a 1-bit bitmap
    fn v1_bits_picture(trailing_ops: &[u8]) -> Vec<u8> {
        let mut p = vec![0, 0];
        p.extend_from_slice(&[0, 0, 0, 0, 0, 2, 0, 8]); // frame
        p.extend_from_slice(&[0x11, 0x01]);
        p.push(0x90);
        p.extend_from_slice(&[0, 1]); // row bytes
        p.extend_from_slice(&[0, 0, 0, 0, 0, 2, 0, 8]); // bounds
        p.extend_from_slice(&[0, 0, 0, 0, 0, 2, 0, 8]); // src
        p.extend_from_slice(&[0, 0, 0, 0, 0, 2, 0, 8]); // dst
        p.extend_from_slice(&[0, 0]); // mode
        p.extend_from_slice(&[0xF0, 0x0F]); // two unpacked rows
        p.extend_from_slice(trailing_ops);
        p.push(0xFF);
        p
    }

    #[test]
    fn test_v1_bits_rect() {
        let canvas = render_picture(&v1_bits_picture(&[])).unwrap();
        assert_eq!(canvas.rect.dimensions().unwrap(), (8, 2));
        assert_eq!(&canvas.pixels[0..4], &[0, 0, 0, 0xFF]);
        assert_eq!(&canvas.pixels[4 * 4..5 * 4], &WHITE);
        assert_eq!(&canvas.pixels[8 * 4..9 * 4], &WHITE);
        assert_eq!(&canvas.pixels[15 * 4..16 * 4], &[0, 0, 0, 0xFF]);
    }

    #[test]
    fn test_oversized_frame_rejected() {
        let p = [0, 18, 0x80, 0x00, 0x80, 0x00, 0x7F, 0xFF, 0x7F, 0xFF, 0x11, 0x01, 0xFF];
        assert!(matches!(
            render_picture(&p),
            Err(ForkError::MalformedPicture(_))
        ));
    }

    #[test]
    fn test_text_opcode_rejected() {
        // DHText: dh, count, text
        let err = render_picture(&v1_bits_picture(&[0x29, 4, 1, b'A'])).unwrap_err();
        assert!(matches!(
            err,
            ForkError::UnsupportedPictureOpcode { opcode: 0x29, .. }
        ));
    }

    #[test]
    fn test_state_opcodes_skipped() {
        // TxFont, PnSize, ShortComment
        let ops = [0x03, 0, 2, 0x07, 0, 1, 0, 1, 0xA0, 0, 100];
        assert!(render_picture(&v1_bits_picture(&ops)).is_ok());
    }

    #[test]
    fn test_v2_quicktime_rejected() {
        let mut p = vec![0, 0, 0, 0, 0, 0, 0, 4, 0, 4];
        p.extend_from_slice(&[0x00, 0x11, 0x02, 0xFF]);
        p.extend_from_slice(&[0x0C, 0x00]);
        p.extend_from_slice(&[0u8; 24]);
        p.extend_from_slice(&[0x82, 0x00, 0, 0, 0, 0]);
        let err = render_picture(&p).unwrap_err();
        assert!(matches!(
            err,
            ForkError::UnsupportedPictureOpcode { opcode: 0x8200, .. }
        ));
    }

    #[test]
    fn test_v2_packed_indexed_pixmap() {
        let mut p = vec![0, 0, 0, 0, 0, 0, 0, 1, 0, 8];
        p.extend_from_slice(&[0x00, 0x11, 0x02, 0xFF]);
        p.extend_from_slice(&[0x0C, 0x00]);
        p.extend_from_slice(&[0u8; 24]);
        p.extend_from_slice(&[0x00, 0x98]);
        // pixel map: 8 bytes per row, 1 row, 8 bits per pixel
        p.extend_from_slice(&[0x80, 8, 0, 0, 0, 0, 0, 1, 0, 8]);
        p.extend_from_slice(&[0, 0, 0, 0, 0, 0, 0, 0, 0, 0x48, 0, 0, 0, 0x48, 0, 0]);
        p.extend_from_slice(&[0, 0, 0, 8, 0, 1, 0, 8, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0]);
        // color table: one entry, index 0 red
        p.extend_from_slice(&[0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0xFF, 0xFF, 0, 0, 0, 0]);
        p.extend_from_slice(&[0, 0, 0, 0, 0, 1, 0, 8]); // src
        p.extend_from_slice(&[0, 0, 0, 0, 0, 1, 0, 8]); // dst
        p.extend_from_slice(&[0, 0]); // mode
        p.extend_from_slice(&[2, 0xF9, 0x00]); // one row: index 0 repeated 8 times
        if p.len() % 2 == 1 {
            p.push(0);
        }
        p.extend_from_slice(&[0x00, 0xFF]);

        let canvas = render_picture(&p).unwrap();
        assert!(canvas.pixels.chunks(4).all(|px| px == [0xFF, 0, 0, 0xFF]));
    }

    #[test]
    fn test_pict_resource_dispatch() {
        let fork = ResourceFork::new();
        let ctx = ConvertContext {
            fork: &fork,
            text: TextOptions::default(),
        };
        let res = Resource::new(ResType::new(*b"PICT"), 128, v1_bits_picture(&[]));
        match decode_pict(&res, &ctx).unwrap() {
            ConvertedArtifact::Png { width, height, .. } => assert_eq!((width, height), (8, 2)),
            other => panic!("expected an image, got {other:?}"),
        }
    }

    #[test]
    fn test_mask_region() {
        // 4x2 region: columns 1..3 on both rows
        let mut body = vec![0, 12 + 14];
        body.extend_from_slice(&[0, 0, 0, 0, 0, 2, 0, 4]);
        body.extend_from_slice(&[0, 0, 0, 1, 0, 3, 0x7F, 0xFF]);
        body.extend_from_slice(&[0, 2, 0, 1, 0, 3, 0x7F, 0xFF]);
        body.extend_from_slice(&[0x7F, 0xFF]);
        body[1] = body.len() as u8;
        let mask = read_mask_region(&mut ByteReader::new(&body)).unwrap().unwrap();
        assert_eq!(mask.opacity, vec![0, 0xFF, 0xFF, 0, 0, 0xFF, 0xFF, 0]);
    }

    #[test]
    fn test_ppat_other_types_rejected() {
        let fork = ResourceFork::new();
        let ctx = ConvertContext {
            fork: &fork,
            text: TextOptions::default(),
        };
        let res = Resource::new(ResType::new(*b"ppat"), 1, vec![0, 2, 0, 0, 0, 28, 0, 0, 0, 78]);
        assert!(matches!(
            decode_ppat(&res, &ctx),
            Err(ForkError::MalformedResource(_))
        ));
    }
}
