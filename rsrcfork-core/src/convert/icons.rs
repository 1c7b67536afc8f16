//! Icon and pattern decoders: `ICN#`, `ics#`, `icl4`, `icl8`, `ics4`, `ics8`,
//! `SICN`, `PAT ` and `PAT#`

use super::palette::{clut4, clut8, Rgba};
use super::raster::{expand_indices, indices_to_rgba};
use super::{ConvertContext, ConvertedArtifact};
use crate::cursor::ByteReader;
use crate::error::ForkError;
use crate::types::{ResType, Resource};

#[cfg(feature = "logging")]
use tracing::warn;

const BLACK: Rgba = [0x00, 0x00, 0x00, 0xFF];
const WHITE: Rgba = [0xFF, 0xFF, 0xFF, 0xFF];
const MONO: [Rgba; 2] = [WHITE, BLACK];

/// Which black-and-white resource carries the mask for an icon type
fn mask_family(res_type: &ResType) -> Option<ResType> {
    match res_type.as_bytes() {
        b"ICN#" | b"icl4" | b"icl8" => Some(ResType::new(*b"ICN#")),
        b"ics#" | b"ics4" | b"ics8" => Some(ResType::new(*b"ics#")),
        _ => None,
    }
}

/// Bits per pixel of an icon type
fn depth(res_type: &ResType) -> Option<u16> {
    match res_type.as_bytes() {
        b"ICN#" | b"ics#" => Some(1),
        b"icl4" | b"ics4" => Some(4),
        b"icl8" | b"ics8" => Some(8),
        _ => None,
    }
}

/// Side of a square icon whose pixel plane occupies `plane_len` bytes
fn side_for(plane_len: usize, bpp: u16) -> Option<usize> {
    let pixels = plane_len * 8 / usize::from(bpp);
    let side = (1..=256).find(|s| s * s >= pixels)?;
    (side * side == pixels && side % 8 == 0 && pixels * usize::from(bpp) == plane_len * 8)
        .then_some(side)
}

/// Decode a square icon, applying the family mask when one of matching size exists
pub fn decode_icon(res: &Resource, ctx: &ConvertContext<'_>) -> Result<ConvertedArtifact, ForkError> {
    let (Some(bpp), Some(family)) = (depth(&res.res_type), mask_family(&res.res_type)) else {
        return Err(ForkError::MalformedResource(format!(
            "{} is not an icon type",
            res.res_type
        )));
    };

    // black-and-white icons hold the icon plane followed by the mask plane
    let plane_len = if bpp == 1 { res.data.len() / 2 } else { res.data.len() };
    let side = side_for(plane_len, bpp)
        .filter(|_| bpp != 1 || res.data.len() % 2 == 0)
        .ok_or_else(|| {
            ForkError::MalformedResource(format!(
                "{} bytes is not a square {}-bit icon",
                res.data.len(),
                bpp
            ))
        })?;

    let mask_len = side * side / 8;
    let mask = ctx
        .fork
        .get(&family, res.id)
        .filter(|bw| bw.data.len() == 2 * mask_len)
        .map(|bw| &bw.data[mask_len..]);

    #[cfg(feature = "logging")]
    if mask.is_none() {
        warn!(
            "No {}x{} {} mask for {} #{}, icon will be opaque",
            side, side, family, res.res_type, res.id
        );
    }

    let palette: Vec<Rgba> = match bpp {
        1 => MONO.to_vec(),
        4 => clut4().to_vec(),
        _ => clut8().to_vec(),
    };
    let row_bytes = side * usize::from(bpp) / 8;
    let indices = expand_indices(&res.data[..plane_len], bpp, side, side, row_bytes)?;
    let mut pixels = indices_to_rgba(&indices, &palette);

    if let Some(mask) = mask {
        let opacity = expand_indices(mask, 1, side, side, side / 8)?;
        for (pixel, opaque) in pixels.chunks_exact_mut(4).zip(opacity) {
            if opaque == 0 {
                pixel[3] = 0;
            }
        }
    }

    Ok(ConvertedArtifact::Png {
        width: side as u32,
        height: side as u32,
        pixels,
    })
}

/// Decode `SICN`: a vertical strip of 16x16 black-and-white icons
pub fn decode_sicn(res: &Resource, _ctx: &ConvertContext<'_>) -> Result<ConvertedArtifact, ForkError> {
    if res.data.len() % 32 != 0 {
        return Err(ForkError::MalformedResource(format!(
            "SICN length {} is not a multiple of 32",
            res.data.len()
        )));
    }
    let height = res.data.len() / 2;
    let indices = expand_indices(&res.data, 1, 16, height, 2)?;
    Ok(ConvertedArtifact::Png {
        width: 16,
        height: height as u32,
        pixels: indices_to_rgba(&indices, &MONO),
    })
}

/// Decode `PAT `: one 8x8 black-and-white tile
pub fn decode_pat(res: &Resource, _ctx: &ConvertContext<'_>) -> Result<ConvertedArtifact, ForkError> {
    let mut r = ByteReader::new(&res.data);
    let tile = r.bytes(8)?;
    Ok(ConvertedArtifact::Png {
        width: 8,
        height: 8,
        pixels: indices_to_rgba(&expand_indices(tile, 1, 8, 8, 1)?, &MONO),
    })
}

/// Decode `PAT#`: a count followed by 8x8 tiles, stacked vertically
pub fn decode_pat_list(res: &Resource, _ctx: &ConvertContext<'_>) -> Result<ConvertedArtifact, ForkError> {
    let mut r = ByteReader::new(&res.data);
    let count = usize::from(r.u16()?);
    let tiles = r.bytes(count * 8)?;

    #[cfg(feature = "logging")]
    if !r.is_empty() {
        warn!("{} trailing bytes after {} patterns", r.remaining(), count);
    }

    Ok(ConvertedArtifact::Png {
        width: 8,
        height: (count * 8) as u32,
        pixels: indices_to_rgba(&expand_indices(tiles, 1, 8, count * 8, 1)?, &MONO),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::text::TextOptions;
    use crate::types::ResourceFork;

    fn png(artifact: ConvertedArtifact) -> (u32, u32, Vec<u8>) {
        match artifact {
            ConvertedArtifact::Png {
                width,
                height,
                pixels,
            } => (width, height, pixels),
            other => panic!("expected an image, got {other:?}"),
        }
    }

    fn decode_in(fork: &ResourceFork, res_type: &[u8; 4], id: i16) -> ConvertedArtifact {
        let ctx = ConvertContext {
            fork,
            text: TextOptions::default(),
        };
        decode_icon(fork.get(&ResType::new(*res_type), id).unwrap(), &ctx).unwrap()
    }

    #[test]
    fn test_side_inference() {
        assert_eq!(side_for(128, 1), Some(32));
        assert_eq!(side_for(32, 1), Some(16));
        assert_eq!(side_for(512, 4), Some(32));
        assert_eq!(side_for(256, 8), Some(16));
        assert_eq!(side_for(1024, 8), Some(32));
        assert_eq!(side_for(100, 8), None);
    }

    #[test]
    fn test_mono_icon_uses_own_mask() {
        // top row black and fully masked, everything else white and transparent
        let mut data = vec![0u8; 256];
        data[0..4].copy_from_slice(&[0xFF; 4]);
        data[128..132].copy_from_slice(&[0xFF; 4]);
        let mut fork = ResourceFork::new();
        fork.insert(Resource::new(ResType::new(*b"ICN#"), 128, data)).unwrap();

        let (w, h, pixels) = png(decode_in(&fork, b"ICN#", 128));
        assert_eq!((w, h), (32, 32));
        assert_eq!(&pixels[0..4], &BLACK);
        assert_eq!(pixels[32 * 4 + 3], 0);
    }

    #[test]
    fn test_color_icon_without_mask_is_opaque() {
        let mut fork = ResourceFork::new();
        fork.insert(Resource::new(ResType::new(*b"ics8"), 128, vec![0xFFu8; 256]))
            .unwrap();
        let (w, h, pixels) = png(decode_in(&fork, b"ics8", 128));
        assert_eq!((w, h), (16, 16));
        assert!(pixels.chunks(4).all(|p| p == BLACK));
    }

    #[test]
    fn test_color_icon_takes_family_mask() {
        let mut mask_plane = vec![0u8; 64];
        // left half of the first row opaque
        mask_plane[32] = 0xFF;
        let mut fork = ResourceFork::new();
        fork.insert(Resource::new(ResType::new(*b"ics#"), 1, mask_plane)).unwrap();
        fork.insert(Resource::new(ResType::new(*b"ics4"), 1, vec![0x11u8; 128]))
            .unwrap();

        let (_, _, pixels) = png(decode_in(&fork, b"ics4", 1));
        assert_eq!(&pixels[0..4], &clut4()[1]);
        assert_eq!(pixels[7 * 4 + 3], 0xFF);
        assert_eq!(pixels[8 * 4 + 3], 0);
    }

    #[test]
    fn test_mismatched_mask_is_ignored() {
        let mut fork = ResourceFork::new();
        // a 16x16 mask cannot serve a 32x32 icon
        fork.insert(Resource::new(ResType::new(*b"ics#"), 1, vec![0u8; 64])).unwrap();
        fork.insert(Resource::new(ResType::new(*b"ics8"), 1, vec![0u8; 1024])).unwrap();
        let (w, _, pixels) = png(decode_in(&fork, b"ics8", 1));
        assert_eq!(w, 32);
        assert!(pixels.chunks(4).all(|p| p[3] == 0xFF));
    }

    #[test]
    fn test_decode_is_deterministic() {
        let data: Vec<u8> = (0..64u8).collect();
        let mut fork = ResourceFork::new();
        fork.insert(Resource::new(ResType::new(*b"ics#"), 5, data)).unwrap();
        assert_eq!(decode_in(&fork, b"ics#", 5), decode_in(&fork, b"ics#", 5));
    }

    #[test]
    fn test_sicn_and_patterns() {
        let ctx_fork = ResourceFork::new();
        let ctx = ConvertContext {
            fork: &ctx_fork,
            text: TextOptions::default(),
        };

        let sicn = Resource::new(ResType::new(*b"SICN"), 1, vec![0u8; 64]);
        let (w, h, _) = png(decode_sicn(&sicn, &ctx).unwrap());
        assert_eq!((w, h), (16, 32));

        let pat = Resource::new(ResType::new(*b"PAT "), 1, vec![0xAAu8; 8]);
        let (w, h, pixels) = png(decode_pat(&pat, &ctx).unwrap());
        assert_eq!((w, h), (8, 8));
        assert_eq!(&pixels[0..8], &[0, 0, 0, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF]);

        let mut list = vec![0, 2];
        list.extend_from_slice(&[0u8; 16]);
        let pats = Resource::new(ResType::new(*b"PAT#"), 1, list);
        let (w, h, _) = png(decode_pat_list(&pats, &ctx).unwrap());
        assert_eq!((w, h), (8, 16));
    }
}
