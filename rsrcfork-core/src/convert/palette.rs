//! Standard system color tables

/// An opaque RGBA color
pub type Rgba = [u8; 4];

/// Magenta, used for palette slots a color table leaves undefined
pub const UNDEFINED_COLOR: Rgba = [0xFF, 0x00, 0xFF, 0xFF];

const CLUT4: [u32; 16] = [
    0xFFFFFF, 0xFCF305, 0xFF6402, 0xDD0806, 0xF20884, 0x4600A5, 0x0000D4, 0x02ABEA, //
    0x1FB714, 0x006411, 0x562C05, 0x90713A, 0xC0C0C0, 0x808080, 0x404040, 0x000000,
];

const fn rgb(value: u32) -> Rgba {
    [(value >> 16) as u8, (value >> 8) as u8, value as u8, 0xFF]
}

/// The 16-color system palette
pub fn clut4() -> [Rgba; 16] {
    CLUT4.map(rgb)
}

/// The 256-color system palette
///
/// Indices 0..215 walk the 6x6x6 color cube from white towards black (red
/// outermost), omitting black itself; then come ten-step ramps of pure red,
/// green, blue and gray, and finally black.
pub fn clut8() -> [Rgba; 256] {
    const CUBE: [u8; 6] = [0xFF, 0xCC, 0x99, 0x66, 0x33, 0x00];
    const RAMP: [u8; 10] = [0xEE, 0xDD, 0xBB, 0xAA, 0x88, 0x77, 0x55, 0x44, 0x22, 0x11];

    let mut table = [[0, 0, 0, 0xFF]; 256];
    let mut i = 0;
    for r in CUBE {
        for g in CUBE {
            for b in CUBE {
                if (r, g, b) != (0, 0, 0) {
                    table[i] = [r, g, b, 0xFF];
                    i += 1;
                }
            }
        }
    }
    for channel in 0..3 {
        for level in RAMP {
            let mut color = [0, 0, 0, 0xFF];
            color[channel] = level;
            table[i] = color;
            i += 1;
        }
    }
    for level in RAMP {
        table[i] = [level, level, level, 0xFF];
        i += 1;
    }
    // table[255] stays black
    table
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clut4_endpoints() {
        let table = clut4();
        assert_eq!(table[0], [0xFF, 0xFF, 0xFF, 0xFF]);
        assert_eq!(table[3], [0xDD, 0x08, 0x06, 0xFF]);
        assert_eq!(table[15], [0, 0, 0, 0xFF]);
    }

    #[test]
    fn test_clut8_layout() {
        let table = clut8();
        assert_eq!(table[0], [0xFF, 0xFF, 0xFF, 0xFF]);
        assert_eq!(table[5], [0xFF, 0xFF, 0x00, 0xFF]);
        assert_eq!(table[214], [0x00, 0x00, 0x33, 0xFF]);
        assert_eq!(table[215], [0xEE, 0x00, 0x00, 0xFF]);
        assert_eq!(table[225], [0x00, 0xEE, 0x00, 0xFF]);
        assert_eq!(table[235], [0x00, 0x00, 0xEE, 0xFF]);
        assert_eq!(table[245], [0xEE, 0xEE, 0xEE, 0xFF]);
        assert_eq!(table[254], [0x11, 0x11, 0x11, 0xFF]);
        assert_eq!(table[255], [0x00, 0x00, 0x00, 0xFF]);
    }
}
