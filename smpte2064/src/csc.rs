//! Colour-space conversion: V210-packed 10-bit 4:2:2 to planar 8-bit luma.
//!
//! This is a pure, allocation-free transform with no dependency on [`crate::Context`]
//! state. It is exposed standalone so a caller can unpack once and feed the same luma
//! plane into several contexts, or restrict the unpack to just the rows the windowing
//! stage (Table 2) actually samples.

use crate::error::{Error, Result};

/// Unpacks one line of six luma samples from four packed 10-bit 4:2:2 words.
///
/// The V210 word ordering is `(U,Y,V)(Y,U,Y)(V,Y,U)(Y,V,Y)` per four 32-bit
/// little-endian words; chroma is discarded. Each 8-bit output sample is the low 8
/// bits of its 10-bit field (`(word >> shift) & 0xFF`, `shift` in `{0, 10, 20}`),
/// matching the reference converter's truncation exactly rather than rounding to
/// the nearest 8-bit value.
fn unpack_line_to_8b(src: &[u32], dst: &mut [u8], width: u32) {
    let width = width as usize;
    let mut si = 0;
    let mut di = 0;

    // Each iteration of 4 words yields 6 luma samples; process whole groups only,
    // matching the reference's `width - 5` bound (a partial trailing group is dropped).
    while di + 6 <= width {
        let w0 = src[si];
        let w1 = src[si + 1];
        let w2 = src[si + 2];
        let w3 = src[si + 3];

        dst[di] = ((w0 >> 10) & 0xFF) as u8;
        dst[di + 1] = (w1 & 0xFF) as u8;
        dst[di + 2] = ((w1 >> 20) & 0xFF) as u8;
        dst[di + 3] = ((w2 >> 10) & 0xFF) as u8;
        dst[di + 4] = (w3 & 0xFF) as u8;
        dst[di + 5] = ((w3 >> 20) & 0xFF) as u8;

        si += 4;
        di += 6;
    }
}

/// Converts a packed V210 4:2:2 10-bit image to planar 8-bit luma.
///
/// `src_stride` and `dst_stride` are in bytes. `src` must contain at least
/// `height` rows of `src_stride` bytes; `dst` at least `height` rows of `dst_stride`
/// bytes. When `lines` is `Some`, only those row indices are converted (sparse mode,
/// used to unpack just the 16 rows a [`crate::tables::Window`] needs); when `None`,
/// every row from `0` to `height` is converted.
pub fn v210_unpack_to_8b(
    src: &[u8],
    src_stride: u32,
    dst: &mut [u8],
    dst_stride: u32,
    width: u32,
    height: u32,
    lines: Option<&[usize]>,
) -> Result<()> {
    if src_stride == 0 || dst_stride == 0 || width == 0 || height == 0 {
        return Err(Error::InvalidArgument(
            "v210_unpack_to_8b: stride, width, and height must be non-zero".into(),
        ));
    }
    if src_stride % 4 != 0 {
        return Err(Error::InvalidArgument(
            "v210_unpack_to_8b: src_stride must be a multiple of 4 bytes (packed u32 words)"
                .into(),
        ));
    }

    let src_words_per_row = (src_stride / 4) as usize;
    let src_words: Vec<u32> = src
        .chunks_exact(4)
        .map(|b| u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
        .collect();

    let required_src_rows = match lines {
        Some(rows) => rows.iter().copied().max().map(|m| m + 1).unwrap_or(0),
        None => height as usize,
    };
    if required_src_rows > 0 && src_words.len() < (required_src_rows - 1) * src_words_per_row + src_words_per_row {
        return Err(Error::InvalidArgument(
            "v210_unpack_to_8b: src buffer too small for requested rows".into(),
        ));
    }
    if (height as usize) * (dst_stride as usize) > dst.len() {
        return Err(Error::InvalidArgument(
            "v210_unpack_to_8b: dst buffer too small for height*dst_stride".into(),
        ));
    }

    let mut unpack_row = |row: usize| {
        let src_row = &src_words[row * src_words_per_row..(row + 1) * src_words_per_row];
        let dst_row = &mut dst[row * dst_stride as usize..(row + 1) * dst_stride as usize];
        unpack_line_to_8b(src_row, dst_row, width);
    };

    match lines {
        Some(rows) => {
            for &row in rows {
                unpack_row(row);
            }
        }
        None => {
            for row in 0..height as usize {
                unpack_row(row);
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Packs six 10-bit luma values (and arbitrary chroma) into four V210 words, the
    /// inverse of `unpack_line_to_8b`, for use as test fixtures.
    fn pack_words(y: [u16; 6]) -> [u32; 4] {
        let u = 0x155u32; // arbitrary chroma, must round-trip to being discarded
        let v = 0x2AAu32;
        let y10 = y.map(|v| v as u32);
        [
            u | (y10[0] << 10) | (v << 20),
            y10[1] | (u << 10) | (y10[2] << 20),
            v | (y10[3] << 10) | (u << 20),
            y10[4] | (v << 10) | (y10[5] << 20),
        ]
    }

    fn words_to_bytes(words: &[u32]) -> Vec<u8> {
        words.iter().flat_map(|w| w.to_le_bytes()).collect()
    }

    #[test]
    fn unpacks_documented_luma_sequence() {
        // Low 8 bits of each 10-bit sample survive; the top two bits are dropped.
        let luma10 = [0b11_1111_1100u16, 0, 0x3FF, 0x200, 0x001, 0x3FC];
        let words = pack_words(luma10);
        let src = words_to_bytes(&words);
        let mut dst = [0u8; 6];
        v210_unpack_to_8b(&src, 16, &mut dst, 6, 6, 1, None).unwrap();
        let expected: Vec<u8> = luma10.iter().map(|&v| (v & 0xFF) as u8).collect();
        assert_eq!(&dst[..], &expected[..]);
    }

    #[test]
    fn sparse_mode_only_touches_requested_rows() {
        let row0 = words_to_bytes(&pack_words([10, 20, 30, 40, 50, 60]));
        let row1 = words_to_bytes(&pack_words([0x3FF; 6]));
        let mut src = row0;
        src.extend(row1);

        let mut dst = vec![0xAAu8; 12];
        v210_unpack_to_8b(&src, 16, &mut dst, 6, 6, 2, Some(&[0])).unwrap();

        assert_eq!(&dst[0..6], &[10, 20, 30, 40, 50, 60]);
        // Row 1 was never touched.
        assert_eq!(&dst[6..12], &[0xAA; 6]);
    }

    #[test]
    fn rejects_zero_dimensions() {
        let src = [0u8; 16];
        let mut dst = [0u8; 6];
        assert!(v210_unpack_to_8b(&src, 16, &mut dst, 6, 0, 1, None).is_err());
    }
}
