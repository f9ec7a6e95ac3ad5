//! Per-frame DDV video decoder.
//!
//! Drives the full video pipeline for one frame: VLC expansion of the
//! coefficient bitstream, per-frame quantization table rebuild, run/level
//! expansion into the persistent macroblock state, inverse DCT and the
//! RGB tile blit.
//!
//! Macroblocks are traversed in column-major order (down each column of
//! macroblocks, then right), which is the order the coefficient stream is
//! laid out in. The per-subblock state lives across frames: delta frames
//! accumulate onto it, so the decoder must see every frame in sequence
//! even when the caller does not want the pixels of some of them.

use crate::error::Result;

use super::macroblock::{decode_block, CoeffBlock, CoeffCursor};
use super::tables::{QUANT_CHROMA, QUANT_LUMA};
use super::{blit, idct, vlc};
use super::{BLOCKS_PER_MACROBLOCK, MACROBLOCK_HEIGHT, MACROBLOCK_WIDTH, MAX_WORDS_PER_BLOCK};

/// DDV video decoder for one stream.
#[derive(Debug)]
pub struct DdvVideoDecoder {
    width: u32,
    height: u32,
    mb_x: u32,
    mb_y: u32,
    /// Reusable flat coefficient-word buffer for one frame
    coeff_words: Vec<u16>,
    /// Hard cap on coefficient words per frame
    max_words: usize,
    /// Persistent per-subblock state, `BLOCKS_PER_MACROBLOCK` entries per
    /// macroblock in decode order
    blocks: Vec<CoeffBlock>,
    /// Per-frame scaled quantization tables
    quant_luma: [u32; 64],
    quant_chroma: [u32; 64],
    /// Spatial-domain scratch for the six subblocks of one macroblock
    spatial: [[i32; 64]; BLOCKS_PER_MACROBLOCK],
}

impl DdvVideoDecoder {
    /// Create a decoder for the given frame dimensions. All per-frame
    /// buffers are sized here; frame decoding does not allocate.
    pub fn new(width: u32, height: u32) -> Self {
        let mb_x = width.div_ceil(MACROBLOCK_WIDTH);
        let mb_y = height.div_ceil(MACROBLOCK_HEIGHT);
        let mb_count = mb_x as usize * mb_y as usize;
        let max_words = mb_count * BLOCKS_PER_MACROBLOCK * MAX_WORDS_PER_BLOCK;

        DdvVideoDecoder {
            width,
            height,
            mb_x,
            mb_y,
            coeff_words: Vec::with_capacity(max_words),
            max_words,
            blocks: vec![CoeffBlock::default(); mb_count * BLOCKS_PER_MACROBLOCK],
            quant_luma: [16; 64],
            quant_chroma: [16; 64],
            spatial: [[0; 64]; BLOCKS_PER_MACROBLOCK],
        }
    }

    /// Rebuild the scaled quantization tables for a frame.
    ///
    /// Position 0 is pinned to 16. The luma table is filled from the base
    /// matrix shifted by one position while the chroma table is indexed
    /// directly — an asymmetry inherited from the encoded data.
    fn rebuild_quant_tables(&mut self, scale: u16) {
        let scale = scale as u32;
        if scale > 0 {
            self.quant_luma[0] = 16;
            self.quant_chroma[0] = 16;
            for i in 1..64 {
                self.quant_luma[i] = scale * QUANT_LUMA[i - 1];
                self.quant_chroma[i] = scale * QUANT_CHROMA[i];
            }
        } else {
            self.quant_luma = [16; 64];
            self.quant_chroma = [16; 64];
        }
    }

    /// Decode one frame payload.
    ///
    /// When `pixels` is `Some`, decoded macroblocks are blitted into it in
    /// row-major `width * height` order. When `None`, the frame is still
    /// fully decoded so the delta-frame state stays in sync; only the blit
    /// is skipped.
    pub fn decode_frame(&mut self, payload: &[u8], mut pixels: Option<&mut [u32]>) -> Result<()> {
        if self.mb_x == 0 || self.mb_y == 0 {
            return Ok(());
        }

        let scale = vlc::decode_coefficients(payload, &mut self.coeff_words, self.max_words)?;
        tracing::trace!(
            "video frame: scale {}, {} coefficient words",
            scale,
            self.coeff_words.len()
        );
        self.rebuild_quant_tables(scale);

        let mut cur = CoeffCursor::new(&self.coeff_words);
        let mut block_idx = 0;
        for xb in 0..self.mb_x as usize {
            for yb in 0..self.mb_y as usize {
                for i in 0..BLOCKS_PER_MACROBLOCK {
                    let is_luma = i >= 2;
                    let quant = if is_luma {
                        &self.quant_luma
                    } else {
                        &self.quant_chroma
                    };
                    let block = &mut self.blocks[block_idx * BLOCKS_PER_MACROBLOCK + i];
                    decode_block(&mut cur, block, quant, is_luma)?;
                    idct::idct(&block.out, &mut self.spatial[i]);
                }

                if let Some(px) = pixels.as_deref_mut() {
                    blit::blit_macroblock(
                        px,
                        xb * MACROBLOCK_WIDTH as usize,
                        yb * MACROBLOCK_HEIGHT as usize,
                        self.width as usize,
                        self.height as usize,
                        &self.spatial[0],
                        &self.spatial[1],
                        [
                            &self.spatial[2],
                            &self.spatial[3],
                            &self.spatial[4],
                            &self.spatial[5],
                        ],
                    );
                }
                block_idx += 1;
            }
        }

        Ok(())
    }

    /// Number of pixels one output buffer must hold.
    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Pack an MSB-first bit sequence into a frame payload after the
    /// scale word.
    fn payload(scale: u16, bits: &[(u32, u8)]) -> Vec<u8> {
        let mut stream: Vec<bool> = Vec::new();
        for &(value, n) in bits {
            for i in (0..n).rev() {
                stream.push((value >> i) & 1 == 1);
            }
        }
        let mut words = vec![scale];
        for chunk in stream.chunks(16) {
            let mut w = 0u16;
            for (i, &bit) in chunk.iter().enumerate() {
                if bit {
                    w |= 1 << (15 - i);
                }
            }
            words.push(w);
        }
        words.extend_from_slice(&[0, 0]);
        words.iter().flat_map(|w| w.to_le_bytes()).collect()
    }

    /// A frame of DC-only subblocks: the first DC raw, then an
    /// end-of-block and trailer per remaining subblock, then the frame
    /// terminator.
    fn dc_only_frame(scale: u16, dc_words: &[u32]) -> Vec<u8> {
        let mut bits = vec![(dc_words[0], 11u8)];
        for &dc in &dc_words[1..] {
            bits.push((0b10, 2));
            bits.push((dc, 11));
        }
        bits.push((0b10, 2));
        bits.push((0x3FF, 11));
        payload(scale, &bits)
    }

    #[test]
    fn test_intra_grey_frame() {
        // All-zero intra DCs: luma blocks decode to 1024/8 = 128, chroma
        // to 0 — a uniform grey frame.
        let mut dec = DdvVideoDecoder::new(16, 16);
        let frame = dc_only_frame(1, &[0; 6]);
        let mut pixels = vec![0u32; 256];
        dec.decode_frame(&frame, Some(&mut pixels)).unwrap();
        for &p in pixels.iter() {
            assert_eq!(p, (128 << 16) | (128 << 8) | 128);
        }
    }

    #[test]
    fn test_delta_frame_preserves_image() {
        let mut dec = DdvVideoDecoder::new(16, 16);
        let intra = dc_only_frame(1, &[0; 6]);
        let mut pixels = vec![0u32; 256];
        dec.decode_frame(&intra, Some(&mut pixels)).unwrap();

        // A delta frame with the same DCs and no AC updates leaves every
        // pixel untouched.
        let delta = dc_only_frame(1, &[1; 6]);
        let mut second = vec![0u32; 256];
        dec.decode_frame(&delta, Some(&mut second)).unwrap();
        assert_eq!(pixels, second);
    }

    #[test]
    fn test_decode_without_pixel_buffer_keeps_state() {
        let mut dec = DdvVideoDecoder::new(16, 16);
        let intra = dc_only_frame(1, &[0; 6]);
        dec.decode_frame(&intra, None).unwrap();

        let delta = dc_only_frame(1, &[1; 6]);
        let mut pixels = vec![0u32; 256];
        dec.decode_frame(&delta, Some(&mut pixels)).unwrap();
        for &p in pixels.iter() {
            assert_eq!(p, (128 << 16) | (128 << 8) | 128);
        }
    }

    #[test]
    fn test_missing_subblocks_are_corrupt() {
        // A 32x16 frame needs two macroblocks, but the stream ends after
        // six subblocks.
        let mut dec = DdvVideoDecoder::new(32, 16);
        let frame = dc_only_frame(1, &[0; 6]);
        let err = dec.decode_frame(&frame, None).unwrap_err();
        assert!(matches!(err, crate::Error::CorruptFrame(_)));
    }

    #[test]
    fn test_multi_macroblock_frame() {
        let mut dec = DdvVideoDecoder::new(32, 16);
        let frame = dc_only_frame(1, &[0; 12]);
        let mut pixels = vec![0u32; 32 * 16];
        dec.decode_frame(&frame, Some(&mut pixels)).unwrap();
        for &p in pixels.iter() {
            assert_eq!(p, (128 << 16) | (128 << 8) | 128);
        }
    }

    #[test]
    fn test_padded_frame_clips_to_true_size() {
        // 24x16: the second macroblock column is half padding.
        let mut dec = DdvVideoDecoder::new(24, 16);
        let frame = dc_only_frame(1, &[0; 12]);
        let mut pixels = vec![0u32; 24 * 16];
        dec.decode_frame(&frame, Some(&mut pixels)).unwrap();
        for &p in pixels.iter() {
            assert_eq!(p, (128 << 16) | (128 << 8) | 128);
        }
    }
}
