//! Fixed data tables for the DDV video codec.
//!
//! The quantization matrices and the zig-zag scan match the original
//! engine bit for bit. The coefficient bitstream itself is coded with
//! the MDEC-class AC run/level codebook; the two direct-index lookup
//! tables the decode loop consults are derived from that codebook once at
//! first use:
//!
//! - the **short table** is indexed by a 13-bit window and packs up to
//!   three consecutive codes per entry, stopping early at an end-of-block
//!   or escape code (whose trailing data lives outside the window)
//! - the **long table** is indexed by a 17-bit window and covers the codes
//!   with eight or more leading zeros; the decode loop skips the fixed
//!   8-bit zero prefix before consuming the entry's own bits
//!
//! Windows that decode nothing are left zeroed; an all-zero entry emits a
//! zero word and the frame decoder's coefficient cap turns a stream stuck
//! in that region into a corrupt-frame error.

use std::sync::OnceLock;

use super::{END_OF_BLOCK, ESCAPE_WORD};

/// Luma quantization matrix, indexed by zig-zag scan position
pub static QUANT_LUMA: [u32; 64] = [
    0x0C, 0x0B, 0x0A, 0x0C, 0x0E, 0x0E, 0x0D, 0x0E,
    0x10, 0x18, 0x13, 0x10, 0x11, 0x12, 0x18, 0x16,
    0x16, 0x18, 0x1A, 0x28, 0x33, 0x3A, 0x28, 0x1D,
    0x25, 0x23, 0x31, 0x48, 0x40, 0x37, 0x38, 0x33,
    0x39, 0x3C, 0x3D, 0x37, 0x45, 0x57, 0x44, 0x40,
    0x4E, 0x5C, 0x5F, 0x57, 0x51, 0x6D, 0x50, 0x38,
    0x3E, 0x67, 0x68, 0x67, 0x62, 0x70, 0x79, 0x71,
    0x4D, 0x5C, 0x78, 0x64, 0x67, 0x65, 0x63, 0x10,
];

/// Chroma quantization matrix, indexed by zig-zag scan position
pub static QUANT_CHROMA: [u32; 64] = [
    0x10, 0x12, 0x12, 0x18, 0x15, 0x18, 0x2F, 0x1A,
    0x1A, 0x2F, 0x63, 0x42, 0x38, 0x42, 0x63, 0x63,
    0x63, 0x63, 0x63, 0x63, 0x63, 0x63, 0x63, 0x63,
    0x63, 0x63, 0x63, 0x63, 0x63, 0x63, 0x63, 0x63,
    0x63, 0x63, 0x63, 0x63, 0x63, 0x63, 0x63, 0x63,
    0x63, 0x63, 0x63, 0x63, 0x63, 0x63, 0x63, 0x63,
    0x63, 0x63, 0x63, 0x63, 0x63, 0x63, 0x63, 0x63,
    0x63, 0x63, 0x63, 0x63, 0x63, 0x63, 0x63, 0x63,
];

/// Zig-zag scan: scan position to raster index within an 8x8 block
pub static ZIGZAG_SCAN: [usize; 64] = [
    0, 1, 8, 16, 9, 2, 3, 10,
    17, 24, 32, 25, 18, 11, 4, 5,
    12, 19, 26, 33, 40, 48, 41, 34,
    27, 20, 13, 6, 7, 14, 21, 28,
    35, 42, 49, 56, 57, 50, 43, 36,
    29, 22, 15, 23, 30, 37, 44, 51,
    58, 59, 52, 45, 38, 31, 39, 46,
    53, 60, 61, 54, 47, 55, 62, 63,
];

/// AC run/level code. `code` is the codeword value without the trailing
/// sign bit; `level` is the magnitude.
#[derive(Debug, Clone, Copy)]
struct AcCode {
    code: u16,
    bits: u8,
    run: u8,
    level: u8,
}

const fn ac(code: u16, bits: u8, run: u8, level: u8) -> AcCode {
    AcCode {
        code,
        bits,
        run,
        level,
    }
}

/// The AC codebook, grouped by codeword length. End-of-block (`10`) and
/// escape (`000001`) are handled separately by the table builder.
static AC_CODES: [AcCode; 111] = [
    // 2-5 bits
    ac(0x03, 2, 0, 1),
    ac(0x03, 3, 1, 1),
    ac(0x04, 4, 0, 2),
    ac(0x05, 4, 2, 1),
    ac(0x05, 5, 0, 3),
    ac(0x07, 5, 3, 1),
    ac(0x06, 5, 4, 1),
    // 6 bits
    ac(0x06, 6, 1, 2),
    ac(0x07, 6, 5, 1),
    ac(0x05, 6, 6, 1),
    ac(0x04, 6, 7, 1),
    // 7 bits
    ac(0x06, 7, 0, 4),
    ac(0x04, 7, 2, 2),
    ac(0x07, 7, 8, 1),
    ac(0x05, 7, 9, 1),
    // 8 bits
    ac(0x26, 8, 0, 5),
    ac(0x21, 8, 0, 6),
    ac(0x25, 8, 1, 3),
    ac(0x24, 8, 3, 2),
    ac(0x27, 8, 10, 1),
    ac(0x23, 8, 11, 1),
    ac(0x22, 8, 12, 1),
    ac(0x20, 8, 13, 1),
    // 10 bits
    ac(0x0A, 10, 0, 7),
    ac(0x0C, 10, 1, 4),
    ac(0x0B, 10, 2, 3),
    ac(0x0F, 10, 4, 2),
    ac(0x09, 10, 5, 2),
    ac(0x0E, 10, 14, 1),
    ac(0x0D, 10, 15, 1),
    ac(0x08, 10, 16, 1),
    // 12 bits
    ac(0x1D, 12, 0, 8),
    ac(0x18, 12, 0, 9),
    ac(0x13, 12, 0, 10),
    ac(0x10, 12, 0, 11),
    ac(0x1B, 12, 1, 5),
    ac(0x14, 12, 2, 4),
    ac(0x1C, 12, 3, 3),
    ac(0x12, 12, 4, 3),
    ac(0x1E, 12, 6, 2),
    ac(0x15, 12, 7, 2),
    ac(0x11, 12, 8, 2),
    ac(0x1F, 12, 17, 1),
    ac(0x1A, 12, 18, 1),
    ac(0x19, 12, 19, 1),
    ac(0x17, 12, 20, 1),
    ac(0x16, 12, 21, 1),
    // 13 bits
    ac(0x1A, 13, 0, 12),
    ac(0x19, 13, 0, 13),
    ac(0x18, 13, 0, 14),
    ac(0x17, 13, 0, 15),
    ac(0x16, 13, 1, 6),
    ac(0x15, 13, 1, 7),
    ac(0x14, 13, 2, 5),
    ac(0x13, 13, 3, 4),
    ac(0x12, 13, 5, 3),
    ac(0x11, 13, 9, 2),
    ac(0x10, 13, 10, 2),
    ac(0x1F, 13, 22, 1),
    ac(0x1E, 13, 23, 1),
    ac(0x1D, 13, 24, 1),
    ac(0x1C, 13, 25, 1),
    ac(0x1B, 13, 26, 1),
    // 14 bits
    ac(0x1F, 14, 0, 16),
    ac(0x1E, 14, 0, 17),
    ac(0x1D, 14, 0, 18),
    ac(0x1C, 14, 0, 19),
    ac(0x1B, 14, 0, 20),
    ac(0x1A, 14, 0, 21),
    ac(0x19, 14, 0, 22),
    ac(0x18, 14, 0, 23),
    ac(0x17, 14, 0, 24),
    ac(0x16, 14, 0, 25),
    ac(0x15, 14, 0, 26),
    ac(0x14, 14, 0, 27),
    ac(0x13, 14, 0, 28),
    ac(0x12, 14, 0, 29),
    ac(0x11, 14, 0, 30),
    ac(0x10, 14, 0, 31),
    // 15 bits
    ac(0x18, 15, 0, 32),
    ac(0x17, 15, 0, 33),
    ac(0x16, 15, 0, 34),
    ac(0x15, 15, 0, 35),
    ac(0x14, 15, 0, 36),
    ac(0x13, 15, 0, 37),
    ac(0x12, 15, 0, 38),
    ac(0x11, 15, 0, 39),
    ac(0x10, 15, 0, 40),
    ac(0x1F, 15, 1, 8),
    ac(0x1E, 15, 1, 9),
    ac(0x1D, 15, 1, 10),
    ac(0x1C, 15, 1, 11),
    ac(0x1B, 15, 1, 12),
    ac(0x1A, 15, 1, 13),
    ac(0x19, 15, 1, 14),
    // 16 bits
    ac(0x13, 16, 1, 15),
    ac(0x12, 16, 1, 16),
    ac(0x11, 16, 1, 17),
    ac(0x10, 16, 1, 18),
    ac(0x14, 16, 6, 3),
    ac(0x1A, 16, 11, 2),
    ac(0x19, 16, 12, 2),
    ac(0x18, 16, 13, 2),
    ac(0x17, 16, 14, 2),
    ac(0x16, 16, 15, 2),
    ac(0x15, 16, 16, 2),
    ac(0x1F, 16, 27, 1),
    ac(0x1E, 16, 28, 1),
    ac(0x1D, 16, 29, 1),
    ac(0x1C, 16, 30, 1),
    ac(0x1B, 16, 31, 1),
];

/// Entry of the short-prefix table (13-bit window): total bits to consume
/// and up to three output words. A zero word terminates the slot list.
#[derive(Debug, Clone, Copy, Default)]
pub struct ShortVlcEntry {
    pub bits: u8,
    pub words: [u16; 3],
}

/// Entry of the long-prefix table (17-bit window, codes with eight or more
/// leading zeros): bits to consume after the fixed 8-bit skip, and one
/// output word.
#[derive(Debug, Clone, Copy, Default)]
pub struct LongVlcEntry {
    pub bits: u8,
    pub word: u16,
}

/// The derived direct-index lookup tables, shared by all decoder instances.
pub struct VlcTables {
    /// 8192 entries, indexed by a 13-bit peek
    pub short: Vec<ShortVlcEntry>,
    /// 131072 entries, indexed by a 17-bit peek
    pub long: Vec<LongVlcEntry>,
}

/// Get the shared VLC lookup tables, building them on first use.
pub fn vlc_tables() -> &'static VlcTables {
    static TABLES: OnceLock<VlcTables> = OnceLock::new();
    TABLES.get_or_init(build_vlc_tables)
}

struct Symbol {
    word: u16,
    len: u8,
    /// End-of-block and escape codes end an entry: their trailing data
    /// (11-bit trailer, 16-bit literal) is not part of the window
    terminal: bool,
}

fn bits_at(window: u32, width: u8, pos: u8, len: u8) -> u16 {
    ((window >> (width - pos - len)) & ((1u32 << len) - 1)) as u16
}

/// Match one complete code (including its sign bit) at bit `pos` of a
/// `width`-bit window. Returns `None` when no code fits completely.
fn match_symbol(window: u32, width: u8, pos: u8) -> Option<Symbol> {
    let rem = width - pos;
    if rem >= 2 && bits_at(window, width, pos, 2) == 0b10 {
        return Some(Symbol {
            word: END_OF_BLOCK,
            len: 2,
            terminal: true,
        });
    }
    if rem >= 6 && bits_at(window, width, pos, 6) == 0b000001 {
        return Some(Symbol {
            word: ESCAPE_WORD,
            len: 6,
            terminal: true,
        });
    }
    for c in AC_CODES.iter() {
        if c.bits + 1 <= rem && bits_at(window, width, pos, c.bits) == c.code {
            let level = if bits_at(window, width, pos + c.bits, 1) != 0 {
                -(c.level as i16)
            } else {
                c.level as i16
            };
            let word = ((c.run as u16) << 10) | ((level as u16) & 0x3FF);
            return Some(Symbol {
                word,
                len: c.bits + 1,
                terminal: false,
            });
        }
    }
    None
}

fn build_vlc_tables() -> VlcTables {
    let mut short = vec![ShortVlcEntry::default(); 1 << 13];
    // Indices below 32 have eight leading zero bits and route to the long
    // table instead; they stay zeroed.
    for idx in 32..(1u32 << 13) {
        let mut pos = 0u8;
        let mut words = [0u16; 3];
        for slot in words.iter_mut() {
            match match_symbol(idx, 13, pos) {
                Some(sym) => {
                    *slot = sym.word;
                    pos += sym.len;
                    if sym.terminal {
                        break;
                    }
                }
                None => break,
            }
        }
        short[idx as usize] = ShortVlcEntry { bits: pos, words };
    }

    let mut long = vec![LongVlcEntry::default(); 1 << 17];
    for idx in 0..(1u32 << 17) {
        // Only windows whose first eight bits are zero are ever indexed.
        if idx >> 9 != 0 {
            continue;
        }
        if let Some(sym) = match_symbol(idx, 17, 0) {
            long[idx as usize] = LongVlcEntry {
                bits: sym.len - 8,
                word: sym.word,
            };
        }
    }

    VlcTables { short, long }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zigzag_is_a_permutation() {
        let mut seen = [false; 64];
        for &idx in ZIGZAG_SCAN.iter() {
            assert!(idx < 64);
            assert!(!seen[idx], "raster index {} visited twice", idx);
            seen[idx] = true;
        }
    }

    #[test]
    fn test_quant_table_spot_values() {
        assert_eq!(QUANT_LUMA[0], 12);
        assert_eq!(QUANT_LUMA[45], 109);
        assert_eq!(QUANT_LUMA[63], 16);
        assert_eq!(QUANT_CHROMA[6], 47);
        assert_eq!(QUANT_CHROMA[63], 99);
    }

    #[test]
    fn test_codebook_is_prefix_free() {
        // Including EOB and escape, no code may be the prefix of another.
        let mut all: Vec<(u16, u8)> = AC_CODES.iter().map(|c| (c.code, c.bits)).collect();
        all.push((0b10, 2));
        all.push((0b000001, 6));
        for (i, &(ca, la)) in all.iter().enumerate() {
            for &(cb, lb) in all.iter().skip(i + 1) {
                let (short, sl, long, ll) = if la <= lb {
                    (ca, la, cb, lb)
                } else {
                    (cb, lb, ca, la)
                };
                assert_ne!(
                    short as u32,
                    (long as u32) >> (ll - sl),
                    "code {:#b}/{} is a prefix of {:#b}/{}",
                    short,
                    sl,
                    long,
                    ll
                );
            }
        }
    }

    #[test]
    fn test_every_code_decodes_to_its_own_word() {
        for c in AC_CODES.iter() {
            // positive sign
            let window = (c.code as u32) << (17 - c.bits - 1);
            let sym = match_symbol(window, 17, 0).expect("code must match");
            assert_eq!(sym.len, c.bits + 1);
            assert_eq!(sym.word, ((c.run as u16) << 10) | c.level as u16);
            // negative sign
            let window = window | (1 << (17 - c.bits - 1));
            let sym = match_symbol(window, 17, 0).expect("code must match");
            assert_eq!(
                sym.word,
                ((c.run as u16) << 10) | ((-(c.level as i16) as u16) & 0x3FF)
            );
        }
    }

    #[test]
    fn test_short_entry_end_of_block() {
        let tables = vlc_tables();
        // window: "10" + 11 zero bits
        let e = tables.short[0b10_00000000000];
        assert_eq!(e.bits, 2);
        assert_eq!(e.words, [END_OF_BLOCK, 0, 0]);
    }

    #[test]
    fn test_short_entry_packs_three_symbols() {
        let tables = vlc_tables();
        // "11"+0 (0/+1), "11"+1 (0/-1), "11"+0 (0/+1), one pad bit
        let window = 0b110_111_110_0000;
        let e = tables.short[window];
        assert_eq!(e.bits, 9);
        assert_eq!(e.words, [0x0001, 0x03FF, 0x0001]);
    }

    #[test]
    fn test_short_entry_escape_terminates() {
        let tables = vlc_tables();
        // escape "000001" + 7 arbitrary bits
        let e = tables.short[0b000001_1111111];
        assert_eq!(e.bits, 6);
        assert_eq!(e.words, [ESCAPE_WORD, 0, 0]);
    }

    #[test]
    fn test_short_entry_symbol_then_end_of_block() {
        let tables = vlc_tables();
        // "011"+0 (1/+1) then "10" (EOB), 8 pad bits
        let window = 0b0110_10_0000000;
        let e = tables.short[window];
        assert_eq!(e.bits, 6);
        assert_eq!(e.words[0], (1 << 10) | 1);
        assert_eq!(e.words[1], END_OF_BLOCK);
        assert_eq!(e.words[2], 0);
    }

    #[test]
    fn test_long_entry_fourteen_bit_code() {
        let tables = vlc_tables();
        // 0/12 is "0000000011010" + sign; window has 3 trailing pad bits
        let idx = 0b0000000011010_0_000;
        let e = tables.long[idx];
        assert_eq!(e.bits, 6);
        assert_eq!(e.word, 12);
    }

    #[test]
    fn test_long_table_unreachable_region_is_zero() {
        let tables = vlc_tables();
        // any window whose first eight bits are not all zero
        let e = tables.long[1 << 16];
        assert_eq!(e.bits, 0);
        assert_eq!(e.word, 0);
    }

    #[test]
    fn test_all_zero_windows_are_invalid() {
        let tables = vlc_tables();
        assert_eq!(tables.long[0].bits, 0);
        assert_eq!(tables.long[0].word, 0);
    }
}
