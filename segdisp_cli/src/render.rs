//! Terminal rendering of a digit buffer as seven-segment art.

use segdisp_core::DigitBuffer;
use segdisp_core::segment::DECIMAL_POINT;

const SEG_A: u8 = 1 << 0;
const SEG_B: u8 = 1 << 1;
const SEG_C: u8 = 1 << 2;
const SEG_D: u8 = 1 << 3;
const SEG_E: u8 = 1 << 4;
const SEG_F: u8 = 1 << 5;
const SEG_G: u8 = 1 << 6;

fn lit(pattern: u8, segment: u8, on: char) -> char {
    if pattern & segment != 0 { on } else { ' ' }
}

/// Three rows of art, leftmost digit first. Each digit takes four columns:
/// three for the segments and one for the decimal point.
pub fn art(buffer: &DigitBuffer) -> [String; 3] {
    let mut rows = [String::new(), String::new(), String::new()];
    for &p in buffer.patterns().iter().rev() {
        rows[0].extend([' ', lit(p, SEG_A, '_'), ' ', ' ']);
        rows[1].extend([lit(p, SEG_F, '|'), lit(p, SEG_G, '_'), lit(p, SEG_B, '|'), ' ']);
        rows[2].extend([
            lit(p, SEG_E, '|'),
            lit(p, SEG_D, '_'),
            lit(p, SEG_C, '|'),
            lit(p, DECIMAL_POINT, '.'),
        ]);
    }
    rows.map(|r| r.trim_end().to_string())
}

/// Raw patterns, leftmost digit first, as the segment bus would see them.
pub fn hex_patterns(buffer: &DigitBuffer) -> String {
    buffer
        .patterns()
        .iter()
        .rev()
        .map(|p| format!("0x{p:02X}"))
        .collect::<Vec<_>>()
        .join(" ")
}
