//! CP1252 character mapping used by cache strings and name hashes
//!
//! Bytes outside 0x80..=0x9F map straight to the Latin-1 code point. The
//! five undefined CP1252 slots decode to U+FFFD, and characters with no
//! CP1252 byte encode as `?`.

const HIGH_TABLE: [char; 32] = [
    '\u{20AC}', '\u{FFFD}', '\u{201A}', '\u{0192}', '\u{201E}', '\u{2026}', '\u{2020}', '\u{2021}',
    '\u{02C6}', '\u{2030}', '\u{0160}', '\u{2039}', '\u{0152}', '\u{FFFD}', '\u{017D}', '\u{FFFD}',
    '\u{FFFD}', '\u{2018}', '\u{2019}', '\u{201C}', '\u{201D}', '\u{2022}', '\u{2013}', '\u{2014}',
    '\u{02DC}', '\u{2122}', '\u{0161}', '\u{203A}', '\u{0153}', '\u{FFFD}', '\u{017E}', '\u{0178}',
];

/// Decode one CP1252 byte
pub fn decode_byte(byte: u8) -> char {
    match byte {
        0x80..=0x9F => HIGH_TABLE[(byte - 0x80) as usize],
        _ => char::from(byte),
    }
}

/// Encode one character as a CP1252 byte
pub fn encode_char(c: char) -> u8 {
    let code = u32::from(c);
    if code < 0x80 || (0xA0..=0xFF).contains(&code) {
        return code as u8;
    }
    HIGH_TABLE
        .iter()
        .position(|&mapped| mapped == c && mapped != '\u{FFFD}')
        .map_or(b'?', |i| 0x80 + i as u8)
}

/// Decode a CP1252 byte string
pub fn decode(bytes: &[u8]) -> String {
    bytes.iter().copied().map(decode_byte).collect()
}

/// Encode a string as CP1252 bytes
pub fn encode(s: &str) -> Vec<u8> {
    s.chars().map(encode_char).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ascii_round_trip() {
        let text = "Tool Leprechaun";
        assert_eq!(decode(&encode(text)), text);
    }

    #[test]
    fn test_high_range() {
        assert_eq!(decode_byte(0x80), '€');
        assert_eq!(encode_char('€'), 0x80);
        assert_eq!(encode_char('™'), 0x99);
        assert_eq!(decode_byte(0xE9), 'é');
        assert_eq!(encode_char('é'), 0xE9);
    }

    #[test]
    fn test_unmappable_becomes_question_mark() {
        assert_eq!(encode_char('\u{4E2D}'), b'?');
        assert_eq!(encode_char('\u{FFFD}'), b'?');
    }
}
