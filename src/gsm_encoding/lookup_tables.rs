//! The GSM 03.38 default alphabet and its extension table, indexed by septet value.

/// Escape to the extension table.
pub const GSM_ESCAPE: u8 = 0x1B;

/// Default alphabet. Slot 0x1B is the escape code, and holds a non-breaking space (what most
/// phones display for a stray escape); it's never used when encoding.
pub static GSM_DEFAULT_ALPHABET: [char; 128] = [
    '@', '\u{00A3}', '$', '\u{00A5}', '\u{00E8}', '\u{00E9}', '\u{00F9}', '\u{00EC}',
    '\u{00F2}', '\u{00C7}', '\n', '\u{00D8}', '\u{00F8}', '\r', '\u{00C5}', '\u{00E5}',
    '\u{0394}', '_', '\u{03A6}', '\u{0393}', '\u{039B}', '\u{03A9}', '\u{03A0}', '\u{03A8}',
    '\u{03A3}', '\u{0398}', '\u{039E}', '\u{00A0}', '\u{00C6}', '\u{00E6}', '\u{00DF}', '\u{00C9}',
    ' ', '!', '"', '#', '\u{00A4}', '%', '&', '\'',
    '(', ')', '*', '+', ',', '-', '.', '/',
    '0', '1', '2', '3', '4', '5', '6', '7',
    '8', '9', ':', ';', '<', '=', '>', '?',
    '\u{00A1}', 'A', 'B', 'C', 'D', 'E', 'F', 'G',
    'H', 'I', 'J', 'K', 'L', 'M', 'N', 'O',
    'P', 'Q', 'R', 'S', 'T', 'U', 'V', 'W',
    'X', 'Y', 'Z', '\u{00C4}', '\u{00D6}', '\u{00D1}', '\u{00DC}', '\u{00A7}',
    '\u{00BF}', 'a', 'b', 'c', 'd', 'e', 'f', 'g',
    'h', 'i', 'j', 'k', 'l', 'm', 'n', 'o',
    'p', 'q', 'r', 's', 't', 'u', 'v', 'w',
    'x', 'y', 'z', '\u{00E4}', '\u{00F6}', '\u{00F1}', '\u{00FC}', '\u{00E0}',
];

/// Extension table, reached through `GSM_ESCAPE`. Unassigned slots are `None`; receivers
/// should show the default alphabet character for those instead.
pub static GSM_EXTENSION_ALPHABET: [Option<char>; 128] = {
    let mut table = [None; 128];
    table[0x0A] = Some('\u{000C}');
    table[0x14] = Some('^');
    table[0x28] = Some('{');
    table[0x29] = Some('}');
    table[0x2F] = Some('\\');
    table[0x3C] = Some('[');
    table[0x3D] = Some('~');
    table[0x3E] = Some(']');
    table[0x40] = Some('|');
    table[0x65] = Some('\u{20AC}');
    table
};
