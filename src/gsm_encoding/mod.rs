//! Utilities for dealing with the (annoying) GSM 7-bit encoding (GSM 03.38), and decoding/encoding message
//! data.
//!
//! "The annoying GSM 7-bit encoding" is otherwise known as [GSM
//! 03.38](https://en.wikipedia.org/wiki/GSM_03.38), and that Wikipedia article is pretty
//! informative.
//!
//! Text goes through two stages: characters map to *septets* (7-bit values, with characters from
//! the extension table taking two septets: an escape, then the extension index), and septets are
//! then *packed* 8-into-7 octets. Both stages are exposed separately here.
//!
//! **NB:** SMS messages that are longer than the per-message character limit are sent & received
//! as [concatenated SMS](https://en.wikipedia.org/wiki/Concatenated_SMS) messages.
//! `GsmMessageData::encode_message` does the splitting for you.

use std::convert::TryFrom;
use crate::pdu::MessageEncoding;
use crate::errors::*;

mod lookup_tables;
pub mod udh;

use self::udh::UserDataHeader;
pub use self::lookup_tables::{GSM_DEFAULT_ALPHABET, GSM_EXTENSION_ALPHABET, GSM_ESCAPE};

/// Septets in a single, unconcatenated 7-bit message.
pub const MAX_SEPTETS: usize = 160;
/// Septets left per part once a concatenation header has been added.
pub const MAX_SEPTETS_CONCATENATED: usize = 153;
/// UCS2 characters in a single, unconcatenated message.
pub const MAX_UCS2_UNITS: usize = 70;
/// UCS2 characters left per part once a concatenation header has been added.
pub const MAX_UCS2_UNITS_CONCATENATED: usize = 66;

/// Decode a buffer of **unpacked** septets into a string.
///
/// An escape septet is swallowed, and the septet after it is looked up in the extension table
/// (falling back to the default alphabet for unassigned extension codes).
pub fn gsm_decode_string(input: &[u8]) -> String {
    let mut ret = String::new();
    let mut escaped = false;
    for &b in input.iter() {
        let b = (b & 0x7F) as usize;
        if escaped {
            escaped = false;
            ret.push(GSM_EXTENSION_ALPHABET[b].unwrap_or(GSM_DEFAULT_ALPHABET[b]));
        }
        else if b == GSM_ESCAPE as usize {
            escaped = true;
        }
        else {
            ret.push(GSM_DEFAULT_ALPHABET[b]);
        }
    }
    ret
}
/// Tries to encode a character into the given destination buffer, returning `true` if the
/// character was successfully encoded, and `false` if the character cannot be represented in the
/// GSM 7-bit encoding.
pub fn try_gsm_encode_char(b: char, dest: &mut Vec<u8>) -> bool {
    let default = GSM_DEFAULT_ALPHABET.iter()
        .enumerate()
        .position(|(i, &ch)| ch == b && i != GSM_ESCAPE as usize);
    if let Some(i) = default {
        dest.push(i as u8);
        return true;
    }
    let extended = GSM_EXTENSION_ALPHABET.iter()
        .position(|&ch| ch == Some(b));
    if let Some(i) = extended {
        dest.push(GSM_ESCAPE);
        dest.push(i as u8);
        return true;
    }
    false
}
/// Encode a string as **unpacked** septets, failing on the first character that has no GSM
/// representation.
pub fn gsm_encode_string(input: &str) -> PduResult<Vec<u8>> {
    let mut ret = vec![];
    for c in input.chars() {
        if !try_gsm_encode_char(c, &mut ret) {
            Err(PduError::UnencodableCharacter(c))?
        }
    }
    Ok(ret)
}
/// Like `gsm_encode_string`, but only tells you whether it worked.
pub fn try_gsm_encode_string(input: &str) -> Option<Vec<u8>> {
    gsm_encode_string(input).ok()
}
/// How many septets are needed to cover a user data header of `udh_octets` octets (including
/// the length octet), and how many fill bits that leaves before the first character.
pub fn udh_septets(udh_octets: usize) -> (usize, usize) {
    let bits = udh_octets * 8;
    let septets = (bits + 6) / 7;
    (septets, septets * 7 - bits)
}
/// Number of whole septets that fit in `octets` octets after skipping `padding` fill bits.
pub fn available_septets(octets: usize, padding: usize) -> usize {
    (octets * 8).saturating_sub(padding) / 7
}
/// Unpack `len` septets from `orig`, starting `padding` bits into the first octet.
///
/// Septets are laid out least-significant bit first across the octet stream, so septet `i`
/// starts at bit `padding + 7 * i`. Asking for more septets than `orig` holds yields only the
/// ones that are there.
pub fn unpack_septets(orig: &[u8], padding: usize, len: usize) -> Vec<u8> {
    let len = len.min(available_septets(orig.len(), padding));
    (0..len)
        .map(|i| {
            let bit = padding + i * 7;
            let lo = orig[bit / 8] as u16;
            let hi = orig.get(bit / 8 + 1).cloned().unwrap_or(0) as u16;
            ((((hi << 8) | lo) >> (bit % 8)) & 0x7F) as u8
        })
        .collect()
}
/// Pack septets into octets, leaving `padding` zero bits at the start (used to align the text
/// to a septet boundary after a user data header).
pub fn pack_septets(orig: &[u8], padding: usize) -> Vec<u8> {
    let bits = padding + orig.len() * 7;
    let mut ret = vec![0u8; (bits + 7) / 8];
    for (i, septet) in orig.iter().enumerate() {
        let bit = padding + i * 7;
        let val = ((*septet & 0x7F) as u16) << (bit % 8);
        ret[bit / 8] |= val as u8;
        if val > 0xFF {
            ret[bit / 8 + 1] |= (val >> 8) as u8;
        }
    }
    ret
}
/// Encode a string as UCS2 (UTF-16BE) code units.
pub fn ucs2_encode_string(input: &str) -> PduResult<Vec<u16>> {
    use encoding::{Encoding, EncoderTrap};
    use encoding::all::UTF_16BE;

    let bytes = UTF_16BE.encode(input, EncoderTrap::Strict)
        .map_err(|_| PduError::InvalidField {
            field: "text",
            reason: "not representable as UTF-16"
        })?;
    Ok(bytes.chunks(2)
       .map(|c| ((c[0] as u16) << 8) | c.get(1).cloned().unwrap_or(0) as u16)
       .collect())
}
/// Decode UCS2 (UTF-16BE) octets into a string, replacing anything undecodable.
///
/// A dangling odd octet at the end is ignored.
pub fn ucs2_decode(input: &[u8]) -> PduResult<String> {
    use encoding::{Encoding, DecoderTrap};
    use encoding::all::UTF_16BE;

    let even = input.len() - input.len() % 2;
    UTF_16BE.decode(&input[..even], DecoderTrap::Replace)
        .map_err(|_| PduError::InvalidField {
            field: "user data",
            reason: "invalid UCS2 text"
        })
}
/// Split `buf` into chunks of at most `max_len` units, never ending a chunk on a unit for
/// which `is_lead` is true (so escape sequences and surrogate pairs stay together).
fn split_units<T, F>(buf: &[T], max_len: usize, is_lead: F) -> Vec<&[T]> where F: Fn(&T) -> bool {
    let mut ret = vec![];
    let mut rest = buf;
    while max_len < rest.len() {
        let mut at = max_len;
        if at > 1 && is_lead(&rest[at - 1]) {
            at -= 1;
        }
        let (head, tail) = rest.split_at(at);
        ret.push(head);
        rest = tail;
    }
    ret.push(rest);
    ret
}
fn parts_count(parts: usize) -> PduResult<u8> {
    if parts > u8::max_value() as usize {
        Err(PduError::InvalidField {
            field: "text",
            reason: "too long to send as a concatenated message"
        })?
    }
    Ok(parts as u8)
}
/// The 'data' portion of an SMS message - i.e. the text, for a simple message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GsmMessageData {
    pub(crate) encoding: MessageEncoding,
    pub(crate) udh: bool,
    pub(crate) bytes: Vec<u8>,
    pub(crate) user_data_len: u8
}
/// A decoded text mesasge, with optional user data header.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DecodedMessage {
    /// Decoded text.
    pub text: String,
    /// User data header. You'll want this to check if the message is concatenated, i.e. is part of
    /// a multi-part series.
    pub udh: Option<UserDataHeader>
}
impl GsmMessageData {
    pub(crate) fn new(encoding: MessageEncoding, udh: bool, bytes: Vec<u8>, user_data_len: u8) -> Self {
        GsmMessageData { encoding, udh, bytes, user_data_len }
    }
    /// Whether the data starts with a user data header.
    pub fn has_udh(&self) -> bool {
        self.udh
    }
    /// Get the underlying bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }
    /// Get the user data length (in septets for 7-bit data, octets otherwise).
    pub fn user_data_len(&self) -> u8 {
        self.user_data_len
    }
    /// Attempt to decode this message.
    ///
    /// 8-bit data isn't interpreted, and decodes to an empty string.
    pub fn decode_message(&self) -> PduResult<DecodedMessage> {
        let mut padding = 0;
        let mut skip_septets = 0;
        let mut start = 0;
        let mut udh = None;
        if self.udh {
            if self.bytes.len() < 1 {
                Err(PduError::Truncated("user data header length"))?
            }
            let udhl = self.bytes[0] as usize;
            start = udhl + 1;
            if self.bytes.len() < start {
                Err(PduError::Truncated("user data header"))?
            }
            let (septets, fill) = udh_septets(start);
            skip_septets = septets;
            padding = fill;
            udh = Some(UserDataHeader::try_from(&self.bytes[1..start])?);
        }
        let body = &self.bytes[start..];
        let text = match self.encoding {
            MessageEncoding::Gsm7Bit => {
                let declared = (self.user_data_len as usize).checked_sub(skip_septets)
                    .ok_or(PduError::InvalidField {
                        field: "user data length",
                        reason: "shorter than the user data header"
                    })?;
                let available = available_septets(body.len(), padding);
                if declared > available {
                    warn!("user data length says {} septets, but only {} present", declared, available);
                }
                gsm_decode_string(&unpack_septets(body, padding, declared))
            },
            MessageEncoding::Ucs2 => {
                let declared = (self.user_data_len as usize).checked_sub(start)
                    .ok_or(PduError::InvalidField {
                        field: "user data length",
                        reason: "shorter than the user data header"
                    })?;
                if declared > body.len() {
                    warn!("user data length says {} octets, but only {} present", declared, body.len());
                }
                ucs2_decode(&body[..declared.min(body.len())])?
            },
            MessageEncoding::EightBit => {
                debug!("not decoding {} octets of 8-bit data", body.len());
                String::new()
            }
        };
        Ok(DecodedMessage { text, udh })
    }
    /// Encode an arbitrary string of text into one, or multiple, message data segments.
    ///
    /// If this function returns more than one bit of data, it means it's been split into multiple
    /// concatenated parts for you, each tagged with `csms_ref`, and you'll need to send each part
    /// individually in order.
    pub fn encode_message(msg: &str, encoding: MessageEncoding, csms_ref: u8) -> PduResult<Vec<GsmMessageData>> {
        match encoding {
            MessageEncoding::Gsm7Bit => {
                let buf = gsm_encode_string(msg)?;
                if buf.len() <= MAX_SEPTETS {
                    let user_data_len = buf.len() as u8;
                    return Ok(vec![GsmMessageData::new(encoding, false, pack_septets(&buf, 0), user_data_len)]);
                }
                // time to make a Concatenated SMS
                let bufs = split_units(&buf, MAX_SEPTETS_CONCATENATED, |&s| s == GSM_ESCAPE);
                let num_parts = parts_count(bufs.len())?;
                Ok(bufs.into_iter()
                   .enumerate()
                   .map(|(i, buf)| {
                       let udh = UserDataHeader::concatenated(csms_ref, num_parts, i as u8 + 1);
                       let mut ret = udh.as_bytes();
                       let (header_septets, padding) = udh_septets(ret.len());
                       let len = header_septets + buf.len();
                       ret.extend(pack_septets(buf, padding));
                       GsmMessageData::new(encoding, true, ret, len as u8)
                   })
                   .collect())
            },
            MessageEncoding::Ucs2 => {
                let buf = ucs2_encode_string(msg)?;
                let to_bytes = |units: &[u16]| {
                    units.iter()
                        .flat_map(|u| vec![(u >> 8) as u8, *u as u8])
                        .collect::<Vec<u8>>()
                };
                if buf.len() <= MAX_UCS2_UNITS {
                    let bytes = to_bytes(&buf);
                    let user_data_len = bytes.len() as u8;
                    return Ok(vec![GsmMessageData::new(encoding, false, bytes, user_data_len)]);
                }
                let bufs = split_units(&buf, MAX_UCS2_UNITS_CONCATENATED, |&u| u >= 0xD800 && u <= 0xDBFF);
                let num_parts = parts_count(bufs.len())?;
                Ok(bufs.into_iter()
                   .enumerate()
                   .map(|(i, buf)| {
                       let udh = UserDataHeader::concatenated(csms_ref, num_parts, i as u8 + 1);
                       let mut ret = udh.as_bytes();
                       ret.extend(to_bytes(buf));
                       let len = ret.len();
                       GsmMessageData::new(encoding, true, ret, len as u8)
                   })
                   .collect())
            },
            x => Err(PduError::UnsupportedEncoding(x))
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn pack_hellohello() {
        let septets = gsm_encode_string("hellohello").unwrap();
        assert_eq!(pack_septets(&septets, 0),
                   vec![0xE8, 0x32, 0x9B, 0xFD, 0x46, 0x97, 0xD9, 0xEC, 0x37]);
    }
    #[test]
    fn unpack_hellohello() {
        let packed = [0xE8, 0x32, 0x9B, 0xFD, 0x46, 0x97, 0xD9, 0xEC, 0x37];
        assert_eq!(gsm_decode_string(&unpack_septets(&packed, 0, 10)), "hellohello");
    }
    #[test]
    fn eight_septets_fill_seven_octets() {
        let septets = gsm_encode_string("abcdefgh").unwrap();
        let packed = pack_septets(&septets, 0);
        assert_eq!(packed.len(), 7);
        assert_eq!(gsm_decode_string(&unpack_septets(&packed, 0, 8)), "abcdefgh");
    }
    #[test]
    fn padded_packing() {
        let septets = gsm_encode_string("Hi").unwrap();
        // 'H' = 0x48 shifted up one bit, then 'i' = 0x69 filling the second octet.
        assert_eq!(pack_septets(&septets, 1), vec![0x90, 0x69]);
        assert_eq!(unpack_septets(&[0x90, 0x69], 1, 2), septets);
    }
    #[test]
    fn unpack_clamps_to_available() {
        assert_eq!(unpack_septets(&[0xE8, 0x32], 0, 10).len(), 2);
        assert_eq!(unpack_septets(&[], 1, 3).len(), 0);
    }
    #[test]
    fn escape_characters() {
        for c in "^{}\\[~]|\u{20AC}".chars() {
            let mut buf = vec![];
            assert!(try_gsm_encode_char(c, &mut buf), "{:?} should encode", c);
            assert_eq!(buf.len(), 2);
            assert_eq!(buf[0], GSM_ESCAPE);
            assert_eq!(gsm_decode_string(&buf), c.to_string());
        }
    }
    #[test]
    fn default_alphabet_characters() {
        let text = "@£$¥èéùìòÇ\nØø\rÅåΔ_ΦΓΛΩΠΨΣΘΞÆæßÉ !\"#¤%&'()*+,-./09:;<=>?¡AZÄÖÑÜ§¿azäöñüà";
        let septets = gsm_encode_string(text).unwrap();
        assert_eq!(septets.len(), text.chars().count());
        assert_eq!(gsm_decode_string(&septets), text);
    }
    #[test]
    fn unencodable_character() {
        assert_eq!(gsm_encode_string("hi \u{1F600}"), Err(PduError::UnencodableCharacter('\u{1F600}')));
        assert_eq!(try_gsm_encode_string("\u{1B}"), None);
    }
    #[test]
    fn unknown_escape_falls_back() {
        assert_eq!(gsm_decode_string(&[GSM_ESCAPE, 0x41]), "A");
        assert_eq!(gsm_decode_string(&[0x41, GSM_ESCAPE]), "A");
    }
    #[test]
    fn udh_fill_bits() {
        assert_eq!(udh_septets(6), (7, 1));
        assert_eq!(udh_septets(7), (8, 0));
        assert_eq!(udh_septets(5), (6, 2));
    }
    #[test]
    fn ucs2() {
        let units = ucs2_encode_string("h\u{00E9}\u{4F60}").unwrap();
        assert_eq!(units, vec![0x0068, 0x00E9, 0x4F60]);
        assert_eq!(ucs2_decode(&[0x00, 0x68, 0x00, 0xE9, 0x4F, 0x60, 0x00]).unwrap(), "h\u{00E9}\u{4F60}");
    }
    #[test]
    fn encode_single_7bit() {
        let data = GsmMessageData::encode_message("hellohello", MessageEncoding::Gsm7Bit, 0).unwrap();
        assert_eq!(data.len(), 1);
        assert!(!data[0].has_udh());
        assert_eq!(data[0].user_data_len(), 10);
        assert_eq!(data[0].decode_message().unwrap().text, "hellohello");
    }
    #[test]
    fn encode_concatenated_7bit() {
        let text = "a".repeat(400);
        let data = GsmMessageData::encode_message(&text, MessageEncoding::Gsm7Bit, 0x42).unwrap();
        assert_eq!(data.len(), 3);
        let mut out = String::new();
        for (i, part) in data.iter().enumerate() {
            assert!(part.has_udh());
            assert_eq!(&part.as_bytes()[..6], &[0x05, 0x00, 0x03, 0x42, 0x03, i as u8 + 1]);
            let dec = part.decode_message().unwrap();
            let concat = dec.udh.unwrap().concatenation().unwrap();
            assert_eq!(concat.reference, 0x42);
            assert_eq!(concat.parts, 3);
            assert_eq!(concat.sequence, i as u8 + 1);
            out.push_str(&dec.text);
        }
        assert_eq!(data[0].user_data_len(), 7 + 153);
        assert_eq!(data[2].user_data_len() as usize, 7 + 400 - 2 * 153);
        assert_eq!(out, text);
    }
    #[test]
    fn concatenation_keeps_escapes_together() {
        let text = format!("{}{{", "a".repeat(152));
        let data = GsmMessageData::encode_message(&format!("{}{}", text, "b".repeat(20)), MessageEncoding::Gsm7Bit, 1).unwrap();
        assert_eq!(data.len(), 2);
        assert_eq!(data[0].decode_message().unwrap().text, "a".repeat(152));
        assert!(data[1].decode_message().unwrap().text.starts_with('{'));
    }
    #[test]
    fn encode_concatenated_ucs2() {
        let text = "\u{4F60}".repeat(100);
        let data = GsmMessageData::encode_message(&text, MessageEncoding::Ucs2, 7).unwrap();
        assert_eq!(data.len(), 2);
        assert_eq!(data[0].user_data_len(), 6 + 66 * 2);
        assert_eq!(data[1].user_data_len(), 6 + 34 * 2);
        let out: String = data.iter().map(|d| d.decode_message().unwrap().text).collect();
        assert_eq!(out, text);
    }
    #[test]
    fn encode_eight_bit_unsupported() {
        assert_eq!(GsmMessageData::encode_message("x", MessageEncoding::EightBit, 0),
                   Err(PduError::UnsupportedEncoding(MessageEncoding::EightBit)));
    }
    #[test]
    fn decode_eight_bit_is_empty() {
        let data = GsmMessageData::new(MessageEncoding::EightBit, false, vec![1, 2, 3], 3);
        assert_eq!(data.decode_message().unwrap().text, "");
    }
    #[test]
    fn decode_length_shorter_than_udh() {
        let header = vec![0x05, 0x00, 0x03, 0xCA, 0x02, 0x01];
        let mut ucs2 = header.clone();
        ucs2.extend_from_slice(&[0x00, 0x48]);
        let data = GsmMessageData::new(MessageEncoding::Ucs2, true, ucs2, 2);
        let err = PduError::InvalidField {
            field: "user data length",
            reason: "shorter than the user data header"
        };
        assert_eq!(data.decode_message(), Err(err.clone()));
        let mut gsm = header;
        gsm.push(0x90);
        let data = GsmMessageData::new(MessageEncoding::Gsm7Bit, true, gsm, 2);
        assert_eq!(data.decode_message(), Err(err));
    }
    #[test]
    fn decode_udh_longer_than_data() {
        let data = GsmMessageData::new(MessageEncoding::Gsm7Bit, true, vec![0x05, 0x00, 0x03], 10);
        assert_eq!(data.decode_message(), Err(PduError::Truncated("user data header")));
    }
}
