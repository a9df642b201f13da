//! The hex layer: turning AT-command style hex strings into octets and back, and reading fields
//! out of the resulting buffer.
use std::fmt;
use nom::IResult;
use crate::errors::*;

named!(hex_digit(&[u8]) -> u8,
       map_opt!(
           one_of!("0123456789abcdefABCDEF"),
           |c: char| c.to_digit(16).map(|d| d as u8)
       )
);
named!(pub hex_octet(&[u8]) -> u8,
       do_parse!(
           hi: hex_digit >>
           lo: hex_digit >>
           ((hi << 4) | lo)
       )
);
named!(pub hex_octets(&[u8]) -> Vec<u8>,
       many0!(complete!(hex_octet))
);

/// Wrapper that displays a byte slice as uppercase hex, two digits per octet.
pub struct HexData<'a>(pub &'a [u8]);
impl<'a> fmt::Display for HexData<'a> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
       for b in self.0.iter() {
           write!(f, "{:02X}", b)?;
       }
       Ok(())
    }
}
impl<'a> HexData<'a> {
    /// Decode a hex string (either case) into octets.
    ///
    /// Fails with `InvalidHex` carrying the offset of the first character that couldn't be
    /// consumed, which also covers strings with a dangling odd digit.
    pub fn decode(data: &str) -> PduResult<Vec<u8>> {
        let input = data.trim();
        match hex_octets(input.as_bytes()) {
            IResult::Done(rest, octets) => {
                if rest.is_empty() {
                    Ok(octets)
                }
                else {
                    Err(PduError::InvalidHex(input.len() - rest.len()))
                }
            },
            _ => Err(PduError::InvalidHex(0))
        }
    }
}

/// Cursor over a decoded PDU. Every read is bounds-checked, and names the field being read so
/// a short buffer produces a useful error.
#[derive(Debug, Clone)]
pub(crate) struct OctetReader<'a> {
    buf: &'a [u8],
    offset: usize
}
impl<'a> OctetReader<'a> {
    pub(crate) fn new(buf: &'a [u8]) -> Self {
        OctetReader { buf, offset: 0 }
    }
    pub(crate) fn octet(&mut self, what: &'static str) -> PduResult<u8> {
        let b = self.buf;
        let offset = self.offset;
        check_offset!(b, offset, what);
        self.offset += 1;
        trace!("{} = {:02X}", what, b[offset]);
        Ok(b[offset])
    }
    pub(crate) fn take(&mut self, len: usize, what: &'static str) -> PduResult<&'a [u8]> {
        let b = self.buf;
        if len > 0 {
            let last = self.offset + len - 1;
            check_offset!(b, last, what);
        }
        let ret = &b[self.offset..self.offset + len];
        self.offset += len;
        trace!("{} = {}", what, HexData(ret));
        Ok(ret)
    }
    /// Everything not yet consumed.
    pub(crate) fn rest(&mut self) -> &'a [u8] {
        let ret = &self.buf[self.offset..];
        self.offset = self.buf.len();
        ret
    }
}

#[cfg(test)]
mod test {
    use super::*;
    #[test]
    fn decode_hex() {
        assert_eq!(HexData::decode("00ff7Fa0").unwrap(), vec![0x00, 0xFF, 0x7F, 0xA0]);
        assert_eq!(HexData::decode("").unwrap(), Vec::<u8>::new());
        assert_eq!(HexData::decode("0791\r\n").unwrap(), vec![0x07, 0x91]);
    }
    #[test]
    fn decode_hex_bad_char() {
        assert_eq!(HexData::decode("07G1"), Err(PduError::InvalidHex(2)));
    }
    #[test]
    fn decode_hex_odd_length() {
        assert_eq!(HexData::decode("07912"), Err(PduError::InvalidHex(4)));
    }
    #[test]
    fn display_hex() {
        assert_eq!(HexData(&[0x0A, 0xBC, 0x00]).to_string(), "0ABC00");
    }
    #[test]
    fn reader_bounds() {
        let data = [1, 2, 3];
        let mut r = OctetReader::new(&data);
        assert_eq!(r.octet("a").unwrap(), 1);
        assert_eq!(r.take(2, "b").unwrap(), &[2, 3]);
        assert_eq!(r.octet("c"), Err(PduError::Truncated("c")));
        assert_eq!(r.take(0, "d").unwrap(), &[] as &[u8]);
        let mut r = OctetReader::new(&data);
        assert_eq!(r.take(4, "e"), Err(PduError::Truncated("e")));
        assert_eq!(r.rest(), &[1, 2, 3]);
    }
}
