//! Utilities for dealing with User Data Headers (used for concatenated SMS, among other things)
//! inside messages.
//!
//! [This Wikipedia article](https://en.wikipedia.org/wiki/User_Data_Header) explains what this is
//! for pretty well. Most uses of the UDH are vestigial; nowadays it's mostly useful for sending
//! concatenated SMS.
use std::convert::TryFrom;
use crate::errors::*;

/// Concatenated short message, 8-bit reference number.
pub const IEI_CONCATENATED_8BIT: u8 = 0x00;
/// Concatenated short message, 16-bit reference number.
pub const IEI_CONCATENATED_16BIT: u8 = 0x08;

/// Component (information element) of a User Data Header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UdhComponent {
    /// Component identifier (IEI).
    pub id: u8,
    /// Component data.
    pub data: Vec<u8>
}
/// A User Data Header itself.
///
/// You'll likely just want to call `concatenation` on this to check whether the
/// message is concatenated. Components with identifiers this library doesn't know about are
/// kept, undecoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserDataHeader {
    pub components: Vec<UdhComponent>
}
/// Data about a concatenated SMS.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConcatenatedSmsData {
    /// Reference that identifies which message this is a part of - this is like an ID for the
    /// whole message.
    pub reference: u16,
    /// How many parts to the message exist (e.g. 2).
    pub parts: u8,
    /// Which part this is (e.g. 1 of 2).
    pub sequence: u8
}
impl UserDataHeader {
    /// A header marking part `sequence` of `parts`, with an 8-bit reference.
    pub fn concatenated(reference: u8, parts: u8, sequence: u8) -> Self {
        UserDataHeader {
            components: vec![UdhComponent {
                id: IEI_CONCATENATED_8BIT,
                data: vec![reference, parts, sequence]
            }]
        }
    }
    /// If there is concatenated SMS data in this header, return it.
    pub fn concatenation(&self) -> Option<ConcatenatedSmsData> {
        for comp in self.components.iter() {
            if comp.id == IEI_CONCATENATED_8BIT && comp.data.len() == 3 {
                return Some(ConcatenatedSmsData {
                    reference: comp.data[0] as _,
                    parts: comp.data[1],
                    sequence: comp.data[2]
                });
            }
            if comp.id == IEI_CONCATENATED_16BIT && comp.data.len() == 4 {
                let reference = ((comp.data[0] as u16) << 8) | (comp.data[1] as u16);
                return Some(ConcatenatedSmsData {
                    reference,
                    parts: comp.data[2],
                    sequence: comp.data[3]
                });
            }
        }
        None
    }
    /// Identifier of the first information element, if any.
    pub fn iei(&self) -> Option<u8> {
        self.components.first().map(|c| c.id)
    }
    /// The User Data Header Length (UDHL): octets in the header, not counting the length octet
    /// itself.
    pub fn length(&self) -> usize {
        self.components.iter()
            .map(|c| c.data.len() + 2)
            .sum()
    }
    /// Serialize this UDH to wire format, including the length octet.
    pub fn as_bytes(&self) -> Vec<u8> {
        let mut ret = vec![self.length() as u8];
        for comp in self.components.iter() {
            ret.push(comp.id);
            ret.push(comp.data.len() as u8);
            ret.extend(comp.data.iter());
        }
        ret
    }
}
impl<'a> TryFrom<&'a [u8]> for UserDataHeader {
    type Error = PduError;
    /// Accepts a UDH *without* the UDH Length octet at the start.
    fn try_from(b: &'a [u8]) -> PduResult<Self> {
        let mut offset = 0;
        let mut ret = vec![];
        loop {
            if b.get(offset).is_none() {
                break;
            }
            let id = b[offset];
            offset += 1;
            check_offset!(b, offset, "UDH component length");
            let len = b[offset];
            let end = offset + len as usize + 1;
            offset += 1;
            if len > 0 {
                let o = end - 1;
                check_offset!(b, o, "UDH component data");
            }
            let data = b[offset..end].to_owned();
            offset = end;
            trace!("UDH component {:02X}: {:?}", id, data);
            ret.push(UdhComponent { id, data });
        }
        Ok(UserDataHeader {
            components: ret
        })
    }
}

#[cfg(test)]
mod test {
    use super::*;
    #[test]
    fn concatenated_8bit() {
        let udh = UserDataHeader::try_from(&[0x00, 0x03, 0xCA, 0x02, 0x01][..]).unwrap();
        assert_eq!(udh.iei(), Some(IEI_CONCATENATED_8BIT));
        assert_eq!(udh.length(), 5);
        assert_eq!(udh.concatenation(), Some(ConcatenatedSmsData {
            reference: 0xCA,
            parts: 2,
            sequence: 1
        }));
    }
    #[test]
    fn concatenated_16bit() {
        let udh = UserDataHeader::try_from(&[0x08, 0x04, 0x12, 0x34, 0x03, 0x02][..]).unwrap();
        assert_eq!(udh.length(), 6);
        assert_eq!(udh.concatenation(), Some(ConcatenatedSmsData {
            reference: 0x1234,
            parts: 3,
            sequence: 2
        }));
    }
    #[test]
    fn unknown_component_kept() {
        // application port addressing, 16-bit
        let udh = UserDataHeader::try_from(&[0x05, 0x04, 0x0B, 0x84, 0x23, 0xF0][..]).unwrap();
        assert_eq!(udh.iei(), Some(0x05));
        assert_eq!(udh.concatenation(), None);
        assert_eq!(udh.components[0].data, vec![0x0B, 0x84, 0x23, 0xF0]);
    }
    #[test]
    fn serialize() {
        let udh = UserDataHeader::concatenated(0x42, 3, 1);
        assert_eq!(udh.as_bytes(), vec![0x05, 0x00, 0x03, 0x42, 0x03, 0x01]);
    }
    #[test]
    fn truncated_component() {
        assert_eq!(UserDataHeader::try_from(&[0x00, 0x03, 0xCA][..]),
                   Err(PduError::Truncated("UDH component data")));
        assert_eq!(UserDataHeader::try_from(&[0x00][..]),
                   Err(PduError::Truncated("UDH component length")));
    }
}
