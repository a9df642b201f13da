//! Utilities for dealing with GSM 03.40 Protocol Data Units (PDUs).
//!
//! See [this Wikipedia article](https://en.wikipedia.org/wiki/GSM_03.40) for more general
//! information on the format of PDUs.
//!
//! Decoding understands SMS-DELIVER, SMS-SUBMIT and SMS-STATUS-REPORT; anything with the reserved
//! message type is decoded as if it were an SMS-DELIVER, and tagged as unknown. Encoding (see the
//! `submit` module) only ever produces SMS-SUBMIT.
use std::fmt;
use std::str::FromStr;
use std::convert::{Infallible, TryFrom};
use chrono::{DateTime, FixedOffset, NaiveDate, TimeZone};
use crate::errors::*;
use crate::gsm_encoding::{GsmMessageData, gsm_decode_string, unpack_septets};
use crate::gsm_encoding::udh::UserDataHeader;
use crate::parse::{HexData, OctetReader};
use crate::util::FromOctet;

/// Address type octet for numbers of unknown type (national numbers, usually).
pub const TYPE_UNKNOWN: u8 = 0x81;
/// Address type octet for international numbers.
pub const TYPE_INTERNATIONAL: u8 = 0x91;
/// Address type octet for alphanumeric sender IDs.
pub const TYPE_ALPHANUMERIC: u8 = 0xD0;
/// Most semi-octet digit octets an address can carry (20 digits).
pub const MAX_ADDRESS_OCTETS: usize = 10;

/// Type of number value - the middle three bits of an address type octet.
#[repr(u8)]
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, FromPrimitive, Hash)]
pub enum TypeOfNumber {
    /// Unknown number type ('let the network handle it please').
    Unknown = 0b0_000_0000,
    /// International (i.e. starting with +).
    International = 0b0_001_0000,
    /// National number - no prefix or suffix added.
    National = 0b0_010_0000,
    /// Network specific number.
    NetworkSpecific = 0b0_011_0000,
    /// Subscriber number.
    Subscriber = 0b0_100_0000,
    /// Alphanumeric sender ID (e.g. when banks/other companies send you SMSes), packed as GSM
    /// 7-bit text instead of semi-octets.
    Alphanumeric = 0b0_101_0000,
    /// Abbreviated number.
    Abbreviated = 0b0_110_0000,
    /// Reserved.
    Reserved = 0b0_111_0000
}

/// Decode semi-octets (swapped nibbles, low nibble first) into digits.
///
/// The `F` filler nibble is dropped; `A` to `E` become `*`, `#`, `a`, `b` and `c`.
pub fn decode_semi_octets(b: &[u8]) -> String {
    let mut ret = String::new();
    for b in b.iter() {
        for &nibble in [b & 0b0000_1111, b >> 4].iter() {
            match nibble {
                0..=9 => ret.push((b'0' + nibble) as char),
                0xA => ret.push('*'),
                0xB => ret.push('#'),
                0xC => ret.push('a'),
                0xD => ret.push('b'),
                0xE => ret.push('c'),
                _ => {}
            }
        }
    }
    ret
}
/// Encode digits as semi-octets, padding an odd-length number with an `F` nibble.
pub fn encode_semi_octets(digits: &str) -> PduResult<Vec<u8>> {
    let nibbles = digits.chars()
        .map(|c| match c {
            '0'..='9' => Ok(c as u8 - b'0'),
            '*' => Ok(0xA),
            '#' => Ok(0xB),
            'a' => Ok(0xC),
            'b' => Ok(0xD),
            'c' => Ok(0xE),
            _ => Err(PduError::InvalidField {
                field: "address",
                reason: "not a semi-octet digit"
            })
        })
        .collect::<PduResult<Vec<u8>>>()?;
    Ok(nibbles.chunks(2)
       .map(|pair| pair[0] | (pair.get(1).cloned().unwrap_or(0b1111) << 4))
       .collect())
}

/// A PDU address (i.e. phone number, and type of address octet).
///
/// Use the `FromStr` implementation here to convert regular string phone numbers: a leading `+`
/// makes the number international.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PduAddress {
    /// Type of address octet (`TYPE_UNKNOWN`, `TYPE_INTERNATIONAL`, `TYPE_ALPHANUMERIC`...)
    pub type_addr: u8,
    /// The number (or alphanumeric text), without any `+` prefix.
    pub number: String
}
impl fmt::Display for PduAddress {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.type_of_number() == TypeOfNumber::International {
            write!(f, "+")?;
        }
        write!(f, "{}", self.number)
    }
}
impl FromStr for PduAddress {
    type Err = Infallible;
    fn from_str(st: &str) -> Result<Self, Infallible> {
        let mut int = false;
        let number = st.chars()
            .filter(|&x| {
                match x {
                    '0'..='9' | '*' | '#' => true,
                    '+' => {
                        int = true;
                        false
                    },
                    _ => false
                }
            }).collect::<String>();
        let type_addr = if int {
            TYPE_INTERNATIONAL
        }
        else {
            TYPE_UNKNOWN
        };
        Ok(PduAddress { type_addr, number })
    }
}
impl PduAddress {
    pub fn new<T: Into<String>>(number: T, type_addr: u8) -> Self {
        PduAddress { type_addr, number: number.into() }
    }
    pub fn type_of_number(&self) -> TypeOfNumber {
        TypeOfNumber::from_octet(self.type_addr & 0b0_111_0000, "type of number")
            .unwrap_or(TypeOfNumber::Unknown)
    }
    /// The type octet used when encoding: only `TYPE_UNKNOWN` and `TYPE_INTERNATIONAL` are
    /// sent, anything else becomes `TYPE_UNKNOWN`.
    pub fn encoded_type(&self) -> u8 {
        match self.type_addr {
            TYPE_UNKNOWN | TYPE_INTERNATIONAL => self.type_addr,
            _ => TYPE_UNKNOWN
        }
    }
    /// Encode as a service centre address: the length octet counts octets (including the type
    /// octet). An empty number encodes as the lone `00` "use the default SMSC" marker.
    pub fn as_smsc_bytes(&self) -> PduResult<Vec<u8>> {
        if self.number.is_empty() {
            return Ok(vec![0]);
        }
        let digits = encode_semi_octets(&self.number)?;
        if digits.len() > MAX_ADDRESS_OCTETS {
            Err(PduError::InvalidField { field: "SMSC address", reason: "too long" })?
        }
        let mut ret = vec![self.encoded_type()];
        ret.extend(digits);
        ret.insert(0, ret.len() as u8);
        Ok(ret)
    }
    /// Encode as a TP address (originating/destination): the length octet counts digits.
    pub fn as_address_bytes(&self) -> PduResult<Vec<u8>> {
        let digits = encode_semi_octets(&self.number)?;
        if digits.len() > MAX_ADDRESS_OCTETS {
            Err(PduError::InvalidField { field: "address", reason: "too long" })?
        }
        let mut ret = vec![self.number.chars().count() as u8, self.encoded_type()];
        ret.extend(digits);
        Ok(ret)
    }
    pub(crate) fn read_smsc(r: &mut OctetReader) -> PduResult<Option<Self>> {
        let len = r.octet("SMSC address length")? as usize;
        if len == 0 {
            return Ok(None);
        }
        let type_addr = r.octet("SMSC address type")?;
        let number = decode_semi_octets(r.take(len - 1, "SMSC address")?);
        Ok(Some(PduAddress { type_addr, number }))
    }
    pub(crate) fn read(r: &mut OctetReader, what: &'static str) -> PduResult<Self> {
        // The length is in semi-octets; round up to whole octets.
        let len = r.octet(what)? as usize;
        let type_addr = r.octet(what)?;
        let data = r.take((len + 1) / 2, what)?;
        let mut ret = PduAddress { type_addr, number: String::new() };
        ret.number = if ret.type_of_number() == TypeOfNumber::Alphanumeric {
            gsm_decode_string(&unpack_septets(data, 0, (len * 4) / 7)).trim().to_string()
        }
        else {
            decode_semi_octets(data)
        };
        Ok(ret)
    }
}

/// SMS PDU message type (TP-MTI).
#[repr(u8)]
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, FromPrimitive, Hash, is_enum_variant)]
pub enum TpduType {
    /// SMS-DELIVER (SC to MT)
    SmsDeliver = 0b000000_00,
    /// SMS-SUBMIT (MT to SC)
    SmsSubmit = 0b000000_01,
    /// SMS-STATUS-REPORT (SC to MT)
    SmsStatusReport = 0b000000_10,
    /// Reserved for future use.
    Unknown = 0b000000_11
}
impl fmt::Display for TpduType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let s = match *self {
            TpduType::SmsDeliver => "SMS-DELIVER",
            TpduType::SmsSubmit => "SMS-SUBMIT",
            TpduType::SmsStatusReport => "SMS-STATUS-REPORT",
            TpduType::Unknown => "unknown"
        };
        write!(f, "{}", s)
    }
}
/// Validity of the VP field.
#[repr(u8)]
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, FromPrimitive)]
pub enum VpFieldValidity {
    /// Not present.
    Invalid = 0b00,
    /// Valid, in relative format.
    Relative = 0b10,
    /// Valid, in enhanced format.
    Enhanced = 0b01,
    /// Valid, in absolute format.
    Absolute = 0b11,
}
/// The first octet of a SMS-SUBMIT PDU.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct PduFirstOctet {
    /// Message type.
    pub mti: TpduType,
    /// Reject duplicates.
    pub rd: bool,
    /// Validity and format of the VP field.
    pub vpf: VpFieldValidity,
    /// Whether to request a status report when the message is delivered.
    pub srr: bool,
    /// Does the user data segment contain a data header?
    pub udhi: bool,
    /// Do replies to this message use the same settings as this message?
    pub rp: bool
}
impl TryFrom<u8> for PduFirstOctet {
    type Error = PduError;
    fn try_from(b: u8) -> PduResult<Self> {
        let rd = (b & 0b0000_0100) > 0;
        let srr = (b & 0b0010_0000) > 0;
        let udhi = (b & 0b0100_0000) > 0;
        let rp = (b & 0b1000_0000) > 0;
        let mti = TpduType::from_octet(b & 0b0000_0011, "message type indicator")?;
        let vpf = VpFieldValidity::from_octet((b & 0b0001_1000) >> 3, "validity period format")?;
        Ok(PduFirstOctet { rd, srr, udhi, rp, mti, vpf })
    }
}
impl From<PduFirstOctet> for u8 {
    fn from(o: PduFirstOctet) -> u8 {
        let mut ret = 0b0000_0000;
        ret |= o.mti as u8;
        ret |= (o.vpf as u8) << 3;
        if o.rd {
            ret |= 0b0000_0100;
        }
        if o.srr {
            ret |= 0b0010_0000;
        }
        if o.udhi {
            ret |= 0b0100_0000;
        }
        if o.rp {
            ret |= 0b1000_0000;
        }
        ret
    }
}
/// The first octet of a SMS-DELIVER or SMS-STATUS-REPORT PDU.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct DeliverPduFirstOctet {
    /// Message type.
    pub mti: TpduType,
    /// More messages to send (set when there are *no* more messages waiting).
    pub mms: bool,
    /// Status report indication (deliver) or qualifier (status report).
    pub sri: bool,
    /// Does the user data segment contain a data header?
    pub udhi: bool,
    /// Reply path.
    pub rp: bool
}
impl TryFrom<u8> for DeliverPduFirstOctet {
    type Error = PduError;
    fn try_from(b: u8) -> PduResult<Self> {
        let mti = TpduType::from_octet(b & 0b0000_0011, "message type indicator")?;
        let mms = (b & 0b0000_0100) > 0;
        let sri = (b & 0b0010_0000) > 0;
        let udhi = (b & 0b0100_0000) > 0;
        let rp = (b & 0b1000_0000) > 0;
        Ok(DeliverPduFirstOctet { mti, mms, sri, udhi, rp })
    }
}

/// Text encoding of the user data, as indicated by the data coding scheme.
#[repr(u8)]
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum MessageEncoding {
    Gsm7Bit = 0b0000_00_00,
    EightBit = 0b0000_01_00,
    Ucs2 = 0b0000_10_00,
}
impl MessageEncoding {
    /// Data coding scheme octet used when sending with this encoding.
    pub fn dcs(self) -> u8 {
        self as u8
    }
}
/// Work out the text encoding from a data coding scheme octet.
///
/// Only the alphabet bits (bits 2 and 3) are looked at; the reserved alphabet value is treated
/// as GSM 7-bit. Compression and message class bits are ignored.
pub fn detect_encoding(dcs: u8) -> MessageEncoding {
    if dcs == 0 {
        return MessageEncoding::Gsm7Bit;
    }
    match dcs & 0b0000_11_00 {
        0b0000_01_00 => MessageEncoding::EightBit,
        0b0000_10_00 => MessageEncoding::Ucs2,
        _ => MessageEncoding::Gsm7Bit
    }
}

/// A service centre timestamp, as it appears on the wire (with the semi-octets un-swapped).
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct SmscTimestamp {
    /// Years since 2000.
    pub year: u8,
    pub month: u8,
    pub day: u8,
    pub hour: u8,
    pub minute: u8,
    pub second: u8,
    /// Offset from UTC, in quarter-hours (negative west of Greenwich).
    pub timezone: i8
}
fn reverse_byte(b: u8) -> PduResult<u8> {
    let units = b >> 4;
    let tens = b & 0b0000_1111;
    if units > 9 || tens > 9 {
        Err(PduError::InvalidField {
            field: "timestamp",
            reason: "non-decimal semi-octet"
        })?
    }
    Ok((tens * 10) + units)
}
impl<'a> TryFrom<&'a [u8]> for SmscTimestamp {
    type Error = PduError;
    fn try_from(b: &'a [u8]) -> PduResult<Self> {
        if b.len() != 7 {
            Err(PduError::Truncated("timestamp"))?
        }
        // The sign lives in bit 3 of the (unswapped) tens digit.
        let negative = (b[6] & 0b0000_1000) > 0;
        let quarters = reverse_byte(b[6] & 0b1111_0111)? as i8;
        Ok(SmscTimestamp {
            year: reverse_byte(b[0])?,
            month: reverse_byte(b[1])?,
            day: reverse_byte(b[2])?,
            hour: reverse_byte(b[3])?,
            minute: reverse_byte(b[4])?,
            second: reverse_byte(b[5])?,
            timezone: if negative { -quarters } else { quarters }
        })
    }
}
impl SmscTimestamp {
    /// Offset from UTC, in seconds.
    pub fn offset_seconds(&self) -> i32 {
        self.timezone as i32 * 15 * 60
    }
    /// The local date and time, in its own timezone. Comparing or converting the result gives
    /// you the absolute instant (i.e. the local fields minus the offset).
    pub fn to_datetime(&self) -> PduResult<DateTime<FixedOffset>> {
        let invalid = PduError::InvalidField {
            field: "timestamp",
            reason: "not a valid date and time"
        };
        let naive = NaiveDate::from_ymd_opt(2000 + self.year as i32, self.month as u32, self.day as u32)
            .and_then(|d| d.and_hms_opt(self.hour as u32, self.minute as u32, self.second as u32))
            .ok_or_else(|| invalid.clone())?;
        let offset = FixedOffset::east_opt(self.offset_seconds())
            .ok_or_else(|| invalid.clone())?;
        offset.from_local_datetime(&naive)
            .single()
            .ok_or(invalid)
    }
    pub(crate) fn read(r: &mut OctetReader, what: &'static str) -> PduResult<DateTime<FixedOffset>> {
        SmscTimestamp::try_from(r.take(7, what)?)?.to_datetime()
    }
}

/// Validity period of an SMS-SUBMIT.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidityPeriod {
    /// Relative format, as the raw TP-VP octet.
    Relative(u8),
    /// Enhanced format, left undecoded.
    Enhanced(Vec<u8>),
    /// Absolute format.
    Absolute(DateTime<FixedOffset>)
}

/// An SMS-DELIVER PDU: a message received from someone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliverPdu {
    pub sca: Option<PduAddress>,
    pub first_octet: DeliverPduFirstOctet,
    pub originating_address: PduAddress,
    /// Protocol identifier.
    pub pid: u8,
    /// Data coding scheme, as the raw octet.
    pub dcs: u8,
    pub encoding: MessageEncoding,
    /// Service centre timestamp.
    pub scts: DateTime<FixedOffset>,
    /// User data header; only present if the UDHI flag was set.
    pub udh: Option<UserDataHeader>,
    /// Message text (empty for 8-bit data).
    pub text: String
}
impl DeliverPdu {
    fn read(sca: Option<PduAddress>, first_octet: u8, r: &mut OctetReader) -> PduResult<Self> {
        let first_octet = DeliverPduFirstOctet::try_from(first_octet)?;
        let originating_address = PduAddress::read(r, "originating address")?;
        let pid = r.octet("protocol identifier")?;
        let dcs = r.octet("data coding scheme")?;
        let encoding = detect_encoding(dcs);
        let scts = SmscTimestamp::read(r, "service centre timestamp")?;
        let user_data_len = r.octet("user data length")?;
        let data = GsmMessageData::new(encoding, first_octet.udhi, r.rest().to_vec(), user_data_len)
            .decode_message()?;
        Ok(DeliverPdu {
            sca,
            first_octet,
            originating_address,
            pid,
            dcs,
            encoding,
            scts,
            udh: data.udh,
            text: data.text
        })
    }
}
/// An SMS-SUBMIT PDU: a message on its way out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmitPdu {
    pub sca: Option<PduAddress>,
    pub first_octet: PduFirstOctet,
    /// Message reference.
    pub message_reference: u8,
    pub destination: PduAddress,
    /// Protocol identifier.
    pub pid: u8,
    /// Data coding scheme, as the raw octet.
    pub dcs: u8,
    pub encoding: MessageEncoding,
    pub validity_period: Option<ValidityPeriod>,
    /// User data header; only present if the UDHI flag was set.
    pub udh: Option<UserDataHeader>,
    /// Message text (empty for 8-bit data).
    pub text: String
}
impl SubmitPdu {
    fn read(sca: Option<PduAddress>, first_octet: u8, r: &mut OctetReader) -> PduResult<Self> {
        let first_octet = PduFirstOctet::try_from(first_octet)?;
        let message_reference = r.octet("message reference")?;
        let destination = PduAddress::read(r, "destination address")?;
        let pid = r.octet("protocol identifier")?;
        let dcs = r.octet("data coding scheme")?;
        let encoding = detect_encoding(dcs);
        let validity_period = match first_octet.vpf {
            VpFieldValidity::Invalid => None,
            VpFieldValidity::Relative => Some(ValidityPeriod::Relative(r.octet("validity period")?)),
            VpFieldValidity::Enhanced => Some(ValidityPeriod::Enhanced(r.take(7, "validity period")?.to_vec())),
            VpFieldValidity::Absolute => Some(ValidityPeriod::Absolute(SmscTimestamp::read(r, "validity period")?))
        };
        let user_data_len = r.octet("user data length")?;
        let data = GsmMessageData::new(encoding, first_octet.udhi, r.rest().to_vec(), user_data_len)
            .decode_message()?;
        Ok(SubmitPdu {
            sca,
            first_octet,
            message_reference,
            destination,
            pid,
            dcs,
            encoding,
            validity_period,
            udh: data.udh,
            text: data.text
        })
    }
}
/// An SMS-STATUS-REPORT PDU: news about whether a message you sent got delivered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusReportPdu {
    pub sca: Option<PduAddress>,
    pub first_octet: DeliverPduFirstOctet,
    /// Reference of the message this report is about.
    pub message_reference: u8,
    pub recipient: PduAddress,
    /// When the service centre accepted the message.
    pub smsc_ts: DateTime<FixedOffset>,
    /// When the message was delivered (or the delivery attempt failed).
    pub discharge_ts: DateTime<FixedOffset>,
    /// Raw TP-Status octet.
    pub status: u8
}
impl StatusReportPdu {
    fn read(sca: Option<PduAddress>, first_octet: u8, r: &mut OctetReader) -> PduResult<Self> {
        let first_octet = DeliverPduFirstOctet::try_from(first_octet)?;
        let message_reference = r.octet("message reference")?;
        let recipient = PduAddress::read(r, "recipient address")?;
        let smsc_ts = SmscTimestamp::read(r, "service centre timestamp")?;
        let discharge_ts = SmscTimestamp::read(r, "discharge time")?;
        let status = r.octet("status")?;
        Ok(StatusReportPdu {
            sca,
            first_octet,
            message_reference,
            recipient,
            smsc_ts,
            discharge_ts,
            status
        })
    }
    /// The status octet as two uppercase hex digits, e.g. `"00"` for "received by the SME".
    pub fn status_hex(&self) -> String {
        HexData(&[self.status]).to_string()
    }
}

/// A decoded PDU, of whichever type it turned out to be.
#[derive(Debug, Clone, PartialEq, Eq, is_enum_variant)]
pub enum Pdu {
    Deliver(DeliverPdu),
    Submit(SubmitPdu),
    StatusReport(StatusReportPdu),
    /// Reserved message type, decoded with the SMS-DELIVER layout.
    Unknown(DeliverPdu)
}
impl Pdu {
    /// Decode a PDU from its hex representation (SMSC prefix included), as given to you by the
    /// modem.
    pub fn parse(pdu: &str) -> PduResult<Self> {
        Self::from_bytes(&HexData::decode(pdu)?)
    }
    /// Decode a PDU from raw octets (SMSC prefix included).
    pub fn from_bytes(b: &[u8]) -> PduResult<Self> {
        let mut r = OctetReader::new(b);
        let sca = PduAddress::read_smsc(&mut r)?;
        let first_octet = r.octet("first octet")?;
        let mti = TpduType::from_octet(first_octet & 0b0000_0011, "message type indicator")?;
        debug!("decoding {} PDU", mti);
        Ok(match mti {
            TpduType::SmsDeliver => Pdu::Deliver(DeliverPdu::read(sca, first_octet, &mut r)?),
            TpduType::SmsSubmit => Pdu::Submit(SubmitPdu::read(sca, first_octet, &mut r)?),
            TpduType::SmsStatusReport => Pdu::StatusReport(StatusReportPdu::read(sca, first_octet, &mut r)?),
            TpduType::Unknown => Pdu::Unknown(DeliverPdu::read(sca, first_octet, &mut r)?)
        })
    }
    pub fn tpdu_type(&self) -> TpduType {
        match *self {
            Pdu::Deliver(_) => TpduType::SmsDeliver,
            Pdu::Submit(_) => TpduType::SmsSubmit,
            Pdu::StatusReport(_) => TpduType::SmsStatusReport,
            Pdu::Unknown(_) => TpduType::Unknown
        }
    }
    /// The service centre address, if the PDU carried one.
    pub fn sca(&self) -> Option<&PduAddress> {
        match *self {
            Pdu::Deliver(ref p) | Pdu::Unknown(ref p) => p.sca.as_ref(),
            Pdu::Submit(ref p) => p.sca.as_ref(),
            Pdu::StatusReport(ref p) => p.sca.as_ref()
        }
    }
    /// The message text. Status reports don't have any.
    pub fn text(&self) -> Option<&str> {
        match *self {
            Pdu::Deliver(ref p) | Pdu::Unknown(ref p) => Some(&p.text),
            Pdu::Submit(ref p) => Some(&p.text),
            Pdu::StatusReport(_) => None
        }
    }
    /// The user data header, if there was one.
    pub fn udh(&self) -> Option<&UserDataHeader> {
        match *self {
            Pdu::Deliver(ref p) | Pdu::Unknown(ref p) => p.udh.as_ref(),
            Pdu::Submit(ref p) => p.udh.as_ref(),
            Pdu::StatusReport(_) => None
        }
    }
}
