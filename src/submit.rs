//! Building SMS-SUBMIT PDUs to hand to a modem (e.g. with `AT+CMGS`), plus USSD string encoding.
//!
//! Describe the message with an `OutgoingMessage`, then call `generate` on it. Long messages come
//! back as several `PduFragment`s that all share one concatenation reference; send each of them,
//! in order.
use std::fmt;
use rand::Rng;
use crate::errors::*;
use crate::gsm_encoding::{GsmMessageData, gsm_encode_string, gsm_decode_string, pack_septets,
                          unpack_septets, available_septets};
use crate::parse::HexData;
use crate::pdu::{MessageEncoding, PduAddress, PduFirstOctet, TpduType, VpFieldValidity};

/// A message to be sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingMessage {
    /// Service centre to send through. `None` uses the one configured on the SIM.
    pub smsc: Option<PduAddress>,
    pub receiver: PduAddress,
    /// `Gsm7Bit` or `Ucs2`; 8-bit data can't be generated.
    pub encoding: MessageEncoding,
    pub text: String,
    /// Ask for an SMS-STATUS-REPORT once the message is delivered.
    pub request_status: bool,
    /// Relative validity period, as the raw TP-VP octet.
    pub relative_validity: Option<u8>
}
impl OutgoingMessage {
    pub fn new<T: Into<String>>(receiver: PduAddress, text: T, encoding: MessageEncoding) -> Self {
        OutgoingMessage {
            smsc: None,
            receiver,
            encoding,
            text: text.into(),
            request_status: false,
            relative_validity: None
        }
    }
    pub fn with_smsc(mut self, smsc: PduAddress) -> Self {
        self.smsc = Some(smsc);
        self
    }
    pub fn with_status_request(mut self, request_status: bool) -> Self {
        self.request_status = request_status;
        self
    }
    pub fn with_relative_validity(mut self, vp: u8) -> Self {
        self.relative_validity = Some(vp);
        self
    }
    /// Encode this message into one or more PDUs, drawing the concatenation reference from the
    /// thread-local RNG.
    pub fn generate(&self) -> PduResult<Vec<PduFragment>> {
        self.generate_with_rng(&mut rand::thread_rng())
    }
    /// Encode this message into one or more PDUs, drawing the concatenation reference from `rng`.
    pub fn generate_with_rng<R: Rng>(&self, rng: &mut R) -> PduResult<Vec<PduFragment>> {
        if self.receiver.number.is_empty() {
            Err(PduError::MissingField("receiver"))?
        }
        if self.text.is_empty() {
            Err(PduError::MissingField("text"))?
        }
        let csms_ref: u8 = rng.gen();
        let parts = GsmMessageData::encode_message(&self.text, self.encoding, csms_ref)?;
        debug!("generating {} part(s) for {}, reference {:02X}", parts.len(), self.receiver, csms_ref);
        let vpf = match self.relative_validity {
            Some(_) => VpFieldValidity::Relative,
            None => VpFieldValidity::Invalid
        };
        parts.into_iter()
            .map(|data| -> PduResult<PduFragment> {
                let first_octet = PduFirstOctet {
                    mti: TpduType::SmsSubmit,
                    rd: false,
                    vpf,
                    srr: self.request_status,
                    udhi: data.has_udh(),
                    rp: false
                };
                let tpdu = SubmitTpdu {
                    sca: self.smsc.as_ref(),
                    first_octet,
                    message_reference: 0,
                    destination: &self.receiver,
                    dcs: self.encoding.dcs(),
                    validity_period: self.relative_validity,
                    data
                };
                let (bytes, tpdu_length) = tpdu.as_bytes()?;
                Ok(PduFragment {
                    tpdu_length,
                    smsc_tpdu: HexData(&bytes).to_string()
                })
            })
            .collect()
    }
}
/// One encoded PDU, ready to send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PduFragment {
    /// Length in octets, not counting the SMSC part (what `AT+CMGS` wants).
    pub tpdu_length: usize,
    /// The whole PDU (SMSC part included) as uppercase hex.
    pub smsc_tpdu: String
}
impl fmt::Display for PduFragment {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.smsc_tpdu)
    }
}
struct SubmitTpdu<'a> {
    sca: Option<&'a PduAddress>,
    first_octet: PduFirstOctet,
    message_reference: u8,
    destination: &'a PduAddress,
    dcs: u8,
    validity_period: Option<u8>,
    data: GsmMessageData
}
impl<'a> SubmitTpdu<'a> {
    /// Serialize, returning the bytes and the TPDU length (everything after the SMSC part).
    fn as_bytes(&self) -> PduResult<(Vec<u8>, usize)> {
        let mut ret = vec![];
        if let Some(sca) = self.sca {
            ret.extend(sca.as_smsc_bytes()?);
        }
        else {
            ret.push(0);
        }
        let scalen = ret.len();
        ret.push(self.first_octet.into());
        ret.push(self.message_reference);
        ret.extend(self.destination.as_address_bytes()?);
        // protocol identifier
        ret.push(0);
        ret.push(self.dcs);
        if let Some(vp) = self.validity_period {
            ret.push(vp);
        }
        ret.push(self.data.user_data_len());
        ret.extend(self.data.as_bytes());
        let tpdu_len = ret.len() - scalen;
        Ok((ret, tpdu_len))
    }
}

/// Encode a USSD command (e.g. `*100#`) as packed GSM 7-bit, in hex.
///
/// If the septets would leave 7 spare bits in the last octet, a carriage return fills them so
/// the receiver doesn't read an extra `@` (GSM 03.38 section 6.1.2.3.1). Encoders that leave
/// those bits zero produce `00` there instead, e.g. `31D98C56B3DD00` for `"1234567"`.
pub fn ussd_encode(ussd: &str) -> PduResult<String> {
    let mut buf = gsm_encode_string(ussd)?;
    if buf.len() % 8 == 7 {
        buf.push(b'\r');
    }
    Ok(HexData(&pack_septets(&buf, 0)).to_string())
}
/// Decode a packed GSM 7-bit USSD response, in hex.
///
/// If the last septet was only there to fill out the final octet (a carriage return, in that
/// position), it's dropped.
pub fn ussd_decode(hex: &str) -> PduResult<String> {
    let bytes = HexData::decode(hex)?;
    let len = available_septets(bytes.len(), 0);
    let mut buf = unpack_septets(&bytes, 0, len);
    if len % 8 == 0 && buf.last() == Some(&b'\r') {
        buf.pop();
    }
    Ok(gsm_decode_string(&buf))
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::pdu::{Pdu, TYPE_INTERNATIONAL, TYPE_UNKNOWN};

    /// Always returns the same value, so the concatenation reference is predictable.
    struct FixedRng(u32);
    impl Rng for FixedRng {
        fn next_u32(&mut self) -> u32 {
            self.0
        }
    }

    fn receiver() -> PduAddress {
        PduAddress::new("46708251358", TYPE_INTERNATIONAL)
    }
    #[test]
    fn simple_7bit() {
        let msg = OutgoingMessage::new(receiver(), "hellohello", MessageEncoding::Gsm7Bit);
        let pdus = msg.generate_with_rng(&mut FixedRng(0)).unwrap();
        assert_eq!(pdus.len(), 1);
        assert_eq!(pdus[0].smsc_tpdu, "0001000B916407281553F800000AE8329BFD4697D9EC37");
        assert_eq!(pdus[0].tpdu_length, 22);
        assert_eq!(pdus[0].to_string(), pdus[0].smsc_tpdu);
    }
    #[test]
    fn simple_7bit_round_trip() {
        let msg = OutgoingMessage::new(receiver(), "How are you? {ok} 100\u{20AC}", MessageEncoding::Gsm7Bit);
        let pdus = msg.generate().unwrap();
        assert_eq!(pdus.len(), 1);
        match Pdu::parse(&pdus[0].smsc_tpdu).unwrap() {
            Pdu::Submit(s) => {
                assert_eq!(s.destination, receiver());
                assert_eq!(s.encoding, MessageEncoding::Gsm7Bit);
                assert!(s.udh.is_none());
                assert_eq!(s.text, msg.text);
            },
            x => panic!("unexpected {:?}", x)
        }
    }
    #[test]
    fn with_smsc() {
        let msg = OutgoingMessage::new(receiver(), "hi", MessageEncoding::Gsm7Bit)
            .with_smsc(PduAddress::new("12085978217", TYPE_INTERNATIONAL));
        let pdus = msg.generate().unwrap();
        assert!(pdus[0].smsc_tpdu.starts_with("07912180958712F7"));
        assert_eq!(pdus[0].tpdu_length, (pdus[0].smsc_tpdu.len() - 16) / 2);
        let pdu = Pdu::parse(&pdus[0].smsc_tpdu).unwrap();
        assert_eq!(pdu.sca().unwrap().number, "12085978217");
    }
    #[test]
    fn flags_and_validity() {
        let msg = OutgoingMessage::new(PduAddress::new("0770090012", 0xA1), "hi", MessageEncoding::Gsm7Bit)
            .with_status_request(true)
            .with_relative_validity(0xAA);
        let pdus = msg.generate().unwrap();
        assert_eq!(&pdus[0].smsc_tpdu[..4], "0031");
        match Pdu::parse(&pdus[0].smsc_tpdu).unwrap() {
            Pdu::Submit(s) => {
                assert!(s.first_octet.srr);
                assert!(!s.first_octet.udhi);
                assert_eq!(s.destination.type_addr, TYPE_UNKNOWN);
                assert_eq!(s.validity_period, Some(crate::pdu::ValidityPeriod::Relative(0xAA)));
                assert_eq!(s.text, "hi");
            },
            x => panic!("unexpected {:?}", x)
        }
    }
    #[test]
    fn ucs2_round_trip() {
        let msg = OutgoingMessage::new(receiver(), "\u{4F60}\u{597D}", MessageEncoding::Ucs2);
        let pdus = msg.generate().unwrap();
        assert!(pdus[0].smsc_tpdu.ends_with("0008044F60597D"));
        assert_eq!(Pdu::parse(&pdus[0].smsc_tpdu).unwrap().text(), Some("\u{4F60}\u{597D}"));
    }
    #[test]
    fn multipart_7bit() {
        let text: String = (0..400).map(|i| (b'a' + (i % 26) as u8) as char).collect();
        let msg = OutgoingMessage::new(receiver(), text.clone(), MessageEncoding::Gsm7Bit);
        let pdus = msg.generate_with_rng(&mut FixedRng(0x5A)).unwrap();
        assert_eq!(pdus.len(), 3);
        let mut out = String::new();
        for (i, frag) in pdus.iter().enumerate() {
            let pdu = Pdu::parse(&frag.smsc_tpdu).unwrap();
            let concat = pdu.udh().unwrap().concatenation().unwrap();
            assert_eq!(concat.reference, 0x5A);
            assert_eq!(concat.parts, 3);
            assert_eq!(concat.sequence as usize, i + 1);
            match pdu {
                Pdu::Submit(ref s) => assert!(s.first_octet.udhi),
                ref x => panic!("unexpected {:?}", x)
            }
            out.push_str(pdu.text().unwrap());
        }
        assert_eq!(out, text);
    }
    #[test]
    fn multipart_ucs2() {
        let text = "\u{4F60}".repeat(71);
        let msg = OutgoingMessage::new(receiver(), text.clone(), MessageEncoding::Ucs2);
        let pdus = msg.generate_with_rng(&mut FixedRng(1)).unwrap();
        assert_eq!(pdus.len(), 2);
        let out: String = pdus.iter()
            .map(|p| Pdu::parse(&p.smsc_tpdu).unwrap().text().unwrap().to_string())
            .collect();
        assert_eq!(out, text);
    }
    #[test]
    fn missing_fields() {
        let msg = OutgoingMessage::new(PduAddress::new("", TYPE_UNKNOWN), "hi", MessageEncoding::Gsm7Bit);
        assert_eq!(msg.generate(), Err(PduError::MissingField("receiver")));
        let msg = OutgoingMessage::new(receiver(), "", MessageEncoding::Gsm7Bit);
        assert_eq!(msg.generate(), Err(PduError::MissingField("text")));
    }
    #[test]
    fn unencodable() {
        let msg = OutgoingMessage::new(receiver(), "\u{4F60}", MessageEncoding::Gsm7Bit);
        assert_eq!(msg.generate(), Err(PduError::UnencodableCharacter('\u{4F60}')));
        let msg = OutgoingMessage::new(receiver(), "hi", MessageEncoding::EightBit);
        assert_eq!(msg.generate(), Err(PduError::UnsupportedEncoding(MessageEncoding::EightBit)));
        let msg = OutgoingMessage::new(PduAddress::new("12-34", TYPE_UNKNOWN), "hi", MessageEncoding::Gsm7Bit);
        assert!(msg.generate().is_err());
        let msg = OutgoingMessage::new(PduAddress::new("1".repeat(300), TYPE_UNKNOWN), "hi", MessageEncoding::Gsm7Bit);
        assert_eq!(msg.generate(), Err(PduError::InvalidField { field: "address", reason: "too long" }));
    }
    #[test]
    fn ussd() {
        assert_eq!(ussd_encode("*100#").unwrap(), "AA180C3602");
        assert_eq!(ussd_decode("AA180C3602").unwrap(), "*100#");
        assert_eq!(ussd_encode("1234567").unwrap(), "31D98C56B3DD1A");
        assert_eq!(ussd_decode("31D98C56B3DD1A").unwrap(), "1234567");
        assert_eq!(ussd_decode("31D98C56B3DD70").unwrap(), "12345678");
    }
}
