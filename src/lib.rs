//! The `gsm-pdu` library encodes and decodes SMS messages in the GSM 03.40 PDU format, which is
//! what modems speak when put in PDU mode (`AT+CMGF=0`).
//!
//! Decoding takes the hex string the modem gives you (e.g. from `AT+CMGL` or a `+CMT` URC) and
//! turns it into a `Pdu`: an SMS-DELIVER, SMS-SUBMIT or SMS-STATUS-REPORT, with the text already
//! decoded and any concatenation header picked apart.
//!
//! Encoding goes the other way: describe the message with an `OutgoingMessage`, and `generate`
//! hands back one `PduFragment` per SMS part, ready for `AT+CMGS`.
//!
//! ```no_run
//! use gsm_pdu::{Pdu, OutgoingMessage, MessageEncoding};
//!
//! let pdu = Pdu::parse("07912180958712F7040B911326880736F40000208092917080800CC8329BFD4697D9EC37")?;
//! println!("{:?}", pdu.text());
//!
//! let msg = OutgoingMessage::new("+31628870634".parse().unwrap(), "hello", MessageEncoding::Gsm7Bit);
//! for frag in msg.generate()? {
//!     println!("AT+CMGS={}\n{}", frag.tpdu_length, frag);
//! }
//! # Ok::<(), gsm_pdu::PduError>(())
//! ```
//!
//! Everything here is a pure function of its input; there's no I/O, and nothing is shared
//! between calls apart from the (constant) GSM alphabet tables.

#[macro_use] extern crate log;
#[macro_use] extern crate failure_derive;
#[macro_use] extern crate nom;
#[macro_use] extern crate derive_is_enum_variant;
#[macro_use] extern crate num_derive;

macro_rules! check_offset {
    ($b:ident, $offset:ident, $reason:expr) => {
        if $b.get($offset).is_none() {
            return Err($crate::errors::PduError::Truncated($reason));
        }
    }
}

pub mod errors;
pub mod gsm_encoding;
pub mod parse;
pub mod pdu;
pub mod submit;
mod util;

pub use crate::errors::{PduError, PduResult};
pub use crate::parse::HexData;
pub use crate::pdu::{Pdu, PduAddress, DeliverPdu, SubmitPdu, StatusReportPdu, TpduType,
                     MessageEncoding, detect_encoding};
pub use crate::submit::{OutgoingMessage, PduFragment, ussd_encode, ussd_decode};

/// Decode a PDU hex string. Shorthand for `Pdu::parse`.
pub fn parse(pdu: &str) -> PduResult<Pdu> {
    Pdu::parse(pdu)
}
/// Encode a message into PDUs. Shorthand for `OutgoingMessage::generate`.
pub fn generate(message: &OutgoingMessage) -> PduResult<Vec<PduFragment>> {
    message.generate()
}
