//! Error types.
use crate::pdu::MessageEncoding;

/// Something that went wrong while decoding or encoding a PDU.
#[derive(Fail, Debug, Clone, PartialEq, Eq)]
pub enum PduError {
    /// A character that isn't a hex digit was found where an octet was expected (or the string
    /// had an odd number of digits). Contains the character offset of the problem.
    #[fail(display = "Invalid hex string at offset {}", _0)]
    InvalidHex(usize),
    /// The PDU ended before the named field could be read.
    #[fail(display = "PDU truncated while reading: {}", _0)]
    Truncated(&'static str),
    /// A field was present, but contained nonsense.
    #[fail(display = "Invalid {}: {}", field, reason)]
    InvalidField {
        field: &'static str,
        reason: &'static str
    },
    /// The character can't be represented in the GSM 7-bit alphabet.
    #[fail(display = "Character {:?} cannot be encoded as GSM 7-bit", _0)]
    UnencodableCharacter(char),
    /// The message encoding isn't supported for this operation.
    #[fail(display = "Unsupported message encoding: {:?}", _0)]
    UnsupportedEncoding(MessageEncoding),
    /// A required field of an outgoing message was left empty.
    #[fail(display = "Missing required field: {}", _0)]
    MissingField(&'static str),
}
pub type PduResult<T> = Result<T, PduError>;
