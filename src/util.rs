use num::FromPrimitive;
use crate::errors::{PduResult, PduError};

/// Conversion of a (masked) header octet into one of the wire enums.
pub trait FromOctet where Self: Sized {
    fn from_octet(b: u8, field: &'static str) -> PduResult<Self>;
}
impl<T> FromOctet for T where T: FromPrimitive {
    fn from_octet(b: u8, field: &'static str) -> PduResult<T> {
        if let Some(s) = T::from_u8(b) {
            Ok(s)
        }
        else {
            Err(PduError::InvalidField { field, reason: "value out of range" })
        }
    }
}
