use crate::error::ProtocolError;
use crate::types::AbstractVector;

const INT_SIZE: usize = 4;
const DOUBLE_SIZE: usize = 8;

/// Accumulates the byte length of a payload from the widths of its fields.
///
/// ```
/// use rlglue_codec::codec::PayloadSize;
/// use rlglue_codec::types::AbstractVector;
///
/// let observation = AbstractVector::from_ints([1, 2]);
/// let size = PayloadSize::new()
///     .boolean()
///     .float64()
///     .vector(&observation);
/// assert_eq!(size.bytes(), 4 + 8 + 12 + 8);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PayloadSize(usize);

impl PayloadSize {
    /// Zero bytes.
    pub const EMPTY: PayloadSize = PayloadSize(0);

    /// Start an empty accumulator.
    pub const fn new() -> Self {
        PayloadSize(0)
    }

    /// Add one int32.
    pub const fn int32(self) -> Self {
        PayloadSize(self.0 + INT_SIZE)
    }

    /// Add one float64.
    pub const fn float64(self) -> Self {
        PayloadSize(self.0 + DOUBLE_SIZE)
    }

    /// Add one boolean (written as int32).
    pub const fn boolean(self) -> Self {
        self.int32()
    }

    /// Add a length-prefixed UTF-8 string.
    pub const fn string(self, s: &str) -> Self {
        PayloadSize(self.0 + INT_SIZE + s.len())
    }

    /// Add an [`AbstractVector`].
    pub fn vector(self, v: &AbstractVector) -> Self {
        PayloadSize(self.0 + v.wire_size())
    }

    /// Accumulated length in bytes.
    pub const fn bytes(self) -> usize {
        self.0
    }

    /// The value to put in the int32 size field.
    pub fn to_wire(self) -> Result<i32, ProtocolError> {
        i32::try_from(self.0).map_err(|_| ProtocolError::PayloadTooLarge(self.0))
    }
}
