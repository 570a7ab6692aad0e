//! Big-endian frame codec.
//!
//! Every message on the wire is one frame:
//!
//! ```text
//! int32  opcode
//! int32  declared payload size   // bytes after this field
//! ...    payload, field order fixed by the opcode
//! ```
//!
//! Primitives are int32 and float64 (big-endian), booleans as int32 `1`/`0`,
//! strings as an int32 UTF-8 byte length followed by the bytes, and
//! [`AbstractVector`](crate::types::AbstractVector) as three int32 counts
//! followed by the ints, the reals and the chars.
//!
//! The declared size is computed analytically with [`PayloadSize`] before the
//! payload is written. On the receiving side reads are delimited by the
//! opcode-determined field sequence alone; the declared size is only checked
//! when the reader runs with [`SizeCheck::Enforce`].

use std::io::{Read, Write};

use crate::error::ProtocolError;
use crate::opcode::Opcode;

mod reader;
mod size;
mod writer;

pub use reader::FrameReader;
pub use size::PayloadSize;
pub use writer::FrameWriter;

/// Opcode and declared size of a received frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameHeader {
    /// Message kind.
    pub opcode: Opcode,
    /// Size announced by the sender. Not used to delimit reads.
    pub declared_size: i32,
}

/// What a [`FrameReader`] does with the declared size of each frame.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SizeCheck {
    /// Read the declared size and discard it.
    #[default]
    Ignore,
    /// Fail with [`ProtocolError::SizeMismatch`] when the decoded payload
    /// length differs from the declared size.
    Enforce,
}

/// A message kind that knows its opcode and how to encode and decode its
/// payload.
///
/// One implementation exists per direction and role, each a sum type over
/// the opcodes that direction may carry.
pub trait WireMessage: Sized {
    /// Opcode written in front of the payload.
    fn opcode(&self) -> Opcode;

    /// Exact length of the payload, excluding the opcode and size fields.
    fn payload_size(&self) -> PayloadSize;

    /// Append the payload fields, in wire order.
    fn write_payload<W: Write>(&self, writer: &mut FrameWriter<W>);

    /// Decode the payload of a frame whose header carried `opcode`.
    ///
    /// Opcodes the message kind does not carry are rejected.
    fn read_payload<R: Read>(
        opcode: Opcode,
        reader: &mut FrameReader<R>,
    ) -> Result<Self, ProtocolError>;
}
