use std::io::Write;

use tracing::trace;

use crate::codec::{PayloadSize, WireMessage};
use crate::error::ProtocolError;
use crate::opcode::Opcode;
use crate::types::AbstractVector;

/// Buffers typed writes and pushes them to the underlying stream on
/// [`flush`](FrameWriter::flush), which is the only path that touches the
/// stream.
///
/// The buffer is reused across frames.
#[derive(Debug)]
pub struct FrameWriter<W> {
    inner: W,
    buf: Vec<u8>,
}

impl<W: Write> FrameWriter<W> {
    /// Wrap a byte sink.
    pub fn new(inner: W) -> Self {
        FrameWriter {
            inner,
            buf: Vec::with_capacity(256),
        }
    }

    /// Append an opcode.
    pub fn write_opcode(&mut self, opcode: Opcode) -> &mut Self {
        self.write_i32(opcode.code())
    }

    /// Append a big-endian int32.
    pub fn write_i32(&mut self, v: i32) -> &mut Self {
        self.buf.extend_from_slice(&v.to_be_bytes());
        self
    }

    /// Append a big-endian float64.
    pub fn write_f64(&mut self, v: f64) -> &mut Self {
        self.buf.extend_from_slice(&v.to_be_bytes());
        self
    }

    /// Append a boolean as int32 `1` or `0`.
    pub fn write_bool(&mut self, v: bool) -> &mut Self {
        self.write_i32(i32::from(v))
    }

    /// Append a length-prefixed UTF-8 string. The empty string is a bare
    /// int32 `0`.
    pub fn write_string(&mut self, s: &str) -> &mut Self {
        // length is bounded by the size field check in `send`
        self.write_i32(s.len() as i32);
        self.buf.extend_from_slice(s.as_bytes());
        self
    }

    /// Append the three counts of `v`, then its ints, reals and chars.
    pub fn write_vector(&mut self, v: &AbstractVector) -> &mut Self {
        self.write_i32(v.ints.len() as i32)
            .write_i32(v.reals.len() as i32)
            .write_i32(v.chars.len() as i32);
        for &i in &v.ints {
            self.write_i32(i);
        }
        for &r in &v.reals {
            self.write_f64(r);
        }
        self.buf.extend_from_slice(&v.chars);
        self
    }

    /// Append the declared-size field.
    pub fn write_size(&mut self, size: PayloadSize) -> Result<&mut Self, ProtocolError> {
        let size = size.to_wire()?;
        Ok(self.write_i32(size))
    }

    /// Number of bytes waiting for the next flush.
    pub fn pending(&self) -> usize {
        self.buf.len()
    }

    /// Push every buffered byte to the stream and flush it.
    ///
    /// The buffer is emptied even when the write fails; a failed flush leaves
    /// the stream in an unknown state and the session must be dropped.
    pub fn flush(&mut self) -> Result<(), ProtocolError> {
        let result = self
            .inner
            .write_all(&self.buf)
            .and_then(|_| self.inner.flush());
        self.buf.clear();
        result.map_err(ProtocolError::from)
    }

    /// Write one complete frame for `msg` and flush it.
    pub fn send<M: WireMessage>(&mut self, msg: &M) -> Result<(), ProtocolError> {
        let opcode = msg.opcode();
        let size = msg.payload_size();
        // reject before anything is buffered
        let declared = size.to_wire()?;

        self.write_opcode(opcode).write_i32(declared);
        let start = self.buf.len();
        msg.write_payload(self);
        debug_assert_eq!(
            self.buf.len() - start,
            size.bytes(),
            "payload size of {opcode} miscomputed"
        );
        trace!(%opcode, declared, "send");

        self.flush()
    }

    /// Write a frame with an empty payload and flush it.
    pub fn send_empty(&mut self, opcode: Opcode) -> Result<(), ProtocolError> {
        self.write_opcode(opcode).write_i32(0);
        trace!(%opcode, "send empty");
        self.flush()
    }

    /// The underlying stream.
    pub fn get_ref(&self) -> &W {
        &self.inner
    }

    /// Unwrap the underlying stream, dropping unflushed bytes.
    pub fn into_inner(self) -> W {
        self.inner
    }
}
