use std::io::{self, Read};

use tracing::trace;

use crate::codec::{FrameHeader, SizeCheck, WireMessage};
use crate::error::ProtocolError;
use crate::opcode::Opcode;
use crate::types::AbstractVector;

/// Decodes typed fields from a byte stream.
///
/// Reads block until the requested bytes arrive. A stream that ends in the
/// middle of a field is a [`ProtocolError::Truncated`] error; nothing is
/// recovered from a partial frame.
#[derive(Debug)]
pub struct FrameReader<R> {
    inner: R,
    size_check: SizeCheck,
    consumed: u64,
}

impl<R: Read> FrameReader<R> {
    /// Wrap a byte source. The declared size of each frame is ignored.
    pub fn new(inner: R) -> Self {
        Self::with_size_check(inner, SizeCheck::Ignore)
    }

    /// Wrap a byte source with an explicit declared-size policy.
    pub fn with_size_check(inner: R, size_check: SizeCheck) -> Self {
        FrameReader {
            inner,
            size_check,
            consumed: 0,
        }
    }

    fn fill(&mut self, buf: &mut [u8], field: &'static str) -> Result<(), ProtocolError> {
        match self.inner.read_exact(buf) {
            Ok(()) => {
                self.consumed += buf.len() as u64;
                Ok(())
            }
            Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => {
                Err(ProtocolError::Truncated { field })
            }
            Err(e) => Err(e.into()),
        }
    }

    fn read_i32_field(&mut self, field: &'static str) -> Result<i32, ProtocolError> {
        let mut b = [0u8; 4];
        self.fill(&mut b, field)?;
        Ok(i32::from_be_bytes(b))
    }

    fn read_count(&mut self, field: &'static str) -> Result<usize, ProtocolError> {
        let count = self.read_i32_field(field)?;
        usize::try_from(count).map_err(|_| ProtocolError::NegativeCount { field, count })
    }

    /// Read a big-endian int32.
    pub fn read_i32(&mut self) -> Result<i32, ProtocolError> {
        self.read_i32_field("int32")
    }

    /// Read a big-endian float64.
    pub fn read_f64(&mut self) -> Result<f64, ProtocolError> {
        let mut b = [0u8; 8];
        self.fill(&mut b, "float64")?;
        Ok(f64::from_be_bytes(b))
    }

    /// Read an int32 boolean. Only `1` is true.
    pub fn read_bool(&mut self) -> Result<bool, ProtocolError> {
        Ok(self.read_i32_field("boolean")? == 1)
    }

    /// Read an opcode, rejecting values outside the closed set.
    pub fn read_opcode(&mut self) -> Result<Opcode, ProtocolError> {
        Opcode::try_from(self.read_i32_field("opcode")?)
    }

    /// Read a length-prefixed UTF-8 string. A length of zero or less is the
    /// empty string.
    pub fn read_string(&mut self) -> Result<String, ProtocolError> {
        let len = self.read_i32_field("string length")?;
        if len <= 0 {
            return Ok(String::new());
        }
        let mut bytes = Vec::new();
        // grow with the data instead of trusting the length up front
        let n = (&mut self.inner)
            .take(len as u64)
            .read_to_end(&mut bytes)?;
        self.consumed += n as u64;
        if n < len as usize {
            return Err(ProtocolError::Truncated { field: "string" });
        }
        Ok(String::from_utf8(bytes)?)
    }

    /// Read the three counts, then exactly that many ints, reals and chars.
    pub fn read_vector(&mut self) -> Result<AbstractVector, ProtocolError> {
        let int_count = self.read_count("int")?;
        let real_count = self.read_count("real")?;
        let char_count = self.read_count("char")?;

        let mut ints = Vec::with_capacity(int_count.min(1024));
        for _ in 0..int_count {
            ints.push(self.read_i32_field("vector int")?);
        }
        let mut reals = Vec::with_capacity(real_count.min(1024));
        for _ in 0..real_count {
            reals.push(self.read_f64()?);
        }
        let mut chars = Vec::with_capacity(char_count.min(1024));
        for _ in 0..char_count {
            let mut c = [0u8; 1];
            self.fill(&mut c, "vector char")?;
            chars.push(c[0]);
        }

        Ok(AbstractVector { ints, reals, chars })
    }

    /// Read an opcode and the declared size that follows it.
    pub fn read_header(&mut self) -> Result<FrameHeader, ProtocolError> {
        let opcode = self.read_opcode()?;
        let declared_size = self.read_i32_field("declared size")?;
        self.consumed = 0;
        trace!(%opcode, declared_size, "received header");
        Ok(FrameHeader {
            opcode,
            declared_size,
        })
    }

    /// Check the payload bytes read since `header` against its declared size,
    /// when the policy asks for it.
    pub fn finish(&mut self, header: &FrameHeader) -> Result<(), ProtocolError> {
        if self.size_check == SizeCheck::Enforce
            && i64::from(header.declared_size) != self.consumed as i64
        {
            return Err(ProtocolError::SizeMismatch {
                opcode: header.opcode,
                declared: header.declared_size,
                actual: self.consumed,
            });
        }
        Ok(())
    }

    /// Decode the payload announced by `header`.
    pub fn read_body<M: WireMessage>(&mut self, header: &FrameHeader) -> Result<M, ProtocolError> {
        let msg = M::read_payload(header.opcode, self)?;
        self.finish(header)?;
        Ok(msg)
    }

    /// Read one complete frame.
    pub fn receive<M: WireMessage>(&mut self) -> Result<M, ProtocolError> {
        let header = self.read_header()?;
        self.read_body(&header)
    }

    /// Read one reply frame and require its opcode to echo `expected`.
    ///
    /// On a mismatch nothing past the header is read.
    pub fn expect_reply<M: WireMessage>(&mut self, expected: Opcode) -> Result<M, ProtocolError> {
        let header = self.read_header()?;
        if header.opcode != expected {
            return Err(ProtocolError::SynchronizationLost {
                expected,
                received: header.opcode,
            });
        }
        self.read_body(&header)
    }

    /// Payload bytes consumed since the last header.
    pub fn consumed(&self) -> u64 {
        self.consumed
    }

    /// The declared-size policy in force.
    pub fn size_check(&self) -> SizeCheck {
        self.size_check
    }

    /// The underlying stream.
    pub fn get_ref(&self) -> &R {
        &self.inner
    }

    /// Unwrap the underlying stream.
    pub fn into_inner(self) -> R {
        self.inner
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;
    use crate::codec::FrameWriter;

    fn reader(bytes: Vec<u8>) -> FrameReader<Cursor<Vec<u8>>> {
        FrameReader::new(Cursor::new(bytes))
    }

    fn encode(f: impl FnOnce(&mut FrameWriter<Vec<u8>>)) -> Vec<u8> {
        let mut w = FrameWriter::new(Vec::new());
        f(&mut w);
        w.flush().unwrap();
        w.into_inner()
    }

    #[test]
    fn vector_round_trip() {
        let shapes = [
            AbstractVector::default(),
            AbstractVector::from_ints([1, -2, i32::MAX, i32::MIN]),
            AbstractVector::from_reals([0.0, -1.5, f64::MAX]),
            AbstractVector::from_chars(*b"hello"),
            AbstractVector::new(vec![3], vec![2.25, 1e-9], b"\x00\xff".to_vec()),
        ];
        for v in shapes {
            let bytes = encode(|w| {
                w.write_vector(&v);
            });
            let mut r = reader(bytes);
            assert_eq!(r.read_vector().unwrap(), v);
            assert_eq!(r.consumed() as usize, v.wire_size());
        }
    }

    #[test]
    fn non_positive_string_length_is_empty() {
        let mut r = reader([0i32, -5].iter().flat_map(|v| v.to_be_bytes()).collect());
        assert_eq!(r.read_string().unwrap(), "");
        assert_eq!(r.read_string().unwrap(), "");
    }

    #[test]
    fn string_round_trip() {
        let bytes = encode(|w| {
            w.write_string("pong").write_string("ünïcode");
        });
        let mut r = reader(bytes);
        assert_eq!(r.read_string().unwrap(), "pong");
        assert_eq!(r.read_string().unwrap(), "ünïcode");
    }

    #[test]
    fn truncated_vector_is_fatal() {
        // announces two ints, delivers one
        let bytes = encode(|w| {
            w.write_i32(2).write_i32(0).write_i32(0).write_i32(7);
        });
        let err = reader(bytes).read_vector().unwrap_err();
        assert!(matches!(err, ProtocolError::Truncated { .. }), "{err}");
    }

    #[test]
    fn truncated_string_is_fatal() {
        let mut bytes = encode(|w| {
            w.write_i32(10);
        });
        bytes.extend_from_slice(b"abc");
        let err = reader(bytes).read_string().unwrap_err();
        assert!(matches!(err, ProtocolError::Truncated { field: "string" }));
    }

    #[test]
    fn negative_vector_count_is_rejected() {
        let bytes = encode(|w| {
            w.write_i32(0).write_i32(-3).write_i32(0);
        });
        let err = reader(bytes).read_vector().unwrap_err();
        assert!(matches!(
            err,
            ProtocolError::NegativeCount {
                field: "real",
                count: -3
            }
        ));
    }

    #[test]
    fn unknown_opcode_in_header() {
        let bytes = encode(|w| {
            w.write_i32(9).write_i32(0);
        });
        let err = reader(bytes).read_header().unwrap_err();
        assert!(matches!(err, ProtocolError::UnknownOpcode(9)));
    }

    #[test]
    fn bool_only_one_is_true() {
        let bytes = encode(|w| {
            w.write_i32(1).write_i32(0).write_i32(2);
        });
        let mut r = reader(bytes);
        assert!(r.read_bool().unwrap());
        assert!(!r.read_bool().unwrap());
        assert!(!r.read_bool().unwrap());
    }

    #[test]
    fn declared_size_is_ignored_by_default() {
        let bytes = encode(|w| {
            w.write_opcode(Opcode::RLReturn).write_i32(999).write_f64(1.0);
        });
        let mut r = reader(bytes);
        let header = r.read_header().unwrap();
        assert_eq!(header.declared_size, 999);
        r.read_f64().unwrap();
        r.finish(&header).unwrap();
    }

    #[test]
    fn declared_size_is_checked_when_enforced() {
        let bytes = encode(|w| {
            w.write_opcode(Opcode::RLReturn).write_i32(4).write_f64(1.0);
        });
        let mut r = FrameReader::with_size_check(Cursor::new(bytes), SizeCheck::Enforce);
        let header = r.read_header().unwrap();
        r.read_f64().unwrap();
        let err = r.finish(&header).unwrap_err();
        assert!(matches!(
            err,
            ProtocolError::SizeMismatch {
                declared: 4,
                actual: 8,
                ..
            }
        ));
    }
}
