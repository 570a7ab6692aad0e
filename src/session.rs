//! One TCP connection with its paired frame reader and writer.
//!
//! A [`Session`] is confined to one thread of control and one logical
//! sequence of calls: every send is followed by a blocking read before the
//! next send. There are no timeouts here; a read or write deadline, if
//! wanted, is set on the [`TcpStream`] before it is handed to
//! [`Session::accept`].

use std::io::BufReader;
use std::net::{Shutdown, SocketAddr, TcpStream};

use tracing::{debug, info, instrument};

use crate::codec::{FrameHeader, FrameReader, FrameWriter, SizeCheck, WireMessage};
use crate::error::ProtocolError;
use crate::opcode::Opcode;
use crate::protocol::Announce;

/// Where a role's event loop stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RoleState {
    /// No connection yet, or closed before the loop ran.
    #[default]
    Disconnected,
    /// Connected and waiting for, or handling, a request.
    Idle,
    /// The loop ended on `RLTerminate`.
    Terminated,
    /// The loop aborted on an error and the session was closed.
    Failed,
}

/// Owns exactly one connection, one [`FrameReader`] and one [`FrameWriter`].
///
/// Closing is idempotent and releases the socket even after an error. The
/// session closes itself on drop.
#[derive(Debug, Default)]
pub struct Session {
    stream: Option<TcpStream>,
    reader: Option<FrameReader<BufReader<TcpStream>>>,
    writer: Option<FrameWriter<TcpStream>>,
    size_check: SizeCheck,
}

impl Session {
    /// A session that is not connected yet. Declared sizes are ignored.
    pub fn new() -> Self {
        Self::default()
    }

    /// A session that is not connected yet, with a declared-size policy.
    pub fn with_size_check(size_check: SizeCheck) -> Self {
        Session {
            stream: None,
            reader: None,
            writer: None,
            size_check,
        }
    }

    /// Open a TCP connection to `host:port`.
    ///
    /// Failure is returned as is; retrying is up to the caller.
    #[instrument(skip(self))]
    pub fn connect(&mut self, host: &str, port: u16) -> Result<(), ProtocolError> {
        let stream = TcpStream::connect((host, port))?;
        info!(peer = ?stream.peer_addr().ok(), "connected");
        self.attach(stream)
    }

    /// Take over an already established connection.
    #[instrument(skip_all, fields(peer = ?stream.peer_addr().ok()))]
    pub fn accept(&mut self, stream: TcpStream) -> Result<(), ProtocolError> {
        info!("accepted");
        self.attach(stream)
    }

    fn attach(&mut self, stream: TcpStream) -> Result<(), ProtocolError> {
        self.close();
        // frames are small and strictly request/response
        stream.set_nodelay(true)?;
        let reader = FrameReader::with_size_check(BufReader::new(stream.try_clone()?), self.size_check);
        let writer = FrameWriter::new(stream.try_clone()?);
        self.reader = Some(reader);
        self.writer = Some(writer);
        self.stream = Some(stream);
        Ok(())
    }

    /// True between a successful connect/accept and the next close.
    pub fn is_connected(&self) -> bool {
        self.stream.is_some()
    }

    /// Address of the peer, if connected.
    pub fn peer_addr(&self) -> Option<SocketAddr> {
        self.stream.as_ref().and_then(|s| s.peer_addr().ok())
    }

    /// The declared-size policy applied to received frames.
    pub fn size_check(&self) -> SizeCheck {
        self.size_check
    }

    /// The frame reader bound to the connection.
    pub fn reader(&mut self) -> Result<&mut FrameReader<BufReader<TcpStream>>, ProtocolError> {
        self.reader.as_mut().ok_or(ProtocolError::NotConnected)
    }

    /// The frame writer bound to the connection.
    pub fn writer(&mut self) -> Result<&mut FrameWriter<TcpStream>, ProtocolError> {
        self.writer.as_mut().ok_or(ProtocolError::NotConnected)
    }

    /// Send one complete frame.
    pub fn send<M: WireMessage>(&mut self, msg: &M) -> Result<(), ProtocolError> {
        self.writer()?.send(msg)
    }

    /// Send the connection announce frame for a role. No reply follows.
    pub fn announce(&mut self, who: Announce) -> Result<(), ProtocolError> {
        debug!(?who, "announce");
        self.send(&who)
    }

    /// Push whatever the writer has buffered to the socket.
    pub fn flush(&mut self) -> Result<(), ProtocolError> {
        self.writer()?.flush()
    }

    /// Read the next frame header. The declared size it carries is not used
    /// to delimit the payload.
    pub fn receive_header(&mut self) -> Result<FrameHeader, ProtocolError> {
        self.reader()?.read_header()
    }

    /// Read one complete frame.
    pub fn receive<M: WireMessage>(&mut self) -> Result<M, ProtocolError> {
        self.reader()?.receive()
    }

    /// Read one frame and require its opcode to echo `expected`.
    pub fn expect_reply<M: WireMessage>(
        &mut self,
        expected: Opcode,
    ) -> Result<M, ProtocolError> {
        self.reader()?.expect_reply(expected)
    }

    /// Release the socket and both stream wrappers. Safe to call any number
    /// of times, connected or not.
    pub fn close(&mut self) {
        // every send flushes, so nothing meaningful is left in the writer
        self.writer = None;
        self.reader = None;
        if let Some(stream) = self.stream.take() {
            if let Err(e) = stream.shutdown(Shutdown::Both) {
                debug!("shutdown: {e}");
            }
            info!("session closed");
        }
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.close();
    }
}
