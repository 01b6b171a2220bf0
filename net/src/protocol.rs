//! Wire protocol: single-character commands, short acknowledgement strings.
//!
//! Everything on the stream is UTF-8 text with no length prefix. One read
//! yields one frame of at most [`MAX_FRAME`] bytes, which matches the
//! console peers this link talks to; peers are expected to alternate on
//! human timescales, so back-to-back writes from one side may coalesce into
//! a single read on the other. A zero-length read means the peer closed the
//! stream and is reported as [`Error::StreamClosed`], never as an empty
//! command.

use std::fmt;

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::error::{Error, Result};

/// Maximum frame size accepted per read.
pub const MAX_FRAME: usize = 1024;

/// Single-character command vocabulary.
///
/// Decoding is total: anything outside the vocabulary becomes
/// [`Command::Unknown`], which receivers answer with [`Ack::Unknown`]
/// instead of failing. What a command *means* depends on the receiving
/// role; see the handler tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Wire byte `0`.
    Set0,
    /// Wire byte `1`.
    Set1,
    /// Anything else on the wire.
    Unknown,
}

impl Command {
    /// Decodes a whitespace-stripped payload. Total.
    pub fn decode(payload: &str) -> Self {
        match payload.trim() {
            "0" => Command::Set0,
            "1" => Command::Set1,
            _ => Command::Unknown,
        }
    }

    /// Wire text. The endpoints never send `Unknown`; it encodes to a
    /// placeholder that decodes back to itself.
    pub fn encode(self) -> &'static str {
        match self {
            Command::Set0 => "0",
            Command::Set1 => "1",
            Command::Unknown => "?",
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.encode())
    }
}

/// Acknowledgement vocabulary, one string per accepted command per role.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ack {
    /// Plant applied the fill lineup.
    State0Set,
    /// Plant applied the drain lineup.
    State1Set,
    /// Operator mirror marked the level low.
    Low,
    /// Operator mirror marked the level high.
    High,
    /// Command outside the vocabulary; nothing was mutated.
    Unknown,
}

impl Ack {
    pub fn encode(self) -> &'static str {
        match self {
            Ack::State0Set => "ACK_STATE_0_SET",
            Ack::State1Set => "ACK_STATE_1_SET",
            Ack::Low => "ACK_LOW",
            Ack::High => "ACK_HIGH",
            Ack::Unknown => "ACK_UNKNOWN",
        }
    }

    /// Exact match on the ack vocabulary after stripping whitespace.
    /// Out-of-vocabulary text is `None`; callers surface the raw payload.
    pub fn decode(payload: &str) -> Option<Self> {
        match payload.trim() {
            "ACK_STATE_0_SET" => Some(Ack::State0Set),
            "ACK_STATE_1_SET" => Some(Ack::State1Set),
            "ACK_LOW" => Some(Ack::Low),
            "ACK_HIGH" => Some(Ack::High),
            "ACK_UNKNOWN" => Some(Ack::Unknown),
            _ => None,
        }
    }
}

impl fmt::Display for Ack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.encode())
    }
}

/// Read one frame: a single read into a fixed buffer, stripped of
/// surrounding whitespace. Zero bytes means the peer closed the stream.
pub async fn read_frame<R: AsyncRead + Unpin>(reader: &mut R) -> Result<String> {
    let mut buf = [0u8; MAX_FRAME];
    let n = reader.read(&mut buf).await?;
    if n == 0 {
        return Err(Error::StreamClosed);
    }
    Ok(String::from_utf8_lossy(&buf[..n]).trim().to_string())
}

/// Write one frame and flush it.
pub async fn write_frame<W: AsyncWrite + Unpin>(writer: &mut W, text: &str) -> Result<()> {
    writer.write_all(text.as_bytes()).await?;
    writer.flush().await?;
    Ok(())
}
