//! Harness message framing
//!
//! Every message is `[size: u16 BE][type: u16 BE][payload]`, where `size`
//! counts the 4-byte header too. Type 0 is operator text, 0xFFFF an address
//! assignment and anything else a frame for that port.

use crate::protocol::MacAddr;
use crate::{Error, Result};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

pub const HEADER_LEN: usize = 4;
/// Type of operator command / output messages
pub const TYPE_CONTROL: u16 = 0;
/// Type of hardware-address assignment messages
pub const TYPE_MAC_ASSIGNMENT: u16 = 0xFFFF;
/// Assignment payload: port(2) + MAC(6)
const MAC_ASSIGNMENT_LEN: usize = 8;
/// Largest payload a single message can carry
pub const MAX_PAYLOAD: usize = u16::MAX as usize - HEADER_LEN;

/// One transport message
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Message {
    /// Operator text; one command inbound, one line outbound
    Control(String),
    /// Harness assigned `mac` to port `port`
    MacAssignment { port: u16, mac: MacAddr },
    /// Raw Ethernet frame received on / to be sent from `port`
    Frame { port: u16, data: Vec<u8> },
}

impl Message {
    fn kind(&self) -> u16 {
        match self {
            Message::Control(_) => TYPE_CONTROL,
            Message::MacAssignment { .. } => TYPE_MAC_ASSIGNMENT,
            Message::Frame { port, .. } => *port,
        }
    }
}

/// Serialize a message, header included.
pub fn encode(msg: &Message) -> Result<Vec<u8>> {
    let mac_payload;
    let payload: &[u8] = match msg {
        Message::Control(text) => text.as_bytes(),
        Message::MacAssignment { port, mac } => {
            let mut buf = [0u8; MAC_ASSIGNMENT_LEN];
            buf[..2].copy_from_slice(&port.to_be_bytes());
            buf[2..].copy_from_slice(&mac.0);
            mac_payload = buf;
            &mac_payload
        }
        Message::Frame { port, data } => {
            if matches!(*port, TYPE_CONTROL | TYPE_MAC_ASSIGNMENT) {
                return Err(Error::Transport(format!(
                    "port number {port} is reserved"
                )));
            }
            data.as_slice()
        }
    };

    if payload.len() > MAX_PAYLOAD {
        return Err(Error::Transport(format!(
            "payload of {} bytes does not fit a message",
            payload.len()
        )));
    }

    // bounded by MAX_PAYLOAD
    let size = (payload.len() + HEADER_LEN) as u16;
    let mut buf = Vec::with_capacity(usize::from(size));
    buf.extend_from_slice(&size.to_be_bytes());
    buf.extend_from_slice(&msg.kind().to_be_bytes());
    buf.extend_from_slice(payload);
    Ok(buf)
}

fn decode(kind: u16, payload: Vec<u8>) -> Result<Message> {
    match kind {
        TYPE_CONTROL => Ok(Message::Control(
            String::from_utf8_lossy(&payload).into_owned(),
        )),
        TYPE_MAC_ASSIGNMENT => {
            if payload.len() != MAC_ASSIGNMENT_LEN {
                return Err(Error::Transport(format!(
                    "address assignment of {} bytes, expected {}",
                    payload.len(),
                    MAC_ASSIGNMENT_LEN
                )));
            }
            let port = u16::from_be_bytes([payload[0], payload[1]]);
            let mac = MacAddr::from_slice(&payload[2..])
                .ok_or_else(|| Error::Transport("truncated address assignment".into()))?;
            Ok(Message::MacAssignment { port, mac })
        }
        port => Ok(Message::Frame {
            port,
            data: payload,
        }),
    }
}

/// Read the next message.
///
/// `Ok(None)` means the stream ended cleanly between two messages.
pub async fn read_message<R>(reader: &mut R) -> Result<Option<Message>>
where
    R: AsyncRead + Unpin,
{
    let mut header = [0u8; HEADER_LEN];
    let mut filled = 0;
    while filled < HEADER_LEN {
        let n = reader.read(&mut header[filled..]).await?;
        if n == 0 {
            if filled == 0 {
                return Ok(None);
            }
            return Err(Error::Transport(format!(
                "stream closed inside a message header ({filled} of {HEADER_LEN} bytes)"
            )));
        }
        filled += n;
    }

    let size = usize::from(u16::from_be_bytes([header[0], header[1]]));
    let kind = u16::from_be_bytes([header[2], header[3]]);
    if size < HEADER_LEN {
        return Err(Error::Transport(format!(
            "message size {size} is smaller than its header"
        )));
    }

    let mut payload = vec![0u8; size - HEADER_LEN];
    reader.read_exact(&mut payload).await.map_err(|e| match e.kind() {
        std::io::ErrorKind::UnexpectedEof => Error::Transport(format!(
            "stream closed inside a message of {size} bytes"
        )),
        _ => Error::Io(e),
    })?;

    decode(kind, payload).map(Some)
}

/// Write one message; the caller flushes.
pub async fn write_message<W>(writer: &mut W, msg: &Message) -> Result<()>
where
    W: AsyncWrite + Unpin,
{
    let buf = encode(msg)?;
    writer.write_all(&buf).await?;
    Ok(())
}
