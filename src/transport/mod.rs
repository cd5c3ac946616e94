//! Byte-stream transport between the pipeline and the lab harness
//!
//! The harness multiplexes all ports and the operator console over one
//! stream in each direction. The loop reads one message, hands it to the
//! dispatcher and writes every resulting output before reading the next.

pub mod codec;

pub use codec::{encode, read_message, write_message, Message};

use crate::dataplane::{Dispatcher, Output};
use crate::Result;
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};
use tracing::{debug, info, trace};

impl From<Output> for Message {
    fn from(output: Output) -> Self {
        match output {
            Output::Frame { port, data } => Message::Frame {
                port: port.number(),
                data,
            },
            Output::Print(line) => Message::Control(line),
        }
    }
}

/// Drive `dispatcher` until `reader` reaches a clean end of stream.
///
/// Harness contract violations (bad framing, unknown port numbers) end the
/// loop with an error; protocol problems inside frames do not.
pub async fn run<R, W>(dispatcher: &mut Dispatcher, reader: &mut R, writer: &mut W) -> Result<()>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    info!(
        mode = ?dispatcher.mode(),
        ports = dispatcher.registry().len(),
        "Processing messages"
    );

    while let Some(msg) = read_message(reader).await? {
        let outputs = match msg {
            Message::Frame { port, data } => {
                let ingress = dispatcher.resolve_port(port)?;
                trace!("Received {} bytes on port {}", data.len(), ingress);
                dispatcher.handle_frame(ingress, &data)
            }
            Message::Control(line) => {
                debug!("Control: {:?}", line);
                dispatcher.handle_command(&line)
            }
            Message::MacAssignment { port, mac } => {
                dispatcher.assign_address(port, mac)?;
                Vec::new()
            }
        };

        if outputs.is_empty() {
            continue;
        }
        for output in outputs {
            write_message(writer, &Message::from(output)).await?;
        }
        writer.flush().await?;
    }

    info!("Transport closed, shutting down");
    for (name, value) in dispatcher.metrics().export() {
        info!(metric = %name, value, "Final counter");
    }
    Ok(())
}
