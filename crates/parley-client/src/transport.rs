//! TCP transport for the client.
//!
//! Provides [`ConnectedClient`] which handles socket I/O for line transport.
//! This is a thin layer that just sends/receives lines - protocol logic
//! remains in the Sans-IO [`Client`](crate::Client).
//!
//! Lines are `\n` terminated on the wire. Inbound bytes that are not valid
//! UTF-8 are replaced rather than rejected, since the server relays whatever
//! its users type.

use tokio::{
    io::{AsyncBufReadExt, AsyncWriteExt, BufReader},
    net::{
        TcpStream,
        tcp::{OwnedReadHalf, OwnedWriteHalf},
    },
    sync::mpsc,
};
use thiserror::Error;

/// Transport errors.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Connection failed.
    #[error("connection failed: {0}")]
    Connection(String),

    /// Socket error.
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    /// Connection task is gone.
    #[error("connection closed")]
    Closed,
}

/// Handle to a connected client with TCP transport.
///
/// Provides channels for line transport. Lines are sent/received via the
/// channels, and an internal task handles the socket I/O. `from_server`
/// yields `None` once the connection is closed.
pub struct ConnectedClient {
    /// Send lines to the server (without terminator).
    pub to_server: mpsc::Sender<String>,
    /// Receive lines from the server (without terminator).
    pub from_server: mpsc::Receiver<String>,
    /// Abort handle to stop the connection task.
    abort_handle: tokio::task::AbortHandle,
}

impl ConnectedClient {
    /// Queue one line for the server.
    pub async fn send(&self, line: String) -> Result<(), TransportError> {
        self.to_server.send(line).await.map_err(|_| TransportError::Closed)
    }

    /// Stop the connection.
    pub fn stop(&self) {
        self.abort_handle.abort();
    }
}

impl Drop for ConnectedClient {
    fn drop(&mut self) {
        self.abort_handle.abort();
    }
}

/// Connect to a Parley server over TCP.
///
/// Returns a [`ConnectedClient`] with channels for line transport.
pub async fn connect(server_addr: &str) -> Result<ConnectedClient, TransportError> {
    let stream = TcpStream::connect(server_addr)
        .await
        .map_err(|e| TransportError::Connection(format!("{server_addr}: {e}")))?;
    stream.set_nodelay(true)?;

    let (to_server_tx, to_server_rx) = mpsc::channel::<String>(32);
    let (from_server_tx, from_server_rx) = mpsc::channel::<String>(32);

    let (reader, writer) = stream.into_split();
    let handle = tokio::spawn(run_connection(reader, writer, to_server_rx, from_server_tx));

    Ok(ConnectedClient {
        to_server: to_server_tx,
        from_server: from_server_rx,
        abort_handle: handle.abort_handle(),
    })
}

/// Run the connection, bridging between channels and the socket.
async fn run_connection(
    reader: OwnedReadHalf,
    mut writer: OwnedWriteHalf,
    mut to_server: mpsc::Receiver<String>,
    from_server: mpsc::Sender<String>,
) {
    let mut reader = BufReader::new(reader);
    let mut buf = Vec::with_capacity(1024);

    loop {
        tokio::select! {
            read = reader.read_until(b'\n', &mut buf) => {
                match read {
                    Ok(0) => {
                        tracing::debug!("server closed the connection");
                        break;
                    },
                    Ok(_) => {
                        let line = String::from_utf8_lossy(&buf)
                            .trim_end_matches(['\r', '\n'])
                            .to_owned();
                        buf.clear();
                        if from_server.send(line).await.is_err() {
                            break;
                        }
                    },
                    Err(e) => {
                        tracing::warn!(error = %e, "read failed");
                        break;
                    },
                }
            },
            outgoing = to_server.recv() => {
                let Some(line) = outgoing else {
                    break;
                };
                if let Err(e) = write_line(&mut writer, &line).await {
                    tracing::warn!(error = %e, "write failed");
                    break;
                }
            },
        }
    }
}

async fn write_line(writer: &mut OwnedWriteHalf, line: &str) -> Result<(), TransportError> {
    let mut bytes = Vec::with_capacity(line.len() + 1);
    bytes.extend_from_slice(line.as_bytes());
    bytes.push(b'\n');
    writer.write_all(&bytes).await?;
    writer.flush().await?;
    Ok(())
}
