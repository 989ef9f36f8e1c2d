//! Simulation server for testing with turmoil.
//!
//! `SimServer` hosts a [`ScriptedServer`] on turmoil's deterministic TCP so the
//! real line transport can be exercised end to end. Each accepted connection
//! gets a reader task; all writes go through one outbound channel per session.

use std::{collections::HashMap, io, net::SocketAddr, sync::Arc};

use tokio::{
    io::{AsyncBufReadExt, AsyncWriteExt, BufReader},
    sync::{Mutex, mpsc},
};
use turmoil::net::{TcpListener, TcpStream};

use crate::scripted_server::{Outgoing, ScriptedServer, SessionId};

/// State shared by every connection task.
#[derive(Default)]
struct Shared {
    server: ScriptedServer,
    writers: HashMap<SessionId, mpsc::UnboundedSender<String>>,
}

impl Shared {
    fn route(&self, out: Vec<Outgoing>) {
        for Outgoing { session, line } in out {
            if let Some(tx) = self.writers.get(&session) {
                // A closed receiver means the session is tearing down.
                let _ = tx.send(line);
            }
        }
    }
}

/// Scripted chat server on turmoil TCP.
pub struct SimServer {
    listener: TcpListener,
    shared: Arc<Mutex<Shared>>,
}

impl SimServer {
    /// Create and bind a new simulation server.
    pub async fn bind(address: &str) -> io::Result<Self> {
        let listener = TcpListener::bind(address).await?;
        Ok(Self { listener, shared: Arc::new(Mutex::new(Shared::default())) })
    }

    /// Accept connections forever, serving each on its own task.
    pub async fn run(self) -> io::Result<()> {
        loop {
            let (stream, peer) = self.listener.accept().await?;
            let shared = Arc::clone(&self.shared);
            tokio::spawn(serve_connection(stream, peer, shared));
        }
    }

    /// Accept exactly `count` connections, then keep serving them until they
    /// all close.
    pub async fn serve(self, count: usize) -> io::Result<()> {
        let mut tasks = Vec::with_capacity(count);
        for _ in 0..count {
            let (stream, peer) = self.listener.accept().await?;
            let shared = Arc::clone(&self.shared);
            tasks.push(tokio::spawn(serve_connection(stream, peer, shared)));
        }
        for task in tasks {
            task.await.map_err(io::Error::other)??;
        }
        Ok(())
    }
}

async fn serve_connection(
    stream: TcpStream,
    peer: SocketAddr,
    shared: Arc<Mutex<Shared>>,
) -> io::Result<()> {
    let (reader, mut writer) = tokio::io::split(stream);
    let (tx, mut rx) = mpsc::unbounded_channel::<String>();

    let session = {
        let mut shared = shared.lock().await;
        let (session, out) = shared.server.connect(peer.to_string());
        shared.writers.insert(session, tx);
        shared.route(out);
        session
    };
    tracing::debug!(session, %peer, "sim connection accepted");

    let write_task = tokio::spawn(async move {
        while let Some(line) = rx.recv().await {
            writer.write_all(line.as_bytes()).await?;
            writer.write_all(b"\n").await?;
            writer.flush().await?;
        }
        io::Result::Ok(())
    });

    let mut lines = BufReader::new(reader).lines();
    let result = loop {
        match lines.next_line().await {
            Ok(Some(line)) => {
                let mut shared = shared.lock().await;
                let out = shared.server.receive(session, &line);
                shared.route(out);
            },
            Ok(None) => break Ok(()),
            Err(e) => break Err(e),
        }
    };

    {
        let mut shared = shared.lock().await;
        shared.writers.remove(&session);
        let out = shared.server.disconnect(session);
        shared.route(out);
    }
    tracing::debug!(session, "sim connection closed");
    write_task.abort();

    result
}
