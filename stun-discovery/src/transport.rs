use bytes::{Bytes, BytesMut};
use log::{debug, warn};
use std::future::Future;
use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use stun_proto::{message_size, HEADER_SIZE};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::{TcpSocket, UdpSocket};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

// Inbound messages waiting to be consumed
const QUEUE_SIZE: usize = 32;
const MAX_DATAGRAM_SIZE: usize = 65535;

/// Connection oriented view of a socket used to exchange STUN messages with one remote
/// endpoint at a time. Every message received while connected is queued and handed out
/// by [`Transport::recv`], whatever its origin.
pub trait Transport: Send {
    /// Targets `remote`. Subsequent messages are sent to it.
    fn connect(&mut self, remote: SocketAddr) -> impl Future<Output = io::Result<()>> + Send;

    /// Stops talking to the current remote endpoint and drops queued messages
    fn disconnect(&mut self) -> impl Future<Output = io::Result<()>> + Send;

    /// Sends one encoded message to the remote endpoint
    fn send(&mut self, buffer: Bytes) -> impl Future<Output = io::Result<()>> + Send;

    /// Waits for the next inbound message. Returns `None` once no more messages can arrive.
    fn recv(&mut self) -> impl Future<Output = Option<Bytes>> + Send;

    /// Local address of the socket
    fn local_addr(&self) -> io::Result<SocketAddr>;
}

fn not_connected() -> io::Error {
    io::Error::new(io::ErrorKind::NotConnected, "No remote endpoint")
}

/// UDP transport. The socket is bound once; connecting only changes the destination so
/// every request leaves from the same local port.
#[derive(Debug)]
pub struct UdpTransport {
    socket: Arc<UdpSocket>,
    remote: Option<SocketAddr>,
    rx: mpsc::Receiver<Bytes>,
    reader: JoinHandle<()>,
}

impl UdpTransport {
    /// Binds a socket to `local` and starts reading datagrams from it
    pub async fn bind(local: SocketAddr) -> io::Result<Self> {
        let socket = Arc::new(UdpSocket::bind(local).await?);
        let (tx, rx) = mpsc::channel(QUEUE_SIZE);
        let reader = tokio::spawn(read_datagrams(socket.clone(), tx));
        debug!("UDP transport bound to {}", socket.local_addr()?);
        Ok(Self {
            socket,
            remote: None,
            rx,
            reader,
        })
    }
}

// ICMP errors of previous sends show up as these on some platforms. The socket is
// still usable afterwards.
fn is_transient(e: &io::Error) -> bool {
    matches!(
        e.kind(),
        io::ErrorKind::ConnectionReset
            | io::ErrorKind::ConnectionRefused
            | io::ErrorKind::Interrupted
    )
}

// Ends on the first persistent socket error. Dropping `tx` then makes `recv` return `None`.
async fn read_datagrams(socket: Arc<UdpSocket>, tx: mpsc::Sender<Bytes>) {
    let mut buffer = vec![0u8; MAX_DATAGRAM_SIZE];
    loop {
        let (size, from) = match socket.recv_from(&mut buffer).await {
            Ok(received) => received,
            Err(e) if is_transient(&e) => {
                debug!("Error reading datagram: {}", e);
                continue;
            }
            Err(e) => {
                warn!("Stop reading datagrams: {}", e);
                return;
            }
        };

        match tx.try_send(Bytes::copy_from_slice(&buffer[..size])) {
            Ok(()) => {}
            Err(mpsc::error::TrySendError::Full(_)) => {
                debug!("Dropping datagram of {} bytes from {}: queue full", size, from);
            }
            Err(mpsc::error::TrySendError::Closed(_)) => return,
        }
    }
}

impl Drop for UdpTransport {
    fn drop(&mut self) {
        self.reader.abort();
    }
}

impl Transport for UdpTransport {
    async fn connect(&mut self, remote: SocketAddr) -> io::Result<()> {
        self.remote = Some(remote);
        Ok(())
    }

    async fn disconnect(&mut self) -> io::Result<()> {
        self.remote = None;
        while self.rx.try_recv().is_ok() {}
        Ok(())
    }

    async fn send(&mut self, buffer: Bytes) -> io::Result<()> {
        let remote = self.remote.ok_or_else(not_connected)?;
        self.socket.send_to(&buffer, remote).await?;
        Ok(())
    }

    async fn recv(&mut self) -> Option<Bytes> {
        self.rx.recv().await
    }

    fn local_addr(&self) -> io::Result<SocketAddr> {
        self.socket.local_addr()
    }
}

#[derive(Debug)]
struct TcpConnection {
    writer: OwnedWriteHalf,
    rx: mpsc::Receiver<Bytes>,
    reader: JoinHandle<()>,
}

/// TCP transport. Each connection is opened from the same local address, which is
/// possible because the socket is created with `SO_REUSEADDR`. Inbound messages are
/// framed with the length carried in the STUN header.
#[derive(Debug)]
pub struct TcpTransport {
    local: SocketAddr,
    connection: Option<TcpConnection>,
}

impl TcpTransport {
    /// Creates a transport that connects from `local`. When the port is `0` the one
    /// assigned to the first connection is kept for the next ones.
    pub fn new(local: SocketAddr) -> Self {
        Self {
            local,
            connection: None,
        }
    }
}

async fn read_stream(mut reader: OwnedReadHalf, tx: mpsc::Sender<Bytes>) {
    let mut buffer = BytesMut::with_capacity(MAX_DATAGRAM_SIZE);
    loop {
        while buffer.len() >= HEADER_SIZE {
            let size = match message_size(&buffer) {
                Ok(size) => size,
                Err(e) => {
                    warn!("Closing stream, can not frame STUN message: {}", e);
                    return;
                }
            };
            if buffer.len() < size {
                break;
            }
            if tx.send(buffer.split_to(size).freeze()).await.is_err() {
                return;
            }
        }

        match reader.read_buf(&mut buffer).await {
            Ok(0) => {
                debug!("Stream closed by peer, {} bytes left unread", buffer.len());
                return;
            }
            Ok(_) => {}
            Err(e) => {
                debug!("Error reading stream: {}", e);
                return;
            }
        }
    }
}

impl Drop for TcpTransport {
    fn drop(&mut self) {
        if let Some(connection) = self.connection.take() {
            connection.reader.abort();
        }
    }
}

impl Transport for TcpTransport {
    async fn connect(&mut self, remote: SocketAddr) -> io::Result<()> {
        self.disconnect().await?;

        let socket = if self.local.is_ipv4() {
            TcpSocket::new_v4()?
        } else {
            TcpSocket::new_v6()?
        };
        socket.set_reuseaddr(true)?;
        socket.bind(self.local)?;
        let stream = socket.connect(remote).await?;
        self.local = stream.local_addr()?;
        debug!("TCP transport connected from {} to {}", self.local, remote);

        let (reader, writer) = stream.into_split();
        let (tx, rx) = mpsc::channel(QUEUE_SIZE);
        self.connection = Some(TcpConnection {
            writer,
            rx,
            reader: tokio::spawn(read_stream(reader, tx)),
        });
        Ok(())
    }

    async fn disconnect(&mut self) -> io::Result<()> {
        if let Some(mut connection) = self.connection.take() {
            connection.reader.abort();
            // The peer may already be gone
            if let Err(e) = connection.writer.shutdown().await {
                debug!("Error shutting down stream: {}", e);
            }
        }
        Ok(())
    }

    async fn send(&mut self, buffer: Bytes) -> io::Result<()> {
        let connection = self.connection.as_mut().ok_or_else(not_connected)?;
        connection.writer.write_all(&buffer).await
    }

    async fn recv(&mut self) -> Option<Bytes> {
        match self.connection.as_mut() {
            Some(connection) => connection.rx.recv().await,
            None => None,
        }
    }

    fn local_addr(&self) -> io::Result<SocketAddr> {
        Ok(self.local)
    }
}
