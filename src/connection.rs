//! Connection to the benchmark target.
//!
//! One blocking TCP stream, opened once and owned for the whole run. The
//! socket is closed when the `Connection` is dropped, on success and error
//! paths alike.

use std::io::{self, Read, Write};
use std::net::{Shutdown, SocketAddr, TcpStream, ToSocketAddrs};
use tracing::debug;

/// Blocking client connection to a memcached-compatible server
#[derive(Debug)]
pub struct Connection {
    stream: TcpStream,
    peer: SocketAddr,
}

impl Connection {
    /// Resolve `host:port` and connect to the first address that accepts.
    pub fn open(host: &str, port: u16) -> io::Result<Self> {
        let mut last_err = None;

        for addr in (host, port).to_socket_addrs()? {
            match connect_addr(addr) {
                Ok(stream) => {
                    debug!(peer = %addr, "Connected");
                    return Ok(Connection { stream, peer: addr });
                }
                Err(e) => {
                    debug!(peer = %addr, error = %e, "Connect attempt failed");
                    last_err = Some(e);
                }
            }
        }

        Err(last_err.unwrap_or_else(|| {
            io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("could not resolve {}:{}", host, port),
            )
        }))
    }

    pub fn peer_addr(&self) -> SocketAddr {
        self.peer
    }
}

impl Read for Connection {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.stream.read(buf)
    }
}

impl Write for Connection {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.stream.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.stream.flush()
    }
}

impl Drop for Connection {
    fn drop(&mut self) {
        // Peer may already be gone
        let _ = self.stream.shutdown(Shutdown::Both);
        debug!(peer = %self.peer, "Connection closed");
    }
}

/// Create a blocking TCP stream for the address family of `addr`.
fn connect_addr(addr: SocketAddr) -> io::Result<TcpStream> {
    let socket = socket2::Socket::new(
        match addr {
            SocketAddr::V4(_) => socket2::Domain::IPV4,
            SocketAddr::V6(_) => socket2::Domain::IPV6,
        },
        socket2::Type::STREAM,
        Some(socket2::Protocol::TCP),
    )?;

    socket.connect(&addr.into())?;

    Ok(socket.into())
}
