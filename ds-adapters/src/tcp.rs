//! TCP link: raw serial-over-TCP bridge (e.g. ser2net)
//!
//! Resolving and connecting can block for seconds, so `open` hands both to
//! a helper thread and returns at once. Reads report nothing until the
//! connection lands, and surface a failed connect as an error.

use ds_core::link::{LinkError, TelemetryLink};
use std::io::{self, ErrorKind, Read};
use std::net::{SocketAddr, TcpStream, ToSocketAddrs};
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::thread;
use std::time::Duration;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(2);

enum Connection {
    Closed,
    Connecting(Receiver<Result<TcpStream, LinkError>>),
    Connected(TcpStream),
}

pub struct TcpLink {
    name: String,
    addr: String,
    connection: Connection,
}

impl TcpLink {
    pub fn new(addr: impl Into<String>) -> Self {
        let addr = addr.into();
        Self {
            name: format!("tcp://{}", addr),
            addr,
            connection: Connection::Closed,
        }
    }

    /// True once the bridge accepted the connection
    pub fn is_connected(&self) -> bool {
        matches!(self.connection, Connection::Connected(_))
    }

    /// Move a finished background connect into place
    fn poll_connect(&mut self) -> Result<(), LinkError> {
        let Connection::Connecting(rx) = &self.connection else {
            return Ok(());
        };
        match rx.try_recv() {
            Ok(Ok(stream)) => {
                self.connection = Connection::Connected(stream);
                Ok(())
            }
            Ok(Err(e)) => {
                self.connection = Connection::Closed;
                Err(e)
            }
            Err(TryRecvError::Empty) => Ok(()),
            Err(TryRecvError::Disconnected) => {
                self.connection = Connection::Closed;
                Err(LinkError::Disconnected)
            }
        }
    }
}

fn resolve(addr: &str) -> Result<SocketAddr, LinkError> {
    addr.to_socket_addrs()
        .map_err(|e| LinkError::io(format!("resolve {}", addr), e))?
        .next()
        .ok_or_else(|| {
            LinkError::io(
                format!("resolve {}", addr),
                io::Error::new(ErrorKind::NotFound, "no addresses"),
            )
        })
}

fn connect(addr: &str) -> Result<TcpStream, LinkError> {
    let addr = resolve(addr)?;
    let stream = TcpStream::connect_timeout(&addr, CONNECT_TIMEOUT)
        .map_err(|e| LinkError::io(format!("connect {}", addr), e))?;
    stream
        .set_nonblocking(true)
        .map_err(|e| LinkError::io("set_nonblocking", e))?;
    let _ = stream.set_nodelay(true);
    Ok(stream)
}

impl TelemetryLink for TcpLink {
    fn name(&self) -> &str {
        &self.name
    }

    fn open(&mut self) -> Result<(), LinkError> {
        if !matches!(self.connection, Connection::Closed) {
            return Ok(());
        }
        let (tx, rx) = mpsc::channel();
        let addr = self.addr.clone();
        thread::Builder::new()
            .name("tcp-link-connect".to_string())
            .spawn(move || {
                // Receiver gone means the link was closed meanwhile; the stream drops here
                let _ = tx.send(connect(&addr));
            })
            .map_err(|e| LinkError::io("spawn connect thread", e))?;
        self.connection = Connection::Connecting(rx);
        Ok(())
    }

    fn read_available(&mut self, max: usize) -> Result<Vec<u8>, LinkError> {
        self.poll_connect()?;
        let stream = match &mut self.connection {
            Connection::Closed => return Err(LinkError::NotOpen),
            Connection::Connecting(_) => return Ok(Vec::new()),
            Connection::Connected(stream) => stream,
        };

        let mut buf = vec![0u8; max];
        let mut filled = 0;
        let mut eof = false;
        while filled < max {
            match stream.read(&mut buf[filled..]) {
                Ok(0) => {
                    eof = true;
                    break;
                }
                Ok(n) => filled += n,
                Err(e) if e.kind() == ErrorKind::WouldBlock => break,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(LinkError::io("read", e)),
            }
        }

        // Hand out what arrived before the peer hung up; report it next call
        if eof {
            self.connection = Connection::Closed;
            if filled == 0 {
                return Err(LinkError::Disconnected);
            }
        }
        buf.truncate(filled);
        Ok(buf)
    }

    fn close(&mut self) {
        if let Connection::Connected(stream) =
            std::mem::replace(&mut self.connection, Connection::Closed)
        {
            let _ = stream.shutdown(std::net::Shutdown::Both);
        }
    }

    fn is_open(&self) -> bool {
        !matches!(self.connection, Connection::Closed)
    }
}
