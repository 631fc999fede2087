//! UDP link: datagrams from a UART-to-network bridge

use ds_core::link::{LinkError, TelemetryLink};
use std::io::ErrorKind;
use std::net::{SocketAddr, UdpSocket};

/// Largest UDP payload over IPv4, so no datagram is ever truncated
const MAX_DATAGRAM: usize = 65_507;

pub struct UdpLink {
    name: String,
    bind: String,
    socket: Option<UdpSocket>,
    /// Bytes received but not yet handed out
    pending: Vec<u8>,
}

impl UdpLink {
    pub fn new(bind: impl Into<String>) -> Self {
        let bind = bind.into();
        Self {
            name: format!("udp://{}", bind),
            bind,
            socket: None,
            pending: Vec::new(),
        }
    }

    /// Address the socket is bound to, once open
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.socket.as_ref().and_then(|s| s.local_addr().ok())
    }
}

impl TelemetryLink for UdpLink {
    fn name(&self) -> &str {
        &self.name
    }

    fn open(&mut self) -> Result<(), LinkError> {
        if self.socket.is_some() {
            return Ok(());
        }
        let socket = UdpSocket::bind(&self.bind)
            .map_err(|e| LinkError::io(format!("bind {}", self.bind), e))?;
        socket
            .set_nonblocking(true)
            .map_err(|e| LinkError::io("set_nonblocking", e))?;
        self.socket = Some(socket);
        Ok(())
    }

    fn read_available(&mut self, max: usize) -> Result<Vec<u8>, LinkError> {
        let socket = self.socket.as_ref().ok_or(LinkError::NotOpen)?;

        let mut buf = vec![0u8; MAX_DATAGRAM];
        while self.pending.len() < max {
            match socket.recv_from(&mut buf) {
                Ok((n, _)) => self.pending.extend_from_slice(&buf[..n]),
                Err(e) if e.kind() == ErrorKind::WouldBlock => break,
                Err(e) => return Err(LinkError::io("recv", e)),
            }
        }

        let take = max.min(self.pending.len());
        Ok(self.pending.drain(..take).collect())
    }

    fn close(&mut self) {
        self.socket = None;
        self.pending.clear();
    }

    fn is_open(&self) -> bool {
        self.socket.is_some()
    }
}
