//! # Network Session Module
//!
//! A `Session` owns the single stream socket to the controller, along with the
//! current-track shadow the file layer uses to elide redundant track seeks.
//! The connection lifetime is bound to the mount state: a `MOUNT` command
//! connects before sending, an `UNMOUNT` disconnects after the reply, and
//! nothing reconnects in between.  A connection dropped mid-session is fatal;
//! the caller must unmount and mount again.
//!
//! Every syscall is a strict request/response.  The 8-byte command block goes
//! out in network byte order, followed by a full sector for `WRITE_SECTOR`;
//! the 8-byte reply comes back, followed by a full sector for `READ_SECTOR`.
//! Short reads and writes surface as I/O errors.

use std::net::TcpStream;
use std::io::{Read,Write};
use log::{debug,info};
use crate::proto;
use crate::proto::SectorBuf;
use crate::DYNERR;

/// Enumerates session errors.  The `Display` trait will print equivalent long message.
#[derive(thiserror::Error,Debug)]
pub enum Error {
    #[error("session is not connected")]
    NotConnected,
    #[error("session is already connected")]
    AlreadyConnected,
    #[error("payload-bearing command without a sector buffer")]
    MissingPayload
}

/// Connection to the controller plus the current-track shadow.
/// The peer defaults to the controller's well known address and can be
/// overridden at construction, before the first mount.
pub struct Session {
    host: String,
    port: u16,
    stream: Option<TcpStream>,
    current_track: Option<u32>
}

impl Session {
    /// Create a disconnected session.  `None` selects the compiled-in default
    /// for either half of the peer address.
    pub fn new(host: Option<String>,port: Option<u16>) -> Self {
        Self {
            host: match host {
                Some(h) => h,
                None => proto::DEFAULT_HOST.to_string()
            },
            port: match port {
                Some(p) => p,
                None => proto::DEFAULT_PORT
            },
            stream: None,
            current_track: None
        }
    }
    pub fn is_connected(&self) -> bool {
        self.stream.is_some()
    }
    /// track the controller head is known to be on, `None` until the first seek
    pub fn current_track(&self) -> Option<u32> {
        self.current_track
    }
    pub fn set_current_track(&mut self,track: Option<u32>) {
        self.current_track = track;
    }
    /// Perform one request/response exchange with the controller.
    /// A `MOUNT` command connects first; an `UNMOUNT` command disconnects after
    /// the reply.  `payload` is sent after a `WRITE_SECTOR` command and filled
    /// from the wire after a `READ_SECTOR` reply; the two payload-bearing
    /// opcodes require it and the others ignore it.  The undecoded reply word
    /// is returned; checking its return status bit is the caller's business.
    pub fn syscall(&mut self,cmd: u64,mut payload: Option<&mut SectorBuf>) -> Result<u64,DYNERR> {
        let op = proto::opcode_of(cmd);
        if op==proto::OP_MOUNT {
            if self.stream.is_some() {
                return Err(Box::new(Error::AlreadyConnected));
            }
            info!("connecting to controller at {}:{}",self.host,self.port);
            self.stream = Some(TcpStream::connect((self.host.as_str(),self.port))?);
        }
        let stream = match self.stream.as_mut() {
            Some(s) => s,
            None => return Err(Box::new(Error::NotConnected))
        };
        stream.write_all(&u64::to_be_bytes(cmd))?;
        if op==proto::OP_WRITE_SECTOR {
            match &payload {
                Some(buf) => stream.write_all(&buf[..])?,
                None => return Err(Box::new(Error::MissingPayload))
            }
        }
        let mut reply = [0u8;8];
        stream.read_exact(&mut reply)?;
        if op==proto::OP_READ_SECTOR {
            match &mut payload {
                Some(buf) => stream.read_exact(&mut buf[..])?,
                None => return Err(Box::new(Error::MissingPayload))
            }
        }
        if op==proto::OP_UNMOUNT {
            debug!("closing controller connection");
            self.stream = None;
            self.current_track = None;
        }
        return Ok(u64::from_be_bytes(reply));
    }
}
