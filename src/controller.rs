//! # Controller Test Double Module
//!
//! A wire-compatible in-memory controller.  This is not a component of the
//! driver; it exists so the integration tests and the `serve` subcommand have
//! a real socket to talk to.  Each connection gets its own current track,
//! moved only by `TRACK_SEEK`; sector transfers resolve against it, ignoring
//! the track field of the command block just as the real device does.  Sector
//! contents are shared across connections and reads of never-written sectors
//! come back zero filled.
//!
//! The controller counts every operation it serves.  Tests lean on this to
//! check what actually crossed the wire, e.g., that the cache elides reads or
//! that the track shadow elides seeks.

use std::collections::HashMap;
use std::io::{Read,Write};
use std::net::{TcpListener,TcpStream};
use std::sync::{Arc,Mutex};
use log::{debug,info,warn};
use crate::proto;
use crate::proto::{SectorBuf,SECTOR_SIZE};
use crate::DYNERR;

/// Running totals of operations served, over all connections.
#[derive(Clone,Copy,Default)]
pub struct OpCounts {
    pub mounts: u64,
    pub seeks: u64,
    pub reads: u64,
    pub writes: u64,
    pub unmounts: u64
}

type SectorStore = HashMap<(u32,u16),SectorBuf>;

/// Handle to a controller serving on a background thread.
/// Dropping the handle does not stop the listener; this is test scaffolding,
/// not a daemon, and it lives until the process ends.
pub struct Controller {
    port: u16,
    counts: Arc<Mutex<OpCounts>>,
    store: Arc<Mutex<SectorStore>>
}

impl Controller {
    /// Bind to `port` on the loopback interface (0 picks a free port) and
    /// serve connections on background threads.
    pub fn spawn(port: u16) -> Result<Self,DYNERR> {
        let listener = TcpListener::bind(("127.0.0.1",port))?;
        let port = listener.local_addr()?.port();
        let counts: Arc<Mutex<OpCounts>> = Arc::new(Mutex::new(OpCounts::default()));
        let store: Arc<Mutex<SectorStore>> = Arc::new(Mutex::new(HashMap::new()));
        let thread_counts = Arc::clone(&counts);
        let thread_store = Arc::clone(&store);
        std::thread::spawn(move || {
            for stream in listener.incoming() {
                match stream {
                    Ok(s) => {
                        let counts = Arc::clone(&thread_counts);
                        let store = Arc::clone(&thread_store);
                        std::thread::spawn(move || {
                            if let Err(e) = serve_connection(s,counts,store) {
                                warn!("connection ended abnormally: {}",e);
                            }
                        });
                    },
                    Err(e) => {
                        warn!("accept failed: {}",e);
                        return;
                    }
                }
            }
        });
        info!("controller listening on port {}",port);
        Ok(Self {
            port,
            counts,
            store
        })
    }
    pub fn port(&self) -> u16 {
        self.port
    }
    pub fn counts(&self) -> OpCounts {
        *self.counts.lock().expect("lock poisoned")
    }
    /// contents of a sector, if it was ever written
    pub fn sector(&self,track: u32,sector: u16) -> Option<SectorBuf> {
        self.store.lock().expect("lock poisoned").get(&(track,sector)).copied()
    }
}

fn serve_connection(mut stream: TcpStream,counts: Arc<Mutex<OpCounts>>,store: Arc<Mutex<SectorStore>>) -> Result<(),DYNERR> {
    let mut current_track: u32 = 0;
    loop {
        let mut word = [0u8;8];
        if let Err(e) = stream.read_exact(&mut word) {
            // the peer hanging up is the normal end of a session that was never unmounted
            debug!("connection closed: {}",e);
            return Ok(());
        }
        let (op,sector,track,_ret) = proto::unpack(u64::from_be_bytes(word));
        let reply = proto::pack(op,sector,track,0);
        match op {
            proto::OP_MOUNT => {
                counts.lock().expect("lock poisoned").mounts += 1;
                stream.write_all(&u64::to_be_bytes(reply))?;
            },
            proto::OP_TRACK_SEEK => {
                counts.lock().expect("lock poisoned").seeks += 1;
                current_track = track;
                stream.write_all(&u64::to_be_bytes(reply))?;
            },
            proto::OP_READ_SECTOR => {
                counts.lock().expect("lock poisoned").reads += 1;
                let data = match store.lock().expect("lock poisoned").get(&(current_track,sector)) {
                    Some(buf) => *buf,
                    None => [0;SECTOR_SIZE]
                };
                stream.write_all(&u64::to_be_bytes(reply))?;
                stream.write_all(&data)?;
            },
            proto::OP_WRITE_SECTOR => {
                let mut data: SectorBuf = [0;SECTOR_SIZE];
                stream.read_exact(&mut data)?;
                counts.lock().expect("lock poisoned").writes += 1;
                store.lock().expect("lock poisoned").insert((current_track,sector),data);
                stream.write_all(&u64::to_be_bytes(reply))?;
            },
            proto::OP_UNMOUNT => {
                counts.lock().expect("lock poisoned").unmounts += 1;
                stream.write_all(&u64::to_be_bytes(reply))?;
                return Ok(());
            },
            _ => {
                warn!("refusing unknown op {}",op);
                stream.write_all(&u64::to_be_bytes(proto::pack(op,sector,track,1)))?;
            }
        }
    }
}
