//! # Controller Probe
//!
//! One mount/unmount round trip, just enough to tell a live controller from
//! a dead socket.

use clap::ArgMatches;
use crate::cache;
use crate::cache::SectorCache;
use crate::driver::Driver;
use crate::net::Session;
use crate::STDRESULT;

pub fn probe(cmd: &ArgMatches) -> STDRESULT {
    let (addr,port) = super::get_peer(cmd)?;
    let mut drv = Driver::new(Session::new(addr,port),SectorCache::new(cache::DEFAULT_LINES)?);
    drv.mount()?;
    drv.unmount()?;
    println!("controller answered the mount round trip");
    Ok(())
}
