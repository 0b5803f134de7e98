//! # Workload Runner
//!
//! Executes a script of file operations against a controller.  The disk is
//! mounted before the first operation and unmounted after the last; cache
//! metrics are logged on the way out.  One operation per line, blank lines
//! and `#` comments allowed:
//!
//! ```text
//! open notes.txt
//! write notes.txt HELLO WORLD\x0D
//! seek notes.txt 6
//! read notes.txt 5
//! close notes.txt
//! metrics
//! ```
//!
//! Files are named by path; the runner remembers the handle each `open`
//! returned.  A `write` payload runs to the end of the line and is parsed as
//! escaped ascii (`\xNN` introduces arbitrary bytes); `read` prints the bytes
//! it got in the same notation.

use std::collections::HashMap;
use std::str::FromStr;
use clap::ArgMatches;
use log::error;
use crate::cache;
use crate::cache::SectorCache;
use crate::driver::Driver;
use crate::net::Session;
use super::CommandError;
use crate::{escaped_ascii_from_bytes,escaped_ascii_to_bytes,STDRESULT};

pub fn run(cmd: &ArgMatches) -> STDRESULT {
    let script_path = match cmd.get_one::<String>("script") {
        Some(s) => s,
        None => return Err(Box::new(CommandError::InvalidCommand))
    };
    let (addr,port) = super::get_peer(cmd)?;
    let lines = match cmd.get_one::<String>("cache") {
        Some(s) => match usize::from_str(s) {
            Ok(n) => n,
            Err(_) => return Err(Box::new(CommandError::OutOfRange))
        },
        None => cache::DEFAULT_LINES
    };
    let script = std::fs::read_to_string(script_path)?;

    let mut drv = Driver::new(Session::new(addr,port),SectorCache::new(lines)?);
    let mut handles: HashMap<String,u16> = HashMap::new();
    drv.mount()?;
    for (num,line) in script.lines().enumerate() {
        let line = line.trim();
        if line.len()==0 || line.starts_with("#") {
            continue;
        }
        if let Err(e) = exec_line(&mut drv,&mut handles,line) {
            error!("script line {} failed",num+1);
            // the session may already be gone, but give the controller its unmount
            drv.unmount().ok();
            return Err(e);
        }
    }
    drv.log_cache_metrics();
    drv.unmount()?;
    Ok(())
}

fn lookup(handles: &HashMap<String,u16>,name: &str) -> Result<u16,crate::DYNERR> {
    match handles.get(name) {
        Some(fd) => Ok(*fd),
        None => Err(Box::new(CommandError::UnknownFile))
    }
}

fn exec_line(drv: &mut Driver,handles: &mut HashMap<String,u16>,line: &str) -> STDRESULT {
    let mut words = line.splitn(3,' ');
    let verb = words.next().unwrap_or("");
    let name = words.next();
    let rest = words.next();
    match (verb,name,rest) {
        ("open",Some(path),None) => {
            let fd = drv.open(path)?;
            handles.insert(path.to_string(),fd);
            Ok(())
        },
        ("close",Some(path),None) => {
            drv.close(lookup(handles,path)?)
        },
        ("seek",Some(path),Some(loc)) => {
            match usize::from_str(loc.trim()) {
                Ok(loc) => drv.seek(lookup(handles,path)?,loc),
                Err(_) => Err(Box::new(CommandError::BadScript))
            }
        },
        ("write",Some(path),Some(payload)) => {
            let bytes = escaped_ascii_to_bytes(payload);
            drv.write(lookup(handles,path)?,&bytes,bytes.len())?;
            Ok(())
        },
        ("read",Some(path),Some(count)) => {
            let count = match usize::from_str(count.trim()) {
                Ok(n) => n,
                Err(_) => return Err(Box::new(CommandError::BadScript))
            };
            let mut buf: Vec<u8> = vec![0;count];
            let n = drv.read(lookup(handles,path)?,&mut buf,count)?;
            println!("{}",escaped_ascii_from_bytes(&buf[0..n]));
            Ok(())
        },
        ("metrics",None,None) => {
            drv.log_cache_metrics();
            Ok(())
        },
        _ => Err(Box::new(CommandError::BadScript))
    }
}
