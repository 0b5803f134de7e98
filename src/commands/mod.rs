//! # CLI Subcommands
//!
//! Contains modules that run the subcommands.

pub mod run;
pub mod probe;

use std::str::FromStr;
use clap::ArgMatches;
use crate::controller::Controller;
use crate::proto;
use crate::{DYNERR,STDRESULT};

#[derive(thiserror::Error,Debug)]
pub enum CommandError {
    #[error("Command could not be interpreted")]
    InvalidCommand,
    #[error("One of the parameters was out of range")]
    OutOfRange,
    #[error("Script line could not be interpreted")]
    BadScript,
    #[error("Script names a file that was never opened")]
    UnknownFile
}

/// shared handling of the `--addr` and `--port` arguments
fn get_peer(cmd: &ArgMatches) -> Result<(Option<String>,Option<u16>),DYNERR> {
    let addr = cmd.get_one::<String>("addr").cloned();
    let port = match cmd.get_one::<String>("port") {
        Some(s) => match u16::from_str(s) {
            Ok(p) => Some(p),
            Err(_) => return Err(Box::new(CommandError::OutOfRange))
        },
        None => None
    };
    Ok((addr,port))
}

/// run the in-memory controller until the process is interrupted
pub fn serve(cmd: &ArgMatches) -> STDRESULT {
    let port = match cmd.get_one::<String>("port") {
        Some(s) => match u16::from_str(s) {
            Ok(p) => p,
            Err(_) => return Err(Box::new(CommandError::OutOfRange))
        },
        None => proto::DEFAULT_PORT
    };
    let controller = Controller::spawn(port)?;
    println!("controller on port {}, interrupt to stop",controller.port());
    loop {
        std::thread::park();
    }
}
