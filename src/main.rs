//! # Command Line Interface
//!
//! Dispatch commands to `commands` module.

use env_logger;
use remdisk::commands;
use remdisk::commands::CommandError;
mod cli;

fn main() -> Result<(),Box<dyn std::error::Error>>
{
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let main_cmd = cli::build_cli();
    let matches = main_cmd.get_matches();

    // Verify a controller answers

    if let Some(cmd) = matches.subcommand_matches("probe") {
        return commands::probe::probe(cmd);
    }

    // Run a workload script

    if let Some(cmd) = matches.subcommand_matches("run") {
        return commands::run::run(cmd);
    }

    // Serve the in-memory controller

    if let Some(cmd) = matches.subcommand_matches("serve") {
        return commands::serve(cmd);
    }

    log::error!("No subcommand was found, try `remdisk --help`");
    return Err(Box::new(CommandError::InvalidCommand));
}
