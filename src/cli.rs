use clap::{arg, crate_version, Command};

pub fn build_cli() -> Command {
    let long_help = "remdisk is always invoked with exactly one of several subcommands.
The driver keeps no metadata between invocations; a workload script is the
unit of work against a controller.
Set RUST_LOG environment variable to control logging level.
  levels: trace,debug,info,warn,error

Examples:
---------
local test controller:  `remdisk serve -p 22887`
check a controller:     `remdisk probe -p 22887`
run a workload:         `remdisk run -s workload.txt -p 22887`";

    let mut main_cmd = Command::new("remdisk")
        .about("Drives a remote track/sector store through a file-style interface.")
        .after_long_help(long_help)
        .version(crate_version!());
    main_cmd = main_cmd.subcommand(
        Command::new("probe")
            .arg(arg!(-a --addr <ADDR> "IP address of the controller").required(false))
            .arg(arg!(-p --port <PORT> "port of the controller").required(false))
            .about("mount and unmount to verify a controller answers"),
    );
    main_cmd = main_cmd.subcommand(
        Command::new("run")
            .arg(arg!(-s --script <PATH> "path to the workload script").required(true))
            .arg(arg!(-a --addr <ADDR> "IP address of the controller").required(false))
            .arg(arg!(-p --port <PORT> "port of the controller").required(false))
            .arg(arg!(-c --cache <LINES> "number of sector cache lines").required(false))
            .about("run a workload script against a controller"),
    );
    main_cmd = main_cmd.subcommand(
        Command::new("serve")
            .arg(arg!(-p --port <PORT> "port to listen on").required(false))
            .about("serve an in-memory controller, useful for testing"),
    );
    return main_cmd;
}
