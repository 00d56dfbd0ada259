// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use std::process::exit;

use clap::{Parser, Subcommand};

use dmquery::{
    get_member_raid_sets, map_exists, name_from_node, node_from_name, DevId, DeviceSpec,
    DmNameBuf, DmOptions, DmResult, SYSTEM_PATHS, DM,
};

#[derive(Debug, Parser)]
#[command(name = "dmquery")]
#[command(about = "Query devicemapper maps and software RAID set membership")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Print the version of the devicemapper ioctl interface
    Version,
    /// List all maps
    List,
    /// Exit with status 1 unless the map exists
    Exists {
        #[arg(value_parser = parse_name)]
        name: DmNameBuf,
        /// The map must have a live table
        #[arg(long)]
        live: bool,
        /// The map must not be suspended
        #[arg(long)]
        active: bool,
    },
    /// Print the status of a map
    Info {
        #[arg(value_parser = parse_name)]
        name: DmNameBuf,
    },
    /// Print the name of the map behind a kernel device node, e.g. dm-0
    Name { node: String },
    /// Print the kernel device node of a map
    Node {
        #[arg(value_parser = parse_name)]
        name: DmNameBuf,
    },
    /// Print the RAID sets that matching devices are members of
    Raid {
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        uuid: Option<String>,
        #[arg(long)]
        major: Option<u32>,
        #[arg(long)]
        minor: Option<u32>,
    },
}

fn parse_name(value: &str) -> Result<DmNameBuf, String> {
    DmNameBuf::new(value.to_string()).map_err(|err| err.to_string())
}

fn raid_spec(
    name: Option<&str>,
    uuid: Option<&str>,
    major: Option<u32>,
    minor: Option<u32>,
) -> DeviceSpec {
    let mut spec = DeviceSpec::new();
    if let Some(name) = name {
        spec = spec.name(name);
    }
    if let Some(uuid) = uuid {
        spec = spec.uuid(uuid);
    }
    if let Some(major) = major {
        spec = spec.major(major);
    }
    if let Some(minor) = minor {
        spec = spec.minor(minor);
    }
    spec
}

/// Run the command, the result is the exit status.
fn run(command: &Command) -> DmResult<i32> {
    match command {
        Command::Version => {
            let (major, minor, patch) = DM::new()?.version()?;
            println!("{major}.{minor}.{patch}");
        }
        Command::List => {
            for record in DM::new()?.list_maps()? {
                match record.event_nr() {
                    Some(event_nr) => {
                        println!("{}\t{}\t{}", record.name(), record.device(), event_nr)
                    }
                    None => println!("{}\t{}", record.name(), record.device()),
                }
            }
        }
        Command::Exists { name, live, active } => {
            if !map_exists(name, *live, *active)? {
                return Ok(1);
            }
        }
        Command::Info { name } => {
            let info = DM::new()?.device_info(&DevId::Name(&**name), &DmOptions::new())?;
            println!("{info:#?}");
        }
        Command::Name { node } => println!("{}", name_from_node(&SYSTEM_PATHS, node)?),
        Command::Node { name } => println!("{}", node_from_name(&SYSTEM_PATHS, name)?),
        Command::Raid {
            name,
            uuid,
            major,
            minor,
        } => {
            let spec = raid_spec(name.as_deref(), uuid.as_deref(), *major, *minor);
            for set in get_member_raid_sets(&spec)? {
                println!("{set}");
            }
        }
    }
    Ok(0)
}

fn main() {
    env_logger::init();

    let cli = Cli::parse();
    match run(&cli.command) {
        Ok(status) => exit(status),
        Err(err) => {
            eprintln!("dmquery: {err}");
            exit(2);
        }
    }
}
