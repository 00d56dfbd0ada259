// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Creation and removal of maps with the dmsetup tool.

use std::{path::Path, process::Command};

use crate::{
    core::{errors, DmName, DmUuid},
    result::{DmError, DmResult, ErrorEnum},
    units::Sectors,
};

/// The program used to create and remove maps.
pub const DMSETUP: &str = "dmsetup";

/// Something that can run an external program.
pub trait CommandRunner {
    /// Run `argv`, whose first element is the program. A failure carries
    /// the program's error output unchanged.
    fn run(&self, argv: &[String]) -> DmResult<()>;
}

/// Runs programs as child processes of this one.
#[derive(Debug, Default)]
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
    fn run(&self, argv: &[String]) -> DmResult<()> {
        let (program, args) = argv.split_first().ok_or_else(|| {
            DmError::Core(errors::Error::InvalidArgument(
                "no program to run".to_string(),
            ))
        })?;

        debug!("Running {}", argv.join(" "));
        let output = Command::new(program).args(args).output().map_err(|err| {
            DmError::Core(errors::Error::GeneralIo(format!(
                "failed to run {program}: {err}"
            )))
        })?;

        if output.status.success() {
            Ok(())
        } else {
            let stderr = String::from_utf8_lossy(&output.stderr).into_owned();
            warn!("{} failed ({}): {}", program, output.status, stderr.trim_end());
            Err(DmError::Dm(ErrorEnum::Error, stderr))
        }
    }
}

/// The argument vector that creates a linear map over the first `length`
/// sectors of `device`.
pub fn create_linear_argv(
    name: &DmName,
    device: &Path,
    length: Sectors,
    uuid: Option<&DmUuid>,
) -> Vec<String> {
    let device = device.display().to_string();
    let mut argv = vec![
        DMSETUP.to_string(),
        "create".to_string(),
        name.to_string(),
        "--table".to_string(),
        format!("0 {} linear {} 0", *length, device),
    ];
    if let Some(uuid) = uuid {
        argv.push("-u".to_string());
        argv.push(uuid.to_string());
    }
    argv.push(device);
    argv
}

/// Create a linear map called `name` over the first `length` sectors of
/// `device`, with an optional devicemapper uuid.
pub fn create_linear<R>(
    runner: &R,
    name: &DmName,
    device: &Path,
    length: Sectors,
    uuid: Option<&DmUuid>,
) -> DmResult<()>
where
    R: CommandRunner + ?Sized,
{
    if *length == 0 {
        return Err(DmError::Dm(
            ErrorEnum::Invalid,
            format!("cannot create map {name} with zero length"),
        ));
    }
    runner.run(&create_linear_argv(name, device, length, uuid))?;
    info!("Created linear map {} over {}", name, device.display());
    Ok(())
}

/// Remove the map called `name`.
pub fn remove<R>(runner: &R, name: &DmName) -> DmResult<()>
where
    R: CommandRunner + ?Sized,
{
    runner.run(&[DMSETUP.to_string(), "remove".to_string(), name.to_string()])?;
    info!("Removed map {}", name);
    Ok(())
}
