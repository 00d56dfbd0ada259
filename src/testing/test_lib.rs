// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use std::{fs::File, os::unix::io::AsRawFd};

use nix::ioctl_read;

use crate::{
    core::{DmNameBuf, DmUuidBuf, DM},
    dmsetup::{remove, CommandRunner, SystemRunner},
    result::{DmError, DmResult, ErrorEnum},
    units::Bytes,
};

/// String that is to be concatenated with test supplied name, so that we
/// can easily identify and remove leftover maps.
static DM_TEST_ID: &str = "_dmq_test_delme";

// Get the size of a block device in bytes
ioctl_read!(blkgetsize64, 0x12, 114, u64);

/// Generate the test name given the test supplied name.
pub fn test_name(name: &str) -> DmResult<DmNameBuf> {
    let mut namestr = String::from(name);
    namestr.push_str(DM_TEST_ID);
    DmNameBuf::new(namestr)
}

/// Generate the test uuid given the test supplied name.
pub fn test_uuid(name: &str) -> DmResult<DmUuidBuf> {
    let mut namestr = String::from(name);
    namestr.push_str(DM_TEST_ID);
    DmUuidBuf::new(namestr)
}

/// The size of an open block device.
pub fn blkdev_size(file: &File) -> Bytes {
    let mut val: u64 = 0;

    unsafe { blkgetsize64(file.as_raw_fd(), &mut val) }.unwrap();
    Bytes(u128::from(val))
}

/// Wait for udev to finish processing the events queued so far, so that
/// /dev/mapper links of new maps exist.
pub fn udev_settle() -> DmResult<()> {
    SystemRunner.run(&["udevadm".to_string(), "settle".to_string()])
}

/// Attempt to remove all devicemapper maps whose name contains DM_TEST_ID.
/// A map may be held open by another leftover map, so removal is repeated
/// until no more progress is made.
pub fn clean_up() -> DmResult<()> {
    let dm = DM::new()?;

    loop {
        let mut progress_made = false;
        let mut remain = Vec::new();

        for record in dm
            .list_maps()?
            .iter()
            .filter(|r| r.name().as_str().contains(DM_TEST_ID))
        {
            match remove(&SystemRunner, record.name()) {
                Ok(()) => progress_made = true,
                Err(_) => remain.push(record.name().to_string()),
            }
        }

        if !progress_made {
            if !remain.is_empty() {
                return Err(DmError::Dm(
                    ErrorEnum::Error,
                    format!("unable to remove all test devicemapper maps: {remain:?}"),
                ));
            }
            break;
        }
    }

    Ok(())
}
