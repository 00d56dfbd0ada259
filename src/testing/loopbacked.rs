// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use std::{
    fs::OpenOptions,
    panic,
    path::{Path, PathBuf},
};

use loopdev::{LoopControl, LoopDevice};
use tempfile::{self, TempDir};

use crate::{
    testing::{logger::init_logger, test_lib::clean_up},
    units::IEC,
};

struct LoopTestDev {
    ld: LoopDevice,
}

impl LoopTestDev {
    fn new(lc: &LoopControl, path: &Path) -> LoopTestDev {
        let ld = lc.next_free().unwrap();
        ld.attach_file(path).unwrap();
        LoopTestDev { ld }
    }

    fn path(&self) -> PathBuf {
        self.ld.path().unwrap()
    }
}

impl Drop for LoopTestDev {
    fn drop(&mut self) {
        self.ld.detach().unwrap()
    }
}

/// Set up count loop devices in dir, each backed by a sparse file of
/// 64 MiB that reads back as zeros.
fn get_devices(count: u8, dir: &TempDir) -> Vec<LoopTestDev> {
    let lc = LoopControl::open().unwrap();

    (0..count)
        .map(|index| {
            let path = dir.path().join(format!("store{index}"));
            let f = OpenOptions::new()
                .read(true)
                .write(true)
                .create(true)
                .truncate(true)
                .open(&path)
                .unwrap();

            nix::unistd::ftruncate(&f, (64 * IEC::Mi) as nix::libc::off_t).unwrap();
            f.sync_all().unwrap();

            LoopTestDev::new(&lc, &path)
        })
        .collect()
}

/// Set up count loopbacked devices.
/// Then, run the designated test.
/// Then, remove leftover test maps and take down the loop devices.
pub fn test_with_spec<F>(count: u8, test: F)
where
    F: Fn(&[&Path]) + panic::RefUnwindSafe,
{
    init_logger();
    clean_up().unwrap();

    let tmpdir = tempfile::Builder::new()
        .prefix("dmquery")
        .tempdir()
        .unwrap();
    let loop_devices = get_devices(count, &tmpdir);
    let device_paths: Vec<PathBuf> = loop_devices.iter().map(|x| x.path()).collect();
    let device_paths: Vec<&Path> = device_paths.iter().map(|x| x.as_path()).collect();

    let result = panic::catch_unwind(|| test(&device_paths));
    let tear_down = clean_up();

    result.unwrap();
    tear_down.unwrap();
}
