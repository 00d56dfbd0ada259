// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Translation between devicemapper map names and kernel device nodes,
//! using the files the kernel and udev publish under sysfs and /dev.

use std::{
    fs,
    io::ErrorKind,
    path::{Path, PathBuf},
};

use once_cell::sync::Lazy;

use crate::{
    core::{errors, DmName, DmNameBuf},
    result::{DmError, DmResult, ErrorEnum},
};

/// The filesystem roots that device information is read from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SysPaths {
    sysfs: PathBuf,
    dev: PathBuf,
}

impl Default for SysPaths {
    fn default() -> SysPaths {
        SysPaths::new("/sys", "/dev")
    }
}

/// The roots of the running system.
pub static SYSTEM_PATHS: Lazy<SysPaths> = Lazy::new(SysPaths::default);

impl SysPaths {
    /// Roots for sysfs and the device directory.
    pub fn new<P, Q>(sysfs: P, dev: Q) -> SysPaths
    where
        P: Into<PathBuf>,
        Q: Into<PathBuf>,
    {
        SysPaths {
            sysfs: sysfs.into(),
            dev: dev.into(),
        }
    }

    /// Where sysfs is mounted.
    pub fn sysfs(&self) -> &Path {
        &self.sysfs
    }

    /// The device directory.
    pub fn dev(&self) -> &Path {
        &self.dev
    }

    /// The sysfs directory of the block device with kernel name `node`.
    pub fn block_dir(&self, node: &str) -> PathBuf {
        [self.sysfs.as_path(), Path::new("class/block"), Path::new(node)]
            .iter()
            .collect()
    }
}

/// Read a sysfs attribute, trimmed of surrounding whitespace.
pub fn read_attr(path: &Path) -> DmResult<String> {
    fs::read_to_string(path)
        .map(|s| s.trim().to_string())
        .map_err(|err| {
            DmError::Core(errors::Error::MetadataIo(
                path.to_owned(),
                err.to_string(),
            ))
        })
}

/// The name of the map that provides the kernel device `node`, e.g.
/// "dm-0".
pub fn name_from_node(paths: &SysPaths, node: &str) -> DmResult<DmNameBuf> {
    if node.is_empty() || node.contains('/') {
        return Err(DmError::Dm(
            ErrorEnum::Invalid,
            format!("\"{node}\" is not a kernel device name"),
        ));
    }

    let path = paths.block_dir(node).join("dm/name");
    let name = match fs::read_to_string(&path) {
        Ok(name) => name,
        Err(err) if err.kind() == ErrorKind::NotFound => {
            debug!("{} does not exist", path.display());
            return Err(DmError::Dm(
                ErrorEnum::NotFound,
                "Failed to access dm node's parameters under /sys".into(),
            ));
        }
        Err(err) => {
            return Err(DmError::Core(errors::Error::MetadataIo(
                path,
                err.to_string(),
            )))
        }
    };

    DmNameBuf::new(name.trim().to_string())
}

/// The kernel device name, e.g. "dm-0", of the map called `name`.
pub fn node_from_name(paths: &SysPaths, name: &DmName) -> DmResult<String> {
    let path = paths.dev().join("mapper").join(name.as_str());
    let target = match fs::read_link(&path) {
        Ok(target) => target,
        Err(err) if err.kind() == ErrorKind::NotFound => {
            return Err(DmError::Dm(
                ErrorEnum::NotFound,
                format!("No map link {}", path.display()),
            ));
        }
        Err(err) => {
            return Err(DmError::Core(errors::Error::MetadataIo(
                path,
                err.to_string(),
            )))
        }
    };

    target
        .file_name()
        .and_then(|f| f.to_str())
        .map(|f| f.trim().to_string())
        .filter(|f| !f.is_empty())
        .ok_or_else(|| {
            DmError::Core(errors::Error::MetadataIo(
                path,
                format!("link target {} has no device name", target.display()),
            ))
        })
}
