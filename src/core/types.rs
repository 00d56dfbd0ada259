// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use std::{fmt, ops::Deref};

use crate::{
    core::{
        dm_ioctl::{DM_NAME_LEN, DM_UUID_LEN},
        errors,
    },
    result::DmError,
};

/// An error function to construct an error when creating a new string id.
fn err_func(err_msg: &str) -> DmError {
    DmError::Core(errors::Error::InvalidArgument(err_msg.into()))
}

/// Map names become entries of /dev/mapper and may not contain a path
/// separator. The kernel allows one in a uuid.
fn no_path_separator(value: &str) -> Option<String> {
    value
        .contains('/')
        .then(|| format!("value {value} contains a path separator"))
}

str_id!(DmName, DmNameBuf, DM_NAME_LEN, err_func, no_path_separator);
str_id!(DmUuid, DmUuidBuf, DM_UUID_LEN, err_func);

/// Used as a parameter for functions that take either a Device name
/// or a Device UUID.
#[derive(Debug, PartialEq, Eq)]
pub enum DevId<'a> {
    /// The parameter is the device's name
    Name(&'a DmName),
    /// The parameter is the device's devicemapper uuid
    Uuid(&'a DmUuid),
}

impl fmt::Display for DevId<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            DevId::Name(name) => write!(f, "{name}"),
            DevId::Uuid(uuid) => write!(f, "{uuid}"),
        }
    }
}
