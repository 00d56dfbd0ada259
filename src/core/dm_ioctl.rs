// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Layouts and constants from the kernel's `<linux/dm-ioctl.h>`.
//!
//! Only the parts used for listing devices and querying their status are
//! declared here.

use std::fmt::{self, Debug};

use nix::libc::c_char;

use crate::core::util::str_from_c_str;

#[allow(non_camel_case_types)]
pub type __u32 = u32;

pub const DM_NAME_LEN: usize = 128;
pub const DM_UUID_LEN: usize = 129;

/// `_IOC` group code for device mapper ioctls.
pub const DM_IOCTL: u8 = 0xfd;

pub const DM_VERSION_CMD: u8 = 0;
pub const DM_LIST_DEVICES_CMD: u8 = 2;
pub const DM_DEV_STATUS_CMD: u8 = 7;

pub const DM_READONLY_FLAG: __u32 = 1 << 0;
pub const DM_SUSPEND_FLAG: __u32 = 1 << 1;
pub const DM_PERSISTENT_DEV_FLAG: __u32 = 1 << 3;
pub const DM_STATUS_TABLE_FLAG: __u32 = 1 << 4;
pub const DM_ACTIVE_PRESENT_FLAG: __u32 = 1 << 5;
pub const DM_INACTIVE_PRESENT_FLAG: __u32 = 1 << 6;
pub const DM_BUFFER_FULL_FLAG: __u32 = 1 << 8;
pub const DM_SKIP_BDGET_FLAG: __u32 = 1 << 9;
pub const DM_SKIP_LOCKFS_FLAG: __u32 = 1 << 10;
pub const DM_NOFLUSH_FLAG: __u32 = 1 << 11;
pub const DM_QUERY_INACTIVE_TABLE_FLAG: __u32 = 1 << 12;
pub const DM_UEVENT_GENERATED_FLAG: __u32 = 1 << 13;
pub const DM_UUID_FLAG: __u32 = 1 << 14;
pub const DM_SECURE_DATA_FLAG: __u32 = 1 << 15;
pub const DM_DATA_OUT_FLAG: __u32 = 1 << 16;
pub const DM_DEFERRED_REMOVE: __u32 = 1 << 17;
pub const DM_INTERNAL_SUSPEND_FLAG: __u32 = 1 << 18;

/// Offset of `next` within `struct dm_name_list`.
pub const DM_NAME_LIST_NEXT_OFFSET: usize = 8;
/// Offset of the flexible `name` member within `struct dm_name_list`.
/// Not `size_of`: the C struct is padded to 16 bytes but `name` starts
/// right after `next`.
pub const DM_NAME_LIST_NAME_OFFSET: usize = 12;

/// The header of every devicemapper ioctl, in and out.
#[allow(non_camel_case_types)]
#[repr(C)]
#[derive(Clone, Copy)]
pub struct Struct_dm_ioctl {
    pub version: [__u32; 3],
    pub data_size: __u32,
    pub data_start: __u32,
    pub target_count: __u32,
    pub open_count: i32,
    pub flags: __u32,
    pub event_nr: __u32,
    pub padding: __u32,
    pub dev: u64,
    pub name: [c_char; DM_NAME_LEN],
    pub uuid: [c_char; DM_UUID_LEN],
    pub data: [c_char; 7],
}

impl Default for Struct_dm_ioctl {
    fn default() -> Self {
        Struct_dm_ioctl {
            version: [0; 3],
            data_size: 0,
            data_start: 0,
            target_count: 0,
            open_count: 0,
            flags: 0,
            event_nr: 0,
            padding: 0,
            dev: 0,
            name: [0; DM_NAME_LEN],
            uuid: [0; DM_UUID_LEN],
            data: [0; 7],
        }
    }
}

impl Debug for Struct_dm_ioctl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Struct_dm_ioctl")
            .field("version", &self.version)
            .field("data_size", &self.data_size)
            .field("data_start", &self.data_start)
            .field("target_count", &self.target_count)
            .field("open_count", &self.open_count)
            .field("flags", &self.flags)
            .field("event_nr", &self.event_nr)
            .field("dev", &self.dev)
            .field(
                "name",
                &str_from_c_str(&self.name).unwrap_or("Could not parse string"),
            )
            .field(
                "uuid",
                &str_from_c_str(&self.uuid).unwrap_or("Could not parse string"),
            )
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::mem::{align_of, size_of};

    use super::*;

    #[test]
    /// The header must have exactly the kernel's layout.
    fn test_header_layout() {
        assert_eq!(size_of::<Struct_dm_ioctl>(), 312);
        assert_eq!(align_of::<Struct_dm_ioctl>(), 8);
    }
}
