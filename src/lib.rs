// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Queries of the devicemapper maps and software RAID sets of the running
//! kernel.
//!
//! # Overview
//!
//! Linux's devicemapper allows the creation of block devices, called maps,
//! whose storage is mapped to other block devices. Software RAID stacks
//! block devices too: the member devices of a RAID set are combined into a
//! single array device, and firmware RAID containers group several such
//! arrays. This crate answers questions about the identity of devices
//! across these layers:
//!
//! * Does a map with a given name exist, optionally with a live table and
//!   not suspended? (`map_exists`)
//! * Which RAID sets is a device, described by name, UUID, or device
//!   number, a member of? (`get_member_raid_sets`)
//! * What is the name of the map behind a kernel device node such as
//!   "dm-0", and the other way around? (`name_from_node`, `node_from_name`)
//!
//! It can also create and remove simple linear maps using the dmsetup tool
//! (`create_linear`, `remove`).
//!
//! # Usage
//!
//! Map queries talk to the kernel through the devicemapper control device
//! and require root. Every query looks at the state of the system at the
//! time of the call; nothing is cached between calls.

#![warn(missing_docs)]

#[macro_use]
extern crate bitflags;
#[macro_use]
extern crate log;

#[cfg(test)]
#[macro_use]
extern crate assert_matches;

/// Macros for DM identifier types
#[macro_use]
mod id_macros;
/// Macros for unit newtypes
#[macro_use]
mod range_macros;

/// core lower level API
mod core;
/// creation and removal of maps with dmsetup
mod dmsetup;
/// existence queries for maps
mod maps;
/// RAID set membership
mod raid;
/// return results container
mod result;
/// translation between map names and device nodes
mod sysfs;
/// basic types (Bytes, Sectors)
mod units;

#[cfg(test)]
mod testing;

pub use crate::{
    core::{
        errors, parse_device, DevId, Device, DeviceInfo, DmFlags, DmName, DmNameBuf, DmOptions,
        DmUuid, DmUuidBuf, MapRecord, DM,
    },
    dmsetup::{create_linear, create_linear_argv, remove, CommandRunner, SystemRunner, DMSETUP},
    maps::{
        check_euid, check_root, is_query_infra_error, map_exists, map_exists_in, MapInfo,
        MapSource,
    },
    raid::{
        get_member_raid_sets, member_raid_sets, member_raid_sets_at, DeviceProperties,
        DevicePropertyLookup, DeviceSpec, MdRaidContext, RaidDevice, RaidDiscovery, RaidSet,
        UdevProperties,
    },
    result::{DmError, DmResult, ErrorEnum},
    sysfs::{name_from_node, node_from_name, read_attr, SysPaths, SYSTEM_PATHS},
    units::{Bytes, Sectors, IEC, SECTOR_SIZE},
};
