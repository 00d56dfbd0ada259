// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Resolution of the software RAID sets a device is a member of.
//!
//! The RAID topology of the system is discovered afresh for every query,
//! as a forest of sets. A set either groups other sets, as a firmware RAID
//! container groups the arrays defined in it, or holds member devices.
//! The query reports the name of every device-holding set once for each
//! of its member devices that fits a `DeviceSpec`.

mod discovery;
mod properties;
mod spec;
mod topology;

pub use self::{
    discovery::{MdRaidContext, RaidDiscovery},
    properties::{DeviceProperties, DevicePropertyLookup, UdevProperties},
    spec::DeviceSpec,
    topology::{RaidDevice, RaidSet},
};

use crate::{
    result::{DmError, DmResult, ErrorEnum},
    sysfs::{SysPaths, SYSTEM_PATHS},
};

/// The names of the RAID sets that have a member device fitting `spec`,
/// using the discovery steps of `ctx` and the device properties of
/// `lookup`.
///
/// A set is named once for every fitting member, so a name may appear more
/// than once. An empty result is not an error; finding no RAID devices at
/// all is.
pub fn member_raid_sets<D, L>(ctx: &mut D, spec: &DeviceSpec, lookup: &L) -> DmResult<Vec<String>>
where
    D: RaidDiscovery + ?Sized,
    L: DevicePropertyLookup + ?Sized,
{
    if spec.is_unconstrained() {
        warn!("No name, uuid, or device number given, every RAID member device will match");
    }

    ctx.discover_devices().map_err(|err| {
        DmError::Dm(
            ErrorEnum::Discovery,
            format!("Failed to discover devices: {err}"),
        )
    })?;
    ctx.discover_raid_devices();

    if ctx.raid_device_count() == 0 {
        return Err(DmError::Dm(
            ErrorEnum::NoRaidFound,
            "No RAIDs discovered".into(),
        ));
    }

    let roots = ctx.group_sets().map_err(|err| {
        DmError::Dm(
            ErrorEnum::Grouping,
            format!("Failed to group RAID sets: {err}"),
        )
    })?;

    let mut found = Vec::new();
    for set in &roots {
        set.collect_matching(spec, lookup, &mut found);
    }
    debug!("Devices matching {} are members of {:?}", spec, found);
    Ok(found)
}

/// The names of the MD RAID sets that have a member device fitting `spec`,
/// on the system whose files are rooted at `paths`, with device properties
/// from `lookup`.
pub fn member_raid_sets_at<L>(
    paths: &SysPaths,
    spec: &DeviceSpec,
    lookup: &L,
) -> DmResult<Vec<String>>
where
    L: DevicePropertyLookup + ?Sized,
{
    let mut ctx = MdRaidContext::new(paths);
    member_raid_sets(&mut ctx, spec, lookup)
}

/// The names of the MD RAID sets of the running system that have a member
/// device fitting `spec`.
///
/// ```no_run
/// use dmquery::{get_member_raid_sets, DeviceSpec};
///
/// let sets = get_member_raid_sets(&DeviceSpec::new().name("sda1")).unwrap();
/// println!("sda1 is a member of {sets:?}");
/// ```
pub fn get_member_raid_sets(spec: &DeviceSpec) -> DmResult<Vec<String>> {
    member_raid_sets_at(&SYSTEM_PATHS, spec, &UdevProperties::new())
}
