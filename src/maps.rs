// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Existence queries for devicemapper maps.

use nix::{
    errno::Errno,
    unistd::{geteuid, Uid},
};

use crate::{
    core::{
        errors, DevId, Device, DeviceInfo, DmFlags, DmName, DmNameBuf, DmOptions, MapRecord, DM,
    },
    result::{DmError, DmResult, ErrorEnum},
};

/// The status of a single map, fetched fresh for every query.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MapInfo {
    /// The kernel knows a map by this name.
    pub exists: bool,
    /// The map has a live (active) table.
    pub live_table: bool,
    /// The map has a table loaded into its inactive slot.
    pub inactive_table: bool,
    /// I/O to the map is being held.
    pub suspended: bool,
    /// The map is read-only.
    pub read_only: bool,
    /// The number of times the map is currently open.
    pub open_count: i32,
    /// The last event number of the map.
    pub event_nr: u32,
    /// The map's device number, if it exists.
    pub device: Option<Device>,
}

impl MapInfo {
    /// The info of a map that the kernel does not know about.
    pub fn absent() -> MapInfo {
        MapInfo::default()
    }

    /// Whether the map satisfies the given state constraints. A map that
    /// does not exist never does.
    pub fn satisfies(&self, live_only: bool, active_only: bool) -> bool {
        if !self.exists {
            return false;
        }
        let mut ret = true;
        if live_only {
            ret = self.live_table;
        }
        if active_only {
            ret = ret && !self.suspended;
        }
        ret
    }
}

impl From<&DeviceInfo> for MapInfo {
    fn from(info: &DeviceInfo) -> MapInfo {
        let flags = info.flags();
        MapInfo {
            exists: true,
            live_table: flags.contains(DmFlags::DM_ACTIVE_PRESENT),
            inactive_table: flags.contains(DmFlags::DM_INACTIVE_PRESENT),
            suspended: flags.contains(DmFlags::DM_SUSPEND),
            read_only: flags.contains(DmFlags::DM_READONLY),
            open_count: info.open_count(),
            event_nr: info.event_nr(),
            device: Some(info.device()),
        }
    }
}

/// A provider of the live list of maps and of per-map status.
pub trait MapSource {
    /// Every map currently registered, in the order the provider lists
    /// them.
    fn map_names(&self) -> DmResult<Vec<DmNameBuf>>;

    /// The current status of the named map. A map that disappeared is
    /// reported as absent, only failures of the query itself are errors.
    fn map_info(&self, name: &DmName) -> DmResult<MapInfo>;
}

impl DM {
    /// All live maps.
    pub fn list_maps(&self) -> DmResult<Vec<MapRecord>> {
        self.list_devices()
    }

    /// The status of the map called `name`.
    pub fn map_info(&self, name: &DmName) -> DmResult<MapInfo> {
        match self.device_info(&DevId::Name(name), &DmOptions::new()) {
            Ok(info) => Ok(MapInfo::from(&info)),
            // The map went away between listing and querying it.
            Err(DmError::Core(ref err)) if err.ioctl_errno() == Some(Errno::ENXIO) => {
                Ok(MapInfo::absent())
            }
            Err(err) => Err(err),
        }
    }
}

impl MapSource for DM {
    fn map_names(&self) -> DmResult<Vec<DmNameBuf>> {
        Ok(self
            .list_maps()?
            .into_iter()
            .map(|record| record.name().to_owned())
            .collect())
    }

    fn map_info(&self, name: &DmName) -> DmResult<MapInfo> {
        DM::map_info(self, name)
    }
}

/// Whether `source` lists a map called `name` that satisfies the state
/// constraints.
///
/// Every listed map with exactly this name is checked in listing order,
/// the first one to satisfy the constraints settles the query. If
/// `live_only` is set the map must have a live table, if `active_only` is
/// set it must not be suspended. Absence is `Ok(false)`; an error fetching
/// the status of a candidate aborts the query.
pub fn map_exists_in<S>(
    source: &S,
    name: &DmName,
    live_only: bool,
    active_only: bool,
) -> DmResult<bool>
where
    S: MapSource + ?Sized,
{
    let names = source.map_names()?;
    if names.is_empty() {
        debug!("No devicemapper maps found while looking for {}", name);
        return Ok(false);
    }

    for candidate in names.iter().filter(|candidate| &***candidate == name) {
        let info = source.map_info(candidate)?;
        if !info.exists {
            debug!("Map {} was listed but no longer exists", candidate);
            continue;
        }
        if info.satisfies(live_only, active_only) {
            return Ok(true);
        }
        debug!(
            "Map {} exists but does not satisfy constraints live_only={}, active_only={}: {:?}",
            candidate, live_only, active_only, info
        );
    }

    Ok(false)
}

/// Fail unless `euid` is root.
pub fn check_euid(euid: Uid, operation: &str) -> DmResult<()> {
    if euid.is_root() {
        Ok(())
    } else {
        Err(DmError::Dm(
            ErrorEnum::PermissionDenied,
            format!("Not running as root, cannot {operation}"),
        ))
    }
}

/// Fail unless running with an effective uid of root.
pub fn check_root(operation: &str) -> DmResult<()> {
    check_euid(geteuid(), operation)
}

/// Check `euid`, then query the source that `open` provides.
fn map_exists_as<S, F>(
    euid: Uid,
    open: F,
    name: &DmName,
    live_only: bool,
    active_only: bool,
) -> DmResult<bool>
where
    S: MapSource,
    F: FnOnce() -> DmResult<S>,
{
    check_euid(euid, "query DM maps")?;

    let source = open().map_err(|err| {
        warn!("Failed to open devicemapper control device: {}", err);
        err
    })?;
    map_exists_in(&source, name, live_only, active_only)
}

/// Whether a live map called `name` exists on this system.
///
/// See `map_exists_in` for the meaning of the constraints. Requires root;
/// the privilege check is made before the devicemapper control device is
/// opened.
///
/// ```no_run
/// use dmquery::{map_exists, DmName};
///
/// let name = DmName::new("vg-lv1").expect("is valid DM name");
/// if map_exists(name, true, true).unwrap() {
///     println!("{name} is live and active");
/// }
/// ```
pub fn map_exists(name: &DmName, live_only: bool, active_only: bool) -> DmResult<bool> {
    map_exists_as(geteuid(), DM::new, name, live_only, active_only)
}

/// True if the error is a failure of the devicemapper query machinery
/// itself, rather than a property of the queried map.
pub fn is_query_infra_error(err: &DmError) -> bool {
    matches!(
        err,
        DmError::Core(
            errors::Error::ContextInit(_)
                | errors::Error::Ioctl(..)
                | errors::Error::IoctlResultTooLarge
                | errors::Error::MalformedResult(_)
        )
    )
}
