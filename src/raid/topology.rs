// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use std::path::{Path, PathBuf};

use crate::raid::{properties::DevicePropertyLookup, spec::DeviceSpec};

/// A member device of a RAID set.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RaidDevice {
    path: PathBuf,
}

impl RaidDevice {
    /// A member device with the given device path, e.g. "/dev/sda1".
    pub fn new<P: Into<PathBuf>>(path: P) -> RaidDevice {
        RaidDevice { path: path.into() }
    }

    /// The device path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The part of the path after its second separator: "sda1" for
    /// "/dev/sda1". None if there is no such part or it is empty.
    pub fn bare_name(&self) -> Option<&str> {
        let mut parts = self.path.to_str()?.splitn(3, '/');
        parts.next()?;
        parts.next()?;
        parts.next().filter(|name| !name.is_empty())
    }
}

/// A node of the RAID topology.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RaidSet {
    name: String,
    group: bool,
    subsets: Vec<RaidSet>,
    devices: Vec<RaidDevice>,
}

impl RaidSet {
    /// A set whose members are devices.
    pub fn with_devices(name: &str, devices: Vec<RaidDevice>) -> RaidSet {
        RaidSet {
            name: name.to_string(),
            group: false,
            subsets: Vec::new(),
            devices,
        }
    }

    /// A grouping set whose members are other sets.
    pub fn group(name: &str, subsets: Vec<RaidSet>) -> RaidSet {
        RaidSet {
            name: name.to_string(),
            group: true,
            subsets,
            devices: Vec::new(),
        }
    }

    /// Mark this set as a grouping set even if it has no subsets.
    pub fn set_group(&mut self, group: bool) {
        self.group = group;
    }

    /// Add a subset, after those already present.
    pub fn push_subset(&mut self, subset: RaidSet) {
        self.subsets.push(subset);
    }

    /// The set's name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether the set groups other sets rather than holding devices.
    pub fn is_group(&self) -> bool {
        self.group || !self.subsets.is_empty()
    }

    /// The subsets, in discovery order.
    pub fn subsets(&self) -> &[RaidSet] {
        &self.subsets
    }

    /// The member devices, in discovery order.
    pub fn devices(&self) -> &[RaidDevice] {
        &self.devices
    }

    /// Append to `found` the name of every leaf-bearing set in this tree
    /// once for each of its devices that matches `spec`.
    pub fn collect_matching<L>(&self, spec: &DeviceSpec, lookup: &L, found: &mut Vec<String>)
    where
        L: DevicePropertyLookup + ?Sized,
    {
        if self.is_group() {
            for subset in &self.subsets {
                subset.collect_matching(spec, lookup, found);
            }
        } else {
            for device in &self.devices {
                if spec.matches(device, lookup) {
                    trace!("{} in set {} matches {}", device.path().display(), self.name, spec);
                    found.push(self.name.clone());
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::raid::properties::DeviceProperties;

    use super::*;

    struct NoDevices;

    impl DevicePropertyLookup for NoDevices {
        fn properties(&self, _: &str) -> Option<DeviceProperties> {
            None
        }
    }

    #[test]
    fn test_bare_name() {
        assert_eq!(RaidDevice::new("/dev/sda1").bare_name(), Some("sda1"));
        assert_eq!(
            RaidDevice::new("/dev/mapper/isw_raid").bare_name(),
            Some("mapper/isw_raid")
        );
        assert_eq!(RaidDevice::new("//x").bare_name(), Some("x"));
        assert_eq!(RaidDevice::new("/dev/").bare_name(), None);
        assert_eq!(RaidDevice::new("/sda1").bare_name(), None);
    }

    #[test]
    /// Group sets are recursed into in order; devices of a flagged group
    /// are never visited; duplicates are kept.
    fn test_collect_matching() {
        let mut container = RaidSet::with_devices(
            "md127",
            vec![RaidDevice::new("/dev/sdc"), RaidDevice::new("/dev/sdd")],
        );
        container.set_group(true);
        container.push_subset(RaidSet::with_devices(
            "md126",
            vec![RaidDevice::new("/dev/sdc"), RaidDevice::new("/dev/sdd")],
        ));
        let native = RaidSet::with_devices(
            "md0",
            vec![RaidDevice::new("/dev/sda1"), RaidDevice::new("/dev/sdb1")],
        );
        let empty_group = RaidSet::group("md125", Vec::new());

        let mut found = Vec::new();
        for set in [&container, &native, &empty_group] {
            set.collect_matching(&DeviceSpec::new(), &NoDevices, &mut found);
        }
        assert_eq!(found, vec!["md126", "md126", "md0", "md0"]);

        let mut found = Vec::new();
        container.collect_matching(&DeviceSpec::new().name("sdd"), &NoDevices, &mut found);
        assert_eq!(found, vec!["md126"]);
    }

    #[test]
    /// A set that is not flagged but has subsets is still a group.
    fn test_implicit_group() {
        let mut set = RaidSet::with_devices("outer", vec![RaidDevice::new("/dev/sda")]);
        assert!(!set.is_group());
        set.push_subset(RaidSet::with_devices("inner", vec![RaidDevice::new("/dev/sdb")]));
        assert!(set.is_group());

        let mut found = Vec::new();
        set.collect_matching(&DeviceSpec::new(), &NoDevices, &mut found);
        assert_eq!(found, vec!["inner"]);
    }
}
