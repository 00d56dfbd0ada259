// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use std::fmt;

use crate::raid::{properties::DevicePropertyLookup, topology::RaidDevice};

/// A partial description of a block device. Every field that is set must
/// agree with the device; a field that is not set matches anything.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DeviceSpec {
    name: Option<String>,
    uuid: Option<String>,
    major: Option<u32>,
    minor: Option<u32>,
}

impl DeviceSpec {
    /// A spec that matches every device.
    pub fn new() -> DeviceSpec {
        DeviceSpec::default()
    }

    /// Build a spec from the signed form, where a negative major or minor
    /// number means "unconstrained".
    pub fn from_signed(
        name: Option<&str>,
        uuid: Option<&str>,
        major: i64,
        minor: i64,
    ) -> DeviceSpec {
        DeviceSpec {
            name: name.map(String::from),
            uuid: uuid.map(String::from),
            major: u32::try_from(major).ok(),
            minor: u32::try_from(minor).ok(),
        }
    }

    /// Require the kernel name of the device, e.g. "sda1".
    pub fn name(mut self, name: &str) -> DeviceSpec {
        self.name = Some(name.to_string());
        self
    }

    /// Require the filesystem UUID of the device. An empty UUID does not
    /// constrain anything.
    pub fn uuid(mut self, uuid: &str) -> DeviceSpec {
        self.uuid = Some(uuid.to_string());
        self
    }

    /// Require the major device number.
    pub fn major(mut self, major: u32) -> DeviceSpec {
        self.major = Some(major);
        self
    }

    /// Require the minor device number.
    pub fn minor(mut self, minor: u32) -> DeviceSpec {
        self.minor = Some(minor);
        self
    }

    /// True if no field is set.
    pub fn is_unconstrained(&self) -> bool {
        self.name.is_none()
            && self.uuid.as_deref().map_or(true, str::is_empty)
            && self.major.is_none()
            && self.minor.is_none()
    }

    /// Whether `device` fits every set field. The device's properties are looked
    /// up by its bare name only when a property constraint is set and the
    /// name constraint, if any, is met.
    pub fn matches<L>(&self, device: &RaidDevice, lookup: &L) -> bool
    where
        L: DevicePropertyLookup + ?Sized,
    {
        let dev_name = match device.bare_name() {
            Some(name) => name,
            None => {
                debug!("Cannot derive a device name from {}", device.path().display());
                return false;
            }
        };

        if let Some(ref name) = self.name {
            if name != dev_name {
                return false;
            }
        }

        let uuid = self.uuid.as_deref().filter(|uuid| !uuid.is_empty());
        if uuid.is_none() && self.major.is_none() && self.minor.is_none() {
            return true;
        }

        let props = match lookup.properties(dev_name) {
            Some(props) => props,
            None => {
                debug!("No properties found for device {}", dev_name);
                return false;
            }
        };

        let mut ret = true;
        if let Some(uuid) = uuid {
            if props.uuid.as_deref() != Some(uuid) {
                ret = false;
            }
        }
        if let Some(major) = self.major {
            if props.major != major {
                ret = false;
            }
        }
        if let Some(minor) = self.minor {
            if props.minor != minor {
                ret = false;
            }
        }
        ret
    }
}

impl fmt::Display for DeviceSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts = Vec::new();
        if let Some(ref name) = self.name {
            parts.push(format!("name={name}"));
        }
        if let Some(ref uuid) = self.uuid {
            parts.push(format!("uuid={uuid}"));
        }
        if let Some(major) = self.major {
            parts.push(format!("major={major}"));
        }
        if let Some(minor) = self.minor {
            parts.push(format!("minor={minor}"));
        }
        if parts.is_empty() {
            write!(f, "any device")
        } else {
            write!(f, "{}", parts.join(" "))
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use crate::raid::properties::DeviceProperties;

    use super::*;

    /// Knows a single device and counts how often it is asked.
    struct OneDevice {
        name: &'static str,
        props: DeviceProperties,
        lookups: Cell<usize>,
    }

    impl DevicePropertyLookup for OneDevice {
        fn properties(&self, name: &str) -> Option<DeviceProperties> {
            self.lookups.set(self.lookups.get() + 1);
            if name == self.name {
                Some(self.props.clone())
            } else {
                None
            }
        }
    }

    fn sda1() -> OneDevice {
        OneDevice {
            name: "sda1",
            props: DeviceProperties {
                uuid: Some("ABC".into()),
                major: 8,
                minor: 1,
            },
            lookups: Cell::new(0),
        }
    }

    fn dev(path: &str) -> RaidDevice {
        RaidDevice::new(path)
    }

    #[test]
    /// Each constraint is checked against the resolved properties.
    fn test_constraints() {
        let lookup = sda1();
        let device = dev("/dev/sda1");

        assert!(DeviceSpec::new().name("sda1").matches(&device, &lookup));
        assert!(DeviceSpec::new().uuid("ABC").matches(&device, &lookup));
        assert!(!DeviceSpec::new().uuid("XYZ").matches(&device, &lookup));
        assert!(DeviceSpec::new().major(8).minor(1).matches(&device, &lookup));
        assert!(!DeviceSpec::new().major(8).minor(2).matches(&device, &lookup));
        assert!(!DeviceSpec::new().major(9).matches(&device, &lookup));
        assert!(!DeviceSpec::new()
            .name("sda1")
            .uuid("ABC")
            .major(253)
            .matches(&device, &lookup));
    }

    #[test]
    /// A name mismatch is decided before any property lookup.
    fn test_name_checked_first() {
        let lookup = sda1();
        assert!(!DeviceSpec::new()
            .name("sdb1")
            .major(8)
            .matches(&dev("/dev/sda1"), &lookup));
        assert_eq!(lookup.lookups.get(), 0);
    }

    #[test]
    /// Without constraints every well formed path matches and no lookup is
    /// made; an empty uuid constrains nothing.
    fn test_unconstrained() {
        let lookup = sda1();
        assert!(DeviceSpec::new().matches(&dev("/dev/sdz9"), &lookup));
        assert!(DeviceSpec::new().uuid("").matches(&dev("/dev/sdz9"), &lookup));
        assert!(DeviceSpec::new().uuid("").is_unconstrained());
        assert_eq!(lookup.lookups.get(), 0);
    }

    #[test]
    /// A path with fewer than two separators or nothing after the second
    /// never matches.
    fn test_malformed_paths() {
        let lookup = sda1();
        for path in ["sda1", "/sda1", "dev/", "/dev/", ""] {
            assert!(!DeviceSpec::new().matches(&dev(path), &lookup), "{path}");
        }
    }

    #[test]
    /// The bare name is everything after the second separator.
    fn test_nested_bare_name() {
        let lookup = sda1();
        assert!(DeviceSpec::new()
            .name("mapper/vg-lv1")
            .matches(&dev("/dev/mapper/vg-lv1"), &lookup));
    }

    #[test]
    /// A device whose properties can not be resolved fails every property
    /// constraint, but not a name constraint.
    fn test_unresolvable_device() {
        let lookup = sda1();
        let device = dev("/dev/sdq1");
        assert!(DeviceSpec::new().name("sdq1").matches(&device, &lookup));
        assert!(!DeviceSpec::new().major(8).matches(&device, &lookup));
        assert!(!DeviceSpec::new().uuid("ABC").matches(&device, &lookup));
    }

    #[test]
    /// Negative numbers in the signed form mean "unconstrained".
    fn test_from_signed() {
        assert_eq!(DeviceSpec::from_signed(None, None, -1, -1), DeviceSpec::new());
        assert_eq!(
            DeviceSpec::from_signed(Some("sda1"), None, 8, -1),
            DeviceSpec::new().name("sda1").major(8)
        );
        assert_eq!(DeviceSpec::new().major(8).minor(1).to_string(), "major=8 minor=1");
        assert_eq!(DeviceSpec::new().to_string(), "any device");
    }
}
