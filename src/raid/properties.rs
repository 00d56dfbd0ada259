// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use std::ffi::OsStr;

/// The udev property holding the UUID of the filesystem, or of the RAID
/// member superblock, found on a device.
const UUID_PROPERTY: &str = "ID_FS_UUID";
const MAJOR_PROPERTY: &str = "MAJOR";
const MINOR_PROPERTY: &str = "MINOR";

/// Properties of a block device that a `DeviceSpec` can constrain.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DeviceProperties {
    /// The UUID udev found on the device, if any.
    pub uuid: Option<String>,
    /// The major device number.
    pub major: u32,
    /// The minor device number.
    pub minor: u32,
}

/// Resolves a kernel device name, e.g. "sda1", to its properties.
pub trait DevicePropertyLookup {
    /// The device's properties, or None if the device is not known.
    fn properties(&self, name: &str) -> Option<DeviceProperties>;
}

/// Looks block devices up through libudev.
#[derive(Clone, Copy, Debug, Default)]
pub struct UdevProperties;

impl UdevProperties {
    /// A lookup against the udev instance of the running system.
    pub fn new() -> UdevProperties {
        UdevProperties
    }
}

fn number_property(device: &udev::Device, property: &str) -> Option<u32> {
    let value = device.property_value(property)?.to_str()?;
    match value.parse::<u32>() {
        Ok(number) => Some(number),
        Err(err) => {
            warn!(
                "udev property {} of {} is not a number \"{}\": {}",
                property,
                device.sysname().to_string_lossy(),
                value,
                err
            );
            None
        }
    }
}

impl DevicePropertyLookup for UdevProperties {
    fn properties(&self, name: &str) -> Option<DeviceProperties> {
        let device = match udev::Device::from_subsystem_sysname("block".into(), name.into()) {
            Ok(device) => device,
            Err(err) => {
                debug!("Failed to get udev device for {}: {}", name, err);
                return None;
            }
        };

        Some(DeviceProperties {
            uuid: device
                .property_value(UUID_PROPERTY)
                .and_then(OsStr::to_str)
                .map(String::from),
            major: number_property(&device, MAJOR_PROPERTY)?,
            minor: number_property(&device, MINOR_PROPERTY)?,
        })
    }
}
