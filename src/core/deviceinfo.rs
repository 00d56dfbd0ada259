// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use semver::Version;

use crate::{
    core::{
        device::Device,
        dm_flags::DmFlags,
        dm_ioctl as dmi, errors,
        types::{DmName, DmNameBuf, DmUuid, DmUuidBuf},
        util::str_from_c_str,
    },
    result::{DmError, DmResult},
};

/// Contains information about the device.
#[derive(Clone, Debug)]
pub struct DeviceInfo {
    version: Version,

    target_count: u32,

    open_count: i32,
    flags: DmFlags,
    event_nr: u32,
    dev: Device,
    name: Option<DmNameBuf>,
    uuid: Option<DmUuidBuf>,
}

impl TryFrom<dmi::Struct_dm_ioctl> for DeviceInfo {
    type Error = DmError;

    fn try_from(ioctl: dmi::Struct_dm_ioctl) -> DmResult<Self> {
        let uuid = str_from_c_str(&ioctl.uuid).ok_or_else(|| {
            errors::Error::InvalidArgument("Devicemapper UUID is not null terminated".to_string())
        })?;
        let uuid = if uuid.is_empty() {
            None
        } else {
            DmUuidBuf::new(uuid.to_string())
                .map_err(|err| warn!("Ignoring unusable uuid of devicemapper device: {}", err))
                .ok()
        };
        let name = str_from_c_str(&ioctl.name).ok_or_else(|| {
            errors::Error::InvalidArgument("Devicemapper name is not null terminated".to_string())
        })?;
        let name = if name.is_empty() {
            None
        } else {
            DmNameBuf::new(name.to_string())
                .map_err(|err| warn!("Ignoring unusable name of devicemapper device: {}", err))
                .ok()
        };
        Ok(DeviceInfo {
            version: Version::new(
                u64::from(ioctl.version[0]),
                u64::from(ioctl.version[1]),
                u64::from(ioctl.version[2]),
            ),
            target_count: ioctl.target_count,
            open_count: ioctl.open_count,
            flags: DmFlags::from_bits_truncate(ioctl.flags),
            event_nr: ioctl.event_nr,
            // dm_ioctl struct reserves 64 bits for device but kernel "huge"
            // encoding is only 32 bits.
            dev: Device::from_kdev_t(ioctl.dev as u32),
            uuid,
            name,
        })
    }
}

impl DeviceInfo {
    /// Parses a DM ioctl structure.
    ///
    /// Equivalent to `DeviceInfo::try_from(hdr)`.
    pub fn new(hdr: dmi::Struct_dm_ioctl) -> DmResult<Self> {
        DeviceInfo::try_from(hdr)
    }

    /// The major, minor, and patchlevel versions of devicemapper.
    pub fn version(&self) -> &Version {
        &self.version
    }

    /// The number of targets in the device's table.
    pub fn target_count(&self) -> u32 {
        self.target_count
    }

    /// The number of times the device is currently open.
    pub fn open_count(&self) -> i32 {
        self.open_count
    }

    /// The last event number for the device.
    pub fn event_nr(&self) -> u32 {
        self.event_nr
    }

    /// The device's major and minor device numbers, as a Device.
    pub fn device(&self) -> Device {
        self.dev
    }

    /// The device's name.
    pub fn name(&self) -> Option<&DmName> {
        self.name.as_ref().map(|name| name.as_ref())
    }

    /// The device's devicemapper uuid.
    pub fn uuid(&self) -> Option<&DmUuid> {
        self.uuid.as_ref().map(|uuid| uuid.as_ref())
    }

    /// The flags returned from the device.
    pub fn flags(&self) -> DmFlags {
        self.flags
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set_name(hdr: &mut dmi::Struct_dm_ioctl, name: &str) {
        for (dst, src) in hdr.name.iter_mut().zip(name.bytes()) {
            *dst = src as nix::libc::c_char;
        }
    }

    fn set_uuid(hdr: &mut dmi::Struct_dm_ioctl, uuid: &str) {
        for (dst, src) in hdr.uuid.iter_mut().zip(uuid.bytes()) {
            *dst = src as nix::libc::c_char;
        }
    }

    #[test]
    /// A status header is converted field by field.
    fn test_from_header() {
        let mut hdr = dmi::Struct_dm_ioctl::default();
        hdr.version = [4, 48, 0];
        hdr.open_count = 2;
        hdr.flags = dmi::DM_ACTIVE_PRESENT_FLAG | dmi::DM_SUSPEND_FLAG;
        hdr.dev = u64::from(
            Device {
                major: 253,
                minor: 3,
            }
            .to_kdev_t()
            .unwrap(),
        );
        set_name(&mut hdr, "vg-lv1");

        let info = DeviceInfo::new(hdr).unwrap();
        assert_eq!(info.version(), &Version::new(4, 48, 0));
        assert_eq!(info.open_count(), 2);
        assert!(info.flags().contains(DmFlags::DM_ACTIVE_PRESENT));
        assert!(info.flags().contains(DmFlags::DM_SUSPEND));
        assert_eq!(
            info.device(),
            Device {
                major: 253,
                minor: 3
            }
        );
        assert_eq!(info.name().map(|n| n.as_str()), Some("vg-lv1"));
        assert_eq!(info.uuid(), None);
    }

    #[test]
    /// A name field with no terminating NUL is rejected.
    fn test_unterminated_name() {
        let mut hdr = dmi::Struct_dm_ioctl::default();
        set_name(&mut hdr, &"a".repeat(dmi::DM_NAME_LEN));
        assert_matches!(
            DeviceInfo::new(hdr),
            Err(DmError::Core(errors::Error::InvalidArgument(_)))
        );
    }

    #[test]
    /// A uuid may hold a path separator; an id that can not be represented
    /// is dropped rather than failing the whole status.
    fn test_unusual_ids() {
        let mut hdr = dmi::Struct_dm_ioctl::default();
        set_name(&mut hdr, "vg-lv1");
        set_uuid(&mut hdr, "CRYPT-a/b");
        let info = DeviceInfo::new(hdr).unwrap();
        assert_eq!(info.uuid().map(|u| u.as_str()), Some("CRYPT-a/b"));

        let mut hdr = dmi::Struct_dm_ioctl::default();
        set_name(&mut hdr, "café");
        set_uuid(&mut hdr, "CRYPT-café");
        let info = DeviceInfo::new(hdr).unwrap();
        assert_eq!(info.name(), None);
        assert_eq!(info.uuid(), None);
    }
}
