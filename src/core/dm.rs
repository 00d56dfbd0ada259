// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use std::{cmp, fs::File, mem::size_of, os::unix::io::AsRawFd, ptr};

use nix::{
    errno::Errno,
    libc::{c_ulong, ioctl as nix_ioctl},
};

use crate::{
    core::{
        dm_ioctl as dmi, errors,
        name_list::{MapRecord, NameList},
        util::slice_from_c_struct,
        DevId, DeviceInfo, DmFlags, DmName, DmOptions, DmUuid,
    },
    result::{DmError, DmResult},
};

/// Control path for user space to pass IOCTL to kernel DM
const DM_CTL_PATH: &str = "/dev/mapper/control";
/// Major version
const DM_VERSION_MAJOR: u32 = 4;
/// Minor version
const DM_VERSION_MINOR: u32 = 30;
/// Patch level
const DM_VERSION_PATCHLEVEL: u32 = 0;

/// First DM interface minor version that appends an event number to each
/// entry of the device list.
const DM_LIST_EVENT_NR_MINOR: u32 = 37;

/// Start with a large buffer to make BUFFER_FULL rare. Libdm does this too.
const MIN_BUF_SIZE: usize = 16 * 1024;

/// Context needed for communicating with devicemapper.
///
/// The control device is closed when the context is dropped.
pub struct DM {
    file: File,
}

impl DmOptions {
    /// Generate a header to be used for IOCTL.
    fn to_ioctl_hdr(&self, id: Option<&DevId<'_>>, allowable_flags: DmFlags) -> dmi::Struct_dm_ioctl {
        let clean_flags = allowable_flags & self.flags();
        let mut hdr: dmi::Struct_dm_ioctl = Default::default();

        hdr.version[0] = DM_VERSION_MAJOR;
        hdr.version[1] = DM_VERSION_MINOR;
        hdr.version[2] = DM_VERSION_PATCHLEVEL;

        hdr.flags = clean_flags.bits();

        hdr.data_start = size_of::<dmi::Struct_dm_ioctl>() as u32;

        if let Some(id) = id {
            match *id {
                DevId::Name(name) => DM::hdr_set_name(&mut hdr, name),
                DevId::Uuid(uuid) => DM::hdr_set_uuid(&mut hdr, uuid),
            };
        };

        hdr
    }
}

impl DM {
    /// Create a new context for communicating with DM.
    pub fn new() -> DmResult<DM> {
        Ok(DM {
            file: File::open(DM_CTL_PATH)
                .map_err(|e| DmError::Core(errors::Error::ContextInit(e.to_string())))?,
        })
    }

    // The name and uuid fields are zeroed by Default, so the length check
    // done by the id types leaves room for the terminating NUL.
    fn hdr_set_name(hdr: &mut dmi::Struct_dm_ioctl, name: &DmName) {
        for (dst, src) in hdr.name.iter_mut().zip(name.as_bytes()) {
            *dst = *src as nix::libc::c_char;
        }
    }

    fn hdr_set_uuid(hdr: &mut dmi::Struct_dm_ioctl, uuid: &DmUuid) {
        for (dst, src) in hdr.uuid.iter_mut().zip(uuid.as_bytes()) {
            *dst = *src as nix::libc::c_char;
        }
    }

    /// Get the file within the DM context, likely for polling purposes.
    pub fn file(&self) -> &File {
        &self.file
    }

    // The kernel writes the header back into the start of the buffer, on
    // failure as well as on success.
    fn hdr_from_buf(buf: &[u8]) -> dmi::Struct_dm_ioctl {
        assert!(buf.len() >= size_of::<dmi::Struct_dm_ioctl>());
        unsafe { ptr::read_unaligned(buf.as_ptr() as *const dmi::Struct_dm_ioctl) }
    }

    // Give this a filled-in header and optionally add'l stuff.
    // Does the ioctl and maybe returns stuff. Handles BUFFER_FULL flag.
    //
    fn do_ioctl(
        &self,
        ioctl: u8,
        hdr: &mut dmi::Struct_dm_ioctl,
        in_data: Option<&[u8]>,
    ) -> DmResult<Vec<u8>> {
        let hdr_len = size_of::<dmi::Struct_dm_ioctl>();

        // Start with a large buffer to make BUFFER_FULL rare. Libdm
        // does this too.
        hdr.data_size = cmp::max(MIN_BUF_SIZE, hdr_len + in_data.map_or(0, |x| x.len())) as u32;
        let hdr_in = *hdr;

        let mut v: Vec<u8> = Vec::with_capacity(hdr.data_size as usize);
        v.extend_from_slice(slice_from_c_struct(&hdr_in));
        if let Some(in_data) = in_data {
            v.extend_from_slice(in_data);
        }

        // zero out the rest
        v.resize(hdr.data_size as usize, 0);

        let op = nix::request_code_readwrite!(dmi::DM_IOCTL, ioctl, hdr_len) as c_ulong;
        loop {
            let res = Errno::result(unsafe { nix_ioctl(self.file.as_raw_fd(), op, v.as_mut_ptr()) });
            *hdr = DM::hdr_from_buf(&v);

            if let Err(err) = res {
                return Err(DmError::Core(errors::Error::Ioctl(
                    ioctl,
                    DeviceInfo::new(hdr_in).ok().map(Box::new),
                    DeviceInfo::new(*hdr).ok().map(Box::new),
                    Box::new(err),
                )));
            }

            // If DM was able to write the requested data into the provided buffer, break the loop
            if (hdr.flags & DmFlags::DM_BUFFER_FULL.bits()) == 0 {
                break;
            }

            // If DM_BUFFER_FULL is set, DM requires more space for the
            // response.  Double the size of the buffer and re-try the ioctl.
            // If the size of the buffer is already as large as can be possibly
            // expressed in hdr.data_size field, return an error. Never allow
            // the size to exceed u32::MAX.
            let len = v.len();
            if len == u32::MAX as usize {
                return Err(DmError::Core(errors::Error::IoctlResultTooLarge));
            }
            let new_len = (len as u32).saturating_mul(2);
            v.resize(new_len as usize, 0);

            let mut retry_hdr = hdr_in;
            retry_hdr.data_size = new_len;
            v[..hdr_len].copy_from_slice(slice_from_c_struct(&retry_hdr));
        }

        // Return header data section.
        let data_start = cmp::min(hdr.data_start as usize, v.len());
        let data_end = cmp::min(cmp::max(hdr.data_start, hdr.data_size) as usize, v.len());
        Ok(v[data_start..data_end].to_vec())
    }

    /// Devicemapper version information: Major, Minor, and patchlevel versions.
    pub fn version(&self) -> DmResult<(u32, u32, u32)> {
        let mut hdr = DmOptions::new().to_ioctl_hdr(None, DmFlags::empty());

        self.do_ioctl(dmi::DM_VERSION_CMD, &mut hdr, None)?;

        Ok((hdr.version[0], hdr.version[1], hdr.version[2]))
    }

    /// Returns a record for every live DM device: its name, a Device, which
    /// holds its major and minor device numbers, and on kernels that
    /// support it, its last event_nr.
    pub fn list_devices(&self) -> DmResult<Vec<MapRecord>> {
        let mut hdr = DmOptions::new().to_ioctl_hdr(None, DmFlags::empty());
        let data_out = self.do_ioctl(dmi::DM_LIST_DEVICES_CMD, &mut hdr, None)?;

        NameList::new(&data_out, hdr.version[1] >= DM_LIST_EVENT_NR_MINOR).collect()
    }

    /// Get DeviceInfo for a device.
    ///
    /// If DM_QUERY_INACTIVE_TABLE is set, the table related fields
    /// describe the inactive table.
    ///
    /// Valid flags: DM_QUERY_INACTIVE_TABLE
    pub fn device_info(&self, id: &DevId<'_>, options: &DmOptions) -> DmResult<DeviceInfo> {
        let mut hdr = options.to_ioctl_hdr(Some(id), DmFlags::DM_QUERY_INACTIVE_TABLE);

        self.do_ioctl(dmi::DM_DEV_STATUS_CMD, &mut hdr, None)?;

        DeviceInfo::new(hdr)
    }
}
