// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Parsing of the `struct dm_name_list` records returned by
//! DM_LIST_DEVICES.
//!
//! The kernel returns the records back to back in the ioctl data area,
//! each one holding the offset of its successor relative to its own start.
//! An offset of 0 terminates the list. A first record with a device number
//! of 0 means that there are no devices at all.

use std::mem::size_of;

use crate::{
    core::{
        device::Device,
        dm_ioctl as dmi, errors,
        types::{DmName, DmNameBuf},
        util::{align_to, read_u32, read_u64, slice_to_null},
    },
    result::{DmError, DmResult},
};

/// One live devicemapper device, as listed by the kernel.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MapRecord {
    name: DmNameBuf,
    device: Device,
    event_nr: Option<u32>,
}

impl MapRecord {
    /// The name of the map.
    pub fn name(&self) -> &DmName {
        &self.name
    }

    /// The map's major and minor device numbers.
    pub fn device(&self) -> Device {
        self.device
    }

    /// The last event number of the map, on kernels that report it.
    pub fn event_nr(&self) -> Option<u32> {
        self.event_nr
    }
}

fn malformed(offset: usize, what: &str) -> DmError {
    DmError::Core(errors::Error::MalformedResult(format!(
        "name list record at offset {offset}: {what}"
    )))
}

/// An iterator over the records of a DM_LIST_DEVICES result buffer.
pub struct NameList<'a> {
    buf: &'a [u8],
    offset: Option<usize>,
    has_event_nr: bool,
}

impl<'a> NameList<'a> {
    /// Iterate over `buf`. `has_event_nr` must be set if the kernel's DM
    /// interface is new enough (4.37) to append an event number to each
    /// name.
    pub fn new(buf: &'a [u8], has_event_nr: bool) -> NameList<'a> {
        let offset = match read_u64(buf, 0) {
            None | Some(0) => None,
            Some(_) => Some(0),
        };
        NameList {
            buf,
            offset,
            has_event_nr,
        }
    }

    /// The record at `offset` and the offset of its successor. A record
    /// whose name can not be represented as a `DmName` is None.
    fn record_at(&self, offset: usize) -> DmResult<(Option<MapRecord>, u32)> {
        let result = self
            .buf
            .get(offset..)
            .ok_or_else(|| malformed(offset, "offset beyond end of buffer"))?;

        let dev = read_u64(result, 0).ok_or_else(|| malformed(offset, "truncated device"))?;
        let next = read_u32(result, dmi::DM_NAME_LIST_NEXT_OFFSET)
            .ok_or_else(|| malformed(offset, "truncated next offset"))?;
        let name_slc = result
            .get(dmi::DM_NAME_LIST_NAME_OFFSET..)
            .and_then(slice_to_null)
            .ok_or_else(|| malformed(offset, "name is not null terminated"))?;
        let name = match DmNameBuf::new(String::from_utf8_lossy(name_slc).into_owned()) {
            Ok(name) => name,
            Err(err) => {
                warn!("Skipping devicemapper device with unusable name: {}", err);
                return Ok((None, next));
            }
        };

        // Should match offset calc in kernel's
        // drivers/md/dm-ioctl.c:list_devices
        let event_nr = if self.has_event_nr {
            let event_off = align_to(
                dmi::DM_NAME_LIST_NAME_OFFSET + name_slc.len() + 1,
                size_of::<u64>(),
            );
            read_u32(result, event_off)
        } else {
            None
        };

        Ok((
            Some(MapRecord {
                name,
                // Kernel "huge" encoding is only 32 bits.
                device: Device::from_kdev_t(dev as u32),
                event_nr,
            }),
            next,
        ))
    }
}

impl Iterator for NameList<'_> {
    type Item = DmResult<MapRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let offset = self.offset?;
            match self.record_at(offset) {
                Ok((record, next)) => {
                    self.offset = if next == 0 {
                        None
                    } else {
                        Some(offset + next as usize)
                    };
                    if let Some(record) = record {
                        return Some(Ok(record));
                    }
                }
                Err(err) => {
                    self.offset = None;
                    return Some(Err(err));
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Append one record laid out the way the kernel lays it out. The
    /// next offset of the previous record is left for the caller to link.
    fn push_record(buf: &mut Vec<u8>, dev: Device, name: &str, event_nr: u32) -> usize {
        let start = buf.len();
        buf.extend_from_slice(&u64::from(dev.to_kdev_t().unwrap()).to_ne_bytes());
        buf.extend_from_slice(&0u32.to_ne_bytes());
        buf.extend_from_slice(name.as_bytes());
        buf.push(0);
        let len = align_to(buf.len() - start, size_of::<u64>());
        buf.resize(start + len, 0);
        buf.extend_from_slice(&event_nr.to_ne_bytes());
        // flags
        buf.extend_from_slice(&0u32.to_ne_bytes());
        start
    }

    /// Build a complete name list buffer for the given names.
    fn name_list(names: &[&str]) -> Vec<u8> {
        let mut buf = Vec::new();
        let mut prev: Option<usize> = None;
        for (i, name) in names.iter().enumerate() {
            let start = push_record(
                &mut buf,
                Device {
                    major: 253,
                    minor: i as u32,
                },
                name,
                i as u32 + 1,
            );
            if let Some(prev) = prev {
                let next = (start - prev) as u32;
                buf[prev + 8..prev + 12].copy_from_slice(&next.to_ne_bytes());
            }
            prev = Some(start);
        }
        if buf.is_empty() {
            // The kernel's empty answer: a single record with dev 0.
            buf.resize(16, 0);
        }
        buf
    }

    #[test]
    /// Every record is visited in order and the link mechanics are hidden.
    fn test_walk_records() {
        let buf = name_list(&["vg-lv1", "vg-lv2", "a-much-longer-map-name"]);
        let records = NameList::new(&buf, true)
            .collect::<DmResult<Vec<_>>>()
            .unwrap();

        assert_eq!(
            records
                .iter()
                .map(|r| r.name().to_string())
                .collect::<Vec<_>>(),
            vec!["vg-lv1", "vg-lv2", "a-much-longer-map-name"]
        );
        assert_eq!(
            records[1].device(),
            Device {
                major: 253,
                minor: 1
            }
        );
        assert_eq!(
            records.iter().map(|r| r.event_nr()).collect::<Vec<_>>(),
            vec![Some(1), Some(2), Some(3)]
        );
    }

    #[test]
    /// Older kernels do not append event numbers.
    fn test_no_event_nr() {
        let buf = name_list(&["vg-lv1"]);
        let records = NameList::new(&buf, false)
            .collect::<DmResult<Vec<_>>>()
            .unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].event_nr(), None);
    }

    #[test]
    /// The kernel's empty answer and an empty buffer both yield nothing.
    fn test_empty() {
        assert_eq!(NameList::new(&name_list(&[]), true).count(), 0);
        assert_eq!(NameList::new(&[], true).count(), 0);
    }

    #[test]
    /// A next offset pointing past the buffer is an error, not a panic.
    fn test_bad_next_offset() {
        let mut buf = name_list(&["vg-lv1"]);
        buf[8..12].copy_from_slice(&4096u32.to_ne_bytes());
        let results = NameList::new(&buf, true).collect::<Vec<_>>();
        assert_eq!(results.len(), 2);
        assert!(results[0].is_ok());
        assert_matches!(
            results[1],
            Err(DmError::Core(errors::Error::MalformedResult(_)))
        );
    }

    #[test]
    /// A name that is not a valid DmName is skipped, the rest of the
    /// listing is still returned.
    fn test_unusable_name_skipped() {
        let buf = name_list(&["vg-lv1", "café", "vg/lv", "vg-lv2"]);
        let records = NameList::new(&buf, true)
            .collect::<DmResult<Vec<_>>>()
            .unwrap();
        assert_eq!(
            records
                .iter()
                .map(|r| r.name().to_string())
                .collect::<Vec<_>>(),
            vec!["vg-lv1", "vg-lv2"]
        );
        assert_eq!(records[1].event_nr(), Some(4));
    }
}
