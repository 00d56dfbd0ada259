// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Discovery of Linux MD software RAID arrays through sysfs.
//!
//! Every array the kernel knows of has a directory `md` below its block
//! device directory. Its `metadata_version` attribute tells native arrays
//! ("1.2", "0.90", ...) from containers of firmware RAID metadata
//! ("external:imsm", "external:ddf") and from the arrays defined inside
//! such a container ("external:/md127/0", or "external:-md127/0" while
//! the array is read-only). Member devices show up as `dev-<name>` links
//! in the same directory.

use std::{collections::HashSet, fs, path::Path};

use crate::{
    core::errors,
    raid::topology::{RaidDevice, RaidSet},
    result::{DmError, DmResult, ErrorEnum},
    sysfs::{read_attr, SysPaths},
};

const MD_PREFIX: &str = "md";
const MEMBER_PREFIX: &str = "dev-";
const EXTERNAL_PREFIX: &str = "external:";

/// The steps of turning the devices of a system into a RAID topology.
///
/// Implementations hold whatever state the steps accumulate. They are
/// used for a single query and release their resources when dropped.
pub trait RaidDiscovery {
    /// Enumerate the block devices of the system.
    fn discover_devices(&mut self) -> DmResult<()>;

    /// Find out which of the enumerated devices belong to RAID sets.
    /// Devices that can not be examined are skipped.
    fn discover_raid_devices(&mut self);

    /// The number of distinct RAID member devices found.
    fn raid_device_count(&self) -> usize;

    /// Arrange the RAID devices into a forest of sets, returning the roots
    /// in discovery order.
    fn group_sets(&mut self) -> DmResult<Vec<RaidSet>>;
}

/// How an MD array stores its metadata.
#[derive(Clone, Debug, PartialEq, Eq)]
enum MdMetadata {
    /// Metadata is handled by the kernel.
    Native(String),
    /// A container for externally managed metadata of this format.
    Container(String),
    /// An array defined by the metadata of the named container.
    Member { container: String, index: String },
}

impl MdMetadata {
    fn parse(value: &str) -> Option<MdMetadata> {
        let external = match value.strip_prefix(EXTERNAL_PREFIX) {
            Some(external) => external,
            None if value.is_empty() => return None,
            None => return Some(MdMetadata::Native(value.to_string())),
        };

        match external.strip_prefix(['/', '-']) {
            Some(member) => {
                let (container, index) = member.split_once('/')?;
                if container.is_empty() || index.is_empty() {
                    return None;
                }
                Some(MdMetadata::Member {
                    container: container.to_string(),
                    index: index.to_string(),
                })
            }
            None if external.is_empty() => None,
            None => Some(MdMetadata::Container(external.to_string())),
        }
    }
}

#[derive(Debug)]
struct MdArray {
    name: String,
    metadata: MdMetadata,
    members: Vec<String>,
}

impl MdArray {
    fn devices(&self) -> Vec<RaidDevice> {
        self.members
            .iter()
            .map(|member| RaidDevice::new(format!("/dev/{member}")))
            .collect()
    }
}

/// Discovers MD arrays below the sysfs root of a `SysPaths`.
#[derive(Debug)]
pub struct MdRaidContext<'a> {
    paths: &'a SysPaths,
    block_devices: Vec<String>,
    arrays: Vec<MdArray>,
}

impl<'a> MdRaidContext<'a> {
    /// A context that has discovered nothing yet.
    pub fn new(paths: &'a SysPaths) -> MdRaidContext<'a> {
        debug!("Acquiring RAID discovery context on {}", paths.sysfs().display());
        MdRaidContext {
            paths,
            block_devices: Vec::new(),
            arrays: Vec::new(),
        }
    }

    fn read_array(&self, name: &str) -> DmResult<Option<MdArray>> {
        let md_dir = self.paths.block_dir(name).join("md");
        if !md_dir.is_dir() {
            return Ok(None);
        }

        let version = read_attr(&md_dir.join("metadata_version"))?;
        let metadata = match MdMetadata::parse(&version) {
            Some(metadata) => metadata,
            None => {
                warn!("Array {} has unusable metadata version \"{}\"", name, version);
                return Ok(None);
            }
        };

        Ok(Some(MdArray {
            name: name.to_string(),
            metadata,
            members: members(&md_dir)?,
        }))
    }
}

fn members(md_dir: &Path) -> DmResult<Vec<String>> {
    let mut members = fs::read_dir(md_dir)
        .map_err(|err| DmError::Core(errors::Error::MetadataIo(md_dir.to_owned(), err.to_string())))?
        .filter_map(|entry| entry.ok())
        .filter_map(|entry| {
            entry
                .file_name()
                .to_str()
                .and_then(|name| name.strip_prefix(MEMBER_PREFIX))
                .map(String::from)
        })
        .collect::<Vec<_>>();
    members.sort();
    Ok(members)
}

impl RaidDiscovery for MdRaidContext<'_> {
    fn discover_devices(&mut self) -> DmResult<()> {
        let class_dir = self.paths.sysfs().join("class/block");
        let entries = fs::read_dir(&class_dir).map_err(|err| {
            DmError::Core(errors::Error::MetadataIo(class_dir.clone(), err.to_string()))
        })?;

        let mut names = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|err| {
                DmError::Core(errors::Error::MetadataIo(class_dir.clone(), err.to_string()))
            })?;
            if let Some(name) = entry.file_name().to_str() {
                names.push(name.to_string());
            }
        }
        names.sort();

        debug!("Discovered {} block devices", names.len());
        self.block_devices = names;
        Ok(())
    }

    fn discover_raid_devices(&mut self) {
        let mut arrays = Vec::new();
        for name in self
            .block_devices
            .iter()
            .filter(|name| name.starts_with(MD_PREFIX))
        {
            match self.read_array(name) {
                Ok(Some(array)) if array.members.is_empty() => {
                    debug!("Array {} has no member devices, skipping", name);
                }
                Ok(Some(array)) => arrays.push(array),
                Ok(None) => {}
                Err(err) => warn!("Failed to examine array {}: {}", name, err),
            }
        }
        self.arrays = arrays;
    }

    fn raid_device_count(&self) -> usize {
        self.arrays
            .iter()
            .flat_map(|array| array.members.iter())
            .collect::<HashSet<_>>()
            .len()
    }

    fn group_sets(&mut self) -> DmResult<Vec<RaidSet>> {
        let mut roots = Vec::new();
        for array in &self.arrays {
            match array.metadata {
                MdMetadata::Native(ref version) => {
                    debug!("Array {} has metadata version {}", array.name, version);
                    roots.push(RaidSet::with_devices(&array.name, array.devices()));
                }
                MdMetadata::Container(ref format) => {
                    debug!("Array {} is a {} container", array.name, format);
                    let mut set = RaidSet::with_devices(&array.name, array.devices());
                    set.set_group(true);
                    roots.push(set);
                }
                MdMetadata::Member { .. } => {}
            }
        }

        for array in &self.arrays {
            if let MdMetadata::Member {
                ref container,
                ref index,
            } = array.metadata
            {
                let parent = roots
                    .iter_mut()
                    .find(|set| set.is_group() && set.name() == container)
                    .ok_or_else(|| {
                        DmError::Dm(
                            ErrorEnum::Grouping,
                            format!(
                                "array {} is member {} of container {}, which was not found",
                                array.name, index, container
                            ),
                        )
                    })?;
                parent.push_subset(RaidSet::with_devices(&array.name, array.devices()));
            }
        }

        Ok(roots)
    }
}

impl Drop for MdRaidContext<'_> {
    fn drop(&mut self) {
        debug!("Releasing RAID discovery context");
    }
}
