// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use crate::core::DmFlags;

/// Encapsulates options for device mapper calls
#[derive(Debug, Default, Clone)]
pub struct DmOptions {
    flags: DmFlags,
}

impl DmOptions {
    /// Create a new empty option
    pub fn new() -> DmOptions {
        DmOptions {
            flags: DmFlags::empty(),
        }
    }

    /// Set the DmFlags value for option.  Note this call is not additive in that it sets (replaces)
    /// entire flag value in one call.  Thus if you want to incrementally add additional flags you
    /// need to retrieve current and '|' with new.
    ///
    /// ```no_run
    /// use dmquery::DmFlags;
    /// use dmquery::DmOptions;
    ///
    /// let mut options = DmOptions::new();
    /// options.set_flags(DmFlags::DM_QUERY_INACTIVE_TABLE);
    /// let flags = DmFlags::DM_NOFLUSH | options.flags();
    /// options.set_flags(flags);
    /// ```
    pub fn set_flags(&mut self, flags: DmFlags) -> &mut DmOptions {
        self.flags = flags;
        self
    }

    /// Retrieve the flags value
    pub fn flags(&self) -> DmFlags {
        self.flags
    }
}
