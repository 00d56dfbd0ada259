// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

/// disk sector size in bytes
pub const SECTOR_SIZE: usize = 512;

#[allow(non_upper_case_globals)]
#[allow(non_snake_case)]
/// Binary size multiples
pub mod IEC {
    /// kibi
    pub const Ki: u64 = 1024;
    /// mebi
    pub const Mi: u64 = 1024 * Ki;
    /// gibi
    pub const Gi: u64 = 1024 * Mi;
}

range_u128!(
    /// A type for bytes
    Bytes,
    "bytes"
);

impl Bytes {
    /// Return the number of Sectors fully contained in these bytes.
    pub fn sectors(self) -> Sectors {
        Sectors((self.0 / SECTOR_SIZE as u128) as u64)
    }
}

range_u64!(
    /// A type for sectors
    Sectors,
    "sectors"
);

impl Sectors {
    /// The number of bytes in these sectors.
    pub fn bytes(self) -> Bytes {
        // Keep both as u128 before multiplication or overflow could occur
        Bytes(u128::from(self.0) * SECTOR_SIZE as u128)
    }
}
