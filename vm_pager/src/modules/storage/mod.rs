/*
 *  Copyright (C) 2025  Markus Elias Gerber
 *
 *  This program is free software: you can redistribute it and/or modify
 *  it under the terms of the GNU General Public License as published by
 *  the Free Software Foundation, either version 3 of the License, or
 *  (at your option) any later version.
 *
 *  This program is distributed in the hope that it will be useful,
 *  but WITHOUT ANY WARRANTY; without even the implied warranty of
 *  MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 *  GNU General Public License for more details.
 *
 *  You should have received a copy of the GNU General Public License
 *  along with this program.  If not, see <https://www.gnu.org/licenses/>.
 */

mod file_storage;
mod memory_storage;

pub use file_storage::FileStorageModule;
pub use memory_storage::MemoryStorageModule;

use crate::StorageError;

/// Byte addressable backend of a memory device (physical memory or swap)
pub trait StorageModule {
    /// Reads the region `[offset, offset + dest.len())` into `dest`.
    ///
    /// If this call fails, it could be that already some data was written to `dest`.
    fn read(&mut self, offset: usize, dest: &mut [u8]) -> Result<(), StorageError>;

    /// Writes `src` to the region `[offset, offset + src.len())`
    fn write(&mut self, offset: usize, src: &[u8]) -> Result<(), StorageError>;

    /// Returns the maximum size in bytes of this storage
    fn get_max_size(&self) -> usize;
}

/// Returns an error if `[offset, offset + len)` does not fit into `size` bytes
#[inline]
pub(crate) fn check_bounds(offset: usize, len: usize, size: usize) -> Result<(), StorageError> {
    match offset.checked_add(len) {
        Some(end) if end <= size => Ok(()),
        _ => Err(StorageError::OutOfBounds { offset, len, size }),
    }
}
