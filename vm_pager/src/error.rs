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

use thiserror::Error;

/// Errors of a [`StorageModule`](crate::modules::storage::StorageModule)
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("access [{offset}, {offset} + {len}) exceeds storage size {size}")]
    OutOfBounds {
        offset: usize,
        len: usize,
        size: usize,
    },

    #[error("storage i/o failed: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors returned by the memory operations of a process.
///
/// Every error is scoped to the single operation that produced it,
/// the address space stays usable afterwards.
#[derive(Debug, Error)]
pub enum VmError {
    #[error("region id {0} is outside of the symbol table")]
    InvalidRegionId(usize),

    #[error("region {0} was not allocated or was already freed")]
    RegionNotBound(usize),

    #[error("region {0} was already allocated")]
    RegionAlreadyBound(usize),

    #[error("cannot allocate a region with zero bytes")]
    InvalidSize,

    #[error("segment {0} does not exist")]
    InvalidSegmentId(usize),

    #[error("range [{start}, {end}) overlaps another segment")]
    SegmentOverlap { start: usize, end: usize },

    #[error("offset {offset} is outside of region {region_id}")]
    OffsetOutOfBounds { region_id: usize, offset: usize },

    #[error("address {0} is not covered by the page table")]
    AddressSpaceExhausted(usize),

    #[error("no free frame left in physical memory")]
    NoFreeFrame,

    #[error("no free slot left on the swap device")]
    NoFreeSwapSlot,

    #[error("no resident page that could be evicted")]
    NoVictimAvailable,

    #[error("swap device {0} does not exist")]
    InvalidSwapDevice(usize),

    #[error("address space is used by another thread")]
    AddressSpaceBusy,

    #[error("memory device lock is poisoned")]
    DevicePoisoned,

    #[error("invalid configuration: {0}")]
    InvalidConfig(&'static str),

    #[error(transparent)]
    Storage(#[from] StorageError),
}
