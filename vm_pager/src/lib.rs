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

mod address_space;
mod config;
mod error;
mod memory_device;
mod page_table;
mod pager;
mod process;
mod region;
mod residency;
mod segment;
mod util;

#[cfg(test)]
mod test;

pub use crate::address_space::AddressSpace;
pub use crate::memory_device::{MemoryDevice, SharedDevice};
pub use crate::page_table::{PageTable, PageTableEntry, MAX_SWAP_DEVICES};
pub use crate::process::Process;
pub use crate::region::{FreeList, Region};
pub use crate::residency::ResidencyList;
pub use crate::segment::Segment;
pub use config::VmConfig;
pub use error::{StorageError, VmError};
pub mod modules;
