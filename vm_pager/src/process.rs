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

use std::sync::atomic::{AtomicUsize, Ordering};

use log::{info, trace, warn};
use try_lock::{Locked, TryLock};

use crate::{
    memory_device::lock_device, page_table::MAX_SWAP_SLOT, pager::Pager, AddressSpace,
    PageTableEntry, Region, SharedDevice, VmConfig, VmError, MAX_SWAP_DEVICES,
};

/// A simulated process together with its memory.
///
/// All memory operations take `&self`, so a process can be shared between threads.
/// Its address space however only serves one operation at a time: a concurrent
/// operation fails with [`VmError::AddressSpaceBusy`] instead of blocking.
pub struct Process {
    pid: u32,
    priority: u32,
    mm: TryLock<AddressSpace>,
    ram: SharedDevice,
    swap_devices: Vec<SharedDevice>,
    active_swap: AtomicUsize,
}

impl Process {
    /// Creates a process with an empty address space.
    ///
    /// `swap` becomes swap device 0, which is the active one.
    pub fn new(
        pid: u32,
        priority: u32,
        config: VmConfig,
        ram: SharedDevice,
        swap: SharedDevice,
    ) -> Result<Self, VmError> {
        config.validate()?;
        check_device(&ram, &config)?;
        check_device(&swap, &config)?;

        info!(
            "Create process {} (priority {}) with {} pages of {} bytes",
            pid,
            priority,
            config.max_pages,
            config.page_size()
        );

        Ok(Self {
            pid,
            priority,
            mm: TryLock::new(AddressSpace::new(config)),
            ram,
            swap_devices: vec![swap],
            active_swap: AtomicUsize::new(0),
        })
    }

    #[inline]
    pub fn pid(&self) -> u32 {
        self.pid
    }

    #[inline]
    pub fn priority(&self) -> u32 {
        self.priority
    }

    #[inline]
    pub fn ram(&self) -> &SharedDevice {
        &self.ram
    }

    #[inline]
    pub fn swap_devices(&self) -> &[SharedDevice] {
        &self.swap_devices
    }

    /// Index of the swap device evicted pages are written to
    #[inline]
    pub fn active_swap(&self) -> usize {
        self.active_swap.load(Ordering::SeqCst)
    }

    /// Adds another swap device and returns its index
    pub fn add_swap_device(&mut self, swap: SharedDevice) -> Result<usize, VmError> {
        if self.swap_devices.len() >= MAX_SWAP_DEVICES {
            return Err(VmError::InvalidSwapDevice(self.swap_devices.len()));
        }

        let config = *self.lock_mm()?.config();
        check_device(&swap, &config)?;

        self.swap_devices.push(swap);
        Ok(self.swap_devices.len() - 1)
    }

    /// Selects the swap device evicted pages are written to from now on
    pub fn set_active_swap(&self, swap_type: usize) -> Result<(), VmError> {
        if swap_type >= self.swap_devices.len() {
            return Err(VmError::InvalidSwapDevice(swap_type));
        }

        self.active_swap.store(swap_type, Ordering::SeqCst);
        Ok(())
    }

    fn lock_mm(&self) -> Result<Locked<'_, AddressSpace>, VmError> {
        self.mm.try_lock().ok_or_else(|| {
            warn!("Address space of process {} is busy", self.pid);
            VmError::AddressSpaceBusy
        })
    }

    fn pager(&self) -> Pager<'_> {
        Pager::new(&self.ram, &self.swap_devices, self.active_swap())
    }

    /// Allocates `size` bytes for `region_id` in segment 0 and returns the start address
    pub fn alloc(&self, size: usize, region_id: usize) -> Result<usize, VmError> {
        self.alloc_in(0, size, region_id)
    }

    /// Allocates `size` bytes for `region_id` in `segment_id` and returns the start address
    pub fn alloc_in(
        &self,
        segment_id: usize,
        size: usize,
        region_id: usize,
    ) -> Result<usize, VmError> {
        trace!(
            "Process {}: alloc {} bytes for region {} in segment {}",
            self.pid,
            size,
            region_id,
            segment_id
        );

        let mut mm = self.lock_mm()?;
        mm.allocate_region(&self.pager(), segment_id, region_id, size)
    }

    /// Frees `region_id` so its range can be allocated again
    pub fn free(&self, region_id: usize) -> Result<(), VmError> {
        trace!("Process {}: free region {}", self.pid, region_id);

        self.lock_mm()?.free_region(region_id)?;
        Ok(())
    }

    /// Reads the byte at `offset` of `region_id`
    pub fn read(&self, region_id: usize, offset: usize) -> Result<u8, VmError> {
        let mut mm = self.lock_mm()?;
        let addr = mm.resolve(region_id, offset)?;
        let phys_addr = mm.translate(&self.pager(), addr)?;

        let value = lock_device(&self.ram)?.read(phys_addr)?;

        trace!(
            "Process {}: read region={} offset={} value={}",
            self.pid,
            region_id,
            offset,
            value
        );
        Ok(value)
    }

    /// Writes `value` to `offset` of `region_id`
    pub fn write(&self, region_id: usize, offset: usize, value: u8) -> Result<(), VmError> {
        trace!(
            "Process {}: write region={} offset={} value={}",
            self.pid,
            region_id,
            offset,
            value
        );

        let mut mm = self.lock_mm()?;
        let addr = mm.resolve(region_id, offset)?;
        let phys_addr = mm.translate(&self.pager(), addr)?;

        lock_device(&self.ram)?.write(phys_addr, value)?;
        Ok(())
    }

    /// Creates a new empty segment at `start` and returns its id
    pub fn add_segment(&self, start: usize) -> Result<usize, VmError> {
        self.lock_mm()?.add_segment(start)
    }

    /// Current range of `region_id`, [`Region::UNBOUND`] if it is not allocated
    pub fn region(&self, region_id: usize) -> Result<Region, VmError> {
        self.lock_mm()?.symbol(region_id)
    }

    /// Page table entry of `page_number`
    pub fn page_entry(&self, page_number: usize) -> Result<Option<PageTableEntry>, VmError> {
        Ok(self.lock_mm()?.page_table().get(page_number))
    }

    /// Resident pages from the oldest to the youngest
    pub fn resident_pages(&self) -> Result<Vec<usize>, VmError> {
        Ok(self.lock_mm()?.residency().iter().collect())
    }

    /// Runs `func` with read access to the address space
    pub fn with_address_space<R>(&self, func: impl FnOnce(&AddressSpace) -> R) -> Result<R, VmError> {
        let mm = self.lock_mm()?;
        Ok(func(&mm))
    }

    /// Gives all frames and swap slots of this process back to their devices
    pub fn terminate(&mut self) -> Result<(), VmError> {
        info!("Terminate process {}", self.pid);
        self.release()
    }

    fn release(&self) -> Result<(), VmError> {
        let mut mm = self.lock_mm()?;
        mm.release(&self.pager())
    }
}

impl Drop for Process {
    fn drop(&mut self) {
        if let Err(err) = self.release() {
            warn!("Could not release memory of process {}: {}", self.pid, err);
        }
    }
}

/// Checks that `device` uses the page size of `config` and all of its frames are addressable
fn check_device(device: &SharedDevice, config: &VmConfig) -> Result<(), VmError> {
    let device = lock_device(device)?;

    if device.page_shift() != config.page_shift {
        return Err(VmError::InvalidConfig(
            "device page size does not match the address space",
        ));
    }
    if device.page_count() > MAX_SWAP_SLOT + 1 {
        return Err(VmError::InvalidConfig(
            "device has more frames than a page table entry can address",
        ));
    }

    Ok(())
}
