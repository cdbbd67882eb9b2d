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

use log::{debug, trace, warn};

use crate::{
    memory_device::{clear_page, copy_page, lock_device},
    PageTable, Region, ResidencyList, SharedDevice, VmError,
};

/// Moves pages between physical memory and the swap devices of one process.
///
/// The pager only borrows the devices, the page table and residency list
/// it works on are passed to every call.
pub(crate) struct Pager<'a> {
    ram: &'a SharedDevice,
    swap_devices: &'a [SharedDevice],
    active_swap: usize,
}

impl<'a> Pager<'a> {
    pub(crate) fn new(
        ram: &'a SharedDevice,
        swap_devices: &'a [SharedDevice],
        active_swap: usize,
    ) -> Self {
        Self {
            ram,
            swap_devices,
            active_swap,
        }
    }

    fn swap_device(&self, swap_type: usize) -> Result<&SharedDevice, VmError> {
        self.swap_devices
            .get(swap_type)
            .ok_or(VmError::InvalidSwapDevice(swap_type))
    }

    /// Makes sure that `page_number` is resident and returns its frame
    pub(crate) fn ensure_resident(
        &self,
        table: &mut PageTable,
        residency: &mut ResidencyList,
        page_number: usize,
    ) -> Result<usize, VmError> {
        let entry = table
            .get(page_number)
            .ok_or(VmError::AddressSpaceExhausted(page_number << table.page_shift()))?;

        if let Some(frame) = entry.frame() {
            return Ok(frame);
        }

        match (entry.swap_type(), entry.swap_slot()) {
            (Some(swap_type), Some(slot)) => {
                self.swap_in(table, residency, page_number, swap_type, slot)
            }
            _ => self.map_new_page(table, residency, page_number),
        }
    }

    /// Makes every page that is touched by `region` resident
    pub(crate) fn ensure_range_resident(
        &self,
        table: &mut PageTable,
        residency: &mut ResidencyList,
        region: Region,
    ) -> Result<(), VmError> {
        if !region.is_bound() {
            return Ok(());
        }

        for page_number in table.pages_of(region) {
            self.ensure_resident(table, residency, page_number)?;
        }

        Ok(())
    }

    /// Returns a free frame of physical memory, evicts a victim if there is none
    fn obtain_frame(
        &self,
        table: &mut PageTable,
        residency: &mut ResidencyList,
    ) -> Result<usize, VmError> {
        let free_frame = lock_device(self.ram)?.get_free_frame();

        match free_frame {
            Some(frame) => Ok(frame),
            None => self.evict(table, residency),
        }
    }

    /// Maps a page that was never used to a zeroed frame
    fn map_new_page(
        &self,
        table: &mut PageTable,
        residency: &mut ResidencyList,
        page_number: usize,
    ) -> Result<usize, VmError> {
        let frame = self.obtain_frame(table, residency).map_err(|err| match err {
            VmError::NoVictimAvailable => {
                warn!("No frame left to map page {}", page_number);
                VmError::NoFreeFrame
            }
            err => err,
        })?;

        if let Err(err) = clear_page(self.ram, frame) {
            lock_device(self.ram)?.put_free_frame(frame);
            return Err(err);
        }

        if let Some(entry) = table.entry_mut(page_number) {
            entry.set_present(frame);
        }
        residency.enlist(page_number);

        trace!("Mapped page {} to frame {}", page_number, frame);
        Ok(frame)
    }

    /// Page fault: brings a swapped page back into physical memory
    fn swap_in(
        &self,
        table: &mut PageTable,
        residency: &mut ResidencyList,
        page_number: usize,
        swap_type: usize,
        slot: usize,
    ) -> Result<usize, VmError> {
        debug!(
            "Page fault on page {} (swap device {}, slot {})",
            page_number, swap_type, slot
        );

        let swap = self.swap_device(swap_type)?;
        let frame = self.obtain_frame(table, residency)?;

        if let Err(err) = copy_page(swap, slot, self.ram, frame) {
            lock_device(self.ram)?.put_free_frame(frame);
            return Err(err);
        }

        if let Some(entry) = table.entry_mut(page_number) {
            entry.set_present(frame);
        }
        residency.enlist(page_number);
        lock_device(swap)?.put_free_frame(slot);

        debug!("-> Page {} is resident in frame {}", page_number, frame);
        Ok(frame)
    }

    /// Swaps out the page that is resident the longest and returns its frame.
    ///
    /// On failure the victim stays resident and keeps its place in the residency list.
    fn evict(
        &self,
        table: &mut PageTable,
        residency: &mut ResidencyList,
    ) -> Result<usize, VmError> {
        let (victim, frame) = loop {
            let Some(victim) = residency.pop_victim() else {
                warn!("Found no victim page to evict");
                return Err(VmError::NoVictimAvailable);
            };

            match table.get(victim).and_then(|entry| entry.frame()) {
                Some(frame) => break (victim, frame),
                None => warn!("Skip stale victim page {}", victim),
            }
        };

        let swap = match self.swap_device(self.active_swap) {
            Ok(swap) => swap,
            Err(err) => {
                residency.restore_victim(victim);
                return Err(err);
            }
        };

        let slot = match lock_device(swap).map(|mut swap| swap.get_free_frame()) {
            Ok(Some(slot)) => slot,
            Ok(None) => {
                warn!("No free swap slot left to evict page {}", victim);
                residency.restore_victim(victim);
                return Err(VmError::NoFreeSwapSlot);
            }
            Err(err) => {
                residency.restore_victim(victim);
                return Err(err);
            }
        };

        if let Err(err) = copy_page(self.ram, frame, swap, slot) {
            if let Ok(mut swap) = lock_device(swap) {
                swap.put_free_frame(slot);
            }
            residency.restore_victim(victim);
            return Err(err);
        }

        if let Some(entry) = table.entry_mut(victim) {
            entry.set_swapped(self.active_swap, slot);
        }

        debug!(
            "Evicted page {} from frame {} to swap device {} slot {}",
            victim, frame, self.active_swap, slot
        );
        Ok(frame)
    }

    /// Gives every frame and swap slot of `table` back to its device
    pub(crate) fn release(
        &self,
        table: &mut PageTable,
        residency: &mut ResidencyList,
    ) -> Result<(), VmError> {
        let pages: Vec<usize> = table.iter_mapped().map(|(page_number, _)| page_number).collect();

        residency.clear();
        self.release_pages(table, residency, &pages)
    }

    /// Gives the frames and swap slots of `pages` back and marks them absent
    pub(crate) fn release_pages(
        &self,
        table: &mut PageTable,
        residency: &mut ResidencyList,
        pages: &[usize],
    ) -> Result<(), VmError> {
        let mut swapped = Vec::new();

        {
            let mut ram = lock_device(self.ram)?;
            for &page_number in pages {
                let Some(entry) = table.entry_mut(page_number) else {
                    continue;
                };

                if let Some(frame) = entry.frame() {
                    ram.put_free_frame(frame);
                    residency.remove(page_number);
                } else if let (Some(swap_type), Some(slot)) =
                    (entry.swap_type(), entry.swap_slot())
                {
                    swapped.push((page_number, swap_type, slot));
                } else {
                    continue;
                }

                entry.clear();
            }
        }

        for (page_number, swap_type, slot) in swapped {
            match self.swap_devices.get(swap_type) {
                Some(swap) => lock_device(swap)?.put_free_frame(slot),
                None => warn!(
                    "Page {} references unknown swap device {}",
                    page_number, swap_type
                ),
            }
        }

        Ok(())
    }
}
