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

use core::{fmt, mem::size_of, ops::Range};

use static_assertions::{const_assert, const_assert_eq};

use crate::{Region, VmConfig};

/// Entry is resident, the payload holds a frame number
const PRESENT_BIT: u32 = 1 << 31;

/// Entry is swapped out, the payload holds swap type and swap slot
const SWAPPED_BIT: u32 = 1 << 30;

const PAYLOAD_MASK: u32 = SWAPPED_BIT - 1;

const SWAP_TYPE_BITS: u32 = 5;
const SWAP_TYPE_MASK: u32 = (1 << SWAP_TYPE_BITS) - 1;
const SWAP_SLOT_SHIFT: u32 = SWAP_TYPE_BITS;
const SWAP_SLOT_MASK: u32 = PAYLOAD_MASK >> SWAP_SLOT_SHIFT;

/// Largest frame number a page table entry can hold
pub(crate) const MAX_FRAME: usize = PAYLOAD_MASK as usize;

/// Largest swap slot a page table entry can hold
pub(crate) const MAX_SWAP_SLOT: usize = SWAP_SLOT_MASK as usize;

/// Number of swap devices a process can address
pub const MAX_SWAP_DEVICES: usize = 1 << SWAP_TYPE_BITS;

const_assert_eq!(PAYLOAD_MASK & (PRESENT_BIT | SWAPPED_BIT), 0);
const_assert_eq!((SWAP_SLOT_MASK << SWAP_SLOT_SHIFT) | SWAP_TYPE_MASK, PAYLOAD_MASK);
const_assert!(size_of::<PageTableEntry>() == size_of::<u32>());

/// A page table entry.
///
/// An entry is either absent (zero), present with a frame number
/// or swapped with a swap type and a swap slot. Both setters replace
/// the whole entry, so frame and swap location never coexist.
#[derive(Clone, Copy, PartialEq, Eq, Default)]
#[repr(transparent)]
pub struct PageTableEntry(u32);

impl PageTableEntry {
    pub const ABSENT: PageTableEntry = PageTableEntry(0);

    #[inline]
    pub const fn raw(&self) -> u32 {
        self.0
    }

    #[inline]
    pub const fn is_present(&self) -> bool {
        self.0 & PRESENT_BIT != 0
    }

    #[inline]
    pub const fn is_swapped(&self) -> bool {
        self.0 & SWAPPED_BIT != 0
    }

    #[inline]
    pub const fn is_absent(&self) -> bool {
        !self.is_present() && !self.is_swapped()
    }

    /// Frame number, only if the page is resident
    #[inline]
    pub fn frame(&self) -> Option<usize> {
        self.is_present().then(|| (self.0 & PAYLOAD_MASK) as usize)
    }

    /// Index of the swap device, only if the page is swapped out
    #[inline]
    pub fn swap_type(&self) -> Option<usize> {
        self.is_swapped().then(|| (self.0 & SWAP_TYPE_MASK) as usize)
    }

    /// Slot on the swap device, only if the page is swapped out
    #[inline]
    pub fn swap_slot(&self) -> Option<usize> {
        self.is_swapped()
            .then(|| ((self.0 >> SWAP_SLOT_SHIFT) & SWAP_SLOT_MASK) as usize)
    }

    pub fn set_present(&mut self, frame: usize) {
        debug_assert!(frame <= MAX_FRAME, "frame {} does not fit", frame);
        self.0 = PRESENT_BIT | (frame as u32 & PAYLOAD_MASK);
    }

    pub fn set_swapped(&mut self, swap_type: usize, slot: usize) {
        debug_assert!(swap_type < MAX_SWAP_DEVICES, "swap type {} does not fit", swap_type);
        debug_assert!(slot <= MAX_SWAP_SLOT, "swap slot {} does not fit", slot);
        self.0 = SWAPPED_BIT
            | ((slot as u32 & SWAP_SLOT_MASK) << SWAP_SLOT_SHIFT)
            | (swap_type as u32 & SWAP_TYPE_MASK);
    }

    pub fn clear(&mut self) {
        self.0 = 0;
    }
}

impl fmt::Debug for PageTableEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(frame) = self.frame() {
            write!(f, "PageTableEntry(frame={})", frame)
        } else if let (Some(swap_type), Some(slot)) = (self.swap_type(), self.swap_slot()) {
            write!(f, "PageTableEntry(swap={}, slot={})", swap_type, slot)
        } else {
            write!(f, "PageTableEntry(absent)")
        }
    }
}

/// Splits `addr` into page number and offset inside of that page
#[inline]
pub const fn split(addr: usize, page_shift: u32) -> (usize, usize) {
    (addr >> page_shift, addr & ((1 << page_shift) - 1))
}

/// Single level page table with a fixed number of entries
pub struct PageTable {
    entries: Vec<PageTableEntry>,
    page_shift: u32,
}

impl PageTable {
    pub fn new(config: &VmConfig) -> Self {
        Self {
            entries: vec![PageTableEntry::ABSENT; config.max_pages],
            page_shift: config.page_shift,
        }
    }

    /// Number of entries
    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn page_shift(&self) -> u32 {
        self.page_shift
    }

    /// Splits a virtual address into page number and offset
    #[inline]
    pub fn split(&self, addr: usize) -> (usize, usize) {
        split(addr, self.page_shift)
    }

    /// Page numbers touched by `region`
    pub fn pages_of(&self, region: Region) -> Range<usize> {
        if !region.is_bound() {
            return 0..0;
        }

        (region.start >> self.page_shift)..((region.end - 1) >> self.page_shift) + 1
    }

    #[inline]
    pub fn get(&self, page_number: usize) -> Option<PageTableEntry> {
        self.entries.get(page_number).copied()
    }

    #[inline]
    pub(crate) fn entry_mut(&mut self, page_number: usize) -> Option<&mut PageTableEntry> {
        self.entries.get_mut(page_number)
    }

    /// Translates a page number and offset to a physical address.
    ///
    /// Returns `None` if the page is not resident.
    pub fn translate(&self, page_number: usize, offset: usize) -> Option<usize> {
        debug_assert!(offset < (1 << self.page_shift));

        let frame = self.get(page_number)?.frame()?;
        Some((frame << self.page_shift) | offset)
    }

    /// Iterates over all entries that are not absent
    pub fn iter_mapped(&self) -> impl Iterator<Item = (usize, PageTableEntry)> + '_ {
        self.entries
            .iter()
            .copied()
            .enumerate()
            .filter(|(_, entry)| !entry.is_absent())
    }

    pub(crate) fn iter_mut(&mut self) -> impl Iterator<Item = (usize, &mut PageTableEntry)> + '_ {
        self.entries.iter_mut().enumerate()
    }
}

#[cfg(test)]
mod test {
    use super::{split, PageTable, PageTableEntry, MAX_FRAME, MAX_SWAP_DEVICES, MAX_SWAP_SLOT};
    use crate::{Region, VmConfig};

    #[test]
    fn test_absent_entry() {
        let entry = PageTableEntry::default();
        assert!(entry.is_absent());
        assert!(!entry.is_present());
        assert!(!entry.is_swapped());
        assert_eq!(entry.frame(), None);
        assert_eq!(entry.swap_slot(), None);
        assert_eq!(entry.swap_type(), None);
    }

    #[test]
    fn test_present_entry() {
        let mut entry = PageTableEntry::default();
        entry.set_present(42);

        assert!(entry.is_present());
        assert!(!entry.is_swapped());
        assert_eq!(entry.frame(), Some(42));
        assert_eq!(entry.swap_slot(), None);

        entry.set_present(MAX_FRAME);
        assert_eq!(entry.frame(), Some(MAX_FRAME));
    }

    #[test]
    fn test_switch_between_representations() {
        let mut entry = PageTableEntry::default();
        entry.set_present(MAX_FRAME);
        entry.set_swapped(3, 17);

        assert!(!entry.is_present());
        assert!(entry.is_swapped());
        assert_eq!(entry.frame(), None);
        assert_eq!(entry.swap_type(), Some(3));
        assert_eq!(entry.swap_slot(), Some(17));

        entry.set_swapped(MAX_SWAP_DEVICES - 1, MAX_SWAP_SLOT);
        assert_eq!(entry.swap_type(), Some(MAX_SWAP_DEVICES - 1));
        assert_eq!(entry.swap_slot(), Some(MAX_SWAP_SLOT));

        entry.set_present(5);
        assert!(entry.is_present());
        assert!(!entry.is_swapped());
        assert_eq!(entry.frame(), Some(5));
        assert_eq!(entry.swap_slot(), None);

        entry.clear();
        assert!(entry.is_absent());
        assert_eq!(entry.raw(), 0);
    }

    #[test]
    fn test_split() {
        assert_eq!(split(0, 8), (0, 0));
        assert_eq!(split(255, 8), (0, 255));
        assert_eq!(split(256, 8), (1, 0));
        assert_eq!(split(1029, 8), (4, 5));
        assert_eq!(split(1029, 9), (2, 5));
    }

    #[test]
    fn test_pages_of() {
        let table = PageTable::new(&VmConfig::default());
        assert_eq!(table.pages_of(Region::UNBOUND), 0..0);
        assert_eq!(table.pages_of(Region::new(0, 256)), 0..1);
        assert_eq!(table.pages_of(Region::new(10, 257)), 0..2);
        assert_eq!(table.pages_of(Region::new(512, 600)), 2..3);
    }

    #[test]
    fn test_translate() {
        let mut table = PageTable::new(&VmConfig::default());
        assert_eq!(table.len(), VmConfig::default().max_pages);

        table.entry_mut(4).unwrap().set_present(9);
        table.entry_mut(5).unwrap().set_swapped(0, 2);

        let (page, offset) = table.split(4 * 256 + 17);
        assert_eq!(table.translate(page, offset), Some(9 * 256 + 17));
        assert_eq!(table.translate(5, 0), None);
        assert_eq!(table.translate(6, 0), None);
        assert_eq!(table.translate(table.len(), 0), None);

        let mapped: Vec<usize> = table.iter_mapped().map(|(page, _)| page).collect();
        assert_eq!(mapped, vec![4, 5]);
    }
}
