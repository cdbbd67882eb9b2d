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

use crate::{util::align_up, FreeList, Region};

/// A contiguous, growable part of the address space (vm area).
///
/// `[start, sbrk)` was handed out at some point, `[sbrk, end)` is reserved
/// but was never used. Invariant: `start <= sbrk <= end`.
#[derive(Debug)]
pub struct Segment {
    id: usize,
    start: usize,
    end: usize,
    sbrk: usize,
    free_list: FreeList,
}

impl Segment {
    /// Creates an empty segment at `start`
    pub fn new(id: usize, start: usize) -> Self {
        Self {
            id,
            start,
            end: start,
            sbrk: start,
            free_list: FreeList::new(),
        }
    }

    #[inline]
    pub fn id(&self) -> usize {
        self.id
    }

    #[inline]
    pub fn start(&self) -> usize {
        self.start
    }

    #[inline]
    pub fn end(&self) -> usize {
        self.end
    }

    #[inline]
    pub fn sbrk(&self) -> usize {
        self.sbrk
    }

    #[inline]
    pub fn range(&self) -> Region {
        Region::new(self.start, self.end)
    }

    #[inline]
    pub fn free_list(&self) -> &FreeList {
        &self.free_list
    }

    #[inline]
    pub(crate) fn free_list_mut(&mut self) -> &mut FreeList {
        &mut self.free_list
    }

    #[inline]
    pub fn contains_region(&self, region: &Region) -> bool {
        self.start <= region.start && region.end <= self.end
    }

    /// Returns `true` if `range` touches this segment.
    ///
    /// The base address of an empty segment counts as occupied.
    pub fn occupies(&self, range: &Region) -> bool {
        let occupied = Region::new(self.start, self.end.max(self.start + 1));
        occupied.overlaps(range)
    }

    /// Takes `size` bytes from the free list
    pub(crate) fn reuse(&mut self, size: usize) -> Option<Region> {
        let region = self.free_list.take_first_fit(size)?;
        self.sbrk = self.sbrk.max(region.end);

        Some(region)
    }

    /// The range this segment would grow by to fit `size` more bytes.
    ///
    /// Returns `None` if the end of that range does not fit into `usize`.
    pub(crate) fn planned_growth(&self, size: usize, page_shift: u32) -> Option<Region> {
        let end = self.end.checked_add(align_up(size, page_shift)?)?;
        Some(Region::new(self.end, end))
    }

    /// Grows the segment to the end of `growth` and returns the first `size` bytes of it.
    ///
    /// The rest of `growth` is put on the free list.
    pub(crate) fn commit_growth(&mut self, size: usize, growth: Region) -> Region {
        debug_assert_eq!(growth.start, self.end);
        debug_assert!(size <= growth.size());

        let region = Region::new(growth.start, growth.start + size);
        self.end = growth.end;
        self.sbrk = region.end;
        self.free_list.enlist(Region::new(region.end, growth.end));

        region
    }
}
