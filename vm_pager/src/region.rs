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

use std::collections::VecDeque;

/// A byte range `[start, end)` of the virtual address space
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Region {
    pub start: usize,
    pub end: usize,
}

impl Region {
    /// Symbol table sentinel of a region id that is not allocated
    pub const UNBOUND: Region = Region { start: 0, end: 0 };

    #[inline]
    pub const fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    #[inline]
    pub const fn size(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    /// A bound region covers at least one byte
    #[inline]
    pub const fn is_bound(&self) -> bool {
        self.start < self.end
    }

    #[inline]
    pub const fn contains(&self, addr: usize) -> bool {
        self.start <= addr && addr < self.end
    }

    #[inline]
    pub const fn overlaps(&self, other: &Region) -> bool {
        self.start < other.end && other.start < self.end
    }
}

/// Reclaimed ranges that can be handed out again.
///
/// Newly enlisted ranges are searched first. Adjacent ranges are not merged.
#[derive(Debug, Default)]
pub struct FreeList {
    nodes: VecDeque<Region>,
}

impl FreeList {
    pub fn new() -> Self {
        Self {
            nodes: VecDeque::new(),
        }
    }

    /// Return `true` if the list is empty
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Adds `region` to the front of the list.
    ///
    /// Returns `false` and leaves the list untouched if `region` is empty.
    pub fn enlist(&mut self, region: Region) -> bool {
        if !region.is_bound() {
            return false;
        }

        debug_assert!(
            self.nodes.iter().all(|node| !node.overlaps(&region)),
            "{:?} is already free",
            region
        );

        self.nodes.push_front(region);
        true
    }

    /// Takes `size` bytes from the first node that is big enough.
    ///
    /// The node shrinks from its start or is removed if it is used up.
    pub fn take_first_fit(&mut self, size: usize) -> Option<Region> {
        let index = self.nodes.iter().position(|node| node.size() >= size)?;
        let node = &mut self.nodes[index];
        let region = Region::new(node.start, node.start + size);

        if node.size() == size {
            self.nodes.remove(index);
        } else {
            node.start += size;
        }

        Some(region)
    }

    /// Iterates over the nodes in search order
    pub fn iter(&self) -> impl Iterator<Item = Region> + '_ {
        self.nodes.iter().copied()
    }

    /// Sum of the sizes of all nodes
    pub fn capacity(&self) -> usize {
        self.nodes.iter().map(Region::size).sum()
    }
}

#[cfg(test)]
mod test {
    use super::{FreeList, Region};

    #[test]
    fn test_region() {
        assert!(!Region::UNBOUND.is_bound());
        assert_eq!(Region::UNBOUND.size(), 0);

        let region = Region::new(10, 20);
        assert!(region.is_bound());
        assert_eq!(region.size(), 10);
        assert!(region.contains(10));
        assert!(!region.contains(20));

        assert!(region.overlaps(&Region::new(15, 30)));
        assert!(region.overlaps(&Region::new(0, 11)));
        assert!(region.overlaps(&Region::new(12, 13)));
        assert!(region.overlaps(&Region::new(0, 100)));
        assert!(!region.overlaps(&Region::new(20, 30)));
        assert!(!region.overlaps(&Region::new(0, 10)));
    }

    #[test]
    fn test_enlist_rejects_empty() {
        let mut list = FreeList::new();
        assert!(!list.enlist(Region::new(5, 5)));
        assert!(!list.enlist(Region::UNBOUND));
        assert!(list.is_empty());
    }

    #[test]
    fn test_first_fit_shrinks_node() {
        let mut list = FreeList::new();
        list.enlist(Region::new(100, 200));

        assert_eq!(list.take_first_fit(30), Some(Region::new(100, 130)));
        assert_eq!(list.iter().collect::<Vec<_>>(), vec![Region::new(130, 200)]);
        assert_eq!(list.capacity(), 70);
    }

    #[test]
    fn test_first_fit_removes_used_up_node() {
        let mut list = FreeList::new();
        list.enlist(Region::new(0, 10));
        list.enlist(Region::new(50, 60));

        // newest node is searched first
        assert_eq!(list.take_first_fit(10), Some(Region::new(50, 60)));
        assert_eq!(list.len(), 1);
        assert_eq!(list.take_first_fit(10), Some(Region::new(0, 10)));
        assert!(list.is_empty());
        assert_eq!(list.take_first_fit(1), None);
    }

    #[test]
    fn test_first_fit_skips_small_nodes() {
        let mut list = FreeList::new();
        list.enlist(Region::new(0, 100));
        list.enlist(Region::new(200, 210));
        list.enlist(Region::new(300, 305));

        assert_eq!(list.take_first_fit(20), Some(Region::new(0, 20)));
        assert_eq!(
            list.iter().collect::<Vec<_>>(),
            vec![Region::new(300, 305), Region::new(200, 210), Region::new(20, 100)]
        );

        assert_eq!(list.take_first_fit(200), None);
        assert_eq!(list.capacity(), 5 + 10 + 80);
    }
}
