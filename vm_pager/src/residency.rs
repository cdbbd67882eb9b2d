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

/// Resident page numbers in the order they became resident.
///
/// The oldest page is the next eviction victim.
#[derive(Debug, Default)]
pub struct ResidencyList {
    pages: VecDeque<usize>,
}

impl ResidencyList {
    pub fn new() -> Self {
        Self {
            pages: VecDeque::new(),
        }
    }

    /// Return `true` if the list is empty
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.pages.len()
    }

    /// Appends a page that just became resident
    pub fn enlist(&mut self, page_number: usize) {
        debug_assert!(
            !self.pages.contains(&page_number),
            "page {} is already resident",
            page_number
        );
        self.pages.push_back(page_number);
    }

    /// Removes and returns the page that is resident the longest
    pub fn pop_victim(&mut self) -> Option<usize> {
        self.pages.pop_front()
    }

    /// Puts a victim back at its old position after a failed eviction
    pub fn restore_victim(&mut self, page_number: usize) {
        self.pages.push_front(page_number);
    }

    /// Removes `page_number`, returns `false` if it was not resident
    pub fn remove(&mut self, page_number: usize) -> bool {
        match self.pages.iter().position(|&page| page == page_number) {
            Some(index) => {
                self.pages.remove(index);
                true
            }
            None => false,
        }
    }

    pub fn contains(&self, page_number: usize) -> bool {
        self.pages.contains(&page_number)
    }

    /// Iterates from the oldest to the youngest page
    pub fn iter(&self) -> impl Iterator<Item = usize> + '_ {
        self.pages.iter().copied()
    }

    pub fn clear(&mut self) {
        self.pages.clear();
    }
}

#[cfg(test)]
mod test {
    use super::ResidencyList;

    #[test]
    fn test_fifo_order() {
        let mut list = ResidencyList::new();
        assert!(list.is_empty());
        assert_eq!(list.pop_victim(), None);

        list.enlist(1);
        list.enlist(2);
        list.enlist(3);
        assert_eq!(list.len(), 3);
        assert_eq!(list.iter().collect::<Vec<_>>(), vec![1, 2, 3]);

        assert_eq!(list.pop_victim(), Some(1));
        list.enlist(1);
        assert_eq!(list.pop_victim(), Some(2));
        assert_eq!(list.pop_victim(), Some(3));
        assert_eq!(list.pop_victim(), Some(1));
        assert!(list.is_empty());
    }

    #[test]
    fn test_restore_victim() {
        let mut list = ResidencyList::new();
        list.enlist(7);
        list.enlist(8);

        let victim = list.pop_victim().unwrap();
        assert!(!list.contains(victim));
        list.restore_victim(victim);

        assert_eq!(list.iter().collect::<Vec<_>>(), vec![7, 8]);
    }

    #[test]
    fn test_remove() {
        let mut list = ResidencyList::new();
        list.enlist(1);
        list.enlist(2);
        list.enlist(3);

        assert!(list.remove(2));
        assert!(!list.remove(2));
        assert_eq!(list.iter().collect::<Vec<_>>(), vec![1, 3]);
    }
}
