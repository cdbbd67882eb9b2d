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

use log::{trace, warn};

use crate::{
    pager::Pager, PageTable, Region, ResidencyList, Segment, VmConfig, VmError,
};

/// Symbol table entry: the range of a region id and the segment it lives in
#[derive(Debug, Clone, Copy, Default)]
struct Symbol {
    region: Region,
    segment: usize,
}

/// Private address space of one process.
///
/// Not synchronized: exactly one thread may use an address space at a time,
/// [`Process`](crate::Process) enforces this with a lock.
pub struct AddressSpace {
    config: VmConfig,
    page_table: PageTable,
    residency: ResidencyList,

    /// segment id is the index
    segments: Vec<Segment>,
    symbols: Vec<Symbol>,
}

impl AddressSpace {
    /// Creates an address space with an empty segment 0 at address 0
    pub fn new(config: VmConfig) -> Self {
        Self {
            page_table: PageTable::new(&config),
            residency: ResidencyList::new(),
            segments: vec![Segment::new(0, 0)],
            symbols: vec![Symbol::default(); config.symbol_table_size],
            config,
        }
    }

    #[inline]
    pub fn config(&self) -> &VmConfig {
        &self.config
    }

    #[inline]
    pub fn page_table(&self) -> &PageTable {
        &self.page_table
    }

    #[inline]
    pub fn residency(&self) -> &ResidencyList {
        &self.residency
    }

    #[inline]
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    #[inline]
    pub fn segment(&self, segment_id: usize) -> Option<&Segment> {
        self.segments.get(segment_id)
    }

    /// Current symbol table entry of `region_id`, [`Region::UNBOUND`] if it is not allocated
    pub fn symbol(&self, region_id: usize) -> Result<Region, VmError> {
        self.check_region_id(region_id)?;
        Ok(self.symbols[region_id].region)
    }

    /// All allocated regions with their ids
    pub fn bound_regions(&self) -> impl Iterator<Item = (usize, Region)> + '_ {
        self.symbols
            .iter()
            .enumerate()
            .filter(|(_, symbol)| symbol.region.is_bound())
            .map(|(id, symbol)| (id, symbol.region))
    }

    /// Creates a new empty segment at `start` and returns its id
    pub fn add_segment(&mut self, start: usize) -> Result<usize, VmError> {
        if start >= self.config.max_address() {
            return Err(VmError::AddressSpaceExhausted(start));
        }

        let base = Region::new(start, start + 1);
        if self.segments.iter().any(|segment| segment.occupies(&base)) {
            return Err(VmError::SegmentOverlap {
                start: base.start,
                end: base.end,
            });
        }

        let id = self.segments.len();
        self.segments.push(Segment::new(id, start));

        trace!("Added segment {} at {}", id, start);
        Ok(id)
    }

    #[inline]
    fn check_region_id(&self, region_id: usize) -> Result<(), VmError> {
        if region_id < self.symbols.len() {
            Ok(())
        } else {
            Err(VmError::InvalidRegionId(region_id))
        }
    }

    /// Allocates `size` bytes in `segment_id`, binds them to `region_id`
    /// and makes every touched page resident. Returns the start address.
    ///
    /// If a page cannot be made resident, the pages mapped by this call are
    /// released again and the range goes back to the free list.
    pub(crate) fn allocate_region(
        &mut self,
        pager: &Pager<'_>,
        segment_id: usize,
        region_id: usize,
        size: usize,
    ) -> Result<usize, VmError> {
        let region = self.reserve_region(segment_id, region_id, size)?;

        // absent pages cannot hold data of another region
        let fresh_pages: Vec<usize> = self
            .page_table
            .pages_of(region)
            .filter(|&page_number| {
                self.page_table
                    .get(page_number)
                    .map_or(false, |entry| entry.is_absent())
            })
            .collect();

        if let Err(err) =
            pager.ensure_range_resident(&mut self.page_table, &mut self.residency, region)
        {
            warn!(
                "Could not make region {} resident, undo allocation: {}",
                region_id, err
            );
            if let Err(release_err) =
                pager.release_pages(&mut self.page_table, &mut self.residency, &fresh_pages)
            {
                warn!(
                    "Could not release pages of region {}: {}",
                    region_id, release_err
                );
            }
            self.symbols[region_id] = Symbol::default();
            self.segments[segment_id].free_list_mut().enlist(region);
            return Err(err);
        }

        Ok(region.start)
    }

    /// Address space bookkeeping of an allocation without touching any page
    pub(crate) fn reserve_region(
        &mut self,
        segment_id: usize,
        region_id: usize,
        size: usize,
    ) -> Result<Region, VmError> {
        self.check_region_id(region_id)?;
        if self.symbols[region_id].region.is_bound() {
            return Err(VmError::RegionAlreadyBound(region_id));
        }
        if size == 0 {
            return Err(VmError::InvalidSize);
        }

        let segment = self
            .segments
            .get_mut(segment_id)
            .ok_or(VmError::InvalidSegmentId(segment_id))?;

        let region = match segment.reuse(size) {
            Some(region) => {
                trace!("Reuse free range {:?} for region {}", region, region_id);
                region
            }
            None => {
                let growth = segment
                    .planned_growth(size, self.config.page_shift)
                    .ok_or(VmError::AddressSpaceExhausted(segment.end()))?;
                self.validate_growth(segment_id, growth)?;

                trace!("Grow segment {} by {:?}", segment_id, growth);
                self.segments[segment_id].commit_growth(size, growth)
            }
        };

        self.symbols[region_id] = Symbol {
            region,
            segment: segment_id,
        };

        Ok(region)
    }

    /// Checks that `growth` stays inside of the page table and does not overlap any other segment
    fn validate_growth(&self, segment_id: usize, growth: Region) -> Result<(), VmError> {
        if growth.end > self.config.max_address() {
            return Err(VmError::AddressSpaceExhausted(growth.end));
        }

        let overlap = self
            .segments
            .iter()
            .any(|segment| segment.id() != segment_id && segment.occupies(&growth));
        if overlap {
            warn!(
                "Growing segment {} by {:?} would overlap another segment",
                segment_id, growth
            );
            return Err(VmError::SegmentOverlap {
                start: growth.start,
                end: growth.end,
            });
        }

        Ok(())
    }

    /// Unbinds `region_id` and puts its range on the free list of its segment.
    ///
    /// Memory content is not cleared.
    pub fn free_region(&mut self, region_id: usize) -> Result<Region, VmError> {
        self.check_region_id(region_id)?;

        let symbol = self.symbols[region_id];
        if !symbol.region.is_bound() {
            return Err(VmError::RegionNotBound(region_id));
        }

        let segment = self
            .segments
            .get_mut(symbol.segment)
            .ok_or(VmError::InvalidSegmentId(symbol.segment))?;

        self.symbols[region_id] = Symbol::default();
        segment.free_list_mut().enlist(symbol.region);

        trace!("Freed region {} {:?}", region_id, symbol.region);
        Ok(symbol.region)
    }

    /// Virtual address of byte `offset` inside of `region_id`
    pub fn resolve(&self, region_id: usize, offset: usize) -> Result<usize, VmError> {
        self.check_region_id(region_id)?;

        let symbol = self.symbols[region_id];
        if !symbol.region.is_bound() {
            return Err(VmError::RegionNotBound(region_id));
        }
        if self.segments.get(symbol.segment).is_none() {
            return Err(VmError::InvalidSegmentId(symbol.segment));
        }
        if offset >= symbol.region.size() {
            return Err(VmError::OffsetOutOfBounds { region_id, offset });
        }

        Ok(symbol.region.start + offset)
    }

    /// Makes the page of `addr` resident and returns its physical address
    pub(crate) fn translate(&mut self, pager: &Pager<'_>, addr: usize) -> Result<usize, VmError> {
        let (page_number, offset) = self.page_table.split(addr);
        let frame = pager.ensure_resident(&mut self.page_table, &mut self.residency, page_number)?;

        Ok((frame << self.config.page_shift) | offset)
    }

    /// Gives all frames and swap slots back to their devices.
    ///
    /// All regions and segments are dropped as well, only an empty segment 0 remains.
    pub(crate) fn release(&mut self, pager: &Pager<'_>) -> Result<(), VmError> {
        self.symbols.fill(Symbol::default());
        self.segments.clear();
        self.segments.push(Segment::new(0, 0));

        pager.release(&mut self.page_table, &mut self.residency)
    }
}
