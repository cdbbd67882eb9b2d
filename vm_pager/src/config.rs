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

use crate::{page_table::MAX_FRAME, VmError};

/// Layout parameters of an address space
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VmConfig {
    /// Page size is `1 << page_shift` bytes
    pub page_shift: u32,

    /// Number of page table entries, this also limits the virtual address range
    pub max_pages: usize,

    /// Number of region ids of the symbol table: `[0, symbol_table_size)`
    pub symbol_table_size: usize,
}

impl Default for VmConfig {
    fn default() -> Self {
        Self {
            page_shift: 8,
            max_pages: 1 << 14,
            symbol_table_size: 30,
        }
    }
}

impl VmConfig {
    #[inline]
    pub const fn page_size(&self) -> usize {
        1 << self.page_shift
    }

    /// First virtual address that is not covered by the page table
    #[inline]
    pub const fn max_address(&self) -> usize {
        self.max_pages << self.page_shift
    }

    pub fn validate(&self) -> Result<(), VmError> {
        if self.page_shift == 0 || self.page_shift > 16 {
            return Err(VmError::InvalidConfig("page shift has to be in 1..=16"));
        }
        if self.max_pages == 0 || self.max_pages > MAX_FRAME + 1 {
            return Err(VmError::InvalidConfig(
                "page count has to fit into a page table entry",
            ));
        }
        if self.symbol_table_size == 0 {
            return Err(VmError::InvalidConfig("symbol table cannot be empty"));
        }

        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::VmConfig;
    use crate::VmError;

    #[test]
    fn test_default_config() {
        let config = VmConfig::default();
        assert_eq!(config.page_size(), 256);
        assert_eq!(config.max_address(), 256 * (1 << 14));
        config.validate().unwrap();
    }

    #[test]
    fn test_invalid_config() {
        let config = VmConfig {
            page_shift: 0,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(VmError::InvalidConfig(_))));

        let config = VmConfig {
            symbol_table_size: 0,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(VmError::InvalidConfig(_))));

        let config = VmConfig {
            max_pages: 0,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(VmError::InvalidConfig(_))));
    }
}
