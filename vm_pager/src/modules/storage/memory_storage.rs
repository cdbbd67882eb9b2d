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

use super::{check_bounds, StorageModule};
use crate::StorageError;

/// Storage that lives in a zero initialized heap buffer
pub struct MemoryStorageModule {
    data: Vec<u8>,
}

impl MemoryStorageModule {
    pub fn new(size: usize) -> Self {
        Self {
            data: vec![0u8; size],
        }
    }
}

impl StorageModule for MemoryStorageModule {
    fn read(&mut self, offset: usize, dest: &mut [u8]) -> Result<(), StorageError> {
        check_bounds(offset, dest.len(), self.data.len())?;
        dest.copy_from_slice(&self.data[offset..offset + dest.len()]);
        Ok(())
    }

    fn write(&mut self, offset: usize, src: &[u8]) -> Result<(), StorageError> {
        check_bounds(offset, src.len(), self.data.len())?;
        self.data[offset..offset + src.len()].copy_from_slice(src);
        Ok(())
    }

    fn get_max_size(&self) -> usize {
        self.data.len()
    }
}

#[cfg(test)]
mod test {
    use super::MemoryStorageModule;
    use crate::modules::storage::test::{
        test_storage_bounds, test_storage_normal, STORAGE_NORMAL_TEST_SIZE,
    };

    #[test]
    fn test_memory_storage_module_normal() {
        test_storage_normal(MemoryStorageModule::new(STORAGE_NORMAL_TEST_SIZE));
    }

    #[test]
    fn test_memory_storage_module_bounds() {
        test_storage_bounds(MemoryStorageModule::new(64));
    }
}
