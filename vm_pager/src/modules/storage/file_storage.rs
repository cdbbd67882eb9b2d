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

use std::{
    fs::{remove_file, File},
    io::{Read, Seek, SeekFrom, Write},
    mem::ManuallyDrop,
    path::Path,
};

use super::{check_bounds, StorageModule};
use crate::StorageError;

/// Storage that is backed by a file, typically used for swap devices.
///
/// The file is truncated on creation and removed again once this module is dropped.
pub struct FileStorageModule {
    /// underlying file
    file: ManuallyDrop<File>,

    /// path of file, save for deleting file later
    file_path: String,

    /// cached file size, so no `metadata` call necessary
    file_size: usize,
}

impl FileStorageModule {
    pub fn new(filepath: String, size: usize) -> std::io::Result<Self> {
        let file = File::options()
            .read(true)
            .write(true)
            .truncate(true)
            .create(true)
            .open(filepath.as_str())?;

        file.set_len(size as u64)?;

        Ok(Self {
            file: ManuallyDrop::new(file),
            file_path: filepath,
            file_size: size,
        })
    }
}

impl StorageModule for FileStorageModule {
    fn read(&mut self, offset: usize, dest: &mut [u8]) -> Result<(), StorageError> {
        check_bounds(offset, dest.len(), self.file_size)?;

        self.file.seek(SeekFrom::Start(offset as u64))?;
        self.file.read_exact(dest)?;

        Ok(())
    }

    fn write(&mut self, offset: usize, src: &[u8]) -> Result<(), StorageError> {
        check_bounds(offset, src.len(), self.file_size)?;

        self.file.seek(SeekFrom::Start(offset as u64))?;
        self.file.write_all(src)?;

        Ok(())
    }

    fn get_max_size(&self) -> usize {
        self.file_size
    }
}

impl Drop for FileStorageModule {
    fn drop(&mut self) {
        // close file before removing it
        unsafe {
            ManuallyDrop::drop(&mut self.file);
        }

        if Path::new(self.file_path.as_str()).exists() {
            let _ = remove_file(self.file_path.as_str());
        }
    }
}
