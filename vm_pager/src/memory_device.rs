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

use std::sync::{Arc, Mutex, MutexGuard};

use log::trace;

use crate::{
    modules::storage::{MemoryStorageModule, StorageModule},
    StorageError, VmError,
};

/// A memory device that is shared between all processes using it.
///
/// Frame allocation and byte accesses are serialized by the mutex.
pub type SharedDevice = Arc<Mutex<MemoryDevice>>;

/// A page granular memory device (physical memory or swap storage).
///
/// The device is split into frames of `1 << page_shift` bytes and keeps
/// track of which of them are free.
pub struct MemoryDevice {
    storage: Box<dyn StorageModule + Send>,
    page_shift: u32,
    page_count: usize,

    /// free frames, the last item is handed out next
    free_frames: Vec<usize>,
}

impl MemoryDevice {
    /// Creates a new device on top of `storage`.
    ///
    /// Trailing bytes that do not fill a whole frame are not used.
    pub fn new<S: StorageModule + Send + 'static>(storage: S, page_shift: u32) -> Self {
        let page_count = storage.get_max_size() >> page_shift;

        Self {
            storage: Box::new(storage),
            page_shift,
            page_count,
            free_frames: (0..page_count).rev().collect(),
        }
    }

    /// Creates a new device that is backed by a heap buffer with `page_count` frames
    pub fn with_memory(page_count: usize, page_shift: u32) -> Self {
        Self::new(
            MemoryStorageModule::new(page_count << page_shift),
            page_shift,
        )
    }

    pub fn into_shared(self) -> SharedDevice {
        Arc::new(Mutex::new(self))
    }

    #[inline]
    pub fn page_shift(&self) -> u32 {
        self.page_shift
    }

    #[inline]
    pub fn page_size(&self) -> usize {
        1 << self.page_shift
    }

    /// Total number of frames of this device
    #[inline]
    pub fn page_count(&self) -> usize {
        self.page_count
    }

    #[inline]
    pub fn free_frame_count(&self) -> usize {
        self.free_frames.len()
    }

    /// Takes a frame out of the free pool
    pub fn get_free_frame(&mut self) -> Option<usize> {
        let frame = self.free_frames.pop();
        trace!("get free frame: {:?}", frame);
        frame
    }

    /// Gives `frame` back to the free pool
    pub fn put_free_frame(&mut self, frame: usize) {
        debug_assert!(frame < self.page_count, "frame {} out of range", frame);
        debug_assert!(
            !self.free_frames.contains(&frame),
            "frame {} is already free",
            frame
        );

        trace!("put free frame: {}", frame);
        self.free_frames.push(frame);
    }

    /// Reads one byte at the physical address `addr`
    pub fn read(&mut self, addr: usize) -> Result<u8, StorageError> {
        let mut buffer = [0u8; 1];
        self.storage.read(addr, &mut buffer)?;
        Ok(buffer[0])
    }

    /// Writes one byte to the physical address `addr`
    pub fn write(&mut self, addr: usize, value: u8) -> Result<(), StorageError> {
        self.storage.write(addr, &[value])
    }

    /// Reads the whole content of `frame` into `dest`
    pub fn read_page(&mut self, frame: usize, dest: &mut [u8]) -> Result<(), StorageError> {
        debug_assert_eq!(dest.len(), self.page_size());
        self.storage.read(frame << self.page_shift, dest)
    }

    /// Overwrites the whole content of `frame` with `src`
    pub fn write_page(&mut self, frame: usize, src: &[u8]) -> Result<(), StorageError> {
        debug_assert_eq!(src.len(), self.page_size());
        self.storage.write(frame << self.page_shift, src)
    }
}

/// Locks `device`, a poisoned lock is reported as [`VmError::DevicePoisoned`]
pub(crate) fn lock_device(device: &SharedDevice) -> Result<MutexGuard<'_, MemoryDevice>, VmError> {
    device.lock().map_err(|_| VmError::DevicePoisoned)
}

/// Copies one page from `src_frame` of `src` to `dst_frame` of `dst`.
///
/// Only one of the two device locks is held at a time.
pub(crate) fn copy_page(
    src: &SharedDevice,
    src_frame: usize,
    dst: &SharedDevice,
    dst_frame: usize,
) -> Result<(), VmError> {
    let mut buffer = {
        let mut device = lock_device(src)?;
        let mut buffer = vec![0u8; device.page_size()];
        device.read_page(src_frame, &mut buffer)?;
        buffer
    };

    let mut device = lock_device(dst)?;
    buffer.resize(device.page_size(), 0);
    device.write_page(dst_frame, &buffer)?;

    Ok(())
}

/// Overwrites `frame` of `device` with zeros
pub(crate) fn clear_page(device: &SharedDevice, frame: usize) -> Result<(), VmError> {
    let mut device = lock_device(device)?;
    let buffer = vec![0u8; device.page_size()];
    device.write_page(frame, &buffer)?;

    Ok(())
}

#[cfg(test)]
mod test {
    use super::{clear_page, copy_page, MemoryDevice};

    #[test]
    fn test_frame_pool() {
        let mut device = MemoryDevice::with_memory(3, 8);
        assert_eq!(device.page_count(), 3);
        assert_eq!(device.free_frame_count(), 3);

        assert_eq!(device.get_free_frame(), Some(0));
        assert_eq!(device.get_free_frame(), Some(1));
        assert_eq!(device.get_free_frame(), Some(2));
        assert_eq!(device.get_free_frame(), None);

        // freed frames are handed out again first
        device.put_free_frame(1);
        assert_eq!(device.free_frame_count(), 1);
        assert_eq!(device.get_free_frame(), Some(1));
        assert_eq!(device.get_free_frame(), None);
    }

    #[test]
    fn test_partial_frames_are_unused() {
        use crate::modules::storage::MemoryStorageModule;

        let device = MemoryDevice::new(MemoryStorageModule::new(1000), 8);
        assert_eq!(device.page_count(), 3);
    }

    #[test]
    fn test_byte_access() {
        let mut device = MemoryDevice::with_memory(2, 8);
        device.write(0, 1).unwrap();
        device.write(511, 0xAB).unwrap();

        assert_eq!(device.read(0).unwrap(), 1);
        assert_eq!(device.read(1).unwrap(), 0);
        assert_eq!(device.read(511).unwrap(), 0xAB);
        assert!(device.read(512).is_err());
    }

    #[test]
    fn test_copy_and_clear_page() {
        let ram = MemoryDevice::with_memory(2, 4).into_shared();
        let swap = MemoryDevice::with_memory(4, 4).into_shared();

        {
            let mut ram = ram.lock().unwrap();
            for i in 0..16 {
                ram.write(16 + i, i as u8 + 1).unwrap();
            }
        }

        copy_page(&ram, 1, &swap, 3).unwrap();
        {
            let mut swap = swap.lock().unwrap();
            for i in 0..16 {
                assert_eq!(swap.read(48 + i).unwrap(), i as u8 + 1);
            }
            assert_eq!(swap.read(47).unwrap(), 0);
        }

        // copy within the same device
        copy_page(&ram, 1, &ram, 0).unwrap();
        clear_page(&ram, 1).unwrap();
        {
            let mut ram = ram.lock().unwrap();
            for i in 0..16 {
                assert_eq!(ram.read(i).unwrap(), i as u8 + 1);
                assert_eq!(ram.read(16 + i).unwrap(), 0);
            }
        }
    }
}
