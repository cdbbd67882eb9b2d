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

use env_logger::{Builder, Env};

use crate::{MemoryDevice, Process, SharedDevice, VmConfig};

mod concurrency;

pub(crate) const TEST_PAGE_SIZE: usize = 256;

/// Logs to the test output, set `RUST_LOG` to see anything
pub(crate) fn init_test_logger() {
    let _ = Builder::from_env(Env::default())
        .format_module_path(false)
        .is_test(true)
        .try_init();
}

pub(crate) fn get_test_config() -> VmConfig {
    VmConfig {
        page_shift: 8,
        max_pages: 64,
        symbol_table_size: 30,
    }
}

/// Physical memory and swap device with the given number of frames
pub(crate) fn get_test_devices(ram_frames: usize, swap_frames: usize) -> (SharedDevice, SharedDevice) {
    let page_shift = get_test_config().page_shift;

    (
        MemoryDevice::with_memory(ram_frames, page_shift).into_shared(),
        MemoryDevice::with_memory(swap_frames, page_shift).into_shared(),
    )
}

pub(crate) fn get_test_process(pid: u32, ram: &SharedDevice, swap: &SharedDevice) -> Process {
    init_test_logger();
    Process::new(pid, 0, get_test_config(), ram.clone(), swap.clone()).unwrap()
}

pub(crate) fn free_frames(device: &SharedDevice) -> usize {
    device.lock().unwrap().free_frame_count()
}
