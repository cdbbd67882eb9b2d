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

use std::thread;

use env_logger::{Builder, Env};
use log::{error, info};
use vm_pager::{
    modules::storage::FileStorageModule, MemoryDevice, Process, SharedDevice, VmConfig, VmError,
};

const RAM_FRAMES: usize = 8;
const SWAP_FRAMES: usize = 128;
const REGIONS: usize = 10;

fn run_process(process: &Process) -> Result<(), VmError> {
    let pid = process.pid() as usize;

    for region_id in 0..REGIONS {
        let size = 100 + region_id * 97;
        let start = process.alloc(size, region_id)?;
        info!("Process {}: region {} at {}..{}", pid, region_id, start, start + size);

        for offset in 0..size {
            process.write(region_id, offset, (pid + region_id + offset) as u8)?;
        }
    }

    for region_id in 0..REGIONS {
        let size = process.region(region_id)?.size();
        for offset in 0..size {
            let value = process.read(region_id, offset)?;
            if value != (pid + region_id + offset) as u8 {
                error!(
                    "Process {}: region {} offset {} holds {} after paging",
                    pid, region_id, offset, value
                );
            }
        }
    }

    // every second region is given back and allocated again
    for region_id in (0..REGIONS).step_by(2) {
        process.free(region_id)?;
    }
    for region_id in (0..REGIONS).step_by(2) {
        let start = process.alloc(50, region_id)?;
        info!("Process {}: region {} reused at {}", pid, region_id, start);
    }

    Ok(())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    Builder::from_env(Env::default())
        .filter_level(log::LevelFilter::Info)
        .format_module_path(false)
        .init();

    let config = VmConfig::default();

    let ram = MemoryDevice::with_memory(RAM_FRAMES, config.page_shift).into_shared();
    let storage = FileStorageModule::new(
        "paging_demo_swap.tmp".to_string(),
        SWAP_FRAMES << config.page_shift,
    )?;
    let swap: SharedDevice = MemoryDevice::new(storage, config.page_shift).into_shared();

    let mut processes = (1..=2)
        .map(|pid| Process::new(pid, 0, config, ram.clone(), swap.clone()))
        .collect::<Result<Vec<_>, _>>()?;

    // half of the frames for each process before they start competing
    for process in &processes {
        process.alloc((RAM_FRAMES / 2) << config.page_shift, REGIONS)?;
    }

    thread::scope(|scope| {
        for process in &processes {
            scope.spawn(move || {
                if let Err(err) = run_process(process) {
                    error!("Process {} failed: {}", process.pid(), err);
                }
            });
        }
    });

    for process in &processes {
        info!(
            "Process {}: resident pages {:?}",
            process.pid(),
            process.resident_pages()?
        );
    }

    for process in &mut processes {
        process.terminate()?;
    }

    let ram = ram.lock().map_err(|_| VmError::DevicePoisoned)?;
    let swap = swap.lock().map_err(|_| VmError::DevicePoisoned)?;
    info!(
        "Free frames: {}/{} in memory, {}/{} in swap",
        ram.free_frame_count(),
        ram.page_count(),
        swap.free_frame_count(),
        swap.page_count()
    );

    Ok(())
}
