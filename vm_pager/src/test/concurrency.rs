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

use super::{free_frames, get_test_devices, get_test_process, TEST_PAGE_SIZE};

fn gen_number(pid: u32, region_id: usize, offset: usize) -> u8 {
    (pid as usize * 17 + region_id * 31 + offset * 7) as u8
}

#[test]
fn test_processes_share_devices() {
    const REGIONS: usize = 6;
    const REGION_SIZE: usize = 300;

    let (ram, swap) = get_test_devices(4, 32);
    let processes: Vec<_> = (1..=2)
        .map(|pid| get_test_process(pid, &ram, &swap))
        .collect();

    // every process gets its share of frames before the threads start
    for process in &processes {
        process.alloc(2 * TEST_PAGE_SIZE, 0).unwrap();
    }
    assert_eq!(free_frames(&ram), 0);

    thread::scope(|scope| {
        for process in &processes {
            scope.spawn(move || {
                let pid = process.pid();

                for region_id in 1..REGIONS {
                    process.alloc(REGION_SIZE, region_id).unwrap();
                    for offset in 0..REGION_SIZE {
                        process
                            .write(region_id, offset, gen_number(pid, region_id, offset))
                            .unwrap();
                    }
                }

                for region_id in 1..REGIONS {
                    for offset in 0..REGION_SIZE {
                        assert_eq!(
                            process.read(region_id, offset).unwrap(),
                            gen_number(pid, region_id, offset)
                        );
                    }
                }

                assert_eq!(process.resident_pages().unwrap().len(), 2);
            });
        }
    });

    drop(processes);
    assert_eq!(free_frames(&ram), 4);
    assert_eq!(free_frames(&swap), 32);
}
