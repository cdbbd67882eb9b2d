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

/// Rounds `size` up to the next multiple of `1 << shift`, `None` on overflow
#[inline]
pub(crate) const fn align_up(size: usize, shift: u32) -> Option<usize> {
    let mask = (1usize << shift) - 1;
    match size.checked_add(mask) {
        Some(size) => Some(size & !mask),
        None => None,
    }
}
