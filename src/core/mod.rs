//
//  Copyright (C) 2022-2024  Chase Ruskin
//
//  This program is free software: you can redistribute it and/or modify
//  it under the terms of the GNU General Public License as published by
//  the Free Software Foundation, either version 3 of the License, or
//  (at your option) any later version.
//
//  This program is distributed in the hope that it will be useful,
//  but WITHOUT ANY WARRANTY; without even the implied warranty of
//  MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
//  GNU General Public License for more details.
//
//  You should have received a copy of the GNU General Public License
//  along with this program.  If not, see <http://www.gnu.org/licenses/>.
//

pub mod config;
pub mod coredb;
pub mod corefile;
pub mod edalizer;
pub mod emit;
pub mod expr;
pub mod fileset;
pub mod flags;
pub mod generator;
pub mod manager;
pub mod manifest;
pub mod package;
pub mod snippet;
pub mod solver;
pub mod target;
pub mod version;
pub mod vlnv;
