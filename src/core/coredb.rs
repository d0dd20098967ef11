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

use crate::core::flags::Flags;
use crate::core::package::Package;
use crate::core::solver;
use crate::core::vlnv::Vlnv;
use crate::error::{Error, Hint};
use log::debug;
use std::collections::BTreeMap;
use std::rc::Rc;

/// The in-memory registry of discovered cores, keyed by canonical name.
#[derive(Debug, Default)]
pub struct CoreDB {
    cores: BTreeMap<String, Rc<dyn Package>>,
}

impl CoreDB {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts `core`, replacing any core already registered under the same
    /// canonical name.
    ///
    /// Returns the replaced core, if any.
    pub fn register(&mut self, core: Rc<dyn Package>) -> Option<Rc<dyn Package>> {
        let key = core.get_vlnv().canonical();
        let prev = self.cores.insert(key.clone(), core.clone());
        if let Some(p) = &prev {
            debug!(
                "replacing core {} from {:?} with {:?}",
                key,
                p.get_root(),
                core.get_root()
            );
        }
        prev
    }

    /// Lists every registered core in canonical-name order.
    pub fn find_all(&self) -> Vec<Rc<dyn Package>> {
        self.cores.values().cloned().collect()
    }

    pub fn find_exact(&self, vlnv: &Vlnv) -> Result<Rc<dyn Package>, Error> {
        self.cores
            .get(&vlnv.canonical())
            .cloned()
            .ok_or_else(|| Error::CoreNotFound(vlnv.canonical(), Hint::AddCoresRoot))
    }

    /// Resolves `constraint` to the highest registered version satisfying it,
    /// without considering dependencies.
    pub fn find(&self, constraint: &Vlnv) -> Result<Rc<dyn Package>, Error> {
        let found = solver::solve(&self.find_all(), constraint, &Flags::new(), true)?;
        found
            .into_iter()
            .last()
            .ok_or_else(|| Error::DependencyNotFound(constraint.to_string(), Hint::AddCoresRoot))
    }

    /// Resolves `root` and everything it depends on under `flags`.
    pub fn solve(&self, root: &Vlnv, flags: &Flags) -> Result<Vec<Rc<dyn Package>>, Error> {
        solver::solve(&self.find_all(), root, flags, false)
    }

    /// Resolves a core that joins a build already in progress.
    ///
    /// See [solver::solve_within].
    pub fn solve_within(&self, root: &Vlnv, toplevel: &Vlnv, pinned: &[Vlnv], flags: &Flags) -> Result<Vec<Rc<dyn Package>>, Error> {
        solver::solve_within(&self.find_all(), root, toplevel, pinned, flags)
    }

    pub fn len(&self) -> usize {
        self.cores.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cores.is_empty()
    }
}
