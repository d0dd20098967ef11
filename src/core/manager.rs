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

use crate::core::config::Config;
use crate::core::coredb::CoreDB;
use crate::core::corefile::Core;
use crate::core::flags::Flags;
use crate::core::manifest::{Manifest, IGNORE_MARKER};
use crate::core::package::{GeneratorProgram, Package};
use crate::core::vlnv::Vlnv;
use crate::error::Error;
use crate::util::filesystem;
use ignore::WalkBuilder;
use log::{debug, warn};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::rc::Rc;

/// Owns the registry and the set of directories it was populated from.
#[derive(Debug, Default)]
pub struct CoreManager {
    db: CoreDB,
    roots: Vec<PathBuf>,
}

impl CoreManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a manager populated from every cores root and library
    /// location named in `config`.
    pub fn from_config(config: &Config) -> Result<Self, Error> {
        let mut cm = Self::new();
        for root in config.get_cores_root() {
            cm.add_cores_root(&root)?;
        }
        for lib in config.get_libraries() {
            let location = config.get_library_location(lib);
            if location.is_dir() == true {
                cm.add_cores_root(&location)?;
            } else {
                warn!(
                    "library {:?} has no local copy at {:?}",
                    lib.get_name(),
                    location
                );
            }
        }
        Ok(cm)
    }

    /// Scans `path` for cores unless it was already scanned.
    pub fn add_cores_root(&mut self, path: &Path) -> Result<(), Error> {
        if path.as_os_str().is_empty() == true {
            return Ok(());
        }
        let abs = filesystem::absolute(path)?;
        if self.roots.contains(&abs) == true {
            return Ok(());
        }
        if abs.is_dir() == false {
            return Err(Error::CoresRootNotDir(abs));
        }
        self.load_tree(&abs)?;
        self.roots.push(abs);
        Ok(())
    }

    pub fn get_cores_root(&self) -> &Vec<PathBuf> {
        &self.roots
    }

    /// Recursively registers every `.core` file under `path`.
    ///
    /// Directories holding the ignore marker are skipped along with their
    /// subtrees. A file that fails to parse is reported and skipped.
    ///
    /// Returns the number of cores registered.
    pub fn load_tree(&mut self, path: &Path) -> Result<usize, Error> {
        debug!("checking for cores in {:?}", path);
        let walk = WalkBuilder::new(path)
            .standard_filters(false)
            .hidden(false)
            .git_ignore(false)
            .follow_links(true)
            .sort_by_file_name(|a, b| a.cmp(b))
            .filter_entry(|e| {
                let is_dir = e.file_type().map(|t| t.is_dir()).unwrap_or(false);
                is_dir == false || e.path().join(IGNORE_MARKER).exists() == false
            })
            .build();

        let mut count = 0;
        for entry in walk {
            let entry = match entry {
                Ok(e) => e,
                Err(e) => {
                    warn!("{}", e);
                    continue;
                }
            };
            let is_file = entry.file_type().map(|t| t.is_file()).unwrap_or(false);
            if is_file == false || Manifest::is_core_file(entry.path()) == false {
                continue;
            }
            match Core::from_file(entry.path()) {
                Ok(core) => {
                    self.db.register(Rc::new(core));
                    count += 1;
                }
                Err(e) => warn!("{}", e),
            }
        }
        Ok(count)
    }

    /// Adds an already constructed core to the registry.
    pub fn register(&mut self, core: Rc<dyn Package>) {
        self.db.register(core);
    }

    /// Resolves `vlnv` to its installed version and returns the full,
    /// ordered set of cores it needs under `flags`.
    pub fn get_depends(&self, vlnv: &Vlnv, flags: &Flags) -> Result<Vec<Rc<dyn Package>>, Error> {
        let found = self.db.find(vlnv)?;
        let resolved = found.get_vlnv().as_concrete();
        debug!("solving dependencies of {} resolved to {}", vlnv, resolved);
        self.db.solve(&resolved, flags)
    }

    pub fn get_core(&self, vlnv: &Vlnv) -> Result<Rc<dyn Package>, Error> {
        self.db.find(vlnv)
    }

    pub fn get_cores(&self) -> Vec<Rc<dyn Package>> {
        self.db.find_all()
    }

    /// Collects the generator programs advertised by each registered core,
    /// keyed by the core's canonical name.
    pub fn get_generators(&self) -> BTreeMap<String, BTreeMap<String, GeneratorProgram>> {
        self.db
            .find_all()
            .into_iter()
            .map(|c| (c.get_vlnv().canonical(), c.get_generators(&Flags::new())))
            .filter(|(_, g)| g.is_empty() == false)
            .collect()
    }

    pub fn get_db(&self) -> &CoreDB {
        &self.db
    }
}
