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

use crate::error::{Error, LastError};
use crate::util::filesystem;
use serde_derive::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use toml_edit::{value, Document, Item, Table};

pub const CONFIG_FILE: &str = "corebuild.toml";

const APP_DIR: &str = "corebuild";

#[derive(PartialEq, Debug, Serialize, Deserialize, Clone, Default)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct Main {
    build_root: Option<String>,
    cache_root: Option<String>,
    cores_root: Option<Vec<String>>,
    systems_root: Option<String>,
    library_root: Option<String>,
}

impl Main {
    /// Takes every key defined in `rhs`, leaving the others untouched.
    fn merge(&mut self, rhs: Self) {
        if rhs.build_root.is_some() {
            self.build_root = rhs.build_root;
        }
        if rhs.cache_root.is_some() {
            self.cache_root = rhs.cache_root;
        }
        if rhs.cores_root.is_some() {
            self.cores_root = rhs.cores_root;
        }
        if rhs.systems_root.is_some() {
            self.systems_root = rhs.systems_root;
        }
        if rhs.library_root.is_some() {
            self.library_root = rhs.library_root;
        }
    }

    /// Rewrites every path relative to the directory `base`.
    fn resolve(&mut self, base: &Path) {
        let fix = |s: &mut String| *s = filesystem::into_std_str(resolve_path(base, s.as_str()));
        self.build_root.iter_mut().for_each(fix);
        self.cache_root.iter_mut().for_each(fix);
        self.systems_root.iter_mut().for_each(fix);
        self.library_root.iter_mut().for_each(fix);
        self.cores_root.iter_mut().flatten().for_each(fix);
    }
}

/// A remote collection of cores kept in sync under a local directory.
#[derive(PartialEq, Debug, Serialize, Deserialize, Clone, Default)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct Library {
    #[serde(skip)]
    name: String,
    location: Option<String>,
    sync_uri: Option<String>,
    sync_type: Option<String>,
    auto_sync: Option<bool>,
}

impl Library {
    pub fn get_name(&self) -> &str {
        &self.name
    }

    pub fn get_sync_uri(&self) -> Option<&String> {
        self.sync_uri.as_ref()
    }

    /// Defaults to `git`.
    pub fn get_sync_type(&self) -> &str {
        self.sync_type.as_deref().unwrap_or("git")
    }

    /// Defaults to `true`.
    pub fn is_auto_sync(&self) -> bool {
        self.auto_sync.unwrap_or(true)
    }
}

#[derive(PartialEq, Debug, Serialize, Deserialize, Clone, Default)]
#[serde(deny_unknown_fields)]
pub struct Config {
    main: Option<Main>,
    library: Option<BTreeMap<String, Library>>,
}

impl FromStr for Config {
    type Err = toml::de::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut cfg: Config = toml::from_str(s)?;
        for (name, lib) in cfg.library.iter_mut().flatten() {
            lib.name = name.clone();
        }
        Ok(cfg)
    }
}

/// Expands a leading `~` and anchors relative paths to `base`.
fn resolve_path(base: &Path, s: &str) -> PathBuf {
    let expanded = match (s.strip_prefix('~'), home::home_dir()) {
        (Some(rest), Some(home)) if rest.is_empty() || rest.starts_with('/') => {
            home.join(rest.trim_start_matches('/'))
        }
        _ => PathBuf::from(s),
    };
    match expanded.is_relative() {
        true => filesystem::normalize(&base.join(expanded)),
        false => expanded,
    }
}

/// Reads an XDG base directory variable, falling back to `~/<fallback>`.
fn xdg_dir(var: &str, fallback: &str) -> PathBuf {
    match std::env::var_os(var) {
        Some(v) if v.is_empty() == false => PathBuf::from(v),
        _ => home::home_dir().unwrap_or_default().join(fallback),
    }
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads a single configuration file.
    ///
    /// Relative paths inside the file are taken relative to the file's directory.
    pub fn from_file(path: &Path) -> Result<Self, Error> {
        let fail = |msg: String| Error::ConfigParse(path.to_path_buf(), LastError(msg));
        let text = std::fs::read_to_string(path).map_err(|e| fail(e.to_string()))?;
        let mut cfg = Self::from_str(&text).map_err(|e| fail(e.to_string()))?;
        let base = filesystem::absolute(path.parent().unwrap_or(Path::new(".")))?;
        if let Some(main) = &mut cfg.main {
            main.resolve(&base);
        }
        for lib in cfg.library.iter_mut().flat_map(|l| l.values_mut()) {
            if let Some(loc) = &mut lib.location {
                *loc = filesystem::into_std_str(resolve_path(&base, loc.as_str()));
            }
        }
        Ok(cfg)
    }

    /// The system-wide, user and local configuration files, lowest precedence first.
    pub fn search_paths() -> Vec<PathBuf> {
        vec![
            PathBuf::from("/etc").join(APP_DIR).join(CONFIG_FILE),
            xdg_dir("XDG_CONFIG_HOME", ".config").join(APP_DIR).join(CONFIG_FILE),
            PathBuf::from(".").join(CONFIG_FILE),
        ]
    }

    /// Reads every file in [Config::search_paths] that exists.
    pub fn load() -> Result<Self, Error> {
        Self::load_from(&Self::search_paths())
    }

    /// Reads the existing files among `paths`, later files overriding earlier keys.
    pub fn load_from(paths: &[PathBuf]) -> Result<Self, Error> {
        let mut cfg = Self::new();
        for path in paths.iter().filter(|p| p.is_file()) {
            log::debug!("reading configuration {:?}", path);
            cfg.merge(Self::from_file(path)?);
        }
        Ok(cfg)
    }

    /// Combines `rhs` into `self`, where `rhs` takes precedence.
    pub fn merge(&mut self, rhs: Self) {
        if let Some(main) = rhs.main {
            match &mut self.main {
                Some(lhs) => lhs.merge(main),
                None => self.main = Some(main),
            }
        }
        if let Some(libs) = rhs.library {
            self.library.get_or_insert_with(BTreeMap::new).extend(libs);
        }
    }

    fn main(&self) -> Main {
        self.main.clone().unwrap_or_default()
    }

    pub fn get_build_root(&self) -> PathBuf {
        self.main()
            .build_root
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("build"))
    }

    pub fn get_cache_root(&self) -> PathBuf {
        self.main()
            .cache_root
            .map(PathBuf::from)
            .unwrap_or_else(|| xdg_dir("XDG_CACHE_HOME", ".cache").join(APP_DIR))
    }

    /// Falls back to `./cores` when no roots are configured and it exists.
    pub fn get_cores_root(&self) -> Vec<PathBuf> {
        match self.main().cores_root {
            Some(roots) => roots.into_iter().map(PathBuf::from).collect(),
            None => {
                let local = PathBuf::from("cores");
                match local.is_dir() {
                    true => vec![local],
                    false => Vec::new(),
                }
            }
        }
    }

    pub fn get_systems_root(&self) -> Option<PathBuf> {
        self.main().systems_root.map(PathBuf::from)
    }

    pub fn get_library_root(&self) -> PathBuf {
        self.main()
            .library_root
            .map(PathBuf::from)
            .unwrap_or_else(|| xdg_dir("XDG_DATA_HOME", ".local/share").join(APP_DIR))
    }

    pub fn get_libraries(&self) -> impl Iterator<Item = &Library> {
        self.library.iter().flat_map(|l| l.values())
    }

    /// A library without an explicit location lives under the library root.
    pub fn get_library_location(&self, lib: &Library) -> PathBuf {
        match &lib.location {
            Some(loc) => PathBuf::from(loc),
            None => self.get_library_root().join(&lib.name),
        }
    }

    /// Records a new library in the configuration file at `path`.
    ///
    /// The file is created if it does not exist. Existing comments and
    /// formatting are preserved; an existing library of the same name is replaced.
    pub fn add_library(
        path: &Path,
        name: &str,
        location: Option<&str>,
        sync_uri: &str,
        sync_type: Option<&str>,
        auto_sync: bool,
    ) -> Result<(), Error> {
        let text = match path.exists() {
            true => std::fs::read_to_string(path).map_err(|e| Error::ConfigNotSaved(LastError(e.to_string())))?,
            false => String::new(),
        };
        let fail = |msg: String| Error::ConfigParse(path.to_path_buf(), LastError(msg));
        let mut doc = text.parse::<Document>().map_err(|e| fail(e.to_string()))?;

        if doc.contains_key("library") == false {
            let mut libs = Table::new();
            libs.set_implicit(true);
            doc.insert("library", Item::Table(libs));
        }
        let libs = doc["library"]
            .as_table_mut()
            .ok_or_else(|| fail(String::from("key 'library' is not a table")))?;

        let mut entry = Table::new();
        if let Some(loc) = location {
            entry.insert("location", value(loc));
        }
        entry.insert("sync-uri", value(sync_uri));
        if let Some(st) = sync_type {
            entry.insert("sync-type", value(st));
        }
        entry.insert("auto-sync", value(auto_sync));
        libs.insert(name, Item::Table(entry));

        if let Some(parent) = path.parent().filter(|p| p.as_os_str().is_empty() == false) {
            std::fs::create_dir_all(parent).map_err(|e| Error::ConfigNotSaved(LastError(e.to_string())))?;
        }
        std::fs::write(path, doc.to_string()).map_err(|e| Error::ConfigNotSaved(LastError(e.to_string())))
    }
}
