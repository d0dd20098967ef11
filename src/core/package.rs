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

use crate::core::fileset::{File, Fileset};
use crate::core::flags::Flags;
use crate::core::vlnv::Vlnv;
use crate::error::Error;
use serde_derive::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt::Debug;
use std::path::{Path, PathBuf};

/// Where a generated core's contribution lands in the merged description.
#[derive(Deserialize, Serialize, Debug, PartialEq, Eq, Clone, Copy, Default, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Position {
    First,
    #[default]
    Default,
    Last,
}

#[derive(Deserialize, Serialize, Debug, PartialEq, Clone)]
#[serde(deny_unknown_fields)]
pub struct Parameter {
    pub datatype: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub paramtype: String,
}

#[derive(Serialize, Debug, PartialEq, Clone)]
pub struct Script {
    pub name: String,
    pub cmd: Vec<String>,
    pub env: BTreeMap<String, String>,
}

/// A VPI module with paths relative to its core's root.
#[derive(Debug, PartialEq, Clone)]
pub struct Vpi {
    pub name: String,
    pub src_files: Vec<String>,
    pub include_dirs: Vec<String>,
    pub libs: Vec<String>,
}

/// A code-generation program advertised by a core.
#[derive(Debug, PartialEq, Clone)]
pub struct GeneratorProgram {
    pub name: String,
    pub command: String,
    pub interpreter: Option<String>,
    pub description: Option<String>,
    /// Root of the advertising core; `command` is relative to it.
    pub root: PathBuf,
}

/// A use-site invocation of a generator program.
#[derive(Debug, PartialEq, Clone)]
pub struct GeneratorInstance {
    pub name: String,
    pub generator: String,
    pub filesets: Vec<String>,
    pub parameters: BTreeMap<String, Value>,
    pub position: Position,
}

/// The capabilities every resolvable core provides.
///
/// Generator-related and VPI accessors default to nothing so simple
/// packages only implement what they describe.
pub trait Package: Debug {
    fn get_vlnv(&self) -> &Vlnv;

    /// The directory the core's files are relative to.
    fn get_root(&self) -> &Path;

    fn setup(&self) -> Result<(), Error> {
        Ok(())
    }

    /// Copies the files selected by `flags` into `dest`.
    fn export(&self, dest: &Path, flags: &Flags) -> Result<(), Error>;

    fn get_parameters(&self, flags: &Flags) -> Result<BTreeMap<String, Parameter>, Error>;

    fn get_tool(&self, flags: &Flags) -> Option<String>;

    fn get_tool_options(&self, flags: &Flags) -> Value;

    /// Scripts keyed by hook name, with `rel_root` as their files root.
    fn get_scripts(&self, rel_root: &str, flags: &Flags) -> Result<BTreeMap<String, Vec<Script>>, Error>;

    fn get_files(&self, flags: &Flags) -> Result<Vec<File>, Error>;

    fn get_fileset(&self, name: &str) -> Option<&Fileset>;

    fn get_vpi(&self, _flags: &Flags) -> Result<Vec<Vpi>, Error> {
        Ok(Vec::new())
    }

    fn get_generators(&self, _flags: &Flags) -> BTreeMap<String, GeneratorProgram> {
        BTreeMap::new()
    }

    fn get_generator_instances(&self, _flags: &Flags) -> Result<Vec<GeneratorInstance>, Error> {
        Ok(Vec::new())
    }

    fn get_toplevel(&self, flags: &Flags) -> Option<String>;

    fn get_depends(&self, flags: &Flags) -> Result<Vec<Vlnv>, Error>;

    fn get_target_names(&self) -> Vec<String>;
}
