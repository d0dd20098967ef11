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

//! The on-disk layout of a `.core` description file.

use crate::core::package::{Parameter, Position};
use crate::core::vlnv::Vlnv;
use serde_derive::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::Path;
use std::str::FromStr;

pub const CORE_FILE_PATTERN: &str = "*.core";
pub const CORE_FILE_EXT: &str = "core";
/// Directories holding this file are skipped during discovery.
pub const IGNORE_MARKER: &str = "CORE_IGNORE";

#[derive(Deserialize, Serialize, Debug, PartialEq, Clone)]
#[serde(deny_unknown_fields)]
pub struct Manifest {
    pub core: Header,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub filesets: BTreeMap<String, FilesetDecl>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub targets: BTreeMap<String, TargetDecl>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub parameters: BTreeMap<String, Parameter>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub generators: BTreeMap<String, GeneratorDecl>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub generate: BTreeMap<String, GenerateDecl>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub vpi: BTreeMap<String, VpiDecl>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub scripts: BTreeMap<String, ScriptDecl>,
}

#[derive(Deserialize, Serialize, Debug, PartialEq, Clone)]
#[serde(deny_unknown_fields)]
pub struct Header {
    pub name: Vlnv,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Deserialize, Serialize, Debug, PartialEq, Clone, Default)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct FilesetDecl {
    #[serde(default)]
    pub files: Vec<FileDecl>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logical_name: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub depend: Vec<String>,
}

#[derive(Deserialize, Serialize, Debug, PartialEq, Clone)]
#[serde(untagged)]
pub enum FileDecl {
    Path(String),
    Detailed(FileEntry),
}

impl FileDecl {
    pub fn into_entry(self) -> FileEntry {
        match self {
            Self::Path(p) => FileEntry {
                name: p,
                ..Default::default()
            },
            Self::Detailed(e) => e,
        }
    }
}

#[derive(Deserialize, Serialize, Debug, PartialEq, Clone, Default)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct FileEntry {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_type: Option<String>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub is_include_file: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logical_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub copyto: Option<String>,
}

#[derive(Deserialize, Serialize, Debug, PartialEq, Clone, Default)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct TargetDecl {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub filesets: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub parameters: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub toplevel: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub depend: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub generate: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub vpi: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_tool: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub tools: BTreeMap<String, Value>,
    #[serde(default, skip_serializing_if = "Hooks::is_empty")]
    pub hooks: Hooks,
}

#[derive(Deserialize, Serialize, Debug, PartialEq, Clone, Default)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct Hooks {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub pre_build: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub post_build: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub pre_run: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub post_run: Vec<String>,
}

impl Hooks {
    pub fn is_empty(&self) -> bool {
        self.iter().all(|(_, s)| s.is_empty())
    }

    /// Iterates over every hook with its name in the build description.
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &Vec<String>)> + '_ {
        [
            ("pre_build", &self.pre_build),
            ("post_build", &self.post_build),
            ("pre_run", &self.pre_run),
            ("post_run", &self.post_run),
        ]
        .into_iter()
    }
}

#[derive(Deserialize, Serialize, Debug, PartialEq, Clone)]
#[serde(deny_unknown_fields)]
pub struct GeneratorDecl {
    pub command: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub interpreter: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Deserialize, Serialize, Debug, PartialEq, Clone)]
#[serde(deny_unknown_fields)]
pub struct GenerateDecl {
    pub generator: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub parameters: BTreeMap<String, Value>,
    #[serde(default)]
    pub position: Position,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub filesets: Vec<String>,
}

#[derive(Deserialize, Serialize, Debug, PartialEq, Clone, Default)]
#[serde(deny_unknown_fields)]
pub struct VpiDecl {
    #[serde(default)]
    pub filesets: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub libs: Vec<String>,
}

#[derive(Deserialize, Serialize, Debug, PartialEq, Clone, Default)]
#[serde(deny_unknown_fields)]
pub struct ScriptDecl {
    pub cmd: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub filesets: Vec<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub env: BTreeMap<String, String>,
}

impl FromStr for Manifest {
    type Err = toml::de::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        toml::from_str(s)
    }
}

impl Manifest {
    /// Checks if `path` names a core description file.
    pub fn is_core_file(path: &Path) -> bool {
        match path.file_name().and_then(|f| f.to_str()) {
            Some(name) => glob::Pattern::new(CORE_FILE_PATTERN)
                .map(|p| p.matches(name))
                .unwrap_or(false),
            None => false,
        }
    }

    pub fn to_toml_string(&self) -> Result<String, toml::ser::Error> {
        toml::to_string(self)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    const MINIMAL: &str = r#"
[core]
name = "acme:lib:top:1.0"
"#;

    const FULL: &str = r#"
[core]
name = "acme:lib:top:1.0"
description = "top level"

[filesets.rtl]
files = ["top.v", { name = "defs.vh", is-include-file = true }, { name = "init.hex", copyto = "init.hex" }]
file-type = "verilogSource"
depend = [">=acme:lib:fifo:1.0", "is_toplevel? (acme:lib:tb_utils)"]

[targets.default]
filesets = ["rtl"]
parameters = ["WIDTH", "DEPTH=16"]
toplevel = "top"
generate = ["gen1"]
default-tool = "icarus"
tools.icarus = { iverilog-options = ["-g2012"] }
hooks.pre-build = ["prep"]

[parameters.WIDTH]
datatype = "int"
default = 8
paramtype = "vlogparam"

[parameters.DEPTH]
datatype = "int"
paramtype = "vlogparam"

[generators.mygen]
command = "gen.py"
interpreter = "python3"

[generate.gen1]
generator = "mygen"
parameters = { depth = 4 }
position = "first"

[vpi.myvpi]
filesets = ["rtl"]
libs = ["-lm"]

[scripts.prep]
cmd = ["python3", "prep.py"]
env = { KEY = "value" }
"#;

    const UNKNOWN_KEY: &str = r#"
[core]
name = "acme:lib:top:1.0"
version = "1.0"
"#;

    #[test]
    fn minimal() {
        let man = Manifest::from_str(MINIMAL).unwrap();
        assert_eq!(man.core.name.canonical(), "acme:lib:top:1.0");
        assert_eq!(man.filesets.len(), 0);
        assert_eq!(man.targets.len(), 0);
    }

    #[test]
    fn full() {
        let man = Manifest::from_str(FULL).unwrap();
        let rtl = man.filesets.get("rtl").unwrap();
        assert_eq!(rtl.files.len(), 3);
        assert_eq!(rtl.files[0], FileDecl::Path(String::from("top.v")));
        let entry = rtl.files[1].clone().into_entry();
        assert_eq!(entry.is_include_file, true);
        let entry = rtl.files[2].clone().into_entry();
        assert_eq!(entry.copyto, Some(String::from("init.hex")));

        let target = man.targets.get("default").unwrap();
        assert_eq!(target.default_tool, Some(String::from("icarus")));
        assert_eq!(target.hooks.pre_build, vec![String::from("prep")]);
        assert_eq!(target.tools.get("icarus").unwrap()["iverilog-options"][0], "-g2012");

        assert_eq!(man.generate.get("gen1").unwrap().position, Position::First);
        assert_eq!(man.parameters.get("WIDTH").unwrap().default, Some(Value::from(8)));
        assert_eq!(man.parameters.get("DEPTH").unwrap().default, None);
    }

    #[test]
    fn unknown_key_is_rejected() {
        assert_eq!(Manifest::from_str(UNKNOWN_KEY).is_err(), true);
    }

    #[test]
    fn bad_identifier_is_rejected() {
        assert_eq!(Manifest::from_str("[core]\nname = \"acme:top\"\n").is_err(), true);
    }

    #[test]
    fn core_file_pattern() {
        assert_eq!(Manifest::is_core_file(Path::new("a/b/top.core")), true);
        assert_eq!(Manifest::is_core_file(Path::new("a/b/top.core.bak")), false);
        assert_eq!(Manifest::is_core_file(Path::new("a/b")), false);
    }

    #[test]
    fn serialize_reparses() {
        let man = Manifest::from_str(FULL).unwrap();
        let text = man.to_toml_string().unwrap();
        assert_eq!(Manifest::from_str(&text).unwrap(), man);
    }
}
