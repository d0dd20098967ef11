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

use crate::core::package::{Parameter, Script};
use crate::error::{Error, LastError};
use serde_derive::Serialize;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::path::Path;

pub const EDA_API_VERSION: &str = "0.2.0";

#[derive(Serialize, Debug, PartialEq, Clone)]
pub struct FileRecord {
    pub name: String,
    pub file_type: String,
    pub is_include_file: bool,
    pub logical_name: String,
}

#[derive(Serialize, Debug, PartialEq, Clone)]
pub struct VpiRecord {
    pub name: String,
    pub src_files: Vec<String>,
    pub include_dirs: Vec<String>,
    pub libs: Vec<String>,
}

/// The partial build description contributed by one core.
#[derive(Serialize, Debug, PartialEq, Clone, Default)]
pub struct Snippet {
    pub parameters: BTreeMap<String, Parameter>,
    pub tool_options: BTreeMap<String, Value>,
    #[serde(rename = "hooks")]
    pub scripts: BTreeMap<String, Vec<Script>>,
    pub files: Vec<FileRecord>,
    pub vpi: Vec<VpiRecord>,
}

impl Snippet {
    pub fn to_value(&self) -> Result<Value, Error> {
        serde_json::to_value(self).map_err(|e| Error::Serialize(LastError(e.to_string())))
    }
}

/// Deep-merges `src` into `dst`.
///
/// Maps merge key by key, sequences concatenate, and anything else is
/// overwritten by `src`.
pub fn merge(dst: &mut Value, src: Value) {
    match (dst, src) {
        (Value::Object(d), Value::Object(s)) => {
            for (k, v) in s {
                match d.get_mut(&k) {
                    Some(existing) => merge(existing, v),
                    None => {
                        d.insert(k, v);
                    }
                }
            }
        }
        (Value::Array(d), Value::Array(mut s)) => d.append(&mut s),
        (d, s) => *d = s,
    }
}

/// The final, tool-agnostic build description.
#[derive(Debug, PartialEq, Clone)]
pub struct EdaApi {
    data: Value,
}

impl EdaApi {
    pub fn new(name: &str, toplevel: Option<&str>) -> Self {
        let mut data = Map::new();
        data.insert(String::from("version"), Value::from(EDA_API_VERSION));
        data.insert(String::from("files"), Value::Array(Vec::new()));
        data.insert(String::from("hooks"), Value::Object(Map::new()));
        data.insert(String::from("name"), Value::from(name));
        data.insert(String::from("parameters"), Value::Object(Map::new()));
        data.insert(String::from("tool_options"), Value::Object(Map::new()));
        data.insert(
            String::from("toplevel"),
            toplevel.map(Value::from).unwrap_or(Value::Null),
        );
        data.insert(String::from("vpi"), Value::Array(Vec::new()));
        Self {
            data: Value::Object(data),
        }
    }

    /// Folds `snippet` into the description.
    pub fn merge(&mut self, snippet: &Snippet) -> Result<(), Error> {
        merge(&mut self.data, snippet.to_value()?);
        Ok(())
    }

    pub fn get_data(&self) -> &Value {
        &self.data
    }

    pub fn get_files(&self) -> Vec<String> {
        match &self.data["files"] {
            Value::Array(files) => files
                .iter()
                .filter_map(|f| f["name"].as_str().map(|s| s.to_string()))
                .collect(),
            _ => Vec::new(),
        }
    }

    /// Serializes the description as pretty JSON with sorted keys.
    pub fn to_json(&self) -> Result<String, Error> {
        serde_json::to_string_pretty(&self.data).map_err(|e| Error::Serialize(LastError(e.to_string())))
    }

    pub fn write(&self, path: &Path) -> Result<(), Error> {
        let text = self.to_json()?;
        std::fs::write(path, text).map_err(|e| Error::io(path, e))
    }
}
