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

//! Helpers for authors of generator programs written in Rust.
//!
//! A generator reads its input document, describes the files it produced,
//! and writes a `.core` file into its working directory:
//!
//! ```no_run
//! use corebuild::core::emit::Generator;
//! use corebuild::core::manifest::FileDecl;
//!
//! let mut generator = Generator::from_args().unwrap();
//! std::fs::write("gen.v", "module gen; endmodule").unwrap();
//! generator.add_files(vec![FileDecl::Path(String::from("gen.v"))], "rtl", &["default"], Some("verilogSource"));
//! generator.write().unwrap();
//! ```

use crate::core::generator::GeneratorInput;
use crate::core::manifest::{FileDecl, Header, Manifest};
use crate::core::package::Parameter;
use crate::core::vlnv::Vlnv;
use crate::error::{Error, LastError};
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

#[derive(Debug, PartialEq)]
pub struct Generator {
    input: GeneratorInput,
    manifest: Manifest,
}

impl Generator {
    pub fn from_input(input: GeneratorInput) -> Self {
        let manifest = Manifest {
            core: Header {
                name: input.vlnv.clone(),
                description: None,
            },
            filesets: BTreeMap::new(),
            targets: BTreeMap::new(),
            parameters: BTreeMap::new(),
            generators: BTreeMap::new(),
            generate: BTreeMap::new(),
            vpi: BTreeMap::new(),
            scripts: BTreeMap::new(),
        };
        Self {
            input: input,
            manifest: manifest,
        }
    }

    pub fn from_file(path: &Path) -> Result<Self, Error> {
        let fail = |msg: String| Error::GeneratorInputInvalid(path.to_path_buf(), LastError(msg));
        let text = std::fs::read_to_string(path).map_err(|e| fail(e.to_string()))?;
        let input: GeneratorInput = serde_json::from_str(&text).map_err(|e| fail(e.to_string()))?;
        Ok(Self::from_input(input))
    }

    /// Reads the input document named by the first process argument.
    pub fn from_args() -> Result<Self, Error> {
        match std::env::args_os().nth(1) {
            Some(p) => Self::from_file(&PathBuf::from(p)),
            None => Err(Error::GeneratorInputInvalid(
                PathBuf::new(),
                LastError(String::from("missing input file argument")),
            )),
        }
    }

    pub fn vlnv(&self) -> &Vlnv {
        &self.input.vlnv
    }

    pub fn files_root(&self) -> &str {
        &self.input.files_root
    }

    pub fn export_path(&self) -> &str {
        &self.input.export_path
    }

    pub fn input_files(&self) -> &Vec<String> {
        &self.input.files
    }

    /// The parameters given at the generate entry.
    pub fn config(&self) -> &BTreeMap<String, Value> {
        &self.input.parameters
    }

    pub fn get_manifest(&self) -> &Manifest {
        &self.manifest
    }

    /// Sets the files of `fileset` and enables the fileset in every target
    /// named in `targets`.
    pub fn add_files(&mut self, files: Vec<FileDecl>, fileset: &str, targets: &[&str], file_type: Option<&str>) {
        let fs = self.manifest.filesets.entry(fileset.to_string()).or_default();
        fs.files = files;
        fs.file_type = file_type.map(|s| s.to_string());
        for t in targets {
            let target = self.manifest.targets.entry(t.to_string()).or_default();
            if target.filesets.iter().any(|f| f == fileset) == false {
                target.filesets.push(fileset.to_string());
            }
        }
    }

    /// Declares `name` and enables it in every target named in `targets`.
    pub fn add_parameter(&mut self, name: &str, param: Parameter, targets: &[&str]) {
        self.manifest.parameters.insert(name.to_string(), param);
        for t in targets {
            let target = self.manifest.targets.entry(t.to_string()).or_default();
            if target.parameters.iter().any(|p| p == name) == false {
                target.parameters.push(name.to_string());
            }
        }
    }

    /// Adds a dependency constraint to every target named in `targets`.
    pub fn add_depend(&mut self, constraint: &Vlnv, targets: &[&str]) {
        for t in targets {
            let target = self.manifest.targets.entry(t.to_string()).or_default();
            target.depend.push(constraint.to_string());
        }
    }

    /// Writes `<name>.core` into the current directory.
    pub fn write(&self) -> Result<PathBuf, Error> {
        self.write_to(Path::new("."))
    }

    pub fn write_to(&self, dir: &Path) -> Result<PathBuf, Error> {
        let path = dir.join(format!("{}.core", self.vlnv().get_name()));
        let text = self
            .manifest
            .to_toml_string()
            .map_err(|e| Error::Serialize(LastError(e.to_string())))?;
        std::fs::write(&path, text).map_err(|e| Error::io(&path, e))?;
        Ok(path)
    }
}
