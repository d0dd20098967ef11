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

use crate::core::expr::{self, Expr, ExprError};
use crate::core::flags::Flags;
use crate::core::manifest::FilesetDecl;

/// A single source file as declared by a core, relative to the core root.
#[derive(Debug, PartialEq, Clone)]
pub struct File {
    pub name: String,
    pub file_type: String,
    pub is_include_file: bool,
    pub logical_name: String,
    /// Destination inside the build working directory, if the file must be
    /// physically copied there.
    pub copyto: Option<String>,
}

#[derive(Debug, PartialEq, Clone)]
pub struct Fileset {
    name: String,
    files: Vec<File>,
    depend: Vec<Expr>,
}

impl Fileset {
    /// Builds the fileset, resolving each file's type and logical name against
    /// the fileset-wide defaults.
    pub fn from_decl(name: &str, decl: FilesetDecl) -> Result<Self, ExprError> {
        let file_type = decl.file_type.unwrap_or_default();
        let logical_name = decl.logical_name.unwrap_or_default();
        let files = decl
            .files
            .into_iter()
            .map(|f| {
                let entry = f.into_entry();
                File {
                    name: entry.name,
                    file_type: entry.file_type.unwrap_or_else(|| file_type.clone()),
                    is_include_file: entry.is_include_file,
                    logical_name: entry.logical_name.unwrap_or_else(|| logical_name.clone()),
                    copyto: entry.copyto,
                }
            })
            .collect();
        Ok(Self {
            name: name.to_string(),
            files: files,
            depend: expr::parse_list(&decl.depend)?,
        })
    }

    pub fn get_name(&self) -> &str {
        &self.name
    }

    pub fn get_files(&self) -> &Vec<File> {
        &self.files
    }

    /// Dependency constraints active under `flags`.
    pub fn get_depend(&self, flags: &Flags) -> Vec<String> {
        expr::evaluate(&self.depend, flags)
    }

    /// Every dependency constraint across all conditional branches.
    pub fn all_depend(&self) -> Vec<String> {
        expr::flatten(&self.depend)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::core::manifest::{FileDecl, FileEntry};

    #[test]
    fn defaults_apply_per_file() {
        let decl = FilesetDecl {
            files: vec![
                FileDecl::Path(String::from("a.v")),
                FileDecl::Detailed(FileEntry {
                    name: String::from("b.vhd"),
                    file_type: Some(String::from("vhdlSource")),
                    ..Default::default()
                }),
            ],
            file_type: Some(String::from("verilogSource")),
            logical_name: Some(String::from("work")),
            depend: vec![String::from("tool_icarus? (acme:lib:sim)")],
        };
        let fs = Fileset::from_decl("rtl", decl).unwrap();
        assert_eq!(fs.get_files()[0].file_type, "verilogSource");
        assert_eq!(fs.get_files()[1].file_type, "vhdlSource");
        assert_eq!(fs.get_files()[1].logical_name, "work");
        assert_eq!(fs.get_depend(&Flags::new()).len(), 0);
        assert_eq!(fs.get_depend(&Flags::new().tool("icarus")), vec![String::from("acme:lib:sim")]);
        assert_eq!(fs.all_depend().len(), 1);
    }
}
