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

//! A core loaded from a `.core` description file.

use crate::core::fileset::{File, Fileset};
use crate::core::flags::Flags;
use crate::core::manifest::{GenerateDecl, GeneratorDecl, Manifest, ScriptDecl, VpiDecl};
use crate::core::package::{GeneratorInstance, GeneratorProgram, Package, Parameter, Script, Vpi};
use crate::core::target::Target;
use crate::core::vlnv::Vlnv;
use crate::error::{Error, LastError};
use crate::util::filesystem;
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::str::FromStr;

#[derive(Debug, PartialEq)]
pub struct Core {
    vlnv: Vlnv,
    description: Option<String>,
    core_file: PathBuf,
    root: PathBuf,
    filesets: BTreeMap<String, Fileset>,
    targets: BTreeMap<String, Target>,
    parameters: BTreeMap<String, Parameter>,
    generators: BTreeMap<String, GeneratorDecl>,
    generate: BTreeMap<String, GenerateDecl>,
    vpi: BTreeMap<String, VpiDecl>,
    scripts: BTreeMap<String, ScriptDecl>,
}

impl Core {
    /// Reads and validates the description file at `path`.
    pub fn from_file(path: &Path) -> Result<Self, Error> {
        let path = filesystem::absolute(path)?;
        let fail = |msg: String| Error::CoreParse(path.clone(), LastError(msg));

        let text = std::fs::read_to_string(&path).map_err(|e| fail(e.to_string()))?;
        let manifest = Manifest::from_str(&text).map_err(|e| fail(e.to_string()))?;
        Self::from_manifest(manifest, &path).map_err(fail)
    }

    /// Builds a core from an already parsed description located at `path`.
    pub fn from_manifest(manifest: Manifest, path: &Path) -> Result<Self, String> {
        let root = path.parent().map(|p| p.to_path_buf()).unwrap_or_default();

        let mut filesets = BTreeMap::new();
        for (name, decl) in manifest.filesets {
            let fs = Fileset::from_decl(&name, decl)
                .map_err(|e| format!("fileset {:?}: {}", name, e))?;
            filesets.insert(name, fs);
        }
        let mut targets = BTreeMap::new();
        for (name, decl) in manifest.targets {
            let t = Target::from_decl(&name, decl)
                .map_err(|e| format!("target {:?}: {}", name, e))?;
            targets.insert(name, t);
        }
        // every constraint must be well-formed, even in inactive branches
        let constraints = filesets
            .values()
            .flat_map(|f| f.all_depend())
            .chain(targets.values().flat_map(|t| t.all_depend()));
        for c in constraints {
            Vlnv::from_str(&c).map_err(|e| format!("invalid dependency {:?}: {}", c, e))?;
        }

        Ok(Self {
            vlnv: manifest.core.name,
            description: manifest.core.description,
            core_file: path.to_path_buf(),
            root: root,
            filesets: filesets,
            targets: targets,
            parameters: manifest.parameters,
            generators: manifest.generators,
            generate: manifest.generate,
            vpi: manifest.vpi,
            scripts: manifest.scripts,
        })
    }

    pub fn get_description(&self) -> Option<&String> {
        self.description.as_ref()
    }

    pub fn get_core_file(&self) -> &PathBuf {
        &self.core_file
    }

    fn get_target(&self, flags: &Flags) -> Option<&Target> {
        self.targets.get(flags.target_for_core())
    }

    fn require_fileset(&self, name: &str) -> Result<&Fileset, Error> {
        self.filesets
            .get(name)
            .ok_or_else(|| Error::FilesetNotFound(self.vlnv.canonical(), name.to_string()))
    }

    fn active_filesets(&self, flags: &Flags) -> Result<Vec<&Fileset>, Error> {
        match self.get_target(flags) {
            Some(t) => t
                .get_filesets(flags)
                .iter()
                .map(|name| self.require_fileset(name))
                .collect(),
            None => Ok(Vec::new()),
        }
    }

    fn script(&self, name: &str, rel_root: &str) -> Result<Script, Error> {
        let decl = self
            .scripts
            .get(name)
            .ok_or_else(|| Error::ScriptNotFound(self.vlnv.canonical(), name.to_string()))?;
        let mut env = decl.env.clone();
        env.insert(String::from("FILES_ROOT"), rel_root.to_string());
        if decl.filesets.is_empty() == false {
            let mut files = Vec::new();
            for fs in &decl.filesets {
                for f in self.require_fileset(fs)?.get_files() {
                    files.push(filesystem::join_rel(rel_root, &f.name));
                }
            }
            env.insert(String::from("FILES"), files.join(" "));
        }
        Ok(Script {
            name: name.to_string(),
            cmd: decl.cmd.clone(),
            env: env,
        })
    }
}

/// Interprets a parameter override; non-JSON text is kept as a string.
fn parse_value(s: &str) -> Value {
    serde_json::from_str(s).unwrap_or_else(|_| Value::String(s.to_string()))
}

impl Package for Core {
    fn get_vlnv(&self) -> &Vlnv {
        &self.vlnv
    }

    fn get_root(&self) -> &Path {
        &self.root
    }

    fn export(&self, dest: &Path, _flags: &Flags) -> Result<(), Error> {
        std::fs::create_dir_all(dest).map_err(|e| Error::io(dest, e))?;
        for fs in self.filesets.values() {
            for f in fs.get_files() {
                filesystem::copy_file(&self.root.join(&f.name), &dest.join(&f.name))?;
            }
        }
        if let Some(name) = self.core_file.file_name() {
            filesystem::copy_file(&self.core_file, &dest.join(name))?;
        }
        Ok(())
    }

    fn get_parameters(&self, flags: &Flags) -> Result<BTreeMap<String, Parameter>, Error> {
        let mut params = BTreeMap::new();
        let target = match self.get_target(flags) {
            Some(t) => t,
            None => return Ok(params),
        };
        for (name, value) in target.get_parameters(flags) {
            let mut param = self
                .parameters
                .get(&name)
                .ok_or_else(|| Error::ParameterNotFound(self.vlnv.canonical(), name.clone()))?
                .clone();
            if let Some(v) = value {
                param.default = Some(parse_value(&v));
            }
            params.insert(name, param);
        }
        Ok(params)
    }

    fn get_tool(&self, flags: &Flags) -> Option<String> {
        match flags.get_tool() {
            Some(t) => Some(t.clone()),
            None => self.get_target(flags)?.get_default_tool().cloned(),
        }
    }

    fn get_tool_options(&self, flags: &Flags) -> Value {
        let tool = self.get_tool(flags);
        match (self.get_target(flags), tool) {
            (Some(t), Some(tool)) => t
                .get_tool_options(&tool)
                .cloned()
                .unwrap_or_else(|| Value::Object(Default::default())),
            _ => Value::Object(Default::default()),
        }
    }

    fn get_scripts(&self, rel_root: &str, flags: &Flags) -> Result<BTreeMap<String, Vec<Script>>, Error> {
        let mut hooks = BTreeMap::new();
        if let Some(target) = self.get_target(flags) {
            for (hook, names) in target.get_hooks().iter() {
                if names.is_empty() == true {
                    continue;
                }
                let scripts = names
                    .iter()
                    .map(|n| self.script(n, rel_root))
                    .collect::<Result<Vec<Script>, Error>>()?;
                hooks.insert(hook.to_string(), scripts);
            }
        }
        Ok(hooks)
    }

    fn get_files(&self, flags: &Flags) -> Result<Vec<File>, Error> {
        Ok(self
            .active_filesets(flags)?
            .into_iter()
            .flat_map(|fs| fs.get_files().iter().cloned())
            .collect())
    }

    fn get_fileset(&self, name: &str) -> Option<&Fileset> {
        self.filesets.get(name)
    }

    fn get_vpi(&self, flags: &Flags) -> Result<Vec<Vpi>, Error> {
        let target = match self.get_target(flags) {
            Some(t) => t,
            None => return Ok(Vec::new()),
        };
        let mut modules = Vec::new();
        for name in target.get_vpi(flags) {
            let decl = self
                .vpi
                .get(&name)
                .ok_or_else(|| Error::VpiNotFound(self.vlnv.canonical(), name.clone()))?;
            let mut src_files = Vec::new();
            let mut include_dirs: Vec<String> = Vec::new();
            for fs in &decl.filesets {
                for f in self.require_fileset(fs)?.get_files() {
                    match f.is_include_file {
                        true => {
                            let dir = Path::new(&f.name)
                                .parent()
                                .map(|p| filesystem::into_std_str(p.to_path_buf()))
                                .unwrap_or_default();
                            if include_dirs.contains(&dir) == false {
                                include_dirs.push(dir);
                            }
                        }
                        false => src_files.push(f.name.clone()),
                    }
                }
            }
            modules.push(Vpi {
                name: name,
                src_files: src_files,
                include_dirs: include_dirs,
                libs: decl.libs.clone(),
            });
        }
        Ok(modules)
    }

    fn get_generators(&self, _flags: &Flags) -> BTreeMap<String, GeneratorProgram> {
        self.generators
            .iter()
            .map(|(name, g)| {
                (
                    name.clone(),
                    GeneratorProgram {
                        name: name.clone(),
                        command: g.command.clone(),
                        interpreter: g.interpreter.clone(),
                        description: g.description.clone(),
                        root: self.root.clone(),
                    },
                )
            })
            .collect()
    }

    fn get_generator_instances(&self, flags: &Flags) -> Result<Vec<GeneratorInstance>, Error> {
        let target = match self.get_target(flags) {
            Some(t) => t,
            None => return Ok(Vec::new()),
        };
        target
            .get_generate(flags)
            .into_iter()
            .map(|name| {
                let decl = self
                    .generate
                    .get(&name)
                    .ok_or_else(|| Error::GenerateNotFound(self.vlnv.canonical(), name.clone()))?;
                Ok(GeneratorInstance {
                    name: name,
                    generator: decl.generator.clone(),
                    filesets: decl.filesets.clone(),
                    parameters: decl.parameters.clone(),
                    position: decl.position,
                })
            })
            .collect()
    }

    fn get_toplevel(&self, flags: &Flags) -> Option<String> {
        self.get_target(flags)?.get_toplevel().cloned()
    }

    fn get_depends(&self, flags: &Flags) -> Result<Vec<Vlnv>, Error> {
        let target = match self.get_target(flags) {
            Some(t) => t,
            None => return Ok(Vec::new()),
        };
        let mut constraints = target.get_depend(flags);
        for fs in self.active_filesets(flags)? {
            constraints.append(&mut fs.get_depend(flags));
        }
        constraints
            .iter()
            .map(|c| Vlnv::from_str(c).map_err(|e| Error::InvalidVlnv(c.clone(), LastError(e.to_string()))))
            .collect()
    }

    fn get_target_names(&self) -> Vec<String> {
        self.targets.keys().cloned().collect()
    }
}
