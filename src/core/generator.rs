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

//! The file-based contract between the assembler and an external
//! code-generation program.
//!
//! The program receives the path to a JSON input document as its only
//! argument and runs inside a fresh working directory. Any `.core` files it
//! leaves under that directory become new cores.

use crate::core::corefile::Core;
use crate::core::manifest::Manifest;
use crate::core::package::{GeneratorInstance, GeneratorProgram, Package};
use crate::core::vlnv::Vlnv;
use crate::error::{Error, LastError};
use crate::util::filesystem;
use ignore::WalkBuilder;
use log::{debug, info};
use serde_derive::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::process::Command;

pub const PROTOCOL_VERSION: &str = "1.0";

/// Directory under the cache root holding every generator's working directory.
pub const GENERATED_DIR: &str = "generated";

/// The document handed to a generator program.
#[derive(Serialize, Deserialize, Debug, PartialEq, Clone)]
pub struct GeneratorInput {
    pub protocol_version: String,
    pub vlnv: Vlnv,
    pub files_root: String,
    pub export_path: String,
    pub files: Vec<String>,
    pub parameters: BTreeMap<String, Value>,
}

/// One invocation of a generator program on behalf of a core.
#[derive(Debug)]
pub struct GeneratorRun<'a> {
    owner: &'a dyn Package,
    instance: &'a GeneratorInstance,
    program: &'a GeneratorProgram,
    files: Vec<String>,
    export_path: PathBuf,
}

impl<'a> GeneratorRun<'a> {
    /// `files` must already be absolute; `export_path` is where the owner's
    /// sources live for downstream tools.
    pub fn new(
        owner: &'a dyn Package,
        instance: &'a GeneratorInstance,
        program: &'a GeneratorProgram,
        files: Vec<String>,
        export_path: PathBuf,
    ) -> Self {
        Self {
            owner,
            instance,
            program,
            files,
            export_path,
        }
    }

    /// The identity given to the cores this run produces.
    pub fn vlnv(&self) -> Vlnv {
        self.owner.get_vlnv().derive(&self.instance.name)
    }

    pub fn work_dir(&self, cache_root: &Path) -> PathBuf {
        cache_root
            .join(GENERATED_DIR)
            .join(self.vlnv().sanitized_name())
    }

    pub fn input(&self) -> Result<GeneratorInput, Error> {
        let files_root = filesystem::absolute(self.owner.get_root())?;
        Ok(GeneratorInput {
            protocol_version: PROTOCOL_VERSION.to_string(),
            vlnv: self.vlnv(),
            files_root: filesystem::into_std_str(files_root),
            export_path: filesystem::into_std_str(self.export_path.clone()),
            files: self.files.clone(),
            parameters: self.instance.parameters.clone(),
        })
    }

    fn launch_error(&self, e: impl std::error::Error) -> Error {
        Error::GeneratorLaunchFailed(
            self.program.name.clone(),
            self.instance.name.clone(),
            LastError(e.to_string()),
        )
    }

    /// Runs the generator and parses every core it emits, in file-name order.
    pub fn generate(&self, cache_root: &Path) -> Result<Vec<Core>, Error> {
        let dir = self.work_dir(cache_root);
        info!("generating {}", self.vlnv());
        // stale outputs from an earlier run must never be harvested
        filesystem::recreate_dir(&dir)?;

        let input_file = dir.join(format!("{}_input.json", self.instance.name));
        let text = serde_json::to_string_pretty(&self.input()?)
            .map_err(|e| Error::Serialize(LastError(e.to_string())))?;
        std::fs::write(&input_file, text).map_err(|e| Error::io(&input_file, e))?;

        let command = filesystem::resolve_rel_path(&self.program.root, &self.program.command);
        let mut proc = match &self.program.interpreter {
            Some(interp) => {
                let mut c = Command::new(interp);
                c.arg(&command);
                c
            }
            None => Command::new(&command),
        };
        proc.arg(&input_file).current_dir(&dir);
        debug!("running generator: {:?}", proc);

        let exit_code = proc
            .spawn()
            .map_err(|e| self.launch_error(e))?
            .wait()
            .map_err(|e| self.launch_error(e))?;
        match exit_code.code() {
            Some(0) => (),
            Some(num) => {
                return Err(Error::GeneratorExitCode(
                    self.program.name.clone(),
                    self.instance.name.clone(),
                    num,
                ))
            }
            None => {
                return Err(Error::GeneratorTerminated(
                    self.program.name.clone(),
                    self.instance.name.clone(),
                ))
            }
        }
        self.harvest(&dir)
    }

    fn harvest(&self, dir: &Path) -> Result<Vec<Core>, Error> {
        let walk = WalkBuilder::new(dir)
            .standard_filters(false)
            .hidden(false)
            .git_ignore(false)
            .sort_by_file_name(|a, b| a.cmp(b))
            .build();
        let mut cores = Vec::new();
        for entry in walk {
            let entry = entry.map_err(|e| Error::io(dir, e))?;
            let is_file = entry.file_type().map(|t| t.is_file()).unwrap_or(false);
            if is_file == false || Manifest::is_core_file(entry.path()) == false {
                continue;
            }
            let core = Core::from_file(entry.path()).map_err(|e| {
                Error::GeneratedCoreInvalid(
                    self.instance.name.clone(),
                    entry.path().to_path_buf(),
                    LastError(e.to_string()),
                )
            })?;
            cores.push(core);
        }
        Ok(cores)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::core::package::Position;
    use std::str::FromStr;

    fn owner(root: &Path) -> Core {
        let man = Manifest::from_str("[core]\nname = \"acme:lib:top:1.0\"\n").unwrap();
        Core::from_manifest(man, &root.join("top.core")).unwrap()
    }

    fn instance() -> GeneratorInstance {
        let mut parameters = BTreeMap::new();
        parameters.insert(String::from("depth"), Value::from(4));
        GeneratorInstance {
            name: String::from("gen1"),
            generator: String::from("mygen"),
            filesets: Vec::new(),
            parameters: parameters,
            position: Position::First,
        }
    }

    fn program(root: &Path, command: &str) -> GeneratorProgram {
        GeneratorProgram {
            name: String::from("mygen"),
            command: command.to_string(),
            interpreter: Some(String::from("sh")),
            description: None,
            root: root.to_path_buf(),
        }
    }

    #[test]
    fn input_document() {
        let dir = tempfile::tempdir().unwrap();
        let core = owner(dir.path());
        let gi = instance();
        let prog = program(dir.path(), "gen.sh");
        let run = GeneratorRun::new(&core, &gi, &prog, vec![String::from("/abs/a.v")], dir.path().join("export"));
        assert_eq!(run.vlnv().canonical(), "acme:lib:top-gen1:1.0");
        assert_eq!(
            run.work_dir(Path::new("/cache")),
            PathBuf::from("/cache/generated/acme_lib_top_gen1_1_0")
        );
        let input = run.input().unwrap();
        assert_eq!(input.protocol_version, "1.0");
        assert_eq!(input.files, vec![String::from("/abs/a.v")]);
        assert_eq!(input.parameters.get("depth"), Some(&Value::from(4)));
        let json = serde_json::to_value(&input).unwrap();
        assert_eq!(json["vlnv"], "acme:lib:top-gen1:1.0");
    }

    #[cfg(unix)]
    #[test]
    fn generate_harvests_cores() {
        let dir = tempfile::tempdir().unwrap();
        let cache = dir.path().join("cache");
        std::fs::write(
            dir.path().join("gen.sh"),
            "test -f \"$1\" || exit 3\nmkdir -p out\nprintf '[core]\\nname = \"acme:lib:top-gen1:1.0\"\\n' > out/gen.core\n",
        )
        .unwrap();
        let core = owner(dir.path());
        let gi = instance();
        let prog = program(dir.path(), "gen.sh");
        let run = GeneratorRun::new(&core, &gi, &prog, Vec::new(), dir.path().to_path_buf());
        // leftovers from an earlier run are discarded
        let work = run.work_dir(&cache);
        std::fs::create_dir_all(&work).unwrap();
        std::fs::write(work.join("stale.core"), "[core]\nname = \"acme:lib:stale:1.0\"\n").unwrap();

        let cores = run.generate(&cache).unwrap();
        assert_eq!(cores.len(), 1);
        assert_eq!(cores[0].get_vlnv().canonical(), "acme:lib:top-gen1:1.0");
        assert_eq!(work.join("gen1_input.json").exists(), true);
    }

    #[cfg(unix)]
    #[test]
    fn generate_reports_exit_code() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("fail.sh"), "exit 7\n").unwrap();
        let core = owner(dir.path());
        let gi = instance();
        let prog = program(dir.path(), "fail.sh");
        let run = GeneratorRun::new(&core, &gi, &prog, Vec::new(), dir.path().to_path_buf());
        assert_eq!(
            run.generate(&dir.path().join("cache")).unwrap_err(),
            Error::GeneratorExitCode(String::from("mygen"), String::from("gen1"), 7)
        );
    }

    #[cfg(unix)]
    #[test]
    fn generate_rejects_malformed_output() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("bad.sh"), "echo 'not toml [' > bad.core\n").unwrap();
        let core = owner(dir.path());
        let gi = instance();
        let prog = program(dir.path(), "bad.sh");
        let run = GeneratorRun::new(&core, &gi, &prog, Vec::new(), dir.path().to_path_buf());
        let err = run.generate(&dir.path().join("cache")).unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::GeneratorExecution);
    }

    #[test]
    fn launch_failure() {
        let dir = tempfile::tempdir().unwrap();
        let core = owner(dir.path());
        let gi = instance();
        let mut prog = program(dir.path(), "gen.sh");
        prog.interpreter = Some(String::from("definitely-not-a-real-interpreter-xyz"));
        let run = GeneratorRun::new(&core, &gi, &prog, Vec::new(), dir.path().to_path_buf());
        match run.generate(&dir.path().join("cache")) {
            Err(Error::GeneratorLaunchFailed(g, i, _)) => {
                assert_eq!(g, "mygen");
                assert_eq!(i, "gen1");
            }
            other => panic!("unexpected result {:?}", other.map(|c| c.len())),
        }
    }
}
