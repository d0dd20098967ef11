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

//! Assembles a single build description from a resolved set of cores.
//!
//! The assembler walks a FIFO queue seeded with the solver's output. Each
//! core contributes a [Snippet]; generator instances may append newly
//! generated cores to the queue. Snippets are filed into `first`, `default`,
//! and `last` buckets and merged in that order once the queue drains.

use crate::core::flags::Flags;
use crate::core::generator::GeneratorRun;
use crate::core::manager::CoreManager;
use crate::core::package::{GeneratorInstance, GeneratorProgram, Package, Position};
use crate::core::snippet::{EdaApi, FileRecord, Snippet, VpiRecord};
use crate::core::vlnv::Vlnv;
use crate::error::{Error, Hint};
use crate::util::filesystem;
use log::{debug, info};
use std::collections::{BTreeMap, HashSet, VecDeque};
use std::path::{Path, PathBuf};
use std::rc::Rc;

/// Directories in the work root containing this text survive a reset.
pub const KEEP_MARKER: &str = "vunit_out";

/// Generated cores may themselves invoke generators up to this depth.
pub const MAX_GENERATOR_DEPTH: usize = 8;

struct Entry {
    package: Rc<dyn Package>,
    position: Position,
    depth: usize,
}

#[derive(Debug, Default)]
struct Buckets {
    first: Vec<Snippet>,
    default: Vec<Snippet>,
    last: Vec<Snippet>,
}

pub struct Edalizer<'a> {
    cm: &'a mut CoreManager,
    request: Vlnv,
    flags: Flags,
    work_root: PathBuf,
    cache_root: PathBuf,
    export_root: Option<PathBuf>,
    system_name: Option<String>,
    queue: VecDeque<Entry>,
    /// Cores already queued, by canonical name.
    seen: BTreeMap<String, Vlnv>,
    generators: BTreeMap<String, GeneratorProgram>,
    invoked: HashSet<(String, String)>,
    buckets: Buckets,
}

impl<'a> Edalizer<'a> {
    pub fn new(cm: &'a mut CoreManager, request: &Vlnv, flags: &Flags, work_root: &Path, cache_root: &Path) -> Self {
        Self {
            cm: cm,
            request: request.clone(),
            flags: flags.clone(),
            work_root: work_root.to_path_buf(),
            cache_root: cache_root.to_path_buf(),
            export_root: None,
            system_name: None,
            queue: VecDeque::new(),
            seen: BTreeMap::new(),
            generators: BTreeMap::new(),
            invoked: HashSet::new(),
            buckets: Buckets::default(),
        }
    }

    /// Copies each core's files under `root` instead of referencing them in place.
    pub fn export_root(mut self, root: &Path) -> Self {
        self.export_root = Some(root.to_path_buf());
        self
    }

    /// Overrides the name of the build description.
    pub fn system_name(mut self, name: &str) -> Self {
        self.system_name = Some(name.to_string());
        self
    }

    /// Resolves the request, processes every core, and merges the result.
    pub fn run(mut self) -> Result<EdaApi, Error> {
        self.work_root = filesystem::absolute(&self.work_root)?;
        self.cache_root = filesystem::absolute(&self.cache_root)?;
        if let Some(root) = &self.export_root {
            self.export_root = Some(filesystem::absolute(root)?);
        }

        // settle the tool before solving so tool conditions agree everywhere
        let root_core = self.cm.get_core(&self.request)?;
        if self.flags.get_tool().is_none() {
            if let Some(tool) = root_core.get_tool(&self.flags.clone().toplevel(true)) {
                self.flags = self.flags.clone().tool(&tool);
            }
        }

        let resolved = self.cm.get_depends(&self.request, &self.flags)?;
        let top = match resolved.last() {
            Some(t) => t.clone(),
            None => return Err(Error::DependencyNotFound(self.request.to_string(), Hint::AddCoresRoot)),
        };
        let top_flags = self.flags.clone().toplevel(true);
        if let Some(target) = self.flags.get_target() {
            if top.get_target_names().contains(target) == false {
                return Err(Error::TargetNotFound(top.get_vlnv().canonical(), target.clone()));
            }
        }

        self.prepare_work_root()?;

        for package in resolved.iter() {
            self.seen.insert(package.get_vlnv().canonical(), package.get_vlnv().clone());
            self.queue.push_back(Entry {
                package: package.clone(),
                position: Position::Default,
                depth: 0,
            });
        }

        while let Some(entry) = self.queue.pop_front() {
            self.step(entry, top.get_vlnv())?;
        }

        // naming follows the resolved root, not whatever was processed last
        let name = match &self.system_name {
            Some(n) => n.clone(),
            None => top.get_vlnv().sanitized_name(),
        };
        self.merge(&name, top.get_toplevel(&top_flags).as_deref())
    }

    /// Drains the buckets into one description, in `first`, `default`, `last` order.
    pub fn merge(&mut self, name: &str, toplevel: Option<&str>) -> Result<EdaApi, Error> {
        let mut api = EdaApi::new(name, toplevel);
        let buckets = std::mem::take(&mut self.buckets);
        for snippet in buckets.first.iter().chain(buckets.default.iter()).chain(buckets.last.iter()) {
            api.merge(snippet)?;
        }
        Ok(api)
    }

    /// Empties the work root, keeping directories reserved by external tools.
    pub fn prepare_work_root(&self) -> Result<(), Error> {
        filesystem::reset_dir(&self.work_root, KEEP_MARKER)
    }

    fn step(&mut self, entry: Entry, top: &Vlnv) -> Result<(), Error> {
        let package = entry.package.clone();
        let id = package.get_vlnv().clone();
        info!("preparing {}", id);
        let flags = self.flags.clone().toplevel(id.canonical() == top.canonical());

        package.setup()?;

        let files_root = match &self.export_root {
            Some(export) => {
                let dest = export.join(id.sanitized_name());
                package.export(&dest, &flags)?;
                dest
            }
            None => filesystem::absolute(package.get_root())?,
        };
        let rel_root = filesystem::into_std_str(filesystem::relative_path(&self.work_root, &files_root));
        debug!("files root of {} is {:?}", id, rel_root);

        let mut snippet = Snippet::default();
        snippet.parameters = package.get_parameters(&flags)?;
        if let Some(tool) = flags.get_tool() {
            snippet.tool_options.insert(tool.clone(), package.get_tool_options(&flags));
        }
        snippet.scripts = package.get_scripts(&rel_root, &flags)?;
        snippet.files = self.snippet_files(package.as_ref(), &flags, &files_root, &rel_root)?;
        snippet.vpi = self.snippet_vpi(package.as_ref(), &flags, &rel_root)?;

        for (name, program) in package.get_generators(&flags) {
            self.generators.insert(name, program);
        }
        for gi in package.get_generator_instances(&flags)? {
            self.run_generator(&package, &gi, &files_root, entry.depth, top)?;
        }

        self.file_snippet(snippet, entry.position);
        Ok(())
    }

    /// Resolves a core's files relative to the work root, copying any file
    /// marked `copyto` into place.
    pub fn snippet_files(&self, package: &dyn Package, flags: &Flags, files_root: &Path, rel_root: &str) -> Result<Vec<FileRecord>, Error> {
        let mut records = Vec::new();
        for f in package.get_files(flags)? {
            let name = match &f.copyto {
                Some(dest) => {
                    filesystem::copy_file(&files_root.join(&f.name), &self.work_root.join(dest))?;
                    dest.clone()
                }
                None => filesystem::join_rel(rel_root, &f.name),
            };
            records.push(FileRecord {
                name: name,
                file_type: f.file_type,
                is_include_file: f.is_include_file,
                logical_name: f.logical_name,
            });
        }
        Ok(records)
    }

    pub fn snippet_vpi(&self, package: &dyn Package, flags: &Flags, rel_root: &str) -> Result<Vec<VpiRecord>, Error> {
        Ok(package
            .get_vpi(flags)?
            .into_iter()
            .map(|v| VpiRecord {
                name: v.name,
                src_files: v.src_files.iter().map(|f| filesystem::join_rel(rel_root, f)).collect(),
                include_dirs: v.include_dirs.iter().map(|d| filesystem::join_rel(rel_root, d)).collect(),
                libs: v.libs,
            })
            .collect())
    }

    /// Lists the absolute paths of the files a generator instance may read.
    pub fn generator_files(package: &dyn Package, gi: &GeneratorInstance, files_root: &Path) -> Result<Vec<String>, Error> {
        let owner = package.get_vlnv().canonical();
        let mut files = Vec::new();
        for name in &gi.filesets {
            let fs = package
                .get_fileset(name)
                .ok_or_else(|| Error::GeneratorFilesetNotFound(owner.clone(), gi.name.clone(), name.clone()))?;
            for f in fs.get_files() {
                if f.copyto.is_some() {
                    return Err(Error::GeneratorCopyToFile(owner, gi.name.clone(), f.name.clone()));
                }
                files.push(filesystem::into_std_str(filesystem::normalize(&files_root.join(&f.name))));
            }
        }
        Ok(files)
    }

    fn run_generator(&mut self, package: &Rc<dyn Package>, gi: &GeneratorInstance, files_root: &Path, depth: usize, top: &Vlnv) -> Result<(), Error> {
        let owner = package.get_vlnv().canonical();
        if self.invoked.insert((owner.clone(), gi.name.clone())) == false {
            return Err(Error::GeneratorReinvoked(owner, gi.name.clone()));
        }
        if depth >= MAX_GENERATOR_DEPTH {
            return Err(Error::GeneratorDepthExceeded(
                gi.generator.clone(),
                gi.name.clone(),
                MAX_GENERATOR_DEPTH,
            ));
        }
        let program = self
            .generators
            .get(&gi.generator)
            .cloned()
            .ok_or_else(|| {
                Error::GeneratorProgramNotFound(
                    owner.clone(),
                    gi.name.clone(),
                    gi.generator.clone(),
                    Hint::AdvertiseGenerator,
                )
            })?;
        let files = Self::generator_files(package.as_ref(), gi, files_root)?;

        let run = GeneratorRun::new(package.as_ref(), gi, &program, files, files_root.to_path_buf());
        for core in run.generate(&self.cache_root)? {
            let core: Rc<dyn Package> = Rc::new(core);
            self.cm.register(core.clone());
            // pull in what the generated core needs without changing earlier choices
            let pinned: Vec<Vlnv> = self.seen.values().cloned().collect();
            let needed = self.cm.get_db().solve_within(core.get_vlnv(), top, &pinned, &self.flags)?;
            for p in needed {
                if self.seen.insert(p.get_vlnv().canonical(), p.get_vlnv().clone()).is_none() {
                    self.queue.push_back(Entry {
                        package: p,
                        position: gi.position,
                        depth: depth + 1,
                    });
                }
            }
        }
        Ok(())
    }

    /// Files a core's contribution into the bucket chosen by `position`.
    pub fn file_snippet(&mut self, snippet: Snippet, position: Position) {
        match position {
            Position::First => self.buckets.first.push(snippet),
            Position::Default => self.buckets.default.push(snippet),
            Position::Last => self.buckets.last.push(snippet),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::str::FromStr;

    fn write(path: &Path, text: &str) {
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, text).unwrap();
    }

    fn id(s: &str) -> Vlnv {
        Vlnv::from_str(s).unwrap()
    }

    /// Lays out a workspace with a `cores` root and returns its manager.
    fn manager(root: &Path) -> CoreManager {
        let mut cm = CoreManager::new();
        cm.add_cores_root(&root.join("cores")).unwrap();
        cm
    }

    const TOP_WITH_GENERATOR: &str = r#"
[core]
name = "acme:lib:top:1.0"

[filesets.rtl]
files = ["top.src"]
file-type = "user"

[targets.default]
filesets = ["rtl"]
toplevel = "top"
generate = ["gen1"]

[generators.mygen]
command = "gen.sh"
interpreter = "sh"

[generate.gen1]
generator = "mygen"
position = "first"
"#;

    const GEN_SCRIPT: &str = r#"cat > gen.core <<EOF
[core]
name = "acme:lib:top-gen1:1.0"

[filesets.rtl]
files = ["gen.src"]
file-type = "user"

[targets.default]
filesets = ["rtl"]
EOF
touch gen.src
"#;

    #[cfg(unix)]
    #[test]
    fn generated_core_goes_first() {
        let dir = tempfile::tempdir().unwrap();
        write(&dir.path().join("cores/top/top.core"), TOP_WITH_GENERATOR);
        write(&dir.path().join("cores/top/top.src"), "");
        write(&dir.path().join("cores/top/gen.sh"), GEN_SCRIPT);
        let mut cm = manager(dir.path());

        let api = Edalizer::new(
            &mut cm,
            &id("acme:lib:top:1.0"),
            &Flags::new(),
            &dir.path().join("build/work"),
            &dir.path().join("cache"),
        )
        .run()
        .unwrap();

        let files: Vec<String> = api
            .get_files()
            .iter()
            .map(|f| Path::new(f).file_name().unwrap().to_string_lossy().to_string())
            .collect();
        assert_eq!(files, vec!["gen.src", "top.src"]);
        assert_eq!(api.get_data()["toplevel"], "top");
        assert_eq!(api.get_data()["name"], "acme_lib_top_1_0");
        assert_eq!(api.get_files()[1], "../../cores/top/top.src");
        // the generated core is now visible to later queries
        assert_eq!(cm.get_core(&id("acme:lib:top-gen1:1.0")).is_ok(), true);
    }

    #[cfg(unix)]
    #[test]
    fn assembly_is_deterministic() {
        let dir = tempfile::tempdir().unwrap();
        write(&dir.path().join("cores/top/top.core"), TOP_WITH_GENERATOR);
        write(&dir.path().join("cores/top/top.src"), "");
        write(&dir.path().join("cores/top/gen.sh"), GEN_SCRIPT);

        let mut outputs = Vec::new();
        for _ in 0..2 {
            let mut cm = manager(dir.path());
            let api = Edalizer::new(
                &mut cm,
                &id("acme:lib:top"),
                &Flags::new(),
                &dir.path().join("build/work"),
                &dir.path().join("cache"),
            )
            .run()
            .unwrap();
            outputs.push(api.to_json().unwrap());
        }
        assert_eq!(outputs[0], outputs[1]);
    }

    #[test]
    fn copyto_file_rejected_before_launch() {
        let dir = tempfile::tempdir().unwrap();
        write(
            &dir.path().join("cores/top/top.core"),
            r#"
[core]
name = "acme:lib:top:1.0"

[filesets.data]
files = [{ name = "init.hex", copyto = "init.hex" }]

[targets.default]
generate = ["gen1"]

[generators.mygen]
command = "gen.sh"
interpreter = "sh"

[generate.gen1]
generator = "mygen"
filesets = ["data"]
"#,
        );
        write(&dir.path().join("cores/top/init.hex"), "00");
        write(&dir.path().join("cores/top/gen.sh"), "touch launched\n");
        let mut cm = manager(dir.path());
        let cache = dir.path().join("cache");

        let err = Edalizer::new(&mut cm, &id("acme:lib:top:1.0"), &Flags::new(), &dir.path().join("work"), &cache)
            .run()
            .unwrap_err();
        assert_eq!(
            err,
            Error::GeneratorCopyToFile(
                String::from("acme:lib:top:1.0"),
                String::from("gen1"),
                String::from("init.hex")
            )
        );
        // no working directory was ever made for the generator
        assert_eq!(cache.join("generated").exists(), false);
    }

    fn snippet(file: &str, toplevel_param: i64) -> Snippet {
        let mut s = Snippet::default();
        s.files.push(FileRecord {
            name: file.to_string(),
            file_type: String::from("user"),
            is_include_file: false,
            logical_name: String::new(),
        });
        s.parameters.insert(
            String::from("W"),
            crate::core::package::Parameter {
                datatype: String::from("int"),
                default: Some(serde_json::Value::from(toplevel_param)),
                description: None,
                paramtype: String::from("vlogparam"),
            },
        );
        s
    }

    #[test]
    fn buckets_merge_in_order() {
        let mut cm = CoreManager::new();
        let mut ed = Edalizer::new(&mut cm, &id("acme:lib:top:1.0"), &Flags::new(), Path::new("work"), Path::new("cache"));
        ed.file_snippet(snippet("c", 3), Position::Last);
        ed.file_snippet(snippet("b1", 2), Position::Default);
        ed.file_snippet(snippet("a", 1), Position::First);
        ed.file_snippet(snippet("b2", 4), Position::Default);

        let api = ed.merge("sys", None).unwrap();
        assert_eq!(api.get_files(), vec!["a", "b1", "b2", "c"]);
        // the last bucket has the final say on scalars
        assert_eq!(api.get_data()["parameters"]["W"]["default"], 3);
        assert_eq!(api.get_data()["toplevel"], serde_json::Value::Null);
    }

    #[test]
    fn unknown_generator_program() {
        let dir = tempfile::tempdir().unwrap();
        write(
            &dir.path().join("cores/top/top.core"),
            "[core]\nname = \"acme:lib:top:1.0\"\n[targets.default]\ngenerate = [\"g\"]\n[generate.g]\ngenerator = \"nowhere\"\n",
        );
        let mut cm = manager(dir.path());
        let err = Edalizer::new(&mut cm, &id("acme:lib:top:1.0"), &Flags::new(), &dir.path().join("work"), &dir.path().join("cache"))
            .run()
            .unwrap_err();
        assert_eq!(
            err,
            Error::GeneratorProgramNotFound(
                String::from("acme:lib:top:1.0"),
                String::from("g"),
                String::from("nowhere"),
                Hint::AdvertiseGenerator
            )
        );
    }

    #[test]
    fn copyto_files_and_work_root_reset() {
        let dir = tempfile::tempdir().unwrap();
        write(
            &dir.path().join("cores/top/top.core"),
            r#"
[core]
name = "acme:lib:top:1.0"

[filesets.rtl]
files = ["rtl/top.v", { name = "data/init.hex", copyto = "mem/init.hex" }]
file-type = "verilogSource"

[targets.default]
filesets = ["rtl"]
toplevel = "top"

[targets.sim]
filesets = ["rtl"]
toplevel = "tb"
"#,
        );
        write(&dir.path().join("cores/top/rtl/top.v"), "");
        write(&dir.path().join("cores/top/data/init.hex"), "ff");
        let work = dir.path().join("work");
        write(&work.join("stale.txt"), "");
        write(&work.join("vunit_out/keep.txt"), "");
        let mut cm = manager(dir.path());

        let api = Edalizer::new(&mut cm, &id("acme:lib:top:1.0"), &Flags::new().target("sim"), &work, &dir.path().join("cache"))
            .system_name("mysys")
            .run()
            .unwrap();
        assert_eq!(api.get_files(), vec!["../cores/top/rtl/top.v", "mem/init.hex"]);
        assert_eq!(std::fs::read_to_string(work.join("mem/init.hex")).unwrap(), "ff");
        assert_eq!(work.join("stale.txt").exists(), false);
        assert_eq!(work.join("vunit_out/keep.txt").exists(), true);
        assert_eq!(api.get_data()["name"], "mysys");
        assert_eq!(api.get_data()["toplevel"], "tb");
    }

    #[test]
    fn dependencies_and_export() {
        let dir = tempfile::tempdir().unwrap();
        write(
            &dir.path().join("cores/top/top.core"),
            r#"
[core]
name = "acme:lib:top:1.0"

[filesets.rtl]
files = ["top.v"]
file-type = "verilogSource"
depend = ["acme:lib:fifo"]

[targets.default]
filesets = ["rtl"]
parameters = ["WIDTH=16"]
toplevel = "top"
default-tool = "icarus"
tools.icarus = { iverilog-options = ["-g2012"] }

[parameters.WIDTH]
datatype = "int"
default = 8
paramtype = "vlogparam"
"#,
        );
        write(&dir.path().join("cores/top/top.v"), "");
        write(
            &dir.path().join("cores/fifo/fifo.core"),
            r#"
[core]
name = "acme:lib:fifo:1.1"

[filesets.rtl]
files = ["fifo.v"]
file-type = "verilogSource"

[targets.default]
filesets = ["rtl"]
parameters = ["WIDTH"]
tools.icarus = { iverilog-options = ["-DFIFO"] }

[parameters.WIDTH]
datatype = "int"
default = 8
paramtype = "vlogparam"
"#,
        );
        write(&dir.path().join("cores/fifo/fifo.v"), "");
        let mut cm = manager(dir.path());
        let build = dir.path().join("build");

        let api = Edalizer::new(&mut cm, &id("acme:lib:top:1.0"), &Flags::new(), &build.join("work"), &dir.path().join("cache"))
            .export_root(&build.join("src"))
            .run()
            .unwrap();
        // dependencies come first; exported copies are referenced
        assert_eq!(
            api.get_files(),
            vec!["../src/acme_lib_fifo_1_1/fifo.v", "../src/acme_lib_top_1_0/top.v"]
        );
        assert_eq!(build.join("src/acme_lib_top_1_0/top.v").exists(), true);
        // the top core's override lands last
        assert_eq!(api.get_data()["parameters"]["WIDTH"]["default"], 16);
        assert_eq!(
            api.get_data()["tool_options"]["icarus"]["iverilog-options"],
            serde_json::json!(["-DFIFO", "-g2012"])
        );
    }

    #[test]
    fn missing_target_on_toplevel() {
        let dir = tempfile::tempdir().unwrap();
        write(&dir.path().join("cores/top/top.core"), "[core]\nname = \"acme:lib:top:1.0\"\n[targets.default]\n");
        let mut cm = manager(dir.path());
        let err = Edalizer::new(&mut cm, &id("acme:lib:top"), &Flags::new().target("synth"), &dir.path().join("work"), &dir.path().join("cache"))
            .run()
            .unwrap_err();
        assert_eq!(err, Error::TargetNotFound(String::from("acme:lib:top:1.0"), String::from("synth")));
    }

    /// Lays out a top core whose `target` runs a generator emitting a core
    /// that depends on `depend`.
    fn top_generating(root: &Path, target: &str, top_depend: &str, depend: &str) {
        write(
            &root.join("cores/top/top.core"),
            &format!(
                r#"
[core]
name = "acme:lib:top:1.0"

[filesets.rtl]
files = ["top.src"]
file-type = "user"
depend = [{}]

[targets.default]
filesets = ["rtl"]

[targets.{}]
filesets = ["rtl"]
generate = ["gen1"]

[generators.mygen]
command = "gen.sh"
interpreter = "sh"

[generate.gen1]
generator = "mygen"
"#,
                top_depend, target
            ),
        );
        write(&root.join("cores/top/top.src"), "");
        write(
            &root.join("cores/top/gen.sh"),
            &format!(
                r#"cat > gen.core <<EOF
[core]
name = "acme:lib:top-gen1:1.0"

[filesets.rtl]
files = ["gen.src"]
file-type = "user"

[targets.default]
filesets = ["rtl"]
depend = ["{}"]
EOF
touch gen.src
"#,
                depend
            ),
        );
    }

    fn fifo(root: &Path, dir: &str, version: &str) {
        write(
            &root.join("cores").join(dir).join("fifo.core"),
            &format!(
                "[core]\nname = \"acme:lib:fifo:{}\"\n[filesets.rtl]\nfiles = [\"{}.v\"]\nfile-type = \"verilogSource\"\n[targets.default]\nfilesets = [\"rtl\"]\n",
                version, dir
            ),
        );
        write(&root.join("cores").join(dir).join(format!("{}.v", dir)), "");
    }

    #[cfg(unix)]
    #[test]
    fn generated_core_dependencies_under_target() {
        let dir = tempfile::tempdir().unwrap();
        top_generating(dir.path(), "sim", "", "acme:lib:fifo");
        fifo(dir.path(), "fifo1", "1.0");
        let mut cm = manager(dir.path());

        let api = Edalizer::new(&mut cm, &id("acme:lib:top:1.0"), &Flags::new().target("sim"), &dir.path().join("work"), &dir.path().join("cache"))
            .run()
            .unwrap();
        // the generated core is not toplevel, so its default target supplies the dependency
        assert_eq!(
            api.get_files(),
            vec![
                "../cores/top/top.src",
                "../cores/fifo1/fifo1.v",
                "../cache/generated/acme_lib_top_gen1_1_0/gen.src"
            ]
        );
    }

    #[cfg(unix)]
    #[test]
    fn generated_core_reuses_selected_versions() {
        let dir = tempfile::tempdir().unwrap();
        top_generating(dir.path(), "sim", "\"acme:lib:fifo\"", "acme:lib:fifo");
        fifo(dir.path(), "fifo1", "1.0");
        fifo(dir.path(), "fifo2", "1.2");
        let mut cm = manager(dir.path());

        let api = Edalizer::new(&mut cm, &id("acme:lib:top:1.0"), &Flags::new().target("sim"), &dir.path().join("work"), &dir.path().join("cache"))
            .run()
            .unwrap();
        assert_eq!(
            api.get_files(),
            vec![
                "../cores/fifo2/fifo2.v",
                "../cores/top/top.src",
                "../cache/generated/acme_lib_top_gen1_1_0/gen.src"
            ]
        );
    }

    #[cfg(unix)]
    #[test]
    fn generated_core_version_conflict() {
        let dir = tempfile::tempdir().unwrap();
        top_generating(dir.path(), "sim", "\"acme:lib:fifo\"", "==acme:lib:fifo:1.0");
        fifo(dir.path(), "fifo1", "1.0");
        fifo(dir.path(), "fifo2", "1.2");
        let mut cm = manager(dir.path());

        let result = Edalizer::new(&mut cm, &id("acme:lib:top:1.0"), &Flags::new().target("sim"), &dir.path().join("work"), &dir.path().join("cache")).run();
        match result {
            Err(Error::UnsatisfiableDependency(root, why)) => {
                assert_eq!(root, "acme:lib:top-gen1:1.0");
                assert_eq!(why.contains("conflicts with the selected acme:lib:fifo:1.2"), true);
            }
            other => panic!("unexpected result {:?}", other.map(|api| api.get_files())),
        }
    }

    #[test]
    fn generator_fileset_must_exist() {
        let dir = tempfile::tempdir().unwrap();
        write(
            &dir.path().join("cores/top/top.core"),
            r#"
[core]
name = "acme:lib:top:1.0"

[targets.default]
generate = ["gen1"]

[generators.mygen]
command = "gen.sh"
interpreter = "sh"

[generate.gen1]
generator = "mygen"
filesets = ["missing"]
"#,
        );
        let mut cm = manager(dir.path());
        let err = Edalizer::new(&mut cm, &id("acme:lib:top:1.0"), &Flags::new(), &dir.path().join("work"), &dir.path().join("cache"))
            .run()
            .unwrap_err();
        assert_eq!(
            err,
            Error::GeneratorFilesetNotFound(
                String::from("acme:lib:top:1.0"),
                String::from("gen1"),
                String::from("missing")
            )
        );
    }

    #[test]
    fn vpi_and_hooks_follow_exported_root() {
        let dir = tempfile::tempdir().unwrap();
        write(
            &dir.path().join("cores/top/top.core"),
            r#"
[core]
name = "acme:lib:top:1.0"

[filesets.rtl]
files = ["top.v"]
file-type = "verilogSource"

[filesets.vpi_src]
files = ["vpi/a.c", { name = "vpi/inc/a.h", is-include-file = true }]

[targets.default]
filesets = ["rtl"]
vpi = ["myvpi"]
hooks.pre-build = ["prep"]

[vpi.myvpi]
filesets = ["vpi_src"]
libs = ["-lm"]

[scripts.prep]
cmd = ["sh", "prep.sh"]
filesets = ["rtl"]
"#,
        );
        write(&dir.path().join("cores/top/top.v"), "");
        write(&dir.path().join("cores/top/vpi/a.c"), "");
        write(&dir.path().join("cores/top/vpi/inc/a.h"), "");
        let mut cm = manager(dir.path());
        let build = dir.path().join("build");

        let api = Edalizer::new(&mut cm, &id("acme:lib:top:1.0"), &Flags::new(), &build.join("work"), &dir.path().join("cache"))
            .export_root(&build.join("src"))
            .run()
            .unwrap();
        let vpi = &api.get_data()["vpi"][0];
        assert_eq!(vpi["name"], "myvpi");
        assert_eq!(vpi["src_files"], serde_json::json!(["../src/acme_lib_top_1_0/vpi/a.c"]));
        assert_eq!(vpi["include_dirs"], serde_json::json!(["../src/acme_lib_top_1_0/vpi/inc"]));
        assert_eq!(vpi["libs"], serde_json::json!(["-lm"]));
        assert_eq!(build.join("src/acme_lib_top_1_0/vpi/a.c").exists(), true);

        let prep = &api.get_data()["hooks"]["pre_build"][0];
        assert_eq!(prep["env"]["FILES_ROOT"], "../src/acme_lib_top_1_0");
        assert_eq!(prep["env"]["FILES"], "../src/acme_lib_top_1_0/top.v");
    }

    #[cfg(unix)]
    #[test]
    fn runaway_generators_are_stopped() {
        let dir = tempfile::tempdir().unwrap();
        write(
            &dir.path().join("cores/top/top.core"),
            r#"
[core]
name = "acme:lib:top:1.0"

[targets.default]
generate = ["again"]

[generators.mygen]
command = "gen.sh"
interpreter = "sh"

[generate.again]
generator = "mygen"
"#,
        );
        // every generated core asks for one more generation
        write(
            &dir.path().join("cores/top/gen.sh"),
            r#"name=$(sed -n 's/.*"vlnv": "\(.*\)".*/\1/p' "$1")
cat > gen.core <<EOF
[core]
name = "$name"

[targets.default]
generate = ["again"]

[generate.again]
generator = "mygen"
EOF
"#,
        );
        let mut cm = manager(dir.path());
        let err = Edalizer::new(&mut cm, &id("acme:lib:top:1.0"), &Flags::new(), &dir.path().join("work"), &dir.path().join("cache"))
            .run()
            .unwrap_err();
        assert_eq!(
            err,
            Error::GeneratorDepthExceeded(String::from("mygen"), String::from("again"), MAX_GENERATOR_DEPTH)
        );
    }
}
