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

use crate::error::Error;
use fs_extra;
use std::path::{Component, Path, PathBuf};

/// Lexically removes `.` and resolves `..` components.
pub fn normalize(path: &Path) -> PathBuf {
    let mut result = PathBuf::new();
    for comp in path.components() {
        match comp {
            Component::CurDir => (),
            Component::ParentDir => {
                let (is_named, is_root) = match result.components().last() {
                    Some(Component::Normal(_)) => (true, false),
                    Some(Component::RootDir) | Some(Component::Prefix(_)) => (false, true),
                    _ => (false, false),
                };
                if is_named == true {
                    result.pop();
                } else if is_root == false {
                    result.push("..");
                }
            }
            c => result.push(c.as_os_str()),
        }
    }
    result
}

/// Joins a relative `path` onto the current working directory.
pub fn absolute(path: &Path) -> Result<PathBuf, Error> {
    match path.is_absolute() {
        true => Ok(normalize(path)),
        false => {
            let cwd = std::env::current_dir().map_err(|e| Error::io(path, e))?;
            Ok(normalize(&cwd.join(path)))
        }
    }
}

/// Computes the path to reach `target` starting from directory `base`.
///
/// Both paths are expected to be absolute.
pub fn relative_path(base: &Path, target: &Path) -> PathBuf {
    let base = normalize(base);
    let target = normalize(target);
    let b: Vec<Component> = base.components().collect();
    let t: Vec<Component> = target.components().collect();
    let common = b.iter().zip(t.iter()).take_while(|(x, y)| x == y).count();

    let mut result = PathBuf::new();
    for _ in common..b.len() {
        result.push("..");
    }
    for c in &t[common..] {
        result.push(c.as_os_str());
    }
    if result.as_os_str().is_empty() == true {
        result.push(".");
    }
    result
}

/// Converts a path to a string using forward slashes on every platform.
pub fn into_std_str(path: PathBuf) -> String {
    path.display().to_string().replace('\\', "/")
}

/// Joins `name` onto the relative root `rel_root` as a standardized string.
pub fn join_rel(rel_root: &str, name: &str) -> String {
    match name.is_empty() {
        true => rel_root.to_string(),
        false => into_std_str(normalize(&Path::new(rel_root).join(name))),
    }
}

/// Resolves a relative path into a full path if given relative to some `root` path.
///
/// The path is left untouched when it is absolute or does not exist under `root`,
/// so bare program names are still found through the environment's search path.
pub fn resolve_rel_path(root: &Path, s: &str) -> String {
    let resolved_path = root.join(s);
    if resolved_path.exists() == true && Path::new(s).is_relative() == true {
        into_std_str(resolved_path)
    } else {
        s.to_string()
    }
}

/// Copies the file `src` to `dst`, creating any missing parent directories.
pub fn copy_file(src: &Path, dst: &Path) -> Result<(), Error> {
    if let Some(parent) = dst.parent() {
        std::fs::create_dir_all(parent).map_err(|e| Error::io(parent, e))?;
    }
    let mut options = fs_extra::file::CopyOptions::new();
    options.overwrite = true;
    fs_extra::file::copy(src, dst, &options).map_err(|e| Error::io(src, e))?;
    Ok(())
}

/// Empties `dir` while retaining any directory whose name contains `keep`.
///
/// The directory is created if it does not exist.
pub fn reset_dir(dir: &Path, keep: &str) -> Result<(), Error> {
    if dir.exists() == false {
        return std::fs::create_dir_all(dir).map_err(|e| Error::io(dir, e));
    }
    for entry in std::fs::read_dir(dir).map_err(|e| Error::io(dir, e))? {
        let path = entry.map_err(|e| Error::io(dir, e))?.path();
        if path.is_dir() == true {
            let name = path.file_name().and_then(|n| n.to_str()).unwrap_or_default();
            if name.contains(keep) == false {
                fs_extra::dir::remove(&path).map_err(|e| Error::io(&path, e))?;
            }
        } else {
            std::fs::remove_file(&path).map_err(|e| Error::io(&path, e))?;
        }
    }
    Ok(())
}

/// Removes `dir` entirely and creates it again empty.
pub fn recreate_dir(dir: &Path) -> Result<(), Error> {
    if dir.exists() == true {
        fs_extra::dir::remove(dir).map_err(|e| Error::io(dir, e))?;
    }
    std::fs::create_dir_all(dir).map_err(|e| Error::io(dir, e))
}
