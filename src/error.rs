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

use colored::Colorize;
use std::{fmt::Display, path::PathBuf};

#[derive(Debug, PartialEq, thiserror::Error)]
pub enum Error {
    // discovery
    #[error("failed to parse core description {0:?}: {1}")]
    CoreParse(PathBuf, LastError),
    #[error("cores root {0:?} is not a directory")]
    CoresRootNotDir(PathBuf),
    #[error("invalid core identifier {0:?}: {1}")]
    InvalidVlnv(String, LastError),
    // dependency
    #[error("no core satisfies {0:?}{1}")]
    DependencyNotFound(String, Hint),
    #[error("unsatisfiable dependencies for {0:?}:\n{1}")]
    UnsatisfiableDependency(String, String),
    #[error("core {0:?} is not in the registry{1}")]
    CoreNotFound(String, Hint),
    // configuration
    #[error("core {0:?} has no target named {1:?}")]
    TargetNotFound(String, String),
    #[error("core {0:?} references undefined fileset {1:?}")]
    FilesetNotFound(String, String),
    #[error("core {0:?} references undefined parameter {1:?}")]
    ParameterNotFound(String, String),
    #[error("core {0:?} references undefined script {1:?}")]
    ScriptNotFound(String, String),
    #[error("core {0:?} references undefined generate entry {1:?}")]
    GenerateNotFound(String, String),
    #[error("core {0:?} references undefined vpi module {1:?}")]
    VpiNotFound(String, String),
    #[error("generate entry {1:?} of core {0:?} requests generator {2:?}, which no resolved core provides{3}")]
    GeneratorProgramNotFound(String, String, String, Hint),
    #[error("generate entry {1:?} of core {0:?} requests undefined fileset {2:?}")]
    GeneratorFilesetNotFound(String, String, String),
    #[error("generate entry {1:?} of core {0:?} cannot use file {2:?} because it is marked with 'copyto'")]
    GeneratorCopyToFile(String, String, String),
    // generator execution
    #[error("failed to launch generator {0:?} for {1:?}: {2}")]
    GeneratorLaunchFailed(String, String, LastError),
    #[error("generator {0:?} for {1:?} exited with error code: {2}")]
    GeneratorExitCode(String, String, i32),
    #[error("generator {0:?} for {1:?} terminated by signal")]
    GeneratorTerminated(String, String),
    #[error("generator for {0:?} produced an invalid core {1:?}: {2}")]
    GeneratedCoreInvalid(String, PathBuf, LastError),
    #[error("generate entry {1:?} of core {0:?} was already invoked during this run")]
    GeneratorReinvoked(String, String),
    #[error("generator {0:?} for {1:?} exceeds the maximum nesting depth of {2}")]
    GeneratorDepthExceeded(String, String, usize),
    #[error("failed to read generator input {0:?}: {1}")]
    GeneratorInputInvalid(PathBuf, LastError),
    // io
    #[error("failed to parse configuration {0:?}: {1}")]
    ConfigParse(PathBuf, LastError),
    #[error("failed to modify configuration: {0}")]
    ConfigNotSaved(LastError),
    #[error("file system operation failed on {0:?}: {1}")]
    Io(PathBuf, LastError),
    #[error("failed to serialize build description: {0}")]
    Serialize(LastError),
}

/// The broad class an [Error] belongs to.
#[derive(Debug, PartialEq, Clone, Copy)]
pub enum ErrorKind {
    /// A malformed description found while scanning for cores.
    Discovery,
    /// Constraints that cannot be satisfied by the registry.
    Dependency,
    /// An invalid reference inside a core's description.
    Configuration,
    /// A generator failed to run or produced unusable output.
    GeneratorExecution,
    Io,
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::CoreParse(..) | Self::CoresRootNotDir(..) | Self::InvalidVlnv(..) => {
                ErrorKind::Discovery
            }
            Self::DependencyNotFound(..)
            | Self::UnsatisfiableDependency(..)
            | Self::CoreNotFound(..) => ErrorKind::Dependency,
            Self::TargetNotFound(..)
            | Self::FilesetNotFound(..)
            | Self::ParameterNotFound(..)
            | Self::ScriptNotFound(..)
            | Self::GenerateNotFound(..)
            | Self::VpiNotFound(..)
            | Self::GeneratorProgramNotFound(..)
            | Self::GeneratorFilesetNotFound(..)
            | Self::GeneratorCopyToFile(..) => ErrorKind::Configuration,
            Self::GeneratorLaunchFailed(..)
            | Self::GeneratorExitCode(..)
            | Self::GeneratorTerminated(..)
            | Self::GeneratedCoreInvalid(..)
            | Self::GeneratorReinvoked(..)
            | Self::GeneratorDepthExceeded(..)
            | Self::GeneratorInputInvalid(..) => ErrorKind::GeneratorExecution,
            Self::ConfigParse(..) | Self::ConfigNotSaved(..) | Self::Io(..) | Self::Serialize(..) => {
                ErrorKind::Io
            }
        }
    }

    /// Wraps a filesystem error that occurred while operating on `path`.
    pub fn io<P: Into<PathBuf>>(path: P, e: impl std::error::Error) -> Self {
        Self::Io(path.into(), LastError(e.to_string()))
    }

    pub fn lowerize(s: String) -> String {
        // get the first word
        let first_word = match s.split_whitespace().next() {
            Some(w) => w,
            None => return s,
        };
        // retain punctuation if the first word is all-caps and longer than 1 character
        if first_word.len() > 1
            && first_word
                .chars()
                .find(|c| c.is_ascii_lowercase() == true)
                .is_none()
        {
            s.to_string()
        } else {
            s.char_indices()
                .map(|(i, c)| if i == 0 { c.to_ascii_lowercase() } else { c })
                .collect()
        }
    }
}

#[derive(Debug, PartialEq)]
pub struct LastError(pub String);

impl Display for LastError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", Error::lowerize(self.0.to_string()))
    }
}

#[derive(Debug, PartialEq)]
pub enum Hint {
    None,
    AddCoresRoot,
    AdvertiseGenerator,
}

impl Display for Hint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let message = match self {
            Self::None => return Ok(()),
            Self::AddCoresRoot => "check that the core's directory is listed in \"cores-root\"",
            Self::AdvertiseGenerator => {
                "the core providing the generator must be a dependency of the requesting core"
            }
        };
        write!(
            f,
            "\n\n{}: {}",
            "hint".green(),
            Error::lowerize(message.to_string())
        )
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn lowerize_keeps_acronyms() {
        assert_eq!(Error::lowerize(String::from("Failed to open")), "failed to open");
        assert_eq!(Error::lowerize(String::from("IO error")), "IO error");
        assert_eq!(Error::lowerize(String::new()), "");
    }

    #[test]
    fn kinds() {
        assert_eq!(
            Error::DependencyNotFound(String::from("a:b:c:1.0"), Hint::None).kind(),
            ErrorKind::Dependency
        );
        assert_eq!(
            Error::GeneratorCopyToFile(String::from("a:b:c:1.0"), String::from("g"), String::from("f")).kind(),
            ErrorKind::Configuration
        );
        assert_eq!(
            Error::GeneratorExitCode(String::from("gen"), String::from("g"), 1).kind(),
            ErrorKind::GeneratorExecution
        );
    }

    #[test]
    fn hint_none_is_silent() {
        let e = Error::DependencyNotFound(String::from("a:b:c:1.0"), Hint::None);
        assert_eq!(e.to_string(), "no core satisfies \"a:b:c:1.0\"");
    }
}
