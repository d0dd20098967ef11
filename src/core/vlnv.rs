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

//! A core is identified by its vendor, library, name, and version (VLNV).
//!
//! The same type doubles as a constraint when it carries a [Relation] other
//! than `==`.

use crate::core::version::{Version, VersionError};
use serde::de::{self};
use serde::{Deserialize, Serialize, Serializer};
use std::cmp::Ordering;
use std::fmt::{self, Display};
use std::str::FromStr;

#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash, PartialOrd, Ord)]
pub enum Relation {
    Eq,
    Ne,
    Ge,
    Le,
    Gt,
    Lt,
    Compatible,
    /// Any version of the family, written by leaving the version out.
    Any,
}

impl Relation {
    /// Relations in the order they must be tried when parsing a prefix.
    const PREFIXES: [(&'static str, Relation); 7] = [
        ("==", Relation::Eq),
        ("!=", Relation::Ne),
        (">=", Relation::Ge),
        ("<=", Relation::Le),
        (">", Relation::Gt),
        ("<", Relation::Lt),
        ("^", Relation::Compatible),
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Eq => "==",
            Self::Ne => "!=",
            Self::Ge => ">=",
            Self::Le => "<=",
            Self::Gt => ">",
            Self::Lt => "<",
            Self::Compatible => "^",
            Self::Any => "",
        }
    }
}

impl Display for Relation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Vlnv {
    vendor: String,
    library: String,
    name: String,
    version: Version,
    revision: u32,
    relation: Relation,
}

/// Checks if the concrete `candidate` satisfies `constraint`.
///
/// Candidates from a different family never match.
pub fn matches(candidate: &Vlnv, constraint: &Vlnv) -> bool {
    if candidate.is_same_family(constraint) == false {
        return false;
    }
    let order = candidate
        .version
        .cmp(&constraint.version)
        .then(candidate.revision.cmp(&constraint.revision));
    match constraint.relation {
        Relation::Eq => order == Ordering::Equal,
        Relation::Ne => order != Ordering::Equal,
        Relation::Ge => order != Ordering::Less,
        Relation::Le => order != Ordering::Greater,
        Relation::Gt => order == Ordering::Greater,
        Relation::Lt => order == Ordering::Less,
        Relation::Compatible => {
            order != Ordering::Less && constraint.version.is_caret_compatible(&candidate.version)
        }
        Relation::Any => true,
    }
}

impl Vlnv {
    /// Creates a concrete identifier at version `0`.
    pub fn new(vendor: &str, library: &str, name: &str) -> Self {
        Self {
            vendor: vendor.to_string(),
            library: library.to_string(),
            name: name.to_string(),
            version: Version::new(),
            revision: 0,
            relation: Relation::Eq,
        }
    }

    pub fn version(mut self, v: Version) -> Self {
        self.version = v;
        self
    }

    pub fn revision(mut self, r: u32) -> Self {
        self.revision = r;
        self
    }

    pub fn relation(mut self, r: Relation) -> Self {
        self.relation = r;
        self
    }

    pub fn get_vendor(&self) -> &str {
        &self.vendor
    }

    pub fn get_library(&self) -> &str {
        &self.library
    }

    pub fn get_name(&self) -> &str {
        &self.name
    }

    pub fn get_version(&self) -> &Version {
        &self.version
    }

    pub fn get_revision(&self) -> u32 {
        self.revision
    }

    pub fn get_relation(&self) -> Relation {
        self.relation
    }

    /// Checks if `self` and `other` share vendor, library, and name.
    pub fn is_same_family(&self, other: &Vlnv) -> bool {
        self.vendor == other.vendor && self.library == other.library && self.name == other.name
    }

    /// Returns `vendor:library:name`.
    pub fn family(&self) -> String {
        format!("{}:{}:{}", self.vendor, self.library, self.name)
    }

    /// Returns `vendor:library:name:version`, with `-r<revision>` appended
    /// for non-default revisions.
    pub fn canonical(&self) -> String {
        match self.revision {
            0 => format!("{}:{}", self.family(), self.version),
            r => format!("{}:{}-r{}", self.family(), self.version, r),
        }
    }

    /// Returns the canonical string with every non-alphanumeric character
    /// replaced by `_` and leading underscores removed.
    pub fn sanitized_name(&self) -> String {
        let s: String = self
            .canonical()
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
            .collect();
        s.trim_start_matches('_').to_string()
    }

    /// Strips the relation, leaving the concrete identity.
    pub fn as_concrete(&self) -> Self {
        self.clone().relation(Relation::Eq)
    }

    /// Creates the identity of a core produced by one of `self`'s generators.
    pub fn derive(&self, suffix: &str) -> Self {
        Self {
            vendor: self.vendor.clone(),
            library: self.library.clone(),
            name: format!("{}-{}", self.name, suffix),
            version: self.version.clone(),
            revision: 0,
            relation: Relation::Eq,
        }
    }
}

impl FromStr for Vlnv {
    type Err = VlnvError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let (relation, body) = match Relation::PREFIXES
            .iter()
            .find(|(p, _)| s.starts_with(p))
        {
            Some((p, r)) => (Some(*r), &s[p.len()..]),
            None => (None, s),
        };
        if body.chars().any(|c| c.is_whitespace()) == true {
            return Err(VlnvError::Whitespace);
        }
        let parts: Vec<&str> = body.split(':').collect();
        if parts.len() < 3 || parts.len() > 4 {
            return Err(VlnvError::WrongPartCount(parts.len()));
        }
        if parts[2].is_empty() == true {
            return Err(VlnvError::MissingName);
        }
        let mut vlnv = Vlnv::new(parts[0], parts[1], parts[2]);
        match parts.get(3).filter(|v| v.is_empty() == false) {
            Some(ver) => {
                let ver = match ver.rsplit_once("-r") {
                    Some((head, rev)) if rev.is_empty() == false && rev.chars().all(|c| c.is_ascii_digit()) => {
                        vlnv.revision = rev.parse::<u32>().map_err(|_| VlnvError::InvalidRevision)?;
                        head
                    }
                    _ => ver,
                };
                vlnv.version = Version::from_str(ver)?;
                vlnv.relation = relation.unwrap_or(Relation::Eq);
            }
            None => {
                if relation.is_some() {
                    return Err(VlnvError::RelationWithoutVersion);
                }
                vlnv.relation = Relation::Any;
            }
        }
        Ok(vlnv)
    }
}

impl Display for Vlnv {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.relation {
            Relation::Eq => write!(f, "{}", self.canonical()),
            Relation::Any => write!(f, "{}", self.family()),
            r => write!(f, "{}{}", r, self.canonical()),
        }
    }
}

impl<'de> Deserialize<'de> for Vlnv {
    fn deserialize<D>(deserializer: D) -> Result<Vlnv, D::Error>
    where
        D: de::Deserializer<'de>,
    {
        struct LayerVisitor;

        impl<'de> de::Visitor<'de> for LayerVisitor {
            type Value = Vlnv;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("a core identifier of the form vendor:library:name:version")
            }

            fn visit_str<E>(self, v: &str) -> Result<Self::Value, E>
            where
                E: de::Error,
            {
                Vlnv::from_str(v).map_err(de::Error::custom)
            }
        }

        deserializer.deserialize_str(LayerVisitor)
    }
}

impl Serialize for Vlnv {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

#[derive(Debug, PartialEq)]
pub enum VlnvError {
    WrongPartCount(usize),
    MissingName,
    Whitespace,
    InvalidRevision,
    RelationWithoutVersion,
    BadVersion(VersionError),
}

impl std::error::Error for VlnvError {}

impl Display for VlnvError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::WrongPartCount(n) => write!(f, "expected 3 or 4 ':'-separated parts but found {}", n),
            Self::MissingName => write!(f, "missing name"),
            Self::Whitespace => write!(f, "identifier cannot contain whitespace"),
            Self::InvalidRevision => write!(f, "invalid revision number"),
            Self::RelationWithoutVersion => write!(f, "a relation requires a version"),
            Self::BadVersion(e) => write!(f, "{}", e),
        }
    }
}

impl From<VersionError> for VlnvError {
    fn from(value: VersionError) -> Self {
        Self::BadVersion(value)
    }
}
