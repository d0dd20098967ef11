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
use crate::core::manifest::{Hooks, TargetDecl};
use serde_json::Value;
use std::collections::BTreeMap;

/// A named build configuration within a core.
#[derive(Debug, PartialEq, Clone)]
pub struct Target {
    name: String,
    filesets: Vec<Expr>,
    parameters: Vec<Expr>,
    toplevel: Option<String>,
    depend: Vec<Expr>,
    generate: Vec<Expr>,
    vpi: Vec<Expr>,
    default_tool: Option<String>,
    tools: BTreeMap<String, Value>,
    hooks: Hooks,
}

impl Target {
    pub fn from_decl(name: &str, decl: TargetDecl) -> Result<Self, ExprError> {
        Ok(Self {
            name: name.to_string(),
            filesets: expr::parse_list(&decl.filesets)?,
            parameters: expr::parse_list(&decl.parameters)?,
            toplevel: decl.toplevel,
            depend: expr::parse_list(&decl.depend)?,
            generate: expr::parse_list(&decl.generate)?,
            vpi: expr::parse_list(&decl.vpi)?,
            default_tool: decl.default_tool,
            tools: decl.tools,
            hooks: decl.hooks,
        })
    }

    pub fn get_name(&self) -> &str {
        &self.name
    }

    pub fn get_filesets(&self, flags: &Flags) -> Vec<String> {
        expr::evaluate(&self.filesets, flags)
    }

    /// Parameter entries of the form `NAME` or `NAME=value`.
    pub fn get_parameters(&self, flags: &Flags) -> Vec<(String, Option<String>)> {
        expr::evaluate(&self.parameters, flags)
            .into_iter()
            .map(|p| match p.split_once('=') {
                Some((k, v)) => (k.to_string(), Some(v.to_string())),
                None => (p, None),
            })
            .collect()
    }

    pub fn get_toplevel(&self) -> Option<&String> {
        self.toplevel.as_ref()
    }

    pub fn get_depend(&self, flags: &Flags) -> Vec<String> {
        expr::evaluate(&self.depend, flags)
    }

    pub fn all_depend(&self) -> Vec<String> {
        expr::flatten(&self.depend)
    }

    pub fn get_generate(&self, flags: &Flags) -> Vec<String> {
        expr::evaluate(&self.generate, flags)
    }

    pub fn get_vpi(&self, flags: &Flags) -> Vec<String> {
        expr::evaluate(&self.vpi, flags)
    }

    pub fn get_default_tool(&self) -> Option<&String> {
        self.default_tool.as_ref()
    }

    pub fn get_tool_options(&self, tool: &str) -> Option<&Value> {
        self.tools.get(tool)
    }

    pub fn get_hooks(&self) -> &Hooks {
        &self.hooks
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn parameter_overrides() {
        let decl = TargetDecl {
            parameters: vec![String::from("WIDTH"), String::from("is_toplevel? (DEPTH=16)")],
            ..Default::default()
        };
        let t = Target::from_decl("default", decl).unwrap();
        assert_eq!(t.get_parameters(&Flags::new()), vec![(String::from("WIDTH"), None)]);
        assert_eq!(
            t.get_parameters(&Flags::new().toplevel(true)),
            vec![
                (String::from("WIDTH"), None),
                (String::from("DEPTH"), Some(String::from("16")))
            ]
        );
    }

    #[test]
    fn bad_condition() {
        let decl = TargetDecl {
            filesets: vec![String::from("tool_x? (rtl")],
            ..Default::default()
        };
        assert_eq!(Target::from_decl("default", decl), Err(ExprError::Unclosed));
    }
}
