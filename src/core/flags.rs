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

use std::collections::BTreeMap;

pub const IS_TOPLEVEL: &str = "is_toplevel";
const TOOL_PREFIX: &str = "tool_";
const TARGET_PREFIX: &str = "target_";

/// The selection options threaded through every query against a core.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Flags {
    target: Option<String>,
    tool: Option<String>,
    is_toplevel: bool,
    options: BTreeMap<String, bool>,
}

impl Flags {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn target(mut self, name: &str) -> Self {
        self.target = Some(name.to_string());
        self
    }

    pub fn tool(mut self, name: &str) -> Self {
        self.tool = Some(name.to_string());
        self
    }

    pub fn toplevel(mut self, is_toplevel: bool) -> Self {
        self.is_toplevel = is_toplevel;
        self
    }

    /// Sets a user-defined boolean flag.
    pub fn set(mut self, flag: &str, value: bool) -> Self {
        self.options.insert(flag.to_string(), value);
        self
    }

    pub fn get_target(&self) -> Option<&String> {
        self.target.as_ref()
    }

    pub fn get_tool(&self) -> Option<&String> {
        self.tool.as_ref()
    }

    pub fn is_toplevel(&self) -> bool {
        self.is_toplevel
    }

    /// Checks if the condition named `flag` holds under these options.
    pub fn is_set(&self, flag: &str) -> bool {
        if flag == IS_TOPLEVEL {
            return self.is_toplevel;
        }
        if let Some(tool) = flag.strip_prefix(TOOL_PREFIX) {
            if self.tool.as_deref() == Some(tool) {
                return true;
            }
        }
        if let Some(target) = flag.strip_prefix(TARGET_PREFIX) {
            if self.target.as_deref() == Some(target) {
                return true;
            }
        }
        self.options.get(flag).copied().unwrap_or(false)
    }

    /// The target a core should use: only the toplevel honors the requested
    /// target; every other core falls back to `default`.
    pub fn target_for_core(&self) -> &str {
        match (self.is_toplevel, &self.target) {
            (true, Some(t)) => t.as_str(),
            _ => "default",
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn builtin_flags() {
        let f = Flags::new().target("sim").tool("icarus").toplevel(true);
        assert_eq!(f.is_set("is_toplevel"), true);
        assert_eq!(f.is_set("tool_icarus"), true);
        assert_eq!(f.is_set("tool_verilator"), false);
        assert_eq!(f.is_set("target_sim"), true);
        assert_eq!(f.is_set("target_synth"), false);
    }

    #[test]
    fn user_flags() {
        let f = Flags::new().set("use_fast_adder", true).set("debug", false);
        assert_eq!(f.is_set("use_fast_adder"), true);
        assert_eq!(f.is_set("debug"), false);
        assert_eq!(f.is_set("unknown"), false);
    }

    #[test]
    fn target_selection() {
        let f = Flags::new().target("sim");
        assert_eq!(f.target_for_core(), "default");
        assert_eq!(f.clone().toplevel(true).target_for_core(), "sim");
        assert_eq!(Flags::new().toplevel(true).target_for_core(), "default");
    }
}
