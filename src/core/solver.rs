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

//! Backtracking version selection.
//!
//! Every family is assigned at most one concrete core. Candidates are tried
//! from the highest version downward, and a conflict unwinds to the most
//! recent choice that still has alternatives.

use crate::core::flags::Flags;
use crate::core::package::Package;
use crate::core::vlnv::{self, Vlnv};
use crate::error::{Error, Hint};
use crate::util::graph::Graph;
use log::debug;
use std::collections::BTreeMap;
use std::fmt::Display;
use std::rc::Rc;

/// A concrete core along with the constraints it declares under the
/// current flags.
struct Candidate {
    package: Rc<dyn Package>,
    depends: Vec<Vlnv>,
}

impl Display for Candidate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let id = self.package.get_vlnv();
        write!(
            f,
            "{} {}-{}; depends ({})",
            id.family(),
            id.get_version(),
            id.get_revision(),
            self.depends
                .iter()
                .map(|d| d.to_string())
                .collect::<Vec<String>>()
                .join(", ")
        )
    }
}

/// A constraint waiting to be satisfied and the candidate that declared it.
#[derive(Clone)]
struct Requirement {
    constraint: Vlnv,
    by: Option<usize>,
}

struct Solver<'a> {
    candidates: Vec<Candidate>,
    /// Candidate indices per family, highest version first.
    families: BTreeMap<String, Vec<usize>>,
    root: &'a Vlnv,
    /// Deepest failure seen so far: (requirement position, reason).
    failure: Option<(usize, String)>,
}

impl<'a> Solver<'a> {
    fn new(pool: &[Rc<dyn Package>], root: &'a Vlnv, toplevel: &Vlnv, flags: &Flags, only_matching: bool) -> Result<Self, Error> {
        let mut candidates = Vec::new();
        for pkg in pool {
            if only_matching == true && pkg.get_vlnv().is_same_family(root) == false {
                continue;
            }
            let is_top = pkg.get_vlnv().is_same_family(toplevel);
            let depends = match only_matching {
                true => Vec::new(),
                false => pkg.get_depends(&flags.clone().toplevel(is_top))?,
            };
            let c = Candidate {
                package: pkg.clone(),
                depends: depends,
            };
            debug!("solver candidate: {}", c);
            candidates.push(c);
        }

        let mut families: BTreeMap<String, Vec<usize>> = BTreeMap::new();
        for (i, c) in candidates.iter().enumerate() {
            families.entry(c.package.get_vlnv().family()).or_default().push(i);
        }
        for list in families.values_mut() {
            list.sort_by(|a, b| {
                let (x, y) = (candidates[*a].package.get_vlnv(), candidates[*b].package.get_vlnv());
                y.get_version()
                    .cmp(x.get_version())
                    .then(y.get_revision().cmp(&x.get_revision()))
            });
        }
        Ok(Self {
            candidates: candidates,
            families: families,
            root: root,
            failure: None,
        })
    }

    fn name(&self, i: usize) -> String {
        self.candidates[i].package.get_vlnv().canonical()
    }

    fn record(&mut self, pos: usize, reason: String) {
        let is_deeper = match &self.failure {
            Some((p, _)) => pos > *p,
            None => true,
        };
        if is_deeper == true {
            self.failure = Some((pos, reason));
        }
    }

    /// Attempts to satisfy `reqs[pos..]`, extending `reqs` with the
    /// dependencies of every newly selected candidate.
    fn search(&mut self, selected: &mut BTreeMap<String, usize>, order: &mut Vec<usize>, reqs: &mut Vec<Requirement>, pos: usize) -> bool {
        let req = match reqs.get(pos) {
            Some(r) => r.clone(),
            None => return true,
        };
        let family = req.constraint.family();
        let requirer = match req.by {
            Some(i) => self.name(i),
            None => String::from("the build request"),
        };

        if let Some(&chosen) = selected.get(&family) {
            if vlnv::matches(self.candidates[chosen].package.get_vlnv(), &req.constraint) == true {
                return self.search(selected, order, reqs, pos + 1);
            }
            self.record(
                pos,
                format!(
                    "{} requires {}, which conflicts with the selected {}",
                    requirer,
                    req.constraint,
                    self.name(chosen)
                ),
            );
            return false;
        }

        let options: Vec<usize> = self
            .families
            .get(&family)
            .map(|l| {
                l.iter()
                    .copied()
                    .filter(|i| vlnv::matches(self.candidates[*i].package.get_vlnv(), &req.constraint))
                    .collect()
            })
            .unwrap_or_default();

        if options.is_empty() == true {
            let available: Vec<String> = self
                .families
                .get(&family)
                .map(|l| l.iter().map(|i| self.name(*i)).collect())
                .unwrap_or_default();
            let reason = match available.is_empty() {
                true => format!("{} requires {}, but no version of {} is available", requirer, req.constraint, family),
                false => format!(
                    "{} requires {}, but only {} are available",
                    requirer,
                    req.constraint,
                    available.join(", ")
                ),
            };
            self.record(pos, reason);
            return false;
        }

        for choice in options {
            let mark = reqs.len();
            selected.insert(family.clone(), choice);
            order.push(choice);
            for d in &self.candidates[choice].depends {
                reqs.push(Requirement {
                    constraint: d.clone(),
                    by: Some(choice),
                });
            }
            if self.search(selected, order, reqs, pos + 1) == true {
                return true;
            }
            // undo this choice and try the next lower version
            reqs.truncate(mark);
            order.pop();
            selected.remove(&family);
        }
        false
    }

    /// Selects the concrete core named by each of `pinned` up front, so later
    /// requirements must agree with it.
    fn pin(&self, pinned: &[Vlnv]) -> BTreeMap<String, usize> {
        let mut selected = BTreeMap::new();
        for p in pinned {
            let found = self
                .families
                .get(&p.family())
                .and_then(|l| l.iter().find(|i| self.name(**i) == p.canonical()));
            if let Some(&i) = found {
                selected.insert(p.family(), i);
            }
        }
        selected
    }

    fn run(mut self, pinned: &[Vlnv]) -> Result<Vec<Rc<dyn Package>>, Error> {
        let has_root = self
            .families
            .get(&self.root.family())
            .map(|l| {
                l.iter()
                    .any(|i| vlnv::matches(self.candidates[*i].package.get_vlnv(), self.root))
            })
            .unwrap_or(false);
        if has_root == false {
            return Err(Error::DependencyNotFound(self.root.to_string(), Hint::AddCoresRoot));
        }

        let mut selected = self.pin(pinned);
        let mut order = Vec::new();
        let mut reqs = vec![Requirement {
            constraint: self.root.clone(),
            by: None,
        }];
        if self.search(&mut selected, &mut order, &mut reqs, 0) == false {
            let reason = self.failure.take().map(|(_, r)| r).unwrap_or_default();
            return Err(Error::UnsatisfiableDependency(self.root.to_string(), reason));
        }

        // dependencies come before the cores that require them
        let mut graph = Graph::new();
        let mut index_of = BTreeMap::new();
        for &c in &order {
            index_of.insert(c, graph.add_node(c));
        }
        for &c in &order {
            for d in &self.candidates[c].depends {
                // pinned cores are not part of the result
                if let Some(dep) = selected.get(&d.family()).and_then(|s| index_of.get(s)) {
                    graph.add_edge(*dep, index_of[&c]);
                }
            }
        }
        let root = match order.first() {
            Some(&r) => r,
            None => return Ok(Vec::new()),
        };
        let mut sorted: Vec<usize> = graph
            .topological_sort()
            .into_iter()
            .filter_map(|n| graph.get_node(n).copied())
            .filter(|c| *c != root)
            .collect();
        sorted.push(root);

        Ok(sorted
            .into_iter()
            .map(|c| self.candidates[c].package.clone())
            .collect())
    }
}

/// Resolves `root` against `pool` into a conflict-free list of cores.
///
/// The list is ordered so dependencies precede their dependents, and the core
/// satisfying `root` is last. With `only_matching` set, dependencies are not
/// considered and the single highest match for `root` is returned.
pub fn solve(pool: &[Rc<dyn Package>], root: &Vlnv, flags: &Flags, only_matching: bool) -> Result<Vec<Rc<dyn Package>>, Error> {
    Solver::new(pool, root, root, flags, only_matching)?.run(&[])
}

/// Resolves `root` into a build whose other choices are already fixed.
///
/// Every core in `pinned` stays selected for its family; a requirement that
/// disagrees with one is unsatisfiable. Only the family of `toplevel` reads
/// its dependencies as toplevel. Pinned cores are left out of the result.
pub fn solve_within(
    pool: &[Rc<dyn Package>],
    root: &Vlnv,
    toplevel: &Vlnv,
    pinned: &[Vlnv],
    flags: &Flags,
) -> Result<Vec<Rc<dyn Package>>, Error> {
    Solver::new(pool, root, toplevel, flags, false)?.run(pinned)
}
