//
// Copyright (c) 2025-2026 Jeff Garzik
//
// This file is part of the ccgen project covered under
// the MIT License.  For the full license text, please see the LICENSE
// file in the root directory of this project.
// SPDX-License-Identifier: MIT
//
// Source grouping engine
//
// Clusters translation units into compile groups: files sharing a
// base name form an initial group, unconditional includes between
// known files form edges, and strongly-connected components of the
// resulting graph (header/implementation cycles) are collapsed into a
// single group, leaving an acyclic dependency graph between groups.
//

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::path::Path;

use gettextrs::gettext;

use crate::parser::SourceInfo;

pub type SourceFile = String;

/// Conventionally the base name of a representative source file.
pub type GroupId = String;

/// A set of sources compiled together, with its dependencies on other
/// groups.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SourceGroup {
    /// Member files, sorted.
    pub sources: Vec<SourceFile>,
    /// Ids of groups this group depends on, sorted and deduplicated;
    /// never contains the group's own id.
    pub depends_on: Vec<GroupId>,
    /// When the group was merged from a dependency cycle, the original
    /// member group ids; empty otherwise.
    pub sub_groups: Vec<GroupId>,
}

/// What to do with groups that form a dependency cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CycleHandling {
    /// Merge all groups of the cycle into a single one.
    #[default]
    Merge,
    /// Keep the groups and warn; the cyclic edges are still dropped so
    /// the output graph stays acyclic.
    Warn,
}

/// Groups `files` by translation unit, using the includes recorded in
/// `infos`. Only unconditional includes of known files create edges;
/// system includes and includes guarded by an `#if` are resolved
/// elsewhere. The result maps each group id to its group; every input
/// file lands in exactly one group.
pub fn group_sources_by_units(
    files: &[SourceFile],
    infos: &HashMap<SourceFile, SourceInfo>,
    cycle_handling: CycleHandling,
) -> BTreeMap<GroupId, SourceGroup> {
    // Initial grouping: files sharing a base name belong together,
    // e.g. `a.h` and `a.cc`, whether or not one includes the other.
    let mut members: BTreeMap<GroupId, BTreeSet<SourceFile>> = BTreeMap::new();
    let mut group_of_file: HashMap<&str, GroupId> = HashMap::new();
    for file in files {
        let id = base_name(file);
        members.entry(id.clone()).or_default().insert(file.clone());
        group_of_file.insert(file_name(file), id);
    }

    // Dependency edges from unconditional includes of known files.
    let mut edges: BTreeMap<GroupId, BTreeSet<GroupId>> = BTreeMap::new();
    for file in files {
        let Some(info) = infos.get(file) else {
            continue;
        };
        let from = &group_of_file[file_name(file)];
        for include in &info.includes {
            if include.is_system || include.condition.is_some() {
                continue;
            }
            let Some(to) = group_of_file.get(file_name(&include.path)) else {
                continue; // unresolved include, not our dependency
            };
            if to != from {
                edges.entry(from.clone()).or_default().insert(to.clone());
            }
        }
    }

    let ids: Vec<&GroupId> = members.keys().collect();
    let index_of: HashMap<&GroupId, usize> = ids.iter().enumerate().map(|(i, id)| (*id, i)).collect();
    let adjacency: Vec<Vec<usize>> = ids
        .iter()
        .map(|id| match edges.get(*id) {
            Some(targets) => targets.iter().map(|t| index_of[t]).collect(),
            None => Vec::new(),
        })
        .collect();

    let sccs = strongly_connected_components(&adjacency);

    // Per node: which component it belongs to, and (in merge mode) the
    // id its group collapses into.
    let mut component_of = vec![0usize; ids.len()];
    let mut merged_into: HashMap<&GroupId, &GroupId> = HashMap::new();
    let mut merged_members: BTreeMap<&GroupId, Vec<&GroupId>> = BTreeMap::new();
    for (component, scc) in sccs.iter().enumerate() {
        for &node in scc {
            component_of[node] = component;
        }
        if scc.len() < 2 {
            continue;
        }
        let mut cycle: Vec<&GroupId> = scc.iter().map(|&node| ids[node]).collect();
        cycle.sort();
        match cycle_handling {
            CycleHandling::Merge => {
                let merged_id = cycle[0];
                for &id in &cycle {
                    merged_into.insert(id, merged_id);
                }
                merged_members.insert(merged_id, cycle);
            }
            CycleHandling::Warn => {
                let names: Vec<&str> = cycle.iter().map(|id| id.as_str()).collect();
                eprintln!(
                    "{}: {}",
                    gettext("warning: cyclic dependency between source groups"),
                    names.join(", ")
                );
            }
        }
    }

    let mut groups: BTreeMap<GroupId, SourceGroup> = BTreeMap::new();
    for (id, sources) in &members {
        let target = merged_into.get(id).copied().unwrap_or(id);
        let group = groups.entry(target.clone()).or_default();
        group.sources.extend(sources.iter().cloned());
    }
    for (merged_id, cycle) in &merged_members {
        let group = groups.get_mut(*merged_id).unwrap();
        group.sub_groups = cycle.iter().map(|id| (*id).clone()).collect();
    }

    let mut depends_on: BTreeMap<GroupId, BTreeSet<GroupId>> = BTreeMap::new();
    for (from, targets) in &edges {
        for to in targets {
            // Edges inside a cycle are elided: either both endpoints
            // collapsed into one group, or (warn mode) dropping them
            // keeps the output acyclic.
            if component_of[index_of[from]] == component_of[index_of[to]] {
                continue;
            }
            let from = merged_into.get(from).copied().unwrap_or(from);
            let to = merged_into.get(to).copied().unwrap_or(to);
            depends_on
                .entry(from.clone())
                .or_default()
                .insert(to.clone());
        }
    }
    for (id, targets) in depends_on {
        groups.get_mut(&id).unwrap().depends_on = targets.into_iter().collect();
    }

    for group in groups.values_mut() {
        group.sources.sort();
    }
    groups
}

/// Group id for a file: its final path component with the extension
/// stripped.
fn base_name(file: &str) -> GroupId {
    let path = Path::new(file);
    path.file_stem()
        .or_else(|| path.file_name())
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| file.to_string())
}

/// Final path component, used to match include paths against known
/// files.
fn file_name(file: &str) -> &str {
    file.rsplit('/').next().unwrap_or(file)
}

/// Tarjan's algorithm. Returns the strongly-connected components of
/// the graph given as adjacency lists; every node appears in exactly
/// one component.
fn strongly_connected_components(adjacency: &[Vec<usize>]) -> Vec<Vec<usize>> {
    struct State<'a> {
        adjacency: &'a [Vec<usize>],
        index: Vec<Option<usize>>,
        lowlink: Vec<usize>,
        on_stack: Vec<bool>,
        stack: Vec<usize>,
        next_index: usize,
        components: Vec<Vec<usize>>,
    }

    fn connect(state: &mut State<'_>, v: usize) {
        state.index[v] = Some(state.next_index);
        state.lowlink[v] = state.next_index;
        state.next_index += 1;
        state.stack.push(v);
        state.on_stack[v] = true;

        for i in 0..state.adjacency[v].len() {
            let w = state.adjacency[v][i];
            if state.index[w].is_none() {
                connect(state, w);
                state.lowlink[v] = state.lowlink[v].min(state.lowlink[w]);
            } else if state.on_stack[w] {
                state.lowlink[v] = state.lowlink[v].min(state.index[w].unwrap());
            }
        }

        if state.lowlink[v] == state.index[v].unwrap() {
            let mut component = Vec::new();
            loop {
                let w = state.stack.pop().unwrap();
                state.on_stack[w] = false;
                component.push(w);
                if w == v {
                    break;
                }
            }
            state.components.push(component);
        }
    }

    let n = adjacency.len();
    let mut state = State {
        adjacency,
        index: vec![None; n],
        lowlink: vec![0; n],
        on_stack: vec![false; n],
        stack: Vec::new(),
        next_index: 0,
        components: Vec::new(),
    };
    for v in 0..n {
        if state.index[v].is_none() {
            connect(&mut state, v);
        }
    }
    state.components
}

#[cfg(test)]
mod tests {
    use super::*;

    fn normalized(mut components: Vec<Vec<usize>>) -> Vec<Vec<usize>> {
        for component in &mut components {
            component.sort();
        }
        components.sort();
        components
    }

    #[test]
    fn scc_singletons() {
        // 0 -> 1 -> 2, no cycles
        let adjacency = vec![vec![1], vec![2], vec![]];
        assert_eq!(
            normalized(strongly_connected_components(&adjacency)),
            vec![vec![0], vec![1], vec![2]]
        );
    }

    #[test]
    fn scc_cycle_and_tail() {
        // 0 <-> 1, both -> 2
        let adjacency = vec![vec![1, 2], vec![0, 2], vec![]];
        assert_eq!(
            normalized(strongly_connected_components(&adjacency)),
            vec![vec![0, 1], vec![2]]
        );
    }

    #[test]
    fn scc_self_loop_is_singleton() {
        let adjacency = vec![vec![0], vec![]];
        assert_eq!(
            normalized(strongly_connected_components(&adjacency)),
            vec![vec![0], vec![1]]
        );
    }

    #[test]
    fn base_names() {
        assert_eq!(base_name("a.h"), "a");
        assert_eq!(base_name("a.c"), "a");
        assert_eq!(base_name("dir/b.cc"), "b");
        assert_eq!(base_name("noext"), "noext");
    }
}
