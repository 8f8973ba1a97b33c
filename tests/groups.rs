//
// Copyright (c) 2025-2026 Jeff Garzik
//
// This file is part of the ccgen project covered under
// the MIT License.  For the full license text, please see the LICENSE
// file in the root directory of this project.
// SPDX-License-Identifier: MIT
//

use std::collections::{BTreeMap, HashMap};

use ccgen::groups::{group_sources_by_units, CycleHandling, GroupId, SourceGroup};
use ccgen::parser::expr::Expr;
use ccgen::parser::{Include, SourceInfo};

fn inc(path: &str) -> Include {
    Include {
        path: path.to_string(),
        is_system: false,
        condition: None,
    }
}

fn sys(path: &str) -> Include {
    Include {
        path: path.to_string(),
        is_system: true,
        condition: None,
    }
}

fn guarded(path: &str, condition: Expr) -> Include {
    Include {
        path: path.to_string(),
        is_system: false,
        condition: Some(condition),
    }
}

fn src(includes: Vec<Include>) -> SourceInfo {
    SourceInfo {
        includes,
        has_main: false,
    }
}

fn sources(entries: Vec<(&str, SourceInfo)>) -> (Vec<String>, HashMap<String, SourceInfo>) {
    let files = entries.iter().map(|(name, _)| name.to_string()).collect();
    let infos = entries
        .into_iter()
        .map(|(name, info)| (name.to_string(), info))
        .collect();
    (files, infos)
}

fn group(sources: &[&str], depends_on: &[&str], sub_groups: &[&str]) -> SourceGroup {
    SourceGroup {
        sources: sources.iter().map(|s| s.to_string()).collect(),
        depends_on: depends_on.iter().map(|s| s.to_string()).collect(),
        sub_groups: sub_groups.iter().map(|s| s.to_string()).collect(),
    }
}

fn expect(entries: Vec<(&str, SourceGroup)>) -> BTreeMap<GroupId, SourceGroup> {
    entries
        .into_iter()
        .map(|(id, group)| (id.to_string(), group))
        .collect()
}

fn unit_groups(
    files: &[String],
    infos: &HashMap<String, SourceInfo>,
) -> BTreeMap<GroupId, SourceGroup> {
    group_sources_by_units(files, infos, CycleHandling::Merge)
}

#[test]
fn source_with_no_includes_forms_its_own_group() {
    let (files, infos) = sources(vec![("orphan.cc", src(vec![]))]);
    assert_eq!(
        unit_groups(&files, &infos),
        expect(vec![("orphan", group(&["orphan.cc"], &[], &[]))])
    );
}

#[test]
fn each_header_forms_its_own_group_even_when_including_another() {
    let (files, infos) = sources(vec![
        ("a.h", src(vec![])),
        ("b.h", src(vec![inc("a.h")])),
        ("c.h", src(vec![inc("b.h")])),
    ]);
    assert_eq!(
        unit_groups(&files, &infos),
        expect(vec![
            ("a", group(&["a.h"], &[], &[])),
            ("b", group(&["b.h"], &["a"], &[])),
            ("c", group(&["c.h"], &["b"], &[])),
        ])
    );
}

#[test]
fn source_is_grouped_with_header_even_when_not_included() {
    let (files, infos) = sources(vec![
        ("a.h", src(vec![])),
        ("a.c", src(vec![])),
        ("b.cc", src(vec![])),
        ("b.h", src(vec![])),
    ]);
    assert_eq!(
        unit_groups(&files, &infos),
        expect(vec![
            ("a", group(&["a.c", "a.h"], &[], &[])),
            ("b", group(&["b.cc", "b.h"], &[], &[])),
        ])
    );
}

#[test]
fn cyclic_dependency_sources_are_merged() {
    let (files, infos) = sources(vec![
        ("a.h", src(vec![inc("b.h")])),
        ("a.c", src(vec![inc("a.h")])),
        ("b.h", src(vec![inc("a.h")])),
        ("b.cc", src(vec![inc("b.h")])),
        ("c.h", src(vec![inc("a.h")])),
    ]);
    assert_eq!(
        unit_groups(&files, &infos),
        expect(vec![
            (
                "a",
                group(&["a.c", "a.h", "b.cc", "b.h"], &[], &["a", "b"]),
            ),
            ("c", group(&["c.h"], &["a"], &[])),
        ])
    );
}

#[test]
fn implementation_based_cycle_is_detected() {
    let (files, infos) = sources(vec![
        ("a.h", src(vec![])),
        ("a.c", src(vec![inc("b.h")])),
        ("b.h", src(vec![])),
        ("b.cc", src(vec![inc("a.h")])),
    ]);
    assert_eq!(
        unit_groups(&files, &infos),
        expect(vec![(
            "a",
            group(&["a.c", "a.h", "b.cc", "b.h"], &[], &["a", "b"]),
        )])
    );
}

#[test]
fn header_cycle_collapses_into_one_group() {
    let (files, infos) = sources(vec![
        ("p.h", src(vec![inc("q.h")])),
        ("q.h", src(vec![inc("r.h")])),
        ("r.h", src(vec![inc("p.h")])),
    ]);
    assert_eq!(
        unit_groups(&files, &infos),
        expect(vec![(
            "p",
            group(&["p.h", "q.h", "r.h"], &[], &["p", "q", "r"]),
        )])
    );
}

#[test]
fn source_including_unrelated_headers_keeps_its_own_group() {
    let (files, infos) = sources(vec![
        ("m.h", src(vec![])),
        ("n.h", src(vec![])),
        ("o.h", src(vec![])),
        (
            "file.cpp",
            src(vec![inc("m.h"), inc("n.h"), inc("o.h")]),
        ),
    ]);
    assert_eq!(
        unit_groups(&files, &infos),
        expect(vec![
            ("file", group(&["file.cpp"], &["m", "n", "o"], &[])),
            ("m", group(&["m.h"], &[], &[])),
            ("n", group(&["n.h"], &[], &[])),
            ("o", group(&["o.h"], &[], &[])),
        ])
    );
}

#[test]
fn mixed_dependencies_are_grouped_correctly() {
    let (files, infos) = sources(vec![
        ("a.h", src(vec![])),
        ("b.h", src(vec![inc("a.h")])),
        ("c.h", src(vec![])),
        ("d.h", src(vec![inc("c.h")])),
        ("e.h", src(vec![inc("d.h"), inc("f1.h"), inc("f2.h")])),
        ("f1.h", src(vec![inc("e.h")])),
        ("f2.h", src(vec![inc("e.h")])),
        ("g.h", src(vec![inc("b.h"), inc("d.h")])),
        ("h.h", src(vec![inc("g.h")])),
        ("i.h", src(vec![inc("g.h")])),
        ("j.h", src(vec![inc("h.h"), inc("i.h")])),
    ]);
    assert_eq!(
        unit_groups(&files, &infos),
        expect(vec![
            ("a", group(&["a.h"], &[], &[])),
            ("b", group(&["b.h"], &["a"], &[])),
            ("c", group(&["c.h"], &[], &[])),
            ("d", group(&["d.h"], &["c"], &[])),
            (
                "e",
                group(&["e.h", "f1.h", "f2.h"], &["d"], &["e", "f1", "f2"]),
            ),
            ("g", group(&["g.h"], &["b", "d"], &[])),
            ("h", group(&["h.h"], &["g"], &[])),
            ("i", group(&["i.h"], &["g"], &[])),
            ("j", group(&["j.h"], &["h", "i"], &[])),
        ])
    );
}

#[test]
fn system_includes_do_not_create_edges() {
    let (files, infos) = sources(vec![
        ("lib.h", src(vec![sys("system.h")])),
        ("lib.cc", src(vec![inc("lib.h")])),
        ("app.cpp", src(vec![sys("system.h")])),
    ]);
    assert_eq!(
        unit_groups(&files, &infos),
        expect(vec![
            ("app", group(&["app.cpp"], &[], &[])),
            ("lib", group(&["lib.cc", "lib.h"], &[], &[])),
        ])
    );
}

#[test]
fn guarded_includes_do_not_create_edges() {
    let (files, infos) = sources(vec![
        ("a.cc", src(vec![guarded("b.h", Expr::defined("_WIN32"))])),
        ("a.h", src(vec![])),
        ("b.h", src(vec![])),
    ]);
    assert_eq!(
        unit_groups(&files, &infos),
        expect(vec![
            ("a", group(&["a.cc", "a.h"], &[], &[])),
            ("b", group(&["b.h"], &[], &[])),
        ])
    );
}

#[test]
fn unresolved_includes_are_skipped() {
    let (files, infos) = sources(vec![("a.cc", src(vec![inc("vendored/elsewhere.h")]))]);
    assert_eq!(
        unit_groups(&files, &infos),
        expect(vec![("a", group(&["a.cc"], &[], &[]))])
    );
}

#[test]
fn implementations_crossing_headers_merge_groups() {
    let (files, infos) = sources(vec![
        ("a.h", src(vec![])),
        ("b.h", src(vec![])),
        ("a.cc", src(vec![inc("b.h")])),
        ("b.cc", src(vec![inc("a.h")])),
    ]);
    assert_eq!(
        unit_groups(&files, &infos),
        expect(vec![(
            "a",
            group(&["a.cc", "a.h", "b.cc", "b.h"], &[], &["a", "b"]),
        )])
    );
}

#[test]
fn one_directional_implementation_include_stays_a_dependency() {
    let (files, infos) = sources(vec![
        ("a.h", src(vec![])),
        ("a.cc", src(vec![])),
        ("b.h", src(vec![])),
        ("b.cc", src(vec![inc("a.h")])),
    ]);
    assert_eq!(
        unit_groups(&files, &infos),
        expect(vec![
            ("a", group(&["a.cc", "a.h"], &[], &[])),
            ("b", group(&["b.cc", "b.h"], &["a"], &[])),
        ])
    );
}

#[test]
fn warn_mode_keeps_cyclic_groups_but_elides_their_edges() {
    let (files, infos) = sources(vec![
        ("a.h", src(vec![])),
        ("b.h", src(vec![])),
        ("a.cc", src(vec![inc("b.h")])),
        ("b.cc", src(vec![inc("a.h")])),
        ("c.h", src(vec![inc("a.h")])),
    ]);
    let groups = group_sources_by_units(&files, &infos, CycleHandling::Warn);
    assert_eq!(
        groups,
        expect(vec![
            ("a", group(&["a.cc", "a.h"], &[], &[])),
            ("b", group(&["b.cc", "b.h"], &[], &[])),
            ("c", group(&["c.h"], &["a"], &[])),
        ])
    );
}

#[test]
fn output_is_independent_of_input_order() {
    let entries = vec![
        ("a.h", src(vec![inc("b.h")])),
        ("a.c", src(vec![inc("a.h")])),
        ("b.h", src(vec![inc("a.h")])),
        ("b.cc", src(vec![inc("b.h")])),
        ("c.h", src(vec![inc("a.h")])),
        ("d.cc", src(vec![inc("c.h"), sys("vector")])),
    ];
    let (files, infos) = sources(entries);
    let reference = unit_groups(&files, &infos);

    let mut reversed = files.clone();
    reversed.reverse();
    assert_eq!(unit_groups(&reversed, &infos), reference);

    let mut rotated = files.clone();
    rotated.rotate_left(3);
    assert_eq!(unit_groups(&rotated, &infos), reference);
}

#[test]
fn output_invariants_hold() {
    let entries = vec![
        ("a.h", src(vec![inc("b.h")])),
        ("a.c", src(vec![inc("a.h")])),
        ("b.h", src(vec![inc("a.h")])),
        ("b.cc", src(vec![inc("b.h")])),
        ("c.h", src(vec![inc("a.h"), inc("d.h")])),
        ("d.h", src(vec![])),
        ("e.cpp", src(vec![inc("c.h"), inc("missing.h")])),
    ];
    let (files, infos) = sources(entries);

    for mode in [CycleHandling::Merge, CycleHandling::Warn] {
        let groups = group_sources_by_units(&files, &infos, mode);

        // every input file appears in exactly one group
        let mut seen: Vec<&String> = Vec::new();
        for group in groups.values() {
            seen.extend(group.sources.iter());
        }
        let mut sorted_input = files.clone();
        sorted_input.sort();
        let mut seen_sorted: Vec<String> = seen.iter().map(|s| (*s).clone()).collect();
        seen_sorted.sort();
        assert_eq!(seen_sorted, sorted_input);

        for (id, group) in &groups {
            // no self-dependency, sorted, deduplicated, all targets exist
            assert!(!group.depends_on.contains(id), "{id}");
            assert!(group.depends_on.windows(2).all(|w| w[0] < w[1]), "{id}");
            for target in &group.depends_on {
                assert!(groups.contains_key(target), "{id} -> {target}");
            }
            assert!(group.sources.windows(2).all(|w| w[0] < w[1]), "{id}");
        }

        // the dependency graph is acyclic: repeatedly remove leaves
        let mut remaining: BTreeMap<&String, Vec<&String>> = groups
            .iter()
            .map(|(id, group)| (id, group.depends_on.iter().collect()))
            .collect();
        while !remaining.is_empty() {
            let leaves: Vec<&String> = remaining
                .iter()
                .filter(|(_, deps)| {
                    deps.iter().all(|dep| !remaining.contains_key(*dep))
                })
                .map(|(id, _)| *id)
                .collect();
            assert!(!leaves.is_empty(), "dependency cycle in output ({mode:?})");
            for leaf in leaves {
                remaining.remove(leaf);
            }
        }
    }
}
