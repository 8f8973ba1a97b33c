//
// Copyright (c) 2025-2026 Jeff Garzik
//
// This file is part of the ccgen project covered under
// the MIT License.  For the full license text, please see the LICENSE
// file in the root directory of this project.
// SPDX-License-Identifier: MIT
//
// ccgen - infer build rules for C/C++ sources
//

use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;
use std::process;

use clap::Parser;
use gettextrs::{bind_textdomain_codeset, gettext, setlocale, textdomain, LocaleCategory};

use ccgen::groups::{group_sources_by_units, CycleHandling, GroupId, SourceGroup};
use ccgen::parser::{parse_macros, parse_source_file, SourceInfo};
use ccgen::platform::{enabled_platform_macros, known_platforms, Platform, PlatformMacros};
use ccgen::solver::platforms_for_expr;
use ccgen::PROJECT_NAME;

#[derive(Parser)]
#[command(version, about = gettext("ccgen - infer build rules for C/C++ sources"))]
struct Args {
    /// Define a macro (-D NAME or -D NAME=value)
    #[arg(short = 'D', action = clap::ArgAction::Append, value_name = "macro")]
    defines: Vec<String>,

    /// Restrict the enabled platforms (repeatable)
    #[arg(
        long = "platform",
        action = clap::ArgAction::Append,
        value_name = "os/arch"
    )]
    platforms: Vec<String>,

    /// How to handle cyclic dependencies between source groups
    #[arg(long = "cycles", value_enum, default_value_t = CycleMode::Merge)]
    cycles: CycleMode,

    /// Source files to analyze
    #[arg(required = true)]
    files: Vec<PathBuf>,
}

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
enum CycleMode {
    Merge,
    Warn,
}

impl std::fmt::Display for CycleMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CycleMode::Merge => f.write_str("merge"),
            CycleMode::Warn => f.write_str("warn"),
        }
    }
}

impl From<CycleMode> for CycleHandling {
    fn from(mode: CycleMode) -> Self {
        match mode {
            CycleMode::Merge => CycleHandling::Merge,
            CycleMode::Warn => CycleHandling::Warn,
        }
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    setlocale(LocaleCategory::LcAll, "");
    textdomain(PROJECT_NAME)?;
    bind_textdomain_codeset(PROJECT_NAME, "UTF-8")?;

    let args = Args::parse();

    let user_macros = parse_macros(&args.defines).unwrap_or_else(|err| {
        eprintln!("ccgen: {err}");
        process::exit(1);
    });

    let platforms = if args.platforms.is_empty() {
        known_platforms()
    } else {
        parse_platforms(&args.platforms).unwrap_or_else(|err| {
            eprintln!("ccgen: {err}");
            process::exit(1);
        })
    };
    let platform_macros = enabled_platform_macros(&platforms, &user_macros);

    let mut status_code = 0;
    let mut files: Vec<String> = Vec::new();
    let mut infos: HashMap<String, SourceInfo> = HashMap::new();
    for path in &args.files {
        let file = path.to_string_lossy().into_owned();
        let info = match parse_source_file(path) {
            Ok(info) => info,
            Err(err) => {
                // I/O failure aborts this file only
                eprintln!("ccgen: {file}: {err}");
                status_code = 1;
                continue;
            }
        };
        print_file_report(&file, &info, &platform_macros);
        files.push(file.clone());
        infos.insert(file, info);
    }

    let groups = group_sources_by_units(&files, &infos, args.cycles.into());
    print_groups(&groups);

    process::exit(status_code);
}

fn parse_platforms(values: &[String]) -> Result<Vec<Platform>, ccgen::platform::PlatformError> {
    values.iter().map(|value| value.parse()).collect()
}

fn print_file_report(file: &str, info: &SourceInfo, platform_macros: &PlatformMacros) {
    println!("{file}:");
    if info.has_main {
        println!("  {}", gettext("defines main()"));
    }
    for include in &info.includes {
        let form = if include.is_system {
            format!("<{}>", include.path)
        } else {
            format!("\"{}\"", include.path)
        };
        match platforms_for_expr(include.condition.as_ref(), platform_macros) {
            None => println!("  #include {form}"),
            Some(platforms) => {
                let names: Vec<String> = platforms.iter().map(|p| p.to_string()).collect();
                println!("  #include {form} [{}]", names.join(", "));
            }
        }
    }
}

fn print_groups(groups: &BTreeMap<GroupId, SourceGroup>) {
    for (id, group) in groups {
        println!("group {id}: {}", group.sources.join(" "));
        if !group.depends_on.is_empty() {
            println!("  {}: {}", gettext("depends on"), group.depends_on.join(" "));
        }
        if !group.sub_groups.is_empty() {
            println!("  {}: {}", gettext("merged from"), group.sub_groups.join(" "));
        }
    }
}
