//
// Copyright (c) 2025-2026 Jeff Garzik
//
// This file is part of the ccgen project covered under
// the MIT License.  For the full license text, please see the LICENSE
// file in the root directory of this project.
// SPDX-License-Identifier: MIT
//
// Platform catalogue for ccgen
//
// Closed sets of OS and CPU architecture identifiers matching the
// constraint values of the target build system, plus the table of
// macros compilers predefine for each (os, arch) pair.
//

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

/// Macro definitions and their integer values, e.g. `{"_WIN32": 1}`.
/// A definition without an explicit value is assumed to be 1.
/// String and float macro values are not representable.
pub type Macros = HashMap<String, i64>;

/// Per-platform macro table consumed by the condition solver.
pub type PlatformMacros = HashMap<Platform, Macros>;

/// Target operating system identifier.
///
/// Variants are declared in the lexicographic order of their textual
/// form so that the derived ordering matches string ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Os {
    Android,
    Chromiumos,
    Emscripten,
    Freebsd,
    Fuchsia,
    Haiku,
    Ios,
    Linux,
    Netbsd,
    Nixos,
    /// Bare-metal targets.
    None,
    Openbsd,
    Osx,
    Qnx,
    Tvos,
    Uefi,
    Visionos,
    Vxworks,
    Wasi,
    Watchos,
    Windows,
}

impl Os {
    pub const ALL: [Os; 21] = [
        Os::Android,
        Os::Chromiumos,
        Os::Emscripten,
        Os::Freebsd,
        Os::Fuchsia,
        Os::Haiku,
        Os::Ios,
        Os::Linux,
        Os::Netbsd,
        Os::Nixos,
        Os::None,
        Os::Openbsd,
        Os::Osx,
        Os::Qnx,
        Os::Tvos,
        Os::Uefi,
        Os::Visionos,
        Os::Vxworks,
        Os::Wasi,
        Os::Watchos,
        Os::Windows,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Os::Android => "android",
            Os::Chromiumos => "chromiumos",
            Os::Emscripten => "emscripten",
            Os::Freebsd => "freebsd",
            Os::Fuchsia => "fuchsia",
            Os::Haiku => "haiku",
            Os::Ios => "ios",
            Os::Linux => "linux",
            Os::Netbsd => "netbsd",
            Os::Nixos => "nixos",
            Os::None => "none",
            Os::Openbsd => "openbsd",
            Os::Osx => "osx",
            Os::Qnx => "qnx",
            Os::Tvos => "tvos",
            Os::Uefi => "uefi",
            Os::Visionos => "visionos",
            Os::Vxworks => "vxworks",
            Os::Wasi => "wasi",
            Os::Watchos => "watchos",
            Os::Windows => "windows",
        }
    }

    fn legal_values() -> String {
        let names: Vec<&str> = Os::ALL.iter().map(|os| os.as_str()).collect();
        names.join(", ")
    }
}

impl fmt::Display for Os {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Os {
    type Err = PlatformError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // "macos" is accepted as an alias of "osx"
        let os = match s {
            "android" => Os::Android,
            "chromiumos" => Os::Chromiumos,
            "emscripten" => Os::Emscripten,
            "freebsd" => Os::Freebsd,
            "fuchsia" => Os::Fuchsia,
            "haiku" => Os::Haiku,
            "ios" => Os::Ios,
            "linux" => Os::Linux,
            "netbsd" => Os::Netbsd,
            "nixos" => Os::Nixos,
            "none" => Os::None,
            "openbsd" => Os::Openbsd,
            "osx" | "macos" => Os::Osx,
            "qnx" => Os::Qnx,
            "tvos" => Os::Tvos,
            "uefi" => Os::Uefi,
            "visionos" => Os::Visionos,
            "vxworks" => Os::Vxworks,
            "wasi" => Os::Wasi,
            "watchos" => Os::Watchos,
            "windows" => Os::Windows,
            _ => return Err(PlatformError::UnknownOs(s.to_string())),
        };
        Ok(os)
    }
}

/// Target CPU architecture identifier.
///
/// Variants are declared in the lexicographic order of their textual
/// form so that the derived ordering matches string ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Arch {
    Aarch32,
    Aarch64,
    Arm64_32,
    Arm64e,
    Armv6M,
    Armv7,
    Armv7M,
    Armv7eM,
    Armv7eMf,
    Armv7k,
    Armv8M,
    CortexR52,
    CortexR82,
    I386,
    Mips64,
    Ppc,
    Ppc32,
    Ppc64le,
    Riscv32,
    Riscv64,
    S390x,
    Wasm32,
    Wasm64,
    X86_32,
    X86_64,
}

impl Arch {
    pub const ALL: [Arch; 25] = [
        Arch::Aarch32,
        Arch::Aarch64,
        Arch::Arm64_32,
        Arch::Arm64e,
        Arch::Armv6M,
        Arch::Armv7,
        Arch::Armv7M,
        Arch::Armv7eM,
        Arch::Armv7eMf,
        Arch::Armv7k,
        Arch::Armv8M,
        Arch::CortexR52,
        Arch::CortexR82,
        Arch::I386,
        Arch::Mips64,
        Arch::Ppc,
        Arch::Ppc32,
        Arch::Ppc64le,
        Arch::Riscv32,
        Arch::Riscv64,
        Arch::S390x,
        Arch::Wasm32,
        Arch::Wasm64,
        Arch::X86_32,
        Arch::X86_64,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Arch::Aarch32 => "aarch32",
            Arch::Aarch64 => "aarch64",
            Arch::Arm64_32 => "arm64_32",
            Arch::Arm64e => "arm64e",
            Arch::Armv6M => "armv6-m",
            Arch::Armv7 => "armv7",
            Arch::Armv7M => "armv7-m",
            Arch::Armv7eM => "armv7e-m",
            Arch::Armv7eMf => "armv7e-mf",
            Arch::Armv7k => "armv7k",
            Arch::Armv8M => "armv8-m",
            Arch::CortexR52 => "cortex-r52",
            Arch::CortexR82 => "cortex-r82",
            Arch::I386 => "i386",
            Arch::Mips64 => "mips64",
            Arch::Ppc => "ppc",
            Arch::Ppc32 => "ppc32",
            Arch::Ppc64le => "ppc64le",
            Arch::Riscv32 => "riscv32",
            Arch::Riscv64 => "riscv64",
            Arch::S390x => "s390x",
            Arch::Wasm32 => "wasm32",
            Arch::Wasm64 => "wasm64",
            Arch::X86_32 => "x86_32",
            Arch::X86_64 => "x86_64",
        }
    }

    fn legal_values() -> String {
        let names: Vec<&str> = Arch::ALL.iter().map(|arch| arch.as_str()).collect();
        names.join(", ")
    }
}

impl fmt::Display for Arch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Arch {
    type Err = PlatformError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // "amd64", "arm64" and "arm" are accepted as aliases
        let arch = match s {
            "aarch32" | "arm" => Arch::Aarch32,
            "aarch64" | "arm64" => Arch::Aarch64,
            "arm64_32" => Arch::Arm64_32,
            "arm64e" => Arch::Arm64e,
            "armv6-m" => Arch::Armv6M,
            "armv7" => Arch::Armv7,
            "armv7-m" => Arch::Armv7M,
            "armv7e-m" => Arch::Armv7eM,
            "armv7e-mf" => Arch::Armv7eMf,
            "armv7k" => Arch::Armv7k,
            "armv8-m" => Arch::Armv8M,
            "cortex-r52" => Arch::CortexR52,
            "cortex-r82" => Arch::CortexR82,
            "i386" => Arch::I386,
            "mips64" => Arch::Mips64,
            "ppc" => Arch::Ppc,
            "ppc32" => Arch::Ppc32,
            "ppc64le" => Arch::Ppc64le,
            "riscv32" => Arch::Riscv32,
            "riscv64" => Arch::Riscv64,
            "s390x" => Arch::S390x,
            "wasm32" => Arch::Wasm32,
            "wasm64" => Arch::Wasm64,
            "x86_32" => Arch::X86_32,
            "x86_64" | "amd64" => Arch::X86_64,
            _ => return Err(PlatformError::UnknownArch(s.to_string())),
        };
        Ok(arch)
    }
}

/// An OS/arch pair identifying a target platform.
///
/// An absent arch denotes "all architectures of this OS"; the macro
/// table uses such entries to store OS-wide macro definitions.
/// The derived ordering sorts by OS first, then arch, with the
/// OS-wide entry before any concrete architecture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Platform {
    pub os: Os,
    pub arch: Option<Arch>,
}

impl Platform {
    pub fn new(os: Os, arch: Arch) -> Self {
        Platform {
            os,
            arch: Some(arch),
        }
    }

    /// The OS-wide entry covering every architecture of `os`.
    pub fn os_wide(os: Os) -> Self {
        Platform { os, arch: None }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.arch {
            Some(arch) => write!(f, "{}/{}", self.os, arch),
            None => write!(f, "{}/", self.os),
        }
    }
}

impl FromStr for Platform {
    type Err = PlatformError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut fields = s.split('/').filter(|f| !f.is_empty());
        let (os, arch) = match (fields.next(), fields.next(), fields.next()) {
            (Some(os), Some(arch), None) => (os, arch),
            _ => return Err(PlatformError::Malformed(s.to_string())),
        };
        Ok(Platform::new(Os::from_str(os)?, Arch::from_str(arch)?))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PlatformError {
    #[error("malformed platform string '{0}', expected <os>/<arch>")]
    Malformed(String),
    #[error(
        "unknown OS '{0}', expected one of: {legal}, or alias macos",
        legal = Os::legal_values()
    )]
    UnknownOs(String),
    #[error(
        "unknown architecture '{0}', expected one of: {legal}, or aliases amd64, arm64, arm",
        legal = Arch::legal_values()
    )]
    UnknownArch(String),
}

/// Well-known macro definitions per platform, e.g. `_WIN32` on every
/// Windows target. Initialized once and read-only afterwards; callers
/// overlay per-invocation user macros via [`macros_for`].
pub static KNOWN_PLATFORM_MACROS: LazyLock<PlatformMacros> = LazyLock::new(known_platform_macros);

fn known_platform_macros() -> PlatformMacros {
    let mut table = PlatformMacros::new();

    //------------------------------------------------------------------
    //  Windows
    //------------------------------------------------------------------
    let windows_archs = [
        Arch::I386,
        Arch::X86_32,
        Arch::X86_64,
        Arch::Aarch32,
        Arch::Aarch64,
    ];
    add_macro(&mut table, "_WIN32", &os_platforms(Os::Windows, &windows_archs));
    add_macro(
        &mut table,
        "_WIN64",
        &os_platforms(Os::Windows, &[Arch::X86_64, Arch::Aarch64]),
    );
    add_macro(&mut table, "__MINGW32__", &[Platform::new(Os::Windows, Arch::I386)]);
    add_macro(&mut table, "__MINGW64__", &[Platform::new(Os::Windows, Arch::X86_64)]);
    add_macro(&mut table, "_M_IX86", &[Platform::new(Os::Windows, Arch::I386)]);
    add_macro(&mut table, "_M_X64", &[Platform::new(Os::Windows, Arch::X86_64)]);
    add_macro(&mut table, "_M_ARM", &[Platform::new(Os::Windows, Arch::Aarch32)]);
    add_macro(&mut table, "_M_ARM64", &[Platform::new(Os::Windows, Arch::Aarch64)]);

    //------------------------------------------------------------------
    //  Linux / Android family
    //------------------------------------------------------------------
    add_macros(
        &mut table,
        &["linux", "__linux__", "__linux", "__gnu_linux__"],
        &os_platforms(Os::Linux, &Arch::ALL),
    );
    add_macro(&mut table, "__NIX__", &os_platforms(Os::Nixos, &Arch::ALL));
    add_macro(&mut table, "__NIXOS__", &os_platforms(Os::Nixos, &Arch::ALL));

    let android_archs = [
        Arch::Aarch32,
        Arch::Aarch64,
        Arch::X86_32,
        Arch::X86_64,
        Arch::Riscv64,
    ];
    add_macro(&mut table, "__ANDROID__", &os_platforms(Os::Android, &android_archs));

    let chrome_archs = [Arch::X86_64, Arch::Aarch64, Arch::Riscv64];
    add_macro(&mut table, "__CHROMEOS__", &os_platforms(Os::Chromiumos, &chrome_archs));

    // Apple does not define unix even though its systems are unix-like
    let unix_os = [
        Os::Linux,
        Os::Android,
        Os::Chromiumos,
        Os::Nixos,
        Os::Freebsd,
        Os::Netbsd,
        Os::Openbsd,
        Os::Haiku,
        Os::Qnx,
    ];
    add_macros(
        &mut table,
        &["unix", "__unix", "__unix__"],
        &matrix(&unix_os, &Arch::ALL),
    );

    //------------------------------------------------------------------
    //  WebAssembly (Emscripten & WASI)
    //------------------------------------------------------------------
    let wasm_archs = [Arch::Wasm32, Arch::Wasm64];
    add_macro(&mut table, "__EMSCRIPTEN__", &matrix(&[Os::Emscripten], &wasm_archs));
    add_macro(&mut table, "__wasi__", &matrix(&[Os::Wasi], &wasm_archs));
    add_macro(&mut table, "__wasm__", &matrix(&[Os::Emscripten, Os::Wasi], &wasm_archs));
    add_macro(
        &mut table,
        "__wasm32__",
        &matrix(&[Os::Emscripten, Os::Wasi], &[Arch::Wasm32]),
    );
    add_macro(
        &mut table,
        "__wasm64__",
        &matrix(&[Os::Emscripten, Os::Wasi], &[Arch::Wasm64]),
    );

    //------------------------------------------------------------------
    //  BSD family
    //------------------------------------------------------------------
    let bsd_archs = [
        Arch::I386,
        Arch::X86_64,
        Arch::Aarch64,
        Arch::Riscv64,
        Arch::Ppc64le,
    ];
    add_macro(&mut table, "__FreeBSD__", &matrix(&[Os::Freebsd], &bsd_archs));
    add_macro(&mut table, "__NetBSD__", &matrix(&[Os::Netbsd], &bsd_archs));
    add_macro(&mut table, "__OpenBSD__", &matrix(&[Os::Openbsd], &bsd_archs));

    //------------------------------------------------------------------
    //  QNX, Haiku, Fuchsia, VxWorks, UEFI
    //------------------------------------------------------------------
    let qnx_archs = [
        Arch::Aarch32,
        Arch::Aarch64,
        Arch::Ppc32,
        Arch::Ppc64le,
        Arch::X86_32,
        Arch::X86_64,
    ];
    add_macro(&mut table, "__QNX__", &os_platforms(Os::Qnx, &qnx_archs));
    add_macro(&mut table, "__QNXNTO__", &os_platforms(Os::Qnx, &qnx_archs));

    add_macro(
        &mut table,
        "__HAIKU__",
        &os_platforms(Os::Haiku, &[Arch::X86_32, Arch::X86_64]),
    );

    let fuchsia_archs = [Arch::Aarch64, Arch::X86_64];
    add_macro(&mut table, "__FUCHSIA__", &os_platforms(Os::Fuchsia, &fuchsia_archs));
    add_macro(&mut table, "__Fuchsia__", &os_platforms(Os::Fuchsia, &fuchsia_archs));

    let vxworks_archs = [
        Arch::Aarch32,
        Arch::Aarch64,
        Arch::Ppc32,
        Arch::Ppc64le,
        Arch::X86_32,
        Arch::X86_64,
    ];
    add_macro(&mut table, "__VXWORKS__", &os_platforms(Os::Vxworks, &vxworks_archs));
    add_macro(&mut table, "__vxworks", &os_platforms(Os::Vxworks, &vxworks_archs));

    let uefi_archs = [
        Arch::Aarch32,
        Arch::Aarch64,
        Arch::X86_32,
        Arch::X86_64,
        Arch::Riscv64,
    ];
    add_macro(&mut table, "__UEFI__", &os_platforms(Os::Uefi, &uefi_archs));
    add_macro(&mut table, "__EFI__", &os_platforms(Os::Uefi, &uefi_archs));

    //------------------------------------------------------------------
    //  Apple family (modern targets only, no 32-bit x86 or armv6)
    //------------------------------------------------------------------
    let mac_archs = [Arch::X86_64, Arch::Aarch64, Arch::Arm64e];
    let ios_archs = [Arch::Aarch64, Arch::Arm64e];
    let tvos_archs = [Arch::Aarch64];
    let watch_archs = [Arch::Armv7k, Arch::Arm64_32];
    let vision_archs = [Arch::Aarch64];
    let apple_platforms: Vec<Platform> = [
        os_platforms(Os::Osx, &mac_archs),
        os_platforms(Os::Ios, &ios_archs),
        os_platforms(Os::Tvos, &tvos_archs),
        os_platforms(Os::Watchos, &watch_archs),
        os_platforms(Os::Visionos, &vision_archs),
    ]
    .concat();
    add_macro(&mut table, "__APPLE__", &apple_platforms);
    add_macro(&mut table, "__MACH__", &apple_platforms);
    add_macro(&mut table, "TARGET_OS_OSX", &os_platforms(Os::Osx, &mac_archs));
    add_macro(&mut table, "TARGET_OS_MAC", &os_platforms(Os::Osx, &mac_archs));
    add_macro(&mut table, "TARGET_OS_IPHONE", &os_platforms(Os::Ios, &ios_archs));
    add_macro(&mut table, "TARGET_OS_IOS", &os_platforms(Os::Ios, &ios_archs));
    add_macro(&mut table, "TARGET_OS_TV", &os_platforms(Os::Tvos, &tvos_archs));
    add_macro(&mut table, "TARGET_OS_WATCH", &os_platforms(Os::Watchos, &watch_archs));
    add_macro(&mut table, "TARGET_OS_VISION", &os_platforms(Os::Visionos, &vision_archs));

    //------------------------------------------------------------------
    //  Generic CPU-only macros
    //------------------------------------------------------------------
    add_macros(
        &mut table,
        &["__x86_64__", "__x86_64", "__amd64", "__amd64__"],
        &matrix(&Os::ALL, &[Arch::X86_64]),
    );
    add_macros(
        &mut table,
        &["__i386__", "__i386"],
        &matrix(&Os::ALL, &[Arch::I386]),
    );
    add_macros(
        &mut table,
        &["__arm__", "__arm", "__thumb__", "__thumb"],
        &matrix(&Os::ALL, &[Arch::Aarch32]),
    );
    add_macros(
        &mut table,
        &["__aarch64__", "__arm64", "__arm64__"],
        &matrix(&Os::ALL, &[Arch::Aarch64]),
    );
    add_macros(
        &mut table,
        &["__ARM64_32__", "__ARM64_32"],
        &[Platform::new(Os::Watchos, Arch::Arm64_32)],
    );
    add_macros(
        &mut table,
        &["__arm64e__", "__arm64e"],
        &matrix(&[Os::Osx, Os::Ios], &[Arch::Arm64e]),
    );

    // Fine-grained Arm (mostly bare-metal)
    add_macro(&mut table, "__ARM_ARCH_6M__", &[Platform::new(Os::None, Arch::Armv6M)]);
    add_macro(&mut table, "__ARM_ARCH_7__", &[Platform::new(Os::None, Arch::Armv7)]);
    add_macro(&mut table, "__ARM_ARCH_7A__", &[Platform::new(Os::None, Arch::Armv7)]);
    add_macro(&mut table, "__ARM_ARCH_7M__", &[Platform::new(Os::None, Arch::Armv7M)]);
    add_macro(&mut table, "__ARM_ARCH_7EM__", &[Platform::new(Os::None, Arch::Armv7eM)]);
    add_macro(&mut table, "__ARM_ARCH_8M_BASE__", &[Platform::new(Os::None, Arch::Armv8M)]);
    add_macro(&mut table, "__ARM_ARCH_8M_MAIN__", &[Platform::new(Os::None, Arch::Armv8M)]);

    //------------------------------------------------------------------
    //  PowerPC
    //------------------------------------------------------------------
    let powerpc_os = [
        Os::Linux,
        Os::Freebsd,
        Os::Netbsd,
        Os::Openbsd,
        Os::Qnx,
        Os::Vxworks,
    ];
    add_macro(&mut table, "__powerpc__", &matrix(&powerpc_os, &[Arch::Ppc32]));
    add_macro(&mut table, "__PPC__", &matrix(&powerpc_os, &[Arch::Ppc32]));
    add_macro(&mut table, "__powerpc64__", &matrix(&powerpc_os, &[Arch::Ppc64le]));
    add_macro(&mut table, "__ppc64__", &matrix(&powerpc_os, &[Arch::Ppc64le]));

    //------------------------------------------------------------------
    //  MIPS
    //------------------------------------------------------------------
    let mips_os = [Os::Linux, Os::Netbsd, Os::Openbsd, Os::Qnx, Os::Vxworks];
    add_macro(&mut table, "__mips64", &matrix(&mips_os, &[Arch::Mips64]));

    //------------------------------------------------------------------
    //  s390
    //------------------------------------------------------------------
    add_macro(&mut table, "__s390x__", &[Platform::new(Os::Linux, Arch::S390x)]);
    add_macro(&mut table, "__s390__", &[Platform::new(Os::Linux, Arch::S390x)]);

    //------------------------------------------------------------------
    //  RISC-V
    //------------------------------------------------------------------
    let riscv_os = [
        Os::Linux,
        Os::Freebsd,
        Os::Netbsd,
        Os::Openbsd,
        Os::Qnx,
        Os::Vxworks,
        Os::Android,
        Os::Chromiumos,
        Os::Fuchsia,
        Os::Nixos,
    ];
    add_macro(&mut table, "__riscv", &matrix(&riscv_os, &[Arch::Riscv64]));

    table
}

fn add_macro_value(table: &mut PlatformMacros, name: &str, value: i64, platforms: &[Platform]) {
    for platform in platforms {
        table
            .entry(*platform)
            .or_default()
            .insert(name.to_string(), value);
    }
}

fn add_macro(table: &mut PlatformMacros, name: &str, platforms: &[Platform]) {
    // `#define NAME` is assumed equal to `#define NAME 1`
    add_macro_value(table, name, 1, platforms);
}

fn add_macros(table: &mut PlatformMacros, names: &[&str], platforms: &[Platform]) {
    for name in names {
        add_macro(table, name, platforms);
    }
}

/// Every (os, arch) combination plus the OS-wide entry.
fn os_platforms(os: Os, archs: &[Arch]) -> Vec<Platform> {
    let mut platforms = matrix(&[os], archs);
    platforms.push(Platform::os_wide(os));
    platforms
}

fn matrix(oses: &[Os], archs: &[Arch]) -> Vec<Platform> {
    let mut platforms = Vec::with_capacity(oses.len() * archs.len());
    for os in oses {
        for arch in archs {
            platforms.push(Platform::new(*os, *arch));
        }
    }
    platforms
}

/// The sorted list of concrete platforms the macro table knows about.
/// OS-wide entries are lookup storage, not selectable targets, and are
/// excluded.
pub fn known_platforms() -> Vec<Platform> {
    let mut platforms: Vec<Platform> = KNOWN_PLATFORM_MACROS
        .keys()
        .filter(|p| p.arch.is_some())
        .copied()
        .collect();
    platforms.sort();
    platforms
}

/// The macro set assumed defined when compiling for `platform`:
/// OS-wide entries, then the exact (os, arch) entries, then `user`
/// overrides, later sources winning on conflicts.
pub fn macros_for(table: &PlatformMacros, platform: Platform, user: &Macros) -> Macros {
    let mut macros = Macros::new();
    if let Some(os_wide) = table.get(&Platform::os_wide(platform.os)) {
        macros.extend(os_wide.iter().map(|(k, v)| (k.clone(), *v)));
    }
    if let Some(exact) = table.get(&platform) {
        macros.extend(exact.iter().map(|(k, v)| (k.clone(), *v)));
    }
    macros.extend(user.iter().map(|(k, v)| (k.clone(), *v)));
    macros
}

/// Builds the solver input for one invocation: the resolved macro set
/// of every enabled platform, with `user` definitions applied on top.
pub fn enabled_platform_macros(platforms: &[Platform], user: &Macros) -> PlatformMacros {
    platforms
        .iter()
        .map(|p| (*p, macros_for(&KNOWN_PLATFORM_MACROS, *p, user)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn os_ordering_matches_textual_form() {
        for pair in Os::ALL.windows(2) {
            assert!(pair[0] < pair[1]);
            assert!(pair[0].as_str() < pair[1].as_str());
        }
    }

    #[test]
    fn arch_ordering_matches_textual_form() {
        for pair in Arch::ALL.windows(2) {
            assert!(pair[0] < pair[1]);
            assert!(pair[0].as_str() < pair[1].as_str());
        }
    }

    #[test]
    fn os_wide_entry_sorts_before_concrete() {
        assert!(Platform::os_wide(Os::Linux) < Platform::new(Os::Linux, Arch::Aarch32));
        assert!(Platform::new(Os::Linux, Arch::X86_64) < Platform::os_wide(Os::Netbsd));
    }

    #[test]
    fn parse_plain() {
        assert_eq!(
            "linux/x86_64".parse::<Platform>(),
            Ok(Platform::new(Os::Linux, Arch::X86_64))
        );
    }

    #[test]
    fn parse_aliases() {
        assert_eq!(
            "macos/amd64".parse::<Platform>(),
            Ok(Platform::new(Os::Osx, Arch::X86_64))
        );
        assert_eq!(
            "linux/arm64".parse::<Platform>(),
            Ok(Platform::new(Os::Linux, Arch::Aarch64))
        );
        assert_eq!(
            "linux/arm".parse::<Platform>(),
            Ok(Platform::new(Os::Linux, Arch::Aarch32))
        );
    }

    #[test]
    fn parse_errors() {
        assert_eq!(
            "x86_64".parse::<Platform>(),
            Err(PlatformError::Malformed("x86_64".to_string()))
        );
        assert_eq!(
            "plan9/x86_64".parse::<Platform>(),
            Err(PlatformError::UnknownOs("plan9".to_string()))
        );
        assert_eq!(
            "linux/z80".parse::<Platform>(),
            Err(PlatformError::UnknownArch("z80".to_string()))
        );
        let message = "linux/z80".parse::<Platform>().unwrap_err().to_string();
        assert!(message.contains("x86_64"));
        assert!(message.contains("amd64"));
    }

    #[test]
    fn display_round_trip() {
        let platform = Platform::new(Os::Windows, Arch::Aarch64);
        assert_eq!(platform.to_string(), "windows/aarch64");
        assert_eq!(platform.to_string().parse::<Platform>(), Ok(platform));
    }

    #[test]
    fn windows_macros() {
        let table = &*KNOWN_PLATFORM_MACROS;
        let win64 = &table[&Platform::new(Os::Windows, Arch::X86_64)];
        assert_eq!(win64.get("_WIN32"), Some(&1));
        assert_eq!(win64.get("_WIN64"), Some(&1));
        assert_eq!(win64.get("_M_X64"), Some(&1));
        assert_eq!(win64.get("__linux__"), None);
        // OS-wide entry carries the arch-independent macros only
        let os_wide = &table[&Platform::os_wide(Os::Windows)];
        assert_eq!(os_wide.get("_WIN32"), Some(&1));
        assert_eq!(os_wide.get("_M_X64"), None);
    }

    #[test]
    fn apple_macros() {
        let table = &*KNOWN_PLATFORM_MACROS;
        for platform in [
            Platform::new(Os::Osx, Arch::Aarch64),
            Platform::new(Os::Ios, Arch::Arm64e),
            Platform::new(Os::Watchos, Arch::Armv7k),
        ] {
            assert_eq!(table[&platform].get("__APPLE__"), Some(&1), "{platform}");
            assert_eq!(table[&platform].get("__MACH__"), Some(&1), "{platform}");
        }
        assert_eq!(
            table[&Platform::new(Os::Osx, Arch::X86_64)].get("TARGET_OS_OSX"),
            Some(&1)
        );
        assert_eq!(
            table[&Platform::new(Os::Ios, Arch::Aarch64)].get("TARGET_OS_OSX"),
            None
        );
    }

    #[test]
    fn cpu_macros_span_operating_systems() {
        let table = &*KNOWN_PLATFORM_MACROS;
        assert_eq!(
            table[&Platform::new(Os::Linux, Arch::X86_64)].get("__x86_64__"),
            Some(&1)
        );
        assert_eq!(
            table[&Platform::new(Os::Windows, Arch::X86_64)].get("__amd64"),
            Some(&1)
        );
        assert_eq!(
            table[&Platform::new(Os::Linux, Arch::Aarch64)].get("__x86_64__"),
            None
        );
    }

    #[test]
    fn unix_excludes_apple() {
        let table = &*KNOWN_PLATFORM_MACROS;
        assert_eq!(
            table[&Platform::new(Os::Linux, Arch::X86_64)].get("unix"),
            Some(&1)
        );
        assert_eq!(table[&Platform::new(Os::Osx, Arch::X86_64)].get("unix"), None);
    }

    #[test]
    fn macros_for_overlays_user_definitions() {
        let user = Macros::from([("DEBUG".to_string(), 2), ("_WIN32".to_string(), 7)]);
        let macros = macros_for(
            &KNOWN_PLATFORM_MACROS,
            Platform::new(Os::Windows, Arch::X86_64),
            &user,
        );
        assert_eq!(macros.get("DEBUG"), Some(&2));
        assert_eq!(macros.get("_WIN32"), Some(&7)); // user wins
        assert_eq!(macros.get("_M_X64"), Some(&1));
    }

    #[test]
    fn known_platforms_sorted_and_concrete() {
        let platforms = known_platforms();
        assert!(platforms.windows(2).all(|p| p[0] < p[1]));
        assert!(platforms.iter().all(|p| p.arch.is_some()));
        assert!(platforms.contains(&Platform::new(Os::Linux, Arch::X86_64)));
    }
}
