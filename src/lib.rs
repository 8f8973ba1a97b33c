//
// Copyright (c) 2025-2026 Jeff Garzik
//
// This file is part of the ccgen project covered under
// the MIT License.  For the full license text, please see the LICENSE
// file in the root directory of this project.
// SPDX-License-Identifier: MIT
//
// Library interface for ccgen
//
// This module exports the source parser, platform catalogue, condition
// solver and source grouper used to infer build rules for C/C++ trees.
//

pub mod groups;
pub mod parser;
pub mod platform;
pub mod solver;

pub const PROJECT_NAME: &str = "ccgen";
