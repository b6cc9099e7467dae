// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! OpenSCAD back end
//!
//! [`ScadProgram`] lowers a tree to OpenSCAD source, defining each cached
//! unit once as a module. [`OpenScadEngine`] runs the `openscad` executable
//! on those programs to answer extent queries, write views and export meshes.

mod engine;
mod writer;

pub use engine::OpenScadEngine;
pub use writer::{Dimension, ScadProgram, ScadUnit};
