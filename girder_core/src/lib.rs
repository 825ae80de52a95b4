/*
 * Copyright (c) Meta Platforms, Inc. and affiliates.
 *
 * This source code is licensed under both the MIT license found in the
 * LICENSE-MIT file in the root directory of this source tree and the Apache
 * License, Version 2.0 found in the LICENSE-APACHE file in the root directory
 * of this source tree.
 */

//! Foundational value types shared across the girder resolution engine.

pub mod attributes;
pub mod component;
pub mod display;
pub mod fs;
pub mod result;
