/*
 * Copyright (c) Meta Platforms, Inc. and affiliates.
 *
 * This source code is licensed under both the MIT license found in the
 * LICENSE-MIT file in the root directory of this source tree and the Apache
 * License, Version 2.0 found in the LICENSE-APACHE file in the root directory
 * of this source tree.
 */

//! Resolution of dependency declarations into concrete, attribute-matched
//! artifact sets.
//!
//! The central type is [`set::ResolvedArtifactSet`], a lazily visited tree
//! describing "artifacts that can be asynchronously materialized and then
//! visited in order". Variant selection, attribute matching, file set
//! evaluation and the async executor are all external collaborators consumed
//! through traits; this crate owns the tree, the two-phase visitation
//! protocol, the local file dependency resolver and the transformation
//! pipeline with its per-visitation result cache.

pub mod artifact;
pub mod completion;
pub mod identifier;
pub mod local;
pub mod set;
pub mod transform;
pub mod variant;
pub mod visitor;

#[cfg(test)]
pub(crate) mod testing;
