/*
 * Copyright (c) Meta Platforms, Inc. and affiliates.
 *
 * This source code is licensed under both the MIT license found in the
 * LICENSE-MIT file in the root directory of this source tree and the Apache
 * License, Version 2.0 found in the LICENSE-APACHE file in the root directory
 * of this source tree.
 */

use std::sync::Arc;

use derive_more::Display;
use dupe::Dupe;

/// Identity of a component in the dependency graph. Construction never fails;
/// the string form is opaque to this crate and only compared structurally.
#[derive(Clone, Dupe, Debug, Display, Eq, PartialEq, Hash, Ord, PartialOrd)]
#[display(fmt = "{}", _0)]
pub struct ComponentId(Arc<str>);

impl ComponentId {
    pub fn new(id: impl Into<Arc<str>>) -> ComponentId {
        ComponentId(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}
