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

/// A cheaply shareable human readable label, used wherever a value needs to
/// describe itself in logs or failure messages.
#[derive(Clone, Dupe, Debug, Display, Eq, PartialEq, Hash)]
#[display(fmt = "{}", _0)]
pub struct DisplayName(Arc<str>);

impl DisplayName {
    pub fn of(name: impl Into<Arc<str>>) -> DisplayName {
        DisplayName(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}
