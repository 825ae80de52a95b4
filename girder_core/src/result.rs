/*
 * Copyright (c) Meta Platforms, Inc. and affiliates.
 *
 * This source code is licensed under both the MIT license found in the
 * LICENSE-MIT file in the root directory of this source tree and the Apache
 * License, Version 2.0 found in the LICENSE-APACHE file in the root directory
 * of this source tree.
 */

//! A cloneable error for failures that are captured once and reported from
//! several places, e.g. a broken artifact subtree whose failure is replayed
//! to every visitor that reaches it.

use std::fmt;
use std::sync::Arc;

use dupe::Dupe;

pub type SharedResult<T> = Result<T, SharedError>;

/// An error that can be cloned and shared across whatever holds on to the
/// captured failure.
#[derive(Clone, Dupe)]
pub struct SharedError(Arc<anyhow::Error>);

impl SharedError {
    pub fn new(error: anyhow::Error) -> SharedError {
        SharedError(Arc::new(error))
    }

    pub fn inner(&self) -> &anyhow::Error {
        &self.0
    }
}

impl fmt::Display for SharedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Print the full cause chain; the context usually names the artifact
        // or file set the failure belongs to.
        write!(f, "{:#}", self.0)
    }
}

impl fmt::Debug for SharedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.0, f)
    }
}

impl std::error::Error for SharedError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.0.source()
    }
}

impl From<anyhow::Error> for SharedError {
    fn from(error: anyhow::Error) -> SharedError {
        SharedError::new(error)
    }
}

pub trait SharedResultExt<T> {
    fn shared_error(self) -> SharedResult<T>;
}

impl<T> SharedResultExt<T> for anyhow::Result<T> {
    fn shared_error(self) -> SharedResult<T> {
        self.map_err(SharedError::new)
    }
}
