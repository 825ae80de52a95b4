/*
 * Copyright (c) Meta Platforms, Inc. and affiliates.
 *
 * This source code is licensed under both the MIT license found in the
 * LICENSE-MIT file in the root directory of this source tree and the Apache
 * License, Version 2.0 found in the LICENSE-APACHE file in the root directory
 * of this source tree.
 */

//! Immutable attribute sets used to classify artifact variants.
//!
//! Attributes are opaque key/value classifiers; the compatibility and
//! disambiguation rules that interpret them live outside this crate, behind
//! [`AttributesSchema`].

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use derive_more::Display;
use dupe::Dupe;
use once_cell::sync::Lazy;

/// Key of one attribute.
#[derive(Clone, Dupe, Debug, Display, Eq, PartialEq, Hash, Ord, PartialOrd)]
#[display(fmt = "{}", _0)]
pub struct AttributeKey(Arc<str>);

impl AttributeKey {
    pub fn new(key: impl Into<Arc<str>>) -> AttributeKey {
        AttributeKey(key.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// An immutable, ordered set of attributes. Freely shared without
/// synchronization; all mutation-shaped operations return a new set.
#[derive(Clone, Dupe, Debug, Eq, PartialEq, Hash)]
pub struct AttributeSet(Arc<BTreeMap<AttributeKey, String>>);

static EMPTY: Lazy<AttributeSet> = Lazy::new(|| AttributeSet(Arc::new(BTreeMap::new())));

impl AttributeSet {
    pub fn empty() -> AttributeSet {
        EMPTY.dupe()
    }

    pub fn get(&self, key: &AttributeKey) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&AttributeKey, &str)> {
        self.0.iter().map(|(k, v)| (k, v.as_str()))
    }

    /// Combines this set with `overrides`. Where both sets carry the same key,
    /// the value from `overrides` wins.
    pub fn merged_with(&self, overrides: &AttributeSet) -> AttributeSet {
        if self.is_empty() {
            return overrides.dupe();
        }
        if overrides.is_empty() {
            return self.dupe();
        }
        let mut merged = (*self.0).clone();
        for (k, v) in overrides.0.iter() {
            merged.insert(k.dupe(), v.clone());
        }
        AttributeSet(Arc::new(merged))
    }
}

impl FromIterator<(AttributeKey, String)> for AttributeSet {
    fn from_iter<I: IntoIterator<Item = (AttributeKey, String)>>(iter: I) -> AttributeSet {
        AttributeSet(Arc::new(iter.into_iter().collect()))
    }
}

impl fmt::Display for AttributeSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (i, (k, v)) in self.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}={}", k, v)?;
        }
        write!(f, "}}")
    }
}

/// The attribute compatibility schema carried by a variant set. Interpreted
/// only by the external variant selection policy; this crate just hands it
/// through.
pub trait AttributesSchema: Send + Sync {}

/// Schema of a variant set that declares no compatibility rules of its own,
/// e.g. a synthetic singleton variant for a plain file.
pub struct EmptySchema;

impl AttributesSchema for EmptySchema {}

static EMPTY_SCHEMA: Lazy<Arc<dyn AttributesSchema>> = Lazy::new(|| Arc::new(EmptySchema));

impl EmptySchema {
    pub fn instance() -> Arc<dyn AttributesSchema> {
        EMPTY_SCHEMA.dupe()
    }
}
