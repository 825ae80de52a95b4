/*
 * Copyright (c) Meta Platforms, Inc. and affiliates.
 *
 * This source code is licensed under both the MIT license found in the
 * LICENSE-MIT file in the root directory of this source tree and the Apache
 * License, Version 2.0 found in the LICENSE-APACHE file in the root directory
 * of this source tree.
 */

use std::fmt;
use std::hash::Hash;
use std::hash::Hasher;
use std::sync::Arc;

use dupe::Dupe;
use girder_core::fs::paths::AbsPath;
use girder_core::fs::paths::AbsPathBuf;

use crate::identifier::ArtifactIdentifier;

/// One resolved artifact: a concrete file plus its identity. Immutable after
/// construction and freely shared.
#[derive(Clone, Dupe, Debug)]
pub struct ResolvedArtifact(Arc<ResolvedArtifactData>);

#[derive(Debug)]
struct ResolvedArtifactData {
    id: ArtifactIdentifier,
    file: AbsPathBuf,
}

impl ResolvedArtifact {
    pub fn new(id: ArtifactIdentifier, file: AbsPathBuf) -> ResolvedArtifact {
        ResolvedArtifact(Arc::new(ResolvedArtifactData { id, file }))
    }

    pub fn id(&self) -> &ArtifactIdentifier {
        &self.0.id
    }

    pub fn file(&self) -> &AbsPath {
        &self.0.file
    }
}

impl fmt::Display for ResolvedArtifact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0.id, f)
    }
}

/// Artifacts compare by identity; the file path is derived state.
impl PartialEq for ResolvedArtifact {
    fn eq(&self, other: &ResolvedArtifact) -> bool {
        self.0.id == other.0.id
    }
}

impl Eq for ResolvedArtifact {}

impl Hash for ResolvedArtifact {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.id.hash(state);
    }
}
