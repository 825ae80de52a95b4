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
use girder_core::component::ComponentId;
use girder_core::fs::paths::AbsPathBuf;

/// Identity of one resolved artifact. Equality is structural; two artifacts
/// with the same identifier are the same artifact for caching purposes, so an
/// identifier must be unique within any single resolved set.
///
/// Construction never fails.
#[derive(Clone, Dupe, Debug, Display, Eq, PartialEq, Hash)]
pub enum ArtifactIdentifier {
    /// An artifact belonging to a known component, identified by the
    /// component and the artifact's file name.
    #[display(fmt = "{} ({})", file_name, component)]
    ComponentFile {
        component: ComponentId,
        file_name: Arc<str>,
    },
    /// A file with no owning component. Identity is the full path, so two
    /// files with the same name in different directories are distinct
    /// artifacts.
    #[display(fmt = "{}", path)]
    OpaqueFile { path: Arc<AbsPathBuf> },
    /// An output of applying a transformation to another artifact. Derived
    /// deterministically from the source identity and the transformation
    /// chain identity, so repeated application within one resolution is
    /// referentially stable.
    #[display(fmt = "{} ({} of {})", output_name, chain_id, source)]
    Transformed {
        source: Arc<ArtifactIdentifier>,
        chain_id: Arc<str>,
        output_name: Arc<str>,
    },
}

impl ArtifactIdentifier {
    pub fn component_file(component: ComponentId, file_name: &str) -> ArtifactIdentifier {
        ArtifactIdentifier::ComponentFile {
            component,
            file_name: file_name.into(),
        }
    }

    pub fn opaque(path: AbsPathBuf) -> ArtifactIdentifier {
        ArtifactIdentifier::OpaqueFile {
            path: Arc::new(path),
        }
    }

    pub fn transformed(
        source: &ArtifactIdentifier,
        chain_id: &str,
        output_name: &str,
    ) -> ArtifactIdentifier {
        ArtifactIdentifier::Transformed {
            source: Arc::new(source.dupe()),
            chain_id: chain_id.into(),
            output_name: output_name.into(),
        }
    }

    /// The component this artifact is attributed to. A file with no owning
    /// component acts as its own single-file component, so component filters
    /// can be applied to it individually.
    pub fn component_id(&self) -> ComponentId {
        match self {
            ArtifactIdentifier::ComponentFile { component, .. } => component.dupe(),
            ArtifactIdentifier::OpaqueFile { path } => ComponentId::new(path.to_string()),
            ArtifactIdentifier::Transformed { source, .. } => source.component_id(),
        }
    }
}
