/*
 * Copyright (c) Meta Platforms, Inc. and affiliates.
 *
 * This source code is licensed under both the MIT license found in the
 * LICENSE-MIT file in the root directory of this source tree and the Apache
 * License, Version 2.0 found in the LICENSE-APACHE file in the root directory
 * of this source tree.
 */

use std::sync::Arc;

use dupe::Dupe;
use girder_core::attributes::AttributeSet;
use girder_core::attributes::AttributesSchema;
use girder_core::component::ComponentId;
use girder_core::display::DisplayName;
use smallvec::smallvec;
use smallvec::SmallVec;

use crate::local::LocalFileDependency;
use crate::set::ResolvedArtifactSet;

/// One attribute-tagged bundle of artifacts contributed by a dependency edge.
/// Owned by the edge that created it; never shared across edges.
#[derive(Clone, Dupe)]
pub struct ResolvedVariant(Arc<ResolvedVariantData>);

struct ResolvedVariantData {
    name: DisplayName,
    attributes: AttributeSet,
    artifacts: ResolvedArtifactSet,
    source: VariantSource,
}

/// What produced a variant.
#[derive(Clone, Dupe)]
pub enum VariantSource {
    Component(ComponentId),
    LocalFiles(Arc<LocalFileDependency>),
}

impl ResolvedVariant {
    pub fn new(
        name: DisplayName,
        attributes: AttributeSet,
        artifacts: ResolvedArtifactSet,
        source: VariantSource,
    ) -> ResolvedVariant {
        ResolvedVariant(Arc::new(ResolvedVariantData {
            name,
            attributes,
            artifacts,
            source,
        }))
    }

    pub fn name(&self) -> &DisplayName {
        &self.0.name
    }

    /// The variant's immutable attribute set: declared attributes merged
    /// with, and overridden by, attributes inferred from the artifact type.
    pub fn attributes(&self) -> &AttributeSet {
        &self.0.attributes
    }

    pub fn artifacts(&self) -> &ResolvedArtifactSet {
        &self.0.artifacts
    }

    pub fn source(&self) -> &VariantSource {
        &self.0.source
    }
}

/// The set of alternative variants a single dependency edge could resolve to.
/// Published components may offer several; a local file dependency always
/// offers exactly one. Consumed, never mutated, by variant selection.
pub struct ResolvedVariantSet {
    variants: SmallVec<[ResolvedVariant; 1]>,
    schema: Arc<dyn AttributesSchema>,
}

impl ResolvedVariantSet {
    pub fn new(
        variants: SmallVec<[ResolvedVariant; 1]>,
        schema: Arc<dyn AttributesSchema>,
    ) -> ResolvedVariantSet {
        assert!(
            !variants.is_empty(),
            "a dependency edge must offer at least one variant"
        );
        ResolvedVariantSet { variants, schema }
    }

    pub fn singleton(
        variant: ResolvedVariant,
        schema: Arc<dyn AttributesSchema>,
    ) -> ResolvedVariantSet {
        ResolvedVariantSet {
            variants: smallvec![variant],
            schema,
        }
    }

    /// Never empty.
    pub fn variants(&self) -> &[ResolvedVariant] {
        &self.variants
    }

    pub fn schema(&self) -> &Arc<dyn AttributesSchema> {
        &self.schema
    }
}
