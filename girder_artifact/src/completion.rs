/*
 * Copyright (c) Meta Platforms, Inc. and affiliates.
 *
 * This source code is licensed under both the MIT license found in the
 * LICENSE-MIT file in the root directory of this source tree and the Apache
 * License, Version 2.0 found in the LICENSE-APACHE file in the root directory
 * of this source tree.
 */

use futures::future::BoxFuture;
use futures::FutureExt;
use girder_core::attributes::AttributeSet;
use girder_core::display::DisplayName;
use girder_core::result::SharedError;

use crate::artifact::ResolvedArtifact;
use crate::local::FileSetSpec;
use crate::transform::TransformedCompletion;
use crate::visitor::ArtifactVisitor;
use crate::visitor::CollectionSource;

/// Token produced by the schedule phase, representing "materialization has
/// been scheduled". Driving it performs the completion phase: it awaits any
/// asynchronous work scheduled for its subtree and delivers artifacts to the
/// visitor in the originally declared order, independent of the order the
/// work actually finished in. Driven exactly once; `visit` consumes it.
pub enum Completion {
    Empty,
    Artifact {
        variant_name: DisplayName,
        attributes: AttributeSet,
        artifact: ResolvedArtifact,
    },
    Composite(Vec<Completion>),
    /// Re-raises the captured failure to the visitor at this point in the
    /// stream, not earlier.
    Broken(SharedError),
    Transformed(TransformedCompletion),
    /// A collection that was skipped because the listener asked for
    /// `NoContents`; driving it only signals "nothing here".
    EndCollection(CollectionSource),
    /// Notifies the visitor of the raw file set specification after the
    /// composed artifacts have been delivered.
    WithSpec {
        inner: Box<Completion>,
        spec: FileSetSpec,
    },
}

impl Completion {
    pub fn visit<'a>(self, visitor: &'a mut dyn ArtifactVisitor) -> BoxFuture<'a, ()> {
        async move {
            match self {
                Completion::Empty => {}
                Completion::Artifact {
                    variant_name,
                    attributes,
                    artifact,
                } => {
                    visitor.visit_artifact(&variant_name, &attributes, &artifact);
                    visitor.end_visit_collection(&CollectionSource::Other);
                }
                Completion::Composite(children) => {
                    for child in children {
                        child.visit(visitor).await;
                    }
                }
                Completion::Broken(error) => visitor.visit_failure(&error),
                Completion::Transformed(transformed) => transformed.visit(visitor).await,
                Completion::EndCollection(source) => visitor.end_visit_collection(&source),
                Completion::WithSpec { inner, spec } => {
                    inner.visit(visitor).await;
                    visitor.visit_spec(&spec);
                }
            }
        }
        .boxed()
    }
}
