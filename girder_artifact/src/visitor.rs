/*
 * Copyright (c) Meta Platforms, Inc. and affiliates.
 *
 * This source code is licensed under both the MIT license found in the
 * LICENSE-MIT file in the root directory of this source tree and the Apache
 * License, Version 2.0 found in the LICENSE-APACHE file in the root directory
 * of this source tree.
 */

//! The consumed side of the two-phase visitation protocol: the listener
//! driving the schedule phase, the visitor receiving artifacts during the
//! completion phase, and the externally supplied work queue.

use std::fmt;
use std::sync::Arc;

use dupe::Dupe;
use futures::future::BoxFuture;
use girder_core::attributes::AttributeSet;
use girder_core::display::DisplayName;
use girder_core::result::SharedError;

use crate::artifact::ResolvedArtifact;
use crate::local::FileSetSpec;
use crate::local::LocalFileDependency;
use crate::transform::TransformedArtifactSet;

/// How much of a collection the listener needs. `NoContents` lets a node skip
/// scheduling any I/O; `Spec` asks for the declarative file set shape in
/// addition to the artifacts.
#[derive(Copy, Clone, Dupe, Debug, Eq, PartialEq)]
pub enum VisitDetail {
    NoContents,
    Spec,
    Full,
}

/// Identifies the collection a visit event belongs to.
#[derive(Clone, Dupe)]
pub enum CollectionSource {
    LocalFiles(Arc<LocalFileDependency>),
    Transformed(Arc<TransformedArtifactSet>),
    Other,
}

impl fmt::Display for CollectionSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CollectionSource::LocalFiles(dependency) => fmt::Display::fmt(dependency, f),
            CollectionSource::Transformed(set) => {
                write!(f, "transformed {}", set.variant_name())
            }
            CollectionSource::Other => write!(f, "other"),
        }
    }
}

/// Receives schedule-phase notifications. `artifact_available` may be invoked
/// from whatever thread makes the artifact available.
pub trait AsyncArtifactListener: Send {
    /// Called before a collection's contents are scheduled, to learn the
    /// required level of detail.
    fn prepare_for_visit(&mut self, source: &CollectionSource) -> VisitDetail;

    /// Called as each artifact becomes available during the schedule phase.
    fn artifact_available(&mut self, artifact: &ResolvedArtifact);
}

/// Receives artifacts during the completion phase, always in declaration
/// order.
pub trait ArtifactVisitor: Send {
    fn visit_artifact(
        &mut self,
        variant_name: &DisplayName,
        attributes: &AttributeSet,
        artifact: &ResolvedArtifact,
    );

    /// A deferred failure, surfaced at the position in the artifact stream
    /// where the failed subtree or artifact would have been reported.
    fn visit_failure(&mut self, error: &SharedError);

    fn end_visit_collection(&mut self, source: &CollectionSource);

    /// Only called when the listener asked for [`VisitDetail::Spec`], after
    /// the collection's artifacts have been delivered.
    fn visit_spec(&mut self, spec: &FileSetSpec) {
        let _ = spec;
    }
}

/// Externally supplied executor for asynchronous work items. No guarantee is
/// made about the order in which enqueued work completes; ordering of
/// artifact delivery is reconstructed during the completion phase.
pub trait WorkQueue: Send + Sync {
    fn enqueue(&self, work: BoxFuture<'static, ()>);
}
