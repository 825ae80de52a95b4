/*
 * Copyright (c) Meta Platforms, Inc. and affiliates.
 *
 * This source code is licensed under both the MIT license found in the
 * LICENSE-MIT file in the root directory of this source tree and the Apache
 * License, Version 2.0 found in the LICENSE-APACHE file in the root directory
 * of this source tree.
 */

//! The tree of resolved artifact sets.
//!
//! Constructing a set never performs I/O or runs a transformation; only
//! visiting does. Every node supports the same two-phase protocol: a schedule
//! phase ([`ResolvedArtifactSet::start_visit`]) that may enqueue asynchronous
//! work and returns promptly, and a completion phase (driving the returned
//! [`Completion`]) that blocks on outstanding work and delivers artifacts in
//! declaration order.

use std::sync::Arc;

use dupe::Dupe;
use girder_core::attributes::AttributeSet;
use girder_core::display::DisplayName;
use girder_core::result::SharedError;

use crate::artifact::ResolvedArtifact;
use crate::completion::Completion;
use crate::local::BuildDependencyVisitor;
use crate::local::LocalFileDependency;
use crate::local::LocalFileDependencyArtifacts;
use crate::transform::TransformedArtifactSet;
use crate::visitor::AsyncArtifactListener;
use crate::visitor::WorkQueue;

/// A set of artifacts, possibly not yet materialized. One node kind per way a
/// set can come into existence; the kind set is closed so both phases of the
/// protocol are matched exhaustively.
#[derive(Clone, Dupe)]
pub enum ResolvedArtifactSet {
    Empty,
    /// One concrete file plus its identifier and attributes.
    Leaf(Arc<LeafArtifactSet>),
    /// An ordered sequence of child sets. Order is preserved end to end;
    /// later-declared dependencies must not reorder earlier ones.
    Composite(Arc<[ResolvedArtifactSet]>),
    /// A failure captured at construction time. Visiting it surfaces the
    /// failure without touching sibling nodes.
    Broken(SharedError),
    /// A source set whose artifacts are passed through a transformation when
    /// materialized.
    Transformed(Arc<TransformedArtifactSet>),
    /// A file-backed dependency declaration, resolved to per-file variants on
    /// every visit.
    LocalFiles(Arc<LocalFileDependencyArtifacts>),
}

impl ResolvedArtifactSet {
    pub fn leaf(
        variant_name: DisplayName,
        attributes: AttributeSet,
        artifact: ResolvedArtifact,
        dependency: Option<Arc<LocalFileDependency>>,
    ) -> ResolvedArtifactSet {
        ResolvedArtifactSet::Leaf(Arc::new(LeafArtifactSet {
            variant_name,
            attributes,
            artifact,
            dependency,
        }))
    }

    /// Composes `sets` into one ordered set, flattening the trivial cases:
    /// empty members disappear, a sole member is returned unchanged.
    pub fn of(sets: Vec<ResolvedArtifactSet>) -> ResolvedArtifactSet {
        let mut sets: Vec<_> = sets
            .into_iter()
            .filter(|set| !matches!(set, ResolvedArtifactSet::Empty))
            .collect();
        match sets.len() {
            0 => ResolvedArtifactSet::Empty,
            1 => sets.pop().unwrap(),
            _ => ResolvedArtifactSet::Composite(sets.into()),
        }
    }

    pub fn broken(error: anyhow::Error) -> ResolvedArtifactSet {
        ResolvedArtifactSet::Broken(SharedError::new(error))
    }

    /// Schedule phase. May enqueue asynchronous work onto `queue` and returns
    /// promptly with the token for the completion phase.
    pub fn start_visit(
        &self,
        queue: &dyn WorkQueue,
        listener: &mut dyn AsyncArtifactListener,
    ) -> Completion {
        match self {
            ResolvedArtifactSet::Empty => Completion::Empty,
            ResolvedArtifactSet::Leaf(leaf) => leaf.start_visit(listener),
            ResolvedArtifactSet::Composite(children) => Completion::Composite(
                // Schedule every child in declared order; no child's failure
                // blocks another child's scheduling.
                children
                    .iter()
                    .map(|child| child.start_visit(queue, listener))
                    .collect(),
            ),
            ResolvedArtifactSet::Broken(error) => Completion::Broken(error.dupe()),
            ResolvedArtifactSet::Transformed(set) => {
                TransformedArtifactSet::start_visit(set, queue, listener)
            }
            ResolvedArtifactSet::LocalFiles(set) => set.start_visit(queue, listener),
        }
    }

    /// Hands the build-dependency graphs reachable from this set to `visitor`,
    /// for task ordering. File-backed sets contribute their provider's graph
    /// without evaluating any files.
    pub fn visit_build_dependencies(&self, visitor: &mut dyn BuildDependencyVisitor) {
        match self {
            ResolvedArtifactSet::Empty | ResolvedArtifactSet::Broken(_) => {}
            ResolvedArtifactSet::Leaf(leaf) => leaf.visit_build_dependencies(visitor),
            ResolvedArtifactSet::Composite(children) => {
                for child in children.iter() {
                    child.visit_build_dependencies(visitor);
                }
            }
            ResolvedArtifactSet::LocalFiles(set) => {
                visitor.add(set.dependency().files().build_dependencies());
            }
            ResolvedArtifactSet::Transformed(_) => {
                panic!("build dependencies must be collected before transformation wrapping")
            }
        }
    }
}

/// Leaf node: a single pre-resolved artifact.
pub struct LeafArtifactSet {
    variant_name: DisplayName,
    attributes: AttributeSet,
    artifact: ResolvedArtifact,
    dependency: Option<Arc<LocalFileDependency>>,
}

impl LeafArtifactSet {
    fn start_visit(&self, listener: &mut dyn AsyncArtifactListener) -> Completion {
        listener.artifact_available(&self.artifact);
        Completion::Artifact {
            variant_name: self.variant_name.dupe(),
            attributes: self.attributes.dupe(),
            artifact: self.artifact.dupe(),
        }
    }

    fn visit_build_dependencies(&self, visitor: &mut dyn BuildDependencyVisitor) {
        if let Some(dependency) = &self.dependency {
            visitor.add(dependency.files().build_dependencies());
        }
    }

    pub fn artifact(&self) -> &ResolvedArtifact {
        &self.artifact
    }

    pub fn attributes(&self) -> &AttributeSet {
        &self.attributes
    }

    /// Whether producing this artifact requires build work to run first.
    pub fn is_buildable(&self) -> bool {
        self.dependency
            .as_ref()
            .map_or(false, |dependency| !dependency.files().build_dependencies().is_empty())
    }
}
