/*
 * Copyright (c) Meta Platforms, Inc. and affiliates.
 *
 * This source code is licensed under both the MIT license found in the
 * LICENSE-MIT file in the root directory of this source tree and the Apache
 * License, Version 2.0 found in the LICENSE-APACHE file in the root directory
 * of this source tree.
 */

//! Applies a transformation to the artifacts of a source set, memoizing the
//! per-artifact outcome for the duration of one visitation.

use std::sync::Arc;

use anyhow::Context;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use dupe::Dupe;
use futures::future::BoxFuture;
use futures::future::Shared;
use futures::FutureExt;
use girder_core::attributes::AttributeSet;
use girder_core::display::DisplayName;
use girder_core::fs::paths::AbsPath;
use girder_core::fs::paths::AbsPathBuf;
use girder_core::result::SharedError;
use girder_core::result::SharedResult;
use girder_core::result::SharedResultExt;
use thiserror::Error;
use tokio::sync::oneshot;

use crate::artifact::ResolvedArtifact;
use crate::completion::Completion;
use crate::identifier::ArtifactIdentifier;
use crate::set::ResolvedArtifactSet;
use crate::visitor::ArtifactVisitor;
use crate::visitor::AsyncArtifactListener;
use crate::visitor::CollectionSource;
use crate::visitor::VisitDetail;
use crate::visitor::WorkQueue;

/// One step of a transformation chain: a pure function from one input file to
/// zero or more output files. Implementations are stateless and shared across
/// many visits.
pub trait TransformStep: Send + Sync {
    /// Stable identity of this step, used to derive output artifact
    /// identities.
    fn id(&self) -> &str;

    fn transform(&self, input: &AbsPath) -> anyhow::Result<Vec<AbsPathBuf>>;
}

/// An ordered chain of [`TransformStep`]s. Each step runs over every output
/// of the previous one; producing no outputs (filtering) or several
/// (expansion) are both valid outcomes.
pub struct Transformation {
    steps: Vec<Arc<dyn TransformStep>>,
    chain_id: String,
}

impl Transformation {
    pub fn new(steps: Vec<Arc<dyn TransformStep>>) -> Transformation {
        assert!(!steps.is_empty(), "a transformation must have at least one step");
        let chain_id = steps
            .iter()
            .map(|step| step.id())
            .collect::<Vec<_>>()
            .join("/");
        Transformation { steps, chain_id }
    }

    /// Identity of the whole chain.
    pub fn chain_id(&self) -> &str {
        &self.chain_id
    }

    fn apply(&self, input: &AbsPath) -> anyhow::Result<Vec<AbsPathBuf>> {
        let mut current = vec![input.to_buf()];
        for step in &self.steps {
            let mut next = Vec::new();
            for file in &current {
                let outputs = step
                    .transform(file)
                    .with_context(|| format!("Transform step `{}` failed", step.id()))?;
                next.extend(outputs);
            }
            current = next;
        }
        Ok(current)
    }
}

/// The successful outputs of transforming one source artifact, in the order
/// the transformation produced them.
#[derive(Clone, Dupe)]
pub struct TransformOutputs(Arc<Vec<ResolvedArtifact>>);

impl TransformOutputs {
    pub fn artifacts(&self) -> &[ResolvedArtifact] {
        &self.0
    }
}

/// The memoized outcome of applying a transformation to one source artifact.
pub type TransformationResult = SharedResult<TransformOutputs>;

type PendingResult = Shared<BoxFuture<'static, TransformationResult>>;

#[derive(Error, Debug)]
enum TransformError {
    #[error("transform work item was dropped before producing a result")]
    Abandoned,
}

/// Per-source-artifact transformation outcomes for one visitation of one
/// transformed node. Never outlives that visitation and never shared across
/// resolution runs.
///
/// The map is the only state shared across concurrent work items: entries are
/// inserted at most once per identifier, and the in-flight result is a shared
/// future so every caller observes the single execution.
pub struct TransformationResults {
    results: DashMap<ArtifactIdentifier, PendingResult>,
}

impl TransformationResults {
    pub fn new() -> TransformationResults {
        TransformationResults {
            results: DashMap::new(),
        }
    }

    /// Schedules the transformation of `artifact` onto `queue`, unless a
    /// result for its identifier has already been scheduled.
    fn schedule(
        &self,
        queue: &dyn WorkQueue,
        transformation: &Arc<Transformation>,
        artifact: &ResolvedArtifact,
    ) {
        match self.results.entry(artifact.id().dupe()) {
            Entry::Occupied(..) => {}
            Entry::Vacant(entry) => {
                let (sender, receiver) = oneshot::channel();
                let transformation = transformation.dupe();
                let artifact = artifact.dupe();
                queue.enqueue(
                    async move {
                        let _ = sender.send(execute_transformation(&transformation, &artifact));
                    }
                    .boxed(),
                );
                let pending = receiver
                    .map(|result| match result {
                        Ok(result) => result,
                        Err(..) => Err(SharedError::new(TransformError::Abandoned.into())),
                    })
                    .boxed()
                    .shared();
                entry.insert(pending);
            }
        }
    }

    /// The in-flight or finished result for `id`. Requesting an identifier
    /// that was never scheduled is a protocol violation by the caller.
    fn result_for(&self, id: &ArtifactIdentifier) -> PendingResult {
        match self.results.get(id) {
            Some(pending) => pending.clone(),
            None => panic!("no transform was scheduled for `{}`", id),
        }
    }
}

#[tracing::instrument(skip_all, fields(artifact = %artifact.id()))]
fn execute_transformation(
    transformation: &Transformation,
    artifact: &ResolvedArtifact,
) -> TransformationResult {
    let outputs = transformation
        .apply(artifact.file())
        .with_context(|| format!("Failed to transform artifact `{}`", artifact.id()))
        .shared_error()?;
    tracing::debug!(outputs = outputs.len(), "transformation finished");
    let outputs = outputs
        .into_iter()
        .map(|file| {
            let output_name = match file.file_name() {
                Some(name) => name.to_owned(),
                None => file.to_string(),
            };
            let id = ArtifactIdentifier::transformed(
                artifact.id(),
                transformation.chain_id(),
                &output_name,
            );
            ResolvedArtifact::new(id, file)
        })
        .collect();
    Ok(TransformOutputs(Arc::new(outputs)))
}

/// Wraps a source set behind a transformation. Materializing it materializes
/// the source, then applies the transformation once per source artifact.
pub struct TransformedArtifactSet {
    source: ResolvedArtifactSet,
    variant_name: DisplayName,
    target_attributes: AttributeSet,
    transformation: Arc<Transformation>,
}

impl TransformedArtifactSet {
    pub fn new(
        source: ResolvedArtifactSet,
        variant_name: DisplayName,
        target_attributes: AttributeSet,
        transformation: Arc<Transformation>,
    ) -> TransformedArtifactSet {
        TransformedArtifactSet {
            source,
            variant_name,
            target_attributes,
            transformation,
        }
    }

    pub fn variant_name(&self) -> &DisplayName {
        &self.variant_name
    }

    pub fn target_attributes(&self) -> &AttributeSet {
        &self.target_attributes
    }

    pub(crate) fn start_visit(
        this: &Arc<TransformedArtifactSet>,
        queue: &dyn WorkQueue,
        listener: &mut dyn AsyncArtifactListener,
    ) -> Completion {
        let collection = CollectionSource::Transformed(this.dupe());
        if listener.prepare_for_visit(&collection) == VisitDetail::NoContents {
            return Completion::EndCollection(collection);
        }
        // Result cache for this visitation only.
        let results = Arc::new(TransformationResults::new());
        let mut transforming = TransformingAsyncArtifactListener {
            queue,
            transformation: &this.transformation,
            results: &results,
        };
        let inner = this.source.start_visit(queue, &mut transforming);
        Completion::Transformed(TransformedCompletion {
            inner: Box::new(inner),
            variant_name: this.variant_name.dupe(),
            target_attributes: this.target_attributes.dupe(),
            results,
            collection,
        })
    }
}

/// Listener wrapped around a transformed node's source visitation: as each
/// source artifact becomes available, looks up or schedules its
/// transformation outcome.
struct TransformingAsyncArtifactListener<'a> {
    queue: &'a dyn WorkQueue,
    transformation: &'a Arc<Transformation>,
    results: &'a Arc<TransformationResults>,
}

impl AsyncArtifactListener for TransformingAsyncArtifactListener<'_> {
    fn prepare_for_visit(&mut self, _source: &CollectionSource) -> VisitDetail {
        // Transforming always needs the source contents.
        VisitDetail::Full
    }

    fn artifact_available(&mut self, artifact: &ResolvedArtifact) {
        self.results.schedule(self.queue, self.transformation, artifact);
    }
}

/// Completion of a transformed node: replays the source completion to learn
/// the declared artifact order, then delivers each source artifact's
/// transform outcome in that order.
pub struct TransformedCompletion {
    inner: Box<Completion>,
    variant_name: DisplayName,
    target_attributes: AttributeSet,
    results: Arc<TransformationResults>,
    collection: CollectionSource,
}

impl TransformedCompletion {
    pub(crate) async fn visit(self, visitor: &mut dyn ArtifactVisitor) {
        let mut sources = SourceCollector { entries: Vec::new() };
        self.inner.visit(&mut sources).await;
        for entry in sources.entries {
            match entry {
                SourceEntry::Artifact(artifact) => {
                    match self.results.result_for(artifact.id()).await {
                        Ok(outputs) => {
                            for output in outputs.artifacts() {
                                visitor.visit_artifact(
                                    &self.variant_name,
                                    &self.target_attributes,
                                    output,
                                );
                            }
                        }
                        Err(error) => visitor.visit_failure(&error),
                    }
                }
                SourceEntry::Failure(error) => visitor.visit_failure(&error),
            }
        }
        visitor.end_visit_collection(&self.collection);
    }
}

enum SourceEntry {
    Artifact(ResolvedArtifact),
    Failure(SharedError),
}

struct SourceCollector {
    entries: Vec<SourceEntry>,
}

impl ArtifactVisitor for SourceCollector {
    fn visit_artifact(
        &mut self,
        _variant_name: &DisplayName,
        _attributes: &AttributeSet,
        artifact: &ResolvedArtifact,
    ) {
        self.entries.push(SourceEntry::Artifact(artifact.dupe()));
    }

    fn visit_failure(&mut self, error: &SharedError) {
        self.entries.push(SourceEntry::Failure(error.dupe()));
    }

    fn end_visit_collection(&mut self, _source: &CollectionSource) {}
}
