/*
 * Copyright (c) Meta Platforms, Inc. and affiliates.
 *
 * This source code is licensed under both the MIT license found in the
 * LICENSE-MIT file in the root directory of this source tree and the Apache
 * License, Version 2.0 found in the LICENSE-APACHE file in the root directory
 * of this source tree.
 */

//! Test doubles for the consumed interfaces: work queues with controllable
//! execution order, recording listeners/visitors and canned file set
//! providers, selectors and transform steps.

use std::path::PathBuf;
use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::sync::Mutex;

use dupe::Dupe;
use futures::future::BoxFuture;
use girder_core::attributes::AttributeKey;
use girder_core::attributes::AttributeSet;
use girder_core::component::ComponentId;
use girder_core::display::DisplayName;
use girder_core::fs::paths::AbsPath;
use girder_core::fs::paths::AbsPathBuf;
use girder_core::result::SharedError;

use crate::artifact::ResolvedArtifact;
use crate::identifier::ArtifactIdentifier;
use crate::local::BuildDependencyGraph;
use crate::local::FileSetProvider;
use crate::local::FileSetSpec;
use crate::local::LocalFileDependency;
use crate::local::NoBuildDependencies;
use crate::local::TransformFactory;
use crate::local::VariantSelector;
use crate::set::ResolvedArtifactSet;
use crate::transform::TransformStep;
use crate::transform::Transformation;
use crate::transform::TransformedArtifactSet;
use crate::variant::ResolvedVariantSet;
use crate::visitor::ArtifactVisitor;
use crate::visitor::AsyncArtifactListener;
use crate::visitor::CollectionSource;
use crate::visitor::VisitDetail;
use crate::visitor::WorkQueue;

/// Queue that holds on to enqueued work until the test decides to run it,
/// in whichever order the test wants.
pub(crate) struct DeferredQueue {
    work: Mutex<Vec<BoxFuture<'static, ()>>>,
}

impl DeferredQueue {
    pub(crate) fn new() -> DeferredQueue {
        DeferredQueue {
            work: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn pending(&self) -> usize {
        self.work.lock().unwrap().len()
    }

    pub(crate) fn run_all(&self) {
        for work in self.work.lock().unwrap().drain(..) {
            futures::executor::block_on(work);
        }
    }

    pub(crate) fn run_all_reversed(&self) {
        for work in self.work.lock().unwrap().drain(..).rev() {
            futures::executor::block_on(work);
        }
    }
}

impl WorkQueue for DeferredQueue {
    fn enqueue(&self, work: BoxFuture<'static, ()>) {
        self.work.lock().unwrap().push(work);
    }
}

/// Queue that runs each work item on the enqueuing thread, immediately.
pub(crate) struct EagerQueue;

impl WorkQueue for EagerQueue {
    fn enqueue(&self, work: BoxFuture<'static, ()>) {
        futures::executor::block_on(work);
    }
}

/// Queue backed by the ambient tokio runtime.
pub(crate) struct TokioQueue;

impl WorkQueue for TokioQueue {
    fn enqueue(&self, work: BoxFuture<'static, ()>) {
        tokio::spawn(work);
    }
}

/// Listener answering every `prepare_for_visit` with a fixed detail level and
/// recording the artifacts announced during the schedule phase.
pub(crate) struct RecordingListener {
    detail: VisitDetail,
    available: Vec<ResolvedArtifact>,
}

impl RecordingListener {
    pub(crate) fn new(detail: VisitDetail) -> RecordingListener {
        RecordingListener {
            detail,
            available: Vec::new(),
        }
    }

    pub(crate) fn available_files(&self) -> Vec<String> {
        self.available
            .iter()
            .map(|artifact| artifact.file().to_string())
            .collect()
    }
}

impl AsyncArtifactListener for RecordingListener {
    fn prepare_for_visit(&mut self, _source: &CollectionSource) -> VisitDetail {
        self.detail
    }

    fn artifact_available(&mut self, artifact: &ResolvedArtifact) {
        self.available.push(artifact.dupe());
    }
}

pub(crate) enum VisitEvent {
    Artifact {
        attributes: String,
        file: String,
        id: ArtifactIdentifier,
    },
    Failure(String),
    EndCollection,
    Spec(String),
}

/// Visitor recording every completion-phase event in order.
pub(crate) struct CollectingVisitor {
    events: Vec<VisitEvent>,
}

impl CollectingVisitor {
    pub(crate) fn new() -> CollectingVisitor {
        CollectingVisitor { events: Vec::new() }
    }

    pub(crate) fn artifact_files(&self) -> Vec<String> {
        self.events
            .iter()
            .filter_map(|event| match event {
                VisitEvent::Artifact { file, .. } => Some(file.clone()),
                _ => None,
            })
            .collect()
    }

    pub(crate) fn artifact_attributes(&self) -> Vec<String> {
        self.events
            .iter()
            .filter_map(|event| match event {
                VisitEvent::Artifact { attributes, .. } => Some(attributes.clone()),
                _ => None,
            })
            .collect()
    }

    pub(crate) fn artifact_ids(&self) -> Vec<ArtifactIdentifier> {
        self.events
            .iter()
            .filter_map(|event| match event {
                VisitEvent::Artifact { id, .. } => Some(id.dupe()),
                _ => None,
            })
            .collect()
    }

    pub(crate) fn failures(&self) -> Vec<String> {
        self.events
            .iter()
            .filter_map(|event| match event {
                VisitEvent::Failure(message) => Some(message.clone()),
                _ => None,
            })
            .collect()
    }

    pub(crate) fn specs(&self) -> Vec<String> {
        self.events
            .iter()
            .filter_map(|event| match event {
                VisitEvent::Spec(name) => Some(name.clone()),
                _ => None,
            })
            .collect()
    }

    pub(crate) fn collections_ended(&self) -> usize {
        self.events
            .iter()
            .filter(|event| matches!(event, VisitEvent::EndCollection))
            .count()
    }

    /// Artifact and failure events, in delivery order.
    pub(crate) fn event_kinds_with_files(&self) -> Vec<String> {
        self.events
            .iter()
            .filter_map(|event| match event {
                VisitEvent::Artifact { file, .. } => Some(format!("artifact {}", file)),
                VisitEvent::Failure(..) => Some("failure".to_owned()),
                _ => None,
            })
            .collect()
    }

    pub(crate) fn spec_seen_after_artifacts(&self) -> bool {
        let last_artifact = self
            .events
            .iter()
            .rposition(|event| matches!(event, VisitEvent::Artifact { .. }));
        let first_spec = self
            .events
            .iter()
            .position(|event| matches!(event, VisitEvent::Spec(..)));
        match (last_artifact, first_spec) {
            (Some(artifact), Some(spec)) => spec > artifact,
            _ => false,
        }
    }
}

impl ArtifactVisitor for CollectingVisitor {
    fn visit_artifact(
        &mut self,
        _variant_name: &DisplayName,
        attributes: &AttributeSet,
        artifact: &ResolvedArtifact,
    ) {
        self.events.push(VisitEvent::Artifact {
            attributes: attributes.to_string(),
            file: artifact.file().to_string(),
            id: artifact.id().dupe(),
        });
    }

    fn visit_failure(&mut self, error: &SharedError) {
        self.events.push(VisitEvent::Failure(error.to_string()));
    }

    fn end_visit_collection(&mut self, _source: &CollectionSource) {
        self.events.push(VisitEvent::EndCollection);
    }

    fn visit_spec(&mut self, spec: &FileSetSpec) {
        self.events.push(VisitEvent::Spec(spec.to_string()));
    }
}

/// Step appending a suffix to the input path.
pub(crate) struct SuffixStep {
    suffix: String,
}

impl SuffixStep {
    pub(crate) fn new(suffix: &str) -> SuffixStep {
        SuffixStep {
            suffix: suffix.to_owned(),
        }
    }
}

impl TransformStep for SuffixStep {
    fn id(&self) -> &str {
        &self.suffix
    }

    fn transform(&self, input: &AbsPath) -> anyhow::Result<Vec<AbsPathBuf>> {
        Ok(vec![AbsPathBuf::unchecked_new(PathBuf::from(format!(
            "{}.{}",
            input, self.suffix
        )))])
    }
}

/// Step counting how often it actually ran.
pub(crate) struct CountingStep {
    id: String,
    executions: AtomicUsize,
}

impl CountingStep {
    pub(crate) fn new(id: &str) -> CountingStep {
        CountingStep {
            id: id.to_owned(),
            executions: AtomicUsize::new(0),
        }
    }

    pub(crate) fn executions(&self) -> usize {
        self.executions.load(Ordering::SeqCst)
    }
}

impl TransformStep for CountingStep {
    fn id(&self) -> &str {
        &self.id
    }

    fn transform(&self, input: &AbsPath) -> anyhow::Result<Vec<AbsPathBuf>> {
        self.executions.fetch_add(1, Ordering::SeqCst);
        Ok(vec![AbsPathBuf::unchecked_new(PathBuf::from(format!(
            "{}.{}",
            input, self.id
        )))])
    }
}

pub(crate) struct FailingStep {
    id: String,
}

impl FailingStep {
    pub(crate) fn new(id: &str) -> FailingStep {
        FailingStep { id: id.to_owned() }
    }
}

impl TransformStep for FailingStep {
    fn id(&self) -> &str {
        &self.id
    }

    fn transform(&self, _input: &AbsPath) -> anyhow::Result<Vec<AbsPathBuf>> {
        Err(anyhow::anyhow!("step refused the input"))
    }
}

struct SomeBuildDependencies;

impl BuildDependencyGraph for SomeBuildDependencies {
    fn is_empty(&self) -> bool {
        false
    }
}

/// Provider returning a fixed list of files.
pub(crate) struct StaticFilesProvider {
    name: String,
    files: Vec<AbsPathBuf>,
    buildable: bool,
}

impl StaticFilesProvider {
    pub(crate) fn new(name: &str, files: &[&str]) -> StaticFilesProvider {
        StaticFilesProvider {
            name: name.to_owned(),
            files: files
                .iter()
                .map(|file| AbsPathBuf::unchecked_new(PathBuf::from(file)))
                .collect(),
            buildable: false,
        }
    }
}

impl FileSetProvider for StaticFilesProvider {
    fn display_name(&self) -> &str {
        &self.name
    }

    fn files(&self) -> anyhow::Result<Vec<AbsPathBuf>> {
        Ok(self.files.clone())
    }

    fn build_dependencies(&self) -> Arc<dyn BuildDependencyGraph> {
        if self.buildable {
            Arc::new(SomeBuildDependencies)
        } else {
            Arc::new(NoBuildDependencies)
        }
    }
}

/// Provider counting how often its file set was evaluated.
pub(crate) struct CountingFilesProvider {
    inner: StaticFilesProvider,
    evaluations: AtomicUsize,
}

impl CountingFilesProvider {
    pub(crate) fn new(name: &str, files: &[&str]) -> CountingFilesProvider {
        CountingFilesProvider {
            inner: StaticFilesProvider::new(name, files),
            evaluations: AtomicUsize::new(0),
        }
    }

    pub(crate) fn evaluations(&self) -> usize {
        self.evaluations.load(Ordering::SeqCst)
    }
}

impl FileSetProvider for CountingFilesProvider {
    fn display_name(&self) -> &str {
        self.inner.display_name()
    }

    fn files(&self) -> anyhow::Result<Vec<AbsPathBuf>> {
        self.evaluations.fetch_add(1, Ordering::SeqCst);
        self.inner.files()
    }

    fn build_dependencies(&self) -> Arc<dyn BuildDependencyGraph> {
        self.inner.build_dependencies()
    }
}

pub(crate) struct FailingFilesProvider {
    name: String,
    message: String,
}

impl FailingFilesProvider {
    pub(crate) fn new(name: &str, message: &str) -> FailingFilesProvider {
        FailingFilesProvider {
            name: name.to_owned(),
            message: message.to_owned(),
        }
    }
}

impl FileSetProvider for FailingFilesProvider {
    fn display_name(&self) -> &str {
        &self.name
    }

    fn files(&self) -> anyhow::Result<Vec<AbsPathBuf>> {
        Err(anyhow::anyhow!("{}", self.message))
    }

    fn build_dependencies(&self) -> Arc<dyn BuildDependencyGraph> {
        Arc::new(NoBuildDependencies)
    }
}

pub(crate) fn local_file_dependency(
    name: &str,
    component: Option<&str>,
    files: &[&str],
) -> LocalFileDependency {
    LocalFileDependency::new(
        DisplayName::of(name),
        component.map(ComponentId::new),
        AttributeSet::empty(),
        Arc::new(StaticFilesProvider::new(name, files)),
    )
}

pub(crate) fn buildable_local_file_dependency(name: &str, files: &[&str]) -> LocalFileDependency {
    let mut provider = StaticFilesProvider::new(name, files);
    provider.buildable = true;
    LocalFileDependency::new(
        DisplayName::of(name),
        None,
        AttributeSet::empty(),
        Arc::new(provider),
    )
}

/// Selector accepting the sole candidate variant unchanged.
pub(crate) struct PassthroughSelector;

impl VariantSelector for PassthroughSelector {
    fn select(
        &self,
        candidates: &ResolvedVariantSet,
        _factory: &dyn TransformFactory,
    ) -> ResolvedArtifactSet {
        candidates.variants()[0].artifacts().dupe()
    }
}

/// Selector wrapping the sole candidate behind a transformation.
pub(crate) struct TransformingSelector {
    target_attributes: AttributeSet,
    transformation: Arc<Transformation>,
}

impl TransformingSelector {
    pub(crate) fn new(
        target_attributes: AttributeSet,
        transformation: Arc<Transformation>,
    ) -> TransformingSelector {
        TransformingSelector {
            target_attributes,
            transformation,
        }
    }
}

impl VariantSelector for TransformingSelector {
    fn select(
        &self,
        candidates: &ResolvedVariantSet,
        factory: &dyn TransformFactory,
    ) -> ResolvedArtifactSet {
        factory.as_transformed(
            &candidates.variants()[0],
            self.target_attributes.dupe(),
            self.transformation.dupe(),
        )
    }
}

/// Registry inferring a `type` attribute from the file extension.
pub(crate) struct ExtensionRegistry;

impl crate::local::ArtifactTypeRegistry for ExtensionRegistry {
    fn map_attributes_for(&self, file: &AbsPath) -> AttributeSet {
        match file.as_path().extension().and_then(|extension| extension.to_str()) {
            Some(extension) => [(AttributeKey::new("type"), extension.to_owned())]
                .into_iter()
                .collect(),
            None => AttributeSet::empty(),
        }
    }
}

/// Wraps `source` behind `transformation` with empty target attributes.
pub(crate) fn transformed(
    source: ResolvedArtifactSet,
    transformation: Arc<Transformation>,
) -> ResolvedArtifactSet {
    ResolvedArtifactSet::Transformed(Arc::new(TransformedArtifactSet::new(
        source,
        DisplayName::of("local file"),
        AttributeSet::empty(),
        transformation,
    )))
}
