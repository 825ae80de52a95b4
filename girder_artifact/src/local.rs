/*
 * Copyright (c) Meta Platforms, Inc. and affiliates.
 *
 * This source code is licensed under both the MIT license found in the
 * LICENSE-MIT file in the root directory of this source tree and the Apache
 * License, Version 2.0 found in the LICENSE-APACHE file in the root directory
 * of this source tree.
 */

//! Resolution of file-backed dependency declarations.
//!
//! A local file dependency exposes a named set of files produced by build
//! work. Resolving it means evaluating that file set, wrapping every file
//! into a synthetic singleton variant, and handing each variant to the
//! external selection policy. Evaluation happens once per visitation, not
//! once per declaration, because the backing file set may be produced by
//! still-running build work.

use std::fmt;
use std::sync::Arc;

use dupe::Dupe;
use girder_core::attributes::AttributeSet;
use girder_core::attributes::EmptySchema;
use girder_core::component::ComponentId;
use girder_core::display::DisplayName;
use girder_core::fs::paths::AbsPath;
use girder_core::fs::paths::AbsPathBuf;
use girder_core::result::SharedError;
use once_cell::sync::Lazy;

use crate::artifact::ResolvedArtifact;
use crate::completion::Completion;
use crate::identifier::ArtifactIdentifier;
use crate::set::ResolvedArtifactSet;
use crate::transform::Transformation;
use crate::transform::TransformedArtifactSet;
use crate::variant::ResolvedVariant;
use crate::variant::ResolvedVariantSet;
use crate::variant::VariantSource;
use crate::visitor::AsyncArtifactListener;
use crate::visitor::CollectionSource;
use crate::visitor::VisitDetail;
use crate::visitor::WorkQueue;

static LOCAL_FILE: Lazy<DisplayName> = Lazy::new(|| DisplayName::of("local file"));

/// A file-backed dependency declaration: a named set of files, the build work
/// producing them, the component owning them (if any), and any attributes
/// declared on the dependency itself.
pub struct LocalFileDependency {
    display_name: DisplayName,
    component: Option<ComponentId>,
    attributes: AttributeSet,
    files: Arc<dyn FileSetProvider>,
}

impl LocalFileDependency {
    pub fn new(
        display_name: DisplayName,
        component: Option<ComponentId>,
        attributes: AttributeSet,
        files: Arc<dyn FileSetProvider>,
    ) -> LocalFileDependency {
        LocalFileDependency {
            display_name,
            component,
            attributes,
            files,
        }
    }

    pub fn component(&self) -> Option<&ComponentId> {
        self.component.as_ref()
    }

    pub fn attributes(&self) -> &AttributeSet {
        &self.attributes
    }

    pub fn files(&self) -> &Arc<dyn FileSetProvider> {
        &self.files
    }
}

impl fmt::Display for LocalFileDependency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.display_name, f)
    }
}

/// Supplies the concrete files behind a local file dependency. Evaluation may
/// block on external producers and may fail; the build dependency graph is
/// only handed through for task ordering, never evaluated here.
pub trait FileSetProvider: Send + Sync {
    fn display_name(&self) -> &str;

    fn files(&self) -> anyhow::Result<Vec<AbsPathBuf>>;

    fn build_dependencies(&self) -> Arc<dyn BuildDependencyGraph>;
}

/// Opaque handle on the build work a file set depends on.
pub trait BuildDependencyGraph: Send + Sync {
    fn is_empty(&self) -> bool;
}

/// A file set with no producers.
pub struct NoBuildDependencies;

impl BuildDependencyGraph for NoBuildDependencies {
    fn is_empty(&self) -> bool {
        true
    }
}

/// Receives build dependency graphs during [`ResolvedArtifactSet::visit_build_dependencies`].
pub trait BuildDependencyVisitor {
    fn add(&mut self, graph: Arc<dyn BuildDependencyGraph>);
}

/// The declarative shape of a file set, reported to visitors that asked for
/// [`VisitDetail::Spec`].
#[derive(Clone, Dupe)]
pub struct FileSetSpec(Arc<dyn FileSetProvider>);

impl FileSetSpec {
    pub fn provider(&self) -> &Arc<dyn FileSetProvider> {
        &self.0
    }
}

impl fmt::Display for FileSetSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0.display_name())
    }
}

/// Predicate restricting which components' artifacts take part in a
/// resolution.
pub trait ComponentFilter: Send + Sync {
    fn accept(&self, component: &ComponentId) -> bool;
}

impl<F> ComponentFilter for F
where
    F: Fn(&ComponentId) -> bool + Send + Sync,
{
    fn accept(&self, component: &ComponentId) -> bool {
        self(component)
    }
}

/// Maps a file to the attributes inferred from its type (typically the
/// extension). A total function: never fails.
pub trait ArtifactTypeRegistry: Send + Sync {
    fn map_attributes_for(&self, file: &AbsPath) -> AttributeSet;
}

/// External policy that picks among candidate variants, either accepting one
/// as-is or asking for it to be wrapped behind a transformation via the
/// factory capability.
pub trait VariantSelector: Send + Sync {
    fn select(
        &self,
        candidates: &ResolvedVariantSet,
        factory: &dyn TransformFactory,
    ) -> ResolvedArtifactSet;
}

/// Capability this crate hands to the selector for wrapping a variant behind
/// a transformation.
pub trait TransformFactory {
    fn as_transformed(
        &self,
        variant: &ResolvedVariant,
        target_attributes: AttributeSet,
        transformation: Arc<Transformation>,
    ) -> ResolvedArtifactSet;
}

/// Artifact set backed by a local file dependency. The file set is evaluated
/// during the schedule phase of every visitation.
pub struct LocalFileDependencyArtifacts {
    dependency: Arc<LocalFileDependency>,
    component_filter: Arc<dyn ComponentFilter>,
    selector: Arc<dyn VariantSelector>,
    artifact_types: Arc<dyn ArtifactTypeRegistry>,
}

impl LocalFileDependencyArtifacts {
    /// Entry point for the resolution engine: wraps `dependency` into a lazy
    /// artifact set. No file evaluation happens here.
    pub fn new(
        dependency: Arc<LocalFileDependency>,
        component_filter: Arc<dyn ComponentFilter>,
        selector: Arc<dyn VariantSelector>,
        artifact_types: Arc<dyn ArtifactTypeRegistry>,
    ) -> ResolvedArtifactSet {
        ResolvedArtifactSet::LocalFiles(Arc::new(LocalFileDependencyArtifacts {
            dependency,
            component_filter,
            selector,
            artifact_types,
        }))
    }

    pub fn dependency(&self) -> &Arc<LocalFileDependency> {
        &self.dependency
    }

    pub(crate) fn start_visit(
        &self,
        queue: &dyn WorkQueue,
        listener: &mut dyn AsyncArtifactListener,
    ) -> Completion {
        let collection = CollectionSource::LocalFiles(self.dependency.dupe());
        let detail = listener.prepare_for_visit(&collection);
        if detail == VisitDetail::NoContents {
            return Completion::Empty;
        }

        if let Some(component) = self.dependency.component() {
            if !self.component_filter.accept(component) {
                tracing::debug!(component = %component, "component excluded by filter");
                return Completion::Empty;
            }
        }

        let files = match self.dependency.files().files() {
            Ok(files) => files,
            // Captured, not propagated: sibling dependencies in the same
            // graph must still resolve.
            Err(error) => return Completion::Broken(SharedError::new(error)),
        };

        let mut selected = Vec::with_capacity(files.len());
        for file in files {
            let id = match self.dependency.component() {
                None => {
                    let id = ArtifactIdentifier::opaque(file.clone());
                    // No declared component: the filter applies to each file
                    // individually, after evaluation.
                    if !self.component_filter.accept(&id.component_id()) {
                        tracing::debug!(file = %file, "file excluded by filter");
                        continue;
                    }
                    id
                }
                Some(component) => {
                    let file_name = match file.file_name() {
                        Some(name) => name.to_owned(),
                        None => file.to_string(),
                    };
                    ArtifactIdentifier::component_file(component.dupe(), &file_name)
                }
            };

            let inferred = self.artifact_types.map_attributes_for(&file);
            let attributes = self.dependency.attributes().merged_with(&inferred);
            let artifact = ResolvedArtifact::new(id, file);
            let variant = ResolvedVariant::new(
                LOCAL_FILE.dupe(),
                attributes.dupe(),
                ResolvedArtifactSet::leaf(
                    LOCAL_FILE.dupe(),
                    attributes,
                    artifact,
                    Some(self.dependency.dupe()),
                ),
                VariantSource::LocalFiles(self.dependency.dupe()),
            );
            let candidates = ResolvedVariantSet::singleton(variant, EmptySchema::instance());
            selected.push(self.selector.select(&candidates, self));
        }

        let completion = ResolvedArtifactSet::of(selected).start_visit(queue, listener);
        if detail == VisitDetail::Spec {
            return Completion::WithSpec {
                inner: Box::new(completion),
                spec: FileSetSpec(self.dependency.files().dupe()),
            };
        }
        completion
    }
}

impl TransformFactory for LocalFileDependencyArtifacts {
    fn as_transformed(
        &self,
        variant: &ResolvedVariant,
        target_attributes: AttributeSet,
        transformation: Arc<Transformation>,
    ) -> ResolvedArtifactSet {
        ResolvedArtifactSet::Transformed(Arc::new(TransformedArtifactSet::new(
            variant.artifacts().dupe(),
            variant.name().dupe(),
            target_attributes,
            transformation,
        )))
    }
}
