/*
 * Copyright (c) Meta Platforms, Inc. and affiliates.
 *
 * This source code is licensed under both the MIT license found in the
 * LICENSE-MIT file in the root directory of this source tree and the Apache
 * License, Version 2.0 found in the LICENSE-APACHE file in the root directory
 * of this source tree.
 */

use std::borrow::Borrow;
use std::ops::Deref;
use std::path::Component;
use std::path::Path;
use std::path::PathBuf;

use derive_more::Display;
use ref_cast::RefCast;
use thiserror::Error;

/// An absolute, normalized path to an artifact file. This path is not platform
/// agnostic.
#[derive(Display, Debug, Hash, PartialEq, Eq, Ord, PartialOrd, RefCast)]
#[display(fmt = "{}", "_0.display()")]
#[repr(transparent)]
pub struct AbsPath(Path);

/// The owned version of 'AbsPath', like how 'PathBuf' relates to 'Path'.
#[derive(Clone, Display, Debug, Hash, PartialEq, Eq, Ord, PartialOrd)]
#[display(fmt = "{}", "_0.display()")]
pub struct AbsPathBuf(PathBuf);

#[derive(Error, Debug)]
enum AbsPathError {
    #[error("expected an absolute path but got `{0}`")]
    PathNotAbsolute(PathBuf),
    #[error("expected a normalized path but got `{0}`")]
    PathNotNormalized(PathBuf),
}

impl AbsPath {
    /// Creates an 'AbsPath' if the given path is absolute and normalized,
    /// otherwise error.
    pub fn new<P: ?Sized + AsRef<Path>>(p: &P) -> anyhow::Result<&AbsPath> {
        verify_abs(p.as_ref())?;
        Ok(AbsPath::ref_cast(p.as_ref()))
    }

    pub fn unchecked_new<P: ?Sized + AsRef<Path>>(p: &P) -> &AbsPath {
        AbsPath::ref_cast(p.as_ref())
    }

    pub fn as_path(&self) -> &Path {
        &self.0
    }

    pub fn to_buf(&self) -> AbsPathBuf {
        AbsPathBuf(self.0.to_path_buf())
    }

    /// The final component of the path, when it is valid UTF-8.
    pub fn file_name(&self) -> Option<&str> {
        self.0.file_name().and_then(|name| name.to_str())
    }
}

impl AbsPathBuf {
    pub fn new(path: PathBuf) -> anyhow::Result<AbsPathBuf> {
        verify_abs(&path)?;
        Ok(AbsPathBuf(path))
    }

    pub fn unchecked_new(path: PathBuf) -> AbsPathBuf {
        AbsPathBuf(path)
    }

    pub fn as_abs_path(&self) -> &AbsPath {
        AbsPath::ref_cast(&self.0)
    }

    pub fn into_path_buf(self) -> PathBuf {
        self.0
    }
}

fn verify_abs(path: &Path) -> anyhow::Result<()> {
    if !path.is_absolute() {
        return Err(AbsPathError::PathNotAbsolute(path.to_path_buf()).into());
    }
    // Path::components normalizes interior '.' components away, so catch
    // them via string split before inspecting the components.
    if path.to_string_lossy().split('/').any(|part| part == ".") {
        return Err(AbsPathError::PathNotNormalized(path.to_path_buf()).into());
    }
    for c in path.components() {
        match c {
            Component::CurDir | Component::ParentDir => {
                return Err(AbsPathError::PathNotNormalized(path.to_path_buf()).into());
            }
            _ => {}
        }
    }
    Ok(())
}

impl AsRef<Path> for AbsPath {
    fn as_ref(&self) -> &Path {
        &self.0
    }
}

impl AsRef<Path> for AbsPathBuf {
    fn as_ref(&self) -> &Path {
        &self.0
    }
}

impl Deref for AbsPathBuf {
    type Target = AbsPath;

    fn deref(&self) -> &AbsPath {
        self.as_abs_path()
    }
}

impl Borrow<AbsPath> for AbsPathBuf {
    fn borrow(&self) -> &AbsPath {
        self.as_abs_path()
    }
}

impl ToOwned for AbsPath {
    type Owned = AbsPathBuf;

    fn to_owned(&self) -> AbsPathBuf {
        self.to_buf()
    }
}
