//! Project-relative paths and their wire forms.
//!
//! Internally a `RelativePath` is `/`-separated without a leading `/`.
//! Peers may send the leading-slash "web" form; [`RelativePath::from_wire`]
//! strips it on the way in and [`RelativePath::to_web_path`] adds it for
//! consumers that want it on the way out.
//!
//! A `RelativePath` always names something strictly inside the project root:
//! it is never empty and has no `.`, `..`, empty or absolute segments.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Component, Path, PathBuf};

use crate::error::{BridgeError, BridgeResult};

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RelativePath(String);

impl RelativePath {
    /// Parse a path received from a peer, dropping one leading `/` and one
    /// trailing `/`.
    pub fn from_wire(path: &str) -> BridgeResult<Self> {
        let trimmed = path.strip_prefix('/').unwrap_or(path);
        let trimmed = trimmed.strip_suffix('/').unwrap_or(trimmed);
        if trimmed.is_empty() {
            return Err(BridgeError::invalid_path(path, "names the project root"));
        }
        for segment in trimmed.split('/') {
            if segment.is_empty() {
                return Err(BridgeError::invalid_path(path, "contains an empty segment"));
            }
            let mut components = Path::new(segment).components();
            match (components.next(), components.next()) {
                (Some(Component::Normal(_)), None) => {}
                (Some(Component::ParentDir), None) => {
                    return Err(BridgeError::invalid_path(path, "leaves the project root"));
                }
                _ => {
                    return Err(BridgeError::invalid_path(path, "contains an invalid segment"));
                }
            }
        }
        Ok(Self(trimmed.to_string()))
    }

    /// Leading-slash form of this path.
    pub fn to_web_path(&self) -> String {
        format!("/{}", self.0)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Path of `absolute` relative to `project_root`.
    ///
    /// Returns None when `absolute` is not inside `project_root` or names the
    /// root itself.
    pub fn from_project(project_root: &Path, absolute: &Path) -> Option<Self> {
        let root = path_clean::clean(project_root);
        let absolute = path_clean::clean(absolute);
        let relative = absolute.strip_prefix(&root).ok()?;

        let mut segments = Vec::new();
        for component in relative.components() {
            match component {
                Component::Normal(segment) => segments.push(segment.to_str()?.to_string()),
                Component::CurDir => {}
                _ => return None,
            }
        }

        if segments.is_empty() {
            None
        } else {
            Some(Self(segments.join("/")))
        }
    }

    /// Absolute location of this path under `project_root`.
    pub fn to_absolute(&self, project_root: &Path) -> PathBuf {
        let mut absolute = project_root.to_path_buf();
        for segment in self.0.split('/') {
            absolute.push(segment);
        }
        absolute
    }
}

impl TryFrom<String> for RelativePath {
    type Error = BridgeError;

    fn try_from(path: String) -> BridgeResult<Self> {
        Self::from_wire(&path)
    }
}

impl TryFrom<&str> for RelativePath {
    type Error = BridgeError;

    fn try_from(path: &str) -> BridgeResult<Self> {
        Self::from_wire(path)
    }
}

impl From<RelativePath> for String {
    fn from(path: RelativePath) -> Self {
        path.0
    }
}

impl fmt::Display for RelativePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
