//! Identity and dependency types shared by the graph builder and the sorter.
//!
//! # Identity
//!
//! Every entity is named by a `(namespace, name)` pair. The pair is turned
//! into a graph vertex identifier by joining the two halves with a separator
//! (`/` by default). An empty namespace means "default" and yields the bare
//! name, so `("", "db")` and `db` are the same vertex.
//!
//! # References
//!
//! A [`DependencyRef`] names the entity being depended on. Its namespace is
//! optional: when absent (or empty) it resolves to the namespace of the
//! entity that declares the dependency, never to the global default.

#![allow(clippy::module_name_repetitions)]

use std::fmt;

use serde::{Deserialize, Serialize};

/// Separator placed between namespace and name in vertex identifiers.
pub const DEFAULT_SEPARATOR: &str = "/";

// ---------------------------------------------------------------------------
// ObjectRef
// ---------------------------------------------------------------------------

/// A fully resolved `(namespace, name)` identity.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ObjectRef {
    /// Namespace; empty for the default namespace.
    #[serde(default)]
    pub namespace: String,
    pub name: String,
}

impl ObjectRef {
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
        }
    }

    /// Vertex identifier for this identity.
    ///
    /// `namespace + separator + name`, or just `name` when the namespace is
    /// empty.
    #[must_use]
    pub fn vertex_id(&self, separator: &str) -> String {
        if self.namespace.is_empty() {
            self.name.clone()
        } else {
            format!("{}{separator}{}", self.namespace, self.name)
        }
    }
}

impl fmt::Display for ObjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.vertex_id(DEFAULT_SEPARATOR))
    }
}

// ---------------------------------------------------------------------------
// DependencyRef
// ---------------------------------------------------------------------------

/// A reference from one entity to another it depends on.
///
/// Manifests may spell a reference as a plain string (`"db"` or
/// `"infra/db"`) or as a table (`{ namespace = "infra", name = "db" }`).
/// A string is kept whole until the graph is built, because only then is the
/// namespace separator known.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "RawDependency", into = "RawDependency")]
pub struct DependencyRef {
    pub namespace: Option<String>,
    pub name: String,
    /// `name` is an unsplit `namespace<sep>name` path.
    path: bool,
}

impl DependencyRef {
    /// Reference that inherits the declaring entity's namespace.
    pub fn local(name: impl Into<String>) -> Self {
        Self {
            namespace: None,
            name: name.into(),
            path: false,
        }
    }

    /// Reference pinned to an explicit namespace.
    pub fn qualified(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            namespace: Some(namespace.into()),
            name: name.into(),
            path: false,
        }
    }

    /// Reference written as one string, split on the separator in effect
    /// when it is resolved. Text without a separator is a local name.
    pub fn path(text: impl Into<String>) -> Self {
        Self {
            namespace: None,
            name: text.into(),
            path: true,
        }
    }

    /// Resolve against the declaring entity's namespace, splitting path
    /// references on [`DEFAULT_SEPARATOR`].
    #[must_use]
    pub fn resolve(&self, default_namespace: &str) -> ObjectRef {
        self.resolve_with(default_namespace, DEFAULT_SEPARATOR)
    }

    /// Resolve against the declaring entity's namespace, splitting path
    /// references on `separator`.
    #[must_use]
    pub fn resolve_with(&self, default_namespace: &str, separator: &str) -> ObjectRef {
        let (namespace, name) = match (self.path, self.namespace.as_deref()) {
            (true, _) => match self.name.split_once(separator) {
                Some((ns, name)) if !separator.is_empty() => (ns, name),
                _ => ("", self.name.as_str()),
            },
            (false, ns) => (ns.unwrap_or_default(), self.name.as_str()),
        };
        let namespace = if namespace.is_empty() {
            default_namespace
        } else {
            namespace
        };
        ObjectRef::new(namespace, name)
    }
}

impl fmt::Display for DependencyRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.namespace.as_deref() {
            Some(ns) if !ns.is_empty() => write!(f, "{ns}{DEFAULT_SEPARATOR}{}", self.name),
            _ => f.write_str(&self.name),
        }
    }
}

impl From<&ObjectRef> for DependencyRef {
    fn from(target: &ObjectRef) -> Self {
        Self::qualified(target.namespace.clone(), target.name.clone())
    }
}

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum RawDependency {
    Short(String),
    Full {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        namespace: Option<String>,
        name: String,
    },
}

impl From<RawDependency> for DependencyRef {
    fn from(raw: RawDependency) -> Self {
        match raw {
            RawDependency::Short(text) => Self::path(text),
            RawDependency::Full { namespace, name } => Self {
                namespace,
                name,
                path: false,
            },
        }
    }
}

impl From<DependencyRef> for RawDependency {
    fn from(dependency: DependencyRef) -> Self {
        if dependency.path {
            Self::Short(dependency.name)
        } else {
            Self::Full {
                namespace: dependency.namespace,
                name: dependency.name,
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Dependent
// ---------------------------------------------------------------------------

/// Anything that has an identity and declares what it depends on.
///
/// The sorter only sees entities through this trait, so callers can sort
/// their own types without converting them first.
pub trait Dependent {
    fn namespace(&self) -> &str;

    fn name(&self) -> &str;

    fn dependencies(&self) -> &[DependencyRef];

    fn object_ref(&self) -> ObjectRef {
        ObjectRef::new(self.namespace(), self.name())
    }
}

impl<T: Dependent + ?Sized> Dependent for &T {
    fn namespace(&self) -> &str {
        (**self).namespace()
    }

    fn name(&self) -> &str {
        (**self).name()
    }

    fn dependencies(&self) -> &[DependencyRef] {
        (**self).dependencies()
    }
}

impl<T: Dependent + ?Sized> Dependent for Box<T> {
    fn namespace(&self) -> &str {
        (**self).namespace()
    }

    fn name(&self) -> &str {
        (**self).name()
    }

    fn dependencies(&self) -> &[DependencyRef] {
        (**self).dependencies()
    }
}

// ---------------------------------------------------------------------------
// Resource
// ---------------------------------------------------------------------------

/// A plain declared resource, as read from a manifest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resource {
    #[serde(default)]
    pub namespace: String,
    pub name: String,
    /// Free-form label (e.g. `Deployment`); carried through, never interpreted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default)]
    pub depends_on: Vec<DependencyRef>,
}

impl Resource {
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
            kind: None,
            depends_on: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_kind(mut self, kind: impl Into<String>) -> Self {
        self.kind = Some(kind.into());
        self
    }

    #[must_use]
    pub fn depends_on(mut self, dependency: DependencyRef) -> Self {
        self.depends_on.push(dependency);
        self
    }
}

impl Dependent for Resource {
    fn namespace(&self) -> &str {
        &self.namespace
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn dependencies(&self) -> &[DependencyRef] {
        &self.depends_on
    }
}
