use std::fmt;

use serde::Serialize;

use crate::model::ObjectRef;

/// Machine-readable error codes for agent-friendly decision making.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    ConfigParseError,
    ManifestNotFound,
    ManifestParseError,
    CycleDetected,
    UnresolvedReference,
    DuplicateEntity,
    InternalUnexpected,
}

impl ErrorCode {
    /// Stable code identifier (`E####`) for machine parsing.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::ConfigParseError => "E1001",
            Self::ManifestNotFound => "E1002",
            Self::ManifestParseError => "E1003",
            Self::CycleDetected => "E2001",
            Self::UnresolvedReference => "E2002",
            Self::DuplicateEntity => "E2003",
            Self::InternalUnexpected => "E9001",
        }
    }

    /// Short human-facing summary for logs and terminal output.
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::ConfigParseError => "Config file parse error",
            Self::ManifestNotFound => "Manifest not found",
            Self::ManifestParseError => "Manifest parse error",
            Self::CycleDetected => "Dependency cycle detected",
            Self::UnresolvedReference => "Dependency names an undeclared entity",
            Self::DuplicateEntity => "Entity declared more than once",
            Self::InternalUnexpected => "Internal unexpected error",
        }
    }

    /// Optional remediation hint that can be surfaced to operators and agents.
    #[must_use]
    pub const fn hint(self) -> Option<&'static str> {
        match self {
            Self::ConfigParseError => Some("Fix syntax in .lineup/config.toml and retry."),
            Self::ManifestNotFound => Some("Check the manifest path and file extension."),
            Self::ManifestParseError => {
                Some("Each resource needs a `name`; `depends_on` entries are strings or tables.")
            }
            Self::CycleDetected => Some("Remove or redirect one dependency in each listed cycle."),
            Self::UnresolvedReference => {
                Some("Declare the missing entity or fix the dependency name/namespace.")
            }
            Self::DuplicateEntity => Some("Give each entity a unique namespace/name pair."),
            Self::InternalUnexpected => Some("Retry once. If persistent, report a bug with logs."),
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

// ---------------------------------------------------------------------------
// Sort errors
// ---------------------------------------------------------------------------

/// Every cycle found in one sorting run.
///
/// Each group holds the vertex identifiers of one strongly connected
/// component. Member order inside a group is unspecified.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CycleError {
    pub cycles: Vec<Vec<String>>,
}

impl CycleError {
    /// Number of cycle groups.
    #[must_use]
    pub fn len(&self) -> usize {
        self.cycles.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cycles.is_empty()
    }

    /// Returns `true` if `vertex_id` is a member of any reported cycle.
    #[must_use]
    pub fn contains(&self, vertex_id: &str) -> bool {
        self.cycles
            .iter()
            .any(|group| group.iter().any(|member| member == vertex_id))
    }
}

impl fmt::Display for CycleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("dependency cycle detected: ")?;
        for (i, group) in self.cycles.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            write!(f, "[{}]", group.join(", "))?;
        }
        Ok(())
    }
}

impl std::error::Error for CycleError {}

/// A dependency that names no declared entity (strict mode only).
///
/// Both ends are also kept as vertex ids joined with the separator the
/// graph was built with, which is what `Display` prints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnresolvedReference {
    /// The entity declaring the dependency.
    pub from: ObjectRef,
    /// The resolved target that does not exist.
    pub missing: ObjectRef,
    pub from_id: String,
    pub missing_id: String,
}

impl UnresolvedReference {
    #[must_use]
    pub fn new(from: ObjectRef, missing: ObjectRef, separator: &str) -> Self {
        Self {
            from_id: from.vertex_id(separator),
            missing_id: missing.vertex_id(separator),
            from,
            missing,
        }
    }
}

impl fmt::Display for UnresolvedReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}", self.from_id, self.missing_id)
    }
}

/// Why a sort produced no order.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SortError {
    #[error(transparent)]
    Cycle(#[from] CycleError),

    #[error("unresolved dependencies: {}", join_refs(.0))]
    UnresolvedReferences(Vec<UnresolvedReference>),

    #[error("entity declared more than once: {vertex}")]
    DuplicateEntity { entity: ObjectRef, vertex: String },
}

impl SortError {
    #[must_use]
    pub const fn error_code(&self) -> ErrorCode {
        match self {
            Self::Cycle(_) => ErrorCode::CycleDetected,
            Self::UnresolvedReferences(_) => ErrorCode::UnresolvedReference,
            Self::DuplicateEntity { .. } => ErrorCode::DuplicateEntity,
        }
    }

    /// The cycle report, if this is a cycle error.
    #[must_use]
    pub const fn as_cycles(&self) -> Option<&CycleError> {
        match self {
            Self::Cycle(cycles) => Some(cycles),
            _ => None,
        }
    }
}

fn join_refs(refs: &[UnresolvedReference]) -> String {
    refs.iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}
