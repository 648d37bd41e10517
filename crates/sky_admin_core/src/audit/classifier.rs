//! Declarative CREATE/UPDATE classification of persistence entry points.
//!
//! The policy is an explicit table built once at startup. Nothing is
//! inferred from method names or module paths.

use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Kind of mutation performed by a tagged entry point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperationTag {
    Create,
    Update,
}

impl OperationTag {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Update => "update",
        }
    }
}

/// Stable identity of one persistence entry point, e.g. `account.insert`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EntryPoint(&'static str);

impl EntryPoint {
    pub const fn new(name: &'static str) -> Self {
        Self(name)
    }

    pub fn name(self) -> &'static str {
        self.0
    }
}

impl Display for EntryPoint {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.0)
    }
}

/// Registration errors for the classification table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClassifierError {
    /// An entry point was declared more than once.
    DuplicateEntryPoint {
        entry_point: &'static str,
        existing: OperationTag,
        requested: OperationTag,
    },
}

impl Display for ClassifierError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DuplicateEntryPoint {
                entry_point,
                existing,
                requested,
            } => write!(
                f,
                "entry point `{entry_point}` already tagged `{}`; refusing second tag `{}`",
                existing.as_str(),
                requested.as_str()
            ),
        }
    }
}

impl Error for ClassifierError {}

/// Collects tag declarations; duplicates are reported by `build`.
#[derive(Debug, Default)]
pub struct ClassifierBuilder {
    tags: BTreeMap<EntryPoint, OperationTag>,
    first_error: Option<ClassifierError>,
}

impl ClassifierBuilder {
    /// Declares `entry_point` with exactly one tag.
    pub fn tag(mut self, entry_point: EntryPoint, tag: OperationTag) -> Self {
        if self.first_error.is_some() {
            return self;
        }
        if let Some(existing) = self.tags.get(&entry_point) {
            self.first_error = Some(ClassifierError::DuplicateEntryPoint {
                entry_point: entry_point.name(),
                existing: *existing,
                requested: tag,
            });
            return self;
        }
        self.tags.insert(entry_point, tag);
        self
    }

    pub fn build(self) -> Result<OperationClassifier, ClassifierError> {
        match self.first_error {
            Some(err) => Err(err),
            None => Ok(OperationClassifier { tags: self.tags }),
        }
    }
}

/// Immutable entry-point policy queried by the audit interceptor.
#[derive(Debug, Clone, Default)]
pub struct OperationClassifier {
    tags: BTreeMap<EntryPoint, OperationTag>,
}

impl OperationClassifier {
    pub fn builder() -> ClassifierBuilder {
        ClassifierBuilder::default()
    }

    /// Returns the declared tag; `None` means the entry point is exempt.
    pub fn classify(&self, entry_point: EntryPoint) -> Option<OperationTag> {
        self.tags.get(&entry_point).copied()
    }

    /// Declared policy in entry-point name order.
    pub fn entries(&self) -> impl Iterator<Item = (EntryPoint, OperationTag)> + '_ {
        self.tags.iter().map(|(entry, tag)| (*entry, *tag))
    }

    pub fn len(&self) -> usize {
        self.tags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }
}
