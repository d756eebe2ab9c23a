//! The fixed set of searchable task fields.
//!
//! Every field has a lowercase name used in patterns (`status:open`), a
//! visibility flag for query assistance, and optionally the id of the task
//! attribute whose values it copies.

use std::fmt;

use crate::task::attribute;

/// A searchable field of the task index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TaskField {
    /// Unique task handle, used for identity and deletion.
    Identifier,
    /// Human-facing task key (e.g. `123` or `PROJ-7`).
    TaskKey,
    /// Task summary.
    Summary,
    /// Summary, description, notes and comment text.
    Content,
    /// Assigned user.
    Assignee,
    /// Reporting user.
    Reporter,
    /// Any person involved: reporter, assignee, watchers, commenters.
    Person,
    /// Component.
    Component,
    /// Completion date.
    CompletionDate,
    /// Creation date.
    CreationDate,
    /// Due date.
    DueDate,
    /// Last modification date.
    ModificationDate,
    /// Description.
    Description,
    /// Keywords.
    Keywords,
    /// Product.
    Product,
    /// Resolution.
    Resolution,
    /// Severity.
    Severity,
    /// Status.
    Status,
}

impl TaskField {
    /// Every field, in schema order.
    pub const ALL: [Self; 18] = [
        Self::Identifier,
        Self::TaskKey,
        Self::Summary,
        Self::Content,
        Self::Assignee,
        Self::Reporter,
        Self::Person,
        Self::Component,
        Self::CompletionDate,
        Self::CreationDate,
        Self::DueDate,
        Self::ModificationDate,
        Self::Description,
        Self::Keywords,
        Self::Product,
        Self::Resolution,
        Self::Severity,
        Self::Status,
    ];

    /// Lowercase name used in patterns and as the index field name.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Identifier => "identifier",
            Self::TaskKey => "task_key",
            Self::Summary => "summary",
            Self::Content => "content",
            Self::Assignee => "assignee",
            Self::Reporter => "reporter",
            Self::Person => "person",
            Self::Component => "component",
            Self::CompletionDate => "completion_date",
            Self::CreationDate => "creation_date",
            Self::DueDate => "due_date",
            Self::ModificationDate => "modification_date",
            Self::Description => "description",
            Self::Keywords => "keywords",
            Self::Product => "product",
            Self::Resolution => "resolution",
            Self::Severity => "severity",
            Self::Status => "status",
        }
    }

    /// Looks a field up by name, ignoring ASCII case.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|field| field.name().eq_ignore_ascii_case(name))
    }

    /// Whether the field is offered to users when composing patterns.
    pub const fn is_user_visible(self) -> bool {
        !matches!(self, Self::Identifier | Self::TaskKey)
    }

    /// Id of the task attribute whose values are copied into this field.
    pub const fn attribute_id(self) -> Option<&'static str> {
        match self {
            Self::Assignee => Some(attribute::USER_ASSIGNED),
            Self::Reporter => Some(attribute::USER_REPORTER),
            Self::Component => Some(attribute::COMPONENT),
            Self::Description => Some(attribute::DESCRIPTION),
            Self::Keywords => Some(attribute::KEYWORDS),
            Self::Product => Some(attribute::PRODUCT),
            Self::Resolution => Some(attribute::RESOLUTION),
            Self::Severity => Some(attribute::SEVERITY),
            Self::Status => Some(attribute::STATUS),
            _ => None,
        }
    }

    /// Date fields hold `yyyyMMddHH` values and support range queries.
    pub const fn is_date(self) -> bool {
        matches!(
            self,
            Self::CompletionDate | Self::CreationDate | Self::DueDate | Self::ModificationDate
        )
    }

    /// Fields whose values are people.
    pub const fn is_person(self) -> bool {
        matches!(self, Self::Person | Self::Reporter | Self::Assignee)
    }

    /// Raw fields are indexed verbatim instead of being tokenized.
    pub const fn is_raw(self) -> bool {
        matches!(self, Self::Identifier) || self.is_date()
    }
}

impl fmt::Display for TaskField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
