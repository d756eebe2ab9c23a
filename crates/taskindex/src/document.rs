//! Document types for indexing.
//!
//! A [`TaskDocument`] maps fields to the text stored for one task. Documents
//! are built from a task and, when the task comes from a repository, its
//! [`TaskData`]. Which field receives which value is decided by the
//! extractor tables below rather than per-field branching.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use tantivy::TantivyDocument;

use crate::{
    field::TaskField,
    schema::IndexSchema,
    task::{Task, TaskData, attribute},
};

/// `strftime` format of stored dates: UTC at hour resolution, `yyyyMMddHH`.
pub const DATE_FORMAT: &str = "%Y%m%d%H";

/// Pulls the values for one field out of a task and its repository data.
type DataExtractor = fn(&Task, &TaskData) -> Vec<String>;

/// Pulls the values for one field out of a local task.
type LocalExtractor = fn(&Task) -> Vec<String>;

/// Pulls one date out of a task.
type DateExtractor = fn(&Task) -> Option<DateTime<Utc>>;

/// Fields filled from repository data, in application order.
///
/// Attribute-backed fields ([`TaskField::attribute_id`]) are copied after
/// these.
const DATA_EXTRACTORS: &[(TaskField, DataExtractor)] = &[
    (TaskField::Summary, |_, data| attribute_values(data, attribute::SUMMARY)),
    (TaskField::TaskKey, |task, _| task.task_key.iter().cloned().collect()),
    (TaskField::Content, |_, data| attribute_values(data, attribute::SUMMARY)),
    (TaskField::Content, |_, data| attribute_values(data, attribute::DESCRIPTION)),
    (TaskField::Content, |_, data| {
        attribute_values(data, attribute::STATUS_WHITEBOARD)
    }),
    (TaskField::Content, |_, data| {
        data.comments().map(|(text, _)| text.to_string()).collect()
    }),
    (TaskField::Person, |_, data| {
        data.comments()
            .filter_map(|(_, author)| author.map(String::from))
            .collect()
    }),
    (TaskField::Person, |_, data| {
        data.attributes_of_kind(attribute::KIND_PERSON)
            .flat_map(|a| a.values.iter().cloned())
            .collect()
    }),
];

/// Fields filled for local tasks, which have no repository data.
const LOCAL_EXTRACTORS: &[(TaskField, LocalExtractor)] = &[
    (TaskField::Summary, |task| vec![task.summary.clone()]),
    (TaskField::TaskKey, |task| task.task_key.iter().cloned().collect()),
    (TaskField::Content, |task| vec![task.summary.clone()]),
    (TaskField::Content, |task| vec![task.notes.clone()]),
];

/// Date fields, shared by both paths.
const DATE_EXTRACTORS: &[(TaskField, DateExtractor)] = &[
    (TaskField::CreationDate, |task| task.creation_date),
    (TaskField::ModificationDate, |task| task.modification_date),
    (TaskField::DueDate, |task| task.due_date),
    (TaskField::CompletionDate, |task| task.completion_date),
];

/// All values of a top-level attribute.
fn attribute_values(data: &TaskData, id: &str) -> Vec<String> {
    data.attribute(id)
        .map(|a| a.values.clone())
        .unwrap_or_default()
}

/// Formats a date the way date fields store it.
pub fn format_date(date: &DateTime<Utc>) -> String {
    date.format(DATE_FORMAT).to_string()
}

/// The field values indexed for one task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskDocument {
    /// Field values. Every document holds [`TaskField::Identifier`].
    fields: BTreeMap<TaskField, String>,
}

impl TaskDocument {
    /// Builds the document for a task.
    ///
    /// Returns `None` for a repository task without data: there is nothing
    /// to index for it, and the caller must not add a document.
    pub fn build(task: &Task, data: Option<&TaskData>) -> Option<Self> {
        let mut doc = Self::new(&task.handle);

        match data {
            Some(data) => {
                for (field, extract) in DATA_EXTRACTORS {
                    doc.add_all(*field, extract(task, data));
                }
                for field in TaskField::ALL {
                    if let Some(id) = field.attribute_id() {
                        doc.add_all(field, attribute_values(data, id));
                    }
                }
            }
            None if task.is_local() => {
                for (field, extract) in LOCAL_EXTRACTORS {
                    doc.add_all(*field, extract(task));
                }
            }
            None => return None,
        }

        for (field, extract) in DATE_EXTRACTORS {
            if let Some(date) = extract(task) {
                doc.add(*field, &format_date(&date));
            }
        }

        Some(doc)
    }

    /// Creates a document holding only the identifier.
    fn new(identifier: &str) -> Self {
        let mut fields = BTreeMap::new();
        fields.insert(TaskField::Identifier, identifier.to_string());
        Self { fields }
    }

    /// Adds every value to a field.
    fn add_all(&mut self, field: TaskField, values: Vec<String>) {
        for value in values {
            self.add(field, &value);
        }
    }

    /// Adds one value to a field.
    ///
    /// Text values are appended with a separating space. A person already
    /// present in a person field is not added twice. Dates replace the
    /// previous value; the identifier never changes.
    fn add(&mut self, field: TaskField, value: &str) {
        let value = value.trim();
        if value.is_empty() || field == TaskField::Identifier {
            return;
        }
        match self.fields.get_mut(&field) {
            Some(existing) if field.is_date() => *existing = value.to_string(),
            Some(existing) if field.is_person() && existing.contains(value) => {}
            Some(existing) => {
                existing.push(' ');
                existing.push_str(value);
            }
            None => {
                self.fields.insert(field, value.to_string());
            }
        }
    }

    /// The task handle this document was built for.
    pub fn identifier(&self) -> &str {
        self.get(TaskField::Identifier).unwrap_or_default()
    }

    /// Stored value of a field.
    pub fn get(&self, field: TaskField) -> Option<&str> {
        self.fields.get(&field).map(String::as_str)
    }

    /// Converts to a Tantivy document for the given schema.
    pub fn to_tantivy(&self, schema: &IndexSchema) -> TantivyDocument {
        let mut doc = TantivyDocument::new();
        for (field, value) in &self.fields {
            doc.add_text(schema.field(*field), value);
        }
        doc
    }
}
