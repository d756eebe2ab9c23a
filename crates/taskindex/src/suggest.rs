//! Completion proposals for patterns being typed.
//!
//! With the cursor after `field:`, a person field proposes the people known
//! to the task list. Anywhere else, the word under the cursor is completed to
//! a `name:` qualifier for each user-visible field.

use std::collections::BTreeSet;

use crate::{
    field::TaskField,
    task::{TaskRepository, attribute},
};

/// One completion proposal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Suggestion {
    /// Text to insert at the cursor.
    pub completion: String,
    /// Full proposed word.
    pub label: String,
    /// What the proposal searches, for field proposals.
    pub description: Option<String>,
}

/// Proposals for `text` with the cursor at byte offset `cursor`.
///
/// A cursor past the end or inside a multi-byte character yields nothing.
pub fn suggest(repository: &dyn TaskRepository, text: &str, cursor: usize) -> Vec<Suggestion> {
    let Some(before) = text.get(..cursor) else {
        return Vec::new();
    };

    let word_start = before
        .rfind(|c: char| c.is_whitespace() || c == ':')
        .map_or(0, |i| i + 1);
    let prefix = &before[word_start..];

    match qualifier(&before[..word_start]) {
        Some(name) => match TaskField::from_name(name) {
            Some(field) if field.is_person() => person_suggestions(repository, prefix),
            _ => Vec::new(),
        },
        None => field_suggestions(prefix),
    }
}

/// The field name ending in the `:` just before the current word, if any.
fn qualifier(head: &str) -> Option<&str> {
    let head = head.strip_suffix(':')?;
    let start = head
        .rfind(|c: char| !(c.is_alphanumeric() || c == '_'))
        .map_or(0, |i| i + 1);
    let name = &head[start..];
    (!name.is_empty()).then_some(name)
}

/// `name:` proposals for user-visible fields starting with `prefix`.
fn field_suggestions(prefix: &str) -> Vec<Suggestion> {
    TaskField::ALL
        .into_iter()
        .filter(|field| field.is_user_visible() && field.name().starts_with(prefix))
        .map(|field| {
            let name = field.name();
            Suggestion {
                completion: format!("{}:", &name[prefix.len()..]),
                label: name.to_string(),
                description: Some(field_description(field)),
            }
        })
        .collect()
}

/// Describes what searching `field` looks at.
fn field_description(field: TaskField) -> String {
    match field {
        TaskField::Content => {
            "Search for a term in the summary, description and comments".to_string()
        }
        TaskField::Person => {
            "Search for a user (reporter, assignee, watcher, commenter)".to_string()
        }
        _ => format!("Search on a term in the {field} field"),
    }
}

/// Known people starting with `prefix`, sorted and without repeats.
fn person_suggestions(repository: &dyn TaskRepository, prefix: &str) -> Vec<Suggestion> {
    known_people(repository)
        .into_iter()
        .filter(|person| person.starts_with(prefix))
        .map(|person| Suggestion {
            completion: person[prefix.len()..].to_string(),
            label: person,
            description: None,
        })
        .collect()
}

/// Owners, assignees, reporters, commenters and other people named in task
/// data.
fn known_people(repository: &dyn TaskRepository) -> BTreeSet<String> {
    let mut people = BTreeSet::new();
    for task in repository.all_tasks() {
        if let Some(owner) = &task.owner {
            people.insert(owner.clone());
        }
        // Tasks whose data cannot be read still contribute their owner.
        let Ok(Some(data)) = repository.task_data(&task) else {
            continue;
        };
        for id in [attribute::USER_ASSIGNED, attribute::USER_REPORTER] {
            if let Some(attr) = data.attribute(id) {
                people.extend(attr.values.iter().cloned());
            }
        }
        for attr in data.attributes_of_kind(attribute::KIND_PERSON) {
            people.extend(attr.values.iter().cloned());
        }
        people.extend(data.comments().filter_map(|(_, author)| author.map(str::to_string)));
    }
    people.retain(|person| !person.trim().is_empty());
    people
}
