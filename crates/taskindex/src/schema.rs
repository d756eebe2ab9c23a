//! Index schema definition for the task index.
//!
//! One Tantivy field per [`TaskField`], all stored:
//! - `identifier` and the date fields are indexed verbatim (`STRING`)
//! - every other field is tokenized text with positions

use tantivy::schema::{
    Field, IndexRecordOption, STORED, STRING, Schema, TextFieldIndexing, TextOptions,
};

use crate::{analyzer::TASK_TOKENIZER, field::TaskField};

/// Handles to all fields in the index schema.
#[derive(Debug, Clone)]
pub struct IndexSchema {
    /// The underlying Tantivy schema.
    schema: Schema,
    /// Tantivy field handles, indexed like [`TaskField::ALL`].
    fields: Vec<(TaskField, Field)>,
}

impl IndexSchema {
    /// Creates a new index schema with all fields configured.
    pub fn new() -> Self {
        let mut builder = Schema::builder();

        let text_options = TextOptions::default()
            .set_indexing_options(
                TextFieldIndexing::default()
                    .set_tokenizer(TASK_TOKENIZER)
                    .set_index_option(IndexRecordOption::WithFreqsAndPositions),
            )
            .set_stored();

        let fields = TaskField::ALL
            .into_iter()
            .map(|task_field| {
                let options = if task_field.is_raw() {
                    STRING | STORED
                } else {
                    text_options.clone()
                };
                (task_field, builder.add_text_field(task_field.name(), options))
            })
            .collect();

        Self {
            schema: builder.build(),
            fields,
        }
    }

    /// Returns a reference to the underlying Tantivy schema.
    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Tantivy handle for a task field.
    pub fn field(&self, task_field: TaskField) -> Field {
        // Every TaskField is registered in new(), in ALL order.
        self.fields[task_field as usize].1
    }

    /// All task fields with their Tantivy handles.
    pub fn fields(&self) -> impl Iterator<Item = (TaskField, Field)> + '_ {
        self.fields.iter().copied()
    }
}

impl Default for IndexSchema {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod test {
    use tantivy::schema::FieldType;

    use super::*;

    fn tokenizer_of(schema: &IndexSchema, field: TaskField) -> String {
        let entry = schema.schema().get_field_entry(schema.field(field));
        let FieldType::Str(options) = entry.field_type() else {
            panic!("{field} is not a text field");
        };
        assert!(entry.is_stored(), "{field} should be stored");
        options
            .get_indexing_options()
            .map(|indexing| indexing.tokenizer().to_string())
            .unwrap_or_default()
    }

    #[test]
    fn every_task_field_is_present() {
        let schema = IndexSchema::new();
        for field in TaskField::ALL {
            assert_eq!(
                schema.schema().get_field(field.name()).ok(),
                Some(schema.field(field))
            );
        }
    }

    #[test]
    fn raw_fields_use_the_raw_tokenizer() {
        let schema = IndexSchema::new();
        assert_eq!(tokenizer_of(&schema, TaskField::Identifier), "raw");
        assert_eq!(tokenizer_of(&schema, TaskField::CreationDate), "raw");
    }

    #[test]
    fn text_fields_use_the_task_tokenizer() {
        let schema = IndexSchema::new();
        for field in [TaskField::Summary, TaskField::Content, TaskField::Person] {
            assert_eq!(tokenizer_of(&schema, field), TASK_TOKENIZER);
        }
    }
}
