//! Index store: the Tantivy index holding one document per task.
//!
//! The store hands out short-lived [`StoreWriter`]s to the maintenance task
//! and point-in-time [`Snapshot`]s to readers. A directory whose index cannot
//! be opened is cleared and recreated empty; the caller learns about it
//! through [`IndexStore::was_created`] and rebuilds.

use std::{
    fmt, fs,
    path::{Path, PathBuf},
};

use parking_lot::RwLock;
use tantivy::{
    Index, IndexReader, IndexWriter, ReloadPolicy, TantivyError, Term, directory::MmapDirectory,
};
use tracing::{debug, warn};

use crate::{
    analyzer::{TASK_TOKENIZER, build_analyzer},
    document::TaskDocument,
    error::IndexError,
    field::TaskField,
    schema::IndexSchema,
    snapshot::Snapshot,
};

/// Heap budget for the single indexing thread (20 MB).
const WRITER_HEAP_SIZE: usize = 20_000_000;

/// File Tantivy writes at the root of every index directory.
const META_FILE: &str = "meta.json";

/// Where the index lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreLocation {
    /// A directory on disk, created if missing.
    Directory(PathBuf),
    /// Process memory; contents are lost when the store is dropped.
    InMemory,
}

impl StoreLocation {
    /// A directory location.
    pub fn directory(path: impl Into<PathBuf>) -> Self {
        Self::Directory(path.into())
    }
}

impl fmt::Display for StoreLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Directory(path) => write!(f, "{}", path.display()),
            Self::InMemory => f.write_str("<memory>"),
        }
    }
}

/// Persistent inverted index over tasks, keyed by the identifier field.
pub struct IndexStore {
    /// Where the index lives.
    location: StoreLocation,
    /// Schema with field handles.
    schema: IndexSchema,
    /// Current index. Replaced wholesale by [`IndexStore::reset`].
    index: RwLock<Index>,
    /// Whether opening had to create an empty index.
    created: bool,
}

impl IndexStore {
    /// Opens the store, creating an empty index when none exists.
    ///
    /// An unreadable directory index is discarded and recreated.
    pub fn open(location: StoreLocation) -> Result<Self, IndexError> {
        let schema = IndexSchema::new();
        let (index, created) = match open_index(&location, &schema) {
            Ok(opened) => opened,
            Err(e) => {
                let StoreLocation::Directory(path) = &location else {
                    return Err(e);
                };
                warn!(path = %path.display(), error = %e, "index store is unreadable, recreating");
                clear_directory(path)?;
                let (index, _) = open_index(&location, &schema)?;
                (index, true)
            }
        };

        debug!(location = %location, created, "opened index store");
        Ok(Self {
            location,
            schema,
            index: RwLock::new(index),
            created,
        })
    }

    /// Whether the store started out empty because no usable index existed.
    pub fn was_created(&self) -> bool {
        self.created
    }

    /// Where the index lives.
    pub fn location(&self) -> &StoreLocation {
        &self.location
    }

    /// Schema with field handles.
    pub fn schema(&self) -> &IndexSchema {
        &self.schema
    }

    /// Discards every stored document and file and starts from an empty index.
    pub fn reset(&self) -> Result<(), IndexError> {
        if let StoreLocation::Directory(path) = &self.location {
            clear_directory(path)?;
        }
        let (index, _) = open_index(&self.location, &self.schema)?;
        *self.index.write() = index;
        debug!(location = %self.location, "reset index store");
        Ok(())
    }

    /// Opens the writer. With `truncate`, every existing document is deleted
    /// when the writer commits.
    ///
    /// Only one writer may be open at a time.
    pub fn writer(&self, truncate: bool) -> Result<StoreWriter, IndexError> {
        let index = self.index.read().clone();
        let writer: IndexWriter = index
            .writer_with_num_threads(1, WRITER_HEAP_SIZE)
            .map_err(|e| IndexError::write(&e))?;
        if truncate {
            writer
                .delete_all_documents()
                .map_err(|e| IndexError::write(&e))?;
        }
        Ok(StoreWriter {
            writer,
            schema: self.schema.clone(),
        })
    }

    /// Opens a point-in-time snapshot of the committed documents.
    pub fn snapshot(&self) -> Result<Snapshot, IndexError> {
        let index = self.index.read().clone();
        let reader: IndexReader = index
            .reader_builder()
            .reload_policy(ReloadPolicy::Manual)
            .try_into()
            .map_err(|e: TantivyError| IndexError::corrupt(&e))?;
        Ok(Snapshot::new(
            reader.searcher(),
            self.schema.field(TaskField::Identifier),
        ))
    }
}

impl fmt::Debug for IndexStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IndexStore")
            .field("location", &self.location)
            .field("created", &self.created)
            .finish_non_exhaustive()
    }
}

/// Opens or creates the index at a location and registers the task analyzer.
fn open_index(location: &StoreLocation, schema: &IndexSchema) -> Result<(Index, bool), IndexError> {
    let (index, created) = match location {
        StoreLocation::Directory(path) => {
            fs::create_dir_all(path)?;
            let created = !path.join(META_FILE).exists();
            let dir = MmapDirectory::open(path).map_err(|e| {
                let err: TantivyError = e.into();
                IndexError::open_index(path.clone(), &err)
            })?;
            let index = Index::open_or_create(dir, schema.schema().clone())
                .map_err(|e| IndexError::open_index(path.clone(), &e))?;
            (index, created)
        }
        StoreLocation::InMemory => (Index::create_in_ram(schema.schema().clone()), true),
    };
    index
        .tokenizers()
        .register(TASK_TOKENIZER, build_analyzer());
    Ok((index, created))
}

/// Removes a directory's contents, leaving the directory itself in place.
fn clear_directory(path: &Path) -> Result<(), IndexError> {
    if path.exists() {
        fs::remove_dir_all(path)?;
    }
    fs::create_dir_all(path)?;
    Ok(())
}

/// Exclusive write access to the store.
///
/// Uncommitted changes are discarded and the writer lock released when the
/// writer is dropped, including on error paths.
pub struct StoreWriter {
    /// The underlying Tantivy writer.
    writer: IndexWriter,
    /// Schema with field handles.
    schema: IndexSchema,
}

impl StoreWriter {
    /// Stages a document.
    pub fn add(&mut self, doc: &TaskDocument) -> Result<(), IndexError> {
        self.writer
            .add_document(doc.to_tantivy(&self.schema))
            .map_err(|e| IndexError::write(&e))?;
        Ok(())
    }

    /// Stages deletion of the document for a task handle.
    pub fn delete_identifier(&mut self, identifier: &str) {
        let term = Term::from_field_text(self.schema.field(TaskField::Identifier), identifier);
        self.writer.delete_term(term);
    }

    /// Makes all staged changes visible to new snapshots.
    pub fn commit(&mut self) -> Result<(), IndexError> {
        self.writer.commit().map_err(|e| IndexError::commit(&e))?;
        Ok(())
    }

    /// Waits for background merges and releases the writer.
    pub fn close(self) -> Result<(), IndexError> {
        self.writer
            .wait_merging_threads()
            .map_err(|e| IndexError::write(&e))
    }
}
