//! Library scanning and EPUB package metadata.

use std::path::{Path, PathBuf};

use epub::doc::EpubDoc;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use super::error::MetadataError;

/// Title used when the package has none.
pub const UNTITLED: &str = "Untitled";
/// Author used when the package has none.
pub const UNKNOWN_AUTHOR: &str = "Unknown";

/// Dublin Core fields read from the package document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PackageMetadata {
    /// First `dc:title`.
    pub title: Option<String>,
    /// First `dc:creator`.
    pub creator: Option<String>,
    /// First `dc:description`.
    pub description: Option<String>,
}

/// Reads title, creator and description from an EPUB's package document.
///
/// Character references are decoded by the XML parser, so the values are
/// plain text.
///
/// # Errors
///
/// Returns [`MetadataError::Document`] when the file cannot be opened as an EPUB.
pub fn read_package_metadata(path: &Path) -> Result<PackageMetadata, MetadataError> {
    let doc = EpubDoc::new(path).map_err(|e| MetadataError::document(path, e.to_string()))?;

    let field = |name: &str| {
        doc.mdata(name)
            .map(|item| item.value.trim().to_string())
            .filter(|value| !value.is_empty())
    };

    Ok(PackageMetadata {
        title: field("title"),
        creator: field("creator"),
        description: field("description"),
    })
}

/// One book file in the library.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncBook {
    /// Full path on disk.
    pub path: PathBuf,
    /// File name, the book's stable identity.
    pub filename: String,
    /// Size in bytes.
    pub size: u64,
    /// UUIDv5 of the file name in the DNS namespace.
    pub id: String,
    /// Title from metadata, or [`UNTITLED`].
    pub title: String,
    /// Author from metadata, or [`UNKNOWN_AUTHOR`].
    pub author: String,
    /// Description from metadata, or empty.
    pub description: String,
}

impl SyncBook {
    /// Reads a book from disk.
    ///
    /// Unreadable metadata is logged and the defaults are kept.
    ///
    /// # Errors
    ///
    /// Returns [`MetadataError::Io`] if the file size cannot be read.
    pub fn from_path(path: &Path) -> Result<Self, MetadataError> {
        let size = std::fs::metadata(path)
            .map_err(|e| MetadataError::io(path, e))?
            .len();
        let filename = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();

        let mut book = Self {
            path: path.to_path_buf(),
            id: book_id(&filename),
            filename,
            size,
            title: UNTITLED.to_string(),
            author: UNKNOWN_AUTHOR.to_string(),
            description: String::new(),
        };

        match read_package_metadata(path) {
            Ok(meta) => {
                if let Some(title) = meta.title {
                    book.title = title;
                }
                if let Some(creator) = meta.creator {
                    book.author = creator;
                }
                if let Some(description) = meta.description {
                    book.description = description;
                }
            }
            Err(error) => warn!(path = %path.display(), error = %error, "could not read book metadata"),
        }
        Ok(book)
    }

    /// Author as "First Last", turning a "Last, First" form around.
    #[must_use]
    pub fn display_author(&self) -> String {
        display_author(&self.author)
    }
}

/// Deterministic id for a book file name.
#[must_use]
pub fn book_id(filename: &str) -> String {
    Uuid::new_v5(&Uuid::NAMESPACE_DNS, filename.as_bytes()).to_string()
}

/// Turns "Last, First" into "First Last"; other names pass through.
#[must_use]
pub fn display_author(author: &str) -> String {
    match author.split_once(',') {
        Some((last, first)) => format!("{} {}", first.trim(), last.trim())
            .trim()
            .to_string(),
        None => author.trim().to_string(),
    }
}

/// All books under a root directory.
#[derive(Debug, Clone, Default)]
pub struct Library {
    root: PathBuf,
    books: Vec<SyncBook>,
}

impl Library {
    /// Walks `root` recursively and reads every `.epub` (any case).
    ///
    /// A missing root is logged and yields an empty library.
    #[instrument(skip(root), fields(root = %root.display()))]
    pub fn scan(root: &Path) -> Self {
        let mut library = Self {
            root: root.to_path_buf(),
            books: Vec::new(),
        };
        if !root.exists() {
            warn!("library path does not exist");
            return library;
        }

        let mut paths = Vec::new();
        collect_epubs(root, &mut paths);
        paths.sort();

        for path in paths {
            match SyncBook::from_path(&path) {
                Ok(book) => library.books.push(book),
                Err(error) => warn!(error = %error, "skipping unreadable book"),
            }
        }
        info!(count = library.books.len(), "scanned library");
        library
    }

    /// Root directory scanned.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Books found, sorted by path.
    #[must_use]
    pub fn books(&self) -> &[SyncBook] {
        &self.books
    }

    /// Looks up a book's path by file name.
    #[must_use]
    pub fn book_path(&self, filename: &str) -> Option<&Path> {
        self.books
            .iter()
            .find(|book| book.filename == filename)
            .map(|book| book.path.as_path())
    }
}

fn collect_epubs(dir: &Path, out: &mut Vec<PathBuf>) {
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(error) => {
            warn!(path = %dir.display(), error = %error, "cannot read directory");
            return;
        }
    };
    for entry in entries.flatten() {
        let path = entry.path();
        // `DirEntry::file_type` does not follow symlinks, so linked
        // directories (and link loops) are never descended into.
        let is_dir = match entry.file_type() {
            Ok(kind) => kind.is_dir(),
            Err(error) => {
                warn!(path = %path.display(), error = %error, "cannot stat entry");
                continue;
            }
        };
        if is_dir {
            collect_epubs(&path, out);
        } else if path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("epub"))
        {
            debug!(path = %path.display(), "found book");
            out.push(path);
        }
    }
}
