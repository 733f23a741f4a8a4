//! Artifact rendering and persistence.
//!
//! One leaf produces one self-contained `index.html`. The store is a trait so
//! the walker's skip logic can be exercised without touching a real
//! filesystem; the filesystem implementation writes through a temp path and
//! renames into place, so a crash mid-write never leaves a file that a later
//! run mistakes for a completed artifact.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tracing::debug;

use bookmirror_shared::{MirrorError, Result};

/// File name of the per-leaf artifact. Its existence is the done-marker.
pub const INDEX_FILE: &str = "index.html";

/// Fixed document `<title>` carried in the boilerplate wrapper.
const DOC_TITLE: &str = "Produto Interno e Integral";

/// Math-rendering script referenced by every artifact.
const MATHJAX_SRC: &str =
    "https://cdnjs.cloudflare.com/ajax/libs/mathjax/2.7.7/MathJax.js?config=TeX-MML-AM_CHTML";

// ---------------------------------------------------------------------------
// Rendering
// ---------------------------------------------------------------------------

/// Render a leaf's `index.html`: boilerplate wrapper, the display title as a
/// heading, and one paragraph per content fragment in input order.
pub fn render_index_html(title: &str, fragments: &[String]) -> String {
    let mut html = format!(
        "<!DOCTYPE html>\n\
         <html lang=\"pt\">\n\
         <head>\n\
         <meta charset=\"UTF-8\">\n\
         <meta name=\"viewport\" content=\"width=device-width, initial-scale=1.0\">\n\
         <title>{DOC_TITLE}</title>\n\
         <script type=\"text/javascript\" async src=\"{MATHJAX_SRC}\"></script>\n\
         </head>\n\
         <body>\n\
         <h1>{title}</h1>\n"
    );

    for fragment in fragments {
        html.push_str("<p>");
        html.push_str(fragment);
        html.push_str("</p>\n");
    }

    html.push_str("</body>\n</html>\n");
    html
}

// ---------------------------------------------------------------------------
// ArtifactStore
// ---------------------------------------------------------------------------

/// Persistence seam for mirrored artifacts.
///
/// The walker only ever asks three things: make a node directory, check
/// whether a leaf is already done, and write a finished leaf.
pub trait ArtifactStore: Send + Sync {
    /// Create a node directory. Creating an existing directory is not an error.
    fn create_dir(&self, dir: &Path) -> Result<()>;

    /// Whether `dir` already contains a completed `index.html`.
    fn exists(&self, dir: &Path) -> bool;

    /// Persist a leaf's `index.html` under `dir`.
    fn write_index(&self, dir: &Path, html: &str) -> Result<()>;
}

/// Filesystem-backed store.
#[derive(Debug, Default)]
pub struct FsStore;

impl ArtifactStore for FsStore {
    fn create_dir(&self, dir: &Path) -> Result<()> {
        std::fs::create_dir_all(dir).map_err(|e| MirrorError::io(dir, e))
    }

    fn exists(&self, dir: &Path) -> bool {
        dir.join(INDEX_FILE).exists()
    }

    fn write_index(&self, dir: &Path, html: &str) -> Result<()> {
        let target = dir.join(INDEX_FILE);
        let temp = dir.join(format!(".{INDEX_FILE}.tmp"));

        // Write to temp file first
        std::fs::write(&temp, html).map_err(|e| MirrorError::io(&temp, e))?;

        // Atomic rename
        std::fs::rename(&temp, &target).map_err(|e| MirrorError::io(&target, e))?;

        debug!(path = %target.display(), size = html.len(), "wrote artifact");
        Ok(())
    }
}

/// In-memory store for tests that exercise skip/write logic without disk.
#[derive(Debug, Default)]
pub struct MemStore {
    files: Mutex<HashMap<PathBuf, String>>,
}

impl MemStore {
    /// Content written under `dir`, if any.
    pub fn content(&self, dir: &Path) -> Option<String> {
        self.files
            .lock()
            .expect("store lock poisoned")
            .get(&dir.join(INDEX_FILE))
            .cloned()
    }

    /// Number of artifacts written.
    pub fn len(&self) -> usize {
        self.files.lock().expect("store lock poisoned").len()
    }

    /// Whether no artifacts were written.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ArtifactStore for MemStore {
    fn create_dir(&self, _dir: &Path) -> Result<()> {
        Ok(())
    }

    fn exists(&self, dir: &Path) -> bool {
        self.files
            .lock()
            .expect("store lock poisoned")
            .contains_key(&dir.join(INDEX_FILE))
    }

    fn write_index(&self, dir: &Path, html: &str) -> Result<()> {
        self.files
            .lock()
            .expect("store lock poisoned")
            .insert(dir.join(INDEX_FILE), html.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rendered_html_embeds_title_and_fragments_in_order() {
        let html = render_index_html("Q1", &["a".into(), "b".into()]);

        assert!(html.starts_with("<!DOCTYPE html>"));
        assert!(html.contains("<h1>Q1</h1>"));
        assert!(html.contains("mathjax"));

        let pos_a = html.find("<p>a</p>").expect("first fragment");
        let pos_b = html.find("<p>b</p>").expect("second fragment");
        assert!(pos_a < pos_b);
    }

    #[test]
    fn rendered_html_with_no_fragments_is_still_complete() {
        let html = render_index_html("titulo", &[]);
        assert!(html.contains("<h1>titulo</h1>"));
        assert!(html.ends_with("</html>\n"));
    }

    #[test]
    fn mem_store_tracks_written_leaves() {
        let store = MemStore::default();
        let dir = Path::new("/book/1/1/Q1 100");

        assert!(!store.exists(dir));
        store.write_index(dir, "<html></html>").unwrap();
        assert!(store.exists(dir));
        assert_eq!(store.content(dir).unwrap(), "<html></html>");
    }

    #[test]
    fn fs_store_roundtrip() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let store = FsStore;
        let dir = tmp.path().join("Q1 100");

        store.create_dir(&dir).unwrap();
        // Idempotent re-create
        store.create_dir(&dir).unwrap();

        assert!(!store.exists(&dir));
        store.write_index(&dir, "<html>x</html>").unwrap();
        assert!(store.exists(&dir));

        let content = std::fs::read_to_string(dir.join(INDEX_FILE)).unwrap();
        assert_eq!(content, "<html>x</html>");

        // No temp file left behind
        assert!(!dir.join(format!(".{INDEX_FILE}.tmp")).exists());
    }
}
