use std::path::{Path, PathBuf};

use lopdf::Document;
use thiserror::Error;
use tracing::debug;

/// The source document could not be opened or rendered.
///
/// Not retried here; callers decide what a failed read means.
#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("failed to open document {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: lopdf::Error,
    },

    #[error("failed to render page {page} of {path}: {source}")]
    Page {
        path: PathBuf,
        page: u32,
        #[source]
        source: lopdf::Error,
    },
}

/// Render every page of the PDF to plain text, in page order.
///
/// The document handle is scoped to this call; lopdf releases it on drop
/// whether or not a page fails to render.
pub fn page_texts(path: &Path) -> Result<Vec<String>, DocumentError> {
    let doc = Document::load(path).map_err(|source| DocumentError::Open {
        path: path.to_path_buf(),
        source,
    })?;

    // get_pages keys are 1-indexed page numbers in document order
    let pages = doc.get_pages();
    let mut texts = Vec::with_capacity(pages.len());

    for (page_num, _object_id) in pages {
        let text = doc
            .extract_text(&[page_num])
            .map_err(|source| DocumentError::Page {
                path: path.to_path_buf(),
                page: page_num,
                source,
            })?;
        texts.push(text);
    }

    debug!(pages = texts.len(), path = %path.display(), "rendered document");
    Ok(texts)
}
