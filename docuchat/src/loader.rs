use std::{fs, io::Cursor, path::Path};

use anyhow::anyhow;
use lazy_static::lazy_static;
use regex::Regex;

use crate::error::{Error, Result};

lazy_static! {
    static ref PARAGRAPH_RE: Regex = Regex::new(r"</w:p>").unwrap();
    static ref XML_TAG_RE: Regex = Regex::new(r"<[^>]+>").unwrap();
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    Txt,
    Pdf,
    Docx,
}

impl DocumentKind {
    /// Dispatches on the file extension, case-insensitively.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnsupportedFormat`] for anything outside
    /// txt/pdf/doc/docx.
    pub fn from_path(path: &Path) -> Result<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or_default()
            .to_lowercase();

        match ext.as_str() {
            "txt" => Ok(Self::Txt),
            "pdf" => Ok(Self::Pdf),
            "doc" | "docx" => Ok(Self::Docx),
            _ => Err(Error::UnsupportedFormat(ext)),
        }
    }

    /// Extracts the plain text of a stored document.
    ///
    /// Blocking; call from `spawn_blocking`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Processing`] when the file cannot be read or parsed.
    pub fn load(self, path: &Path) -> Result<String> {
        match self {
            Self::Txt => fs::read_to_string(path).map_err(Into::into),
            Self::Pdf => {
                let bytes = fs::read(path)?;

                pdf_extract::extract_text_from_mem(&bytes)
                    .map_err(|e| Error::Processing(anyhow!("failed to extract pdf text: {e}")))
            }
            Self::Docx => extract_docx(path),
        }
    }
}

// A docx is a zip archive; the document body lives in word/document.xml.
fn extract_docx(path: &Path) -> Result<String> {
    let bytes = fs::read(path)?;
    let scratch = tempfile::tempdir()?;

    zip_extract::extract(Cursor::new(bytes), scratch.path(), false)
        .map_err(|e| Error::Processing(anyhow!("failed to unpack document archive: {e}")))?;

    let document = fs::read_to_string(scratch.path().join("word/document.xml"))
        .map_err(|_| Error::Processing(anyhow!("archive has no word/document.xml")))?;

    let text = PARAGRAPH_RE.replace_all(&document, "\n");
    let text = XML_TAG_RE.replace_all(&text, "");

    Ok(decode_entities(&text))
}

fn decode_entities(text: &str) -> String {
    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}
