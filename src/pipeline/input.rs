//! Input discovery: find the PDFs under a source directory and validate them.
//!
//! Every PDF is returned with both its absolute path (for opening) and its
//! path relative to the scanned root (for deck naming). Validation checks the
//! `%PDF` magic bytes up front so callers get a meaningful error rather than a
//! pdfium failure.

use crate::error::Pdf2AnkiError;
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::{debug, trace};

/// A PDF found under the scanned root.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct PdfFile {
    pub absolute: PathBuf,
    /// Relative to the scanned root, including the file name.
    pub relative: PathBuf,
}

impl PdfFile {
    /// File name without extension; used as the output base name.
    pub fn stem(&self) -> String {
        file_stem(&self.absolute)
    }
}

/// File name without its extension, lossily converted.
pub fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "document".to_string())
}

/// True when the extension is `pdf`, any case.
pub fn is_pdf_path(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("pdf"))
}

/// Recursively collect PDF files under `root`, sorted by relative path.
///
/// Returns [`Pdf2AnkiError::NoPdfsFound`] when nothing matches.
pub fn find_pdfs(root: &Path) -> Result<Vec<PdfFile>, Pdf2AnkiError> {
    if !root.is_dir() {
        return Err(Pdf2AnkiError::FileNotFound {
            path: root.to_path_buf(),
        });
    }

    let root = std::fs::canonicalize(root).map_err(|e| Pdf2AnkiError::ScanFailed {
        path: root.to_path_buf(),
        source: e,
    })?;

    let mut found = Vec::new();
    walk(&root, &root, &mut found)?;

    if found.is_empty() {
        return Err(Pdf2AnkiError::NoPdfsFound { dir: root });
    }

    found.sort_by(|a, b| a.relative.cmp(&b.relative));
    debug!("Found {} PDF(s) under {}", found.len(), root.display());
    Ok(found)
}

fn walk(root: &Path, dir: &Path, out: &mut Vec<PdfFile>) -> Result<(), Pdf2AnkiError> {
    let scan_err = |e| Pdf2AnkiError::ScanFailed {
        path: dir.to_path_buf(),
        source: e,
    };

    for entry in std::fs::read_dir(dir).map_err(scan_err)? {
        let entry = entry.map_err(scan_err)?;
        let path = entry.path();
        let file_type = entry.file_type().map_err(scan_err)?;

        if file_type.is_dir() {
            walk(root, &path, out)?;
        } else if is_pdf_path(&path) && path.is_file() {
            let relative = path.strip_prefix(root).unwrap_or(&path).to_path_buf();
            trace!("Found PDF: {}", relative.display());
            out.push(PdfFile {
                absolute: path,
                relative,
            });
        }
    }
    Ok(())
}

/// Check `path` exists, is readable, and starts with `%PDF`.
pub fn validate_pdf(path: &Path) -> Result<(), Pdf2AnkiError> {
    if !path.exists() {
        return Err(Pdf2AnkiError::FileNotFound {
            path: path.to_path_buf(),
        });
    }

    match std::fs::File::open(path) {
        Ok(mut f) => {
            let mut magic = [0u8; 4];
            match f.read_exact(&mut magic) {
                Ok(()) if &magic == b"%PDF" => {}
                Ok(()) => {
                    return Err(Pdf2AnkiError::NotAPdf {
                        path: path.to_path_buf(),
                        magic,
                    })
                }
                Err(_) => {
                    return Err(Pdf2AnkiError::CorruptPdf {
                        path: path.to_path_buf(),
                        detail: "file is shorter than a PDF header".into(),
                    })
                }
            }
        }
        Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
            return Err(Pdf2AnkiError::PermissionDenied {
                path: path.to_path_buf(),
            });
        }
        Err(_) => {
            return Err(Pdf2AnkiError::FileNotFound {
                path: path.to_path_buf(),
            });
        }
    }

    trace!("Validated PDF header: {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::fs;

    fn touch_pdf(path: &Path) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, b"%PDF-1.7\n%%EOF\n").unwrap();
    }

    #[test]
    fn finds_nested_pdfs_sorted_by_relative_path() {
        let dir = tempfile::tempdir().unwrap();
        touch_pdf(&dir.path().join("z.pdf"));
        touch_pdf(&dir.path().join("biology/cells.PDF"));
        touch_pdf(&dir.path().join("biology/genetics/dna.pdf"));
        fs::write(dir.path().join("biology/readme.txt"), "x").unwrap();

        let pdfs = find_pdfs(dir.path()).unwrap();
        let rel: Vec<_> = pdfs.iter().map(|p| p.relative.clone()).collect();
        assert_eq!(
            rel,
            vec![
                PathBuf::from("biology/cells.PDF"),
                PathBuf::from("biology/genetics/dna.pdf"),
                PathBuf::from("z.pdf"),
            ]
        );
        assert!(pdfs.iter().all(|p| p.absolute.is_absolute()));
        assert_eq!(pdfs[1].stem(), "dna");
    }

    #[test]
    fn empty_directory_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("notes.txt"), "x").unwrap();
        let err = find_pdfs(dir.path()).unwrap_err();
        assert!(matches!(err, Pdf2AnkiError::NoPdfsFound { .. }));
    }

    #[test]
    fn missing_root_is_not_found() {
        let err = find_pdfs(Path::new("/no/such/dir/for/pdf2anki")).unwrap_err();
        assert!(matches!(err, Pdf2AnkiError::FileNotFound { .. }));
    }

    #[test]
    fn validate_accepts_pdf_header() {
        let dir = tempfile::tempdir().unwrap();
        let p = dir.path().join("ok.pdf");
        touch_pdf(&p);
        validate_pdf(&p).unwrap();
    }

    #[test]
    fn validate_rejects_wrong_magic() {
        let dir = tempfile::tempdir().unwrap();
        let p = dir.path().join("fake.pdf");
        fs::write(&p, b"PK\x03\x04zip").unwrap();
        let err = validate_pdf(&p).unwrap_err();
        assert!(matches!(err, Pdf2AnkiError::NotAPdf { magic, .. } if &magic == b"PK\x03\x04"));
    }

    #[test]
    fn validate_rejects_truncated_file() {
        let dir = tempfile::tempdir().unwrap();
        let p = dir.path().join("tiny.pdf");
        fs::write(&p, b"%P").unwrap();
        assert!(matches!(
            validate_pdf(&p).unwrap_err(),
            Pdf2AnkiError::CorruptPdf { .. }
        ));
    }

    #[test]
    fn pdf_extension_is_case_insensitive() {
        assert!(is_pdf_path(Path::new("a.pdf")));
        assert!(is_pdf_path(Path::new("a.Pdf")));
        assert!(!is_pdf_path(Path::new("a.pdf.txt")));
        assert!(!is_pdf_path(Path::new("pdf")));
    }
}
