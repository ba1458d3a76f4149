//! Document discovery and text extraction.
use std::fs;
use std::path::{Path, PathBuf};

use groundqa_core::error::Error;

pub const SUPPORTED_EXTENSIONS: &[&str] = &["md", "markdown", "txt", "pdf"];

fn extension(path: &Path) -> Option<String> {
	path.extension().and_then(|s| s.to_str()).map(|s| s.to_ascii_lowercase())
}

/// Supported files under `root`, recursively, sorted by path.
pub fn discover_documents(root: &Path) -> Vec<PathBuf> {
	let mut files: Vec<PathBuf> = walkdir::WalkDir::new(root)
		.into_iter()
		.filter_map(|e| e.ok())
		.filter(|e| e.file_type().is_file())
		.map(|e| e.into_path())
		.filter(|p| extension(p).is_some_and(|ext| SUPPORTED_EXTENSIONS.contains(&ext.as_str())))
		.collect();
	files.sort();
	files
}

/// Raw text of a document. Markdown and text are decoded as UTF-8 with lossy
/// replacement; PDFs are page texts joined by newlines.
pub fn load_document(path: &Path) -> Result<String, Error> {
	match extension(path).as_deref() {
		Some("md" | "markdown" | "txt") => {
			let bytes = fs::read(path).map_err(|source| Error::Read { path: path.to_path_buf(), source })?;
			Ok(String::from_utf8_lossy(&bytes).into_owned())
		}
		Some("pdf") => read_pdf(path),
		_ => Err(Error::Unsupported(path.to_path_buf())),
	}
}

#[cfg(feature = "pdf")]
fn read_pdf(path: &Path) -> Result<String, Error> {
	// pdf-extract panics on some malformed inputs.
	let pages = std::panic::catch_unwind(|| pdf_extract::extract_text_by_pages(path))
		.map_err(|_| Error::Pdf { path: path.to_path_buf(), reason: "decoder panicked".to_string() })?
		.map_err(|e| Error::Pdf { path: path.to_path_buf(), reason: e.to_string() })?;
	Ok(pages.join("\n"))
}

#[cfg(not(feature = "pdf"))]
fn read_pdf(path: &Path) -> Result<String, Error> {
	Err(Error::Pdf { path: path.to_path_buf(), reason: "PDF support not compiled in (enable the `pdf` feature)".to_string() })
}

/// Stable document identity used as the chunk id prefix.
pub fn doc_stem(path: &Path) -> String {
	path.file_stem().or_else(|| path.file_name()).map(|s| s.to_string_lossy().to_string()).unwrap_or_else(|| path.to_string_lossy().to_string())
}
