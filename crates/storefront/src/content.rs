//! Markdown marketing pages (about, FAQ, shipping, returns, ...).
//!
//! Pages are loaded from `{CONTENT_DIR}/pages/*.md` at startup. Each file
//! starts with YAML front matter:
//!
//! ```markdown
//! ---
//! title: Shipping
//! description: Where we ship and how long it takes
//! updated_at: 2025-03-01
//! ---
//!
//! We ship worldwide...
//! ```
//!
//! The file stem is the slug served at `/pages/{slug}`.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use chrono::NaiveDate;
use comrak::{Options, markdown_to_html};
use gray_matter::{Matter, ParsedEntity, engine::YAML};
use serde::Deserialize;

/// Front matter for a page.
#[derive(Debug, Clone, Deserialize)]
pub struct PageMeta {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub updated_at: Option<NaiveDate>,
}

/// A rendered page with metadata and HTML content.
#[derive(Debug, Clone)]
pub struct Page {
    pub slug: String,
    pub meta: PageMeta,
    pub content_html: String,
}

/// Content loading errors.
#[derive(Debug, thiserror::Error)]
pub enum ContentError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Parse error: {0}")]
    Parse(String),
}

/// Pages held in memory for the life of the process.
#[derive(Debug, Clone, Default)]
pub struct ContentStore {
    pages: Arc<HashMap<String, Page>>,
}

impl ContentStore {
    /// Load every page under `content_dir/pages`.
    ///
    /// A missing directory yields an empty store. Files that fail to parse
    /// are logged and skipped.
    ///
    /// # Errors
    ///
    /// Returns an error if the pages directory exists but cannot be read.
    pub fn load(content_dir: &Path) -> Result<Self, ContentError> {
        let dir = content_dir.join("pages");
        let mut pages = HashMap::new();

        if !dir.exists() {
            tracing::warn!(dir = %dir.display(), "Pages directory does not exist");
            return Ok(Self::default());
        }

        for entry in std::fs::read_dir(&dir)?.flatten() {
            let path = entry.path();
            if path.extension().is_none_or(|ext| ext != "md") {
                continue;
            }

            match load_page(&path) {
                Ok(page) => {
                    tracing::debug!(slug = %page.slug, "Loaded page");
                    pages.insert(page.slug.clone(), page);
                }
                Err(e) => {
                    tracing::error!(path = %path.display(), error = %e, "Failed to load page");
                }
            }
        }

        tracing::info!(count = pages.len(), "Content pages loaded");
        Ok(Self {
            pages: Arc::new(pages),
        })
    }

    /// Get a page by slug.
    #[must_use]
    pub fn page(&self, slug: &str) -> Option<&Page> {
        self.pages.get(slug)
    }

    /// All pages, sorted by title.
    #[must_use]
    pub fn pages(&self) -> Vec<&Page> {
        let mut pages: Vec<&Page> = self.pages.values().collect();
        pages.sort_by(|a, b| a.meta.title.cmp(&b.meta.title));
        pages
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.pages.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }
}

fn load_page(path: &Path) -> Result<Page, ContentError> {
    let source = std::fs::read_to_string(path)?;
    let slug = path
        .file_stem()
        .and_then(|s| s.to_str())
        .ok_or_else(|| ContentError::Parse("Invalid filename".to_string()))?;
    parse_page(slug, &source)
}

/// Parse one page from its markdown source.
///
/// # Errors
///
/// Returns an error if the front matter is missing or invalid.
pub fn parse_page(slug: &str, source: &str) -> Result<Page, ContentError> {
    let matter = Matter::<YAML>::new();
    let parsed: ParsedEntity<PageMeta> = matter
        .parse(source)
        .map_err(|e| ContentError::Parse(format!("Failed to parse frontmatter: {e}")))?;
    let meta = parsed
        .data
        .ok_or_else(|| ContentError::Parse("Missing frontmatter".to_string()))?;

    Ok(Page {
        slug: slug.to_string(),
        meta,
        content_html: render_markdown(&parsed.content),
    })
}

/// Render markdown to HTML with the GitHub Flavored Markdown extensions.
fn render_markdown(content: &str) -> String {
    let mut options = Options::default();

    options.extension.strikethrough = true;
    options.extension.table = true;
    options.extension.autolink = true;
    options.extension.header_ids = Some(String::new());
    options.extension.footnotes = true;

    // Pages are authored in-repo
    options.render.r#unsafe = true;

    markdown_to_html(content, &options)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const SHIPPING: &str = "---\n\
        title: Shipping\n\
        description: Where we ship\n\
        updated_at: 2025-03-01\n\
        ---\n\
        \n\
        ## Rates\n\
        \n\
        | Region | Cost |\n\
        |--------|------|\n\
        | US     | Free |\n";

    #[test]
    fn test_parse_page() {
        let page = parse_page("shipping", SHIPPING).unwrap();
        assert_eq!(page.slug, "shipping");
        assert_eq!(page.meta.title, "Shipping");
        assert_eq!(page.meta.description.as_deref(), Some("Where we ship"));
        assert_eq!(
            page.meta.updated_at,
            NaiveDate::from_ymd_opt(2025, 3, 1)
        );
        assert!(page.content_html.contains("<h2"));
        assert!(page.content_html.contains("<table>"));
    }

    #[test]
    fn test_missing_frontmatter_is_an_error() {
        assert!(parse_page("about", "# About us\n").is_err());
    }

    #[test]
    fn test_missing_directory_gives_empty_store() {
        let dir = std::env::temp_dir().join(format!("iw-content-{}", uuid::Uuid::new_v4()));
        let store = ContentStore::load(&dir).unwrap();
        assert!(store.is_empty());
    }

    #[test]
    fn test_load_directory_skips_bad_files() {
        let dir = std::env::temp_dir().join(format!("iw-content-{}", uuid::Uuid::new_v4()));
        let pages = dir.join("pages");
        std::fs::create_dir_all(&pages).unwrap();
        std::fs::write(pages.join("shipping.md"), SHIPPING).unwrap();
        std::fs::write(pages.join("broken.md"), "no front matter").unwrap();
        std::fs::write(pages.join("notes.txt"), "ignored").unwrap();

        let store = ContentStore::load(&dir).unwrap();
        assert_eq!(store.len(), 1);
        assert!(store.page("shipping").is_some());
        assert!(store.page("broken").is_none());

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_bundled_pages_load() {
        let store = ContentStore::load(Path::new("content")).unwrap();
        for slug in [
            "about",
            "faq",
            "shipping",
            "returns",
            "size-guide",
            "terms",
            "privacy",
        ] {
            assert!(store.page(slug).is_some(), "missing page {slug}");
        }
    }
}
