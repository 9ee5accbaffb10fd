// src/store.rs
//! Append-only article store: one markdown file per article under
//! `content/articles/YYYY/MM/DD/<slug>.md`. Slug -> article is a function;
//! the store rejects overwrites and disambiguates colliding candidate slugs
//! deterministically.

use anyhow::{bail, Context, Result};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use crate::article::Article;
use crate::frontmatter;
use crate::fsutil::{walk_markdown, write_atomic};

#[derive(Debug)]
pub struct ArticleStore {
    root: PathBuf,
    slugs: BTreeSet<String>,
}

impl ArticleStore {
    /// Open the store rooted at `root`. Known slugs are recovered from file
    /// stems; a missing root is an empty store.
    pub fn open(root: &Path) -> Result<Self> {
        let mut slugs = BTreeSet::new();
        for path in walk_markdown(root)? {
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                slugs.insert(stem.to_string());
            }
        }
        Ok(Self {
            root: root.to_path_buf(),
            slugs,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn len(&self) -> usize {
        self.slugs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slugs.is_empty()
    }

    pub fn contains_slug(&self, slug: &str) -> bool {
        self.slugs.contains(slug)
    }

    /// Turn a candidate slug into a unique one by appending `-2`, `-3`, ...
    /// on collision, and reserve it. Deterministic for a given store state.
    pub fn reserve_slug(&mut self, candidate: &str) -> String {
        let slug = if self.slugs.contains(candidate) {
            let mut n = 2usize;
            loop {
                let candidate_n = format!("{candidate}-{n}");
                if !self.slugs.contains(&candidate_n) {
                    break candidate_n;
                }
                n += 1;
            }
        } else {
            candidate.to_string()
        };
        self.slugs.insert(slug.clone());
        slug
    }

    fn path_for(&self, article: &Article) -> PathBuf {
        self.root
            .join(article.date.format("%Y/%m/%d").to_string())
            .join(format!("{}.md", article.slug))
    }

    /// Write one article. The slug must have been reserved via
    /// `reserve_slug`; an existing file at the target path is a hard error,
    /// never overwritten.
    pub fn insert(&mut self, article: &Article) -> Result<PathBuf> {
        let path = self.path_for(article);
        if path.exists() {
            bail!(
                "refusing to overwrite existing article at {}",
                path.display()
            );
        }
        write_atomic(&path, &frontmatter::render_article(article))
            .with_context(|| format!("writing article {}", article.slug))?;
        self.slugs.insert(article.slug.clone());
        Ok(path)
    }

    /// Load the full corpus. Files that fail to parse are skipped with a
    /// warning rather than failing the whole read.
    pub fn load_all(&self) -> Result<Vec<Article>> {
        let mut out = Vec::new();
        for path in walk_markdown(&self.root)? {
            let text = std::fs::read_to_string(&path)
                .with_context(|| format!("reading {}", path.display()))?;
            match frontmatter::parse_article(&text) {
                Ok(a) => out.push(a),
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "skipping unparseable article");
                }
            }
        }
        Ok(out)
    }
}
