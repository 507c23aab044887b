use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;

use crate::domain::models::{NewPost, Post, PostKind, Taxonomy, Term};
use crate::domain::slug::{sanitize_slug, unique_slug, ReservedSlugs};

/// All content known to the router, persisted as a single JSON document.
///
/// Posts are kept in id order so "first match" lookups are deterministic.
#[derive(Debug, Serialize, Deserialize, Default)]
pub struct ContentStore {
    #[serde(default)]
    next_id: u64,
    #[serde(default)]
    posts: Vec<Post>,
    #[serde(default)]
    terms: Vec<Term>,
    #[serde(skip)]
    reserved: ReservedSlugs,
}

impl ContentStore {
    /// Loads the store from `path`. A missing file is an empty store; a malformed one is an error.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "content file not found, starting empty");
            return Ok(ContentStore::default());
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read content file {}", path.display()))?;
        let mut store: ContentStore = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse content file {}", path.display()))?;

        store.posts.sort_by_key(|p| p.id);
        if let Some(dup) = store.posts.windows(2).find(|w| w[0].id == w[1].id) {
            bail!("Duplicate post id {} in {}", dup[0].id, path.display());
        }

        let max_id = store
            .posts
            .iter()
            .map(|p| p.id)
            .chain(store.terms.iter().map(|t| t.id))
            .max()
            .unwrap_or(0);
        store.next_id = store.next_id.max(max_id + 1);

        tracing::debug!(
            posts = store.posts.len(),
            terms = store.terms.len(),
            "content store loaded"
        );
        Ok(store)
    }

    /// Replaces the slugs new and moved posts may not take.
    pub fn with_reserved(mut self, reserved: ReservedSlugs) -> Self {
        self.reserved = reserved;
        self
    }

    /// Writes the store next to `path` first and then moves it into place.
    pub fn save(&self, path: &Path) -> Result<()> {
        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        fs::create_dir_all(dir)?;

        let content = serde_json::to_string_pretty(self)?;
        let mut file = NamedTempFile::new_in(dir)?;
        file.write_all(content.as_bytes())?;
        file.persist(path)
            .with_context(|| format!("Failed to write content file {}", path.display()))?;
        Ok(())
    }

    pub fn posts(&self) -> &[Post] {
        &self.posts
    }

    pub fn terms(&self) -> &[Term] {
        &self.terms
    }

    pub fn get(&self, id: u64) -> Option<&Post> {
        let idx = self.posts.binary_search_by_key(&id, |p| p.id).ok()?;
        Some(&self.posts[idx])
    }

    fn get_mut(&mut self, id: u64) -> Option<&mut Post> {
        let idx = self.posts.binary_search_by_key(&id, |p| p.id).ok()?;
        Some(&mut self.posts[idx])
    }

    /// Finds a post by slug and kind. `parent` narrows the lookup to one scope;
    /// `None` matches any parent.
    pub fn get_post_by_slug(&self, slug: &str, kind: PostKind, parent: Option<u64>) -> Option<&Post> {
        self.posts.iter().find(|p| {
            p.kind == kind && p.slug == slug && parent.map_or(true, |id| p.parent == Some(id))
        })
    }

    /// Show whose About page is `page_id`.
    pub fn get_show_by_about_page(&self, page_id: u64) -> Option<&Post> {
        self.posts
            .iter()
            .find(|p| p.kind == PostKind::Show && p.about_page == Some(page_id))
    }

    pub fn get_term_by_slug(&self, slug: &str, taxonomy: Taxonomy) -> Option<&Term> {
        self.terms
            .iter()
            .find(|t| t.taxonomy == taxonomy && t.slug == slug)
    }

    pub fn children(&self, parent: u64, kind: PostKind) -> impl Iterator<Item = &Post> {
        self.posts
            .iter()
            .filter(move |p| p.kind == kind && p.parent == Some(parent))
    }

    /// Shows carrying any of the given term slugs.
    pub fn shows_with_any_term(&self, taxonomy: Taxonomy, slugs: &[&str]) -> Vec<&Post> {
        self.posts
            .iter()
            .filter(|p| p.kind == PostKind::Show)
            .filter(|p| slugs.iter().any(|slug| p.has_term(taxonomy, slug)))
            .collect()
    }

    pub fn shows_aired_in(&self, year: i32) -> Vec<&Post> {
        use chrono::Datelike;

        self.posts
            .iter()
            .filter(|p| p.kind == PostKind::Show)
            .filter(|p| p.date.is_some_and(|d| d.year() == year))
            .collect()
    }

    /// The show a post belongs to, following parents (or the About back-reference for pages).
    pub fn owning_show<'s>(&'s self, post: &'s Post) -> Option<&'s Post> {
        match post.kind {
            PostKind::Show => Some(post),
            PostKind::Page => self.get_show_by_about_page(post.id),
            PostKind::Season | PostKind::Episode | PostKind::Post => {
                let parent = self.get(post.parent?)?;
                if Some(parent.kind) != post.kind.parent_kind() {
                    return None;
                }
                self.owning_show(parent)
            }
        }
    }

    pub fn insert_post(&mut self, new_post: NewPost) -> Result<&Post> {
        let NewPost {
            kind,
            title,
            slug,
            parent,
            date,
            genres,
            tags,
        } = new_post;

        self.check_parent(kind, parent)?;
        if kind != PostKind::Show && !(genres.is_empty() && tags.is_empty()) {
            bail!("Only shows can carry genres and tags");
        }

        let original = sanitize_slug(slug.as_deref().unwrap_or(&title));
        if original.is_empty() {
            bail!("Cannot derive a slug from {title:?}");
        }
        let slug = self.unique_slug_for(&original, kind, None, parent);
        if slug != original {
            tracing::info!(%original, %slug, %kind, "slug already taken in scope, suffixed");
        }

        let genres = genres
            .iter()
            .map(|g| self.ensure_term(Taxonomy::Genre, g))
            .collect::<Result<Vec<_>>>()?;
        let tags = tags
            .iter()
            .map(|t| self.ensure_term(Taxonomy::Tag, t))
            .collect::<Result<Vec<_>>>()?;

        let id = self.allocate_id();
        self.posts.push(Post {
            id,
            kind,
            slug,
            title,
            parent,
            date,
            about_page: None,
            genres,
            tags,
        });

        let idx = self.posts.len() - 1;
        Ok(&self.posts[idx])
    }

    pub fn add_term(&mut self, taxonomy: Taxonomy, name: &str, slug: Option<&str>) -> Result<&Term> {
        let slug = sanitize_slug(slug.unwrap_or(name));
        if slug.is_empty() {
            bail!("Cannot derive a slug from {name:?}");
        }
        if self.get_term_by_slug(&slug, taxonomy).is_some() {
            bail!("A {taxonomy} with slug {slug:?} already exists");
        }

        let id = self.allocate_id();
        self.terms.push(Term {
            id,
            taxonomy,
            slug,
            name: name.to_string(),
        });

        let idx = self.terms.len() - 1;
        Ok(&self.terms[idx])
    }

    /// Sets or clears the About page of a show.
    pub fn set_about_page(&mut self, show_id: u64, page_id: Option<u64>) -> Result<()> {
        self.expect_kind(show_id, PostKind::Show)?;
        if let Some(page_id) = page_id {
            self.expect_kind(page_id, PostKind::Page)?;
            if let Some(owner) = self.get_show_by_about_page(page_id) {
                if owner.id != show_id {
                    bail!("Page {page_id} is already the About page of show {}", owner.id);
                }
            }
        }

        if let Some(show) = self.get_mut(show_id) {
            show.about_page = page_id;
        }
        Ok(())
    }

    /// Moves a season or blog post under another show, re-suffixing its slug if the
    /// new scope already uses it.
    pub fn assign_show(&mut self, post_id: u64, show_id: u64) -> Result<&Post> {
        let post = self
            .get(post_id)
            .with_context(|| format!("Post {post_id} does not exist"))?;
        if !matches!(post.kind, PostKind::Season | PostKind::Post) {
            bail!("Only seasons and posts can be assigned to a show, {post_id} is a {}", post.kind);
        }
        self.expect_kind(show_id, PostKind::Show)?;

        let kind = post.kind;
        let original = post.slug.clone();
        let slug = self.unique_slug_for(&original, kind, Some(post_id), Some(show_id));

        let post = self
            .get_mut(post_id)
            .with_context(|| format!("Post {post_id} does not exist"))?;
        post.parent = Some(show_id);
        post.slug = slug;
        Ok(&*post)
    }

    /// Lowest free variant of `original` within the slug scope of `kind` under `parent`.
    ///
    /// Pages and posts can both end up at `/{slug}/`, so they share one scope across
    /// all parents. Every other kind is scoped to `(kind, parent)`.
    pub fn unique_slug_for(
        &self,
        original: &str,
        kind: PostKind,
        exclude: Option<u64>,
        parent: Option<u64>,
    ) -> String {
        let same_scope = |p: &Post| {
            if is_flat_kind(kind) {
                is_flat_kind(p.kind)
            } else {
                p.kind == kind && p.parent == parent
            }
        };
        unique_slug(original, |candidate| {
            self.reserved.contains(candidate, kind)
                || self
                    .posts
                    .iter()
                    .any(|p| same_scope(p) && p.slug == candidate && Some(p.id) != exclude)
        })
    }

    fn check_parent(&self, kind: PostKind, parent: Option<u64>) -> Result<()> {
        match (kind.parent_kind(), parent) {
            (None, Some(_)) => bail!("A {kind} cannot have a parent"),
            (Some(expected), None) if kind != PostKind::Post => {
                bail!("A {kind} needs a {expected} parent")
            }
            (Some(expected), Some(parent_id)) => self.expect_kind(parent_id, expected),
            _ => Ok(()),
        }
    }

    fn expect_kind(&self, id: u64, kind: PostKind) -> Result<()> {
        let post = self
            .get(id)
            .with_context(|| format!("Post {id} does not exist"))?;
        if post.kind != kind {
            bail!("Post {id} is a {}, expected a {kind}", post.kind);
        }
        Ok(())
    }

    fn ensure_term(&mut self, taxonomy: Taxonomy, name: &str) -> Result<String> {
        let slug = sanitize_slug(name);
        if self.get_term_by_slug(&slug, taxonomy).is_none() {
            self.add_term(taxonomy, name, None)?;
        }
        Ok(slug)
    }

    fn allocate_id(&mut self) -> u64 {
        self.next_id = self.next_id.max(1);
        let id = self.next_id;
        self.next_id += 1;
        id
    }
}

fn is_flat_kind(kind: PostKind) -> bool {
    matches!(kind, PostKind::Page | PostKind::Post)
}
