use chrono::NaiveDate;
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum PostKind {
    Show,
    Season,
    Episode,
    Page,
    Post,
}

impl PostKind {
    /// Kind a parent must have, if this kind can have one at all.
    pub fn parent_kind(self) -> Option<PostKind> {
        match self {
            PostKind::Season => Some(PostKind::Show),
            PostKind::Episode => Some(PostKind::Season),
            PostKind::Post => Some(PostKind::Show),
            PostKind::Show | PostKind::Page => None,
        }
    }
}

impl fmt::Display for PostKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PostKind::Show => "show",
            PostKind::Season => "season",
            PostKind::Episode => "episode",
            PostKind::Page => "page",
            PostKind::Post => "post",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum Taxonomy {
    Genre,
    Tag,
}

impl fmt::Display for Taxonomy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Taxonomy::Genre => "genre",
            Taxonomy::Tag => "tag",
        })
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Post {
    pub id: u64,
    pub kind: PostKind,
    pub slug: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub about_page: Option<u64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub genres: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
}

impl Post {
    pub fn has_term(&self, taxonomy: Taxonomy, slug: &str) -> bool {
        let terms = match taxonomy {
            Taxonomy::Genre => &self.genres,
            Taxonomy::Tag => &self.tags,
        };
        terms.iter().any(|t| t == slug)
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Term {
    pub id: u64,
    pub taxonomy: Taxonomy,
    pub slug: String,
    pub name: String,
}

/// Fields supplied when creating a post; slug and id are assigned by the store.
#[derive(Debug, Clone)]
pub struct NewPost {
    pub kind: PostKind,
    pub title: String,
    pub slug: Option<String>,
    pub parent: Option<u64>,
    pub date: Option<NaiveDate>,
    pub genres: Vec<String>,
    pub tags: Vec<String>,
}

#[cfg(test)]
impl NewPost {
    pub fn new(kind: PostKind, title: impl Into<String>) -> Self {
        Self {
            kind,
            title: title.into(),
            slug: None,
            parent: None,
            date: None,
            genres: Vec::new(),
            tags: Vec::new(),
        }
    }

    pub fn parent(mut self, parent: u64) -> Self {
        self.parent = Some(parent);
        self
    }

    pub fn date(mut self, date: NaiveDate) -> Self {
        self.date = Some(date);
        self
    }

    pub fn genre(mut self, genre: impl Into<String>) -> Self {
        self.genres.push(genre.into());
        self
    }

    pub fn tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }
}
