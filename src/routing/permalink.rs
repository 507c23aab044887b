use crate::config::Settings;
use crate::domain::models::{Post, PostKind};
use crate::infra::store::ContentStore;
use crate::routing::structure::StructureValues;

/// Builds canonical URLs by walking a post's parent chain.
pub struct PermalinkGenerator<'a> {
    store: &'a ContentStore,
    settings: &'a Settings,
}

impl<'a> PermalinkGenerator<'a> {
    pub fn new(store: &'a ContentStore, settings: &'a Settings) -> Self {
        Self { store, settings }
    }

    /// Full permalink (home URL + path). `None` for unknown ids or broken parent chains.
    pub fn permalink_by_id(&self, id: u64) -> Option<String> {
        self.permalink(self.store.get(id)?)
    }

    pub fn permalink(&self, post: &Post) -> Option<String> {
        let path = self.path(post)?;
        Some(format!("{}{path}", self.settings.home_url))
    }

    /// Permalink path without the home URL, e.g. `/shows/game-of-thrones/season-1/`.
    pub fn path(&self, post: &Post) -> Option<String> {
        let segments = match post.kind {
            PostKind::Show | PostKind::Season | PostKind::Episode => self.hierarchy(post)?.join("/"),
            PostKind::Page => match self.store.get_show_by_about_page(post.id) {
                Some(show) => format!("{}/about", self.hierarchy(show)?.join("/")),
                None => post.slug.clone(),
            },
            PostKind::Post => self.blog_path(post).unwrap_or_else(|| post.slug.clone()),
        };
        Some(self.finish(&segments))
    }

    /// `[base, show, season, episode]` prefix of a post in the show hierarchy.
    fn hierarchy<'p>(&'p self, post: &'p Post) -> Option<Vec<&'p str>> {
        let mut chain = vec![post.slug.as_str()];
        let mut current = post;

        while let Some(expected) = current.kind.parent_kind() {
            let parent = self.store.get(current.parent?)?;
            if parent.kind != expected {
                tracing::warn!(
                    post = current.id,
                    parent = parent.id,
                    "parent has the wrong kind, no permalink"
                );
                return None;
            }
            chain.push(parent.slug.as_str());
            current = parent;
        }

        chain.push(self.settings.base.as_str());
        chain.reverse();
        Some(chain)
    }

    fn blog_path(&self, post: &Post) -> Option<String> {
        let show = self.store.get(post.parent?)?;
        if show.kind != PostKind::Show {
            return None;
        }
        self.settings.blog_structure.render(&StructureValues {
            show: &show.slug,
            post_name: &post.slug,
            post_id: post.id,
            date: post.date,
        })
    }

    /// Leading slash, no doubled slashes, trailing slash per settings.
    fn finish(&self, segments: &str) -> String {
        let trimmed = segments
            .split('/')
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join("/");
        if self.settings.trailing_slash {
            format!("/{trimmed}/")
        } else {
            format!("/{trimmed}")
        }
    }
}
