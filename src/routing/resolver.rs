use chrono::Datelike;
use serde::Serialize;

use super::rules::{QueryVars, RouteMatch, RouteTable, RuleName};
use crate::domain::models::{Post, PostKind, Taxonomy, Term};
use crate::infra::store::ContentStore;

/// What a request path resolved to.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum Resolution {
    Show { show: Post },
    Season { show: Post, season: Post },
    Episode { show: Post, season: Post, episode: Post },
    About { show: Post, page: Post },
    Genre { term: Term, shows: Vec<Post> },
    Tagged { tags: Vec<String>, shows: Vec<Post> },
    Aired { year: i32, shows: Vec<Post> },
    BlogPost { show: Post, post: Post },
    Page { page: Post },
    NotFound,
}

impl Resolution {
    /// The single content item this resolution points at, if it is not a listing.
    pub fn item(&self) -> Option<&Post> {
        match self {
            Resolution::Show { show } => Some(show),
            Resolution::Season { season, .. } => Some(season),
            Resolution::Episode { episode, .. } => Some(episode),
            Resolution::About { page, .. } => Some(page),
            Resolution::BlogPost { post, .. } => Some(post),
            Resolution::Page { page } => Some(page),
            Resolution::Genre { .. }
            | Resolution::Tagged { .. }
            | Resolution::Aired { .. }
            | Resolution::NotFound => None,
        }
    }

    pub fn is_found(&self) -> bool {
        !matches!(self, Resolution::NotFound)
    }
}

/// Turns request paths into content using the route table and parent-scoped lookups.
pub struct Resolver<'a> {
    store: &'a ContentStore,
    routes: &'a RouteTable,
}

impl<'a> Resolver<'a> {
    pub fn new(store: &'a ContentStore, routes: &'a RouteTable) -> Self {
        Self { store, routes }
    }

    pub fn resolve(&self, path: &str) -> (Option<RouteMatch>, Resolution) {
        let Some(route) = self.routes.match_path(path) else {
            tracing::debug!(path, "no rewrite rule matched");
            return (None, Resolution::NotFound);
        };

        let resolution = self.resolve_match(&route);
        if !resolution.is_found() {
            tracing::debug!(path, rule = %route.rule, "lookup missed");
        }
        (Some(route), resolution)
    }

    pub fn resolve_match(&self, route: &RouteMatch) -> Resolution {
        let vars = &route.vars;
        let resolved = match route.rule {
            RuleName::Episode => self.episode(vars),
            RuleName::Season => self.season(vars),
            RuleName::About => self.about(vars),
            RuleName::ShowOrGenre => self.show_or_genre(vars),
            RuleName::Tagged => Some(self.tagged(vars)),
            RuleName::Aired => self.aired(vars),
            RuleName::BlogPost => self.blog_post(vars),
            RuleName::Page => self.page(vars),
        };
        resolved.unwrap_or(Resolution::NotFound)
    }

    fn show(&self, vars: &QueryVars) -> Option<&'a Post> {
        self.store
            .get_post_by_slug(vars.show.as_deref()?, PostKind::Show, None)
    }

    fn season_of(&self, show: &Post, vars: &QueryVars) -> Option<&'a Post> {
        self.store
            .get_post_by_slug(vars.season.as_deref()?, PostKind::Season, Some(show.id))
    }

    fn episode(&self, vars: &QueryVars) -> Option<Resolution> {
        let show = self.show(vars)?;
        let season = self.season_of(show, vars)?;
        let episode = self.store.get_post_by_slug(
            vars.episode.as_deref()?,
            PostKind::Episode,
            Some(season.id),
        )?;
        Some(Resolution::Episode {
            show: show.clone(),
            season: season.clone(),
            episode: episode.clone(),
        })
    }

    fn season(&self, vars: &QueryVars) -> Option<Resolution> {
        let show = self.show(vars)?;
        let season = self.season_of(show, vars)?;
        Some(Resolution::Season {
            show: show.clone(),
            season: season.clone(),
        })
    }

    fn about(&self, vars: &QueryVars) -> Option<Resolution> {
        let show = self.show(vars)?;
        let page = show
            .about_page
            .and_then(|id| self.store.get(id))
            .filter(|page| page.kind == PostKind::Page);

        // a show without an About page is served as the show itself
        Some(match page {
            Some(page) => Resolution::About {
                show: show.clone(),
                page: page.clone(),
            },
            None => Resolution::Show { show: show.clone() },
        })
    }

    fn show_or_genre(&self, vars: &QueryVars) -> Option<Resolution> {
        let slug = vars.show.as_deref()?;
        if let Some(term) = self.store.get_term_by_slug(slug, Taxonomy::Genre) {
            let shows = self.store.shows_with_any_term(Taxonomy::Genre, &[slug]);
            return Some(Resolution::Genre {
                term: term.clone(),
                shows: shows.into_iter().cloned().collect(),
            });
        }

        let show = self.show(vars)?;
        Some(Resolution::Show { show: show.clone() })
    }

    fn tagged(&self, vars: &QueryVars) -> Resolution {
        let tags: Vec<&str> = vars
            .tags
            .as_deref()
            .unwrap_or_default()
            .split('_')
            .filter(|t| !t.is_empty())
            .collect();
        let shows = self.store.shows_with_any_term(Taxonomy::Tag, &tags);

        Resolution::Tagged {
            tags: tags.into_iter().map(String::from).collect(),
            shows: shows.into_iter().cloned().collect(),
        }
    }

    fn aired(&self, vars: &QueryVars) -> Option<Resolution> {
        let year = vars.year?;
        let shows = self.store.shows_aired_in(year);
        Some(Resolution::Aired {
            year,
            shows: shows.into_iter().cloned().collect(),
        })
    }

    fn blog_post(&self, vars: &QueryVars) -> Option<Resolution> {
        let show = self.show(vars)?;
        let post = self
            .store
            .children(show.id, PostKind::Post)
            .filter(|p| vars.post_id.map_or(true, |id| p.id == id))
            .filter(|p| vars.name.as_deref().map_or(true, |name| p.slug == name))
            .find(|p| date_matches(p, vars))?;

        Some(Resolution::BlogPost {
            show: show.clone(),
            post: post.clone(),
        })
    }

    /// Pages, then posts without a blog permalink, by slug.
    fn page(&self, vars: &QueryVars) -> Option<Resolution> {
        let slug = vars.name.as_deref()?;
        let page = self
            .store
            .get_post_by_slug(slug, PostKind::Page, None)
            .or_else(|| {
                self.store
                    .posts()
                    .iter()
                    .filter(|p| p.kind == PostKind::Post && p.slug == slug)
                    .find(|p| !self.has_blog_permalink(p))
            })?;
        Some(Resolution::Page { page: page.clone() })
    }

    /// Posts under a show live at the blog structure unless it needs a date they lack.
    fn has_blog_permalink(&self, post: &Post) -> bool {
        let under_show = post
            .parent
            .and_then(|id| self.store.get(id))
            .is_some_and(|parent| parent.kind == PostKind::Show);
        under_show && (post.date.is_some() || !self.routes.blog().needs_date())
    }
}

/// Every date part captured from the path must agree with the post's date.
fn date_matches(post: &Post, vars: &QueryVars) -> bool {
    if vars.year.is_none() && vars.month.is_none() && vars.day.is_none() {
        return true;
    }
    let Some(date) = post.date else {
        return false;
    };
    vars.year.map_or(true, |y| date.year() == y)
        && vars.month.map_or(true, |m| date.month() == m)
        && vars.day.map_or(true, |d| date.day() == d)
}
