use anyhow::{Context, Result};
use chrono::{Month, NaiveDate};
use regex::{Captures, Regex};
use serde::Serialize;
use std::borrow::Cow;
use std::fmt;

use super::structure::{PostStructure, StructureValues};
use crate::domain::models::PostKind;
use crate::domain::slug::ReservedSlugs;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum RuleName {
    BlogPost,
    Episode,
    About,
    Tagged,
    Aired,
    Season,
    ShowOrGenre,
    Page,
}

impl fmt::Display for RuleName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RuleName::BlogPost => "blog-post",
            RuleName::Episode => "episode",
            RuleName::About => "about",
            RuleName::Tagged => "tagged",
            RuleName::Aired => "aired",
            RuleName::Season => "season",
            RuleName::ShowOrGenre => "show-or-genre",
            RuleName::Page => "page",
        };
        f.write_str(name)
    }
}

/// Values captured from a request path by a rewrite rule.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct QueryVars {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub show: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub season: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub episode: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub post_id: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub year: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub month: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub day: Option<u32>,
}

impl QueryVars {
    /// Builds vars from named captures. `None` when a numeric or month capture does not parse.
    fn from_captures(caps: &Captures<'_>) -> Option<Self> {
        let text = |name: &str| caps.name(name).map(|m| m.as_str().to_string());

        let month = match (caps.name("monthnum"), caps.name("monthname")) {
            (Some(num), _) => Some(num.as_str().parse().ok()?),
            (None, Some(name)) => Some(name.as_str().parse::<Month>().ok()?.number_from_month()),
            (None, None) => None,
        };

        Some(QueryVars {
            show: text("show"),
            season: text("season"),
            episode: text("episode"),
            tags: text("tags"),
            name: text("name"),
            post_id: caps.name("post_id").map(|m| m.as_str().parse()).transpose().ok()?,
            year: caps.name("year").map(|m| m.as_str().parse()).transpose().ok()?,
            month,
            day: caps.name("day").map(|m| m.as_str().parse()).transpose().ok()?,
        })
    }
}

#[derive(Debug, Clone)]
pub struct RewriteRule {
    pub name: RuleName,
    pub pattern: Regex,
    pub example: String,
}

/// Result of matching a path against the route table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RouteMatch {
    pub rule: RuleName,
    pub vars: QueryVars,
}

/// Ordered rewrite rules; the first rule whose pattern matches wins.
#[derive(Debug, Clone)]
pub struct RouteTable {
    blog: PostStructure,
    reserved: ReservedSlugs,
    rules: Vec<RewriteRule>,
}

impl RouteTable {
    pub fn new(base: &str, blog: &PostStructure) -> Result<Self> {
        let base = base.trim_matches('/').to_string();
        let b = regex::escape(&base);
        let seg = "[^/]+";

        let blog_example = blog
            .render(&StructureValues {
                show: "game-of-thrones",
                post_name: "season-6-air-date",
                post_id: 42,
                date: NaiveDate::from_ymd_opt(2015, 2, 9),
            })
            .unwrap_or_default();

        let entries = [
            (
                RuleName::BlogPost,
                blog.regex_source(),
                format!("/{blog_example}/"),
            ),
            (
                RuleName::Episode,
                format!("^{b}/(?P<show>{seg})/(?P<season>{seg})/(?P<episode>{seg})/?$"),
                format!("/{base}/game-of-thrones/season-1/winter-is-coming/"),
            ),
            (
                RuleName::About,
                format!("^{b}/(?P<show>{seg})/about/?$"),
                format!("/{base}/game-of-thrones/about/"),
            ),
            (
                RuleName::Tagged,
                format!("^{b}/tagged/(?P<tags>{seg})/?$"),
                format!("/{base}/tagged/popular_currently-airing/"),
            ),
            (
                RuleName::Aired,
                format!("^{b}/aired/(?P<year>[0-9]{{4}})/?$"),
                format!("/{base}/aired/2015/"),
            ),
            (
                RuleName::Season,
                format!("^{b}/(?P<show>{seg})/(?P<season>{seg})/?$"),
                format!("/{base}/game-of-thrones/season-1/"),
            ),
            (
                RuleName::ShowOrGenre,
                format!("^{b}/(?P<show>{seg})/?$"),
                format!("/{base}/game-of-thrones/"),
            ),
            (
                RuleName::Page,
                format!("^(?P<name>{seg})/?$"),
                "/contact/".to_string(),
            ),
        ];

        let rules = entries
            .into_iter()
            .map(|(name, source, example)| {
                let pattern = Regex::new(&source)
                    .with_context(|| format!("Invalid pattern for rule {name}: {source}"))?;
                Ok(RewriteRule {
                    name,
                    pattern,
                    example,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            blog: blog.clone(),
            reserved: shadowed_slugs(&base, blog),
            rules,
        })
    }

    /// Structure the blog-post rule was built from.
    pub fn blog(&self) -> &PostStructure {
        &self.blog
    }

    /// Slugs whose permalinks an earlier rule would capture.
    pub fn reserved_slugs(&self) -> &ReservedSlugs {
        &self.reserved
    }

    pub fn rules(&self) -> &[RewriteRule] {
        &self.rules
    }

    /// Matches a request path, percent-encoded or not, against the rules in order.
    pub fn match_path(&self, path: &str) -> Option<RouteMatch> {
        let path = normalize_path(path);
        let path = urlencoding::decode(path).unwrap_or(Cow::Borrowed(path));
        self.rules.iter().find_map(|rule| {
            let caps = rule.pattern.captures(&path)?;
            let vars = QueryVars::from_captures(&caps)?;
            Some(RouteMatch {
                rule: rule.name,
                vars,
            })
        })
    }
}

/// The blog rule is tried before the hierarchy rules. When its structure sits under
/// the base and is no deeper than an episode path, each literal segment hides show,
/// season or episode slugs at the same depth.
fn shadowed_slugs(base: &str, blog: &PostStructure) -> ReservedSlugs {
    let mut reserved = ReservedSlugs::default();
    let segments: Vec<&str> = blog.segments().collect();
    if segments.len() > 4 || segments.first() != Some(&base) {
        return reserved;
    }

    for (depth, segment) in segments.iter().enumerate().skip(1) {
        if segment.contains('%') {
            continue;
        }
        let kind = match depth {
            1 => PostKind::Show,
            2 => PostKind::Season,
            _ => PostKind::Episode,
        };
        reserved.reserve(kind, *segment);
    }
    reserved
}

/// Drops the query string, fragment and leading slashes from a request path.
pub fn normalize_path(path: &str) -> &str {
    let end = path.find(['?', '#']).unwrap_or(path.len());
    path[..end].trim_start_matches('/')
}
