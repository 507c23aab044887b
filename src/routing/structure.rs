use anyhow::{bail, Result};
use chrono::{Datelike, NaiveDate};

/// Placeholders a blog permalink structure may use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StructureTag {
    Year,
    MonthNum,
    Day,
    PostName,
    PostId,
    Show,
    MonthNameShort,
    MonthNameFull,
}

impl StructureTag {
    fn parse(token: &str) -> Option<Self> {
        let tag = match token {
            "year" => StructureTag::Year,
            "monthnum" => StructureTag::MonthNum,
            "day" => StructureTag::Day,
            "postname" => StructureTag::PostName,
            "post_id" => StructureTag::PostId,
            "show" => StructureTag::Show,
            "monthnameshort" => StructureTag::MonthNameShort,
            "monthnamefull" => StructureTag::MonthNameFull,
            _ => return None,
        };
        Some(tag)
    }

    /// Regex capture group matching this tag's value in a request path.
    fn pattern(self) -> &'static str {
        match self {
            StructureTag::Year => "(?P<year>[0-9]{4})",
            StructureTag::MonthNum => "(?P<monthnum>[0-9]{1,2})",
            StructureTag::Day => "(?P<day>[0-9]{1,2})",
            StructureTag::PostName => "(?P<name>[^/]+)",
            StructureTag::PostId => "(?P<post_id>[0-9]+)",
            StructureTag::Show => "(?P<show>[^/]+)",
            StructureTag::MonthNameShort => "(?P<monthname>[a-z]{3})",
            StructureTag::MonthNameFull => "(?P<monthname>[a-z]+)",
        }
    }

    fn is_date(self) -> bool {
        matches!(
            self,
            StructureTag::Year
                | StructureTag::MonthNum
                | StructureTag::Day
                | StructureTag::MonthNameShort
                | StructureTag::MonthNameFull
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Part {
    Literal(String),
    Tag(StructureTag),
}

/// Values substituted into a structure when rendering a permalink.
pub struct StructureValues<'a> {
    pub show: &'a str,
    pub post_name: &'a str,
    pub post_id: u64,
    pub date: Option<NaiveDate>,
}

/// A parsed blog permalink structure such as `shows/%show%/blog/%year%/%monthnum%/%postname%`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostStructure {
    raw: String,
    parts: Vec<Part>,
}

impl PostStructure {
    pub fn parse(structure: &str) -> Result<Self> {
        let raw = structure.trim_matches('/').to_string();
        let mut parts = Vec::new();
        let mut rest = raw.as_str();

        while let Some(start) = rest.find('%') {
            if start > 0 {
                parts.push(Part::Literal(rest[..start].to_string()));
            }
            let after = &rest[start + 1..];
            let Some(end) = after.find('%') else {
                bail!("Unterminated tag in permalink structure {structure:?}");
            };
            let token = &after[..end];
            let Some(tag) = StructureTag::parse(token) else {
                bail!("Unknown tag %{token}% in permalink structure {structure:?}");
            };
            if parts.contains(&Part::Tag(tag)) {
                bail!("Tag %{token}% appears twice in permalink structure {structure:?}");
            }
            parts.push(Part::Tag(tag));
            rest = &after[end + 1..];
        }
        if !rest.is_empty() {
            parts.push(Part::Literal(rest.to_string()));
        }

        let has = |tag| parts.contains(&Part::Tag(tag));
        if !has(StructureTag::Show) {
            bail!("Permalink structure {structure:?} must contain %show%");
        }
        if !has(StructureTag::PostName) && !has(StructureTag::PostId) {
            bail!("Permalink structure {structure:?} must contain %postname% or %post_id%");
        }
        if has(StructureTag::MonthNameShort) && has(StructureTag::MonthNameFull) {
            bail!("Permalink structure {structure:?} can only name the month once");
        }

        Ok(Self { raw, parts })
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Path segments of the structure, tags left unexpanded.
    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.raw.split('/').filter(|s| !s.is_empty())
    }

    /// Whether rendering needs the post's date.
    pub fn needs_date(&self) -> bool {
        self.parts
            .iter()
            .any(|p| matches!(p, Part::Tag(tag) if tag.is_date()))
    }

    /// Anchored regex source for the route table.
    pub fn regex_source(&self) -> String {
        let mut source = String::from("^");
        for part in &self.parts {
            match part {
                Part::Literal(text) => source.push_str(&regex::escape(text)),
                Part::Tag(tag) => source.push_str(tag.pattern()),
            }
        }
        source.push_str("/?$");
        source
    }

    /// Renders the structure without leading or trailing slashes. Returns `None` when
    /// the structure needs a date and the post has none.
    pub fn render(&self, values: &StructureValues<'_>) -> Option<String> {
        let mut out = String::new();
        for part in &self.parts {
            match part {
                Part::Literal(text) => out.push_str(text),
                Part::Tag(tag) => {
                    let value = match tag {
                        StructureTag::Show => values.show.to_string(),
                        StructureTag::PostName => values.post_name.to_string(),
                        StructureTag::PostId => values.post_id.to_string(),
                        StructureTag::Year => values.date?.year().to_string(),
                        StructureTag::MonthNum => format!("{:02}", values.date?.month()),
                        StructureTag::Day => format!("{:02}", values.date?.day()),
                        StructureTag::MonthNameShort => {
                            values.date?.format("%b").to_string().to_lowercase()
                        }
                        StructureTag::MonthNameFull => {
                            values.date?.format("%B").to_string().to_lowercase()
                        }
                    };
                    out.push_str(&value);
                }
            }
        }
        Some(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use regex::Regex;

    fn values(date: Option<NaiveDate>) -> StructureValues<'static> {
        StructureValues {
            show: "game-of-thrones",
            post_name: "season-6-air-date",
            post_id: 42,
            date,
        }
    }

    #[test]
    fn test_parse_and_render() {
        let structure =
            PostStructure::parse("/shows/%show%/blog/%year%/%monthnum%/%postname%/").unwrap();
        assert_eq!(structure.as_str(), "shows/%show%/blog/%year%/%monthnum%/%postname%");
        assert!(structure.needs_date());

        let date = NaiveDate::from_ymd_opt(2015, 2, 9);
        assert_eq!(
            structure.render(&values(date)).unwrap(),
            "shows/game-of-thrones/blog/2015/02/season-6-air-date"
        );
        assert_eq!(structure.render(&values(None)), None);
    }

    #[test]
    fn test_month_names() {
        let short = PostStructure::parse("shows/%show%/%monthnameshort%/%postname%").unwrap();
        let full = PostStructure::parse("shows/%show%/%monthnamefull%/%postname%").unwrap();
        let date = NaiveDate::from_ymd_opt(2015, 2, 9);

        assert_eq!(
            short.render(&values(date)).unwrap(),
            "shows/game-of-thrones/feb/season-6-air-date"
        );
        assert_eq!(
            full.render(&values(date)).unwrap(),
            "shows/game-of-thrones/february/season-6-air-date"
        );
    }

    #[test]
    fn test_dateless_structure() {
        let structure = PostStructure::parse("shows/%show%/news/%post_id%").unwrap();
        assert!(!structure.needs_date());
        assert_eq!(
            structure.render(&values(None)).unwrap(),
            "shows/game-of-thrones/news/42"
        );
    }

    #[test]
    fn test_regex_source_matches_rendered_path() {
        let structure =
            PostStructure::parse("shows/%show%/blog/%year%/%monthnum%/%postname%").unwrap();
        let re = Regex::new(&structure.regex_source()).unwrap();

        let caps = re
            .captures("shows/game-of-thrones/blog/2015/02/season-6-air-date/")
            .unwrap();
        assert_eq!(&caps["show"], "game-of-thrones");
        assert_eq!(&caps["year"], "2015");
        assert_eq!(&caps["monthnum"], "02");
        assert_eq!(&caps["name"], "season-6-air-date");
        assert!(re.captures("shows/game-of-thrones/blog/15/02/x").is_none());
    }

    #[test]
    fn test_invalid_structures() {
        assert!(PostStructure::parse("shows/%show%/%bogus%/%postname%").is_err());
        assert!(PostStructure::parse("shows/%show%/%year").is_err());
        assert!(PostStructure::parse("blog/%year%/%postname%").is_err());
        assert!(PostStructure::parse("shows/%show%/%year%").is_err());
        assert!(PostStructure::parse("shows/%show%/%postname%/%postname%").is_err());
        assert!(
            PostStructure::parse("shows/%show%/%monthnameshort%/%monthnamefull%/%postname%")
                .is_err()
        );
    }
}
