use super::models::PostKind;

/// Longest slug the store will hand out, suffix included.
pub const MAX_SLUG_LEN: usize = 200;

/// Turns a title into a URL-safe slug: lowercase ASCII alphanumerics joined by single
/// dashes. Accented Latin letters are folded to their base letters; anything else
/// separates words.
pub fn sanitize_slug(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    let mut pending_dash = false;

    for c in title.chars().flat_map(char::to_lowercase) {
        let folded = match c {
            'a'..='z' | '0'..='9' => None,
            '\'' | '’' => continue,
            _ => match fold_latin(c) {
                Some(folded) => Some(folded),
                None => {
                    pending_dash = true;
                    continue;
                }
            },
        };
        if pending_dash && !slug.is_empty() {
            slug.push('-');
        }
        pending_dash = false;
        match folded {
            Some(folded) => slug.push_str(folded),
            None => slug.push(c),
        }
    }

    truncate_chars(&slug, MAX_SLUG_LEN).to_string()
}

fn fold_latin(c: char) -> Option<&'static str> {
    let folded = match c {
        'à' | 'á' | 'â' | 'ã' | 'ä' | 'å' | 'ā' | 'ă' | 'ą' => "a",
        'æ' => "ae",
        'ç' | 'ć' | 'č' => "c",
        'ď' | 'đ' | 'ð' => "d",
        'è' | 'é' | 'ê' | 'ë' | 'ē' | 'ė' | 'ę' | 'ě' => "e",
        'ğ' => "g",
        'ì' | 'í' | 'î' | 'ï' | 'ī' | 'į' | 'ı' => "i",
        'ł' | 'ľ' | 'ĺ' => "l",
        'ñ' | 'ń' | 'ň' => "n",
        'ò' | 'ó' | 'ô' | 'õ' | 'ö' | 'ø' | 'ō' | 'ő' => "o",
        'œ' => "oe",
        'ř' | 'ŕ' => "r",
        'ß' => "ss",
        'ś' | 'š' | 'ş' => "s",
        'ť' | 'ţ' => "t",
        'þ' => "th",
        'ù' | 'ú' | 'û' | 'ü' | 'ū' | 'ů' | 'ű' | 'ų' => "u",
        'ý' | 'ÿ' => "y",
        'ź' | 'ż' | 'ž' => "z",
        _ => return None,
    };
    Some(folded)
}

/// Slugs a kind may not take because a literal segment of the route table would
/// shadow its permalink.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReservedSlugs {
    entries: Vec<(PostKind, String)>,
}

impl Default for ReservedSlugs {
    /// The literal segments every route table has: `about` under a show and
    /// `tagged` / `aired` under the base.
    fn default() -> Self {
        let mut reserved = Self {
            entries: Vec::new(),
        };
        reserved.reserve(PostKind::Season, "about");
        reserved.reserve(PostKind::Show, "tagged");
        reserved.reserve(PostKind::Show, "aired");
        reserved
    }
}

impl ReservedSlugs {
    pub fn reserve(&mut self, kind: PostKind, slug: impl Into<String>) {
        let slug = slug.into();
        if !self.contains(&slug, kind) {
            self.entries.push((kind, slug));
        }
    }

    pub fn contains(&self, slug: &str, kind: PostKind) -> bool {
        self.entries.iter().any(|(k, s)| *k == kind && s == slug)
    }
}

/// Returns `original` when it is free, otherwise the lowest `original-N` (N >= 2)
/// that `is_taken` rejects, truncating `original` so the result stays within
/// [`MAX_SLUG_LEN`].
pub fn unique_slug(original: &str, is_taken: impl Fn(&str) -> bool) -> String {
    if !is_taken(original) {
        return original.to_string();
    }

    let mut suffix: u64 = 2;
    loop {
        let suffix_str = suffix.to_string();
        let room = MAX_SLUG_LEN - (suffix_str.len() + 1);
        let candidate = format!("{}-{suffix_str}", truncate_chars(original, room));
        if !is_taken(&candidate) {
            return candidate;
        }
        suffix += 1;
    }
}

fn truncate_chars(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_slug() {
        assert_eq!(sanitize_slug("Game of Thrones"), "game-of-thrones");
        assert_eq!(sanitize_slug("  Season 1  "), "season-1");
        assert_eq!(sanitize_slug("Winter Is Coming!"), "winter-is-coming");
        assert_eq!(sanitize_slug("The North Remembers"), "the-north-remembers");
        assert_eq!(sanitize_slug("Don't Panic"), "dont-panic");
        assert_eq!(sanitize_slug("Sci-Fi / Fantasy"), "sci-fi-fantasy");
        assert_eq!(sanitize_slug("???"), "");
    }

    #[test]
    fn test_sanitize_slug_truncates() {
        let long = "a".repeat(300);
        assert_eq!(sanitize_slug(&long).len(), MAX_SLUG_LEN);
    }

    #[test]
    fn test_unique_slug_free() {
        assert_eq!(unique_slug("season-1", |_| false), "season-1");
    }

    #[test]
    fn test_unique_slug_lowest_unused_suffix() {
        let taken = ["season-1", "season-1-2", "season-1-4"];
        let slug = unique_slug("season-1", |s| taken.contains(&s));
        assert_eq!(slug, "season-1-3");
    }

    #[test]
    fn test_unique_slug_keeps_length_limit() {
        let original = "b".repeat(MAX_SLUG_LEN);
        let slug = unique_slug(&original, |s| s == original);
        assert_eq!(slug.len(), MAX_SLUG_LEN);
        assert!(slug.ends_with("-2"));
    }

    #[test]
    fn test_sanitize_slug_is_ascii() {
        assert_eq!(sanitize_slug("Café Society"), "cafe-society");
        assert_eq!(sanitize_slug("Straße der Wölfe"), "strasse-der-wolfe");
        assert_eq!(sanitize_slug("Ænima Œuvre"), "aenima-oeuvre");
        assert_eq!(sanitize_slug("進撃の巨人 Season 1"), "season-1");
        assert_eq!(sanitize_slug("進撃の巨人"), "");
        assert!(sanitize_slug("Señor Ñandú, déjà vu")
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-'));
    }

    #[test]
    fn test_reserved_slugs() {
        let mut reserved = ReservedSlugs::default();
        assert!(reserved.contains("about", PostKind::Season));
        assert!(reserved.contains("tagged", PostKind::Show));
        assert!(!reserved.contains("about", PostKind::Episode));
        assert!(!reserved.contains("blog", PostKind::Season));

        reserved.reserve(PostKind::Season, "news");
        reserved.reserve(PostKind::Season, "news");
        assert!(reserved.contains("news", PostKind::Season));
        assert_eq!(reserved.entries.len(), 4);
    }
}
