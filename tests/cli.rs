//! Integration tests for the command-line interface.
//!
//! Each test builds its own content file in a temp directory and points the
//! binary at an empty config file so the user's real config is never read.

#![allow(deprecated)]

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

struct Workspace {
    _dir: TempDir,
    content: PathBuf,
    config: PathBuf,
}

impl Workspace {
    fn new() -> Self {
        let dir = TempDir::new().unwrap();
        let content = dir.path().join("content.json");
        let config = dir.path().join("config.toml");
        fs::write(&config, "").unwrap();
        Self {
            _dir: dir,
            content,
            config,
        }
    }

    fn cmd(&self) -> Command {
        let mut cmd = Command::cargo_bin("show-permalinks").unwrap();
        cmd.env_remove("SHOW_PERMALINKS_CONTENT")
            .env_remove("SHOW_PERMALINKS_HOME_URL")
            .arg("--content")
            .arg(&self.content)
            .arg("--config")
            .arg(&self.config);
        cmd
    }

    fn add(&self, args: &[&str]) {
        self.cmd().arg("add").args(args).assert().success();
    }

    fn content_path(&self) -> &Path {
        &self.content
    }
}

/// Show 1..: terms first (fantasy=1, popular=2), then Game of Thrones=3,
/// Season 1=4, Winter Is Coming=5, About page=6.
fn seeded() -> Workspace {
    let ws = Workspace::new();
    ws.add(&["show", "Game of Thrones", "--genre", "Fantasy", "--tag", "popular", "--date", "2011-04-17"]);
    ws.add(&["season", "Season 1", "--parent", "3"]);
    ws.add(&["episode", "Winter Is Coming", "--parent", "4"]);
    ws.add(&["page", "About the Show"]);
    ws.cmd()
        .args(["set-about", "--show", "3", "--page", "6"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Permalink: /shows/game-of-thrones/about/"));
    ws
}

#[test]
fn help_lists_subcommands() {
    Command::cargo_bin("show-permalinks")
        .unwrap()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("resolve"))
        .stdout(predicate::str::contains("permalink"))
        .stdout(predicate::str::contains("serve"));
}

#[test]
fn add_prints_permalink_and_saves() {
    let ws = Workspace::new();
    ws.cmd()
        .args(["add", "show", "The Expanse"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Added show 1 (the-expanse)"))
        .stdout(predicate::str::contains("Permalink: /shows/the-expanse/"));

    let saved = fs::read_to_string(ws.content_path()).unwrap();
    assert!(saved.contains("\"the-expanse\""));
}

#[test]
fn permalink_walks_parent_chain() {
    let ws = seeded();
    ws.cmd()
        .args(["permalink", "3", "4", "5"])
        .assert()
        .success()
        .stdout(predicate::str::diff(
            "/shows/game-of-thrones/\n/shows/game-of-thrones/season-1/\n/shows/game-of-thrones/season-1/winter-is-coming/\n",
        ));
}

#[test]
fn permalink_unknown_id_fails() {
    let ws = seeded();
    ws.cmd()
        .args(["permalink", "99"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("no permalink for post 99"));
}

#[test]
fn duplicate_season_is_suffixed() {
    let ws = seeded();
    ws.cmd()
        .args(["add", "season", "Season 1", "--parent", "3"])
        .assert()
        .success()
        .stdout(predicate::str::contains("(season-1-2)"));
}

#[test]
fn resolve_episode_path() {
    let ws = seeded();
    ws.cmd()
        .args(["resolve", "/shows/game-of-thrones/season-1/winter-is-coming/"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Matched rule: episode"))
        .stdout(predicate::str::contains("\"title\": \"Winter Is Coming\""));
}

#[test]
fn resolve_genre_listing() {
    let ws = seeded();
    ws.cmd()
        .args(["resolve", "/shows/fantasy/"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"type\": \"genre\""));
}

#[test]
fn resolve_miss_fails() {
    let ws = seeded();
    ws.cmd()
        .args(["resolve", "/shows/game-of-thrones/season-9/"])
        .assert()
        .failure()
        .stdout(predicate::str::contains("\"type\": \"not-found\""));
}

#[test]
fn rules_are_listed_in_order() {
    let ws = Workspace::new();
    ws.cmd()
        .arg("rules")
        .assert()
        .success()
        .stdout(predicate::str::is_match(r"(?s)blog-post.*episode.*about.*tagged.*aired.*season.*show-or-genre.*page").unwrap());
}

#[test]
fn config_file_changes_base_and_slash() {
    let ws = Workspace::new();
    fs::write(&ws.config, "base = \"series\"\ntrailing_slash = false\n").unwrap();
    ws.add(&["show", "The Expanse"]);
    ws.cmd()
        .args(["permalink", "1"])
        .assert()
        .success()
        .stdout(predicate::str::diff("/series/the-expanse\n"));
}

#[test]
fn list_shows_owning_show() {
    let ws = seeded();
    ws.cmd()
        .args(["list", "--kind", "season"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Game of Thrones"))
        .stdout(predicate::str::contains("season-1"));
}

#[test]
fn invalid_parent_is_rejected() {
    let ws = seeded();
    ws.cmd()
        .args(["add", "episode", "Pilot", "--parent", "3"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("expected a season"));
}

#[test]
fn list_terms_counts_shows() {
    let ws = seeded();
    ws.cmd()
        .args(["list", "--terms"])
        .assert()
        .success()
        .stdout(predicate::str::is_match(r"genre\s+fantasy\s+Fantasy\s+1 show").unwrap())
        .stdout(predicate::str::contains("popular"));
}

#[test]
fn accented_title_gets_ascii_slug() {
    let ws = Workspace::new();
    ws.cmd()
        .args(["add", "show", "Café Society"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Permalink: /shows/cafe-society/"));
}

#[test]
fn page_and_post_never_share_a_permalink() {
    let ws = Workspace::new();
    ws.add(&["page", "News"]);
    ws.cmd()
        .args(["add", "post", "News"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Permalink: /news-2/"));
}

#[test]
fn blog_structure_segment_is_reserved_for_seasons() {
    let ws = Workspace::new();
    fs::write(&ws.config, "blog_structure = \"shows/%show%/news/%postname%\"\n").unwrap();
    ws.add(&["show", "The Expanse"]);
    ws.cmd()
        .args(["add", "season", "News", "--parent", "1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Permalink: /shows/the-expanse/news-2/"));
    ws.cmd()
        .arg("rules")
        .assert()
        .success()
        .stdout(predicate::str::contains("Blog structure: shows/%show%/news/%postname%"));
}

