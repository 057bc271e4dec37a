use std::path::{Path, PathBuf};

pub const SAMPLE_FIXTURE: &str = "tests/fixtures/sample.html";
pub const FEED_FIXTURE: &str = "tests/fixtures/feed_description.html";
pub const MALFORMED_FIXTURE: &str = "tests/fixtures/malformed.html";

pub const CORE_FIXTURES: &[&str] = &[SAMPLE_FIXTURE, FEED_FIXTURE, MALFORMED_FIXTURE];

/// Read a fixture relative to the crate root.
pub fn load(relative: &str) -> String {
    let path = Path::new(env!("CARGO_MANIFEST_DIR")).join(relative);
    std::fs::read_to_string(&path).unwrap_or_else(|e| panic!("read {}: {}", path.display(), e))
}

/// Core fixtures plus any `*.html` dropped under `tests/fixtures/corpus`.
pub fn all_fixtures() -> Vec<(String, String)> {
    let mut out: Vec<(String, String)> = CORE_FIXTURES
        .iter()
        .map(|name| (name.to_string(), load(name)))
        .collect();
    for path in discover_optional_corpus() {
        let Ok(html) = std::fs::read_to_string(&path) else {
            continue;
        };
        out.push((path.display().to_string(), html));
    }
    out
}

pub fn discover_optional_corpus() -> Vec<PathBuf> {
    let root = Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/corpus");
    let Ok(entries) = std::fs::read_dir(&root) else {
        return Vec::new();
    };
    let mut out: Vec<PathBuf> = entries
        .flatten()
        .map(|entry| entry.path())
        .filter(|path| {
            path.extension()
                .and_then(|ext| ext.to_str())
                .is_some_and(|ext| ext.eq_ignore_ascii_case("html"))
        })
        .collect();
    out.sort();
    out
}
