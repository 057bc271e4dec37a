//! DHAT heap profiler for html-richtext.
//!
//! Profiles allocation patterns of each conversion stage:
//! tokenize -> reconcile -> plain / styled.
//!
//! Usage:
//!   cargo run -p html-richtext-heap-profile --release -- [OPTIONS] [HTML_FILES...]
//!
//! Outputs dhat-<phase>.json files in the output directory (default: target/memory).
//! Open in https://nnethercote.github.io/dh_view/dh_view.html

#[global_allocator]
static ALLOC: dhat::Alloc = dhat::Alloc;

use std::path::{Path, PathBuf};
use std::process::Command;

use html_richtext::{
    html_to_string, html_to_styled, AttributeLookup, HtmlHandler, HtmlParser, HtmlStyle,
    QuickXmlParser, TagReconciler,
};

const DEFAULT_FIXTURES: &[&str] = &[
    "tests/fixtures/sample.html",
    "tests/fixtures/feed_description.html",
    "tests/fixtures/malformed.html",
];

/// Repetitions per file so steady-state allocations dominate the profile.
const ROUNDS: usize = 50;

#[derive(Clone, Copy, PartialEq, Eq)]
enum Phase {
    Tokenize,
    Reconcile,
    Plain,
    Styled,
    Full,
}

impl Phase {
    fn from_str(s: &str) -> Option<Self> {
        match s {
            "tokenize" => Some(Self::Tokenize),
            "reconcile" => Some(Self::Reconcile),
            "plain" => Some(Self::Plain),
            "styled" => Some(Self::Styled),
            "full" => Some(Self::Full),
            _ => None,
        }
    }

    fn name(self) -> &'static str {
        match self {
            Self::Tokenize => "tokenize",
            Self::Reconcile => "reconcile",
            Self::Plain => "plain",
            Self::Styled => "styled",
            Self::Full => "full",
        }
    }
}

/// Handler that only counts events, isolating tokenizer allocations.
#[derive(Default)]
struct EventCounter {
    opens: usize,
    closes: usize,
    text_bytes: usize,
}

impl HtmlHandler for EventCounter {
    fn on_open_tag(&mut self, _name: &str, attributes: &dyn AttributeLookup) {
        self.opens += 1;
        let _ = attributes.attribute("style");
    }

    fn on_close_tag(&mut self, _name: &str) {
        self.closes += 1;
    }

    fn on_text(&mut self, text: &str) {
        self.text_bytes += text.len();
    }
}

fn profile_file(path: &Path, phase: Phase) {
    let path_str = path.to_string_lossy();
    let html = std::fs::read_to_string(path).unwrap_or_else(|e| panic!("read {}: {}", path_str, e));
    let style = HtmlStyle {
        text_color_enabled: true,
        ..HtmlStyle::default()
    };

    for _ in 0..ROUNDS {
        match phase {
            Phase::Tokenize => {
                let mut counter = EventCounter::default();
                QuickXmlParser::new(&html).parse(&mut counter);
            }
            Phase::Reconcile => {
                let mut reconciler = TagReconciler::new(EventCounter::default());
                QuickXmlParser::new(&html).parse(&mut reconciler);
                let counter = reconciler.into_inner();
                if counter.opens != counter.closes {
                    panic!("reconcile {}: unbalanced tags", path_str);
                }
            }
            Phase::Plain => {
                let _text = html_to_string(&html, false);
            }
            Phase::Styled => {
                let _styled = html_to_styled(&html, false, &style, None);
            }
            Phase::Full => {
                let text = html_to_string(&html, false);
                let styled = html_to_styled(&html, false, &style, None);
                if text.is_empty() != styled.text.is_empty() {
                    panic!("full {}: plain and styled output disagree", path_str);
                }
            }
        }
    }
}

/// Extract a short name from a file path for use in output filenames.
fn short_name(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "unknown".to_string())
}

fn usage() {
    eprintln!("Usage: heap-profile [OPTIONS] [HTML_FILES...]");
    eprintln!();
    eprintln!("Options:");
    eprintln!(
        "  --phase <tokenize|reconcile|plain|styled|full>  Conversion stage to profile (default: styled)"
    );
    eprintln!("  --out-dir <DIR>     Output directory for dhat JSON (default: target/memory)");
    eprintln!("  --aggregate         Single profile for all files (default: per-file)");
    eprintln!();
    eprintln!("By default, each file gets its own clean DHAT profile (separate process).");
    eprintln!("If no HTML files are given, profiles the test fixtures.");
}

fn main() {
    let args: Vec<String> = std::env::args().skip(1).collect();

    let mut phase = Phase::Styled;
    let mut out_dir = PathBuf::from("target/memory");
    let mut files: Vec<PathBuf> = Vec::with_capacity(8);
    let mut aggregate = false;
    // Set in child processes, which profile exactly one file.
    let mut single_file_mode = false;
    let mut i = 0;

    while i < args.len() {
        match args[i].as_str() {
            "--phase" => {
                i += 1;
                let value = args.get(i).map(String::as_str).unwrap_or_default();
                phase = Phase::from_str(value).unwrap_or_else(|| {
                    eprintln!("Unknown phase: {}", value);
                    usage();
                    std::process::exit(1);
                });
            }
            "--out-dir" => {
                i += 1;
                if let Some(dir) = args.get(i) {
                    out_dir = PathBuf::from(dir);
                }
            }
            "--aggregate" => {
                aggregate = true;
            }
            "--single-file" => {
                single_file_mode = true;
            }
            "--help" | "-h" => {
                usage();
                std::process::exit(0);
            }
            other => {
                files.push(PathBuf::from(other));
            }
        }
        i += 1;
    }

    if files.is_empty() {
        files.extend(
            DEFAULT_FIXTURES
                .iter()
                .map(PathBuf::from)
                .filter(|path| path.exists()),
        );
    }

    if files.is_empty() {
        eprintln!("No HTML files found. Provide paths or run from the workspace root.");
        std::process::exit(1);
    }

    std::fs::create_dir_all(&out_dir).unwrap_or_else(|e| {
        eprintln!("Failed to create output dir {}: {}", out_dir.display(), e);
        std::process::exit(1);
    });

    let phase_name = phase.name();

    if single_file_mode {
        assert!(files.len() == 1, "--single-file expects exactly one file");
        let file = &files[0];
        let json_path = out_dir.join(format!("dhat-{phase_name}-{}.json", short_name(file)));

        let _profiler = dhat::Profiler::builder().file_name(json_path).build();
        profile_file(file, phase);
        return;
    }

    if aggregate {
        let json_path = out_dir.join(format!("dhat-{phase_name}.json"));
        eprintln!(
            "heap-profile: phase={}, files={} (aggregate), out={}",
            phase_name,
            files.len(),
            out_dir.display()
        );

        let _profiler = dhat::Profiler::builder()
            .file_name(json_path.clone())
            .build();
        for file in &files {
            eprintln!("  profiling: {}", file.display());
            profile_file(file, phase);
        }
        eprintln!(
            "Done. Open {} in https://nnethercote.github.io/dh_view/dh_view.html",
            json_path.display()
        );
        return;
    }

    let self_exe = std::env::current_exe().unwrap_or_else(|e| {
        eprintln!("Failed to determine own executable path: {}", e);
        std::process::exit(1);
    });

    eprintln!(
        "heap-profile: phase={}, files={} (per-file), out={}",
        phase_name,
        files.len(),
        out_dir.display()
    );

    let mut any_failed = false;
    for file in &files {
        eprintln!(
            "  profiling: {} -> dhat-{}-{}.json",
            file.display(),
            phase_name,
            short_name(file)
        );

        let status = Command::new(&self_exe)
            .arg("--single-file")
            .arg("--phase")
            .arg(phase_name)
            .arg("--out-dir")
            .arg(&out_dir)
            .arg(file)
            .status();

        match status {
            Ok(s) if s.success() => {}
            Ok(s) => {
                eprintln!("    FAILED (exit {})", s.code().unwrap_or(-1));
                any_failed = true;
            }
            Err(e) => {
                eprintln!("    FAILED to spawn: {}", e);
                any_failed = true;
            }
        }
    }

    eprintln!();
    eprintln!("Open profiles in https://nnethercote.github.io/dh_view/dh_view.html");

    if any_failed {
        std::process::exit(1);
    }
}
