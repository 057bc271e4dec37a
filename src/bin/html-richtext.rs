use std::env;
use std::io::{Read, Write};
use std::process::ExitCode;

use html_richtext::{
    html_to_string, html_to_styled, try_html_to_string, try_html_to_styled, HtmlStyle, StyledText,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum OutputFormat {
    Plain,
    Spans,
    Json,
}

#[derive(Clone, Debug)]
struct Args {
    input_path: Option<String>,
    format: OutputFormat,
    compact: bool,
    colors: bool,
    indent_unit: f32,
    strict: bool,
}

fn main() -> ExitCode {
    match run(env::args().collect()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(msg) => {
            eprintln!("error: {}", msg);
            eprintln!("{}", help_text());
            ExitCode::FAILURE
        }
    }
}

fn run(args: Vec<String>) -> Result<(), String> {
    let cli = parse_args(args)?;
    let html = read_input(cli.input_path.as_deref())?;
    let style = HtmlStyle {
        indent_unit: cli.indent_unit,
        text_color_enabled: cli.colors,
        ..HtmlStyle::default()
    };

    let rendered = match cli.format {
        OutputFormat::Plain => {
            let mut text = if cli.strict {
                try_html_to_string(&html, cli.compact).map_err(|e| e.to_string())?
            } else {
                html_to_string(&html, cli.compact)
            };
            text.push('\n');
            text
        }
        OutputFormat::Spans | OutputFormat::Json => {
            let styled = if cli.strict {
                try_html_to_styled(&html, cli.compact, &style, None).map_err(|e| e.to_string())?
            } else {
                html_to_styled(&html, cli.compact, &style, None)
            };
            if cli.format == OutputFormat::Json {
                let mut json = serde_json::to_string_pretty(&styled).map_err(|e| e.to_string())?;
                json.push('\n');
                json
            } else {
                span_dump(&styled)
            }
        }
    };

    std::io::stdout()
        .write_all(rendered.as_bytes())
        .map_err(|e| e.to_string())
}

fn read_input(path: Option<&str>) -> Result<String, String> {
    match path {
        Some(path) if path != "-" => {
            std::fs::read_to_string(path).map_err(|e| format!("failed to read {}: {}", path, e))
        }
        _ => {
            let mut html = String::new();
            std::io::stdin()
                .read_to_string(&mut html)
                .map_err(|e| format!("failed to read stdin: {}", e))?;
            Ok(html)
        }
    }
}

/// Text followed by one line per range: `kind start..end "covered text" payload`.
fn span_dump(styled: &StyledText) -> String {
    let mut out = String::with_capacity(styled.text.len() * 2);
    out.push_str(&styled.text);
    out.push_str("\n---\n");
    for range in &styled.span_styles {
        out.push_str(&format!(
            "style {}..{} {:?} {:?}\n",
            range.start,
            range.end,
            styled.slice(range),
            range.item
        ));
    }
    for range in &styled.links {
        out.push_str(&format!(
            "link {}..{} {:?} {}\n",
            range.start,
            range.end,
            styled.slice(range),
            range.item.url
        ));
    }
    for range in &styled.paragraph_styles {
        out.push_str(&format!(
            "paragraph {}..{} indent={}\n",
            range.start, range.end, range.item.text_indent.first_line
        ));
    }
    out
}

fn parse_args(args: Vec<String>) -> Result<Args, String> {
    if args.len() >= 2 && (args[1] == "--help" || args[1] == "-h") {
        return Err("help requested".to_string());
    }

    let mut cfg = Args {
        input_path: None,
        format: OutputFormat::Plain,
        compact: false,
        colors: false,
        indent_unit: HtmlStyle::default().indent_unit,
        strict: false,
    };

    let mut i = 1usize;
    while i < args.len() {
        match args[i].as_str() {
            "--format" => {
                let v = args
                    .get(i + 1)
                    .ok_or_else(|| "--format requires a value".to_string())?;
                cfg.format = match v.as_str() {
                    "plain" => OutputFormat::Plain,
                    "spans" => OutputFormat::Spans,
                    "json" => OutputFormat::Json,
                    other => return Err(format!("invalid --format value '{}'", other)),
                };
                i += 2;
            }
            "--indent-unit" => {
                let v = args
                    .get(i + 1)
                    .ok_or_else(|| "--indent-unit requires a value".to_string())?;
                cfg.indent_unit = v
                    .parse::<f32>()
                    .map_err(|_| format!("invalid --indent-unit value '{}'", v))?;
                i += 2;
            }
            "--compact" => {
                cfg.compact = true;
                i += 1;
            }
            "--colors" => {
                cfg.colors = true;
                i += 1;
            }
            "--strict" => {
                cfg.strict = true;
                i += 1;
            }
            other if other.starts_with("--") => {
                return Err(format!("unknown option '{}'", other));
            }
            path => {
                if cfg.input_path.is_some() {
                    return Err(format!("unexpected extra argument '{}'", path));
                }
                cfg.input_path = Some(path.to_string());
                i += 1;
            }
        }
    }

    Ok(cfg)
}

fn help_text() -> &'static str {
    r#"html-richtext - convert HTML to plain or styled text

USAGE:
  cargo run --features cli --bin html-richtext -- [input.html|-] [options]

Reads standard input when no path (or `-`) is given.

OPTIONS:
  --format <plain|spans|json>  output format (default: plain)
  --compact                    single newline between blocks
  --colors                     honor inline style colors (spans/json)
  --indent-unit <n>            paragraph indent unit, 0 for textual indents (default: 24)
  --strict                     fail on tokenizer errors instead of stopping early
  -h, --help                   show this help
"#
}
