//! Terminal presentation helpers shared by the subcommands.
//!
//! Human-readable text goes to stderr; stdout carries only the JSON
//! documents that `--json` asks for, so pipelines can consume them
//! directly. Output modes are mirrored into `VITRINE_*` environment
//! variables by the argument parser, which lets code far from the
//! parser check them without threading flags around.

use std::io::IsTerminal;

/// True when `--json` was given.
pub fn is_json() -> bool {
    std::env::var_os("VITRINE_JSON").is_some()
}

/// True when `--quiet` was given.
pub fn is_quiet() -> bool {
    std::env::var_os("VITRINE_QUIET").is_some()
}

/// Pretty-print a JSON document to stdout.
pub fn print_json(value: &serde_json::Value) {
    if let Ok(rendered) = serde_json::to_string_pretty(value) {
        println!("{rendered}");
    }
}

/// ANSI styling that disables itself when stderr is not a terminal or
/// the user asked for plain output (NO_COLOR convention or --no-color).
pub struct Styled {
    ansi: bool,
}

impl Styled {
    pub fn new() -> Self {
        let plain = std::env::var_os("NO_COLOR").is_some()
            || std::env::var_os("VITRINE_NO_COLOR").is_some();
        Self {
            ansi: !plain && std::io::stderr().is_terminal(),
        }
    }

    fn sgr(&self, code: &str, text: &str) -> String {
        if self.ansi {
            format!("\x1b[{code}m{text}\x1b[0m")
        } else {
            text.to_string()
        }
    }

    pub fn green(&self, text: &str) -> String {
        self.sgr("32", text)
    }

    pub fn red(&self, text: &str) -> String {
        self.sgr("31", text)
    }

    pub fn blue(&self, text: &str) -> String {
        self.sgr("34", text)
    }

    pub fn dim(&self, text: &str) -> String {
        self.sgr("2", text)
    }

    pub fn bold(&self, text: &str) -> String {
        self.sgr("1", text)
    }

    /// Green check mark, or "OK" in plain mode.
    pub fn ok_sym(&self) -> &'static str {
        if self.ansi {
            "\x1b[32m\u{2713}\x1b[0m"
        } else {
            "OK"
        }
    }

    /// Red cross, or "!!" in plain mode.
    pub fn fail_sym(&self) -> &'static str {
        if self.ansi {
            "\x1b[31m\u{2717}\x1b[0m"
        } else {
            "!!"
        }
    }

    /// Yellow warning sign, or "??" in plain mode.
    pub fn warn_sym(&self) -> &'static str {
        if self.ansi {
            "\x1b[33m\u{26a0}\x1b[0m"
        } else {
            "??"
        }
    }

    /// Blue circle for neutral notes, or "--" in plain mode.
    pub fn info_sym(&self) -> &'static str {
        if self.ansi {
            "\x1b[34m\u{25cb}\x1b[0m"
        } else {
            "--"
        }
    }
}

/// Name-and-version banner above multi-section output.
pub fn print_header(s: &Styled) {
    eprintln!(
        "  {} {}",
        s.bold("Vitrine"),
        s.dim(concat!("v", env!("CARGO_PKG_VERSION")))
    );
    eprintln!();
}

/// Bold section title.
pub fn print_section(s: &Styled, title: &str) {
    eprintln!("  {}", s.bold(title));
}

/// One aligned check line under a section.
pub fn print_check(symbol: &str, label: &str, value: &str) {
    eprintln!("    {symbol} {label:<14} {value}");
}

/// Continuation line, indented to the value column of a check.
pub fn print_detail(msg: &str) {
    eprintln!("{:21}{msg}", "");
}

/// Closing verdict line.
pub fn print_status(s: &Styled, verdict: &str, detail: &str) {
    eprintln!();
    eprintln!("  {}: {verdict} ({detail})", s.bold("Status"));
}

/// Byte count as a human-readable size ("28.7 MB").
pub fn format_size(bytes: u64) -> String {
    const UNITS: [&str; 3] = ["KB", "MB", "GB"];
    let mut scaled = bytes as f64;
    let mut unit = None;
    for u in UNITS {
        if scaled < 1024.0 {
            break;
        }
        scaled /= 1024.0;
        unit = Some(u);
    }
    match unit {
        Some(u) => format!("{scaled:.1} {u}"),
        None => format!("{bytes} B"),
    }
}

/// Seconds as a human-readable duration ("2h 14m").
pub fn format_duration(secs: u64) -> String {
    match secs {
        0..=59 => format!("{secs}s"),
        60..=3599 => format!("{}m {}s", secs / 60, secs % 60),
        _ => format!("{}h {}m", secs / 3600, (secs % 3600) / 60),
    }
}
