//! Line classification for template directives.
//!
//! Every directive lives on its own line and starts with the special marker
//! prefix `// --`. Matching is whitespace-tolerant: leading and trailing
//! whitespace around the line is ignored.

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;

/// The prefix that marks a line as a directive candidate.
pub const SPECIAL_PREFIX: &str = "// --";

/// Opens the section that declares control types.
pub const BEGIN_TYPES: &str = "// -- begin types --";

/// Closes the section that declares control types.
pub const END_TYPES: &str = "// -- end types --";

/// Opens the shared copy body.
pub const BEGIN_COPY: &str = "// -- begin control copy --";

/// Closes the shared copy body.
pub const END_COPY: &str = "// -- end control copy --";

/// Emits every declared control.
pub const WRITE_ALL: &str = "// -- write controls --";

/// Closes a foreach loop.
pub const END_FOREACH: &str = "// -- endforeach --";

/// Any line starting with this is treated as a foreach header and must parse as one.
pub const FOREACH_PREFIX: &str = "// -- foreach ";

/// `// -- Name : Base --`, the trailing `--` being optional.
static TYPE_ENTRY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*//\s*--\s*(?P<name>\w+)\s*:\s*(?P<base>\w+)\s*(?:--)?\s*$")
        .expect("type entry pattern is valid")
});

/// `// -- foreach a, b in [ ... ] --`
static FOREACH: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*//\s*--\s*foreach\s+(?P<vars>.+?)\s+in\s+\[(?P<list>.*)\]\s*--\s*$")
        .expect("foreach pattern is valid")
});

static IDENTIFIER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\w+$").expect("identifier pattern is valid"));

/// A recognized directive. Directives are consumed as soon as they are seen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Directive {
    BeginTypes,
    EndTypes,
    TypeEntry { name: String, base: String },
    BeginCopy,
    EndCopy,
    WriteAll,
    /// Loop header: variable names and the raw text between the brackets.
    Foreach { vars: Vec<String>, list: String },
    EndForeach,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineKind {
    /// Ordinary content, passed through or collected.
    Plain,
    Directive(Directive),
    /// Carries the special prefix but matches no directive grammar.
    Unknown,
}

/// Returns true when the trimmed line is exactly `fragment`.
pub fn line_is(line: &str, fragment: &str) -> bool {
    line.trim() == fragment
}

/// Returns true when the line, ignoring leading whitespace, starts with `fragment`.
pub fn line_begins_with(line: &str, fragment: &str) -> bool {
    line.trim_start().starts_with(fragment)
}

/// Returns true for lines carrying the `// --` marker prefix.
pub fn is_special(line: &str) -> bool {
    line_begins_with(line, SPECIAL_PREFIX)
}

/// Classifies a single template line.
pub fn classify(line: &str) -> LineKind {
    if !is_special(line) {
        return LineKind::Plain;
    }

    let fixed = [
        (BEGIN_TYPES, Directive::BeginTypes),
        (END_TYPES, Directive::EndTypes),
        (BEGIN_COPY, Directive::BeginCopy),
        (END_COPY, Directive::EndCopy),
        (WRITE_ALL, Directive::WriteAll),
        (END_FOREACH, Directive::EndForeach),
    ];
    for (fragment, directive) in fixed {
        if line_is(line, fragment) {
            return LineKind::Directive(directive);
        }
    }

    if line_begins_with(line, FOREACH_PREFIX) {
        return parse_foreach(line)
            .map(LineKind::Directive)
            .unwrap_or(LineKind::Unknown);
    }

    if let Some(cap) = TYPE_ENTRY.captures(line) {
        return LineKind::Directive(Directive::TypeEntry {
            name: cap["name"].to_string(),
            base: cap["base"].to_string(),
        });
    }

    LineKind::Unknown
}

fn parse_foreach(line: &str) -> Option<Directive> {
    let cap = FOREACH.captures(line)?;
    let vars: Vec<String> = cap["vars"]
        .split(',')
        .map(|v| v.trim().to_string())
        .collect();
    if vars.iter().any(|v| !IDENTIFIER.is_match(v)) {
        return None;
    }
    // Each variable may be bound once per element.
    let mut seen = HashSet::new();
    if !vars.iter().all(|v| seen.insert(v.as_str())) {
        return None;
    }
    Some(Directive::Foreach {
        vars,
        list: cap["list"].to_string(),
    })
}
