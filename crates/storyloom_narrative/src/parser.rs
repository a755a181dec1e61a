//! Best-effort parsing of raw story text into a title and pages.
//!
//! Text providers are asked for a `Title:` line followed by `Page N` markers,
//! but they decorate, renumber, and sometimes echo illustration directions
//! into the prose. The parser tolerates all of that and always returns
//! exactly the requested number of non-empty pages.

use regex::Regex;
use std::sync::LazyLock;
use storyloom_error::{ParseError, ParseErrorKind};
use tracing::debug;

const CONTINUATIONS: [&str; 3] = [
    "And so {name}'s adventure went on, one brave step at a time.",
    "{name} smiled, ready for whatever would happen next.",
    "With a happy heart, {name} kept exploring.",
];

/// Title and pages recovered from a narrative response.
#[derive(Debug, Clone)]
pub struct ParsedNarrative {
    /// Story title, `Story of {name}` when none was found
    pub title: String,
    /// Page texts, exactly as many as requested
    pub pages: Vec<String>,
    /// Pages filled with continuation sentences
    pub padded_pages: usize,
    /// Problems recovered from, for logging
    pub issues: Vec<ParseError>,
}

/// Compiled patterns for narrative parsing.
#[derive(Debug, Clone)]
pub struct NarrativeParser {
    title: Regex,
    page_marker: Regex,
    labelled_direction: Regex,
    inline_direction: Regex,
    paragraph_break: Regex,
}

impl NarrativeParser {
    /// Compile the parser's patterns.
    ///
    /// # Errors
    ///
    /// Returns `InvalidPattern` if a pattern fails to compile.
    pub fn new() -> Result<Self, ParseError> {
        Ok(Self {
            title: compile(r"(?im)^[ \t#*_]*title[ \t]*[*_]*[ \t]*:[ \t]*(.+?)[ \t]*$")?,
            page_marker: compile(
                r"(?im)^[ \t#*_]*page[ \t]*(\d+)[ \t]*[*_]*[ \t]*(?:[:.)\-][ \t]*)?[*_]*[ \t]*",
            )?,
            labelled_direction: compile(
                r"(?i)^[ \t]*[*_]*[ \t]*(?:illustration|image|picture|art)(?:[ \t]+(?:description|prompt|idea|note))?[ \t]*[*_]*[ \t]*:",
            )?,
            inline_direction: compile(r"(?i)[\[(][ \t]*(?:illustration|image|picture)[^\])\n]*[\])]")?,
            paragraph_break: compile(r"\n[ \t]*\r?\n")?,
        })
    }

    /// Split `raw` into a title and exactly `page_count` pages.
    ///
    /// Missing titles default to `Story of {protagonist}`. Short stories are
    /// padded with continuation sentences naming the protagonist; long ones
    /// are truncated. Without page markers, blank-line paragraphs are used.
    pub fn parse(&self, raw: &str, page_count: usize, protagonist: &str) -> ParsedNarrative {
        let mut issues = Vec::new();

        let title_match = self.title.captures(raw).and_then(|caps| {
            let whole = caps.get(0)?;
            let title = clean_title(caps.get(1)?.as_str());
            (!title.is_empty()).then_some((whole.range(), title))
        });
        let (title, body) = match title_match {
            Some((range, title)) => {
                let mut body = String::with_capacity(raw.len());
                body.push_str(&raw[..range.start]);
                body.push_str(&raw[range.end..]);
                (title, body)
            }
            None => {
                issues.push(ParseError::new(ParseErrorKind::MissingTitle));
                (format!("Story of {}", protagonist.trim()), raw.to_string())
            }
        };

        let sections = self.sections(&body, &mut issues);
        let mut pages = Vec::with_capacity(page_count);
        for (position, section) in sections.into_iter().enumerate() {
            let text = self.clean_page(&section);
            if text.is_empty() {
                issues.push(ParseError::new(ParseErrorKind::EmptyPage(position + 1)));
            } else {
                pages.push(text);
            }
        }

        let found = pages.len();
        let mut padded_pages = 0;
        if found < page_count {
            issues.push(ParseError::new(ParseErrorKind::TooFewPages {
                expected: page_count,
                found,
            }));
            while pages.len() < page_count {
                pages.push(continuation(protagonist, padded_pages));
                padded_pages += 1;
            }
        } else if found > page_count {
            issues.push(ParseError::new(ParseErrorKind::TooManyPages {
                expected: page_count,
                found,
            }));
            pages.truncate(page_count);
        }

        debug!(
            found,
            padded_pages,
            issues = issues.len(),
            "Parsed narrative"
        );

        ParsedNarrative {
            title,
            pages,
            padded_pages,
            issues,
        }
    }

    fn sections(&self, body: &str, issues: &mut Vec<ParseError>) -> Vec<String> {
        let markers: Vec<_> = self.page_marker.find_iter(body).collect();
        if markers.is_empty() {
            issues.push(ParseError::new(ParseErrorKind::MissingPageMarkers));
            return self
                .paragraph_break
                .split(body)
                .map(str::to_string)
                .filter(|paragraph| !paragraph.trim().is_empty())
                .collect();
        }

        markers
            .iter()
            .enumerate()
            .map(|(i, marker)| {
                let end = markers
                    .get(i + 1)
                    .map(|next| next.start())
                    .unwrap_or(body.len());
                body[marker.end()..end].to_string()
            })
            .collect()
    }

    fn clean_page(&self, section: &str) -> String {
        section
            .lines()
            .filter(|line| !self.labelled_direction.is_match(line))
            .map(|line| {
                let stripped = self.inline_direction.replace_all(line, "");
                stripped.split_whitespace().collect::<Vec<_>>().join(" ")
            })
            .filter(|line| !line.is_empty())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

static PARSER: LazyLock<Result<NarrativeParser, ParseError>> = LazyLock::new(NarrativeParser::new);

/// Parse with the shared parser.
///
/// # Examples
///
/// ```
/// use storyloom_narrative::parse_narrative;
///
/// let raw = "**Title:** Luna and the Whale\n\n\
///            Page 1: Luna dove into the sea.\n\
///            [Illustration: a girl diving]\n\
///            PAGE 2 - A whale sang hello.";
/// let parsed = parse_narrative(raw, 3, "Luna");
///
/// assert_eq!(parsed.title, "Luna and the Whale");
/// assert_eq!(parsed.pages[0], "Luna dove into the sea.");
/// assert_eq!(parsed.pages[1], "A whale sang hello.");
/// assert_eq!(parsed.pages.len(), 3);
/// assert_eq!(parsed.padded_pages, 1);
/// ```
pub fn parse_narrative(raw: &str, page_count: usize, protagonist: &str) -> ParsedNarrative {
    match &*PARSER {
        Ok(parser) => parser.parse(raw, page_count, protagonist),
        Err(error) => {
            let mut pages: Vec<String> = raw
                .split("\n\n")
                .map(str::trim)
                .filter(|paragraph| !paragraph.is_empty())
                .map(str::to_string)
                .take(page_count)
                .collect();
            let mut padded_pages = 0;
            while pages.len() < page_count {
                pages.push(continuation(protagonist, padded_pages));
                padded_pages += 1;
            }
            ParsedNarrative {
                title: format!("Story of {}", protagonist.trim()),
                pages,
                padded_pages,
                issues: vec![error.clone()],
            }
        }
    }
}

fn compile(pattern: &str) -> Result<Regex, ParseError> {
    Regex::new(pattern).map_err(|e| ParseError::new(ParseErrorKind::InvalidPattern(e.to_string())))
}

fn clean_title(raw: &str) -> String {
    raw.trim_matches(|c: char| matches!(c, '*' | '_' | '#' | '"' | '\'') || c.is_whitespace())
        .to_string()
}

fn continuation(protagonist: &str, n: usize) -> String {
    CONTINUATIONS[n % CONTINUATIONS.len()].replace("{name}", protagonist.trim())
}
