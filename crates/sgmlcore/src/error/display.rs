//! Printing diagnostics
//!
//! A diagnostic is printed as its title, the source line it occurred on with
//!     a caret under the offending character, one short block for each entity
//!     reference that led there, and finally its notes:
//!
//! ```text
//! Error: character number 99999999 is out of range
//!  >>> entity e:1:3
//!   |
//! 1 | a &#99999999; b
//!   |   ^
//!   |
//!   = in entity e, referenced here:
//!     doc:2:7  <p>x &e;</p>
//!                   ^
//! ```

use super::{Diagnostic, Severity};
use crate::chars;
use crate::origin::Location;
use sgml_stdext::color::{paint, Style};

/// Additional information attached to an error.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Note {
    Text(String),
    /// A heading followed by a list of items, one per line.
    List(String, Vec<String>),
}

impl<T: Into<String>> From<T> for Note {
    fn from(value: T) -> Self {
        Note::Text(value.into())
    }
}

impl std::fmt::Display for Note {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Note::Text(s) => write!(f, "{s}"),
            Note::List(heading, items) => {
                write!(f, "{heading}")?;
                for item in items {
                    write!(f, "\n- {item}")?;
                }
                Ok(())
            }
        }
    }
}

/// A location resolved to a line of text.
struct SourceLine {
    name: String,
    line_number: usize,
    column: usize,
    content: String,
}

impl SourceLine {
    fn new(location: &Location) -> Option<SourceLine> {
        let origin = location.origin()?;
        let (line_number, column, content) = location.line_and_column()?;
        Some(SourceLine {
            name: origin.display_name(),
            line_number,
            column,
            content: chars::to_string(&content),
        })
    }
}

/// The locations of a diagnostic that have text, innermost first.
///
/// Character reference origins have no text of their own and are skipped;
///     their parent location is where the reference is.
fn source_chain(location: &Location) -> Vec<(Option<String>, SourceLine)> {
    let mut lines = vec![];
    let mut reason: Option<String> = None;
    for l in location.chain() {
        let Some(origin) = l.origin() else {
            continue;
        };
        match SourceLine::new(l) {
            Some(line) => {
                lines.push((reason.take(), line));
                reason = Some(origin.display_name());
            }
            None => {
                if reason.is_none() {
                    reason = Some(origin.display_name());
                }
            }
        }
    }
    lines
}

pub fn format_diagnostic(f: &mut std::fmt::Formatter<'_>, diagnostic: &Diagnostic) -> std::fmt::Result {
    let (label, style) = match diagnostic.severity() {
        Severity::Warning => ("Warning", Style::Warning),
        Severity::Quantity | Severity::Error => ("Error", Style::Error),
    };
    writeln!(
        f,
        "{}: {}",
        paint(label, style),
        paint(diagnostic.title(), Style::Bold)
    )?;
    let chain = match &diagnostic.location {
        None => vec![],
        Some(location) => source_chain(location),
    };
    let margin = chain
        .first()
        .map(|(_, line)| line.line_number.to_string().len() + 1)
        .unwrap_or(2);
    let printer = Printer { margin };

    let mut lines = chain.iter();
    if let Some((_, line)) = lines.next() {
        printer.header(f, line)?;
        printer.empty(f)?;
        printer.source(f, line, style)?;
    }
    for (reason, line) in lines {
        printer.empty(f)?;
        let reason = reason.as_deref().unwrap_or("entity");
        printer.note(f, &format!["in {reason}, referenced here:"])?;
        printer.light_source(f, line)?;
    }
    for note in diagnostic.error.notes() {
        printer.empty(f)?;
        let text = format!["{note}"];
        let mut note_lines = text.lines();
        if let Some(first) = note_lines.next() {
            printer.note(f, &format!["{} {}", paint("note:", Style::Bold), first])?;
        }
        for line in note_lines {
            printer.continuation(f, line)?;
        }
    }
    Ok(())
}

struct Printer {
    margin: usize,
}

impl Printer {
    fn gutter(&self, content: &str, separator: char) -> String {
        paint(
            format!["{}{} {} ", " ".repeat(self.margin.saturating_sub(content.len() + 1)), content, separator],
            Style::Margin,
        )
    }

    fn header(&self, f: &mut std::fmt::Formatter<'_>, line: &SourceLine) -> std::fmt::Result {
        writeln!(
            f,
            "{}{} {}:{}:{}",
            " ".repeat(self.margin.saturating_sub(3)),
            paint(">>>", Style::Margin),
            line.name,
            line.line_number,
            line.column + 1
        )
    }

    fn empty(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "{}", self.gutter("", '|').trim_end())
    }

    fn source(&self, f: &mut std::fmt::Formatter<'_>, line: &SourceLine, style: Style) -> std::fmt::Result {
        writeln!(
            f,
            "{}{}",
            self.gutter(&line.line_number.to_string(), '|'),
            line.content.trim_end()
        )?;
        writeln!(
            f,
            "{}{}{}",
            self.gutter("", '|'),
            " ".repeat(line.column),
            paint("^", style)
        )
    }

    fn light_source(&self, f: &mut std::fmt::Formatter<'_>, line: &SourceLine) -> std::fmt::Result {
        let prefix = format!["{}:{}:{}", line.name, line.line_number, line.column + 1];
        writeln!(
            f,
            "{}    {}  {}",
            self.gutter("", ' '),
            prefix,
            line.content.trim_end()
        )?;
        writeln!(
            f,
            "{}    {}{}",
            self.gutter("", ' '),
            " ".repeat(prefix.len() + 2 + line.column),
            paint("^", Style::Context)
        )
    }

    fn note(&self, f: &mut std::fmt::Formatter<'_>, text: &str) -> std::fmt::Result {
        writeln!(f, "{}{}", self.gutter("", '='), text)
    }

    fn continuation(&self, f: &mut std::fmt::Formatter<'_>, text: &str) -> std::fmt::Result {
        writeln!(f, "{}      {}", self.gutter("", ' '), text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chars::to_chars;
    use crate::entity::{DeclType, Entity};
    use crate::error::{CharacterNumberError, Pass2EeError};
    use crate::origin::{EntityOrigin, Origin};
    use std::rc::Rc;

    #[test]
    fn list_note() {
        let note = Note::List("expected one of:".into(), vec!["RE".into(), "RS".into()]);
        assert_eq!(format!["{note}"], "expected one of:\n- RE\n- RS");
    }

    #[test]
    fn without_location() {
        let diagnostic = Diagnostic::new(Pass2EeError, None);
        let output = format!["{diagnostic}"];
        assert!(output.contains("Error"));
        assert!(output.contains("unexpected end of entity"));
    }

    #[test]
    fn entity_context_is_printed() {
        let doc = Origin::document("doc", to_chars("<p>\nx &e; y").into());
        let entity = Rc::new(Entity::internal_text("e", DeclType::GeneralEntity, "a &#99999999; b"));
        let origin = Rc::new(Origin::Entity(EntityOrigin {
            entity,
            text: to_chars("a &#99999999; b").into(),
            parent: Location::new(doc, 6),
            ref_length: 3,
            markup: None,
        }));
        let diagnostic = Diagnostic::new(
            CharacterNumberError {
                digits: "99999999".into(),
            },
            Some(Location::new(origin, 2)),
        );
        let output = format!["{diagnostic}"];
        assert!(output.contains("entity e:1:3"), "{output}");
        assert!(output.contains("in entity e, referenced here:"), "{output}");
        assert!(output.contains("doc:2:3"), "{output}");
    }
}
