//! Gettext PO parser using nom
//!
//! Supported subset:
//! ```text
//! # translator comment
//! #, fuzzy, c-format
//! msgctxt "menu"
//! msgid "Open"
//! msgid_plural "Opens"
//! msgstr[0] "Ouvrir"
//! msgstr[1] ""
//! "continued string"
//! ```
//!
//! Units are separated by blank lines or by the start of the next unit.
//! Obsolete (`#~`) entries are skipped. The entry with an empty msgid and no
//! context is the header and is not returned as a unit.

use std::collections::BTreeMap;

use nom::{
    branch::alt,
    bytes::complete::{escaped_transform, is_not, tag},
    character::complete::{char, digit1, space0, space1},
    combinator::{all_consuming, eof, map, map_res, opt, rest, value},
    sequence::{delimited, preceded, tuple},
    IResult,
};

use crate::error::{Error, Result};
use crate::unit::Unit;

/// PO keyword introducing a string
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Keyword {
    /// `msgctxt`
    Msgctxt,
    /// `msgid`
    Msgid,
    /// `msgid_plural`
    MsgidPlural,
    /// `msgstr` or `msgstr[n]`
    Msgstr,
}

/// One classified line of a PO file
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Line {
    /// Empty or whitespace only
    Blank,
    /// Text after the leading `#`
    Comment(String),
    /// Keyword with optional plural index and its first string
    Keyword {
        /// Which keyword
        keyword: Keyword,
        /// `n` in `msgstr[n]`
        index: Option<usize>,
        /// Unescaped string
        text: String,
    },
    /// A bare string continuing the previous keyword
    Continuation(String),
}

/// Parsed file contents
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PoDocument {
    /// msgstr of the header entry
    pub header: Option<String>,
    /// Every non-header unit in file order
    pub units: Vec<Unit>,
}

/// Parse a double-quoted PO string, resolving C escapes
fn quoted(input: &str) -> IResult<&str, String> {
    let escapes = alt((
        value("\\", char('\\')),
        value("\"", char('"')),
        value("\n", char('n')),
        value("\t", char('t')),
        value("\r", char('r')),
    ));
    // escaped_transform rejects an empty body, hence the opt
    let body = map(
        opt(escaped_transform(is_not("\\\""), '\\', escapes)),
        |s: Option<String>| s.unwrap_or_default(),
    );
    delimited(char('"'), body, char('"'))(input)
}

fn keyword(input: &str) -> IResult<&str, Keyword> {
    alt((
        value(Keyword::Msgctxt, tag("msgctxt")),
        value(Keyword::MsgidPlural, tag("msgid_plural")),
        value(Keyword::Msgid, tag("msgid")),
        value(Keyword::Msgstr, tag("msgstr")),
    ))(input)
}

fn plural_index(input: &str) -> IResult<&str, usize> {
    delimited(
        char('['),
        map_res(digit1, |digits: &str| digits.parse::<usize>()),
        char(']'),
    )(input)
}

fn keyword_line(input: &str) -> IResult<&str, Line> {
    map(
        tuple((keyword, opt(plural_index), preceded(space1, quoted))),
        |(keyword, index, text)| Line::Keyword {
            keyword,
            index,
            text,
        },
    )(input)
}

fn comment_line(input: &str) -> IResult<&str, Line> {
    map(preceded(char('#'), rest), |text: &str| {
        Line::Comment(text.to_string())
    })(input)
}

fn continuation_line(input: &str) -> IResult<&str, Line> {
    map(quoted, Line::Continuation)(input)
}

/// Classify a single line (without its line terminator)
pub fn parse_line(input: &str) -> IResult<&str, Line> {
    all_consuming(delimited(
        space0,
        alt((
            comment_line,
            keyword_line,
            continuation_line,
            value(Line::Blank, eof),
        )),
        space0,
    ))(input)
}

/// Unit under construction
#[derive(Default)]
struct UnitBuilder {
    line: usize,
    fuzzy: bool,
    context: Option<String>,
    msgid: Option<String>,
    msgid_plural: Option<String>,
    msgstr: BTreeMap<usize, String>,
    last: Option<(Keyword, usize)>,
}

impl UnitBuilder {
    fn has_msgstr(&self) -> bool {
        !self.msgstr.is_empty()
    }

    fn start(&mut self, line: usize) {
        if self.context.is_none() && self.msgid.is_none() {
            self.line = line;
        }
    }

    fn append(&mut self, text: &str) -> bool {
        let field = match self.last {
            Some((Keyword::Msgctxt, _)) => self.context.as_mut(),
            Some((Keyword::Msgid, _)) => self.msgid.as_mut(),
            Some((Keyword::MsgidPlural, _)) => self.msgid_plural.as_mut(),
            Some((Keyword::Msgstr, index)) => self.msgstr.get_mut(&index),
            None => None,
        };
        match field {
            Some(field) => {
                field.push_str(text);
                true
            }
            None => false,
        }
    }

    /// Take the finished unit, leaving an empty builder behind
    fn finish(&mut self) -> Result<Option<Unit>> {
        let builder = std::mem::take(self);
        let Some(msgid) = builder.msgid else {
            if builder.context.is_some() {
                return Err(Error::parse(builder.line, "msgctxt without msgid"));
            }
            // Stray comments or flags
            return Ok(None);
        };
        if builder.msgstr.is_empty() {
            return Err(Error::parse(builder.line, "msgid without msgstr"));
        }

        let mut source = vec![msgid];
        source.extend(builder.msgid_plural);

        Ok(Some(Unit {
            context: builder.context,
            source,
            target: builder.msgstr.into_values().collect(),
            fuzzy: builder.fuzzy,
            line: builder.line,
        }))
    }
}

/// Parse the text of a PO file
pub fn parse_document(text: &str) -> Result<PoDocument> {
    let mut document = PoDocument::default();
    let mut builder = UnitBuilder::default();

    let push = |document: &mut PoDocument, unit: Option<Unit>| {
        if let Some(unit) = unit {
            if unit.context.is_none() && unit.source[0].is_empty() && document.header.is_none() {
                document.header = unit.target.into_iter().next();
            } else {
                document.units.push(unit);
            }
        }
    };

    for (idx, raw) in text.lines().enumerate() {
        let lineno = idx + 1;
        let (_, line) =
            parse_line(raw).map_err(|_| Error::parse(lineno, format!("unrecognized line: {}", raw.trim())))?;

        match line {
            Line::Blank => push(&mut document, builder.finish()?),
            Line::Comment(comment) => {
                if builder.has_msgstr() {
                    push(&mut document, builder.finish()?);
                }
                if let Some(flags) = comment.strip_prefix(',') {
                    if flags.split(',').any(|flag| flag.trim() == "fuzzy") {
                        builder.fuzzy = true;
                    }
                }
            }
            Line::Keyword {
                keyword,
                index,
                text,
            } => {
                if index.is_some() && keyword != Keyword::Msgstr {
                    return Err(Error::parse(lineno, "only msgstr takes a plural index"));
                }

                match keyword {
                    Keyword::Msgctxt => {
                        if builder.has_msgstr() {
                            push(&mut document, builder.finish()?);
                        } else if builder.msgid.is_some() || builder.context.is_some() {
                            return Err(Error::parse(lineno, "unexpected msgctxt"));
                        }
                        builder.start(lineno);
                        builder.context = Some(text);
                    }
                    Keyword::Msgid => {
                        if builder.has_msgstr() {
                            push(&mut document, builder.finish()?);
                        } else if builder.msgid.is_some() {
                            return Err(Error::parse(lineno, "duplicate msgid"));
                        }
                        builder.start(lineno);
                        builder.msgid = Some(text);
                    }
                    Keyword::MsgidPlural => {
                        if builder.msgid.is_none() || builder.has_msgstr() || builder.msgid_plural.is_some() {
                            return Err(Error::parse(lineno, "unexpected msgid_plural"));
                        }
                        builder.msgid_plural = Some(text);
                    }
                    Keyword::Msgstr => {
                        if builder.msgid.is_none() {
                            return Err(Error::parse(lineno, "msgstr without msgid"));
                        }
                        let slot = index.unwrap_or(0);
                        if builder.msgstr.insert(slot, text).is_some() {
                            return Err(Error::parse(lineno, format!("duplicate msgstr[{}]", slot)));
                        }
                    }
                }
                builder.last = Some((keyword, index.unwrap_or(0)));
            }
            Line::Continuation(text) => {
                if !builder.append(&text) {
                    return Err(Error::parse(lineno, "string without a keyword"));
                }
            }
        }
    }

    push(&mut document, builder.finish()?);
    Ok(document)
}

/// Parse raw file bytes, which must be UTF-8
pub fn parse_bytes(input: &[u8]) -> Result<PoDocument> {
    let text = std::str::from_utf8(input).map_err(|e| {
        let line = input[..e.valid_up_to()].iter().filter(|&&b| b == b'\n').count() + 1;
        Error::parse(line, "invalid UTF-8")
    })?;
    parse_document(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::unit::UnitState;

    const SAMPLE: &str = r#"# Translation of demo
msgid ""
msgstr ""
"Content-Type: text/plain; charset=UTF-8\n"
"Language: fr\n"

#: main.c:10
msgid "Open the file"
msgstr "Ouvrir le fichier"

#, fuzzy, c-format
msgctxt "menu"
msgid "Close"
msgstr "Fermer"

msgid "%d file"
msgid_plural "%d files"
msgstr[0] "%d fichier"
msgstr[1] ""

#~ msgid "Old"
#~ msgstr "Vieux"
"#;

    #[test]
    fn test_parse_quoted() {
        assert_eq!(quoted(r#""plain""#).unwrap(), ("", "plain".to_string()));
        assert_eq!(quoted(r#""""#).unwrap(), ("", String::new()));
        assert_eq!(
            quoted(r#""say \"hi\"\n\tnow\\""#).unwrap().1,
            "say \"hi\"\n\tnow\\"
        );
        assert!(quoted(r#""unterminated"#).is_err());
    }

    #[test]
    fn test_parse_line_kinds() {
        assert_eq!(parse_line("   ").unwrap().1, Line::Blank);
        assert_eq!(parse_line("#, fuzzy").unwrap().1, Line::Comment(", fuzzy".to_string()));
        assert_eq!(
            parse_line(r#"msgstr[1] "b""#).unwrap().1,
            Line::Keyword {
                keyword: Keyword::Msgstr,
                index: Some(1),
                text: "b".to_string()
            }
        );
        assert_eq!(
            parse_line(r#"msgid_plural "files""#).unwrap().1,
            Line::Keyword {
                keyword: Keyword::MsgidPlural,
                index: None,
                text: "files".to_string()
            }
        );
        assert_eq!(parse_line(r#"  "more" "#).unwrap().1, Line::Continuation("more".to_string()));
        assert!(parse_line("msgid").is_err());
        assert!(parse_line("garbage").is_err());
    }

    #[test]
    fn test_parse_document() {
        let doc = parse_document(SAMPLE).unwrap();

        assert_eq!(
            doc.header.as_deref(),
            Some("Content-Type: text/plain; charset=UTF-8\nLanguage: fr\n")
        );
        assert_eq!(doc.units.len(), 3);

        let open = &doc.units[0];
        assert_eq!(open.source, vec!["Open the file"]);
        assert_eq!(open.target, vec!["Ouvrir le fichier"]);
        assert_eq!(open.line, 8);
        assert_eq!(open.state(), UnitState::Translated);

        let close = &doc.units[1];
        assert_eq!(close.context.as_deref(), Some("menu"));
        assert!(close.fuzzy);
        assert_eq!(close.state(), UnitState::Fuzzy);

        let files = &doc.units[2];
        assert!(files.has_plural());
        assert_eq!(files.target, vec!["%d fichier", ""]);
        assert_eq!(files.state(), UnitState::Translated);
    }

    #[test]
    fn test_units_without_blank_separator() {
        let text = "msgid \"a\"\nmsgstr \"A\"\nmsgid \"b\"\nmsgstr \"\"\n";
        let doc = parse_document(text).unwrap();

        assert_eq!(doc.header, None);
        assert_eq!(doc.units.len(), 2);
        assert_eq!(doc.units[1].line, 3);
    }

    #[test]
    fn test_fuzzy_flag_does_not_leak() {
        let text = "#, fuzzy\nmsgid \"a\"\nmsgstr \"A\"\n\nmsgid \"b\"\nmsgstr \"B\"\n";
        let doc = parse_document(text).unwrap();

        assert!(doc.units[0].fuzzy);
        assert!(!doc.units[1].fuzzy);
    }

    #[test]
    fn test_parse_errors_report_line() {
        let cases = [
            ("# note\nmsgstr \"A\"\n", 2),
            ("msgid \"a\"\n", 1),
            ("\"orphan\"\n", 1),
            ("msgid \"a\"\nmsgstr \"A\"\nbogus\n", 3),
            ("msgid \"a\"\nmsgid \"b\"\n", 2),
            ("msgid[0] \"a\"\nmsgstr \"A\"\n", 1),
            ("msgid \"a\"\nmsgstr[0] \"A\"\nmsgstr[0] \"B\"\n", 3),
        ];

        for (text, expected) in cases {
            match parse_document(text) {
                Err(Error::Parse { line, .. }) => assert_eq!(line, expected, "input: {:?}", text),
                other => panic!("expected parse error for {:?}, got {:?}", text, other),
            }
        }
    }

    #[test]
    fn test_parse_bytes_invalid_utf8() {
        let input = b"msgid \"a\"\nmsgstr \"\xff\"\n";
        assert!(matches!(parse_bytes(input), Err(Error::Parse { line: 2, .. })));
    }

    #[test]
    fn test_parse_crlf() {
        let doc = parse_bytes(b"msgid \"a\"\r\nmsgstr \"A\"\r\n").unwrap();
        assert_eq!(doc.units[0].target, vec!["A"]);
    }
}
