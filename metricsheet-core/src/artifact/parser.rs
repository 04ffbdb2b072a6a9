//! Artifact reader
//!
//! The text is first cut into top-level statements. A statement begins at a
//! line starting with a declaration keyword, or at a line starting with an
//! identifier outside any literal. Each declaration is then read on its own:
//! the `const NAME =` head from the raw text, the literal after transcoding
//! (comments dropped, single-quoted strings rewritten as JSON strings)
//! through serde_json's stream deserializer. A broken declaration never
//! affects its neighbours.

use serde_json::Value;

use crate::error::ArtifactError;

/// One top-level declaration of an artifact
#[derive(Debug)]
pub struct Declaration {
    /// Constant name; `None` when the head itself could not be read
    pub name: Option<String>,
    pub literal: Result<Value, ArtifactError>,
}

/// Read every declaration of an artifact
///
/// Statements that are not declarations are skipped.
pub fn parse_declarations(text: &str) -> Vec<Declaration> {
    let mut declarations = Vec::new();

    for (start, statement) in split_statements(text) {
        if starts_declaration(statement) {
            declarations.push(parse_declaration(statement, start));
        } else if !is_blank(statement) {
            log::debug!("ignoring non-declaration statement at byte {}", start);
        }
    }

    declarations
}

fn parse_declaration(statement: &str, base: usize) -> Declaration {
    let mut head = Scanner::new(statement, base);
    head.keyword("export");
    if !(head.keyword("const") || head.keyword("let") || head.keyword("var")) {
        return Declaration {
            name: None,
            literal: Err(head.expected("a const declaration")),
        };
    }
    let name = match head.identifier() {
        Ok(name) => name,
        Err(e) => {
            return Declaration {
                name: None,
                literal: Err(e),
            };
        }
    };
    head.skip_whitespace();
    if let Err(e) = head.punct('=', "'='") {
        return Declaration {
            name: Some(name),
            literal: Err(e),
        };
    }

    let literal = transcode_from(head.rest(), base + head.pos).and_then(|json| {
        let mut body = Scanner::new(&json, base + head.pos);
        let value = body.literal().map_err(|source| ArtifactError::Literal {
            name: name.clone(),
            source,
        })?;
        body.skip_whitespace();
        body.eat(';');
        if !body.rest().trim().is_empty() {
            log::debug!("ignoring trailing text after {}", name);
        }
        Ok(value)
    });

    Declaration {
        name: Some(name),
        literal,
    }
}

/// Whether `line` opens with `const`, `let` or `var`, optionally exported
fn starts_declaration(line: &str) -> bool {
    let keyword = |text: &str, word: &str| -> Option<usize> {
        let after = text.strip_prefix(word)?;
        after
            .starts_with(char::is_whitespace)
            .then(|| text.len() - after.trim_start().len())
    };

    let line = match keyword(line, "export") {
        Some(len) => &line[len..],
        None => line,
    };
    ["const", "let", "var"]
        .iter()
        .any(|word| keyword(line, word).is_some())
}

fn is_blank(statement: &str) -> bool {
    transcode(statement).is_ok_and(|t| t.trim().is_empty())
}

#[derive(Clone, Copy, PartialEq)]
enum LexState {
    Code,
    LineComment,
    BlockComment,
    Str(char),
}

/// Cut `text` into top-level statements, each with its byte offset
///
/// A line starting with a declaration keyword always starts a statement,
/// even when an earlier literal was left open. A line starting with an
/// identifier starts one when no bracket is open. Strings end at a newline.
fn split_statements(text: &str) -> Vec<(usize, &str)> {
    let mut starts = vec![0];
    let mut state = LexState::Code;
    let mut depth = 0usize;
    let mut line_start = true;
    let mut chars = text.char_indices().peekable();

    while let Some((i, c)) = chars.next() {
        if line_start && state != LexState::BlockComment {
            if starts_declaration(&text[i..]) {
                starts.push(i);
                depth = 0;
            } else if depth == 0 && (c.is_alphabetic() || c == '_' || c == '$') {
                starts.push(i);
            }
        }
        line_start = c == '\n';

        match state {
            LexState::Code => match c {
                '/' if matches!(chars.peek(), Some((_, '/'))) => {
                    chars.next();
                    state = LexState::LineComment;
                }
                '/' if matches!(chars.peek(), Some((_, '*'))) => {
                    chars.next();
                    state = LexState::BlockComment;
                }
                '\'' | '"' => state = LexState::Str(c),
                '{' | '[' => depth += 1,
                '}' | ']' => depth = depth.saturating_sub(1),
                _ => {}
            },
            LexState::LineComment => {
                if c == '\n' {
                    state = LexState::Code;
                }
            }
            LexState::BlockComment => {
                if c == '*' && matches!(chars.peek(), Some((_, '/'))) {
                    chars.next();
                    state = LexState::Code;
                }
            }
            LexState::Str(quote) => {
                if c == '\\' && !matches!(chars.peek(), Some((_, '\n')) | None) {
                    chars.next();
                } else if c == quote || c == '\n' {
                    state = LexState::Code;
                }
            }
        }
    }

    starts.dedup();
    starts
        .iter()
        .enumerate()
        .map(|(n, &start)| {
            let end = starts.get(n + 1).copied().unwrap_or(text.len());
            (start, &text[start..end])
        })
        .collect()
}

/// Rewrite the artifact notation into JSON notation: comments removed,
/// `'...'` strings turned into `"..."` with `\'` unescaped and bare `"`
/// escaped. Double-quoted strings pass through untouched. Strings may not
/// span lines.
pub fn transcode(text: &str) -> Result<String, ArtifactError> {
    transcode_from(text, 0)
}

/// [`transcode`] for a slice starting `base` bytes into the artifact
fn transcode_from(text: &str, base: usize) -> Result<String, ArtifactError> {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.char_indices().peekable();

    while let Some((offset, ch)) = chars.next() {
        let offset = base + offset;
        match ch {
            '/' if matches!(chars.peek(), Some((_, '/'))) => {
                // Line comment; keep the newline as a separator
                for (_, c) in chars.by_ref() {
                    if c == '\n' {
                        out.push('\n');
                        break;
                    }
                }
            }
            '/' if matches!(chars.peek(), Some((_, '*'))) => {
                chars.next();
                let mut prev = '\0';
                let mut closed = false;
                for (_, c) in chars.by_ref() {
                    if prev == '*' && c == '/' {
                        closed = true;
                        break;
                    }
                    prev = c;
                }
                if !closed {
                    return Err(ArtifactError::UnterminatedComment { offset });
                }
                out.push(' ');
            }
            '\'' => {
                out.push('"');
                let mut closed = false;
                while let Some((_, c)) = chars.next() {
                    match c {
                        '\\' => match chars.next() {
                            Some((_, '\'')) => out.push('\''),
                            Some((_, escaped)) => {
                                out.push('\\');
                                out.push(escaped);
                            }
                            None => break,
                        },
                        '"' => out.push_str("\\\""),
                        '\'' => {
                            closed = true;
                            break;
                        }
                        '\n' => break,
                        _ => out.push(c),
                    }
                }
                if !closed {
                    return Err(ArtifactError::UnterminatedString { offset });
                }
                out.push('"');
            }
            '"' => {
                out.push('"');
                let mut closed = false;
                while let Some((_, c)) = chars.next() {
                    if c == '\n' {
                        break;
                    }
                    out.push(c);
                    match c {
                        '\\' => {
                            if let Some((_, escaped)) = chars.next() {
                                out.push(escaped);
                            }
                        }
                        '"' => {
                            closed = true;
                            break;
                        }
                        _ => {}
                    }
                }
                if !closed {
                    return Err(ArtifactError::UnterminatedString { offset });
                }
            }
            _ => out.push(ch),
        }
    }

    Ok(out)
}

/// Cursor over one statement; `base` places it in the whole artifact
struct Scanner<'a> {
    text: &'a str,
    base: usize,
    pos: usize,
}

impl<'a> Scanner<'a> {
    fn new(text: &'a str, base: usize) -> Self {
        Self { text, base, pos: 0 }
    }

    fn rest(&self) -> &'a str {
        &self.text[self.pos..]
    }

    fn skip_whitespace(&mut self) {
        let rest = self.rest();
        self.pos += rest.len() - rest.trim_start().len();
    }

    fn expected(&self, expected: &'static str) -> ArtifactError {
        ArtifactError::Expected {
            expected,
            offset: self.base + self.pos,
        }
    }

    /// Consume `word` followed by whitespace
    fn keyword(&mut self, word: &str) -> bool {
        let Some(after) = self.rest().strip_prefix(word) else {
            return false;
        };
        if !after.starts_with(char::is_whitespace) {
            return false;
        }
        self.pos += word.len();
        self.skip_whitespace();
        true
    }

    fn identifier(&mut self) -> Result<String, ArtifactError> {
        let rest = self.rest();
        let len = rest
            .char_indices()
            .find(|(_, c)| !(c.is_alphanumeric() || *c == '_' || *c == '$'))
            .map(|(i, _)| i)
            .unwrap_or(rest.len());
        if len == 0 {
            return Err(self.expected("an identifier"));
        }
        self.pos += len;
        Ok(rest[..len].to_string())
    }

    fn eat(&mut self, ch: char) -> bool {
        if self.rest().starts_with(ch) {
            self.pos += ch.len_utf8();
            true
        } else {
            false
        }
    }

    fn punct(&mut self, ch: char, expected: &'static str) -> Result<(), ArtifactError> {
        if self.eat(ch) {
            Ok(())
        } else {
            Err(self.expected(expected))
        }
    }

    /// Parse one JSON value and advance past it
    fn literal(&mut self) -> Result<Value, serde_json::Error> {
        let mut stream = serde_json::Deserializer::from_str(self.rest()).into_iter::<Value>();
        let value = match stream.next() {
            Some(result) => result?,
            None => {
                return Err(serde::de::Error::custom("missing literal after '='"));
            }
        };
        self.pos += stream.byte_offset();
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn names(declarations: &[Declaration]) -> Vec<Option<&str>> {
        declarations.iter().map(|d| d.name.as_deref()).collect()
    }

    #[test]
    fn test_transcode_quotes() {
        let out = transcode(r#"{'it\'s': 'say "hi"', "dq": "a'b"}"#).unwrap();
        assert_eq!(out, r#"{"it's": "say \"hi\"", "dq": "a'b"}"#);
    }

    #[test]
    fn test_transcode_ignores_separators_inside_strings() {
        let out = transcode("{'a};//b': 1} // trailing\n/* block */").unwrap();
        let value: Value = serde_json::from_str(&out).unwrap();
        assert_eq!(value, json!({ "a};//b": 1 }));
    }

    #[test]
    fn test_unterminated_string() {
        assert!(matches!(
            transcode("const A = {'open: 1};"),
            Err(ArtifactError::UnterminatedString { offset: 11 })
        ));
        assert!(matches!(
            transcode("{'first\nline': 1}"),
            Err(ArtifactError::UnterminatedString { offset: 1 })
        ));
        assert!(matches!(
            transcode("/* never closed"),
            Err(ArtifactError::UnterminatedComment { offset: 0 })
        ));
    }

    #[test]
    fn test_parse_declarations() {
        let text = "// header\n// Last updated: 2024-01-01 00:00:00\n\n\
                    const A_DATA = {\n  '2024年1月': {\n    'summary': {}\n  }\n};\n\n\
                    const B_DATA = {};\n";
        let declarations = parse_declarations(text);

        assert_eq!(names(&declarations), vec![Some("A_DATA"), Some("B_DATA")]);
        assert_eq!(
            declarations[0].literal.as_ref().unwrap(),
            &json!({ "2024年1月": { "summary": {} } })
        );
    }

    #[test]
    fn test_bad_literal_only_affects_its_declaration() {
        let text = "const A_DATA = { 'x': oops };\nconst B_DATA = { 'y': 2 };\n";
        let declarations = parse_declarations(text);

        assert_eq!(declarations.len(), 2);
        assert!(matches!(declarations[0].literal, Err(ArtifactError::Literal { .. })));
        assert_eq!(declarations[1].literal.as_ref().unwrap(), &json!({ "y": 2 }));
    }

    #[test]
    fn test_truncated_last_declaration_keeps_earlier_ones() {
        let text = "// Dashboard data file\n\
                    const A_DATA = {\n  '2023年12月': {\n    'summary': {}\n  }\n};\n\n\
                    const B_DATA = {\n  '2024年3";
        let declarations = parse_declarations(text);

        assert_eq!(names(&declarations), vec![Some("A_DATA"), Some("B_DATA")]);
        assert!(declarations[0].literal.is_ok());
        assert!(matches!(
            declarations[1].literal,
            Err(ArtifactError::UnterminatedString { .. })
        ));
    }

    #[test]
    fn test_unterminated_string_in_middle_does_not_swallow_next() {
        let text = "const A_DATA = {\n  'broken: 1\n};\nconst B_DATA = { 'y': 2 };\n";
        let declarations = parse_declarations(text);

        assert_eq!(names(&declarations), vec![Some("A_DATA"), Some("B_DATA")]);
        assert!(declarations[0].literal.is_err());
        assert_eq!(declarations[1].literal.as_ref().unwrap(), &json!({ "y": 2 }));
    }

    #[test]
    fn test_other_statements_are_skipped() {
        let text = "const A_DATA = { 'x': 1 };\nwindow.DATA = A_DATA;\n\
                    const B_DATA = { 'y': 'it\\'s; const C = 1' };\nconsole.log('done');\n";
        let declarations = parse_declarations(text);

        assert_eq!(names(&declarations), vec![Some("A_DATA"), Some("B_DATA")]);
        assert_eq!(declarations[0].literal.as_ref().unwrap(), &json!({ "x": 1 }));
        assert_eq!(
            declarations[1].literal.as_ref().unwrap(),
            &json!({ "y": "it's; const C = 1" })
        );
        assert!(parse_declarations("window.data = 1;").is_empty());
        assert!(parse_declarations("").is_empty());
    }

    #[test]
    fn test_bad_head_has_no_name() {
        let declarations = parse_declarations("const = { 'x': 1 };\nconst B_DATA = {};\n");

        assert_eq!(names(&declarations), vec![None, Some("B_DATA")]);
        assert!(matches!(
            declarations[0].literal,
            Err(ArtifactError::Expected { offset: 6, .. })
        ));
    }
}
