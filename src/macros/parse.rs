//! Macro source text to an expression tree.
//!
//! ```text
//! expr   := atom | seq
//! atom   := ["\"] word | quoted
//! seq    := ["\"] ( "[" expr* "]" | "{" expr* "}" | "(" expr* ")" )
//! quoted := '"' ( char | '\"' | '\\' | '\n' | '\t' )* '"'
//! ```
//!
//! A leading backslash marks an element as meta. `#` starts a comment that
//! runs to the end of the line.

use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Brace {
    Square,
    Curly,
    Paren,
}

impl Brace {
    fn open(c: char) -> Option<Self> {
        match c {
            '[' => Some(Self::Square),
            '{' => Some(Self::Curly),
            '(' => Some(Self::Paren),
            _ => None,
        }
    }

    fn close_char(self) -> char {
        match self {
            Self::Square => ']',
            Self::Curly => '}',
            Self::Paren => ')',
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expr {
    Atom {
        text: String,
        quoted: bool,
        meta: bool,
    },
    Seq {
        brace: Brace,
        meta: bool,
        elems: Vec<Expr>,
    },
}

impl Expr {
    pub fn atom(text: &str) -> Self {
        Expr::Atom {
            text: text.to_string(),
            quoted: false,
            meta: false,
        }
    }

    /// Text of an atom, `None` for sequences.
    pub fn text(&self) -> Option<&str> {
        match self {
            Expr::Atom { text, .. } => Some(text),
            Expr::Seq { .. } => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("unterminated string starting at offset {0}")]
    UnterminatedString(usize),
    #[error("unknown escape '\\{ch}' at offset {pos}")]
    BadEscape { pos: usize, ch: char },
    #[error("unexpected '{ch}' at offset {pos}")]
    UnexpectedClose { pos: usize, ch: char },
    #[error("'{open}' at offset {pos} is never closed")]
    Unclosed { pos: usize, open: char },
    #[error("dangling '\\' at offset {0}")]
    DanglingMeta(usize),
}

/// Parse a whole macro body into its top level expressions.
pub fn parse(src: &str) -> Result<Vec<Expr>, ParseError> {
    let mut parser = Parser {
        chars: src.char_indices().collect(),
        at: 0,
    };
    parser.sequence(None)
}

struct Parser {
    chars: Vec<(usize, char)>,
    at: usize,
}

fn is_delimiter(c: char) -> bool {
    c.is_whitespace() || matches!(c, '[' | ']' | '{' | '}' | '(' | ')' | '"' | '#')
}

impl Parser {
    fn peek(&self) -> Option<(usize, char)> {
        self.chars.get(self.at).copied()
    }

    fn bump(&mut self) -> Option<(usize, char)> {
        let c = self.peek();
        if c.is_some() {
            self.at += 1;
        }
        c
    }

    fn skip_blank(&mut self) {
        while let Some((_, c)) = self.peek() {
            if c.is_whitespace() {
                self.at += 1;
            } else if c == '#' {
                while let Some((_, c)) = self.bump() {
                    if c == '\n' {
                        break;
                    }
                }
            } else {
                break;
            }
        }
    }

    /// Parse elements until `close` (or end of input at top level).
    fn sequence(&mut self, open: Option<(usize, Brace)>) -> Result<Vec<Expr>, ParseError> {
        let mut elems = Vec::new();
        loop {
            self.skip_blank();
            let Some((pos, c)) = self.peek() else {
                return match open {
                    None => Ok(elems),
                    Some((pos, brace)) => Err(ParseError::Unclosed {
                        pos,
                        open: match brace {
                            Brace::Square => '[',
                            Brace::Curly => '{',
                            Brace::Paren => '(',
                        },
                    }),
                };
            };
            if matches!(c, ']' | '}' | ')') {
                return match open {
                    Some((_, brace)) if brace.close_char() == c => {
                        self.at += 1;
                        Ok(elems)
                    }
                    _ => Err(ParseError::UnexpectedClose { pos, ch: c }),
                };
            }
            elems.push(self.expr()?);
        }
    }

    fn expr(&mut self) -> Result<Expr, ParseError> {
        let mut meta = false;
        if let Some((pos, '\\')) = self.peek() {
            self.at += 1;
            match self.peek() {
                Some((_, c)) if !c.is_whitespace() && !matches!(c, ']' | '}' | ')' | '#') => {
                    meta = true
                }
                _ => return Err(ParseError::DanglingMeta(pos)),
            }
        }
        // peek succeeded in the caller or above
        let Some((pos, c)) = self.peek() else {
            return Err(ParseError::DanglingMeta(self.chars.len()));
        };
        if let Some(brace) = Brace::open(c) {
            self.at += 1;
            let elems = self.sequence(Some((pos, brace)))?;
            return Ok(Expr::Seq { brace, meta, elems });
        }
        if c == '"' {
            self.at += 1;
            let text = self.quoted(pos)?;
            return Ok(Expr::Atom {
                text,
                quoted: true,
                meta,
            });
        }
        let mut text = String::new();
        while let Some((_, c)) = self.peek() {
            if is_delimiter(c) {
                break;
            }
            text.push(c);
            self.at += 1;
        }
        Ok(Expr::Atom {
            text,
            quoted: false,
            meta,
        })
    }

    fn quoted(&mut self, start: usize) -> Result<String, ParseError> {
        let mut text = String::new();
        loop {
            match self.bump() {
                None => return Err(ParseError::UnterminatedString(start)),
                Some((_, '"')) => return Ok(text),
                Some((pos, '\\')) => match self.bump() {
                    Some((_, '"')) => text.push('"'),
                    Some((_, '\\')) => text.push('\\'),
                    Some((_, 'n')) => text.push('\n'),
                    Some((_, 't')) => text.push('\t'),
                    Some((_, ch)) => return Err(ParseError::BadEscape { pos, ch }),
                    None => return Err(ParseError::UnterminatedString(start)),
                },
                Some((_, c)) => text.push(c),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quoted(s: &str) -> Expr {
        Expr::Atom {
            text: s.to_string(),
            quoted: true,
            meta: false,
        }
    }

    #[test]
    fn test_atoms_and_strings() {
        let exprs = parse(r#""Hello" enter  "a \"b\" \\ c""#).unwrap();
        assert_eq!(
            exprs,
            vec![quoted("Hello"), Expr::atom("enter"), quoted(r#"a "b" \ c"#)]
        );
    }

    #[test]
    fn test_nested_sequences() {
        let exprs = parse("(firefox [tap t ctrl] {left click})").unwrap();
        assert_eq!(exprs.len(), 1);
        let Expr::Seq { brace, elems, meta } = &exprs[0] else {
            panic!("expected sequence");
        };
        assert_eq!(*brace, Brace::Paren);
        assert!(!meta);
        assert_eq!(elems[0], Expr::atom("firefox"));
        assert!(matches!(
            &elems[1],
            Expr::Seq { brace: Brace::Square, elems, .. } if elems.len() == 3
        ));
        assert!(matches!(&elems[2], Expr::Seq { brace: Brace::Curly, .. }));
    }

    #[test]
    fn test_adjacent_tokens_split_on_brackets() {
        let exprs = parse(r#"a[b]"c"d"#).unwrap();
        assert_eq!(exprs.len(), 4);
        assert_eq!(exprs[0], Expr::atom("a"));
        assert_eq!(exprs[2], quoted("c"));
        assert_eq!(exprs[3], Expr::atom("d"));
    }

    #[test]
    fn test_meta_marker() {
        let exprs = parse(r"[\down shift]").unwrap();
        let Expr::Seq { elems, .. } = &exprs[0] else {
            panic!("expected sequence");
        };
        assert_eq!(
            elems[0],
            Expr::Atom {
                text: "down".to_string(),
                quoted: false,
                meta: true
            }
        );
    }

    #[test]
    fn test_comments_skipped() {
        let exprs = parse("a # tap a\n b").unwrap();
        assert_eq!(exprs, vec![Expr::atom("a"), Expr::atom("b")]);
    }

    #[test]
    fn test_errors() {
        assert_eq!(parse(r#""abc"#), Err(ParseError::UnterminatedString(0)));
        assert_eq!(
            parse("[a}"),
            Err(ParseError::UnexpectedClose { pos: 2, ch: '}' })
        );
        assert_eq!(parse("a ]"), Err(ParseError::UnexpectedClose { pos: 2, ch: ']' }));
        assert_eq!(parse("{a b"), Err(ParseError::Unclosed { pos: 0, open: '{' }));
        assert_eq!(parse(r"a \ b"), Err(ParseError::DanglingMeta(2)));
        assert_eq!(parse(r#""\q""#), Err(ParseError::BadEscape { pos: 1, ch: 'q' }));
    }

    #[test]
    fn test_empty_source() {
        assert_eq!(parse("  \n ").unwrap(), Vec::new());
    }
}
