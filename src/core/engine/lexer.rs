//! TeX lexer for math-mode input.
//!
//! Follows the TeX tokenization rules that matter inside math:
//! - control words swallow the spaces after them
//! - `\\` and other control symbols are single-character names
//! - `%` comments run to the end of the line
//! - whitespace and newlines collapse into one space token

use super::token::{TexToken, TokenList};

pub struct Lexer<'a> {
    chars: std::iter::Peekable<std::str::Chars<'a>>,
    /// Set after a control word, so following spaces are dropped.
    after_cs: bool,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str) -> Self {
        Lexer {
            chars: input.chars().peekable(),
            after_cs: false,
        }
    }

    fn peek_char(&mut self) -> Option<char> {
        self.chars.peek().copied()
    }

    fn next_char(&mut self) -> Option<char> {
        self.chars.next()
    }

    fn skip_whitespace(&mut self) {
        while matches!(self.peek_char(), Some(c) if c.is_whitespace()) {
            self.next_char();
        }
    }

    /// Read a control sequence name: a run of letters, or one other character.
    fn read_control_seq(&mut self) -> String {
        let mut name = String::new();
        match self.peek_char() {
            Some(c) if c.is_ascii_alphabetic() => {
                while let Some(c) = self.peek_char() {
                    if !c.is_ascii_alphabetic() {
                        break;
                    }
                    name.push(c);
                    self.next_char();
                }
                self.after_cs = true;
            }
            Some(c) => {
                name.push(c);
                self.next_char();
            }
            None => {}
        }
        name
    }

    fn read_comment(&mut self) -> String {
        let mut comment = String::new();
        while let Some(c) = self.peek_char() {
            if c == '\n' || c == '\r' {
                break;
            }
            comment.push(c);
            self.next_char();
        }
        // The line end belongs to the comment.
        if self.peek_char() == Some('\r') {
            self.next_char();
        }
        if self.peek_char() == Some('\n') {
            self.next_char();
        }
        comment
    }

    fn next_token(&mut self) -> Option<TexToken> {
        if self.after_cs {
            self.skip_whitespace();
            self.after_cs = false;
        }

        let c = self.next_char()?;
        let token = match c {
            '\\' => {
                let name = self.read_control_seq();
                if name.is_empty() {
                    TexToken::Char('\\')
                } else {
                    TexToken::ControlSeq(name)
                }
            }
            '{' => TexToken::BeginGroup,
            '}' => TexToken::EndGroup,
            '%' => TexToken::Comment(self.read_comment()),
            '$' => TexToken::MathShift,
            '&' => TexToken::AlignTab,
            '^' => TexToken::Superscript,
            '_' => TexToken::Subscript,
            '~' => TexToken::ActiveChar('~'),
            c if c.is_whitespace() => {
                self.skip_whitespace();
                TexToken::Space
            }
            _ => TexToken::Char(c),
        };
        Some(token)
    }

    pub fn tokenize(self) -> TokenList {
        TokenList::from_vec(self.collect())
    }
}

impl<'a> Iterator for Lexer<'a> {
    type Item = TexToken;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_token()
    }
}

pub fn tokenize(input: &str) -> TokenList {
    Lexer::new(input).tokenize()
}

/// Convert tokens back to source text.
///
/// A space is reinserted after a control word when the next token would
/// otherwise extend its name.
pub fn detokenize(tokens: &[TexToken]) -> String {
    let mut result = String::new();

    for (i, token) in tokens.iter().enumerate() {
        match token {
            TexToken::ControlSeq(name) => {
                result.push('\\');
                result.push_str(name);
                if name.chars().all(|c| c.is_ascii_alphabetic()) {
                    match tokens.get(i + 1) {
                        Some(TexToken::Char(c)) if c.is_ascii_alphabetic() => result.push(' '),
                        _ => {}
                    }
                }
            }
            TexToken::Comment(text) => {
                result.push('%');
                result.push_str(text);
                result.push('\n');
            }
            other => result.push_str(&other.to_string()),
        }
    }

    result
}
