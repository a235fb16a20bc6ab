//! Position cursor over a borrowed token slice.
//!
//! The cursor is the only mutable state shared between the host parser and
//! the macro package. It only moves forward. Scans (`group_end`,
//! `closer_end`, ...) are read-only and report token indices; callers then
//! hand those indices to the host parser as end conditions.

use super::lexer::detokenize;
use super::token::TexToken;

/// Where the next argument lies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Extent {
    /// `{ ... }`; `open` and `close` index the braces.
    Braced { open: usize, close: usize },
    /// A `{` with no matching `}` before the limit.
    Unclosed { open: usize },
    /// One token at `start`; `end` is exclusive.
    Single { start: usize, end: usize },
}

#[derive(Debug, Clone)]
pub struct TokenCursor<'a> {
    tokens: &'a [TexToken],
    pos: usize,
    limit: usize,
}

impl<'a> TokenCursor<'a> {
    pub fn new(tokens: &'a [TexToken]) -> Self {
        Self {
            tokens,
            pos: 0,
            limit: tokens.len(),
        }
    }

    pub fn tokens(&self) -> &'a [TexToken] {
        self.tokens
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    /// Exclusive end of the currently visible window.
    pub fn limit(&self) -> usize {
        self.limit
    }

    fn skip_trivia_from(&self, mut i: usize) -> usize {
        while i < self.limit && self.tokens[i].is_trivia() {
            i += 1;
        }
        i
    }

    fn get(&self, i: usize) -> Option<&'a TexToken> {
        if i < self.limit {
            self.tokens.get(i)
        } else {
            None
        }
    }

    /// Next visible token. Skips spaces and comments.
    pub fn peek(&mut self) -> Option<&'a TexToken> {
        self.pos = self.skip_trivia_from(self.pos);
        self.get(self.pos)
    }

    /// Index of the next visible token (or the limit).
    pub fn peek_index(&mut self) -> usize {
        self.pos = self.skip_trivia_from(self.pos);
        self.pos
    }

    pub fn advance(&mut self) -> Option<&'a TexToken> {
        let token = self.peek()?;
        self.pos += 1;
        Some(token)
    }

    /// Consume `c` if it is the next visible token.
    pub fn eat_char(&mut self, c: char) -> bool {
        if self.peek().is_some_and(|t| t.is_char(c)) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    pub fn peek_char(&mut self) -> Option<char> {
        self.peek().and_then(TexToken::as_char)
    }

    pub fn is_at_end(&mut self) -> bool {
        self.peek().is_none()
    }

    /// Shrink the visible window to end at `limit`; returns the previous
    /// limit for [`TokenCursor::restore`].
    pub fn narrow(&mut self, limit: usize) -> usize {
        let previous = self.limit;
        self.limit = limit.min(previous);
        previous
    }

    pub fn restore(&mut self, limit: usize) {
        self.limit = limit;
    }

    /// Move forward to `pos`.
    pub fn jump_to(&mut self, pos: usize) {
        debug_assert!(pos >= self.pos, "cursor moved backwards");
        self.pos = pos.max(self.pos);
    }

    /// Source text of `tokens[start..end]`.
    pub fn text(&self, start: usize, end: usize) -> String {
        let end = end.min(self.tokens.len());
        if start >= end {
            return String::new();
        }
        detokenize(&self.tokens[start..end]).trim().to_string()
    }

    /// Index of the `}` matching the `{` at `open`.
    pub fn group_end(&self, open: usize) -> Option<usize> {
        let mut depth = 0usize;
        for i in open..self.limit {
            match self.tokens[i] {
                TexToken::BeginGroup => depth += 1,
                TexToken::EndGroup => {
                    depth = depth.saturating_sub(1);
                    if depth == 0 {
                        return Some(i);
                    }
                }
                _ => {}
            }
        }
        None
    }

    /// Index of the character closing the one at `open`, skipping nested
    /// braces and nested pairs of the same kind. A bar closes at the next
    /// bar on the same brace level.
    pub fn closer_end(&self, open: usize, open_char: char, close_char: char) -> Option<usize> {
        let mut braces = 0usize;
        let mut nested = 0usize;
        for i in open + 1..self.limit {
            match &self.tokens[i] {
                TexToken::BeginGroup => braces += 1,
                TexToken::EndGroup => {
                    if braces == 0 {
                        return None;
                    }
                    braces -= 1;
                }
                TexToken::Char(c) if braces == 0 => {
                    if *c == close_char {
                        if nested == 0 {
                            return Some(i);
                        }
                        nested -= 1;
                    } else if *c == open_char {
                        nested += 1;
                    }
                }
                _ => {}
            }
        }
        None
    }

    /// End of the enclosing scope from `from`: the first unmatched `}` or
    /// the limit.
    pub fn scope_end(&self, from: usize) -> usize {
        let mut depth = 0usize;
        for i in from..self.limit {
            match self.tokens[i] {
                TexToken::BeginGroup => depth += 1,
                TexToken::EndGroup => {
                    if depth == 0 {
                        return i;
                    }
                    depth -= 1;
                }
                _ => {}
            }
        }
        self.limit
    }

    /// Locate the next argument without consuming it.
    ///
    /// A single-token argument is any visible token that does not end a
    /// group, a cell or a row, and is not a closing bracket.
    pub fn argument_extent(&mut self) -> Option<Extent> {
        let start = self.peek_index();
        let token = self.get(start)?;
        match token {
            TexToken::BeginGroup => Some(match self.group_end(start) {
                Some(close) => Extent::Braced { open: start, close },
                None => Extent::Unclosed { open: start },
            }),
            TexToken::EndGroup | TexToken::AlignTab => None,
            TexToken::Char(')') | TexToken::Char(']') => None,
            t if t.is_row_break() => None,
            _ => Some(Extent::Single {
                start,
                end: start + 1,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::engine::lexer::tokenize;

    #[test]
    fn test_peek_skips_spaces() {
        let tokens = tokenize("  % note\n x");
        let mut cursor = TokenCursor::new(tokens.as_slice());
        assert_eq!(cursor.peek(), Some(&TexToken::Char('x')));
    }

    #[test]
    fn test_group_end_nested() {
        let tokens = tokenize("{a{b}c}d");
        let cursor = TokenCursor::new(tokens.as_slice());
        assert_eq!(cursor.group_end(0), Some(6));
    }

    #[test]
    fn test_closer_end_skips_nested_pairs() {
        let tokens = tokenize("(a(b){)}c)");
        let cursor = TokenCursor::new(tokens.as_slice());
        assert_eq!(cursor.closer_end(0, '(', ')'), Some(9));
    }

    #[test]
    fn test_closer_end_stops_at_group_end() {
        let tokens = tokenize("(a}b)");
        let cursor = TokenCursor::new(tokens.as_slice());
        assert_eq!(cursor.closer_end(0, '(', ')'), None);
        assert_eq!(cursor.scope_end(1), 2);
    }

    #[test]
    fn test_narrow_hides_tokens() {
        let tokens = tokenize("ab");
        let mut cursor = TokenCursor::new(tokens.as_slice());
        let previous = cursor.narrow(1);
        assert!(cursor.advance().is_some());
        assert!(cursor.is_at_end());
        cursor.restore(previous);
        assert_eq!(cursor.peek(), Some(&TexToken::Char('b')));
    }

    #[test]
    fn test_argument_extent() {
        let tokens = tokenize("{x} y }");
        let mut cursor = TokenCursor::new(tokens.as_slice());
        assert_eq!(cursor.argument_extent(), Some(Extent::Braced { open: 0, close: 2 }));
        cursor.jump_to(3);
        assert_eq!(cursor.argument_extent(), Some(Extent::Single { start: 4, end: 5 }));
        cursor.jump_to(5);
        assert_eq!(cursor.argument_extent(), None);
    }
}
