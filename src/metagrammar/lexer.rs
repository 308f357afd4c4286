//! Tokenizer for the grammar description language (C6, §6.1).
//!
//! Grounded on the teacher's `ql::lexer::{Token, TokenStream}` (a `logos`-derived enum plus a
//! hand-rolled iterator that coalesces adjacent lex errors into a single fragment), re-targeted
//! at this language's token set — confirmed against the original source's `sourcer/metasyntax.py`
//! (`Whitespace`, `Word`, `Symbol`, `StringLiteral`, `RegexLiteral`, `Newline`, `Comment`).

use logos::Logos;
use std::ops::Range;

#[derive(Logos, Debug, PartialEq, Clone)]
pub enum Token<'src> {
    #[regex(r"[_a-zA-Z][_a-zA-Z0-9]*")]
    Word(&'src str),

    #[token("ignored")]
    Ignored,
    #[token("token")]
    TokenKw,
    #[token("class")]
    Class,
    #[token("template")]
    Template,
    #[token("recover")]
    Recover,
    #[token("let")]
    Let,
    #[token("in")]
    In,

    #[regex(r#"'(?:[^'\\]|\\.)*'"#)]
    #[regex(r#""(?:[^"\\]|\\.)*""#)]
    #[regex(r#"'''(?:[^\\]|\\.)*?'''"#)]
    #[regex(r#""""(?:[^\\]|\\.)*?""""#)]
    StringLiteral(&'src str),

    #[regex(r"`(?:[^`\\]|\\.)*`")]
    RegexLiteral(&'src str),

    #[token("<<!")]
    ShiftLeftCommit,
    #[token("!>>")]
    ShiftRightCommit,
    #[token("<<")]
    ShiftLeft,
    #[token(">>")]
    ShiftRight,
    #[token("=>")]
    FatArrow,
    #[token("//")]
    SlashSlash,
    #[token("=")]
    Eq,
    #[token(";")]
    Semi,
    #[token(",")]
    Comma,
    #[token(":")]
    Colon,
    #[token("|")]
    Pipe,
    #[token("/")]
    Slash,
    #[token("*")]
    Star,
    #[token("+")]
    Plus,
    #[token("?")]
    Question,
    #[token("!")]
    Bang,
    #[token("(")]
    ParenOpen,
    #[token(")")]
    ParenClose,
    #[token("[")]
    BracketOpen,
    #[token("]")]
    BracketClose,
    #[token("{")]
    BraceOpen,
    #[token("}")]
    BraceClose,

    #[regex(r"[\r\n][\s]*")]
    Newline,

    #[regex(r"[ \t]+")]
    Whitespace(&'src str),

    #[regex(r"#[^\r\n]*")]
    Comment(&'src str),

    UnexpectedFragment(&'src str),
}

impl<'src> Token<'src> {
    /// True for tokens `transform_tokens` would never hand to the parser (§6.1).
    pub fn is_trivia(&self) -> bool {
        matches!(self, Token::Whitespace(_) | Token::Comment(_))
    }
}

/// One lexed token plus its byte span, with paren/bracket-depth newline elision applied
/// (grounded on `metasyntax.py`'s `transform_tokens`: a `Newline` is dropped whenever the
/// running depth of unmatched `(`/`[` is greater than zero, since a line break inside an
/// argument list or list literal is insignificant).
#[derive(Debug, Clone, PartialEq)]
pub struct Spanned<'src> {
    pub token: Token<'src>,
    pub span: Range<usize>,
}

pub struct TokenStream<'src> {
    lexer: logos::Lexer<'src, Token<'src>>,
    src: &'src str,
    error_span: Option<Range<usize>>,
    pending: Option<Spanned<'src>>,
    depth: i32,
}

impl<'src> TokenStream<'src> {
    pub fn new(src: &'src str) -> Self {
        Self {
            lexer: Token::lexer(src),
            src,
            error_span: None,
            pending: None,
            depth: 0,
        }
    }

    fn raw_next(&mut self) -> Option<Spanned<'src>> {
        if let Some(spanned) = self.pending.take() {
            return Some(spanned);
        }
        loop {
            match self.lexer.next() {
                Some(Ok(token)) => {
                    let span = self.lexer.span();
                    if let Some(err_span) = self.error_span.take() {
                        self.pending = Some(Spanned { token, span });
                        let fragment = &self.src[err_span.clone()];
                        return Some(Spanned {
                            token: Token::UnexpectedFragment(fragment),
                            span: err_span,
                        });
                    }
                    return Some(Spanned { token, span });
                }
                Some(Err(())) => {
                    let span = self.lexer.span();
                    match &mut self.error_span {
                        None => self.error_span = Some(span),
                        Some(existing) => existing.end = span.end,
                    }
                }
                None => {
                    if let Some(span) = self.error_span.take() {
                        let fragment = &self.src[span.clone()];
                        return Some(Spanned {
                            token: Token::UnexpectedFragment(fragment),
                            span,
                        });
                    }
                    return None;
                }
            }
        }
    }

    /// Tokens with whitespace/comments dropped and depth-sensitive newlines elided, ready for
    /// the parser (§6.1).
    pub fn next_significant(&mut self) -> Option<Spanned<'src>> {
        loop {
            let spanned = self.raw_next()?;
            match &spanned.token {
                Token::Whitespace(_) | Token::Comment(_) => continue,
                Token::ParenOpen | Token::BracketOpen => {
                    self.depth += 1;
                    return Some(spanned);
                }
                Token::ParenClose | Token::BracketClose => {
                    self.depth -= 1;
                    return Some(spanned);
                }
                Token::Newline if self.depth > 0 => continue,
                _ => return Some(spanned),
            }
        }
    }
}

impl<'src> Iterator for TokenStream<'src> {
    type Item = Spanned<'src>;

    fn next(&mut self) -> Option<Spanned<'src>> {
        self.next_significant()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(src: &str) -> Vec<Token<'_>> {
        TokenStream::new(src).map(|s| s.token).collect()
    }

    #[test]
    fn basic_symbols() {
        let got = tokens("<<! !>> << >> => // = ; , : | / * + ? ! ( ) [ ] { }");
        assert_eq!(
            got,
            vec![
                Token::ShiftLeftCommit,
                Token::ShiftRightCommit,
                Token::ShiftLeft,
                Token::ShiftRight,
                Token::FatArrow,
                Token::SlashSlash,
                Token::Eq,
                Token::Semi,
                Token::Comma,
                Token::Colon,
                Token::Pipe,
                Token::Slash,
                Token::Star,
                Token::Plus,
                Token::Question,
                Token::Bang,
                Token::ParenOpen,
                Token::ParenClose,
                Token::BracketOpen,
                Token::BracketClose,
                Token::BraceOpen,
                Token::BraceClose,
            ]
        );
    }

    #[test]
    fn keywords_and_words() {
        let got = tokens("ignored token class template recover start Foo_bar");
        assert_eq!(
            got,
            vec![
                Token::Ignored,
                Token::TokenKw,
                Token::Class,
                Token::Template,
                Token::Recover,
                Token::Word("start"),
                Token::Word("Foo_bar"),
            ]
        );
    }

    #[test]
    fn string_and_regex_literals() {
        let got = tokens(r#"'abc' "abc" `a\`b`"#);
        assert_eq!(
            got,
            vec![
                Token::StringLiteral("'abc'"),
                Token::StringLiteral("\"abc\""),
                Token::RegexLiteral(r"`a\`b`"),
            ]
        );
    }

    #[test]
    fn newline_elided_inside_parens_not_outside() {
        let got = tokens("foo(\n  bar\n)\nbaz");
        assert_eq!(
            got,
            vec![
                Token::Word("foo"),
                Token::ParenOpen,
                Token::Word("bar"),
                Token::ParenClose,
                Token::Newline,
                Token::Word("baz"),
            ]
        );
    }

    #[test]
    fn newline_elided_inside_brackets() {
        let got = tokens("[\n  a,\n  b\n]");
        assert_eq!(
            got,
            vec![
                Token::BracketOpen,
                Token::Word("a"),
                Token::Comma,
                Token::Word("b"),
                Token::BracketClose,
            ]
        );
    }

    #[test]
    fn unexpected_fragment_reported() {
        let got = tokens("foo @@ bar");
        assert_eq!(
            got,
            vec![
                Token::Word("foo"),
                Token::UnexpectedFragment("@@"),
                Token::Word("bar"),
            ]
        );
    }
}
