//! Token definitions for the Lux lexer.

use logos::Logos;

/// Lux tokens.
///
/// String literals and block comments are only started here; the
/// [`Lexer`](crate::lexer::Lexer) wrapper scans their bodies so escape
/// sequences and unterminated forms produce proper errors.
#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq)]
#[logos(skip r"[ \t\r\n\f]+")]
#[logos(skip r"//[^\n]*")]
pub enum Token {
    // ==================== Keywords ====================
    #[token("let")]
    KwLet,
    #[token("const")]
    KwConst,
    #[token("func")]
    KwFunc,
    #[token("return")]
    KwReturn,
    #[token("if")]
    KwIf,
    #[token("elif")]
    KwElif,
    #[token("else")]
    KwElse,
    #[token("while")]
    KwWhile,
    #[token("for")]
    KwFor,
    #[token("break")]
    KwBreak,
    #[token("continue")]
    KwContinue,
    #[token("type")]
    KwType,
    #[token("mod")]
    KwMod,
    #[token("use")]
    KwUse,
    #[token("field")]
    KwField,
    #[token("method")]
    KwMethod,
    #[token("true")]
    KwTrue,
    #[token("false")]
    KwFalse,
    #[token("null")]
    KwNull,

    // ==================== Literals ====================
    /// Integer or float literal; the parser inspects the text to decide.
    #[regex(r"[0-9]+(\.[0-9]+)?([eE][+-]?[0-9]+)?f?")]
    Number,

    #[regex(r"[A-Za-z_][A-Za-z0-9_]*")]
    Ident,

    /// Start of a string literal; body is scanned by the lexer wrapper.
    #[token("\"")]
    DoubleQuote,

    /// Start of a block comment; body is scanned by the lexer wrapper.
    #[token("/*")]
    BlockCommentStart,

    // ==================== Operators ====================
    #[token("+")]
    Plus,
    #[token("-")]
    Minus,
    #[token("*")]
    Star,
    #[token("/")]
    Slash,
    #[token("%")]
    Percent,
    #[token("=")]
    Assign,
    #[token("==")]
    EqEq,
    #[token("!=")]
    NotEq,
    #[token("<")]
    Lt,
    #[token("<=")]
    Le,
    #[token(">")]
    Gt,
    #[token(">=")]
    Ge,
    #[token("+=")]
    PlusEq,
    #[token("-=")]
    MinusEq,
    #[token("<<")]
    Shl,
    #[token(">>")]
    Shr,
    #[token("&")]
    Amp,
    #[token("|")]
    Pipe,
    #[token("^")]
    Caret,
    #[token("~")]
    Tilde,
    #[token("&&")]
    AmpAmp,
    #[token("||")]
    PipePipe,
    #[token("!")]
    Bang,

    // ==================== Delimiters ====================
    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[token("[")]
    LBracket,
    #[token("]")]
    RBracket,
    #[token("{")]
    LBrace,
    #[token("}")]
    RBrace,
    #[token(",")]
    Comma,
    #[token(":")]
    Colon,
    #[token(";")]
    Semicolon,
    #[token(".")]
    Dot,
}

impl Token {
    /// Human-readable name used in error messages.
    pub fn describe(&self) -> &'static str {
        match self {
            Token::KwLet => "'let'",
            Token::KwConst => "'const'",
            Token::KwFunc => "'func'",
            Token::KwReturn => "'return'",
            Token::KwIf => "'if'",
            Token::KwElif => "'elif'",
            Token::KwElse => "'else'",
            Token::KwWhile => "'while'",
            Token::KwFor => "'for'",
            Token::KwBreak => "'break'",
            Token::KwContinue => "'continue'",
            Token::KwType => "'type'",
            Token::KwMod => "'mod'",
            Token::KwUse => "'use'",
            Token::KwField => "'field'",
            Token::KwMethod => "'method'",
            Token::KwTrue => "'true'",
            Token::KwFalse => "'false'",
            Token::KwNull => "'null'",
            Token::Number => "number",
            Token::Ident => "identifier",
            Token::DoubleQuote => "string literal",
            Token::BlockCommentStart => "comment",
            Token::Plus => "'+'",
            Token::Minus => "'-'",
            Token::Star => "'*'",
            Token::Slash => "'/'",
            Token::Percent => "'%'",
            Token::Assign => "'='",
            Token::EqEq => "'=='",
            Token::NotEq => "'!='",
            Token::Lt => "'<'",
            Token::Le => "'<='",
            Token::Gt => "'>'",
            Token::Ge => "'>='",
            Token::PlusEq => "'+='",
            Token::MinusEq => "'-='",
            Token::Shl => "'<<'",
            Token::Shr => "'>>'",
            Token::Amp => "'&'",
            Token::Pipe => "'|'",
            Token::Caret => "'^'",
            Token::Tilde => "'~'",
            Token::AmpAmp => "'&&'",
            Token::PipePipe => "'||'",
            Token::Bang => "'!'",
            Token::LParen => "'('",
            Token::RParen => "')'",
            Token::LBracket => "'['",
            Token::RBracket => "']'",
            Token::LBrace => "'{'",
            Token::RBrace => "'}'",
            Token::Comma => "','",
            Token::Colon => "':'",
            Token::Semicolon => "';'",
            Token::Dot => "'.'",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use logos::Logos;

    fn lex_all(src: &str) -> Vec<Token> {
        Token::lexer(src).map(|t| t.unwrap()).collect()
    }

    #[test]
    fn test_keywords() {
        let tokens = lex_all("if else while func return elif let const break continue for");
        assert_eq!(
            tokens,
            vec![
                Token::KwIf,
                Token::KwElse,
                Token::KwWhile,
                Token::KwFunc,
                Token::KwReturn,
                Token::KwElif,
                Token::KwLet,
                Token::KwConst,
                Token::KwBreak,
                Token::KwContinue,
                Token::KwFor,
            ]
        );
    }

    #[test]
    fn test_integers() {
        assert_eq!(
            lex_all("123 0 98765"),
            vec![Token::Number, Token::Number, Token::Number]
        );
    }

    #[test]
    fn test_simple_assignment() {
        assert_eq!(
            lex_all("result = calc(a, b)"),
            vec![
                Token::Ident,
                Token::Assign,
                Token::Ident,
                Token::LParen,
                Token::Ident,
                Token::Comma,
                Token::Ident,
                Token::RParen,
            ]
        );
    }

    #[test]
    fn test_two_char_operators() {
        assert_eq!(
            lex_all("== != <= >= << >> && || += -="),
            vec![
                Token::EqEq,
                Token::NotEq,
                Token::Le,
                Token::Ge,
                Token::Shl,
                Token::Shr,
                Token::AmpAmp,
                Token::PipePipe,
                Token::PlusEq,
                Token::MinusEq,
            ]
        );
    }

    #[test]
    fn test_line_comments_skipped() {
        assert_eq!(
            lex_all("let a; // trailing words\nlet b;"),
            vec![
                Token::KwLet,
                Token::Ident,
                Token::Semicolon,
                Token::KwLet,
                Token::Ident,
                Token::Semicolon,
            ]
        );
    }

    #[test]
    fn test_float_forms() {
        let tokens = lex_all("3.14 1e5 1.23e-4 6.02E+23 42f");
        assert_eq!(tokens, vec![Token::Number; 5]);
    }
}
