use codespan::{FileId, Files, Span};
use codespan_reporting::diagnostic::{Diagnostic, Label};
use logos::Logos;

#[derive(Logos, Debug, PartialEq, Clone)]
pub enum Token {
    #[token("let")]
    KwLet,
    #[token("if")]
    KwIf,
    #[token("else")]
    KwElse,
    #[token("while")]
    KwWhile,
    #[token("for")]
    KwFor,
    #[token("function")]
    KwFunction,
    #[token("return")]
    KwReturn,
    #[token("class")]
    KwClass,
    #[token("constructor")]
    KwConstructor,
    #[token("this")]
    KwThis,
    #[token("new")]
    KwNew,
    #[token("true")]
    KwTrue,
    #[token("false")]
    KwFalse,
    #[token("first")]
    KwFirst,

    #[token("==")]
    EqEq,
    #[token("!=")]
    NotEq,
    #[token("<=")]
    LtEq,
    #[token(">=")]
    GtEq,
    #[token("&&")]
    AndAnd,
    #[token("||")]
    OrOr,
    #[token("=")]
    Eq,
    #[token("<")]
    Lt,
    #[token(">")]
    Gt,
    #[token("+")]
    Plus,
    #[token("-")]
    Minus,
    #[token("*")]
    Star,
    #[token("/")]
    Slash,
    #[token("!")]
    Bang,
    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[token("{")]
    LBrace,
    #[token("}")]
    RBrace,
    #[token("[")]
    LBracket,
    #[token("]")]
    RBracket,
    #[token(",")]
    Comma,
    #[token(":")]
    Colon,
    #[token(".")]
    Dot,
    #[token(";")]
    Semi,

    // No escape processing: a string runs to the next double quote.
    #[regex(r#""[^"]*""#, |lex| lex.slice()[1..lex.slice().len()-1].to_string(), priority = 4)]
    Str(String),

    // A quote that never closes before EOF. Kept as its own token so the
    // error can name what actually went wrong instead of pointing at the
    // opening quote as an unexpected character.
    #[regex(r#""[^"]*"#, priority = 3)]
    UnterminatedStr,

    #[regex(r"[a-zA-Z_][a-zA-Z0-9_]*", |lex| lex.slice().to_string())]
    Ident(String),

    #[regex(r"[0-9]+", |lex| lex.slice().parse().ok())]
    Int(i64),

    #[regex(r"[ \t\r\n]+", logos::skip)]
    Whitespace,

    #[regex(r"//[^\n]*", logos::skip)]
    SingleLineComment,

    #[regex(r"/\*[^*]*\*+(?:[^/*][^*]*\*+)*/", logos::skip)]
    MultiLineComment,

    Error,
}

pub struct Lexer<'a> {
    pub(crate) files: &'a Files<String>,
    pub(crate) file_id: FileId,
}

impl<'a> Lexer<'a> {
    pub fn new(files: &'a Files<String>, file_id: FileId) -> Self {
        Self { files, file_id }
    }

    /// Tokenizes the whole file. Lexical errors are fatal: a lone `&` or `|`
    /// has no token of its own and is reported as an unexpected character.
    pub fn tokens(&self) -> Result<Vec<(Token, Span)>, Diagnostic<FileId>> {
        let source = self.files.source(self.file_id);
        let mut tokens = Vec::new();

        for (token, range) in Token::lexer(source).spanned() {
            let span = Span::new(range.start as u32, range.end as u32);
            match token {
                Ok(Token::UnterminatedStr) => {
                    return Err(self.lex_error("unterminated string literal", span));
                }
                Ok(token) => tokens.push((token, span)),
                Err(()) => {
                    let offending = source[range.clone()].chars().next().unwrap_or('\0');
                    return Err(self.lex_error(
                        &format!("unexpected character '{}'", offending),
                        span,
                    ));
                }
            }
        }

        Ok(tokens)
    }

    fn lex_error(&self, message: &str, span: Span) -> Diagnostic<FileId> {
        Diagnostic::error()
            .with_message(message)
            .with_labels(vec![Label::primary(self.file_id, span)])
    }
}
