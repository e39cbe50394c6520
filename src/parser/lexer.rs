//! Tokenizer for BSL source text.
//!
//! Keywords are matched case-insensitively in both their Russian and English
//! spellings. Comments, preprocessor lines (`#...`) and annotations (`&...`)
//! never reach the parser.

use super::ParseError;

/// Reserved words of the language.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Keyword {
    Procedure,
    EndProcedure,
    Function,
    EndFunction,
    Export,
    Val,
    Var,
    If,
    Then,
    ElsIf,
    Else,
    EndIf,
    While,
    Do,
    EndDo,
    For,
    Each,
    In,
    To,
    Try,
    Except,
    EndTry,
    Return,
    Raise,
    Break,
    Continue,
    Goto,
    New,
    True,
    False,
    Undefined,
    Null,
    And,
    Or,
    Not,
    Async,
    Await,
}

const KEYWORDS: &[(&str, &str, Keyword)] = &[
    ("процедура", "procedure", Keyword::Procedure),
    ("конецпроцедуры", "endprocedure", Keyword::EndProcedure),
    ("функция", "function", Keyword::Function),
    ("конецфункции", "endfunction", Keyword::EndFunction),
    ("экспорт", "export", Keyword::Export),
    ("знач", "val", Keyword::Val),
    ("перем", "var", Keyword::Var),
    ("если", "if", Keyword::If),
    ("тогда", "then", Keyword::Then),
    ("иначеесли", "elsif", Keyword::ElsIf),
    ("иначе", "else", Keyword::Else),
    ("конецесли", "endif", Keyword::EndIf),
    ("пока", "while", Keyword::While),
    ("цикл", "do", Keyword::Do),
    ("конеццикла", "enddo", Keyword::EndDo),
    ("для", "for", Keyword::For),
    ("каждого", "each", Keyword::Each),
    ("из", "in", Keyword::In),
    ("по", "to", Keyword::To),
    ("попытка", "try", Keyword::Try),
    ("исключение", "except", Keyword::Except),
    ("конецпопытки", "endtry", Keyword::EndTry),
    ("возврат", "return", Keyword::Return),
    ("вызватьисключение", "raise", Keyword::Raise),
    ("прервать", "break", Keyword::Break),
    ("продолжить", "continue", Keyword::Continue),
    ("перейти", "goto", Keyword::Goto),
    ("новый", "new", Keyword::New),
    ("истина", "true", Keyword::True),
    ("ложь", "false", Keyword::False),
    ("неопределено", "undefined", Keyword::Undefined),
    ("null", "null", Keyword::Null),
    ("и", "and", Keyword::And),
    ("или", "or", Keyword::Or),
    ("не", "not", Keyword::Not),
    ("асинх", "async", Keyword::Async),
    ("ждать", "await", Keyword::Await),
];

impl Keyword {
    fn lookup(word: &str) -> Option<Self> {
        let lower = word.to_lowercase();
        KEYWORDS
            .iter()
            .find(|(ru, en, _)| *ru == lower || *en == lower)
            .map(|(_, _, kw)| *kw)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    Ident,
    Keyword(Keyword),
    Number,
    /// String literal, with `""` escapes and `|` continuations already resolved.
    Str(String),
    /// Date literal body, without the quotes.
    Date(String),
    LParen,
    RParen,
    LBracket,
    RBracket,
    Comma,
    Semicolon,
    Dot,
    Colon,
    Question,
    Tilde,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    Eof,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    /// Source text of the token (empty for `Eof`).
    pub text: String,
    pub line: usize,
    pub column: usize,
}

struct Lexer<'a> {
    chars: std::iter::Peekable<std::str::Chars<'a>>,
    line: usize,
    column: usize,
    /// Only whitespace seen since the last newline.
    at_line_start: bool,
}

/// Split source text into tokens. The last token is always `Eof`.
pub fn tokenize(source: &str) -> Result<Vec<Token>, ParseError> {
    let mut lexer = Lexer {
        chars: source.chars().peekable(),
        line: 1,
        column: 1,
        at_line_start: true,
    };
    let mut tokens = Vec::new();
    loop {
        let token = lexer.next_token()?;
        let done = token.kind == TokenKind::Eof;
        tokens.push(token);
        if done {
            return Ok(tokens);
        }
    }
}

impl<'a> Lexer<'a> {
    fn bump(&mut self) -> Option<char> {
        let c = self.chars.next()?;
        if c == '\n' {
            self.line += 1;
            self.column = 1;
            self.at_line_start = true;
        } else {
            self.column += 1;
            if !c.is_whitespace() {
                self.at_line_start = false;
            }
        }
        Some(c)
    }

    fn peek(&mut self) -> Option<char> {
        self.chars.peek().copied()
    }

    fn skip_line(&mut self) {
        while let Some(c) = self.peek() {
            if c == '\n' {
                break;
            }
            self.bump();
        }
    }

    fn error(&self, line: usize, column: usize, message: impl Into<String>) -> ParseError {
        ParseError::new(line, column, message)
    }

    fn next_token(&mut self) -> Result<Token, ParseError> {
        loop {
            match self.peek() {
                Some(c) if c.is_whitespace() => {
                    self.bump();
                }
                Some('/') => {
                    let mut ahead = self.chars.clone();
                    ahead.next();
                    if ahead.next() == Some('/') {
                        self.skip_line();
                    } else {
                        break;
                    }
                }
                Some('#') | Some('&') if self.at_line_start => self.skip_line(),
                _ => break,
            }
        }

        let (line, column) = (self.line, self.column);
        let Some(c) = self.bump() else {
            return Ok(Token {
                kind: TokenKind::Eof,
                text: String::new(),
                line,
                column,
            });
        };

        let simple = |kind: TokenKind, text: &str| Token {
            kind,
            text: text.to_string(),
            line,
            column,
        };

        let token = match c {
            '(' => simple(TokenKind::LParen, "("),
            ')' => simple(TokenKind::RParen, ")"),
            '[' => simple(TokenKind::LBracket, "["),
            ']' => simple(TokenKind::RBracket, "]"),
            ',' => simple(TokenKind::Comma, ","),
            ';' => simple(TokenKind::Semicolon, ";"),
            '.' => simple(TokenKind::Dot, "."),
            ':' => simple(TokenKind::Colon, ":"),
            '?' => simple(TokenKind::Question, "?"),
            '~' => simple(TokenKind::Tilde, "~"),
            '=' => simple(TokenKind::Eq, "="),
            '+' => simple(TokenKind::Plus, "+"),
            '-' => simple(TokenKind::Minus, "-"),
            '*' => simple(TokenKind::Star, "*"),
            '/' => simple(TokenKind::Slash, "/"),
            '%' => simple(TokenKind::Percent, "%"),
            '<' => match self.peek() {
                Some('>') => {
                    self.bump();
                    simple(TokenKind::Ne, "<>")
                }
                Some('=') => {
                    self.bump();
                    simple(TokenKind::Le, "<=")
                }
                _ => simple(TokenKind::Lt, "<"),
            },
            '>' => match self.peek() {
                Some('=') => {
                    self.bump();
                    simple(TokenKind::Ge, ">=")
                }
                _ => simple(TokenKind::Gt, ">"),
            },
            '"' => {
                let value = self.string_body(line, column)?;
                Token {
                    text: value.clone(),
                    kind: TokenKind::Str(value),
                    line,
                    column,
                }
            }
            '\'' => {
                let mut body = String::new();
                loop {
                    match self.bump() {
                        Some('\'') => break,
                        Some('\n') | None => {
                            return Err(self.error(line, column, "unterminated date literal"))
                        }
                        Some(ch) => body.push(ch),
                    }
                }
                Token {
                    text: body.clone(),
                    kind: TokenKind::Date(body),
                    line,
                    column,
                }
            }
            c if c.is_ascii_digit() => {
                let mut text = String::from(c);
                self.take_digits(&mut text);
                if self.peek() == Some('.') {
                    let mut ahead = self.chars.clone();
                    ahead.next();
                    if ahead.next().is_some_and(|d| d.is_ascii_digit()) {
                        self.bump();
                        text.push('.');
                        self.take_digits(&mut text);
                    }
                }
                Token {
                    kind: TokenKind::Number,
                    text,
                    line,
                    column,
                }
            }
            c if c.is_alphabetic() || c == '_' => {
                let mut text = String::from(c);
                while let Some(next) = self.peek() {
                    if next.is_alphanumeric() || next == '_' {
                        text.push(next);
                        self.bump();
                    } else {
                        break;
                    }
                }
                let kind = match Keyword::lookup(&text) {
                    Some(kw) => TokenKind::Keyword(kw),
                    None => TokenKind::Ident,
                };
                Token {
                    kind,
                    text,
                    line,
                    column,
                }
            }
            other => {
                return Err(self.error(line, column, format!("unexpected character '{}'", other)))
            }
        };

        Ok(token)
    }

    fn take_digits(&mut self, text: &mut String) {
        while let Some(d) = self.peek() {
            if d.is_ascii_digit() {
                text.push(d);
                self.bump();
            } else {
                break;
            }
        }
    }

    /// Read a string literal after its opening quote. A newline inside the
    /// literal continues on the next line after an optional `|` marker.
    fn string_body(&mut self, line: usize, column: usize) -> Result<String, ParseError> {
        let mut value = String::new();
        loop {
            match self.bump() {
                Some('"') => {
                    if self.peek() == Some('"') {
                        self.bump();
                        value.push('"');
                    } else {
                        return Ok(value);
                    }
                }
                Some('\n') => {
                    value.push('\n');
                    while self.peek().is_some_and(|c| c == ' ' || c == '\t' || c == '\r') {
                        self.bump();
                    }
                    if self.peek() == Some('|') {
                        self.bump();
                    }
                }
                Some('\r') => {}
                Some(ch) => value.push(ch),
                None => return Err(self.error(line, column, "unterminated string literal")),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<TokenKind> {
        tokenize(source)
            .unwrap()
            .into_iter()
            .map(|t| t.kind)
            .collect()
    }

    #[test]
    fn test_keywords_are_case_insensitive_in_both_languages() {
        assert_eq!(
            kinds("ПРОЦЕДУРА procedure КонецПроцедуры EndProcedure"),
            vec![
                TokenKind::Keyword(Keyword::Procedure),
                TokenKind::Keyword(Keyword::Procedure),
                TokenKind::Keyword(Keyword::EndProcedure),
                TokenKind::Keyword(Keyword::EndProcedure),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_comments_preprocessor_and_annotations_skipped() {
        let source = "#Область Служебные\n&НаСервере\nА = 1; // комментарий\n#КонецОбласти";
        assert_eq!(
            kinds(source),
            vec![
                TokenKind::Ident,
                TokenKind::Eq,
                TokenKind::Number,
                TokenKind::Semicolon,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_string_escapes_and_continuation() {
        let tokens = tokenize("\"say \"\"hi\"\"\n   |next\"").unwrap();
        assert_eq!(tokens[0].kind, TokenKind::Str("say \"hi\"\nnext".to_string()));
    }

    #[test]
    fn test_comparison_operators() {
        assert_eq!(
            kinds("<> <= >= < > ="),
            vec![
                TokenKind::Ne,
                TokenKind::Le,
                TokenKind::Ge,
                TokenKind::Lt,
                TokenKind::Gt,
                TokenKind::Eq,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_number_followed_by_member_dot() {
        let tokens = tokenize("1.5 2.").unwrap();
        assert_eq!(tokens[0].text, "1.5");
        assert_eq!(tokens[1].text, "2");
        assert_eq!(tokens[2].kind, TokenKind::Dot);
    }

    #[test]
    fn test_positions_track_lines() {
        let tokens = tokenize("А\n  Б").unwrap();
        assert_eq!((tokens[1].line, tokens[1].column), (2, 3));
    }

    #[test]
    fn test_unterminated_string_is_error() {
        let err = tokenize("\"open").unwrap_err();
        assert_eq!(err.line, 1);
        assert!(err.message.contains("unterminated"));
    }

    #[test]
    fn test_unexpected_character_is_error() {
        assert!(tokenize("А = 1 $ 2;").is_err());
    }
}
