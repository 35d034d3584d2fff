//! 搜索字符串的词法分析器

use crate::token::{Span, Token, TokenKind};

pub struct Lexer<'a> {
    input: &'a str,
    /// 输入字符串中的当前位置（字节索引）
    position: usize,
    /// 上一个 token 是操作符，紧跟其后的内容都属于值
    value_follows: bool,
}

/// 操作符名可以包含字母、数字、下划线和点（用于 `services.name` 这样的关联路径）
fn is_operator_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '.'
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str) -> Self {
        Lexer {
            input,
            position: 0,
            value_follows: false,
        }
    }

    /// 返回当前位置的字符，不推进位置
    fn peek(&self) -> Option<char> {
        self.input[self.position..].chars().next()
    }

    /// 推进位置一个字符并返回该字符
    fn bump(&mut self) -> Option<char> {
        let c = self.peek();
        if let Some(c) = c {
            self.position += c.len_utf8();
        }
        c
    }

    /// 跳过空白字符
    fn skip_whitespace(&mut self) {
        while let Some(c) = self.peek() {
            if c.is_whitespace() {
                self.bump();
            } else {
                break;
            }
        }
    }

    /// 读取双引号包围的值
    /// 注意：开始的引号已经被调用者消费；缺少结束引号时读到输入末尾
    fn read_quoted(&mut self, start: usize) -> Token<'a> {
        let content_start = self.position;
        while let Some(c) = self.peek() {
            if c == '"' {
                break;
            }
            self.bump();
        }
        let content_end = self.position;
        self.bump(); // 消费结束引号

        Token {
            kind: TokenKind::Quoted(&self.input[content_start..content_end]),
            span: Span::new(start, self.position),
        }
    }

    /// 读取不带引号的值，直到空白或引号
    fn read_word(&mut self, start: usize) -> Token<'a> {
        while let Some(c) = self.peek() {
            if c.is_whitespace() || c == '"' {
                break;
            }
            self.bump();
        }
        Token {
            kind: TokenKind::Word(&self.input[start..self.position]),
            span: Span::new(start, self.position),
        }
    }

    /// 读取操作符；如果后面没有紧跟 ':'，则按普通值处理
    fn read_operator_or_word(&mut self, start: usize) -> Token<'a> {
        while let Some(c) = self.peek() {
            if is_operator_char(c) {
                self.bump();
            } else {
                break;
            }
        }

        if self.peek() == Some(':') {
            let name = &self.input[start..self.position];
            self.bump(); // 消费 ':'
            self.value_follows = true;
            return Token {
                kind: TokenKind::Operator(name),
                span: Span::new(start, self.position),
            };
        }

        self.read_word(start)
    }
}

impl<'a> Iterator for Lexer<'a> {
    type Item = Token<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        // 只按第一个 ':' 切分，值里可以再出现 ':'（例如 `address:fe80::1`）
        if std::mem::take(&mut self.value_follows) {
            if let Some(c) = self.peek() {
                if !c.is_whitespace() && c != '"' {
                    let start = self.position;
                    return Some(self.read_word(start));
                }
            }
        }

        self.skip_whitespace();
        let start = self.position;

        let c = self.peek()?; // 到达输入末尾

        let token = match c {
            '"' => {
                self.bump();
                self.read_quoted(start)
            }
            c if is_operator_char(c) => self.read_operator_or_word(start),
            _ => self.read_word(start),
        };
        Some(token)
    }
}
