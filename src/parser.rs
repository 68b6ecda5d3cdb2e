use crate::ast::*;
use crate::error::{ClampError, ClampResult};

/// CSS 解析器，负责把源码转换成可改写的 AST。
///
/// 只需要支撑本引擎关心的结构：规则集、条件块（含嵌套）、声明与
/// 语句形式的 at-rule；注释在词法层跳过，值中的括号与引号按深度
/// 保留。
pub struct CssParser;

impl Default for CssParser {
    fn default() -> Self {
        Self::new()
    }
}

impl CssParser {
    pub fn new() -> Self {
        Self
    }

    pub fn parse(&self, input: &str) -> ClampResult<Stylesheet> {
        let mut cursor = Cursor::new(input);
        let mut nodes = Vec::new();

        while !cursor.is_eof() {
            cursor.skip_whitespace_and_comments();
            if cursor.is_eof() {
                break;
            }

            if cursor.starts_with('@') {
                let at_rule = self.parse_at_rule(&mut cursor)?;
                nodes.push(Node::AtRule(at_rule));
                continue;
            }

            let rule = self.parse_ruleset(&mut cursor)?;
            nodes.push(Node::RuleSet(rule));
        }

        Ok(Stylesheet::new(nodes))
    }

    fn parse_ruleset(&self, cursor: &mut Cursor<'_>) -> ClampResult<RuleSet> {
        cursor.skip_whitespace_and_comments();
        let selector_raw = cursor.read_until('{')?;
        let selectors = selector_raw
            .split(',')
            .map(|s| Selector {
                value: s.trim().to_string(),
            })
            .filter(|sel| !sel.value.is_empty())
            .collect::<Vec<_>>();

        if selectors.is_empty() {
            return Err(ClampError::parse("缺少合法的选择器", cursor.position()));
        }

        cursor.expect_char('{')?;
        let body = self.parse_block_body(cursor)?;
        Ok(RuleSet { selectors, body })
    }

    fn parse_at_rule(&self, cursor: &mut Cursor<'_>) -> ClampResult<AtRule> {
        cursor.expect_char('@')?;
        let name = cursor.read_identifier();
        if name.is_empty() {
            return Err(ClampError::parse("at-rule 名称不能为空", cursor.position()));
        }
        cursor.skip_whitespace_and_comments();

        let mut params = String::new();
        let mut paren_depth = 0usize;
        let mut has_block = false;
        while let Some(ch) = cursor.peek_char() {
            if paren_depth == 0 {
                if ch == '{' {
                    has_block = true;
                    break;
                }
                if ch == ';' {
                    cursor.advance_char();
                    break;
                }
            }
            match ch {
                '(' => paren_depth += 1,
                ')' => {
                    if paren_depth > 0 {
                        paren_depth -= 1;
                    }
                }
                _ => {}
            }
            params.push(ch);
            cursor.advance_char();
        }

        let body = if has_block {
            cursor.expect_char('{')?;
            self.parse_block_body(cursor)?
        } else {
            Vec::new()
        };

        Ok(AtRule {
            name,
            params: params.trim().to_string(),
            body,
            has_block,
        })
    }

    fn parse_block_body(&self, cursor: &mut Cursor<'_>) -> ClampResult<Vec<RuleBody>> {
        let mut body = Vec::new();
        loop {
            cursor.skip_whitespace_and_comments();
            match cursor.peek_char() {
                Some('}') => {
                    cursor.advance_char();
                    break;
                }
                None => {
                    return Err(ClampError::parse("缺少匹配的 '}'", cursor.position()));
                }
                _ => {
                    let item = self.parse_rule_body_item(cursor)?;
                    body.push(item);
                }
            }
        }
        Ok(body)
    }

    fn parse_rule_body_item(&self, cursor: &mut Cursor<'_>) -> ClampResult<RuleBody> {
        if cursor.starts_with('@') {
            let at_rule = self.parse_at_rule(cursor)?;
            return Ok(RuleBody::AtRule(at_rule));
        }

        match cursor.detect_body_kind() {
            Some(BodyKind::Declaration) => {
                let decl = self.parse_declaration(cursor)?;
                Ok(RuleBody::Declaration(decl))
            }
            Some(BodyKind::NestedRule) => {
                let nested = self.parse_ruleset(cursor)?;
                Ok(RuleBody::NestedRule(nested))
            }
            None => Err(ClampError::parse(
                "无法判断声明或子选择器",
                cursor.position(),
            )),
        }
    }

    fn parse_declaration(&self, cursor: &mut Cursor<'_>) -> ClampResult<Declaration> {
        let name = cursor.read_property_name();
        cursor.skip_whitespace_and_comments();
        cursor.expect_char(':')?;
        cursor.skip_whitespace_and_comments();
        let raw_value = self.read_value(cursor, &[';', '}'])?;

        if cursor.peek_char() == Some(';') {
            cursor.advance_char();
        }

        let mut value = raw_value.trim().to_string();
        let mut important = false;
        if let Some(stripped) = value.strip_suffix("!important") {
            value = stripped.trim_end().to_string();
            important = true;
        }

        Ok(Declaration {
            name,
            value,
            important,
        })
    }

    fn read_value(&self, cursor: &mut Cursor<'_>, terminators: &[char]) -> ClampResult<String> {
        let mut value = String::new();
        let mut paren_depth = 0usize;

        while let Some(ch) = cursor.peek_char() {
            if terminators.contains(&ch) && paren_depth == 0 {
                break;
            }

            match ch {
                '\'' | '"' => {
                    value.push(ch);
                    cursor.advance_char();
                    while let Some(next) = cursor.peek_char() {
                        value.push(next);
                        cursor.advance_char();
                        if next == ch {
                            break;
                        }
                        if next == '\\' {
                            if let Some(escaped) = cursor.peek_char() {
                                value.push(escaped);
                                cursor.advance_char();
                            }
                        }
                    }
                }
                '(' => {
                    paren_depth += 1;
                    value.push(ch);
                    cursor.advance_char();
                }
                ')' => {
                    if paren_depth > 0 {
                        paren_depth -= 1;
                    }
                    value.push(ch);
                    cursor.advance_char();
                }
                _ => {
                    value.push(ch);
                    cursor.advance_char();
                }
            }
        }

        Ok(value)
    }
}

/// 带位置指针的输入游标，提供便捷的字符读取与前瞻功能。
struct Cursor<'a> {
    source: &'a str,
    len: usize,
    position: usize,
}

impl<'a> Cursor<'a> {
    fn new(source: &'a str) -> Self {
        Self {
            source,
            len: source.len(),
            position: 0,
        }
    }

    fn position(&self) -> usize {
        self.position
    }

    fn is_eof(&self) -> bool {
        self.position >= self.len
    }

    fn starts_with(&self, ch: char) -> bool {
        self.peek_char() == Some(ch)
    }

    fn peek_char(&self) -> Option<char> {
        self.source[self.position..].chars().next()
    }

    fn advance_char(&mut self) -> Option<char> {
        let ch = self.peek_char()?;
        self.position += ch.len_utf8();
        Some(ch)
    }

    fn expect_char(&mut self, expect: char) -> ClampResult<()> {
        match self.advance_char() {
            Some(ch) if ch == expect => Ok(()),
            Some(ch) => Err(ClampError::parse(
                format!("期待字符 '{expect}', 却得到 '{ch}'"),
                self.position,
            )),
            None => Err(ClampError::parse(
                format!("期待字符 '{expect}'"),
                self.position,
            )),
        }
    }

    fn skip_whitespace(&mut self) {
        while let Some(ch) = self.peek_char() {
            if ch.is_whitespace() {
                self.advance_char();
            } else {
                break;
            }
        }
    }

    /// CSS 只有块注释这一种注释。
    fn skip_whitespace_and_comments(&mut self) {
        loop {
            self.skip_whitespace();
            if self.starts_with('/') && self.consume_comment() {
                continue;
            }
            break;
        }
    }

    fn consume_comment(&mut self) -> bool {
        if self.match_str("/*") {
            while self.peek_char().is_some() {
                if self.match_str("*/") {
                    break;
                }
                self.advance_char();
            }
            true
        } else {
            false
        }
    }

    fn match_str(&mut self, prefix: &str) -> bool {
        if self.source[self.position..].starts_with(prefix) {
            self.position += prefix.len();
            true
        } else {
            false
        }
    }

    fn read_identifier(&mut self) -> String {
        let mut ident = String::new();
        while let Some(ch) = self.peek_char() {
            if ch.is_alphanumeric() || ch == '-' || ch == '_' {
                ident.push(ch);
                self.advance_char();
            } else {
                break;
            }
        }
        ident
    }

    fn read_property_name(&mut self) -> String {
        let mut name = String::new();
        while let Some(ch) = self.peek_char() {
            if ch == ':' || ch == ';' || ch == '{' || ch.is_control() {
                break;
            }
            name.push(ch);
            self.advance_char();
        }
        name.trim().to_string()
    }

    fn read_until(&mut self, end: char) -> ClampResult<String> {
        let mut result = String::new();
        while let Some(ch) = self.peek_char() {
            if ch == end {
                break;
            }
            result.push(ch);
            self.advance_char();
        }
        if self.peek_char() != Some(end) {
            return Err(ClampError::parse(
                format!("期待字符 '{end}'"),
                self.position,
            ));
        }
        Ok(result)
    }

    /// 通过向前查看判断接下来的语句类型（声明或子选择器）。
    fn detect_body_kind(&self) -> Option<BodyKind> {
        let mut iter = self.clone();
        iter.skip_whitespace_and_comments();
        let mut saw_colon = false;
        let mut paren_depth = 0usize;
        while let Some(ch) = iter.peek_char() {
            match ch {
                '(' => paren_depth += 1,
                ')' => {
                    if paren_depth > 0 {
                        paren_depth -= 1;
                    }
                }
                '{' if paren_depth == 0 => return Some(BodyKind::NestedRule),
                ';' if paren_depth == 0 => return Some(BodyKind::Declaration),
                '}' if paren_depth == 0 => {
                    return if saw_colon {
                        Some(BodyKind::Declaration)
                    } else {
                        None
                    }
                }
                ':' => {
                    saw_colon = true;
                }
                _ => {}
            }
            iter.advance_char();
        }
        if saw_colon {
            Some(BodyKind::Declaration)
        } else {
            None
        }
    }
}

impl<'a> Clone for Cursor<'a> {
    fn clone(&self) -> Self {
        Self {
            source: self.source,
            len: self.len,
            position: self.position,
        }
    }
}

enum BodyKind {
    Declaration,
    NestedRule,
}
