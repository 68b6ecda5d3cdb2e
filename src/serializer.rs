use crate::ast::{AtRule, Declaration, Node, RuleBody, RuleSet, Stylesheet};

/// 负责将（可能已被改写的）样式树渲染回 CSS 文本。
///
/// 树保留作者书写的嵌套结构，因此两种模式都按递归渲染。
pub struct Serializer {
    minify: bool,
}

impl Serializer {
    pub fn new(minify: bool) -> Self {
        Self { minify }
    }

    pub fn to_css(&self, stylesheet: &Stylesheet) -> String {
        if self.minify {
            self.render_minified(stylesheet)
        } else {
            self.render_pretty(stylesheet)
        }
    }

    fn render_pretty(&self, stylesheet: &Stylesheet) -> String {
        let mut output = String::new();
        for (idx, node) in stylesheet.nodes.iter().enumerate() {
            self.render_node_pretty(node, 0, &mut output);
            if idx + 1 < stylesheet.nodes.len() {
                output.push('\n');
            }
        }
        output.trim().to_string()
    }

    fn render_minified(&self, stylesheet: &Stylesheet) -> String {
        let mut output = String::new();
        for node in &stylesheet.nodes {
            self.render_node_minified(node, &mut output);
        }
        while output.ends_with('\n') {
            output.pop();
        }
        output
    }

    fn format_declaration(&self, decl: &Declaration) -> String {
        let mut result = format!("{}: {}", decl.name.trim(), decl.value.trim());
        if decl.important {
            result.push_str(" !important");
        }
        result.push(';');
        result
    }

    fn format_declaration_minified(&self, decl: &Declaration) -> String {
        let mut result = format!("{}:{}", decl.name.trim(), collapse_whitespace(&decl.value));
        if decl.important {
            result.push_str("!important");
        }
        result
    }

    fn render_node_pretty(&self, node: &Node, level: usize, output: &mut String) {
        match node {
            Node::RuleSet(rule) => self.render_rule_pretty(rule, level, output),
            Node::AtRule(at_rule) => self.render_at_rule_pretty(at_rule, level, output),
        }
    }

    fn render_rule_pretty(&self, rule: &RuleSet, level: usize, output: &mut String) {
        if rule.body.is_empty() {
            return;
        }
        output.push_str(&indent(level));
        let selectors: Vec<String> = rule.selectors.iter().map(|sel| sel.to_string()).collect();
        output.push_str(&selectors.join(", "));
        output.push_str(" {\n");
        for item in &rule.body {
            self.render_body_item_pretty(item, level + 1, output);
        }
        output.push_str(&indent(level));
        output.push_str("}\n");
    }

    fn render_body_item_pretty(&self, item: &RuleBody, level: usize, output: &mut String) {
        match item {
            RuleBody::Declaration(decl) => {
                output.push_str(&indent(level));
                output.push_str(&self.format_declaration(decl));
                output.push('\n');
            }
            RuleBody::NestedRule(rule) => self.render_rule_pretty(rule, level, output),
            RuleBody::AtRule(at_rule) => self.render_at_rule_pretty(at_rule, level, output),
        }
    }

    fn render_at_rule_pretty(&self, at_rule: &AtRule, level: usize, output: &mut String) {
        output.push_str(&indent(level));
        output.push('@');
        output.push_str(&at_rule.name);
        if !at_rule.params.is_empty() {
            output.push(' ');
            output.push_str(at_rule.params.trim());
        }
        if !at_rule.has_block {
            output.push_str(";\n");
            return;
        }
        output.push_str(" {\n");
        for item in &at_rule.body {
            self.render_body_item_pretty(item, level + 1, output);
        }
        output.push_str(&indent(level));
        output.push_str("}\n");
    }

    fn render_node_minified(&self, node: &Node, output: &mut String) {
        match node {
            Node::RuleSet(rule) => self.render_rule_minified(rule, output),
            Node::AtRule(at_rule) => self.render_at_rule_minified(at_rule, output),
        }
    }

    fn render_rule_minified(&self, rule: &RuleSet, output: &mut String) {
        if rule.body.is_empty() {
            return;
        }
        let selectors: Vec<String> = rule.selectors.iter().map(|sel| sel.to_string()).collect();
        output.push_str(&selectors.join(","));
        output.push('{');
        self.render_body_minified(&rule.body, output);
        output.push('}');
    }

    fn render_at_rule_minified(&self, at_rule: &AtRule, output: &mut String) {
        output.push('@');
        output.push_str(&at_rule.name);
        if !at_rule.params.trim().is_empty() {
            output.push(' ');
            output.push_str(&collapse_whitespace(&at_rule.params));
        }
        if !at_rule.has_block {
            output.push(';');
            return;
        }
        output.push('{');
        self.render_body_minified(&at_rule.body, output);
        output.push('}');
    }

    /// 压缩模式下声明之间补分号，声明后若还有子块也需要分号收尾。
    fn render_body_minified(&self, body: &[RuleBody], output: &mut String) {
        let mut needs_separator = false;
        for item in body {
            match item {
                RuleBody::Declaration(decl) => {
                    if needs_separator {
                        output.push(';');
                    }
                    output.push_str(&self.format_declaration_minified(decl));
                    needs_separator = true;
                }
                RuleBody::NestedRule(rule) => {
                    if needs_separator {
                        output.push(';');
                        needs_separator = false;
                    }
                    self.render_rule_minified(rule, output);
                }
                RuleBody::AtRule(at_rule) => {
                    if needs_separator {
                        output.push(';');
                        needs_separator = false;
                    }
                    self.render_at_rule_minified(at_rule, output);
                }
            }
        }
    }
}

/// 压缩多余空白字符，主要用于输出压缩模式。
fn collapse_whitespace(input: &str) -> String {
    let mut result = String::with_capacity(input.len());
    let mut last_was_space = false;
    for ch in input.chars() {
        if ch.is_whitespace() {
            if !last_was_space {
                result.push(' ');
                last_was_space = true;
            }
        } else {
            result.push(ch);
            last_was_space = false;
        }
    }
    result.trim().to_string()
}

/// 保持相对缩进的辅助函数。
fn indent(level: usize) -> String {
    const INDENT: &str = "  ";
    (0..level).map(|_| INDENT).collect()
}
