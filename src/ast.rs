use std::fmt::{self, Display};

/// 表示一份完整的 CSS 样式表。
#[derive(Debug, Clone)]
pub struct Stylesheet {
    pub nodes: Vec<Node>,
}

impl Stylesheet {
    pub fn new(nodes: Vec<Node>) -> Self {
        Self { nodes }
    }
}

/// 树中的顶层节点。
#[derive(Debug, Clone)]
pub enum Node {
    RuleSet(RuleSet),
    AtRule(AtRule),
}

#[derive(Debug, Clone)]
pub struct RuleSet {
    pub selectors: Vec<Selector>,
    pub body: Vec<RuleBody>,
}

impl RuleSet {
    /// 选择器列表是否命中文档根元素。
    pub fn is_root(&self) -> bool {
        self.selectors.iter().any(|sel| sel.value == ":root")
    }
}

/// @media / @container / @layer 等规则。`has_block` 为 false 时
/// 表示语句形式（如 `@layer theme;`），body 恒为空。
#[derive(Debug, Clone)]
pub struct AtRule {
    pub name: String,
    pub params: String,
    pub body: Vec<RuleBody>,
    pub has_block: bool,
}

#[derive(Debug, Clone)]
pub enum RuleBody {
    Declaration(Declaration),
    NestedRule(RuleSet),
    AtRule(AtRule),
}

#[derive(Debug, Clone)]
pub struct Selector {
    pub value: String,
}

impl Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.value)
    }
}

#[derive(Debug, Clone)]
pub struct Declaration {
    pub name: String,
    pub value: String,
    pub important: bool,
}
