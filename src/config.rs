use indexmap::IndexMap;

use crate::ast::{AtRule, Node, RuleBody, RuleSet, Stylesheet};
use crate::screens;
use crate::units::convert_to_rem;

/// 单次转换调用内的全部配置状态。
///
/// 每次调用各自构建一份，绝不跨调用或跨线程共享；`finalize` 之后
/// 断点表只读。扫描（阶段一）与改写（阶段二）显式分开，避免依赖
/// 宿主遍历顺序。
#[derive(Debug, Clone)]
pub struct TransformConfig {
    /// 根字号，像素。
    pub root_font_size: f64,
    /// 间距单位，纯数字参数按它的倍数换算。
    pub spacing: String,
    /// 已解析的自定义属性表，值为带单位的 rem 字符串。
    pub custom_properties: IndexMap<String, String>,
    /// 排序后的视口断点表。
    pub screens: IndexMap<String, String>,
    /// 排序后的容器断点表。
    pub container_screens: IndexMap<String, String>,
    default_min: Option<String>,
    default_max: Option<String>,
    default_layer_breakpoints: IndexMap<String, String>,
    default_layer_container_breakpoints: IndexMap<String, String>,
    root_breakpoints: IndexMap<String, String>,
    root_container_breakpoints: IndexMap<String, String>,
    theme_breakpoints: IndexMap<String, String>,
    theme_container_breakpoints: IndexMap<String, String>,
    ready: bool,
}

impl Default for TransformConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl TransformConfig {
    pub fn new() -> Self {
        Self {
            root_font_size: 16.0,
            spacing: "1px".to_string(),
            custom_properties: IndexMap::new(),
            screens: IndexMap::new(),
            container_screens: IndexMap::new(),
            default_min: None,
            default_max: None,
            default_layer_breakpoints: IndexMap::new(),
            default_layer_container_breakpoints: IndexMap::new(),
            root_breakpoints: IndexMap::new(),
            root_container_breakpoints: IndexMap::new(),
            theme_breakpoints: IndexMap::new(),
            theme_container_breakpoints: IndexMap::new(),
            ready: false,
        }
    }

    /// 阶段一：扫描整棵树收集配置，不做任何改写。
    /// `source` 为原始文本，供 default 层的正则回退使用。
    pub fn scan(&mut self, stylesheet: &Stylesheet, source: &str) {
        for node in &stylesheet.nodes {
            self.scan_node(node, source);
        }
    }

    fn scan_node(&mut self, node: &Node, source: &str) {
        match node {
            Node::RuleSet(rule) => self.scan_ruleset(rule, source),
            Node::AtRule(at_rule) => self.scan_at_rule(at_rule, source),
        }
    }

    fn scan_ruleset(&mut self, rule: &RuleSet, source: &str) {
        let is_root = rule.is_root();
        for item in &rule.body {
            match item {
                RuleBody::Declaration(decl) if is_root => {
                    self.collect_declaration(decl.name.clone(), decl.value.clone(), Scope::Root);
                }
                RuleBody::Declaration(_) => {}
                RuleBody::NestedRule(nested) => self.scan_ruleset(nested, source),
                RuleBody::AtRule(inner) => self.scan_at_rule(inner, source),
            }
        }
    }

    fn scan_at_rule(&mut self, at_rule: &AtRule, source: &str) {
        if at_rule.name == "layer" {
            if at_rule.params == "default" {
                if self.default_layer_breakpoints.is_empty() {
                    self.default_layer_breakpoints = screens::extract_layer_breakpoints(source);
                }
                if self.default_layer_container_breakpoints.is_empty() {
                    self.default_layer_container_breakpoints =
                        screens::extract_layer_container_breakpoints(source);
                }
            }
            if at_rule.params == "theme" {
                self.scan_theme_body(&at_rule.body);
                return;
            }
        }
        for item in &at_rule.body {
            match item {
                RuleBody::Declaration(_) => {}
                RuleBody::NestedRule(nested) => self.scan_ruleset(nested, source),
                RuleBody::AtRule(inner) => self.scan_at_rule(inner, source),
            }
        }
    }

    /// theme 层内所有声明（含嵌套规则里的）都参与配置收集。
    fn scan_theme_body(&mut self, body: &[RuleBody]) {
        for item in body {
            match item {
                RuleBody::Declaration(decl) => {
                    self.collect_declaration(decl.name.clone(), decl.value.clone(), Scope::Theme);
                }
                RuleBody::NestedRule(nested) => self.scan_theme_body(&nested.body),
                RuleBody::AtRule(inner) => self.scan_theme_body(&inner.body),
            }
        }
    }

    /// 按声明出现顺序处理；根字号与间距先于依赖它们的换算生效。
    fn collect_declaration(&mut self, name: String, value: String, scope: Scope) {
        if let Some(key) = name.strip_prefix("--breakpoint-") {
            let table = match scope {
                Scope::Root => &mut self.root_breakpoints,
                Scope::Theme => &mut self.theme_breakpoints,
            };
            table.insert(key.to_string(), value.clone());
        }
        if let Some(key) = name.strip_prefix("--container-") {
            let table = match scope {
                Scope::Root => &mut self.root_container_breakpoints,
                Scope::Theme => &mut self.theme_container_breakpoints,
            };
            table.insert(format!("@{key}"), value.clone());
        }
        if (name == "--text-base" || name == "font-size") && value.contains("px") {
            if let Some(size) = crate::units::parse_magnitude(&value) {
                if size > 0.0 {
                    self.root_font_size = size;
                }
            }
        }
        if name == "--spacing" {
            self.spacing = value.trim().to_string();
        }
        if name == "--clampwind-min" {
            self.default_min = Some(value.trim().to_string());
        }
        if name == "--clampwind-max" {
            self.default_max = Some(value.trim().to_string());
        }
        if name.starts_with("--") {
            if let Some(converted) = convert_to_rem(&value, self) {
                self.custom_properties.insert(name, converted);
            }
        }
    }

    /// 汇总各来源断点并排序。幂等：只有首次调用生效。
    /// 合并优先级从低到高：内置默认 < default 层 < :root < theme 层。
    pub fn finalize(&mut self) {
        if self.ready {
            return;
        }

        let mut screens_table = screens::default_screens();
        screens_table.extend(self.default_layer_breakpoints.clone());
        screens_table.extend(self.root_breakpoints.clone());
        screens_table.extend(self.theme_breakpoints.clone());
        self.screens = screens::convert_sort_screens(screens_table, self.root_font_size);

        let mut containers = screens::default_container_screens();
        containers.extend(self.default_layer_container_breakpoints.clone());
        containers.extend(self.root_container_breakpoints.clone());
        containers.extend(self.theme_container_breakpoints.clone());
        self.container_screens = screens::convert_sort_screens(containers, self.root_font_size);

        self.ready = true;
    }

    /// 视口默认下界：显式覆盖优先，否则取表中最小项。
    pub fn min_screen(&self) -> Option<String> {
        self.default_min
            .clone()
            .or_else(|| self.screens.values().next().cloned())
    }

    /// 视口默认上界：显式覆盖优先，否则取表中最大项。
    pub fn max_screen(&self) -> Option<String> {
        self.default_max
            .clone()
            .or_else(|| self.screens.values().last().cloned())
    }

    pub fn min_container(&self) -> Option<String> {
        self.container_screens.values().next().cloned()
    }

    pub fn max_container(&self) -> Option<String> {
        self.container_screens.values().last().cloned()
    }
}

#[derive(Debug, Clone, Copy)]
enum Scope {
    Root,
    Theme,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::CssParser;

    fn scanned(source: &str) -> TransformConfig {
        let stylesheet = CssParser::new().parse(source).unwrap();
        let mut config = TransformConfig::new();
        config.scan(&stylesheet, source);
        config.finalize();
        config
    }

    #[test]
    fn theme_layer_wins_over_root_and_defaults() {
        let config = scanned(
            ":root { --breakpoint-sm: 45rem; }\n@layer theme { --breakpoint-sm: 48rem; }",
        );
        assert_eq!(config.screens.get("sm").map(String::as_str), Some("48rem"));
    }

    #[test]
    fn finalize_is_idempotent() {
        let mut config = scanned(":root { --breakpoint-sm: 30rem; }");
        let first = config.screens.clone();
        config.finalize();
        assert_eq!(config.screens, first);
    }

    #[test]
    fn root_font_size_and_spacing_are_picked_up() {
        let config = scanned(":root { font-size: 20px; --spacing: 0.5rem; }");
        assert_eq!(config.root_font_size, 20.0);
        assert_eq!(config.spacing, "0.5rem");
    }

    #[test]
    fn custom_properties_store_unit_bearing_rem() {
        let config = scanned(":root { --space-m: 24px; }");
        assert_eq!(
            config.custom_properties.get("--space-m").map(String::as_str),
            Some("1.5rem")
        );
    }

    #[test]
    fn default_layer_is_scanned_via_raw_text() {
        let config = scanned(
            "@layer default { .theme { --breakpoint-huge: 120rem; } }\n.a { color: red; }",
        );
        assert_eq!(
            config.screens.get("huge").map(String::as_str),
            Some("120rem")
        );
        assert_eq!(config.max_screen().as_deref(), Some("120rem"));
    }

    #[test]
    fn explicit_overrides_replace_registry_ends() {
        let config = scanned(":root { --clampwind-min: 20rem; --clampwind-max: 100rem; }");
        assert_eq!(config.min_screen().as_deref(), Some("20rem"));
        assert_eq!(config.max_screen().as_deref(), Some("100rem"));
    }
}
