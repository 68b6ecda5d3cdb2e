use once_cell::sync::Lazy;
use regex::Regex;

use crate::ast::{AtRule, Declaration, Node, RuleBody, Stylesheet};
use crate::clamp::{extract_two_clamp_args, generate_clamp};
use crate::config::TransformConfig;
use crate::error::ClampError;
use crate::units::convert_to_rem;

/// 条件块（@media / @container）的种类。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ConditionKind {
    Media,
    Container,
}

/// 遍历时维护的条件块上下文。
#[derive(Debug, Clone)]
struct Condition {
    kind: ConditionKind,
    params: String,
}

/// 一个候选声明解析出的处理方式。
enum Resolution {
    /// 区间两端齐备，交给生成器改写。
    Bounds {
        min: String,
        max: String,
        is_container: bool,
    },
    /// 异种条件块嵌套，按最内层种类打标记。
    InvalidNesting(ConditionKind),
    /// 缺少可用区间，原样保留。
    Skip,
}

/// 阶段二：单次遍历整棵树，对每个双参数 clamp() 声明完成
/// 结构上下文分类、区间求解与就地改写。
pub struct Transformer<'a> {
    config: &'a TransformConfig,
}

impl<'a> Transformer<'a> {
    pub fn new(config: &'a TransformConfig) -> Self {
        Self { config }
    }

    pub fn run(&self, stylesheet: &mut Stylesheet) {
        let mut stack = Vec::new();
        for node in &mut stylesheet.nodes {
            self.visit_node(node, &mut stack);
        }
    }

    fn visit_node(&self, node: &mut Node, stack: &mut Vec<Condition>) {
        match node {
            Node::RuleSet(rule) => self.visit_body(&mut rule.body, stack),
            Node::AtRule(at_rule) => self.visit_at_rule(at_rule, stack),
        }
    }

    /// @layer、@supports 等对分类透明，只有 media/container 入栈。
    fn visit_at_rule(&self, at_rule: &mut AtRule, stack: &mut Vec<Condition>) {
        let kind = condition_kind(&at_rule.name);
        if let Some(kind) = kind {
            stack.push(Condition {
                kind,
                params: at_rule.params.clone(),
            });
        }
        self.visit_body(&mut at_rule.body, stack);
        if kind.is_some() {
            stack.pop();
        }
    }

    fn visit_body(&self, body: &mut [RuleBody], stack: &mut Vec<Condition>) {
        for item in body {
            match item {
                RuleBody::Declaration(decl) => self.process_declaration(decl, stack),
                RuleBody::NestedRule(rule) => self.visit_body(&mut rule.body, stack),
                RuleBody::AtRule(inner) => self.visit_at_rule(inner, stack),
            }
        }
    }

    fn process_declaration(&self, decl: &mut Declaration, stack: &[Condition]) {
        let Some((lower_raw, upper_raw)) = extract_two_clamp_args(&decl.value) else {
            return;
        };

        // 值校验先于嵌套校验：两者同时不满足时以无效值标记为准。
        let lower = convert_to_rem(&lower_raw, self.config);
        let upper = convert_to_rem(&upper_raw, self.config);
        let (Some(lower), Some(upper)) = (lower, upper) else {
            mark(decl, "Invalid clamp() values");
            return;
        };

        match self.resolve_bounds(stack) {
            Resolution::Bounds {
                min,
                max,
                is_container,
            } => match generate_clamp(&lower, &upper, &min, &max, self.config, is_container) {
                Ok(expression) => decl.value = expression,
                Err(ClampError::DegenerateRange(_)) => mark(decl, "Degenerate clamp() range"),
                Err(_) => mark(decl, "Invalid clamp() values"),
            },
            Resolution::InvalidNesting(ConditionKind::Media) => {
                mark(decl, "Invalid nested @media rules");
            }
            Resolution::InvalidNesting(ConditionKind::Container) => {
                mark(decl, "Invalid nested @container rules");
            }
            Resolution::Skip => {}
        }
    }

    /// 只看最内层条件块与它的直接条件父级，与上游行为一致。
    fn resolve_bounds(&self, stack: &[Condition]) -> Resolution {
        match stack {
            [] => {
                // 无条件上下文：取覆盖值或视口表首尾。
                match (self.config.min_screen(), self.config.max_screen()) {
                    (Some(min), Some(max)) => Resolution::Bounds {
                        min,
                        max,
                        is_container: false,
                    },
                    _ => Resolution::Skip,
                }
            }
            [single] => self.resolve_single(single),
            [.., parent, child] => {
                if parent.kind == child.kind {
                    self.resolve_double(parent, child)
                } else {
                    Resolution::InvalidNesting(child.kind)
                }
            }
        }
    }

    fn resolve_single(&self, condition: &Condition) -> Resolution {
        let is_container = condition.kind == ConditionKind::Container;
        if let Some(min) = extract_min_bound(&condition.params) {
            let max = if is_container {
                self.config.max_container()
            } else {
                self.config.max_screen()
            };
            return match max {
                Some(max) => Resolution::Bounds {
                    min,
                    max,
                    is_container,
                },
                None => Resolution::Skip,
            };
        }
        if let Some(max) = extract_max_bound(&condition.params) {
            let min = if is_container {
                self.config.min_container()
            } else {
                self.config.min_screen()
            };
            return match min {
                Some(min) => Resolution::Bounds {
                    min,
                    max,
                    is_container,
                },
                None => Resolution::Skip,
            };
        }
        Resolution::Skip
    }

    /// 双层同种嵌套：父级优先提供各自方向的边界，缺的再看子级；
    /// 两个方向凑不齐时不改写。
    fn resolve_double(&self, parent: &Condition, child: &Condition) -> Resolution {
        let min = extract_min_bound(&parent.params).or_else(|| extract_min_bound(&child.params));
        let max = extract_max_bound(&parent.params).or_else(|| extract_max_bound(&child.params));
        match (min, max) {
            (Some(min), Some(max)) => Resolution::Bounds {
                min,
                max,
                is_container: child.kind == ConditionKind::Container,
            },
            _ => Resolution::Skip,
        }
    }
}

fn condition_kind(name: &str) -> Option<ConditionKind> {
    match name {
        "media" => Some(ConditionKind::Media),
        "container" => Some(ConditionKind::Container),
        _ => None,
    }
}

/// 供下界的比较器：`(width >= X)` / `(width > X)` / `(min-width: X)`。
fn extract_min_bound(params: &str) -> Option<String> {
    static MIN_RE: Lazy<Regex> =
        Lazy::new(|| Regex::new(r"(?:>=?|min-width\s*:)\s*([^)]+)").expect("下界正则编译失败"));
    MIN_RE
        .captures(params)
        .map(|caps| caps[1].trim().to_string())
}

/// 供上界的比较器：`(width < X)` / `(width <= X)` / `(max-width: X)`。
fn extract_max_bound(params: &str) -> Option<String> {
    static MAX_RE: Lazy<Regex> =
        Lazy::new(|| Regex::new(r"(?:<=?|max-width\s*:)\s*([^)]+)").expect("上界正则编译失败"));
    MAX_RE
        .captures(params)
        .map(|caps| caps[1].trim().to_string())
}

/// 非致命失败不移除节点：原值保留，追加行内注释标记。
fn mark(decl: &mut Declaration, note: &str) {
    decl.value = format!("{} /* {} */", decl.value, note);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn comparator_extraction_covers_both_syntaxes() {
        assert_eq!(
            extract_min_bound("(width >= 40rem)").as_deref(),
            Some("40rem")
        );
        assert_eq!(
            extract_min_bound("(min-width: 640px)").as_deref(),
            Some("640px")
        );
        assert_eq!(
            extract_max_bound("(width < 64rem)").as_deref(),
            Some("64rem")
        );
        assert_eq!(
            extract_max_bound("(max-width: 600px)").as_deref(),
            Some("600px")
        );
        assert_eq!(extract_min_bound("(max-width: 600px)"), None);
        assert_eq!(extract_max_bound("(width > 40rem)"), None);
    }

    #[test]
    fn container_name_is_ignored_by_comparators() {
        assert_eq!(
            extract_min_bound("sidebar (width > 20rem)").as_deref(),
            Some("20rem")
        );
    }
}
