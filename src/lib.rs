//! clampwind_oxide 库入口，提供面向 Rust 与 Node.js 的双参数 clamp() 展开能力。
//! 内部分为三个阶段：解析（Parser）→ 配置扫描与改写（Transformer）→ CSS 序列化（Serializer）。
//!
//! 非标准的 `clamp(下值, 上值)` 简写会在构建期被展开为标准三参数
//! 形式，插值系数全部预先算好，浏览器端不需要任何运行时支持。

mod ast;
mod clamp;
mod config;
mod error;
mod parser;
mod screens;
mod serializer;
mod transformer;
mod units;

pub use crate::error::{ClampError, ClampResult};

use crate::config::TransformConfig;
use crate::parser::CssParser;
use crate::serializer::Serializer;
use crate::transformer::Transformer;
use std::fs;
use std::path::Path;

/// 转换配置，目前只提供基础开关，后续可扩展 source map 等高级能力。
#[derive(Debug, Clone)]
pub struct TransformOptions {
    /// 是否输出压缩后的 CSS。
    pub minify: bool,
}

impl Default for TransformOptions {
    fn default() -> Self {
        Self { minify: false }
    }
}

/// 把包含双参数 clamp() 简写的 CSS 源码展开为标准形式。
///
/// 同步单遍处理：先解析，再用一次专门的扫描遍历收集配置（根字号、
/// 间距单位、断点表、自定义属性），冻结后再做分类与改写。单个声明
/// 的失败只会在产物里留下行内标记，绝不中断整份样式表。
///
/// # 参数
/// * `source` - 待处理的 CSS 字符串
/// * `options` - 转换配置
pub fn transform(source: &str, options: TransformOptions) -> ClampResult<String> {
    let parser = CssParser::new();
    let mut stylesheet = parser.parse(source)?;

    let mut config = TransformConfig::new();
    config.scan(&stylesheet, source);
    config.finalize();

    let transformer = Transformer::new(&config);
    transformer.run(&mut stylesheet);

    let serializer = Serializer::new(options.minify);
    Ok(serializer.to_css(&stylesheet))
}

/// 从文件路径读取并转换 CSS。
pub fn transform_file<P: AsRef<Path>>(path: P, options: TransformOptions) -> ClampResult<String> {
    let path = path.as_ref();
    let source = fs::read_to_string(path)
        .map_err(|err| ClampError::Io(format!("读取文件 {} 失败: {err}", path.display())))?;
    transform(&source, options)
}

#[cfg(feature = "node")]
use napi::{Error, Result};
#[cfg(feature = "node")]
use napi_derive::napi;

/// Node.js 侧的转换选项对象。
#[cfg(feature = "node")]
#[napi(object)]
pub struct JsTransformOptions {
    /// 是否压缩输出 CSS。
    pub minify: Option<bool>,
}

/// 暴露给 Node.js 的转换函数。
#[cfg(feature = "node")]
#[napi]
pub fn transform_css(source: String, options: Option<JsTransformOptions>) -> Result<String> {
    let minify = options.and_then(|opt| opt.minify).unwrap_or(false);
    transform(&source, TransformOptions { minify })
        .map_err(|err| Error::from_reason(err.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TransformConfig;
    use crate::units::convert_to_rem;

    #[test]
    fn px_values_convert_against_root_font_size() {
        let config = TransformConfig::new();
        assert_eq!(convert_to_rem("32px", &config).as_deref(), Some("2rem"));
    }

    #[test]
    fn bare_numbers_are_spacing_multiples() {
        let mut config = TransformConfig::new();
        config.spacing = "0.25rem".to_string();
        assert_eq!(convert_to_rem("4", &config).as_deref(), Some("1rem"));
    }

    #[test]
    fn rem_values_pass_through_untouched() {
        let config = TransformConfig::new();
        assert_eq!(
            convert_to_rem("1.125rem", &config).as_deref(),
            Some("1.125rem")
        );
    }

    #[test]
    fn unsupported_units_fail_conversion() {
        let config = TransformConfig::new();
        assert_eq!(convert_to_rem("50%", &config), None);
        assert_eq!(convert_to_rem("10vw", &config), None);
    }

    #[test]
    fn var_fallback_resolves_recursively() {
        let config = TransformConfig::new();
        assert_eq!(
            convert_to_rem("var(--missing, 16px)", &config).as_deref(),
            Some("1rem")
        );
        assert_eq!(convert_to_rem("var(--missing)", &config), None);
    }

    #[test]
    fn transform_expands_unconditional_clamp() {
        let css = ".hero { padding: clamp(1rem, 3rem); }";
        let output = transform(css, TransformOptions::default()).unwrap();
        assert!(output
            .contains("padding: clamp(1rem, calc(1rem + 0.0357 * (100vw - 40rem)), 3rem);"));
    }

    #[test]
    fn transform_normalizes_px_arguments() {
        let css = ".hero { padding: clamp(16px, 48px); }";
        let output = transform(css, TransformOptions::default()).unwrap();
        assert!(output
            .contains("padding: clamp(1rem, calc(1rem + 0.0357 * (100vw - 40rem)), 3rem);"));
    }

    #[test]
    fn minified_output_keeps_expansion() {
        let css = ".hero { padding: clamp(1rem, 3rem); }";
        let output = transform(
            css,
            TransformOptions {
                minify: true,
            },
        )
        .unwrap();
        assert_eq!(
            output,
            ".hero{padding:clamp(1rem, calc(1rem + 0.0357 * (100vw - 40rem)), 3rem)}"
        );
    }

    #[test]
    fn three_argument_clamp_is_left_alone() {
        let css = ".hero { padding: clamp(1rem, 2vw, 3rem); }";
        let output = transform(css, TransformOptions::default()).unwrap();
        assert!(output.contains("padding: clamp(1rem, 2vw, 3rem);"));
        assert!(!output.contains("/*"));
    }
}
