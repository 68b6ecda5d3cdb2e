use once_cell::sync::Lazy;
use regex::Regex;

use crate::config::TransformConfig;
use crate::error::{ClampError, ClampResult};
use crate::units::{convert_to_rem, parse_magnitude, smart_round};

/// 提取占据整个声明值的双参数 clamp() 简写。
///
/// 每个参数只允许裸 token、带单位长度或单层 var() 引用（至多一个
/// 回退值），不允许再嵌套括号。clamp 前后带有其他 token 的值（如
/// 简写属性的一部分）不算候选，原样跳过。
pub fn extract_two_clamp_args(value: &str) -> Option<(String, String)> {
    static TWO_ARG_CLAMP_RE: Lazy<Regex> = Lazy::new(|| {
        Regex::new(r"^clamp\s*\(\s*(var\([^()]+\)|[^,()]+)\s*,\s*(var\([^()]+\)|[^,()]+)\s*\)$")
            .expect("clamp 简写正则编译失败")
    });
    let caps = TWO_ARG_CLAMP_RE.captures(value.trim())?;
    Some((caps[1].trim().to_string(), caps[2].trim().to_string()))
}

/// 由上下值与断点区间生成最终的插值表达式。
///
/// `lower` / `upper` 由调用方先行归一化为 rem；两个断点在这里换算。
/// 区间两端相等时返回 DegenerateRange，绝不把 Infinity/NaN 写进
/// 样式表。下行区间（lower > upper）只交换外层字面量，斜率符号不变。
pub fn generate_clamp(
    lower: &str,
    upper: &str,
    min_bound: &str,
    max_bound: &str,
    config: &TransformConfig,
    is_container: bool,
) -> ClampResult<String> {
    let min_rem = convert_to_rem(min_bound, config)
        .ok_or_else(|| ClampError::UnsupportedValue(min_bound.to_string()))?;
    let max_rem = convert_to_rem(max_bound, config)
        .ok_or_else(|| ClampError::UnsupportedValue(max_bound.to_string()))?;

    let min_magnitude =
        parse_magnitude(&min_rem).ok_or_else(|| ClampError::UnsupportedValue(min_rem.clone()))?;
    let max_magnitude =
        parse_magnitude(&max_rem).ok_or_else(|| ClampError::UnsupportedValue(max_rem.clone()))?;
    let lower_magnitude =
        parse_magnitude(lower).ok_or_else(|| ClampError::UnsupportedValue(lower.to_string()))?;
    let upper_magnitude =
        parse_magnitude(upper).ok_or_else(|| ClampError::UnsupportedValue(upper.to_string()))?;

    if (max_magnitude - min_magnitude).abs() < f64::EPSILON {
        return Err(ClampError::DegenerateRange(format!(
            "{min_rem} 与 {max_rem} 数值相等"
        )));
    }

    let (min, max) = if lower_magnitude > upper_magnitude {
        (upper, lower)
    } else {
        (lower, upper)
    };
    let width_unit = if is_container { "100cqw" } else { "100vw" };
    let slope = smart_round((upper_magnitude - lower_magnitude) / (max_magnitude - min_magnitude));

    Ok(format!(
        "clamp({min}, calc({lower} + {slope} * ({width_unit} - {min_rem})), {max})"
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_plain_and_var_arguments() {
        assert_eq!(
            extract_two_clamp_args("clamp(1rem, 2rem)"),
            Some(("1rem".to_string(), "2rem".to_string()))
        );
        assert_eq!(
            extract_two_clamp_args("clamp(var(--space-s, 8px), var(--space-l))"),
            Some((
                "var(--space-s, 8px)".to_string(),
                "var(--space-l)".to_string()
            ))
        );
    }

    #[test]
    fn three_argument_clamp_is_not_a_candidate() {
        assert_eq!(extract_two_clamp_args("clamp(1rem, 2vw, 3rem)"), None);
        assert_eq!(extract_two_clamp_args("clamp(calc(1rem + 2px), 3rem)"), None);
        assert_eq!(extract_two_clamp_args("clamp(1rem, 2rem) solid"), None);
        assert_eq!(extract_two_clamp_args("1px solid clamp(1rem, 2rem)"), None);
    }

    #[test]
    fn slope_matches_value_delta_over_bound_delta() {
        let config = TransformConfig::new();
        let clamp = generate_clamp("1rem", "2rem", "40rem", "96rem", &config, false).unwrap();
        assert_eq!(
            clamp,
            "clamp(1rem, calc(1rem + 0.0179 * (100vw - 40rem)), 2rem)"
        );
    }

    #[test]
    fn descending_pair_swaps_outer_bounds_only() {
        let config = TransformConfig::new();
        let clamp = generate_clamp("2rem", "1rem", "40rem", "96rem", &config, false).unwrap();
        assert_eq!(
            clamp,
            "clamp(1rem, calc(2rem + -0.0179 * (100vw - 40rem)), 2rem)"
        );
    }

    #[test]
    fn container_bounds_use_cqw() {
        let config = TransformConfig::new();
        let clamp = generate_clamp("1rem", "2rem", "20rem", "80rem", &config, true).unwrap();
        assert_eq!(
            clamp,
            "clamp(1rem, calc(1rem + 0.0167 * (100cqw - 20rem)), 2rem)"
        );
    }

    #[test]
    fn px_bound_is_interpolated_in_rem() {
        let config = TransformConfig::new();
        let clamp = generate_clamp("1rem", "2rem", "640px", "96rem", &config, false).unwrap();
        assert!(clamp.contains("(100vw - 40rem)"));
    }

    #[test]
    fn equal_bounds_are_rejected() {
        let config = TransformConfig::new();
        let err = generate_clamp("1rem", "2rem", "96rem", "96rem", &config, false).unwrap_err();
        assert!(matches!(err, ClampError::DegenerateRange(_)));
    }
}
