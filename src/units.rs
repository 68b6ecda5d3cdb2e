use crate::config::TransformConfig;

/// 四舍五入到最多 4 位小数，去掉多余的零与小数点。
/// 输出稳定性依赖这条规则，斜率与换算结果都经过它。
pub fn smart_round(value: f64) -> String {
    let precise = format!("{value:.4}");
    let trimmed = precise.trim_end_matches('0').trim_end_matches('.');
    if trimmed.is_empty() || trimmed == "-0" || trimmed == "-" {
        "0".to_string()
    } else {
        trimmed.to_string()
    }
}

/// 按 parseFloat 语义解析数值前缀（"40rem" → 40.0）。
pub fn parse_magnitude(value: &str) -> Option<f64> {
    let trimmed = value.trim_start();
    let mut end = 0;
    let mut seen_digit = false;
    let mut seen_dot = false;
    for (idx, ch) in trimmed.char_indices() {
        match ch {
            '+' | '-' if idx == 0 => end = idx + 1,
            '0'..='9' => {
                seen_digit = true;
                end = idx + 1;
            }
            '.' if !seen_dot => {
                seen_dot = true;
                end = idx + 1;
            }
            _ => break,
        }
    }
    if !seen_digit {
        return None;
    }
    trimmed[..end].trim_end_matches('.').parse::<f64>().ok()
}

/// 提取长度值末尾的单位（"40rem" → "rem"）；纯数字返回 None。
pub fn extract_unit(value: &str) -> Option<&str> {
    let trimmed = value.trim();
    let start = trimmed.rfind(|ch: char| ch.is_ascii_digit() || ch == '.')? + 1;
    let unit = trimmed[start..].trim();
    if unit.is_empty() {
        None
    } else {
        Some(unit)
    }
}

/// 拆开单层 var() 引用，返回 (变量名, 可选回退值)。
/// 候选匹配已排除嵌套括号，strip 前后缀即可。
fn split_var(value: &str) -> Option<(&str, Option<&str>)> {
    let inner = value.strip_prefix("var(")?.strip_suffix(')')?;
    match inner.split_once(',') {
        Some((name, fallback)) => Some((name.trim(), Some(fallback.trim()))),
        None => Some((inner.trim(), None)),
    }
}

/// 把任意受支持的 CSS 长度归一化为 rem 字符串。
///
/// * px → 除以根字号；rem → 原样返回；其他单位 → None（不改写该声明）
/// * 纯数字 → 乘以间距单位自身的 rem 数值
/// * var(--x) / var(--x, 回退值) → 查表得到已带单位的 rem 字符串，
///   未命中时递归解析回退值
///
/// 纯函数，失败一律返回 None。
pub fn convert_to_rem(value: &str, config: &TransformConfig) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }

    if let Some((name, fallback)) = split_var(trimmed) {
        if let Some(resolved) = config.custom_properties.get(name) {
            return Some(resolved.clone());
        }
        return fallback.and_then(|fb| convert_to_rem(fb, config));
    }

    match extract_unit(trimmed) {
        Some("px") => {
            let magnitude = parse_magnitude(trimmed)?;
            Some(format!("{}rem", smart_round(magnitude / config.root_font_size)))
        }
        Some("rem") => Some(trimmed.to_string()),
        Some(_) => None,
        None => {
            let magnitude = parse_magnitude(trimmed)?;
            let spacing = spacing_rem(config)?;
            Some(format!("{}rem", smart_round(magnitude * spacing)))
        }
    }
}

/// 间距单位自身的 rem 数值；间距只认 px 与 rem 两种写法。
fn spacing_rem(config: &TransformConfig) -> Option<f64> {
    match extract_unit(&config.spacing) {
        Some("px") => Some(parse_magnitude(&config.spacing)? / config.root_font_size),
        Some("rem") => parse_magnitude(&config.spacing),
        _ => None,
    }
}
