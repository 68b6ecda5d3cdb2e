use indexmap::IndexMap;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::units::{parse_magnitude, smart_round};

/// 引擎内置的视口断点表。
pub fn default_screens() -> IndexMap<String, String> {
    IndexMap::from([
        ("sm".to_string(), "40rem".to_string()),   // 640px
        ("md".to_string(), "48rem".to_string()),   // 768px
        ("lg".to_string(), "64rem".to_string()),   // 1024px
        ("xl".to_string(), "80rem".to_string()),   // 1280px
        ("2xl".to_string(), "96rem".to_string()),  // 1536px
    ])
}

/// 引擎内置的容器断点表，注册后统一带 @ 前缀。
pub fn default_container_screens() -> IndexMap<String, String> {
    IndexMap::from([
        ("@3xs".to_string(), "16rem".to_string()), // 256px
        ("@2xs".to_string(), "18rem".to_string()), // 288px
        ("@xs".to_string(), "20rem".to_string()),  // 320px
        ("@sm".to_string(), "24rem".to_string()),  // 384px
        ("@md".to_string(), "28rem".to_string()),  // 448px
        ("@lg".to_string(), "32rem".to_string()),  // 512px
        ("@xl".to_string(), "36rem".to_string()),  // 576px
        ("@2xl".to_string(), "42rem".to_string()), // 672px
        ("@3xl".to_string(), "48rem".to_string()), // 768px
        ("@4xl".to_string(), "56rem".to_string()), // 896px
        ("@5xl".to_string(), "64rem".to_string()), // 1024px
        ("@6xl".to_string(), "72rem".to_string()), // 1152px
        ("@7xl".to_string(), "80rem".to_string()), // 1280px
    ])
}

/// 从原始文本中提取 `--breakpoint-*` 声明。
///
/// default 层在扫描时机上还不能保证结构化遍历到其子声明
/// （上游框架先注入文本后建树），因此这一来源保留正则回退路径。
pub fn extract_layer_breakpoints(css: &str) -> IndexMap<String, String> {
    static BREAKPOINT_RE: Lazy<Regex> = Lazy::new(|| {
        Regex::new(r"--breakpoint-([^:\s]+)\s*:\s*([^;}]+)").expect("断点正则编译失败")
    });
    let mut table = IndexMap::new();
    for caps in BREAKPOINT_RE.captures_iter(css) {
        table.insert(caps[1].trim().to_string(), caps[2].trim().to_string());
    }
    table
}

/// 同上，提取 `--container-*` 声明并加 @ 前缀。
pub fn extract_layer_container_breakpoints(css: &str) -> IndexMap<String, String> {
    static CONTAINER_RE: Lazy<Regex> = Lazy::new(|| {
        Regex::new(r"--container-([^:\s]+)\s*:\s*([^;}]+)").expect("容器断点正则编译失败")
    });
    let mut table = IndexMap::new();
    for caps in CONTAINER_RE.captures_iter(css) {
        table.insert(format!("@{}", caps[1].trim()), caps[2].trim().to_string());
    }
    table
}

/// 先把 px 值统一换算为 rem，再按数值升序稳定排序。
/// 排序后表即只读，供整个改写阶段查询首尾。
pub fn convert_sort_screens(
    screens: IndexMap<String, String>,
    root_font_size: f64,
) -> IndexMap<String, String> {
    let mut entries: Vec<(String, String)> = screens
        .into_iter()
        .map(|(key, value)| {
            let converted = if value.contains("px") {
                match parse_magnitude(&value) {
                    Some(magnitude) => format!("{}rem", smart_round(magnitude / root_font_size)),
                    None => value,
                }
            } else {
                value
            };
            (key, converted)
        })
        .collect();
    entries.sort_by(|left, right| {
        let a = parse_magnitude(&left.1).unwrap_or(f64::MAX);
        let b = parse_magnitude(&right.1).unwrap_or(f64::MAX);
        a.partial_cmp(&b).unwrap_or(std::cmp::Ordering::Equal)
    });
    entries.into_iter().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_tables_are_ascending() {
        for table in [default_screens(), default_container_screens()] {
            let values: Vec<f64> = table
                .values()
                .map(|v| parse_magnitude(v).unwrap())
                .collect();
            assert!(values.windows(2).all(|pair| pair[0] <= pair[1]));
        }
    }

    #[test]
    fn px_values_are_converted_before_sorting() {
        let screens = IndexMap::from([
            ("wide".to_string(), "1280px".to_string()),
            ("narrow".to_string(), "20rem".to_string()),
        ]);
        let sorted = convert_sort_screens(screens, 16.0);
        let entries: Vec<(&str, &str)> = sorted
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
            .collect();
        assert_eq!(entries, vec![("narrow", "20rem"), ("wide", "80rem")]);
    }

    #[test]
    fn equal_values_keep_insertion_order() {
        let screens = IndexMap::from([
            ("b".to_string(), "40rem".to_string()),
            ("a".to_string(), "40rem".to_string()),
        ]);
        let sorted = convert_sort_screens(screens, 16.0);
        let keys: Vec<&str> = sorted.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["b", "a"]);
    }

    #[test]
    fn layer_extraction_matches_prefixed_declarations() {
        let css = "@layer default {\n  :root {\n    --breakpoint-huge: 120rem;\n    --container-half: 30rem;\n    --color-bg: #fff;\n  }\n}";
        let screens = extract_layer_breakpoints(css);
        assert_eq!(screens.get("huge").map(String::as_str), Some("120rem"));
        let containers = extract_layer_container_breakpoints(css);
        assert_eq!(containers.get("@half").map(String::as_str), Some("30rem"));
    }
}
