//! 字段提取
//!
//! - 主数据源（Yahoo）：嵌套文档，数值包装为 `{ "raw": number }`
//! - 备用数据源（Nasdaq）：`{ value1: 标签, value2: 展示值 }` 行列表，按标签模糊匹配
//!
//! 缺失或解析失败一律返回 None，不报错

use serde_json::Value;

use super::common::{parse_display_number, NASDAQ_THOUSANDS};

/// 按候选键顺序取第一个存在的数值
///
/// 同时接受 `{ "raw": 1.0 }` 和裸数字两种形式
pub fn raw_value(node: &Value, keys: &[&str]) -> Option<f64> {
    keys.iter().find_map(|key| {
        let field = node.get(key)?;
        field
            .get("raw")
            .and_then(Value::as_f64)
            .or_else(|| field.as_f64())
    })
}

/// 取字符串字段
pub fn text_value(node: &Value, key: &str) -> Option<String> {
    node.get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// 备用数据源的标签行表
///
/// 所有模糊匹配都经过这里，标签同义词由调用方提供
#[derive(Debug, Clone, Default)]
pub struct LabeledRows {
    rows: Vec<(String, String)>,
}

impl LabeledRows {
    /// 从 `[{ "value1": ..., "value2": ... }]` 构造，跳过格式不符的行
    pub fn from_value(rows: &Value) -> Self {
        let rows = rows
            .as_array()
            .map(|arr| {
                arr.iter()
                    .filter_map(|row| {
                        let label = row.get("value1")?.as_str()?;
                        let value = match row.get("value2")? {
                            Value::String(s) => s.clone(),
                            Value::Number(n) => n.to_string(),
                            _ => return None,
                        };
                        Some((label.to_string(), value))
                    })
                    .collect()
            })
            .unwrap_or_default();

        Self { rows }
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// 查找第一个标签包含 `label`（忽略大小写）的行，数值换算为个位（×1000）
    ///
    /// 只看第一条匹配行，其值无法解析时返回 None
    pub fn lookup(&self, label: &str) -> Option<f64> {
        let needle = label.to_lowercase();
        let (_, value) = self
            .rows
            .iter()
            .find(|(row_label, _)| row_label.to_lowercase().contains(&needle))?;

        parse_display_number(value).map(|v| v * NASDAQ_THOUSANDS)
    }

    /// 依次尝试多个标签，返回第一个有值的结果
    pub fn lookup_any(&self, labels: &[&str]) -> Option<f64> {
        labels.iter().find_map(|label| self.lookup(label))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_raw_value_candidate_order() {
        let node = json!({
            "revenue": { "raw": 90.0, "fmt": "90" },
            "totalRevenue": { "raw": 100.0 },
            "plain": 7
        });

        assert_eq!(raw_value(&node, &["totalRevenue", "revenue"]), Some(100.0));
        assert_eq!(raw_value(&node, &["missing", "revenue"]), Some(90.0));
        assert_eq!(raw_value(&node, &["plain"]), Some(7.0));
        assert_eq!(raw_value(&node, &["missing"]), None);
        assert_eq!(raw_value(&Value::Null, &["totalRevenue"]), None);
    }

    #[test]
    fn test_raw_value_empty_object_is_missing() {
        // Yahoo 对缺失值会返回 {}
        let node = json!({ "pegRatio": {} });
        assert_eq!(raw_value(&node, &["pegRatio"]), None);
    }

    #[test]
    fn test_lookup_total_cash_in_thousands() {
        let rows = LabeledRows::from_value(&json!([
            { "value1": "Total Cash And Short Term Investments", "value2": "1,234" }
        ]));

        assert_eq!(rows.lookup("Total Cash"), Some(1_234_000.0));
    }

    #[test]
    fn test_lookup_is_case_insensitive_and_first_match_wins() {
        let rows = LabeledRows::from_value(&json!([
            { "value1": "Period Ending:", "value2": "9/30/2024" },
            { "value1": "NET INCOME", "value2": "$500" },
            { "value1": "Net Income Applicable", "value2": "$9" }
        ]));

        assert_eq!(rows.lookup("net income"), Some(500_000.0));
    }

    #[test]
    fn test_lookup_unparsable_or_missing() {
        let rows = LabeledRows::from_value(&json!([
            { "value1": "Total Revenue", "value2": "--" }
        ]));

        assert_eq!(rows.lookup("Total Revenue"), None);
        assert_eq!(rows.lookup("Cost of Revenue"), None);
        assert!(LabeledRows::from_value(&Value::Null).is_empty());
    }

    #[test]
    fn test_lookup_any() {
        let rows = LabeledRows::from_value(&json!([
            { "value1": "Short-Term Debt", "value2": "20" }
        ]));

        assert_eq!(
            rows.lookup_any(&["Current Debt", "Short-Term Debt"]),
            Some(20_000.0)
        );
    }
}
