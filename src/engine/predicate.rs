// ==========================================
// 多门店排班编制系统 - 谓词匹配
// ==========================================
// 规则:
// - 谓词为空 (None) 视为通配, 恒通过, 不产生检查记录
// - 谓词非空时与上下文值比较, 记录检查结果
// - 未启用的规则恒不匹配
// 用途: 情景匹配, 轮岗偏好匹配
// ==========================================

use crate::domain::types::PredicateCheck;
use std::borrow::Borrow;
use std::fmt::Display;

/// 可空谓词相等判定
pub fn optional_eq<T>(expected: Option<&T>, observed: Option<&T>) -> bool
where
    T: PartialEq + ?Sized,
{
    match expected {
        None => true,
        Some(e) => observed.map_or(false, |o| o == e),
    }
}

// ==========================================
// PredicateMatcher - 逐字段 AND 匹配
// ==========================================
#[derive(Debug, Clone)]
pub struct PredicateMatcher {
    matched: bool,
    checks: Vec<PredicateCheck>,
}

impl PredicateMatcher {
    /// 以启用状态开始, 启用状态本身也记录为一项检查
    pub fn new(is_active: bool) -> Self {
        let mut matcher = Self {
            matched: true,
            checks: Vec::new(),
        };
        matcher.record("is_active", is_active, format!("is_active={}", is_active));
        matcher
    }

    /// 等值谓词
    pub fn equals<T>(mut self, field: &str, expected: Option<&T>, observed: Option<&T>) -> Self
    where
        T: PartialEq + Display + ?Sized,
    {
        if let Some(e) = expected {
            let passed = optional_eq(expected, observed);
            let seen = observed.map_or_else(|| "-".to_string(), |o| o.to_string());
            self.record(field, passed, format!("期望={} 实际={}", e, seen));
        }
        self
    }

    /// 成员谓词: 期望值须出现在观测集合中
    pub fn contains<T, U>(mut self, field: &str, expected: Option<&T>, observed: &[U]) -> Self
    where
        T: PartialEq + Display + ?Sized,
        U: Borrow<T>,
    {
        if let Some(e) = expected {
            let passed = observed.iter().any(|o| o.borrow() == e);
            let seen = observed
                .iter()
                .map(|o| o.borrow().to_string())
                .collect::<Vec<_>>()
                .join(",");
            self.record(field, passed, format!("期望={} 实际=[{}]", e, seen));
        }
        self
    }

    /// 自定义谓词 (仅在谓词已配置时调用)
    pub fn satisfies(mut self, field: &str, passed: bool, detail: impl Into<String>) -> Self {
        self.record(field, passed, detail.into());
        self
    }

    pub fn is_match(&self) -> bool {
        self.matched
    }

    pub fn finish(self) -> (bool, Vec<PredicateCheck>) {
        (self.matched, self.checks)
    }

    fn record(&mut self, field: &str, passed: bool, detail: String) {
        self.matched &= passed;
        self.checks.push(PredicateCheck {
            field: field.to_string(),
            matched: passed,
            detail,
        });
    }
}
