// ==========================================
// 多门店排班编制系统 - 覆写链解析
// ==========================================
// 规则: 按层级顺序, 第一个"有记录"的层胜出; 全部缺省时取调用方默认值
// 红线: 判定依据是记录是否存在, 不看内容 (显式空集同样胜出)
// ==========================================

/// 覆写链解析结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolved<S, V> {
    pub source: S,
    pub value: V,
    pub is_default: bool,
}

/// 有序层级查找
///
/// 层级在调用前已加载完毕, 解析本身是纯函数
#[derive(Debug, Clone)]
pub struct OverrideChain<S, V> {
    layers: Vec<(S, Option<V>)>,
}

impl<S: Copy, V> Default for OverrideChain<S, V> {
    fn default() -> Self {
        Self { layers: Vec::new() }
    }
}

impl<S: Copy, V> OverrideChain<S, V> {
    pub fn new() -> Self {
        Self::default()
    }

    /// 追加一层 (先追加的优先级更高); None 表示该层无记录
    pub fn layer(mut self, source: S, entry: Option<V>) -> Self {
        self.layers.push((source, entry));
        self
    }

    /// 解析, 全部层无记录时返回默认值
    pub fn resolve_or(self, default_source: S, default: V) -> Resolved<S, V> {
        self.resolve_or_else(default_source, || default)
    }

    pub fn resolve_or_else<F>(self, default_source: S, default: F) -> Resolved<S, V>
    where
        F: FnOnce() -> V,
    {
        for (source, entry) in self.layers {
            if let Some(value) = entry {
                return Resolved {
                    source,
                    value,
                    is_default: false,
                };
            }
        }

        Resolved {
            source: default_source,
            value: default(),
            is_default: true,
        }
    }
}
