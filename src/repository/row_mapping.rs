// ==========================================
// 多门店排班编制系统 - 行映射辅助
// ==========================================

use crate::domain::types::DayOfWeek;
use rusqlite::types::Type;
use rusqlite::Row;

/// 读取 day_of_week 列, 越界视为数据错误
pub(crate) fn day_of_week_at(row: &Row<'_>, idx: usize) -> rusqlite::Result<DayOfWeek> {
    let raw: i64 = row.get(idx)?;
    DayOfWeek::new(raw).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            idx,
            Type::Integer,
            format!("day_of_week 超出范围: {}", raw).into(),
        )
    })
}

/// 读取可空 day_of_week 列
pub(crate) fn optional_day_of_week_at(
    row: &Row<'_>,
    idx: usize,
) -> rusqlite::Result<Option<DayOfWeek>> {
    let raw: Option<i64> = row.get(idx)?;
    match raw {
        None => Ok(None),
        Some(_) => day_of_week_at(row, idx).map(Some),
    }
}

/// day_of_week 写入值
pub(crate) fn day_param(day: DayOfWeek) -> i64 {
    i64::from(day.value())
}
