// ==========================================
// 测试辅助函数
// ==========================================
// 职责: 临时数据库 + 标准参照数据
// 参照数据:
//   门店类型 T_STD; 门店 B1/B2 (T_STD), B3 (未归类)
//   岗位 nurse / assistant / reception / float(轮岗)
//   人员组 front{assistant, reception}, clinical{nurse}, legacy(未启用)
//   医生 D1 / D2 / D3
// ==========================================

#![allow(dead_code)]

use chrono::NaiveDate;
use staffing_engine::app::AppState;
use staffing_engine::domain::{Branch, BranchType, Doctor, Position, Staff, StaffGroup};
use std::error::Error;
use tempfile::NamedTempFile;

/// 创建临时测试数据库
///
/// # 返回
/// - NamedTempFile: 临时数据库文件（需要保持存活）
/// - String: 数据库文件路径
pub fn create_test_db() -> Result<(NamedTempFile, String), Box<dyn Error>> {
    let temp_file = NamedTempFile::new()?;
    let db_path = temp_file
        .path()
        .to_str()
        .ok_or("临时文件路径不是 UTF-8")?
        .to_string();
    Ok((temp_file, db_path))
}

/// 测试环境: 临时库 + 已建表的 AppState
pub struct TestEnv {
    pub _temp_file: NamedTempFile,
    pub state: AppState,
}

/// 创建空库
pub fn empty_env() -> TestEnv {
    let (temp_file, db_path) = create_test_db().expect("Failed to create test db");
    let state = AppState::new(db_path).expect("Failed to create AppState");
    TestEnv {
        _temp_file: temp_file,
        state,
    }
}

/// 创建带标准参照数据的测试环境
pub fn seeded_env() -> TestEnv {
    let env = empty_env();
    seed_reference_data(&env.state).expect("Failed to seed reference data");
    env
}

pub fn seed_reference_data(state: &AppState) -> Result<(), Box<dyn Error>> {
    let branch_repo = &state.repos.branch_repo;

    branch_repo.upsert_branch_type(&BranchType {
        branch_type_id: "T_STD".to_string(),
        name: "标准店".to_string(),
    })?;
    for (id, type_id) in [("B1", Some("T_STD")), ("B2", Some("T_STD")), ("B3", None)] {
        branch_repo.upsert_branch(&Branch {
            branch_id: id.to_string(),
            name: format!("门店{}", id),
            branch_type_id: type_id.map(str::to_string),
        })?;
    }

    for (id, name, is_rotation) in [
        ("nurse", "护士", false),
        ("assistant", "助理", false),
        ("reception", "前台", false),
        ("float", "轮岗", true),
    ] {
        branch_repo.upsert_position(&Position {
            position_id: id.to_string(),
            name: name.to_string(),
            is_rotation,
        })?;
    }

    for id in ["D1", "D2", "D3"] {
        branch_repo.upsert_doctor(&Doctor {
            doctor_id: id.to_string(),
            name: format!("医生{}", id),
            is_active: true,
        })?;
    }

    let constraint_repo = &state.repos.constraint_repo;
    for (id, name, is_active, members) in [
        ("front", "前场", true, vec!["assistant", "reception"]),
        ("clinical", "临床", true, vec!["nurse"]),
        ("legacy", "旧组", false, vec!["nurse"]),
    ] {
        constraint_repo.upsert_staff_group(&StaffGroup {
            staff_group_id: id.to_string(),
            name: name.to_string(),
            is_active,
            position_ids: members.into_iter().map(str::to_string).collect(),
        })?;
    }

    Ok(())
}

/// 新增员工 (本店或轮岗)
pub fn add_staff(
    state: &AppState,
    staff_id: &str,
    branch_id: Option<&str>,
    position_id: &str,
    is_rotation: bool,
) -> Result<(), Box<dyn Error>> {
    state.repos.branch_repo.upsert_staff(&Staff {
        staff_id: staff_id.to_string(),
        name: staff_id.to_string(),
        branch_id: branch_id.map(str::to_string),
        position_id: position_id.to_string(),
        is_rotation,
        is_active: true,
    })?;
    Ok(())
}

/// 日期构造
pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).expect("invalid date")
}

// 2026-10-19 周一, 2026-10-20 周二, 2026-10-21 周三, 2026-10-22 周四
pub fn monday() -> NaiveDate {
    date(2026, 10, 19)
}

pub fn tuesday() -> NaiveDate {
    date(2026, 10, 20)
}

pub fn wednesday() -> NaiveDate {
    date(2026, 10, 21)
}

pub fn thursday() -> NaiveDate {
    date(2026, 10, 22)
}
