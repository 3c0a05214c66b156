// ==========================================
// 多门店排班编制系统 - 门店/岗位/人员参照数据
// ==========================================
// 职责: 解析引擎依赖的基础参照实体
// 说明: 这些实体的增删改属于外部 CRUD, 引擎只读
// ==========================================

use serde::{Deserialize, Serialize};

/// 门店类型
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BranchType {
    pub branch_type_id: String,
    pub name: String,
}

/// 门店
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Branch {
    pub branch_id: String,
    pub name: String,
    pub branch_type_id: Option<String>, // 未归类门店无模板可继承
}

/// 岗位
///
/// 轮岗岗位 (is_rotation) 由轮岗人员动态补位, 不配置定编
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Position {
    pub position_id: String,
    pub name: String,
    pub is_rotation: bool,
}

/// 医生
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Doctor {
    pub doctor_id: String,
    pub name: String,
    pub is_active: bool,
}

/// 员工 (本店员工或轮岗人员)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Staff {
    pub staff_id: String,
    pub name: String,
    pub branch_id: Option<String>, // 本店归属, 轮岗人员为空
    pub position_id: String,
    pub is_rotation: bool,
    pub is_active: bool,
}
