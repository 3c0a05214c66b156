// ==========================================
// 多门店排班编制系统 - 命令行入口
// ==========================================
// 用法:
//   staffing-engine [--db <path>] <command> [args...]
//
// 命令:
//   init-db
//   constraints <branch_id>
//   doctor      <doctor_id> <date>
//   doctors     <branch_id> <date>
//   assignments <start> <end>
//   scenarios   <branch_id> <date> [position_id]
//   requirement <branch_id> <date> <position_id>
//   quota       <branch_id> <date> [--refresh]
//   config
//
// 输出: JSON (stdout), 日志写 stderr
// ==========================================

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use serde::Serialize;

use staffing_engine::app::{get_default_db_path, AppState};
use staffing_engine::logging;

const USAGE: &str = "usage: staffing-engine [--db <path>] <init-db|constraints|doctor|doctors|assignments|scenarios|requirement|quota|config> [args...]";

fn main() -> Result<()> {
    logging::init();

    let mut args: Vec<String> = std::env::args().skip(1).collect();
    let db_path = match args.iter().position(|a| a == "--db") {
        Some(idx) => {
            if idx + 1 >= args.len() {
                bail!("--db 缺少路径参数");
            }
            let path = args.remove(idx + 1);
            args.remove(idx);
            path
        }
        None => get_default_db_path(),
    };

    let Some(command) = args.first().cloned() else {
        bail!(USAGE);
    };
    let rest = &args[1..];

    tracing::info!("{} v{}", staffing_engine::APP_NAME, staffing_engine::VERSION);
    tracing::info!("使用数据库: {}", db_path);

    let state = AppState::new(db_path.clone()).map_err(anyhow::Error::msg)?;

    match command.as_str() {
        "init-db" => print_json(&serde_json::json!({ "db_path": db_path, "status": "ok" })),
        "constraints" => {
            let branch_id = arg(rest, 0, "branch_id")?;
            print_json(&state.constraint_api.resolve_constraints(branch_id)?)
        }
        "doctor" => {
            let doctor_id = arg(rest, 0, "doctor_id")?;
            let date = date_arg(rest, 1)?;
            print_json(
                &state
                    .doctor_schedule_api
                    .resolve_doctor_assignment(doctor_id, date)?,
            )
        }
        "doctors" => {
            let branch_id = arg(rest, 0, "branch_id")?;
            let date = date_arg(rest, 1)?;
            print_json(&state.doctor_schedule_api.doctors_at_branch(branch_id, date)?)
        }
        "assignments" => {
            let start = date_arg(rest, 0)?;
            let end = date_arg(rest, 1)?;
            print_json(
                &state
                    .doctor_schedule_api
                    .resolve_doctor_assignments(start, end)?,
            )
        }
        "scenarios" => {
            let branch_id = arg(rest, 0, "branch_id")?;
            let date = date_arg(rest, 1)?;
            let position_id = rest.get(2).map(String::as_str);
            print_json(
                &state
                    .requirement_api
                    .match_scenarios(branch_id, date, position_id, None)?,
            )
        }
        "requirement" => {
            let branch_id = arg(rest, 0, "branch_id")?;
            let date = date_arg(rest, 1)?;
            let position_id = arg(rest, 2, "position_id")?;
            print_json(
                &state
                    .requirement_api
                    .calculate_requirement(branch_id, date, position_id, None)?,
            )
        }
        "quota" => {
            let branch_id = arg(rest, 0, "branch_id")?;
            let date = date_arg(rest, 1)?;
            let status = if rest.iter().any(|a| a == "--refresh") {
                state.requirement_api.refresh_quota_status(branch_id, date)?
            } else {
                state.requirement_api.aggregate_quota_status(branch_id, date)?
            };
            print_json(&status)
        }
        "config" => print_json(&state.config_api.list_configs()?),
        other => bail!("未知命令: {}\n{}", other, USAGE),
    }
}

fn arg<'a>(rest: &'a [String], idx: usize, name: &str) -> Result<&'a str> {
    rest.get(idx)
        .map(String::as_str)
        .with_context(|| format!("缺少参数 {}\n{}", name, USAGE))
}

fn date_arg(rest: &[String], idx: usize) -> Result<NaiveDate> {
    let raw = arg(rest, idx, "date")?;
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").with_context(|| format!("日期格式错误: {}", raw))
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
