use anyhow::Result;
/// 日志工具模块
///
/// 提供运行日志的格式化和输出辅助函数
use std::fs;
use tracing::info;

use crate::config::Config;
use crate::models::result::{BatchRunSummary, RunReport};

/// 初始化日志文件
///
/// # 参数
/// - `log_file_path`: 日志文件路径
/// - `sheet_name`: 本次运行的工作表名
pub fn init_log_file(log_file_path: &str, sheet_name: &str) -> Result<()> {
    let log_header = format!(
        "{}\n聊天机器人测试日志 - {}\n工作表: {}\n{}\n\n",
        "=".repeat(60),
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
        sheet_name,
        "=".repeat(60)
    );
    fs::write(log_file_path, log_header)?;
    Ok(())
}

/// 记录程序启动信息
pub fn log_startup(config: &Config) {
    info!("{}", "=".repeat(60));
    info!("🚀 程序启动 - 聊天机器人批量测试");
    info!("🌐 环境: {}", config.environment().display_name());
    info!("📍 地址: {}", config.bot_url);
    info!("🧪 测试类型: {}", config.test_type);
    info!("📊 每批并发数: {}", config.batch_size);
    info!("{}", "=".repeat(60));
}

/// 记录题目加载信息
///
/// # 参数
/// - `total`: 题目总数
/// - `batch_size`: 每批题目数
pub fn log_fixtures_loaded(total: usize, batch_size: usize) {
    info!("✓ 找到 {} 个待测试的题目", total);
    info!("📋 将以每批 {} 个的方式处理", batch_size);
    info!("💡 每批完成后再开始下一批\n");
}

/// 记录批次开始信息
///
/// # 参数
/// - `batch_num`: 批次编号
/// - `total_batches`: 批次总数
/// - `start`: 起始题目编号
/// - `end`: 结束题目编号
/// - `total`: 题目总数
pub fn log_batch_start(
    batch_num: usize,
    total_batches: usize,
    start: usize,
    end: usize,
    total: usize,
) {
    info!("\n{}", "=".repeat(60));
    info!("📦 开始处理第 {}/{} 批", batch_num, total_batches);
    info!("📄 本批题目: {}-{} / 共 {} 个", start, end, total);
    info!("{}", "=".repeat(60));
}

/// 记录批次完成信息
pub fn log_batch_complete(summary: &BatchRunSummary) {
    info!("\n{}", "─".repeat(60));
    info!(
        "✓ 第 {}/{} 批完成: 通过 {}/{} ({:.1}%)",
        summary.batch_index,
        summary.total_batches,
        summary.pass_count,
        summary.question_count(),
        summary.success_rate_percent
    );
    info!("{}", "─".repeat(60));
}

/// 记录批次间的冷却
pub fn log_cooldown(millis: u128) {
    info!("⏸️ 冷却 {}ms 后开始下一批...", millis);
}

/// 打印最终统计信息
///
/// # 参数
/// - `report`: 运行汇总
/// - `sheet_name`: 结果所在的工作表
/// - `log_file_path`: 日志文件路径
pub fn print_final_stats(report: &RunReport, sheet_name: &str, log_file_path: &str) {
    let total = report.total();
    let rate = if total == 0 {
        0.0
    } else {
        report.pass_count() as f64 * 100.0 / total as f64
    };
    info!("\n{}", "=".repeat(60));
    info!("📊 全部测试完成统计");
    info!(
        "完成时间: {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    info!("{}", "=".repeat(60));
    info!("✅ 通过: {}/{} ({:.1}%)", report.pass_count(), total, rate);
    info!("❌ 失败: {}", report.fail_count());
    if report.skipped > 0 {
        info!("⏭️ 取消后跳过: {}", report.skipped);
    }
    info!("⏱️ 总耗时: {:.1}s", report.elapsed_seconds);
    info!("{}", "=".repeat(60));
    info!("\n结果工作表: {}", sheet_name);
    info!("日志已保存至: {}", log_file_path);
}

/// 截断长文本用于日志显示
///
/// # 参数
/// - `text`: 原始文本
/// - `max_len`: 最大长度
///
/// # 返回
/// 返回截断后的文本
pub fn truncate_text(text: &str, max_len: usize) -> String {
    if text.chars().count() > max_len {
        text.chars().take(max_len).collect::<String>() + "..."
    } else {
        text.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncate_counts_characters_not_bytes() {
        assert_eq!(truncate_text("¿Dónde pago?", 6), "¿Dónde...");
        assert_eq!(truncate_text("corto", 10), "corto");
    }
}
