use crate::error::FixtureError;
use crate::models::fixture::{FixtureFile, FixtureSet};
use std::path::Path;
use tokio::fs;
use tracing::{info, warn};

/// 解析 TOML 文本为题目集合
pub fn parse_fixture_toml(content: &str, source: &str, max_rows: usize) -> Result<FixtureSet, FixtureError> {
    let file: FixtureFile = toml::from_str(content).map_err(|e| FixtureError::TomlParseFailed {
        path: source.to_string(),
        source: e,
    })?;
    Ok(FixtureSet::from_rows(&file.questions, max_rows))
}

/// 从 TOML 文件加载题目
///
/// 问题或关键词为空的行会被静默过滤，只记录数量；全部被过滤时返回 [`FixtureError::Empty`]
pub async fn load_fixture_file(path: &Path, max_rows: usize) -> Result<FixtureSet, FixtureError> {
    let path_str = path.display().to_string();
    info!("正在加载题目文件: {}", path_str);

    let content = fs::read_to_string(path)
        .await
        .map_err(|e| FixtureError::ReadFailed {
            path: path_str.clone(),
            source: e,
        })?;

    let set = parse_fixture_toml(&content, &path_str, max_rows)?;

    if set.dropped() > 0 {
        warn!("⚠️ 已过滤 {} 行缺少问题或关键词的题目", set.dropped());
    }
    if set.is_empty() {
        return Err(FixtureError::Empty { path: path_str });
    }
    info!("成功加载 {} 个题目", set.len());

    Ok(set)
}
