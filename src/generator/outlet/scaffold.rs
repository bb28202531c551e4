use anyhow::{Result, bail};
use std::fs;
use std::path::{Component, Path, PathBuf};

use crate::types::reports::CodeScaffold;

/// 将模型给出的文件路径规范化为安全的相对路径
///
/// 拒绝空路径、绝对路径以及任何包含`..`的路径，`./`会被去掉。
pub fn safe_relative_path(raw: &str) -> Result<PathBuf> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        bail!("empty file path");
    }
    // Windows风格的路径同样按绝对路径处理
    if trimmed.starts_with('\\') || trimmed.chars().nth(1) == Some(':') {
        bail!("absolute file path: {}", trimmed);
    }

    let mut normalized = PathBuf::new();
    for component in Path::new(trimmed).components() {
        match component {
            Component::Normal(part) => normalized.push(part),
            Component::CurDir => {}
            Component::ParentDir => bail!("parent traversal in file path: {}", trimmed),
            Component::RootDir | Component::Prefix(_) => {
                bail!("absolute file path: {}", trimmed)
            }
        }
    }

    if normalized.as_os_str().is_empty() {
        bail!("empty file path: {}", trimmed);
    }
    Ok(normalized)
}

/// 将脚手架文件写入目标目录，返回写入的文件数量
///
/// 目录会先被清空，保证与最新一次生成结果一致。
pub fn write_scaffold(scaffold: &CodeScaffold, target_dir: &Path) -> Result<usize> {
    if target_dir.exists() {
        fs::remove_dir_all(target_dir)?;
    }
    fs::create_dir_all(target_dir)?;

    let mut written = 0;
    for file in &scaffold.files {
        let relative = match safe_relative_path(&file.path) {
            Ok(relative) => relative,
            Err(e) => {
                eprintln!("⚠️ 跳过脚手架文件: {}", e);
                continue;
            }
        };

        let file_path = target_dir.join(relative);
        if let Some(parent_dir) = file_path.parent()
            && !parent_dir.exists()
        {
            fs::create_dir_all(parent_dir)?;
        }
        fs::write(&file_path, &file.content)?;
        tracing::debug!(path = %file_path.display(), "scaffold file written");
        written += 1;
    }
    Ok(written)
}
