//! 输出目录管理模块
//!
//! # 设计思路
//!
//! 统一管理生成文件的输出路径与文件命名，支持用户自定义目录，
//! 并在目录不存在时自动创建。
//!
//! # 实现思路
//!
//! - 优先使用命令行传入的目录，其次是设置中的默认目录，最后回退到当前目录。
//! - 目录不存在时自动 `create_dir_all`，避免上层判断。
//! - 文件名固定为 `icon_{size}x{size}.{ext}`，同一尺寸总是落到同一文件。

use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::AppError;

/// 输出目录信息
#[derive(Debug, Clone, Serialize)]
pub struct OutputDirInfo {
    pub path: String,
    pub total_size: u64,
    pub file_count: u64,
}

/// 单尺寸输出文件的默认文件名。
///
/// # 示例
/// ```rust
/// assert_eq!(icon_converter::storage::icon_file_name(32, "ico"), "icon_32x32.ico");
/// ```
pub fn icon_file_name(size: u32, extension: &str) -> String {
    format!("icon_{0}x{0}.{1}", size, extension)
}

/// 解析并确保输出目录存在。
///
/// # 参数
/// * `explicit` - 命令行显式指定的目录
/// * `configured` - 设置中的默认输出目录
///
/// # 返回
/// - `Ok(PathBuf)` — 可用的输出目录
/// - `Err(AppError::Storage)` — 无法创建目录或路径不是目录
pub fn ensure_output_dir(
    explicit: Option<&Path>,
    configured: Option<&Path>,
) -> Result<PathBuf, AppError> {
    let dir = explicit
        .or(configured)
        .filter(|p| !p.as_os_str().is_empty())
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."));

    if dir.exists() {
        if !dir.is_dir() {
            return Err(AppError::Storage(format!("'{}' 不是目录", dir.display())));
        }
        return Ok(dir);
    }

    fs::create_dir_all(&dir)
        .map_err(|e| AppError::Storage(format!("创建输出目录 '{}' 失败: {}", dir.display(), e)))?;
    log::info!("📂 已创建输出目录 {}", dir.display());
    Ok(dir)
}

/// 获取输出目录信息（路径 + 占用大小 + 文件数）
pub fn output_dir_info(dir: &Path) -> Result<OutputDirInfo, AppError> {
    let mut total_size: u64 = 0;
    let mut file_count: u64 = 0;

    if dir.exists() {
        for entry in fs::read_dir(dir)?.flatten() {
            if let Ok(metadata) = entry.metadata() {
                if metadata.is_file() {
                    total_size += metadata.len();
                    file_count += 1;
                }
            }
        }
    }

    Ok(OutputDirInfo {
        path: dir.to_string_lossy().to_string(),
        total_size,
        file_count,
    })
}
