//! 统一错误类型模块
//!
//! # 设计思路
//!
//! 定义应用级 `AppError` 枚举，命令层函数统一返回 `Result<T, AppError>`，
//! `main` 只需打印错误并决定退出码。
//!
//! # 实现思路
//!
//! - 使用 `thiserror` 派生可读错误消息。
//! - 为 `IconError` / `std::io::Error` 提供 `From` 转换，无需手动 map。
//! - 实现 `Serialize` 将错误序列化为字符串，供 `--json` 输出使用。

use serde::Serialize;

use crate::icon_handler::IconError;

/// 应用级统一错误类型
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// 图标处理流水线错误（加载 / 解码 / 栅格化 / 编码 / 写盘）
    #[error("{0}")]
    Icon(#[from] IconError),

    /// 文件系统 I/O 错误
    #[error("文件系统错误: {0}")]
    Io(#[from] std::io::Error),

    /// 设置文件读写或解析失败
    #[error("设置错误: {0}")]
    Settings(String),

    /// 输出目录不可用
    #[error("输出目录不可用: {0}")]
    Storage(String),

    /// 命令行参数组合不合法
    #[error("参数错误: {0}")]
    Usage(String),
}

impl AppError {
    /// 稳定错误码；图标错误沿用 `IconError::code`。
    pub fn code(&self) -> &'static str {
        match self {
            Self::Icon(err) => err.code(),
            Self::Io(_) => "IO_ERROR",
            Self::Settings(_) => "SETTINGS_ERROR",
            Self::Storage(_) => "STORAGE_ERROR",
            Self::Usage(_) => "USAGE_ERROR",
        }
    }
}

/// 将错误序列化为人类可读的字符串。
impl Serialize for AppError {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn icon_error_is_transparent() {
        let err: AppError = IconError::InvalidSize("目标边长必须大于 0".into()).into();
        assert_eq!(err.to_string(), "尺寸错误：目标边长必须大于 0");
        assert_eq!(err.code(), "INVALID_SIZE");
    }

    #[test]
    fn serializes_as_display_string() {
        let err = AppError::Usage("缺少输入".into());
        let json = serde_json::to_string(&err).unwrap();
        assert_eq!(json, "\"参数错误: 缺少输入\"");
    }
}
