//! # 错误模型模块
//!
//! ## 设计思路
//!
//! 使用单一错误枚举承载图标链路中的所有错误来源（加载、解码、栅格化、编码、写盘）。
//! 通过 `thiserror` 保持人类可读错误，同时让调用侧可按分支匹配。
//!
//! `code()` 输出稳定的机器可读标识，`stage()` 标记出错阶段，
//! 批量转换报告与命令行 `--json` 输出都依赖这两个字段。

/// 图标处理统一错误类型。
///
/// 该类型会在命令层被上转为 `AppError`。
#[derive(Debug, thiserror::Error)]
pub enum IconError {
    /// 源图片内容损坏或无法解码。
    #[error("解码错误：{0}")]
    Decode(String),

    /// 输入不是可识别的图片（签名校验失败、Base64 格式错误等）。
    #[error("格式错误：{0}")]
    InvalidFormat(String),

    /// 目标边长为 0 或超出可分配的画布大小。
    #[error("尺寸错误：{0}")]
    InvalidSize(String),

    /// 图标容器序列化失败。
    #[error("编码错误：{0}")]
    Encode(String),

    #[error("文件错误：{0}")]
    FileSystem(String),

    #[error("资源限制：{0}")]
    ResourceLimit(String),
}

impl IconError {
    /// 稳定错误码，供 JSON 报告与脚本判断使用。
    pub fn code(&self) -> &'static str {
        match self {
            Self::Decode(_) => "DECODE_ERROR",
            Self::InvalidFormat(_) => "INVALID_FORMAT",
            Self::InvalidSize(_) => "INVALID_SIZE",
            Self::Encode(_) => "ENCODE_ERROR",
            Self::FileSystem(_) => "IO_ERROR",
            Self::ResourceLimit(_) => "RESOURCE_LIMIT",
        }
    }

    /// 出错阶段。
    pub fn stage(&self) -> &'static str {
        match self {
            Self::InvalidFormat(_) => "load",
            Self::Decode(_) => "decode",
            Self::InvalidSize(_) => "rasterize",
            Self::Encode(_) => "encode",
            Self::FileSystem(_) => "write",
            Self::ResourceLimit(_) => "load",
        }
    }

    /// 是否属于“源图片不可用”一类错误（签名错误与解码错误）。
    pub fn is_decode_failure(&self) -> bool {
        matches!(self, Self::Decode(_) | Self::InvalidFormat(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_are_distinct() {
        let errors = [
            IconError::Decode(String::new()),
            IconError::InvalidFormat(String::new()),
            IconError::InvalidSize(String::new()),
            IconError::Encode(String::new()),
            IconError::FileSystem(String::new()),
            IconError::ResourceLimit(String::new()),
        ];

        let mut codes: Vec<&str> = errors.iter().map(IconError::code).collect();
        codes.sort_unstable();
        codes.dedup();
        assert_eq!(codes.len(), errors.len());
    }

    #[test]
    fn display_keeps_detail_message() {
        let err = IconError::InvalidSize("边长必须大于 0".to_string());
        assert!(err.to_string().contains("边长必须大于 0"));
        assert_eq!(err.stage(), "rasterize");
    }

    #[test]
    fn decode_failure_covers_signature_errors() {
        assert!(IconError::InvalidFormat("x".into()).is_decode_failure());
        assert!(IconError::Decode("x".into()).is_decode_failure());
        assert!(!IconError::Encode("x".into()).is_decode_failure());
    }

    #[test]
    fn stages_follow_pipeline_order() {
        assert_eq!(IconError::InvalidFormat(String::new()).stage(), "load");
        assert_eq!(IconError::Decode(String::new()).stage(), "decode");
        assert_eq!(IconError::Encode(String::new()).stage(), "encode");
        assert_eq!(IconError::FileSystem(String::new()).stage(), "write");
    }
}
