//! # 配置模块
//!
//! ## 设计思路
//!
//! 将所有“可调策略”集中到 `IconConfig`，保证运行时行为可观测、可调整、可测试。
//! 其中质量档位（quality / balanced / speed）作为高层语义，映射到底层滤镜选择。
//!
//! ## 实现思路
//!
//! - `Default` 对应 `quality` 档位（Lanczos3），即图标生成的推荐配置。
//! - `QualityProfile` 负责档位字符串解析与反向输出。
//! - `apply_quality_profile` 将档位转换为具体滤镜。
//! - `infer_quality_profile` 用于从当前配置反推档位（给 `settings show` 展示）。
//! - `EntryEncoding` 决定图标容器内每个条目的载荷格式。

use image::imageops::FilterType;
use serde::{Deserialize, Serialize};

use super::IconError;

/// 标准图标尺寸。
pub const CANONICAL_SIZES: [u32; 8] = [16, 24, 32, 48, 64, 96, 128, 256];

/// ICO 容器单个条目允许的最大边长。
pub const MAX_ICON_DIMENSION: u32 = 256;

/// 图标处理配置。
///
/// 字段覆盖了读取、解码、缩放与编码四个阶段。
#[derive(Debug, Clone)]
pub struct IconConfig {
    /// 读取原始字节时允许的最大文件体积（字节）。
    pub max_file_size: u64,
    /// 解码后的像素上限（`width * height`）。
    pub max_decoded_pixels: u64,
    /// 解码与画布分配允许的预计内存上限（按 RGBA 估算，字节）。
    pub max_decoded_bytes: u64,
    /// 缩放滤镜。
    pub resize_filter: FilterType,
    /// 源图小于目标尺寸时是否放大到目标尺寸。
    ///
    /// 默认关闭，与缩略图语义一致：只缩小、不放大，小图按原尺寸居中放置。
    pub allow_upscale: bool,
    /// 容器条目载荷格式。
    pub entry_encoding: EntryEncoding,
}

impl Default for IconConfig {
    fn default() -> Self {
        Self {
            max_file_size: 50 * 1024 * 1024,
            max_decoded_pixels: 40_000_000,
            max_decoded_bytes: 160 * 1024 * 1024,
            resize_filter: FilterType::Lanczos3,
            allow_upscale: false,
            entry_encoding: EntryEncoding::Png,
        }
    }
}

/// 图标质量档位（面向用户语义）。
///
/// - `Quality`：Lanczos3，边缘最锐利
/// - `Balanced`：CatmullRom
/// - `Speed`：双线性
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QualityProfile {
    Quality,
    Balanced,
    Speed,
}

impl QualityProfile {
    /// 从外部字符串解析档位。
    ///
    /// # 示例
    /// ```rust
    /// use icon_converter::icon_handler::QualityProfile;
    ///
    /// let p = QualityProfile::from_str("balanced")?;
    /// assert_eq!(p.as_str(), "balanced");
    /// # Ok::<(), icon_converter::icon_handler::IconError>(())
    /// ```
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(profile: &str) -> Result<Self, IconError> {
        match profile.trim().to_lowercase().as_str() {
            "quality" => Ok(Self::Quality),
            "balanced" => Ok(Self::Balanced),
            "speed" => Ok(Self::Speed),
            other => Err(IconError::InvalidFormat(format!(
                "未知质量档位：{}（可选：quality / balanced / speed）",
                other
            ))),
        }
    }

    /// 将档位输出为稳定字符串，供展示与持久化。
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Quality => "quality",
            Self::Balanced => "balanced",
            Self::Speed => "speed",
        }
    }
}

/// 图标容器中单个条目的载荷格式。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryEncoding {
    /// 全部条目以 PNG 子图存储（无损，透明像素可精确还原）。
    #[default]
    Png,
    /// 全部条目以未压缩 BMP（DIB）存储。
    Bmp,
    /// 交由 `ico` 的启发式选择：小尺寸且 alpha 为二值时用 BMP，否则用 PNG。
    Auto,
}

impl EntryEncoding {
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(encoding: &str) -> Result<Self, IconError> {
        match encoding.trim().to_lowercase().as_str() {
            "png" => Ok(Self::Png),
            "bmp" => Ok(Self::Bmp),
            "auto" => Ok(Self::Auto),
            other => Err(IconError::InvalidFormat(format!(
                "未知条目编码：{}（可选：png / bmp / auto）",
                other
            ))),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Bmp => "bmp",
            Self::Auto => "auto",
        }
    }
}

impl IconConfig {
    /// 基于当前滤镜反推质量档位。
    pub fn infer_quality_profile(&self) -> QualityProfile {
        match self.resize_filter {
            FilterType::Lanczos3 => QualityProfile::Quality,
            FilterType::CatmullRom | FilterType::Gaussian => QualityProfile::Balanced,
            FilterType::Triangle | FilterType::Nearest => QualityProfile::Speed,
        }
    }

    /// 应用指定质量档位到实际参数。
    pub fn apply_quality_profile(&mut self, profile: QualityProfile) {
        self.resize_filter = match profile {
            QualityProfile::Quality => FilterType::Lanczos3,
            QualityProfile::Balanced => FilterType::CatmullRom,
            QualityProfile::Speed => FilterType::Triangle,
        };
    }

    /// 在 RGBA 估算下，边长为 `size` 的正方形画布是否超出内存上限。
    pub(crate) fn canvas_fits(&self, size: u32) -> bool {
        (size as u64)
            .checked_mul(size as u64)
            .and_then(|pixels| pixels.checked_mul(4))
            .is_some_and(|bytes| bytes <= self.max_decoded_bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_uses_quality_profile() {
        let config = IconConfig::default();
        assert_eq!(config.infer_quality_profile(), QualityProfile::Quality);
        assert_eq!(config.entry_encoding, EntryEncoding::Png);
        assert!(!config.allow_upscale);
    }

    #[test]
    fn profile_round_trips_through_config() {
        for profile in [QualityProfile::Quality, QualityProfile::Balanced, QualityProfile::Speed] {
            let mut config = IconConfig::default();
            config.apply_quality_profile(profile);
            assert_eq!(config.infer_quality_profile(), profile);
        }
    }

    #[test]
    fn profile_parsing_is_case_insensitive() {
        assert_eq!(QualityProfile::from_str(" Speed ").unwrap(), QualityProfile::Speed);
        assert!(matches!(
            QualityProfile::from_str("ultra"),
            Err(IconError::InvalidFormat(_))
        ));
    }

    #[test]
    fn encoding_parsing() {
        assert_eq!(EntryEncoding::from_str("BMP").unwrap(), EntryEncoding::Bmp);
        assert_eq!(EntryEncoding::from_str("auto").unwrap().as_str(), "auto");
        assert!(EntryEncoding::from_str("jpeg").is_err());
    }

    #[test]
    fn canvas_limit_rejects_huge_sizes() {
        let mut config = IconConfig::default();
        assert!(config.canvas_fits(256));
        config.max_decoded_bytes = 1024;
        assert!(config.canvas_fits(16));
        assert!(!config.canvas_fits(17));
        assert!(!config.canvas_fits(u32::MAX));
    }

    #[test]
    fn canonical_sizes_fit_container() {
        assert!(CANONICAL_SIZES.iter().all(|s| *s <= MAX_ICON_DIMENSION));
        assert!(CANONICAL_SIZES.windows(2).all(|w| w[0] < w[1]));
    }
}
