//! # 核心编排模块
//!
//! ## 设计思路
//!
//! `IconRasterizer` 只负责流程编排，不直接与命令行绑定。
//! 处理链路固定为：
//! 1. 按来源加载原始字节并解码为源图
//! 2. 按目标尺寸栅格化
//! 3. 编码为图标容器并写盘
//!
//! ## 实现思路
//!
//! - 配置在构造时确定，之后只读；多个任务通过 `Arc<IconRasterizer>` 共享。
//! - 记录 `load/rasterize/encode/write` 阶段耗时，便于性能诊断。

use std::path::Path;
use std::time::Instant;

use super::encoder::export_set_with;
use super::pipeline::rasterize_with;
use super::source::{RasterizedIcon, SourceImage};
use super::{IconConfig, IconError, ImageSource};

/// 图标生成器。
///
/// 持有一份只读配置，并编排各子模块实现完整流程。
#[derive(Debug, Default)]
pub struct IconRasterizer {
    config: IconConfig,
}

impl IconRasterizer {
    /// 根据配置创建生成器。
    ///
    /// # 示例
    /// ```rust
    /// use icon_converter::icon_handler::{IconConfig, IconRasterizer, QualityProfile};
    ///
    /// let rasterizer = IconRasterizer::new(IconConfig::default());
    /// assert_eq!(rasterizer.config().infer_quality_profile(), QualityProfile::Quality);
    /// ```
    pub fn new(config: IconConfig) -> Self {
        log::debug!(
            "⚙️ 图标生成器配置：profile={} encoding={} upscale={}",
            config.infer_quality_profile().as_str(),
            config.entry_encoding.as_str(),
            config.allow_upscale
        );
        Self { config }
    }

    pub fn config(&self) -> &IconConfig {
        &self.config
    }

    /// 从任意来源加载并解码源图。
    pub fn load(&self, source: ImageSource) -> Result<SourceImage, IconError> {
        Self::load_with(source, &self.config)
    }

    pub(crate) fn load_with(
        source: ImageSource,
        config: &IconConfig,
    ) -> Result<SourceImage, IconError> {
        let load_start = Instant::now();
        let raw = match source {
            ImageSource::FilePath(path) => Self::load_from_file(&path, config)?,
            ImageSource::Bytes(bytes) => Self::load_from_bytes(bytes, config)?,
            ImageSource::Base64(data) => Self::load_from_base64(&data, config)?,
        };
        let load_elapsed = load_start.elapsed();

        let decode_start = Instant::now();
        let image = Self::decode_source(raw, config)?;
        let decode_elapsed = decode_start.elapsed();

        log::info!(
            "✅ 源图加载完成 - load={}ms decode={}ms",
            load_elapsed.as_millis(),
            decode_elapsed.as_millis()
        );

        Ok(image)
    }

    /// 使用当前配置栅格化单个尺寸。
    pub fn rasterize(&self, source: &SourceImage, size: u32) -> Result<RasterizedIcon, IconError> {
        rasterize_with(source, size, &self.config)
    }

    /// 依次栅格化多个尺寸；任一尺寸失败即返回错误。
    pub fn rasterize_many(
        &self,
        source: &SourceImage,
        sizes: &[u32],
    ) -> Result<Vec<RasterizedIcon>, IconError> {
        sizes
            .iter()
            .map(|size| rasterize_with(source, *size, &self.config))
            .collect()
    }

    /// 在给定配置下生成包含 `sizes` 全部尺寸的图标字节流。
    pub fn build_icon_file(
        source: &SourceImage,
        sizes: &[u32],
        config: &IconConfig,
    ) -> Result<Vec<u8>, IconError> {
        let rasterize_start = Instant::now();
        let icons = sizes
            .iter()
            .map(|size| rasterize_with(source, *size, config))
            .collect::<Result<Vec<_>, _>>()?;
        let rasterize_elapsed = rasterize_start.elapsed();

        let encode_start = Instant::now();
        let bytes = export_set_with(&icons, config.entry_encoding)?;
        let encode_elapsed = encode_start.elapsed();

        log::info!(
            "✅ 图标生成完成 - sizes={:?} rasterize={}ms encode={}ms bytes={}",
            sizes,
            rasterize_elapsed.as_millis(),
            encode_elapsed.as_millis(),
            bytes.len()
        );

        Ok(bytes)
    }

    /// 将字节写入目标路径，父目录不存在时自动创建。
    pub fn write_icon_file(path: &Path, bytes: &[u8]) -> Result<u64, IconError> {
        let write_start = Instant::now();

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| {
                IconError::FileSystem(format!("无法创建输出目录 {}：{}", parent.display(), e))
            })?;
        }

        std::fs::write(path, bytes)
            .map_err(|e| IconError::FileSystem(format!("无法写入 {}：{}", path.display(), e)))?;

        log::info!(
            "💾 已写入 {} ({} bytes, write={}ms)",
            path.display(),
            bytes.len(),
            write_start.elapsed().as_millis()
        );
        Ok(bytes.len() as u64)
    }

    /// 单尺寸：栅格化、编码并写盘，返回写入字节数。
    pub fn export_single_to(
        &self,
        source: &SourceImage,
        size: u32,
        path: &Path,
    ) -> Result<u64, IconError> {
        self.export_bundle_to(source, &[size], path)
    }

    /// 多尺寸合并到单个图标文件。
    pub fn export_bundle_to(
        &self,
        source: &SourceImage,
        sizes: &[u32],
        path: &Path,
    ) -> Result<u64, IconError> {
        let bytes = Self::build_icon_file(source, sizes, &self.config)?;
        Self::write_icon_file(path, &bytes)
    }
}
