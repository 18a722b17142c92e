//! # 解码与栅格化流水线模块
//!
//! ## 设计思路
//!
//! 将“字节 → 源图”和“源图 → 正方形图标画布”两段过程集中管理。
//! 解码前先读 header 尺寸做资源上限检查，降低恶意输入触发高内存开销的风险；
//! 栅格化本身是纯函数，不做 I/O，不访问共享可变状态。
//!
//! ## 实现思路
//!
//! 解码：
//! 1. 猜测格式并读取 header 尺寸
//! 2. 按像素 / 内存上限快速拒绝
//! 3. 完整解码并统一转换为 RGBA8
//!
//! 栅格化：
//! 1. 按最长边计算等比缩放尺寸（四舍五入，夹到 `1..=size`）；默认只缩小不放大
//! 2. `fast_image_resize` 卷积缩放（失败时回退 `image::imageops::resize`）
//! 3. 分配 `size × size` 的全透明画布
//! 4. 将缩放结果以“替换”方式居中拷贝到画布上

use fast_image_resize as fr;
use image::imageops::FilterType;
use image::{ImageBuffer, Rgba, RgbaImage};
use std::io::Cursor;

use super::source::{Placement, RasterizedIcon, RawImageData, SourceImage, TargetSize};
use super::{IconConfig, IconError, IconRasterizer};

/// 使用默认配置将源图栅格化为 `size × size` 的透明画布。
///
/// # 示例
/// ```rust
/// use icon_converter::icon_handler::{rasterize, SourceImage};
/// use image::{Rgba, RgbaImage};
///
/// let source = SourceImage::from_rgba(RgbaImage::from_pixel(100, 50, Rgba([255, 0, 0, 255])));
/// let icon = rasterize(&source, 64)?;
/// assert_eq!(icon.rgba().dimensions(), (64, 64));
/// assert_eq!(icon.placement().y, 16);
/// # Ok::<(), icon_converter::icon_handler::IconError>(())
/// ```
pub fn rasterize(source: &SourceImage, size: u32) -> Result<RasterizedIcon, IconError> {
    rasterize_with(source, size, &IconConfig::default())
}

/// 按给定配置栅格化。
pub fn rasterize_with(
    source: &SourceImage,
    size: u32,
    config: &IconConfig,
) -> Result<RasterizedIcon, IconError> {
    let target = TargetSize::new(size)?;

    if !config.canvas_fits(size) {
        return Err(IconError::InvalidSize(format!(
            "目标边长过大：{}（画布内存上限 {:.2} MB）",
            size,
            config.max_decoded_bytes as f64 / 1024.0 / 1024.0
        )));
    }

    let (src_width, src_height) = (source.width(), source.height());
    if src_width == 0 || src_height == 0 {
        return Err(IconError::Decode("源图尺寸为空".to_string()));
    }

    let (scaled_width, scaled_height) =
        fit_dimensions(src_width, src_height, size, config.allow_upscale);

    let scaled = if (scaled_width, scaled_height) == (src_width, src_height) {
        source.pixels().clone()
    } else {
        match IconRasterizer::resize_with_fast_image_resize(
            source.pixels(),
            scaled_width,
            scaled_height,
            config.resize_filter,
        ) {
            Ok(resized) => resized,
            Err(err) => {
                log::warn!(
                    "⚠️ fast_image_resize 缩放失败，回退 image::imageops::resize：{}",
                    err
                );
                image::imageops::resize(
                    source.pixels(),
                    scaled_width,
                    scaled_height,
                    config.resize_filter,
                )
            }
        }
    };

    let x = (size - scaled_width) / 2;
    let y = (size - scaled_height) / 2;

    let mut canvas = RgbaImage::from_pixel(size, size, Rgba([0, 0, 0, 0]));
    image::imageops::replace(&mut canvas, &scaled, i64::from(x), i64::from(y));

    log::debug!(
        "🧩 栅格化 {}x{} -> {}（内容 {}x{} @ {},{}）",
        src_width,
        src_height,
        target,
        scaled_width,
        scaled_height,
        x,
        y
    );

    Ok(RasterizedIcon::new(
        target,
        canvas,
        Placement {
            x,
            y,
            width: scaled_width,
            height: scaled_height,
        },
    ))
}

/// 计算等比缩放后的内容尺寸。
///
/// 源图能放进 `size × size` 且未开启放大时保持原尺寸，否则最长边等于 `size`。
pub(crate) fn fit_dimensions(
    width: u32,
    height: u32,
    size: u32,
    allow_upscale: bool,
) -> (u32, u32) {
    if !allow_upscale && width <= size && height <= size {
        return (width, height);
    }

    let longest = width.max(height) as f64;
    let scale = size as f64 / longest;

    let fit = |side: u32| ((side as f64 * scale).round() as u32).clamp(1, size);
    (fit(width), fit(height))
}

impl IconRasterizer {
    /// 将原始字节解码为只读 RGBA 源图。
    pub(super) fn decode_source(
        raw: RawImageData,
        config: &IconConfig,
    ) -> Result<SourceImage, IconError> {
        let (format, header_width, header_height) = Self::inspect_header_from_memory(&raw.bytes)?;
        Self::validate_pixel_limits(config, header_width, header_height)?;
        Self::validate_decoded_memory_limits(config, header_width, header_height)?;

        let decoded = image::load_from_memory(&raw.bytes)
            .map_err(|e| IconError::Decode(format!("图片解码失败：{}", e)))?;

        let rgba = decoded.to_rgba8();
        let (width, height) = rgba.dimensions();
        Self::validate_pixel_limits(config, width, height)?;

        if width == 0 || height == 0 {
            return Err(IconError::Decode("解码结果尺寸为空".to_string()));
        }

        log::info!(
            "✅ 图片解码成功 - 来源: {} 格式: {:?} 尺寸: {}x{}",
            raw.source_hint,
            format,
            width,
            height
        );

        Ok(SourceImage::decoded(rgba, format, raw.source_hint))
    }

    /// 仅通过图片头信息读取格式与宽高。
    ///
    /// 用于在完整解码前做像素限制检查。
    fn inspect_header_from_memory(
        bytes: &[u8],
    ) -> Result<(Option<image::ImageFormat>, u32, u32), IconError> {
        let reader = image::ImageReader::new(Cursor::new(bytes))
            .with_guessed_format()
            .map_err(|e| IconError::InvalidFormat(format!("无法识别图片格式：{}", e)))?;

        let format = reader.format();
        if format.is_none() {
            return Err(IconError::InvalidFormat("不支持的图片格式".to_string()));
        }

        let (width, height) = reader
            .into_dimensions()
            .map_err(|e| IconError::Decode(format!("无法读取图片尺寸：{}", e)))?;

        Ok((format, width, height))
    }

    fn validate_pixel_limits(
        config: &IconConfig,
        width: u32,
        height: u32,
    ) -> Result<(), IconError> {
        let pixels = (width as u64)
            .checked_mul(height as u64)
            .ok_or_else(|| IconError::ResourceLimit("图片像素数溢出".to_string()))?;

        if pixels > config.max_decoded_pixels {
            return Err(IconError::ResourceLimit(format!(
                "图片像素过大：{} 像素（限制：{} 像素）",
                pixels, config.max_decoded_pixels
            )));
        }

        Ok(())
    }

    fn validate_decoded_memory_limits(
        config: &IconConfig,
        width: u32,
        height: u32,
    ) -> Result<(), IconError> {
        let estimated = (width as u64)
            .checked_mul(height as u64)
            .and_then(|pixels| pixels.checked_mul(4))
            .ok_or_else(|| IconError::ResourceLimit("图片解码内存估算溢出".to_string()))?;

        if estimated > config.max_decoded_bytes {
            return Err(IconError::ResourceLimit(format!(
                "图片解码预计内存过大：{:.2} MB（限制：{:.2} MB）",
                estimated as f64 / 1024.0 / 1024.0,
                config.max_decoded_bytes as f64 / 1024.0 / 1024.0
            )));
        }

        Ok(())
    }

    fn resize_with_fast_image_resize(
        src: &RgbaImage,
        target_width: u32,
        target_height: u32,
        filter: FilterType,
    ) -> Result<RgbaImage, IconError> {
        let (src_width, src_height) = src.dimensions();

        let src_image = fr::images::Image::from_vec_u8(
            src_width,
            src_height,
            src.as_raw().clone(),
            fr::PixelType::U8x4,
        )
        .map_err(|e| IconError::InvalidSize(format!("构建源图像缓冲失败：{}", e)))?;

        let mut dst_image =
            fr::images::Image::new(target_width, target_height, fr::PixelType::U8x4);

        // 卷积前预乘 alpha，避免全透明像素的颜色渗入边缘
        let mut resizer = fr::Resizer::new();
        let options = fr::ResizeOptions::new()
            .resize_alg(fr::ResizeAlg::Convolution(Self::to_fast_filter(filter)))
            .use_alpha(true);

        resizer
            .resize(&src_image, &mut dst_image, Some(&options))
            .map_err(|e| IconError::InvalidSize(format!("fast_image_resize 执行失败：{}", e)))?;

        let raw = dst_image.into_vec();
        ImageBuffer::<Rgba<u8>, Vec<u8>>::from_raw(target_width, target_height, raw)
            .ok_or_else(|| IconError::InvalidSize("fast_image_resize 输出缓冲长度异常".to_string()))
    }

    fn to_fast_filter(filter: FilterType) -> fr::FilterType {
        match filter {
            FilterType::Nearest => fr::FilterType::Box,
            FilterType::Triangle => fr::FilterType::Bilinear,
            FilterType::CatmullRom => fr::FilterType::CatmullRom,
            FilterType::Gaussian => fr::FilterType::Mitchell,
            FilterType::Lanczos3 => fr::FilterType::Lanczos3,
        }
    }
}
