//! # 数据源与中间模型
//!
//! ## 设计思路
//!
//! 将“外部输入类型”和“流水线中间结果”解耦：
//! - `ImageSource` 表示外部来源语义
//! - `RawImageData` 表示已加载但未解码的字节
//! - `SourceImage` 表示已解码、只读的 RGBA 源图
//! - `TargetSize` 表示经过校验的目标边长
//! - `RasterizedIcon` 表示某个尺寸的正方形透明画布结果

use std::io::Cursor;
use std::num::NonZeroU32;
use std::path::PathBuf;
use std::sync::Arc;

use image::{ImageFormat, RgbaImage};

use super::IconError;

/// 图片输入来源。
#[derive(Debug, Clone)]
pub enum ImageSource {
    /// 本地文件路径来源。
    FilePath(PathBuf),
    /// 内存中的原始字节（例如标准输入）。
    Bytes(Vec<u8>),
    /// Base64（支持 Data URL 与纯 Base64 字符串）。
    Base64(String),
}

/// 加载阶段输出：原始字节与来源标识。
pub(crate) struct RawImageData {
    /// 原始图片字节。
    pub(crate) bytes: Vec<u8>,
    /// 来源提示（用于日志与诊断）。
    pub(crate) source_hint: &'static str,
}

/// 已解码的源图。
///
/// 像素以 `Arc` 共享，克隆开销与尺寸无关，可直接交给多个工作线程。
#[derive(Debug, Clone)]
pub struct SourceImage {
    pixels: Arc<RgbaImage>,
    format: Option<ImageFormat>,
    source_hint: &'static str,
}

impl SourceImage {
    /// 直接由 RGBA 缓冲构造源图。
    pub fn from_rgba(pixels: RgbaImage) -> Self {
        Self {
            pixels: Arc::new(pixels),
            format: None,
            source_hint: "memory",
        }
    }

    pub(crate) fn decoded(
        pixels: RgbaImage,
        format: Option<ImageFormat>,
        source_hint: &'static str,
    ) -> Self {
        Self {
            pixels: Arc::new(pixels),
            format,
            source_hint,
        }
    }

    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    /// 解码时识别出的原始格式（由内存构造时为 `None`）。
    pub fn format(&self) -> Option<ImageFormat> {
        self.format
    }

    pub fn source_hint(&self) -> &'static str {
        self.source_hint
    }

    pub fn pixels(&self) -> &RgbaImage {
        &self.pixels
    }

    /// 是否存在非不透明像素。
    pub fn has_transparency(&self) -> bool {
        self.pixels.pixels().any(|p| p.0[3] != 255)
    }
}

/// 经过校验的目标边长（必为正整数）。
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TargetSize(NonZeroU32);

impl TargetSize {
    /// # 示例
    /// ```rust
    /// use icon_converter::icon_handler::TargetSize;
    ///
    /// assert_eq!(TargetSize::new(48)?.get(), 48);
    /// assert!(TargetSize::new(0).is_err());
    /// # Ok::<(), icon_converter::icon_handler::IconError>(())
    /// ```
    pub fn new(size: u32) -> Result<Self, IconError> {
        NonZeroU32::new(size)
            .map(Self)
            .ok_or_else(|| IconError::InvalidSize("目标边长必须大于 0".to_string()))
    }

    pub fn get(self) -> u32 {
        self.0.get()
    }

    /// 解析 `"16,32,48"` 形式的尺寸列表。
    ///
    /// 也接受 `48x48` 写法；宽高不一致时报错。
    pub fn parse_list(list: &str) -> Result<Vec<u32>, IconError> {
        list.split(',')
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .map(parse_size_token)
            .collect()
    }
}

fn parse_size_token(token: &str) -> Result<u32, IconError> {
    let lower = token.to_lowercase();
    let (w, h) = match lower.split_once('x') {
        Some((w, h)) => (w, h),
        None => (lower.as_str(), lower.as_str()),
    };

    let parse = |v: &str| {
        v.trim()
            .parse::<u32>()
            .map_err(|_| IconError::InvalidSize(format!("无法解析尺寸：{}", token)))
    };
    let (w, h) = (parse(w)?, parse(h)?);

    if w != h {
        return Err(IconError::InvalidSize(format!("图标必须为正方形：{}", token)));
    }
    Ok(w)
}

impl std::fmt::Display for TargetSize {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{0}x{0}", self.0)
    }
}

/// 缩放后内容在画布上的位置。
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct Placement {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// 栅格化结果：边长为 `size` 的正方形 RGBA 画布。
#[derive(Debug, Clone, PartialEq)]
pub struct RasterizedIcon {
    size: TargetSize,
    canvas: RgbaImage,
    placement: Placement,
}

impl RasterizedIcon {
    pub(crate) fn new(size: TargetSize, canvas: RgbaImage, placement: Placement) -> Self {
        Self {
            size,
            canvas,
            placement,
        }
    }

    /// 由已有的正方形 RGBA 缓冲构造（例如从图标文件解码回来的条目）。
    pub fn from_canvas(canvas: RgbaImage) -> Result<Self, IconError> {
        if canvas.width() != canvas.height() {
            return Err(IconError::InvalidSize(format!(
                "画布必须为正方形：{}x{}",
                canvas.width(),
                canvas.height()
            )));
        }
        let size = TargetSize::new(canvas.width())?;
        let placement = Placement {
            x: 0,
            y: 0,
            width: canvas.width(),
            height: canvas.height(),
        };
        Ok(Self::new(size, canvas, placement))
    }

    pub fn size(&self) -> TargetSize {
        self.size
    }

    pub fn placement(&self) -> Placement {
        self.placement
    }

    pub fn rgba(&self) -> &RgbaImage {
        &self.canvas
    }

    /// 编码为 PNG，用于逐尺寸预览。
    pub fn to_png(&self) -> Result<Vec<u8>, IconError> {
        let mut cursor = Cursor::new(Vec::new());
        self.canvas
            .write_to(&mut cursor, ImageFormat::Png)
            .map_err(|e| IconError::Encode(format!("预览 PNG 编码失败：{}", e)))?;
        Ok(cursor.into_inner())
    }
}
