//! # 图标容器编码模块
//!
//! ## 设计思路
//!
//! 将一个或多个栅格化结果序列化为单个 ICO 字节流。目录头、目录项与载荷布局
//! 交给 `ico` crate 处理，本模块只负责输入校验与载荷格式选择。
//!
//! ## 实现思路
//!
//! - 编码前统一校验：序列非空、边长不超过 256、尺寸不重复。
//! - 按 `EntryEncoding` 选择 PNG / BMP / 自动。
//! - `decode_icon` 读取目录与全部条目，用于往返校验和 `inspect` 命令。

use std::collections::HashSet;
use std::io::Cursor;

use ico::{IconDir, IconDirEntry, IconImage, ResourceType};
use image::RgbaImage;
use serde::Serialize;

use super::config::MAX_ICON_DIMENSION;
use super::source::RasterizedIcon;
use super::{EntryEncoding, IconError};

/// 单尺寸图标编码（默认 PNG 条目）。
pub fn export_single(icon: &RasterizedIcon) -> Result<Vec<u8>, IconError> {
    export_set(std::slice::from_ref(icon))
}

/// 多尺寸图标编码（默认 PNG 条目），条目顺序与输入一致。
pub fn export_set(icons: &[RasterizedIcon]) -> Result<Vec<u8>, IconError> {
    export_set_with(icons, EntryEncoding::default())
}

/// 按指定条目载荷格式编码。
pub fn export_set_with(
    icons: &[RasterizedIcon],
    encoding: EntryEncoding,
) -> Result<Vec<u8>, IconError> {
    validate_icon_set(icons)?;

    let mut icon_dir = IconDir::new(ResourceType::Icon);
    for icon in icons {
        let canvas = icon.rgba();
        let image =
            IconImage::from_rgba_data(canvas.width(), canvas.height(), canvas.as_raw().clone());

        let entry = match encoding {
            EntryEncoding::Png => IconDirEntry::encode_as_png(&image),
            EntryEncoding::Bmp => IconDirEntry::encode_as_bmp(&image),
            EntryEncoding::Auto => IconDirEntry::encode(&image),
        }
        .map_err(|e| IconError::Encode(format!("{} 条目编码失败：{}", icon.size(), e)))?;

        icon_dir.add_entry(entry);
    }

    let mut buffer = Vec::new();
    icon_dir
        .write(&mut buffer)
        .map_err(|e| IconError::Encode(format!("图标容器写出失败：{}", e)))?;

    log::debug!(
        "📦 图标编码完成 - {} 个条目 ({}) {} bytes",
        icons.len(),
        encoding.as_str(),
        buffer.len()
    );

    Ok(buffer)
}

fn validate_icon_set(icons: &[RasterizedIcon]) -> Result<(), IconError> {
    if icons.is_empty() {
        return Err(IconError::Encode("图标序列为空".to_string()));
    }

    let mut seen = HashSet::with_capacity(icons.len());
    for icon in icons {
        let side = icon.size().get();
        if side > MAX_ICON_DIMENSION {
            return Err(IconError::Encode(format!(
                "图标边长 {} 超出容器上限 {}",
                side, MAX_ICON_DIMENSION
            )));
        }
        if !seen.insert(side) {
            return Err(IconError::Encode(format!("重复的图标尺寸：{}", icon.size())));
        }
    }

    Ok(())
}

/// 从图标字节流解码出的单个条目。
#[derive(Debug, Clone)]
pub struct DecodedIconEntry {
    pub width: u32,
    pub height: u32,
    pub bits_per_pixel: u16,
    pub is_png: bool,
    pub rgba: RgbaImage,
}

/// `DecodedIconEntry` 的可序列化摘要（不含像素）。
#[derive(Debug, Clone, Serialize)]
pub struct IconEntrySummary {
    pub width: u32,
    pub height: u32,
    pub bits_per_pixel: u16,
    pub payload: &'static str,
}

impl DecodedIconEntry {
    pub fn summary(&self) -> IconEntrySummary {
        IconEntrySummary {
            width: self.width,
            height: self.height,
            bits_per_pixel: self.bits_per_pixel,
            payload: if self.is_png { "png" } else { "bmp" },
        }
    }
}

/// 读取 ICO 字节流中的全部条目。
pub fn decode_icon(bytes: &[u8]) -> Result<Vec<DecodedIconEntry>, IconError> {
    let icon_dir = IconDir::read(Cursor::new(bytes))
        .map_err(|e| IconError::Decode(format!("图标目录解析失败：{}", e)))?;

    icon_dir
        .entries()
        .iter()
        .enumerate()
        .map(|(index, entry)| {
            let image = entry
                .decode()
                .map_err(|e| IconError::Decode(format!("第 {} 个条目解码失败：{}", index, e)))?;

            let (width, height) = (image.width(), image.height());
            let rgba = RgbaImage::from_raw(width, height, image.rgba_data().to_vec())
                .ok_or_else(|| IconError::Decode(format!("第 {} 个条目像素长度异常", index)))?;

            Ok(DecodedIconEntry {
                width: entry.width(),
                height: entry.height(),
                bits_per_pixel: entry.bits_per_pixel(),
                is_png: entry.is_png(),
                rgba,
            })
        })
        .collect()
}
