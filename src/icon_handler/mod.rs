//! # 图标处理模块（icon_handler）
//!
//! ## 设计思路
//!
//! 该模块将“来源加载 → 解码校验 → 栅格化 → 容器编码”按职责拆分为多个子模块，
//! 避免单文件膨胀与耦合。核心的 `rasterize` / `export_single` / `export_set`
//! 都是纯函数，批量与命令行层只负责调度和写盘。
//!
//! - `handler`：`IconRasterizer`，编排整条处理流水线
//! - `loader`：文件 / 字节 / Base64 加载与签名校验
//! - `pipeline`：解码、像素限制、等比缩放与居中
//! - `encoder`：ICO 编码与回读
//! - `config/error/source`：配置、错误、中间数据模型
//!
//! ## 调用链
//!
//! ```text
//! commands.rs / batch.rs
//!    ↓
//! handler.rs（只读配置 + 阶段耗时日志）
//!    ├─ loader.rs（来源加载 + 体积 / 签名校验）
//!    ├─ pipeline.rs（解码 + 像素限制 + 栅格化）
//!    └─ encoder.rs（ICO 编码）
//!    ↓
//! 写盘 / 返回 IconError
//! ```

mod config;
mod encoder;
mod error;
mod handler;
mod loader;
mod pipeline;
mod source;

pub use config::{CANONICAL_SIZES, EntryEncoding, IconConfig, MAX_ICON_DIMENSION, QualityProfile};
pub use encoder::{
    DecodedIconEntry, IconEntrySummary, decode_icon, export_set, export_set_with, export_single,
};
pub use error::IconError;
pub use handler::IconRasterizer;
pub use pipeline::{rasterize, rasterize_with};
pub use source::{ImageSource, Placement, RasterizedIcon, SourceImage, TargetSize};
