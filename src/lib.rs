//! # 图标转换工具 — 库入口
//!
//! ## 架构总览
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │  main ── cli (clap) ── commands (参数适配 / 输出)          │
//! └───────┬──────────────────────────────────────────────────┘
//!         ↓ Result<_, AppError>
//! ┌───────┼──────────────────────────────────────────────────┐
//! │       ↓                                                  │
//! │  ┌─ error ────────── AppError (统一错误类型)               │
//! │  ├─ settings ─────── settings.json 读写                   │
//! │  ├─ storage ──────── 输出目录 / 文件命名                   │
//! │  ├─ batch ────────── 每尺寸一个文件，并发 + 取消            │
//! │  └─ icon_handler     加载·解码·栅格化·ICO 编码             │
//! │      ├─ loader       文件 / 字节 / Base64                  │
//! │      ├─ pipeline     等比缩放 + 透明画布居中               │
//! │      └─ encoder      ICO 容器编码与回读                    │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! ## 模块职责
//!
//! | 模块 | 职责 |
//! |------|------|
//! | [`error`] | 统一错误类型 `AppError`，所有命令的返回类型 |
//! | [`icon_handler`] | 源图加载、`rasterize`、`export_single` / `export_set` |
//! | [`batch`] | 多尺寸批量生成，单尺寸失败互不影响 |
//! | [`storage`] | 输出目录的解析与自动创建、固定文件名 |
//! | [`settings`] | 用户设置的持久化 |
//! | [`cli`] / [`commands`] | 命令行参数模型与命令实现 |

pub mod batch;
pub mod cli;
pub mod commands;
pub mod error;
pub mod icon_handler;
pub mod settings;
pub mod storage;
