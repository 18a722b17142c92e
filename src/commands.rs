//! # 命令层
//!
//! 每个子命令只做参数适配：合并设置与命令行覆盖项，调用 `icon_handler` / `batch`，
//! 再把结果打印为人类可读文本或 JSON。

use serde::Serialize;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::batch::{self, BatchReport, BatchRequest, SizeOutcome};
use crate::cli::{Cli, Command, ImageCommand, RenderOptions, SettingsAction};
use crate::error::AppError;
use crate::icon_handler::{
    EntryEncoding, IconConfig, IconEntrySummary, IconRasterizer, ImageSource, QualityProfile,
    SourceImage, TargetSize, decode_icon,
};
use crate::settings::Settings;
use crate::storage;

/// 源图信息（`info` 命令输出）。
#[derive(Debug, Clone, Serialize)]
pub struct SourceInfo {
    pub width: u32,
    pub height: u32,
    pub format: Option<String>,
    pub source: &'static str,
    pub has_transparency: bool,
}

impl SourceInfo {
    pub fn from_source(image: &SourceImage) -> Self {
        Self {
            width: image.width(),
            height: image.height(),
            format: image.format().map(|f| format!("{:?}", f)),
            source: image.source_hint(),
            has_transparency: image.has_transparency(),
        }
    }
}

/// 执行一条命令。返回 `Ok(false)` 表示命令完成但存在部分失败（例如批量中的某个尺寸）。
pub async fn run(cli: Cli) -> Result<bool, AppError> {
    match cli.command {
        Command::Settings { action } => {
            let path = match cli.settings {
                Some(path) => path,
                None => Settings::default_path()?,
            };
            settings_command(&path, action)?;
            Ok(true)
        }
        Command::Image(command) => {
            let settings = load_settings(cli.settings.as_deref(), Settings::default_path)?;
            run_with_settings(command, &settings).await
        }
    }
}

/// 显式路径必须可读；未指定且无法确定用户配置目录时直接使用默认设置。
fn load_settings(
    explicit: Option<&Path>,
    default_path: impl FnOnce() -> Result<PathBuf, AppError>,
) -> Result<Settings, AppError> {
    if let Some(path) = explicit {
        return Settings::load_from_path(path);
    }
    match default_path() {
        Ok(path) => Settings::load_from_path(&path),
        Err(err) => {
            log::warn!("⚠️ {}，使用默认设置", err);
            Ok(Settings::default())
        }
    }
}

async fn run_with_settings(command: ImageCommand, settings: &Settings) -> Result<bool, AppError> {
    match command {
        ImageCommand::Convert {
            input,
            size,
            output,
            render,
        } => {
            let rasterizer = build_rasterizer(settings, &render)?;
            let source = rasterizer.load(read_source(&input)?)?;
            let path = match output {
                Some(path) => path,
                None => storage::ensure_output_dir(None, settings.output_dir.as_deref())?
                    .join(storage::icon_file_name(size, "ico")),
            };

            let bytes = rasterizer.export_single_to(&source, size, &path)?;
            println!("已写入 {} ({} bytes)", path.display(), bytes);
            Ok(true)
        }

        ImageCommand::Bundle {
            input,
            sizes,
            output,
            render,
        } => {
            let rasterizer = build_rasterizer(settings, &render)?;
            let sizes = resolve_sizes(sizes.as_deref(), settings)?;
            let source = rasterizer.load(read_source(&input)?)?;

            let bytes = rasterizer.export_bundle_to(&source, &sizes, &output)?;
            println!(
                "已写入 {} ({} 个尺寸, {} bytes)",
                output.display(),
                sizes.len(),
                bytes
            );
            Ok(true)
        }

        ImageCommand::Batch {
            input,
            sizes,
            dir,
            jobs,
            json,
            render,
        } => {
            let rasterizer = Arc::new(build_rasterizer(settings, &render)?);
            let sizes = resolve_sizes(sizes.as_deref(), settings)?;
            let source = rasterizer.load(read_source(&input)?)?;
            let output_dir =
                storage::ensure_output_dir(dir.as_deref(), settings.output_dir.as_deref())?;

            let request = BatchRequest {
                sizes,
                output_dir,
                jobs: resolve_jobs(jobs, settings)?,
            };
            let report = batch::run_batch(rasterizer, source, request, None).await?;

            if json {
                print_json(&report)?;
            } else {
                print_batch_report(&report);
            }
            Ok(report.is_success())
        }

        ImageCommand::Preview {
            input,
            sizes,
            dir,
            render,
        } => {
            let rasterizer = build_rasterizer(settings, &render)?;
            let sizes = resolve_sizes(sizes.as_deref(), settings)?;
            let source = rasterizer.load(read_source(&input)?)?;
            let output_dir =
                storage::ensure_output_dir(dir.as_deref(), settings.output_dir.as_deref())?;

            for icon in rasterizer.rasterize_many(&source, &sizes)? {
                let path = output_dir.join(storage::icon_file_name(icon.size().get(), "png"));
                IconRasterizer::write_icon_file(&path, &icon.to_png()?)?;
                println!("{} -> {}", icon.size(), path.display());
            }
            Ok(true)
        }

        ImageCommand::Info { input, json } => {
            let rasterizer = IconRasterizer::new(IconConfig::default());
            let info = SourceInfo::from_source(&rasterizer.load(read_source(&input)?)?);

            if json {
                print_json(&info)?;
            } else {
                println!(
                    "{}x{} 格式: {} 来源: {} 透明: {}",
                    info.width,
                    info.height,
                    info.format.as_deref().unwrap_or("未知"),
                    info.source,
                    if info.has_transparency { "是" } else { "否" }
                );
            }
            Ok(true)
        }

        ImageCommand::Inspect { file, json } => {
            let entries = inspect_icon_file(&file)?;

            if json {
                print_json(&entries)?;
            } else {
                println!("{}：{} 个条目", file.display(), entries.len());
                for entry in &entries {
                    println!(
                        "  {}x{} {}bpp {}",
                        entry.width, entry.height, entry.bits_per_pixel, entry.payload
                    );
                }
            }
            Ok(true)
        }
    }
}

fn settings_command(path: &Path, action: SettingsAction) -> Result<(), AppError> {
    match action {
        SettingsAction::Show { json } => {
            let settings = Settings::load_from_path(path)?;
            if json {
                print_json(&settings)?;
            } else {
                println!("设置文件: {}", path.display());
                println!("  尺寸: {:?}", settings.sizes);
                println!("  质量档位: {}", settings.profile.as_str());
                println!("  条目编码: {}", settings.entry_encoding.as_str());
                println!("  放大小图: {}", settings.allow_upscale);
                println!(
                    "  输出目录: {}",
                    settings
                        .output_dir
                        .as_deref()
                        .map(|p| p.display().to_string())
                        .unwrap_or_else(|| ".".to_string())
                );
                match settings.jobs {
                    Some(jobs) => println!("  并发数: {}", jobs),
                    None => println!("  并发数: 自动"),
                }
            }
        }
        SettingsAction::Reset => {
            Settings::reset_at(path)?;
            println!("已恢复默认设置");
        }
        SettingsAction::Set {
            sizes,
            profile,
            encoding,
            upscale,
            output_dir,
            jobs,
        } => {
            let mut settings = Settings::load_from_path(path)?;
            if let Some(sizes) = sizes {
                settings.sizes = parse_sizes(&sizes)?;
            }
            if let Some(profile) = profile {
                settings.profile = QualityProfile::from_str(&profile)?;
            }
            if let Some(encoding) = encoding {
                settings.entry_encoding = EntryEncoding::from_str(&encoding)?;
            }
            if let Some(upscale) = upscale {
                settings.allow_upscale = upscale;
            }
            if let Some(dir) = output_dir {
                settings.output_dir = Some(dir);
            }
            if let Some(jobs) = jobs {
                settings.jobs = Some(jobs);
            }
            settings.save_to_path(path)?;
            println!("设置已保存: {}", path.display());
        }
    }
    Ok(())
}

/// `-` 表示从标准输入读取全部字节；`data:` 开头的参数按 Data URL 处理。
pub fn read_source(input: &str) -> Result<ImageSource, AppError> {
    if input == "-" {
        let mut bytes = Vec::new();
        std::io::stdin().lock().read_to_end(&mut bytes)?;
        return Ok(ImageSource::Bytes(bytes));
    }
    if input.starts_with("data:") {
        return Ok(ImageSource::Base64(input.to_string()));
    }
    Ok(ImageSource::FilePath(PathBuf::from(input)))
}

/// 默认配置 ← 设置 ← 命令行覆盖项。
pub fn build_rasterizer(
    settings: &Settings,
    render: &RenderOptions,
) -> Result<IconRasterizer, AppError> {
    let mut config = IconConfig::default();
    settings.apply_to(&mut config);

    if let Some(profile) = render.profile.as_deref() {
        config.apply_quality_profile(QualityProfile::from_str(profile)?);
    }
    if let Some(encoding) = render.encoding.as_deref() {
        config.entry_encoding = EntryEncoding::from_str(encoding)?;
    }
    if render.upscale {
        config.allow_upscale = true;
    }

    Ok(IconRasterizer::new(config))
}

fn parse_sizes(list: &str) -> Result<Vec<u32>, AppError> {
    let sizes = TargetSize::parse_list(list)?;
    if sizes.is_empty() {
        return Err(AppError::Usage("尺寸列表为空".to_string()));
    }
    Ok(sizes)
}

/// 未显式指定时使用设置中的尺寸列表。
pub fn resolve_sizes(explicit: Option<&str>, settings: &Settings) -> Result<Vec<u32>, AppError> {
    match explicit {
        Some(list) => parse_sizes(list),
        None => Ok(settings.sizes.clone()),
    }
}

fn resolve_jobs(explicit: Option<usize>, settings: &Settings) -> Result<usize, AppError> {
    match explicit.or(settings.jobs) {
        Some(0) => Err(AppError::Usage("并发数必须大于 0".to_string())),
        Some(jobs) => Ok(jobs),
        None => Ok(std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(4)),
    }
}

pub fn inspect_icon_file(path: &Path) -> Result<Vec<IconEntrySummary>, AppError> {
    let bytes = std::fs::read(path)?;
    Ok(decode_icon(&bytes)?.iter().map(|entry| entry.summary()).collect())
}

fn print_batch_report(report: &BatchReport) {
    for result in &report.results {
        match &result.outcome {
            SizeOutcome::Written { path, bytes } => {
                println!("  ✓ {0}x{0} -> {1} ({2} bytes)", result.size, path.display(), bytes)
            }
            SizeOutcome::Failed {
                code,
                stage,
                message,
            } => println!("  ✗ {0}x{0} [{1}@{2}] {3}", result.size, code, stage, message),
            SizeOutcome::Cancelled => println!("  - {0}x{0} 已取消", result.size),
        }
    }
    println!(
        "完成：写出 {} 个，失败 {} 个，取消 {} 个，耗时 {}ms",
        report.written_count(),
        report.failed_count(),
        report.cancelled_count(),
        report.elapsed_ms
    );

    match storage::output_dir_info(&report.output_dir) {
        Ok(info) => println!(
            "输出目录 {}：{} 个文件，共 {} bytes",
            info.path, info.file_count, info.total_size
        ),
        Err(err) => log::warn!("读取输出目录信息失败: {}", err),
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<(), AppError> {
    let text = serde_json::to_string_pretty(value)
        .map_err(|e| AppError::Usage(format!("JSON 序列化失败: {}", e)))?;
    println!("{}", text);
    Ok(())
}
