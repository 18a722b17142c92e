//! 命令行参数模型（clap derive）。

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// 单尺寸转换未指定 `--size` 时使用的边长。
pub const DEFAULT_SINGLE_SIZE: u32 = 256;

#[derive(Parser, Debug)]
#[command(name = "icon-converter", version)]
#[command(about = "将图片转换为多尺寸 Windows 图标（.ico）", long_about = None)]
pub struct Cli {
    /// 设置文件路径（默认：用户配置目录下的 icon-converter/settings.json）
    #[arg(long, value_name = "FILE", global = true)]
    pub settings: Option<PathBuf>,

    /// 输出调试日志
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// 安静模式：只输出警告和错误
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    /// 同时指定 verbose 与 quiet 时以 quiet 为准。
    pub fn log_filter(&self) -> &'static str {
        if self.quiet {
            "warn"
        } else if self.verbose {
            "debug"
        } else {
            "info"
        }
    }
}

/// 影响栅格化与编码的通用选项，覆盖设置文件中的同名项。
#[derive(Args, Debug, Clone, Default)]
pub struct RenderOptions {
    /// 质量档位：quality / balanced / speed
    #[arg(long, value_name = "PROFILE")]
    pub profile: Option<String>,

    /// 条目编码：png / bmp / auto
    #[arg(long, value_name = "ENCODING")]
    pub encoding: Option<String>,

    /// 源图小于目标尺寸时放大到目标尺寸（默认只缩小，小图原样居中）
    #[arg(long)]
    pub upscale: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    #[command(flatten)]
    Image(ImageCommand),

    /// 查看或修改持久化设置
    Settings {
        #[command(subcommand)]
        action: SettingsAction,
    },
}

/// 需要加载设置并处理图片的子命令。
///
/// `INPUT` 可以是文件路径、`-`（标准输入）或 `data:image/...;base64,` 形式的 Data URL。
#[derive(Subcommand, Debug)]
pub enum ImageCommand {
    /// 生成单尺寸图标文件
    Convert {
        /// 输入图片：路径、`-`（标准输入）或 Data URL
        input: String,

        /// 图标边长
        #[arg(short, long, default_value_t = DEFAULT_SINGLE_SIZE)]
        size: u32,

        /// 输出文件（默认：当前目录下的 icon_{size}x{size}.ico）
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,

        #[command(flatten)]
        render: RenderOptions,
    },

    /// 将多个尺寸合并到一个图标文件
    Bundle {
        /// 输入图片：路径、`-`（标准输入）或 Data URL
        input: String,

        /// 尺寸列表，例如 16,32,48（默认取设置）
        #[arg(short, long, value_name = "SIZES")]
        sizes: Option<String>,

        /// 输出文件
        #[arg(short, long, value_name = "FILE")]
        output: PathBuf,

        #[command(flatten)]
        render: RenderOptions,
    },

    /// 每个尺寸生成一个独立图标文件
    Batch {
        /// 输入图片：路径、`-`（标准输入）或 Data URL
        input: String,

        /// 尺寸列表，例如 16,32,48（默认取设置）
        #[arg(short, long, value_name = "SIZES")]
        sizes: Option<String>,

        /// 输出目录（默认取设置，否则为当前目录）
        #[arg(short = 'd', long = "dir", value_name = "DIR")]
        dir: Option<PathBuf>,

        /// 同时处理的尺寸数（默认：CPU 核数）
        #[arg(short = 'j', long = "jobs", value_name = "N")]
        jobs: Option<usize>,

        /// 以 JSON 输出批量报告
        #[arg(long)]
        json: bool,

        #[command(flatten)]
        render: RenderOptions,
    },

    /// 为每个尺寸输出 PNG 预览
    Preview {
        /// 输入图片：路径、`-`（标准输入）或 Data URL
        input: String,

        #[arg(short, long, value_name = "SIZES")]
        sizes: Option<String>,

        /// 输出目录（默认取设置，否则为当前目录）
        #[arg(short = 'd', long = "dir", value_name = "DIR")]
        dir: Option<PathBuf>,

        #[command(flatten)]
        render: RenderOptions,
    },

    /// 显示源图信息
    Info {
        /// 输入图片：路径、`-`（标准输入）或 Data URL
        input: String,

        #[arg(long)]
        json: bool,
    },

    /// 列出图标文件中的条目
    Inspect {
        /// 图标文件路径
        file: PathBuf,

        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand, Debug)]
pub enum SettingsAction {
    /// 显示当前设置
    Show {
        #[arg(long)]
        json: bool,
    },

    /// 删除设置文件，恢复默认
    Reset,

    /// 修改设置项
    Set {
        #[arg(long, value_name = "SIZES")]
        sizes: Option<String>,

        #[arg(long, value_name = "PROFILE")]
        profile: Option<String>,

        #[arg(long, value_name = "ENCODING")]
        encoding: Option<String>,

        /// 是否放大小图
        #[arg(long, value_name = "BOOL")]
        upscale: Option<bool>,

        #[arg(long, value_name = "DIR")]
        output_dir: Option<PathBuf>,

        #[arg(long, value_name = "N")]
        jobs: Option<usize>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_batch_with_global_flags() {
        let cli = Cli::try_parse_from([
            "icon-converter",
            "batch",
            "logo.png",
            "-s",
            "16,32",
            "-d",
            "out",
            "-j",
            "2",
            "--upscale",
            "-q",
        ])
        .unwrap();

        assert_eq!(cli.log_filter(), "warn");
        match cli.command {
            Command::Image(ImageCommand::Batch {
                input,
                sizes,
                dir,
                jobs,
                render,
                ..
            }) => {
                assert_eq!(input, "logo.png");
                assert_eq!(sizes.as_deref(), Some("16,32"));
                assert_eq!(dir, Some(PathBuf::from("out")));
                assert_eq!(jobs, Some(2));
                assert!(render.upscale);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn convert_defaults_to_largest_canonical_size() {
        let cli = Cli::try_parse_from(["icon-converter", "convert", "-"]).unwrap();
        match cli.command {
            Command::Image(ImageCommand::Convert {
                size,
                output,
                render,
                ..
            }) => {
                assert_eq!(size, DEFAULT_SINGLE_SIZE);
                assert!(output.is_none());
                assert!(!render.upscale);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn settings_subcommand_is_parsed_separately() {
        let cli = Cli::try_parse_from([
            "icon-converter",
            "--settings",
            "custom.json",
            "settings",
            "set",
            "--upscale",
            "true",
        ])
        .unwrap();

        assert_eq!(cli.settings, Some(PathBuf::from("custom.json")));
        assert!(matches!(
            cli.command,
            Command::Settings {
                action: SettingsAction::Set {
                    upscale: Some(true),
                    ..
                }
            }
        ));
    }

    #[test]
    fn bundle_requires_output() {
        assert!(Cli::try_parse_from(["icon-converter", "bundle", "a.png"]).is_err());
    }
}
