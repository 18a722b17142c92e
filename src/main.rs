//! # 图标转换工具 — 命令行入口
//!
//! 本文件仅负责日志初始化、运行时构建与退出码。
//! 业务逻辑分布在各子模块中，详见 `lib.rs` 架构文档。

use clap::Parser;
use std::process::ExitCode;

use icon_converter::cli::Cli;
use icon_converter::commands;

fn main() -> ExitCode {
    let cli = Cli::parse();

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(cli.log_filter()))
        .init();

    let runtime = match tokio::runtime::Builder::new_multi_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(err) => {
            eprintln!("错误: 无法创建异步运行时: {err}");
            return ExitCode::FAILURE;
        }
    };

    match runtime.block_on(commands::run(cli)) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => {
            log::warn!("部分任务失败");
            ExitCode::FAILURE
        }
        Err(err) => {
            log::error!("[{}] {}", err.code(), err);
            eprintln!("错误: {err}");
            ExitCode::FAILURE
        }
    }
}
