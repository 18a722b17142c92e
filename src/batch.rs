//! # 批量生成模块
//!
//! ## 设计思路
//!
//! 每个尺寸生成一个独立的 `icon_{size}x{size}.ico` 文件。尺寸之间互不影响：
//! 某个尺寸失败只记录在它自己的结果里，其余尺寸继续处理。
//!
//! ## 实现思路
//!
//! - 源图以 `Arc` 共享，只读；配置在开始时取一次快照。
//! - 栅格化与编码都是 CPU 密集操作，放到 `spawn_blocking` 线程执行，
//!   由 `Semaphore` 限制同时运行的尺寸数。
//! - 取消是粗粒度的：每个尺寸开始前检查一次取消标志，尚未开始的尺寸记为 `Cancelled`，
//!   已写出的文件不回滚。

use chrono::{DateTime, Local};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;

use crate::error::AppError;
use crate::icon_handler::{IconError, IconRasterizer, SourceImage};
use crate::storage;

/// 批量请求。
#[derive(Debug, Clone)]
pub struct BatchRequest {
    pub sizes: Vec<u32>,
    pub output_dir: PathBuf,
    /// 同时处理的尺寸数上限（0 视为 1）。
    pub jobs: usize,
}

/// 单个尺寸的处理结果。
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum SizeOutcome {
    Written {
        path: PathBuf,
        bytes: u64,
    },
    Failed {
        code: &'static str,
        stage: &'static str,
        message: String,
    },
    Cancelled,
}

impl SizeOutcome {
    fn from_error(err: &IconError) -> Self {
        Self::Failed {
            code: err.code(),
            stage: err.stage(),
            message: err.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SizeReport {
    pub size: u32,
    #[serde(flatten)]
    pub outcome: SizeOutcome,
}

/// 批量结果报告，尺寸顺序与请求一致。
#[derive(Debug, Clone, Serialize)]
pub struct BatchReport {
    pub started_at: DateTime<Local>,
    pub elapsed_ms: u64,
    pub output_dir: PathBuf,
    pub results: Vec<SizeReport>,
}

impl BatchReport {
    pub fn written_count(&self) -> usize {
        self.count(|o| matches!(o, SizeOutcome::Written { .. }))
    }

    pub fn failed_count(&self) -> usize {
        self.count(|o| matches!(o, SizeOutcome::Failed { .. }))
    }

    pub fn cancelled_count(&self) -> usize {
        self.count(|o| matches!(o, SizeOutcome::Cancelled))
    }

    /// 所有尺寸都已写出。
    pub fn is_success(&self) -> bool {
        self.written_count() == self.results.len()
    }

    pub fn outcome_for(&self, size: u32) -> Option<&SizeOutcome> {
        self.results.iter().find(|r| r.size == size).map(|r| &r.outcome)
    }

    fn count(&self, pred: impl Fn(&SizeOutcome) -> bool) -> usize {
        self.results.iter().filter(|r| pred(&r.outcome)).count()
    }
}

enum PendingSize {
    Done(SizeOutcome),
    Running(JoinHandle<SizeOutcome>),
}

/// 执行批量生成。
///
/// 只有输出目录不可用时才整体失败；单个尺寸的错误记录在报告里。
pub async fn run_batch(
    rasterizer: Arc<IconRasterizer>,
    source: SourceImage,
    request: BatchRequest,
    cancel: Option<Arc<AtomicBool>>,
) -> Result<BatchReport, AppError> {
    let started_at = Local::now();
    let started = Instant::now();

    let config = Arc::new(rasterizer.config().clone());
    let output_dir = storage::ensure_output_dir(Some(&request.output_dir), None)?;
    let cancel = cancel.unwrap_or_default();
    let semaphore = Arc::new(Semaphore::new(request.jobs.max(1)));

    let mut sizes = Vec::with_capacity(request.sizes.len());
    for size in request.sizes {
        if sizes.contains(&size) {
            log::warn!("⚠️ 忽略重复尺寸：{}", size);
            continue;
        }
        sizes.push(size);
    }

    log::info!(
        "🚀 批量生成开始 - sizes={:?} jobs={} dir={}",
        sizes,
        request.jobs.max(1),
        output_dir.display()
    );

    let mut pending = Vec::with_capacity(sizes.len());
    for &size in &sizes {
        let permit = match Arc::clone(&semaphore).acquire_owned().await {
            Ok(permit) => permit,
            Err(_) => {
                pending.push(PendingSize::Done(SizeOutcome::Cancelled));
                continue;
            }
        };

        if cancel.load(Ordering::SeqCst) {
            log::info!("⏹️ 尺寸 {} 未开始即取消", size);
            pending.push(PendingSize::Done(SizeOutcome::Cancelled));
            continue;
        }

        let source = source.clone();
        let config = Arc::clone(&config);
        let path = output_dir.join(storage::icon_file_name(size, "ico"));

        pending.push(PendingSize::Running(tokio::task::spawn_blocking(move || {
            let _permit = permit;
            let result = IconRasterizer::build_icon_file(&source, &[size], &config)
                .and_then(|bytes| IconRasterizer::write_icon_file(&path, &bytes));

            match result {
                Ok(bytes) => SizeOutcome::Written { path, bytes },
                Err(err) => {
                    log::warn!("❌ 尺寸 {} 生成失败 [{}]：{}", size, err.code(), err);
                    SizeOutcome::from_error(&err)
                }
            }
        })));
    }

    let mut results = Vec::with_capacity(sizes.len());
    for (size, item) in sizes.into_iter().zip(pending) {
        let outcome = match item {
            PendingSize::Done(outcome) => outcome,
            PendingSize::Running(handle) => match handle.await {
                Ok(outcome) => outcome,
                Err(err) => SizeOutcome::Failed {
                    code: "WORKER_FAILED",
                    stage: "batch",
                    message: format!("工作线程执行失败：{}", err),
                },
            },
        };
        results.push(SizeReport { size, outcome });
    }

    let report = BatchReport {
        started_at,
        elapsed_ms: started.elapsed().as_millis() as u64,
        output_dir,
        results,
    };

    log::info!(
        "✅ 批量生成结束 - written={} failed={} cancelled={} total={}ms",
        report.written_count(),
        report.failed_count(),
        report.cancelled_count(),
        report.elapsed_ms
    );

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::icon_handler::{IconConfig, decode_icon};
    use image::{Rgba, RgbaImage};
    use tempfile::tempdir;
    use tokio::runtime::Runtime;

    fn source() -> SourceImage {
        SourceImage::from_rgba(RgbaImage::from_pixel(64, 32, Rgba([200, 10, 10, 255])))
    }

    fn run(request: BatchRequest, cancel: Option<Arc<AtomicBool>>) -> BatchReport {
        let rt = Runtime::new().expect("failed to build runtime");
        let rasterizer = Arc::new(IconRasterizer::new(IconConfig::default()));
        rt.block_on(run_batch(rasterizer, source(), request, cancel))
            .expect("batch should run")
    }

    #[test]
    fn writes_one_file_per_size() {
        let dir = tempdir().unwrap();
        let report = run(
            BatchRequest {
                sizes: vec![16, 32, 48],
                output_dir: dir.path().to_path_buf(),
                jobs: 2,
            },
            None,
        );

        assert!(report.is_success());
        for size in [16u32, 32, 48] {
            let path = dir.path().join(format!("icon_{0}x{0}.ico", size));
            let entries = decode_icon(&std::fs::read(&path).unwrap()).unwrap();
            assert_eq!(entries.len(), 1);
            assert_eq!(entries[0].width, size);
        }
    }

    #[test]
    fn failing_size_does_not_stop_others() {
        let dir = tempdir().unwrap();
        let report = run(
            BatchRequest {
                sizes: vec![16, 0, 300, 32],
                output_dir: dir.path().to_path_buf(),
                jobs: 4,
            },
            None,
        );

        let order: Vec<u32> = report.results.iter().map(|r| r.size).collect();
        assert_eq!(order, vec![16, 0, 300, 32]);
        assert_eq!(report.written_count(), 2);
        assert_eq!(report.failed_count(), 2);
        assert!(!report.is_success());

        assert!(matches!(
            report.outcome_for(0),
            Some(SizeOutcome::Failed { code: "INVALID_SIZE", .. })
        ));
        assert!(matches!(
            report.outcome_for(300),
            Some(SizeOutcome::Failed { code: "ENCODE_ERROR", .. })
        ));
        assert!(dir.path().join("icon_32x32.ico").exists());
        assert!(!dir.path().join("icon_300x300.ico").exists());
    }

    #[test]
    fn cancelled_before_start_writes_nothing() {
        let dir = tempdir().unwrap();
        let out = dir.path().join("out");
        let report = run(
            BatchRequest {
                sizes: vec![16, 32],
                output_dir: out.clone(),
                jobs: 1,
            },
            Some(Arc::new(AtomicBool::new(true))),
        );

        assert_eq!(report.cancelled_count(), 2);
        assert_eq!(std::fs::read_dir(&out).unwrap().count(), 0);
    }

    #[test]
    fn duplicate_sizes_are_collapsed() {
        let dir = tempdir().unwrap();
        let report = run(
            BatchRequest {
                sizes: vec![24, 24, 16],
                output_dir: dir.path().to_path_buf(),
                jobs: 0,
            },
            None,
        );

        let order: Vec<u32> = report.results.iter().map(|r| r.size).collect();
        assert_eq!(order, vec![24, 16]);
        assert!(report.is_success());
    }

    #[test]
    fn report_serializes_with_status_tags() {
        let dir = tempdir().unwrap();
        let report = run(
            BatchRequest {
                sizes: vec![16, 0],
                output_dir: dir.path().to_path_buf(),
                jobs: 1,
            },
            None,
        );

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["results"][0]["status"], "written");
        assert_eq!(json["results"][1]["status"], "failed");
        assert_eq!(json["results"][1]["stage"], "rasterize");
        assert!(json["started_at"].is_string());
    }
}
