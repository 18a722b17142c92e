//! 持久化设置模块
//!
//! 设置以 JSON 形式保存在用户配置目录下的 `icon-converter/settings.json`，
//! 可通过 `--settings` 指定其他路径。命令行参数优先于设置，设置优先于默认值。

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::AppError;
use crate::icon_handler::{CANONICAL_SIZES, EntryEncoding, IconConfig, QualityProfile};

const APP_DIR_NAME: &str = "icon-converter";
const SETTINGS_FILE_NAME: &str = "settings.json";

/// 用户设置。
///
/// 缺失字段回退到默认值，旧版本的设置文件可以直接读取。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// 未指定 `--sizes` 时使用的尺寸列表。
    pub sizes: Vec<u32>,
    pub profile: QualityProfile,
    pub entry_encoding: EntryEncoding,
    pub allow_upscale: bool,
    /// 批量与预览的默认输出目录。
    pub output_dir: Option<PathBuf>,
    /// 批量并发数；为空时按 CPU 核数。
    pub jobs: Option<usize>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            sizes: CANONICAL_SIZES.to_vec(),
            profile: QualityProfile::Quality,
            entry_encoding: EntryEncoding::Png,
            allow_upscale: false,
            output_dir: None,
            jobs: None,
        }
    }
}

impl Settings {
    /// 用户配置目录下的默认设置文件路径。
    pub fn default_path() -> Result<PathBuf, AppError> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| AppError::Settings("无法确定用户配置目录".to_string()))?;
        Ok(config_dir.join(APP_DIR_NAME).join(SETTINGS_FILE_NAME))
    }

    /// 读取设置；文件不存在时返回默认值。
    pub fn load_from_path(path: &Path) -> Result<Self, AppError> {
        if !path.exists() {
            log::debug!("设置文件不存在，使用默认设置: {}", path.display());
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)?;
        let settings = serde_json::from_str::<Self>(&content)
            .map_err(|e| AppError::Settings(format!("解析设置文件失败: {}", e)))?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn save_to_path(&self, path: &Path) -> Result<(), AppError> {
        self.validate()?;

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .map_err(|e| AppError::Settings(format!("创建设置目录失败: {}", e)))?;
        }

        let content = serde_json::to_string_pretty(self)
            .map_err(|e| AppError::Settings(format!("序列化设置失败: {}", e)))?;
        fs::write(path, content)?;

        log::info!("💾 设置已保存: {}", path.display());
        Ok(())
    }

    /// 删除设置文件，恢复默认。
    pub fn reset_at(path: &Path) -> Result<(), AppError> {
        if path.exists() {
            fs::remove_file(path)?;
            log::info!("🧹 设置已重置: {}", path.display());
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<(), AppError> {
        if self.sizes.is_empty() {
            return Err(AppError::Settings("尺寸列表不能为空".to_string()));
        }
        if self.sizes.contains(&0) {
            return Err(AppError::Settings("尺寸必须大于 0".to_string()));
        }
        if self.jobs == Some(0) {
            return Err(AppError::Settings("并发数必须大于 0".to_string()));
        }
        Ok(())
    }

    /// 将设置写入运行时配置。
    pub fn apply_to(&self, config: &mut IconConfig) {
        config.apply_quality_profile(self.profile);
        config.entry_encoding = self.entry_encoding;
        config.allow_upscale = self.allow_upscale;
    }
}
