// 该文件是 Kaluli （卡路里） 项目的一部分。
// src/config.rs - 流水线配置
//
// 本文件根据 Apache 许可证第 2.0 版（以下简称“许可证”）授权使用；
// 除非遵守该许可证条款，否则您不得使用本文件。
// 您可通过以下网址获取许可证副本：
// http://www.apache.org/licenses/LICENSE-2.0
// 除非适用法律要求或书面同意，根据本许可协议分发的软件均按“原样”提供，
// 不附带任何形式的明示或暗示的保证或条件。
// 有关许可权限与限制的具体条款，请参阅本许可协议。
//
// Copyright (C) 2026 Johann Li <me@qinka.pro>, Wareless Group

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use crate::{calorie::CalorieTable, detector::DetectParams, merge::MergeThresholds};

const DEFAULT_CACHE_DIR: &str = "instance";

#[derive(Error, Debug)]
pub enum ConfigError {
  #[error("配置文件读取错误: {0}")]
  IoError(#[from] std::io::Error),
  #[error("配置文件格式错误: {0}")]
  JsonError(#[from] serde_json::Error),
}

/// 流水线配置，所有字段都有默认值
///
/// ```json
/// {
///   "cache_dir": "instance",
///   "merge": { "iou": 0.5, "center": 0.2 },
///   "detect": { "confidence": 0.5, "iou": 0.45, "input_size": 320 },
///   "calories": { "pizza": 800 },
///   "label_font": "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf"
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
  /// 缓存根目录
  pub cache_dir: PathBuf,
  /// 重复框合并阈值
  pub merge: MergeThresholds,
  /// 传给推理适配器的参数
  pub detect: DetectParams,
  /// 卡路里表，给出时整体替换默认表
  pub calories: CalorieTable,
  /// 标签字体
  pub label_font: Option<PathBuf>,
}

impl Default for Config {
  fn default() -> Self {
    Self {
      cache_dir: PathBuf::from(DEFAULT_CACHE_DIR),
      merge: MergeThresholds::default(),
      detect: DetectParams::default(),
      calories: CalorieTable::default(),
      label_font: None,
    }
  }
}

impl Config {
  pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
    info!("加载配置文件: {}", path.display());
    let data = std::fs::read(path)?;
    Ok(serde_json::from_slice(&data)?)
  }

  pub fn with_cache_dir(mut self, cache_dir: impl Into<PathBuf>) -> Self {
    self.cache_dir = cache_dir.into();
    self
  }

  pub fn with_merge_thresholds(mut self, merge: MergeThresholds) -> Self {
    self.merge = merge;
    self
  }

  pub fn with_detect_params(mut self, detect: DetectParams) -> Self {
    self.detect = detect;
    self
  }

  pub fn with_calories(mut self, calories: CalorieTable) -> Self {
    self.calories = calories;
    self
  }
}
