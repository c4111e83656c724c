// 该文件是 Kaluli （卡路里） 项目的一部分。
// src/detector.rs - 推理适配器定义
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

use std::path::Path;

use image::RgbImage;
use serde::{Deserialize, Serialize};

use crate::detection::Detection;

/// 推理参数
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectParams {
  /// 置信度阈值 (0.0 - 1.0)
  pub confidence: f32,
  /// 推理引擎自身的 NMS IoU 阈值
  pub iou: f32,
  /// 模型输入尺寸
  pub input_size: u32,
}

impl Default for DetectParams {
  fn default() -> Self {
    Self {
      confidence: 0.5,
      iou: 0.45,
      input_size: 320,
    }
  }
}

/// 推理结果：原始检测以及引擎渲染的标注图像
#[derive(Debug, Clone)]
pub struct DetectOutput {
  pub detections: Vec<Detection>,
  pub rendered: RgbImage,
}

/// 外部检测引擎，只在缓存未命中时被调用
pub trait InferenceAdapter {
  type Error: std::error::Error + Send + Sync + 'static;

  fn detect(&self, image_path: &Path, params: &DetectParams) -> Result<DetectOutput, Self::Error>;
}

#[cfg(feature = "replay_detector")]
mod replay;
#[cfg(feature = "replay_detector")]
pub use self::replay::{ReplayDetector, ReplayDetectorError};
