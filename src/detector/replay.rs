// 该文件是 Kaluli （卡路里） 项目的一部分。
// src/detector/replay.rs - 回放外部引擎的检测结果
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

use thiserror::Error;
use tracing::{debug, error, info};
use url::Url;

use crate::{
  FromUrl, FromUrlWithScheme,
  detection::Detection,
  detector::{DetectOutput, DetectParams, InferenceAdapter},
  render::Draw,
};

#[derive(Error, Debug)]
pub enum ReplayDetectorError {
  #[error("URI 方案不匹配: {0}")]
  SchemeMismatch(String),
  #[error("检测文件路径无效: {0}")]
  InvalidPath(String),
  #[error("I/O 错误: {0}")]
  IoError(#[from] std::io::Error),
  #[error("检测文件格式错误: {0}")]
  JsonError(#[from] serde_json::Error),
  #[error("图像加载错误: {0}")]
  ImageError(#[from] image::ImageError),
}

/// 从 JSON 文件回放外部引擎给出的检测，并在输入图像上绘制标注
///
/// 文件内容为检测数组：
/// `[{"bbox": [x1, y1, x2, y2], "confidence": 0.9, "class_id": 9, "class_name": "pizza"}]`
pub struct ReplayDetector {
  detections: Vec<Detection>,
  draw: Draw,
}

impl FromUrlWithScheme for ReplayDetector {
  const SCHEME: &'static str = "replay";
}

impl FromUrl for ReplayDetector {
  type Error = ReplayDetectorError;

  fn from_url(url: &Url) -> Result<Self, Self::Error> {
    if url.scheme() != Self::SCHEME {
      error!(
        "URI scheme mismatch: expected '{}', found '{}'",
        Self::SCHEME,
        url.scheme()
      );
      return Err(ReplayDetectorError::SchemeMismatch(url.scheme().to_string()));
    }

    let path = urlencoding::decode(url.path())
      .map_err(|e| ReplayDetectorError::InvalidPath(format!("{}: {}", url.path(), e)))?;
    info!("加载检测文件: {}", path);
    let data = std::fs::read(&*path)?;
    Self::from_json(&data)
  }
}

impl ReplayDetector {
  pub fn new(detections: Vec<Detection>) -> Self {
    Self {
      detections,
      draw: Draw::default(),
    }
  }

  pub fn from_json(data: &[u8]) -> Result<Self, ReplayDetectorError> {
    let detections: Vec<Detection> = serde_json::from_slice(data)?;
    debug!("检测文件包含 {} 个检测", detections.len());
    Ok(Self::new(detections))
  }

  pub fn with_draw(mut self, draw: Draw) -> Self {
    self.draw = draw;
    self
  }
}

impl InferenceAdapter for ReplayDetector {
  type Error = ReplayDetectorError;

  fn detect(&self, image_path: &Path, params: &DetectParams) -> Result<DetectOutput, Self::Error> {
    let mut rendered = image::open(image_path)?.to_rgb8();

    let detections: Vec<Detection> = self
      .detections
      .iter()
      .filter(|det| det.confidence > params.confidence)
      .cloned()
      .collect();
    debug!(
      "置信度阈值 {:.2} 过滤后剩余 {}/{} 个检测",
      params.confidence,
      detections.len(),
      self.detections.len()
    );

    self.draw.draw_detections(&mut rendered, &detections);
    Ok(DetectOutput {
      detections,
      rendered,
    })
  }
}
