// 该文件是 Kaluli （卡路里） 项目的一部分。
// src/detection.rs - 检测结果数据定义
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

use crate::geometry::BBox;

/// 推理适配器输出的单个检测
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Detection {
  pub bbox: BBox, // [x_min, y_min, x_max, y_max]
  pub confidence: f32,
  pub class_id: u32,
  pub class_name: String,
}

impl Detection {
  pub fn new(bbox: BBox, confidence: f32, class_id: u32, class_name: impl Into<String>) -> Self {
    Self {
      bbox,
      confidence,
      class_id,
      class_name: class_name.into(),
    }
  }
}

/// 去重后附带卡路里的检测
///
/// 从缓存读回的行不携带类别编号，此时 `class_id` 为 `None`。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedDetection {
  pub class_name: String,
  pub class_id: Option<u32>,
  pub calories: u32,
  pub confidence: f32,
  pub bbox: BBox,
}

impl ResolvedDetection {
  pub fn from_detection(detection: &Detection, calories: u32) -> Self {
    Self {
      class_name: detection.class_name.clone(),
      class_id: Some(detection.class_id),
      calories,
      confidence: detection.confidence,
      bbox: detection.bbox,
    }
  }
}

/// 一张图像的最终结果：按置信度降序的检测，以及标注图像的路径
#[derive(Debug, Clone, PartialEq)]
pub struct ResultSet {
  items: Box<[ResolvedDetection]>,
  image: PathBuf,
}

impl ResultSet {
  pub fn new(items: Vec<ResolvedDetection>, image: PathBuf) -> Self {
    Self {
      items: items.into_boxed_slice(),
      image,
    }
  }

  pub fn items(&self) -> &[ResolvedDetection] {
    &self.items
  }

  pub fn image(&self) -> &Path {
    &self.image
  }

  /// 总卡路里，每次由成员重新求和
  pub fn total_calories(&self) -> u64 {
    self.items.iter().map(|item| item.calories as u64).sum()
  }

  pub fn len(&self) -> usize {
    self.items.len()
  }

  pub fn is_empty(&self) -> bool {
    self.items.is_empty()
  }
}
