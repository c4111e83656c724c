// 该文件是 Kaluli （卡路里） 项目的一部分。
// src/merge.rs - 重复检测框合并
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

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{
  detection::Detection,
  geometry::{center, dimensions, euclidean_distance, intersection_over_union},
};

pub const DEFAULT_IOU_THRESHOLD: f32 = 0.5;
pub const DEFAULT_CENTER_THRESHOLD: f32 = 0.2;

/// 合并阈值
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MergeThresholds {
  /// IoU 超过该值即视为重复
  pub iou: f32,
  /// 中心距离小于 `center * 最大边长` 即视为重复
  pub center: f32,
}

impl Default for MergeThresholds {
  fn default() -> Self {
    Self {
      iou: DEFAULT_IOU_THRESHOLD,
      center: DEFAULT_CENTER_THRESHOLD,
    }
  }
}

impl MergeThresholds {
  pub fn resolve(&self, detections: &[Detection]) -> Vec<usize> {
    resolve(detections, self.iou, self.center)
  }
}

/// 合并重叠或中心接近的检测框，返回保留下来的下标（按置信度降序）
///
/// 抑制与类别无关：与已保留框重叠的低置信度框无论类别都会被丢弃，
/// 只留下置信度最高的标签。置信度相同时按原始下标先后排序。
pub fn resolve(detections: &[Detection], iou_threshold: f32, center_threshold: f32) -> Vec<usize> {
  let mut order: Vec<usize> = (0..detections.len()).collect();
  // sort_by 是稳定排序
  order.sort_by(|&a, &b| {
    detections[b]
      .confidence
      .total_cmp(&detections[a].confidence)
  });

  let mut used = vec![false; detections.len()];
  let mut keep = Vec::new();

  for i in order {
    if used[i] {
      continue;
    }
    keep.push(i);
    used[i] = true;

    let bbox_i = &detections[i].bbox;
    let center_i = center(bbox_i);
    let (w_i, h_i) = dimensions(bbox_i);

    for j in 0..detections.len() {
      if used[j] {
        continue;
      }
      let bbox_j = &detections[j].bbox;
      let (w_j, h_j) = dimensions(bbox_j);

      let iou = intersection_over_union(bbox_i, bbox_j);
      let dist = euclidean_distance(center_i, center(bbox_j));
      let max_dim = w_i.max(h_i).max(w_j.max(h_j));
      let center_close = dist < center_threshold * max_dim;

      if iou > iou_threshold || center_close {
        debug!(
          "抑制检测 {} ({} {:.2})，保留 {} ({} {:.2})，IoU={:.3}，中心距离={:.1}",
          j,
          detections[j].class_name,
          detections[j].confidence,
          i,
          detections[i].class_name,
          detections[i].confidence,
          iou,
          dist
        );
        used[j] = true;
      }
    }
  }

  keep
}
