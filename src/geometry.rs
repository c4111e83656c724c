// 该文件是 Kaluli （卡路里） 项目的一部分。
// src/geometry.rs - 边界框几何工具
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

/// 像素坐标下的边界框 [x_min, y_min, x_max, y_max]
pub type BBox = [f32; 4];

/// 计算两个边界框的 IoU，并集面积为 0 时返回 0
pub fn intersection_over_union(a: &BBox, b: &BBox) -> f32 {
  let x1 = a[0].max(b[0]);
  let y1 = a[1].max(b[1]);
  let x2 = a[2].min(b[2]);
  let y2 = a[3].min(b[3]);

  let intersection = (x2 - x1).max(0.0) * (y2 - y1).max(0.0);
  let (wa, ha) = dimensions(a);
  let (wb, hb) = dimensions(b);
  let union = wa * ha + wb * hb - intersection;

  if union > 0.0 {
    intersection / union
  } else {
    0.0
  }
}

/// 边界框中心点
pub fn center(bbox: &BBox) -> (f32, f32) {
  ((bbox[0] + bbox[2]) / 2.0, (bbox[1] + bbox[3]) / 2.0)
}

/// 边界框宽高
pub fn dimensions(bbox: &BBox) -> (f32, f32) {
  (bbox[2] - bbox[0], bbox[3] - bbox[1])
}

pub fn euclidean_distance(p: (f32, f32), q: (f32, f32)) -> f32 {
  let dx = p.0 - q.0;
  let dy = p.1 - q.1;
  (dx * dx + dy * dy).sqrt()
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn iou_is_symmetric() {
    let a = [0.0, 0.0, 10.0, 10.0];
    let b = [5.0, 5.0, 20.0, 15.0];
    assert_eq!(intersection_over_union(&a, &b), intersection_over_union(&b, &a));
  }

  #[test]
  fn iou_of_disjoint_boxes_is_zero() {
    let a = [0.0, 0.0, 10.0, 10.0];
    let b = [20.0, 20.0, 30.0, 30.0];
    assert_eq!(intersection_over_union(&a, &b), 0.0);
  }

  #[test]
  fn iou_of_touching_boxes_is_zero() {
    let a = [0.0, 0.0, 10.0, 10.0];
    let b = [10.0, 0.0, 20.0, 10.0];
    assert_eq!(intersection_over_union(&a, &b), 0.0);
  }

  #[test]
  fn iou_of_identical_boxes_is_one() {
    let a = [12.5, 3.0, 40.0, 90.0];
    assert_eq!(intersection_over_union(&a, &a), 1.0);
  }

  #[test]
  fn iou_of_half_overlap() {
    // 交集 50，并集 150
    let a = [0.0, 0.0, 10.0, 10.0];
    let b = [5.0, 0.0, 15.0, 10.0];
    let iou = intersection_over_union(&a, &b);
    assert!((iou - 1.0 / 3.0).abs() < 1e-6);
  }

  #[test]
  fn iou_of_degenerate_boxes_does_not_divide_by_zero() {
    let a = [5.0, 5.0, 5.0, 5.0];
    assert_eq!(intersection_over_union(&a, &a), 0.0);
  }

  #[test]
  fn center_dimensions_and_distance() {
    let bbox = [2.0, 4.0, 8.0, 12.0];
    assert_eq!(center(&bbox), (5.0, 8.0));
    assert_eq!(dimensions(&bbox), (6.0, 8.0));
    assert_eq!(euclidean_distance((0.0, 0.0), (3.0, 4.0)), 5.0);
  }
}
