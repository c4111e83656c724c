// 该文件是 Kaluli （卡路里） 项目的一部分。
// tests/common/mod.rs - 测试公共工具
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

#![allow(dead_code)]

use std::{
  convert::Infallible,
  path::Path,
  sync::{
    Arc,
    atomic::{AtomicUsize, Ordering},
  },
  time::Duration,
};

use image::{ImageFormat, Rgb, RgbImage};
use kaluli::{
  Detection,
  detector::{DetectOutput, DetectParams, InferenceAdapter},
};

/// 返回固定检测并记录调用次数的推理替身
#[derive(Clone)]
pub struct CountingAdapter {
  detections: Vec<Detection>,
  calls: Arc<AtomicUsize>,
  delay: Duration,
}

impl CountingAdapter {
  pub fn new(detections: Vec<Detection>) -> Self {
    Self {
      detections,
      calls: Arc::new(AtomicUsize::new(0)),
      delay: Duration::ZERO,
    }
  }

  pub fn with_delay(mut self, delay: Duration) -> Self {
    self.delay = delay;
    self
  }

  pub fn calls(&self) -> usize {
    self.calls.load(Ordering::SeqCst)
  }
}

impl InferenceAdapter for CountingAdapter {
  type Error = Infallible;

  fn detect(&self, image_path: &Path, _params: &DetectParams) -> Result<DetectOutput, Self::Error> {
    self.calls.fetch_add(1, Ordering::SeqCst);
    std::thread::sleep(self.delay);

    let (width, height) = image::image_dimensions(image_path).unwrap_or((64, 64));
    Ok(DetectOutput {
      detections: self.detections.clone(),
      rendered: RgbImage::from_pixel(width, height, Rgb([255, 0, 0])),
    })
  }
}

/// 生成一张带渐变的 PNG 图片，seed 不同则图片不同
pub fn plate_png(seed: u8) -> Vec<u8> {
  let image = RgbImage::from_fn(64, 48, |x, y| {
    let v = ((x * 4 + y * 2) as u8).wrapping_mul(seed | 1);
    Rgb([v, v.wrapping_add(seed), 128])
  });
  let mut bytes = Vec::new();
  image
    .write_to(&mut std::io::Cursor::new(&mut bytes), ImageFormat::Png)
    .expect("PNG 编码失败");
  bytes
}

pub fn pizza_and_cake() -> Vec<Detection> {
  vec![
    Detection::new([0.0, 0.0, 100.0, 100.0], 0.9, 9, "pizza"),
    Detection::new([0.0, 0.0, 100.0, 70.0], 0.6, 0, "cake"),
  ]
}
