// 该文件是 Kaluli （卡路里） 项目的一部分。
// src/render.rs - 检测结果可视化
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

#[cfg(feature = "draw_label")]
use ab_glyph::{FontArc, PxScale};
use image::{Rgb, RgbImage};
use imageproc::{drawing::draw_hollow_rect_mut, rect::Rect};
#[cfg(feature = "draw_label")]
use std::path::Path;
use thiserror::Error;

use crate::detection::Detection;

// 颜色轮上的颜色数量
const PALETTE_SIZE: u32 = 80;
const BOX_THICKNESS: i32 = 2;
#[cfg(feature = "draw_label")]
const LABEL_FONT_SIZE: f32 = 16.0;
#[cfg(feature = "draw_label")]
const LABEL_TEXT_COLOR: Rgb<u8> = Rgb([255, 255, 255]);

#[derive(Error, Debug)]
pub enum RenderError {
  #[error("字体文件读取错误: {0}")]
  IoError(#[from] std::io::Error),
  #[cfg(feature = "draw_label")]
  #[error("字体无效: {0}")]
  InvalidFont(#[from] ab_glyph::InvalidFont),
}

/// 在图像上绘制检测框，配置字体后同时绘制 "<类别> <置信度>" 标签
#[derive(Default)]
pub struct Draw {
  #[cfg(feature = "draw_label")]
  font: Option<FontArc>,
}

impl Draw {
  #[cfg(feature = "draw_label")]
  pub fn with_font_file(mut self, path: &Path) -> Result<Self, RenderError> {
    let data = std::fs::read(path)?;
    self.font = Some(FontArc::try_from_vec(data)?);
    Ok(self)
  }

  pub fn draw_detections(&self, image: &mut RgbImage, detections: &[Detection]) {
    for det in detections {
      let color = class_color(det.class_id);
      if let Some((x, y)) = self.draw_bbox(image, &det.bbox, color) {
        #[cfg(feature = "draw_label")]
        self.draw_label(image, det, x, y, color);
        #[cfg(not(feature = "draw_label"))]
        let _ = (x, y);
      }
    }
  }

  /// 绘制加粗边框，返回裁剪后的左上角
  fn draw_bbox(&self, image: &mut RgbImage, bbox: &[f32; 4], color: Rgb<u8>) -> Option<(i32, i32)> {
    let (w, h) = (image.width() as i32, image.height() as i32);
    if w == 0 || h == 0 {
      return None;
    }

    let x_min = (bbox[0].floor() as i32).clamp(0, w - 1);
    let y_min = (bbox[1].floor() as i32).clamp(0, h - 1);
    let x_max = (bbox[2].ceil() as i32).clamp(0, w - 1);
    let y_max = (bbox[3].ceil() as i32).clamp(0, h - 1);

    if x_min >= x_max || y_min >= y_max {
      return None;
    }

    for t in 0..BOX_THICKNESS {
      let width = x_max - x_min - 2 * t;
      let height = y_max - y_min - 2 * t;
      if width <= 0 || height <= 0 {
        break;
      }
      let rect = Rect::at(x_min + t, y_min + t).of_size(width as u32 + 1, height as u32 + 1);
      draw_hollow_rect_mut(image, rect, color);
    }

    Some((x_min, y_min))
  }

  #[cfg(feature = "draw_label")]
  fn draw_label(&self, image: &mut RgbImage, det: &Detection, x: i32, y: i32, color: Rgb<u8>) {
    use imageproc::drawing::{draw_filled_rect_mut, draw_text_mut, text_size};

    let Some(font) = &self.font else {
      return;
    };

    let label = format!("{} {:.2}", det.class_name, det.confidence);
    let scale = PxScale::from(LABEL_FONT_SIZE);
    let (text_w, text_h) = text_size(scale, font, &label);
    // 放在框上方，放不下时放在框内
    let text_y = if y >= text_h as i32 { y - text_h as i32 } else { y };

    if text_w > 0 && text_h > 0 {
      draw_filled_rect_mut(image, Rect::at(x, text_y).of_size(text_w, text_h), color);
    }
    draw_text_mut(image, LABEL_TEXT_COLOR, x, text_y, scale, font, &label);
  }
}

/// 按类别编号在色轮上取色
pub fn class_color(class_id: u32) -> Rgb<u8> {
  let hue = ((class_id % PALETTE_SIZE) as f32 / PALETTE_SIZE as f32) * 360.0;
  hsv_to_rgb(hue, 0.8, 0.9)
}

fn hsv_to_rgb(h: f32, s: f32, v: f32) -> Rgb<u8> {
  let c = v * s;
  let x = c * (1.0 - ((h / 60.0) % 2.0 - 1.0).abs());
  let m = v - c;

  let (r, g, b) = match h as u32 {
    0..60 => (c, x, 0.0),
    60..120 => (x, c, 0.0),
    120..180 => (0.0, c, x),
    180..240 => (0.0, x, c),
    240..300 => (x, 0.0, c),
    _ => (c, 0.0, x),
  };

  Rgb([
    ((r + m) * 255.0) as u8,
    ((g + m) * 255.0) as u8,
    ((b + m) * 255.0) as u8,
  ])
}
