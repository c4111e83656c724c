// 该文件是 Kaluli （卡路里） 项目的一部分。
// src/main.rs - 项目主程序
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

mod args;

use anyhow::Result;
use clap::Parser;
use tracing::info;

use kaluli::{
  Config, FromUrl, Pipeline, ProcessingError, ResultCache, ResultSet, detector::ReplayDetector,
  fingerprint::Fingerprint, render::Draw,
};

fn main() -> Result<()> {
  tracing_subscriber::fmt::init();

  let args = args::Args::parse();

  let mut config = match &args.config {
    Some(path) => Config::from_file(path)?,
    None => Config::default(),
  };
  if let Some(confidence) = args.confidence {
    config.detect.confidence = confidence;
  }
  if let Some(iou) = args.iou_threshold {
    config.merge.iou = iou;
  }
  if let Some(center) = args.center_threshold {
    config.merge.center = center;
  }

  info!("输入图片: {}", args.input.display());
  info!("推理适配器: {}", args.detector);
  info!("置信度阈值: {}", config.detect.confidence);
  info!(
    "合并阈值: IoU {} / 中心距离 {}",
    config.merge.iou, config.merge.center
  );

  let draw = match &config.label_font {
    Some(font) => Draw::default().with_font_file(font)?,
    None => Draw::default(),
  };
  let detector = ReplayDetector::from_url(&args.detector)?.with_draw(draw);

  let cache = match &args.cache {
    Some(url) => ResultCache::from_url(url)?,
    None => ResultCache::new(config.cache_dir.clone()),
  };
  info!("缓存目录: {}", cache.root().display());

  let pipeline = Pipeline::with_cache(config, cache, detector);
  let bytes = std::fs::read(&args.input)?;

  match pipeline.process_image(&bytes) {
    Ok((fp, result)) => {
      if args.json {
        print_json(&fp, &result)?;
      } else {
        print_table(&fp, &result);
      }
      Ok(())
    }
    Err(ProcessingError::NoDetection) => {
      println!("No food detected");
      Ok(())
    }
    Err(e) => Err(e.into()),
  }
}

fn print_table(fp: &Fingerprint, result: &ResultSet) {
  println!("指纹: {}", fp);
  println!("标注图像: {}", result.image().display());
  println!();
  println!("{:<20} {:>8} {:>10}", "Food", "Calories", "Confidence");
  for item in result.items() {
    println!(
      "{:<20} {:>8} {:>10.4}",
      item.class_name, item.calories, item.confidence
    );
  }
  println!();
  println!("Total Calories: {}", result.total_calories());
}

fn print_json(fp: &Fingerprint, result: &ResultSet) -> Result<()> {
  let document = serde_json::json!({
    "fingerprint": fp.to_string(),
    "image": result.image(),
    "items": result.items(),
    "total_calories": result.total_calories(),
  });
  println!("{}", serde_json::to_string_pretty(&document)?);
  Ok(())
}
