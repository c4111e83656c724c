// 该文件是 Kaluli （卡路里） 项目的一部分。
// tests/pipeline.rs - 处理流水线集成测试
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

mod common;

use std::time::Duration;

use common::{CountingAdapter, pizza_and_cake, plate_png};
use kaluli::{
  Config, Detection, Fingerprint, Pipeline, ProcessingError, geometry::intersection_over_union,
};

fn config(dir: &tempfile::TempDir) -> Config {
  Config::default().with_cache_dir(dir.path())
}

#[test]
fn overlapping_pizza_and_cake_keep_only_pizza() {
  let dir = tempfile::tempdir().unwrap();
  let detections = pizza_and_cake();
  let iou = intersection_over_union(&detections[0].bbox, &detections[1].bbox);
  assert!((iou - 0.7).abs() < 1e-6);

  let pipeline = Pipeline::new(config(&dir), CountingAdapter::new(detections));
  let (_, result) = pipeline.process_image(&plate_png(1)).unwrap();

  assert_eq!(result.len(), 1);
  assert_eq!(result.items()[0].class_name, "pizza");
  assert_eq!(result.items()[0].calories, 800);
  assert_eq!(result.total_calories(), 800);
  assert!(result.image().exists());
}

#[test]
fn zero_detections_is_no_detection_and_not_cached() {
  let dir = tempfile::tempdir().unwrap();
  let adapter = CountingAdapter::new(Vec::new());
  let pipeline = Pipeline::new(config(&dir), adapter.clone());

  let bytes = plate_png(2);
  assert!(matches!(
    pipeline.process_image(&bytes),
    Err(ProcessingError::NoDetection)
  ));
  assert!(pipeline.cache().entries().unwrap().is_empty());

  let fp = Fingerprint::of_bytes(&bytes).unwrap();
  assert!(!pipeline.cache().table_path(&fp).exists());
  assert!(!pipeline.cache().image_path(&fp).exists());

  // 未缓存，再次提交仍会推理
  assert!(pipeline.process_image(&bytes).is_err());
  assert_eq!(adapter.calls(), 2);
}

#[test]
fn same_image_twice_is_served_from_cache() {
  let dir = tempfile::tempdir().unwrap();
  let adapter = CountingAdapter::new(pizza_and_cake());
  let pipeline = Pipeline::new(config(&dir), adapter.clone());

  let bytes = plate_png(3);
  let (fp_first, first) = pipeline.process_image(&bytes).unwrap();
  let (fp_second, second) = pipeline.process_image(&bytes).unwrap();

  assert_eq!(adapter.calls(), 1);
  assert_eq!(fp_first, fp_second);
  assert_eq!(first.image(), second.image());
  assert_eq!(first.total_calories(), second.total_calories());
  for (a, b) in first.items().iter().zip(second.items()) {
    assert_eq!(a.class_name, b.class_name);
    assert_eq!(a.calories, b.calories);
    assert_eq!(a.confidence, b.confidence);
  }
}

#[test]
fn cache_survives_a_new_pipeline() {
  let dir = tempfile::tempdir().unwrap();
  let bytes = plate_png(4);

  let first = CountingAdapter::new(pizza_and_cake());
  Pipeline::new(config(&dir), first.clone())
    .process_image(&bytes)
    .unwrap();

  let second = CountingAdapter::new(Vec::new());
  let (_, result) = Pipeline::new(config(&dir), second.clone())
    .process_image(&bytes)
    .unwrap();

  assert_eq!(first.calls(), 1);
  assert_eq!(second.calls(), 0);
  assert_eq!(result.total_calories(), 800);
}

#[test]
fn concurrent_requests_for_one_image_infer_once() {
  let dir = tempfile::tempdir().unwrap();
  let adapter = CountingAdapter::new(pizza_and_cake()).with_delay(Duration::from_millis(50));
  let pipeline = Pipeline::new(config(&dir), adapter.clone());
  let bytes = plate_png(5);

  std::thread::scope(|scope| {
    let handles: Vec<_> = (0..4)
      .map(|_| scope.spawn(|| pipeline.process_image(&bytes)))
      .collect();
    for handle in handles {
      let (_, result) = handle.join().unwrap().unwrap();
      assert_eq!(result.total_calories(), 800);
    }
  });

  assert_eq!(adapter.calls(), 1);
}

#[test]
fn different_images_get_separate_entries() {
  let dir = tempfile::tempdir().unwrap();
  let adapter = CountingAdapter::new(vec![
    Detection::new([0.0, 0.0, 10.0, 10.0], 0.8, 11, "waffle"),
    Detection::new([30.0, 30.0, 40.0, 40.0], 0.7, 6, "hamburger"),
  ]);
  let pipeline = Pipeline::new(config(&dir), adapter.clone());

  let (fp_a, result) = pipeline.process_image(&plate_png(7)).unwrap();
  assert_eq!(result.total_calories(), 890);

  let checker = image::RgbImage::from_fn(64, 48, |x, y| {
    if (x / 8 + y / 8) % 2 == 0 {
      image::Rgb([0, 0, 0])
    } else {
      image::Rgb([255, 255, 255])
    }
  });
  let mut bytes = Vec::new();
  checker
    .write_to(&mut std::io::Cursor::new(&mut bytes), image::ImageFormat::Png)
    .unwrap();
  let (fp_b, _) = pipeline.process_image(&bytes).unwrap();

  assert_ne!(fp_a, fp_b);
  assert_eq!(adapter.calls(), 2);
  assert_eq!(pipeline.cache().entries().unwrap().len(), 2);
}

#[test]
fn invalid_upload_never_reaches_inference() {
  let dir = tempfile::tempdir().unwrap();
  let adapter = CountingAdapter::new(pizza_and_cake());
  let pipeline = Pipeline::new(config(&dir), adapter.clone());

  let mut truncated = plate_png(6);
  truncated.truncate(40);
  assert!(matches!(
    pipeline.process_image(&truncated),
    Err(ProcessingError::InvalidImage(_))
  ));
  assert_eq!(adapter.calls(), 0);
}

#[test]
fn store_failure_is_a_cache_error() {
  let dir = tempfile::tempdir().unwrap();
  let adapter = CountingAdapter::new(pizza_and_cake());
  let pipeline = Pipeline::new(config(&dir), adapter.clone());
  let bytes = plate_png(8);
  let fp = Fingerprint::of_bytes(&bytes).unwrap();

  // 图像路径被目录占用，重命名无法覆盖
  std::fs::create_dir_all(pipeline.cache().image_path(&fp)).unwrap();

  assert!(matches!(
    pipeline.process_image(&bytes),
    Err(ProcessingError::CacheError(_))
  ));
  assert_eq!(adapter.calls(), 1);
  assert!(!pipeline.cache().table_path(&fp).exists());
}

#[test]
fn unreadable_cache_root_is_a_cache_error() {
  let dir = tempfile::tempdir().unwrap();
  let root = dir.path().join("instance");
  std::fs::write(&root, "not a directory").unwrap();

  let adapter = CountingAdapter::new(pizza_and_cake());
  let pipeline = Pipeline::new(Config::default().with_cache_dir(&root), adapter.clone());

  assert!(matches!(
    pipeline.process_image(&plate_png(9)),
    Err(ProcessingError::CacheError(_))
  ));
  assert_eq!(adapter.calls(), 0);
}
