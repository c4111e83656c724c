// 该文件是 Kaluli （卡路里） 项目的一部分。
// src/pipeline.rs - 指纹、缓存、推理与去重的处理流水线
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

use std::{
  collections::HashMap,
  io::Write,
  sync::{Arc, Mutex, PoisonError},
  time::Instant,
};

use image::ImageFormat;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::{
  cache::{CacheError, ResultCache},
  config::Config,
  detection::{ResolvedDetection, ResultSet},
  detector::InferenceAdapter,
  fingerprint::Fingerprint,
};

#[derive(Error, Debug)]
pub enum ProcessingError {
  #[error("图像无效: {0}")]
  InvalidImage(#[source] image::ImageError),
  #[error("未检测到食物")]
  NoDetection,
  #[error("缓存错误: {0}")]
  CacheError(#[from] CacheError),
  #[error("推理错误: {0}")]
  InferenceError(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl ProcessingError {
  fn inference<E: std::error::Error + Send + Sync + 'static>(err: E) -> Self {
    ProcessingError::InferenceError(Box::new(err))
  }
}

/// 处理流水线：指纹 → 查缓存 → (未命中) 推理 → 去重 → 卡路里 → 写缓存
///
/// 同一进程内对同一指纹的未命中会串行执行，后到的请求在拿到锁后重新查缓存。
pub struct Pipeline<A> {
  config: Config,
  cache: ResultCache,
  adapter: A,
  writers: Mutex<HashMap<Fingerprint, Arc<Mutex<()>>>>,
}

impl<A: InferenceAdapter> Pipeline<A> {
  /// 使用配置中的缓存目录
  pub fn new(config: Config, adapter: A) -> Self {
    let cache = ResultCache::new(config.cache_dir.clone());
    Self::with_cache(config, cache, adapter)
  }

  pub fn with_cache(config: Config, cache: ResultCache, adapter: A) -> Self {
    Self {
      config,
      cache,
      adapter,
      writers: Mutex::new(HashMap::new()),
    }
  }

  pub fn config(&self) -> &Config {
    &self.config
  }

  pub fn cache(&self) -> &ResultCache {
    &self.cache
  }

  pub fn adapter(&self) -> &A {
    &self.adapter
  }

  pub fn process_image(&self, bytes: &[u8]) -> Result<(Fingerprint, ResultSet), ProcessingError> {
    let format = image::guess_format(bytes).map_err(ProcessingError::InvalidImage)?;
    let image =
      image::load_from_memory_with_format(bytes, format).map_err(ProcessingError::InvalidImage)?;
    debug!(
      "图像解码完成: {:?} {}x{}",
      format,
      image.width(),
      image.height()
    );

    let fp = Fingerprint::of_image(&image);
    info!("图像指纹: {}", fp);

    if let Some(cached) = self.cache.lookup(&fp)? {
      return Ok((fp, cached));
    }

    let writer = self.acquire_writer(&fp);
    let result = {
      let _guard = writer.lock().unwrap_or_else(PoisonError::into_inner);
      match self.cache.lookup(&fp) {
        Ok(Some(cached)) => {
          debug!("等待期间缓存已写入: {}", fp);
          Ok(cached)
        }
        Ok(None) => self.infer_and_store(&fp, bytes, format),
        Err(e) => Err(e.into()),
      }
    };
    self.release_writer(&fp, writer);

    result.map(|result| (fp, result))
  }

  fn infer_and_store(
    &self,
    fp: &Fingerprint,
    bytes: &[u8],
    format: ImageFormat,
  ) -> Result<ResultSet, ProcessingError> {
    // 推理适配器只接受文件路径
    let extension = format.extensions_str().first().copied().unwrap_or("img");
    let mut spill = tempfile::Builder::new()
      .prefix("kaluli-")
      .suffix(&format!(".{}", extension))
      .tempfile()
      .map_err(ProcessingError::inference)?;
    spill
      .write_all(bytes)
      .and_then(|_| spill.flush())
      .map_err(ProcessingError::inference)?;

    info!("缓存未命中，开始推理...");
    let now = Instant::now();
    let output = self
      .adapter
      .detect(spill.path(), &self.config.detect)
      .map_err(ProcessingError::inference)?;
    info!(
      "推理完成，耗时: {:.2?}，原始检测 {} 个",
      now.elapsed(),
      output.detections.len()
    );

    if output.detections.is_empty() {
      warn!("图像 {} 中未检测到食物", fp);
      return Err(ProcessingError::NoDetection);
    }

    let keep = self.config.merge.resolve(&output.detections);
    let items: Vec<ResolvedDetection> = keep
      .iter()
      .map(|&i| {
        let det = &output.detections[i];
        ResolvedDetection::from_detection(det, self.config.calories.lookup(&det.class_name))
      })
      .collect();
    info!(
      "去重后保留 {}/{} 个检测",
      items.len(),
      output.detections.len()
    );

    Ok(self.cache.store(fp, &items, &output.rendered)?)
  }

  fn acquire_writer(&self, fp: &Fingerprint) -> Arc<Mutex<()>> {
    let mut writers = self.writers.lock().unwrap_or_else(PoisonError::into_inner);
    writers.entry(*fp).or_default().clone()
  }

  fn release_writer(&self, fp: &Fingerprint, writer: Arc<Mutex<()>>) {
    drop(writer);
    let mut writers = self.writers.lock().unwrap_or_else(PoisonError::into_inner);
    // 只剩表中一份时没有其他等待者
    if writers
      .get(fp)
      .is_some_and(|entry| Arc::strong_count(entry) == 1)
    {
      writers.remove(fp);
    }
  }
}
