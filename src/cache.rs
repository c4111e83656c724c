// 该文件是 Kaluli （卡路里） 项目的一部分。
// src/cache.rs - 以图像指纹为键的结果缓存
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
  fs::File,
  io::{BufReader, BufWriter, ErrorKind, Write},
  path::{Path, PathBuf},
};

use chrono::{DateTime, TimeDelta, Utc};
use image::{RgbImage, codecs::jpeg::JpegEncoder};
use tempfile::NamedTempFile;
use thiserror::Error;
use tracing::{debug, info, warn};
use url::Url;

use crate::{
  FromUrl, FromUrlWithScheme,
  detection::{ResolvedDetection, ResultSet},
  fingerprint::Fingerprint,
};

mod eviction;
pub mod table;

pub use self::eviction::{CacheEntry, EvictionPolicy, KeepAll, MaxAge, MaxEntries};

const TABLE_DIR: &str = "cache";
const IMAGE_DIR: &str = "results";
const TABLE_EXT: &str = "csv";
const IMAGE_EXT: &str = "jpg";
const JPEG_QUALITY: u8 = 90;
const ORPHAN_GRACE: TimeDelta = TimeDelta::minutes(10);

#[derive(Error, Debug)]
pub enum CacheError {
  #[error("I/O 错误: {0}")]
  IoError(#[from] std::io::Error),
  #[error("图像编码错误: {0}")]
  ImageError(#[from] image::ImageError),
  #[error("检测表错误: {0}")]
  TableError(#[from] csv::Error),
  #[error("缓存文件落盘失败: {0}")]
  PersistError(#[from] tempfile::PersistError),
  #[error("URI 方案不匹配: {0}")]
  SchemeMismatch(String),
  #[error("缓存路径无效: {0}")]
  InvalidPath(String),
}

/// 目录缓存
///
/// 每个指纹对应 `<root>/cache/<fp>.csv` 检测表和 `<root>/results/<fp>.jpg` 标注图像。
/// 两者都存在时才算命中。
#[derive(Debug, Clone)]
pub struct ResultCache {
  root: PathBuf,
}

impl FromUrlWithScheme for ResultCache {
  const SCHEME: &'static str = "folder";
}

impl FromUrl for ResultCache {
  type Error = CacheError;

  fn from_url(url: &Url) -> Result<Self, Self::Error> {
    if url.scheme() != Self::SCHEME {
      return Err(CacheError::SchemeMismatch(format!(
        "期望缓存方案 '{}', 实际为 '{}'",
        Self::SCHEME,
        url.scheme()
      )));
    }

    let path = urlencoding::decode(url.path())
      .map_err(|e| CacheError::InvalidPath(format!("{}: {}", url.path(), e)))?;
    if path.is_empty() {
      return Err(CacheError::InvalidPath(url.to_string()));
    }

    Ok(ResultCache::new(path.into_owned()))
  }
}

impl ResultCache {
  pub fn new(root: impl Into<PathBuf>) -> Self {
    Self { root: root.into() }
  }

  pub fn root(&self) -> &Path {
    &self.root
  }

  pub fn table_path(&self, fp: &Fingerprint) -> PathBuf {
    self
      .root
      .join(TABLE_DIR)
      .join(format!("{}.{}", fp, TABLE_EXT))
  }

  pub fn image_path(&self, fp: &Fingerprint) -> PathBuf {
    self
      .root
      .join(IMAGE_DIR)
      .join(format!("{}.{}", fp, IMAGE_EXT))
  }

  /// 查找缓存；只有一个文件存在或检测表无法读取时视为未命中
  pub fn lookup(&self, fp: &Fingerprint) -> Result<Option<ResultSet>, CacheError> {
    let table_path = self.table_path(fp);
    let image_path = self.image_path(fp);

    let has_table = table_path.try_exists()?;
    let has_image = image_path.try_exists()?;
    if !(has_table && has_image) {
      if has_table || has_image {
        warn!(
          "缓存条目 {} 不完整 (检测表: {}, 图像: {})，按未命中处理",
          fp, has_table, has_image
        );
      } else {
        debug!("缓存未命中: {}", fp);
      }
      return Ok(None);
    }

    let rows = File::open(&table_path)
      .map_err(csv::Error::from)
      .and_then(|file| table::read_rows(BufReader::new(file)));
    match rows {
      Ok(rows) => {
        info!("缓存命中: {} ({} 条检测)", fp, rows.len());
        Ok(Some(ResultSet::new(rows, image_path)))
      }
      Err(e) => {
        warn!("读取缓存检测表 {} 失败: {}，按未命中处理", table_path.display(), e);
        Ok(None)
      }
    }
  }

  /// 写入缓存条目
  ///
  /// 两个文件都先写入同目录下的临时文件再重命名。图像先落盘，检测表最后落盘，
  /// 因此查找时看到检测表就一定能看到图像。
  pub fn store(
    &self,
    fp: &Fingerprint,
    items: &[ResolvedDetection],
    image: &RgbImage,
  ) -> Result<ResultSet, CacheError> {
    let table_path = self.table_path(fp);
    let image_path = self.image_path(fp);

    let image_tmp = temp_file_beside(&image_path)?;
    {
      let mut writer = BufWriter::new(image_tmp.as_file());
      image.write_with_encoder(JpegEncoder::new_with_quality(&mut writer, JPEG_QUALITY))?;
      writer.flush()?;
    }
    image_tmp.persist(&image_path)?;
    debug!("标注图像已写入: {}", image_path.display());

    let table_tmp = temp_file_beside(&table_path)?;
    table::write_rows(BufWriter::new(table_tmp.as_file()), items)?;
    table_tmp.persist(&table_path)?;

    info!("缓存已写入: {} ({} 条检测)", fp, items.len());
    Ok(ResultSet::new(items.to_vec(), image_path))
  }

  /// 列出所有完整的缓存条目，创建时间取检测表的修改时间
  pub fn entries(&self) -> Result<Vec<CacheEntry>, CacheError> {
    let table_dir = self.root.join(TABLE_DIR);
    let dir = match std::fs::read_dir(&table_dir) {
      Ok(dir) => dir,
      Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
      Err(e) => return Err(e.into()),
    };

    let mut entries = Vec::new();
    for dir_entry in dir {
      let path = dir_entry?.path();
      if path.extension().and_then(|ext| ext.to_str()) != Some(TABLE_EXT) {
        continue;
      }
      let Some(fingerprint) = path
        .file_stem()
        .and_then(|stem| stem.to_str())
        .and_then(|stem| stem.parse::<Fingerprint>().ok())
      else {
        debug!("跳过非缓存文件: {}", path.display());
        continue;
      };
      if !self.image_path(&fingerprint).try_exists()? {
        continue;
      }

      let created: DateTime<Utc> = std::fs::metadata(&path)?.modified()?.into();
      entries.push(CacheEntry {
        fingerprint,
        created,
      });
    }

    Ok(entries)
  }

  /// 列出没有检测表的标注图像（写入中途崩溃留下），只返回早于 `before` 的
  pub fn orphan_images(&self, before: DateTime<Utc>) -> Result<Vec<Fingerprint>, CacheError> {
    let image_dir = self.root.join(IMAGE_DIR);
    let dir = match std::fs::read_dir(&image_dir) {
      Ok(dir) => dir,
      Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
      Err(e) => return Err(e.into()),
    };

    let mut orphans = Vec::new();
    for dir_entry in dir {
      let path = dir_entry?.path();
      if path.extension().and_then(|ext| ext.to_str()) != Some(IMAGE_EXT) {
        continue;
      }
      let Some(fingerprint) = path
        .file_stem()
        .and_then(|stem| stem.to_str())
        .and_then(|stem| stem.parse::<Fingerprint>().ok())
      else {
        continue;
      };
      if self.table_path(&fingerprint).try_exists()? {
        continue;
      }

      let modified: DateTime<Utc> = std::fs::metadata(&path)?.modified()?.into();
      if modified < before {
        orphans.push(fingerprint);
      }
    }

    Ok(orphans)
  }

  /// 按策略淘汰条目，返回删除的条目数
  ///
  /// 先删检测表再删图像，并发的查找只会看到未命中。
  /// 同时清理超过宽限期的孤立图像，不计入返回值。
  pub fn evict<P: EvictionPolicy + ?Sized>(&self, policy: &P) -> Result<usize, CacheError> {
    let now = Utc::now();
    let entries = self.entries()?;
    let victims = policy.select(&entries, now);

    let mut removed = 0;
    for fp in &victims {
      remove_if_exists(&self.table_path(fp))?;
      remove_if_exists(&self.image_path(fp))?;
      debug!("已淘汰缓存条目: {}", fp);
      removed += 1;
    }

    // 宽限期内的孤立图像可能属于正在写入的条目
    let orphans = self.orphan_images(now - ORPHAN_GRACE)?;
    for fp in &orphans {
      remove_if_exists(&self.image_path(fp))?;
      debug!("已清理孤立图像: {}", fp);
    }

    info!(
      "缓存淘汰完成: 共 {} 条，删除 {} 条，清理孤立图像 {} 张",
      entries.len(),
      removed,
      orphans.len()
    );
    Ok(removed)
  }
}

fn temp_file_beside(path: &Path) -> Result<NamedTempFile, CacheError> {
  let dir = path
    .parent()
    .ok_or_else(|| CacheError::InvalidPath(path.display().to_string()))?;
  std::fs::create_dir_all(dir)?;
  Ok(NamedTempFile::new_in(dir)?)
}

fn remove_if_exists(path: &Path) -> Result<(), CacheError> {
  match std::fs::remove_file(path) {
    Ok(()) => Ok(()),
    Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
    Err(e) => Err(e.into()),
  }
}
