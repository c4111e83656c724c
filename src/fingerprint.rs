// 该文件是 Kaluli （卡路里） 项目的一部分。
// src/fingerprint.rs - 图像感知哈希
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

use std::{fmt, str::FromStr};

use image::{DynamicImage, imageops::FilterType};
use thiserror::Error;

const HASH_SIZE: u32 = 8;
const HASH_HEX_LEN: usize = (HASH_SIZE * HASH_SIZE / 4) as usize;

/// 图像指纹（8x8 平均哈希），以 16 位十六进制字符串作为缓存键
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Fingerprint(u64);

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ParseFingerprintError {
  #[error("指纹长度应为 {expected}，实际为 {0}", expected = HASH_HEX_LEN)]
  InvalidLength(usize),
  #[error("指纹包含非十六进制字符: {0}")]
  InvalidDigit(String),
}

impl Fingerprint {
  /// 计算图像的平均哈希：灰度化、缩放到 8x8，每个像素是否高于均值即为一位，
  /// 按行优先排列，首个像素为最高位
  pub fn of_image(image: &DynamicImage) -> Self {
    let small = image::imageops::resize(
      &image.to_luma8(),
      HASH_SIZE,
      HASH_SIZE,
      FilterType::Lanczos3,
    );

    let pixels = small.as_raw();
    let mean = pixels.iter().map(|&p| p as f64).sum::<f64>() / pixels.len() as f64;

    let bits = pixels
      .iter()
      .fold(0u64, |acc, &p| (acc << 1) | ((p as f64) > mean) as u64);
    Fingerprint(bits)
  }

  /// 解码图像字节后计算指纹
  pub fn of_bytes(bytes: &[u8]) -> Result<Self, image::ImageError> {
    let image = image::load_from_memory(bytes)?;
    Ok(Self::of_image(&image))
  }

  pub fn bits(&self) -> u64 {
    self.0
  }

  /// 感知哈希距离：不同位的个数
  pub fn hamming_distance(&self, other: &Fingerprint) -> u32 {
    (self.0 ^ other.0).count_ones()
  }
}

impl fmt::Display for Fingerprint {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{:016x}", self.0)
  }
}

impl FromStr for Fingerprint {
  type Err = ParseFingerprintError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    if s.len() != HASH_HEX_LEN {
      return Err(ParseFingerprintError::InvalidLength(s.len()));
    }
    if !s.bytes().all(|b| b.is_ascii_hexdigit()) {
      return Err(ParseFingerprintError::InvalidDigit(s.to_string()));
    }
    u64::from_str_radix(s, 16)
      .map(Fingerprint)
      .map_err(|_| ParseFingerprintError::InvalidDigit(s.to_string()))
  }
}
