// 该文件是 Kaluli （卡路里） 项目的一部分。
// src/cache/eviction.rs - 缓存淘汰策略
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

use chrono::{DateTime, TimeDelta, Utc};

use crate::fingerprint::Fingerprint;

/// 缓存中一个完整条目
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheEntry {
  pub fingerprint: Fingerprint,
  pub created: DateTime<Utc>,
}

/// 从现有条目中挑出需要删除的指纹
pub trait EvictionPolicy {
  fn select(&self, entries: &[CacheEntry], now: DateTime<Utc>) -> Vec<Fingerprint>;
}

/// 全部保留
#[derive(Debug, Default, Clone, Copy)]
pub struct KeepAll;

impl EvictionPolicy for KeepAll {
  fn select(&self, _entries: &[CacheEntry], _now: DateTime<Utc>) -> Vec<Fingerprint> {
    Vec::new()
  }
}

/// 只保留最新的 N 个条目
#[derive(Debug, Clone, Copy)]
pub struct MaxEntries(pub usize);

impl EvictionPolicy for MaxEntries {
  fn select(&self, entries: &[CacheEntry], _now: DateTime<Utc>) -> Vec<Fingerprint> {
    let mut sorted: Vec<&CacheEntry> = entries.iter().collect();
    sorted.sort_by(|a, b| {
      b.created
        .cmp(&a.created)
        .then_with(|| a.fingerprint.cmp(&b.fingerprint))
    });
    sorted
      .into_iter()
      .skip(self.0)
      .map(|entry| entry.fingerprint)
      .collect()
  }
}

/// 删除早于给定时长的条目
#[derive(Debug, Clone, Copy)]
pub struct MaxAge(pub TimeDelta);

impl EvictionPolicy for MaxAge {
  fn select(&self, entries: &[CacheEntry], now: DateTime<Utc>) -> Vec<Fingerprint> {
    entries
      .iter()
      .filter(|entry| now - entry.created > self.0)
      .map(|entry| entry.fingerprint)
      .collect()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn entry(hex: &str, age_hours: i64, now: DateTime<Utc>) -> CacheEntry {
    CacheEntry {
      fingerprint: hex.parse().unwrap(),
      created: now - TimeDelta::hours(age_hours),
    }
  }

  fn sample(now: DateTime<Utc>) -> Vec<CacheEntry> {
    vec![
      entry("0000000000000001", 30, now),
      entry("0000000000000002", 1, now),
      entry("0000000000000003", 50, now),
      entry("0000000000000004", 5, now),
    ]
  }

  #[test]
  fn keep_all_selects_nothing() {
    let now = Utc::now();
    assert!(KeepAll.select(&sample(now), now).is_empty());
  }

  #[test]
  fn max_entries_drops_oldest() {
    let now = Utc::now();
    let mut evicted = MaxEntries(2).select(&sample(now), now);
    evicted.sort();
    let expected: Vec<Fingerprint> = vec![
      "0000000000000001".parse().unwrap(),
      "0000000000000003".parse().unwrap(),
    ];
    assert_eq!(evicted, expected);
    assert!(MaxEntries(10).select(&sample(now), now).is_empty());
  }

  #[test]
  fn max_age_drops_stale_entries() {
    let now = Utc::now();
    let evicted = MaxAge(TimeDelta::hours(24)).select(&sample(now), now);
    assert_eq!(evicted.len(), 2);
    assert!(evicted.contains(&"0000000000000003".parse().unwrap()));
  }
}
