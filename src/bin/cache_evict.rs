// 该文件是 Kaluli （卡路里） 项目的一部分。
// src/bin/cache_evict.rs - 缓存淘汰工具
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

use anyhow::Result;
use chrono::TimeDelta;
use clap::Parser;
use url::Url;

use kaluli::{
  FromUrl, ResultCache,
  cache::{EvictionPolicy, KeepAll, MaxAge, MaxEntries},
};
use tracing::info;

/// 按条目数或存放时间清理结果缓存
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
  /// 缓存目录，例如 folder:///var/cache/kaluli
  #[arg(long, value_name = "CACHE")]
  pub cache: Url,
  /// 最多保留的条目数
  #[arg(long, value_name = "COUNT")]
  pub max_entries: Option<usize>,
  /// 最长保留天数
  #[arg(long, value_name = "DAYS")]
  pub max_age_days: Option<i64>,
}

fn main() -> Result<()> {
  tracing_subscriber::fmt::init();

  let args = Args::parse();
  let cache = ResultCache::from_url(&args.cache)?;
  info!("缓存目录: {}", cache.root().display());

  let mut policies: Vec<Box<dyn EvictionPolicy>> = Vec::new();
  if let Some(days) = args.max_age_days {
    let age = TimeDelta::try_days(days).ok_or_else(|| anyhow::anyhow!("天数超出范围: {}", days))?;
    policies.push(Box::new(MaxAge(age)));
  }
  if let Some(count) = args.max_entries {
    policies.push(Box::new(MaxEntries(count)));
  }
  if policies.is_empty() {
    policies.push(Box::new(KeepAll));
  }

  let mut removed = 0;
  for policy in &policies {
    removed += cache.evict(policy.as_ref())?;
  }

  println!("已删除 {} 个缓存条目", removed);
  println!("剩余 {} 个缓存条目", cache.entries()?.len());

  Ok(())
}
