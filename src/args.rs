// 该文件是 Kaluli （卡路里） 项目的一部分。
// src/args.rs - 命令行参数
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

use std::path::PathBuf;

use clap::Parser;
use url::Url;

/// 识别图片中的食物并估算卡路里，相同图片直接读取缓存
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
  /// 输入图片路径
  #[arg(long, value_name = "FILE")]
  pub input: PathBuf,

  /// 推理适配器
  /// 支持格式:
  /// - 回放检测文件: replay:///path/to/detections.json
  #[arg(long, value_name = "DETECTOR")]
  pub detector: Url,

  /// 缓存目录，例如 folder:///var/cache/kaluli（默认使用配置中的 cache_dir）
  #[arg(long, value_name = "CACHE")]
  pub cache: Option<Url>,

  /// JSON 配置文件
  #[arg(long, value_name = "FILE")]
  pub config: Option<PathBuf>,

  /// 置信度阈值 (0.0 - 1.0)
  #[arg(long, value_name = "THRESHOLD")]
  pub confidence: Option<f32>,

  /// 重复框 IoU 阈值 (0.0 - 1.0)
  #[arg(long, value_name = "THRESHOLD")]
  pub iou_threshold: Option<f32>,

  /// 重复框中心距离阈值，相对于最大边长
  #[arg(long, value_name = "THRESHOLD")]
  pub center_threshold: Option<f32>,

  /// 以 JSON 输出结果
  #[arg(long)]
  pub json: bool,
}
