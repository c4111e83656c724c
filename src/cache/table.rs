// 该文件是 Kaluli （卡路里） 项目的一部分。
// src/cache/table.rs - 缓存检测表的 CSV 格式
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

use std::io::{Read, Write};

use serde::{Deserialize, Serialize};

use crate::detection::ResolvedDetection;

/// 表头，历史缓存数据依赖这一列顺序
pub const TABLE_HEADER: [&str; 7] = ["Food", "Calories", "Confidence", "x1", "y1", "x2", "y2"];

#[derive(Debug, Serialize, Deserialize)]
struct TableRow {
  #[serde(rename = "Food")]
  food: String,
  #[serde(rename = "Calories")]
  calories: u32,
  #[serde(rename = "Confidence")]
  confidence: f32,
  x1: f32,
  y1: f32,
  x2: f32,
  y2: f32,
}

impl From<&ResolvedDetection> for TableRow {
  fn from(item: &ResolvedDetection) -> Self {
    let [x1, y1, x2, y2] = item.bbox;
    Self {
      food: item.class_name.clone(),
      calories: item.calories,
      confidence: item.confidence,
      x1,
      y1,
      x2,
      y2,
    }
  }
}

impl From<TableRow> for ResolvedDetection {
  fn from(row: TableRow) -> Self {
    Self {
      class_name: row.food,
      class_id: None,
      calories: row.calories,
      confidence: row.confidence,
      bbox: [row.x1, row.y1, row.x2, row.y2],
    }
  }
}

pub fn write_rows<W: Write>(writer: W, items: &[ResolvedDetection]) -> Result<(), csv::Error> {
  let mut writer = csv::WriterBuilder::new()
    .has_headers(false)
    .from_writer(writer);

  // 空表也写表头
  writer.write_record(TABLE_HEADER)?;
  for item in items {
    writer.serialize(TableRow::from(item))?;
  }
  writer.flush()?;
  Ok(())
}

pub fn read_rows<R: Read>(reader: R) -> Result<Vec<ResolvedDetection>, csv::Error> {
  let mut reader = csv::Reader::from_reader(reader);
  reader
    .deserialize::<TableRow>()
    .map(|row| row.map(ResolvedDetection::from))
    .collect()
}
