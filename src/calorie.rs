// 该文件是 Kaluli （卡路里） 项目的一部分。
// src/calorie.rs - 卡路里查找表
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

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

const DEFAULT_CALORIES: [(&str, u32); 12] = [
  ("cake", 350),
  ("chicken curry", 300),
  ("croissant", 250),
  ("french fries", 312),
  ("fried chicken", 400),
  ("fried rice", 220),
  ("hamburger", 600),
  ("noodles", 190),
  ("pasta", 200),
  ("pizza", 800),
  ("roast chicken", 250),
  ("waffle", 290),
];

/// 类别名称到卡路里的映射，未知类别为 0
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CalorieTable {
  table: HashMap<String, u32>,
}

impl Default for CalorieTable {
  fn default() -> Self {
    DEFAULT_CALORIES
      .iter()
      .map(|&(name, calories)| (name.to_string(), calories))
      .collect()
  }
}

impl FromIterator<(String, u32)> for CalorieTable {
  fn from_iter<I: IntoIterator<Item = (String, u32)>>(iter: I) -> Self {
    Self {
      table: iter.into_iter().collect(),
    }
  }
}

impl CalorieTable {
  pub fn lookup(&self, class_name: &str) -> u32 {
    self.table.get(class_name).copied().unwrap_or(0)
  }

  pub fn len(&self) -> usize {
    self.table.len()
  }

  pub fn is_empty(&self) -> bool {
    self.table.is_empty()
  }
}
