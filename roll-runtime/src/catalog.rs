//! # Catalog 模块
//!
//! 英雄组合（Item）与目录（Catalog）的数据模型。
//!
//! ## 设计原则
//!
//! - Item 不可变，构建后只读
//! - 目录顺序即默认网格顺序和默认遍历顺序
//! - 禁用集合过滤掉所有条目时，回退到完整目录（永不报错）

use std::collections::BTreeSet;

use rand::Rng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

use crate::error::CatalogError;

/// 网格列数（展示层固定为 5 列）
pub const GRID_COLUMNS: usize = 5;

/// 内置目录的图片地址前缀
const HERO_IMAGE_BASE: &str = "https://cdn.cloudflare.steamstatic.com/apps/dota2/images/heroes";

/// 内置目录数据：(名称, 英雄标识)
const BUILTIN_SETS: &[(&str, [&str; 3])] = &[
    ("Ультра-мета", ["puck", "queenofpain", "nevermore"]),
    ("Грязюка", ["huskar", "sniper", "jakiro"]),
    ("Духи", ["storm_spirit", "ember_spirit", "void_spirit"]),
    ("Любимчики кекса", ["venomancer", "necrolyte", "skywrath_mage"]),
    ("Любимчики кекса 2", ["snapfire", "kez", "magnataur"]),
    (
        "Кэри в мид (похуй на игру)",
        ["antimage", "faceless_void", "phantom_assassin"],
    ),
    ("Рыготники", ["pudge", "techies", "undying"]),
    ("Выбор Настидвойнойурон", ["muerta", "enigma", "windrunner"]),
    ("Крысы", ["nyx_assassin", "bounty_hunter", "riki"]),
    ("Микроконтрольщик", ["brewmaster", "meepo", "arc_warden"]),
    ("Пивандетулы", ["ogre_magi", "spirit_breaker", "alchemist"]),
    ("Заработало", ["rattletrap", "shredder", "tinker"]),
    ("Забыл где варды покупать", ["oracle", "grimstroke", "pugna"]),
    ("Заклинатели", ["invoker", "rubick", "keeper_of_the_light"]),
    ("Выбор EvillyRU", ["tidehunter", "razor", "warlock"]),
];

/// 一个可被抽取的英雄组合
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    /// 名称（目录内唯一）
    pub name: String,
    /// 有序的图片引用
    #[serde(alias = "heroes", default)]
    pub assets: Vec<String>,
}

impl Item {
    /// 创建条目
    pub fn new(name: impl Into<String>, assets: Vec<String>) -> Self {
        Self {
            name: name.into(),
            assets,
        }
    }
}

/// 目录：固定顺序的条目列表
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Catalog {
    items: Vec<Item>,
}

impl Catalog {
    /// 创建目录并验证
    ///
    /// 要求：非空、名称非空、名称唯一。
    pub fn new(items: Vec<Item>) -> Result<Self, CatalogError> {
        if items.is_empty() {
            return Err(CatalogError::Empty);
        }

        let mut seen = BTreeSet::new();
        for (index, item) in items.iter().enumerate() {
            if item.name.trim().is_empty() {
                return Err(CatalogError::EmptyName { index });
            }
            if !seen.insert(item.name.as_str()) {
                return Err(CatalogError::DuplicateName {
                    name: item.name.clone(),
                });
            }
        }

        Ok(Self { items })
    }

    /// 内置目录
    pub fn builtin() -> Self {
        let items = BUILTIN_SETS
            .iter()
            .map(|(name, heroes)| {
                let assets = heroes
                    .iter()
                    .map(|hero| format!("{HERO_IMAGE_BASE}/{hero}_full.png"))
                    .collect();
                Item::new(*name, assets)
            })
            .collect();
        Self { items }
    }

    /// 从 JSON 数组解析目录
    ///
    /// 接受 `assets` 或 `heroes` 作为图片列表字段名。
    pub fn from_json(json: &str) -> Result<Self, CatalogError> {
        let items: Vec<Item> =
            serde_json::from_str(json).map_err(|e| CatalogError::InvalidJson {
                message: e.to_string(),
            })?;
        Self::new(items)
    }

    /// 所有条目（目录顺序）
    pub fn items(&self) -> &[Item] {
        &self.items
    }

    /// 条目数量
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// 是否为空（经过验证的目录永远非空）
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// 按名称查找
    pub fn get(&self, name: &str) -> Option<&Item> {
        self.items.iter().find(|item| item.name == name)
    }

    /// 是否包含指定名称
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// 全部名称
    pub fn names(&self) -> BTreeSet<String> {
        self.items.iter().map(|item| item.name.clone()).collect()
    }

    /// 可选条目（目录顺序，带全量回退）
    pub fn enabled(&self, disabled: &BTreeSet<String>) -> Vec<Item> {
        enabled_or_all(&self.items, disabled)
    }
}

/// 过滤掉禁用条目；若结果为空则返回全部条目
pub fn enabled_or_all(items: &[Item], disabled: &BTreeSet<String>) -> Vec<Item> {
    let enabled: Vec<Item> = items
        .iter()
        .filter(|item| !disabled.contains(&item.name))
        .cloned()
        .collect();

    if enabled.is_empty() {
        items.to_vec()
    } else {
        enabled
    }
}

/// 返回打乱后的副本（Fisher–Yates）
pub fn shuffled<R: Rng + ?Sized>(items: &[Item], rng: &mut R) -> Vec<Item> {
    let mut copy = items.to_vec();
    copy.shuffle(rng);
    copy
}

/// 行优先顺序（从左到右、逐行）
pub fn row_major_order(items: &[Item], columns: usize) -> Vec<Item> {
    let columns = columns.max(1);
    let rows = items.len().div_ceil(columns);

    let mut ordered = Vec::with_capacity(items.len());
    for row in 0..rows {
        for col in 0..columns {
            if let Some(item) = items.get(row * columns + col) {
                ordered.push(item.clone());
            }
        }
    }
    ordered
}

/// 列优先顺序（从上到下、逐列），跳过最后一行的空格
pub fn column_major_order(items: &[Item], columns: usize) -> Vec<Item> {
    let columns = columns.max(1);
    let rows = items.len().div_ceil(columns);

    let mut ordered = Vec::with_capacity(items.len());
    for col in 0..columns {
        for row in 0..rows {
            if let Some(item) = items.get(row * columns + col) {
                ordered.push(item.clone());
            }
        }
    }
    ordered
}
