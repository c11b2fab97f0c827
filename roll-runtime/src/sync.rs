//! # Sync 模块
//!
//! 跨视图同步：把当前选中的条目推送给其他显示端（例如直播叠加层）。
//!
//! ## 执行模型
//!
//! ```text
//! publish(update) ─┬─► 订阅者（进程内，按订阅顺序同步调用）
//!                  └─► LastValueStore（可选，持久化最后一个值）
//! ```
//!
//! 只有推送，没有轮询。持久化失败只记录警告，不影响动画。

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::catalog::Item;
use crate::error::SyncError;

/// 一次选中状态的更新
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectionUpdate {
    /// 条目名称
    pub name: String,
    /// 资源列表（顺序与条目一致）
    #[serde(alias = "heroes", default)]
    pub assets: Vec<String>,
    /// 是否为最终结果
    #[serde(default)]
    pub final_pick: bool,
}

impl SelectionUpdate {
    /// 从条目创建
    pub fn from_item(item: &Item, final_pick: bool) -> Self {
        Self {
            name: item.name.clone(),
            assets: item.assets.clone(),
            final_pick,
        }
    }
}

/// 持久化的"最后一个值"
pub trait LastValueStore {
    /// 写入
    fn store(&mut self, update: &SelectionUpdate) -> Result<(), SyncError>;

    /// 读取最后写入的值（没有或无法读取时为 None）
    fn load(&self) -> Option<SelectionUpdate>;
}

/// 内存中的最后一个值
#[derive(Debug, Clone, Default)]
pub struct MemoryLastValue {
    value: Option<SelectionUpdate>,
}

impl MemoryLastValue {
    pub fn new() -> Self {
        Self::default()
    }
}

impl LastValueStore for MemoryLastValue {
    fn store(&mut self, update: &SelectionUpdate) -> Result<(), SyncError> {
        self.value = Some(update.clone());
        Ok(())
    }

    fn load(&self) -> Option<SelectionUpdate> {
        self.value.clone()
    }
}

/// 订阅标识符
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Subscriber = Box<dyn FnMut(&SelectionUpdate)>;

/// 同步通道
#[derive(Default)]
pub struct SyncChannel {
    subscribers: Vec<(SubscriptionId, Subscriber)>,
    store: Option<Box<dyn LastValueStore>>,
    last: Option<SelectionUpdate>,
    next_id: u64,
}

impl fmt::Debug for SyncChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SyncChannel")
            .field("subscribers", &self.subscribers.len())
            .field("has_store", &self.store.is_some())
            .field("last", &self.last)
            .finish()
    }
}

impl SyncChannel {
    /// 创建空通道
    pub fn new() -> Self {
        Self::default()
    }

    /// 设置持久化存储
    pub fn with_store(mut self, store: impl LastValueStore + 'static) -> Self {
        self.set_store(store);
        self
    }

    /// 设置持久化存储（替换已有的）
    pub fn set_store(&mut self, store: impl LastValueStore + 'static) {
        self.last = store.load();
        self.store = Some(Box::new(store));
    }

    /// 订阅更新
    pub fn subscribe(&mut self, subscriber: impl FnMut(&SelectionUpdate) + 'static) -> SubscriptionId {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        self.subscribers.push((id, Box::new(subscriber)));
        id
    }

    /// 取消订阅，返回是否存在
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.subscribers.len();
        self.subscribers.retain(|(sid, _)| *sid != id);
        self.subscribers.len() != before
    }

    /// 订阅者数量
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }

    /// 发布更新
    pub fn publish(&mut self, update: SelectionUpdate) {
        for (_, subscriber) in &mut self.subscribers {
            subscriber(&update);
        }
        if let Some(store) = &mut self.store
            && let Err(e) = store.store(&update)
        {
            tracing::warn!(error = %e, name = %update.name, "选中状态持久化失败");
        }
        self.last = Some(update);
    }

    /// 最近一次发布的更新（或持久化存储中的值）
    pub fn last(&self) -> Option<&SelectionUpdate> {
        self.last.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn update(name: &str, final_pick: bool) -> SelectionUpdate {
        SelectionUpdate {
            name: name.to_string(),
            assets: vec![format!("{name}.png")],
            final_pick,
        }
    }

    #[derive(Debug)]
    struct FailingStore;

    impl LastValueStore for FailingStore {
        fn store(&mut self, _update: &SelectionUpdate) -> Result<(), SyncError> {
            Err(SyncError::Io("disk full".to_string()))
        }

        fn load(&self) -> Option<SelectionUpdate> {
            None
        }
    }

    #[test]
    fn test_publish_reaches_subscribers_in_order() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let mut channel = SyncChannel::new();

        let log = Rc::clone(&seen);
        channel.subscribe(move |u| log.borrow_mut().push(format!("a:{}", u.name)));
        let log = Rc::clone(&seen);
        channel.subscribe(move |u| log.borrow_mut().push(format!("b:{}", u.name)));

        channel.publish(update("x", false));
        assert_eq!(*seen.borrow(), vec!["a:x", "b:x"]);
        assert_eq!(channel.last(), Some(&update("x", false)));
    }

    #[test]
    fn test_unsubscribe() {
        let count = Rc::new(RefCell::new(0));
        let mut channel = SyncChannel::new();
        let c = Rc::clone(&count);
        let id = channel.subscribe(move |_| *c.borrow_mut() += 1);

        channel.publish(update("x", false));
        assert!(channel.unsubscribe(id));
        assert!(!channel.unsubscribe(id));
        channel.publish(update("y", true));

        assert_eq!(*count.borrow(), 1);
        assert_eq!(channel.subscriber_count(), 0);
    }

    #[test]
    fn test_store_failure_is_swallowed() {
        let mut channel = SyncChannel::new().with_store(FailingStore);
        channel.publish(update("x", true));
        assert_eq!(channel.last().map(|u| u.name.as_str()), Some("x"));
    }

    #[test]
    fn test_store_seeds_last_value() {
        let mut store = MemoryLastValue::new();
        store.store(&update("old", true)).unwrap();

        let channel = SyncChannel::new().with_store(store);
        assert_eq!(channel.last(), Some(&update("old", true)));
    }

    #[test]
    fn test_update_accepts_heroes_alias() {
        let json = r#"{ "name": "Духи", "heroes": ["a", "b"] }"#;
        let update: SelectionUpdate = serde_json::from_str(json).unwrap();
        assert_eq!(update.assets, vec!["a", "b"]);
        assert!(!update.final_pick);
    }
}
