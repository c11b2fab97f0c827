//! # Scheduler 模块
//!
//! 可取消的延时任务队列，替代宿主的定时器原语。
//!
//! ## 执行模型
//!
//! ```text
//! schedule(at, task) ──► [最小堆 (deadline, seq)] ──► pop_due(now)
//! ```
//!
//! - 队列本身不感知真实时间，`now` 由调用方传入
//! - 同一 deadline 的任务按调度顺序（FIFO）出队
//! - 取消采用惰性删除：被取消的任务在出队时被跳过

use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashSet};
use std::time::Duration;

/// 任务标识符
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TaskId(u64);

/// 队列中的条目
#[derive(Debug)]
struct Entry<T> {
    deadline: Duration,
    seq: u64,
    task: T,
}

impl<T> PartialEq for Entry<T> {
    fn eq(&self, other: &Self) -> bool {
        self.deadline == other.deadline && self.seq == other.seq
    }
}

impl<T> Eq for Entry<T> {}

impl<T> PartialOrd for Entry<T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<T> Ord for Entry<T> {
    // BinaryHeap 是最大堆，反转比较得到最早 deadline 优先
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .deadline
            .cmp(&self.deadline)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

/// 延时任务队列
#[derive(Debug)]
pub struct Scheduler<T> {
    heap: BinaryHeap<Entry<T>>,
    cancelled: HashSet<u64>,
    next_seq: u64,
}

impl<T> Default for Scheduler<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Scheduler<T> {
    /// 创建空队列
    pub fn new() -> Self {
        Self {
            heap: BinaryHeap::new(),
            cancelled: HashSet::new(),
            next_seq: 0,
        }
    }

    /// 在 `at` 时刻调度任务
    pub fn schedule(&mut self, at: Duration, task: T) -> TaskId {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.heap.push(Entry {
            deadline: at,
            seq,
            task,
        });
        TaskId(seq)
    }

    /// 取消任务，返回任务是否仍在队列中
    pub fn cancel(&mut self, id: TaskId) -> bool {
        let pending = self
            .heap
            .iter()
            .any(|entry| entry.seq == id.0 && !self.cancelled.contains(&entry.seq));
        if pending {
            self.cancelled.insert(id.0);
        }
        pending
    }

    /// 取消所有满足条件的任务，返回取消数量
    pub fn cancel_where(&mut self, mut pred: impl FnMut(&T) -> bool) -> usize {
        let mut count = 0;
        for entry in self.heap.iter() {
            if !self.cancelled.contains(&entry.seq) && pred(&entry.task) {
                self.cancelled.insert(entry.seq);
                count += 1;
            }
        }
        count
    }

    /// 弹出一个已到期的任务（deadline <= now）
    pub fn pop_due(&mut self, now: Duration) -> Option<(Duration, T)> {
        self.discard_cancelled_head();
        if self.heap.peek()?.deadline > now {
            return None;
        }
        self.heap.pop().map(|entry| (entry.deadline, entry.task))
    }

    /// 最早的待执行 deadline
    pub fn next_deadline(&self) -> Option<Duration> {
        self.heap
            .iter()
            .filter(|entry| !self.cancelled.contains(&entry.seq))
            .map(|entry| entry.deadline)
            .min()
    }

    /// 待执行任务数量（不含已取消）
    pub fn len(&self) -> usize {
        self.heap
            .iter()
            .filter(|entry| !self.cancelled.contains(&entry.seq))
            .count()
    }

    /// 是否没有待执行任务
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// 清空队列
    pub fn clear(&mut self) {
        self.heap.clear();
        self.cancelled.clear();
    }

    fn discard_cancelled_head(&mut self) {
        while let Some(entry) = self.heap.peek() {
            if !self.cancelled.remove(&entry.seq) {
                break;
            }
            self.heap.pop();
        }
    }
}
