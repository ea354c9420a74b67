//! 请求代数 - 基础设施层
//!
//! 同一个 key 上可能同时有多个请求在途，结算顺序不一定等于发出顺序。
//! 每次发起请求前领取一个代数，结算时只有最新一代的结果才能写回状态。

use std::collections::HashMap;
use std::hash::Hash;

/// 一次请求结算后的去向
#[derive(Debug, Clone, PartialEq)]
pub enum Settlement<T> {
    /// 结果已写回状态
    Applied(T),
    /// 同一 key 上已有更新的请求，结果被丢弃
    Superseded,
    /// 输入为空，未发起请求
    Skipped,
}

impl<T> Settlement<T> {
    pub fn applied(self) -> Option<T> {
        match self {
            Settlement::Applied(value) => Some(value),
            _ => None,
        }
    }

    pub fn is_applied(&self) -> bool {
        matches!(self, Settlement::Applied(_))
    }

    pub fn is_superseded(&self) -> bool {
        matches!(self, Settlement::Superseded)
    }
}

/// 按 key 计数的请求代数
#[derive(Debug, Clone)]
pub struct RequestGenerations<K> {
    latest: HashMap<K, u64>,
}

impl<K: Eq + Hash + Clone> RequestGenerations<K> {
    pub fn new() -> Self {
        Self {
            latest: HashMap::new(),
        }
    }

    /// 为 key 领取新一代，之前领取的全部作废
    pub fn issue(&mut self, key: &K) -> u64 {
        let generation = self.latest.entry(key.clone()).or_insert(0);
        *generation += 1;
        *generation
    }

    /// 该代是否仍是 key 上最新的一代
    pub fn is_current(&self, key: &K, generation: u64) -> bool {
        self.current(key) == generation
    }

    /// key 上最新的代数，从未领取过为 0
    pub fn current(&self, key: &K) -> u64 {
        self.latest.get(key).copied().unwrap_or(0)
    }
}

impl<K: Eq + Hash + Clone> Default for RequestGenerations<K> {
    fn default() -> Self {
        Self::new()
    }
}
