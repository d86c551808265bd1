//! 观察者列表
//!
//! 每个转换器持有一个 [`ObserverList`]。解码成功后按订阅顺序同步调用全部观察者，
//! 传入刚构造好的消息引用。
//!
//! - 不去重：同一个回调订阅两次就会收到两次
//! - 不捕获 panic：观察者出错是消费方的编程错误
//! - 观察者应当足够快，推荐只做 `try_send`，在别的线程里处理
//!
//! # 示例
//!
//! ```rust
//! use fixposition_driver::hooks::ObserverList;
//! use crossbeam_channel::bounded;
//!
//! let mut observers = ObserverList::<u32>::new();
//! let (tx, rx) = bounded(8);
//! observers.add_observer(move |v: &u32| {
//!     let _ = tx.try_send(*v);
//! });
//!
//! observers.trigger_all(&7);
//! assert_eq!(rx.try_recv(), Ok(7));
//! ```

/// 观察者回调
///
/// 只捕获自己需要的数据（通道发送端、计数器等），不要持有驱动本身。
pub type Observer<T> = Box<dyn FnMut(&T) + Send>;

pub struct ObserverList<T> {
    observers: Vec<Observer<T>>,
}

impl<T> Default for ObserverList<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> ObserverList<T> {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            observers: Vec::new(),
        }
    }

    /// 追加观察者（无数量上限）
    pub fn add_observer<F>(&mut self, observer: F)
    where
        F: FnMut(&T) + Send + 'static,
    {
        self.observers.push(Box::new(observer));
    }

    /// 按订阅顺序调用全部观察者
    pub fn trigger_all(&mut self, msg: &T) {
        for observer in self.observers.iter_mut() {
            observer(msg);
        }
    }

    /// 移除所有观察者
    pub fn clear(&mut self) {
        self.observers.clear();
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.observers.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.observers.is_empty()
    }
}

impl<T> std::fmt::Debug for ObserverList<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ObserverList")
            .field("len", &self.observers.len())
            .finish()
    }
}
