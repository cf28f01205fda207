//! 自旋锁封装
//!
//! 提供对数据的互斥访问。

use crate::raw_spin_lock::RawSpinLock;

/// 提供对数据的互斥访问的自旋锁。
///
/// # 示例
/// ```
/// use sync::SpinLock;
///
/// let lock = SpinLock::new(0);
/// {
///     let mut guard = lock.lock();
///     *guard += 1;
/// }
/// assert_eq!(*lock.lock(), 1);
/// ```
///
/// # 注意
/// SpinLock 不是可重入的。持有锁时在同一调用链中再次 `lock()` 将导致死锁，
/// 因此驱动实现不应在持有自身状态锁时回调 VFS。
pub type SpinLock<T> = lock_api::Mutex<RawSpinLock, T>;

/// SpinLock 的 RAII 保护器，离开作用域时自动释放锁。
pub type SpinLockGuard<'a, T> = lock_api::MutexGuard<'a, RawSpinLock, T>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spin_lock_guards_data() {
        let lock = SpinLock::new([0u8; 4]);
        {
            let mut guard = lock.lock();
            guard[0] = 7;
            assert!(lock.try_lock().is_none());
        }
        assert_eq!(lock.lock()[0], 7);
        assert!(lock.try_lock().is_some());
    }
}
