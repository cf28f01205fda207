//! 同步原语
//!
//! 向块设备与文件系统驱动提供自旋锁。
//!
//! VFS 门面只在单个协作式线程上运行，不需要额外加锁；但驱动和设备以
//! `Arc<dyn ...>` 的形式在挂载表与文件描述符表之间共享，内部状态需要
//! 满足 `Send + Sync`，这里的 [`SpinLock`] 即用于此。
//!
//! 锁基于 [`lock_api`] 构建，[`RawSpinLock`] 只实现原始的加锁/解锁协议。

#![no_std]

mod raw_spin_lock;
mod spin_lock;

pub use raw_spin_lock::RawSpinLock;
pub use spin_lock::{SpinLock, SpinLockGuard};
