//! 块设备抽象
//!
//! 此 crate 定义文件系统驱动所依赖的块设备接口：
//!
//! - [`BlockDevice`] trait - 按块读写 + `ioctl` 控制
//! - [`IoctlOp`] - `ioctl` 操作码（初始化、关闭、同步、查询几何信息、擦除）
//! - [`RamDisk`] - 内存模拟块设备，用于测试和无闪存的目标
//!
//! VFS 核心并不直接访问块设备，只是把它原样交给驱动工厂。

#![no_std]
#![allow(clippy::module_inception)]

extern crate alloc;

pub mod block;

// Re-export block
pub use block::{BlockDevice, IoctlOp, RamDisk};
