//! # 文件系统驱动 (FS)
//!
//! 本 crate 提供实现了 [`vfs::VfsDriver`] 的具体文件系统，供 `VfsContext` 注册和挂载。
//!
//! ## 支持的文件系统
//!
//! - **[blockfs]**: 任意 [`device::BlockDevice`] 上的目录树文件系统

#![no_std]
#![allow(clippy::module_inception)]

extern crate alloc;

pub mod blockfs;

pub use blockfs::BlockFs;
