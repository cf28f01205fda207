//! 挂载表虚拟文件系统层
//!
//! 此 crate 把 POSIX 风格的路径路由到挂载的后端驱动，包括：
//!
//! - [`VfsDriver`] trait - 后端驱动接口
//! - [`DriverRegistry`] - 文件系统类型注册表
//! - [`MountTable`] - 最长前缀匹配的挂载表
//! - [`FDTable`] - 文件描述符表
//! - [`OpenFlags`] - 打开模式字符串与位标志的转换
//! - [`VfsContext`] - 对外的同步文件操作门面
//! - 路径解析工具

#![no_std]

extern crate alloc;

pub mod config;
pub mod error;

mod context;
mod driver;
mod fd_table;
mod flags;
mod mount;
mod path;
mod registry;

// Re-export error
pub use error::{VfsError, VfsResult};

// Re-export config
pub use config::VfsConfig;

// Re-export driver
pub use driver::{DriverFactory, FileId, FileType, Stat, VfsDriver};

// Re-export flags
pub use flags::OpenFlags;

// Re-export path
pub use path::{
    PathComponent, file_name, normalize_path, parent_path, parse_path, path_depth, resolve_path,
};

// Re-export registry
pub use registry::DriverRegistry;

// Re-export mount
pub use mount::{MountPoint, MountTable};

// Re-export fd_table
pub use fd_table::{FDTable, OpenFile};

// Re-export context
pub use context::VfsContext;
