//! Mock 实现模块
//!
//! 提供 VFS 驱动的 Mock 实现，用于测试门面层的路由与错误处理

pub mod vfs;
