//! 测试支持 crate
//!
//! 提供 Mock 驱动和常用的测试夹具

#![no_std]

extern crate alloc;

pub mod mock;

use alloc::sync::Arc;

use device::{BlockDevice, RamDisk};
use vfs::{VfsContext, VfsResult};

pub use mock::vfs::{MOCK_FS_TYPE, MockDriver};

/// 默认几何参数（16 × 4096）的空白内存盘
pub fn ram_disk() -> Arc<dyn BlockDevice> {
    RamDisk::default_geometry()
}

/// 已注册 [`MockDriver`] 并在 `/` 挂载了一个自动格式化实例的上下文
pub fn mock_context() -> VfsResult<VfsContext> {
    let mut ctx = VfsContext::new();
    ctx.register(MOCK_FS_TYPE, MockDriver::factory);
    ctx.mount("/", ram_disk(), MOCK_FS_TYPE, true)?;
    Ok(ctx)
}

/// 取出挂载在 `mount_path` 的 [`MockDriver`] 实例
pub fn mock_driver_at<'a>(ctx: &'a VfsContext, mount_path: &str) -> Option<&'a MockDriver> {
    ctx.mounts()
        .find(|m| m.mount_path == mount_path)
        .and_then(|m| m.driver.as_any().downcast_ref::<MockDriver>())
}
