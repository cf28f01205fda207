//! 后端驱动接口
//!
//! 每个挂载点持有一个 [`VfsDriver`] 实例。驱动接收的路径都是相对挂载点的
//! 剩余路径（以 `/` 开头，挂载点本身为 `/`）。

use alloc::string::String;
use alloc::sync::Arc;
use alloc::vec::Vec;
use core::any::Any;

use device::BlockDevice;

use crate::{OpenFlags, VfsResult};

/// 驱动内部的打开文件标识，仅在同一个驱动实例内有意义
pub type FileId = u32;

/// 驱动工厂：在给定块设备上构造一个驱动实例
pub type DriverFactory = fn(Arc<dyn BlockDevice>) -> Arc<dyn VfsDriver>;

/// 文件类型
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileType {
    /// 普通文件
    File = 1,
    /// 目录
    Directory = 2,
}

/// 文件状态
///
/// 每次 `stat` 都直接询问驱动，不做缓存。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Stat {
    /// 文件类型
    pub file_type: FileType,
    /// 文件大小（字节），目录为 0
    pub size: usize,
}

impl Stat {
    /// 普通文件的状态
    pub const fn file(size: usize) -> Self {
        Self {
            file_type: FileType::File,
            size,
        }
    }

    /// 目录的状态
    pub const fn directory() -> Self {
        Self {
            file_type: FileType::Directory,
            size: 0,
        }
    }

    /// 是否为普通文件
    pub fn is_file(&self) -> bool {
        self.file_type == FileType::File
    }

    /// 是否为目录
    pub fn is_dir(&self) -> bool {
        self.file_type == FileType::Directory
    }
}

/// 后端驱动 trait
///
/// 驱动以 `&self` 暴露全部操作，内部状态自行加锁。
/// 除 `mount`/`mkfs` 外，在未挂载的驱动上调用任何操作都应返回
/// [`VfsError::NoDevice`](crate::VfsError::NoDevice)。
pub trait VfsDriver: Send + Sync {
    /// 文件系统类型名称
    fn fs_type(&self) -> &'static str;

    /// 挂载：读取并校验介质
    fn mount(&self) -> VfsResult<()>;

    /// 卸载：释放所有打开的文件并同步设备
    fn unmount(&self) -> VfsResult<()>;

    /// 在设备上创建空文件系统
    fn mkfs(&self) -> VfsResult<()>;

    /// 打开文件，返回驱动内的文件标识
    fn open(&self, path: &str, flags: OpenFlags, mode: u32) -> VfsResult<FileId>;

    /// 读取数据
    ///
    /// `position` 为 `Some` 时先定位到该偏移。返回实际读取的字节数，0 表示文件结束。
    fn read(&self, id: FileId, buf: &mut [u8], position: Option<usize>) -> VfsResult<usize>;

    /// 写入数据，返回实际写入的字节数
    fn write(&self, id: FileId, buf: &[u8], position: Option<usize>) -> VfsResult<usize>;

    /// 关闭文件
    fn close(&self, id: FileId) -> VfsResult<()>;

    /// 获取文件状态
    fn stat(&self, path: &str) -> VfsResult<Stat>;

    /// 创建目录
    fn mkdir(&self, path: &str) -> VfsResult<()>;

    /// 删除空目录
    fn rmdir(&self, path: &str) -> VfsResult<()>;

    /// 列出目录项名称（不含 `.` 与 `..`）
    fn readdir(&self, path: &str) -> VfsResult<Vec<String>>;

    /// 重命名，两个路径都属于本驱动
    fn rename(&self, old_path: &str, new_path: &str) -> VfsResult<()>;

    /// 删除文件
    fn unlink(&self, path: &str) -> VfsResult<()>;

    /// 转换为 Any 以便向下转型
    fn as_any(&self) -> &dyn Any;
}
