//! 文件描述符表
//!
//! 约定与语义：
//!
//! - 0/1/2 为标准流保留，永远不会分配，也永远不会解析为打开的文件
//! - `alloc()` 分配 3 及以上的最小可用 fd，已关闭的槽位会被复用
//! - 槽位数量受 `max_fds` 限制，超出时返回 `TooManyOpenFiles`

use alloc::string::String;
use alloc::sync::Arc;
use alloc::vec::Vec;
use core::fmt;

use crate::config::RESERVED_FDS;
use crate::{FileId, VfsDriver, VfsError, VfsResult};

/// 打开的文件：驱动实例加驱动内的文件标识
#[derive(Clone)]
pub struct OpenFile {
    /// 驱动内的文件标识
    pub file_id: FileId,
    /// 打开该文件的驱动
    pub driver: Arc<dyn VfsDriver>,
    /// 所属挂载点路径
    pub mount_path: String,
}

impl fmt::Debug for OpenFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OpenFile")
            .field("file_id", &self.file_id)
            .field("fs_type", &self.driver.fs_type())
            .field("mount_path", &self.mount_path)
            .finish()
    }
}

/// 文件描述符表
pub struct FDTable {
    /// 文件描述符数组，下标即 fd
    files: Vec<Option<OpenFile>>,
    /// 最大文件描述符数量（含保留槽位）
    max_fds: usize,
}

impl fmt::Debug for FDTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FDTable")
            .field("max_fds", &self.max_fds)
            .field("slots", &self.files.len())
            .field("used", &self.open_count())
            .finish()
    }
}

impl FDTable {
    /// 创建新的文件描述符表
    pub fn new(max_fds: usize) -> Self {
        Self {
            files: Vec::new(),
            max_fds,
        }
    }

    /// 分配一个新的文件描述符
    pub fn alloc(&mut self, file: OpenFile) -> VfsResult<usize> {
        while self.files.len() < RESERVED_FDS {
            self.files.push(None);
        }

        // 查找最小可用 FD
        if let Some((fd, slot)) = self
            .files
            .iter_mut()
            .enumerate()
            .skip(RESERVED_FDS)
            .find(|(_, slot)| slot.is_none())
        {
            *slot = Some(file);
            return Ok(fd);
        }

        // 没有空闲槽位，扩展数组
        let fd = self.files.len();
        if fd >= self.max_fds {
            return Err(VfsError::TooManyOpenFiles);
        }

        self.files.push(Some(file));
        Ok(fd)
    }

    /// 获取打开的文件
    pub fn get(&self, fd: usize) -> VfsResult<&OpenFile> {
        if fd < RESERVED_FDS {
            return Err(VfsError::BadFileDescriptor);
        }
        self.files
            .get(fd)
            .and_then(Option::as_ref)
            .ok_or(VfsError::BadFileDescriptor)
    }

    /// 关闭文件描述符，取出其中的文件
    pub fn close(&mut self, fd: usize) -> VfsResult<OpenFile> {
        if fd < RESERVED_FDS {
            return Err(VfsError::BadFileDescriptor);
        }
        self.files
            .get_mut(fd)
            .and_then(Option::take)
            .ok_or(VfsError::BadFileDescriptor)
    }

    /// 当前打开的文件描述符数量（不含保留槽位）
    pub fn open_count(&self) -> usize {
        self.files.iter().filter(|slot| slot.is_some()).count()
    }

    /// 最大文件描述符数量
    pub fn max_fds(&self) -> usize {
        self.max_fds
    }
}
