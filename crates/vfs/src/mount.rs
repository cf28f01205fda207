//! 挂载表
//!
//! 挂载点按路径深度从深到浅排列，深度相同的保持插入顺序。
//! 查找时第一个匹配的挂载点即为最长前缀匹配。

use alloc::string::String;
use alloc::sync::Arc;
use alloc::vec::Vec;
use core::fmt;

use crate::path::{file_name, parent_path, path_depth};
use crate::{VfsDriver, VfsError, VfsResult};

/// 挂载点
#[derive(Clone)]
pub struct MountPoint {
    /// 规范化的绝对挂载路径
    pub mount_path: String,
    /// 文件系统类型名
    pub fs_type: String,
    /// 驱动实例
    pub driver: Arc<dyn VfsDriver>,
}

impl MountPoint {
    /// 创建挂载点
    pub fn new(mount_path: &str, fs_type: &str, driver: Arc<dyn VfsDriver>) -> Self {
        Self {
            mount_path: String::from(mount_path),
            fs_type: String::from(fs_type),
            driver,
        }
    }

    /// `path` 是否落在此挂载点之下，匹配时返回剩余路径
    pub fn strip(&self, path: &str) -> Option<String> {
        if self.mount_path == "/" {
            return Some(String::from(path));
        }
        let rest = path.strip_prefix(self.mount_path.as_str())?;
        if rest.is_empty() {
            Some(String::from("/"))
        } else if rest.starts_with('/') {
            Some(String::from(rest))
        } else {
            None
        }
    }
}

impl fmt::Debug for MountPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MountPoint")
            .field("mount_path", &self.mount_path)
            .field("fs_type", &self.fs_type)
            .finish()
    }
}

/// 挂载表
#[derive(Debug, Default)]
pub struct MountTable {
    mounts: Vec<MountPoint>,
}

impl MountTable {
    /// 创建空挂载表
    pub fn new() -> Self {
        Self { mounts: Vec::new() }
    }

    /// 插入挂载点，同一路径已挂载时返回 `AlreadyExists`
    pub fn insert(&mut self, mount: MountPoint) -> VfsResult<()> {
        if self.contains(&mount.mount_path) {
            return Err(VfsError::AlreadyExists);
        }
        self.mounts.push(mount);
        // sort_by_key 是稳定排序，同深度保持插入顺序
        self.mounts
            .sort_by_key(|m| core::cmp::Reverse(path_depth(&m.mount_path)));
        Ok(())
    }

    /// 按精确路径移除挂载点
    pub fn remove(&mut self, mount_path: &str) -> VfsResult<MountPoint> {
        let index = self
            .mounts
            .iter()
            .position(|m| m.mount_path == mount_path)
            .ok_or(VfsError::InvalidArgument)?;
        Ok(self.mounts.remove(index))
    }

    /// 查找负责 `path` 的挂载点，返回挂载点与剩余路径
    ///
    /// `path` 必须是规范化的绝对路径。
    pub fn find_mount(&self, path: &str) -> VfsResult<(&MountPoint, String)> {
        self.mounts
            .iter()
            .find_map(|m| m.strip(path).map(|rest| (m, rest)))
            .ok_or(VfsError::NotFound)
    }

    /// 是否存在挂载在 `mount_path` 上的文件系统
    pub fn contains(&self, mount_path: &str) -> bool {
        self.mounts.iter().any(|m| m.mount_path == mount_path)
    }

    /// 直接挂在目录 `dir` 下的挂载点名称
    pub fn children_of(&self, dir: &str) -> Vec<String> {
        self.mounts
            .iter()
            .filter(|m| m.mount_path != "/" && parent_path(&m.mount_path) == dir)
            .filter_map(|m| file_name(&m.mount_path).map(String::from))
            .collect()
    }

    /// 按查找顺序遍历所有挂载点
    pub fn iter(&self) -> impl Iterator<Item = &MountPoint> {
        self.mounts.iter()
    }

    /// 列出所有挂载路径
    pub fn list_mounts(&self) -> Vec<String> {
        self.mounts.iter().map(|m| m.mount_path.clone()).collect()
    }
}
