//! VFS 驱动的 Mock 实现
//!
//! [`MockDriver`] 用一张扁平的 `路径 → 节点` 表模拟文件系统，不做持久化；
//! 只有设备第 0 块首字节上的格式化标记会写回设备，用来模拟“未格式化的介质”。
//! 计数器与故障注入开关供测试断言门面层的调用顺序。

use alloc::collections::BTreeMap;
use alloc::format;
use alloc::string::String;
use alloc::sync::Arc;
use alloc::vec::Vec;
use core::any::Any;
use core::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use device::BlockDevice;
use sync::SpinLock;
use vfs::{
    FileId, OpenFlags, Stat, VfsDriver, VfsError, VfsResult, file_name, parent_path,
};

/// Mock 驱动注册使用的类型名
pub const MOCK_FS_TYPE: &str = "mockfs";

/// 格式化标记，写在第 0 块偏移 0 处
const FORMAT_MARKER: u8 = 0xA5;

enum MockNode {
    File(Vec<u8>),
    Dir,
}

struct MockHandle {
    path: String,
    flags: OpenFlags,
    cursor: usize,
}

#[derive(Default)]
struct MockState {
    mounted: bool,
    nodes: BTreeMap<String, MockNode>,
    handles: BTreeMap<FileId, MockHandle>,
    next_id: FileId,
}

/// Mock 驱动
pub struct MockDriver {
    device: Arc<dyn BlockDevice>,
    state: SpinLock<MockState>,
    mount_calls: AtomicUsize,
    mkfs_calls: AtomicUsize,
    unmount_calls: AtomicUsize,
    fail_close: AtomicBool,
    fail_unmount: AtomicBool,
}

impl MockDriver {
    /// 在设备上创建 Mock 驱动
    pub fn new(device: Arc<dyn BlockDevice>) -> Arc<Self> {
        Arc::new(Self {
            device,
            state: SpinLock::new(MockState::default()),
            mount_calls: AtomicUsize::new(0),
            mkfs_calls: AtomicUsize::new(0),
            unmount_calls: AtomicUsize::new(0),
            fail_close: AtomicBool::new(false),
            fail_unmount: AtomicBool::new(false),
        })
    }

    /// 注册到 `VfsContext` 使用的工厂函数
    pub fn factory(device: Arc<dyn BlockDevice>) -> Arc<dyn VfsDriver> {
        Self::new(device)
    }

    /// `mount` 被调用的次数（含失败）
    pub fn mount_calls(&self) -> usize {
        self.mount_calls.load(Ordering::Relaxed)
    }

    /// `mkfs` 被调用的次数
    pub fn mkfs_calls(&self) -> usize {
        self.mkfs_calls.load(Ordering::Relaxed)
    }

    /// `unmount` 被调用的次数
    pub fn unmount_calls(&self) -> usize {
        self.unmount_calls.load(Ordering::Relaxed)
    }

    /// 让后续的 `close` 返回 `IoError`
    pub fn set_fail_close(&self, fail: bool) {
        self.fail_close.store(fail, Ordering::Relaxed);
    }

    /// 让后续的 `unmount` 返回 `IoError`
    pub fn set_fail_unmount(&self, fail: bool) {
        self.fail_unmount.store(fail, Ordering::Relaxed);
    }

    /// 驱动内仍处于打开状态的文件数量
    pub fn open_handles(&self) -> usize {
        self.state.lock().handles.len()
    }

    /// 模拟的容量：整个设备的字节数
    fn capacity(&self) -> usize {
        match (self.device.block_size(), self.device.block_count()) {
            (Some(size), Some(count)) => size.saturating_mul(count),
            _ => 0,
        }
    }

    fn with_mounted<T>(&self, f: impl FnOnce(&mut MockState) -> VfsResult<T>) -> VfsResult<T> {
        let mut state = self.state.lock();
        if !state.mounted {
            return Err(VfsError::NoDevice);
        }
        f(&mut state)
    }
}

impl MockState {
    fn require_parent_dir(&self, path: &str) -> VfsResult<()> {
        match self.nodes.get(&parent_path(path)) {
            Some(MockNode::Dir) => Ok(()),
            Some(MockNode::File(_)) => Err(VfsError::NotDirectory),
            None => Err(VfsError::NotFound),
        }
    }

    fn has_children(&self, path: &str) -> bool {
        self.nodes
            .keys()
            .any(|key| key != path && parent_path(key) == path)
    }
}

impl VfsDriver for MockDriver {
    fn fs_type(&self) -> &'static str {
        MOCK_FS_TYPE
    }

    fn mount(&self) -> VfsResult<()> {
        self.mount_calls.fetch_add(1, Ordering::Relaxed);
        let mut marker = [0u8; 1];
        if !self.device.read(0, &mut marker, 0) {
            return Err(VfsError::IoError);
        }
        if marker[0] != FORMAT_MARKER {
            return Err(VfsError::Corrupted);
        }
        let mut state = self.state.lock();
        state.mounted = true;
        if state.nodes.is_empty() {
            state.nodes.insert(String::from("/"), MockNode::Dir);
        }
        Ok(())
    }

    fn unmount(&self) -> VfsResult<()> {
        self.unmount_calls.fetch_add(1, Ordering::Relaxed);
        let mut state = self.state.lock();
        state.mounted = false;
        state.handles.clear();
        if self.fail_unmount.load(Ordering::Relaxed) {
            return Err(VfsError::IoError);
        }
        Ok(())
    }

    fn mkfs(&self) -> VfsResult<()> {
        self.mkfs_calls.fetch_add(1, Ordering::Relaxed);
        if !self.device.write(0, &[FORMAT_MARKER], 0) {
            return Err(VfsError::IoError);
        }
        let mut state = self.state.lock();
        state.nodes.clear();
        state.nodes.insert(String::from("/"), MockNode::Dir);
        Ok(())
    }

    fn open(&self, path: &str, flags: OpenFlags, _mode: u32) -> VfsResult<FileId> {
        self.with_mounted(|state| {
            let exists = match state.nodes.get(path) {
                Some(MockNode::Dir) => return Err(VfsError::IsDirectory),
                Some(MockNode::File(_)) => true,
                None => false,
            };
            if exists {
                if flags.contains(OpenFlags::EXCL) {
                    return Err(VfsError::AlreadyExists);
                }
                if let Some(MockNode::File(data)) = state.nodes.get_mut(path) {
                    if flags.contains(OpenFlags::TRUNC) {
                        data.clear();
                    }
                }
            } else if flags.creates() {
                state.require_parent_dir(path)?;
                state
                    .nodes
                    .insert(String::from(path), MockNode::File(Vec::new()));
            } else {
                return Err(VfsError::NotFound);
            }
            let id = state.next_id;
            state.next_id += 1;
            state.handles.insert(
                id,
                MockHandle {
                    path: String::from(path),
                    flags,
                    cursor: 0,
                },
            );
            Ok(id)
        })
    }

    fn read(&self, id: FileId, buf: &mut [u8], position: Option<usize>) -> VfsResult<usize> {
        self.with_mounted(|state| {
            let handle = state.handles.get_mut(&id).ok_or(VfsError::BadFileDescriptor)?;
            if !handle.flags.readable() {
                return Err(VfsError::BadFileDescriptor);
            }
            let Some(MockNode::File(data)) = state.nodes.get(&handle.path) else {
                return Err(VfsError::NotFound);
            };
            if let Some(position) = position {
                handle.cursor = position;
            }
            let start = handle.cursor.min(data.len());
            let n = buf.len().min(data.len() - start);
            buf[..n].copy_from_slice(&data[start..start + n]);
            handle.cursor = start + n;
            Ok(n)
        })
    }

    fn write(&self, id: FileId, buf: &[u8], position: Option<usize>) -> VfsResult<usize> {
        self.with_mounted(|state| {
            let handle = state.handles.get_mut(&id).ok_or(VfsError::BadFileDescriptor)?;
            if !handle.flags.writable() {
                return Err(VfsError::BadFileDescriptor);
            }
            let Some(MockNode::File(data)) = state.nodes.get_mut(&handle.path) else {
                return Err(VfsError::NotFound);
            };
            if let Some(position) = position {
                handle.cursor = position;
            }
            if handle.flags.contains(OpenFlags::APPEND) {
                handle.cursor = data.len();
            }
            let end = handle
                .cursor
                .checked_add(buf.len())
                .filter(|&end| end <= self.capacity())
                .ok_or(VfsError::NoSpace)?;
            if data.len() < end {
                data.resize(end, 0);
            }
            data[handle.cursor..end].copy_from_slice(buf);
            handle.cursor = end;
            Ok(buf.len())
        })
    }

    fn close(&self, id: FileId) -> VfsResult<()> {
        let mut state = self.state.lock();
        state.handles.remove(&id).ok_or(VfsError::BadFileDescriptor)?;
        if self.fail_close.load(Ordering::Relaxed) {
            return Err(VfsError::IoError);
        }
        Ok(())
    }

    fn stat(&self, path: &str) -> VfsResult<Stat> {
        self.with_mounted(|state| match state.nodes.get(path) {
            Some(MockNode::File(data)) => Ok(Stat::file(data.len())),
            Some(MockNode::Dir) => Ok(Stat::directory()),
            None => Err(VfsError::NotFound),
        })
    }

    fn mkdir(&self, path: &str) -> VfsResult<()> {
        self.with_mounted(|state| {
            if state.nodes.contains_key(path) {
                return Err(VfsError::AlreadyExists);
            }
            state.require_parent_dir(path)?;
            state.nodes.insert(String::from(path), MockNode::Dir);
            Ok(())
        })
    }

    fn rmdir(&self, path: &str) -> VfsResult<()> {
        self.with_mounted(|state| {
            match state.nodes.get(path) {
                Some(MockNode::Dir) if path == "/" => return Err(VfsError::InvalidArgument),
                Some(MockNode::Dir) if state.has_children(path) => {
                    return Err(VfsError::DirectoryNotEmpty);
                }
                Some(MockNode::Dir) => {}
                Some(MockNode::File(_)) => return Err(VfsError::NotDirectory),
                None => return Err(VfsError::NotFound),
            }
            state.nodes.remove(path);
            Ok(())
        })
    }

    fn readdir(&self, path: &str) -> VfsResult<Vec<String>> {
        self.with_mounted(|state| match state.nodes.get(path) {
            Some(MockNode::Dir) => Ok(state
                .nodes
                .keys()
                .filter(|key| key.as_str() != path && parent_path(key) == path)
                .filter_map(|key| file_name(key).map(String::from))
                .collect()),
            Some(MockNode::File(_)) => Err(VfsError::NotDirectory),
            None => Err(VfsError::NotFound),
        })
    }

    fn rename(&self, old_path: &str, new_path: &str) -> VfsResult<()> {
        self.with_mounted(|state| {
            if !state.nodes.contains_key(old_path) {
                return Err(VfsError::NotFound);
            }
            state.require_parent_dir(new_path)?;
            // 连同子树一起搬移
            let prefix = format!("{old_path}/");
            let moved: Vec<String> = state
                .nodes
                .keys()
                .filter(|key| key.as_str() == old_path || key.starts_with(&prefix))
                .cloned()
                .collect();
            for key in moved {
                if let Some(node) = state.nodes.remove(&key) {
                    let renamed = format!("{new_path}{}", &key[old_path.len()..]);
                    state.nodes.insert(renamed, node);
                }
            }
            Ok(())
        })
    }

    fn unlink(&self, path: &str) -> VfsResult<()> {
        self.with_mounted(|state| match state.nodes.get(path) {
            Some(MockNode::File(_)) => {
                state.nodes.remove(path);
                Ok(())
            }
            Some(MockNode::Dir) => Err(VfsError::IsDirectory),
            None => Err(VfsError::NotFound),
        })
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
