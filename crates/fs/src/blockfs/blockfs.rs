//! BlockFs 驱动实现

use alloc::collections::BTreeMap;
use alloc::format;
use alloc::string::String;
use alloc::sync::Arc;
use alloc::vec;
use alloc::vec::Vec;
use core::any::Any;

use device::{BlockDevice, IoctlOp};
use sync::SpinLock;
use vfs::config::MAX_NAME_LEN;
use vfs::{
    FileId, OpenFlags, PathComponent, Stat, VfsDriver, VfsError, VfsResult, normalize_path,
    parse_path,
};

use super::image::{SUPERBLOCK_LEN, Superblock, decode_tree, encode_tree};
use super::node::Node;

/// BlockFs 注册使用的类型名
pub const FS_TYPE: &str = "blockfs";

/// 打开的文件
struct OpenHandle {
    path: Vec<String>,
    flags: OpenFlags,
    cursor: usize,
}

/// 挂载后的状态
struct Mounted {
    root: Node,
    handles: BTreeMap<FileId, OpenHandle>,
    next_id: FileId,
    geometry: Geometry,
}

#[derive(Debug, Clone, Copy)]
struct Geometry {
    block_size: usize,
    block_count: usize,
}

impl Geometry {
    fn query(device: &dyn BlockDevice) -> VfsResult<Self> {
        Ok(Self {
            block_size: device.block_size().ok_or(VfsError::IoError)?,
            block_count: device.block_count().ok_or(VfsError::IoError)?,
        })
    }

    /// 超级块之后可用于目录树的字节数
    fn capacity(&self) -> usize {
        self.block_count.saturating_sub(1) * self.block_size
    }
}

/// 块设备上的目录树文件系统
///
/// 挂载时把整棵目录树读入内存；每次修改都在树的副本上完成，
/// 写回设备成功后才替换内存中的树。
pub struct BlockFs {
    device: Arc<dyn BlockDevice>,
    state: SpinLock<Option<Mounted>>,
}

impl BlockFs {
    /// 在设备上创建驱动，不访问设备
    pub fn new(device: Arc<dyn BlockDevice>) -> Arc<Self> {
        Arc::new(Self {
            device,
            state: SpinLock::new(None),
        })
    }

    /// 注册到 `VfsContext` 使用的工厂函数
    pub fn factory(device: Arc<dyn BlockDevice>) -> Arc<dyn VfsDriver> {
        Self::new(device)
    }

    /// 是否已挂载
    pub fn is_mounted(&self) -> bool {
        self.state.lock().is_some()
    }

    fn ioctl(&self, op: IoctlOp) -> VfsResult<isize> {
        let ret = self.device.ioctl(op);
        if ret < 0 {
            return Err(VfsError::IoError);
        }
        Ok(ret)
    }

    fn with_mounted<T>(&self, f: impl FnOnce(&mut Mounted) -> VfsResult<T>) -> VfsResult<T> {
        let mut state = self.state.lock();
        let mounted = state.as_mut().ok_or(VfsError::NoDevice)?;
        f(mounted)
    }

    /// 把目录树写回设备：先写镜像块，最后写超级块
    fn write_image(&self, root: &Node, geometry: Geometry) -> VfsResult<()> {
        let image = encode_tree(root);
        if image.len() > geometry.capacity() {
            log::warn!(
                "blockfs: image of {} bytes exceeds capacity {}",
                image.len(),
                geometry.capacity()
            );
            return Err(VfsError::NoSpace);
        }

        for (i, chunk) in image.chunks(geometry.block_size).enumerate() {
            let block_id = i + 1;
            if !self.device.erase_block(block_id) || !self.device.write(block_id, chunk, 0) {
                return Err(VfsError::IoError);
            }
        }

        let superblock = Superblock {
            block_size: to_u32(geometry.block_size)?,
            block_count: to_u32(geometry.block_count)?,
            image_len: to_u32(image.len())?,
        };
        if !self.device.erase_block(0) || !self.device.write(0, &superblock.encode(), 0) {
            return Err(VfsError::IoError);
        }
        self.ioctl(IoctlOp::Sync)?;
        log::debug!("blockfs: committed {} byte image", image.len());
        Ok(())
    }

    fn read_image(&self, geometry: Geometry) -> VfsResult<Node> {
        if geometry.block_size < SUPERBLOCK_LEN {
            return Err(VfsError::Corrupted);
        }
        let mut header = [0u8; SUPERBLOCK_LEN];
        if !self.device.read(0, &mut header, 0) {
            return Err(VfsError::IoError);
        }
        let superblock = Superblock::decode(&header)?;
        let image_len = superblock.image_len as usize;
        if superblock.block_size as usize != geometry.block_size
            || superblock.block_count as usize != geometry.block_count
            || image_len > geometry.capacity()
        {
            return Err(VfsError::Corrupted);
        }

        let mut image = vec![0u8; image_len];
        for (i, chunk) in image.chunks_mut(geometry.block_size).enumerate() {
            if !self.device.read(i + 1, chunk, 0) {
                return Err(VfsError::IoError);
            }
        }
        match decode_tree(&image)? {
            root @ Node::Dir(_) => Ok(root),
            Node::File(_) => Err(VfsError::Corrupted),
        }
    }
}

impl Mounted {
    /// 在目录树副本上应用修改并写回设备，失败时内存中的树保持不变
    fn commit(
        &mut self,
        fs: &BlockFs,
        apply: impl FnOnce(&mut Node) -> VfsResult<()>,
    ) -> VfsResult<()> {
        let mut next = self.root.clone();
        apply(&mut next)?;
        fs.write_image(&next, self.geometry)?;
        self.root = next;
        Ok(())
    }

    fn handle(&mut self, id: FileId) -> VfsResult<&mut OpenHandle> {
        self.handles.get_mut(&id).ok_or(VfsError::BadFileDescriptor)
    }
}

/// 超级块字段为 32 位，更大的几何参数无法记录
fn to_u32(value: usize) -> VfsResult<u32> {
    u32::try_from(value).map_err(|_| VfsError::NoSpace)
}

/// 把驱动内路径拆成组件，检查名称长度
fn components(path: &str) -> VfsResult<Vec<String>> {
    let normalized = if path.starts_with('/') {
        normalize_path(path)
    } else {
        normalize_path(&format!("/{path}"))
    };
    let parts: Vec<String> = parse_path(&normalized)
        .into_iter()
        .filter_map(|c| match c {
            PathComponent::Normal(name) => Some(name),
            _ => None,
        })
        .collect();
    if parts.iter().any(|name| name.len() > MAX_NAME_LEN) {
        return Err(VfsError::NameTooLong);
    }
    Ok(parts)
}

impl VfsDriver for BlockFs {
    fn fs_type(&self) -> &'static str {
        FS_TYPE
    }

    fn mount(&self) -> VfsResult<()> {
        self.ioctl(IoctlOp::Init)?;
        let geometry = Geometry::query(&*self.device)?;
        let root = self.read_image(geometry).inspect_err(|err| {
            log::warn!("blockfs: mount failed: {}", err);
        })?;
        *self.state.lock() = Some(Mounted {
            root,
            handles: BTreeMap::new(),
            next_id: 0,
            geometry,
        });
        log::info!(
            "blockfs: mounted {} x {} byte blocks",
            geometry.block_count,
            geometry.block_size
        );
        Ok(())
    }

    fn unmount(&self) -> VfsResult<()> {
        self.state.lock().take().ok_or(VfsError::NoDevice)?;
        self.ioctl(IoctlOp::Sync)?;
        self.ioctl(IoctlOp::Shutdown)?;
        Ok(())
    }

    fn mkfs(&self) -> VfsResult<()> {
        self.ioctl(IoctlOp::Init)?;
        let geometry = Geometry::query(&*self.device)?;
        if geometry.block_count < 2 || geometry.block_size < SUPERBLOCK_LEN {
            return Err(VfsError::NoSpace);
        }
        let root = Node::empty_dir();
        self.write_image(&root, geometry)?;

        // 已挂载时内存中的树同步为空
        if let Some(mounted) = self.state.lock().as_mut() {
            mounted.root = root;
            mounted.handles.clear();
            mounted.geometry = geometry;
        }
        log::info!("blockfs: formatted {} blocks", geometry.block_count);
        Ok(())
    }

    fn open(&self, path: &str, flags: OpenFlags, _mode: u32) -> VfsResult<FileId> {
        if flags.is_empty() {
            return Err(VfsError::InvalidArgument);
        }
        let parts = components(path)?;
        self.with_mounted(|mounted| {
            // Some(是否为空文件)，None 表示不存在
            let existing = match mounted.root.lookup(&parts) {
                Ok(Node::Dir(_)) => return Err(VfsError::IsDirectory),
                Ok(Node::File(data)) => Some(data.is_empty()),
                Err(VfsError::NotFound) => None,
                Err(err) => return Err(err),
            };
            match existing {
                Some(_) if flags.contains(OpenFlags::EXCL) => {
                    return Err(VfsError::AlreadyExists);
                }
                Some(empty) => {
                    if flags.contains(OpenFlags::TRUNC) && !empty {
                        mounted.commit(self, |root| match root.lookup_mut(&parts)? {
                            Node::File(data) => {
                                data.clear();
                                Ok(())
                            }
                            Node::Dir(_) => Err(VfsError::IsDirectory),
                        })?;
                    }
                }
                None if flags.creates() => {
                    mounted.commit(self, |root| {
                        let (children, name) = root.parent_dir_mut(&parts)?;
                        children.insert(String::from(name), Node::File(Vec::new()));
                        Ok(())
                    })?;
                }
                None => return Err(VfsError::NotFound),
            }

            let id = mounted.next_id;
            mounted.next_id = mounted.next_id.wrapping_add(1);
            mounted.handles.insert(
                id,
                OpenHandle {
                    path: parts,
                    flags,
                    cursor: 0,
                },
            );
            Ok(id)
        })
    }

    fn read(&self, id: FileId, buf: &mut [u8], position: Option<usize>) -> VfsResult<usize> {
        self.with_mounted(|mounted| {
            let Mounted { root, handles, .. } = mounted;
            let handle = handles.get_mut(&id).ok_or(VfsError::BadFileDescriptor)?;
            if !handle.flags.readable() {
                return Err(VfsError::BadFileDescriptor);
            }
            let Node::File(data) = root.lookup(&handle.path)? else {
                return Err(VfsError::IsDirectory);
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
        self.with_mounted(|mounted| {
            let handle = mounted.handle(id)?;
            if !handle.flags.writable() {
                return Err(VfsError::BadFileDescriptor);
            }
            let append = handle.flags.contains(OpenFlags::APPEND);
            let path = handle.path.clone();
            let mut cursor = position.unwrap_or(handle.cursor);
            if buf.is_empty() {
                handle.cursor = cursor;
                return Ok(0);
            }
            let capacity = mounted.geometry.capacity();

            mounted.commit(self, |root| {
                let Node::File(data) = root.lookup_mut(&path)? else {
                    return Err(VfsError::IsDirectory);
                };
                if append {
                    cursor = data.len();
                }
                // 文件内容不可能超过设备容量，先拒绝再扩容
                let end = cursor
                    .checked_add(buf.len())
                    .filter(|&end| end <= capacity)
                    .ok_or(VfsError::NoSpace)?;
                if data.len() < end {
                    data.resize(end, 0);
                }
                data[cursor..end].copy_from_slice(buf);
                cursor = end;
                Ok(())
            })?;

            mounted.handle(id)?.cursor = cursor;
            Ok(buf.len())
        })
    }

    fn close(&self, id: FileId) -> VfsResult<()> {
        self.with_mounted(|mounted| {
            mounted
                .handles
                .remove(&id)
                .map(|_| ())
                .ok_or(VfsError::BadFileDescriptor)
        })
    }

    fn stat(&self, path: &str) -> VfsResult<Stat> {
        let parts = components(path)?;
        self.with_mounted(|mounted| Ok(mounted.root.lookup(&parts)?.stat()))
    }

    fn mkdir(&self, path: &str) -> VfsResult<()> {
        let parts = components(path)?;
        self.with_mounted(|mounted| {
            match mounted.root.lookup(&parts) {
                Ok(_) => return Err(VfsError::AlreadyExists),
                Err(VfsError::NotFound) => {}
                Err(err) => return Err(err),
            }
            mounted.commit(self, |root| {
                let (children, name) = root.parent_dir_mut(&parts)?;
                children.insert(String::from(name), Node::empty_dir());
                Ok(())
            })
        })
    }

    fn rmdir(&self, path: &str) -> VfsResult<()> {
        let parts = components(path)?;
        if parts.is_empty() {
            return Err(VfsError::InvalidArgument);
        }
        self.with_mounted(|mounted| {
            match mounted.root.lookup(&parts)? {
                Node::File(_) => return Err(VfsError::NotDirectory),
                Node::Dir(children) if !children.is_empty() => {
                    return Err(VfsError::DirectoryNotEmpty);
                }
                Node::Dir(_) => {}
            }
            mounted.commit(self, |root| {
                let (children, name) = root.parent_dir_mut(&parts)?;
                children.remove(name);
                Ok(())
            })
        })
    }

    fn readdir(&self, path: &str) -> VfsResult<Vec<String>> {
        let parts = components(path)?;
        self.with_mounted(|mounted| match mounted.root.lookup(&parts)? {
            Node::Dir(children) => Ok(children.keys().cloned().collect()),
            Node::File(_) => Err(VfsError::NotDirectory),
        })
    }

    fn rename(&self, old_path: &str, new_path: &str) -> VfsResult<()> {
        let old = components(old_path)?;
        let new = components(new_path)?;
        if old.is_empty() || new.is_empty() {
            return Err(VfsError::InvalidArgument);
        }
        self.with_mounted(|mounted| {
            let source_is_dir = matches!(mounted.root.lookup(&old)?, Node::Dir(_));
            if old == new {
                return Ok(());
            }
            if new.starts_with(&old) {
                return Err(VfsError::InvalidArgument);
            }
            match mounted.root.lookup(&new) {
                Ok(Node::Dir(_)) if !source_is_dir => return Err(VfsError::IsDirectory),
                Ok(Node::Dir(children)) if !children.is_empty() => {
                    return Err(VfsError::DirectoryNotEmpty);
                }
                Ok(Node::File(_)) if source_is_dir => return Err(VfsError::NotDirectory),
                Ok(_) | Err(VfsError::NotFound) => {}
                Err(err) => return Err(err),
            }

            mounted.commit(self, |root| {
                let (children, name) = root.parent_dir_mut(&old)?;
                let node = children.remove(name).ok_or(VfsError::NotFound)?;
                let (children, name) = root.parent_dir_mut(&new)?;
                children.insert(String::from(name), node);
                Ok(())
            })?;

            // 已打开的文件跟随改名
            for handle in mounted.handles.values_mut() {
                if handle.path.starts_with(&old) {
                    let mut path = new.clone();
                    path.extend_from_slice(&handle.path[old.len()..]);
                    handle.path = path;
                }
            }
            Ok(())
        })
    }

    fn unlink(&self, path: &str) -> VfsResult<()> {
        let parts = components(path)?;
        self.with_mounted(|mounted| {
            if let Node::Dir(_) = mounted.root.lookup(&parts)? {
                return Err(VfsError::IsDirectory);
            }
            mounted.commit(self, |root| {
                let (children, name) = root.parent_dir_mut(&parts)?;
                children.remove(name);
                Ok(())
            })
        })
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
