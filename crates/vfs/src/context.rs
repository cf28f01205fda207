//! VFS 门面
//!
//! [`VfsContext`] 持有驱动注册表、挂载表、文件描述符表和当前工作目录，
//! 对外提供脚本层使用的全部文件操作。所有路径都先按当前工作目录规范化，
//! 再经挂载表路由到对应驱动。

use alloc::string::String;
use alloc::sync::Arc;
use alloc::vec;
use alloc::vec::Vec;

use device::BlockDevice;

use crate::config::{DEFAULT_FILE_MODE, VfsConfig};
use crate::path::{parent_path, resolve_path};
use crate::{
    DriverFactory, DriverRegistry, FDTable, MountPoint, MountTable, OpenFile, OpenFlags, Stat,
    VfsError, VfsResult,
};

/// VFS 上下文
#[derive(Debug)]
pub struct VfsContext {
    registry: DriverRegistry,
    mounts: MountTable,
    fd_table: FDTable,
    cwd: String,
}

impl Default for VfsContext {
    fn default() -> Self {
        Self::new()
    }
}

impl VfsContext {
    /// 使用默认配置创建上下文
    pub fn new() -> Self {
        Self::with_config(VfsConfig::default())
    }

    /// 使用指定配置创建上下文
    pub fn with_config(config: VfsConfig) -> Self {
        Self {
            registry: DriverRegistry::new(),
            mounts: MountTable::new(),
            fd_table: FDTable::new(config.max_fds),
            cwd: String::from("/"),
        }
    }

    /// 注册文件系统类型
    pub fn register(&mut self, fs_type: &str, factory: DriverFactory) {
        log::info!("vfs: register fs type '{}'", fs_type);
        self.registry.register(fs_type, factory);
    }

    /// 注销文件系统类型，已挂载的实例不受影响
    pub fn unregister(&mut self, fs_type: &str) -> VfsResult<()> {
        self.registry.unregister(fs_type)?;
        log::info!("vfs: unregister fs type '{}'", fs_type);
        Ok(())
    }

    /// 在设备上创建指定类型的空文件系统，不挂载
    pub fn mkfs(&self, device: Arc<dyn BlockDevice>, fs_type: &str) -> VfsResult<()> {
        let driver = self.registry.create(fs_type, device)?;
        driver.mkfs()?;
        log::info!("vfs: mkfs '{}' done", fs_type);
        Ok(())
    }

    /// 挂载设备到 `path`
    ///
    /// 除根目录外，挂载路径的父目录必须已存在且为目录。`auto_format` 为真时，
    /// 首次挂载失败会格式化设备并重试一次。
    pub fn mount(
        &mut self,
        path: &str,
        device: Arc<dyn BlockDevice>,
        fs_type: &str,
        auto_format: bool,
    ) -> VfsResult<()> {
        let path = self.resolve(path);
        if path != "/" {
            let parent = parent_path(&path);
            match self.stat(&parent) {
                Ok(stat) if stat.is_dir() => {}
                _ => return Err(VfsError::NotFound),
            }
        }
        if self.mounts.contains(&path) {
            return Err(VfsError::AlreadyExists);
        }

        let driver = self.registry.create(fs_type, device)?;
        if let Err(err) = driver.mount() {
            if !auto_format {
                return Err(err);
            }
            log::warn!("vfs: mount '{}' failed ({}), formatting", path, err);
            driver.mkfs()?;
            driver.mount()?;
        }

        self.mounts.insert(MountPoint::new(&path, fs_type, driver))?;
        log::info!("vfs: mounted '{}' at {}", fs_type, path);
        Ok(())
    }

    /// 卸载 `path` 上的文件系统
    ///
    /// 挂载点总会被移除；驱动卸载失败时错误在移除之后返回。
    pub fn unmount(&mut self, path: &str) -> VfsResult<()> {
        let path = self.resolve(path);
        let mount = self.mounts.remove(&path)?;
        log::info!("vfs: unmounted {}", path);
        mount.driver.unmount().inspect_err(|err| {
            log::warn!("vfs: driver unmount of {} failed: {}", path, err);
        })
    }

    /// 查找负责 `path` 的挂载点，返回挂载点与剩余路径
    pub fn lookup(&self, path: &str) -> VfsResult<(&MountPoint, String)> {
        let path = self.resolve(path);
        let (mount, rest) = self.mounts.find_mount(&path)?;
        log::debug!("vfs: {} -> {} ({})", path, mount.mount_path, rest);
        Ok((mount, rest))
    }

    /// 按查找顺序遍历所有挂载点
    pub fn mounts(&self) -> impl Iterator<Item = &MountPoint> {
        self.mounts.iter()
    }

    /// 当前工作目录
    pub fn cwd(&self) -> &str {
        &self.cwd
    }

    /// 切换工作目录，目标不存在或不是目录时返回 `NotFound`
    pub fn chdir(&mut self, path: &str) -> VfsResult<()> {
        let path = self.resolve(path);
        match self.stat(&path) {
            Ok(stat) if stat.is_dir() => {
                self.cwd = path;
                Ok(())
            }
            _ => Err(VfsError::NotFound),
        }
    }

    /// 按模式字符串打开文件，返回文件描述符
    pub fn open(&mut self, path: &str, mode: &str, perm: u32) -> VfsResult<usize> {
        let flags = OpenFlags::from_mode(mode)?;
        let (mount, rest) = self.lookup(path)?;
        let driver = mount.driver.clone();
        let mount_path = mount.mount_path.clone();

        let file_id = driver.open(&rest, flags, perm)?;
        let file = OpenFile {
            file_id,
            driver: driver.clone(),
            mount_path,
        };
        self.fd_table.alloc(file).inspect_err(|_| {
            if let Err(err) = driver.close(file_id) {
                log::warn!("vfs: close after failed fd alloc: {}", err);
            }
        })
    }

    /// 以 `"r"` 模式和默认权限打开文件
    pub fn open_default(&mut self, path: &str) -> VfsResult<usize> {
        self.open(path, "r", DEFAULT_FILE_MODE)
    }

    /// 从当前位置读取，填充整个缓冲区或直到文件结束
    pub fn read(&self, fd: usize, buf: &mut [u8]) -> VfsResult<usize> {
        let file = self.fd_table.get(fd)?;
        file.driver.read(file.file_id, buf, None)
    }

    /// 向当前位置写入整个缓冲区
    pub fn write(&self, fd: usize, buf: &[u8]) -> VfsResult<usize> {
        let file = self.fd_table.get(fd)?;
        file.driver.write(file.file_id, buf, None)
    }

    /// 读取到 `buf[offset..offset + length]`，`position` 为 `Some` 时先定位
    pub fn read_with(
        &self,
        fd: usize,
        buf: &mut [u8],
        offset: usize,
        length: usize,
        position: Option<usize>,
    ) -> VfsResult<usize> {
        let file = self.fd_table.get(fd)?;
        let end = window_end(buf.len(), offset, length)?;
        file.driver.read(file.file_id, &mut buf[offset..end], position)
    }

    /// 写出 `buf[offset..offset + length]`，`position` 为 `Some` 时先定位
    pub fn write_with(
        &self,
        fd: usize,
        buf: &[u8],
        offset: usize,
        length: usize,
        position: Option<usize>,
    ) -> VfsResult<usize> {
        let file = self.fd_table.get(fd)?;
        let end = window_end(buf.len(), offset, length)?;
        file.driver.write(file.file_id, &buf[offset..end], position)
    }

    /// 关闭文件描述符
    ///
    /// 槽位先被释放，驱动关闭失败的错误随后返回。
    pub fn close(&mut self, fd: usize) -> VfsResult<()> {
        let file = self.fd_table.close(fd)?;
        file.driver.close(file.file_id).inspect_err(|err| {
            log::warn!("vfs: driver close of fd {} failed: {}", fd, err);
        })
    }

    /// 当前打开的文件描述符数量
    pub fn open_count(&self) -> usize {
        self.fd_table.open_count()
    }

    /// 获取文件状态
    pub fn stat(&self, path: &str) -> VfsResult<Stat> {
        let (mount, rest) = self.lookup(path)?;
        mount.driver.stat(&rest)
    }

    /// 删除文件
    pub fn unlink(&self, path: &str) -> VfsResult<()> {
        let (mount, rest) = self.lookup(path)?;
        mount.driver.unlink(&rest)
    }

    /// 创建目录
    pub fn mkdir(&self, path: &str) -> VfsResult<()> {
        let (mount, rest) = self.lookup(path)?;
        mount.driver.mkdir(&rest)
    }

    /// 删除空目录
    pub fn rmdir(&self, path: &str) -> VfsResult<()> {
        let (mount, rest) = self.lookup(path)?;
        mount.driver.rmdir(&rest)
    }

    /// 重命名，两个路径必须位于同一挂载点
    pub fn rename(&self, old_path: &str, new_path: &str) -> VfsResult<()> {
        let (old_mount, old_rest) = self.lookup(old_path)?;
        let (new_mount, new_rest) = self.lookup(new_path)?;
        if old_mount.mount_path != new_mount.mount_path {
            return Err(VfsError::CrossDevice);
        }
        old_mount.driver.rename(&old_rest, &new_rest)
    }

    /// 列出目录，并补上直接挂在该目录下的挂载点名称
    pub fn readdir(&self, path: &str) -> VfsResult<Vec<String>> {
        let (mount, rest) = self.lookup(path)?;
        let mut entries = mount.driver.readdir(&rest)?;
        for child in self.mounts.children_of(&self.resolve(path)) {
            if !entries.contains(&child) {
                entries.push(child);
            }
        }
        Ok(entries)
    }

    /// 路径是否存在，任何错误都视为不存在
    pub fn exists(&self, path: &str) -> bool {
        self.stat(path).is_ok()
    }

    /// 删除文件或空目录
    pub fn rm(&self, path: &str) -> VfsResult<()> {
        if self.stat(path)?.is_file() {
            self.unlink(path)
        } else {
            self.rmdir(path)
        }
    }

    /// 读取整个文件
    ///
    /// 读取失败时文件同样会被关闭。
    pub fn read_file(&mut self, path: &str) -> VfsResult<Vec<u8>> {
        let fd = self.open(path, "r", DEFAULT_FILE_MODE)?;
        let data = self.read_to_end(fd, path);
        let closed = self.close(fd);
        let data = data?;
        closed?;
        Ok(data)
    }

    /// 以 `"w"` 模式写入整个文件
    pub fn write_file(&mut self, path: &str, data: &[u8]) -> VfsResult<()> {
        let fd = self.open(path, "w", DEFAULT_FILE_MODE)?;
        let written = self.write_all(fd, data);
        let closed = self.close(fd);
        written?;
        closed
    }

    fn read_to_end(&self, fd: usize, path: &str) -> VfsResult<Vec<u8>> {
        let size = self.stat(path)?.size;
        let mut buf = vec![0u8; size];
        let mut filled = 0;
        while filled < size {
            let n = self.read(fd, &mut buf[filled..])?;
            if n == 0 {
                break;
            }
            filled += n;
        }
        buf.truncate(filled);
        Ok(buf)
    }

    fn write_all(&self, fd: usize, mut data: &[u8]) -> VfsResult<()> {
        while !data.is_empty() {
            let n = self.write(fd, data)?;
            if n == 0 {
                return Err(VfsError::IoError);
            }
            data = &data[n..];
        }
        Ok(())
    }

    fn resolve(&self, path: &str) -> String {
        resolve_path(&self.cwd, path)
    }
}

/// 校验 `offset + length` 不越过缓冲区，返回窗口末尾
fn window_end(len: usize, offset: usize, length: usize) -> VfsResult<usize> {
    offset
        .checked_add(length)
        .filter(|&end| end <= len)
        .ok_or(VfsError::InvalidArgument)
}
