//! 内存模拟块设备

use super::{BlockDevice, IoctlOp};
use alloc::sync::Arc;
use alloc::vec;
use alloc::vec::Vec;
use sync::SpinLock;

/// 默认块大小
pub const RAM_DISK_BLOCK_SIZE: usize = 4096;

/// 默认块数
pub const RAM_DISK_BLOCK_COUNT: usize = 16;

/// 内存模拟的块设备
///
/// 用于测试和开发；擦除后的块内容为 0。
pub struct RamDisk {
    /// 存储数据
    data: SpinLock<Vec<u8>>,

    /// 块大小
    block_size: usize,
}

impl RamDisk {
    /// 创建全零的内存磁盘
    pub fn new(block_size: usize, block_count: usize) -> Arc<Self> {
        Arc::new(Self {
            data: SpinLock::new(vec![0u8; block_size * block_count]),
            block_size,
        })
    }

    /// 使用默认几何信息（16 块 × 4096 字节）创建
    pub fn default_geometry() -> Arc<Self> {
        Self::new(RAM_DISK_BLOCK_SIZE, RAM_DISK_BLOCK_COUNT)
    }

    /// 从字节数组创建，末尾不足一块的部分会被丢弃
    ///
    /// `block_size` 必须非零
    pub fn from_bytes(mut data: Vec<u8>, block_size: usize) -> Arc<Self> {
        data.truncate(data.len() - data.len() % block_size);
        Arc::new(Self {
            data: SpinLock::new(data),
            block_size,
        })
    }

    /// 获取原始数据（用于调试）
    pub fn raw_data(&self) -> Vec<u8> {
        self.data.lock().clone()
    }

    /// 计算块内区间在整个镜像中的范围，越界时返回 `None`
    fn span(&self, block_id: usize, offset: usize, len: usize, total: usize) -> Option<(usize, usize)> {
        if offset.checked_add(len)? > self.block_size {
            return None;
        }
        let start = block_id.checked_mul(self.block_size)?.checked_add(offset)?;
        let end = start + len;
        (end <= total).then_some((start, end))
    }
}

impl BlockDevice for RamDisk {
    fn read(&self, block_id: usize, buf: &mut [u8], offset: usize) -> bool {
        let data = self.data.lock();
        match self.span(block_id, offset, buf.len(), data.len()) {
            Some((start, end)) => {
                buf.copy_from_slice(&data[start..end]);
                true
            }
            None => false,
        }
    }

    fn write(&self, block_id: usize, buf: &[u8], offset: usize) -> bool {
        let mut data = self.data.lock();
        let total = data.len();
        match self.span(block_id, offset, buf.len(), total) {
            Some((start, end)) => {
                data[start..end].copy_from_slice(buf);
                true
            }
            None => false,
        }
    }

    fn ioctl(&self, op: IoctlOp) -> isize {
        match op {
            // 内存设备无需初始化/关闭/同步
            IoctlOp::Init | IoctlOp::Shutdown | IoctlOp::Sync => 0,
            IoctlOp::BlockCount => (self.data.lock().len() / self.block_size) as isize,
            IoctlOp::BlockSize => self.block_size as isize,
            IoctlOp::EraseBlock(block_id) => {
                let mut data = self.data.lock();
                let total = data.len();
                match self.span(block_id, 0, self.block_size, total) {
                    Some((start, end)) => {
                        data[start..end].fill(0);
                        0
                    }
                    None => -1,
                }
            }
        }
    }
}
