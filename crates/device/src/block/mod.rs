//! 块设备模块
//!
//! 包含块设备接口和 `ioctl` 操作码

mod ram_disk;

pub use ram_disk::RamDisk;

/// 块设备 `ioctl` 操作
///
/// 数值编码与运行时暴露给脚本的块设备协议一致，见 [`IoctlOp::code`]。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IoctlOp {
    /// 初始化设备 (1)
    Init,
    /// 关闭设备 (2)
    Shutdown,
    /// 同步缓存 (3)
    Sync,
    /// 查询总块数 (4)
    BlockCount,
    /// 查询块大小 (5)
    BlockSize,
    /// 擦除指定块 (6)
    EraseBlock(usize),
}

impl IoctlOp {
    /// 从数值操作码和参数构造
    ///
    /// 未知操作码返回 `None`
    pub fn from_raw(op: u32, arg: usize) -> Option<Self> {
        match op {
            1 => Some(IoctlOp::Init),
            2 => Some(IoctlOp::Shutdown),
            3 => Some(IoctlOp::Sync),
            4 => Some(IoctlOp::BlockCount),
            5 => Some(IoctlOp::BlockSize),
            6 => Some(IoctlOp::EraseBlock(arg)),
            _ => None,
        }
    }

    /// 数值操作码
    pub fn code(&self) -> u32 {
        match self {
            IoctlOp::Init => 1,
            IoctlOp::Shutdown => 2,
            IoctlOp::Sync => 3,
            IoctlOp::BlockCount => 4,
            IoctlOp::BlockSize => 5,
            IoctlOp::EraseBlock(_) => 6,
        }
    }
}

/// 块设备接口
///
/// 所有方法都以 `&self` 调用，设备自行保证内部可变状态的互斥。
pub trait BlockDevice: Send + Sync {
    /// 读取块设备数据
    /// # 参数：
    /// * `block_id` - 块号
    /// * `buf` - 用于存储读取数据的缓冲区
    /// * `offset` - 块内字节偏移
    /// # 返回值：
    /// 如果读取成功则返回 true，否则返回 false
    fn read(&self, block_id: usize, buf: &mut [u8], offset: usize) -> bool;

    /// 写入块设备数据
    /// # 参数：
    /// * `block_id` - 块号
    /// * `buf` - 包含要写入数据的缓冲区
    /// * `offset` - 块内字节偏移
    /// # 返回值：
    /// 如果写入成功则返回 true，否则返回 false
    fn write(&self, block_id: usize, buf: &[u8], offset: usize) -> bool;

    /// 设备控制
    /// # 返回值：
    /// 非负数表示成功（查询类操作返回查询结果），负数表示失败
    fn ioctl(&self, op: IoctlOp) -> isize;

    /// 获取块大小（字节），设备报告失败时返回 `None`
    fn block_size(&self) -> Option<usize> {
        usize::try_from(self.ioctl(IoctlOp::BlockSize))
            .ok()
            .filter(|&size| size > 0)
    }

    /// 获取总块数，设备报告失败时返回 `None`
    fn block_count(&self) -> Option<usize> {
        usize::try_from(self.ioctl(IoctlOp::BlockCount)).ok()
    }

    /// 擦除一个块
    fn erase_block(&self, block_id: usize) -> bool {
        self.ioctl(IoctlOp::EraseBlock(block_id)) >= 0
    }
}
