//! VFS 配置
//!
//! 嵌入式目标上描述符表按需增长，但必须有上界。

/// 默认最大文件描述符数量（含保留的 0/1/2）
pub const DEFAULT_MAX_FDS: usize = 64;

/// 保留的文件描述符数量（stdin/stdout/stderr 占位）
pub const RESERVED_FDS: usize = 3;

/// `open` 未指定权限位时使用的默认值
pub const DEFAULT_FILE_MODE: u32 = 0o666;

/// 单个路径组件的最大长度（字节）
pub const MAX_NAME_LEN: usize = 255;

/// VFS 运行时配置
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VfsConfig {
    /// 文件描述符表的最大槽位数（含保留槽位）
    ///
    /// 不大于 [`RESERVED_FDS`] 时任何 `open` 都会返回 `TooManyOpenFiles`。
    pub max_fds: usize,
}

impl VfsConfig {
    /// 以指定的描述符上限创建配置
    pub const fn new(max_fds: usize) -> Self {
        Self { max_fds }
    }
}

impl Default for VfsConfig {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_FDS)
    }
}
