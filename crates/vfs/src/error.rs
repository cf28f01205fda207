//! VFS 错误类型
//!
//! 所有失败都以 [`VfsError`] 表示，可通过 [`VfsError::to_errno()`] 转换为 POSIX errno，
//! 交给脚本层构造 `SystemError`。

use core::fmt;

/// VFS 操作结果
pub type VfsResult<T> = Result<T, VfsError>;

/// VFS 错误类型
///
/// 各错误码对应标准 POSIX errno 值。后端驱动的错误原样向上传递，
/// 门面层不做二次包装。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VfsError {
    // 文件/目录相关
    /// 文件不存在 (-ENOENT)
    NotFound,
    /// 文件已存在 (-EEXIST)
    AlreadyExists,
    /// 不是目录 (-ENOTDIR)
    NotDirectory,
    /// 是目录 (-EISDIR)
    IsDirectory,
    /// 目录非空 (-ENOTEMPTY)
    DirectoryNotEmpty,

    // 文件描述符相关
    /// 无效的文件描述符 (-EBADF)
    BadFileDescriptor,
    /// 打开的文件过多 (-EMFILE)
    TooManyOpenFiles,

    // 参数相关
    /// 无效参数 (-EINVAL)
    InvalidArgument,
    /// 文件名过长 (-ENAMETOOLONG)
    NameTooLong,

    // 文件系统/设备相关
    /// 设备空间不足 (-ENOSPC)
    NoSpace,
    /// I/O 错误 (-EIO)
    IoError,
    /// 设备不存在或未挂载 (-ENXIO)
    NoDevice,
    /// 介质内容损坏或未格式化 (-EILSEQ)
    Corrupted,
    /// 跨挂载点操作 (-EXDEV)
    CrossDevice,

    // 其他
    /// 操作不支持 (-ENOTSUP)
    NotSupported,
}

impl VfsError {
    /// 转换为系统调用错误码（负数）
    pub fn to_errno(&self) -> isize {
        match self {
            VfsError::NotFound => -2,
            VfsError::IoError => -5,
            VfsError::NoDevice => -6,
            VfsError::BadFileDescriptor => -9,
            VfsError::AlreadyExists => -17,
            VfsError::CrossDevice => -18,
            VfsError::NotDirectory => -20,
            VfsError::IsDirectory => -21,
            VfsError::InvalidArgument => -22,
            VfsError::TooManyOpenFiles => -24,
            VfsError::NoSpace => -28,
            VfsError::NameTooLong => -36,
            VfsError::DirectoryNotEmpty => -39,
            VfsError::Corrupted => -84,
            VfsError::NotSupported => -95,
        }
    }

    /// 从 errno 还原错误（正负号均可），未知错误码视为 I/O 错误
    pub fn from_errno(errno: isize) -> Self {
        match errno.unsigned_abs() {
            2 => VfsError::NotFound,
            6 => VfsError::NoDevice,
            9 => VfsError::BadFileDescriptor,
            17 => VfsError::AlreadyExists,
            18 => VfsError::CrossDevice,
            20 => VfsError::NotDirectory,
            21 => VfsError::IsDirectory,
            22 => VfsError::InvalidArgument,
            24 => VfsError::TooManyOpenFiles,
            28 => VfsError::NoSpace,
            36 => VfsError::NameTooLong,
            39 => VfsError::DirectoryNotEmpty,
            84 => VfsError::Corrupted,
            95 => VfsError::NotSupported,
            _ => VfsError::IoError,
        }
    }

    /// 与 libc `strerror` 一致的错误描述
    pub fn message(&self) -> &'static str {
        match self {
            VfsError::NotFound => "No such file or directory",
            VfsError::AlreadyExists => "File exists",
            VfsError::NotDirectory => "Not a directory",
            VfsError::IsDirectory => "Is a directory",
            VfsError::DirectoryNotEmpty => "Directory not empty",
            VfsError::BadFileDescriptor => "Bad file descriptor",
            VfsError::TooManyOpenFiles => "Too many open files",
            VfsError::InvalidArgument => "Invalid argument",
            VfsError::NameTooLong => "File name too long",
            VfsError::NoSpace => "No space left on device",
            VfsError::IoError => "Input/output error",
            VfsError::NoDevice => "No such device or address",
            VfsError::Corrupted => "Invalid or incomplete multibyte or wide character",
            VfsError::CrossDevice => "Invalid cross-device link",
            VfsError::NotSupported => "Operation not supported",
        }
    }
}

impl fmt::Display for VfsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

impl core::error::Error for VfsError {}
