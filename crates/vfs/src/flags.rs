//! 打开标志
//!
//! 脚本层使用 Node.js 风格的模式字符串（`"r"`、`"w+"`、`"ax"` ...），
//! 驱动层只接受位标志，[`OpenFlags::from_mode`] 负责两者之间的转换。

use core::str::FromStr;

use crate::{VfsError, VfsResult};

bitflags::bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    /// 驱动 `open` 使用的位标志
    pub struct OpenFlags: u32 {
        /// 可读
        const READ   = 1;
        /// 可写
        const WRITE  = 2;
        /// 不存在时创建
        const CREATE = 4;
        /// 追加写
        const APPEND = 8;
        /// 独占创建，文件已存在则失败
        const EXCL   = 16;
        /// 打开时截断
        const TRUNC  = 32;
    }
}

impl OpenFlags {
    /// 将模式字符串转换为标志
    ///
    /// 未识别的模式返回 [`VfsError::InvalidArgument`]。
    pub fn from_mode(mode: &str) -> VfsResult<Self> {
        let flags = match mode {
            "r" | "rs" | "sr" => OpenFlags::READ,
            "r+" | "rs+" | "sr+" => OpenFlags::READ | OpenFlags::WRITE,
            "w" => OpenFlags::WRITE | OpenFlags::CREATE | OpenFlags::TRUNC,
            "wx" | "xw" => OpenFlags::WRITE | OpenFlags::EXCL,
            "w+" => OpenFlags::WRITE | OpenFlags::READ | OpenFlags::TRUNC,
            "wx+" | "xw+" => OpenFlags::WRITE | OpenFlags::READ | OpenFlags::EXCL,
            "a" => OpenFlags::APPEND,
            "ax" | "xa" => OpenFlags::APPEND | OpenFlags::EXCL,
            "a+" => OpenFlags::APPEND | OpenFlags::READ,
            "ax+" | "xa+" => OpenFlags::APPEND | OpenFlags::READ | OpenFlags::EXCL,
            _ => return Err(VfsError::InvalidArgument),
        };
        Ok(flags)
    }

    /// 是否允许读
    pub fn readable(&self) -> bool {
        self.contains(OpenFlags::READ)
    }

    /// 是否允许写（追加写也算写）
    pub fn writable(&self) -> bool {
        self.intersects(OpenFlags::WRITE | OpenFlags::APPEND)
    }

    /// 文件不存在时是否应当创建
    pub fn creates(&self) -> bool {
        self.intersects(OpenFlags::CREATE | OpenFlags::EXCL)
    }
}

impl FromStr for OpenFlags {
    type Err = VfsError;

    fn from_str(mode: &str) -> Result<Self, Self::Err> {
        Self::from_mode(mode)
    }
}
