//! BlockFs - 块设备上的目录树文件系统
//!
//! 整棵目录树序列化后存放在超级块之后，挂载时整体读入内存。
//! 适合测试以及没有 littlefs/FAT 驱动的小容量设备。

mod blockfs;
mod image;
mod node;

pub use blockfs::{BlockFs, FS_TYPE};
pub use image::{MAGIC, SUPERBLOCK_LEN, Superblock, VERSION};
