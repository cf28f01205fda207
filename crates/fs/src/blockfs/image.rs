//! 磁盘格式
//!
//! 第 0 块存放超级块，其后的块连续存放序列化的目录树。
//! 所有整数均为小端序。
//!
//! 目录树按先序编码：
//!
//! ```text
//! file := 1u8 len:u32 bytes[len]
//! dir  := 2u8 count:u32 (name_len:u8 name[name_len] node){count}
//! ```

use alloc::collections::BTreeMap;
use alloc::string::String;
use alloc::vec::Vec;

use vfs::{VfsError, VfsResult};

use super::node::Node;

/// 超级块魔数
pub const MAGIC: [u8; 4] = *b"BKFS";

/// 当前格式版本
pub const VERSION: u16 = 1;

/// 超级块编码后的长度
pub const SUPERBLOCK_LEN: usize = 18;

const TAG_FILE: u8 = 1;
const TAG_DIR: u8 = 2;

/// 超级块
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Superblock {
    /// 格式化时的块大小
    pub block_size: u32,
    /// 格式化时的总块数
    pub block_count: u32,
    /// 目录树镜像的字节数
    pub image_len: u32,
}

impl Superblock {
    /// 编码为字节
    pub fn encode(&self) -> [u8; SUPERBLOCK_LEN] {
        let mut out = [0u8; SUPERBLOCK_LEN];
        out[0..4].copy_from_slice(&MAGIC);
        out[4..6].copy_from_slice(&VERSION.to_le_bytes());
        out[6..10].copy_from_slice(&self.block_size.to_le_bytes());
        out[10..14].copy_from_slice(&self.block_count.to_le_bytes());
        out[14..18].copy_from_slice(&self.image_len.to_le_bytes());
        out
    }

    /// 从字节解码，魔数或版本不符时返回 `Corrupted`
    pub fn decode(bytes: &[u8]) -> VfsResult<Self> {
        let mut reader = Reader::new(bytes);
        if reader.take(4)? != MAGIC {
            return Err(VfsError::Corrupted);
        }
        let version = u16::from_le_bytes([reader.u8()?, reader.u8()?]);
        if version != VERSION {
            return Err(VfsError::Corrupted);
        }
        Ok(Self {
            block_size: reader.u32()?,
            block_count: reader.u32()?,
            image_len: reader.u32()?,
        })
    }
}

/// 序列化目录树
pub fn encode_tree(node: &Node) -> Vec<u8> {
    let mut out = Vec::new();
    encode_node(node, &mut out);
    out
}

fn encode_node(node: &Node, out: &mut Vec<u8>) {
    match node {
        Node::File(data) => {
            out.push(TAG_FILE);
            out.extend_from_slice(&(data.len() as u32).to_le_bytes());
            out.extend_from_slice(data);
        }
        Node::Dir(children) => {
            out.push(TAG_DIR);
            out.extend_from_slice(&(children.len() as u32).to_le_bytes());
            for (name, child) in children {
                // 名称长度在写入目录树前已限制为 255 字节
                out.push(name.len() as u8);
                out.extend_from_slice(name.as_bytes());
                encode_node(child, out);
            }
        }
    }
}

/// 反序列化目录树，任何格式错误或多余的字节都视为 `Corrupted`
pub fn decode_tree(bytes: &[u8]) -> VfsResult<Node> {
    let mut reader = Reader::new(bytes);
    let node = decode_node(&mut reader)?;
    if !reader.is_empty() {
        return Err(VfsError::Corrupted);
    }
    Ok(node)
}

fn decode_node(reader: &mut Reader<'_>) -> VfsResult<Node> {
    match reader.u8()? {
        TAG_FILE => {
            let len = reader.u32()? as usize;
            Ok(Node::File(reader.take(len)?.to_vec()))
        }
        TAG_DIR => {
            let count = reader.u32()?;
            let mut children = BTreeMap::new();
            for _ in 0..count {
                let name_len = reader.u8()? as usize;
                let name = core::str::from_utf8(reader.take(name_len)?)
                    .map_err(|_| VfsError::Corrupted)?;
                if name.is_empty() || name.contains('/') || name == "." || name == ".." {
                    return Err(VfsError::Corrupted);
                }
                let child = decode_node(reader)?;
                if children.insert(String::from(name), child).is_some() {
                    return Err(VfsError::Corrupted);
                }
            }
            Ok(Node::Dir(children))
        }
        _ => Err(VfsError::Corrupted),
    }
}

struct Reader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    fn take(&mut self, len: usize) -> VfsResult<&'a [u8]> {
        let end = self.pos.checked_add(len).ok_or(VfsError::Corrupted)?;
        let bytes = self.buf.get(self.pos..end).ok_or(VfsError::Corrupted)?;
        self.pos = end;
        Ok(bytes)
    }

    fn u8(&mut self) -> VfsResult<u8> {
        Ok(self.take(1)?[0])
    }

    fn u32(&mut self) -> VfsResult<u32> {
        let bytes = self.take(4)?;
        Ok(u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    fn is_empty(&self) -> bool {
        self.pos == self.buf.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;

    #[test]
    fn test_superblock_layout() {
        let sb = Superblock {
            block_size: 4096,
            block_count: 16,
            image_len: 5,
        };
        let bytes = sb.encode();
        assert_eq!(&bytes[0..4], b"BKFS");
        assert_eq!(&bytes[4..6], &[1, 0]);
        assert_eq!(&bytes[6..10], &[0, 16, 0, 0]);
        assert_eq!(Superblock::decode(&bytes), Ok(sb));
    }

    #[test]
    fn test_superblock_rejects_blank_and_short() {
        assert_eq!(Superblock::decode(&[0u8; 32]), Err(VfsError::Corrupted));
        assert_eq!(Superblock::decode(b"BKFS"), Err(VfsError::Corrupted));

        let mut bytes = Superblock {
            block_size: 512,
            block_count: 4,
            image_len: 5,
        }
        .encode();
        bytes[4] = 9;
        assert_eq!(Superblock::decode(&bytes), Err(VfsError::Corrupted));
    }

    #[test]
    fn test_empty_root_encoding() {
        assert_eq!(encode_tree(&Node::empty_dir()), vec![2, 0, 0, 0, 0]);
    }

    #[test]
    fn test_nested_tree() {
        let mut sub = BTreeMap::new();
        sub.insert(String::from("b.txt"), Node::File(b"hi".to_vec()));
        let mut root = BTreeMap::new();
        root.insert(String::from("a"), Node::Dir(sub));
        root.insert(String::from("c"), Node::File(Vec::new()));
        let root = Node::Dir(root);

        let bytes = encode_tree(&root);
        assert_eq!(decode_tree(&bytes), Ok(root));
    }

    #[test]
    fn test_decode_rejects_malformed() {
        // 未知标签
        assert_eq!(decode_tree(&[7]), Err(VfsError::Corrupted));
        // 文件长度越界
        assert_eq!(decode_tree(&[1, 9, 0, 0, 0, 1]), Err(VfsError::Corrupted));
        // 末尾多余字节
        assert_eq!(decode_tree(&[2, 0, 0, 0, 0, 0]), Err(VfsError::Corrupted));
        // 重复的目录项
        let dup = [2, 2, 0, 0, 0, 1, b'a', 2, 0, 0, 0, 0, 1, b'a', 2, 0, 0, 0, 0];
        assert_eq!(decode_tree(&dup), Err(VfsError::Corrupted));
        // 空名称
        assert_eq!(
            decode_tree(&[2, 1, 0, 0, 0, 0, 2, 0, 0, 0, 0]),
            Err(VfsError::Corrupted)
        );
    }
}
