//! 内存中的目录树

use alloc::collections::BTreeMap;
use alloc::string::String;
use alloc::vec::Vec;

use vfs::{Stat, VfsError, VfsResult};

/// 目录树节点
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    /// 普通文件及其内容
    File(Vec<u8>),
    /// 目录及其子节点（按名称排序）
    Dir(BTreeMap<String, Node>),
}

impl Node {
    /// 空目录
    pub fn empty_dir() -> Self {
        Node::Dir(BTreeMap::new())
    }

    /// 节点状态
    pub fn stat(&self) -> Stat {
        match self {
            Node::File(data) => Stat::file(data.len()),
            Node::Dir(_) => Stat::directory(),
        }
    }

    /// 按路径组件查找节点
    ///
    /// 中间组件是文件时返回 `NotDirectory`，不存在时返回 `NotFound`。
    pub fn lookup(&self, parts: &[String]) -> VfsResult<&Node> {
        let mut node = self;
        for name in parts {
            node = match node {
                Node::Dir(children) => children.get(name).ok_or(VfsError::NotFound)?,
                Node::File(_) => return Err(VfsError::NotDirectory),
            };
        }
        Ok(node)
    }

    /// 按路径组件查找可变节点
    pub fn lookup_mut(&mut self, parts: &[String]) -> VfsResult<&mut Node> {
        let mut node = self;
        for name in parts {
            node = match node {
                Node::Dir(children) => children.get_mut(name).ok_or(VfsError::NotFound)?,
                Node::File(_) => return Err(VfsError::NotDirectory),
            };
        }
        Ok(node)
    }

    /// 取得 `parts` 所在目录的子节点表和最后一个组件名
    ///
    /// `parts` 为空（根目录没有父目录）时返回 `InvalidArgument`。
    pub fn parent_dir_mut<'a>(
        &mut self,
        parts: &'a [String],
    ) -> VfsResult<(&mut BTreeMap<String, Node>, &'a str)> {
        let (name, parent) = parts.split_last().ok_or(VfsError::InvalidArgument)?;
        match self.lookup_mut(parent)? {
            Node::Dir(children) => Ok((children, name.as_str())),
            Node::File(_) => Err(VfsError::NotDirectory),
        }
    }
}
