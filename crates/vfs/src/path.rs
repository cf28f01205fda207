//! 路径解析
//!
//! 纯字符串层面的路径处理，不访问任何驱动：
//!
//! - 绝对路径以 `/` 开头；相对路径在 [`resolve_path`] 中以当前工作目录为基准
//! - `.` 解析时跳过；`..` 弹出上一级，绝对路径不会越过根目录
//! - 连续的 `/` 与末尾的 `/` 被忽略

use alloc::format;
use alloc::string::String;
use alloc::vec::Vec;

/// 路径组件
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathComponent {
    /// 根目录 "/"
    Root,
    /// 当前目录 "."
    Current,
    /// 父目录 ".."
    Parent,
    /// 正常的文件名
    Normal(String),
}

/// 将路径字符串解析为组件列表
pub fn parse_path(path: &str) -> Vec<PathComponent> {
    let mut components = Vec::new();

    if path.starts_with('/') {
        components.push(PathComponent::Root);
    }

    for part in path.split('/').filter(|s| !s.is_empty()) {
        let component = match part {
            "." => PathComponent::Current,
            ".." => PathComponent::Parent,
            name => PathComponent::Normal(String::from(name)),
        };
        components.push(component);
    }

    components
}

/// 规范化路径（处理 ".." 和 "."）
///
/// 相对路径中无法消去的 `..` 会保留在结果开头。
pub fn normalize_path(path: &str) -> String {
    let mut stack: Vec<String> = Vec::new();
    let mut is_absolute = false;

    for component in parse_path(path) {
        match component {
            PathComponent::Root => is_absolute = true,
            PathComponent::Current => {}
            PathComponent::Parent => {
                if stack.last().is_some_and(|last| last != "..") {
                    stack.pop();
                } else if !is_absolute {
                    stack.push(String::from(".."));
                }
                // 绝对路径不能越过根目录
            }
            PathComponent::Normal(name) => stack.push(name),
        }
    }

    match (stack.is_empty(), is_absolute) {
        (true, true) => String::from("/"),
        (true, false) => String::from("."),
        (false, true) => format!("/{}", stack.join("/")),
        (false, false) => stack.join("/"),
    }
}

/// 以 `cwd` 为基准把 `path` 解析为规范化的绝对路径
///
/// `cwd` 必须是绝对路径；`path` 为绝对路径时忽略 `cwd`。
pub fn resolve_path(cwd: &str, path: &str) -> String {
    if path.starts_with('/') {
        normalize_path(path)
    } else {
        normalize_path(&format!("{cwd}/{path}"))
    }
}

/// 规范化绝对路径的父目录，`/` 的父目录是它自身
pub fn parent_path(path: &str) -> String {
    let normalized = normalize_path(path);
    match normalized.rfind('/') {
        Some(0) | None => String::from("/"),
        Some(pos) => String::from(&normalized[..pos]),
    }
}

/// 路径的最后一个组件，`/` 返回 `None`
pub fn file_name(path: &str) -> Option<&str> {
    path.rsplit('/').find(|s| !s.is_empty())
}

/// 路径的组件数量，`/` 为 0
pub fn path_depth(path: &str) -> usize {
    path.split('/').filter(|s| !s.is_empty()).count()
}
