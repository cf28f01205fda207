//! 驱动注册表
//!
//! 文件系统类型名 → [`DriverFactory`]。

use alloc::collections::BTreeMap;
use alloc::string::String;
use alloc::sync::Arc;

use device::BlockDevice;

use crate::{DriverFactory, VfsDriver, VfsError, VfsResult};

/// 驱动注册表
#[derive(Default)]
pub struct DriverRegistry {
    factories: BTreeMap<String, DriverFactory>,
}

impl DriverRegistry {
    /// 创建空注册表
    pub fn new() -> Self {
        Self {
            factories: BTreeMap::new(),
        }
    }

    /// 注册驱动工厂，同名类型直接覆盖
    pub fn register(&mut self, fs_type: &str, factory: DriverFactory) {
        self.factories.insert(String::from(fs_type), factory);
    }

    /// 注销驱动类型，未注册时返回 `InvalidArgument`
    pub fn unregister(&mut self, fs_type: &str) -> VfsResult<()> {
        self.factories
            .remove(fs_type)
            .map(|_| ())
            .ok_or(VfsError::InvalidArgument)
    }

    /// 查找驱动工厂
    pub fn get(&self, fs_type: &str) -> Option<DriverFactory> {
        self.factories.get(fs_type).copied()
    }

    /// 在设备上构造指定类型的驱动实例
    pub fn create(
        &self,
        fs_type: &str,
        device: Arc<dyn BlockDevice>,
    ) -> VfsResult<Arc<dyn VfsDriver>> {
        let factory = self.get(fs_type).ok_or(VfsError::InvalidArgument)?;
        Ok(factory(device))
    }
}

impl core::fmt::Debug for DriverRegistry {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_list().entries(self.factories.keys()).finish()
    }
}
