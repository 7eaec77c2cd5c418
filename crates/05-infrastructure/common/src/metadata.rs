//! 元数据定义
//!
//! 提供类型身份信息, 用于绑定、实例仓库与错误消息

use std::any::TypeId;
use std::fmt;
use std::hash::{Hash, Hasher};

/// 类型信息
///
/// 相等性与哈希只依赖 [`TypeId`], 名称仅用于消歧和诊断。
#[derive(Debug, Clone, Copy)]
pub struct TypeInfo {
    /// 类型ID
    pub id: TypeId,
    /// 规范名称 (完整的 `type_name`)
    pub name: &'static str,
}

impl TypeInfo {
    /// 从类型获取类型信息, 支持 `dyn Trait` 等非定长类型
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: std::any::type_name::<T>(),
        }
    }

    /// 规范名称, 作为实例仓库中的默认实例名
    pub fn canonical_name(&self) -> &'static str {
        self.name
    }

    /// 获取简短的类型名称（不包含模块路径、泛型参数和 `dyn` 关键字）
    pub fn short_name(&self) -> &'static str {
        let path = self.path();
        path.rsplit("::").next().unwrap_or(path)
    }

    /// 模块路径, 用于按包扫描
    pub fn module_path(&self) -> &'static str {
        let path = self.path();
        match path.rfind("::") {
            Some(index) => &path[..index],
            None => "",
        }
    }

    /// 判断类型是否位于指定包（模块路径前缀）之下, 空包匹配所有类型
    pub fn is_in_package(&self, package: &str) -> bool {
        let package = package.trim().trim_end_matches("::");
        if package.is_empty() {
            return true;
        }
        let module = self.module_path();
        module == package
            || module
                .strip_prefix(package)
                .is_some_and(|rest| rest.starts_with("::"))
    }

    fn path(&self) -> &'static str {
        let name = self.name.strip_prefix("dyn ").unwrap_or(self.name);
        let end = name.find(['<', ' ', '+']).unwrap_or(name.len());
        &name[..end]
    }
}

impl PartialEq for TypeInfo {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for TypeInfo {}

impl Hash for TypeInfo {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Display for TypeInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}
