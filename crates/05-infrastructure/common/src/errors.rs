//! 错误类型定义

use thiserror::Error;

/// 配置错误类型
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("配置文件不存在: {path}")]
    FileNotFound { path: String },

    #[error("配置文件读取失败: {source}")]
    FileReadError {
        #[from]
        source: std::io::Error,
    },

    #[error("配置解析失败: {source}")]
    ParseError {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("配置值无效: {key}, 原因: {message}")]
    InvalidValue { key: String, message: String },
}

impl ConfigError {
    /// 创建解析错误
    pub fn parse_error(source: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::ParseError {
            source: Box::new(source),
        }
    }

    /// 创建配置值无效错误
    pub fn invalid_value(key: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidValue {
            key: key.into(),
            message: message.into(),
        }
    }
}

/// 未找到的对象种类
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Missing {
    /// 能力类型没有任何实现绑定
    Binding,
    /// 实例仓库中没有该类型的实例，且当前不允许创建
    Instance,
}

impl std::fmt::Display for Missing {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Missing::Binding => f.write_str("没有可用的实现绑定"),
            Missing::Instance => f.write_str("没有已实现的实例"),
        }
    }
}

/// 依赖注入错误类型
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DependencyError {
    #[error("组件未找到: {type_name} ({missing})")]
    NotFound { type_name: String, missing: Missing },

    #[error("能力 {capability} 存在 {candidates} 个实现, 需要唯一实现或使用限定符消除歧义")]
    Ambiguous { capability: String, candidates: usize },

    #[error("循环依赖检测到: {type_name}, 构造链: {chain}")]
    CircularDependency { type_name: String, chain: String },

    #[error("组件创建失败: {type_name}, 原因: {message}")]
    ConstructionFailure { type_name: String, message: String },

    #[error("类型 {type_name} 存在 {count} 个命名实例, 名称 {name} 不匹配, 需要使用限定符")]
    Conflict {
        type_name: String,
        name: String,
        count: usize,
    },
}

impl DependencyError {
    /// 创建缺少绑定错误
    pub fn missing_binding(type_name: impl Into<String>) -> Self {
        Self::NotFound {
            type_name: type_name.into(),
            missing: Missing::Binding,
        }
    }

    /// 创建缺少实例错误
    pub fn missing_instance(type_name: impl Into<String>) -> Self {
        Self::NotFound {
            type_name: type_name.into(),
            missing: Missing::Instance,
        }
    }

    /// 创建组件创建失败错误
    pub fn construction_failure(type_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ConstructionFailure {
            type_name: type_name.into(),
            message: message.into(),
        }
    }

    /// 仅当缺少的是实例时才值得在工厂队列中重试
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::NotFound {
                missing: Missing::Instance,
                ..
            }
        )
    }
}

/// 组件错误类型
#[derive(Error, Debug)]
pub enum ComponentError {
    #[error("组件扫描失败: {message}")]
    ScanError { message: String },
}

impl ComponentError {
    /// 创建扫描错误
    pub fn scan_error(message: impl Into<String>) -> Self {
        Self::ScanError {
            message: message.into(),
        }
    }
}

/// 基础设施错误类型
///
/// 容器构建与查找的对外边界只暴露这一种错误, 原始原因保存在 `source` 中。
#[derive(Error, Debug)]
pub enum InfrastructureError {
    #[error("容器初始化失败: {source}")]
    Initialization { source: DependencyError },

    #[error("组件查找失败: {source}")]
    Lookup { source: DependencyError },

    #[error("组件扫描失败: {source}")]
    Scan {
        #[from]
        source: ComponentError,
    },

    #[error("配置错误: {source}")]
    Config {
        #[from]
        source: ConfigError,
    },

    #[error("日志初始化失败: {message}")]
    Logging { message: String },
}

impl InfrastructureError {
    /// 获取被包装的依赖注入错误
    pub fn dependency_error(&self) -> Option<&DependencyError> {
        match self {
            Self::Initialization { source } | Self::Lookup { source } => Some(source),
            _ => None,
        }
    }
}

/// 结果类型别名
pub type ConfigResult<T> = Result<T, ConfigError>;
pub type DependencyResult<T> = Result<T, DependencyError>;
pub type InfrastructureResult<T> = Result<T, InfrastructureError>;
