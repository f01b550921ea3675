//! RouteBlueprint - Config Loader 输出
//!
//! 描述完整的路由配置：组件 (sink 组件、别名、格式化标签) 与定时路由。

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

use crate::{ContractError, TimerSpec, DEFAULT_RANDOM_HEADER};

/// Component that exists before any configuration is applied
pub const BUILTIN_LOG_COMPONENT: &str = "log";

/// 配置版本
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ConfigVersion {
    #[default]
    V1,
}

/// 完整的路由配置蓝图
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RouteBlueprint {
    /// 配置版本
    #[serde(default)]
    pub version: ConfigVersion,

    /// 组件定义列表 (按声明顺序注册)
    #[serde(default)]
    pub components: Vec<ComponentConfig>,

    /// 路由定义列表
    #[serde(default)]
    pub routes: Vec<RouteConfig>,
}

/// 组件配置
///
/// - 仅 `name`: 修改内置组件 (如 `log`) 的格式化标签
/// - `kind`: 新建组件
/// - `alias_of`: 复制已有组件并使用独立的格式化标签
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComponentConfig {
    /// 组件名 (即 `to` 端点的 scheme)
    pub name: String,

    /// 组件类型
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<ComponentType>,

    /// 别名来源
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alias_of: Option<String>,

    /// 格式化标签
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,

    /// 类型特定参数
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub params: HashMap<String, String>,
}

impl ComponentConfig {
    /// How this entry registers itself
    pub fn registration(&self) -> ComponentRegistration<'_> {
        match (&self.kind, &self.alias_of) {
            (Some(kind), None) => ComponentRegistration::Make(*kind),
            (None, Some(source)) => ComponentRegistration::Alias(source),
            (None, None) => ComponentRegistration::Existing,
            (Some(_), Some(_)) => ComponentRegistration::Conflicting,
        }
    }
}

/// Registration mode derived from a `ComponentConfig`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComponentRegistration<'a> {
    Existing,
    Make(ComponentType),
    Alias(&'a str),
    Conflicting,
}

/// 组件类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComponentType {
    /// 日志输出
    Log,
    /// 文件输出
    File,
}

/// 路由配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouteConfig {
    /// 路由 ID
    pub id: String,

    /// 触发端点 (e.g., "timer:js?period=1s")
    pub from: String,

    /// 常量消息体
    pub body: String,

    /// 随机值写入的 header 名
    #[serde(default = "default_header")]
    pub header: String,

    /// 随机数种子 (可选, 用于复现)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,

    /// 单个 sink 的分发超时 (毫秒)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dispatch_timeout_ms: Option<u64>,

    /// 输出端点, 按声明顺序分发
    pub to: Vec<String>,
}

fn default_header() -> String {
    DEFAULT_RANDOM_HEADER.to_string()
}

impl RouteConfig {
    /// Parse the `from` endpoint
    pub fn timer_spec(&self) -> Result<TimerSpec, ContractError> {
        self.from.parse()
    }

    pub fn dispatch_timeout(&self) -> Option<Duration> {
        self.dispatch_timeout_ms.map(Duration::from_millis)
    }
}

impl RouteBlueprint {
    /// Append another blueprint's components and routes
    pub fn merge(&mut self, other: RouteBlueprint) {
        self.components.extend(other.components);
        self.routes.extend(other.routes);
    }

    pub fn find_route(&self, id: &str) -> Option<&RouteConfig> {
        self.routes.iter().find(|route| route.id == id)
    }
}
