//! 配置模块，负责加载 JSON 格式的模型配置以及编译器配置

use crate::schema::{AssociationKind, AttributeType};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// 配置错误
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("配置文件不存在: {}", .0.display())]
    NotFound(PathBuf),

    #[error("无法读取配置文件 {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("无法解析JSON配置文件 {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("关联 {model}.{association} 指向未知模型 '{target}'")]
    UnknownTarget {
        model: String,
        association: String,
        target: String,
    },

    #[error("关联 {model}.{association} 缺少 target，且未声明为 polymorphic")]
    MissingTarget { model: String, association: String },

    #[error("联合操作符 {model}.{operator} 引用了未知属性 '{attribute}'")]
    UnknownUnionMember {
        model: String,
        operator: String,
        attribute: String,
    },
}

/// 单个关联的配置
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AssociationConfig {
    /// 目标模型名；多态关联可以省略
    #[serde(default)]
    pub target: Option<String>,
    #[serde(default)]
    pub kind: AssociationKind,
    #[serde(default)]
    pub polymorphic: bool,
}

/// 单个模型的配置
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModelConfig {
    /// 属性名到值类型的映射
    #[serde(default)]
    pub attributes: HashMap<String, AttributeType>,
    #[serde(default)]
    pub associations: HashMap<String, AssociationConfig>,
    /// 联合操作符名到属性名列表的映射，例如 `os -> [os_name, os_flavor]`
    #[serde(default)]
    pub union_operators: HashMap<String, Vec<String>>,
}

/// 模型配置结构
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemaConfig {
    /// 模型名到模型配置的映射
    pub models: HashMap<String, ModelConfig>,
}

impl SchemaConfig {
    /// 从JSON文件加载模型配置
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path_ref = path.as_ref();

        // 检查文件是否存在
        if !path_ref.exists() {
            return Err(ConfigError::NotFound(path_ref.to_path_buf()));
        }

        let content = fs::read_to_string(path_ref).map_err(|source| ConfigError::Read {
            path: path_ref.to_path_buf(),
            source,
        })?;

        serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path_ref.to_path_buf(),
            source,
        })
    }
}

fn attributes(pairs: &[(&str, AttributeType)]) -> HashMap<String, AttributeType> {
    pairs.iter().map(|(name, ty)| (name.to_string(), *ty)).collect()
}

fn association(target: &str, kind: AssociationKind) -> AssociationConfig {
    AssociationConfig {
        target: Some(target.to_string()),
        kind,
        polymorphic: false,
    }
}

impl Default for SchemaConfig {
    /// 内置的默认模型（用于测试或 fallback）
    fn default() -> Self {
        use AssociationKind::*;
        use AttributeType::*;

        let mut models = HashMap::new();

        models.insert(
            "Host".to_string(),
            ModelConfig {
                attributes: attributes(&[
                    ("name", String),
                    ("address", String),
                    ("os_name", String),
                    ("os_flavor", String),
                    ("purpose", String),
                    ("state", String),
                    ("tags", SetString),
                    ("created_at", Date),
                ]),
                associations: HashMap::from([
                    ("services".to_string(), association("Service", HasMany)),
                    ("vulns".to_string(), association("Vuln", HasMany)),
                    ("workspace".to_string(), association("Workspace", BelongsTo)),
                ]),
                union_operators: HashMap::from([(
                    "os".to_string(),
                    vec!["os_name".to_string(), "os_flavor".to_string()],
                )]),
            },
        );

        models.insert(
            "Service".to_string(),
            ModelConfig {
                attributes: attributes(&[
                    ("name", String),
                    ("port", Integer),
                    ("proto", String),
                    ("info", String),
                    ("state", String),
                ]),
                associations: HashMap::from([
                    ("host".to_string(), association("Host", BelongsTo)),
                    ("vulns".to_string(), association("Vuln", HasMany)),
                ]),
                union_operators: HashMap::new(),
            },
        );

        models.insert(
            "Vuln".to_string(),
            ModelConfig {
                attributes: attributes(&[
                    ("name", String),
                    ("info", String),
                    ("exploited", Boolean),
                    ("exploited_at", Date),
                    ("ports", SetInteger),
                ]),
                associations: HashMap::from([
                    ("host".to_string(), association("Host", BelongsTo)),
                    ("service".to_string(), association("Service", BelongsTo)),
                ]),
                union_operators: HashMap::new(),
            },
        );

        models.insert(
            "Workspace".to_string(),
            ModelConfig {
                attributes: attributes(&[("name", String), ("boundary", String)]),
                associations: HashMap::from([("hosts".to_string(), association("Host", HasMany))]),
                union_operators: HashMap::new(),
            },
        );

        models.insert(
            "Attachment".to_string(),
            ModelConfig {
                attributes: attributes(&[("name", String), ("size", Integer)]),
                associations: HashMap::from([
                    ("host".to_string(), association("Host", BelongsTo)),
                    (
                        "attachable".to_string(),
                        AssociationConfig {
                            target: None,
                            kind: BelongsTo,
                            polymorphic: true,
                        },
                    ),
                ]),
                union_operators: HashMap::new(),
            },
        );

        Self { models }
    }
}

/// 编译器配置
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompilerConfig {
    /// 允许的最大表达式嵌套深度
    pub max_depth: usize,
}

impl Default for CompilerConfig {
    fn default() -> Self {
        Self { max_depth: 64 }
    }
}
