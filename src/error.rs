//! 错误分类：
//! - 流水线各阶段返回 `HuggableError`
//! - 命令层用 anyhow 包装，`main` 根据分类决定退出码

use std::{io, path::PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub(crate) enum HuggableError {
    /// 必填参数缺失或为空
    #[error("缺少必填参数 --{field}")]
    MissingArgument { field: &'static str },
    /// 凭据缺失或被远端拒绝（不重试）
    #[error("认证失败: {0}（请设置 ANTHROPIC_API_KEY 或使用 --api-key）")]
    Authentication(String),
    /// 网络层失败：DNS/连接/TLS/超时
    #[error("网络请求失败: {0}")]
    Transport(String),
    /// 远端返回非成功状态或无法解析的内容
    #[error("生成服务返回错误: {0}")]
    Service(String),
    #[error("文件操作失败: {}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    /// 本地预览端口被占用；已写出的文件不受影响
    #[error("端口 {port} 已被占用（{addr}），请使用 --port 指定其它端口")]
    PortInUse { addr: String, port: u16 },
    #[error("渲染提示词模板失败: {0}")]
    Template(String),
}

impl HuggableError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        HuggableError::Io { path: path.into(), source }
    }

    /// 进程退出码：参数错误 2，其余 1
    pub(crate) fn exit_code(&self) -> i32 {
        match self {
            HuggableError::MissingArgument { .. } => 2,
            _ => 1,
        }
    }
}
