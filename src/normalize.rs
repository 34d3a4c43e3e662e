//! 输入规范化：校验必填项、补默认值，产出 `GenerationRequest`
//! 凭据只在这里解析一次，随后显式注入生成客户端。

use crate::{config::DEFAULT_PORT, error::HuggableError};

/// 命令行/环境合并后的原始输入
#[derive(Debug, Default, Clone)]
pub(crate) struct RawInput {
    pub(crate) name: Option<String>,
    pub(crate) description: Option<String>,
    pub(crate) style: Option<String>,
    pub(crate) port: Option<u16>,
    pub(crate) run: Option<bool>,
    pub(crate) api_key: Option<String>,
}

/// 一次生成所需的用户输入
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct GenerationRequest {
    pub(crate) app_name: String,
    pub(crate) description: String,
    /// 空串表示未指定，由提示词使用默认风格
    pub(crate) style: String,
}

#[derive(Debug, Clone)]
pub(crate) struct Invocation {
    pub(crate) request: GenerationRequest,
    pub(crate) port: u16,
    pub(crate) run: bool,
    /// 为空时由生成客户端报告认证错误
    pub(crate) api_key: Option<String>,
}

fn required(value: Option<String>, field: &'static str) -> Result<String, HuggableError> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or(HuggableError::MissingArgument { field })
}

pub(crate) fn normalize(raw: RawInput) -> Result<Invocation, HuggableError> {
    let app_name = required(raw.name, "name")?;
    let description = required(raw.description, "description")?;
    let style = raw.style.map(|s| s.trim().to_string()).unwrap_or_default();
    let api_key = raw.api_key.map(|k| k.trim().to_string()).filter(|k| !k.is_empty());
    Ok(Invocation {
        request: GenerationRequest { app_name, description, style },
        port: raw.port.unwrap_or(DEFAULT_PORT),
        run: raw.run.unwrap_or(true),
        api_key,
    })
}
