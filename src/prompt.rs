//! 提示词构建：把名称、描述、风格填入内置模板（纯函数，无隐藏状态）

use tera::{Context as TContext, Tera};

use crate::{error::HuggableError, normalize::GenerationRequest};

const PROMPT_TEMPLATE: &str = include_str!("assets/prompt.tera");

/// 未指定风格时使用的默认设计方向
pub(crate) const DEFAULT_STYLE: &str =
    "modern and clean, soft gradients, rounded corners, subtle shadows and smooth, subtle motion";

/// 发送给生成服务的完整提示词
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Prompt(String);

impl Prompt {
    pub(crate) fn as_str(&self) -> &str {
        &self.0
    }
}

pub(crate) fn build_prompt(req: &GenerationRequest) -> Result<Prompt, HuggableError> {
    let mut ctx = TContext::new();
    ctx.insert("app_name", &req.app_name);
    ctx.insert("description", &req.description);
    ctx.insert("style", &req.style);
    ctx.insert("default_style", DEFAULT_STYLE);
    // 不做 HTML 转义：名称与描述需原样出现在提示词中
    let text = Tera::one_off(PROMPT_TEMPLATE, &ctx, false)
        .map_err(|e| HuggableError::Template(e.to_string()))?;
    Ok(Prompt(text.trim().to_string()))
}
