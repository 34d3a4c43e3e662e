//! 生成流水线：提示词 → 生成 → 清洗 → 写盘
//! 不涉及命令行与预览，便于用假的生成器单测。

use std::path::PathBuf;

use log::info;

use crate::{
    client::Generate,
    error::HuggableError,
    normalize::GenerationRequest,
    output::{write_artifact, OutputArtifact},
    prompt::build_prompt,
    sanitize::sanitize,
};

pub(crate) struct Pipeline<G> {
    generator: G,
    output_root: PathBuf,
}

impl<G: Generate> Pipeline<G> {
    pub(crate) fn new(generator: G, output_root: impl Into<PathBuf>) -> Self {
        Pipeline { generator, output_root: output_root.into() }
    }

    pub(crate) fn run(&self, request: &GenerationRequest) -> Result<OutputArtifact, HuggableError> {
        let prompt = build_prompt(request)?;
        let raw = self.generator.generate(&prompt)?;
        let doc = sanitize(raw.as_str());
        if doc.is_empty() {
            return Err(HuggableError::Service("生成结果为空".to_string()));
        }
        info!("清洗后文档 {} 字节（原始 {} 字节）", doc.as_str().len(), raw.as_str().len());
        write_artifact(&self.output_root, &request.app_name, &doc)
    }
}
