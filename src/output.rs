//! 产物写出：`<output_dir>/<folder-name>/index.html`
//! 先写临时文件再原子替换，中断时不会留下半截文件。

use std::{
    fs,
    io::Write,
    path::{Path, PathBuf},
};

use log::debug;
use tempfile::NamedTempFile;

use crate::{error::HuggableError, sanitize::CleanDocument};

pub(crate) const INDEX_FILE: &str = "index.html";

/// 一次成功生成写出的目录与文件
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct OutputArtifact {
    pub(crate) dir: PathBuf,
    pub(crate) file: PathBuf,
}

/// 应用名 → 目录名：小写，非字母数字连续段折叠为单个 `-`
pub(crate) fn folder_name(app_name: &str) -> String {
    let mut s = String::with_capacity(app_name.len());
    let mut prev_dash = false;
    for ch in app_name.chars().flat_map(char::to_lowercase) {
        if ch.is_alphanumeric() {
            s.push(ch);
            prev_dash = false;
        } else if !prev_dash && !s.is_empty() {
            s.push('-');
            prev_dash = true;
        }
    }
    while s.ends_with('-') {
        s.pop();
    }
    if s.is_empty() {
        "app".to_string()
    } else {
        s
    }
}

pub(crate) fn write_artifact(
    output_root: &Path,
    app_name: &str,
    doc: &CleanDocument,
) -> Result<OutputArtifact, HuggableError> {
    let dir = output_root.join(folder_name(app_name));
    fs::create_dir_all(&dir).map_err(|e| HuggableError::io(&dir, e))?;
    let file = dir.join(INDEX_FILE);

    let mut tmp = NamedTempFile::new_in(&dir).map_err(|e| HuggableError::io(&dir, e))?;
    tmp.write_all(doc.as_str().as_bytes())
        .and_then(|_| tmp.as_file().sync_all())
        .map_err(|e| HuggableError::io(tmp.path(), e))?;
    tmp.persist(&file).map_err(|e| HuggableError::io(&file, e.error))?;

    debug!("写出 {} 字节到 {}", doc.as_str().len(), file.display());
    Ok(OutputArtifact { dir, file })
}
