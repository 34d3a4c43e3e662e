//! 配置与加载模块：
//! - 定义配置文件结构 `FileConfig` 与最终生效的 `Settings`
//! - 提供 `load_config`：显式路径 > 当前目录自动发现 > 内置默认
//! - 暴露配置来源信息，便于日志打印

use std::{fs, path::{Path, PathBuf}, time::Duration};
use anyhow::{Result, Context, bail};
use serde::Deserialize;
use url::Url;

pub(crate) const DEFAULT_MODEL: &str = "claude-opus-4-20250514";
pub(crate) const DEFAULT_MAX_TOKENS: u32 = 8192;
pub(crate) const DEFAULT_TEMPERATURE: f32 = 0.7;
pub(crate) const DEFAULT_ENDPOINT: &str = "https://api.anthropic.com";
pub(crate) const DEFAULT_API_VERSION: &str = "2023-06-01";
pub(crate) const DEFAULT_TIMEOUT_SECS: u64 = 300;
pub(crate) const DEFAULT_OUTPUT_DIR: &str = "generated_apps";
pub(crate) const DEFAULT_HOST: &str = "localhost";
pub(crate) const DEFAULT_PORT: u16 = 8080;
pub(crate) const MAX_RETRIES: u32 = 5;

/// 配置文件（huggable.yaml）中的可选项，均可被环境变量与命令行覆盖
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct FileConfig {
    #[serde(default)]
    pub(crate) model: Option<String>,
    #[serde(default)]
    pub(crate) max_tokens: Option<u32>,
    #[serde(default)]
    pub(crate) temperature: Option<f32>,
    /// 生成服务根地址，例如 `https://api.anthropic.com`
    #[serde(default)]
    pub(crate) endpoint: Option<String>,
    #[serde(default)]
    pub(crate) api_version: Option<String>,
    #[serde(default)]
    pub(crate) timeout_secs: Option<u64>,
    /// 失败后额外重试次数（不含首次请求）
    #[serde(default)]
    pub(crate) retries: Option<u32>,
    #[serde(default)]
    pub(crate) output_dir: Option<PathBuf>,
    #[serde(default)]
    pub(crate) host: Option<String>,
    #[serde(default)]
    pub(crate) port: Option<u16>,
}

/// 配置来源（用于打印和调试）
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum ConfigSource {
    LocalExplicit(String),
    LocalAuto(String),
    Defaults,
}

/// 加载后的配置及其来源
#[derive(Debug)]
pub(crate) struct LoadedConfig { pub(crate) config: FileConfig, pub(crate) source: ConfigSource }

/// 人类可读的来源描述
pub(crate) fn describe_source(src: &ConfigSource) -> String {
    match src {
        ConfigSource::LocalExplicit(p) => format!("本地文件: {}", p),
        ConfigSource::LocalAuto(p) => format!("本地文件(自动发现): {}", p),
        ConfigSource::Defaults => "内置默认值".to_string(),
    }
}

// 自动发现：huggable.yaml / huggable.yml
fn resolve_local_config_path(dir: &Path) -> Option<PathBuf> {
    ["huggable.yaml", "huggable.yml"]
        .iter()
        .map(|cand| dir.join(cand))
        .find(|p| p.is_file())
}

/// 加载配置：显式路径必须存在；否则在 `dir` 中自动发现；都没有则用默认值
pub(crate) fn load_config(explicit: Option<&Path>, dir: &Path) -> Result<LoadedConfig> {
    if let Some(path) = explicit {
        if !path.is_file() {
            bail!("配置文件不存在: {}", path.display());
        }
        let config = parse_config_file(path)?;
        return Ok(LoadedConfig { config, source: ConfigSource::LocalExplicit(path.display().to_string()) });
    }
    if let Some(path) = resolve_local_config_path(dir) {
        let config = parse_config_file(&path)?;
        return Ok(LoadedConfig { config, source: ConfigSource::LocalAuto(path.display().to_string()) });
    }
    Ok(LoadedConfig { config: FileConfig::default(), source: ConfigSource::Defaults })
}

fn parse_config_file(path: &Path) -> Result<FileConfig> {
    let raw = fs::read_to_string(path).with_context(|| format!("读取配置失败: {}", path.display()))?;
    // 空文件等价于全部默认
    if raw.trim().is_empty() {
        return Ok(FileConfig::default());
    }
    serde_yaml::from_str(&raw).with_context(|| format!("解析 YAML 失败: {}", path.display()))
}

/// 生成服务相关的最终设置
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct GenerationSettings {
    pub(crate) model: String,
    pub(crate) max_tokens: u32,
    pub(crate) temperature: f32,
    pub(crate) endpoint: Url,
    pub(crate) api_version: String,
    pub(crate) timeout: Duration,
    pub(crate) retries: u32,
}

#[cfg(test)]
impl GenerationSettings {
    /// 测试用：默认参数 + 指定服务地址
    pub(crate) fn for_endpoint(endpoint: &str) -> Self {
        GenerationSettings {
            model: DEFAULT_MODEL.to_string(),
            max_tokens: DEFAULT_MAX_TOKENS,
            temperature: DEFAULT_TEMPERATURE,
            endpoint: Url::parse(endpoint).unwrap(),
            api_version: DEFAULT_API_VERSION.to_string(),
            timeout: Duration::from_secs(5),
            retries: 0,
        }
    }
}

/// 一次调用最终生效的全部设置
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Settings {
    pub(crate) generation: GenerationSettings,
    pub(crate) output_dir: PathBuf,
    pub(crate) host: String,
}

/// 校验并解析服务地址，仅接受 http/https
pub(crate) fn parse_endpoint(s: &str) -> Result<Url> {
    let url = Url::parse(s.trim()).with_context(|| format!("无效的服务地址: {}", s))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => bail!("服务地址仅支持 http/https，收到: {}", other),
    }
}

impl GenerationSettings {
    pub(crate) fn validate(&self) -> Result<()> {
        if self.model.trim().is_empty() {
            bail!("model 不能为空");
        }
        if self.max_tokens == 0 {
            bail!("max_tokens 必须大于 0");
        }
        if !(0.0..=1.0).contains(&self.temperature) {
            bail!("temperature 必须在 0.0 到 1.0 之间，收到: {}", self.temperature);
        }
        if self.timeout.is_zero() {
            bail!("timeout 必须大于 0 秒");
        }
        if self.retries > MAX_RETRIES {
            bail!("retries 最多为 {}，收到: {}", MAX_RETRIES, self.retries);
        }
        Ok(())
    }
}
