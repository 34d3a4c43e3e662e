//! CLI 定义模块：仅负责命令行参数结构体与解析
//! name/description 在这里是可选的，由输入规范化统一报告缺失。

use clap::Parser;
use std::path::PathBuf;

const EXAMPLES: &str = "\
示例:
  huggable --name \"Todo App\" --description \"A modern todo list with dark mode\"
  huggable --name \"Portfolio\" --description \"Personal portfolio site\" --style \"Minimalist, monochrome\"
  huggable --name \"Game\" --description \"Simple puzzle game\" --no-run";

/// 顶层 CLI 入口
#[derive(Parser, Debug)]
#[command(
    name = "huggable",
    about = "根据一句话描述生成单文件 Web 应用，并在本地预览",
    version,
    after_help = EXAMPLES
)]
pub(crate) struct Cli {
    /// 应用名称（用于提示词与输出目录名）
    #[arg(long, value_name = "NAME")]
    pub(crate) name: Option<String>,
    /// 应用功能描述
    #[arg(long, value_name = "TEXT")]
    pub(crate) description: Option<String>,
    /// 风格偏好，例如 "Dark mode, neon colors, cyberpunk"
    #[arg(long, value_name = "TEXT")]
    pub(crate) style: Option<String>,
    /// 本地预览端口，默认 8080
    #[arg(long, value_name = "PORT")]
    pub(crate) port: Option<u16>,
    /// 生成后不启动本地服务、不打开浏览器
    #[arg(long)]
    pub(crate) no_run: bool,
    /// 强制启动本地预览（覆盖环境变量 HUGGABLE_NO_RUN）
    #[arg(long, conflicts_with = "no_run")]
    pub(crate) run: bool,
    /// API Key（优先于环境变量 ANTHROPIC_API_KEY）
    #[arg(long, value_name = "KEY")]
    pub(crate) api_key: Option<String>,
    /// 配置文件路径，默认自动发现 huggable.yaml / huggable.yml
    #[arg(long, value_name = "FILE")]
    pub(crate) config: Option<PathBuf>,
    /// 输出根目录，默认 generated_apps
    #[arg(long, value_name = "DIR")]
    pub(crate) out_dir: Option<PathBuf>,
    /// 模型 ID
    #[arg(long, value_name = "ID")]
    pub(crate) model: Option<String>,
    /// 最大输出 token 数
    #[arg(long, value_name = "N")]
    pub(crate) max_tokens: Option<u32>,
    /// 采样温度（0.0 - 1.0）
    #[arg(long, value_name = "T")]
    pub(crate) temperature: Option<f32>,
    /// 请求超时（秒）
    #[arg(long, value_name = "SECS")]
    pub(crate) timeout: Option<u64>,
    /// 网络/服务端暂时性错误的重试次数（默认 0，最多 5）
    #[arg(long, value_name = "N")]
    pub(crate) retries: Option<u32>,
    /// 本地预览监听主机，默认 localhost
    #[arg(long, value_name = "HOST")]
    pub(crate) host: Option<String>,
    /// 输出调试日志
    #[arg(short, long)]
    pub(crate) verbose: bool,
}
