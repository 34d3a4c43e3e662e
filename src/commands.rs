//! 命令调度模块：
//! - 接收解析好的 CLI 参数，按 命令行 > 环境变量 > 配置文件 > 默认值 计算“有效参数”
//! - 串起输入规范化、生成流水线与本地预览

use anyhow::{Context, Result};
use log::info;
use std::{
    env,
    path::{Path, PathBuf},
    time::Duration,
};

use crate::{
    cli::Cli,
    client::GenerationClient,
    config::{
        self, describe_source, parse_endpoint, FileConfig, GenerationSettings, Settings, DEFAULT_API_VERSION,
        DEFAULT_ENDPOINT, DEFAULT_HOST, DEFAULT_MAX_TOKENS, DEFAULT_MODEL, DEFAULT_OUTPUT_DIR,
        DEFAULT_TEMPERATURE, DEFAULT_TIMEOUT_SECS,
    },
    normalize::{normalize, RawInput},
    pipeline::Pipeline,
    serve::StaticServer,
    utils::{env_bool_truthy, env_opt_parse, env_opt_path, env_opt_string},
};

pub(crate) const API_KEY_ENV: &str = "ANTHROPIC_API_KEY";

/// 合并命令行、环境变量与配置文件，得到最终设置
pub(crate) fn effective_settings(cli: &Cli, file: FileConfig) -> Result<Settings> {
    let model = cli
        .model
        .clone()
        .or(env_opt_string("HUGGABLE_MODEL"))
        .or(file.model)
        .unwrap_or_else(|| DEFAULT_MODEL.to_string());
    let max_tokens = cli
        .max_tokens
        .or(env_opt_parse("HUGGABLE_MAX_TOKENS"))
        .or(file.max_tokens)
        .unwrap_or(DEFAULT_MAX_TOKENS);
    let temperature = cli
        .temperature
        .or(env_opt_parse("HUGGABLE_TEMPERATURE"))
        .or(file.temperature)
        .unwrap_or(DEFAULT_TEMPERATURE);
    let endpoint_str = env_opt_string("HUGGABLE_ENDPOINT")
        .or(file.endpoint)
        .unwrap_or_else(|| DEFAULT_ENDPOINT.to_string());
    let endpoint = parse_endpoint(&endpoint_str)?;
    let api_version = file.api_version.unwrap_or_else(|| DEFAULT_API_VERSION.to_string());
    let timeout_secs = cli
        .timeout
        .or(env_opt_parse("HUGGABLE_TIMEOUT"))
        .or(file.timeout_secs)
        .unwrap_or(DEFAULT_TIMEOUT_SECS);
    let retries = cli.retries.or(env_opt_parse("HUGGABLE_RETRIES")).or(file.retries).unwrap_or(0);

    let generation = GenerationSettings {
        model,
        max_tokens,
        temperature,
        endpoint,
        api_version,
        timeout: Duration::from_secs(timeout_secs),
        retries,
    };
    generation.validate().context("生成参数无效")?;

    let output_dir = cli
        .out_dir
        .clone()
        .or(env_opt_path("HUGGABLE_OUT_DIR"))
        .or(file.output_dir)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT_DIR));
    let host = cli
        .host
        .clone()
        .or(env_opt_string("HUGGABLE_HOST"))
        .or(file.host)
        .unwrap_or_else(|| DEFAULT_HOST.to_string());

    Ok(Settings { generation, output_dir, host })
}

/// 命令行或环境变量指定的端口（配置文件在其后生效）
fn cli_or_env_port(cli: &Cli) -> Option<u16> {
    cli.port.or(env_opt_parse("HUGGABLE_PORT"))
}

/// 是否启动预览：--run / --no-run 优先于 HUGGABLE_NO_RUN
fn should_run(cli: &Cli) -> bool {
    if cli.run {
        return true;
    }
    !(cli.no_run || env_bool_truthy("HUGGABLE_NO_RUN").unwrap_or(false))
}

/// 原始输入：只取命令行与环境变量，不依赖配置文件
fn raw_input(cli: &Cli) -> RawInput {
    RawInput {
        name: cli.name.clone(),
        description: cli.description.clone(),
        style: cli.style.clone(),
        port: cli_or_env_port(cli),
        run: Some(should_run(cli)),
        api_key: cli.api_key.clone().or(env_opt_string(API_KEY_ENV)),
    }
}

/// `--no-run` 时提示如何预览已生成的目录，无需再次调用生成服务
pub(crate) fn serve_hint(dir: &Path, port: u16) -> String {
    format!("python3 -m http.server {} --directory \"{}\"", port, dir.display())
}

/// 执行一次完整生成，按需启动本地预览
pub(crate) fn run(cli: Cli) -> Result<()> {
    // 先校验必填参数，配置文件有误时也优先报告缺参
    let mut invocation = normalize(raw_input(&cli))?;

    let cwd = env::current_dir().context("无法获取当前目录")?;
    let mut loaded = config::load_config(cli.config.as_deref(), &cwd)?;
    info!("配置来源: {}", describe_source(&loaded.source));
    if let (None, Some(port)) = (cli_or_env_port(&cli), loaded.config.port.take()) {
        invocation.port = port;
    }
    let settings = effective_settings(&cli, loaded.config)?;
    let request = &invocation.request;

    println!("\n🎨 正在创建 Web 应用: {}", request.app_name);
    println!("📝 描述: {}", request.description);
    if !request.style.is_empty() {
        println!("🖌️ 风格: {}", request.style);
    }

    let client = GenerationClient::new(invocation.api_key.clone(), settings.generation.clone())?;
    println!("\n🤖 正在调用 {} 生成页面，请稍候...", settings.generation.model);
    let pipeline = Pipeline::new(client, &settings.output_dir);
    let artifact = pipeline.run(request)?;
    println!("✅ 已保存: {}", artifact.file.display());

    if !invocation.run {
        println!("\n📁 应用目录: {}", artifact.dir.display());
        println!("稍后预览（不会重新生成）: {}", serve_hint(&artifact.dir, invocation.port));
        return Ok(());
    }

    let server = match StaticServer::bind(&artifact.dir, &settings.host, invocation.port) {
        Ok(s) => s,
        Err(e) => {
            println!("📁 生成结果已保留: {}", artifact.file.display());
            return Err(e.into());
        }
    };
    println!("\n🚀 本地预览: {}", server.url());
    println!("按 Ctrl+C 停止服务");
    server.open_browser();
    server.run();
    Ok(())
}
