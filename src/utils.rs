//! 通用辅助函数：
//! - 环境变量读取与解析
//! - 文本到数值/布尔的解析工具

use std::{env, path::PathBuf};

/// 可选读取 PATH 环境变量为 PathBuf。
pub(crate) fn env_opt_path(key: &str) -> Option<PathBuf> {
    env::var_os(key).filter(|v| !v.is_empty()).map(PathBuf::from)
}

/// 可选读取 String 环境变量（去除首尾空白，空串视为未设置）。
pub(crate) fn env_opt_string(key: &str) -> Option<String> {
    env::var(key).ok().map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}

/// 可选读取数值环境变量；无法解析时忽略。
pub(crate) fn env_opt_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    env_opt_string(key).and_then(|s| {
        let parsed = s.parse::<T>().ok();
        if parsed.is_none() {
            log::warn!("忽略无法解析的环境变量 {}={}", key, s);
        }
        parsed
    })
}

/// 读取布尔环境变量的真值（1/true/on/yes/y）。
pub(crate) fn env_bool_truthy(key: &str) -> Option<bool> {
    env::var(key).ok().map(|v| parse_truthy(&v))
}

fn parse_truthy(v: &str) -> bool {
    matches!(v.trim().to_ascii_lowercase().as_str(), "1" | "true" | "on" | "yes" | "y")
}
