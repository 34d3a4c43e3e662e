//! 日志初始化：默认 warn，`RUST_LOG` 可覆盖，`--verbose` 提升到 debug

use std::io::Write;

use log::LevelFilter;

pub(crate) fn init_logging(verbose: bool) {
    let mut builder = env_logger::Builder::new();
    builder.filter_level(if verbose { LevelFilter::Debug } else { LevelFilter::Warn });
    // RUST_LOG 优先于默认级别
    builder.parse_default_env();
    builder
        .target(env_logger::Target::Stderr)
        .format(|buf, record| {
            writeln!(
                buf,
                "[{}] [{}:{}] {}",
                record.level(),
                record.file().unwrap_or("unknown"),
                record.line().unwrap_or(0),
                record.args()
            )
        });
    // 测试或重复调用时忽略“已初始化”错误
    let _ = builder.try_init();
}
