//! ログ初期化
//!
//! 利用者向けの進捗は println! で出し、診断ログは tracing に流す。
//! レベルは RUST_LOG が優先、なければ --verbose で debug、通常は warn。

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

pub fn init_logger(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_level));

    let console_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(verbose)
        .with_ansi(true);

    // 二重初期化（テスト等）は無視
    let _ = tracing_subscriber::registry()
        .with(env_filter)
        .with(console_layer)
        .try_init();
}
