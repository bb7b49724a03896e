use clap::Parser;
use tracing_subscriber::EnvFilter;

use bmp_planes::{
    cli::{Cli, Commands},
    handler::{handle_capacity, handle_embed, handle_extract, handle_extract_plane},
};

/// 程序的主入口点
///
/// 初始化日志后解析命令行参数，并根据子命令将执行分派到相应的处理函数
fn main() -> anyhow::Result<()> {
    // 日志写到 stderr，级别由 RUST_LOG 控制，默认只显示警告
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::ExtractPlane(args) => handle_extract_plane(args),
        Commands::Embed(args) => handle_embed(args),
        Commands::Extract(args) => handle_extract(args),
        Commands::Capacity(args) => handle_capacity(args),
    }
}
