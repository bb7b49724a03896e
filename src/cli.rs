//! # 命令行接口模块
//!
//! 使用 `clap` 定义了程序的命令行结构，包括子命令和参数。
//! 所有用户通过命令行与程序交互的入口点都在此模块中定义。

use clap::Parser;
use std::path::PathBuf;

/// 针对 8 位调色板 BMP 图像的位平面工具：可视化单个位平面，或在指定位平面中隐藏、恢复任意数据。
#[derive(Parser, Debug)]
#[command(
    version,
    about,
    long_about = "针对 8 位调色板 BMP 图像的位平面工具：可视化单个位平面，或在指定位平面中隐藏、恢复任意数据。\n\n\
                  位平面编号 k 取值 1..=8，1 表示最低有效位。日志级别由 RUST_LOG 环境变量控制。"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

/// 可用的子命令。
#[derive(Parser, Debug)]
pub enum Commands {
    /// 把一个位平面渲染为黑白 BMP 图像。
    ExtractPlane(ExtractPlaneArgs),

    /// 把文件内容隐藏到图像的指定位平面中。
    Embed(EmbedArgs),

    /// 从图像的指定位平面中恢复隐藏的数据。
    Extract(ExtractArgs),

    /// 显示图像的尺寸以及可隐藏的数据量。
    Capacity(CapacityArgs),
}

/// 'extract-plane' 命令所需的参数。
#[derive(Parser, Debug)]
pub struct ExtractPlaneArgs {
    /// 输入的 8 位 BMP 图像路径。
    #[arg(short, long)]
    pub image: PathBuf,

    /// 输出图像路径。省略时为输入文件旁的 `plane<k>_<文件名>`。
    #[arg(short, long)]
    pub dest: Option<PathBuf>,

    /// 位平面编号 (1..=8)。
    #[arg(short = 'k', long)]
    pub plane: u8,

    /// 允许覆盖已存在的输出文件。
    #[arg(short, long)]
    pub force: bool,
}

/// 'embed' 命令所需的参数。
#[derive(Parser, Debug)]
pub struct EmbedArgs {
    /// 用于隐写的输入 8 位 BMP 图像路径。
    #[arg(short, long)]
    pub image: PathBuf,

    /// 要隐藏的数据文件路径。
    #[arg(short, long)]
    pub payload: PathBuf,

    /// 隐写完成后保存结果图像的路径。省略时为 `doctored_<文件名>`。
    #[arg(short, long)]
    pub dest: Option<PathBuf>,

    /// 位平面编号 (1..=8)。
    #[arg(short = 'k', long)]
    pub plane: u8,

    /// 允许覆盖已存在的输出文件。
    #[arg(short, long)]
    pub force: bool,
}

/// 'extract' 命令所需的参数。
#[derive(Parser, Debug)]
pub struct ExtractArgs {
    /// 已隐藏数据的图像文件路径。
    #[arg(short, long)]
    pub image: PathBuf,

    /// 恢复数据后的保存路径。省略时为 `recovered_<文件名>.txt`。
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// 位平面编号 (1..=8)，须与嵌入时一致。
    #[arg(short = 'k', long)]
    pub plane: u8,

    /// 允许覆盖已存在的输出文件。
    #[arg(short, long)]
    pub force: bool,
}

/// 'capacity' 命令所需的参数。
#[derive(Parser, Debug)]
pub struct CapacityArgs {
    /// 要检查的 8 位 BMP 图像路径。
    #[arg(short, long)]
    pub image: PathBuf,
}
