//! # 命令处理逻辑模块
//!
//! 包含各个子命令的高级业务逻辑。
//! 本模块负责协调文件 I/O、调用核心隐写算法以及向用户报告结果。

use crate::bitmap::Bitmap;
use crate::cli::{CapacityArgs, EmbedArgs, ExtractArgs, ExtractPlaneArgs};
use crate::plane::BitPlane;
use crate::steganography::{embed, extract, extract_plane, payload_capacity};
use anyhow::{Context, Result};
use colored::Colorize;
use std::fs;
use std::path::{Path, PathBuf};

/// 读取并解析 BMP 文件。
fn load_bitmap(path: &Path) -> Result<Bitmap> {
    let bytes = fs::read(path).with_context(|| {
        format!(
            "Unable to read image file: {}",
            path.to_string_lossy().red().bold()
        )
    })?;

    Bitmap::decode(&bytes).with_context(|| {
        format!(
            "Unable to parse {} as an 8-bit palette BMP.",
            path.to_string_lossy().red().bold()
        )
    })
}

/// 校验用户输入的位平面编号。
fn parse_plane(k: u8) -> Result<BitPlane> {
    BitPlane::from_one_based(k).with_context(|| {
        format!("Invalid bit plane: {}", k.to_string().red().bold())
    })
}

/// 在输入文件所在目录下，以 `prefix` 加原文件名生成默认输出路径。
fn sibling_path(input: &Path, prefix: &str, extension: Option<&str>) -> PathBuf {
    let name = match extension {
        Some(ext) => {
            let stem = input.file_stem().unwrap_or_default().to_string_lossy();
            format!("{prefix}{stem}.{ext}")
        }
        None => {
            let file_name = input.file_name().unwrap_or_default().to_string_lossy();
            format!("{prefix}{file_name}")
        }
    };
    input.with_file_name(name)
}

/// 未指定 `--force` 时拒绝覆盖已存在的文件。
fn ensure_writable(path: &Path, force: bool) -> Result<()> {
    anyhow::ensure!(
        force || !path.exists(),
        "Output file already exists: {} \nUse --force to overwrite it.",
        path.to_string_lossy().red().bold()
    );
    Ok(())
}

/// 处理 'ExtractPlane' 命令的执行逻辑。
///
/// 读取图像、渲染指定位平面，并写出同尺寸的黑白图像。
///
/// # Errors
///
/// 如果发生以下任一情况，将返回错误：
/// * 位平面编号不在 `[1, 8]` 范围内。
/// * 输出文件已存在且未指定 `--force`。
/// * 无法读取或解析输入图像。
/// * 无法写入输出图像。
pub fn handle_extract_plane(args: ExtractPlaneArgs) -> Result<()> {
    let plane = parse_plane(args.plane)?;
    let dest = args
        .dest
        .unwrap_or_else(|| sibling_path(&args.image, &format!("plane{plane}_"), None));
    ensure_writable(&dest, args.force)?;

    let bitmap = load_bitmap(&args.image)?;
    let rendered = extract_plane(&bitmap, plane);
    tracing::debug!(plane = %plane, pixels = rendered.capacity(), "rendered bit plane");

    fs::write(&dest, rendered.encode()).with_context(|| {
        format!(
            "Unable to write to target image file: {}",
            dest.to_string_lossy().red().bold()
        )
    })?;

    println!(
        "Bit plane {} has been saved: {}",
        plane.to_string().green().bold(),
        dest.to_string_lossy().green().bold()
    );

    Ok(())
}

/// 处理 'Embed' 命令的执行逻辑。
///
/// 读取图像和数据文件，把数据写入指定位平面，最后保存结果图像。
/// 数据超出容量时不会报错，而是截断并提示实际写入的位数。
///
/// # Errors
///
/// 如果发生以下任一情况，将返回错误：
/// * 位平面编号不在 `[1, 8]` 范围内。
/// * 输出文件已存在且未指定 `--force`。
/// * 无法读取图像或数据文件，或图像不是 8 位 BMP。
/// * 数据长度超出 32 位长度前缀的表示范围。
/// * 无法写入到目标图像文件。
pub fn handle_embed(args: EmbedArgs) -> Result<()> {
    let plane = parse_plane(args.plane)?;
    let dest = args
        .dest
        .unwrap_or_else(|| sibling_path(&args.image, "doctored_", None));
    ensure_writable(&dest, args.force)?;

    let bitmap = load_bitmap(&args.image)?;

    let payload = fs::read(&args.payload).with_context(|| {
        format!(
            "Unable to read payload file: {}",
            args.payload.to_string_lossy().red().bold()
        )
    })?;

    let embedded = embed(&bitmap, &payload, plane).with_context(|| {
        format!(
            "Failed to hide {} bytes in bit plane {}.",
            payload.len().to_string().red().bold(),
            plane
        )
    })?;

    fs::write(&dest, embedded.bitmap.encode()).with_context(|| {
        format!(
            "Unable to write to target image file: {}",
            dest.to_string_lossy().red().bold()
        )
    })?;

    if embedded.is_truncated() {
        println!(
            "{} The payload does not fit and was truncated. \nRequired: {} bits, Available: {} bits ({} bytes of payload fit).",
            "Warning:".yellow().bold(),
            embedded.stream_bits.to_string().red().bold(),
            embedded.written_bits.to_string().green().bold(),
            payload_capacity(&bitmap).to_string().green().bold()
        );
    }

    println!(
        "Embedded {} bits and saved: {}",
        embedded.written_bits.to_string().green().bold(),
        dest.to_string_lossy().green().bold()
    );

    Ok(())
}

/// 处理 'Extract' 命令的执行逻辑。
///
/// 读取经过隐写的图像，从指定位平面恢复数据并写入目标文件。
///
/// # Errors
///
/// 如果发生以下任一情况，将返回错误：
/// * 位平面编号不在 `[1, 8]` 范围内。
/// * 输出文件已存在且未指定 `--force`。
/// * 无法读取或解析输入图像。
/// * 隐藏的长度超出图像容量 (位平面未嵌入数据或编号不一致)。
/// * 无法写入到目标文件。
pub fn handle_extract(args: ExtractArgs) -> Result<()> {
    let plane = parse_plane(args.plane)?;
    let output = args
        .output
        .unwrap_or_else(|| sibling_path(&args.image, "recovered_", Some("txt")));
    ensure_writable(&output, args.force)?;

    let bitmap = load_bitmap(&args.image)?;

    let payload = extract(&bitmap, plane).with_context(|| {
        format!(
            "Failed to recover a payload from bit plane {} of '{}'. \nThe image may not contain hidden data in this plane or is corrupted.",
            plane.to_string().red().bold(),
            args.image.to_string_lossy().red().bold()
        )
    })?;

    fs::write(&output, &payload).with_context(|| {
        format!(
            "Unable to write to target file: {}",
            output.to_string_lossy().red().bold()
        )
    })?;

    println!(
        "Recovered {} bytes and saved: {}",
        payload.len().to_string().green().bold(),
        output.to_string_lossy().green().bold()
    );

    Ok(())
}

/// 处理 'Capacity' 命令的执行逻辑：打印图像尺寸与可隐藏的数据量。
pub fn handle_capacity(args: CapacityArgs) -> Result<()> {
    let bitmap = load_bitmap(&args.image)?;

    println!(
        "{}: {}x{} pixels, row stride {} bytes",
        args.image.to_string_lossy().green().bold(),
        bitmap.width(),
        bitmap.rows(),
        bitmap.row_stride()
    );
    println!(
        "Capacity per bit plane: {} bits, up to {} bytes of payload without truncation",
        bitmap.capacity().to_string().green().bold(),
        payload_capacity(&bitmap).to_string().green().bold()
    );

    Ok(())
}
