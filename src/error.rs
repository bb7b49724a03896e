//! # 错误类型模块
//!
//! 核心算法返回的所有错误都归入 [`StegoError`]。
//! 命令处理层再用 `anyhow` 附加上下文信息。

use thiserror::Error;

/// 错误的大类，供调用方决定如何向用户报告。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// 位图格式不受支持或头部不完整。
    Format,
    /// 参数非法，例如位平面编号超出范围。
    Config,
    /// 隐藏数据的长度与像素网格的容量不符。
    Extraction,
    /// 底层读写失败。
    Io,
}

#[derive(Debug, Error)]
pub enum StegoError {
    #[error("bitmap header is truncated: need {needed} bytes, got {available}")]
    TruncatedHeader { needed: usize, available: usize },

    #[error("unsupported bit depth: {0} bits per pixel (only 8-bit palette bitmaps are supported)")]
    UnsupportedBitDepth(u16),

    #[error("invalid bitmap dimensions: {width}x{height}")]
    InvalidDimensions { width: i32, height: i32 },

    #[error("bit plane {0} is out of range, expected a value in [1, 8]")]
    PlaneOutOfRange(u8),

    #[error("payload of {0} bytes does not fit in the 32-bit length prefix")]
    PayloadTooLong(usize),

    #[error("the pixel grid holds only {capacity_bits} bits, not enough for the 32-bit length prefix")]
    MissingLengthPrefix { capacity_bits: usize },

    #[error(
        "hidden length claims {claimed_bytes} bytes ({required_bits} bits) but the pixel grid holds only {capacity_bits} bits"
    )]
    PayloadExceedsCapacity {
        claimed_bytes: u32,
        required_bits: u64,
        capacity_bits: usize,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl StegoError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::TruncatedHeader { .. }
            | Self::UnsupportedBitDepth(_)
            | Self::InvalidDimensions { .. } => ErrorKind::Format,
            Self::PlaneOutOfRange(_) | Self::PayloadTooLong(_) => ErrorKind::Config,
            Self::MissingLengthPrefix { .. } | Self::PayloadExceedsCapacity { .. } => {
                ErrorKind::Extraction
            }
            Self::Io(_) => ErrorKind::Io,
        }
    }
}

pub type Result<T> = std::result::Result<T, StegoError>;
