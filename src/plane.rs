//! # 位平面编号
//!
//! 用户看到的编号是 `1..=8`，内部存储为 `0..=7` 的位索引。

use crate::error::{Result, StegoError};
use std::fmt;

/// 一个经过校验的位平面，保证索引位于 `[0, 7]`。
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BitPlane(u8);

impl BitPlane {
    /// 最低有效位平面。
    pub const LSB: BitPlane = BitPlane(0);

    /// 最高有效位平面。
    pub const MSB: BitPlane = BitPlane(7);

    /// 从用户输入的 `1..=8` 编号构造位平面。
    ///
    /// # Errors
    ///
    /// 编号不在 `[1, 8]` 范围内时返回 [`StegoError::PlaneOutOfRange`]。
    pub fn from_one_based(k: u8) -> Result<Self> {
        match k {
            1..=8 => Ok(Self(k - 1)),
            _ => Err(StegoError::PlaneOutOfRange(k)),
        }
    }

    /// 从 `0..=7` 的位索引构造位平面。
    pub fn from_index(index: u8) -> Result<Self> {
        if index < 8 {
            Ok(Self(index))
        } else {
            Err(StegoError::PlaneOutOfRange(index.saturating_add(1)))
        }
    }

    /// 所有 8 个位平面，从最低位开始。
    pub fn all() -> impl Iterator<Item = BitPlane> {
        (0..8).map(BitPlane)
    }

    pub fn index(self) -> u8 {
        self.0
    }

    pub fn one_based(self) -> u8 {
        self.0 + 1
    }

    pub fn mask(self) -> u8 {
        1 << self.0
    }

    /// 读取字节中本平面对应的位 (0 或 1)。
    pub fn bit_of(self, byte: u8) -> u8 {
        (byte >> self.0) & 1
    }

    /// 把本平面对应的位替换为 `bit`，其余位保持不变。
    pub fn with_bit(self, byte: u8, bit: u8) -> u8 {
        (byte & !self.mask()) | ((bit & 1) << self.0)
    }
}

impl fmt::Display for BitPlane {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.one_based())
    }
}
