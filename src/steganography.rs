//! # 位平面隐写核心
//!
//! 三个纯函数：位平面可视化、数据嵌入、数据提取。
//!
//! 比特流格式：先是 32 位大端长度前缀，随后是每个数据字节，均按最高位在前的顺序排列。
//! 像素按存储顺序遍历 (行外层、列内层)，行填充字节不参与。

use crate::bitmap::Bitmap;
use crate::constants::{LENGTH_PREFIX_BITS, PLANE_OFF, PLANE_ON};
use crate::error::{Result, StegoError};
use crate::plane::BitPlane;

/// 嵌入的结果：修改后的位图与实际写入的位数。
#[derive(Debug, Clone)]
pub struct Embedded {
    pub bitmap: Bitmap,
    pub written_bits: usize,
    /// 比特流的完整长度；大于 `written_bits` 时表示数据被截断。
    pub stream_bits: usize,
}

impl Embedded {
    pub fn is_truncated(&self) -> bool {
        self.written_bits < self.stream_bits
    }
}

/// 把位平面渲染为黑白图像。
///
/// 网格内的像素在该位为 1 时输出 255，否则输出 0。
/// 头部、调色板以及行填充字节保持原样。
pub fn extract_plane(bitmap: &Bitmap, plane: BitPlane) -> Bitmap {
    let mut out = bitmap.clone();
    for pixel in out.grid_mut() {
        *pixel = if plane.bit_of(*pixel) == 1 {
            PLANE_ON
        } else {
            PLANE_OFF
        };
    }
    out
}

/// 在不截断的前提下最多能嵌入的数据字节数。
pub fn payload_capacity(bitmap: &Bitmap) -> usize {
    (bitmap.capacity() / 8).saturating_sub(LENGTH_PREFIX_BITS / 8)
}

/// 长度前缀加 `len` 个字节的比特流总位数。
///
/// # Errors
///
/// `len` 超出 32 位长度前缀，或总位数超出 `usize` 时返回 [`StegoError::PayloadTooLong`]。
fn stream_len(len: usize) -> Result<usize> {
    u32::try_from(len).map_err(|_| StegoError::PayloadTooLong(len))?;
    len.checked_mul(8)
        .and_then(|bits| bits.checked_add(LENGTH_PREFIX_BITS))
        .ok_or(StegoError::PayloadTooLong(len))
}

/// 长度前缀加数据的比特流，最高位在前。
fn payload_bits(size: u32, payload: &[u8]) -> impl Iterator<Item = u8> + '_ {
    let prefix = (0..LENGTH_PREFIX_BITS).rev().map(move |i| ((size >> i) & 1) as u8);
    let body = payload
        .iter()
        .flat_map(|&byte| (0..8).rev().map(move |i| (byte >> i) & 1));
    prefix.chain(body)
}

/// 把 `payload` 写入位图的指定位平面。
///
/// 写入 `min(32 + 8 * payload.len(), capacity)` 位；超出容量的部分被静默丢弃，
/// 这不是错误，调用方可通过 [`Embedded::is_truncated`] 判断。
/// 每个被访问的像素只改动 `plane` 这一位，之后的像素不受影响。
///
/// # Errors
///
/// 数据长度超出 32 位长度前缀的表示范围时返回 [`StegoError::PayloadTooLong`]。
pub fn embed(bitmap: &Bitmap, payload: &[u8], plane: BitPlane) -> Result<Embedded> {
    let stream_bits = stream_len(payload.len())?;
    // stream_len 已确认长度能放进 u32
    let size = payload.len() as u32;

    let mut out = bitmap.clone();
    let mut written_bits = 0;
    for (pixel, bit) in out.grid_mut().zip(payload_bits(size, payload)) {
        *pixel = plane.with_bit(*pixel, bit);
        written_bits += 1;
    }

    tracing::debug!(plane = %plane, written_bits, stream_bits, "embedded payload");
    if written_bits < stream_bits {
        tracing::warn!(
            written_bits,
            stream_bits,
            "payload does not fit the pixel grid and was truncated"
        );
    }

    Ok(Embedded {
        bitmap: out,
        written_bits,
        stream_bits,
    })
}

/// 从位图的指定位平面恢复数据。
///
/// # Errors
///
/// * 网格不足 32 个像素时返回 [`StegoError::MissingLengthPrefix`]。
/// * 长度前缀声明的数据超出网格容量时返回 [`StegoError::PayloadExceedsCapacity`]，
///   不会越界读取。
pub fn extract(bitmap: &Bitmap, plane: BitPlane) -> Result<Vec<u8>> {
    let capacity_bits = bitmap.capacity();
    if capacity_bits < LENGTH_PREFIX_BITS {
        return Err(StegoError::MissingLengthPrefix { capacity_bits });
    }

    let mut bits = bitmap.grid().map(|&pixel| plane.bit_of(pixel));

    let size = bits
        .by_ref()
        .take(LENGTH_PREFIX_BITS)
        .fold(0u32, |acc, bit| (acc << 1) | u32::from(bit));

    let required_bits = LENGTH_PREFIX_BITS as u64 + u64::from(size) * 8;
    if required_bits > capacity_bits as u64 {
        return Err(StegoError::PayloadExceedsCapacity {
            claimed_bytes: size,
            required_bits,
            capacity_bits,
        });
    }

    let payload: Vec<u8> = (0..size)
        .map(|_| bits.by_ref().take(8).fold(0u8, |acc, bit| (acc << 1) | bit))
        .collect();

    tracing::debug!(plane = %plane, bytes = payload.len(), "extracted payload");
    Ok(payload)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    fn patterned(width: u32, height: u32) -> Bitmap {
        let pixels: Vec<u8> = (0..width * height).map(|i| (i * 73 + 11) as u8).collect();
        Bitmap::grayscale(width, height, &pixels).unwrap()
    }

    #[test]
    fn round_trip_on_every_plane() {
        let cover = patterned(37, 11);
        let payload = b"hidden in plain sight";

        for plane in BitPlane::all() {
            let embedded = embed(&cover, payload, plane).unwrap();
            assert!(!embedded.is_truncated());
            assert_eq!(embedded.written_bits, 32 + payload.len() * 8);
            assert_eq!(extract(&embedded.bitmap, plane).unwrap(), payload);
        }
    }

    #[test]
    fn empty_payload_round_trips() {
        let cover = patterned(8, 4);
        let embedded = embed(&cover, &[], BitPlane::LSB).unwrap();
        assert_eq!(embedded.written_bits, 32);
        assert!(extract(&embedded.bitmap, BitPlane::LSB).unwrap().is_empty());
    }

    #[test]
    fn embed_touches_only_the_chosen_bit_of_leading_pixels() {
        let cover = patterned(13, 9);
        let plane = BitPlane::from_one_based(5).unwrap();
        let embedded = embed(&cover, b"abc", plane).unwrap();

        let before: Vec<u8> = cover.grid().copied().collect();
        let after: Vec<u8> = embedded.bitmap.grid().copied().collect();
        for (i, (&old, &new)) in before.iter().zip(&after).enumerate() {
            assert_eq!(old & !plane.mask(), new & !plane.mask(), "pixel {i}");
            if i >= embedded.written_bits {
                assert_eq!(old, new, "pixel {i} beyond written range");
            }
        }

        // 行填充字节不会被写入
        for row in embedded.bitmap.pixels().chunks_exact(16) {
            assert_eq!(&row[13..], &[0, 0, 0]);
        }
        assert_eq!(embedded.bitmap.palette(), cover.palette());
        assert_eq!(embedded.bitmap.info_header(), cover.info_header());
    }

    #[test]
    fn bit_order_is_msb_first() {
        let cover = Bitmap::grayscale(8, 5, &[0; 40]).unwrap();
        let embedded = embed(&cover, &[0x41], BitPlane::LSB).unwrap();
        let bits: Vec<u8> = embedded.bitmap.grid().copied().collect();

        // 长度 1 -> 31 个 0 再加一个 1
        assert_eq!(&bits[..31], &[0; 31]);
        assert_eq!(bits[31], 1);
        assert_eq!(&bits[32..40], &[0, 1, 0, 0, 0, 0, 0, 1]);
    }

    #[test]
    fn truncates_to_capacity_without_error() {
        let cover = patterned(10, 5);
        let payload = [0xFFu8; 16];
        let embedded = embed(&cover, &payload, BitPlane::MSB).unwrap();

        assert!(embedded.is_truncated());
        assert_eq!(embedded.written_bits, cover.capacity());
        assert_eq!(embedded.stream_bits, 32 + 16 * 8);
    }

    #[test]
    fn tiny_grid_scenario_fails_extraction() {
        // 4x2 网格，容量 8 位；40 位的流只写入长度前缀的前 8 位
        let cover = Bitmap::grayscale(4, 2, &[0; 8]).unwrap();
        assert_eq!(cover.row_stride(), 4);

        let embedded = embed(&cover, &[0x41], BitPlane::LSB).unwrap();
        assert_eq!(embedded.written_bits, 8);
        assert!(embedded.bitmap.pixels().iter().all(|&p| p == 0));

        let err = extract(&embedded.bitmap, BitPlane::LSB).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Extraction);
        assert!(matches!(
            err,
            StegoError::MissingLengthPrefix { capacity_bits: 8 }
        ));
    }

    #[test]
    fn oversized_length_prefix_is_rejected() {
        // 所有像素置 0xFF，长度前缀读出 u32::MAX
        let cover = Bitmap::grayscale(16, 4, &[0xFF; 64]).unwrap();
        let err = extract(&cover, BitPlane::from_index(3).unwrap()).unwrap_err();

        match err {
            StegoError::PayloadExceedsCapacity {
                claimed_bytes,
                required_bits,
                capacity_bits,
            } => {
                assert_eq!(claimed_bytes, u32::MAX);
                assert_eq!(required_bits, 32 + u64::from(u32::MAX) * 8);
                assert_eq!(capacity_bits, 64);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn unembedded_plane_with_small_length_still_decodes() {
        // 从未嵌入过的图像：长度前缀碰巧读出 2，后面 16 位按原样成为数据
        let mut pixels = vec![0xFEu8; 64];
        pixels[30] = 0x01;
        for pixel in &mut pixels[32..40] {
            *pixel = 0x81;
        }
        let cover = Bitmap::grayscale(16, 4, &pixels).unwrap();

        let payload = extract(&cover, BitPlane::LSB).unwrap();
        assert_eq!(payload, vec![0xFF, 0x00]);
    }

    #[test]
    fn stream_length_is_checked() {
        assert_eq!(stream_len(0).unwrap(), 32);
        assert_eq!(stream_len(3).unwrap(), 56);
        assert!(matches!(
            stream_len(usize::MAX / 8 + 1),
            Err(StegoError::PayloadTooLong(_))
        ));

        let largest = u32::MAX as usize;
        match stream_len(largest) {
            Ok(bits) => assert_eq!(bits as u64, 32 + u64::from(u32::MAX) * 8),
            Err(err) => {
                // usize 只有 32 位时总位数溢出
                assert!(usize::BITS < 64);
                assert!(matches!(err, StegoError::PayloadTooLong(_)));
            }
        }
    }

    #[test]
    fn payload_exactly_at_capacity_round_trips() {
        let cover = patterned(8, 8);
        assert_eq!(payload_capacity(&cover), 4);

        let embedded = embed(&cover, b"full", BitPlane::LSB).unwrap();
        assert!(!embedded.is_truncated());
        assert_eq!(embedded.written_bits, 64);
        assert_eq!(extract(&embedded.bitmap, BitPlane::LSB).unwrap(), b"full");
    }

    #[test]
    fn extract_plane_outputs_black_and_white() {
        let cover = patterned(6, 3);
        let plane = BitPlane::from_one_based(2).unwrap();
        let out = extract_plane(&cover, plane);

        assert_eq!(out.file_header(), cover.file_header());
        assert_eq!(out.info_header(), cover.info_header());
        assert_eq!(out.palette(), cover.palette());

        for (&src, &dst) in cover.grid().zip(out.grid()) {
            let expected = if src & 0b10 != 0 { 255 } else { 0 };
            assert_eq!(dst, expected);
        }
    }

    #[test]
    fn extract_plane_keeps_padding_bytes() {
        let mut cover = patterned(5, 2);
        cover.pixels_mut()[5] = 0x17;
        cover.pixels_mut()[15] = 0x03;

        let out = extract_plane(&cover, BitPlane::LSB);
        assert_eq!(out.pixels()[5], 0x17);
        assert_eq!(out.pixels()[15], 0x03);
        assert_eq!(out.pixels().len(), cover.pixels().len());
    }
}
