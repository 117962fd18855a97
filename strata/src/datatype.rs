//! Datatype engine: element layout, spans and layout-aware copies.
//!
//! A [`Datatype`] is a typemap of byte blocks inside one element plus the
//! element's extent (the stride between consecutive elements). Blocks need
//! not cover the extent, so a derived type can carry internal padding or a
//! leading gap. All data movement walks the blocks; padding bytes are never
//! read from or written to user buffers.
//!
//! Buffers are addressed through [`Region`]/[`RegionMut`], which pair a byte
//! slice with the logical offset of its first byte. A scratch buffer sized by
//! [`Datatype::span`] starts at the type's true lower bound, so element 0 is
//! reached at index `0` rather than through a negative pointer offset.

use crate::error::{Result, StrataError};
use crate::types::DataType;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Block {
    offset: usize,
    len: usize,
}

/// Layout of one element of a (possibly derived) datatype.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Datatype {
    blocks: Vec<Block>,
    extent: usize,
}

impl Datatype {
    /// A predefined scalar type.
    pub fn predefined(dtype: DataType) -> Self {
        let size = dtype.size_in_bytes();
        Self {
            blocks: vec![Block {
                offset: 0,
                len: size,
            }],
            extent: size,
        }
    }

    /// Opaque bytes, the type used for broker hops.
    pub fn bytes() -> Self {
        Self::predefined(DataType::U8)
    }

    /// `count` back-to-back copies of `inner`.
    pub fn contiguous(count: usize, inner: &Datatype) -> Self {
        Self::vector(count, 1, 1, inner)
    }

    /// `count` blocks of `blocklen` inner elements, block starts `stride`
    /// inner extents apart.
    pub fn vector(count: usize, blocklen: usize, stride: usize, inner: &Datatype) -> Self {
        let mut blocks = Vec::new();
        for i in 0..count {
            for j in 0..blocklen {
                let base = (i * stride + j) * inner.extent;
                for b in &inner.blocks {
                    push_block(&mut blocks, base + b.offset, b.len);
                }
            }
        }
        let extent = if count == 0 {
            0
        } else {
            ((count - 1) * stride + blocklen) * inner.extent
        };
        Self { blocks, extent }
    }

    /// Same typemap as `inner` with a different extent.
    pub fn resized(inner: &Datatype, extent: usize) -> Self {
        Self {
            blocks: inner.blocks.clone(),
            extent,
        }
    }

    /// Bytes of actual data in one element.
    pub fn size(&self) -> usize {
        self.blocks.iter().map(|b| b.len).sum()
    }

    /// Stride between consecutive elements.
    pub fn extent(&self) -> usize {
        self.extent
    }

    /// Offset of the first data byte within an element.
    pub fn true_lb(&self) -> usize {
        self.blocks.iter().map(|b| b.offset).min().unwrap_or(0)
    }

    /// One past the last data byte within an element.
    pub fn true_ub(&self) -> usize {
        self.blocks
            .iter()
            .map(|b| b.offset + b.len)
            .max()
            .unwrap_or(0)
    }

    /// True when an element is exactly `size()` dense bytes.
    pub fn is_contiguous(&self) -> bool {
        match self.blocks.as_slice() {
            [] => self.extent == 0,
            [b] => b.offset == 0 && b.len == self.extent,
            _ => false,
        }
    }

    /// Bytes needed to hold `count` elements, and the leading gap that a
    /// buffer of that size must be shifted by (`Region::with_start(buf, gap)`).
    /// Fails with `OutOfResource` when the span is not addressable.
    pub fn span(&self, count: usize) -> Result<(usize, isize)> {
        if count == 0 || self.blocks.is_empty() {
            return Ok((0, 0));
        }
        let lb = self.true_lb();
        let span = (count - 1)
            .checked_mul(self.extent)
            .and_then(|b| b.checked_add(self.true_ub() - lb))
            .filter(|&b| b <= isize::MAX as usize)
            .ok_or(StrataError::out_of_resource("datatype span", usize::MAX))?;
        Ok((span, lb as isize))
    }

    /// Packed byte length of `count` elements.
    pub fn packed_len(&self, count: usize) -> Result<usize> {
        count
            .checked_mul(self.size())
            .filter(|&b| b <= isize::MAX as usize)
            .ok_or(StrataError::out_of_resource("packed elements", usize::MAX))
    }

    /// Append `count` elements found at element displacement `disp` of `src`
    /// to `out` in packed form.
    pub fn pack_into(
        &self,
        src: Region<'_>,
        disp: isize,
        count: usize,
        out: &mut Vec<u8>,
    ) -> Result<()> {
        if count == 0 {
            return Ok(());
        }
        let base = self.element_offset(disp)?;
        self.data_range(base, count).and_then(|(lo, len)| src.slice(lo, len))?;
        out.reserve(self.packed_len(count)?);
        if self.is_contiguous() {
            out.extend_from_slice(src.slice(base, count * self.extent)?);
            return Ok(());
        }
        let extent = self.extent as isize;
        for i in 0..count as isize {
            let elem = base + i * extent;
            for b in &self.blocks {
                out.extend_from_slice(src.slice(elem + b.offset as isize, b.len)?);
            }
        }
        Ok(())
    }

    /// Scatter packed `data` into `count` elements at element displacement
    /// `disp` of `dst`. `data` must hold exactly `count` packed elements.
    pub fn unpack(
        &self,
        data: &[u8],
        dst: &mut RegionMut<'_>,
        disp: isize,
        count: usize,
    ) -> Result<()> {
        let expected = self.packed_len(count)?;
        if data.len() != expected {
            return Err(StrataError::BufferSizeMismatch {
                expected,
                actual: data.len(),
            });
        }
        if count == 0 {
            return Ok(());
        }
        let base = self.element_offset(disp)?;
        if self.is_contiguous() {
            dst.slice_mut(base, data.len())?.copy_from_slice(data);
            return Ok(());
        }
        let extent = self.extent as isize;
        let mut cursor = 0;
        for i in 0..count as isize {
            let elem = base + i * extent;
            for b in &self.blocks {
                dst.slice_mut(elem + b.offset as isize, b.len)?
                    .copy_from_slice(&data[cursor..cursor + b.len]);
                cursor += b.len;
            }
        }
        Ok(())
    }

    /// Copy `count` elements between two buffers of this type, block by
    /// block. Offsets are logical byte offsets of element 0.
    pub fn copy_content(
        &self,
        count: usize,
        dst: &mut RegionMut<'_>,
        dst_offset: isize,
        src: Region<'_>,
        src_offset: isize,
    ) -> Result<()> {
        if count == 0 {
            return Ok(());
        }
        self.data_range(src_offset, count)
            .and_then(|(lo, len)| src.slice(lo, len))?;
        let (lo, len) = self.data_range(dst_offset, count)?;
        dst.slice_mut(lo, len)?;
        let extent = self.extent as isize;
        for i in 0..count as isize {
            for b in &self.blocks {
                let off = i * extent + b.offset as isize;
                let from = src.slice(src_offset + off, b.len)?;
                dst.slice_mut(dst_offset + off, b.len)?.copy_from_slice(from);
            }
        }
        Ok(())
    }

    /// Logical byte offset of element `disp`.
    pub(crate) fn element_offset(&self, disp: isize) -> Result<isize> {
        disp.checked_mul(self.extent as isize)
            .ok_or(StrataError::BufferOutOfBounds {
                offset: isize::MAX,
                len: self.extent,
                capacity: 0,
            })
    }

    /// Byte range `(start, len)` touched by `count` elements whose element 0
    /// sits at logical offset `base`.
    fn data_range(&self, base: isize, count: usize) -> Result<(isize, usize)> {
        let (span, gap) = self.span(count)?;
        let lo = base.checked_add(gap).ok_or(StrataError::BufferOutOfBounds {
            offset: base,
            len: span,
            capacity: 0,
        })?;
        Ok((lo, span))
    }
}

fn push_block(blocks: &mut Vec<Block>, offset: usize, len: usize) {
    if len == 0 {
        return;
    }
    if let Some(last) = blocks.last_mut()
        && last.offset + last.len == offset
    {
        last.len += len;
        return;
    }
    blocks.push(Block { offset, len });
}

/// Read-only byte region; `start` is the logical offset of `bytes[0]`.
#[derive(Debug, Clone, Copy)]
pub struct Region<'a> {
    bytes: &'a [u8],
    start: isize,
}

impl<'a> Region<'a> {
    pub fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, start: 0 }
    }

    pub fn with_start(bytes: &'a [u8], start: isize) -> Self {
        Self { bytes, start }
    }

    fn slice(&self, logical: isize, len: usize) -> Result<&'a [u8]> {
        let range = index_range(logical - self.start, len, self.bytes.len())?;
        Ok(&self.bytes[range])
    }
}

/// Writable byte region; `start` is the logical offset of `bytes[0]`.
#[derive(Debug)]
pub struct RegionMut<'a> {
    bytes: &'a mut [u8],
    start: isize,
}

impl<'a> RegionMut<'a> {
    pub fn new(bytes: &'a mut [u8]) -> Self {
        Self { bytes, start: 0 }
    }

    pub fn with_start(bytes: &'a mut [u8], start: isize) -> Self {
        Self { bytes, start }
    }

    fn slice_mut(&mut self, logical: isize, len: usize) -> Result<&mut [u8]> {
        let range = index_range(logical - self.start, len, self.bytes.len())?;
        Ok(&mut self.bytes[range])
    }
}

fn index_range(index: isize, len: usize, capacity: usize) -> Result<std::ops::Range<usize>> {
    if len == 0 {
        return Ok(0..0);
    }
    let out_of_bounds = StrataError::BufferOutOfBounds {
        offset: index,
        len,
        capacity,
    };
    let start = usize::try_from(index).map_err(|_| out_of_bounds)?;
    match start.checked_add(len) {
        Some(end) if end <= capacity => Ok(start..end),
        _ => Err(StrataError::BufferOutOfBounds {
            offset: index,
            len,
            capacity,
        }),
    }
}
