//! Word and grapheme cluster segmentation behind break iterator handles.
//!
//! Boundaries are computed eagerly when a string is segmented, so iterators
//! never borrow caller memory. An iterator reports offset 0 first, then the
//! end of every segment, then [`BOUNDARY_SENTINEL`] forever.

use intl_capi_core::handle::{self, intl_handle};
use intl_capi_core::{guard, guard_or, intl_result_handle, utf16_from_raw, utf8_from_raw};
use intl_capi_core::{AbiEnum, ErrorCode, Object, Stepper, BOUNDARY_SENTINEL};
use unicode_segmentation::UnicodeSegmentation;

use crate::options::SegmenterWordType;
use crate::provider::DataProvider;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Boundary {
    pub offset: i32,
    /// Type of the segment ending at this boundary.
    pub word_type: SegmenterWordType,
}

fn classify(segment: &str) -> SegmenterWordType {
    if segment.chars().any(char::is_alphabetic) {
        SegmenterWordType::Letter
    } else if segment.chars().any(char::is_numeric) {
        SegmenterWordType::Number
    } else {
        SegmenterWordType::None
    }
}

fn to_offset(n: usize) -> Result<i32, ErrorCode> {
    i32::try_from(n).map_err(|_| ErrorCode::InternalLimitExceeded)
}

/// Word boundaries as byte offsets into `text`.
pub fn word_boundaries(text: &str) -> Result<Vec<Boundary>, ErrorCode> {
    if text.is_empty() {
        return Ok(Vec::new());
    }
    let mut out = vec![Boundary {
        offset: 0,
        word_type: SegmenterWordType::None,
    }];
    for (start, segment) in text.split_word_bound_indices() {
        out.push(Boundary {
            offset: to_offset(start + segment.len())?,
            word_type: classify(segment),
        });
    }
    Ok(out)
}

pub fn grapheme_boundaries(text: &str) -> Result<Vec<i32>, ErrorCode> {
    if text.is_empty() {
        return Ok(Vec::new());
    }
    let mut out = vec![0];
    for (start, cluster) in text.grapheme_indices(true) {
        out.push(to_offset(start + cluster.len())?);
    }
    Ok(out)
}

/// Decodes UTF-16 and returns the text plus, for every byte offset that
/// starts a char (and the end), the matching UTF-16 offset.
fn decode_utf16(units: &[u16]) -> Result<(String, Vec<(usize, usize)>), ErrorCode> {
    let mut text = String::with_capacity(units.len());
    let mut map = Vec::with_capacity(units.len() + 1);
    let mut u16_pos = 0;
    for ch in char::decode_utf16(units.iter().copied()) {
        let ch = ch.map_err(|_| ErrorCode::InvalidArgument)?;
        map.push((text.len(), u16_pos));
        text.push(ch);
        u16_pos += ch.len_utf16();
    }
    map.push((text.len(), u16_pos));
    Ok((text, map))
}

fn utf16_offset(byte: i32, map: &[(usize, usize)]) -> Result<i32, ErrorCode> {
    let byte = usize::try_from(byte).map_err(|_| ErrorCode::InvalidArgument)?;
    let idx = map
        .binary_search_by_key(&byte, |&(bytes, _)| bytes)
        .map_err(|_| ErrorCode::InvalidArgument)?;
    to_offset(map[idx].1)
}

fn remap_to_utf16(boundaries: &mut [Boundary], map: &[(usize, usize)]) -> Result<(), ErrorCode> {
    for b in boundaries {
        b.offset = utf16_offset(b.offset, map)?;
    }
    Ok(())
}

pub struct WordSegmenter;

impl Object for WordSegmenter {
    const KIND: &'static str = "WordSegmenter";
}

pub struct GraphemeClusterSegmenter;

impl Object for GraphemeClusterSegmenter {
    const KIND: &'static str = "GraphemeClusterSegmenter";
}

pub struct WordBreakIterator(Stepper<std::vec::IntoIter<Boundary>>);

impl Object for WordBreakIterator {
    const KIND: &'static str = "WordBreakIterator";
}

pub struct GraphemeClusterBreakIterator(Stepper<std::vec::IntoIter<i32>>);

impl Object for GraphemeClusterBreakIterator {
    const KIND: &'static str = "GraphemeClusterBreakIterator";
}

fn require_segmenter(provider: intl_handle, name: &str) -> Result<(), ErrorCode> {
    let p = handle::get::<DataProvider>(provider)?;
    if p.bundle().has_segmenter(name) {
        Ok(())
    } else {
        Err(ErrorCode::DataNotFound)
    }
}

#[no_mangle]
pub extern "C" fn intl_word_segmenter_create_auto_v1(provider: intl_handle) -> intl_result_handle {
    guard("word_segmenter.create_auto", || {
        require_segmenter(provider, "word")?;
        handle::insert(WordSegmenter)
    })
}

fn word_iterator(
    segmenter: intl_handle,
    boundaries: Vec<Boundary>,
) -> Result<intl_handle, ErrorCode> {
    let steps = Stepper::new(boundaries.into_iter());
    handle::insert_dependent(segmenter, WordBreakIterator(steps))
}

fn grapheme_iterator(
    segmenter: intl_handle,
    boundaries: Vec<i32>,
) -> Result<intl_handle, ErrorCode> {
    let steps = Stepper::new(boundaries.into_iter());
    handle::insert_dependent(segmenter, GraphemeClusterBreakIterator(steps))
}

/// The iterator is bound to the segmenter; offsets are UTF-8 byte offsets.
#[no_mangle]
pub unsafe extern "C" fn intl_word_segmenter_segment_utf8_v1(
    segmenter: intl_handle,
    ptr: *const u8,
    len: usize,
) -> intl_result_handle {
    guard("word_segmenter.segment_utf8", || {
        handle::get::<WordSegmenter>(segmenter)?;
        let text = utf8_from_raw(ptr, len)?;
        word_iterator(segmenter, word_boundaries(text)?)
    })
}

/// Offsets are UTF-16 code unit offsets. Unpaired surrogates are rejected.
#[no_mangle]
pub unsafe extern "C" fn intl_word_segmenter_segment_utf16_v1(
    segmenter: intl_handle,
    ptr: *const u16,
    len: usize,
) -> intl_result_handle {
    guard("word_segmenter.segment_utf16", || {
        handle::get::<WordSegmenter>(segmenter)?;
        let (text, map) = decode_utf16(utf16_from_raw(ptr, len)?)?;
        let mut boundaries = word_boundaries(&text)?;
        remap_to_utf16(&mut boundaries, &map)?;
        word_iterator(segmenter, boundaries)
    })
}

#[no_mangle]
pub extern "C" fn intl_word_segmenter_destroy_v1(segmenter: intl_handle) {
    crate::destroy::<WordSegmenter>("word_segmenter.destroy", segmenter);
}

#[no_mangle]
pub extern "C" fn intl_word_break_iterator_next_v1(it: intl_handle) -> i32 {
    guard_or("word_break_iterator.next", BOUNDARY_SENTINEL, || {
        handle::get::<WordBreakIterator>(it)
            .ok()
            .and_then(|i| i.0.advance())
            .map_or(BOUNDARY_SENTINEL, |b| b.offset)
    })
}

fn current_word_type(it: intl_handle) -> SegmenterWordType {
    handle::get::<WordBreakIterator>(it).map_or(SegmenterWordType::None, |i| {
        i.0.inspect(|b| b.map_or(SegmenterWordType::None, |b| b.word_type))
    })
}

/// Type of the segment ending at the last boundary returned by `next`.
#[no_mangle]
pub extern "C" fn intl_word_break_iterator_word_type_v1(it: intl_handle) -> u32 {
    guard_or("word_break_iterator.word_type", SegmenterWordType::None.to_abi(), || {
        current_word_type(it).to_abi()
    })
}

#[no_mangle]
pub extern "C" fn intl_word_break_iterator_is_word_like_v1(it: intl_handle) -> bool {
    guard_or("word_break_iterator.is_word_like", false, || {
        current_word_type(it) != SegmenterWordType::None
    })
}

#[no_mangle]
pub extern "C" fn intl_word_break_iterator_destroy_v1(it: intl_handle) {
    crate::destroy::<WordBreakIterator>("word_break_iterator.destroy", it);
}

#[no_mangle]
pub extern "C" fn intl_grapheme_cluster_segmenter_create_v1(
    provider: intl_handle,
) -> intl_result_handle {
    guard("grapheme_cluster_segmenter.create", || {
        require_segmenter(provider, "grapheme")?;
        handle::insert(GraphemeClusterSegmenter)
    })
}

#[no_mangle]
pub unsafe extern "C" fn intl_grapheme_cluster_segmenter_segment_utf8_v1(
    segmenter: intl_handle,
    ptr: *const u8,
    len: usize,
) -> intl_result_handle {
    guard("grapheme_cluster_segmenter.segment_utf8", || {
        handle::get::<GraphemeClusterSegmenter>(segmenter)?;
        let text = utf8_from_raw(ptr, len)?;
        grapheme_iterator(segmenter, grapheme_boundaries(text)?)
    })
}

/// Offsets are UTF-16 code unit offsets. Unpaired surrogates are rejected.
#[no_mangle]
pub unsafe extern "C" fn intl_grapheme_cluster_segmenter_segment_utf16_v1(
    segmenter: intl_handle,
    ptr: *const u16,
    len: usize,
) -> intl_result_handle {
    guard("grapheme_cluster_segmenter.segment_utf16", || {
        handle::get::<GraphemeClusterSegmenter>(segmenter)?;
        let (text, map) = decode_utf16(utf16_from_raw(ptr, len)?)?;
        let boundaries = grapheme_boundaries(&text)?
            .into_iter()
            .map(|b| utf16_offset(b, &map))
            .collect::<Result<Vec<_>, _>>()?;
        grapheme_iterator(segmenter, boundaries)
    })
}

#[no_mangle]
pub extern "C" fn intl_grapheme_cluster_segmenter_destroy_v1(segmenter: intl_handle) {
    let op = "grapheme_cluster_segmenter.destroy";
    crate::destroy::<GraphemeClusterSegmenter>(op, segmenter);
}

#[no_mangle]
pub extern "C" fn intl_grapheme_cluster_break_iterator_next_v1(it: intl_handle) -> i32 {
    guard_or("grapheme_cluster_break_iterator.next", BOUNDARY_SENTINEL, || {
        handle::get::<GraphemeClusterBreakIterator>(it)
            .ok()
            .and_then(|i| i.0.advance())
            .unwrap_or(BOUNDARY_SENTINEL)
    })
}

#[no_mangle]
pub extern "C" fn intl_grapheme_cluster_break_iterator_destroy_v1(it: intl_handle) {
    let op = "grapheme_cluster_break_iterator.destroy";
    crate::destroy::<GraphemeClusterBreakIterator>(op, it);
}
