use intl_capi::options::SegmenterWordType;
use intl_capi::provider::*;
use intl_capi::segmenter::*;
use intl_capi::sets::*;
use intl_capi::OwnedHandle;
use intl_capi_core::{intl_handle, intl_result_handle, AbiEnum, ErrorCode};

fn provider() -> OwnedHandle {
    let r = intl_data_provider_create_compiled_v1();
    OwnedHandle::from_result(r, intl_data_provider_destroy_v1).unwrap()
}

fn builder() -> OwnedHandle {
    let r = intl_code_point_set_builder_create_v1();
    OwnedHandle::from_result(r, intl_code_point_set_builder_destroy_v1).unwrap()
}

fn build(b: &OwnedHandle) -> OwnedHandle {
    let r = intl_code_point_set_builder_build_v1(b.raw());
    OwnedHandle::from_result(r, intl_code_point_set_data_destroy_v1).unwrap()
}

fn ranges(r: intl_result_handle) -> OwnedHandle {
    OwnedHandle::from_result(r, intl_code_point_range_iterator_destroy_v1).unwrap()
}

fn drain_ranges(it: &OwnedHandle) -> Vec<(u32, u32)> {
    let mut out = Vec::new();
    loop {
        let r = intl_code_point_range_iterator_next_v1(it.raw());
        if r.done {
            return out;
        }
        out.push((r.start, r.end));
    }
}

fn drain_offsets(next: extern "C" fn(intl_handle) -> i32, it: &OwnedHandle) -> Vec<i32> {
    let mut offsets = Vec::new();
    loop {
        match next(it.raw()) {
            -1 => return offsets,
            b => offsets.push(b),
        }
    }
}

#[test]
fn built_set_iterates_in_order() {
    let b = builder();
    intl_code_point_set_builder_add_inclusive_range_v1(b.raw(), 0x61, 0x7A);
    intl_code_point_set_builder_add_char_v1(b.raw(), 0x30);
    intl_code_point_set_builder_add_inclusive_range_v1(b.raw(), 0x41, 0x5A);
    intl_code_point_set_builder_remove_inclusive_range_v1(b.raw(), 0x4E, 0x60);
    assert!(!intl_code_point_set_builder_is_empty_v1(b.raw()));

    let set = build(&b);
    assert!(intl_code_point_set_builder_is_empty_v1(b.raw()));
    assert!(intl_code_point_set_data_contains_v1(set.raw(), 0x62));
    assert!(!intl_code_point_set_data_contains_v1(set.raw(), 0x50));

    let it = ranges(intl_code_point_set_data_iter_ranges_v1(set.raw()));
    assert_eq!(drain_ranges(&it), vec![(0x30, 0x30), (0x41, 0x4D), (0x61, 0x7A)]);
    for _ in 0..3 {
        assert!(intl_code_point_range_iterator_next_v1(it.raw()).done);
    }
}

#[test]
fn empty_set_is_exhausted_at_once() {
    let set = build(&builder());
    let it = ranges(intl_code_point_set_data_iter_ranges_v1(set.raw()));
    let first = intl_code_point_range_iterator_next_v1(it.raw());
    assert!(first.done);

    let all = ranges(intl_code_point_set_data_iter_ranges_complemented_v1(set.raw()));
    assert_eq!(drain_ranges(&all), vec![(0, 0x10FFFF)]);
}

#[test]
fn builder_complement() {
    let b = builder();
    intl_code_point_set_builder_add_inclusive_range_v1(b.raw(), 0, 0xFF);
    intl_code_point_set_builder_complement_v1(b.raw());
    let set = build(&b);
    let it = ranges(intl_code_point_set_data_iter_ranges_v1(set.raw()));
    assert_eq!(drain_ranges(&it), vec![(0x100, 0x10FFFF)]);
}

#[test]
fn property_sets_from_the_provider() {
    let p = provider();
    let name = "Nd";
    let r = unsafe {
        intl_code_point_set_data_load_for_property_v1(p.raw(), name.as_ptr(), name.len())
    };
    let digits = OwnedHandle::from_result(r, intl_code_point_set_data_destroy_v1).unwrap();
    assert!(intl_code_point_set_data_contains_v1(digits.raw(), '7' as u32));
    assert!(intl_code_point_set_data_contains_v1(digits.raw(), 0x0E53));
    assert!(!intl_code_point_set_data_contains_v1(digits.raw(), 'x' as u32));

    let unknown = "Not_A_Property";
    let r = unsafe {
        intl_code_point_set_data_load_for_property_v1(p.raw(), unknown.as_ptr(), unknown.len())
    };
    assert_eq!(r.into_result(), Err(ErrorCode::DataNotFound));

    let r = intl_data_provider_create_empty_v1();
    let empty = OwnedHandle::from_result(r, intl_data_provider_destroy_v1).unwrap();
    let r = unsafe {
        intl_code_point_set_data_load_for_property_v1(empty.raw(), name.as_ptr(), name.len())
    };
    assert_eq!(r.into_result(), Err(ErrorCode::DataNotFound));
}

#[test]
fn surrogate_sets_cover_the_surrogate_block() {
    let p = provider();
    for name in ["Cs", "Any"] {
        let r = unsafe {
            intl_code_point_set_data_load_for_property_v1(p.raw(), name.as_ptr(), name.len())
        };
        let set = OwnedHandle::from_result(r, intl_code_point_set_data_destroy_v1).unwrap();
        assert!(intl_code_point_set_data_contains_v1(set.raw(), 0xD800), "{name}");
        assert!(intl_code_point_set_data_contains_v1(set.raw(), 0xDFFF), "{name}");
    }
}

#[test]
fn general_category_map_lookups_and_ranges() {
    let p = provider();
    let r = intl_code_point_map_data8_load_general_category_v1(p.raw());
    let map = OwnedHandle::from_result(r, intl_code_point_map_data8_destroy_v1).unwrap();
    assert_eq!(intl_code_point_map_data8_get_v1(map.raw(), 'A' as u32), 1);
    assert_eq!(intl_code_point_map_data8_get_v1(map.raw(), 'a' as u32), 2);
    assert_eq!(intl_code_point_map_data8_get_v1(map.raw(), 0xD800), 18);
    assert_eq!(intl_code_point_map_data8_get_v1(map.raw(), 0x11_0000), 0);

    let digits = ranges(intl_code_point_map_data8_iter_ranges_for_value_v1(map.raw(), 9));
    assert_eq!(intl_code_point_range_iterator_next_v1(digits.raw()).start, 0x30);
    let r = intl_code_point_map_data8_iter_ranges_for_value_complemented_v1(map.raw(), 9);
    let others = ranges(r);
    let first = intl_code_point_range_iterator_next_v1(others.raw());
    assert_eq!((first.start, first.end), (0, 0x2F));

    let r = intl_code_point_map_data8_get_set_for_value_v1(map.raw(), 18);
    let surrogates = OwnedHandle::from_result(r, intl_code_point_set_data_destroy_v1).unwrap();
    let all = ranges(intl_code_point_set_data_iter_ranges_v1(surrogates.raw()));
    assert_eq!(drain_ranges(&all), vec![(0xD800, 0xDFFF)]);

    // The derived set stays valid after the map is gone.
    drop(map);
    assert!(intl_code_point_set_data_contains_v1(surrogates.raw(), 0xDC00));
    assert!(intl_code_point_range_iterator_next_v1(digits.raw()).done);

    let r = intl_data_provider_create_empty_v1();
    let empty = OwnedHandle::from_result(r, intl_data_provider_destroy_v1).unwrap();
    let r = intl_code_point_map_data8_load_general_category_v1(empty.raw());
    assert_eq!(r.into_result(), Err(ErrorCode::DataNotFound));
}

fn word_segmenter() -> (OwnedHandle, OwnedHandle) {
    let p = provider();
    let r = intl_word_segmenter_create_auto_v1(p.raw());
    let seg = OwnedHandle::from_result(r, intl_word_segmenter_destroy_v1).unwrap();
    (p, seg)
}

#[test]
fn word_breaks_with_types() {
    let (_p, seg) = word_segmenter();
    let text = "Hello World";
    let r = unsafe { intl_word_segmenter_segment_utf8_v1(seg.raw(), text.as_ptr(), text.len()) };
    let it = OwnedHandle::from_result(r, intl_word_break_iterator_destroy_v1).unwrap();

    let mut seen = Vec::new();
    loop {
        let b = intl_word_break_iterator_next_v1(it.raw());
        if b == -1 {
            break;
        }
        seen.push((
            b,
            intl_word_break_iterator_word_type_v1(it.raw()),
            intl_word_break_iterator_is_word_like_v1(it.raw()),
        ));
    }
    let letter = SegmenterWordType::Letter.to_abi();
    assert_eq!(
        seen,
        vec![(0, 0, false), (5, letter, true), (6, 0, false), (11, letter, true)]
    );

    assert_eq!(intl_word_break_iterator_next_v1(it.raw()), -1);
    assert_eq!(
        intl_word_break_iterator_word_type_v1(it.raw()),
        SegmenterWordType::None.to_abi()
    );
    assert!(!intl_word_break_iterator_is_word_like_v1(it.raw()));
}

#[test]
fn empty_text_yields_only_the_sentinel() {
    let (_p, seg) = word_segmenter();
    let r = unsafe { intl_word_segmenter_segment_utf8_v1(seg.raw(), core::ptr::null(), 0) };
    let it = OwnedHandle::from_result(r, intl_word_break_iterator_destroy_v1).unwrap();
    assert_eq!(intl_word_break_iterator_next_v1(it.raw()), -1);
    assert_eq!(intl_word_break_iterator_next_v1(it.raw()), -1);
}

#[test]
fn utf16_offsets_and_invalid_input() {
    let (_p, seg) = word_segmenter();
    let text: Vec<u16> = "go 😀".encode_utf16().collect();
    let r = unsafe { intl_word_segmenter_segment_utf16_v1(seg.raw(), text.as_ptr(), text.len()) };
    let it = OwnedHandle::from_result(r, intl_word_break_iterator_destroy_v1).unwrap();
    assert_eq!(drain_offsets(intl_word_break_iterator_next_v1, &it), vec![0, 2, 3, 5]);

    let lone = [0x67u16, 0xDC00];
    let r = unsafe { intl_word_segmenter_segment_utf16_v1(seg.raw(), lone.as_ptr(), lone.len()) };
    assert_eq!(r.into_result(), Err(ErrorCode::InvalidArgument));

    let bad = [0x67u8, 0xFF];
    let r = unsafe { intl_word_segmenter_segment_utf8_v1(seg.raw(), bad.as_ptr(), bad.len()) };
    assert_eq!(r.into_result(), Err(ErrorCode::InvalidArgument));
}

fn grapheme_segmenter() -> (OwnedHandle, OwnedHandle) {
    let p = provider();
    let r = intl_grapheme_cluster_segmenter_create_v1(p.raw());
    let seg = OwnedHandle::from_result(r, intl_grapheme_cluster_segmenter_destroy_v1).unwrap();
    (p, seg)
}

#[test]
fn grapheme_clusters() {
    let (_p, seg) = grapheme_segmenter();
    let text = "🇩🇪a";
    let r = unsafe {
        intl_grapheme_cluster_segmenter_segment_utf8_v1(seg.raw(), text.as_ptr(), text.len())
    };
    let it = OwnedHandle::from_result(r, intl_grapheme_cluster_break_iterator_destroy_v1).unwrap();
    let next = intl_grapheme_cluster_break_iterator_next_v1;
    assert_eq!(drain_offsets(next, &it), vec![0, 8, 9]);
}

#[test]
fn grapheme_clusters_in_utf16() {
    let (_p, seg) = grapheme_segmenter();
    let text: Vec<u16> = "🇩🇪a".encode_utf16().collect();
    let r = unsafe {
        intl_grapheme_cluster_segmenter_segment_utf16_v1(seg.raw(), text.as_ptr(), text.len())
    };
    let it = OwnedHandle::from_result(r, intl_grapheme_cluster_break_iterator_destroy_v1).unwrap();
    let next = intl_grapheme_cluster_break_iterator_next_v1;
    assert_eq!(drain_offsets(next, &it), vec![0, 4, 5]);

    let lone = [0xD83Cu16];
    let r = unsafe {
        intl_grapheme_cluster_segmenter_segment_utf16_v1(seg.raw(), lone.as_ptr(), lone.len())
    };
    assert_eq!(r.into_result(), Err(ErrorCode::InvalidArgument));
}
