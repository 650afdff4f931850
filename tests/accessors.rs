//! Integration tests for the scalar accessor contract and snapshots.

use largearray::{
    ArrayContext, ElementKind, LargeAccess, LargeArray, LargeArrayError, NumericLargeArray,
    PrimitiveAccess, Value,
};
use proptest::prelude::*;

fn context(threshold: i64) -> ArrayContext {
    let ctx = ArrayContext::new();
    ctx.set_threshold(threshold).unwrap();
    ctx
}

/// One dense and one raw array of `kind`, both of length `len`.
fn both_backends(ctx: &ArrayContext, kind: ElementKind, len: u64) -> [LargeArray; 2] {
    ctx.set_threshold(len as i64).unwrap();
    let dense = ctx.create(kind, len).unwrap();
    ctx.set_threshold(len as i64 - 1).unwrap();
    let raw = ctx.create(kind, len).unwrap();
    assert!(!dense.is_raw_backed());
    assert!(raw.is_raw_backed());
    [dense, raw]
}

#[test]
fn test_double_read_as_byte() {
    let ctx = context(0);
    for arr in both_backends(&ctx, ElementKind::Double, 5) {
        let mut arr = arr;
        for (i, v) in [1.0, -2.5, 3.9, 0.0, 100.0].into_iter().enumerate() {
            arr.set_checked::<f64>(i as u64, v).unwrap();
        }
        let read: Vec<i8> = (0..5).map(|i| arr.get_checked::<i8>(i).unwrap()).collect();
        assert_eq!(read, vec![1, -2, 3, 0, 100]);
    }
}

#[test]
fn test_checked_access_out_of_range_for_every_kind() {
    let ctx = context(0);
    let len = 17;
    for kind in ElementKind::ALL {
        for mut arr in both_backends(&ctx, kind, len) {
            for idx in [len, u64::MAX] {
                let oob = LargeArrayError::IndexOutOfRange { index: idx, len };
                if kind == ElementKind::String {
                    assert_eq!(arr.get_str(idx), Err(oob.clone()));
                    assert_eq!(arr.set_str(idx, "a"), Err(oob.clone()));
                } else {
                    assert_eq!(arr.get_checked::<i32>(idx), Err(oob.clone()));
                    assert_eq!(arr.set_checked::<f32>(idx, 1.0), Err(oob.clone()));
                }
                assert_eq!(arr.get_value(idx), Err(oob));
            }
        }
    }
}

#[test]
fn test_cast_rule_through_every_kind() {
    let ctx = context(0);
    for kind in ElementKind::ALL.into_iter().filter(|k| k.is_primitive()) {
        for mut arr in both_backends(&ctx, kind, 9) {
            arr.set_checked::<f64>(0, 3.9).unwrap();
            arr.set_checked::<f32>(1, -0.0).unwrap();
            arr.set_checked::<f64>(2, f64::NAN).unwrap();
            arr.set_checked::<bool>(3, true).unwrap();

            let expect_39: f64 = match kind {
                ElementKind::Bit => 1.0,
                ElementKind::Float => 3.9f32 as f64,
                ElementKind::Double => 3.9,
                _ => 3.0,
            };
            assert_eq!(arr.get_checked::<f64>(0).unwrap(), expect_39, "{kind}");
            assert!(arr.get_checked::<bool>(0).unwrap());
            assert!(!arr.get_checked::<bool>(1).unwrap(), "{kind}");
            // NaN is nonzero for bits, 0 for integers, NaN for floats
            let nan_as_bool = arr.get_checked::<bool>(2).unwrap();
            assert_eq!(nan_as_bool, !matches!(
                kind,
                ElementKind::Byte | ElementKind::Short | ElementKind::Int | ElementKind::Long
            ));
            assert_eq!(arr.get_checked::<i64>(3).unwrap(), 1);
        }
    }
}

#[test]
fn test_integer_narrowing_on_store() {
    let ctx = context(0);
    for mut arr in both_backends(&ctx, ElementKind::Byte, 3) {
        arr.set_checked::<i32>(0, 300).unwrap();
        arr.set_checked::<f64>(1, 1e10).unwrap();
        arr.set_checked::<i64>(2, -129).unwrap();
        assert_eq!(arr.get_value(0).unwrap(), Value::Byte(44));
        assert_eq!(arr.get_value(1).unwrap(), Value::Byte(-1));
        assert_eq!(arr.get_value(2).unwrap(), Value::Byte(127));
    }
}

#[test]
fn test_string_elements_in_both_backends() {
    let ctx = context(0);
    ctx.set_threshold(3).unwrap();
    let mut dense = ctx.create_string(3, 5).unwrap();
    let mut raw = ctx.create_string(4, 5).unwrap();
    for arr in [&mut dense, &mut raw] {
        arr.set_str(0, "ab").unwrap();
        arr.set_value(2, &Value::from("wxyz")).unwrap();
        assert_eq!(arr.get_str(0).unwrap(), "ab");
        assert_eq!(arr.get_value(2).unwrap(), Value::String("wxyz".into()));
        assert_eq!(arr.get_str(1).unwrap(), "");
        assert!(matches!(
            arr.set_str(1, "sixsix"),
            Err(LargeArrayError::InvalidArgument(_))
        ));
        assert_eq!(arr.element_size(), 9);
    }
}

#[test]
fn test_snapshots_dense_only() {
    let ctx = context(8);
    let dense: LargeArray = NumericLargeArray::from_vec_in(&ctx, vec![1i16, 2, 3]).unwrap().into();
    assert_eq!(dense.to_vec::<f64>(), Some(vec![1.0, 2.0, 3.0]));
    assert_eq!(dense.as_numeric::<i16>().unwrap().as_dense_slice(), Some(&[1i16, 2, 3][..]));

    let raw = ctx.create(ElementKind::Int, 9).unwrap();
    assert!(raw.to_vec::<i32>().is_none());
    assert!(raw.as_numeric::<i32>().unwrap().as_dense_slice().is_none());

    let strings = ctx.create_string(9, 4).unwrap();
    assert!(strings.as_string().unwrap().to_string_vec().is_none());
}

#[test]
fn test_window_semantics() {
    let ctx = context(100);
    let values: Vec<i32> = (0..20).collect();
    let arr: LargeArray = NumericLargeArray::from_vec_in(&ctx, values).unwrap().into();

    let w = arr.window::<i64>(None, 3, 20, 5).unwrap().unwrap();
    assert_eq!(w, vec![3, 8, 13, 18]);

    let reuse = arr.window(Some(vec![0i32; 10]), 0, 6, 2).unwrap().unwrap();
    assert_eq!(reuse.len(), 10);
    assert_eq!(&reuse[..3], &[0, 2, 4]);

    let small = arr.window(Some(vec![0i32; 1]), 0, 6, 2).unwrap().unwrap();
    assert_eq!(small, vec![0, 2, 4]);

    assert!(matches!(
        arr.window::<i32>(None, 0, 5, 0),
        Err(LargeArrayError::InvalidArgument(_))
    ));
    assert!(matches!(
        arr.window::<i32>(None, 20, 20, 1),
        Err(LargeArrayError::IndexOutOfRange { .. })
    ));
    assert!(matches!(
        arr.window::<i32>(None, 5, 21, 1),
        Err(LargeArrayError::IndexOutOfRange { .. })
    ));

    ctx.set_threshold(3).unwrap();
    assert!(arr.window::<i32>(None, 0, 20, 5).unwrap().is_none());
    assert_eq!(arr.window::<i32>(None, 0, 20, 7).unwrap().unwrap(), vec![0, 7, 14]);
}

proptest! {
    #[test]
    fn prop_long_round_trip_matches_cast(v in any::<i64>(), raw in any::<bool>()) {
        let ctx = context(if raw { 0 } else { 4 });
        let mut arr = ctx.create(ElementKind::Long, 4).unwrap();
        arr.set_checked::<i64>(2, v).unwrap();
        prop_assert_eq!(arr.is_raw_backed(), raw);
        prop_assert_eq!(arr.get_checked::<i64>(2).unwrap(), v);
        prop_assert_eq!(arr.get_checked::<i8>(2).unwrap(), v as i8);
        prop_assert_eq!(arr.get_checked::<f64>(2).unwrap(), v as f64);
        prop_assert_eq!(arr.get_checked::<bool>(2).unwrap(), v != 0);
    }

    #[test]
    fn prop_float_store_truncates(v in -1e6f64..1e6) {
        let ctx = context(0);
        let mut arr = ctx.create(ElementKind::Int, 2).unwrap();
        arr.set_checked::<f64>(1, v).unwrap();
        prop_assert_eq!(arr.get_checked::<i32>(1).unwrap(), v.trunc() as i32);
    }
}
