use colview_columnar::{apply_predicate, Column, ColumnStore, ColumnType, FilterExpr, Value};
use colview_eval::{elementwise, EvalError, FilteredView};
use pretty_assertions::assert_eq;
use std::sync::{Arc, Mutex};

fn ints(values: impl IntoIterator<Item = i64>) -> Vec<Value> {
    values.into_iter().map(Value::Int).collect()
}

fn store_0_to_9() -> ColumnStore {
    ColumnStore::from_columns([("x", Column::from_i64((0..10).collect()))]).unwrap()
}

fn filtered_without_4() -> FilteredView {
    let store = store_0_to_9();
    let mask = apply_predicate(&store, &FilterExpr::ne("x", 4)).unwrap();
    FilteredView::with_mask(store, mask).unwrap()
}

fn square(args: &[Column]) -> colview_eval::FunctionResult {
    let x = &args[0];
    let values = x.as_i64().ok_or("square expects an int column")?;
    assert!(!values.contains(&4), "filtered-out row reached square: {values:?}");
    Ok(x.map_i64(|v| v * v).ok_or("square expects an int column")?)
}

#[test]
fn evaluate_function_on_filtered_view_skips_filtered_rows() {
    let mut df_filtered = filtered_without_4();
    df_filtered.register_function("custom_function", square).unwrap();
    df_filtered
        .define_virtual_column("y", "custom_function", ["x"])
        .unwrap();

    assert_eq!(
        df_filtered.materialize("y").unwrap(),
        ints([0, 1, 4, 9, 25, 36, 49, 64, 81])
    );
}

#[test]
fn function_sees_only_surviving_values_in_row_order() {
    let seen: Arc<Mutex<Vec<Vec<Value>>>> = Arc::default();
    let mut view = filtered_without_4();

    let record = Arc::clone(&seen);
    view.register_function("record", move |args: &[Column]| {
        record.lock().unwrap().push(args[0].to_values());
        Ok(args[0].clone())
    })
    .unwrap();
    view.define_virtual_column("r", "record", ["x"]).unwrap();

    let out = view.evaluate("r").unwrap();
    assert_eq!(out.len(), view.visible_row_count());
    assert_eq!(out.to_values(), ints([0, 1, 2, 3, 5, 6, 7, 8, 9]));

    let calls = seen.lock().unwrap();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0], ints([0, 1, 2, 3, 5, 6, 7, 8, 9]));
}

#[test]
fn stored_columns_are_gathered_at_visible_rows() {
    let store = ColumnStore::from_columns([
        ("x", Column::from_i64((0..6).collect())),
        ("s", Column::from_strings(["a", "b", "c", "d", "e", "f"])),
    ])
    .unwrap();
    let mask = apply_predicate(&store, &FilterExpr::gte("x", 2).and(FilterExpr::ne("x", 4)))
        .unwrap();
    let view = FilteredView::with_mask(store, mask).unwrap();

    assert_eq!(view.visible_row_count(), 3);
    assert_eq!(view.row_indices(), vec![2, 3, 5]);
    assert_eq!(
        view.materialize("s").unwrap(),
        vec![Value::from("c"), Value::from("d"), Value::from("f")]
    );
}

#[test]
fn unfiltered_view_evaluates_every_row() {
    let mut view = FilteredView::new(store_0_to_9());
    view.register_function("double", |args: &[Column]| {
        Ok(args[0].map_i64(|v| v * 2).ok_or("int column expected")?)
    })
    .unwrap();
    view.define_virtual_column("d", "double", ["x"]).unwrap();

    assert!(!view.is_filtered());
    assert_eq!(view.visible_row_count(), 10);
    assert_eq!(
        view.materialize("d").unwrap(),
        ints((0..10).map(|v| v * 2))
    );
}

#[test]
fn evaluation_is_idempotent() {
    let mut view = filtered_without_4();
    view.register_function("square", square).unwrap();
    view.define_virtual_column("y", "square", ["x"]).unwrap();

    let first = view.evaluate("y").unwrap();
    let second = view.evaluate("y").unwrap();
    assert_eq!(first, second);
}

#[test]
fn nested_virtual_columns_keep_alignment() {
    let mut view = filtered_without_4();
    view.register_function("square", square).unwrap();
    view.register(
        "add",
        elementwise(|row: &[Value]| match (&row[0], &row[1]) {
            (Value::Int(a), Value::Int(b)) => Value::Int(a + b),
            _ => Value::Null,
        }),
    )
    .unwrap();
    view.define_virtual_column("y", "square", ["x"]).unwrap();
    view.define_virtual_column("z", "add", ["x", "y"]).unwrap();

    assert_eq!(
        view.materialize("z").unwrap(),
        ints([0, 2, 6, 12, 30, 42, 56, 72, 90])
    );
}

#[test]
fn shared_sources_are_computed_once_per_evaluation() {
    let calls = Arc::new(Mutex::new(0usize));
    let mut view = filtered_without_4();

    let counter = Arc::clone(&calls);
    view.register_function("counted", move |args: &[Column]| {
        *counter.lock().unwrap() += 1;
        Ok(args[0].clone())
    })
    .unwrap();
    view.register("pair", elementwise(|row: &[Value]| row[0].clone()))
        .unwrap();
    view.define_virtual_column("c", "counted", ["x"]).unwrap();
    view.define_virtual_column("p", "pair", ["c", "c"]).unwrap();

    view.evaluate("p").unwrap();
    assert_eq!(*calls.lock().unwrap(), 1);

    // No caching across evaluations.
    view.evaluate("p").unwrap();
    assert_eq!(*calls.lock().unwrap(), 2);
}

#[test]
fn fully_filtered_view_calls_function_with_empty_input() {
    let store = store_0_to_9();
    let mask = apply_predicate(&store, &FilterExpr::gt("x", 100)).unwrap();
    let mut view = FilteredView::with_mask(store, mask).unwrap();

    let lengths: Arc<Mutex<Vec<usize>>> = Arc::default();
    let record = Arc::clone(&lengths);
    view.register_function("len", move |args: &[Column]| {
        record.lock().unwrap().push(args[0].len());
        Ok(Column::from_f64(Vec::new()))
    })
    .unwrap();
    view.define_virtual_column("empty", "len", ["x"]).unwrap();

    assert_eq!(view.visible_row_count(), 0);
    assert!(view.materialize("empty").unwrap().is_empty());
    assert_eq!(*lengths.lock().unwrap(), vec![0]);
}

#[test]
fn output_length_must_match_visible_rows() {
    let mut view = filtered_without_4();
    view.register_function("truncate", |args: &[Column]| Ok(args[0].take(&[0, 1])))
        .unwrap();
    view.define_virtual_column("t", "truncate", ["x"]).unwrap();

    let err = view.evaluate("t").unwrap_err();
    match err {
        EvalError::ArityMismatch {
            column,
            function,
            expected,
            actual,
        } => {
            assert_eq!(column, "t");
            assert_eq!(function, "truncate");
            assert_eq!(expected, 9);
            assert_eq!(actual, 2);
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn function_errors_keep_the_original_source() {
    let mut view = filtered_without_4();
    view.register_function("fail", |_: &[Column]| Err("boom".into()))
        .unwrap();
    view.define_virtual_column("f", "fail", ["x"]).unwrap();

    let err = view.evaluate("f").unwrap_err();
    assert!(matches!(err, EvalError::Function { ref function, .. } if function == "fail"));
    let source = std::error::Error::source(&err).expect("function error has a source");
    assert_eq!(source.to_string(), "boom");
}

#[test]
#[should_panic(expected = "filtered-out row reached square")]
fn function_panics_propagate_to_the_caller() {
    let mut view = FilteredView::new(store_0_to_9());
    view.register_function("square", square).unwrap();
    view.define_virtual_column("y", "square", ["x"]).unwrap();
    let _ = view.evaluate("y");
}

#[test]
fn float_results_are_preserved() {
    let mut view = filtered_without_4();
    view.register_function("half", |args: &[Column]| {
        Ok(args[0].map_f64(|v| v / 2.0).ok_or("numeric column expected")?)
    })
    .unwrap();
    view.define_virtual_column("h", "half", ["x"]).unwrap();

    let h = view.evaluate("h").unwrap();
    assert_eq!(h.column_type(), ColumnType::Float);
    assert_eq!(h.get(4), Value::Float(2.5));
}

#[test]
fn elementwise_results_keep_their_type() {
    let mut view = filtered_without_4();
    view.register(
        "parity",
        elementwise(|row: &[Value]| match row[0] {
            Value::Int(v) if v % 2 == 0 => Value::Null,
            Value::Int(v) => Value::Int(v),
            _ => Value::Null,
        }),
    )
    .unwrap();
    view.define_virtual_column("odd", "parity", ["x"]).unwrap();

    let odd = view.evaluate("odd").unwrap();
    assert_eq!(odd.column_type(), ColumnType::Int);
    assert_eq!(odd.null_count(), 4);
    assert_eq!(odd.get(1), Value::Int(1));
}

#[test]
fn elementwise_mixed_result_types_are_rejected() {
    let mut view = filtered_without_4();
    view.register(
        "mixed",
        elementwise(|row: &[Value]| match row[0] {
            Value::Int(0) => Value::Int(1),
            _ => Value::Float(0.5),
        }),
    )
    .unwrap();
    view.define_virtual_column("m", "mixed", ["x"]).unwrap();

    let err = view.materialize("m").unwrap_err();
    assert!(matches!(err, EvalError::Function { ref function, .. } if function == "mixed"));
    let source = std::error::Error::source(&err).expect("type error is kept as source");
    assert!(source.to_string().contains("expected int, got float"), "{source}");
}
