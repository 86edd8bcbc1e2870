use colview_columnar::{apply_predicate, Column, ColumnStore, ColumnType, FilterExpr, Value};
use colview_eval::{strings, EvalError, FilteredView};
use pretty_assertions::assert_eq;

fn names_view() -> FilteredView {
    let store = ColumnStore::from_columns([
        ("id", Column::from_i64((0..5).collect())),
        (
            "name",
            Column::from_values(
                ColumnType::String,
                vec![
                    Value::from(" Ada "),
                    Value::from("grace"),
                    Value::Null,
                    Value::from("Alan"),
                    Value::from("barbara"),
                ],
            )
            .unwrap(),
        ),
    ])
    .unwrap();
    let mask = apply_predicate(&store, &FilterExpr::ne("id", 1)).unwrap();
    FilteredView::with_mask(store, mask).unwrap()
}

#[test]
fn builtin_string_functions_run_over_visible_rows() {
    let mut view = names_view();
    view.register_string_functions().unwrap();
    view.define_virtual_column("clean", strings::STR_STRIP, ["name"])
        .unwrap();
    view.define_virtual_column("upper", strings::STR_UPPER, ["clean"])
        .unwrap();
    view.define_virtual_column("length", strings::STR_LEN, ["clean"])
        .unwrap();

    assert_eq!(
        view.materialize("upper").unwrap(),
        vec![
            Value::from("ADA"),
            Value::Null,
            Value::from("ALAN"),
            Value::from("BARBARA"),
        ]
    );
    assert_eq!(
        view.materialize("length").unwrap(),
        vec![Value::Int(3), Value::Null, Value::Int(4), Value::Int(7)]
    );
}

#[test]
fn parameterized_string_functions_feed_filters() {
    let mut view = names_view();
    view.register_string_functions().unwrap();
    view.register("has_ar", strings::contains("ar")).unwrap();
    view.define_virtual_column("lower", strings::STR_LOWER, ["name"])
        .unwrap();
    view.define_virtual_column("ar", "has_ar", ["lower"]).unwrap();

    let matching = view.filter(&FilterExpr::column("ar")).unwrap();
    assert_eq!(matching.row_indices(), vec![4]);
    assert_eq!(
        matching.materialize("name").unwrap(),
        vec![Value::from("barbara")]
    );
}

#[test]
fn registering_string_functions_twice_is_rejected() {
    let mut view = names_view();
    view.register_string_functions().unwrap();
    let err = view.register_string_functions().unwrap_err();
    assert!(matches!(err, EvalError::DuplicateFunctionName(ref name) if name == "str_upper"));
}

#[test]
fn string_function_on_int_column_reports_function_error() {
    let mut view = names_view();
    view.register_string_functions().unwrap();
    view.define_virtual_column("bad", strings::STR_UPPER, ["id"])
        .unwrap();

    let err = view.evaluate("bad").unwrap_err();
    assert!(matches!(
        err,
        EvalError::Function { ref function, ref column, .. }
            if function == "str_upper" && column == "bad"
    ));
}
