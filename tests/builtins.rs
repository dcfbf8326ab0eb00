use typeroute::{cast, to, ConvertRequest, RoutingError, TypeKey};

#[test]
fn to_int() {
    assert_eq!(cast::<i64>("123".to_string()).unwrap(), 123);
}

#[test]
fn to_str() {
    assert_eq!(cast::<String>(123i64).unwrap(), "123");
    assert_eq!(cast::<String>(123.5f64).unwrap(), "123.5");
    assert_eq!(cast::<String>(true).unwrap(), "true");
}

#[test]
fn to_bool() {
    assert!(cast::<bool>(123i64).unwrap());
    assert!(!cast::<bool>(String::new()).unwrap());
    assert!(cast::<bool>("yep".to_string()).unwrap());
}

#[test]
fn non_numeric_text_reroutes_through_truthiness() {
    // The direct parse and the float detour both fail on "abc"; the
    // remaining route is String -> bool -> i64.
    assert_eq!(cast::<i64>("abc".to_string()).unwrap(), 1);
}

#[test]
fn fractional_text_reroutes_through_float() {
    // i64 parsing rejects "123.9"; the float detour truncates it.
    assert_eq!(cast::<i64>("123.9".to_string()).unwrap(), 123);
}

#[test]
fn unregistered_source_type_has_no_path() {
    let err = cast::<i64>(vec![1u8]).unwrap_err();
    assert!(matches!(err, RoutingError::NoPath(_)));
}

#[test]
fn source_type_defaults_to_the_dynamic_type() {
    // No `have` on the request: the value's runtime type picks the start.
    let converted = to(
        Box::new(42i64),
        ConvertRequest::new(TypeKey::of::<String>()),
    )
    .unwrap();
    assert_eq!(*converted.downcast::<String>().unwrap(), "42");
}
