use super::{check, check_err};

#[test]
fn overloaded_methods_resolve_by_argument_types() {
    check(
        "class Main { Void main () { Box b; b = new Box(); \
         println(b.describe(1)); println(b.describe(true)); } } \
         class Box { \
           String describe (Int x) { return \"int\"; } \
           String describe (Bool x) { return \"bool\"; } \
         }",
    )
    .unwrap();
}

#[test]
fn duplicate_overload_with_identical_signature_is_an_error() {
    let diags = check_err(
        "class Main { Void main () { } } \
         class Box { Int get (Int x) { return x; } Int get (Int y) { return y; } }",
    );
    assert!(diags
        .iter()
        .any(|d| d.message.contains("already declared with this parameter list")));
}

#[test]
fn null_argument_resolves_to_the_string_overload() {
    check(
        "class Main { Void main () { Box b; b = new Box(); println(b.describe(null)); } } \
         class Box { \
           String describe (Int x) { return \"int\"; } \
           String describe (String x) { return x; } \
         }",
    )
    .unwrap();
}

#[test]
fn call_with_no_matching_overload_is_an_error() {
    let diags = check_err(
        "class Main { Void main () { Box b; b = new Box(); println(b.describe(\"x\")); } } \
         class Box { \
           String describe (Int x) { return \"int\"; } \
           String describe (Bool x) { return \"bool\"; } \
         }",
    );
    assert!(diags
        .iter()
        .any(|d| d.message.contains("no overload of method 'describe'")));
}

#[test]
fn calling_an_undeclared_method_is_an_error() {
    let diags = check_err(
        "class Main { Void main () { Box b; b = new Box(); b.missing(); } } class Box { }",
    );
    assert!(diags.iter().any(|d| d.message.contains("has no method 'missing'")));
}

#[test]
fn fields_are_visible_as_bare_names_inside_methods() {
    check(
        "class Main { Void main () { } } \
         class Counter { Int n; Void bump () { n = n + 1; } }",
    )
    .unwrap();
}

#[test]
fn local_shadows_field_of_the_same_name() {
    check(
        "class Main { Void main () { } } \
         class Counter { Int n; Void bump () { Bool n; n = true; } }",
    )
    .unwrap();
}
