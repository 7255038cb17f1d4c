use super::{check, check_err};

#[test]
fn minimal_program_type_checks() {
    check("class Main { Void main () { println(1); } }").unwrap();
}

#[test]
fn local_var_must_be_declared_before_use() {
    let diags = check_err("class Main { Void main () { x = 1; } }");
    assert!(!diags.is_empty());
    assert!(diags[0].message.contains("undeclared identifier 'x'"));
}

#[test]
fn assignment_type_mismatch_is_an_error() {
    let diags = check_err("class Main { Void main () { Int x; x = true; } }");
    assert!(diags.iter().any(|d| d.message.contains("cannot assign")));
}

#[test]
fn if_condition_must_be_bool() {
    let diags = check_err(
        "class Main { Void main () { if (1) { println(1); } else { println(2); } } }",
    );
    assert!(diags.iter().any(|d| d.message.contains("'if' condition must be Bool")));
}

#[test]
fn while_condition_must_be_bool() {
    let diags = check_err("class Main { Void main () { while (1) { println(1); } } }");
    assert!(diags.iter().any(|d| d.message.contains("'while' condition must be Bool")));
}

#[test]
fn println_rejects_object_type() {
    let diags = check_err(
        "class Main { Void main () { Point p; p = new Point(); println(p); } } \
         class Point { Int x; }",
    );
    assert!(diags.iter().any(|d| d.message.contains("'println' cannot print")));
}

#[test]
fn field_access_on_undeclared_field_is_an_error() {
    let diags = check_err(
        "class Main { Void main () { Point p; p = new Point(); println(p.y); } } \
         class Point { Int x; }",
    );
    assert!(diags.iter().any(|d| d.message.contains("has no field 'y'")));
}

#[test]
fn new_on_undeclared_class_is_an_error() {
    let diags = check_err("class Main { Void main () { Ghost g; g = new Ghost(); } }");
    assert!(diags.iter().any(|d| d.message.contains("undeclared class 'Ghost'")));
}

#[test]
fn duplicate_class_is_an_error() {
    let diags = check_err(
        "class Main { Void main () { } } class Point { } class Point { Int x; }",
    );
    assert!(diags.iter().any(|d| d.message.contains("already declared")));
}

#[test]
fn duplicate_field_is_an_error() {
    let diags = check_err("class Main { Void main () { } } class Point { Int x; Int x; }");
    assert!(diags.iter().any(|d| d.message.contains("already declared in class")));
}

#[test]
fn string_concatenation_is_allowed() {
    check(r#"class Main { Void main () { String s; s = "a" + "b"; println(s); } }"#).unwrap();
}

#[test]
fn arithmetic_requires_int_operands() {
    let diags = check_err(r#"class Main { Void main () { Int x; x = "a" + 1; } }"#);
    assert!(diags.iter().any(|d| d.message.contains("requires Int operands")));
}

#[test]
fn null_is_assignable_to_object_and_string_but_not_int() {
    check("class Main { Void main () { Point p; p = null; } } class Point { }").unwrap();
    check("class Main { Void main () { String s; s = null; } }").unwrap();
    let diags = check_err("class Main { Void main () { Int x; x = null; } }");
    assert!(diags.iter().any(|d| d.message.contains("cannot assign null")));
}

#[test]
fn return_type_must_match_method_signature() {
    let diags = check_err(
        "class Main { Void main () { } } class Box { Int get () { return true; } }",
    );
    assert!(diags.iter().any(|d| d.message.contains("method returns Int")));
}

#[test]
fn void_method_cannot_return_a_value() {
    let diags = check_err(
        "class Main { Void main () { } } class Box { Void show () { return 1; } }",
    );
    assert!(diags
        .iter()
        .any(|d| d.message.contains("Void method cannot return a value")));
}

#[test]
fn this_outside_a_method_body_in_main_is_an_error() {
    let diags = check_err("class Main { Void main () { println(this); } }");
    assert!(diags.iter().any(|d| d.message.contains("'this' used outside a method")));
}

#[test]
fn this_inside_a_method_has_the_enclosing_class_type() {
    check("class Main { Void main () { } } class Box { Box self () { return this; } }").unwrap();
}

#[test]
fn readln_target_must_be_int_bool_or_string() {
    let diags = check_err(
        "class Main { Void main () { Point p; p = new Point(); readln(p); } } \
         class Point { }",
    );
    assert!(diags.iter().any(|d| d.message.contains("'readln' cannot read into")));
}
