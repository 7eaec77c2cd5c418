//! trybuild 编译期测试

#[test]
fn trybuild_component_macros() {
    let t = trybuild::TestCases::new();
    t.pass("tests/trybuild/ok_component.rs");
    t.pass("tests/trybuild/ok_configuration.rs");
}
