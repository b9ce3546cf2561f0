use super::*;

#[test]
fn display_prefixes_are_stable() {
    let cases = [
        (TreeflowError::validation("x"), "validation error:"),
        (TreeflowError::malformed_tree("x"), "malformed tree:"),
        (TreeflowError::no_matching_branch("x"), "routing error:"),
        (TreeflowError::data_source("x"), "data source error:"),
        (TreeflowError::render("x"), "render error:"),
        (TreeflowError::encode("x"), "encode error:"),
        (TreeflowError::serde("x"), "serialization error:"),
    ];
    for (err, prefix) in cases {
        assert!(err.to_string().starts_with(prefix), "{err}");
    }
}

#[test]
fn other_preserves_source() {
    let base = std::io::Error::other("boom");
    let err = TreeflowError::Other(anyhow::Error::new(base));
    assert!(err.to_string().contains("boom"));
}
