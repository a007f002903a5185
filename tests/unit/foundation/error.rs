use super::*;

#[test]
fn display_prefixes_are_stable() {
    assert!(
        MockupError::geometry("x")
            .to_string()
            .contains("geometry error:")
    );
    assert!(
        MockupError::decode("x")
            .to_string()
            .contains("image decode error:")
    );
    assert!(
        MockupError::validation("x")
            .to_string()
            .contains("validation error:")
    );
    assert!(MockupError::not_found("x").to_string().contains("not found:"));
    assert!(
        MockupError::serde("x")
            .to_string()
            .contains("serialization error:")
    );
}

#[test]
fn commit_names_failing_step() {
    let err = MockupError::commit("upload#2", "rate limited");
    assert_eq!(err.to_string(), "commit error at upload#2: rate limited");
}

#[test]
fn other_preserves_source() {
    let base = std::io::Error::other("boom");
    let err = MockupError::Other(anyhow::Error::new(base));
    assert!(err.to_string().contains("boom"));
}

#[test]
fn per_item_classification() {
    assert!(MockupError::decode("x").is_per_item());
    assert!(MockupError::Cancelled.is_per_item());
    assert!(!MockupError::geometry("x").is_per_item());
    assert!(!MockupError::validation("x").is_per_item());
}

#[test]
fn serde_json_errors_convert() {
    let err: MockupError = serde_json::from_str::<u32>("nope").unwrap_err().into();
    assert!(matches!(err, MockupError::Serde(_)));
}
