use driftscope::error::EngineError;
use driftscope::masking::{extract_pattern, PatternExtractor};
use regex::Regex;

#[test]
fn default_mask_keeps_only_the_symbol_skeleton() {
    assert_eq!(extract_pattern("123.abc/.AB/", None), "././");
}

#[test]
fn regex_mask_removes_only_matching_substrings() {
    let ab = Regex::new("ab").unwrap();
    assert_eq!(extract_pattern("123.abc/.AB/", Some(&ab)), "123.c/.AB/");
    let digit = Regex::new("[0-9]").unwrap();
    assert_eq!(extract_pattern("123.abc/.AB/", Some(&digit)), ".abc/.AB/");
}

#[test]
fn lines_sharing_punctuation_collapse_to_one_signature() {
    let a = extract_pattern("GET /api/users/42 took 15ms", None);
    let b = extract_pattern("PUT /v2/orders/9001 took 3s", None);
    assert_eq!(a, b);
    assert_eq!(a, " ///  ");
}

#[test]
fn extraction_is_repeatable() {
    let ex = PatternExtractor::new(Some(r"\d+")).unwrap();
    let line = "worker-7 finished job 1234 in 56ms";
    assert_eq!(ex.extract(line), ex.extract(line));
    assert_eq!(ex.extract(line), "worker- finished job  in ms");
}

#[test]
fn digits_preset_matches_explicit_regex() {
    let preset = PatternExtractor::digits();
    let explicit = PatternExtractor::new(Some("[0-9]+")).unwrap();
    let line = "retry 3 of 10 for order 555";
    assert_eq!(preset.extract(line), explicit.extract(line));
}

#[test]
fn invalid_regex_is_reported_with_the_pattern() {
    let err = PatternExtractor::new(Some("(unclosed")).unwrap_err();
    match err {
        EngineError::InvalidRegex { pattern, .. } => assert_eq!(pattern, "(unclosed"),
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn non_ascii_letters_survive_the_default_mask() {
    assert_eq!(extract_pattern("café=1", None), "é=");
}
