//! Line range specifications resolved against concrete blocks

use lex_highlight::{LineHighlightSet, RangeError};
use rstest::rstest;

#[rstest(spec => ["1,4-6", "1;4..6", "1;4..;!7", " 1 , 4-6 ,"])]
fn test_equivalent_specifications(spec: &str) {
    let set = LineHighlightSet::parse(spec, 7).unwrap();
    assert_eq!(set.to_vec(), vec![1, 4, 5, 6]);
}

#[rstest(
    spec,
    line_count,
    expected,
    case("3", 5, vec![3]),
    case("2..", 4, vec![2, 3, 4]),
    case("2-", 4, vec![2, 3, 4]),
    case("1..10", 3, vec![1, 2, 3]),
    case("9", 3, vec![]),
    case("0", 3, vec![]),
    case("5..2", 6, vec![]),
    case("!2", 4, vec![]),
    case("1..4;!2..3", 4, vec![1, 4]),
    case("!2;1..4", 4, vec![1, 2, 3, 4]),
    case("", 4, vec![])
)]
fn test_resolution(spec: &str, line_count: usize, expected: Vec<usize>) {
    let set = LineHighlightSet::parse(spec, line_count).unwrap();
    assert_eq!(set.to_vec(), expected);
}

#[rstest(spec => ["a", "1..2..3", "..4", "!", "1!"])]
fn test_malformed_terms(spec: &str) {
    match LineHighlightSet::parse(spec, 10) {
        Err(RangeError::MalformedTerm { term, .. }) => assert_eq!(term, spec),
        other => panic!("Expected MalformedTerm, got {other:?}"),
    }
}

#[test]
fn test_malformed_term_is_reported_alone() {
    match LineHighlightSet::parse("1,x..3,5", 10) {
        Err(RangeError::MalformedTerm { term, .. }) => assert_eq!(term, "x..3"),
        other => panic!("Expected MalformedTerm, got {other:?}"),
    }
}
