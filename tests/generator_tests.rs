//! Integration tests for the password generator.

use std::collections::HashSet;

use passvault::errors::{ErrorKind, PassVaultError};
use passvault::generator::{generate, CharClass, DEFAULT_PASSWORD_LENGTH, MAX_PASSWORD_LENGTH};

fn classes_in(password: &str) -> HashSet<CharClass> {
    password.bytes().filter_map(CharClass::of).collect()
}

#[test]
fn three_characters_cannot_hold_four_classes() {
    let err = generate(3, &CharClass::ALL).unwrap_err();
    assert!(matches!(
        err,
        PassVaultError::InfeasibleRequest {
            length: 3,
            required: 4
        }
    ));
    assert_eq!(err.kind(), ErrorKind::InvalidInput);
}

#[test]
fn four_characters_hold_all_four_classes() {
    for _ in 0..20 {
        let password = generate(4, &CharClass::ALL).unwrap();
        assert_eq!(password.len(), 4);
        assert_eq!(classes_in(&password).len(), 4, "{password:?}");
    }
}

#[test]
fn non_positive_lengths_use_the_default() {
    assert_eq!(generate(0, &CharClass::ALL).unwrap().len(), DEFAULT_PASSWORD_LENGTH);
    assert_eq!(generate(-1, &CharClass::ALL).unwrap().len(), DEFAULT_PASSWORD_LENGTH);
    assert_eq!(DEFAULT_PASSWORD_LENGTH, 24);
}

#[test]
fn lengths_above_the_maximum_are_refused() {
    let too_long = i64::try_from(MAX_PASSWORD_LENGTH).unwrap() + 1;
    assert!(matches!(
        generate(too_long, &[]),
        Err(PassVaultError::LengthTooLarge { length: 1025, max: 1024 })
    ));
    assert_eq!(
        generate(i64::try_from(MAX_PASSWORD_LENGTH).unwrap(), &CharClass::ALL)
            .unwrap()
            .len(),
        MAX_PASSWORD_LENGTH
    );
}

#[test]
fn output_is_printable_ascii_only() {
    let password = generate(512, &[]).unwrap();
    assert!(password.bytes().all(|b| (33..=126).contains(&b)));
}

#[test]
fn repeated_calls_differ() {
    let a = generate(24, &CharClass::ALL).unwrap();
    let b = generate(24, &CharClass::ALL).unwrap();
    assert_ne!(a, b);
}

#[test]
fn duplicate_required_classes_count_once() {
    let required = [CharClass::Digit, CharClass::Digit, CharClass::Digit];
    let password = generate(1, &required).unwrap();
    assert!(password.bytes().all(|b| b.is_ascii_digit()));
}
