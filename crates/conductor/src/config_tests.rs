// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn duration_var_falls_back_to_default() {
    let d = duration_var("BATON_TEST_UNSET_DURATION", Duration::from_secs(7)).unwrap();
    assert_eq!(d, Duration::from_secs(7));
}

#[test]
fn duration_var_parses_milliseconds() {
    std::env::set_var("BATON_TEST_DURATION_OK", "2500");
    let d = duration_var("BATON_TEST_DURATION_OK", Duration::ZERO).unwrap();
    assert_eq!(d, Duration::from_millis(2500));
}

#[test]
fn duration_var_rejects_garbage() {
    std::env::set_var("BATON_TEST_DURATION_BAD", "soon");
    let err = duration_var("BATON_TEST_DURATION_BAD", Duration::ZERO).unwrap_err();
    assert!(matches!(err, ConfigError::Invalid { var: "BATON_TEST_DURATION_BAD", .. }));
}

#[test]
fn optional_u32_parses_or_is_none() {
    assert_eq!(optional_u32("BATON_TEST_U32_UNSET").unwrap(), None);
    std::env::set_var("BATON_TEST_U32_OK", "4");
    assert_eq!(optional_u32("BATON_TEST_U32_OK").unwrap(), Some(4));
    std::env::set_var("BATON_TEST_U32_BAD", "-1");
    assert!(optional_u32("BATON_TEST_U32_BAD").is_err());
}
