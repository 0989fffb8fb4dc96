// ABOUTME: Security tests for the filter builder, schema selection and credentials
// ABOUTME: Validates protection against SQL injection and account enumeration

use fleet_records::config::DatabaseSettings;
use fleet_records::filters::{build_filter, AircraftColumn, SqlValue, UserColumn};
use fleet_records::postgres::connect;
use fleet_records::{AuthFailure, ConnectError, DataError};

// ============================================================================
// SQL Injection Prevention Tests
// ============================================================================

#[test]
fn test_sql_injection_in_attribute_with_drop() {
    let malicious_names = vec![
        "userroleid; DROP TABLE users",
        "userroleid; DROP TABLE users; --",
        "userid'; DROP TABLE users; --",
        "userid\"; DROP TABLE users; --",
    ];

    for name in malicious_names {
        let result = build_filter::<UserColumn>(name, "=", "1");
        assert!(
            result.is_err(),
            "SQL injection with DROP should be rejected: {}",
            name
        );
        assert!(
            result
                .unwrap_err()
                .to_string()
                .contains("Invalid attribute name"),
            "Error should indicate invalid attribute name"
        );
    }
}

#[test]
fn test_sql_injection_in_attribute_with_union() {
    let malicious_names = vec![
        "model UNION SELECT * FROM users",
        "model' UNION SELECT password FROM users--",
    ];

    for name in malicious_names {
        assert!(
            build_filter::<AircraftColumn>(name, "=", "x").is_err(),
            "SQL injection with UNION should be rejected: {}",
            name
        );
    }
}

#[test]
fn test_sql_injection_with_comments_and_boolean_logic() {
    let malicious_names = vec![
        "model--",
        "model/*comment*/",
        "model OR 1=1",
        "model' OR '1'='1",
        "lower(model)",
    ];

    for name in malicious_names {
        assert!(
            build_filter::<AircraftColumn>(name, "=", "x").is_err(),
            "Attribute should be rejected: {}",
            name
        );
    }
}

#[test]
fn test_sql_injection_in_operator() {
    let malicious_operators = vec![
        "= '' OR 1=1 --",
        "; DELETE FROM aircraft; --",
        "IS NOT NULL OR",
        "LIKE '%' --",
    ];

    for op in malicious_operators {
        let result = build_filter::<AircraftColumn>("model", op, "x");
        assert!(result.is_err(), "Operator should be rejected: {}", op);
    }
}

#[test]
fn test_sql_looking_values_are_always_bound() {
    let payloads = vec![
        "'; DROP TABLE aircraft; --",
        "x' OR '1'='1",
        "$1; SELECT pg_sleep(10)",
        "%' UNION SELECT password FROM users --",
    ];

    for payload in payloads {
        for op in ["=", "<", ">", "<>", "LIKE", "~"] {
            let filter = build_filter::<UserColumn>("lastname", op, payload)
                .unwrap_or_else(|e| panic!("value content must not be rejected: {}", e));

            assert!(
                !filter.clause().contains(payload),
                "Value leaked into SQL text for operator {}",
                op
            );
            match filter.param() {
                SqlValue::Text(bound) => assert!(bound.contains(payload)),
                other => panic!("expected text parameter, got {:?}", other),
            }
        }
    }
}

#[tokio::test]
async fn test_schema_injection_is_rejected_before_connecting() {
    let settings = DatabaseSettings {
        host: Some("localhost".to_string()),
        port: Some(5432),
        user: Some("fleet".to_string()),
        password: Some("secret".to_string()),
        schema: Some("airline\"; DROP SCHEMA airline CASCADE; --".to_string()),
        ..Default::default()
    };

    let result = connect(&settings).await;
    assert!(matches!(result, Err(ConnectError::Unknown(_))));
}

// ============================================================================
// Account Enumeration Tests
// ============================================================================

#[test]
fn test_login_failures_share_one_message() {
    let not_found = DataError::Authentication(AuthFailure::UserNotFound).to_string();
    let bad_password = DataError::Authentication(AuthFailure::InvalidCredentials).to_string();

    assert_eq!(not_found, bad_password);
    assert!(!not_found.to_lowercase().contains("not found"));
}
