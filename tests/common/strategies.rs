use proptest::prelude::*;

/// Arbitrary text that may surround a classified phrase
pub fn noise_strategy() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9 :.,()_-]{0,40}"
}

/// Phrases that mark bad credentials
pub fn auth_phrase_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("password authentication failed for user \"shop\"".to_string()),
        Just("Authentication failed against database server".to_string()),
        "[a-z_]{1,16}".prop_map(|role| format!("role \"{role}\" does not exist")),
    ]
}

/// Tenant-not-found variants emitted by the connection pooler
pub fn tenant_phrase_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("Tenant or user not found".to_string()),
        Just("FATAL: Tenant or user not found".to_string()),
        Just("FATAL:  Tenant or user not found".to_string()),
        Just("error: FATAL: tenant or user not found".to_string()),
    ]
}

/// Socket timeout phrases
pub fn socket_timeout_phrase_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("Socket timeout".to_string()),
        Just("database failed to respond".to_string()),
        Just("failed to respond to a query within the configured timeout".to_string()),
    ]
}

/// Connection failure phrases
pub fn connection_phrase_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("Can't reach database server at db:5432".to_string()),
        Just("Connection terminated unexpectedly".to_string()),
        Just("read ECONNRESET".to_string()),
        Just("connect ECONNREFUSED 10.0.0.4:5432".to_string()),
        Just("connect ETIMEDOUT".to_string()),
        Just("Engine is not yet connected".to_string()),
        Just("Response from the Engine was empty".to_string()),
    ]
}

/// Business and integrity failures
pub fn business_error_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("Unique constraint violated".to_string()),
        Just("Foreign key constraint failed".to_string()),
        Just("Record not found".to_string()),
        Just("Validation failed".to_string()),
    ]
}
