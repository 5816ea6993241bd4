//! Classification of MySQL driver errors.

use mysql_async::Error;
use seed_core::SeedError;

/// Server codes that mean a constraint rejected the statement.
const DUPLICATE_ENTRY: u16 = 1062;
const ROW_IS_REFERENCED: u16 = 1451;
const NO_REFERENCED_ROW: u16 = 1452;

/// Map a driver error onto the seeding error kinds.
pub fn classify(target: &str, err: Error) -> SeedError {
    match &err {
        Error::Server(server)
            if matches!(
                server.code,
                DUPLICATE_ENTRY | ROW_IS_REFERENCED | NO_REFERENCED_ROW
            ) =>
        {
            SeedError::constraint(target, server.message.clone())
        }
        _ => SeedError::StorageUnavailable(format!("MySQL error on '{target}': {err}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mysql_async::ServerError;

    fn server_error(code: u16, message: &str) -> Error {
        Error::Server(ServerError {
            code,
            message: message.to_string(),
            state: "23000".to_string(),
        })
    }

    #[test]
    fn test_constraint_codes_become_constraint_violations() {
        for code in [DUPLICATE_ENTRY, ROW_IS_REFERENCED, NO_REFERENCED_ROW] {
            match classify("user_profiles", server_error(code, "rejected")) {
                SeedError::ConstraintViolation { target, message } => {
                    assert_eq!(target, "user_profiles");
                    assert_eq!(message, "rejected");
                }
                other => panic!("code {code} classified as {other:?}"),
            }
        }
    }

    #[test]
    fn test_other_server_codes_are_storage_failures() {
        let err = classify("chats", server_error(1146, "Table 'test_db.chats' doesn't exist"));
        assert!(matches!(err, SeedError::StorageUnavailable(ref m) if m.contains("chats")));
    }
}
