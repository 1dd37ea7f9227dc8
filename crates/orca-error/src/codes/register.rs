use crate::registry::{Registry, RegistryError};

use super::*;

/// Register the built-in code table.
///
/// Any error here is a programming bug in the table; callers are expected
/// to abort startup on `Err`.
pub fn bootstrap(registry: &Registry) -> Result<(), RegistryError> {
    registry.register_code(SUCCESS, 200, "OK", None)?;
    registry.register_code(INTERNAL_SERVER, 500, "Internal server error", None)?;
    registry.register_code(DATABASE, 500, "Database error", None)?;
    registry.register_code(BAD_REQUEST, 400, "Bad request", None)?;
    registry.register_code(PAGE_NOT_FOUND, 404, "Page not found", None)?;
    registry.register_code(VALIDATION, 400, "Validation failed", None)?;
    registry.register_code(BIND, 400, "Invalid request parameters", None)?;

    registry.register_code(MENU_ALREADY_EXIST, 400, "Menu already exists", None)?;
    registry.register_code(MENU_NOT_FOUND, 404, "Menu not found", None)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Code;

    #[test]
    fn bootstrap_registers_everything() {
        let reg = Registry::new();
        bootstrap(&reg).unwrap();
        assert_eq!(reg.len(), 9);
        for code in [
            SUCCESS, INTERNAL_SERVER, DATABASE, BAD_REQUEST, PAGE_NOT_FOUND,
            VALIDATION, BIND, MENU_ALREADY_EXIST, MENU_NOT_FOUND,
        ] {
            assert!(reg.contains(code), "missing {}", code);
        }
    }

    #[test]
    fn bootstrap_twice_is_a_duplicate() {
        let reg = Registry::new();
        bootstrap(&reg).unwrap();
        assert_eq!(bootstrap(&reg), Err(RegistryError::Duplicate(SUCCESS)));
    }

    #[test]
    fn codes_are_distinct() {
        let all: [Code; 9] = [
            SUCCESS, INTERNAL_SERVER, DATABASE, BAD_REQUEST, PAGE_NOT_FOUND,
            VALIDATION, BIND, MENU_ALREADY_EXIST, MENU_NOT_FOUND,
        ];
        let mut sorted = all.to_vec();
        sorted.sort();
        sorted.dedup();
        assert_eq!(sorted.len(), all.len());
    }

    #[test]
    fn success_round_trip() {
        let reg = Registry::new();
        bootstrap(&reg).unwrap();
        let ok = reg.lookup(SUCCESS).unwrap();
        assert_eq!(ok.http_status(), 200);
        assert_eq!(ok.message(), "OK");
    }
}
