use crate::application::repos::RepoError;
use crate::domain::types::normalize_stock;

pub fn map_sqlx_error(err: sqlx::Error) -> RepoError {
    match err {
        sqlx::Error::RowNotFound => RepoError::NotFound,
        sqlx::Error::Database(db) if db.message().contains("duplicate key") => {
            RepoError::Duplicate {
                constraint: db.constraint().unwrap_or("unknown").to_string(),
            }
        }
        sqlx::Error::Database(db)
            if db.message().contains("violates foreign key constraint")
                || db.message().contains("invalid input syntax") =>
        {
            RepoError::InvalidInput {
                message: db.message().to_string(),
            }
        }
        sqlx::Error::Database(db) if db.message().contains("violates") => RepoError::Integrity {
            message: db.message().to_string(),
        },
        sqlx::Error::Database(db)
            if db
                .message()
                .contains("canceling statement due to statement timeout") =>
        {
            RepoError::Timeout
        }
        sqlx::Error::PoolTimedOut => RepoError::Timeout,
        other => RepoError::from_persistence(other),
    }
}

/// Stored stock may be negative after manual edits; records never are.
pub(super) fn stock_from_db(raw: i32) -> u32 {
    normalize_stock(i64::from(raw))
}

pub(super) fn stock_to_db(stock: u32) -> Result<i32, RepoError> {
    i32::try_from(stock).map_err(|_| RepoError::InvalidInput {
        message: format!("stock {stock} exceeds supported range"),
    })
}

/// Substring pattern for `ILIKE` with wildcard characters escaped.
pub(super) fn contains_pattern(query: &str) -> String {
    let mut pattern = String::with_capacity(query.len() + 2);
    pattern.push('%');
    for ch in query.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(ch);
    }
    pattern.push('%');
    pattern
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn negative_stock_reads_as_zero() {
        assert_eq!(stock_from_db(-4), 0);
        assert_eq!(stock_from_db(12), 12);
    }

    #[test]
    fn like_wildcards_are_escaped() {
        assert_eq!(contains_pattern("silk"), "%silk%");
        assert_eq!(contains_pattern("50%_off"), "%50\\%\\_off%");
    }

    #[test]
    fn row_not_found_maps_to_not_found() {
        assert!(matches!(
            map_sqlx_error(sqlx::Error::RowNotFound),
            RepoError::NotFound
        ));
    }
}
