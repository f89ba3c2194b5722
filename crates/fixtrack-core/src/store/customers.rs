//! Customer collaborator records.
//!
//! Tickets reference customers; they never own or mutate them. This module
//! is the only write path to the `customers` table, and ticket operations
//! only ever read from it.

use crate::error::TicketError;
use crate::ident;
use crate::store::lookup::{normalize_phone, validate_email};
use crate::store::{from_us, to_us};
use chrono::{DateTime, Utc};
use rusqlite::{Connection, params};
use serde::{Deserialize, Serialize};

/// A stored customer row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerRecord {
    pub customer_id: String,
    pub name: String,
    /// Digits-only phone number, at least 10 digits.
    pub phone_digits: String,
    pub email: String,
    pub address: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for registering a customer.
#[derive(Debug, Clone, Default)]
pub struct NewCustomer {
    pub name: String,
    pub phone: String,
    pub email: String,
    pub address: Option<String>,
}

/// Register a customer, normalizing the phone number to digits.
///
/// # Errors
///
/// `Validation` for a blank name, a phone with fewer than 10 digits, or a
/// malformed email; `Storage` for database failures.
pub fn add_customer(
    conn: &Connection,
    new: &NewCustomer,
    now: DateTime<Utc>,
) -> Result<CustomerRecord, TicketError> {
    if new.name.trim().is_empty() {
        return Err(TicketError::Validation {
            detail: "customer name must not be blank".to_string(),
        });
    }
    let phone_digits = normalize_phone(&new.phone)?;
    validate_email(&new.email)?;

    let customer_id = ident::mint_customer_id();
    conn.execute(
        "INSERT INTO customers (customer_id, name, phone_digits, email, address, created_at_us, updated_at_us)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6)",
        params![
            customer_id,
            new.name.trim(),
            phone_digits,
            new.email.trim(),
            new.address,
            to_us(now)
        ],
    )?;

    tracing::debug!(customer = %customer_id, "registered customer");

    Ok(CustomerRecord {
        customer_id,
        name: new.name.trim().to_string(),
        phone_digits,
        email: new.email.trim().to_string(),
        address: new.address.clone(),
        created_at: now,
        updated_at: now,
    })
}

/// Fetch a customer by id.
///
/// # Errors
///
/// `Storage` for database failures.
pub fn get_customer(
    conn: &Connection,
    customer_id: &str,
) -> Result<Option<CustomerRecord>, TicketError> {
    let mut stmt = conn.prepare(
        "SELECT customer_id, name, phone_digits, email, address, created_at_us, updated_at_us
         FROM customers WHERE customer_id = ?1",
    )?;

    let result = stmt.query_row(params![customer_id], |row| {
        Ok(CustomerRecord {
            customer_id: row.get(0)?,
            name: row.get(1)?,
            phone_digits: row.get(2)?,
            email: row.get(3)?,
            address: row.get(4)?,
            created_at: from_us(5, row.get(5)?)?,
            updated_at: from_us(6, row.get(6)?)?,
        })
    });

    match result {
        Ok(record) => Ok(Some(record)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::{NewCustomer, add_customer, get_customer};
    use crate::error::TicketError;
    use crate::store::open_in_memory;
    use chrono::Utc;

    fn sample() -> NewCustomer {
        NewCustomer {
            name: "Kim Okafor".into(),
            phone: "+1 (987) 654-3210".into(),
            email: "kim@example.com".into(),
            address: Some("12 Harbor Rd".into()),
        }
    }

    #[test]
    fn add_normalizes_phone_and_roundtrips() {
        let conn = open_in_memory().expect("open store");
        let record = add_customer(&conn, &sample(), Utc::now()).expect("add customer");
        assert_eq!(record.phone_digits, "19876543210");

        let loaded = get_customer(&conn, &record.customer_id)
            .expect("get customer")
            .expect("customer exists");
        assert_eq!(loaded.customer_id, record.customer_id);
        assert_eq!(loaded.name, "Kim Okafor");
        assert_eq!(loaded.phone_digits, "19876543210");
        assert_eq!(loaded.email, "kim@example.com");
        assert_eq!(loaded.address.as_deref(), Some("12 Harbor Rd"));
        // Timestamps persist at microsecond precision.
        assert_eq!(loaded.created_at.timestamp_micros(), record.created_at.timestamp_micros());
    }

    #[test]
    fn short_phone_is_rejected_before_insert() {
        let conn = open_in_memory().expect("open store");
        let result = add_customer(
            &conn,
            &NewCustomer {
                phone: "98765".into(),
                ..sample()
            },
            Utc::now(),
        );
        assert!(matches!(result, Err(TicketError::Validation { .. })));

        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM customers", [], |row| row.get(0))
            .expect("count");
        assert_eq!(count, 0);
    }

    #[test]
    fn malformed_email_is_rejected() {
        let conn = open_in_memory().expect("open store");
        let result = add_customer(
            &conn,
            &NewCustomer {
                email: "not-an-email".into(),
                ..sample()
            },
            Utc::now(),
        );
        assert!(matches!(result, Err(TicketError::Validation { .. })));
    }

    #[test]
    fn missing_customer_is_none() {
        let conn = open_in_memory().expect("open store");
        assert!(
            get_customer(&conn, "cu-000000000000")
                .expect("query")
                .is_none()
        );
    }
}
