//! Canonical SQLite schema for the ticket store.
//!
//! The schema is normalized around the audit requirements:
//! - `tickets` keeps the latest aggregate fields plus the optimistic
//!   concurrency `version` counter
//! - `price_history` and `comm_log` are append-only side tables; nothing in
//!   the query layer can update or delete their rows
//! - `customers` is the referenced collaborator record; ticket operations
//!   read it and never write it
//! - `store_meta` tracks the applied schema version

/// Migration v1: core tables plus store metadata.
pub const MIGRATION_V1_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS customers (
    customer_id TEXT PRIMARY KEY CHECK (customer_id LIKE 'cu-%'),
    name TEXT NOT NULL CHECK (length(trim(name)) > 0),
    phone_digits TEXT NOT NULL CHECK (length(phone_digits) >= 10),
    email TEXT NOT NULL CHECK (length(trim(email)) > 0),
    address TEXT,
    created_at_us INTEGER NOT NULL,
    updated_at_us INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS tickets (
    ticket_id TEXT PRIMARY KEY CHECK (ticket_id LIKE 'tk-%'),
    ticket_number TEXT NOT NULL UNIQUE CHECK (length(trim(ticket_number)) > 0),
    customer_id TEXT NOT NULL REFERENCES customers(customer_id),
    device_type TEXT NOT NULL,
    brand TEXT NOT NULL,
    model TEXT NOT NULL,
    issue_description TEXT NOT NULL,
    diagnosis TEXT,
    technician TEXT,
    notes TEXT,
    status TEXT NOT NULL DEFAULT 'received' CHECK (
        status IN ('received', 'diagnosed', 'in_repair', 'ready_for_pickup', 'delivered', 'cancelled')
    ),
    priority TEXT NOT NULL DEFAULT 'medium' CHECK (priority IN ('low', 'medium', 'high')),
    repair_cost INTEGER NOT NULL DEFAULT 0 CHECK (repair_cost >= 0),
    parts_cost INTEGER NOT NULL DEFAULT 0 CHECK (parts_cost >= 0),
    labor_cost INTEGER NOT NULL DEFAULT 0 CHECK (labor_cost >= 0),
    total_cost INTEGER NOT NULL DEFAULT 0 CHECK (total_cost = repair_cost + parts_cost + labor_cost),
    estimated_completion_us INTEGER,
    warranty_days INTEGER CHECK (warranty_days IS NULL OR warranty_days >= 0),
    received_at_us INTEGER NOT NULL,
    updated_at_us INTEGER NOT NULL,
    version INTEGER NOT NULL DEFAULT 0
);

CREATE TABLE IF NOT EXISTS price_history (
    entry_id INTEGER PRIMARY KEY AUTOINCREMENT,
    ticket_id TEXT NOT NULL REFERENCES tickets(ticket_id),
    repair_cost INTEGER NOT NULL CHECK (repair_cost >= 0),
    parts_cost INTEGER NOT NULL CHECK (parts_cost >= 0),
    labor_cost INTEGER NOT NULL CHECK (labor_cost >= 0),
    total_cost INTEGER NOT NULL CHECK (total_cost = repair_cost + parts_cost + labor_cost),
    updated_at_us INTEGER NOT NULL,
    updated_by TEXT NOT NULL CHECK (length(trim(updated_by)) > 0)
);

CREATE TABLE IF NOT EXISTS comm_log (
    entry_id INTEGER PRIMARY KEY AUTOINCREMENT,
    ticket_id TEXT NOT NULL REFERENCES tickets(ticket_id),
    message TEXT NOT NULL CHECK (length(trim(message)) > 0),
    sent_at_us INTEGER NOT NULL,
    via_whatsapp INTEGER NOT NULL DEFAULT 0 CHECK (via_whatsapp IN (0, 1)),
    via_email INTEGER NOT NULL DEFAULT 0 CHECK (via_email IN (0, 1))
);

CREATE TABLE IF NOT EXISTS store_meta (
    id INTEGER PRIMARY KEY CHECK (id = 1),
    schema_version INTEGER NOT NULL,
    created_at_us INTEGER NOT NULL DEFAULT 0
);

INSERT OR IGNORE INTO store_meta (id, schema_version, created_at_us) VALUES (1, 1, 0);
"#;

/// Migration v2: read-path indexes for lookup and reporting.
pub const MIGRATION_V2_SQL: &str = r#"
CREATE INDEX IF NOT EXISTS idx_tickets_status_received
    ON tickets(status, received_at_us DESC);

CREATE INDEX IF NOT EXISTS idx_tickets_customer
    ON tickets(customer_id);

CREATE INDEX IF NOT EXISTS idx_customers_phone
    ON customers(phone_digits);

CREATE INDEX IF NOT EXISTS idx_customers_email
    ON customers(email COLLATE NOCASE);

CREATE INDEX IF NOT EXISTS idx_customers_name
    ON customers(name COLLATE NOCASE);

CREATE INDEX IF NOT EXISTS idx_price_history_ticket
    ON price_history(ticket_id, updated_at_us ASC, entry_id ASC);

CREATE INDEX IF NOT EXISTS idx_comm_log_ticket
    ON comm_log(ticket_id, sent_at_us ASC, entry_id ASC);

UPDATE store_meta
SET schema_version = 2
WHERE id = 1;
"#;

/// Indexes expected by lookup/reporting query paths.
pub const REQUIRED_INDEXES: &[&str] = &[
    "idx_tickets_status_received",
    "idx_tickets_customer",
    "idx_customers_phone",
    "idx_customers_email",
    "idx_customers_name",
    "idx_price_history_ticket",
    "idx_comm_log_ticket",
];

#[cfg(test)]
mod tests {
    use crate::store::migrations;
    use rusqlite::{Connection, params};

    fn seeded_conn() -> rusqlite::Result<Connection> {
        let mut conn = Connection::open_in_memory()?;
        migrations::migrate(&mut conn)?;

        for idx in 0..24_u32 {
            let customer_id = format!("cu-{idx:012}");
            conn.execute(
                "INSERT INTO customers (customer_id, name, phone_digits, email, address, created_at_us, updated_at_us)
                 VALUES (?1, ?2, ?3, ?4, NULL, ?5, ?5)",
                params![
                    customer_id,
                    format!("Customer {idx}"),
                    format!("98765432{idx:02}"),
                    format!("customer{idx}@example.com"),
                    i64::from(idx)
                ],
            )?;

            let status = if idx % 3 == 0 { "delivered" } else { "received" };
            conn.execute(
                "INSERT INTO tickets (
                    ticket_id, ticket_number, customer_id, device_type, brand, model,
                    issue_description, status, received_at_us, updated_at_us
                 ) VALUES (?1, ?2, ?3, 'laptop', 'Lenovo', 'T14', 'no power', ?4, ?5, ?5)",
                params![
                    format!("tk-{idx:012}"),
                    format!("FT-SEED{idx:02}"),
                    format!("cu-{idx:012}"),
                    status,
                    i64::from(idx)
                ],
            )?;
        }

        Ok(conn)
    }

    fn query_plan_details(conn: &Connection, sql: &str) -> rusqlite::Result<Vec<String>> {
        let mut stmt = conn.prepare(&format!("EXPLAIN QUERY PLAN {sql}"))?;
        stmt.query_map([], |row| row.get::<_, String>(3))?
            .collect::<Result<Vec<_>, _>>()
    }

    #[test]
    fn ticket_number_uniqueness_is_server_enforced() -> rusqlite::Result<()> {
        let conn = seeded_conn()?;
        let result = conn.execute(
            "INSERT INTO tickets (
                ticket_id, ticket_number, customer_id, device_type, brand, model,
                issue_description, received_at_us, updated_at_us
             ) VALUES ('tk-dupe00000000', 'FT-SEED01', 'cu-000000000001', 'laptop', 'x', 'y', 'z', 1, 1)",
            [],
        );

        assert!(matches!(
            result,
            Err(rusqlite::Error::SqliteFailure(e, _))
                if e.code == rusqlite::ErrorCode::ConstraintViolation
        ));
        Ok(())
    }

    #[test]
    fn total_cost_consistency_is_schema_checked() -> rusqlite::Result<()> {
        let conn = seeded_conn()?;
        let result = conn.execute(
            "UPDATE tickets SET total_cost = 999 WHERE ticket_id = 'tk-000000000001'",
            [],
        );
        assert!(result.is_err(), "drifted total must violate the CHECK");
        Ok(())
    }

    #[test]
    fn query_plan_uses_status_received_index() -> rusqlite::Result<()> {
        let conn = seeded_conn()?;
        let details = query_plan_details(
            &conn,
            "SELECT ticket_id
             FROM tickets
             WHERE status = 'received'
             ORDER BY received_at_us DESC
             LIMIT 20",
        )?;

        assert!(
            details
                .iter()
                .any(|detail| detail.contains("idx_tickets_status_received")),
            "expected status index in plan, got: {details:?}"
        );
        Ok(())
    }

    #[test]
    fn query_plan_uses_phone_index() -> rusqlite::Result<()> {
        let conn = seeded_conn()?;
        let details = query_plan_details(
            &conn,
            "SELECT customer_id FROM customers WHERE phone_digits = '9876543201'",
        )?;

        assert!(
            details
                .iter()
                .any(|detail| detail.contains("idx_customers_phone")),
            "expected phone index in plan, got: {details:?}"
        );
        Ok(())
    }
}
