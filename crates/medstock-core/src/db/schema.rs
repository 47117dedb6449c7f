//! SQLite schema definition.

/// Complete database schema for medstock.
pub const SCHEMA: &str = r#"
-- Enable foreign keys
PRAGMA foreign_keys = ON;

-- ============================================================================
-- Clinics and their medication catalogs
-- ============================================================================

CREATE TABLE IF NOT EXISTS clinics (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    locality TEXT NOT NULL DEFAULT '',
    opening_hours TEXT NOT NULL DEFAULT '',
    contact TEXT,
    status TEXT NOT NULL DEFAULT 'open' CHECK (status IN ('open', 'closed')),
    created_at TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE INDEX IF NOT EXISTS idx_clinics_status ON clinics(status);

-- Catalog order (rowid) matters: the resolver takes the first match.
CREATE TABLE IF NOT EXISTS catalog_entries (
    clinic_id TEXT NOT NULL REFERENCES clinics(id) ON DELETE CASCADE,
    name TEXT NOT NULL,
    brand_aliases TEXT NOT NULL DEFAULT '[]',     -- JSON array of strings
    created_at TEXT NOT NULL DEFAULT (datetime('now')),
    updated_at TEXT NOT NULL DEFAULT (datetime('now')),
    PRIMARY KEY (clinic_id, name)
);

-- ============================================================================
-- Stock sheets and upload compliance
-- ============================================================================

CREATE TABLE IF NOT EXISTS stock_pdfs (
    id TEXT PRIMARY KEY,
    clinic_id TEXT NOT NULL REFERENCES clinics(id) ON DELETE CASCADE,
    url TEXT NOT NULL,
    sha256 TEXT NOT NULL,
    size_bytes INTEGER NOT NULL CHECK (size_bytes >= 0),
    uploaded_at TEXT NOT NULL                       -- RFC 3339
);

CREATE INDEX IF NOT EXISTS idx_stock_pdfs_clinic ON stock_pdfs(clinic_id, uploaded_at);

CREATE TABLE IF NOT EXISTS upload_checks (
    staff_id TEXT NOT NULL,
    clinic_id TEXT NOT NULL REFERENCES clinics(id) ON DELETE CASCADE,
    day TEXT NOT NULL,                              -- YYYY-MM-DD
    morning INTEGER NOT NULL DEFAULT 0,
    afternoon INTEGER NOT NULL DEFAULT 0,
    PRIMARY KEY (staff_id, clinic_id, day)
);

-- A wrong upload is redone only after an admin approves the correction.
CREATE TABLE IF NOT EXISTS correction_requests (
    id TEXT PRIMARY KEY,
    staff_id TEXT NOT NULL,
    clinic_id TEXT NOT NULL REFERENCES clinics(id) ON DELETE CASCADE,
    day TEXT NOT NULL,                              -- YYYY-MM-DD
    period TEXT NOT NULL CHECK (period IN ('morning', 'afternoon')),
    reason TEXT,
    status TEXT NOT NULL DEFAULT 'pending' CHECK (status IN ('pending', 'approved')),
    requested_at TEXT NOT NULL,                     -- RFC 3339
    approved_at TEXT
);

CREATE INDEX IF NOT EXISTS idx_corrections_staff ON correction_requests(staff_id, status);

-- One open request per staff member, clinic and period
CREATE UNIQUE INDEX IF NOT EXISTS idx_corrections_pending
    ON correction_requests(staff_id, clinic_id, day, period) WHERE status = 'pending';

-- ============================================================================
-- High-cost medication programme
-- ============================================================================

CREATE TABLE IF NOT EXISTS patients (
    id TEXT PRIMARY KEY,
    full_name TEXT NOT NULL CHECK (length(trim(full_name)) > 0),
    sus_card TEXT NOT NULL UNIQUE CHECK (length(trim(sus_card)) > 0),
    created_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_patients_name ON patients(full_name);

CREATE TABLE IF NOT EXISTS high_cost_medications (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL CHECK (length(trim(name)) > 0),
    description TEXT,
    created_at TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE TABLE IF NOT EXISTS medication_lots (
    id TEXT PRIMARY KEY,
    medication_id TEXT NOT NULL REFERENCES high_cost_medications(id) ON DELETE CASCADE,
    lot_number TEXT NOT NULL,
    expiry_date TEXT NOT NULL,                      -- YYYY-MM-DD
    quantity INTEGER NOT NULL CHECK (quantity >= 0)
);

CREATE INDEX IF NOT EXISTS idx_lots_medication ON medication_lots(medication_id, expiry_date);

CREATE TABLE IF NOT EXISTS patient_medications (
    id TEXT PRIMARY KEY,
    patient_id TEXT NOT NULL REFERENCES patients(id) ON DELETE CASCADE,
    medication_id TEXT NOT NULL REFERENCES high_cost_medications(id) ON DELETE CASCADE,
    authorization_date TEXT,                        -- YYYY-MM-DD, NULL until authorized
    duration_months INTEGER NOT NULL DEFAULT 3 CHECK (duration_months >= 0),
    dispensations_performed INTEGER NOT NULL DEFAULT 0 CHECK (dispensations_performed >= 0),
    status TEXT NOT NULL DEFAULT 'awaiting'
        CHECK (status IN ('awaiting', 'available', 'out_of_stock')),
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL DEFAULT (datetime('now')),
    UNIQUE (patient_id, medication_id)
);

CREATE INDEX IF NOT EXISTS idx_links_patient ON patient_medications(patient_id);

-- Append-only delivery log
CREATE TABLE IF NOT EXISTS dispensation_events (
    id TEXT PRIMARY KEY,
    link_id TEXT NOT NULL REFERENCES patient_medications(id) ON DELETE CASCADE,
    dispensed_at TEXT NOT NULL,                     -- RFC 3339
    note TEXT
);

CREATE INDEX IF NOT EXISTS idx_events_link ON dispensation_events(link_id, dispensed_at);

CREATE TRIGGER IF NOT EXISTS dispensation_events_no_update BEFORE UPDATE ON dispensation_events
BEGIN
    SELECT RAISE(ABORT, 'Dispensation events are append-only');
END;
"#;

#[cfg(test)]
mod tests {
    use super::*;
    use rusqlite::Connection;

    fn setup() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(SCHEMA).unwrap();
        conn.execute(
            "INSERT INTO patients (id, full_name, sus_card, created_at) VALUES ('p1', 'Ana', '123', 'now')",
            [],
        )
        .unwrap();
        conn.execute(
            "INSERT INTO high_cost_medications (id, name) VALUES ('m1', 'Adalimumabe')",
            [],
        )
        .unwrap();
        conn.execute(
            "INSERT INTO patient_medications (id, patient_id, medication_id, created_at) VALUES ('l1', 'p1', 'm1', 'now')",
            [],
        )
        .unwrap();
        conn
    }

    #[test]
    fn test_schema_valid() {
        let conn = Connection::open_in_memory().unwrap();
        let result = conn.execute_batch(SCHEMA);
        assert!(result.is_ok(), "Schema should be valid SQL: {:?}", result);
        // Re-running must be harmless
        assert!(conn.execute_batch(SCHEMA).is_ok());
    }

    #[test]
    fn test_link_status_constraint() {
        let conn = setup();
        let result = conn.execute("UPDATE patient_medications SET status = 'delivered' WHERE id = 'l1'", []);
        assert!(result.is_err());
    }

    #[test]
    fn test_duplicate_link_rejected() {
        let conn = setup();
        let result = conn.execute(
            "INSERT INTO patient_medications (id, patient_id, medication_id, created_at) VALUES ('l2', 'p1', 'm1', 'now')",
            [],
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_events_append_only() {
        let conn = setup();
        conn.execute(
            "INSERT INTO dispensation_events (id, link_id, dispensed_at) VALUES ('e1', 'l1', '2026-10-17T10:00:00Z')",
            [],
        )
        .unwrap();

        let result = conn.execute("UPDATE dispensation_events SET note = 'x' WHERE id = 'e1'", []);
        assert!(result.is_err());
    }

    #[test]
    fn test_correction_period_constraint() {
        let conn = setup();
        conn.execute("INSERT INTO clinics (id, name) VALUES ('c1', 'UBS Centro')", []).unwrap();
        let result = conn.execute(
            "INSERT INTO correction_requests (id, staff_id, clinic_id, day, period, requested_at) \
             VALUES ('r1', 's1', 'c1', '2026-10-17', 'evening', 'now')",
            [],
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_unlink_cascades_events() {
        let conn = setup();
        conn.execute(
            "INSERT INTO dispensation_events (id, link_id, dispensed_at) VALUES ('e1', 'l1', '2026-10-17T10:00:00Z')",
            [],
        )
        .unwrap();
        conn.execute("DELETE FROM patient_medications WHERE id = 'l1'", []).unwrap();

        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM dispensation_events", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 0);
    }
}
