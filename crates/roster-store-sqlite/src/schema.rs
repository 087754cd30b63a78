//! SQL schema for the Roster SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

-- One row per employer. The NOCASE unique column is what turns a concurrent
-- duplicate insert into a constraint violation.
CREATE TABLE IF NOT EXISTS companies (
    company_id   INTEGER PRIMARY KEY AUTOINCREMENT,
    name         TEXT NOT NULL UNIQUE COLLATE NOCASE,   -- trimmed
    website      TEXT,
    domain       TEXT,
    profile_url  TEXT
);

CREATE TABLE IF NOT EXISTS employees (
    employee_id           INTEGER PRIMARY KEY AUTOINCREMENT,
    profile_url           TEXT NOT NULL UNIQUE,
    name                  TEXT NOT NULL,
    title                 TEXT,
    company_id            INTEGER REFERENCES companies(company_id),
    current_company       TEXT,
    employer_name         TEXT,
    employer_website      TEXT,
    employer_domain       TEXT,
    employer_external_id  INTEGER,
    employer_profile_url  TEXT,
    location              TEXT,
    city                  TEXT,
    region                TEXT,
    country               TEXT,
    country_code          TEXT,
    latitude              REAL,
    longitude             REAL,
    phone_numbers         TEXT NOT NULL DEFAULT '[]',   -- JSON array of strings
    emails                TEXT NOT NULL DEFAULT '[]',
    personal_emails       TEXT NOT NULL DEFAULT '[]',
    professional_emails   TEXT NOT NULL DEFAULT '[]',
    birth_year            INTEGER,
    profile_picture_url   TEXT,
    status                TEXT,
    suppressed            INTEGER NOT NULL DEFAULT 0,
    category              TEXT,
    education             TEXT NOT NULL DEFAULT '[]',   -- JSON array of Education
    job_history           TEXT NOT NULL DEFAULT '[]',   -- JSON array of JobHistoryEntry
    skills                TEXT NOT NULL DEFAULT '[]',   -- JSON array of strings
    is_enriched           INTEGER DEFAULT 0             -- sweep checkpoint
);

-- Derived from employees.job_history; rewritten on every write of that column.
CREATE TABLE IF NOT EXISTS employee_job_history (
    job_history_id  INTEGER PRIMARY KEY AUTOINCREMENT,
    employee_id     INTEGER NOT NULL REFERENCES employees(employee_id) ON DELETE CASCADE,
    company_id      INTEGER REFERENCES companies(company_id),
    position        INTEGER NOT NULL,
    company_name    TEXT,
    title           TEXT,
    start_date      TEXT,
    end_date        TEXT,
    is_current      INTEGER NOT NULL DEFAULT 0
);

CREATE INDEX IF NOT EXISTS employees_enriched_idx  ON employees(is_enriched);
CREATE INDEX IF NOT EXISTS employees_company_idx   ON employees(company_id);
CREATE INDEX IF NOT EXISTS job_history_employee_idx ON employee_job_history(employee_id);

PRAGMA user_version = 1;
";
