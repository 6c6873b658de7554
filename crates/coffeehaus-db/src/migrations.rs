use anyhow::Result;
use rusqlite::Connection;
use tracing::info;

pub fn run(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS users (
            id          TEXT PRIMARY KEY,
            email       TEXT NOT NULL UNIQUE,
            password    TEXT NOT NULL,
            created_at  TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE IF NOT EXISTS photos (
            id              TEXT PRIMARY KEY,
            owner_id        TEXT NOT NULL REFERENCES users(id),
            original_url    TEXT NOT NULL,
            created_at      TEXT NOT NULL DEFAULT (datetime('now'))
        );

        -- One profile per identity, created at profile setup.
        CREATE TABLE IF NOT EXISTS profiles (
            user_id             TEXT PRIMARY KEY REFERENCES users(id),
            username            TEXT NOT NULL UNIQUE,
            display_name        TEXT NOT NULL,
            bio                 TEXT,
            profile_photo_id    TEXT REFERENCES photos(id),
            created_at          TEXT NOT NULL DEFAULT (datetime('now')),
            updated_at          TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE IF NOT EXISTS shops (
            id                  TEXT PRIMARY KEY,
            google_place_id     TEXT NOT NULL UNIQUE,
            name                TEXT NOT NULL,
            formatted_address   TEXT NOT NULL DEFAULT '',
            vicinity            TEXT NOT NULL DEFAULT '',
            lat                 REAL NOT NULL,
            lng                 REAL NOT NULL,
            google_rating       REAL NOT NULL DEFAULT 0,
            ratings_total       INTEGER NOT NULL DEFAULT 0,
            price_level         INTEGER NOT NULL DEFAULT 0,
            types               TEXT NOT NULL DEFAULT '[]',
            photo_refs          TEXT NOT NULL DEFAULT '[]',
            opening_hours       TEXT,
            website             TEXT NOT NULL DEFAULT '',
            formatted_phone     TEXT NOT NULL DEFAULT '',
            business_status     TEXT NOT NULL DEFAULT '',
            coffeehaus_rating   REAL,
            last_sync           TEXT NOT NULL,
            verified            INTEGER NOT NULL DEFAULT 0
        );

        CREATE INDEX IF NOT EXISTS idx_shops_location
            ON shops(lat, lng);
        ",
    )?;

    info!("Database migrations complete");
    Ok(())
}
