//! Shared fixtures for guide-lint tests.

use std::fs;
use std::path::Path;

use guide_lint_config::ValidatorSettings;

/// A PostgreSQL command guide that passes every default rule.
pub const CLEAN_GUIDE: &str = r#"# PostgreSQL Command Guide

## Table of Contents

- [Installation](#installation)
- [Connecting to a Database](#connecting-to-a-database)
- [Schema & Tables](#schema--tables)
- [Querying Data](#querying-data)
- [Backup and Restore](#backup-and-restore)

## Installation

Install the server and client packages:

```bash
sudo apt-get install postgresql postgresql-contrib
```

## Connecting to a Database

```bash
psql -U postgres -d mydb
```

## Schema & Tables

```sql
CREATE TABLE users (
    id SERIAL PRIMARY KEY,
    email TEXT UNIQUE NOT NULL
);
```

## Querying Data

1. Filter rows with `WHERE`.
2. Sort with `ORDER BY`.

```sql
SELECT id, email FROM users WHERE id > 10 ORDER BY email;
```

## Backup and Restore

Finish [Installation](#installation) first.

```text
pg_dump mydb > mydb.sql
```
"#;

/// Validator settings with built-in defaults.
pub fn validator_settings() -> ValidatorSettings {
    ValidatorSettings::default()
}

/// Write `contents` to `relative` under `dir`, creating parent directories.
pub fn write_file(dir: &Path, relative: &str, contents: &str) {
    let path = dir.join(relative);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("create parent directory");
    }
    fs::write(&path, contents).expect("write file");
}
