//! Opening, initializing and closing the application's SQLite database.

use std::{
    path::Path,
    sync::{Arc, Mutex},
};

use rusqlite::{Connection, Transaction as SqlTransaction};

use crate::{Error, sale::create_sale_table};

/// Create the tables for the domain models if they do not exist yet.
///
/// # Errors
/// Returns an error if a table cannot be created or if there is an SQL error.
pub fn initialize(connection: &Connection) -> Result<(), Error> {
    let transaction =
        SqlTransaction::new_unchecked(connection, rusqlite::TransactionBehavior::Exclusive)?;

    create_sale_table(&transaction)?;

    transaction.commit()?;

    Ok(())
}

/// Open the database at `path`, creating the file and schema if needed.
///
/// # Errors
/// Returns an error if the file cannot be opened or the schema cannot be created.
pub fn open(path: impl AsRef<Path>) -> Result<Connection, Error> {
    let connection = Connection::open(path)?;
    initialize(&connection)?;

    Ok(connection)
}

/// Close a shared database connection.
///
/// If other handles to the connection are still alive the connection is left
/// open and will be closed when the last handle is dropped.
pub fn close(connection: Arc<Mutex<Connection>>) {
    let connection = match Arc::try_unwrap(connection) {
        Ok(connection) => connection,
        Err(_) => {
            tracing::warn!("database connection is still shared, it will close when dropped");
            return;
        }
    };

    let connection = match connection.into_inner() {
        Ok(connection) => connection,
        Err(poisoned) => {
            tracing::warn!("database lock was poisoned, closing connection anyway");
            poisoned.into_inner()
        }
    };

    match connection.close() {
        Ok(()) => tracing::info!("Closed database connection."),
        Err((_, error)) => tracing::error!("could not close database connection: {error}"),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use rusqlite::Connection;

    use crate::sale::count_sales;

    use super::{close, initialize, open};

    #[test]
    fn initialize_is_idempotent() {
        let conn = Connection::open_in_memory().unwrap();

        initialize(&conn).unwrap();
        initialize(&conn).unwrap();

        assert_eq!(count_sales(&conn).unwrap(), 0);
    }

    #[test]
    fn open_creates_schema() {
        let conn = open(":memory:").unwrap();

        assert_eq!(count_sales(&conn).unwrap(), 0);
    }

    #[test]
    fn close_does_not_panic_when_shared() {
        let conn = Arc::new(Mutex::new(Connection::open_in_memory().unwrap()));
        let other_handle = conn.clone();

        close(conn);

        assert!(other_handle.lock().is_ok());
    }
}
