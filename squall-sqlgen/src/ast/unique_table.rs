use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use squall_catalog::{Column, Table};

static NEXT_ID: AtomicU64 = AtomicU64::new(0);

/// A single occurrence of a table in a `FROM` clause.
///
/// Unlike `Table`, a `UniqueTable` deliberately does not implement value
/// equality: two wrappers around the same underlying table are distinct,
/// which is what makes self-joins representable. Identity is a
/// process-unique ticket, so the `(name, id)` pair gives a deterministic
/// ordering for alias assignment.
#[derive(Debug, Clone)]
pub struct UniqueTable {
    table: Arc<Table>,
    id: u64,
}

impl UniqueTable {
    pub fn new(table: Arc<Table>) -> UniqueTable {
        UniqueTable {
            table,
            id: NEXT_ID.fetch_add(1, Ordering::Relaxed),
        }
    }

    pub fn table(&self) -> &Arc<Table> {
        &self.table
    }

    pub fn name(&self) -> &str {
        &self.table.name
    }

    pub fn columns(&self) -> &[Column] {
        &self.table.columns
    }

    pub fn id(&self) -> u64 {
        self.id
    }
}

impl PartialEq for UniqueTable {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for UniqueTable {}

impl Hash for UniqueTable {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use squall_catalog::{ColumnConstraint, DataType};

    #[test]
    fn test_identity_equality() {
        let table = Arc::new(Table::new(
            "t",
            vec![Column::new("x", DataType::Integer, ColumnConstraint::default())],
        ));
        let first = UniqueTable::new(Arc::clone(&table));
        let second = UniqueTable::new(Arc::clone(&table));

        assert_eq!(first, first.clone());
        assert_ne!(first, second);
        assert_eq!(first.table(), second.table());
    }
}
