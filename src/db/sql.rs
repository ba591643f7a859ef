//! PostgreSQL functions used by the array-column updates.

use diesel::define_sql_function;
use diesel::sql_types::{Array, Uuid as SqlUuid};

define_sql_function! {
    /// `array_append(arr, elem)`
    fn array_append(array: Array<SqlUuid>, element: SqlUuid) -> Array<SqlUuid>;
}

define_sql_function! {
    /// `array_remove(arr, elem)`, removing every occurrence
    fn array_remove(array: Array<SqlUuid>, element: SqlUuid) -> Array<SqlUuid>;
}
