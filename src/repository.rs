//! Storage seams for the seating subsystem.
//!
//! Services take `&mut S where S: TableRepository + GuestRepository` so the
//! connection is always handed in by the caller. [`crate::actions::PgStore`]
//! is the PostgreSQL implementation.

use crate::models::{Guest, NewGuest, Table, TablePlacement};

pub type DbError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct GuestFilter {
    pub table_number: Option<i32>,
    pub confirmed: Option<bool>,
    /// Only guests with no table number. Ignored when `table_number` is set.
    pub unassigned_only: bool,
}

impl GuestFilter {
    pub fn all() -> Self {
        GuestFilter::default()
    }

    pub fn at_table(number: i32) -> Self {
        GuestFilter { table_number: Some(number), ..GuestFilter::default() }
    }

    pub fn unassigned() -> Self {
        GuestFilter { unassigned_only: true, ..GuestFilter::default() }
    }

    pub fn matches(&self, guest: &Guest) -> bool {
        if let Some(number) = self.table_number {
            if guest.table_number != Some(number) {
                return false;
            }
        } else if self.unassigned_only && guest.table_number.is_some() {
            return false;
        }

        match self.confirmed {
            Some(confirmed) => guest.confirmed == confirmed,
            None => true,
        }
    }
}

pub trait TableRepository {
    fn get_table(&mut self, number: i32) -> Result<Option<Table>, DbError>;

    /// All tables ordered by number.
    fn list_tables(&mut self) -> Result<Vec<Table>, DbError>;

    fn update_placement(&mut self, number: i32, placement: &TablePlacement) -> Result<Option<Table>, DbError>;
}

pub trait GuestRepository {
    fn get_guest(&mut self, id: i32) -> Result<Option<Guest>, DbError>;

    /// Guests matching `filter`, ordered by id.
    fn find_guests(&mut self, filter: &GuestFilter) -> Result<Vec<Guest>, DbError>;

    fn insert_guest(&mut self, guest: &NewGuest) -> Result<Guest, DbError>;

    /// Moves a guest to another table (or none) and clears their chair.
    fn set_table_number(&mut self, id: i32, table_number: Option<i32>) -> Result<Option<Guest>, DbError>;

    fn set_chair_position(&mut self, id: i32, chair_position: i32) -> Result<Option<Guest>, DbError>;
}
