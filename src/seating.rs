//! Seating plan: occupancy, guest search and the map payload for the client view.

use std::collections::BTreeMap;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Serialize, Serializer};

use crate::error::ApiError;
use crate::models::{ChairUpdateRequest, Guest, Table, TablePlacement, TableShape};
use crate::normalize::{full_name_key, normalize_name};
use crate::repository::{DbError, GuestFilter, GuestRepository, TableRepository};

pub const MIN_QUERY_LEN: usize = 2;
pub const UNASSIGNED: &str = "unassigned";
pub const DEFAULT_GUEST_TYPE: &str = "Guest";

const DEFAULT_MAP_X: f64 = 300.0;
const DEFAULT_MAP_Y: f64 = 300.0;
const DEFAULT_MAP_SIZE: f64 = 85.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableAssignment {
    Assigned(i32),
    Unassigned,
}

impl From<Option<i32>> for TableAssignment {
    fn from(number: Option<i32>) -> Self {
        match number {
            Some(n) => TableAssignment::Assigned(n),
            None => TableAssignment::Unassigned,
        }
    }
}

impl Serialize for TableAssignment {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match *self {
            TableAssignment::Assigned(n) => serializer.serialize_i32(n),
            TableAssignment::Unassigned => serializer.serialize_str(UNASSIGNED),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Occupancy {
    pub capacity: i32,
    pub guests_count: i32,
    /// Negative when a table is over-assigned.
    pub available_seats: i32,
    pub occupancy_percentage: i32,
}

impl Occupancy {
    pub fn new(capacity: i32, guests_count: i32) -> Self {
        let occupancy_percentage = if capacity > 0 { guests_count * 100 / capacity } else { 0 };
        Occupancy {
            capacity,
            guests_count,
            available_seats: capacity - guests_count,
            occupancy_percentage,
        }
    }

    pub fn is_over_capacity(&self) -> bool {
        self.available_seats < 0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableOccupancy {
    pub number: i32,
    #[serde(flatten)]
    pub occupancy: Occupancy,
}

/// Buckets guests by table number in one pass. Unassigned guests are dropped.
pub fn group_by_table(guests: Vec<Guest>) -> BTreeMap<i32, Vec<Guest>> {
    let mut grouped: BTreeMap<i32, Vec<Guest>> = BTreeMap::new();
    for guest in guests {
        if let Some(number) = guest.table_number {
            grouped.entry(number).or_default().push(guest);
        }
    }
    grouped
}

pub fn occupancy_report<S>(store: &mut S) -> Result<Vec<TableOccupancy>, DbError>
where
    S: TableRepository + GuestRepository,
{
    let tables = store.list_tables()?;
    let grouped = group_by_table(store.find_guests(&GuestFilter::all())?);

    Ok(tables
        .iter()
        .map(|t| {
            let count = grouped.get(&t.number).map_or(0, Vec::len) as i32;
            TableOccupancy { number: t.number, occupancy: Occupancy::new(t.capacity, count) }
        })
        .collect())
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Seatmate {
    pub name: String,
    pub first_name: String,
    pub last_name: String,
    pub chair_position: Option<i32>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GuestMatch {
    pub guest_id: i32,
    pub guest_name: String,
    pub table_number: TableAssignment,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub table_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub table_description: Option<String>,
    pub table_guests: Vec<Seatmate>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchResult {
    pub found: bool,
    #[serde(flatten)]
    pub guest: Option<GuestMatch>,
}

impl SearchResult {
    pub fn not_found() -> Self {
        SearchResult { found: false, guest: None }
    }
}

/// Picks the guest a normalized `query` refers to.
///
/// Candidates are guests whose first name, last name or "first last" contains the
/// query. An exact "first last" match wins; otherwise the candidate with the
/// smallest normalized full name (then smallest id) is chosen.
pub fn best_match<'a>(guests: &'a [Guest], query: &str) -> Option<&'a Guest> {
    let mut exact: Option<(&'a Guest, String)> = None;
    let mut partial: Option<(&'a Guest, String)> = None;

    for guest in guests {
        let full = full_name_key(&guest.first_name, &guest.last_name);
        if full == query {
            if exact.as_ref().map_or(true, |(best, _)| guest.id < best.id) {
                exact = Some((guest, full));
            }
            continue;
        }

        let hit = full.contains(query)
            || normalize_name(&guest.first_name).contains(query)
            || normalize_name(&guest.last_name).contains(query);
        if !hit {
            continue;
        }

        let better = match &partial {
            None => true,
            Some((best, best_key)) => (&full, guest.id) < (best_key, best.id),
        };
        if better {
            partial = Some((guest, full));
        }
    }

    exact.or(partial).map(|(guest, _)| guest)
}

fn seat_order(a: &Guest, b: &Guest) -> std::cmp::Ordering {
    // Seated guests first, by chair; the rest alphabetically.
    let chair = |g: &Guest| g.chair_position.unwrap_or(i32::MAX);
    chair(a)
        .cmp(&chair(b))
        .then_with(|| full_name_key(&a.first_name, &a.last_name).cmp(&full_name_key(&b.first_name, &b.last_name)))
        .then_with(|| a.id.cmp(&b.id))
}

pub fn search_guest<S>(store: &mut S, raw_query: &str) -> Result<SearchResult, DbError>
where
    S: TableRepository + GuestRepository,
{
    let query = normalize_name(raw_query);
    if query.chars().count() < MIN_QUERY_LEN {
        return Ok(SearchResult::not_found());
    }

    let guests = store.find_guests(&GuestFilter::all())?;
    let Some(guest) = best_match(&guests, &query) else {
        log::debug!("No guest matches '{}' among {} guests", query, guests.len());
        return Ok(SearchResult::not_found());
    };
    log::debug!("Search '{}' picked guest {} ({:?})", query, guest.id, guest.table_number);

    let mut found = GuestMatch {
        guest_id: guest.id,
        guest_name: guest.full_name(),
        table_number: guest.table_number.into(),
        table_name: None,
        table_description: None,
        table_guests: Vec::new(),
    };

    if let Some(number) = guest.table_number {
        match store.get_table(number)? {
            Some(table) => {
                found.table_name = Some(table.name);
                found.table_description = Some(table.description);
            }
            None => log::debug!("Table {} is not registered", number),
        }

        let mut others: Vec<Guest> = guests
            .iter()
            .filter(|g| g.table_number == Some(number) && g.id != guest.id)
            .cloned()
            .collect();
        others.sort_by(seat_order);
        found.table_guests = others
            .into_iter()
            .map(|g| Seatmate {
                name: g.full_name(),
                first_name: g.first_name,
                last_name: g.last_name,
                chair_position: g.chair_position,
            })
            .collect();
    }

    Ok(SearchResult { found: true, guest: Some(found) })
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MapGuest {
    pub id: i32,
    pub full_name: String,
    pub first_name: String,
    pub last_name: String,
    pub guest_type: String,
    pub chair_position: Option<i32>,
}

impl From<Guest> for MapGuest {
    fn from(g: Guest) -> Self {
        let full_name = g.full_name();
        let guest_type = if g.guest_type.trim().is_empty() { DEFAULT_GUEST_TYPE.to_string() } else { g.guest_type };
        MapGuest {
            id: g.id,
            full_name,
            first_name: g.first_name,
            last_name: g.last_name,
            guest_type,
            chair_position: g.chair_position,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableDetails {
    pub name: String,
    pub description: String,
    pub capacity: i32,
    pub available_seats: i32,
    pub occupancy_percentage: i32,
    pub over_capacity: bool,
    pub map_x: f64,
    pub map_y: f64,
    pub map_width: f64,
    pub map_height: f64,
    pub shape: TableShape,
    pub color: String,
    pub border_color: String,
}

/// One entry of the seating map. Guests pointing at a table number with no
/// registry row still get an entry, with `registered: false` and no details.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MapTable {
    pub number: i32,
    pub registered: bool,
    pub guests_count: i32,
    pub guest_list: Vec<MapGuest>,
    #[serde(flatten)]
    pub details: Option<TableDetails>,
}

fn coordinate_or(value: f64, fallback: f64) -> f64 {
    if value.is_finite() && value != 0.0 { value } else { fallback }
}

fn size_or(value: f64, fallback: f64) -> f64 {
    if value.is_finite() && value > 0.0 { value } else { fallback }
}

fn table_details(table: Table, occupancy: Occupancy) -> TableDetails {
    TableDetails {
        name: table.name,
        description: table.description,
        capacity: table.capacity,
        available_seats: occupancy.available_seats,
        occupancy_percentage: occupancy.occupancy_percentage,
        over_capacity: occupancy.is_over_capacity(),
        map_x: coordinate_or(table.map_x, DEFAULT_MAP_X),
        map_y: coordinate_or(table.map_y, DEFAULT_MAP_Y),
        map_width: size_or(table.map_width, DEFAULT_MAP_SIZE),
        map_height: size_or(table.map_height, DEFAULT_MAP_SIZE),
        shape: table.shape,
        color: table.color,
        border_color: table.border_color,
    }
}

pub fn export_map<S>(store: &mut S) -> Result<Vec<MapTable>, DbError>
where
    S: TableRepository + GuestRepository,
{
    let tables = store.list_tables()?;
    let mut grouped = group_by_table(store.find_guests(&GuestFilter::all())?);
    let mut layout = Vec::with_capacity(tables.len());

    for table in tables {
        let mut seated = grouped.remove(&table.number).unwrap_or_default();
        seated.sort_by(seat_order);
        let occupancy = Occupancy::new(table.capacity, seated.len() as i32);
        layout.push(MapTable {
            number: table.number,
            registered: true,
            guests_count: occupancy.guests_count,
            guest_list: seated.into_iter().map(MapGuest::from).collect(),
            details: Some(table_details(table, occupancy)),
        });
    }

    for (number, mut seated) in grouped {
        log::debug!("{} guests reference unregistered table {}", seated.len(), number);
        seated.sort_by(seat_order);
        layout.push(MapTable {
            number,
            registered: false,
            guests_count: seated.len() as i32,
            guest_list: seated.into_iter().map(MapGuest::from).collect(),
            details: None,
        });
    }

    layout.sort_by_key(|t| t.number);
    Ok(layout)
}

/// Moves a guest to another chair at their table.
///
/// When the guest's table is registered the chair must be within its capacity
/// and not held by another guest at that table.
pub fn update_chair_position<S>(store: &mut S, request: &ChairUpdateRequest) -> Result<Guest, ApiError>
where
    S: TableRepository + GuestRepository,
{
    let (Some(guest_id), Some(chair_position)) = (request.guest_id, request.chair_position) else {
        return Err(ApiError::ValidationMissing("guest_id and chair_position are required".to_string()));
    };
    if chair_position < 1 {
        return Err(ApiError::MalformedInput("chair_position must be at least 1".to_string()));
    }

    let guest = store
        .get_guest(guest_id)?
        .ok_or_else(|| ApiError::NotFound(format!("guest {} not found", guest_id)))?;

    if let Some(number) = guest.table_number {
        if let Some(table) = store.get_table(number)? {
            if chair_position > table.capacity {
                return Err(ApiError::MalformedInput(format!(
                    "table {} has only {} chairs",
                    number, table.capacity
                )));
            }

            let holder = store
                .find_guests(&GuestFilter::at_table(number))?
                .into_iter()
                .find(|g| g.id != guest.id && g.chair_position == Some(chair_position));
            if let Some(holder) = holder {
                return Err(ApiError::Conflict(format!(
                    "chair {} at table {} is taken by {}",
                    chair_position,
                    number,
                    holder.full_name()
                )));
            }
        }
    }

    store
        .set_chair_position(guest_id, chair_position)?
        .ok_or_else(|| ApiError::NotFound(format!("guest {} not found", guest_id)))
}

fn hex_color() -> &'static Regex {
    static HEX_COLOR: OnceLock<Regex> = OnceLock::new();
    HEX_COLOR.get_or_init(|| Regex::new(r"^#[0-9a-fA-F]{6}$").expect("hex color pattern is valid"))
}

pub fn validate_placement(placement: &TablePlacement) -> Result<(), ApiError> {
    let coords = [placement.map_x, placement.map_y, placement.map_width, placement.map_height];
    if coords.iter().any(|v| !v.is_finite()) {
        return Err(ApiError::MalformedInput("map coordinates must be finite numbers".to_string()));
    }
    if placement.map_width <= 0.0 || placement.map_height <= 0.0 {
        return Err(ApiError::MalformedInput("map_width and map_height must be positive".to_string()));
    }
    for color in [&placement.color, &placement.border_color].into_iter().flatten() {
        if !hex_color().is_match(color) {
            return Err(ApiError::MalformedInput(format!("'{}' is not a #RRGGBB color", color)));
        }
    }
    Ok(())
}

pub fn update_table_placement<S>(store: &mut S, number: i32, placement: &TablePlacement) -> Result<Table, ApiError>
where
    S: TableRepository,
{
    validate_placement(placement)?;
    store
        .update_placement(number, placement)?
        .ok_or_else(|| ApiError::NotFound(format!("table {} not found", number)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::memory::{guest, table, MemoryStore};

    fn wedding() -> MemoryStore {
        MemoryStore::new()
            .with_table(table(5, 8))
            .with_table(table(2, 2))
            .with_guest(guest(1, "Anna", "Nowak", Some(5), Some(1)))
            .with_guest(guest(2, "Piotr", "Nowak", Some(5), Some(2)))
            .with_guest(guest(3, "Andrzej", "Kowalski", Some(2), None))
    }

    fn found(result: &SearchResult) -> &GuestMatch {
        result.guest.as_ref().expect("guest should be found")
    }

    #[test]
    fn test_occupancy_counts_and_free_seats() {
        let mut store = wedding();
        let report = occupancy_report(&mut store).unwrap();
        assert_eq!(report.len(), 2);
        assert_eq!(report[0].number, 2);
        assert_eq!(report[0].occupancy.guests_count, 1);
        assert_eq!(report[1].number, 5);
        assert_eq!(report[1].occupancy.guests_count, 2);
        assert_eq!(report[1].occupancy.available_seats, 6);
        assert_eq!(report[1].occupancy.occupancy_percentage, 25);
    }

    #[test]
    fn test_occupancy_may_go_negative() {
        let occupancy = Occupancy::new(2, 3);
        assert_eq!(occupancy.available_seats, -1);
        assert!(occupancy.is_over_capacity());
        assert_eq!(Occupancy::new(0, 4).occupancy_percentage, 0);
    }

    #[test]
    fn test_search_returns_table_and_seatmates() {
        let mut store = wedding();
        let result = search_guest(&mut store, "Anna").unwrap();
        assert!(result.found);
        let m = found(&result);
        assert_eq!(m.guest_name, "Anna Nowak");
        assert_eq!(m.table_number, TableAssignment::Assigned(5));
        assert_eq!(m.table_name.as_deref(), Some("Table 5"));
        let names: Vec<&str> = m.table_guests.iter().map(|g| g.name.as_str()).collect();
        assert_eq!(names, vec!["Piotr Nowak"]);
    }

    #[test]
    fn test_short_queries_find_nothing() {
        let mut store = wedding();
        for q in ["", "a", " A ", "ł"] {
            assert_eq!(search_guest(&mut store, q).unwrap(), SearchResult::not_found());
        }
    }

    #[test]
    fn test_exact_full_name_outranks_partial() {
        let guests = vec![
            guest(1, "Anna", "Nowakowska", None, None),
            guest(2, "Anna", "Nowak", None, None),
        ];
        assert_eq!(best_match(&guests, "anna nowak").map(|g| g.id), Some(2));
    }

    #[test]
    fn test_partial_tie_break_is_alphabetical() {
        let guests = vec![
            guest(1, "Anna", "Nowak", None, None),
            guest(2, "Andrzej", "Kowalski", None, None),
        ];
        assert_eq!(best_match(&guests, "an").map(|g| g.id), Some(2));

        let reversed: Vec<Guest> = guests.into_iter().rev().collect();
        assert_eq!(best_match(&reversed, "an").map(|g| g.id), Some(2));
    }

    #[test]
    fn test_search_ignores_case_and_diacritics() {
        let mut store = MemoryStore::new().with_guest(guest(1, "Łucja", "Żółtowska", None, None));
        let result = search_guest(&mut store, "lucja ZOLTOWSKA").unwrap();
        let m = found(&result);
        assert_eq!(m.guest_id, 1);
        assert_eq!(m.table_number, TableAssignment::Unassigned);
        assert!(m.table_guests.is_empty());
    }

    #[test]
    fn test_search_serializes_unassigned_sentinel() {
        let mut store = MemoryStore::new().with_guest(guest(1, "Jan", "Kowalski", None, None));
        let value = serde_json::to_value(search_guest(&mut store, "jan").unwrap()).unwrap();
        assert_eq!(value["found"], true);
        assert_eq!(value["table_number"], "unassigned");
        assert!(value.get("table_name").is_none());

        let missing = serde_json::to_value(search_guest(&mut store, "zzz").unwrap()).unwrap();
        assert_eq!(missing, serde_json::json!({ "found": false }));
    }

    #[test]
    fn test_search_with_unregistered_table_still_lists_seatmates() {
        let mut store = MemoryStore::new()
            .with_guest(guest(1, "Ewa", "Lis", Some(99), None))
            .with_guest(guest(2, "Adam", "Lis", Some(99), None));
        let result = search_guest(&mut store, "ewa").unwrap();
        let m = found(&result);
        assert_eq!(m.table_number, TableAssignment::Assigned(99));
        assert_eq!(m.table_name, None);
        assert_eq!(m.table_guests.len(), 1);
    }

    #[test]
    fn test_map_export_merges_registry_and_guests() {
        let mut store = wedding();
        let layout = export_map(&mut store).unwrap();
        assert_eq!(layout.iter().map(|t| t.number).collect::<Vec<_>>(), vec![2, 5]);

        let five = &layout[1];
        assert_eq!(five.guests_count, 2);
        assert_eq!(five.guest_list[0].full_name, "Anna Nowak");
        assert_eq!(five.guest_list[0].guest_type, DEFAULT_GUEST_TYPE);
        assert_eq!(five.guest_list[1].chair_position, Some(2));
        let details = five.details.as_ref().unwrap();
        assert_eq!(details.available_seats, 6);
        assert!(!details.over_capacity);
    }

    #[test]
    fn test_map_export_keeps_unregistered_tables() {
        let mut store = wedding().with_guest(guest(4, "Ola", "Wrona", Some(99), None));
        let layout = export_map(&mut store).unwrap();
        let orphan = layout.last().unwrap();
        assert_eq!(orphan.number, 99);
        assert!(!orphan.registered);
        assert_eq!(orphan.guests_count, 1);
        assert!(orphan.details.is_none());

        let value = serde_json::to_value(orphan).unwrap();
        assert!(value.get("capacity").is_none());
        assert!(value.get("map_x").is_none());
    }

    #[test]
    fn test_map_export_falls_back_to_default_geometry() {
        let mut broken = table(1, 4);
        broken.map_x = 0.0;
        broken.map_width = -3.0;
        broken.map_height = f64::NAN;
        let mut store = MemoryStore::new().with_table(broken);
        let layout = export_map(&mut store).unwrap();
        let details = layout[0].details.as_ref().unwrap();
        assert_eq!(details.map_x, DEFAULT_MAP_X);
        assert_eq!(details.map_width, DEFAULT_MAP_SIZE);
        assert_eq!(details.map_height, DEFAULT_MAP_SIZE);
    }

    #[test]
    fn test_map_export_is_idempotent() {
        let mut store = wedding();
        let first = export_map(&mut store).unwrap();
        let second = export_map(&mut store).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_chair_update_is_visible_in_map() {
        let mut store = wedding();
        let request = ChairUpdateRequest { guest_id: Some(2), chair_position: Some(7) };
        let updated = update_chair_position(&mut store, &request).unwrap();
        assert_eq!(updated.chair_position, Some(7));

        let layout = export_map(&mut store).unwrap();
        let piotr = layout[1].guest_list.iter().find(|g| g.id == 2).unwrap();
        assert_eq!(piotr.chair_position, Some(7));
    }

    #[test]
    fn test_chair_update_requires_both_fields() {
        let mut store = wedding();
        let request = ChairUpdateRequest { guest_id: Some(1), chair_position: None };
        assert!(matches!(update_chair_position(&mut store, &request), Err(ApiError::ValidationMissing(_))));
        let request = ChairUpdateRequest { guest_id: None, chair_position: Some(1) };
        assert!(matches!(update_chair_position(&mut store, &request), Err(ApiError::ValidationMissing(_))));
    }

    #[test]
    fn test_chair_update_rejects_bad_positions() {
        let mut store = wedding();
        let zero = ChairUpdateRequest { guest_id: Some(1), chair_position: Some(0) };
        assert!(matches!(update_chair_position(&mut store, &zero), Err(ApiError::MalformedInput(_))));

        let beyond = ChairUpdateRequest { guest_id: Some(1), chair_position: Some(9) };
        assert!(matches!(update_chair_position(&mut store, &beyond), Err(ApiError::MalformedInput(_))));

        let taken = ChairUpdateRequest { guest_id: Some(1), chair_position: Some(2) };
        assert!(matches!(update_chair_position(&mut store, &taken), Err(ApiError::Conflict(_))));

        let missing = ChairUpdateRequest { guest_id: Some(42), chair_position: Some(1) };
        assert!(matches!(update_chair_position(&mut store, &missing), Err(ApiError::NotFound(_))));
    }

    #[test]
    fn test_chair_update_keeps_own_chair() {
        let mut store = wedding();
        let same = ChairUpdateRequest { guest_id: Some(1), chair_position: Some(1) };
        assert!(update_chair_position(&mut store, &same).is_ok());
    }

    #[test]
    fn test_placement_validation() {
        let mut placement = TablePlacement {
            map_x: 120.0,
            map_y: 40.0,
            map_width: 60.0,
            map_height: 200.0,
            shape: Some(TableShape::Rectangular),
            color: Some("#d4a574".to_string()),
            border_color: None,
        };
        assert!(validate_placement(&placement).is_ok());

        placement.border_color = Some("brown".to_string());
        assert!(validate_placement(&placement).is_err());

        placement.border_color = None;
        placement.map_height = 0.0;
        assert!(validate_placement(&placement).is_err());
    }

    #[test]
    fn test_update_table_placement() {
        let mut store = wedding();
        let placement = TablePlacement {
            map_x: 425.0,
            map_y: 125.0,
            map_width: 350.0,
            map_height: 70.0,
            shape: Some(TableShape::Rectangular),
            color: None,
            border_color: None,
        };
        let moved = update_table_placement(&mut store, 5, &placement).unwrap();
        assert_eq!(moved.map_x, 425.0);
        assert_eq!(moved.shape, TableShape::Rectangular);
        assert_eq!(moved.color, "#d4c4a8");

        assert!(matches!(update_table_placement(&mut store, 77, &placement), Err(ApiError::NotFound(_))));
    }
}
