use serde::{Deserialize, Serialize};
use crate::schema::{guests, menu_items, photos, schedule_events, wedding_info, wedding_tables};
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use diesel::{deserialize::{self, FromSql}, pg::{Pg, PgValue}, serialize::{self, Output, ToSql}, sql_types::Text, Insertable, Selectable};

#[derive(Debug, Clone, PartialEq, Queryable, Selectable, Serialize, Deserialize)]
#[diesel(table_name = guests)]
pub struct Guest {
    pub id: i32,
    pub first_name: String,
    pub last_name: String,
    pub phone_number: String,
    pub table_number: Option<i32>,
    pub chair_position: Option<i32>,
    pub guest_type: String,
    pub dietary_requirements: String,
    pub plus_one: bool,
    pub confirmed: bool,
    pub created_at: Option<NaiveDateTime>,
}

impl Guest {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name).trim().to_string()
    }
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = guests)]
pub struct NewGuest {
    pub first_name: String,
    pub last_name: String,
    pub phone_number: String,
    pub table_number: Option<i32>,
    pub guest_type: String,
    pub confirmed: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, AsExpression, FromSqlRow)]
#[serde(rename_all = "lowercase")]
#[diesel(sql_type = Text)]
pub enum TableShape {
    #[default]
    Circular,
    Rectangular,
    Square,
}

impl TableShape {
    pub fn as_str(&self) -> &'static str {
        match *self {
            TableShape::Circular => "circular",
            TableShape::Rectangular => "rectangular",
            TableShape::Square => "square",
        }
    }
}

impl ToSql<Text, Pg> for TableShape {
    fn to_sql<'b>(&'b self, out: &mut Output<'b, '_, Pg>) -> serialize::Result {
        <str as ToSql<Text, Pg>>::to_sql(self.as_str(), out)
    }
}

impl FromSql<Text, Pg> for TableShape {
    fn from_sql(bytes: PgValue) -> deserialize::Result<Self> {
        match <String as FromSql<Text, Pg>>::from_sql(bytes)?.as_str() {
            "circular" => Ok(TableShape::Circular),
            "rectangular" => Ok(TableShape::Rectangular),
            "square" => Ok(TableShape::Square),
            s => Err(format!("Unrecognized table shape: {}", s).into()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Queryable, Selectable, Serialize, Deserialize)]
#[diesel(table_name = wedding_tables)]
pub struct Table {
    pub id: i32,
    pub number: i32,
    pub name: String,
    pub capacity: i32,
    pub description: String,
    pub map_x: f64,
    pub map_y: f64,
    pub map_width: f64,
    pub map_height: f64,
    pub shape: TableShape,
    pub color: String,
    pub border_color: String,
}

/// New map geometry for a table, as sent by the drag-and-drop positioning tool.
/// Styling fields left as `None` keep their stored values.
#[derive(Debug, Clone, AsChangeset, Deserialize)]
#[diesel(table_name = wedding_tables)]
pub struct TablePlacement {
    pub map_x: f64,
    pub map_y: f64,
    pub map_width: f64,
    pub map_height: f64,
    pub shape: Option<TableShape>,
    pub color: Option<String>,
    pub border_color: Option<String>,
}

pub const PHOTO_CATEGORIES: [&str; 7] = [
    "ceremony",
    "reception",
    "party",
    "preparations",
    "family",
    "friends",
    "other",
];

#[derive(Debug, Clone, Queryable, Selectable, Serialize)]
#[diesel(table_name = photos)]
pub struct Photo {
    pub id: i32,
    pub title: String,
    pub description: String,
    pub image_url: String,
    pub category: String,
    pub uploader_name: String,
    pub approved: bool,
    pub featured: bool,
    pub upload_date: NaiveDateTime,
}

#[derive(Debug, Clone, PartialEq, Insertable)]
#[diesel(table_name = photos)]
pub struct NewPhoto {
    pub title: String,
    pub description: String,
    pub image_url: String,
    pub category: String,
    pub uploader_name: String,
}

#[derive(Debug, Clone, Queryable, Selectable, Serialize)]
#[diesel(table_name = schedule_events)]
pub struct ScheduleEvent {
    pub id: i32,
    pub title: String,
    pub description: String,
    pub start_time: NaiveTime,
    pub end_time: Option<NaiveTime>,
    pub location: String,
    pub sort_order: i32,
}

/// Courses in the order the menu is printed.
pub const MENU_COURSES: [(&str, &str); 5] = [
    ("appetizer", "Appetizers"),
    ("soup", "Soups"),
    ("main", "Main courses"),
    ("dessert", "Desserts"),
    ("drink", "Drinks"),
];

#[derive(Debug, Clone, Queryable, Selectable, Serialize)]
#[diesel(table_name = menu_items)]
pub struct MenuItem {
    pub id: i32,
    pub name: String,
    pub description: String,
    pub course: String,
    pub price_cents: Option<i32>,
    pub allergens: String,
    pub vegetarian: bool,
    pub sort_order: i32,
}

#[derive(Debug, Clone, Queryable, Selectable, Serialize)]
#[diesel(table_name = wedding_info)]
pub struct WeddingInfo {
    pub id: i32,
    pub bride_name: String,
    pub groom_name: String,
    pub wedding_date: NaiveDate,
    pub venue_name: String,
    pub welcome_message: String,
    pub created_at: Option<NaiveDateTime>,
}

// Request/Response models for API
#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub q: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChairUpdateRequest {
    pub guest_id: Option<i32>,
    pub chair_position: Option<i32>,
}

#[derive(Debug, Deserialize)]
pub struct PhotoListQuery {
    pub page: Option<String>,
    pub category: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PhotoFile {
    pub filename: String,
    pub image_url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PhotoSubmission {
    pub photos: Vec<PhotoFile>,
    #[serde(default)]
    pub uploader_name: String,
    pub category: Option<String>,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct ImportOptions {
    #[serde(default)]
    pub dry_run: bool,
    #[serde(default)]
    pub update_existing: bool,
}

#[derive(Debug, Serialize)]
pub struct ApiResponse {
    pub success: bool,
    pub message: String,
}

impl ApiResponse {
    pub fn ok(message: impl Into<String>) -> Self {
        ApiResponse { success: true, message: message.into() }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        ApiResponse { success: false, message: message.into() }
    }
}
