use diesel::prelude::*;
use crate::models::{self, Guest, NewGuest, Table, TablePlacement};
use crate::repository::{DbError, GuestFilter, GuestRepository, TableRepository};

/// Seating repositories over a pooled PostgreSQL connection.
pub struct PgStore<'a> {
    conn: &'a mut PgConnection,
}

impl<'a> PgStore<'a> {
    pub fn new(conn: &'a mut PgConnection) -> Self {
        PgStore { conn }
    }
}

impl TableRepository for PgStore<'_> {
    fn get_table(&mut self, table_no: i32) -> Result<Option<Table>, DbError> {
        use crate::schema::wedding_tables::dsl::{number, wedding_tables};

        let table = wedding_tables
            .filter(number.eq(table_no))
            .select(Table::as_select())
            .first(self.conn)
            .optional()?;

        Ok(table)
    }

    fn list_tables(&mut self) -> Result<Vec<Table>, DbError> {
        use crate::schema::wedding_tables::dsl::{number, wedding_tables};

        let tables = wedding_tables
            .order(number.asc())
            .select(Table::as_select())
            .load(self.conn)?;

        Ok(tables)
    }

    fn update_placement(&mut self, table_no: i32, placement: &TablePlacement) -> Result<Option<Table>, DbError> {
        use crate::schema::wedding_tables::dsl::{number, wedding_tables};

        let table = diesel::update(wedding_tables.filter(number.eq(table_no)))
            .set(placement)
            .returning(Table::as_returning())
            .get_result(self.conn)
            .optional()?;

        Ok(table)
    }
}

impl GuestRepository for PgStore<'_> {
    fn get_guest(&mut self, guest_id: i32) -> Result<Option<Guest>, DbError> {
        use crate::schema::guests::dsl::guests;

        let guest = guests
            .find(guest_id)
            .select(Guest::as_select())
            .first(self.conn)
            .optional()?;

        Ok(guest)
    }

    fn find_guests(&mut self, filter: &GuestFilter) -> Result<Vec<Guest>, DbError> {
        use crate::schema::guests::dsl::{confirmed, guests, id, table_number};

        let mut query = guests.select(Guest::as_select()).into_boxed();

        if let Some(table_no) = filter.table_number {
            query = query.filter(table_number.eq(table_no));
        } else if filter.unassigned_only {
            query = query.filter(table_number.is_null());
        }

        if let Some(flag) = filter.confirmed {
            query = query.filter(confirmed.eq(flag));
        }

        let found = query.order(id.asc()).load(self.conn)?;

        Ok(found)
    }

    fn insert_guest(&mut self, new_guest: &NewGuest) -> Result<Guest, DbError> {
        use crate::schema::guests::dsl::guests;

        let guest = diesel::insert_into(guests)
            .values(new_guest)
            .returning(Guest::as_returning())
            .get_result(self.conn)?;

        Ok(guest)
    }

    fn set_table_number(&mut self, guest_id: i32, table_no: Option<i32>) -> Result<Option<Guest>, DbError> {
        use crate::schema::guests::dsl::{chair_position, guests, table_number};

        let guest = diesel::update(guests.find(guest_id))
            .set((table_number.eq(table_no), chair_position.eq::<Option<i32>>(None)))
            .returning(Guest::as_returning())
            .get_result(self.conn)
            .optional()?;

        Ok(guest)
    }

    fn set_chair_position(&mut self, guest_id: i32, position: i32) -> Result<Option<Guest>, DbError> {
        use crate::schema::guests::dsl::{chair_position, guests};

        let guest = diesel::update(guests.find(guest_id))
            .set(chair_position.eq(Some(position)))
            .returning(Guest::as_returning())
            .get_result(self.conn)
            .optional()?;

        Ok(guest)
    }
}

pub fn get_wedding_info(conn: &mut PgConnection) -> Result<Option<models::WeddingInfo>, DbError> {
    use crate::schema::wedding_info::dsl::{id, wedding_info};

    let info = wedding_info
        .order(id.asc())
        .select(models::WeddingInfo::as_select())
        .first(conn)
        .optional()?;

    Ok(info)
}

pub fn count_approved_photos(conn: &mut PgConnection, category_filter: Option<&str>) -> Result<i64, DbError> {
    use crate::schema::photos::dsl::{approved, category, photos};

    let mut query = photos.filter(approved.eq(true)).count().into_boxed();

    if let Some(cat) = category_filter {
        query = query.filter(category.eq(cat.to_owned()));
    }

    let total = query.get_result::<i64>(conn)?;

    Ok(total)
}

pub fn list_approved_photos(
    conn: &mut PgConnection,
    category_filter: Option<&str>,
    offset: i64,
    limit: i64,
) -> Result<Vec<models::Photo>, DbError> {
    use crate::schema::photos::dsl::{approved, category, photos, upload_date};

    let mut query = photos.filter(approved.eq(true)).select(models::Photo::as_select()).into_boxed();

    if let Some(cat) = category_filter {
        query = query.filter(category.eq(cat.to_owned()));
    }

    let page = query
        .order(upload_date.desc())
        .offset(offset)
        .limit(limit)
        .load(conn)?;

    Ok(page)
}

pub fn list_featured_photos(conn: &mut PgConnection, limit: i64) -> Result<Vec<models::Photo>, DbError> {
    use crate::schema::photos::dsl::{approved, featured, photos, upload_date};

    let found = photos
        .filter(approved.eq(true).and(featured.eq(true)))
        .order(upload_date.desc())
        .limit(limit)
        .select(models::Photo::as_select())
        .load(conn)?;

    Ok(found)
}

pub fn list_pending_photos(conn: &mut PgConnection) -> Result<Vec<models::Photo>, DbError> {
    use crate::schema::photos::dsl::{approved, photos, upload_date};

    let found = photos
        .filter(approved.eq(false))
        .order(upload_date.asc())
        .select(models::Photo::as_select())
        .load(conn)?;

    Ok(found)
}

pub fn insert_photos(conn: &mut PgConnection, new_photos: &[models::NewPhoto]) -> Result<Vec<models::Photo>, DbError> {
    use crate::schema::photos::dsl::photos;

    conn.transaction(|conn| {
        let inserted = diesel::insert_into(photos)
            .values(new_photos)
            .returning(models::Photo::as_returning())
            .get_results(conn)?;

        Ok(inserted)
    })
}

pub fn approve_photo(conn: &mut PgConnection, photo_id: i32) -> Result<models::Photo, DbError> {
    use crate::schema::photos::dsl::{approved, photos};

    let photo = diesel::update(photos.find(photo_id))
        .set(approved.eq(true))
        .returning(models::Photo::as_returning())
        .get_result(conn)?;

    Ok(photo)
}

pub fn toggle_photo_featured(conn: &mut PgConnection, photo_id: i32) -> Result<models::Photo, DbError> {
    use crate::schema::photos::dsl::{featured, photos};

    let photo = diesel::update(photos.find(photo_id))
        .set(featured.eq(diesel::dsl::not(featured)))
        .returning(models::Photo::as_returning())
        .get_result(conn)?;

    Ok(photo)
}

pub fn delete_photo(conn: &mut PgConnection, photo_id: i32) -> Result<usize, DbError> {
    use crate::schema::photos::dsl::photos;

    let deleted = diesel::delete(photos.find(photo_id)).execute(conn)?;

    Ok(deleted)
}

pub fn list_schedule(conn: &mut PgConnection) -> Result<Vec<models::ScheduleEvent>, DbError> {
    use crate::schema::schedule_events::dsl::{schedule_events, sort_order, start_time};

    let events = schedule_events
        .order((sort_order.asc(), start_time.asc()))
        .select(models::ScheduleEvent::as_select())
        .load(conn)?;

    Ok(events)
}

pub fn list_menu_items(conn: &mut PgConnection) -> Result<Vec<models::MenuItem>, DbError> {
    use crate::schema::menu_items::dsl::{menu_items, name, sort_order};

    let items = menu_items
        .order((sort_order.asc(), name.asc()))
        .select(models::MenuItem::as_select())
        .load(conn)?;

    Ok(items)
}
