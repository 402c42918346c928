//! Lookup-or-create for the `anio`/`mes`/`dia` reporting rows.
//!
//! Inserts use `ON CONFLICT DO NOTHING` followed by a select, so concurrent
//! checkouts on the same day converge on the same ids.

use diesel::{ExpressionMethods, QueryDsl, QueryResult};
use diesel_async::{AsyncPgConnection, RunQueryDsl};

use crate::{
    domain::calendar::CalendarDay,
    schema::{anio, dia, mes},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeDimensionIds {
    pub anio_id: i32,
    pub mes_id: i32,
    pub dia_id: i32,
}

pub async fn ensure_day(
    conn: &mut AsyncPgConnection,
    day: CalendarDay,
) -> QueryResult<TimeDimensionIds> {
    diesel::insert_into(anio::table)
        .values(anio::valor.eq(day.year))
        .on_conflict(anio::valor)
        .do_nothing()
        .execute(conn)
        .await?;
    let anio_id = anio::table
        .filter(anio::valor.eq(day.year))
        .select(anio::id)
        .first(conn)
        .await?;

    diesel::insert_into(mes::table)
        .values((mes::numero.eq(day.month), mes::nombre.eq(day.month_name())))
        .on_conflict(mes::numero)
        .do_nothing()
        .execute(conn)
        .await?;
    let mes_id = mes::table
        .filter(mes::numero.eq(day.month))
        .select(mes::id)
        .first(conn)
        .await?;

    diesel::insert_into(dia::table)
        .values(dia::valor.eq(day.day))
        .on_conflict(dia::valor)
        .do_nothing()
        .execute(conn)
        .await?;
    let dia_id = dia::table
        .filter(dia::valor.eq(day.day))
        .select(dia::id)
        .first(conn)
        .await?;

    Ok(TimeDimensionIds {
        anio_id,
        mes_id,
        dia_id,
    })
}
