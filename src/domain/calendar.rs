use chrono::{Datelike, NaiveDate};

const MONTH_NAMES: [&str; 12] = [
    "Enero",
    "Febrero",
    "Marzo",
    "Abril",
    "Mayo",
    "Junio",
    "Julio",
    "Agosto",
    "Septiembre",
    "Octubre",
    "Noviembre",
    "Diciembre",
];

/// Spanish month name for `1..=12`.
pub fn month_name(month: u32) -> &'static str {
    month
        .checked_sub(1)
        .and_then(|index| MONTH_NAMES.get(index as usize))
        .copied()
        .unwrap_or("Desconocido")
}

/// Year/month/day triple stored in the `anio`/`mes`/`dia` reporting tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CalendarDay {
    pub year: i32,
    pub month: i32,
    pub day: i32,
}

impl CalendarDay {
    pub fn month_name(self) -> &'static str {
        month_name(self.month as u32)
    }
}

impl From<NaiveDate> for CalendarDay {
    fn from(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month() as i32,
            day: date.day() as i32,
        }
    }
}
