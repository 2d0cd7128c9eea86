use std::fmt;
use std::str::FromStr;

use anyhow::anyhow;
use chrono::{
  Datelike, Duration, NaiveDate,
  Weekday
};
use serde::{Deserialize, Serialize};

use crate::i18n::{I18n, Key};

#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Default,
  Serialize,
  Deserialize
)]
#[serde(rename_all = "lowercase")]
pub enum CalendarMode {
  #[default]
  Month,
  Week,
  Day
}

impl CalendarMode {
  pub fn as_str(
    self
  ) -> &'static str {
    match self {
      | CalendarMode::Month => {
        "month"
      }
      | CalendarMode::Week => "week",
      | CalendarMode::Day => "day"
    }
  }

  pub fn label_key(self) -> Key {
    match self {
      | CalendarMode::Month => {
        Key::Month
      }
      | CalendarMode::Week => {
        Key::Week
      }
      | CalendarMode::Day => Key::Day
    }
  }
}

impl fmt::Display for CalendarMode {
  fn fmt(
    &self,
    f: &mut fmt::Formatter<'_>
  ) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl FromStr for CalendarMode {
  type Err = anyhow::Error;

  fn from_str(
    s: &str
  ) -> Result<Self, Self::Err> {
    match s
      .trim()
      .to_ascii_lowercase()
      .as_str()
    {
      | "month" | "m" => {
        Ok(CalendarMode::Month)
      }
      | "week" | "w" => {
        Ok(CalendarMode::Week)
      }
      | "day" | "d" => {
        Ok(CalendarMode::Day)
      }
      | other => {
        Err(anyhow!(
          "unknown calendar view: \
           {other}"
        ))
      }
    }
  }
}

#[derive(
  Debug, Clone, Copy, PartialEq, Eq,
)]
pub enum Direction {
  Prev,
  Next
}

#[derive(
  Debug, Clone, Copy, PartialEq, Eq,
)]
pub struct DayCell {
  pub date:     NaiveDate,
  pub in_month: bool,
  pub is_today: bool
}

/// Whole Sunday-first weeks covering
/// the month of `focus`.
pub fn month_grid(
  focus: NaiveDate,
  today: NaiveDate
) -> Vec<DayCell> {
  let first = first_day_of_month(
    focus.year(),
    focus.month()
  );
  let last = last_day_of_month(
    focus.year(),
    focus.month()
  );
  let start =
    start_of_week(first, Weekday::Sun);
  let end = add_days(
    start_of_week(last, Weekday::Sun),
    6
  );

  let mut cells = Vec::new();
  let mut day = start;
  while day <= end {
    cells.push(DayCell {
      date:     day,
      in_month: day.month()
        == focus.month(),
      is_today: day == today
    });
    day = add_days(day, 1);
  }
  cells
}

/// The seven days from the Sunday
/// on/before `focus`.
pub fn week_dates(
  focus: NaiveDate
) -> [NaiveDate; 7] {
  let start =
    start_of_week(focus, Weekday::Sun);
  std::array::from_fn(|offset| {
    add_days(start, offset as i64)
  })
}

pub fn hour_labels() -> Vec<String> {
  (0..24)
    .map(|hour| format!("{hour:02}:00"))
    .collect()
}

/// Focus date, mode and selected event
/// of the calendar screen.
#[derive(
  Debug, Clone, PartialEq, Eq,
)]
pub struct CalendarView {
  pub focus:          NaiveDate,
  pub mode:           CalendarMode,
  pub selected_event: Option<String>
}

impl CalendarView {
  pub fn new(
    today: NaiveDate,
    mode: CalendarMode
  ) -> Self {
    Self {
      focus: today,
      mode,
      selected_event: None
    }
  }

  pub fn navigate(
    &mut self,
    direction: Direction
  ) {
    let step = match direction {
      | Direction::Prev => -1,
      | Direction::Next => 1
    };
    self.focus = match self.mode {
      | CalendarMode::Month => {
        shift_months(self.focus, step)
      }
      | CalendarMode::Week => {
        add_days(
          self.focus,
          7 * step as i64
        )
      }
      | CalendarMode::Day => {
        add_days(
          self.focus,
          step as i64
        )
      }
    };
  }

  pub fn go_today(
    &mut self,
    today: NaiveDate
  ) {
    self.focus = today;
  }

  pub fn set_mode(
    &mut self,
    mode: CalendarMode
  ) {
    self.mode = mode;
  }

  pub fn select_event(
    &mut self,
    id: impl Into<String>
  ) {
    self.selected_event =
      Some(id.into());
  }

  pub fn clear_selection(&mut self) {
    self.selected_event = None;
  }

  pub fn title(
    &self,
    i18n: &I18n
  ) -> String {
    let month = i18n
      .month_name(self.focus.month0());
    let year = self.focus.year();
    match self.mode {
      | CalendarMode::Month => {
        format!("{month} {year}")
      }
      | CalendarMode::Week => {
        let days =
          week_dates(self.focus);
        format!(
          "{} - {} {month} {year}",
          days[0].day(),
          days[6].day()
        )
      }
      | CalendarMode::Day => {
        let weekday = i18n
          .weekday_full()[self
          .focus
          .weekday()
          .num_days_from_sunday()
          as usize];
        format!(
          "{weekday}, {} {month} \
           {year}",
          self.focus.day()
        )
      }
    }
  }

  pub fn mode_label(
    &self,
    i18n: &I18n
  ) -> &'static str {
    i18n.t(self.mode.label_key())
  }
}

/// Moves by whole months, clamping the
/// day to the target month's length.
pub fn shift_months(
  date: NaiveDate,
  months: i32
) -> NaiveDate {
  let mut year = date.year();
  let mut month =
    date.month() as i32 + months;

  while month < 1 {
    month += 12;
    year = year.saturating_sub(1);
  }
  while month > 12 {
    month -= 12;
    year = year.saturating_add(1);
  }

  let month = month as u32;
  let day = date
    .day()
    .min(days_in_month(year, month));
  NaiveDate::from_ymd_opt(
    year, month, day
  )
  .unwrap_or(date)
}

fn first_day_of_month(
  year: i32,
  month: u32
) -> NaiveDate {
  NaiveDate::from_ymd_opt(
    year, month, 1
  )
  .unwrap_or(NaiveDate::MIN)
}

fn last_day_of_month(
  year: i32,
  month: u32
) -> NaiveDate {
  let (next_year, next_month) =
    if month >= 12 {
      (year.saturating_add(1), 1_u32)
    } else {
      (year, month + 1)
    };
  add_days(
    first_day_of_month(
      next_year, next_month
    ),
    -1
  )
}

fn days_in_month(
  year: i32,
  month: u32
) -> u32 {
  last_day_of_month(year, month).day()
}

pub fn add_days(
  date: NaiveDate,
  days: i64
) -> NaiveDate {
  date
    .checked_add_signed(Duration::days(
      days
    ))
    .unwrap_or(date)
}

fn start_of_week(
  day: NaiveDate,
  week_start: Weekday
) -> NaiveDate {
  let day_idx = day
    .weekday()
    .num_days_from_monday()
    as i64;
  let start_idx = week_start
    .num_days_from_monday()
    as i64;
  let diff =
    (7 + day_idx - start_idx) % 7;
  add_days(day, -diff)
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::i18n::Language;

  fn date(
    y: i32,
    m: u32,
    d: u32
  ) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d)
      .expect("valid date")
  }

  #[test]
  fn month_grid_is_whole_sunday_weeks()
  {
    // June 2024 starts on a Saturday
    let cells = month_grid(
      date(2024, 6, 15),
      date(2024, 6, 15)
    );
    assert_eq!(cells.len() % 7, 0);
    assert_eq!(cells.len(), 42);
    assert_eq!(
      cells[0].date,
      date(2024, 5, 26)
    );
    assert_eq!(
      cells[0].date.weekday(),
      Weekday::Sun
    );
    assert!(!cells[0].in_month);
    assert_eq!(
      cells
        .iter()
        .filter(|c| c.in_month)
        .count(),
      30
    );
    assert_eq!(
      cells
        .iter()
        .filter(|c| c.is_today)
        .count(),
      1
    );
  }

  #[test]
  fn february_2026_fits_four_weeks() {
    let cells = month_grid(
      date(2026, 2, 1),
      date(2026, 1, 1)
    );
    assert_eq!(cells.len(), 28);
  }

  #[test]
  fn month_navigation_clamps_day() {
    let mut view = CalendarView::new(
      date(2024, 1, 31),
      CalendarMode::Month
    );
    view.navigate(Direction::Next);
    assert_eq!(
      view.focus,
      date(2024, 2, 29)
    );
    view.navigate(Direction::Prev);
    view.navigate(Direction::Prev);
    assert_eq!(
      view.focus,
      date(2023, 12, 29)
    );
  }

  #[test]
  fn week_and_day_navigation() {
    let mut view = CalendarView::new(
      date(2024, 5, 15),
      CalendarMode::Week
    );
    view.navigate(Direction::Next);
    assert_eq!(
      view.focus,
      date(2024, 5, 22)
    );
    view.set_mode(CalendarMode::Day);
    view.navigate(Direction::Prev);
    assert_eq!(
      view.focus,
      date(2024, 5, 21)
    );
    view.go_today(date(2024, 1, 1));
    assert_eq!(
      view.focus,
      date(2024, 1, 1)
    );
  }

  #[test]
  fn titles_are_localized() {
    let es = I18n::new(Language::Es);
    let en = I18n::new(Language::En);
    let mut view = CalendarView::new(
      date(2024, 5, 15),
      CalendarMode::Month
    );
    assert_eq!(
      view.title(&es),
      "Mayo 2024"
    );

    view.set_mode(CalendarMode::Week);
    assert_eq!(
      view.title(&en),
      "12 - 18 May 2024"
    );

    view.set_mode(CalendarMode::Day);
    assert_eq!(
      view.title(&es),
      "Miércoles, 15 Mayo 2024"
    );
  }

  #[test]
  fn hours_cover_the_day() {
    let hours = hour_labels();
    assert_eq!(hours.len(), 24);
    assert_eq!(hours[0], "00:00");
    assert_eq!(hours[23], "23:00");
  }
}
