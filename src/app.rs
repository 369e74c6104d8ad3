//! Sidebar selection state and key handling for the terminal dashboard.

use crossterm::event::KeyCode;
use tracing::{info, warn};

use crate::csv_reader::TableSource;
use crate::error::LoadError;
use crate::pass::{compute, run_pass, Dashboard};
use crate::view::{FilterOptions, Selection};

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Focus {
    Prefectures,
    Years,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Tab {
    Table,
    Chart,
}

impl From<Tab> for usize {
    fn from(input: Tab) -> usize {
        match input {
            Tab::Table => 0,
            Tab::Chart => 1,
        }
    }
}

pub struct App<S> {
    source: S,
    pub options: FilterOptions,
    pub selection: Selection,
    /// Result of the latest pass. A failed pass replaces the previous data.
    pub pass: Result<Dashboard, LoadError>,
    pub focus: Focus,
    pub prefecture_cursor: usize,
    pub year_cursor: usize,
    pub tab: Tab,
    pub should_quit: bool,
}

impl<S: TableSource> App<S> {
    /// Run the first pass with the default selection. A load failure here is
    /// returned to the caller instead of being shown in the UI.
    pub fn new(source: S) -> Result<Self, LoadError> {
        let table = source.load()?;
        let options = FilterOptions::from_records(&table);
        let selection = options
            .default_selection()
            .unwrap_or_else(|| Selection::new(Vec::<String>::new(), 0));
        let pass = Ok(compute(&table, &selection));
        Ok(App {
            source,
            options,
            selection,
            pass,
            focus: Focus::Prefectures,
            prefecture_cursor: 0,
            year_cursor: 0,
            tab: Tab::Table,
            should_quit: false,
        })
    }

    /// Reload and recompute for the current selection.
    pub fn refresh(&mut self) {
        match run_pass(&self.source, &self.selection) {
            Ok(dashboard) => {
                self.options = dashboard.options.clone();
                self.prefecture_cursor = self
                    .prefecture_cursor
                    .min(self.options.prefectures.len().saturating_sub(1));
                self.year_cursor = self
                    .options
                    .years
                    .iter()
                    .position(|&y| y == self.selection.year)
                    .unwrap_or_else(|| self.year_cursor.min(self.options.years.len().saturating_sub(1)));
                self.pass = Ok(dashboard);
            }
            Err(err) => {
                warn!(error = %err, "pass failed");
                self.pass = Err(err);
            }
        }
    }

    pub fn on_key(&mut self, code: KeyCode) {
        match code {
            KeyCode::Char('q') | KeyCode::Esc => self.should_quit = true,
            KeyCode::Tab | KeyCode::Left | KeyCode::Right => {
                self.focus = match self.focus {
                    Focus::Prefectures => Focus::Years,
                    Focus::Years => Focus::Prefectures,
                }
            }
            KeyCode::Up => self.move_cursor(-1),
            KeyCode::Down => self.move_cursor(1),
            KeyCode::Char(' ') | KeyCode::Enter if self.focus == Focus::Prefectures => {
                self.toggle_prefecture()
            }
            KeyCode::Char('1') => self.tab = Tab::Table,
            KeyCode::Char('2') => self.tab = Tab::Chart,
            KeyCode::Char('r') => self.refresh(),
            _ => {}
        }
    }

    fn move_cursor(&mut self, delta: isize) {
        match self.focus {
            Focus::Prefectures => {
                self.prefecture_cursor = step(self.prefecture_cursor, delta, self.options.prefectures.len());
            }
            Focus::Years => {
                let next = step(self.year_cursor, delta, self.options.years.len());
                if let Some(&year) = self.options.years.get(next) {
                    self.year_cursor = next;
                    if year != self.selection.year {
                        self.selection.year = year;
                        info!(year, "year selected");
                        self.refresh();
                    }
                }
            }
        }
    }

    fn toggle_prefecture(&mut self) {
        let Some(name) = self.options.prefectures.get(self.prefecture_cursor).cloned() else {
            return;
        };
        if !self.selection.prefectures.remove(&name) {
            self.selection.prefectures.insert(name.clone());
            info!(prefecture = %name, "prefecture selected");
        } else {
            info!(prefecture = %name, "prefecture deselected");
        }
        self.refresh();
    }
}

fn step(cursor: usize, delta: isize, len: usize) -> usize {
    if len == 0 {
        return 0;
    }
    cursor.saturating_add_signed(delta).min(len - 1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::PopulationRecord;
    use std::cell::Cell;
    use std::io;
    use std::path::PathBuf;

    struct Memory {
        table: Vec<PopulationRecord>,
        fail: Cell<bool>,
    }

    impl TableSource for &Memory {
        fn load(&self) -> Result<Vec<PopulationRecord>, LoadError> {
            if self.fail.get() {
                return Err(LoadError::Io {
                    path: PathBuf::from("c01.csv"),
                    source: io::Error::new(io::ErrorKind::NotFound, "gone"),
                });
            }
            Ok(self.table.clone())
        }
    }

    fn rec(pref: &str, year: i32, total: f64) -> PopulationRecord {
        PopulationRecord {
            prefecture: pref.to_string(),
            year,
            total: Some(total),
            male: Some(total / 2.0),
            female: Some(total / 2.0),
        }
    }

    fn memory() -> Memory {
        Memory {
            table: vec![
                rec("Tokyo", 2020, 100.0),
                rec("Osaka", 2020, 80.0),
                rec("Tokyo", 2015, 90.0),
                rec("Osaka", 2015, 70.0),
            ],
            fail: Cell::new(false),
        }
    }

    fn total(app: &App<&Memory>) -> f64 {
        app.pass.as_ref().unwrap().totals.total
    }

    #[test]
    fn starts_with_first_prefecture_and_earliest_year() {
        let source = memory();
        let app = App::new(&source).unwrap();
        assert_eq!(app.selection, Selection::new(["Tokyo"], 2015));
        assert_eq!(total(&app), 90.0);
    }

    #[test]
    fn toggling_prefectures_recomputes() {
        let source = memory();
        let mut app = App::new(&source).unwrap();

        app.on_key(KeyCode::Down);
        app.on_key(KeyCode::Char(' '));
        assert_eq!(total(&app), 160.0);

        app.on_key(KeyCode::Up);
        app.on_key(KeyCode::Enter);
        assert_eq!(app.selection, Selection::new(["Osaka"], 2015));
        assert_eq!(total(&app), 70.0);

        app.on_key(KeyCode::Down);
        app.on_key(KeyCode::Char(' '));
        assert!(app.selection.prefectures.is_empty());
        assert_eq!(total(&app), 0.0);
    }

    #[test]
    fn year_list_moves_selection() {
        let source = memory();
        let mut app = App::new(&source).unwrap();

        app.on_key(KeyCode::Tab);
        app.on_key(KeyCode::Down);
        assert_eq!(app.selection.year, 2020);
        assert_eq!(total(&app), 100.0);

        app.on_key(KeyCode::Down);
        assert_eq!(app.year_cursor, 1);
        app.on_key(KeyCode::Up);
        assert_eq!(app.selection.year, 2015);
    }

    #[test]
    fn space_in_year_list_does_not_toggle() {
        let source = memory();
        let mut app = App::new(&source).unwrap();
        app.on_key(KeyCode::Right);
        app.on_key(KeyCode::Char(' '));
        assert_eq!(app.selection, Selection::new(["Tokyo"], 2015));
    }

    #[test]
    fn failed_pass_replaces_data_and_keeps_selection() {
        let source = memory();
        let mut app = App::new(&source).unwrap();

        source.fail.set(true);
        app.on_key(KeyCode::Char('r'));
        assert!(matches!(app.pass, Err(LoadError::Io { .. })));
        assert_eq!(app.selection, Selection::new(["Tokyo"], 2015));

        source.fail.set(false);
        app.on_key(KeyCode::Char('r'));
        assert_eq!(total(&app), 90.0);
    }

    #[test]
    fn startup_failure_is_returned() {
        let source = memory();
        source.fail.set(true);
        assert!(App::new(&source).is_err());
    }

    #[test]
    fn tabs_and_quit() {
        let source = memory();
        let mut app = App::new(&source).unwrap();
        app.on_key(KeyCode::Char('2'));
        assert_eq!(app.tab, Tab::Chart);
        assert_eq!(usize::from(app.tab), 1);
        app.on_key(KeyCode::Char('1'));
        assert_eq!(app.tab, Tab::Table);
        app.on_key(KeyCode::Char('q'));
        assert!(app.should_quit);
    }
}
