use crate::board::BoardState;
use crate::types::Layout;
use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnCount {
    pub id: String,
    pub title: String,
    pub count: usize,
}

/// Figures shown in a board's header: progress and streak.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoardStats {
    pub total: usize,
    pub completed: usize,
    /// Rounded to the nearest whole percent; 0 for an empty board.
    pub completion_percent: u32,
    /// Consecutive days, ending today or yesterday, with at least one completion.
    pub streak_days: u32,
    pub columns: Vec<ColumnCount>,
}

pub fn compute(board: &BoardState, layout: &Layout, today: NaiveDate) -> BoardStats {
    let total = board.len();
    let completed = board.iter_items().filter(|i| i.completed).count();
    let completion_percent = if total == 0 {
        0
    } else {
        ((completed as f64 / total as f64) * 100.0).round() as u32
    };

    let columns = layout
        .columns
        .iter()
        .map(|c| ColumnCount {
            id: c.id.clone(),
            title: c.title.clone(),
            count: board.items(&c.id).map_or(0, |items| items.len()),
        })
        .collect();

    BoardStats {
        total,
        completed,
        completion_percent,
        streak_days: streak(board, today),
        columns,
    }
}

/// A streak still counts if today has no completion yet but yesterday does.
fn streak(board: &BoardState, today: NaiveDate) -> u32 {
    let days: HashSet<NaiveDate> = board
        .iter_items()
        .filter(|i| i.completed)
        .filter_map(|i| i.completed_at)
        .map(|at| at.date_naive())
        .collect();

    let mut cursor = if days.contains(&today) {
        today
    } else {
        match today.checked_sub_days(Days::new(1)) {
            Some(yesterday) if days.contains(&yesterday) => yesterday,
            _ => return 0,
        }
    };

    let mut count = 0;
    while days.contains(&cursor) {
        count += 1;
        match cursor.checked_sub_days(Days::new(1)) {
            Some(prev) => cursor = prev,
            None => break,
        }
    }
    count
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::item::Item;
    use crate::types::Column;
    use chrono::{TimeZone, Utc};

    fn layout() -> Layout {
        Layout::new(
            vec![
                Column::new("today", "Today"),
                Column::new("done", "Done").terminal(),
            ],
            "today",
        )
    }

    fn done_on(id: &str, pos: u32, y: i32, m: u32, d: u32) -> Item {
        let mut item = Item::new(id, "done", pos, id);
        item.mark_completed(Utc.with_ymd_and_hms(y, m, d, 15, 0, 0).unwrap());
        item
    }

    #[test]
    fn empty_board() {
        let board = BoardState::empty(&layout());
        let stats = compute(&board, &layout(), NaiveDate::from_ymd_opt(2026, 3, 10).unwrap());
        assert_eq!(stats.total, 0);
        assert_eq!(stats.completion_percent, 0);
        assert_eq!(stats.streak_days, 0);
        assert_eq!(stats.columns.len(), 2);
    }

    #[test]
    fn percent_and_counts() {
        let board = BoardState::from_items(
            &layout(),
            vec![
                Item::new("a", "today", 0, "A"),
                Item::new("b", "today", 1, "B"),
                done_on("c", 0, 2026, 3, 1),
            ],
        )
        .unwrap();
        let stats = compute(&board, &layout(), NaiveDate::from_ymd_opt(2026, 3, 10).unwrap());
        assert_eq!(stats.completed, 1);
        assert_eq!(stats.completion_percent, 33);
        assert_eq!(stats.columns[0].count, 2);
        assert_eq!(stats.columns[1].count, 1);
    }

    #[test]
    fn streak_counts_back_from_today() {
        let board = BoardState::from_items(
            &layout(),
            vec![
                done_on("a", 0, 2026, 3, 10),
                done_on("b", 1, 2026, 3, 9),
                done_on("c", 2, 2026, 3, 8),
                done_on("d", 3, 2026, 3, 6),
            ],
        )
        .unwrap();
        let today = NaiveDate::from_ymd_opt(2026, 3, 10).unwrap();
        assert_eq!(streak(&board, today), 3);
        // Nothing completed on the 11th yet; the streak is still alive.
        assert_eq!(streak(&board, NaiveDate::from_ymd_opt(2026, 3, 11).unwrap()), 3);
        assert_eq!(streak(&board, NaiveDate::from_ymd_opt(2026, 3, 12).unwrap()), 0);
    }
}
