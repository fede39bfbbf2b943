use crate::models::{UserId, UserRecord};
use crate::registry::ListingRenderer;

/// Listing of every registrant plus the highlighted row. The registry pushes
/// fresh contents through [`ListingRenderer`] after each write.
#[derive(Default)]
pub(crate) struct UserTable {
    pub(crate) records: Vec<UserRecord>,
    pub(crate) selected: usize,
}

impl UserTable {
    pub(crate) fn current_user(&self) -> Option<&UserRecord> {
        self.records.get(self.selected)
    }

    pub(crate) fn move_selection(&mut self, offset: isize) {
        if self.records.is_empty() {
            return;
        }
        let len = self.records.len() as isize;
        let mut new = self.selected as isize + offset;
        if new < 0 {
            new = 0;
        }
        if new >= len {
            new = len - 1;
        }
        self.selected = new as usize;
    }

    pub(crate) fn select_first(&mut self) {
        self.selected = 0;
    }

    pub(crate) fn select_last(&mut self) {
        if !self.records.is_empty() {
            self.selected = self.records.len() - 1;
        }
    }

    /// Highlight the row for `user_id` if it is listed.
    pub(crate) fn focus(&mut self, user_id: UserId) {
        if let Some(idx) = self.records.iter().position(|r| r.user_id == user_id) {
            self.selected = idx;
        }
    }

    /// First row index to draw so the selection stays inside `visible` rows.
    pub(crate) fn scroll_offset(&self, visible: usize) -> usize {
        if visible == 0 {
            return self.selected;
        }
        self.selected.saturating_sub(visible - 1)
    }

    fn ensure_in_bounds(&mut self) {
        if self.records.is_empty() {
            self.selected = 0;
        } else if self.selected >= self.records.len() {
            self.selected = self.records.len() - 1;
        }
    }
}

impl ListingRenderer for UserTable {
    fn render(&mut self, records: &[UserRecord]) {
        let focused = self.current_user().map(|r| r.user_id);
        self.records = records.to_vec();
        match focused {
            Some(user_id) => self.focus(user_id),
            None => self.select_first(),
        }
        self.ensure_in_bounds();
    }

    fn remove_row(&mut self, user_id: UserId) {
        self.records.retain(|r| r.user_id != user_id);
        self.ensure_in_bounds();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(user_id: UserId) -> UserRecord {
        UserRecord {
            user_id,
            ..UserRecord::default()
        }
    }

    #[test]
    fn render_keeps_focus_on_the_same_user() {
        let mut table = UserTable::default();
        table.render(&[user(1), user(5), user(9)]);
        table.move_selection(1);
        assert_eq!(table.current_user().map(|u| u.user_id), Some(5));

        table.render(&[user(0), user(1), user(5), user(9)]);
        assert_eq!(table.current_user().map(|u| u.user_id), Some(5));
    }

    #[test]
    fn remove_row_clamps_selection() {
        let mut table = UserTable::default();
        table.render(&[user(1), user(5)]);
        table.select_last();
        table.remove_row(5);
        assert_eq!(table.current_user().map(|u| u.user_id), Some(1));
        table.remove_row(1);
        assert!(table.current_user().is_none());
        assert_eq!(table.selected, 0);
    }

    #[test]
    fn selection_is_clamped_to_rows() {
        let mut table = UserTable::default();
        table.move_selection(3);
        assert_eq!(table.selected, 0);

        table.render(&[user(1), user(2), user(3)]);
        table.move_selection(10);
        assert_eq!(table.selected, 2);
        table.move_selection(-10);
        assert_eq!(table.selected, 0);
    }

    #[test]
    fn scroll_offset_follows_selection() {
        let mut table = UserTable::default();
        table.render(&(0..20).map(user).collect::<Vec<_>>());
        table.move_selection(12);
        assert_eq!(table.scroll_offset(5), 8);
        assert_eq!(table.scroll_offset(20), 0);
    }
}
