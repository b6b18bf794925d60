//! QR code list state.

use qrm_core::models::QrCode;

/// What the client knows about the account's codes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum QrList {
    /// No successful fetch yet.
    #[default]
    NotLoaded,
    /// A fetch succeeded with no codes (or without a content field).
    Empty,
    Loaded(Vec<QrCode>),
}

impl QrList {
    pub fn from_codes(codes: Vec<QrCode>) -> Self {
        if codes.is_empty() {
            QrList::Empty
        } else {
            QrList::Loaded(codes)
        }
    }

    pub fn codes(&self) -> &[QrCode] {
        match self {
            QrList::Loaded(codes) => codes,
            QrList::NotLoaded | QrList::Empty => &[],
        }
    }

    pub fn len(&self) -> usize {
        self.codes().len()
    }

    pub fn is_empty(&self) -> bool {
        self.codes().is_empty()
    }
}

/// The list plus the cursor.
#[derive(Debug, Clone, Default)]
pub struct QrListState {
    pub list: QrList,
    pub selected: usize,
}

impl QrListState {
    /// Replaces the list wholesale and keeps the cursor in range.
    pub fn replace(&mut self, list: QrList) {
        self.list = list;
        self.selected = self.selected.min(self.list.len().saturating_sub(1));
    }

    pub fn select_next(&mut self) {
        if self.selected + 1 < self.list.len() {
            self.selected += 1;
        }
    }

    pub fn select_prev(&mut self) {
        self.selected = self.selected.saturating_sub(1);
    }

    pub fn select_first(&mut self) {
        self.selected = 0;
    }

    pub fn select_last(&mut self) {
        self.selected = self.list.len().saturating_sub(1);
    }

    pub fn selected_code(&self) -> Option<&QrCode> {
        self.list.codes().get(self.selected)
    }
}
