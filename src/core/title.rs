//! # Editable Title
//!
//! Optimistic rename: the draft is shown immediately, the remote update is
//! requested, and the draft is rolled back if the server refuses.
//!
//! ```text
//! Idle ──begin()──▶ Editing ──commit()──▶ Submit(title) ──confirm()──▶ Idle (new title)
//!                      │          │                      └──reject()───▶ Idle (old title)
//!                      │          └──▶ Revert (blank) / Unchanged
//!                      └──cancel()──▶ Idle (old title)
//! ```

#[derive(Debug, Clone, PartialEq)]
pub enum TitleCommit {
    /// Draft was blank; the old title is restored without a request.
    Revert,
    /// Draft equals the current title; nothing to do.
    Unchanged,
    /// Send this title to the server, then `confirm()` or `reject()`.
    Submit(String),
}

#[derive(Debug, Clone)]
pub struct TitleEditor {
    committed: String,
    draft: String,
    editing: bool,
}

impl TitleEditor {
    pub fn new(title: impl Into<String>) -> Self {
        let committed = title.into();
        Self {
            draft: committed.clone(),
            committed,
            editing: false,
        }
    }

    /// The title to display right now (optimistic while a submit is pending).
    pub fn shown(&self) -> &str {
        &self.draft
    }

    pub fn committed(&self) -> &str {
        &self.committed
    }

    pub fn is_editing(&self) -> bool {
        self.editing
    }

    pub fn begin(&mut self) {
        self.editing = true;
    }

    pub fn set_draft(&mut self, draft: impl Into<String>) {
        self.draft = draft.into();
    }

    /// Escape: drop the draft.
    pub fn cancel(&mut self) {
        self.draft = self.committed.clone();
        self.editing = false;
    }

    /// Enter or blur: decide whether the draft needs to be sent.
    pub fn commit(&mut self) -> TitleCommit {
        self.editing = false;
        if self.draft.trim().is_empty() {
            self.draft = self.committed.clone();
            return TitleCommit::Revert;
        }
        if self.draft == self.committed {
            return TitleCommit::Unchanged;
        }
        TitleCommit::Submit(self.draft.clone())
    }

    /// The server accepted the submitted title.
    pub fn confirm(&mut self) {
        self.committed = self.draft.clone();
    }

    /// The server refused; restore the previous title.
    pub fn reject(&mut self) {
        self.draft = self.committed.clone();
    }
}
