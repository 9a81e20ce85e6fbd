use serde::{Deserialize, Serialize};

pub type TaskId = i64;

/// One checklist item of a routine.
///
/// `checkoff_elapsed_secs` is `Some` exactly when the task is checked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    pub title: String,
    /// Position in the checkoff sequence; unique within a routine.
    pub sort_order: i32,
    checked: bool,
    #[serde(default)]
    checkoff_elapsed_secs: Option<u64>,
}

impl Task {
    pub fn new(id: TaskId, title: impl Into<String>, sort_order: i32) -> Self {
        Self {
            id,
            title: title.into(),
            sort_order,
            checked: false,
            checkoff_elapsed_secs: None,
        }
    }

    /// Rebuild a task from storage. Checked state follows the stamp.
    pub fn from_storage(
        id: TaskId,
        title: String,
        sort_order: i32,
        checkoff_elapsed_secs: Option<u64>,
    ) -> Self {
        Self {
            id,
            title,
            sort_order,
            checked: checkoff_elapsed_secs.is_some(),
            checkoff_elapsed_secs,
        }
    }

    pub fn is_checked(&self) -> bool {
        self.checked
    }

    pub fn checkoff_elapsed_secs(&self) -> Option<u64> {
        self.checkoff_elapsed_secs
    }

    /// Mark done with the task time at check-off. A second call changes nothing.
    pub(crate) fn check_off(&mut self, elapsed_secs: u64) -> bool {
        if self.checked {
            return false;
        }
        self.checked = true;
        self.checkoff_elapsed_secs = Some(elapsed_secs);
        true
    }

    pub(crate) fn initialize(&mut self) {
        self.checked = false;
        self.checkoff_elapsed_secs = None;
    }
}
