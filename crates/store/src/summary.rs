/// Header and empty-state facts a renderer needs besides the rows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreSummary {
    pub visible: usize,
    pub active: usize,
    pub is_searching: bool,
}

impl StoreSummary {
    /// `"No users"`, `"Showing 1 user"` or `"Showing N users"`.
    pub fn count_text(&self) -> String {
        match self.visible {
            0 => "No users".to_string(),
            n => format!("Showing {n} {}", unit_label(n)),
        }
    }

    pub const fn is_empty(&self) -> bool {
        self.visible == 0
    }
}

const fn unit_label(n: usize) -> &'static str {
    if n == 1 {
        "user"
    } else {
        "users"
    }
}
