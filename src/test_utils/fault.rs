//! Fault injection for the mock collaborators used in tests

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum When {
    Always,
    #[default]
    Never,
}

/// A fault makes a mocked call fail based on [`When`]
#[derive(Clone, Debug, Default)]
pub struct Fault {
    pub when: When,
}

impl Fault {
    /// Whether the mocked call should fail
    pub fn triggers(&self) -> bool {
        self.when == When::Always
    }
}
