/// How much of a graph the verifier inspects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum VerificationLevel {
    /// Layout, ownership and references only.
    Fast,
    /// Adds operand/result types and loop/if shapes.
    Standard,
    /// Adds dominance and use-list consistency.
    Full,
}

#[derive(Debug, Clone)]
pub struct VerifierConfig {
    pub level: VerificationLevel,
    /// Diagnostics past this count are dropped; `0` keeps all of them.
    pub max_diagnostics: usize,
    /// Check use lists against operands even below `Full`.
    pub check_users: bool,
    /// Check that every operand is available at its use even below `Full`.
    pub check_dominance: bool,
    /// Report loops that still own a condition block.
    pub require_canonical_loops: bool,
}

impl VerifierConfig {
    pub fn for_level(level: VerificationLevel) -> Self {
        let full = level == VerificationLevel::Full;
        Self {
            level,
            max_diagnostics: if full { 500 } else { 200 },
            check_users: full,
            check_dominance: full,
            require_canonical_loops: false,
        }
    }

    /// Additionally rejects loops in the condition-block shape.
    pub fn with_canonical_loops(mut self) -> Self {
        self.require_canonical_loops = true;
        self
    }

    pub fn should_check_types(&self) -> bool {
        self.level >= VerificationLevel::Standard
    }

    pub fn should_check_dominance(&self) -> bool {
        self.check_dominance
    }

    pub fn should_check_users(&self) -> bool {
        self.check_users
    }
}

impl Default for VerifierConfig {
    fn default() -> Self {
        Self::for_level(VerificationLevel::Standard)
    }
}
