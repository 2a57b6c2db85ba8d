//! Spend-vs-limit report for one month.

use uuid::Uuid;

/// Three-way classification of a spend against its limit.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BudgetStatus {
    /// Spend is within the configured limit.
    Under,
    /// Spend exceeds a configured, non-zero limit.
    Over,
    /// No limit configured for the period (spend is not judged).
    NoLimit,
}

impl BudgetStatus {
    fn classify(limit: f64, spent: f64) -> Self {
        if limit == 0.0 {
            Self::NoLimit
        } else if spent > limit {
            Self::Over
        } else {
            Self::Under
        }
    }
}

/// One category's figures for the reporting period.
#[derive(Clone, Debug, PartialEq)]
pub struct CategoryReport {
    pub category_id: Uuid,
    pub name: String,
    pub limit: f64,
    pub spent: f64,
}

impl CategoryReport {
    #[must_use]
    pub fn remaining(&self) -> f64 {
        self.limit - self.spent
    }

    /// Percent of the limit used; `0` when no limit is configured.
    #[must_use]
    pub fn percent_used(&self) -> f64 {
        if self.limit > 0.0 {
            self.spent / self.limit * 100.0
        } else {
            0.0
        }
    }

    #[must_use]
    pub fn status(&self) -> BudgetStatus {
        BudgetStatus::classify(self.limit, self.spent)
    }
}

/// Full report for an owner and period, one row per owned category.
#[derive(Clone, Debug, PartialEq)]
pub struct Report {
    pub month: u32,
    pub year: i32,
    pub categories: Vec<CategoryReport>,
}

impl Report {
    #[must_use]
    pub fn total_limit(&self) -> f64 {
        self.categories.iter().map(|c| c.limit).sum()
    }

    #[must_use]
    pub fn total_spent(&self) -> f64 {
        self.categories.iter().map(|c| c.spent).sum()
    }

    #[must_use]
    pub fn remaining_funds(&self) -> f64 {
        self.total_limit() - self.total_spent()
    }

    #[must_use]
    pub fn percent_used(&self) -> f64 {
        let total_limit = self.total_limit();
        if total_limit > 0.0 {
            self.total_spent() / total_limit * 100.0
        } else {
            0.0
        }
    }

    /// Percentage of the total limit still unspent; `0` when no limit exists.
    #[must_use]
    pub fn remaining_percent(&self) -> f64 {
        let total_limit = self.total_limit();
        if total_limit > 0.0 {
            self.remaining_funds() / total_limit * 100.0
        } else {
            0.0
        }
    }

    #[must_use]
    pub fn status(&self) -> BudgetStatus {
        BudgetStatus::classify(self.total_limit(), self.total_spent())
    }
}
