use rust_decimal::Decimal;

/// Direction of a transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub(crate) enum TxnType {
    Income,
    Expense,
}

impl TxnType {
    pub(crate) fn as_str(&self) -> &'static str {
        match self {
            Self::Income => "income",
            Self::Expense => "expense",
        }
    }

    pub(crate) fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "income" | "in" | "i" => Some(Self::Income),
            "expense" | "exp" | "e" => Some(Self::Expense),
            _ => None,
        }
    }

    pub(crate) fn all() -> &'static [TxnType] {
        &[Self::Income, Self::Expense]
    }
}

impl std::fmt::Display for TxnType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Fixed budget buckets. Each one belongs to exactly one [`TxnType`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub(crate) enum Category {
    // Expense
    Rent,
    Grocery,
    Food,
    Petrol,
    Home,
    Gym,
    Mobile,
    Extra,
    Insurance,
    // Income
    Uco,
    Gong,
}

const EXPENSE: &[Category] = &[
    Category::Rent,
    Category::Grocery,
    Category::Food,
    Category::Petrol,
    Category::Home,
    Category::Gym,
    Category::Mobile,
    Category::Extra,
    Category::Insurance,
];

const INCOME: &[Category] = &[Category::Uco, Category::Gong];

impl Category {
    /// Stable key used for storage and the wire.
    pub(crate) fn key(&self) -> &'static str {
        match self {
            Self::Rent => "Rent",
            Self::Grocery => "Grocery",
            Self::Food => "Food",
            Self::Petrol => "Petrol",
            Self::Home => "Home",
            Self::Gym => "Gym",
            Self::Mobile => "Mobile",
            Self::Extra => "Extra",
            Self::Insurance => "Insurance",
            Self::Uco => "UCO",
            Self::Gong => "GONG",
        }
    }

    pub(crate) fn display_name(&self) -> &'static str {
        match self {
            Self::Gong => "Private",
            other => other.key(),
        }
    }

    pub(crate) fn kind(&self) -> TxnType {
        if INCOME.contains(self) {
            TxnType::Income
        } else {
            TxnType::Expense
        }
    }

    pub(crate) fn all_for(kind: TxnType) -> &'static [Category] {
        match kind {
            TxnType::Income => INCOME,
            TxnType::Expense => EXPENSE,
        }
    }

    pub(crate) fn all() -> impl Iterator<Item = Category> {
        EXPENSE.iter().chain(INCOME.iter()).copied()
    }

    pub(crate) fn default_budget(&self) -> Decimal {
        let amount: i64 = match self {
            Self::Rent => 300,
            Self::Grocery => 200,
            Self::Food => 100,
            Self::Petrol => 120,
            Self::Home => 250,
            Self::Gym => 80,
            Self::Mobile => 60,
            Self::Extra => 50,
            Self::Insurance => 150,
            Self::Uco => 1000,
            Self::Gong => 1300,
        };
        Decimal::from(amount)
    }

    /// Fallback bucket when nothing better is known.
    pub(crate) fn default_for(kind: TxnType) -> Category {
        match kind {
            TxnType::Income => Self::Gong,
            TxnType::Expense => Self::Extra,
        }
    }

    /// Case-insensitive lookup by key or display name.
    pub(crate) fn parse(s: &str) -> Option<Self> {
        let lower = s.trim().to_lowercase();
        Self::all().find(|c| c.key().to_lowercase() == lower || c.display_name().to_lowercase() == lower)
    }

    /// Lookup restricted to the categories of one type.
    pub(crate) fn parse_for(kind: TxnType, s: &str) -> Option<Self> {
        Self::parse(s).filter(|c| c.kind() == kind)
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}
