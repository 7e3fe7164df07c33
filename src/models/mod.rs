mod budget;
mod category;
mod month;
mod transaction;

pub(crate) use budget::BudgetMap;
pub(crate) use category::{Category, TxnType};
pub(crate) use month::MonthKey;
pub(crate) use transaction::{parse_amount, round_amount, NewTransaction, Transaction, TransactionStore};

#[cfg(test)]
mod tests;
