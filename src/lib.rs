pub mod budget;
pub mod mechanisms;
pub mod queries;
pub mod rng;
pub mod util;

pub use budget::accountant::{BudgetAccountant, BudgetError, BudgetRecord};
pub use queries::histogram::{
    histogram, Advisory, HistogramError, HistogramRequest, HistogramValues,
    NoisyHistogram,
};
