pub mod cashflow;
pub mod metrics;
pub mod savings;

pub use cashflow::{project_cash_flows, AdvancedOptions, CashFlowYear};
pub use metrics::{calculate_financials, FinancialCase, FinancialResult, LifetimeMetrics, PAYBACK_NEVER};
pub use savings::{annual_savings, MarketContext, SavingsBasis, SavingsBreakdown};
